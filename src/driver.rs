//! # Stream Drivers
//!
//! Helpers that feed a whole row source through a tree and then signal end-of-stream, so the
//! last open entity of every node is flushed.
//!
//! Rows must already be grouped by the root key (for example by an `ORDER BY` on the query that
//! produced them). The drivers neither sort nor buffer.
//!
//! ## Example
//!
//! ```rust
//! use rowweave::driver;
//! use rowweave::node::RootNode;
//! use rowweave::sink::Collector;
//!
//! let groups = Collector::new();
//! let mut root = RootNode::new(|row: &u8| *row, |group: &u8| *group, |row: &u8| *row)
//!   .with_prev_emitter(groups.sink());
//!
//! let rows = driver::feed(&mut root, [1u8, 1, 2, 3, 3]).unwrap();
//! assert_eq!(rows, 5);
//! assert_eq!(groups.snapshot(), vec![1, 2, 3]);
//! ```

use crate::error::{AccumulateError, AccumulateResult, BoxError};
use crate::node::Accumulate;
use tracing::{debug, error};

/// Feeds every row to `root`, then signals end-of-stream.
///
/// # Returns
///
/// The number of rows accumulated.
pub fn feed<P, R, N, I>(root: &mut N, rows: I) -> AccumulateResult<u64>
where
  N: Accumulate<P, R> + ?Sized,
  I: IntoIterator<Item = R>,
{
  let mut count = 0u64;
  for row in rows {
    root.accumulate(None, Some(&row))?;
    count += 1;
  }
  root.accumulate(None, None)?;
  debug!(node = %root.component(), rows = count, "stream drained");
  Ok(count)
}

/// Feeds every row of a fallible source to `root`, then signals end-of-stream.
///
/// A source error stops ingestion immediately and is returned as
/// [`AccumulateError::Source`]. End-of-stream is not signaled in that case, so the open entity
/// is never delivered to a previous emitter.
pub fn try_feed<P, R, N, I, E>(root: &mut N, rows: I) -> AccumulateResult<u64>
where
  N: Accumulate<P, R> + ?Sized,
  I: IntoIterator<Item = Result<R, E>>,
  E: Into<BoxError>,
{
  let mut count = 0u64;
  for row in rows {
    let row = row.map_err(|source| {
      let source: BoxError = source.into();
      error!(node = %root.component(), rows = count, error = %source, "row source failed");
      AccumulateError::Source {
        rows: count,
        source,
      }
    })?;
    root.accumulate(None, Some(&row))?;
    count += 1;
  }
  root.accumulate(None, None)?;
  debug!(node = %root.component(), rows = count, "stream drained");
  Ok(count)
}
