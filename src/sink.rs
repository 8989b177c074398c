//! # List-Collecting Sink
//!
//! [`Collector`] gathers every entity delivered to an emitter into a list. Register
//! [`Collector::sink`] as a node's emitter or previous emitter, drive the stream, then read the
//! list back with [`Collector::snapshot`] or [`Collector::take`].
//!
//! The collector stores clones of what it receives. With the immediate emitter that means
//! snapshots of possibly incomplete entities unless the entity type is a
//! [`Shared`](crate::shared::Shared) handle.
//!
//! ## Example
//!
//! ```rust
//! use rowweave::sink::Collector;
//!
//! let collector = Collector::new();
//! let mut sink = collector.sink();
//! sink(&1);
//! sink(&2);
//! assert_eq!(collector.snapshot(), vec![1, 2]);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A cloneable handle to a list of emitted entities.
pub struct Collector<T> {
  items: Rc<RefCell<Vec<T>>>,
}

impl<T> Collector<T> {
  /// Creates an empty collector.
  pub fn new() -> Self {
    Self {
      items: Rc::new(RefCell::new(Vec::new())),
    }
  }

  /// Number of entities collected so far.
  pub fn len(&self) -> usize {
    self.items.borrow().len()
  }

  /// Returns `true` if nothing has been collected.
  pub fn is_empty(&self) -> bool {
    self.items.borrow().is_empty()
  }

  /// Moves the collected entities out, leaving the collector empty.
  pub fn take(&self) -> Vec<T> {
    std::mem::take(&mut *self.items.borrow_mut())
  }
}

impl<T> Collector<T>
where
  T: Clone + 'static,
{
  /// Returns an emitter closure that appends a clone of every entity it receives.
  pub fn sink(&self) -> impl FnMut(&T) + 'static {
    let items = Rc::clone(&self.items);
    move |entity: &T| items.borrow_mut().push(entity.clone())
  }

  /// Returns a copy of the entities collected so far.
  pub fn snapshot(&self) -> Vec<T> {
    self.items.borrow().clone()
  }
}

impl<T> Clone for Collector<T> {
  fn clone(&self) -> Self {
    Self {
      items: Rc::clone(&self.items),
    }
  }
}

impl<T> Default for Collector<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: fmt::Debug> fmt::Debug for Collector<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Collector")
      .field("items", &self.items.borrow())
      .finish()
  }
}
