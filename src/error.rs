//! # Error Handling
//!
//! Errors raised while accumulating rows into entities.
//!
//! Every caller-supplied policy of a [`Node`](crate::node::Node) (key extraction, mapping,
//! emission, attachment) is fallible. A failure aborts the current call and is returned to the
//! driver unchanged, tagged with the [`Stage`] that failed and the [`ComponentInfo`] of the node
//! that ran it. Nothing is retried or swallowed.
//!
//! ## Error Kinds
//!
//! - **Callback**: a caller policy failed (`RowKey`, `EntityKey`, `Mapping`, `Emit`, `PrevEmit`,
//!   `Attach`)
//! - **Closed**: a row arrived after end-of-stream was signaled
//! - **Poisoned**: the tree was used again after a failure left an open entity incomplete
//! - **Source**: the driver's row source failed before the row reached the tree
//!
//! ## Example
//!
//! ```rust
//! use rowweave::error::{AccumulateError, ComponentInfo, Stage};
//!
//! let error = AccumulateError::callback(
//!   Stage::Mapping,
//!   ComponentInfo::new("person".to_string(), "Person".to_string()),
//!   "id is not a number",
//! );
//! assert_eq!(error.stage(), Some(Stage::Mapping));
//! ```

use std::fmt;
use thiserror::Error;

/// Boxed error type returned by caller-supplied policies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type AccumulateResult<T> = Result<T, AccumulateError>;

/// The step of a node's accumulate/transition cycle that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
  /// Extracting the key from an incoming row.
  RowKey,
  /// Extracting the key from the node's open entity.
  EntityKey,
  /// Mapping a row into a new entity.
  Mapping,
  /// Delivering a freshly built entity to the immediate emitter.
  Emit,
  /// Delivering a completed entity to the previous-entity emitter.
  PrevEmit,
  /// Attaching a freshly built entity onto its parent entity.
  Attach,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      Stage::RowKey => "row key extraction",
      Stage::EntityKey => "entity key extraction",
      Stage::Mapping => "mapping",
      Stage::Emit => "emission",
      Stage::PrevEmit => "previous-entity emission",
      Stage::Attach => "attachment",
    };
    f.write_str(label)
  }
}

/// Identifies the node that raised an error or a log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
  /// The configured name of the node.
  pub name: String,
  /// The type name of the entity the node builds.
  pub type_name: String,
}

impl Default for ComponentInfo {
  fn default() -> Self {
    Self {
      name: "node".to_string(),
      type_name: "unknown".to_string(),
    }
  }
}

impl ComponentInfo {
  /// Creates a new `ComponentInfo` with the given name and type name.
  ///
  /// # Arguments
  ///
  /// * `name` - The name of the node.
  /// * `type_name` - The type name of the entity the node builds.
  pub fn new(name: String, type_name: String) -> Self {
    Self { name, type_name }
  }
}

impl fmt::Display for ComponentInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "node `{}` ({})", self.name, self.type_name)
  }
}

/// Error returned by accumulation and by the drivers in [`crate::driver`].
#[derive(Debug, Error)]
pub enum AccumulateError {
  /// A caller-supplied policy failed.
  #[error("{stage} failed in {component}: {source}")]
  Callback {
    /// The step that failed.
    stage: Stage,
    /// The node that ran the policy.
    component: ComponentInfo,
    /// The error returned by the policy.
    #[source]
    source: BoxError,
  },
  /// A row was pushed after end-of-stream had closed the node.
  #[error("{component} received a row after end-of-stream")]
  Closed {
    /// The closed node.
    component: ComponentInfo,
  },
  /// The node was used after an earlier call failed.
  #[error("{component} is poisoned by an earlier failure")]
  Poisoned {
    /// The poisoned node.
    component: ComponentInfo,
  },
  /// The row source feeding the tree failed.
  #[error("row source failed after {rows} rows: {source}")]
  Source {
    /// Number of rows accumulated before the failure.
    rows: u64,
    /// The error produced by the row source.
    #[source]
    source: BoxError,
  },
}

impl AccumulateError {
  /// Wraps a policy failure with the stage and node it came from.
  pub fn callback(stage: Stage, component: ComponentInfo, source: impl Into<BoxError>) -> Self {
    Self::Callback {
      stage,
      component,
      source: source.into(),
    }
  }

  /// Returns the failing stage for policy failures.
  pub fn stage(&self) -> Option<Stage> {
    match self {
      AccumulateError::Callback { stage, .. } => Some(*stage),
      _ => None,
    }
  }

  /// Returns the node the error is attributed to, if any.
  pub fn component(&self) -> Option<&ComponentInfo> {
    match self {
      AccumulateError::Callback { component, .. }
      | AccumulateError::Closed { component }
      | AccumulateError::Poisoned { component } => Some(component),
      AccumulateError::Source { .. } => None,
    }
  }
}
