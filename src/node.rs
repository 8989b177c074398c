//! # Accumulating Nodes
//!
//! A [`Node`] folds an ordered stream of rows into entities, opening a new entity every time the
//! key of the incoming row differs from the key of the entity it currently holds. Nodes chain
//! into a tree: a child node only sees the rows that belong to its parent's open entity, builds
//! its own sub-entities from them and links them into the parent through an attach hook.
//!
//! ## Ordering Contract
//!
//! Rows must arrive grouped by key. The node never sorts or buffers; a key that reappears after
//! a different key starts a new entity.
//!
//! ## Emission Channels
//!
//! - **Emitter**: receives an entity as soon as it is built. Later rows of the same group have
//!   not been folded in yet, so the entity may be incomplete.
//! - **Previous emitter**: receives an entity when the next transition demotes it. No further row
//!   can alter it, so it is complete.
//!
//! ## Transition Order
//!
//! Previous emitter, then mapping, then every child transition (depth-first, in configured
//! order), then emitter, then attach.
//!
//! ## Failures
//!
//! Every failure is returned to the caller. A failed key extraction or previous emission leaves
//! the node untouched. A failed mapping leaves it with no open entity, the previous one having
//! already been delivered. Either way the next row is processed normally. Once a transition has
//! made a new entity current, a failure in a child, the emitter or the attach hook poisons the
//! node and every ancestor on the error path, since the open entity may be incomplete.
//!
//! ## Example
//!
//! ```rust
//! use rowweave::node::RootNode;
//! use rowweave::sink::Collector;
//!
//! type Row = (u32, &'static str);
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Order {
//!   id: u32,
//!   lines: Vec<String>,
//! }
//!
//! let orders = Collector::new();
//! let mut root = RootNode::new(
//!   |row: &Row| row.0,
//!   |order: &Order| order.id,
//!   |row: &Row| Order { id: row.0, lines: Vec::new() },
//! )
//! .with_prev_emitter(orders.sink())
//! .with_child(
//!   rowweave::node::Node::new(
//!     |row: &Row| row.1.to_string(),
//!     |line: &String| line.clone(),
//!     |row: &Row| row.1.to_string(),
//!   )
//!   .with_attach(|order: &mut Order, line: &String| order.lines.push(line.clone())),
//! );
//!
//! let rows: [Row; 3] = [(1, "tea"), (1, "cake"), (2, "soup")];
//! for row in &rows {
//!   root.push(row).unwrap();
//! }
//! root.finish().unwrap();
//!
//! let orders = orders.take();
//! assert_eq!(orders.len(), 2);
//! assert_eq!(orders[0].lines, vec!["tea", "cake"]);
//! ```

use crate::error::{AccumulateError, AccumulateResult, BoxError, ComponentInfo, Stage};
use crate::metrics::NodeStats;
use std::fmt;
use tracing::{debug, trace, warn};

type KeyFn<X, K> = Box<dyn Fn(&X) -> Result<K, BoxError>>;
type MapFn<R, T> = Box<dyn Fn(&R) -> Result<Option<T>, BoxError>>;
type EmitFn<T> = Box<dyn FnMut(&T) -> Result<(), BoxError>>;
type AttachFn<P, T> = Box<dyn FnMut(&mut P, &T) -> Result<(), BoxError>>;

/// A tree level that can be driven with rows on behalf of a parent entity.
///
/// [`Node`] is the only implementation in this crate; the trait exists so a parent can own
/// children of different entity and key types.
pub trait Accumulate<P, R> {
  /// Returns the identity of this tree level for logs and errors.
  fn component(&self) -> ComponentInfo;

  /// Feeds one row, or end-of-stream when `row` is `None`.
  ///
  /// Starts a new entity when there is no open entity, when `row` is `None`, or when the row's
  /// key differs from the open entity's key. Otherwise the row is forwarded to every child with
  /// the open entity as their parent.
  ///
  /// # Arguments
  ///
  /// * `parent` - The parent's open entity, `None` at the root.
  /// * `row` - The next row, `None` to signal end-of-stream.
  fn accumulate(&mut self, parent: Option<&mut P>, row: Option<&R>) -> AccumulateResult<()>;

  /// Closes the open entity and opens a new one from `row` (or none when `row` is `None`).
  ///
  /// Parents call this on every child whenever they transition themselves, since a parent key
  /// change or end-of-stream ends every open child entity too.
  fn transition(&mut self, parent: Option<&mut P>, row: Option<&R>) -> AccumulateResult<()>;

  /// Returns `true` once end-of-stream has been processed.
  fn is_closed(&self) -> bool;

  /// Returns `true` if a failure left the open entity in an unknown state. Every later call fails
  /// with [`AccumulateError::Poisoned`].
  fn is_poisoned(&self) -> bool;
}

/// Configuration for a [`Node`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
  name: Option<String>,
}

impl NodeConfig {
  /// Sets the name used in logs and errors.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Returns the configured name, or `"node"` when none was set.
  pub fn name(&self) -> &str {
    self.name.as_deref().unwrap_or("node")
  }

  fn component<T>(&self) -> ComponentInfo {
    ComponentInfo::new(
      self.name().to_string(),
      std::any::type_name::<T>().to_string(),
    )
  }
}

/// Accumulates rows of type `R` into entities of type `T`, keyed by `K`, under parent entities
/// of type `P`.
///
/// Root nodes use `P = ()`; see [`RootNode`].
///
/// Entities handed to the emitters are borrowed. Callers that keep them and also want to observe
/// attachments made after emission should build `T` as a [`Shared`](crate::shared::Shared)
/// handle.
pub struct Node<P, T, R, K> {
  config: NodeConfig,
  row_key: KeyFn<R, K>,
  entity_key: KeyFn<T, K>,
  mapper: MapFn<R, T>,
  emitter: Option<EmitFn<T>>,
  prev_emitter: Option<EmitFn<T>>,
  attach: Option<AttachFn<P, T>>,
  children: Vec<Box<dyn Accumulate<T, R>>>,
  // Doubles as the previous entity at the start of a transition.
  current: Option<T>,
  closed: bool,
  poisoned: bool,
  stats: NodeStats,
}

/// A node at the top of a tree, with no parent entity.
pub type RootNode<T, R, K> = Node<(), T, R, K>;

impl<P, T, R, K> Node<P, T, R, K>
where
  K: PartialEq,
{
  /// Creates a node from infallible policies.
  ///
  /// # Arguments
  ///
  /// * `row_key` - Extracts the grouping key from a row.
  /// * `entity_key` - Extracts the same key from a built entity.
  /// * `mapper` - Builds a new entity from the first row of a group.
  pub fn new<FR, FE, FM>(row_key: FR, entity_key: FE, mapper: FM) -> Self
  where
    FR: Fn(&R) -> K + 'static,
    FE: Fn(&T) -> K + 'static,
    FM: Fn(&R) -> T + 'static,
  {
    Self::from_parts(
      Box::new(move |row: &R| -> Result<K, BoxError> { Ok(row_key(row)) }),
      Box::new(move |entity: &T| -> Result<K, BoxError> {
        Ok(entity_key(entity))
      }),
      Box::new(move |row: &R| -> Result<Option<T>, BoxError> {
        Ok(Some(mapper(row)))
      }),
    )
  }

  /// Creates a node from fallible policies.
  ///
  /// The mapper may return `Ok(None)` to skip a group: no entity becomes current, nothing is
  /// emitted for it, and the next row always starts a new transition.
  pub fn try_new<FR, FE, FM, E1, E2, E3>(row_key: FR, entity_key: FE, mapper: FM) -> Self
  where
    FR: Fn(&R) -> Result<K, E1> + 'static,
    FE: Fn(&T) -> Result<K, E2> + 'static,
    FM: Fn(&R) -> Result<Option<T>, E3> + 'static,
    E1: Into<BoxError>,
    E2: Into<BoxError>,
    E3: Into<BoxError>,
  {
    Self::from_parts(
      Box::new(move |row: &R| -> Result<K, BoxError> {
        row_key(row).map_err(Into::into)
      }),
      Box::new(move |entity: &T| -> Result<K, BoxError> {
        entity_key(entity).map_err(Into::into)
      }),
      Box::new(move |row: &R| -> Result<Option<T>, BoxError> {
        mapper(row).map_err(Into::into)
      }),
    )
  }

  fn from_parts(row_key: KeyFn<R, K>, entity_key: KeyFn<T, K>, mapper: MapFn<R, T>) -> Self {
    Self {
      config: NodeConfig::default(),
      row_key,
      entity_key,
      mapper,
      emitter: None,
      prev_emitter: None,
      attach: None,
      children: Vec::new(),
      current: None,
      closed: false,
      poisoned: false,
      stats: NodeStats::default(),
    }
  }

  /// Sets the node name used in logs and errors.
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.config = self.config.with_name(name);
    self
  }

  /// Replaces the whole node configuration.
  pub fn with_config(mut self, config: NodeConfig) -> Self {
    self.config = config;
    self
  }

  /// Registers the immediate emitter. Entities delivered here may still be incomplete.
  pub fn with_emitter<F>(mut self, mut emitter: F) -> Self
  where
    F: FnMut(&T) + 'static,
  {
    self.emitter = Some(Box::new(move |entity: &T| -> Result<(), BoxError> {
      emitter(entity);
      Ok(())
    }));
    self
  }

  /// Registers a fallible immediate emitter.
  pub fn try_with_emitter<F, E>(mut self, mut emitter: F) -> Self
  where
    F: FnMut(&T) -> Result<(), E> + 'static,
    E: Into<BoxError>,
  {
    self.emitter = Some(Box::new(move |entity: &T| -> Result<(), BoxError> {
      emitter(entity).map_err(Into::into)
    }));
    self
  }

  /// Registers the previous-entity emitter. Entities delivered here are complete.
  pub fn with_prev_emitter<F>(mut self, mut prev_emitter: F) -> Self
  where
    F: FnMut(&T) + 'static,
  {
    self.prev_emitter = Some(Box::new(move |entity: &T| -> Result<(), BoxError> {
      prev_emitter(entity);
      Ok(())
    }));
    self
  }

  /// Registers a fallible previous-entity emitter.
  pub fn try_with_prev_emitter<F, E>(mut self, mut prev_emitter: F) -> Self
  where
    F: FnMut(&T) -> Result<(), E> + 'static,
    E: Into<BoxError>,
  {
    self.prev_emitter = Some(Box::new(move |entity: &T| -> Result<(), BoxError> {
      prev_emitter(entity).map_err(Into::into)
    }));
    self
  }

  /// Registers the hook that links a freshly built entity into its parent entity.
  ///
  /// The hook runs at the end of every transition in which both the parent entity and the new
  /// entity are present, so entities are attached in the order their keys first appear within
  /// the parent's group.
  pub fn with_attach<F>(mut self, mut attach: F) -> Self
  where
    F: FnMut(&mut P, &T) + 'static,
  {
    self.attach = Some(Box::new(move |parent: &mut P, entity: &T| -> Result<(), BoxError> {
      attach(parent, entity);
      Ok(())
    }));
    self
  }

  /// Registers a fallible attach hook.
  pub fn try_with_attach<F, E>(mut self, mut attach: F) -> Self
  where
    F: FnMut(&mut P, &T) -> Result<(), E> + 'static,
    E: Into<BoxError>,
  {
    self.attach = Some(Box::new(move |parent: &mut P, entity: &T| -> Result<(), BoxError> {
      attach(parent, entity).map_err(Into::into)
    }));
    self
  }

  /// Chains a child node. Children run in the order they were added.
  pub fn with_child<C>(mut self, child: C) -> Self
  where
    C: Accumulate<T, R> + 'static,
  {
    self.children.push(Box::new(child));
    self
  }

  /// Feeds one row from the driver.
  pub fn push(&mut self, row: &R) -> AccumulateResult<()> {
    Accumulate::accumulate(self, None, Some(row))
  }

  /// Signals end-of-stream, flushing the open entity of every node in the tree.
  ///
  /// Calling this again is a no-op.
  pub fn finish(&mut self) -> AccumulateResult<()> {
    Accumulate::accumulate(self, None, None)
  }

  /// Returns the entity produced by the last transition, if any.
  pub fn current(&self) -> Option<&T> {
    self.current.as_ref()
  }

  /// Returns the node configuration.
  pub fn config(&self) -> &NodeConfig {
    &self.config
  }

  /// Returns the counters recorded so far.
  pub fn stats(&self) -> NodeStats {
    self.stats
  }

  /// Returns the number of chained children.
  pub fn child_count(&self) -> usize {
    self.children.len()
  }

  fn fail(&self, stage: Stage, source: BoxError) -> AccumulateError {
    AccumulateError::callback(stage, self.config.component::<T>(), source)
  }

  /// Decides whether a call should run. `Ok(false)` means a repeated end-of-stream.
  fn admit(&self, has_row: bool) -> AccumulateResult<bool> {
    if self.poisoned {
      return Err(AccumulateError::Poisoned {
        component: self.config.component::<T>(),
      });
    }
    if !self.closed {
      return Ok(true);
    }
    if has_row {
      return Err(AccumulateError::Closed {
        component: self.config.component::<T>(),
      });
    }
    debug!(node = self.config.name(), "ignoring repeated end-of-stream");
    Ok(false)
  }

  fn poison(&mut self, error: AccumulateError) -> AccumulateError {
    warn!(node = self.config.name(), %error, "node poisoned");
    self.poisoned = true;
    error
  }

  fn continues_group(&self, row: &R) -> AccumulateResult<bool> {
    let Some(current) = self.current.as_ref() else {
      return Ok(false);
    };
    let row_key = (self.row_key)(row).map_err(|source| self.fail(Stage::RowKey, source))?;
    let entity_key =
      (self.entity_key)(current).map_err(|source| self.fail(Stage::EntityKey, source))?;
    Ok(row_key == entity_key)
  }

  fn dispatch(&mut self, parent: Option<&mut P>, row: Option<&R>) -> AccumulateResult<()> {
    let continues = match row {
      Some(row) => self.continues_group(row)?,
      None => false,
    };
    if !continues {
      return self.run_transition(parent, row);
    }
    let mut failure = None;
    for child in self.children.iter_mut() {
      if let Err(error) = child.accumulate(self.current.as_mut(), row) {
        failure = Some((error, child.is_poisoned()));
        break;
      }
    }
    match failure {
      // A poisoned child leaves the open entity incomplete.
      Some((error, true)) => Err(self.poison(error)),
      Some((error, false)) => Err(error),
      None => Ok(()),
    }
  }

  /// Runs a transition. Failures up to and including mapping leave the node usable; once the new
  /// entity is current, a failure poisons it.
  fn run_transition(&mut self, parent: Option<&mut P>, row: Option<&R>) -> AccumulateResult<()> {
    self.stats.record_transition();
    trace!(
      node = self.config.name(),
      has_row = row.is_some(),
      "transition"
    );

    if let Some(previous) = self.current.as_ref() {
      if let Some(prev_emitter) = self.prev_emitter.as_mut() {
        let delivered = prev_emitter(previous);
        delivered.map_err(|source| self.fail(Stage::PrevEmit, source))?;
      }
      self.stats.record_flushed();
      self.current = None;
    }

    if let Some(row) = row {
      let next = (self.mapper)(row).map_err(|source| self.fail(Stage::Mapping, source))?;
      self.current = next;
    } else {
      self.closed = true;
      debug!(node = self.config.name(), "end of stream, node closed");
    }

    self
      .open(parent, row)
      .map_err(|error| self.poison(error))
  }

  fn open(&mut self, parent: Option<&mut P>, row: Option<&R>) -> AccumulateResult<()> {
    for child in self.children.iter_mut() {
      child.transition(self.current.as_mut(), row)?;
    }

    if let Some(current) = self.current.as_ref() {
      self.stats.record_opened();
      if let Some(emitter) = self.emitter.as_mut() {
        let delivered = emitter(current);
        delivered.map_err(|source| self.fail(Stage::Emit, source))?;
      }
    }

    if let (Some(attach), Some(parent), Some(current)) =
      (self.attach.as_mut(), parent, self.current.as_ref())
    {
      let attached = attach(parent, current);
      attached.map_err(|source| self.fail(Stage::Attach, source))?;
    }
    Ok(())
  }
}

impl<P, T, R, K> Accumulate<P, R> for Node<P, T, R, K>
where
  K: PartialEq,
{
  fn component(&self) -> ComponentInfo {
    self.config.component::<T>()
  }

  fn accumulate(&mut self, parent: Option<&mut P>, row: Option<&R>) -> AccumulateResult<()> {
    if !self.admit(row.is_some())? {
      return Ok(());
    }
    if row.is_some() {
      self.stats.record_row();
    }
    self.dispatch(parent, row)
  }

  fn transition(&mut self, parent: Option<&mut P>, row: Option<&R>) -> AccumulateResult<()> {
    if !self.admit(row.is_some())? {
      return Ok(());
    }
    if row.is_some() {
      self.stats.record_row();
    }
    self.run_transition(parent, row)
  }

  fn is_closed(&self) -> bool {
    self.closed
  }

  fn is_poisoned(&self) -> bool {
    self.poisoned
  }
}

impl<P, T, R, K> fmt::Debug for Node<P, T, R, K>
where
  T: fmt::Debug,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Node")
      .field("config", &self.config)
      .field("current", &self.current)
      .field("children", &self.children.len())
      .field("has_emitter", &self.emitter.is_some())
      .field("has_prev_emitter", &self.prev_emitter.is_some())
      .field("has_attach", &self.attach.is_some())
      .field("closed", &self.closed)
      .field("poisoned", &self.poisoned)
      .field("stats", &self.stats)
      .finish()
  }
}
