//! # RowWeave
//!
//! Fold ordered, flat row streams into trees of deduplicated entities.
//!
//! RowWeave turns a stream such as the result of a SQL join, ordered by the parent key, into
//! parent entities with their 1:N children attached. It detects entity boundaries purely from the
//! order and equality of keys extracted from each row, so it never sorts and never buffers more
//! than one open entity per tree level.
//!
//! ## Key Features
//!
//! - **One Component**: a single [`Node`](node::Node) type reused at every level of the tree
//! - **Two Emission Channels**: an immediate emitter for early access and a previous-entity
//!   emitter that only ever sees complete entities
//! - **Composable**: child nodes build sub-entities and link them into the parent through an
//!   attach hook
//! - **Fail Fast**: every policy is fallible and failures propagate to the driver untouched
//!
//! ## Quick Start
//!
//! ```rust
//! use rowweave::driver;
//! use rowweave::node::{Node, RootNode};
//! use rowweave::sink::Collector;
//!
//! type Row = (u32, &'static str);
//!
//! #[derive(Debug, Clone)]
//! struct Author {
//!   id: u32,
//!   books: Vec<String>,
//! }
//!
//! let authors = Collector::new();
//! let mut root = RootNode::new(
//!   |row: &Row| row.0,
//!   |author: &Author| author.id,
//!   |row: &Row| Author { id: row.0, books: Vec::new() },
//! )
//! .with_prev_emitter(authors.sink())
//! .with_child(
//!   Node::new(
//!     |row: &Row| row.1,
//!     |book: &&'static str| *book,
//!     |row: &Row| row.1,
//!   )
//!   .with_attach(|author: &mut Author, book: &&'static str| author.books.push(book.to_string())),
//! );
//!
//! driver::feed(&mut root, [(1, "Dune"), (1, "Emma"), (2, "Ulysses")]).unwrap();
//! assert_eq!(authors.snapshot()[0].books, vec!["Dune", "Emma"]);
//! ```

#![deny(missing_docs)]

/// Stream drivers that feed a row source through a tree.
pub mod driver;
/// Error types for accumulation.
pub mod error;
/// JSON Lines row adapters.
pub mod json;
/// Per-node counters.
pub mod metrics;
/// The accumulating node and its chaining trait.
pub mod node;
/// Shared entity handles.
pub mod shared;
/// List-collecting sinks.
pub mod sink;

pub use error::{AccumulateError, AccumulateResult, BoxError, ComponentInfo, Stage};
pub use node::{Accumulate, Node, NodeConfig, RootNode};

#[cfg(test)]
mod json_test;
