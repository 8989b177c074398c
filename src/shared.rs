//! Shared entity handles.
//!
//! Emitters receive borrowed entities. A sink that stores what it receives and still wants to see
//! children attached later in the same group has to store a handle to the entity rather than a
//! copy of it. [`Shared`] is that handle: cloning it clones the pointer, and comparing two
//! handles compares the entities they point to.

use std::cell::RefCell;
use std::rc::Rc;

/// A reference-counted, interior-mutable entity handle.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps an entity in a [`Shared`] handle.
pub fn shared<T>(entity: T) -> Shared<T> {
  Rc::new(RefCell::new(entity))
}
