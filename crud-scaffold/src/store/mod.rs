//! Entity-set abstraction over the backing store
//!
//! The CRUD core reaches persistence only through [`EntitySet`]: `find_one`,
//! `find_all`, `add`, `update` and `save`. Any implementation (SQL, document
//! store, the bundled [`MemoryEntitySet`]) reports failures as [`StoreError`].

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreErrorKind, StoreOperation};
pub use memory::MemoryEntitySet;
pub use traits::{EntitySet, Predicate, StoreResult};
