//! Indexing engine for symdex.
//!
//! This crate walks parse trees delivered by the parser collaborator and
//! produces the symbol graph defined in `symdex-core`. It includes:
//! - Scope stack and symbol table building
//! - Documentation and decorator association
//! - Tree walking with node classification
//! - Relationship resolution (inheritance, composition, decoration,
//!   structural protocol satisfaction)
//! - The parallel multi-file driver with incremental re-indexing

pub mod assoc;
pub mod builder;
pub mod classify;
pub mod driver;
pub mod resolver;
pub mod scope;
pub mod test_utils;
pub mod walker;

pub use driver::{CancelFlag, IndexOptions, Indexer};
