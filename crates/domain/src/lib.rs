//! Domain layer for voxchain
//!
//! Contains the conversation model shared by every pipeline stage: messages,
//! the bounded conversation history, captured speech and the pipeline state.
//! This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
