//! Shared domain types for the schema intelligence engine.
//!
//! Single source of truth for all types crossing crate boundaries —
//! repositories, adapters, the workflow engine, and the query service all
//! speak in terms of these structs rather than redefining their own shapes.

pub mod alerts;
pub mod enums;
pub mod ids;
pub mod knowledge;
pub mod ontology;
pub mod provenance;
pub mod query;
pub mod schema;
pub mod workflow;

pub use enums::*;
pub use ids::*;
