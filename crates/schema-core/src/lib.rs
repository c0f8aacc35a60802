//! Tenant context, the error taxonomy, the precedence checker, and the
//! repository/adapter/LLM/audit port traits every other crate in the
//! workspace programs against.

pub mod context;
pub mod error;
pub mod ports;
pub mod precedence;

pub use context::TenantScope;
pub use error::{Result, SchemaIntelError};
