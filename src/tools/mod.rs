//! Tool metadata: parameter schemas, the descriptor registry, and the fixed
//! catalog of Jyotish tools.

mod catalog;
mod registry;
pub mod schema;

pub use catalog::{VARGAS, jyotish_catalog};
pub use registry::{
    ArgumentMapper, RegistryError, ToolDescriptor, ToolRegistry, merge_action_payload,
};
pub use schema::{
    FieldKind, FieldSpec, ParamSchema, SchemaViolations, ValidatedArguments, Violation,
};
