//! Tool registry: the immutable catalog mapping tool names to their schema
//! and routing metadata.
//!
//! Built once at startup and shared behind an `Arc`. There are no mutation
//! methods once the builder chain has finished.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rmcp::model::{JsonObject, Tool as McpTool};
use serde_json::Value;

use crate::tools::schema::{ParamSchema, SchemaViolations, ValidatedArguments};
use crate::types::{ActionName, ToolName, WorkerId};
use crate::worker::WorkerCall;

/// Turns validated arguments into the call sent to a worker.
pub type ArgumentMapper = fn(&ToolDescriptor, ValidatedArguments) -> WorkerCall;

/// Default mapper: `{action, ...validated}`.
///
/// `action` is written first and a same-named argument never replaces it.
pub fn merge_action_payload(descriptor: &ToolDescriptor, args: ValidatedArguments) -> WorkerCall {
    let mut payload = JsonObject::new();
    payload.insert(
        "action".to_string(),
        Value::String(descriptor.action().as_str().to_string()),
    );
    for (key, value) in args.into_inner() {
        if key != "action" {
            payload.insert(key, value);
        }
    }

    WorkerCall {
        worker: descriptor.worker().clone(),
        action: descriptor.action().clone(),
        payload,
    }
}

/// Everything the dispatcher needs to know about one tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: ToolName,
    description: Cow<'static, str>,
    schema: ParamSchema,
    worker: WorkerId,
    action: ActionName,
    mapper: ArgumentMapper,
}

impl ToolDescriptor {
    /// Create a descriptor that uses [`merge_action_payload`].
    pub fn new(
        name: impl Into<ToolName>,
        description: impl Into<Cow<'static, str>>,
        schema: ParamSchema,
        worker: impl Into<WorkerId>,
        action: impl Into<ActionName>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            worker: worker.into(),
            action: action.into(),
            mapper: merge_action_payload,
        }
    }

    /// Replace the argument mapper.
    pub fn with_mapper(mut self, mapper: ArgumentMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn name(&self) -> &ToolName {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    pub fn worker(&self) -> &WorkerId {
        &self.worker
    }

    pub fn action(&self) -> &ActionName {
        &self.action
    }

    /// Validate raw arguments against this tool's schema.
    pub fn validate(&self, raw: &JsonObject) -> Result<ValidatedArguments, SchemaViolations> {
        self.schema.validate(raw)
    }

    /// Build the worker call for already-validated arguments.
    pub fn build_call(&self, args: ValidatedArguments) -> WorkerCall {
        (self.mapper)(self, args)
    }

    /// Converts this descriptor to an `McpTool` for use in `list_tools`.
    pub fn to_mcp_tool(&self) -> McpTool {
        McpTool::new(
            Cow::Owned(self.name.as_str().to_string()),
            self.description.clone(),
            Arc::new(self.schema.to_json_schema()),
        )
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("worker", &self.worker)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Two descriptors share a name.
    DuplicateTool(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateTool(name) => {
                write!(f, "Tool registered more than once: {}", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Ordered, name-indexed set of tool descriptors.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Names must be unique.
    pub fn register(mut self, descriptor: ToolDescriptor) -> Result<Self, RegistryError> {
        let name = descriptor.name().as_str().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(descriptor);
        Ok(self)
    }

    /// Look up a descriptor by tool name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// All descriptors, in declaration order.
    pub fn list_all(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// List all registered tool names, in declaration order.
    pub fn list_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name().as_str()).collect()
    }

    /// Get all registered tools as `McpTool` instances for `list_tools`.
    pub fn list_tools(&self) -> Vec<McpTool> {
        self.tools.iter().map(ToolDescriptor::to_mcp_tool).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::FieldKind;
    use serde_json::json;

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(
            name.to_string(),
            "test tool",
            ParamSchema::new().required("chart_id", FieldKind::Text, "id"),
            "chart_calculator",
            "read",
        )
    }

    #[test]
    fn test_registry_preserves_declaration_order() {
        let registry = ToolRegistry::new()
            .register(descriptor("zeta"))
            .unwrap()
            .register(descriptor("alpha"))
            .unwrap()
            .register(descriptor("mu"))
            .unwrap();

        assert_eq!(registry.list_names(), vec!["zeta", "alpha", "mu"]);
        assert_eq!(registry.list_all().len(), 3);
        assert!(registry.lookup("alpha").is_some());
        assert!(registry.lookup("missing").is_none());
        assert_eq!(registry.lookup("mu").unwrap().name(), "mu");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = ToolRegistry::new()
            .register(descriptor("chart_read"))
            .unwrap()
            .register(descriptor("chart_read"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("chart_read".to_string()));
    }

    #[test]
    fn test_merge_puts_action_first_and_keeps_it() {
        let schema = ParamSchema::new()
            .required("chart_id", FieldKind::Text, "id")
            .optional("action", FieldKind::Text, "colliding field");
        let tool = ToolDescriptor::new("t", "d", schema, "w", "read");

        let args = tool
            .validate(json!({"chart_id": "abc", "action": "delete"}).as_object().unwrap())
            .unwrap();
        let call = tool.build_call(args);

        assert_eq!(call.worker.as_str(), "w");
        let keys: Vec<&String> = call.payload.keys().collect();
        assert_eq!(keys, vec!["action", "chart_id"]);
        assert_eq!(call.payload["action"], json!("read"));
    }

    #[test]
    fn test_custom_mapper() {
        fn upper_id(descriptor: &ToolDescriptor, args: ValidatedArguments) -> WorkerCall {
            let mut call = merge_action_payload(descriptor, args);
            if let Some(Value::String(id)) = call.payload.get_mut("chart_id") {
                *id = id.to_uppercase();
            }
            call
        }

        let tool = descriptor("chart_read").with_mapper(upper_id);
        let args = tool
            .validate(json!({"chart_id": "abc"}).as_object().unwrap())
            .unwrap();
        assert_eq!(tool.build_call(args).payload["chart_id"], json!("ABC"));
    }

    #[test]
    fn test_to_mcp_tool() {
        let tool = descriptor("chart_read").to_mcp_tool();
        assert_eq!(tool.name, "chart_read");
        assert_eq!(tool.description.as_deref(), Some("test tool"));
        assert_eq!(tool.input_schema.get("required"), Some(&json!(["chart_id"])));
    }
}
