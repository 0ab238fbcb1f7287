//! Tool registry and built-in tools.
//!
//! Tools are registered once at startup in [`ToolRegistry::new`]; the table
//! is immutable afterwards. Each tool declares its name, description, and a
//! JSON-schema parameter description, which the registry renders into the
//! provider's function-calling format. Argument validation runs against the
//! declared schema before a tool body executes, so a malformed call never
//! produces partial side effects.

mod image;
mod math;
mod text;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm::ToolDefinition;
use crate::resources::ResourceStore;

/// Errors from looking up or dispatching a tool call.
///
/// These are conversational: the executor folds them into a tool-result
/// turn so the model can react, rather than aborting the turn.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownFunction(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    ArgumentMismatch { tool: String, reason: String },

    #[error("tool '{tool}' failed: {cause}")]
    ExecutionFailure { tool: String, cause: anyhow::Error },
}

/// A callable the model may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as advertised to the model.
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments (object with `properties`
    /// and a `required` list).
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Artifact-producing tools write through `store`.
    async fn execute(&self, args: Value, store: &ResourceStore) -> anyhow::Result<String>;
}

/// Name and description of a registered tool, for prompt building.
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Static table of available tools, built once at startup.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a registry with the built-in tool set.
    pub fn new() -> Self {
        Self::with_tools(vec![
            Box::new(math::CalculateAverage),
            Box::new(math::Fibonacci),
            Box::new(text::TextStatistics),
            Box::new(image::DrawSineWave),
            Box::new(image::GenerateColorGradient),
            Box::new(image::ListArtifacts),
            Box::new(image::ClearArtifacts),
        ])
    }

    /// Create a registry from an explicit tool list (useful for testing).
    pub fn with_tools(tools: Vec<Box<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Names and descriptions of all registered tools, in registration order.
    pub fn list_tools(&self) -> Vec<ToolSummary> {
        self.tools
            .iter()
            .map(|t| ToolSummary {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Render every tool as a provider-format function definition.
    pub fn descriptors(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| {
                ToolDefinition::function(
                    t.name().to_string(),
                    t.description().to_string(),
                    t.parameters_schema(),
                )
            })
            .collect()
    }

    /// Look up a tool by name and run it with the given arguments.
    ///
    /// Arguments are checked against the tool's schema first; the tool body
    /// only runs once required parameters are present and well-typed.
    pub async fn invoke(
        &self,
        name: &str,
        args: Value,
        store: &ResourceStore,
    ) -> Result<String, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::UnknownFunction(name.to_string()))?;

        // Providers encode "no arguments" as null or {}.
        let args = if args.is_null() { json!({}) } else { args };

        if let Err(reason) = validate_args(&tool.parameters_schema(), &args) {
            return Err(ToolError::ArgumentMismatch {
                tool: name.to_string(),
                reason,
            });
        }

        tracing::info!(tool = name, "Invoking tool");
        tool.execute(args, store)
            .await
            .map_err(|cause| ToolError::ExecutionFailure {
                tool: name.to_string(),
                cause,
            })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check an argument object against a tool's parameter schema.
///
/// Verifies that `args` is an object, that every `required` property is
/// present, and that provided values match their declared `type` tag.
fn validate_args(schema: &Value, args: &Value) -> Result<(), String> {
    let Some(args_obj) = args.as_object() else {
        return Err(format!("expected an argument object, got {}", type_name(args)));
    };

    if let Some(required) = schema["required"].as_array() {
        for name in required.iter().filter_map(Value::as_str) {
            if !args_obj.contains_key(name) {
                return Err(format!("missing required parameter '{}'", name));
            }
        }
    }

    let Some(properties) = schema["properties"].as_object() else {
        return Ok(());
    };

    for (name, value) in args_obj {
        let Some(expected) = properties.get(name).and_then(|p| p["type"].as_str()) else {
            continue;
        };
        if !type_matches(expected, value) {
            return Err(format!(
                "parameter '{}' should be {}, got {}",
                name,
                expected,
                type_name(value)
            ));
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Tool that records whether its body ran.
    struct Probe {
        executed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Tool for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn description(&self) -> &str {
            "Test probe"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "needle": {"type": "string"}
                },
                "required": ["needle"]
            })
        }

        async fn execute(&self, args: Value, _store: &ResourceStore) -> anyhow::Result<String> {
            self.executed.store(true, Ordering::SeqCst);
            Ok(args["needle"].as_str().unwrap_or_default().to_string())
        }
    }

    fn probe_registry() -> (ToolRegistry, Arc<AtomicBool>, ResourceStore, tempfile::TempDir) {
        let executed = Arc::new(AtomicBool::new(false));
        let registry = ToolRegistry::with_tools(vec![Box::new(Probe {
            executed: executed.clone(),
        })]);
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::new(dir.path()).unwrap();
        (registry, executed, store, dir)
    }

    #[tokio::test]
    async fn invoke_returns_tool_value_unmodified() {
        let (registry, _, store, _dir) = probe_registry();
        let result = registry
            .invoke("probe", json!({"needle": "in a haystack"}), &store)
            .await
            .unwrap();
        assert_eq!(result, "in a haystack");
    }

    #[tokio::test]
    async fn unknown_name_is_rejected() {
        let (registry, _, store, _dir) = probe_registry();
        let err = registry.invoke("missing", json!({}), &store).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownFunction(name) if name == "missing"));
    }

    #[tokio::test]
    async fn missing_required_arg_does_not_execute_body() {
        let (registry, executed, store, _dir) = probe_registry();
        let err = registry.invoke("probe", json!({}), &store).await.unwrap_err();
        assert!(matches!(err, ToolError::ArgumentMismatch { .. }));
        assert!(!executed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn wrongly_typed_arg_does_not_execute_body() {
        let (registry, executed, store, _dir) = probe_registry();
        let err = registry
            .invoke("probe", json!({"needle": 7}), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ArgumentMismatch { .. }));
        assert!(!executed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn null_args_treated_as_empty_object() {
        let registry = ToolRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::new(dir.path()).unwrap();
        // list_artifacts takes no arguments
        let result = registry.invoke("list_artifacts", Value::Null, &store).await.unwrap();
        assert_eq!(result, "[]");
    }

    #[test]
    fn builtin_descriptors_are_complete() {
        let registry = ToolRegistry::new();
        let descriptors = registry.descriptors();
        assert_eq!(descriptors.len(), 7);
        for d in &descriptors {
            assert_eq!(d.kind, "function");
            assert!(!d.function.description.is_empty());
            assert!(d.function.parameters["type"] == "object");
        }
    }

    #[test]
    fn validate_rejects_non_object_args() {
        let schema = json!({"type": "object", "properties": {}, "required": []});
        assert!(validate_args(&schema, &json!("not an object")).is_err());
        assert!(validate_args(&schema, &json!({})).is_ok());
    }
}
