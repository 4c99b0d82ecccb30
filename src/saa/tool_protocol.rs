//! Tool protocol layer used by tool-enabled assistants.
//!
//! A [`ToolProtocol`] executes named tools; a [`ToolRegistry`] lists the tools an assistant
//! may call and routes each call to the protocol that owns it.
//!
//! ```text
//! Assistant → ToolRegistry → ToolProtocol (trait) → [FileSystemTool | user-defined]
//! ```
//!
//! Assistants learn about the tools through their prompt and request one by answering with
//! a JSON fragment, which [`parse_tool_call`] extracts:
//!
//! ```json
//! {"tool_call": {"name": "read_file", "parameters": {"path": "notes.md"}}}
//! ```
//!
//! # Example
//!
//! ```rust
//! use saa_orchestrator::tool_protocol::{parse_tool_call, ToolParameter, ToolParameterType};
//!
//! let param = ToolParameter::new("path", ToolParameterType::String)
//!     .with_description("File path relative to the workspace")
//!     .required();
//! assert!(param.required);
//!
//! let call = parse_tool_call(
//!     r#"Let me check. {"tool_call": {"name": "list_files", "parameters": {}}}"#,
//! )
//! .unwrap();
//! assert_eq!(call.name, "list_files");
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

/// Result of one tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: serde_json::Value,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: serde_json::Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolParameterType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// One named argument of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ToolParameterType,
    pub description: Option<String>,
    pub required: bool,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, param_type: ToolParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: None,
            required: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// What an assistant is told about a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }
}

/// Executes tools by name.
///
/// Application-level failures (a missing file, say) come back as
/// [`ToolResult::failure`]; `Err` is kept for calls that could not be carried out at all,
/// such as unknown tools or malformed parameters.
#[async_trait]
pub trait ToolProtocol: Send + Sync {
    async fn execute(
        &self,
        tool_name: &str,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>>;

    async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>>;

    async fn get_tool_metadata(
        &self,
        tool_name: &str,
    ) -> Result<ToolMetadata, Box<dyn Error + Send + Sync>> {
        self.list_tools()
            .await?
            .into_iter()
            .find(|tool| tool.name == tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()).into())
    }

    /// Protocol identifier, e.g. "filesystem".
    fn protocol_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// A tool bound to the protocol that executes it.
pub struct Tool {
    metadata: ToolMetadata,
    protocol: Arc<dyn ToolProtocol>,
}

impl Tool {
    pub fn new(metadata: ToolMetadata, protocol: Arc<dyn ToolProtocol>) -> Self {
        Self { metadata, protocol }
    }

    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    pub async fn execute(
        &self,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        self.protocol.execute(&self.metadata.name, parameters).await
    }
}

/// Tools available to an assistant, keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `tools`, all executed by `protocol`.
    pub fn from_metadata(protocol: Arc<dyn ToolProtocol>, tools: Vec<ToolMetadata>) -> Self {
        let mut registry = Self::new();
        for metadata in tools {
            registry.add_tool(Tool::new(metadata, Arc::clone(&protocol)));
        }
        registry
    }

    /// Insert or replace a tool definition.
    pub fn add_tool(&mut self, tool: Tool) {
        self.tools.insert(tool.metadata.name.clone(), tool);
    }

    pub fn remove_tool(&mut self, name: &str) -> Option<Tool> {
        self.tools.remove(name)
    }

    pub fn get_tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Metadata of every registered tool, in name order.
    pub fn list_tools(&self) -> Vec<&ToolMetadata> {
        self.tools.values().map(|t| &t.metadata).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: serde_json::Value,
    ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        tool.execute(parameters).await
    }
}

/// A tool invocation requested by a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub parameters: serde_json::Value,
}

/// Find the first `{"tool_call": {"name": ..., "parameters": {...}}}` fragment in `response`.
///
/// Text around the fragment is ignored. A fragment without a string `name` is not a call;
/// missing `parameters` default to an empty object.
pub fn parse_tool_call(response: &str) -> Option<ToolCall> {
    let start = response.find("{\"tool_call\"")?;
    let mut stream =
        serde_json::Deserializer::from_str(&response[start..]).into_iter::<serde_json::Value>();
    let parsed = stream.next()?.ok()?;

    let call = parsed.get("tool_call")?;
    let name = call.get("name")?.as_str()?;
    let parameters = call
        .get("parameters")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    Some(ToolCall {
        name: name.to_string(),
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockProtocol;

    #[async_trait]
    impl ToolProtocol for MockProtocol {
        async fn execute(
            &self,
            tool_name: &str,
            _parameters: serde_json::Value,
        ) -> Result<ToolResult, Box<dyn Error + Send + Sync>> {
            Ok(ToolResult::success(json!({
                "tool": tool_name,
                "result": "mock_result"
            })))
        }

        async fn list_tools(&self) -> Result<Vec<ToolMetadata>, Box<dyn Error + Send + Sync>> {
            Ok(vec![
                ToolMetadata::new("zeta", "Last tool"),
                ToolMetadata::new("alpha", "First tool").with_parameter(
                    ToolParameter::new("x", ToolParameterType::Number).required(),
                ),
            ])
        }

        fn protocol_name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn test_tool_parameter_builder() {
        let param = ToolParameter::new("path", ToolParameterType::String)
            .with_description("A file path")
            .required();

        assert_eq!(param.name, "path");
        assert_eq!(param.param_type, ToolParameterType::String);
        assert_eq!(param.description.as_deref(), Some("A file path"));
        assert!(param.required);
    }

    async fn mock_registry() -> ToolRegistry {
        let tools = MockProtocol.list_tools().await.unwrap();
        ToolRegistry::from_metadata(Arc::new(MockProtocol), tools)
    }

    #[tokio::test]
    async fn test_registry_lists_protocol_tools_in_name_order() {
        let registry = mock_registry().await;

        let names: Vec<&str> = registry.list_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(registry.get_tool("alpha").unwrap().metadata().parameters.len(), 1);

        let result = registry.execute_tool("zeta", json!({})).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output["tool"], "zeta");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let mut registry = mock_registry().await;
        assert!(registry.remove_tool("zeta").is_some());
        assert_eq!(registry.len(), 1);
        let err = registry.execute_tool("missing", json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: missing");

        let err = MockProtocol.get_tool_metadata("missing").await.unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_parse_tool_call_inside_prose() {
        let response = r#"I will save it now.
{"tool_call": {"name": "create_file", "parameters": {"path": "a.md", "content": "{not json}"}}}
Done."#;
        let call = parse_tool_call(response).unwrap();
        assert_eq!(call.name, "create_file");
        assert_eq!(call.parameters["path"], "a.md");
        assert_eq!(call.parameters["content"], "{not json}");
    }

    #[test]
    fn test_parse_tool_call_rejects_non_calls() {
        assert!(parse_tool_call("Just an answer.").is_none());
        assert!(parse_tool_call(r#"{"tool_call": {"parameters": {}}}"#).is_none());
        assert!(parse_tool_call(r#"{"tool_call": {"name": "x", "#).is_none());

        let call = parse_tool_call(r#"{"tool_call": {"name": "list_files"}}"#).unwrap();
        assert_eq!(call.parameters, json!({}));
    }
}
