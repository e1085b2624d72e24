use {anyhow::Result, async_trait::async_trait, std::collections::HashMap, tracing::debug};

/// Agent-callable tool.
///
/// `execute` returns `Err` only for invalid input; expected failures
/// (blocked command, non-zero exit, timeout) are rendered as descriptive
/// text in the `Ok` value, because results are relayed verbatim into an
/// ongoing agent conversation.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> serde_json::Value;
    async fn execute(&self, params: serde_json::Value) -> Result<serde_json::Value>;
}

/// Registry of available tools for an agent run.
///
/// Registration is append-only and rejects duplicate names; a collision is
/// a wiring bug, not something to paper over with last-write-wins.
pub struct ToolRegistry {
    tools: Vec<Box<dyn AgentTool>>,
    index: HashMap<String, usize>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Box<dyn AgentTool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            anyhow::bail!("tool '{name}' is already registered");
        }
        debug!(tool = %name, "tool registered");
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Register a tool contributed by an external provider (plugin, MCP
    /// server). Same collision rules as `register`.
    pub fn register_external(&mut self, tool: Box<dyn AgentTool>) -> Result<()> {
        self.register(tool)
    }

    pub fn get(&self, name: &str) -> Option<&dyn AgentTool> {
        self.index.get(name).map(|i| self.tools[*i].as_ref())
    }

    /// All registered tools in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn AgentTool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn list_schemas(&self) -> Vec<serde_json::Value> {
        self.tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "parameters": t.parameters_schema(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl AgentTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input back."
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object" })
        }

        async fn execute(&self, params: serde_json::Value) -> Result<serde_json::Value> {
            Ok(params)
        }
    }

    #[test]
    fn register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("other").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let err = registry.register(Box::new(EchoTool)).unwrap_err();
        assert!(err.to_string().contains("already registered"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn schemas_include_name_and_description() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool)).unwrap();
        let schemas = registry.list_schemas();
        assert_eq!(schemas[0]["name"], "echo");
        assert!(schemas[0]["description"].as_str().is_some());
    }
}
