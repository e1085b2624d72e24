use tracing::debug;

use crate::{
    policy::{PolicyEffect, PolicyRule, evaluate},
    registry::{AgentTool, ToolRegistry},
};

/// Filters the tool registry per invocation context.
///
/// Tools decided `Deny` are invisible to the agent; `Allow` and `Approve`
/// tools are exposed. `Approve` does not intercept execution here — it is
/// an extension point: executors that want a human in the loop call
/// `decision_for` and route through the approval store themselves.
pub struct ToolGate {
    registry: ToolRegistry,
    rules: Vec<PolicyRule>,
}

impl ToolGate {
    pub fn new(registry: ToolRegistry, rules: Vec<PolicyRule>) -> Self {
        Self { registry, rules }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Policy decision for a single tool in context.
    pub fn decision_for(&self, tool: &str, channel: &str, sender: &str) -> PolicyEffect {
        evaluate(&self.rules, tool, channel, sender)
    }

    /// Tools visible to the given (channel, sender) context.
    pub fn tools_for_context(&self, channel: &str, sender: &str) -> Vec<&dyn AgentTool> {
        let tools: Vec<&dyn AgentTool> = self
            .registry
            .iter()
            .filter(|t| self.decision_for(t.name(), channel, sender) != PolicyEffect::Deny)
            .collect();
        debug!(
            channel,
            sender,
            visible = tools.len(),
            total = self.registry.len(),
            "resolved tool set"
        );
        tools
    }

    /// Schemas for the visible tools, in registry order — what actually
    /// gets handed to the model.
    pub fn schemas_for_context(&self, channel: &str, sender: &str) -> Vec<serde_json::Value> {
        self.tools_for_context(channel, sender)
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
