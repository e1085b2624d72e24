use {
    serde::{Deserialize, Serialize},
    tracing::debug,
};

/// Effect of a matching policy rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyEffect {
    Allow,
    Deny,
    Approve,
}

/// A single ordered policy rule.
///
/// Empty `channels`/`users` sets mean "any". The rule list is loaded once
/// at startup and is immutable during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Tool matcher: exact name, `*`, or a `prefix*` glob.
    pub tool: String,
    pub effect: PolicyEffect,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

/// Check if a tool name matches a rule pattern (supports `*` wildcard).
fn pattern_matches(pattern: &str, name: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return name.starts_with(prefix);
    }
    pattern == name
}

impl PolicyRule {
    fn matches(&self, tool: &str, channel: &str, sender: &str) -> bool {
        pattern_matches(&self.tool, tool)
            && (self.channels.is_empty() || self.channels.iter().any(|c| c == channel))
            && (self.users.is_empty() || self.users.iter().any(|u| u == sender))
    }
}

/// Evaluate the ordered rule list for a (tool, channel, sender) triple.
///
/// The first matching rule wins — this is the security contract. Specific
/// allow rules placed before a general deny create exceptions, so rule
/// order must be preserved exactly. No match falls open to `Allow`;
/// operators get fail-closed behavior by appending a wildcard deny rule.
pub fn evaluate(rules: &[PolicyRule], tool: &str, channel: &str, sender: &str) -> PolicyEffect {
    for rule in rules {
        if rule.matches(tool, channel, sender) {
            debug!(tool, channel, sender, effect = ?rule.effect, rule = %rule.tool, "policy matched");
            return rule.effect;
        }
    }
    PolicyEffect::Allow
}
