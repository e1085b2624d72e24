use serde::{Deserialize, Serialize};

use steward_tools::policy::PolicyRule;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StewardConfig {
    pub tools: ToolsConfig,
    pub approvals: ApprovalsConfig,
    pub gateway: GatewayConfig,
}

/// Tool authorization configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Ordered policy rules, evaluated first-match-wins.
    pub rules: Vec<PolicyRule>,
    pub exec: ExecConfig,
}

/// Command sandbox configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Program names the sandbox may spawn.
    pub allowlist: Vec<String>,
    /// Extra blocked argument patterns (regex), layered on the built-ins.
    pub blocked_patterns: Vec<String>,
    pub timeout_secs: u64,
    pub max_output_bytes: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            allowlist: Vec::new(),
            blocked_patterns: Vec::new(),
            timeout_secs: 30,
            max_output_bytes: 200 * 1024,
        }
    }
}

/// Approval workflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalsConfig {
    /// Pending requests older than this are swept to `expired`.
    pub max_age_ms: u64,
    /// How often the gateway runs the expiry sweep.
    pub sweep_interval_secs: u64,
}

impl Default for ApprovalsConfig {
    fn default() -> Self {
        Self {
            max_age_ms: 10 * 60 * 1000, // 10 minutes
            sweep_interval_secs: 30,
        }
    }
}

/// Gateway server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 18790,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use steward_tools::policy::PolicyEffect;

    #[test]
    fn defaults_are_sane() {
        let config = StewardConfig::default();
        assert!(config.tools.rules.is_empty());
        assert_eq!(config.approvals.max_age_ms, 600_000);
        assert_eq!(config.gateway.port, 18790);
    }

    #[test]
    fn rules_parse_from_toml() {
        let raw = r#"
            [[tools.rules]]
            tool   = "exec"
            effect = "approve"
            users  = ["alice"]

            [[tools.rules]]
            tool   = "*"
            effect = "deny"

            [tools.exec]
            allowlist = ["ls", "git"]
        "#;
        let config: StewardConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.tools.rules.len(), 2);
        assert_eq!(config.tools.rules[0].effect, PolicyEffect::Approve);
        assert_eq!(config.tools.rules[1].tool, "*");
        assert_eq!(config.tools.exec.allowlist, vec!["ls", "git"]);
        // Defaults survive partial sections.
        assert_eq!(config.tools.exec.timeout_secs, 30);
    }
}
