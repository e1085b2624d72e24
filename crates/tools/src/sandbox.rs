use std::collections::HashSet;

use {
    anyhow::{Context, Result},
    once_cell::sync::Lazy,
    regex::Regex,
    tracing::warn,
};

/// Argument patterns that veto execution even for an allowlisted program.
///
/// The allowlist alone is necessary but not sufficient: even read-only
/// programs can be weaponized through crafted arguments, so this blocklist
/// is layered on top. Patterns are matched against the space-joined
/// argument vector.
const BLOCKED_PATTERN_SOURCES: &[&str] = &[
    // Shell chaining, pipes, background jobs, redirection.
    r"[;&|<>]",
    // Command and variable substitution.
    r"`",
    r"\$\(",
    r"\$\{",
    // Recursive force-delete flag combinations (rm -rf and friends).
    r"(^|\s)-[a-zA-Z]*r[a-zA-Z]*f[a-zA-Z]*(\s|$)",
    r"(^|\s)-[a-zA-Z]*f[a-zA-Z]*r[a-zA-Z]*(\s|$)",
    r"--no-preserve-root",
    // find's escape hatches: spawn arbitrary processes or delete files.
    r"(^|\s)-exec(dir)?(\s|$)",
    r"(^|\s)-delete(\s|$)",
    // rsync/git deletion and force-push combinations.
    r"--delete(-\w+)?(\s|$)",
    r"push(\s+\S+)*\s+(--force|-f)(\s|$)",
    // awk/find-style process spawns hidden in script arguments.
    r"\bsystem\s*\(",
];

static BLOCKED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    BLOCKED_PATTERN_SOURCES
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Static command execution policy: an allowlist of program names plus
/// extra blocked argument patterns from config. Loaded once; immutable.
#[derive(Debug, Clone, Default)]
pub struct CommandPolicy {
    allow: HashSet<String>,
    extra_blocked: Vec<Regex>,
}

impl CommandPolicy {
    /// Build a policy from configuration. Extra patterns are regular
    /// expressions; a malformed one is a hard config error.
    pub fn new(allowlist: &[String], extra_patterns: &[String]) -> Result<Self> {
        let extra_blocked = extra_patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("invalid blocked pattern '{p}'")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            allow: allowlist.iter().cloned().collect(),
            extra_blocked,
        })
    }

    pub fn allows_program(&self, command: &str) -> bool {
        self.allow.contains(command)
    }

    fn blocked_by(&self, joined_args: &str) -> Option<String> {
        for pattern in BLOCKED_PATTERNS.iter().chain(self.extra_blocked.iter()) {
            if pattern.is_match(joined_args) {
                return Some(pattern.as_str().to_string());
            }
        }
        None
    }
}

/// Pure allow/deny check: the program must be allowlisted and the joined
/// arguments must not match any blocked pattern.
pub fn is_command_allowed(policy: &CommandPolicy, command: &str, args: &[String]) -> bool {
    if !policy.allows_program(command) {
        return false;
    }
    let joined = args.join(" ");
    if let Some(pattern) = policy.blocked_by(&joined) {
        warn!(command, pattern = %pattern, "command arguments matched blocked pattern");
        return false;
    }
    true
}
