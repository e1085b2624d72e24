use std::{path::PathBuf, time::Duration};

use {
    anyhow::Result,
    async_trait::async_trait,
    tokio::process::Command,
    tracing::{debug, warn},
};

use steward_common::text::truncate_with_notice;

use crate::{
    registry::AgentTool,
    sandbox::{CommandPolicy, is_command_allowed},
};

/// Options controlling guarded execution.
#[derive(Debug, Clone)]
pub struct ExecOpts {
    pub timeout: Duration,
    pub max_output_bytes: usize,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Default for ExecOpts {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_output_bytes: 200 * 1024, // 200KB
            working_dir: None,
            env: Vec::new(),
        }
    }
}

/// Execute a command under the sandbox policy.
///
/// Never returns an error: the caller is an agent conversation that must
/// continue regardless of outcome. Disallowed commands yield a `BLOCKED:`
/// sentinel without spawning anything; process failures (spawn error,
/// non-zero exit, timeout) are rendered as formatted text with whatever
/// output was captured. The program is spawned directly with an argument
/// vector — never through a shell — so sandbox checks cannot be undone by
/// shell re-parsing. The result never exceeds `max_output_bytes` plus the
/// truncation notice.
pub async fn safe_exec(
    policy: &CommandPolicy,
    command: &str,
    args: &[String],
    opts: &ExecOpts,
) -> String {
    if !is_command_allowed(policy, command, args) {
        warn!(command, "blocked command");
        // Args are agent-supplied free text; the output bound applies to
        // the sentinel path too.
        let text = format!("BLOCKED: command not permitted: {command} {}", args.join(" "));
        return truncate_with_notice(&text, opts.max_output_bytes);
    }

    debug!(command, timeout_secs = opts.timeout.as_secs(), "safe_exec");

    let mut cmd = Command::new(command);
    cmd.args(args);
    if let Some(ref dir) = opts.working_dir {
        cmd.current_dir(dir);
    }
    for (k, v) in &opts.env {
        cmd.env(k, v);
    }

    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    // Prevent the child from inheriting stdin.
    cmd.stdin(std::process::Stdio::null());
    // Reap the child if the timeout drops the wait future.
    cmd.kill_on_drop(true);

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return format!("ERROR: failed to spawn {command}: {e}"),
    };

    let text = match tokio::time::timeout(opts.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.is_empty() {
                if !combined.is_empty() && !combined.ends_with('\n') {
                    combined.push('\n');
                }
                combined.push_str(&stderr);
            }

            let exit_code = output.status.code().unwrap_or(-1);
            debug!(exit_code, output_len = combined.len(), "exec done");

            if output.status.success() {
                combined
            } else {
                format!("ERROR: exit code {exit_code}\n{combined}")
            }
        },
        Ok(Err(e)) => format!("ERROR: failed to run {command}: {e}"),
        Err(_) => {
            warn!(command, "exec timeout");
            format!("ERROR: command timed out after {}s", opts.timeout.as_secs())
        },
    };

    truncate_with_notice(&text, opts.max_output_bytes)
}

/// The guarded exec tool exposed to the agent tool registry.
pub struct SafeExecTool {
    policy: CommandPolicy,
    pub default_timeout: Duration,
    pub max_output_bytes: usize,
    pub working_dir: Option<PathBuf>,
}

impl SafeExecTool {
    pub fn new(policy: CommandPolicy) -> Self {
        Self {
            policy,
            default_timeout: Duration::from_secs(30),
            max_output_bytes: 200 * 1024,
            working_dir: None,
        }
    }
}

#[async_trait]
impl AgentTool for SafeExecTool {
    fn name(&self) -> &str {
        "exec"
    }

    fn description(&self) -> &str {
        "Run an allowlisted program with an argument vector. Returns combined output."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Program name (must be on the allowlist)"
                },
                "args": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Argument vector"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds (default 30, max 1800)"
                },
                "working_dir": {
                    "type": "string",
                    "description": "Working directory for the command"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<serde_json::Value> {
        let command = params
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("missing 'command' parameter"))?;

        let args: Vec<String> = params
            .get("args")
            .and_then(|v| v.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let timeout_secs = params
            .get("timeout")
            .and_then(|v| v.as_u64())
            .unwrap_or(self.default_timeout.as_secs())
            .min(1800); // cap at 30 minutes

        let working_dir = params
            .get("working_dir")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .or_else(|| self.working_dir.clone());

        let opts = ExecOpts {
            timeout: Duration::from_secs(timeout_secs),
            max_output_bytes: self.max_output_bytes,
            working_dir,
            env: Vec::new(),
        };

        let text = safe_exec(&self.policy, command, &args, &opts).await;
        Ok(serde_json::Value::String(text))
    }
}
