//! Tool registry, authorization policy, and the command sandbox.
//!
//! Layering: `sandbox`/`exec` guard what a shell-out may do, `policy`
//! decides per (tool, channel, sender) whether a tool is usable at all,
//! and `gate` composes the two worlds by filtering the registry per
//! invocation context. The sandbox knows nothing about policies or
//! approvals; it is a separate, narrower safety net.

pub mod exec;
pub mod gate;
pub mod policy;
pub mod registry;
pub mod sandbox;

pub use {
    exec::{SafeExecTool, safe_exec},
    gate::ToolGate,
    policy::{PolicyEffect, PolicyRule, evaluate},
    registry::{AgentTool, ToolRegistry},
    sandbox::{CommandPolicy, is_command_allowed},
};
