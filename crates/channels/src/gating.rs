use {anyhow::Result, tracing::info};

use steward_approvals::{ApprovalStore, parse_approval_command};

/// Interpret inbound channel text as an approval command.
///
/// Returns `Ok(None)` when the text is not an approval command (the
/// message should fall through to normal handling), otherwise the reply
/// text to send back on the same channel. Store failures propagate.
pub fn handle_approval_command(store: &ApprovalStore, text: &str) -> Result<Option<String>> {
    let Some(command) = parse_approval_command(text) else {
        return Ok(None);
    };

    let verb = match command.decision {
        steward_approvals::Decision::Allow => "allow",
        steward_approvals::Decision::Deny => "deny",
    };
    let reply = if store.get(&command.id)?.is_none() {
        format!("No approval request found with id {}", command.id)
    } else if store.decide(&command.id, command.decision)? {
        info!(id = %command.id, decision = verb, "approval decided via channel");
        format!("Recorded {verb} for {}", command.id)
    } else {
        format!("Request {} was already decided or expired", command.id)
    };

    Ok(Some(reply))
}
