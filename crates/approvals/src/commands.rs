use crate::store::Decision;

/// A parsed human-channel approval command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalCommand {
    pub id: String,
    pub decision: Decision,
}

/// Parse `/allow <id>` and `/deny <id>` from free channel text.
///
/// Anything else — different commands, missing ids, trailing words — is
/// not an approval command and returns `None` so the message falls
/// through to normal handling.
pub fn parse_approval_command(text: &str) -> Option<ApprovalCommand> {
    let mut parts = text.split_whitespace();
    let command = parts.next()?;
    let id = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let decision = match command {
        "/allow" => Decision::Allow,
        "/deny" => Decision::Deny,
        _ => return None,
    };

    Some(ApprovalCommand {
        id: id.to_string(),
        decision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_allow_and_deny() {
        let cmd = parse_approval_command("/allow abc-123").unwrap();
        assert_eq!(cmd.id, "abc-123");
        assert_eq!(cmd.decision, Decision::Allow);

        let cmd = parse_approval_command("/deny abc-123").unwrap();
        assert_eq!(cmd.decision, Decision::Deny);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let cmd = parse_approval_command("  /deny   abc  ").unwrap();
        assert_eq!(cmd.id, "abc");
    }

    #[test]
    fn rejects_non_commands() {
        assert!(parse_approval_command("hello there").is_none());
        assert!(parse_approval_command("/allow").is_none());
        assert!(parse_approval_command("/allow id extra").is_none());
        assert!(parse_approval_command("/block abc").is_none());
        assert!(parse_approval_command("").is_none());
    }
}
