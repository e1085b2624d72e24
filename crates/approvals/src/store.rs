use std::sync::Arc;

use {
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

use {
    steward_common::{ids::new_id, text::truncate_with_notice, time::now_ms},
    steward_storage::KvStore,
};

const NAMESPACE: &str = "approvals";
/// Reserved key holding the ordered list of pending ids.
const PENDING_KEY: &str = "_pending";
/// Input summaries are free text from an agent; cap what we persist.
const INPUT_SUMMARY_MAX: usize = 2048;

/// Lifecycle of an approval request. Transitions only occur out of
/// `Pending`, and only into one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Allow,
    Deny,
    Expired,
}

impl ApprovalStatus {
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }
}

/// A human decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl From<Decision> for ApprovalStatus {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Allow => Self::Allow,
            Decision::Deny => Self::Deny,
        }
    }
}

/// A persisted approval request. Identity is the `id`; once terminal, the
/// record is immutable and kept for later inspection, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: String,
    pub tool: String,
    pub input: String,
    pub session: String,
    pub requester: String,
    pub status: ApprovalStatus,
    pub created_at_ms: u64,
}

/// Approval state machine over the durable store.
///
/// Safe to drive from independent processes: there is no in-process
/// locking between the poller and the decider, only the store's per-write
/// atomicity. Store failures propagate — masking a lost decision is worse
/// than a loud error.
#[derive(Clone)]
pub struct ApprovalStore {
    store: Arc<dyn KvStore>,
}

impl ApprovalStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Create a pending request and return its fresh id.
    pub fn request_approval(
        &self,
        tool: &str,
        input: &str,
        session: &str,
        requester: &str,
    ) -> Result<String> {
        let id = new_id();
        let record = ApprovalRequest {
            id: id.clone(),
            tool: tool.to_string(),
            input: truncate_with_notice(input, INPUT_SUMMARY_MAX),
            session: session.to_string(),
            requester: requester.to_string(),
            status: ApprovalStatus::Pending,
            created_at_ms: now_ms(),
        };

        // Pending list first: a crash between the two writes leaves a
        // stale entry that list_pending silently drops, never an
        // invisible pending record.
        let mut pending = self.pending_ids()?;
        pending.push(id.clone());
        self.write_pending(&pending)?;
        self.write_record(&record)?;

        info!(id = %id, tool, requester, "approval requested");
        Ok(id)
    }

    /// Apply a decision. No-op (returns `false`) when the record is absent
    /// or already terminal — double submissions and decisions arriving
    /// after expiry are expected and harmless.
    pub fn decide(&self, id: &str, decision: Decision) -> Result<bool> {
        let Some(mut record) = self.get(id)? else {
            debug!(id, "decide on unknown id ignored");
            return Ok(false);
        };
        if record.status.is_terminal() {
            debug!(id, status = ?record.status, "decide on terminal record ignored");
            return Ok(false);
        }

        record.status = decision.into();
        self.write_record(&record)?;
        self.remove_pending(id)?;

        info!(id, decision = ?decision, "approval decided");
        Ok(true)
    }

    /// Sweep the pending list, expiring requests at least `max_age_ms` old.
    /// Must be invoked explicitly (the gateway schedules it); clients
    /// never assume it has run. Returns how many requests expired.
    pub fn expire_older_than(&self, max_age_ms: u64) -> Result<usize> {
        let now = now_ms();
        let mut expired = 0usize;

        for id in self.pending_ids()? {
            let Some(mut record) = self.get(&id)? else {
                // Stale entry without a backing record; drop it.
                self.remove_pending(&id)?;
                continue;
            };
            if record.status.is_terminal() {
                self.remove_pending(&id)?;
                continue;
            }
            if now.saturating_sub(record.created_at_ms) >= max_age_ms {
                record.status = ApprovalStatus::Expired;
                self.write_record(&record)?;
                self.remove_pending(&id)?;
                expired += 1;
            }
        }

        if expired > 0 {
            info!(expired, "expired stale approval requests");
        }
        Ok(expired)
    }

    pub fn get(&self, id: &str) -> Result<Option<ApprovalRequest>> {
        if id == PENDING_KEY {
            return Ok(None);
        }
        match self.store.get(NAMESPACE, id)? {
            Some(value) => Ok(Some(
                serde_json::from_value(value).context("corrupt approval record")?,
            )),
            None => Ok(None),
        }
    }

    /// All requests currently pending, in creation order. Ids whose
    /// backing record is missing or no longer pending are dropped.
    pub fn list_pending(&self) -> Result<Vec<ApprovalRequest>> {
        let mut out = Vec::new();
        for id in self.pending_ids()? {
            if let Some(record) = self.get(&id)?
                && record.status == ApprovalStatus::Pending
            {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn pending_ids(&self) -> Result<Vec<String>> {
        match self.store.get(NAMESPACE, PENDING_KEY)? {
            Some(value) => {
                serde_json::from_value(value).context("corrupt pending list")
            },
            None => Ok(Vec::new()),
        }
    }

    fn write_pending(&self, ids: &[String]) -> Result<()> {
        self.store
            .set(NAMESPACE, PENDING_KEY, serde_json::to_value(ids)?)
    }

    fn remove_pending(&self, id: &str) -> Result<()> {
        let mut pending = self.pending_ids()?;
        pending.retain(|p| p != id);
        self.write_pending(&pending)
    }

    fn write_record(&self, record: &ApprovalRequest) -> Result<()> {
        self.store
            .set(NAMESPACE, &record.id, serde_json::to_value(record)?)
    }
}
