use std::sync::Arc;

use {steward_approvals::ApprovalStore, steward_channels::ChannelOutbound, steward_tools::ToolGate};

/// Where to announce new approval requests: a channel outbound plus the
/// account/recipient to address.
pub struct ApprovalNotifier {
    pub outbound: Arc<dyn ChannelOutbound>,
    pub account_id: String,
    pub to: String,
}

/// Shared gateway runtime state, wrapped in Arc for use across async tasks.
pub struct GatewayState {
    pub approvals: ApprovalStore,
    pub gate: ToolGate,
    /// Optional human-facing notifier for new approval requests.
    pub notifier: Option<ApprovalNotifier>,
    /// Server version string.
    pub version: String,
}

impl GatewayState {
    pub fn new(approvals: ApprovalStore, gate: ToolGate) -> Arc<Self> {
        Self::with_notifier(approvals, gate, None)
    }

    pub fn with_notifier(
        approvals: ApprovalStore,
        gate: ToolGate,
        notifier: Option<ApprovalNotifier>,
    ) -> Arc<Self> {
        Arc::new(Self {
            approvals,
            gate,
            notifier,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}
