use {anyhow::Result, async_trait::async_trait};

/// Send text to a delivery surface (messaging bot, terminal, web
/// dashboard). Each adapter implements this; the gateway drives it to
/// announce new approval requests to the human on the other end.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, account_id: &str, to: &str, text: &str) -> Result<()>;
}
