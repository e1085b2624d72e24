//! Channel seam.
//!
//! Delivery surfaces (messaging bot, terminal, web dashboard) plug in
//! through the outbound trait; the `gating` module interprets inbound
//! text as approval commands before it reaches the agent.

pub mod gating;
pub mod outbound;

pub use outbound::ChannelOutbound;
