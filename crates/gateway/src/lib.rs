//! HTTP gateway: the approval API consumed by external automation
//! clients (e.g. a remote coding session polling for a human decision)
//! and the tool-set endpoint consumed by channel adapters.

pub mod server;
pub mod state;

pub use server::{build_gateway_app, start_gateway};
