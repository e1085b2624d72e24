//! Durable human-in-the-loop approval workflow.
//!
//! A sensitive action creates a pending record and polls it; a human, via
//! a messaging channel or the HTTP API, submits the decision that mutates
//! the same record. The two sides never talk directly — the rendezvous is
//! the durable store, which is what lets a remote automation client block
//! on a decision made minutes later in a different process.

pub mod commands;
pub mod store;

pub use {
    commands::{ApprovalCommand, parse_approval_command},
    store::{ApprovalRequest, ApprovalStatus, ApprovalStore, Decision},
};
