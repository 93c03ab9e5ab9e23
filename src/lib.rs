//! Seance - marketplace core for live metered readings
//!
//! This crate implements the billing and presence-coordination engine behind a
//! marketplace connecting clients to readers for live metered sessions,
//! scheduled appointments, and live-stream gifting, settled through an
//! internal dual-ledger wallet. The API layer, identity verification, and the
//! payment gateway's wire protocol live outside this crate.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,
    clippy::nursery,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// Configuration management for database connections and billing policy
pub mod config;
/// Core business logic - wallet, revenue split, sessions, appointments, billing
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Ephemeral TTL-based liveness tracking per (session, participant)
pub mod presence;
/// Connection registry - per-session peer sets and per-user notify channels
pub mod registry;
/// Background billing ticker driving per-minute charges
pub mod ticker;

#[cfg(test)]
pub mod test_utils;
