//! Core business logic - framework-agnostic operations over the entities.
//!
//! Each submodule exposes async functions over a `SeaORM` connection; the API
//! layer calls them directly and the background tickers drive the scheduled
//! ones. Money only ever moves through [`wallet`] and [`revenue`].

/// Appointment lifecycle - booking, tiered-refund cancellation, start, completion
pub mod appointment;
/// Reader availability windows
pub mod availability;
/// Per-minute billing primitive used by the ticker
pub mod billing;
/// Stream gifting
pub mod gift;
/// Reader payout runs against the payment gateway
pub mod payout;
/// Revenue split between reader payout balances and the platform
pub mod revenue;
/// Session lifecycle - request, accept, reject, end
pub mod session;
/// Client wallet - atomic credit/debit with the ledger append
pub mod wallet;
