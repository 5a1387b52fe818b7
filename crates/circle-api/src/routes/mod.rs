//! # API Route Modules
//!
//! - `winner`: winner calculation for a circle-month.
//! - `circles`: circle details, per-month voting status, and factory
//!   listings.
//! - `credit`: credit score and profile lookups.
//! - `chat`: per-circle chat history over REST and the `/ws` relay.

pub mod chat;
pub mod circles;
pub mod credit;
pub mod winner;
