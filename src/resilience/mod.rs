//! Resilience primitives shared by the store clients and the
//! reconcile worker.

pub mod retry;
