//! Core business logic for liveq.

pub mod services;

pub use services::*;
