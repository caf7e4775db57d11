//! Common utilities and shared types for liveq.
//!
//! This crate provides foundational components used across all liveq crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Code generation**: Session tokens and event access codes via [`CodeGenerator`]
//! - **Format validation**: Slug and host code format checks
//!
//! # Example
//!
//! ```no_run
//! use liveq_common::{AppResult, CodeGenerator, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let codes = CodeGenerator::new();
//!     let token = codes.generate_session_token();
//!     println!("Minted session token: {}", token);
//!     Ok(())
//! }
//! ```

pub mod codes;
pub mod config;
pub mod error;

pub use codes::{CodeGenerator, is_valid_custom_host_code, is_valid_host_code, is_valid_slug};
pub use config::Config;
pub use error::{AppError, AppResult};
