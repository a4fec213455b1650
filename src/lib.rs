//! Foco - task lifecycle client for a remote to-do service
//!
//! This library provides the client-side core of the to-do application:
//! - Data models for tasks and undoable actions
//! - Repository layer for the remote task service, with field normalization
//! - Per-view task controllers applying optimistic transitions with rollback
//! - Bulk actions over a selection, single-slot undo and transient notices
//! - Trash retention: countdowns and exactly-once expiry purges
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use foco::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod repo;
pub mod lifecycle;
pub mod cli;
pub mod utils;
