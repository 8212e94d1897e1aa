//! Snapshot manager for the single database file of a containerized app.
//!
//! ```text
//! main.rs        parse args, init logging, print, exit codes
//!   │
//!   ▼
//! manager/       backup, list, restore (safety copy + rollback), import, prune
//!   │       │
//!   ▼       ▼
//! store/    exec/        confirm.rs
//! files     docker       operator prompt
//! ```
//!
//! Everything below `main.rs` returns `Result` and leaves printing and
//! exiting to the binary.

pub mod cli;
pub mod config;
pub mod confirm;
pub mod error;
pub mod exec;
pub mod manager;
pub mod platform;
pub mod report;
pub mod store;
pub mod util;
