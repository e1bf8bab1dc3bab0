//! Quill: iterative long-form writing with a language model
//!
//! A controller plans delegated outline and section tasks, runs them against
//! a shared snapshot, merges their candidates back into one outline and one
//! document, and asks a judge whether to keep editing.

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod prompts;
pub mod provider;
pub mod roles;
pub mod state;
pub mod writer;
