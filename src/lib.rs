//! Board persona bot library.
//!
//! Watches a discussion board, keeps a running memory of what it sees, and
//! publishes persona-conditioned posts and comments generated by a language
//! model. A supervisor restarts runs forever, rotating generator credentials.

pub mod config;
pub mod constants;
pub mod db;
pub mod forum;
pub mod generator;
pub mod memory;
pub mod pipeline;
pub mod scheduler;
pub mod text;
pub mod trends;
