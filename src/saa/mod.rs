// src/saa/mod.rs

pub mod assistant;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod error;
pub mod event;
pub mod exchange_log;
pub mod orchestrator;
pub mod planner;
pub mod plugins;
pub mod summarizer;
pub mod tool_protocol;
pub mod tools;
pub mod workers;

// Export the types every caller needs so they don't have to reach into the submodules,
// e.g. saa::Orchestrator instead of saa::orchestrator::Orchestrator.
pub use assistant::{Assistant, RetryPolicy};
pub use orchestrator::Orchestrator;
pub use workers::{SubTask, WorkerPool};
