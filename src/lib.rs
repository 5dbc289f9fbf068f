//! Library crate for llm-scan-rs: finds LLM inference servers reachable
//! without authentication.
//!
//! A scan is driven by [`scanner::ScanSession`]: build one per run, keep its
//! [`events::EventStream`] to watch progress, and use a
//! [`scanner::StopHandle`] to cancel it.
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod netdetect;
pub mod ports;
pub mod probe;
pub mod scanner;
pub mod signature;
pub mod target;
pub mod types;
