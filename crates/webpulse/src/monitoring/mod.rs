//! Monitoring pipeline
//!
//! This module is responsible for:
//! - Fanning the registry out to the work queue in bounded batches
//! - Probing each delivered URL and recording its liveness
//! - Driving the batcher on a fixed cadence
//! - Running the pool of probing workers

pub mod batcher;
pub mod checker;
pub mod prober;
pub mod scheduler;
pub mod types;
pub mod workers;

pub use batcher::{Batcher, partition};
pub use checker::{Checker, HttpChecker};
pub use prober::Prober;
pub use scheduler::Scheduler;
pub use types::{BatchReport, DeliveryReport, FailedSite, MessageOutcome, ProbeOutcome, SkipReason};
pub use workers::WorkerPool;
