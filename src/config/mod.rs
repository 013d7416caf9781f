//! Configuration models for the worker pool and job polling.

pub mod pool;

pub use pool::{JobQueueConfig, PoolConfig, WaitConfig};
