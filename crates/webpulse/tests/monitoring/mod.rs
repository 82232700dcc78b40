//! Batcher, prober and pipeline tests
mod pipeline_tests;
mod prober_tests;
