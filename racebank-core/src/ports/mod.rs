//! Ports - trait definitions at the harness seams

pub mod observer;

pub use observer::{NoopObserver, StepObserver};
