//! Hidden-information handling for a single observer.

pub mod sampler;

pub use sampler::{Determinizer, SamplingError, SamplingStats};
