//! Portfolio analysis.
//!
//! The [`Pipeline`] fans project scoring out over the score provider and
//! finalizes the run with the aggregation helpers in [`aggregator`].

pub mod aggregator;
pub mod pipeline;

pub use pipeline::Pipeline;
