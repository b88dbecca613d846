//! Feedback analytics engine.
//!
//! Turns an in-memory snapshot of submitted feedback records into the
//! aggregate views a dashboard renders: overview counters, sentiment
//! distribution, bucketed trends, keyword frequencies and a weekday/hour
//! sentiment heatmap. Every computation is a pure function of its inputs.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;
