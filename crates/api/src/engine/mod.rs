//! Scoring engine glue between the pure `cxeval_core` computations and
//! persisted form state.

pub mod scoring;
