//! Domain logic for the CX evaluation platform.
//!
//! Everything in this crate is pure: no database access, no async. The
//! `db` crate persists what is computed here and the `api` crate wires
//! the two together.

pub mod distribution;
pub mod error;
pub mod pagination;
pub mod scoring;
pub mod survey;
pub mod types;
