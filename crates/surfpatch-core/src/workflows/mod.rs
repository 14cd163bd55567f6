//! # Workflows Module
//!
//! End-to-end entry points built on the engines.
//!
//! - **Analysis** ([`analyze`]) splits a structure into units, scores each one
//!   and collects the per-unit results.
//! - **Surface** ([`surface`]) computes accessibility and neighbours per chain
//!   without any scoring.
//! - **Domains** ([`domains`]) exposes the domain split on its own.

pub mod analyze;
pub mod domains;
pub mod error;
pub mod surface;
