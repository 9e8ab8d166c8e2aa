//! Document model, error types, and dialect definitions.

pub mod device;
pub mod dialects;
pub mod error;
pub mod models;
pub mod observation;
pub mod schedule;
