//! RTML 3.1a: namespaced, schema-validated documents with a `mode` attribute
//! on the root.
//!
//! The nesting is inverted relative to RTML 2.2: each Schedule is the outer
//! element and carries its own Target, Device and Observation results. The
//! parser synthesizes one model [`Observation`](crate::rtml::types::observation::Observation)
//! per Schedule; the creator does the reverse.

pub mod create;
pub mod parse;

pub(crate) const DIALECT: &str = "RTML 3.1a";
