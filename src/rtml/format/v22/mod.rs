//! RTML 2.2: DTD-based documents with a `type` attribute on the root and
//! explicit target types.
//!
//! Observations are children of the root, each holding its Target, optional
//! Device, a single Schedule and any returned ImageData.

pub mod create;
pub mod parse;

pub(crate) const DIALECT: &str = "RTML 2.2";
