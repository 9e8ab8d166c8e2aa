//! Wire format layer for RTML documents.
//!
//! This module bridges between the generic XML tree in
//! [`xml`](crate::rtml::xml) and the document model in
//! [`types`](crate::rtml::types).
//!
//! # Module Organization
//!
//! - [`header`]: Decodes input bytes and peeks at the root `version`
//! - [`dispatch`]: Routes a tree to the dialect its version names
//! - [`v22`]: RTML 2.2 parser and creator
//! - [`v31`]: RTML 3.1a parser and creator
//! - [`common`]: Walking and number formatting helpers shared by both
//!
//! # Architecture
//!
//! ```text
//! bytes ──► header::decode_input ──► header::peek_version
//!                                          │
//!                 xml::parse_to_tree ◄─────┘
//!                          │
//!                 dispatch::parse_tree ──► v22::parse | v31::parse ──► RtmlDocument
//!
//! RtmlDocument ──► dispatch::create_tree ──► v22::create | v31::create
//!                          │
//!                 xml::write_document ──► ISO-8859-1 bytes
//! ```

pub mod common;
pub mod dispatch;
pub mod header;
pub mod v22;
pub mod v31;
