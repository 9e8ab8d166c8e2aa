//! Generic XML tree collaborator.
//!
//! The dialect parsers and creators only ever see the owned tree defined in
//! [`tree`]. Reading goes through `roxmltree`, writing through `quick-xml`.
//!
//! - [`tree`]: `Element` / `Node` build and walk operations
//! - [`read`]: XML text → tree
//! - [`write`]: tree → ISO-8859-1 bytes
//! - [`diagnostics`]: collected warnings and errors

pub mod diagnostics;
pub mod read;
pub mod tree;
pub mod write;

pub use diagnostics::{Diagnostics, ErrorHandler};
pub use read::parse_to_tree;
pub use tree::{Element, Node, text_element};
pub use write::{Prolog, write_document, write_document_text};
