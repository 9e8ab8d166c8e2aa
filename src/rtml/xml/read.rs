//! Builds an owned [`Element`] tree from XML text.

use log::trace;
use roxmltree::{Document, ParsingOptions};

use super::diagnostics::ErrorHandler;
use super::tree::{Element, Node};
use crate::rtml::types::error::Result;

/// Parses XML text into an owned element tree rooted at the document element.
///
/// DOCTYPE declarations are accepted (RTML 2.2 documents carry one) but the
/// external DTD is never fetched. Comments and processing instructions are
/// dropped; CDATA sections become ordinary text.
pub fn parse_to_tree(xml: &str, handler: &mut dyn ErrorHandler) -> Result<Element> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(xml, options)?;
    let root = document.root_element();
    trace!("Building element tree from root <{}>", root.tag_name().name());
    Ok(convert(root, handler))
}

fn convert(node: roxmltree::Node<'_, '_>, handler: &mut dyn ErrorHandler) -> Element {
    let mut element = Element::new(node.tag_name().name());
    element.namespace = node.tag_name().namespace().map(str::to_string);

    for attr in node.attributes() {
        element
            .attributes
            .push((attr.name().to_string(), attr.value().to_string()));
    }

    for child in node.children() {
        if child.is_element() {
            element.children.push(Node::Element(convert(child, handler)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(Node::Text(text.to_string()));
            }
        } else if child.is_pi() {
            handler.warning(format!(
                "Ignoring processing instruction inside <{}>",
                element.name
            ));
        }
    }

    element
}
