//! Serialises an owned [`Element`] tree to ISO-8859-1 bytes.

use std::borrow::Cow;

use encoding_rs::Encoding;
use log::{debug, trace};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use super::tree::{Element, Node};
use crate::rtml::types::error::{Result, RtmlError};

/// Encoding label written into the XML declaration.
pub const OUTPUT_ENCODING_LABEL: &str = "ISO-8859-1";

const INDENT_WIDTH: usize = 2;

/// Material written before the root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prolog {
    /// `<!DOCTYPE root SYSTEM "id">` system identifier, when the dialect uses one.
    pub doctype_system_id: Option<String>,
}

/// Serialises `root` as an indented document encoded in ISO-8859-1.
///
/// Characters outside the encoding are written as numeric character
/// references, so no input is ever rejected for its repertoire.
pub fn write_document(root: &Element, prolog: &Prolog) -> Result<Vec<u8>> {
    let text = write_document_text(root, prolog)?;

    let encoding = Encoding::for_label(OUTPUT_ENCODING_LABEL.as_bytes())
        .ok_or_else(|| RtmlError::Xml(format!("Unknown output encoding {}", OUTPUT_ENCODING_LABEL)))?;
    let text = latin1_references(&text);
    if let Cow::Owned(_) = text {
        debug!("Characters outside {} written as character references", OUTPUT_ENCODING_LABEL);
    }
    // encoding_rs resolves the ISO-8859-1 label to windows-1252, which agrees
    // with Latin-1 once nothing in U+0080..=U+009F or above U+00FF remains.
    let (bytes, _, _) = encoding.encode(&text);

    Ok(match bytes {
        Cow::Borrowed(b) => b.to_vec(),
        Cow::Owned(b) => b,
    })
}

/// Serialises `root` to text, with the declaration naming ISO-8859-1.
pub fn write_document_text(root: &Element, prolog: &Prolog) -> Result<String> {
    let mut buffer = format!(
        "<?xml version=\"1.0\" encoding=\"{}\"?>\n",
        OUTPUT_ENCODING_LABEL
    )
    .into_bytes();
    if let Some(system_id) = &prolog.doctype_system_id {
        buffer.extend_from_slice(format!("<!DOCTYPE {} SYSTEM \"{}\">\n", root.name, system_id).as_bytes());
    }

    let mut writer = Writer::new_with_indent(buffer, b' ', INDENT_WIDTH);
    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| RtmlError::Xml(format!("Writer produced invalid UTF-8: {}", e)))
}

/// Replaces every character a strict Latin-1 reader would not see as itself
/// with a decimal character reference.
fn latin1_references(text: &str) -> Cow<'_, str> {
    let needs_reference = |c: char| ('\u{80}'..='\u{9f}').contains(&c) || c > '\u{ff}';
    if !text.chars().any(needs_reference) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        if needs_reference(c) {
            out.push_str(&format!("&#{};", u32::from(c)));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    trace!("Writing <{}>", element.name);
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if !element.has_children() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
