use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

use super::tree::{Element, Node};
use crate::core::{NfseError, sanitize_xml_text};

fn xml_io(e: std::io::Error) -> NfseError {
    NfseError::Xml(format!("XML write error: {e}"))
}

/// Streams a node tree through quick-xml with two-space indentation.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new(declaration: bool) -> Result<Self, NfseError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        if declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(xml_io)?;
        }
        Ok(Self { writer })
    }

    pub fn into_string(self) -> Result<String, NfseError> {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| NfseError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn write_node(&mut self, node: &Node) -> Result<(), NfseError> {
        match node {
            Node::Element(element) => self.write_element(element),
            Node::Text(text) => self.text(text),
            Node::Comment(text) => self
                .writer
                .write_event(Event::Comment(BytesText::from_escaped(format!(" {} ", text.replace("--", "- -")))))
                .map_err(xml_io),
        }
    }

    fn write_element(&mut self, element: &Element) -> Result<(), NfseError> {
        let mut start = BytesStart::new(element.name.as_str());
        for (k, v) in &element.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if element.children.is_empty() {
            return self.writer.write_event(Event::Empty(start)).map_err(xml_io);
        }

        self.writer.write_event(Event::Start(start)).map_err(xml_io)?;
        match element.text() {
            Some(text) => self.text(text)?,
            None => {
                for child in &element.children {
                    self.write_node(child)?;
                }
            }
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(element.name.as_str())))
            .map_err(xml_io)
    }

    fn text(&mut self, text: &str) -> Result<(), NfseError> {
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(sanitize_xml_text(text))))
            .map_err(xml_io)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tree::XmlBuilder;

    #[test]
    fn nested_elements_are_indented() {
        let mut b = XmlBuilder::new();
        b.add_group("a", &[], |b| {
            b.add_element("b", 1);
        });
        assert_eq!(b.build().unwrap(), "<a>\n  <b>1</b>\n</a>");
    }

    #[test]
    fn declaration_and_attributes() {
        let mut b = XmlBuilder::document();
        b.add_group("DPS", &[("versao", "1.00")], |b| {
            b.add_element("x", "y");
        });
        let xml = b.build().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<DPS versao=\"1.00\">"));
    }

    #[test]
    fn text_is_escaped_once() {
        let mut b = XmlBuilder::new();
        b.add_element("x", "Tom & Jerry <Ltda>");
        assert_eq!(b.build().unwrap(), "<x>Tom &amp; Jerry &lt;Ltda&gt;</x>");
    }

    #[test]
    fn childless_element_is_empty_tag() {
        let mut b = XmlBuilder::new();
        b.add_group("empty", &[], |_| {});
        assert_eq!(b.build().unwrap(), "<empty/>");
    }

    #[test]
    fn comments_are_written() {
        let mut b = XmlBuilder::new();
        b.add_comment("signature goes here");
        assert_eq!(b.build().unwrap(), "<!-- signature goes here -->");
    }
}
