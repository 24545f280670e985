//! Conditional XML builder.
//!
//! Calls append nodes to an in-memory tree in the order they are made; the
//! tree is serialized in one pass by [`XmlBuilder::build`]. The builder only
//! decides *whether* an element is emitted (empty values are skipped), never
//! *where*: callers follow the schema's element order.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::xml_utils::XmlWriter;
use crate::core::{NfseError, format_currency_fixed, format_date_brazil};

/// Largest magnitude `add_number` will emit.
pub const MAX_NUMERIC_MAGNITUDE: Decimal = dec!(1_000_000_000_000_000);

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An element with attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Text content when the element holds only text.
    pub fn text(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Node::Text(t)] => Some(t),
            _ => None,
        }
    }

    /// First child element named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Values that can fill an element. `None` and blank strings are absent.
pub trait XmlValue {
    /// Text to emit, or `None` to omit the element.
    fn xml_text(&self) -> Option<String>;

    /// Whether the value is numerically zero (see [`XmlBuilder::add_optional`]).
    fn is_zero(&self) -> bool {
        false
    }
}

impl XmlValue for str {
    fn xml_text(&self) -> Option<String> {
        let trimmed = self.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

impl XmlValue for String {
    fn xml_text(&self) -> Option<String> {
        self.as_str().xml_text()
    }
}

impl<T: XmlValue + ?Sized> XmlValue for &T {
    fn xml_text(&self) -> Option<String> {
        (**self).xml_text()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: XmlValue> XmlValue for Option<T> {
    fn xml_text(&self) -> Option<String> {
        self.as_ref().and_then(|v| v.xml_text())
    }

    fn is_zero(&self) -> bool {
        self.as_ref().is_some_and(|v| v.is_zero())
    }
}

impl XmlValue for Decimal {
    fn xml_text(&self) -> Option<String> {
        Some(self.to_string())
    }

    fn is_zero(&self) -> bool {
        Decimal::is_zero(self)
    }
}

macro_rules! integer_xml_value {
    ($($t:ty),*) => {
        $(
            impl XmlValue for $t {
                fn xml_text(&self) -> Option<String> {
                    Some(self.to_string())
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

integer_xml_value!(u8, u16, u32, u64, usize, i32, i64);

/// Stateful tree builder. Elements opened with [`open_element`](Self::open_element)
/// receive every node added until the matching [`close_element`](Self::close_element).
#[derive(Debug, Default)]
pub struct XmlBuilder {
    roots: Vec<Node>,
    open: Vec<Element>,
    declaration: bool,
}

impl XmlBuilder {
    /// A fragment builder (no XML declaration).
    pub fn new() -> Self {
        Self::default()
    }

    /// A document builder: output starts with `<?xml version="1.0" encoding="UTF-8"?>`.
    pub fn document() -> Self {
        Self {
            declaration: true,
            ..Self::default()
        }
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn push(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn close_top(&mut self) {
        if let Some(element) = self.open.pop() {
            self.push(Node::Element(element));
        }
    }

    /// Open `tag`. Attributes with blank values are dropped.
    pub fn open_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> &mut Self {
        let mut element = Element::new(tag);
        element.attributes = attrs
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.open.push(element);
        self
    }

    /// Close `tag`, which must be the innermost open element.
    pub fn close_element(&mut self, tag: &str) -> Result<&mut Self, NfseError> {
        match self.open.last() {
            Some(top) if top.name == tag => {
                self.close_top();
                Ok(self)
            }
            Some(top) => Err(NfseError::Xml(format!(
                "cannot close </{tag}> while <{}> is open",
                top.name
            ))),
            None => Err(NfseError::Xml(format!(
                "cannot close </{tag}>: no element is open"
            ))),
        }
    }

    /// Emit `<tag>value</tag>` unless the value is absent or blank.
    pub fn add_element(&mut self, tag: &str, value: impl XmlValue) -> &mut Self {
        self.add_element_with_attrs(tag, value, &[])
    }

    pub fn add_element_with_attrs(
        &mut self,
        tag: &str,
        value: impl XmlValue,
        attrs: &[(&str, &str)],
    ) -> &mut Self {
        if let Some(text) = value.xml_text() {
            self.open_element(tag, attrs);
            self.push(Node::Text(text));
            self.close_top();
        }
        self
    }

    /// Like [`add_element`](Self::add_element) but numeric zero is also absent.
    pub fn add_optional(&mut self, tag: &str, value: impl XmlValue) -> &mut Self {
        if value.is_zero() {
            return self;
        }
        self.add_element(tag, value)
    }

    /// Emit a number with fixed decimals. Magnitudes above 1e15 are logged and dropped.
    pub fn add_number(
        &mut self,
        tag: &str,
        value: impl Into<Option<Decimal>>,
        decimals: u32,
    ) -> &mut Self {
        let Some(value) = value.into() else {
            return self;
        };
        if value.abs() > MAX_NUMERIC_MAGNITUDE {
            tracing::warn!(tag, %value, "numeric value out of range, element omitted");
            return self;
        }
        self.add_element(tag, format_currency_fixed(Some(value), decimals))
    }

    /// Emit an ISO timestamp converted to Brazil time.
    pub fn add_date(&mut self, tag: &str, iso: &str) -> &mut Self {
        if iso.trim().is_empty() {
            return self;
        }
        self.add_element(tag, format_date_brazil(iso))
    }

    pub fn add_comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Node::Comment(text.into()));
        self
    }

    /// Open `tag`, let `children` populate it, close it.
    ///
    /// Elements the callback leaves open are closed with it.
    pub fn add_group(
        &mut self,
        tag: &str,
        attrs: &[(&str, &str)],
        children: impl FnOnce(&mut Self),
    ) -> &mut Self {
        let depth = self.open.len();
        self.open_element(tag, attrs);
        children(self);
        while self.open.len() > depth + 1 {
            tracing::warn!(
                tag = %self.open.last().map(|e| e.name.as_str()).unwrap_or_default(),
                "element left open inside group, closing"
            );
            self.close_top();
        }
        if self.open.len() > depth {
            self.close_top();
        }
        self
    }

    /// Start a choice group: only the first branch whose condition holds runs.
    pub fn choice(&mut self) -> Choice<'_> {
        Choice {
            builder: self,
            taken: false,
        }
    }

    /// Completed top-level nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.roots
    }

    /// Serialize with two-space indentation.
    pub fn build(&self) -> Result<String, NfseError> {
        if let Some(open) = self.open.last() {
            return Err(NfseError::Xml(format!("element <{}> is not closed", open.name)));
        }
        let mut writer = XmlWriter::new(self.declaration)?;
        for node in &self.roots {
            writer.write_node(node)?;
        }
        writer.into_string()
    }

    /// Drop all nodes and open elements.
    pub fn clear(&mut self) {
        self.roots.clear();
        self.open.clear();
    }
}

/// Mutually exclusive branches, evaluated in order.
pub struct Choice<'b> {
    builder: &'b mut XmlBuilder,
    taken: bool,
}

impl Choice<'_> {
    pub fn when(mut self, condition: bool, branch: impl FnOnce(&mut XmlBuilder)) -> Self {
        if !self.taken && condition {
            branch(self.builder);
            self.taken = true;
        }
        self
    }

    /// Branch taken when `value` is `Some`.
    pub fn when_some<T>(mut self, value: Option<T>, branch: impl FnOnce(&mut XmlBuilder, T)) -> Self {
        if !self.taken {
            if let Some(v) = value {
                branch(self.builder, v);
                self.taken = true;
            }
        }
        self
    }

    /// Run `branch` if nothing matched. Returns whether any branch ran.
    pub fn otherwise(mut self, branch: impl FnOnce(&mut XmlBuilder)) -> bool {
        if !self.taken {
            branch(self.builder);
            self.taken = true;
        }
        self.taken
    }

    pub fn taken(&self) -> bool {
        self.taken
    }
}
