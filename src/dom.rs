//! A module to manage DOM documents
//!
//! [`Document::parse`] drives a [`Tokenizer`] to completion and collects
//! the declaration pseudo-attributes plus the element tree. Unlike the
//! tokenizer, the builder verifies that every end tag matches the element
//! it closes.

use std::fmt;
use std::str::from_utf8;

use crate::errors::{Error, Result};
use crate::escape::{escape, partial_escape};
use crate::source::Source;
use crate::tokenizer::{Token, Tokenizer};

/// A DOM `Node`
///
/// Has name, attributes, text and children
#[derive(Clone, Debug, Default)]
pub struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    /// Gets `Node` name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets `Node` attributes (name, value)
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Gets the value of the named attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Gets `Node` text content
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Gets `Node` children
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Gets the first child with the given name
    pub fn first_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn write_indented(&self, f: &mut fmt::Formatter, indent: usize) -> fmt::Result {
        write!(f, "{:indent$}<{}", "", self.name, indent = indent)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, escape(value))?;
        }
        if self.text.is_empty() && self.children.is_empty() {
            return writeln!(f, "/>");
        }
        write!(f, ">")?;
        if !self.text.is_empty() {
            write!(f, "{}", partial_escape(&self.text))?;
        }
        if !self.children.is_empty() {
            writeln!(f)?;
            for child in &self.children {
                child.write_indented(f, indent + 2)?;
            }
            write!(f, "{:indent$}", "", indent = indent)?;
        }
        writeln!(f, "</{}>", self.name)
    }
}

/// Serializes the subtree back to indented XML, re-escaping attribute
/// values and text content.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// A parsed document: the declaration pseudo-attributes and the root
/// element.
///
/// # Examples
///
/// ```rust
/// use pull_xml::dom::Document;
/// use pull_xml::Tokenizer;
///
/// let data = r#"<?xml version="1.0"?>
/// <catalog>
///     <book id="bk101">
///         <title>XML Developer's Guide</title>
///     </book>
/// </catalog>"#;
///
/// let doc = Document::parse(Tokenizer::from_str(data)).unwrap();
/// assert_eq!(doc.declaration("version"), Some("1.0"));
///
/// let book = doc.root().first_child("book").unwrap();
/// assert_eq!(book.attribute("id"), Some("bk101"));
/// assert_eq!(
///     book.first_child("title").unwrap().text(),
///     "XML Developer's Guide"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Document {
    declarations: Vec<(String, String)>,
    root: Node,
}

impl Document {
    /// Consumes a tokenizer and builds the document tree.
    pub fn parse<S: Source>(mut tokenizer: Tokenizer<S>) -> Result<Document> {
        let mut declarations = Vec::new();
        let mut parents: Vec<Node> = Vec::new();
        let mut node: Option<Node> = None;
        let mut root = None;
        loop {
            match tokenizer.next_token() {
                Token::Declaration => {
                    declarations.push((name_of(&tokenizer)?, value_of(&tokenizer)?));
                }
                Token::StartDocument | Token::StartAttributes | Token::EndAttributes => (),
                Token::StartTag => {
                    if let Some(open) = node.take() {
                        parents.push(open);
                    }
                    node = Some(Node {
                        name: name_of(&tokenizer)?,
                        ..Node::default()
                    });
                }
                Token::Attribute => {
                    if let Some(open) = node.as_mut() {
                        open.attributes
                            .push((name_of(&tokenizer)?, value_of(&tokenizer)?));
                    }
                }
                Token::Text => {
                    if let Some(open) = node.as_mut() {
                        open.text = text_of(&tokenizer)?;
                    }
                }
                Token::EndTag => {
                    let found = name_of(&tokenizer)?;
                    match (parents.pop(), node.take()) {
                        (parent, Some(closed)) if closed.name == found => match parent {
                            Some(mut parent) => {
                                parent.children.push(closed);
                                node = Some(parent);
                            }
                            None => root = Some(closed),
                        },
                        (_, closed) => {
                            return Err(Error::EndTagMismatch {
                                expected: closed.map(|n| n.name).unwrap_or_default(),
                                found,
                            });
                        }
                    }
                }
                Token::EndDocument => break,
                Token::Error => {
                    let message = tokenizer
                        .error()
                        .map(|e| String::from_utf8_lossy(e).into_owned())
                        .unwrap_or_default();
                    return Err(Error::Parse(message));
                }
            }
        }
        match root {
            Some(root) => Ok(Document { declarations, root }),
            None => Err(Error::Parse("document has no root element".to_string())),
        }
    }

    /// Gets a declaration pseudo-attribute such as `version` or `encoding`
    pub fn declaration(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Gets all declaration pseudo-attributes in document order
    pub fn declarations(&self) -> &[(String, String)] {
        &self.declarations
    }

    /// Gets the root element
    pub fn root(&self) -> &Node {
        &self.root
    }
}

fn name_of<S: Source>(tokenizer: &Tokenizer<S>) -> Result<String> {
    into_string(tokenizer.name())
}

fn value_of<S: Source>(tokenizer: &Tokenizer<S>) -> Result<String> {
    into_string(tokenizer.value())
}

fn text_of<S: Source>(tokenizer: &Tokenizer<S>) -> Result<String> {
    into_string(tokenizer.text())
}

fn into_string(bytes: Option<&[u8]>) -> Result<String> {
    Ok(from_utf8(bytes.unwrap_or_default())?.to_string())
}
