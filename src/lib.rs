//! A pull tokenizer for XML 1.0 documents.
//!
//! ## Description
//!
//! [`Tokenizer`] scans its input one byte at a time and reports a flat
//! stream of lexical events ([`Token`]): the `<?xml ...?>` declaration,
//! start and end tags, attribute list boundaries, attributes and character
//! data. The caller drives the scan token by token and reads the payload of
//! the latest token through accessors that borrow from the tokenizer's
//! internal parse stack, so a payload stays valid exactly until the next
//! `next_token` call.
//!
//! Intended for small to medium documents (configuration files, catalogs,
//! SVG-like markup) where the caller builds its own structures on top of
//! the token stream; the [`dom`] module shows one such client.
//!
//! ## Example
//!
//! ```rust
//! use pull_xml::{Token, Tokenizer};
//!
//! let xml = r#"<?xml version="1.0"?>
//! <catalog>
//!     <book id="bk101">
//!         <title>XML Developer&apos;s Guide</title>
//!     </book>
//! </catalog>"#;
//!
//! let mut tokenizer = Tokenizer::from_str(xml);
//! let mut titles = Vec::new();
//! let mut in_title = false;
//! loop {
//!     match tokenizer.next_token() {
//!         Token::StartTag => in_title = tokenizer.name() == Some(&b"title"[..]),
//!         Token::Text if in_title => {
//!             let text = tokenizer.text().unwrap();
//!             titles.push(String::from_utf8(text.to_vec()).unwrap());
//!         }
//!         Token::Error => {
//!             panic!("{}", String::from_utf8_lossy(tokenizer.error().unwrap()));
//!         }
//!         Token::EndDocument => break,
//!         _ => (),
//!     }
//! }
//! assert_eq!(titles, ["XML Developer's Guide"]);
//! ```
//!
//! ## Whitespace
//!
//! Two flags shape character data and are both on by default:
//! [`set_trim`](Tokenizer::set_trim) strips whitespace around a text run
//! and [`set_collapse`](Tokenizer::set_collapse) folds internal whitespace
//! to single spaces. Both yield to `xml:space="preserve"` scopes in the
//! document, and neither touches attribute values or CDATA sections.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(
    feature = "document-features",
    cfg_attr(doc, doc = ::document_features::document_features!())
)]

pub mod dom;
pub mod errors;
pub mod escape;
mod scratch;
pub mod source;
pub mod tokenizer;

// reexports
pub use crate::errors::{Error, Result};
pub use crate::tokenizer::{Token, Tokenizer};
