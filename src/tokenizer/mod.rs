//! A module to handle the pull [`Tokenizer`]

mod machine;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::errors::Error;
use crate::scratch::{self, Scratch};
use crate::source::{IoSource, SliceSource, Source};

use self::machine::State;

/// Deepest allowed nesting of `xml:space` overrides.
const XML_SPACE_SCOPES: usize = 32;

/// Lexical events produced by [`Tokenizer::next_token`].
///
/// Over a well-formed document the emission order is
/// `Declaration* StartDocument ... EndDocument` where every element
/// contributes `StartTag StartAttributes Attribute* EndAttributes`,
/// optionally one `Text`, and a closing `EndTag`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    /// One pseudo-attribute of the `<?xml ...?>` declaration; one token is
    /// reported per attribute. Carries a name and a value.
    Declaration,
    /// Reported once, after the declaration (if any) and before the root
    /// element.
    StartDocument,
    /// An opening tag. Carries the element name.
    StartTag,
    /// Opens the attribute list of the current element.
    StartAttributes,
    /// One attribute. Carries a name and a value; an attribute written
    /// without a value reports the value `1`.
    Attribute,
    /// Closes the attribute list of the current element.
    EndAttributes,
    /// A run of character data. Carries the text; empty runs are never
    /// reported.
    Text,
    /// A closing tag, or the end of a `<.../>` element. Carries the name.
    EndTag,
    /// Reported once the root element is closed, and forever after.
    EndDocument,
    /// A syntax or read failure. Carries the error message and repeats on
    /// every further call.
    Error,
}

/// One `xml:space` override and what to restore when it ends.
#[derive(Clone, Copy, Debug)]
struct SpaceScope {
    depth: usize,
    prior_preserve: bool,
}

/// A pull-style tokenizer for XML 1.0 documents.
///
/// The tokenizer reads its [`Source`] one byte at a time and suspends at
/// every reported token; the caller controls the pacing entirely. The
/// payload of the latest token is read through [`name`](Self::name),
/// [`value`](Self::value), [`text`](Self::text) and [`error`](Self::error),
/// which borrow from the internal parse stack and are therefore valid until
/// the next [`next_token`](Self::next_token) call.
///
/// Dropping the tokenizer releases the source and the parse stack.
pub struct Tokenizer<S> {
    source: S,
    state: State,
    scratch: Scratch,
    /// The byte the grammar engine is currently looking at.
    ch: u8,
    row: u32,
    col: u32,
    /// Number of elements opened and not yet closed.
    depth: usize,
    /// Offset where the text run of the innermost open element began.
    text_start: usize,
    trim: bool,
    collapse: bool,
    preserve: bool,
    space_scopes: Vec<SpaceScope>,
    last: Token,
}

impl Tokenizer<IoSource<BufReader<File>>> {
    /// Opens a file for tokenizing.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_source(IoSource::new(BufReader::new(file))))
    }
}

impl<R: BufRead> Tokenizer<IoSource<R>> {
    /// Creates a tokenizer reading from a buffered reader.
    pub fn from_reader(reader: R) -> Self {
        Self::from_source(IoSource::new(reader))
    }
}

impl<'a> Tokenizer<SliceSource<'a>> {
    /// Creates a tokenizer reading from a string.
    pub fn from_str(xml: &'a str) -> Self {
        Self::from_slice(xml.as_bytes())
    }

    /// Creates a tokenizer reading from a byte slice.
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self::from_source(SliceSource::new(bytes))
    }
}

impl<S: Source> Tokenizer<S> {
    /// Creates a tokenizer over any byte source.
    pub fn from_source(source: S) -> Self {
        Tokenizer {
            source,
            state: State::Start,
            scratch: Scratch::new(),
            ch: 0,
            row: 1,
            col: 1,
            depth: 0,
            text_start: 0,
            trim: true,
            collapse: true,
            preserve: false,
            space_scopes: Vec::new(),
            last: Token::StartDocument,
        }
    }

    /// Reads the next token from the document.
    ///
    /// After [`Token::EndDocument`] or [`Token::Error`] every further call
    /// reports the same token again; an error keeps its message.
    pub fn next_token(&mut self) -> Token {
        let token = match self.step() {
            Ok(token) => token,
            Err(error) => self.fail(error),
        };
        self.last = token;
        token
    }

    /// Name carried by the last token.
    ///
    /// `Some` after [`Token::Declaration`], [`Token::StartTag`],
    /// [`Token::Attribute`] and [`Token::EndTag`]; `None` otherwise. The
    /// slice aliases into the parse stack and is invalidated by the next
    /// [`next_token`](Self::next_token) call.
    pub fn name(&self) -> Option<&[u8]> {
        match self.last {
            Token::StartTag | Token::EndTag => match self.scratch.top_tag() {
                Some(scratch::NAME) => self.scratch.payload(),
                _ => None,
            },
            Token::Declaration | Token::Attribute => match self.scratch.top_tag() {
                Some(scratch::VALUE) => self.scratch.payload_below(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Value carried by the last token.
    ///
    /// `Some` after [`Token::Declaration`] and [`Token::Attribute`];
    /// `None` otherwise. Character references are already resolved.
    pub fn value(&self) -> Option<&[u8]> {
        match (self.last, self.scratch.top_tag()) {
            (Token::Declaration | Token::Attribute, Some(scratch::VALUE)) => {
                self.scratch.payload()
            }
            _ => None,
        }
    }

    /// Character data carried by the last token.
    ///
    /// `Some` only after [`Token::Text`].
    pub fn text(&self) -> Option<&[u8]> {
        match (self.last, self.scratch.top_tag()) {
            (Token::Text, Some(scratch::TEXT)) => self.scratch.payload(),
            _ => None,
        }
    }

    /// Message carried by the last token.
    ///
    /// `Some` only after [`Token::Error`]. The same bytes are reported for
    /// every repetition of the error.
    pub fn error(&self) -> Option<&[u8]> {
        match (self.last, self.scratch.top_tag()) {
            (Token::Error, Some(scratch::ERROR)) => self.scratch.payload(),
            _ => None,
        }
    }

    /// Whether leading and trailing whitespace is stripped from text runs.
    pub fn trim(&self) -> bool {
        self.trim
    }

    /// Enables or disables stripping of text runs. On by default; overruled
    /// inside `xml:space="preserve"` scopes.
    pub fn set_trim(&mut self, enable: bool) {
        self.trim = enable;
    }

    /// Whether `\n`, `\r` and `\t` fold to spaces, and space runs to one
    /// space, inside text runs.
    pub fn collapse(&self) -> bool {
        self.collapse
    }

    /// Enables or disables whitespace folding. On by default; overruled
    /// inside `xml:space="preserve"` scopes. Attribute values and CDATA
    /// sections are never folded.
    pub fn set_collapse(&mut self, enable: bool) {
        self.collapse = enable;
    }

    /// Seals the rendered error message and locks the engine in the sticky
    /// error state.
    fn fail(&mut self, error: Error) -> Token {
        let mark = self.scratch.mark();
        let message = error.to_string();
        self.scratch.push_bytes(message.as_bytes());
        self.scratch.seal(scratch::ERROR, mark);
        self.state = State::Failed;
        Token::Error
    }
}
