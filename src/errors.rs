//! Error management module

use std::fmt;
use std::io;
use std::str::Utf8Error;

use crate::escape::EscapeError;

/// The error type used by this crate.
///
/// The first three variants are raised by the tokenizer itself. Their
/// `Display` output is exactly the text carried by the sticky
/// [`Token::Error`] record, so a message read through [`Tokenizer::error`]
/// and one rendered from this type are byte-identical.
///
/// [`Token::Error`]: crate::Token::Error
/// [`Tokenizer::error`]: crate::Tokenizer::error
#[derive(Debug)]
pub enum Error {
    /// The byte source failed with an I/O error.
    Io(io::Error),
    /// The byte source ran dry in the middle of a token.
    UnexpectedEof,
    /// A byte that the grammar does not allow at this position.
    Syntax {
        /// Row of the offending byte, starting at 1.
        row: u32,
        /// Column of the offending byte, starting at 1.
        col: u32,
    },
    /// A payload is not valid UTF-8. Raised by clients that need strings,
    /// never by the tokenizer itself, which hands out raw bytes.
    Utf8(Utf8Error),
    /// An end tag that does not match the element it closes. The tokenizer
    /// does not verify this; [`dom`](crate::dom) does.
    EndTagMismatch {
        /// Name of the element that is open.
        expected: String,
        /// Name found in the end tag.
        found: String,
    },
    /// A failed resolution of a `&...;` reference outside the tokenizer.
    Escape(EscapeError),
    /// A sticky tokenizer error observed through its rendered text only.
    Parse(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(
                f,
                "Error: While reading file, code: {}",
                e.raw_os_error().unwrap_or(0)
            ),
            Error::UnexpectedEof => f.write_str("Error: Unexpected end of file."),
            Error::Syntax { row, col } => write!(f, "Error({},{}): Unexpected sign.", row, col),
            Error::Utf8(e) => write!(f, "UTF8 error: {}", e),
            Error::EndTagMismatch { expected, found } => {
                write!(f, "Expecting </{}> found </{}>", expected, found)
            }
            Error::Escape(e) => write!(f, "{}", e),
            Error::Parse(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Utf8(e) => Some(e),
            Error::Escape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    /// Creates a new `Error::Io` from the given error
    #[inline]
    fn from(error: io::Error) -> Error {
        Error::Io(error)
    }
}

impl From<Utf8Error> for Error {
    /// Creates a new `Error::Utf8` from the given error
    #[inline]
    fn from(error: Utf8Error) -> Error {
        Error::Utf8(error)
    }
}

impl From<EscapeError> for Error {
    /// Creates a new `Error::Escape` from the given error
    #[inline]
    fn from(error: EscapeError) -> Error {
        Error::Escape(error)
    }
}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
