//! Byte sources feeding the tokenizer.
//!
//! The tokenizer consumes input strictly one byte at a time through the
//! [`Source`] trait. Two implementations are provided: [`SliceSource`] for
//! in-memory documents and [`IoSource`] for anything that implements
//! [`BufRead`].

use std::io::{self, BufRead};

/// A producer of single bytes.
///
/// `Ok(None)` signals a clean end of stream; read failures surface as
/// `Err`. The tokenizer folds both into its own sticky error reporting, so
/// implementors only hand bytes over.
pub trait Source {
    /// Returns the next byte of the stream, or `None` when it is exhausted.
    fn next_byte(&mut self) -> io::Result<Option<u8>>;
}

/// A source reading from an in-memory byte slice.
#[derive(Clone, Debug)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Wraps a byte slice.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl Source for SliceSource<'_> {
    #[inline]
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        match self.bytes.get(self.pos).copied() {
            Some(byte) => {
                self.pos += 1;
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }
}

/// A source reading from a [`BufRead`] implementor.
///
/// Byte-by-byte reads through `BufRead` only touch its internal buffer, so
/// wrapping a [`File`](std::fs::File) in a [`BufReader`](std::io::BufReader)
/// keeps the per-byte cost flat.
#[derive(Debug)]
pub struct IoSource<R> {
    reader: R,
}

impl<R: BufRead> IoSource<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Source for IoSource<R> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            let byte = match self.reader.fill_buf() {
                Ok(buf) => buf.first().copied(),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            return match byte {
                Some(byte) => {
                    self.reader.consume(1);
                    Ok(Some(byte))
                }
                None => Ok(None),
            };
        }
    }
}
