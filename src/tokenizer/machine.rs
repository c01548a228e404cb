//! The resumable grammar engine.
//!
//! Control suspends exactly at token boundaries: [`State`] names the spot
//! where the previous token was reported and `Tokenizer::step` continues
//! from there. Everything between two boundaries runs to completion, so
//! sub-parsers for names, values, attributes and references are plain
//! methods; the state that must survive a suspension is the lookahead byte,
//! the element depth and whatever sits on the parse stack.

use crate::errors::{Error, Result};
use crate::escape;
use crate::scratch;
use crate::source::Source;

use super::{SpaceScope, Token, Tokenizer, XML_SPACE_SCOPES};

/// Whitespace accepted between syntactic elements.
#[inline]
pub(super) const fn is_padding(byte: u8) -> bool {
    matches!(byte, b' ' | b'\r' | b'\n' | b'\t' | b'\x0c')
}

/// First byte of an identifier. Deliberately admits a leading digit, which
/// XML 1.0 forbids, for compatibility with documents accepted so far.
#[inline]
fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte > 127
}

#[inline]
fn is_name_byte(byte: u8) -> bool {
    is_name_start(byte) || matches!(byte, b':' | b'-' | b'.')
}

/// Where the engine suspended after the previous token. The lookahead byte
/// `ch` is part of the suspension; each variant notes what it holds on
/// resume.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum State {
    /// Nothing has been read yet.
    Start,
    /// After a `Declaration`: its records are still stacked.
    Declaration,
    /// After `StartDocument`: `ch` is the first markup byte behind `<`.
    Prolog,
    /// After `StartTag`: the name record is on top.
    StartTag,
    /// After `StartAttributes`: `ch` is the first byte of the attribute
    /// list.
    Attributes,
    /// After `Attribute`: its records are still stacked.
    Attribute,
    /// After `EndAttributes`: `ch` is `/` or `>`.
    TagClose,
    /// After the `EndTag` of a `<.../>` element: `ch` is `/`.
    EmptyElement,
    /// After `Text`: the text record is on top, `ch` is `/`.
    Text,
    /// After the `EndTag` of a `</...>` tag: the name record is on top.
    ElementEnd,
    /// The root element is closed; only `EndDocument` is reported here.
    Epilog,
    /// An error record is sealed on the stack; only `Error` is reported
    /// here.
    Failed,
}

impl<S: Source> Tokenizer<S> {
    /// Continues the scan up to the next token boundary.
    pub(super) fn step(&mut self) -> Result<Token> {
        match self.state {
            State::Start => self.begin_document(),
            State::Declaration => self.resume_declaration(),
            State::Prolog => self.parse_prolog(),
            State::StartTag => self.resume_start_tag(),
            State::Attributes => self.parse_attributes(),
            State::Attribute => self.resume_attribute(),
            State::TagClose => self.resume_tag_close(),
            State::EmptyElement => self.resume_empty_element(),
            State::Text => self.resume_text(),
            State::ElementEnd => self.resume_element_end(),
            State::Epilog => Ok(Token::EndDocument),
            State::Failed => Ok(Token::Error),
        }
    }

    /// Consumes the BOM and the `<?xml ...?>` declaration, if present.
    fn begin_document(&mut self) -> Result<Token> {
        self.advance()?;
        if self.ch == 0xEF {
            for expected in [0xBB, 0xBF] {
                self.advance()?;
                if self.ch != expected {
                    return Err(self.unexpected());
                }
            }
            self.advance()?;
        }
        self.col = 1;
        self.skip_padding()?;
        if self.ch != b'<' {
            return Err(self.unexpected());
        }
        self.advance()?;
        if self.ch == b'?' {
            self.advance()?;
            let mark = self.scratch.mark();
            self.read_name(mark)?;
            let is_xml = self.scratch.payload() == Some(&b"xml"[..]);
            self.scratch.pop_record();
            if !is_xml {
                return Err(self.unexpected());
            }
            self.skip_padding()?;
            if self.ch != b'?' {
                self.read_attribute()?;
                self.state = State::Declaration;
                return Ok(Token::Declaration);
            }
            self.finish_declaration()?;
        }
        self.state = State::Prolog;
        Ok(Token::StartDocument)
    }

    fn resume_declaration(&mut self) -> Result<Token> {
        self.scratch.pop_record(); // value
        self.scratch.pop_record(); // name
        self.skip_padding()?;
        if self.ch != b'?' {
            self.read_attribute()?;
            return Ok(Token::Declaration);
        }
        self.finish_declaration()?;
        self.state = State::Prolog;
        Ok(Token::StartDocument)
    }

    /// Steps over `?>`, any padding and the `<` of the first markup.
    fn finish_declaration(&mut self) -> Result<()> {
        self.advance()?;
        if self.ch != b'>' {
            return Err(self.unexpected());
        }
        self.advance()?;
        self.skip_padding()?;
        if self.ch != b'<' {
            return Err(self.unexpected());
        }
        self.advance()
    }

    /// Discards comments and a DOCTYPE until the root element opens.
    fn parse_prolog(&mut self) -> Result<Token> {
        while self.ch == b'!' {
            self.advance()?;
            match self.ch {
                b'-' => self.skip_comment()?,
                b'D' => self.skip_doctype()?,
                _ => return Err(self.unexpected()),
            }
            self.skip_padding()?;
            if self.ch != b'<' {
                return Err(self.unexpected());
            }
            self.advance()?;
        }
        self.begin_element()
    }

    /// Consumes a comment; `ch` is the first `-` on entry and the byte
    /// behind `-->` on exit.
    fn skip_comment(&mut self) -> Result<()> {
        self.advance()?;
        if self.ch != b'-' {
            return Err(self.unexpected());
        }
        let mut m1 = 0;
        let mut m2 = 0;
        self.advance()?;
        while !(m1 == b'-' && m2 == b'-' && self.ch == b'>') {
            m1 = m2;
            m2 = self.ch;
            self.advance()?;
        }
        self.advance()
    }

    /// Consumes a DOCTYPE, skipping an internal `[...]` subset without
    /// interpreting it; `ch` is the `D` on entry and the byte behind `>` on
    /// exit.
    fn skip_doctype(&mut self) -> Result<()> {
        for &expected in b"OCTYPE" {
            self.advance()?;
            if self.ch != expected {
                return Err(self.unexpected());
            }
        }
        self.advance()?;
        while self.ch != b'>' {
            if self.ch == b'[' {
                self.advance()?;
                while self.ch != b']' {
                    self.advance()?;
                }
            }
            self.advance()?;
        }
        self.advance()
    }

    /// Reads a start-tag name; `ch` is its first byte.
    fn begin_element(&mut self) -> Result<Token> {
        let mark = self.scratch.mark();
        self.read_name(mark)?;
        self.depth += 1;
        self.state = State::StartTag;
        Ok(Token::StartTag)
    }

    fn resume_start_tag(&mut self) -> Result<Token> {
        self.skip_padding()?;
        self.state = State::Attributes;
        Ok(Token::StartAttributes)
    }

    /// Reports attributes until the tag closes. `xml:space` is consumed
    /// here and never reaches the caller.
    fn parse_attributes(&mut self) -> Result<Token> {
        while self.ch != b'>' && self.ch != b'/' {
            self.read_attribute()?;
            if self.scratch.payload_below() == Some(&b"xml:space"[..]) {
                self.enter_space_scope();
                self.scratch.pop_record();
                self.scratch.pop_record();
                self.skip_padding()?;
                continue;
            }
            self.state = State::Attribute;
            return Ok(Token::Attribute);
        }
        self.state = State::TagClose;
        Ok(Token::EndAttributes)
    }

    fn resume_attribute(&mut self) -> Result<Token> {
        self.scratch.pop_record(); // value
        self.scratch.pop_record(); // name
        self.skip_padding()?;
        self.parse_attributes()
    }

    fn resume_tag_close(&mut self) -> Result<Token> {
        if self.ch == b'/' {
            // empty element; the tag name stays on top for the caller
            self.state = State::EmptyElement;
            return Ok(Token::EndTag);
        }
        self.scratch.pop_record(); // tag name
        self.text_start = self.scratch.mark();
        self.advance()?; // step over '>'
        self.parse_content(true)
    }

    fn resume_empty_element(&mut self) -> Result<Token> {
        self.leave_space_scope();
        self.scratch.pop_record(); // tag name
        self.advance()?;
        if self.ch != b'>' {
            return Err(self.unexpected());
        }
        self.leave_element()
    }

    /// Runs the content loop of the innermost open element until the next
    /// token boundary. `trim_leading` is false when re-entering behind a
    /// CDATA section, which keeps its bytes glued to what follows.
    fn parse_content(&mut self, mut trim_leading: bool) -> Result<Token> {
        loop {
            if trim_leading && self.trim && !self.preserve {
                self.skip_padding()?;
            }
            self.accumulate_text()?;
            self.advance()?; // byte behind '<'
            if self.ch != b'!' {
                // '!' opens a CDATA section or comment whose bytes join
                // this run, so the separator before it survives
                self.trim_trailing_text();
            }
            match self.ch {
                b'/' => {
                    if self.scratch.mark() > self.text_start {
                        self.scratch.seal(scratch::TEXT, self.text_start);
                        self.state = State::Text;
                        return Ok(Token::Text);
                    }
                    return self.read_end_tag();
                }
                b'!' => {
                    self.advance()?;
                    match self.ch {
                        b'-' => {
                            self.skip_comment()?;
                            trim_leading = true;
                        }
                        b'[' => {
                            self.read_cdata()?;
                            trim_leading = false;
                        }
                        _ => return Err(self.unexpected()),
                    }
                }
                _ => {
                    self.scratch.push_offset(self.text_start);
                    return self.begin_element();
                }
            }
        }
    }

    /// Accumulates character data onto the stack until the next `<`,
    /// resolving references and applying the collapse policy.
    fn accumulate_text(&mut self) -> Result<()> {
        let collapse = self.collapse && !self.preserve;
        let mut last = 0u8;
        while self.ch != b'<' {
            if self.ch == b'&' {
                let byte = self.read_reference()?;
                self.scratch.push_byte(byte);
                last = byte;
                continue;
            }
            if collapse {
                let ch = match self.ch {
                    b'\n' | b'\r' | b'\t' => b' ',
                    ch => ch,
                };
                if !(ch == b' ' && last == b' ') {
                    self.scratch.push_byte(ch);
                }
                last = ch;
            } else {
                self.scratch.push_byte(self.ch);
            }
            self.advance()?;
        }
        Ok(())
    }

    /// Rewinds trailing whitespace of the current text run.
    fn trim_trailing_text(&mut self) {
        if self.trim && !self.preserve {
            let run = self.scratch.bytes_from(self.text_start);
            let kept = run
                .iter()
                .rposition(|&b| !is_padding(b))
                .map_or(0, |p| p + 1);
            self.scratch.truncate(self.text_start + kept);
        }
    }

    /// Reads an end-tag name; `ch` is the `/` behind `<` on entry.
    fn read_end_tag(&mut self) -> Result<Token> {
        self.advance()?;
        let mark = self.scratch.mark();
        self.read_name(mark)?;
        self.state = State::ElementEnd;
        Ok(Token::EndTag)
    }

    fn resume_text(&mut self) -> Result<Token> {
        self.scratch.pop_record();
        self.read_end_tag()
    }

    fn resume_element_end(&mut self) -> Result<Token> {
        self.leave_space_scope();
        self.scratch.pop_record(); // end-tag name
        self.skip_padding()?;
        if self.ch != b'>' {
            return Err(self.unexpected());
        }
        self.leave_element()
    }

    /// Returns into the enclosing content, or finishes the document when
    /// the root element closed.
    fn leave_element(&mut self) -> Result<Token> {
        if self.depth == 0 {
            // nothing behind the root element is ever read
            self.state = State::Epilog;
            return Ok(Token::EndDocument);
        }
        self.text_start = self.scratch.pop_offset();
        self.advance()?; // step over '>'
        self.parse_content(true)
    }

    fn read_name(&mut self, mark: usize) -> Result<()> {
        if !is_name_start(self.ch) {
            return Err(self.unexpected());
        }
        self.scratch.push_byte(self.ch);
        self.advance()?;
        while is_name_byte(self.ch) {
            self.scratch.push_byte(self.ch);
            self.advance()?;
        }
        self.scratch.seal(scratch::NAME, mark);
        Ok(())
    }

    /// Reads `name` or `name = "value"`, leaving a name record and a value
    /// record on the stack.
    fn read_attribute(&mut self) -> Result<()> {
        let mark = self.scratch.mark();
        self.read_name(mark)?;
        self.skip_padding()?;
        if self.ch == b'=' {
            self.advance()?;
            self.skip_padding()?;
            self.read_value()?;
            self.skip_padding()?;
        } else {
            // an attribute written without a value reads as "1"
            self.scratch.push_record(scratch::VALUE, b"1");
        }
        Ok(())
    }

    fn read_value(&mut self) -> Result<()> {
        let quote = self.ch;
        if quote != b'\'' && quote != b'"' {
            return Err(self.unexpected());
        }
        self.advance()?;
        let mark = self.scratch.mark();
        while self.ch != quote {
            if self.ch == b'&' {
                let byte = self.read_reference()?;
                self.scratch.push_byte(byte);
            } else {
                self.scratch.push_byte(self.ch);
                self.advance()?;
            }
        }
        self.advance()?; // step over the closing quote
        self.scratch.seal(scratch::VALUE, mark);
        Ok(())
    }

    /// Decodes one `&...;` reference; `ch` is `&` on entry and the byte
    /// behind `;` on exit.
    fn read_reference(&mut self) -> Result<u8> {
        let mark = self.scratch.mark();
        self.advance()?;
        while self.ch != b';' {
            self.scratch.push_byte(self.ch);
            self.advance()?;
        }
        self.advance()?;
        let resolved = escape::resolve_reference(self.scratch.bytes_from(mark));
        self.scratch.truncate(mark);
        resolved.ok_or_else(|| self.unexpected())
    }

    /// Consumes `[CDATA[...]]>`, appending the literal bytes to the current
    /// text run; `ch` is the `[` behind `!` on entry.
    fn read_cdata(&mut self) -> Result<()> {
        for &expected in b"CDATA" {
            self.advance()?;
            if self.ch != expected {
                return Err(self.unexpected());
            }
        }
        self.advance()?;
        if self.ch != b'[' {
            return Err(self.unexpected());
        }
        self.advance()?;
        let mut m1 = self.ch;
        self.advance()?;
        let mut m2 = self.ch;
        self.advance()?;
        while !(m1 == b']' && m2 == b']' && self.ch == b'>') {
            self.scratch.push_byte(m1);
            m1 = m2;
            m2 = self.ch;
            self.advance()?;
        }
        self.advance()
    }

    fn enter_space_scope(&mut self) {
        if self.space_scopes.len() == XML_SPACE_SCOPES {
            panic!("maximum of {} nested xml:space scopes reached", XML_SPACE_SCOPES);
        }
        let preserve = self.scratch.payload() == Some(&b"preserve"[..]);
        self.space_scopes.push(SpaceScope {
            depth: self.depth,
            prior_preserve: self.preserve,
        });
        self.preserve = preserve;
    }

    /// Pops the `xml:space` scope opened by the element that is closing,
    /// if any, and steps one level up.
    fn leave_space_scope(&mut self) {
        if let Some(scope) = self.space_scopes.last().copied() {
            if scope.depth == self.depth {
                self.preserve = scope.prior_preserve;
                self.space_scopes.pop();
            }
        }
        self.depth -= 1;
    }

    fn skip_padding(&mut self) -> Result<()> {
        while is_padding(self.ch) {
            self.advance()?;
        }
        Ok(())
    }

    /// Pulls the next byte from the source, keeping (row, col) current.
    fn advance(&mut self) -> Result<()> {
        match self.source.next_byte() {
            Ok(Some(byte)) => {
                if byte == b'\n' {
                    self.row += 1;
                    self.col = 1;
                } else {
                    self.col += 1;
                }
                self.ch = byte;
                Ok(())
            }
            Ok(None) => Err(Error::UnexpectedEof),
            Err(error) => Err(Error::Io(error)),
        }
    }

    /// A syntax error at the position of the current byte.
    fn unexpected(&self) -> Error {
        Error::Syntax {
            row: self.row,
            col: self.col,
        }
    }
}
