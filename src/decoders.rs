//! The lexer operates over a stream of `char`s produced by some flavour of iterator. When the input
//! is a byte source rather than a string, the bytes are converted into `char`s by one of the
//! decoders supplied by `chisel-decoders`.
//!
//! The [DecoderSelector] implemented within this module is used to instantiate new `char`
//! iterators, based on different encodings. (Currently only ASCII and UTF-8 are supported).
//! The `chisel-decoders` iterators end quietly on a malformed byte, so input is always checked
//! against its [Encoding] before it is handed over to them.
use chisel_decoders::{ascii::AsciiDecoder, utf8::Utf8Decoder};
use std::io::{BufRead, Read};

use crate::coords::Coords;
use crate::errors::{Details, Error, ParserResult, Stage};
use crate::lexer_error;

/// Enumeration of different supported encoding types
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
}

/// A boxed `char` iterator, the form of input consumed by the lexer
pub type CharSource<'a> = Box<dyn Iterator<Item = char> + 'a>;

/// A `char` iterator which owns the text it walks over
pub(crate) struct OwnedChars {
    text: String,
    index: usize,
}

impl Iterator for OwnedChars {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.text[self.index..].chars().next()?;
        self.index += c.len_utf8();
        Some(c)
    }
}

/// A struct that is essentially a factory for creating new instances of [char] iterators,
/// based on a specified encoding type
#[derive(Default)]
pub(crate) struct DecoderSelector {}

impl DecoderSelector {
    /// Create and return an instance of the default byte decoder / char iterator. (Utf-8)
    pub fn default_decoder<'a, Buffer: BufRead>(&self, buffer: &'a mut Buffer) -> CharSource<'a> {
        Box::new(Utf8Decoder::new(buffer))
    }

    /// Create and return an instance of a given byte decoder / char iterator based on a specific
    /// encoding
    pub fn new_decoder<'a, Buffer: BufRead>(
        &self,
        buffer: &'a mut Buffer,
        encoding: Encoding,
    ) -> CharSource<'a> {
        match encoding {
            Encoding::Ascii => Box::new(AsciiDecoder::new(buffer)),
            Encoding::Utf8 => self.default_decoder(buffer),
        }
    }

    /// Read a source to the end and decode it into an owned `char` iterator. Read failures are
    /// reported against the input stage, and bytes which are not valid for the encoding against
    /// the lexer stage, positioned at the first offending byte
    pub fn read_all<R: Read>(
        &self,
        reader: &mut R,
        encoding: Encoding,
    ) -> ParserResult<CharSource<'static>> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes).map_err(|err| Error {
            stage: Stage::Input,
            details: Details::ReadFailure(err.to_string()),
            coords: None,
        })?;
        check_encoding(&bytes, encoding)?;
        let mut buffer: &[u8] = &bytes;
        let text: String = self.new_decoder(&mut buffer, encoding).collect();
        Ok(Box::new(OwnedChars { text, index: 0 }))
    }
}

/// Check that a buffer is valid for an encoding in full
pub(crate) fn check_encoding(bytes: &[u8], encoding: Encoding) -> ParserResult<()> {
    match encoding {
        Encoding::Utf8 => utf8_str(bytes).map(|_| ()),
        Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
            None => Ok(()),
            Some(index) => Err(invalid_at(bytes, index, Details::NonAsciiInputDetected)),
        },
    }
}

/// View a buffer as a `str`, failing at the first byte which is not valid UTF-8
pub(crate) fn utf8_str(bytes: &[u8]) -> ParserResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|err| invalid_at(bytes, err.valid_up_to(), Details::NonUtf8InputDetected))
}

fn invalid_at(bytes: &[u8], valid_up_to: usize, details: Details) -> Error {
    let mut coords = Coords::default();
    if let Ok(valid) = std::str::from_utf8(&bytes[..valid_up_to]) {
        valid.chars().for_each(|c| coords.advance(c));
    }
    lexer_error!(details, coords)
}
