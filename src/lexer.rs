//! The JSONx lexer. Tokens are produced on demand, with a single token of lookahead, from a
//! stream of `char`s. Malformed input never stops the lexer: errors are recorded internally and
//! an [Token::Illegal] token is emitted in place of the offending lexeme, so that scanning can
//! continue and later problems can still be reported.
use std::fmt::{Display, Formatter};
use std::iter::Peekable;

use crate::coords::{Coords, Span};
use crate::decoders::CharSource;
use crate::errors::{Details, Error, ParserResult};
use crate::{internal_error, lexer_error};

/// Enumeration of valid JSONx tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Colon,
    Comma,
    /// The optional `;` terminator between top level values
    Semicolon,
    /// A quoted string, with escape sequences already decoded
    Str(String),
    /// A backtick delimited string, taken verbatim
    RawStr(String),
    /// A bare identifier. Covers the `true`, `false` and `null` keywords
    Ident(String),
    /// A numeric literal, in its original textual form
    Number(String),
    /// Stands in for a lexeme that failed to scan
    Illegal(char),
    EndOfInput,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::StartObject => write!(f, "'{{'"),
            Token::EndObject => write!(f, "'}}'"),
            Token::StartArray => write!(f, "'['"),
            Token::EndArray => write!(f, "']'"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::Semicolon => write!(f, "';'"),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::RawStr(s) => write!(f, "raw string `{}`", s),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Illegal(c) => write!(f, "illegal input at '{}'", c),
            Token::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// A packed token consists of a [Token] and the [Span] associated with it
pub type PackedToken = (Token, Span);

/// Convenience macro for packing tokens along with their positional information
macro_rules! packed_token {
    ($t:expr, $s:expr, $e:expr) => {
        ($t, Span { start: $s, end: $e })
    };
    ($t:expr, $s:expr) => {
        ($t, Span { start: $s, end: $s })
    };
}

pub struct Lexer<'a> {
    /// The underlying source of characters
    chars: Peekable<CharSource<'a>>,
    /// [Coords] of the next character to be read
    coords: Coords,
    /// The most recently peeked token, if any
    lookahead: Option<PackedToken>,
    /// Lexical errors recorded since the last call to [Lexer::take_errors]
    errors: Vec<Error>,
}

impl<'a> From<&'a str> for Lexer<'a> {
    fn from(value: &'a str) -> Self {
        Lexer::new(Box::new(value.chars()))
    }
}

impl<'a> Lexer<'a> {
    pub fn new(chars: CharSource<'a>) -> Self {
        Lexer {
            chars: chars.peekable(),
            coords: Coords::default(),
            lookahead: None,
            errors: vec![],
        }
    }

    /// Look at the next token without consuming it
    pub fn peek(&mut self) -> ParserResult<&PackedToken> {
        let packed = match self.lookahead.take() {
            Some(packed) => packed,
            None => self.scan()?,
        };
        Ok(self.lookahead.insert(packed))
    }

    /// Consume the next token from the input
    pub fn consume(&mut self) -> ParserResult<PackedToken> {
        match self.lookahead.take() {
            Some(packed) => Ok(packed),
            None => self.scan(),
        }
    }

    /// Drain the lexical errors recorded so far
    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.coords.advance(c);
        Some(c)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.next_char();
        }
    }

    /// Skip any whitespace, and then scan a single token
    fn scan(&mut self) -> ParserResult<PackedToken> {
        self.skip_whitespace();
        let start = self.coords;
        match self.peek_char() {
            Some(c) => self.match_token(c, start),
            None => Ok(packed_token!(Token::EndOfInput, start)),
        }
    }

    /// Select and run the scan rule for a token starting with `first`. Must not be called while
    /// positioned on whitespace
    fn match_token(&mut self, first: char, start: Coords) -> ParserResult<PackedToken> {
        if first.is_whitespace() {
            return Err(internal_error!(Details::WhitespaceAtTokenStart(first), start));
        }
        let packed = match first {
            '{' => self.match_single(Token::StartObject, start),
            '}' => self.match_single(Token::EndObject, start),
            '[' => self.match_single(Token::StartArray, start),
            ']' => self.match_single(Token::EndArray, start),
            ':' => self.match_single(Token::Colon, start),
            ',' => self.match_single(Token::Comma, start),
            ';' => self.match_single(Token::Semicolon, start),
            '"' => self.match_string(start),
            '`' => self.match_raw_string(start),
            '-' | '0'..='9' => self.match_number(first, start),
            c if c.is_alphabetic() || c == '_' => self.match_identifier(start),
            c => {
                self.next_char();
                self.errors
                    .push(lexer_error!(Details::IllegalCharacter(c), start));
                packed_token!(Token::Illegal(c), start, self.coords)
            }
        };
        Ok(packed)
    }

    fn match_single(&mut self, token: Token, start: Coords) -> PackedToken {
        self.next_char();
        packed_token!(token, start, self.coords)
    }

    /// Match a quoted string, decoding escape sequences along the way. A raw newline or the end
    /// of input before the closing quote terminates the match
    fn match_string(&mut self, start: Coords) -> PackedToken {
        self.next_char();
        let mut value = String::new();
        let mut valid = true;
        loop {
            let at = self.coords;
            match self.peek_char() {
                None | Some('\n') => {
                    self.errors
                        .push(lexer_error!(Details::UnterminatedString, start));
                    return packed_token!(Token::Illegal('"'), start, self.coords);
                }
                Some('"') => {
                    self.next_char();
                    break;
                }
                Some('\\') => {
                    self.next_char();
                    valid &= self.match_escape_sequence(at, &mut value);
                }
                Some(c) => {
                    self.next_char();
                    value.push(c);
                }
            }
        }
        if valid {
            packed_token!(Token::Str(value), start, self.coords)
        } else {
            packed_token!(Token::Illegal('"'), start, self.coords)
        }
    }

    /// Match the remainder of an escape sequence, the backslash having been consumed already
    fn match_escape_sequence(&mut self, at: Coords, value: &mut String) -> bool {
        let decoded = match self.peek_char() {
            // left for the enclosing string match to report as unterminated
            None | Some('\n') => return false,
            Some('u') => {
                self.next_char();
                return self.match_unicode_escape_sequence(at, value);
            }
            Some(c) => {
                self.next_char();
                match c {
                    '"' | '\\' | '/' => c,
                    'b' => '\u{08}',
                    'f' => '\u{0c}',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    _ => {
                        self.errors
                            .push(lexer_error!(Details::InvalidEscapeSequence(c), at));
                        return false;
                    }
                }
            }
        };
        value.push(decoded);
        true
    }

    /// Match a `uXXXX` escape, combining UTF-16 surrogate pairs into a single `char`
    fn match_unicode_escape_sequence(&mut self, at: Coords, value: &mut String) -> bool {
        let high = match self.match_hex_quad() {
            Ok(high) => high,
            Err(digits) => return self.invalid_unicode(at, digits),
        };
        let code = match high {
            0xD800..=0xDBFF => {
                if self.peek_char() != Some('\\') {
                    return self.invalid_unicode(at, format!("{:04X}", high));
                }
                self.next_char();
                if self.peek_char() != Some('u') {
                    return self.invalid_unicode(at, format!("{:04X}", high));
                }
                self.next_char();
                match self.match_hex_quad() {
                    Ok(low @ 0xDC00..=0xDFFF) => 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00),
                    Ok(low) => return self.invalid_unicode(at, format!("{:04X}", low)),
                    Err(digits) => return self.invalid_unicode(at, digits),
                }
            }
            0xDC00..=0xDFFF => return self.invalid_unicode(at, format!("{:04X}", high)),
            code => code,
        };
        match char::from_u32(code) {
            Some(c) => {
                value.push(c);
                true
            }
            None => self.invalid_unicode(at, format!("{:04X}", code)),
        }
    }

    /// Consume exactly four hex digits. On failure the digits matched so far are returned
    fn match_hex_quad(&mut self) -> Result<u32, String> {
        let mut digits = String::with_capacity(4);
        let mut code = 0;
        for _ in 0..4 {
            match self.peek_char().and_then(|c| c.to_digit(16).map(|d| (c, d))) {
                Some((c, d)) => {
                    self.next_char();
                    digits.push(c);
                    code = code * 16 + d;
                }
                None => return Err(digits),
            }
        }
        Ok(code)
    }

    fn invalid_unicode(&mut self, at: Coords, digits: String) -> bool {
        self.errors
            .push(lexer_error!(Details::InvalidUnicodeEscapeSequence(digits), at));
        false
    }

    /// Match a raw string. Everything up to the closing backtick is taken verbatim
    fn match_raw_string(&mut self, start: Coords) -> PackedToken {
        self.next_char();
        let mut value = String::new();
        loop {
            match self.next_char() {
                Some('`') => break,
                Some(c) => value.push(c),
                None => {
                    self.errors
                        .push(lexer_error!(Details::UnterminatedRawString, start));
                    return packed_token!(Token::Illegal('`'), start, self.coords);
                }
            }
        }
        packed_token!(Token::RawStr(value), start, self.coords)
    }

    /// Match a number, retaining the literal text. The whole literal is consumed before it is
    /// validated, so that a single error covers a single malformed number
    fn match_number(&mut self, first: char, start: Coords) -> PackedToken {
        let mut text = String::new();
        let mut valid = true;
        if first == '-' {
            self.push_next(&mut text);
        }
        match self.peek_char() {
            Some('0') => {
                self.push_next(&mut text);
                // leading zeros are not permitted
                valid &= self.match_digits(&mut text) == 0;
            }
            Some('1'..='9') => {
                self.match_digits(&mut text);
            }
            _ => valid = false,
        }
        if self.peek_char() == Some('.') {
            self.push_next(&mut text);
            valid &= self.match_digits(&mut text) > 0;
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.push_next(&mut text);
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.push_next(&mut text);
            }
            valid &= self.match_digits(&mut text) > 0;
        }
        if valid {
            packed_token!(Token::Number(text), start, self.coords)
        } else {
            self.errors
                .push(lexer_error!(Details::InvalidNumericRepresentation(text), start));
            packed_token!(Token::Illegal(first), start, self.coords)
        }
    }

    /// Consume a run of ascii digits, returning how many were found
    fn match_digits(&mut self, text: &mut String) -> usize {
        let mut count = 0;
        while matches!(self.peek_char(), Some('0'..='9')) {
            self.push_next(text);
            count += 1;
        }
        count
    }

    fn push_next(&mut self, text: &mut String) {
        if let Some(c) = self.next_char() {
            text.push(c);
        }
    }

    fn match_identifier(&mut self, start: Coords) -> PackedToken {
        let mut name = String::new();
        while let Some(c) = self.peek_char() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.push_next(&mut name);
        }
        packed_token!(Token::Ident(name), start, self.coords)
    }
}
