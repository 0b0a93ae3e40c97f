//! Recursive descent parser, building a single [JsonxValue] tree from a stream of tokens.
//!
//! The parser never stops at the first problem it finds. Errors are recorded, the parser
//! resynchronises on the next separator or closing bracket of the enclosing container, and
//! parsing carries on so that every syntax error within the value can be reported. A value is
//! only ever produced when no errors were recorded whilst building it.
use crate::coords::{Coords, Span};
use crate::errors::{Details, Error, ParserResult};
use crate::lexer::{Lexer, Token};
use crate::parser_error;
use crate::{JsonxValue, Number};

/// Maximum nesting of arrays and objects within a single value
pub const MAX_NESTING_DEPTH: usize = 128;

const EXPECTED_VALUE: &str = "a value";
const EXPECTED_KEY: &str = "an object key";
const EXPECTED_COLON: &str = "':' after object key";
const EXPECTED_ARRAY_SEPARATOR: &str = "',' or ']'";
const EXPECTED_OBJECT_SEPARATOR: &str = "',' or '}'";

/// Main JSONx parser struct
#[derive(Default)]
pub struct Parser {
    /// Errors recorded whilst parsing the current value
    errors: Vec<Error>,
    /// Current container nesting depth
    depth: usize,
}

impl Parser {
    /// Parse exactly one value from the lexer. Returns [None] whenever an error was recorded,
    /// in which case [Parser::take_errors] holds the details. An `Err` is only returned for
    /// failures that stop parsing outright
    pub fn parse(&mut self, lexer: &mut Lexer) -> ParserResult<Option<JsonxValue>> {
        let value = self.parse_value(lexer)?;
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Ok(None)
        }
    }

    /// Drain the errors recorded so far
    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }

    fn parse_value(&mut self, lexer: &mut Lexer) -> ParserResult<Option<JsonxValue>> {
        let (token, span) = lexer.peek()?.clone();
        let value = match token {
            Token::Str(value) | Token::RawStr(value) => JsonxValue::String(value),
            Token::Number(text) => JsonxValue::Number(Number::new(text)),
            Token::Ident(ref name) if name == "true" => JsonxValue::Boolean(true),
            Token::Ident(ref name) if name == "false" => JsonxValue::Boolean(false),
            Token::Ident(ref name) if name == "null" => JsonxValue::Null,
            Token::StartArray => {
                lexer.consume()?;
                return self.nested(span, |parser| parser.parse_array(lexer));
            }
            Token::StartObject => {
                lexer.consume()?;
                return self.nested(span, |parser| parser.parse_object(lexer));
            }
            token => {
                self.reject(lexer, EXPECTED_VALUE, &token, span)?;
                return Ok(None);
            }
        };
        lexer.consume()?;
        Ok(Some(value))
    }

    /// Run a container parse one level deeper
    fn nested<F>(&mut self, span: Span, parse: F) -> ParserResult<Option<JsonxValue>>
    where
        F: FnOnce(&mut Self) -> ParserResult<Option<JsonxValue>>,
    {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(parser_error!(
                Details::NestingTooDeep(MAX_NESTING_DEPTH),
                span.start
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// An array is a list of comma separated values. The opening bracket has been consumed
    fn parse_array(&mut self, lexer: &mut Lexer) -> ParserResult<Option<JsonxValue>> {
        let mut values = vec![];
        let mut valid = true;
        if lexer.peek()?.0 == Token::EndArray {
            lexer.consume()?;
            return Ok(Some(JsonxValue::Array(values)));
        }
        'elements: loop {
            match self.parse_value(lexer)? {
                Some(value) => values.push(value),
                None => {
                    valid = false;
                    self.synchronize(lexer, &Token::EndArray)?;
                }
            }
            loop {
                let (token, span) = lexer.peek()?.clone();
                match token {
                    Token::Comma => {
                        lexer.consume()?;
                        continue 'elements;
                    }
                    Token::EndArray => {
                        lexer.consume()?;
                        break 'elements;
                    }
                    Token::EndOfInput => {
                        self.end_of_input(EXPECTED_ARRAY_SEPARATOR, span.start);
                        valid = false;
                        break 'elements;
                    }
                    token => {
                        valid = false;
                        self.reject(lexer, EXPECTED_ARRAY_SEPARATOR, &token, span)?;
                        self.synchronize(lexer, &Token::EndArray)?;
                    }
                }
            }
        }
        Ok(valid.then_some(JsonxValue::Array(values)))
    }

    /// An object is a list of comma separated members. The opening brace has been consumed
    fn parse_object(&mut self, lexer: &mut Lexer) -> ParserResult<Option<JsonxValue>> {
        let mut members = vec![];
        let mut valid = true;
        if lexer.peek()?.0 == Token::EndObject {
            lexer.consume()?;
            return Ok(Some(JsonxValue::Object(members)));
        }
        'members: loop {
            match self.parse_member(lexer)? {
                Some(member) => members.push(member),
                None => {
                    valid = false;
                    self.synchronize(lexer, &Token::EndObject)?;
                }
            }
            loop {
                let (token, span) = lexer.peek()?.clone();
                match token {
                    Token::Comma => {
                        lexer.consume()?;
                        continue 'members;
                    }
                    Token::EndObject => {
                        lexer.consume()?;
                        break 'members;
                    }
                    Token::EndOfInput => {
                        self.end_of_input(EXPECTED_OBJECT_SEPARATOR, span.start);
                        valid = false;
                        break 'members;
                    }
                    token => {
                        valid = false;
                        self.reject(lexer, EXPECTED_OBJECT_SEPARATOR, &token, span)?;
                        self.synchronize(lexer, &Token::EndObject)?;
                    }
                }
            }
        }
        Ok(valid.then_some(JsonxValue::Object(members)))
    }

    /// A member is a quoted, raw or bare key, followed by a colon and a value
    fn parse_member(&mut self, lexer: &mut Lexer) -> ParserResult<Option<(String, JsonxValue)>> {
        let (token, span) = lexer.peek()?.clone();
        let key = match token {
            Token::Str(key) | Token::RawStr(key) | Token::Ident(key) => key,
            token => {
                self.reject(lexer, EXPECTED_KEY, &token, span)?;
                return Ok(None);
            }
        };
        lexer.consume()?;

        let (token, span) = lexer.peek()?.clone();
        if token != Token::Colon {
            self.reject(lexer, EXPECTED_COLON, &token, span)?;
            return Ok(None);
        }
        lexer.consume()?;

        Ok(self.parse_value(lexer)?.map(|value| (key, value)))
    }

    /// Record an error for an unexpected token. Single tokens are consumed, whilst separators
    /// and brackets are left in place for [Parser::synchronize]. Illegal tokens were already
    /// reported by the lexer
    fn reject(
        &mut self,
        lexer: &mut Lexer,
        expected: &'static str,
        token: &Token,
        span: Span,
    ) -> ParserResult<()> {
        match token {
            Token::EndOfInput => self.end_of_input(expected, span.start),
            Token::Illegal(_) => (),
            token => self.errors.push(parser_error!(
                Details::UnexpectedToken {
                    expected,
                    found: token.to_string()
                },
                span.start
            )),
        }
        match token {
            Token::Comma
            | Token::StartArray
            | Token::EndArray
            | Token::StartObject
            | Token::EndObject
            | Token::EndOfInput => Ok(()),
            _ => lexer.consume().map(|_| ()),
        }
    }

    /// Record an unexpected end of input, unless one has just been reported
    fn end_of_input(&mut self, expected: &'static str, coords: Coords) {
        if let Some(Details::UnexpectedEndOfInput(_)) = self.errors.last().map(|e| &e.details) {
            return;
        }
        self.errors
            .push(parser_error!(Details::UnexpectedEndOfInput(expected), coords));
    }

    /// Skip tokens until a comma or the given closing bracket is found at the current level, or
    /// the input runs out. Nested brackets are skipped as a whole, and stray closing brackets
    /// are discarded
    fn synchronize(&mut self, lexer: &mut Lexer, closer: &Token) -> ParserResult<()> {
        let mut depth = 0usize;
        loop {
            let token = &lexer.peek()?.0;
            match token {
                Token::EndOfInput => return Ok(()),
                Token::Comma if depth == 0 => return Ok(()),
                t if t == closer && depth == 0 => return Ok(()),
                Token::StartArray | Token::StartObject => depth += 1,
                Token::EndArray | Token::EndObject => depth = depth.saturating_sub(1),
                _ => (),
            }
            lexer.consume()?;
        }
    }
}
