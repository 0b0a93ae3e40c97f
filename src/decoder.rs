//! The stream decoder. A [Decoder] pulls one value at a time out of its input, parses it into a
//! [JsonxValue] tree, renders the tree into canonical JSON and hands the bytes over to
//! `serde_json` for decoding into the caller's target type.
//!
//! A decoder holds nothing between calls beyond the lexer position and a single peeked token.
//! Once a decode fails the position can no longer be trusted, and the decoder refuses to go any
//! further.
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::canonical;
use crate::coords::Coords;
use crate::decoders::{utf8_str, CharSource, DecoderSelector, Encoding};
use crate::errors::{DecodeResult, Details, Error, Errors, Stage};
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;
use crate::JsonxValue;
use crate::{internal_error, parser_error};

/// The states a [Decoder] moves through
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// More values may be available
    Ready,
    /// Only whitespace remains. Terminal
    Exhausted,
    /// A decode failed and the input position is unreliable. Terminal
    Errored,
}

/// Decoder for a stream of JSONx values
pub struct Decoder<'a> {
    lexer: Lexer<'a>,
    state: State,
}

impl<'a> Decoder<'a> {
    /// Create a decoder over an arbitrary source of `char`s
    pub fn new(chars: CharSource<'a>) -> Self {
        Decoder {
            lexer: Lexer::new(chars),
            state: State::Ready,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &'a str) -> Self {
        Decoder::new(Box::new(input.chars()))
    }

    /// Create a decoder over a byte slice, which must hold valid UTF-8
    pub fn from_slice(input: &'a [u8]) -> DecodeResult<Self> {
        Ok(Decoder::from_str(utf8_str(input)?))
    }

    /// Create a decoder over a UTF-8 encoded reader. The reader is drained up front; a read
    /// failure or a byte that is not valid UTF-8 fails construction rather than ending the input
    /// early
    pub fn from_reader<R: Read>(reader: &mut R) -> DecodeResult<Decoder<'static>> {
        Decoder::from_reader_with_encoding(reader, Encoding::Utf8)
    }

    /// Create a decoder over a reader with a specific [Encoding]
    pub fn from_reader_with_encoding<R: Read>(
        reader: &mut R,
        encoding: Encoding,
    ) -> DecodeResult<Decoder<'static>> {
        let chars = DecoderSelector::default().read_all(reader, encoding)?;
        Ok(Decoder::new(chars))
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Check whether anything other than whitespace remains in the input
    pub fn has_more(&mut self) -> bool {
        match self.lexer.peek() {
            Ok((Token::EndOfInput, _)) => {
                if self.state == State::Ready {
                    self.state = State::Exhausted;
                }
                false
            }
            Ok(_) => true,
            Err(err) => {
                debug!(%err, "lexer failure whilst checking for more input");
                self.state = State::Errored;
                false
            }
        }
    }

    /// Parse the next value into a [JsonxValue] tree, without decoding it any further
    pub fn next_value(&mut self) -> DecodeResult<JsonxValue> {
        self.ensure_usable()?;
        let result = self.parse_next().map(|(value, _)| value);
        self.settle(result)
    }

    /// Decode the next value into a `T`. On failure, every lexical and syntax error found
    /// within the value is returned
    pub fn decode_next<T: DeserializeOwned>(&mut self) -> DecodeResult<T> {
        self.ensure_usable()?;
        let result = self
            .parse_next()
            .and_then(|(value, start)| bridge(&value, start));
        self.settle(result)
    }

    /// Decode the next value into an existing target. The target is only written to on success
    pub fn decode_into<T: DeserializeOwned>(&mut self, target: &mut T) -> DecodeResult<()> {
        *target = self.decode_next()?;
        Ok(())
    }

    /// Iterate over the remaining values, decoding each into a `T`. Iteration stops after the
    /// first failure
    pub fn iter<T: DeserializeOwned>(&mut self) -> Values<'_, 'a, T> {
        Values {
            decoder: self,
            marker: PhantomData,
        }
    }

    fn ensure_usable(&self) -> DecodeResult<()> {
        match self.state {
            State::Errored => Err(internal_error!(Details::DecoderErrored).into()),
            _ => Ok(()),
        }
    }

    /// Parse one value along with an optional trailing terminator, returning the value and the
    /// position it started at
    fn parse_next(&mut self) -> DecodeResult<(JsonxValue, Coords)> {
        let start = self.lexer.peek()?.1.start;
        let mut parser = Parser::default();
        let parsed = parser.parse(&mut self.lexer);

        let mut errors = self.lexer.take_errors();
        errors.extend(parser.take_errors());
        errors.sort_by_key(|e| e.coords);
        let value = match parsed {
            Ok(value) => value,
            Err(err) => {
                errors.push(err);
                None
            }
        };
        if let Some(errors) = Errors::new(errors) {
            return Err(errors);
        }
        let value = value.ok_or_else(|| internal_error!(Details::MissingValue, start))?;

        let terminated = matches!(self.lexer.peek()?.0, Token::Semicolon);
        if terminated {
            self.lexer.consume()?;
        }
        trace!(
            line = start.line,
            column = start.column,
            terminated,
            "parsed jsonx value"
        );
        Ok((value, start))
    }

    /// Record the outcome of a decode against the state machine
    fn settle<T>(&mut self, result: DecodeResult<T>) -> DecodeResult<T> {
        if let Err(errors) = &result {
            debug!(
                errors = errors.len(),
                first = %errors.first(),
                "jsonx decode failed"
            );
            if self.state == State::Ready {
                self.state = State::Errored;
            }
        }
        result
    }

    /// Check that nothing but whitespace remains
    fn ensure_exhausted(&mut self) -> DecodeResult<()> {
        let (token, span) = self.lexer.peek()?;
        match token {
            Token::EndOfInput => Ok(()),
            token => Err(parser_error!(
                Details::TrailingContent(token.to_string()),
                span.start
            )
            .into()),
        }
    }
}

/// Iterator over the values of a [Decoder], created by [Decoder::iter]
pub struct Values<'d, 'a, T> {
    decoder: &'d mut Decoder<'a>,
    marker: PhantomData<T>,
}

impl<'d, 'a, T: DeserializeOwned> Iterator for Values<'d, 'a, T> {
    type Item = DecodeResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.decoder.state == State::Errored || !self.decoder.has_more() {
            return None;
        }
        Some(self.decoder.decode_next())
    }
}

/// Decode the canonical form of a value into a `T`
fn bridge<T: DeserializeOwned>(value: &JsonxValue, start: Coords) -> DecodeResult<T> {
    let bytes = canonical::to_vec(value)
        .map_err(|err| internal_error!(Details::CanonicalRender(err.to_string()), start))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        // positions within the canonical bytes mean nothing to the caller
        let message = err.to_string();
        let suffix = format!(" at line {} column {}", err.line(), err.column());
        let message = message.strip_suffix(&suffix).unwrap_or(&message).to_string();
        Errors::from(Error {
            stage: Stage::Bridge,
            details: Details::Bridge(message),
            coords: Some(start),
        })
    })
}

fn decode_single<T: DeserializeOwned>(decoder: &mut Decoder) -> DecodeResult<T> {
    let value = decoder.decode_next()?;
    decoder.ensure_exhausted()?;
    Ok(value)
}

/// Decode exactly one value from a string. Anything other than whitespace, or a single
/// terminator, following the value is an error
pub fn from_str<T: DeserializeOwned>(input: &str) -> DecodeResult<T> {
    decode_single(&mut Decoder::from_str(input))
}

/// Decode exactly one value from a UTF-8 byte slice
pub fn from_slice<T: DeserializeOwned>(input: &[u8]) -> DecodeResult<T> {
    decode_single(&mut Decoder::from_slice(input)?)
}

/// Decode exactly one value from a UTF-8 encoded reader
pub fn from_reader<R: Read, T: DeserializeOwned>(mut reader: R) -> DecodeResult<T> {
    decode_single(&mut Decoder::from_reader(&mut reader)?)
}

/// Read a file and decode exactly one value from it
pub fn from_file<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> DecodeResult<T> {
    let bytes = std::fs::read(path.as_ref()).map_err(|err| {
        Errors::from(Error {
            stage: Stage::Input,
            details: Details::InvalidFile(format!("{}: {}", path.as_ref().display(), err)),
            coords: None,
        })
    })?;
    from_slice(&bytes)
}

/// Decode exactly one value from a byte slice. If the input is not valid JSONx, it is retried as
/// plain JSON. The JSONx errors are returned when both attempts fail
pub fn from_slice_or_json<T: DeserializeOwned>(input: &[u8]) -> DecodeResult<T> {
    match from_slice(input) {
        Ok(value) => Ok(value),
        Err(errors) => {
            debug!(first = %errors.first(), "jsonx decode failed, retrying as plain json");
            serde_json::from_slice(input).map_err(|_| errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::{self, BufReader, Read};

    use serde::Deserialize;

    use crate::decoder::{from_reader, from_slice_or_json, from_str, Decoder, State};
    use crate::decoders::Encoding;
    use crate::errors::{Details, Stage};
    use crate::reader_from_bytes;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Endpoint {
        name: String,
        port: u16,
        #[serde(default)]
        tags: Vec<String>,
        weight: Option<f64>,
    }

    #[test]
    fn should_decode_adjacent_and_terminated_values() {
        let mut decoder = Decoder::from_str(r#""a""b";"c""#);
        let mut got: Vec<String> = vec![];
        while decoder.has_more() {
            got.push(decoder.decode_next().unwrap());
        }
        assert_eq!(got, ["a", "b", "c"]);
        assert_eq!(decoder.state(), State::Exhausted);
    }

    #[test]
    fn should_decode_integers() {
        let v: i32 = from_str("1234").unwrap();
        assert_eq!(v, 1234);
    }

    #[test]
    fn should_decode_structs() {
        let endpoint: Endpoint = from_str(
            r#"{
                name: `primary`,
                "port": 8080,
                tags: ["a", `b\c`]
            }"#,
        )
        .unwrap();
        assert_eq!(
            endpoint,
            Endpoint {
                name: "primary".into(),
                port: 8080,
                tags: vec!["a".into(), "b\\c".into()],
                weight: None,
            }
        );
    }

    #[test]
    fn should_leave_target_untouched_on_syntax_errors() {
        let mut decoder = Decoder::from_str(r#""abc"#);
        let mut target = String::from("unchanged");
        let errors = decoder.decode_into(&mut target).unwrap_err();
        assert_eq!(target, "unchanged");
        assert_eq!(errors.first().stage, Stage::Lexer);
        assert_eq!(errors.first().details, Details::UnterminatedString);
        assert_eq!(decoder.state(), State::Errored);
    }

    #[test]
    fn should_report_bridge_errors_alone() {
        let mut decoder = Decoder::from_str("  {name: 1, port: 80}");
        let mut target = Endpoint::default();
        let errors = decoder.decode_into(&mut target).unwrap_err();
        assert_eq!(target, Endpoint::default());
        assert_eq!(errors.len(), 1);
        let err = errors.first();
        assert_eq!(err.stage, Stage::Bridge);
        assert_eq!(err.coords.unwrap().column, 3);
        assert!(!err.to_string().contains("at line 1 column"));
    }

    #[test]
    fn should_refuse_to_continue_after_failure() {
        let mut decoder = Decoder::from_str("[1,,2] 3");
        assert!(decoder.decode_next::<Vec<u32>>().is_err());
        assert!(decoder.has_more());
        let errors = decoder.decode_next::<u32>().unwrap_err();
        assert_eq!(errors.first().details, Details::DecoderErrored);
        assert_eq!(errors.first().stage, Stage::Internal);
        assert_eq!(decoder.state(), State::Errored);
    }

    #[test]
    fn should_iterate_until_first_failure() {
        let mut decoder = Decoder::from_str("1;2;x;4");
        let results: Vec<_> = decoder.iter::<u8>().collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(1));
        assert_eq!(results[1], Ok(2));
        assert!(results[2].is_err());
    }

    #[test]
    fn should_expose_value_trees() {
        let mut decoder = Decoder::from_str("{k: `v`}; null");
        let value = decoder.next_value().unwrap();
        assert_eq!(value.get("k").and_then(|v| v.as_str()), Some("v"));
        assert!(decoder.next_value().unwrap().is_null());
        assert!(!decoder.has_more());
    }

    #[test]
    fn should_fail_on_trailing_content() {
        let errors = from_str::<String>(r#""x" trailing-garbage"#).unwrap_err();
        assert_eq!(errors.first().stage, Stage::Parser);
        assert_eq!(
            errors.first().details,
            Details::TrailingContent("identifier 'trailing'".into())
        );
        assert_eq!(from_str::<String>("\"x\";  \n").unwrap(), "x");
    }

    #[test]
    fn should_fail_at_end_of_input() {
        let errors = from_str::<u8>("   ").unwrap_err();
        assert_eq!(errors.first().details, Details::UnexpectedEndOfInput("a value"));
    }

    #[test]
    fn should_decode_from_readers() {
        let mut reader = reader_from_bytes!("{b: 2, a: 1} {c: 3}");
        let mut decoder =
            Decoder::from_reader_with_encoding(&mut reader, Encoding::Ascii).unwrap();
        let first: BTreeMap<String, u8> = decoder.decode_next().unwrap();
        let second: BTreeMap<String, u8> = decoder.decode_next().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second["c"], 3);
        assert!(!decoder.has_more());
    }

    #[test]
    fn should_reject_invalid_utf8_slices() {
        let errors = Decoder::from_slice(b"\"ok\" \xff").err().unwrap();
        let err = errors.first();
        assert_eq!(err.details, Details::NonUtf8InputDetected);
        assert_eq!(err.coords.unwrap().absolute, 5);
    }

    #[test]
    fn should_fall_back_to_plain_json() {
        let v: Vec<u8> = from_slice_or_json(b"[1, 2]").unwrap();
        assert_eq!(v, [1, 2]);
        let errors = from_slice_or_json::<Vec<u8>>(b"[1, 2").unwrap_err();
        assert_eq!(errors.first().stage, Stage::Parser);
    }

    #[test]
    fn should_reject_invalid_utf8_readers() {
        let bytes: &[u8] = b"\"ok\" \xff\xfe garbage";
        let errors = from_reader::<_, String>(BufReader::new(bytes)).unwrap_err();
        let err = errors.first();
        assert_eq!(err.stage, Stage::Lexer);
        assert_eq!(err.details, Details::NonUtf8InputDetected);
        assert_eq!(err.coords.unwrap().absolute, 5);

        let mut reader = BufReader::new(bytes);
        let errors = Decoder::from_reader(&mut reader).err().unwrap();
        assert_eq!(errors.first().details, Details::NonUtf8InputDetected);
    }

    #[test]
    fn should_reject_truncated_utf8_readers() {
        let bytes: &[u8] = b"[\"\xc3";
        let errors = from_reader::<_, Vec<String>>(bytes).unwrap_err();
        assert_eq!(errors.first().details, Details::NonUtf8InputDetected);
        assert_eq!(errors.first().coords.unwrap().column, 3);
    }

    /// Yields some input, then fails every subsequent read
    struct Disconnecting {
        sent: bool,
    }

    impl Read for Disconnecting {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
            }
            self.sent = true;
            let chunk = b"[1, 2";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn should_report_read_failures_as_input_errors() {
        let errors = from_reader::<_, Vec<u8>>(Disconnecting { sent: false }).unwrap_err();
        assert_eq!(errors.len(), 1);
        let err = errors.first();
        assert_eq!(err.stage, Stage::Input);
        assert_eq!(err.details, Details::ReadFailure("connection reset".into()));
        assert!(err.coords.is_none());

        let mut reader = Disconnecting { sent: false };
        let errors = Decoder::from_reader(&mut reader).err().unwrap();
        assert_eq!(errors.first().stage, Stage::Input);
    }
}
