//! A streaming decoder for JSONx, a relaxed superset of JSON.
//!
//! JSONx adds a handful of conveniences on top of standard JSON:
//! - raw strings delimited by backticks, taken verbatim with no escape processing
//! - bare identifiers as object keys
//! - a single input may hold any number of consecutive values, optionally separated by `;`
//!
//! Each value is lexed and parsed into a [JsonxValue] tree, rendered into canonical JSON and then
//! handed to `serde_json`, so that any type implementing [serde::de::DeserializeOwned] can be
//! used as a decode target.
//!
//! ```
//! let mut decoder = jsonx::Decoder::from_str(r#""a" `b`; {n: 1}"#);
//! let a: String = decoder.decode_next().unwrap();
//! let b: String = decoder.decode_next().unwrap();
//! let n: std::collections::HashMap<String, u32> = decoder.decode_next().unwrap();
//! assert_eq!((a.as_str(), b.as_str(), n["n"]), ("a", "b", 1));
//! assert!(!decoder.has_more());
//! ```

pub mod canonical;
pub mod coords;
pub mod decoder;
pub mod decoders;
pub mod errors;
pub mod lexer;
pub mod parser;
#[cfg(test)]
mod test_macros;

pub use decoder::{from_file, from_reader, from_slice, from_slice_or_json, from_str};
pub use decoder::{Decoder, State};
pub use decoders::Encoding;
pub use errors::{DecodeResult, Error, Errors};

/// Basic enumeration of different JSONx values
#[derive(Debug, Clone, PartialEq)]
pub enum JsonxValue {
    /// Map of values, in the order they appeared
    Object(Vec<(String, JsonxValue)>),
    /// Array of values
    Array(Vec<JsonxValue>),
    /// String value, from either a quoted or a raw string
    String(String),
    /// Numeric value
    Number(Number),
    /// Canonical boolean value
    Boolean(bool),
    /// Canonical null value
    Null,
}

impl JsonxValue {
    /// Look up an object member by key. Where a key is repeated, the last occurrence wins
    pub fn get(&self, key: &str) -> Option<&JsonxValue> {
        match self {
            JsonxValue::Object(members) => members
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonxValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            JsonxValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsonxValue::Null)
    }
}

/// A numeric value, held in the exact textual form it was written in so that conversion into
/// any numeric type stays lossless
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number(String);

impl Number {
    /// Wrap literal text which the lexer has already validated
    pub(crate) fn new(text: String) -> Self {
        Number(text)
    }

    /// The literal text of the number
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the literal has neither a fractional part nor an exponent
    pub fn is_integer(&self) -> bool {
        !self.0.contains(&['.', 'e', 'E'][..])
    }

    pub fn as_f64(&self) -> Option<f64> {
        fast_float::parse::<f64, _>(self.0.as_bytes()).ok()
    }

    /// The value as an `i64`, if it is an integer literal within range
    pub fn as_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        #[cfg(feature = "mixed_numerics")]
        {
            lexical::parse::<i64, _>(self.0.as_bytes()).ok()
        }
        #[cfg(not(feature = "mixed_numerics"))]
        {
            self.0.parse().ok()
        }
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
