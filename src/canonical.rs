//! Rendering of [JsonxValue] trees into canonical, strictly conformant JSON bytes.
//!
//! The canonical form carries no insignificant whitespace. Quoted and raw strings collapse to
//! the same escaped representation, numbers are written exactly as they appeared in the input,
//! and object members keep their original order.
use std::io::{self, Write};

use crate::JsonxValue;

/// Write the canonical form of a value
pub fn write<W: Write>(value: &JsonxValue, writer: &mut W) -> io::Result<()> {
    match value {
        JsonxValue::Null => writer.write_all(b"null"),
        JsonxValue::Boolean(true) => writer.write_all(b"true"),
        JsonxValue::Boolean(false) => writer.write_all(b"false"),
        JsonxValue::Number(n) => writer.write_all(n.as_str().as_bytes()),
        JsonxValue::String(s) => write_string(s, writer),
        JsonxValue::Array(values) => {
            writer.write_all(b"[")?;
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    writer.write_all(b",")?;
                }
                write(value, writer)?;
            }
            writer.write_all(b"]")
        }
        JsonxValue::Object(members) => {
            writer.write_all(b"{")?;
            for (index, (key, value)) in members.iter().enumerate() {
                if index > 0 {
                    writer.write_all(b",")?;
                }
                write_string(key, writer)?;
                writer.write_all(b":")?;
                write(value, writer)?;
            }
            writer.write_all(b"}")
        }
    }
}

/// Render the canonical form of a value into a fresh buffer
pub fn to_vec(value: &JsonxValue) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(128);
    write(value, &mut bytes)?;
    Ok(bytes)
}

fn write_string<W: Write>(value: &str, writer: &mut W) -> io::Result<()> {
    serde_json::to_writer(writer, value).map_err(io::Error::from)
}
