//! Load/store adapter: thin wrappers that connect a root schema to whole
//! buffers and files. The codec itself never touches I/O.

use crate::error::CodecError;
use crate::schema::Schema;
use crate::value::Value;
use std::fs;
use std::path::Path;

/// Decode a whole buffer with the root schema. Trailing bytes beyond the
/// root's extent are left untouched.
pub fn parse_buffer(schema: &Schema, bytes: &[u8]) -> Result<Value, CodecError> {
    let (value, _) = schema.decode(bytes, 0)?;
    Ok(value)
}

/// Encode a value with the root schema.
pub fn encode_object(schema: &Schema, value: &Value) -> Result<Vec<u8>, CodecError> {
    schema.encode(value)
}

/// Read a file and decode it with the root schema.
pub fn parse_file(schema: &Schema, path: impl AsRef<Path>) -> Result<Value, CodecError> {
    let bytes = fs::read(path)?;
    parse_buffer(schema, &bytes)
}

/// Encode a value and write the bytes to a file.
pub fn write_object(
    schema: &Schema,
    value: &Value,
    path: impl AsRef<Path>,
) -> Result<(), CodecError> {
    fs::write(path, encode_object(schema, value)?)?;
    Ok(())
}
