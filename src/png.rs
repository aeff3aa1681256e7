//! PNG chunk stream described as a schema composition.
//!
//! A file is the 8-byte signature followed by chunks framed as
//! `{u4b length, str(4) type, bytes(length) data, u4b crc}`. The stream
//! stops after the `IEND` chunk; `IHDR` data is further decoded into the
//! header record. CRCs are carried as opaque fields, never recomputed.

use crate::error::CodecError;
use crate::schema::{FieldHook, Schema, StreamHook, StreamStep};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// IHDR payload layout.
pub fn header() -> Result<Schema, CodecError> {
    Schema::record(vec![
        ("width", Schema::prim("i4b")?),
        ("height", Schema::prim("i4b")?),
        ("bitdepth", Schema::prim("u1")?),
        ("colortype", Schema::prim("u1")?),
        ("compression", Schema::prim("u1")?),
        ("filter", Schema::prim("u1")?),
        ("interlace", Schema::prim("u1")?),
    ])
}

/// One chunk. The `data` extent comes from the decoded `length` sibling.
pub fn chunk() -> Result<Schema, CodecError> {
    Schema::record_hooked(
        vec![
            ("length", Schema::prim("u4b")?),
            ("type", Schema::prim_with("str", None, vec![4])?),
            ("data", Schema::prim("bytes")?),
            ("crc", Schema::prim("u4b")?),
        ],
        Some(Arc::new(ChunkFields)),
    )
}

/// Whole file: signature literal plus the chunk stream.
pub fn stream() -> Result<Schema, CodecError> {
    Schema::record(vec![
        (
            "signature",
            Schema::enumeration(
                vec![(Value::Str("PNG".to_string()), SIGNATURE.to_vec())],
                None,
            ),
        ),
        ("chunks", Schema::array_hooked(chunk()?, Arc::new(ChunkStream))),
    ])
}

#[derive(Debug)]
struct ChunkFields;

impl FieldHook for ChunkFields {
    fn decode_args(&self, field: &str, partial: &HashMap<String, Value>) -> Option<Vec<u64>> {
        if field != "data" {
            return None;
        }
        partial.get("length").and_then(Value::as_u64).map(|n| vec![n])
    }

    fn encode_args(&self, field: &str, map: &HashMap<String, Value>) -> Option<Vec<u64>> {
        if field != "data" {
            return None;
        }
        map.get("length").and_then(Value::as_u64).map(|n| vec![n])
    }

    fn finish_decode(&self, map: &mut HashMap<String, Value>) -> Result<(), CodecError> {
        if map.get("type").and_then(Value::as_str) != Some("IHDR") {
            return Ok(());
        }
        let raw = match map.get("data") {
            Some(Value::Bytes(b)) => b.clone(),
            _ => return Ok(()),
        };
        let (value, used) = header()?.decode(&raw, 0).map_err(|e| e.at("data"))?;
        if used != raw.len() {
            return Err(CodecError::LengthMismatch(format!(
                "IHDR data is {} byte(s), header layout uses {}",
                raw.len(),
                used
            )));
        }
        map.insert("data".to_string(), value);
        Ok(())
    }

    fn prepare_encode(
        &self,
        map: &HashMap<String, Value>,
    ) -> Result<Option<HashMap<String, Value>>, CodecError> {
        if map.get("type").and_then(Value::as_str) != Some("IHDR") {
            return Ok(None);
        }
        let inner = match map.get("data") {
            Some(v @ Value::Map(_)) => v,
            _ => return Ok(None),
        };
        let raw = header()?.encode(inner).map_err(|e| e.at("data"))?;
        let mut rewritten = map.clone();
        rewritten.insert("data".to_string(), Value::Bytes(raw));
        Ok(Some(rewritten))
    }
}

#[derive(Debug)]
struct ChunkStream;

impl StreamHook for ChunkStream {
    fn decode_next(
        &self,
        elem: &Schema,
        buf: &[u8],
        offset: usize,
        out: &mut Vec<Value>,
    ) -> Result<(usize, StreamStep), CodecError> {
        let (v, n) = elem.decode(buf, offset)?;
        let stop =
            v.as_map().and_then(|m| m.get("type")).and_then(Value::as_str) == Some("IEND");
        out.push(v);
        Ok((n, if stop { StreamStep::Stop } else { StreamStep::Continue }))
    }
}
