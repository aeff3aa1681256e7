//! JPEG segment stream described as a schema composition.
//!
//! Segments open with a two-byte marker. `SOI`/`EOI` carry nothing else;
//! every other marker is followed by a big-endian length (inclusive of its
//! own two bytes) and that many payload bytes. After `SOS` comes the
//! entropy-coded span, which has no length field of its own: it runs up to
//! the next `FF xx` with `xx != 00` and appears in the decoded output as a
//! synthetic segment tagged [`ECS_MARKER`]. Decoding stops after `EOI`.

use crate::error::CodecError;
use crate::schema::{FieldHook, Schema, StreamHook, StreamStep};
use crate::value::{map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Marker tag of the synthetic entropy-coded segment.
pub const ECS_MARKER: &str = "ECS";

/// Two-byte marker tags. Unknown markers fall through to a bare `u2b`.
pub fn marker() -> Result<Schema, CodecError> {
    let mut entries = vec![
        ("SOI", 0xD8),
        ("EOI", 0xD9),
        ("SOS", 0xDA),
        ("DQT", 0xDB),
        ("DRI", 0xDD),
        ("DHT", 0xC4),
        ("COM", 0xFE),
        ("SOF0", 0xC0),
        ("SOF1", 0xC1),
        ("SOF2", 0xC2),
    ]
    .into_iter()
    .map(|(name, low)| (Value::Str(name.to_string()), vec![0xFF, low]))
    .collect::<Vec<_>>();
    for i in 0..16u8 {
        entries.push((Value::Str(format!("APP{}", i)), vec![0xFF, 0xE0 + i]));
    }
    Ok(Schema::enumeration(entries, Some(Schema::prim("u2b")?)))
}

/// One payload-bearing segment. `SOI`/`EOI` use the marker-only child
/// window; the stream hook drives which window applies.
pub fn segment() -> Result<Schema, CodecError> {
    Schema::record_hooked(
        vec![
            ("marker", marker()?),
            ("length", Schema::prim("u2b")?),
            ("data", Schema::prim("bytes")?),
        ],
        Some(Arc::new(SegmentFields)),
    )
}

/// Whole file: the marker-driven segment stream.
pub fn stream() -> Result<Schema, CodecError> {
    Ok(Schema::array_hooked(segment()?, Arc::new(SegmentStream)))
}

#[derive(Debug)]
struct SegmentFields;

impl FieldHook for SegmentFields {
    fn decode_args(&self, field: &str, partial: &HashMap<String, Value>) -> Option<Vec<u64>> {
        if field != "data" {
            return None;
        }
        let len = partial.get("length").and_then(Value::as_u64)?;
        Some(vec![len.saturating_sub(2)])
    }

    fn encode_args(&self, field: &str, map: &HashMap<String, Value>) -> Option<Vec<u64>> {
        if field != "data" {
            return None;
        }
        let len = map.get("length").and_then(Value::as_u64)?;
        Some(vec![len.saturating_sub(2)])
    }
}

#[derive(Debug)]
struct SegmentStream;

impl StreamHook for SegmentStream {
    fn decode_next(
        &self,
        elem: &Schema,
        buf: &[u8],
        offset: usize,
        out: &mut Vec<Value>,
    ) -> Result<(usize, StreamStep), CodecError> {
        let (head, n1) = elem.decode_with(buf, offset, &[0, 1])?;
        let name = head
            .as_map()
            .and_then(|m| m.get("marker"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        match name.as_deref() {
            Some("SOI") => {
                out.push(head);
                Ok((n1, StreamStep::Continue))
            }
            Some("EOI") => {
                out.push(head);
                Ok((n1, StreamStep::Stop))
            }
            _ => {
                let (rest, n2) = elem.decode_with(buf, offset + n1, &[1, 3])?;
                let mut seg = match head {
                    Value::Map(m) => m,
                    other => {
                        return Err(CodecError::Unrepresentable(format!(
                            "segment: expected map, got {}",
                            other.kind()
                        )))
                    }
                };
                if let Value::Map(tail) = rest {
                    seg.extend(tail);
                }
                let is_sos = name.as_deref() == Some("SOS");
                out.push(Value::Map(seg));
                let mut consumed = n1 + n2;
                if is_sos {
                    let (ecs, span) = scan_entropy(buf, offset + consumed);
                    out.push(ecs);
                    consumed += span;
                }
                Ok((consumed, StreamStep::Continue))
            }
        }
    }

    fn encode_element(
        &self,
        elem: &Schema,
        value: &Value,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        let name = value
            .as_map()
            .and_then(|m| m.get("marker"))
            .and_then(Value::as_str);
        match name {
            Some("ECS") => {
                let data = value
                    .as_map()
                    .and_then(|m| m.get("data"))
                    .and_then(Value::as_bytes)
                    .ok_or_else(|| CodecError::MissingField("data".to_string()))?;
                Ok(Some(data.to_vec()))
            }
            Some("SOI") | Some("EOI") => Ok(Some(elem.encode_with(value, &[0, 1])?)),
            _ => Ok(None),
        }
    }
}

/// Entropy-coded span: ends immediately before the next `FF xx`, `xx != 00`,
/// or at the end of the buffer.
fn scan_entropy(buf: &[u8], start: usize) -> (Value, usize) {
    let mut end = buf.len();
    let mut i = start;
    while i + 1 < buf.len() {
        if buf[i] == 0xFF && buf[i + 1] != 0x00 {
            end = i;
            break;
        }
        i += 1;
    }
    let span = end - start;
    let ecs = map(vec![
        ("marker", Value::Str(ECS_MARKER.to_string())),
        ("data", Value::Bytes(buf[start..end].to_vec())),
    ]);
    (ecs, span)
}
