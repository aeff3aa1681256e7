//! The encode/decode interpreter over [`Schema`] trees.
//!
//! Both directions are driven by the node kinds of [`schema`](crate::schema):
//! encode walks the value alongside the tree and appends bytes; decode keeps
//! a running cursor into an immutable byte slice and yields
//! `(value, bytesize)` pairs back up to the parent. Children are visited in
//! child index order, which is the wire order. Errors carry the child path
//! at which they occurred.

use crate::error::CodecError;
use crate::prim::{decode_prim, encode_prim_into, PrimType};
use crate::schema::{
    ArraySchema, EnumSchema, HeadArraySchema, HeadPrimitiveSchema, PrimitiveSchema, RecordSchema,
    Schema, StreamStep, TupleSchema,
};
use crate::value::Value;
use std::collections::HashMap;

impl Schema {
    /// Encode a value to bytes.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        self.encode_with(value, &[])
    }

    /// Encode with explicit args (lengths, child windows).
    pub fn encode_with(&self, value: &Value, args: &[u64]) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        self.encode_into(value, args, &mut out)?;
        Ok(out)
    }

    /// Encode, appending to an existing buffer.
    pub fn encode_into(
        &self,
        value: &Value,
        args: &[u64],
        out: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        match self {
            Schema::Primitive(p) => encode_primitive(p, value, args, out),
            Schema::Record(r) => encode_record(r, value, args, out),
            Schema::Tuple(t) => encode_tuple(t, value, args, out),
            Schema::Array(a) => encode_array(a, value, args, out),
            Schema::HeadArray(h) => encode_head_array(h, value, out),
            Schema::HeadPrimitive(h) => encode_head_prim(h, value, out),
            Schema::Enum(e) => encode_enum(e, value, out),
        }
    }

    /// Decode starting at `offset`. Returns the value and the number of
    /// bytes consumed.
    pub fn decode(&self, buf: &[u8], offset: usize) -> Result<(Value, usize), CodecError> {
        self.decode_with(buf, offset, &[])
    }

    /// Decode with explicit args (lengths, child windows).
    pub fn decode_with(
        &self,
        buf: &[u8],
        offset: usize,
        args: &[u64],
    ) -> Result<(Value, usize), CodecError> {
        match self {
            Schema::Primitive(p) => decode_primitive(p, buf, offset, args),
            Schema::Record(r) => decode_record(r, buf, offset, args),
            Schema::Tuple(t) => decode_tuple(t, buf, offset, args),
            Schema::Array(a) => decode_array(a, buf, offset, args),
            Schema::HeadArray(h) => decode_head_array(h, buf, offset),
            Schema::HeadPrimitive(h) => decode_head_prim(h, buf, offset),
            Schema::Enum(e) => decode_enum(e, buf, offset),
        }
    }
}

impl ArraySchema {
    /// Decode exactly one element at `offset`. For parents that iterate
    /// with a termination rule of their own.
    pub fn decode_one(&self, buf: &[u8], offset: usize) -> Result<(Value, usize), CodecError> {
        self.elem.decode(buf, offset)
    }
}

/// Interpret args as a half-open child window over `n` children.
fn window(args: &[u64], n: usize, what: &str) -> Result<(usize, usize), CodecError> {
    match args {
        [] => Ok((0, n)),
        [start, end] => {
            let (start, end) = (*start as usize, *end as usize);
            if start > end || end > n {
                return Err(CodecError::LengthMismatch(format!(
                    "{}: window {}..{} out of range for {} children",
                    what, start, end, n
                )));
            }
            Ok((start, end))
        }
        _ => Err(CodecError::LengthMismatch(format!(
            "{}: expected [start, end] window args",
            what
        ))),
    }
}

// ---- primitive ----

fn effective_args<'a>(call: &'a [u64], default: &'a [u64]) -> &'a [u64] {
    if call.is_empty() {
        default
    } else {
        call
    }
}

fn encode_primitive(
    p: &PrimitiveSchema,
    value: &Value,
    args: &[u64],
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    encode_prim_into(&p.prim, value, effective_args(args, &p.default_args), out)
}

fn decode_primitive(
    p: &PrimitiveSchema,
    buf: &[u8],
    offset: usize,
    args: &[u64],
) -> Result<(Value, usize), CodecError> {
    decode_prim(&p.prim, buf, offset, effective_args(args, &p.default_args))
}

// ---- record ----

fn decode_record(
    r: &RecordSchema,
    buf: &[u8],
    offset: usize,
    args: &[u64],
) -> Result<(Value, usize), CodecError> {
    let (start, end) = window(args, r.fields.len(), "record")?;
    let mut out = HashMap::new();
    let mut pos = offset;
    for f in &r.fields[start..end] {
        let child_args = r
            .hook
            .as_ref()
            .and_then(|h| h.decode_args(&f.name, &out))
            .unwrap_or_default();
        let (v, n) = f
            .schema
            .decode_with(buf, pos, &child_args)
            .map_err(|e| e.at(&f.name))?;
        pos += n;
        out.insert(f.name.clone(), v);
    }
    if start == 0 && end == r.fields.len() {
        if let Some(hook) = &r.hook {
            hook.finish_decode(&mut out)?;
        }
    }
    Ok((Value::Map(out), pos - offset))
}

fn encode_record(
    r: &RecordSchema,
    value: &Value,
    args: &[u64],
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let (start, end) = window(args, r.fields.len(), "record")?;
    let input = value
        .as_map()
        .ok_or_else(|| CodecError::Unrepresentable(format!("record: expected map, got {}", value.kind())))?;
    let rewritten = if start == 0 && end == r.fields.len() {
        match &r.hook {
            Some(hook) => hook.prepare_encode(input)?,
            None => None,
        }
    } else {
        None
    };
    let map = rewritten.as_ref().unwrap_or(input);
    for f in &r.fields[start..end] {
        let v = match map.get(&f.name) {
            Some(v) => v,
            None => f
                .schema
                .default_value()
                .ok_or_else(|| CodecError::MissingField(f.name.clone()))?,
        };
        let child_args = r
            .hook
            .as_ref()
            .and_then(|h| h.encode_args(&f.name, map))
            .unwrap_or_default();
        f.schema
            .encode_into(v, &child_args, out)
            .map_err(|e| e.at(&f.name))?;
    }
    Ok(())
}

// ---- tuple ----

fn decode_tuple(
    t: &TupleSchema,
    buf: &[u8],
    offset: usize,
    args: &[u64],
) -> Result<(Value, usize), CodecError> {
    let (start, end) = window(args, t.items.len(), "tuple")?;
    let mut out = Vec::with_capacity(end - start);
    let mut pos = offset;
    for (i, item) in t.items[start..end].iter().enumerate() {
        let (v, n) = item
            .decode(buf, pos)
            .map_err(|e| e.at(&format!("[{}]", start + i)))?;
        pos += n;
        out.push(v);
    }
    Ok((Value::List(out), pos - offset))
}

fn encode_tuple(
    t: &TupleSchema,
    value: &Value,
    args: &[u64],
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let (start, end) = window(args, t.items.len(), "tuple")?;
    let list = value
        .as_list()
        .ok_or_else(|| CodecError::Unrepresentable(format!("tuple: expected list, got {}", value.kind())))?;
    for (i, item) in t.items[start..end].iter().enumerate() {
        let v = list
            .get(start + i)
            .ok_or_else(|| CodecError::MissingField(format!("[{}]", start + i)))?;
        item.encode_into(v, &[], out)
            .map_err(|e| e.at(&format!("[{}]", start + i)))?;
    }
    Ok(())
}

// ---- array ----

fn decode_array(
    a: &ArraySchema,
    buf: &[u8],
    offset: usize,
    args: &[u64],
) -> Result<(Value, usize), CodecError> {
    if let Some(hook) = &a.hook {
        let mut out = Vec::new();
        let mut pos = offset;
        while pos < buf.len() {
            let before = out.len();
            let (n, step) = hook.decode_next(&a.elem, buf, pos, &mut out)?;
            pos += n;
            if step == StreamStep::Stop {
                break;
            }
            if n == 0 && out.len() == before {
                return Err(CodecError::LengthMismatch(
                    "array: stream hook made no progress".to_string(),
                ));
            }
        }
        return Ok((Value::List(out), pos - offset));
    }
    let args = effective_args(args, &a.default_args);
    let count = match args {
        [n] => *n as usize,
        [start, end] if start <= end => (end - start) as usize,
        [] => {
            return Err(CodecError::LengthMismatch(
                "array: element count required".to_string(),
            ))
        }
        _ => {
            return Err(CodecError::LengthMismatch(
                "array: bad window args".to_string(),
            ))
        }
    };
    let mut out = Vec::with_capacity(count.min(4096));
    let mut pos = offset;
    for i in 0..count {
        let (v, n) = a
            .elem
            .decode(buf, pos)
            .map_err(|e| e.at(&format!("[{}]", i)))?;
        pos += n;
        out.push(v);
    }
    Ok((Value::List(out), pos - offset))
}

fn encode_array(
    a: &ArraySchema,
    value: &Value,
    args: &[u64],
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let list = value
        .as_list()
        .ok_or_else(|| CodecError::Unrepresentable(format!("array: expected list, got {}", value.kind())))?;
    let args = effective_args(args, &a.default_args);
    let (start, end) = match args {
        [] => (0, list.len()),
        [n] => (0, *n as usize),
        [start, end] => (*start as usize, *end as usize),
        _ => {
            return Err(CodecError::LengthMismatch(
                "array: bad window args".to_string(),
            ))
        }
    };
    if start > end || end > list.len() {
        return Err(CodecError::LengthMismatch(format!(
            "array: window {}..{} out of range for {} element(s)",
            start,
            end,
            list.len()
        )));
    }
    for (i, v) in list[start..end].iter().enumerate() {
        if let Some(hook) = &a.hook {
            if let Some(bytes) = hook.encode_element(&a.elem, v)? {
                out.extend_from_slice(&bytes);
                continue;
            }
        }
        a.elem
            .encode_into(v, &[], out)
            .map_err(|e| e.at(&format!("[{}]", start + i)))?;
    }
    Ok(())
}

// ---- head forms ----

fn decode_head_uint(head: &PrimType, buf: &[u8], offset: usize) -> Result<(u64, usize), CodecError> {
    let (v, n) = decode_prim(head, buf, offset, &[])?;
    let count = v.as_u64().ok_or_else(|| {
        CodecError::Unrepresentable(format!("head {}: negative length", head))
    })?;
    Ok((count, n))
}

fn encode_head_array(
    h: &HeadArraySchema,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let list = value
        .as_list()
        .ok_or_else(|| CodecError::Unrepresentable(format!("head_array: expected list, got {}", value.kind())))?;
    encode_prim_into(&h.head, &Value::U64(list.len() as u64), &[], out)?;
    for (i, v) in list.iter().enumerate() {
        h.elem
            .encode_into(v, &[], out)
            .map_err(|e| e.at(&format!("[{}]", i)))?;
    }
    Ok(())
}

fn decode_head_array(
    h: &HeadArraySchema,
    buf: &[u8],
    offset: usize,
) -> Result<(Value, usize), CodecError> {
    let (count, head_len) = decode_head_uint(&h.head, buf, offset)?;
    let mut out = Vec::new();
    let mut pos = offset + head_len;
    for i in 0..count {
        let (v, n) = h
            .elem
            .decode(buf, pos)
            .map_err(|e| e.at(&format!("[{}]", i)))?;
        pos += n;
        out.push(v);
    }
    Ok((Value::List(out), pos - offset))
}

/// Head length unit: element count for array-form content, byte count for
/// `str`/`bytes`.
fn content_length(h: &HeadPrimitiveSchema, value: &Value) -> Result<u64, CodecError> {
    let len = if h.content.prim.array {
        value.as_list().map(|l| l.len())
    } else {
        match value {
            Value::Str(s) => Some(s.len()),
            Value::Bytes(b) => Some(b.len()),
            _ => None,
        }
    };
    len.map(|n| n as u64).ok_or_else(|| {
        CodecError::Unrepresentable(format!(
            "head_prim {}: cannot take the length of {}",
            h.content.prim,
            value.kind()
        ))
    })
}

fn encode_head_prim(
    h: &HeadPrimitiveSchema,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let len = content_length(h, value)?;
    encode_prim_into(&h.head, &Value::U64(len), &[], out)?;
    encode_prim_into(&h.content.prim, value, &[len], out)
}

fn decode_head_prim(
    h: &HeadPrimitiveSchema,
    buf: &[u8],
    offset: usize,
) -> Result<(Value, usize), CodecError> {
    let (len, head_len) = decode_head_uint(&h.head, buf, offset)?;
    let (v, n) = decode_prim(&h.content.prim, buf, offset + head_len, &[len])?;
    Ok((v, head_len + n))
}

// ---- enum ----

fn encode_enum(e: &EnumSchema, value: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
    for entry in &e.entries {
        if entry.match_value(value) {
            out.extend_from_slice(&entry.literal);
            return Ok(());
        }
    }
    match &e.fallback {
        Some(fallback) => fallback.encode_into(value, &[], out),
        None => Err(CodecError::EnumFallthrough),
    }
}

fn decode_enum(e: &EnumSchema, buf: &[u8], offset: usize) -> Result<(Value, usize), CodecError> {
    for entry in &e.entries {
        if entry.match_bytes(buf, offset) {
            return Ok((entry.value.clone(), entry.literal.len()));
        }
    }
    match &e.fallback {
        Some(fallback) => fallback.decode(buf, offset),
        None => Err(CodecError::EnumFallthrough),
    }
}
