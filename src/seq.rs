//! Pack/unpack a positional list of primitive fields into one contiguous
//! byte sequence. A thin convenience over the primitive codec for callers
//! that do not need a schema tree.

use crate::error::CodecError;
use crate::prim::{decode_prim, encode_prim_into, PrimType};
use crate::value::Value;

/// Encode `(type, value, args)` fields back to back.
pub fn pack(fields: &[(PrimType, Value, Vec<u64>)]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for (i, (ty, value, args)) in fields.iter().enumerate() {
        encode_prim_into(ty, value, args, &mut out)
            .map_err(|e| e.at(&format!("[{}]", i)))?;
    }
    Ok(out)
}

/// Decode `(type, args)` fields back to back starting at `offset`.
/// Returns the values and the total byte count consumed.
pub fn unpack(
    fields: &[(PrimType, Vec<u64>)],
    buf: &[u8],
    offset: usize,
) -> Result<(Vec<Value>, usize), CodecError> {
    let mut values = Vec::with_capacity(fields.len());
    let mut pos = offset;
    for (i, (ty, args)) in fields.iter().enumerate() {
        let (v, n) =
            decode_prim(ty, buf, pos, args).map_err(|e| e.at(&format!("[{}]", i)))?;
        values.push(v);
        pos += n;
    }
    Ok((values, pos - offset))
}
