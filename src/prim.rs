//! Primitive wire codecs and the primitive type-name grammar.
//!
//! A type name packs three facets: format letter (`u`/`i`/`f`), width
//! (`1`/`2`/`4`/`8`/`v`), and an endian suffix (`l`/`b`; `c` marks the
//! clamped unsigned byte). `[]` appended to a numeric name makes it a dense
//! array form. Non-numeric names are `bool`, `cstr`, `str`, `bytes`.
//!
//! | name    | wire format                                  |
//! |---------|----------------------------------------------|
//! | `u4l`   | unsigned 32-bit, little-endian               |
//! | `i2b`   | signed 16-bit two's complement, big-endian   |
//! | `f8l`   | IEEE-754 double, little-endian               |
//! | `uv`    | unsigned VLQ (base-128, big-endian groups)   |
//! | `iv`    | signed VLQ (sign in bit 6 of the first byte) |
//! | `u1c`   | unsigned byte, clamped on encode             |
//! | `cstr`  | UTF-8 bytes + NUL terminator                 |
//! | `str`   | UTF-8 bytes, byte length from args           |
//! | `bytes` | opaque bytes, byte length from args          |

use crate::error::{underflow, CodecError};
use crate::value::Value;
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// A scalar primitive wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8,
    /// `u1c`: unsigned byte, clamped into `0..=255` on encode.
    U8Clamped,
    U16(Endian),
    U32(Endian),
    U64(Endian),
    I8,
    I16(Endian),
    I32(Endian),
    I64(Endian),
    F32(Endian),
    F64(Endian),
    UVar,
    IVar,
    Bool,
    CStr,
    Str,
    Bytes,
}

/// A parsed primitive type name: a scalar format, optionally in array form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimType {
    pub scalar: Scalar,
    pub array: bool,
}

impl PrimType {
    /// Parse a type name such as `u4l`, `iv`, `i2b[]`, `cstr`.
    pub fn parse(name: &str) -> Result<PrimType, CodecError> {
        let (base, array) = match name.strip_suffix("[]") {
            Some(b) => (b, true),
            None => (name, false),
        };
        let scalar = match base {
            "bool" => Scalar::Bool,
            "cstr" => Scalar::CStr,
            "str" => Scalar::Str,
            "bytes" => Scalar::Bytes,
            _ => parse_numeric(base).ok_or_else(|| CodecError::UnknownType(name.to_string()))?,
        };
        if array && !scalar.is_numeric() {
            return Err(CodecError::UnknownType(name.to_string()));
        }
        Ok(PrimType { scalar, array })
    }

    pub fn scalar(scalar: Scalar) -> PrimType {
        PrimType {
            scalar,
            array: false,
        }
    }

    /// True for formats whose byte length comes from args (`str`, `bytes`,
    /// fixed-width array forms).
    pub fn needs_length(&self) -> bool {
        if self.array {
            !matches!(self.scalar, Scalar::UVar | Scalar::IVar)
        } else {
            matches!(self.scalar, Scalar::Str | Scalar::Bytes)
        }
    }
}

impl Scalar {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Scalar::Bool | Scalar::CStr | Scalar::Str | Scalar::Bytes)
    }

    /// Integer formats usable as a length head.
    pub fn is_integer(&self) -> bool {
        self.is_numeric() && !matches!(self, Scalar::F32(_) | Scalar::F64(_))
    }
}

fn parse_numeric(s: &str) -> Option<Scalar> {
    let b = s.as_bytes();
    if b.len() < 2 || b.len() > 3 {
        return None;
    }
    let endian = match b.get(2) {
        None => None,
        Some(b'l') => Some(Endian::Little),
        Some(b'b') => Some(Endian::Big),
        Some(b'c') => {
            // c only with u1
            return if &b[..2] == b"u1" {
                Some(Scalar::U8Clamped)
            } else {
                None
            };
        }
        Some(_) => return None,
    };
    match (b[0], b[1], endian) {
        (b'u', b'1', None) => Some(Scalar::U8),
        (b'u', b'2', Some(e)) => Some(Scalar::U16(e)),
        (b'u', b'4', Some(e)) => Some(Scalar::U32(e)),
        (b'u', b'8', Some(e)) => Some(Scalar::U64(e)),
        (b'u', b'v', None) => Some(Scalar::UVar),
        (b'i', b'1', None) => Some(Scalar::I8),
        (b'i', b'2', Some(e)) => Some(Scalar::I16(e)),
        (b'i', b'4', Some(e)) => Some(Scalar::I32(e)),
        (b'i', b'8', Some(e)) => Some(Scalar::I64(e)),
        (b'i', b'v', None) => Some(Scalar::IVar),
        (b'f', b'4', Some(e)) => Some(Scalar::F32(e)),
        (b'f', b'8', Some(e)) => Some(Scalar::F64(e)),
        _ => None,
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = |e: &Endian| match e {
            Endian::Little => "l",
            Endian::Big => "b",
        };
        match self {
            Scalar::U8 => write!(f, "u1"),
            Scalar::U8Clamped => write!(f, "u1c"),
            Scalar::U16(x) => write!(f, "u2{}", e(x)),
            Scalar::U32(x) => write!(f, "u4{}", e(x)),
            Scalar::U64(x) => write!(f, "u8{}", e(x)),
            Scalar::I8 => write!(f, "i1"),
            Scalar::I16(x) => write!(f, "i2{}", e(x)),
            Scalar::I32(x) => write!(f, "i4{}", e(x)),
            Scalar::I64(x) => write!(f, "i8{}", e(x)),
            Scalar::F32(x) => write!(f, "f4{}", e(x)),
            Scalar::F64(x) => write!(f, "f8{}", e(x)),
            Scalar::UVar => write!(f, "uv"),
            Scalar::IVar => write!(f, "iv"),
            Scalar::Bool => write!(f, "bool"),
            Scalar::CStr => write!(f, "cstr"),
            Scalar::Str => write!(f, "str"),
            Scalar::Bytes => write!(f, "bytes"),
        }
    }
}

impl fmt::Display for PrimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scalar)?;
        if self.array {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

// ---- encode ----

/// Encode one value under a primitive type. For `str`/`bytes` an optional
/// `args[0]` is validated against the value's byte length; for array forms
/// an optional `args[0]` is validated against the element count.
pub fn encode_prim(ty: &PrimType, value: &Value, args: &[u64]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    encode_prim_into(ty, value, args, &mut out)?;
    Ok(out)
}

pub fn encode_prim_into(
    ty: &PrimType,
    value: &Value,
    args: &[u64],
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    if !ty.array {
        if let Some(&want) = args.first() {
            let got = match (ty.scalar, value) {
                (Scalar::Str, Value::Str(s)) => Some(s.len() as u64),
                (Scalar::Bytes, Value::Bytes(b)) => Some(b.len() as u64),
                _ => None,
            };
            if let Some(got) = got {
                if got != want {
                    return Err(CodecError::LengthMismatch(format!(
                        "{}: value is {} byte(s), framing says {}",
                        ty, got, want
                    )));
                }
            }
        }
        return encode_scalar_into(ty.scalar, value, out);
    }
    let list = value
        .as_list()
        .ok_or_else(|| expected(ty, "list", value))?;
    if let Some(&want) = args.first() {
        if list.len() as u64 != want {
            return Err(CodecError::LengthMismatch(format!(
                "{}: {} element(s), framing says {}",
                ty,
                list.len(),
                want
            )));
        }
    }
    for item in list {
        encode_scalar_into(ty.scalar, item, out)?;
    }
    Ok(())
}

fn expected(ty: &PrimType, want: &str, got: &Value) -> CodecError {
    CodecError::Unrepresentable(format!("{}: expected {}, got {}", ty, want, got.kind()))
}

fn uint_value(ty: &PrimType, v: &Value, max: u64) -> Result<u64, CodecError> {
    let n = v
        .as_u64()
        .ok_or_else(|| expected(ty, "unsigned integer", v))?;
    if n > max {
        return Err(CodecError::Unrepresentable(format!(
            "{}: {} exceeds maximum {}",
            ty, n, max
        )));
    }
    Ok(n)
}

fn int_value(ty: &PrimType, v: &Value, min: i64, max: i64) -> Result<i64, CodecError> {
    let n = v.as_i64().ok_or_else(|| expected(ty, "integer", v))?;
    if n < min || n > max {
        return Err(CodecError::Unrepresentable(format!(
            "{}: {} outside {}..={}",
            ty, n, min, max
        )));
    }
    Ok(n)
}

fn encode_scalar_into(s: Scalar, v: &Value, out: &mut Vec<u8>) -> Result<(), CodecError> {
    let ty = &PrimType::scalar(s);
    match s {
        Scalar::U8 => out.push(uint_value(ty, v, u8::MAX as u64)? as u8),
        Scalar::U8Clamped => {
            let n = if let Some(u) = v.as_u64() {
                u.min(255) as u8
            } else if let Some(i) = v.as_i64() {
                i.clamp(0, 255) as u8
            } else {
                return Err(expected(ty, "integer", v));
            };
            out.push(n);
        }
        Scalar::U16(e) => put_uint(out, uint_value(ty, v, u16::MAX as u64)?, 2, e),
        Scalar::U32(e) => put_uint(out, uint_value(ty, v, u32::MAX as u64)?, 4, e),
        Scalar::U64(e) => put_uint(out, uint_value(ty, v, u64::MAX)?, 8, e),
        Scalar::I8 => out.push(int_value(ty, v, i8::MIN as i64, i8::MAX as i64)? as u8),
        Scalar::I16(e) => put_uint(
            out,
            int_value(ty, v, i16::MIN as i64, i16::MAX as i64)? as u16 as u64,
            2,
            e,
        ),
        Scalar::I32(e) => put_uint(
            out,
            int_value(ty, v, i32::MIN as i64, i32::MAX as i64)? as u32 as u64,
            4,
            e,
        ),
        Scalar::I64(e) => put_uint(out, int_value(ty, v, i64::MIN, i64::MAX)? as u64, 8, e),
        Scalar::F32(e) => {
            let x = v.as_float().ok_or_else(|| expected(ty, "float", v))? as f32;
            put_uint(out, x.to_bits() as u64, 4, e);
        }
        Scalar::F64(e) => {
            let x = v.as_float().ok_or_else(|| expected(ty, "float", v))?;
            put_uint(out, x.to_bits(), 8, e);
        }
        Scalar::UVar => {
            let n = v
                .as_u64()
                .ok_or_else(|| expected(ty, "unsigned integer", v))?;
            encode_uvar(n, out);
        }
        Scalar::IVar => {
            let n = v.as_i64().ok_or_else(|| expected(ty, "integer", v))?;
            encode_ivar(n, out);
        }
        Scalar::Bool => {
            let b = v.as_bool().ok_or_else(|| expected(ty, "bool", v))?;
            out.push(b as u8);
        }
        Scalar::CStr => {
            let text = v.as_str().ok_or_else(|| expected(ty, "string", v))?;
            if text.as_bytes().contains(&0) {
                return Err(CodecError::InteriorNul);
            }
            out.extend_from_slice(text.as_bytes());
            out.push(0);
        }
        Scalar::Str => {
            let text = v.as_str().ok_or_else(|| expected(ty, "string", v))?;
            out.extend_from_slice(text.as_bytes());
        }
        Scalar::Bytes => {
            let b = v.as_bytes().ok_or_else(|| expected(ty, "bytes", v))?;
            out.extend_from_slice(b);
        }
    }
    Ok(())
}

fn put_uint(out: &mut Vec<u8>, v: u64, width: usize, e: Endian) {
    let mut buf = [0u8; 8];
    match e {
        Endian::Big => BigEndian::write_uint(&mut buf, v, width),
        Endian::Little => LittleEndian::write_uint(&mut buf, v, width),
    }
    out.extend_from_slice(&buf[..width]);
}

// ---- decode ----

/// Decode one value under a primitive type starting at `offset`. Returns the
/// value and the number of bytes consumed. `str`/`bytes` and fixed-width
/// array forms require `args[0]`; VLQ arrays without a count run to the end
/// of the buffer.
pub fn decode_prim(
    ty: &PrimType,
    buf: &[u8],
    offset: usize,
    args: &[u64],
) -> Result<(Value, usize), CodecError> {
    if !ty.array {
        return decode_scalar(ty.scalar, buf, offset, args);
    }
    let mut items = Vec::new();
    let mut pos = offset;
    match args.first() {
        Some(&count) => {
            for _ in 0..count {
                let (v, n) = decode_scalar(ty.scalar, buf, pos, &[])?;
                items.push(v);
                pos += n;
            }
        }
        None if matches!(ty.scalar, Scalar::UVar | Scalar::IVar) => {
            while pos < buf.len() {
                let (v, n) = decode_scalar(ty.scalar, buf, pos, &[])?;
                items.push(v);
                pos += n;
            }
        }
        None => {
            return Err(CodecError::LengthMismatch(format!(
                "{}: element count required",
                ty
            )))
        }
    }
    Ok((Value::List(items), pos - offset))
}

fn take<'a>(buf: &'a [u8], offset: usize, n: usize) -> Result<&'a [u8], CodecError> {
    if offset.checked_add(n).map_or(true, |end| end > buf.len()) {
        return Err(underflow(offset, n, buf.len()));
    }
    Ok(&buf[offset..offset + n])
}

fn get_uint(buf: &[u8], e: Endian) -> u64 {
    match e {
        Endian::Big => BigEndian::read_uint(buf, buf.len()),
        Endian::Little => LittleEndian::read_uint(buf, buf.len()),
    }
}

fn decode_scalar(
    s: Scalar,
    buf: &[u8],
    offset: usize,
    args: &[u64],
) -> Result<(Value, usize), CodecError> {
    Ok(match s {
        Scalar::U8 | Scalar::U8Clamped => (Value::U8(take(buf, offset, 1)?[0]), 1),
        Scalar::U16(e) => (Value::U16(get_uint(take(buf, offset, 2)?, e) as u16), 2),
        Scalar::U32(e) => (Value::U32(get_uint(take(buf, offset, 4)?, e) as u32), 4),
        Scalar::U64(e) => (Value::U64(get_uint(take(buf, offset, 8)?, e)), 8),
        Scalar::I8 => (Value::I8(take(buf, offset, 1)?[0] as i8), 1),
        Scalar::I16(e) => (Value::I16(get_uint(take(buf, offset, 2)?, e) as u16 as i16), 2),
        Scalar::I32(e) => (Value::I32(get_uint(take(buf, offset, 4)?, e) as u32 as i32), 4),
        Scalar::I64(e) => (Value::I64(get_uint(take(buf, offset, 8)?, e) as i64), 8),
        Scalar::F32(e) => (
            Value::Float(f32::from_bits(get_uint(take(buf, offset, 4)?, e) as u32)),
            4,
        ),
        Scalar::F64(e) => (
            Value::Double(f64::from_bits(get_uint(take(buf, offset, 8)?, e))),
            8,
        ),
        Scalar::UVar => {
            let (v, n) = decode_uvar(buf, offset)?;
            (Value::U64(v), n)
        }
        Scalar::IVar => {
            let (v, n) = decode_ivar(buf, offset)?;
            (Value::I64(v), n)
        }
        Scalar::Bool => (Value::Bool(take(buf, offset, 1)?[0] != 0), 1),
        Scalar::CStr => {
            let nul = buf[offset.min(buf.len())..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| underflow(offset, buf.len() - offset.min(buf.len()) + 1, buf.len()))?;
            let text = String::from_utf8(buf[offset..offset + nul].to_vec())?;
            (Value::Str(text), nul + 1)
        }
        Scalar::Str => {
            let n = length_arg(args, "str")? as usize;
            let text = String::from_utf8(take(buf, offset, n)?.to_vec())?;
            (Value::Str(text), n)
        }
        Scalar::Bytes => {
            let n = length_arg(args, "bytes")? as usize;
            (Value::Bytes(take(buf, offset, n)?.to_vec()), n)
        }
    })
}

fn length_arg(args: &[u64], ty: &str) -> Result<u64, CodecError> {
    args.first()
        .copied()
        .ok_or_else(|| CodecError::LengthMismatch(format!("{}: byte length required", ty)))
}

// ---- variable-length integers ----
//
// Base-128, most-significant group first. The high bit of each byte is the
// continuation flag. The signed form keeps its sign in bit 6 of the first
// byte, leaving six magnitude bits there and seven in every later byte.

pub fn encode_uvar(v: u64, out: &mut Vec<u8>) {
    let mut groups = 1;
    while groups < 10 && (v >> (7 * groups)) != 0 {
        groups += 1;
    }
    for i in (0..groups).rev() {
        let mut b = ((v >> (7 * i)) & 0x7F) as u8;
        if i != 0 {
            b |= 0x80;
        }
        out.push(b);
    }
}

pub fn decode_uvar(buf: &[u8], offset: usize) -> Result<(u64, usize), CodecError> {
    let mut v: u64 = 0;
    let mut n = 0;
    loop {
        let b = take(buf, offset + n, 1)?[0];
        if v > u64::MAX >> 7 {
            return Err(CodecError::Unrepresentable(
                "uv: value exceeds 64 bits".to_string(),
            ));
        }
        v = (v << 7) | (b & 0x7F) as u64;
        n += 1;
        if b & 0x80 == 0 {
            return Ok((v, n));
        }
    }
}

pub fn encode_ivar(v: i64, out: &mut Vec<u8>) {
    let sign = v < 0;
    let m = v.unsigned_abs();
    // First group holds six bits, so `groups` is the smallest n with
    // m >> (7 * (n - 1)) < 64; capped at 10 for the full 64-bit range.
    let mut groups = 1;
    while (m >> (7 * (groups - 1))) >= 64 {
        groups += 1;
    }
    let mut first = ((m >> (7 * (groups - 1))) & 0x3F) as u8;
    if sign {
        first |= 0x40;
    }
    if groups > 1 {
        first |= 0x80;
    }
    out.push(first);
    for i in (0..groups - 1).rev() {
        let mut b = ((m >> (7 * i)) & 0x7F) as u8;
        if i != 0 {
            b |= 0x80;
        }
        out.push(b);
    }
}

pub fn decode_ivar(buf: &[u8], offset: usize) -> Result<(i64, usize), CodecError> {
    let first = take(buf, offset, 1)?[0];
    let sign = first & 0x40 != 0;
    let mut m: u64 = (first & 0x3F) as u64;
    let mut n = 1;
    let mut more = first & 0x80 != 0;
    while more {
        let b = take(buf, offset + n, 1)?[0];
        if m > u64::MAX >> 7 {
            return Err(CodecError::Unrepresentable(
                "iv: value exceeds 64 bits".to_string(),
            ));
        }
        m = (m << 7) | (b & 0x7F) as u64;
        n += 1;
        more = b & 0x80 != 0;
    }
    let v = if sign {
        if m > 1 << 63 {
            return Err(CodecError::Unrepresentable(
                "iv: value exceeds 64 bits".to_string(),
            ));
        }
        if m == 1 << 63 {
            i64::MIN
        } else {
            -(m as i64)
        }
    } else {
        i64::try_from(m).map_err(|_| {
            CodecError::Unrepresentable("iv: value exceeds 64 bits".to_string())
        })?
    };
    Ok((v, n))
}
