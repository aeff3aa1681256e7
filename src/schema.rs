//! Schema node kinds and their composition rules.
//!
//! A [`Schema`] is a tree describing a binary layout. Leaves wrap primitive
//! wire formats; composites drive their children in order and keep a running
//! cursor. The codec interpreter over these nodes lives in
//! [`codec`](crate::codec).
//!
//! Container quirks that fall outside the pure algebra (data-dependent
//! lengths, sentinel-terminated streams, synthetic entries) are expressed
//! through two hook traits instead of subclassing: [`FieldHook`] lets a
//! record parameterise a not-yet-visited child from already-decoded
//! siblings, and [`StreamHook`] lets an array drive per-element decoding
//! with its own termination rule.

use crate::error::CodecError;
use crate::prim::PrimType;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A named child of a record.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
}

/// One entry of an enumeration: a scalar paired with its byte signature.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntry {
    pub value: Value,
    pub literal: Vec<u8>,
}

impl EnumEntry {
    pub fn new(value: Value, literal: Vec<u8>) -> EnumEntry {
        EnumEntry { value, literal }
    }

    /// True iff the literal is a prefix of `buf[offset..]`.
    pub fn match_bytes(&self, buf: &[u8], offset: usize) -> bool {
        buf.len() >= offset
            && buf[offset..].len() >= self.literal.len()
            && buf[offset..offset + self.literal.len()] == self.literal[..]
    }

    /// True iff `v` equals the entry's scalar. Integer comparison ignores
    /// the carrier width (`U8(1)` matches an `I64(1)` entry).
    pub fn match_value(&self, v: &Value) -> bool {
        if *v == self.value {
            return true;
        }
        if let (Some(a), Some(b)) = (self.value.as_u64(), v.as_u64()) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (self.value.as_i64(), v.as_i64()) {
            return a == b;
        }
        false
    }
}

/// A schema tree node.
#[derive(Debug, Clone)]
pub enum Schema {
    Primitive(PrimitiveSchema),
    Record(RecordSchema),
    Tuple(TupleSchema),
    Array(ArraySchema),
    HeadArray(HeadArraySchema),
    HeadPrimitive(HeadPrimitiveSchema),
    Enum(EnumSchema),
}

#[derive(Debug, Clone)]
pub struct PrimitiveSchema {
    pub prim: PrimType,
    /// Used when a record encodes with this field missing from the input.
    pub default: Option<Value>,
    /// Applied when the caller passes no args.
    pub default_args: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub fields: Vec<Field>,
    pub hook: Option<Arc<dyn FieldHook>>,
}

#[derive(Debug, Clone)]
pub struct TupleSchema {
    pub items: Vec<Schema>,
}

#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub elem: Box<Schema>,
    /// Applied when the caller passes no args.
    pub default_args: Vec<u64>,
    pub hook: Option<Arc<dyn StreamHook>>,
}

#[derive(Debug, Clone)]
pub struct HeadArraySchema {
    /// Wire format of the element-count prefix. Any integer primitive,
    /// VLQ included.
    pub head: PrimType,
    pub elem: Box<Schema>,
}

#[derive(Debug, Clone)]
pub struct HeadPrimitiveSchema {
    pub head: PrimType,
    pub content: PrimitiveSchema,
}

#[derive(Debug, Clone)]
pub struct EnumSchema {
    pub entries: Vec<EnumEntry>,
    /// Fallback when no entry matches. Receives no extra args.
    pub fallback: Option<Box<Schema>>,
}

/// Record override point: parameterise or rewrite children.
///
/// During decode, `decode_args` is consulted before each child with the
/// partial map decoded so far; during encode, `encode_args` sees the full
/// input map. `finish_decode`/`prepare_encode` are an inverse pair applied
/// to the whole map after decode / before encode (e.g. sub-decoding a
/// payload field). Hooked decode still returns an exact `(value, bytesize)`
/// and hooked encode must remain its inverse.
pub trait FieldHook: fmt::Debug + Send + Sync {
    fn decode_args(&self, _field: &str, _partial: &HashMap<String, Value>) -> Option<Vec<u64>> {
        None
    }

    fn encode_args(&self, _field: &str, _map: &HashMap<String, Value>) -> Option<Vec<u64>> {
        None
    }

    fn finish_decode(&self, _map: &mut HashMap<String, Value>) -> Result<(), CodecError> {
        Ok(())
    }

    /// Return a rewritten map to encode instead of the input, or `None` to
    /// encode the input as-is.
    fn prepare_encode(
        &self,
        _map: &HashMap<String, Value>,
    ) -> Result<Option<HashMap<String, Value>>, CodecError> {
        Ok(None)
    }
}

/// Whether a hooked array keeps decoding elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStep {
    Continue,
    Stop,
}

/// Array override point: element streams whose extent is data-dependent.
///
/// `decode_next` decodes one step at `offset`, pushes the element(s) it
/// produced (it may fabricate synthetic entries), and reports the bytes it
/// consumed plus whether the stream continues. `encode_element` is the
/// inverse: it must recognise any synthetic entry `decode_next` can push
/// and emit its bytes; plain elements fall through to the element schema.
pub trait StreamHook: fmt::Debug + Send + Sync {
    fn decode_next(
        &self,
        elem: &Schema,
        buf: &[u8],
        offset: usize,
        out: &mut Vec<Value>,
    ) -> Result<(usize, StreamStep), CodecError>;

    /// Return `Some(bytes)` to bypass the plain element encode for this
    /// element (synthetic entries, window-encoded variants).
    fn encode_element(
        &self,
        _elem: &Schema,
        _value: &Value,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        Ok(None)
    }
}

impl Schema {
    /// Leaf node from a primitive type name (`"u4l"`, `"cstr"`, ...).
    pub fn prim(name: &str) -> Result<Schema, CodecError> {
        Ok(Schema::Primitive(PrimitiveSchema {
            prim: PrimType::parse(name)?,
            default: None,
            default_args: Vec::new(),
        }))
    }

    /// Leaf node with a default value and/or default args.
    pub fn prim_with(
        name: &str,
        default: Option<Value>,
        default_args: Vec<u64>,
    ) -> Result<Schema, CodecError> {
        Ok(Schema::Primitive(PrimitiveSchema {
            prim: PrimType::parse(name)?,
            default,
            default_args,
        }))
    }

    /// Record from `(name, child)` pairs. Names must be unique; their order
    /// is the wire order.
    pub fn record(fields: Vec<(&str, Schema)>) -> Result<Schema, CodecError> {
        Schema::record_hooked(fields, None)
    }

    pub fn record_hooked(
        fields: Vec<(&str, Schema)>,
        hook: Option<Arc<dyn FieldHook>>,
    ) -> Result<Schema, CodecError> {
        Schema::record_fields(
            fields
                .into_iter()
                .map(|(name, schema)| Field {
                    name: name.to_string(),
                    schema,
                })
                .collect(),
            hook,
        )
    }

    /// Record from prebuilt [`Field`]s (used by reification).
    pub fn record_fields(
        fields: Vec<Field>,
        hook: Option<Arc<dyn FieldHook>>,
    ) -> Result<Schema, CodecError> {
        let mut seen = std::collections::HashSet::new();
        for f in &fields {
            if !seen.insert(f.name.as_str()) {
                return Err(CodecError::Unrepresentable(format!(
                    "record: duplicate field name {:?}",
                    f.name
                )));
            }
        }
        Ok(Schema::Record(RecordSchema { fields, hook }))
    }

    pub fn tuple(items: Vec<Schema>) -> Schema {
        Schema::Tuple(TupleSchema { items })
    }

    pub fn array(elem: Schema) -> Schema {
        Schema::Array(ArraySchema {
            elem: Box::new(elem),
            default_args: Vec::new(),
            hook: None,
        })
    }

    pub fn array_with(elem: Schema, default_args: Vec<u64>) -> Schema {
        Schema::Array(ArraySchema {
            elem: Box::new(elem),
            default_args,
            hook: None,
        })
    }

    pub fn array_hooked(elem: Schema, hook: Arc<dyn StreamHook>) -> Schema {
        Schema::Array(ArraySchema {
            elem: Box::new(elem),
            default_args: Vec::new(),
            hook: Some(hook),
        })
    }

    /// Array prefixed by an element-count head.
    pub fn head_array(head: &str, elem: Schema) -> Result<Schema, CodecError> {
        Ok(Schema::HeadArray(HeadArraySchema {
            head: integer_head(head)?,
            elem: Box::new(elem),
        }))
    }

    /// Length-bearing primitive prefixed by its own length: byte count for
    /// `str`/`bytes`, element count for array forms.
    pub fn head_prim(head: &str, content: &str) -> Result<Schema, CodecError> {
        let prim = PrimType::parse(content)?;
        if !prim.needs_length() {
            return Err(CodecError::Unrepresentable(format!(
                "head_prim: {} carries no external length",
                prim
            )));
        }
        Ok(Schema::HeadPrimitive(HeadPrimitiveSchema {
            head: integer_head(head)?,
            content: PrimitiveSchema {
                prim,
                default: None,
                default_args: Vec::new(),
            },
        }))
    }

    /// Enumeration over `(scalar, literal bytes)` entries with an optional
    /// fallback schema. Entry order is match order: when literals share a
    /// prefix, put the longer one first.
    pub fn enumeration(entries: Vec<(Value, Vec<u8>)>, fallback: Option<Schema>) -> Schema {
        Schema::Enum(EnumSchema {
            entries: entries
                .into_iter()
                .map(|(value, literal)| EnumEntry::new(value, literal))
                .collect(),
            fallback: fallback.map(Box::new),
        })
    }

    /// The default value used when a record encodes this child without an
    /// input entry. Only primitive leaves carry one.
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Schema::Primitive(p) => p.default.as_ref(),
            _ => None,
        }
    }
}

fn integer_head(name: &str) -> Result<PrimType, CodecError> {
    let head = PrimType::parse(name)?;
    if head.array || !head.scalar.is_integer() {
        return Err(CodecError::Unrepresentable(format!(
            "head type {} is not an integer primitive",
            head
        )));
    }
    Ok(head)
}
