//! # binschema: declarative binary codec engine
//!
//! Describe the byte-level structure of a binary format as a schema tree,
//! then use the tree in both directions: `encode` turns in-memory values
//! into bytes, `decode` turns bytes back into values. Decode followed by
//! encode is bit-exact over well-formed inputs.
//!
//! ## Node kinds
//!
//! - **Primitive**: fixed-width integers and floats (`u1`, `i2b`, `f8l`),
//!   variable-length integers (`uv`, `iv`), `bool`, `cstr`, `str`, `bytes`,
//!   and dense array forms (`i2b[]`)
//! - **Record**: named fields, encoded in field order
//! - **Tuple**: anonymous positional fields
//! - **Array**: one element schema repeated
//! - **Head-array / head-primitive**: a length prefix followed by payload
//! - **Enum**: byte literals paired with scalar tags, plus a fallback
//!
//! Container quirks outside the pure algebra (data-dependent lengths,
//! sentinel-terminated streams, synthetic entries) hang off two hook
//! traits, [`FieldHook`] and [`StreamHook`]; the [`jpeg`] and [`png`]
//! modules show both at work.
//!
//! ## Example
//!
//! ```
//! use binschema::{parse_one, value::map, Value};
//!
//! let schema = parse_one(
//!     r#"
//! player = record {
//!     name: head_prim(u1, str);
//!     level: uv;
//! }
//! "#,
//!     "player",
//! ).unwrap();
//!
//! let v = map(vec![
//!     ("name", Value::Str("creeper".to_string())),
//!     ("level", Value::U64(300)),
//! ]);
//! let bytes = schema.encode(&v).unwrap();
//! let (back, size) = schema.decode(&bytes, 0).unwrap();
//! assert_eq!(size, bytes.len());
//! assert_eq!(back, v);
//! ```
//!
//! Schema trees can also be built programmatically ([`Schema`]'s
//! constructors) or rebuilt from plain [`SchemaDesc`] data via the
//! process-wide type [`registry`].

pub mod adapter;
pub mod codec;
pub mod desc;
pub mod dump;
pub mod error;
pub mod jpeg;
pub mod parser;
pub mod png;
pub mod prim;
pub mod registry;
pub mod schema;
pub mod seq;
pub mod value;

pub use desc::SchemaDesc;
pub use error::CodecError;
pub use parser::{parse, parse_one, SchemaSet};
pub use prim::{Endian, PrimType, Scalar};
pub use schema::{EnumEntry, Field, FieldHook, Schema, StreamHook, StreamStep};
pub use value::Value;
