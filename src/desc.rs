//! Plain schema descriptions: the serialisable form a live [`Schema`] tree
//! is rebuilt from (see [`registry::make`](crate::registry::make)).
//!
//! A description is a tree of tagged nodes. `kind` is the registry key: a
//! primitive type name (`"u4l"`, `"cstr"`) or a composite kind (`"record"`,
//! `"tuple"`, `"array"`, `"head_array"`, `"head_prim"`, `"enum"`,
//! `"enum_entry"`). Descriptions round-trip through `serde_json`, so a
//! schema can be transported as data.

use crate::schema::Schema;
use crate::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDesc {
    pub kind: String,
    /// Field key; required for children of a record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SchemaDesc>,
    /// Default args (e.g. a `str` byte length, an array element count).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<u64>,
    /// Default value, used when encoding with a missing record field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Head type name for `head_array` / `head_prim`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    /// Scalar of an `enum_entry`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Byte signature of an `enum_entry`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub literal: Vec<u8>,
}

impl SchemaDesc {
    pub fn new(kind: &str) -> SchemaDesc {
        SchemaDesc {
            kind: kind.to_string(),
            name: None,
            children: Vec::new(),
            args: Vec::new(),
            default: None,
            head: None,
            value: None,
            literal: Vec::new(),
        }
    }

    /// Rebuild the live schema tree for this description.
    pub fn make(&self) -> Result<Schema, crate::error::CodecError> {
        crate::registry::make(self)
    }
}
