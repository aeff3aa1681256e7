//! Process-wide type registry: type-name strings mapped to node
//! constructors, enabling reification of live schema trees from plain
//! descriptions.
//!
//! The table is seeded with the built-in composite kinds on first use;
//! primitive names dispatch through the type-name grammar. After seeding,
//! the table is read-only unless [`register`] adds an extension kind.

use crate::desc::SchemaDesc;
use crate::error::CodecError;
use crate::schema::{EnumEntry, EnumSchema, Field, Schema};
use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

/// Builds a schema node from its plain description.
pub type Constructor = fn(&SchemaDesc) -> Result<Schema, CodecError>;

static REGISTRY: LazyLock<RwLock<HashMap<String, Constructor>>> = LazyLock::new(|| {
    let mut table: HashMap<String, Constructor> = HashMap::new();
    table.insert("record".to_string(), make_record);
    table.insert("tuple".to_string(), make_tuple);
    table.insert("array".to_string(), make_array);
    table.insert("head_array".to_string(), make_head_array);
    table.insert("head_prim".to_string(), make_head_prim);
    table.insert("enum".to_string(), make_enum);
    table.insert("enum_entry".to_string(), make_enum_entry);
    RwLock::new(table)
});

/// Register a constructor for an extension kind. One registration per
/// type-name; duplicates are rejected.
pub fn register(name: &str, ctor: Constructor) -> Result<(), CodecError> {
    let mut table = REGISTRY.write().unwrap_or_else(|e| e.into_inner());
    if table.contains_key(name) {
        return Err(CodecError::Unrepresentable(format!(
            "type {:?} is already registered",
            name
        )));
    }
    table.insert(name.to_string(), ctor);
    Ok(())
}

/// Rebuild a live schema tree from a plain description (children first).
pub fn make(desc: &SchemaDesc) -> Result<Schema, CodecError> {
    let ctor = {
        let table = REGISTRY.read().unwrap_or_else(|e| e.into_inner());
        table.get(desc.kind.as_str()).copied()
    };
    match ctor {
        Some(ctor) => ctor(desc),
        // Not a composite kind: the name must parse as a primitive.
        None => Schema::prim_with(&desc.kind, desc.default.clone(), desc.args.clone()),
    }
}

fn make_record(desc: &SchemaDesc) -> Result<Schema, CodecError> {
    let mut fields = Vec::with_capacity(desc.children.len());
    for child in &desc.children {
        let name = child.name.clone().ok_or_else(|| {
            CodecError::Unrepresentable("record: every child needs a name".to_string())
        })?;
        fields.push(Field {
            name,
            schema: make(child)?,
        });
    }
    Schema::record_fields(fields, None)
}

fn make_tuple(desc: &SchemaDesc) -> Result<Schema, CodecError> {
    let items = desc
        .children
        .iter()
        .map(make)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Schema::tuple(items))
}

fn only_child(desc: &SchemaDesc, what: &str) -> Result<SchemaDesc, CodecError> {
    match desc.children.as_slice() {
        [child] => Ok(child.clone()),
        other => Err(CodecError::Unrepresentable(format!(
            "{}: exactly one child expected, got {}",
            what,
            other.len()
        ))),
    }
}

fn head_name<'a>(desc: &'a SchemaDesc, what: &str) -> Result<&'a str, CodecError> {
    desc.head
        .as_deref()
        .ok_or_else(|| CodecError::Unrepresentable(format!("{}: head type required", what)))
}

fn make_array(desc: &SchemaDesc) -> Result<Schema, CodecError> {
    let elem = make(&only_child(desc, "array")?)?;
    Ok(Schema::array_with(elem, desc.args.clone()))
}

fn make_head_array(desc: &SchemaDesc) -> Result<Schema, CodecError> {
    let elem = make(&only_child(desc, "head_array")?)?;
    Schema::head_array(head_name(desc, "head_array")?, elem)
}

fn make_head_prim(desc: &SchemaDesc) -> Result<Schema, CodecError> {
    let content = only_child(desc, "head_prim")?;
    let mut schema = Schema::head_prim(head_name(desc, "head_prim")?, &content.kind)?;
    if let Schema::HeadPrimitive(h) = &mut schema {
        h.content.default = content.default.clone();
        h.content.default_args = content.args.clone();
    }
    Ok(schema)
}

fn make_enum(desc: &SchemaDesc) -> Result<Schema, CodecError> {
    let mut entries = Vec::new();
    let mut fallback = None;
    for child in &desc.children {
        if child.kind == "enum_entry" {
            let value = child.value.clone().ok_or_else(|| {
                CodecError::Unrepresentable("enum_entry: scalar value required".to_string())
            })?;
            if child.literal.is_empty() {
                return Err(CodecError::Unrepresentable(
                    "enum_entry: byte literal required".to_string(),
                ));
            }
            entries.push(EnumEntry::new(value, child.literal.clone()));
        } else if fallback.is_none() {
            fallback = Some(Box::new(make(child)?));
        } else {
            return Err(CodecError::Unrepresentable(
                "enum: at most one default entry".to_string(),
            ));
        }
    }
    Ok(Schema::Enum(EnumSchema { entries, fallback }))
}

fn make_enum_entry(_desc: &SchemaDesc) -> Result<Schema, CodecError> {
    Err(CodecError::Unrepresentable(
        "enum_entry is only valid inside an enum".to_string(),
    ))
}
