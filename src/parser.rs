//! Parse schema DSL source into plain descriptions using PEST.

use crate::desc::SchemaDesc;
use crate::error::CodecError;
use crate::registry;
use crate::schema::Schema;
use crate::value::Value;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::collections::HashMap;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

/// Named schema descriptions from one source file, in definition order.
/// Later definitions may reference earlier ones by name; references are
/// expanded inline, so every stored description is self-contained.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    defs: Vec<(String, SchemaDesc)>,
    by_name: HashMap<String, usize>,
}

impl SchemaSet {
    pub fn get(&self, name: &str) -> Option<&SchemaDesc> {
        self.by_name.get(name).map(|&i| &self.defs[i].1)
    }

    /// Reify one definition into a live schema tree.
    pub fn make(&self, name: &str) -> Result<Schema, CodecError> {
        let desc = self
            .get(name)
            .ok_or_else(|| CodecError::UnknownType(name.to_string()))?;
        registry::make(desc)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Parse schema source into a set of named descriptions.
pub fn parse(source: &str) -> Result<SchemaSet, String> {
    let pairs = SchemaParser::parse(Rule::schema_file, source)
        .map_err(|e| format!("Parse error: {}", e))?;
    let file = pairs.into_iter().next().ok_or("Empty parse")?;

    let mut set = SchemaSet::default();
    for def in file.into_inner() {
        if !matches!(def.as_rule(), Rule::def) {
            continue;
        }
        let mut inner = def.into_inner();
        let name = inner.next().ok_or("def: missing name")?.as_str().to_string();
        let body = inner.next().ok_or("def: missing body")?;
        let desc = build_node(body, &set)?;
        if set.by_name.contains_key(&name) {
            return Err(format!("Duplicate definition: {}", name));
        }
        set.by_name.insert(name.clone(), set.defs.len());
        set.defs.push((name, desc));
    }
    Ok(set)
}

/// Parse source and reify one named definition in a single step.
pub fn parse_one(source: &str, name: &str) -> Result<Schema, String> {
    let set = parse(source)?;
    set.make(name).map_err(|e| e.to_string())
}

fn build_node(pair: pest::iterators::Pair<Rule>, set: &SchemaSet) -> Result<SchemaDesc, String> {
    let inner = pair.into_inner().next().ok_or("Empty node")?;
    match inner.as_rule() {
        Rule::record_node => build_record(inner, set),
        Rule::tuple_node => build_tuple(inner, set),
        Rule::array_node => build_array(inner, set),
        Rule::head_array_node => build_head_array(inner, set),
        Rule::head_prim_node => build_head_prim(inner),
        Rule::enum_node => build_enum(inner, set),
        Rule::prim_node => build_prim(inner),
        Rule::ref_node => {
            let name = inner.as_str().trim();
            set.get(name)
                .cloned()
                .ok_or_else(|| format!("Reference to undefined schema: {}", name))
        }
        other => Err(format!("Unhandled node rule: {:?}", other)),
    }
}

fn build_record(pair: pest::iterators::Pair<Rule>, set: &SchemaSet) -> Result<SchemaDesc, String> {
    let mut desc = SchemaDesc::new("record");
    for field in pair.into_inner() {
        if !matches!(field.as_rule(), Rule::field) {
            continue;
        }
        let mut inner = field.into_inner();
        let name = inner.next().ok_or("field: missing name")?.as_str().to_string();
        let node = inner.next().ok_or("field: missing type")?;
        let mut child = build_node(node, set)?;
        child.name = Some(name);
        if let Some(default) = inner.next() {
            child.default = Some(build_default(default)?);
        }
        desc.children.push(child);
    }
    Ok(desc)
}

fn build_tuple(pair: pest::iterators::Pair<Rule>, set: &SchemaSet) -> Result<SchemaDesc, String> {
    let mut desc = SchemaDesc::new("tuple");
    for item in pair.into_inner() {
        if matches!(item.as_rule(), Rule::tuple_item) {
            let node = item.into_inner().next().ok_or("tuple item: missing type")?;
            desc.children.push(build_node(node, set)?);
        }
    }
    Ok(desc)
}

fn build_array(pair: pest::iterators::Pair<Rule>, set: &SchemaSet) -> Result<SchemaDesc, String> {
    let mut desc = SchemaDesc::new("array");
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::node => desc.children.push(build_node(inner, set)?),
            Rule::num => desc.args.push(parse_num(inner.as_str())?),
            _ => {}
        }
    }
    if desc.children.len() != 1 {
        return Err("array(T, ...): element type required".to_string());
    }
    Ok(desc)
}

fn build_head_array(
    pair: pest::iterators::Pair<Rule>,
    set: &SchemaSet,
) -> Result<SchemaDesc, String> {
    let mut desc = SchemaDesc::new("head_array");
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::prim_name => desc.head = Some(inner.as_str().to_string()),
            Rule::node => desc.children.push(build_node(inner, set)?),
            _ => {}
        }
    }
    Ok(desc)
}

fn build_head_prim(pair: pest::iterators::Pair<Rule>) -> Result<SchemaDesc, String> {
    let mut desc = SchemaDesc::new("head_prim");
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::prim_name => desc.head = Some(inner.as_str().to_string()),
            Rule::prim_node => desc.children.push(build_prim(inner)?),
            _ => {}
        }
    }
    Ok(desc)
}

fn build_enum(pair: pest::iterators::Pair<Rule>, set: &SchemaSet) -> Result<SchemaDesc, String> {
    let mut desc = SchemaDesc::new("enum");
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::enum_entry => {
                let mut parts = inner.into_inner();
                let value = parts.next().ok_or("enum entry: missing value")?;
                let bytes = parts.next().ok_or("enum entry: missing byte literal")?;
                let mut entry = SchemaDesc::new("enum_entry");
                entry.value = Some(parse_literal(value.as_str()));
                entry.literal = parse_literal_bytes(bytes.as_str())?;
                desc.children.push(entry);
            }
            Rule::else_clause => {
                let node = inner.into_inner().next().ok_or("else: missing type")?;
                desc.children.push(build_node(node, set)?);
            }
            _ => {}
        }
    }
    Ok(desc)
}

fn build_prim(pair: pest::iterators::Pair<Rule>) -> Result<SchemaDesc, String> {
    let mut inner = pair.into_inner();
    let name = inner.next().ok_or("prim: missing type name")?;
    let mut desc = SchemaDesc::new(name.as_str());
    for part in inner {
        match part.as_rule() {
            Rule::prim_args => {
                for num in part.into_inner() {
                    desc.args.push(parse_num(num.as_str())?);
                }
            }
            Rule::default_clause => {
                desc.default = Some(build_default(part)?);
            }
            _ => {}
        }
    }
    Ok(desc)
}

fn build_default(pair: pest::iterators::Pair<Rule>) -> Result<Value, String> {
    let literal = pair
        .into_inner()
        .next()
        .ok_or("default: missing literal")?;
    Ok(parse_literal(literal.as_str()))
}

fn parse_num(s: &str) -> Result<u64, String> {
    s.trim().parse().map_err(|_| format!("Bad number: {}", s))
}

fn parse_literal(s: &str) -> Value {
    let s = s.trim();
    if s == "true" {
        return Value::Bool(true);
    }
    if s == "false" {
        return Value::Bool(false);
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if let Ok(n) = u64::from_str_radix(hex, 16) {
            return Value::U64(n);
        }
    }
    if s.contains('.') {
        if let Ok(x) = s.parse::<f64>() {
            return Value::Double(x);
        }
    }
    if let Ok(n) = s.parse::<i64>() {
        return Value::I64(n);
    }
    if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
        return Value::Str(unescape(&s[1..s.len() - 1]));
    }
    Value::I64(0)
}

fn parse_literal_bytes(s: &str) -> Result<Vec<u8>, String> {
    let s = s.trim();
    if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
        return Ok(unescape(&s[1..s.len() - 1]).into_bytes());
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.len() % 2 != 0 {
            return Err("Hex literal must have even length".to_string());
        }
        let mut bytes = Vec::with_capacity(hex.len() / 2);
        for chunk in hex.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(chunk).map_err(|_| "Invalid hex")?;
            bytes.push(u8::from_str_radix(pair, 16).map_err(|_| "Invalid hex")?);
        }
        return Ok(bytes);
    }
    Err("byte literal: expected string or 0x...".to_string())
}

fn unescape(s: &str) -> String {
    s.replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\0", "\0")
        .replace("\\\"", "\"")
}
