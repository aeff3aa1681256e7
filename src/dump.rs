//! Format decoded values for display (dump text, tree view).

use crate::value::Value;

/// Raw scalar string.
pub fn format_scalar(v: &Value) -> String {
    match v {
        Value::U8(x) => format!("{}", x),
        Value::U16(x) => format!("{}", x),
        Value::U32(x) => format!("{}", x),
        Value::U64(x) => format!("{}", x),
        Value::I8(x) => format!("{}", x),
        Value::I16(x) => format!("{}", x),
        Value::I32(x) => format!("{}", x),
        Value::I64(x) => format!("{}", x),
        Value::Bool(x) => format!("{}", x),
        Value::Float(x) => format!("{}", x),
        Value::Double(x) => format!("{}", x),
        Value::Str(s) => format!("{:?}", s),
        _ => format!("{:?}", v),
    }
}

fn hex_string(b: &[u8]) -> String {
    const PREVIEW: usize = 32;
    let shown = &b[..b.len().min(PREVIEW)];
    let hex = shown
        .iter()
        .map(|x| format!("{:02x}", x))
        .collect::<Vec<_>>()
        .join(" ");
    if b.len() > PREVIEW {
        format!("{} .. ({} bytes)", hex, b.len())
    } else {
        hex
    }
}

/// Format a value as an indented tree (one-line for scalars, multi-line
/// for maps and lists). Map keys are printed sorted for stable output.
pub fn value_to_dump(v: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match v {
        Value::Bytes(b) => format!("{}hex({})", pad, hex_string(b)),
        Value::Map(m) => {
            let mut lines: Vec<String> = vec![format!("{}{{", pad)];
            let mut keys: Vec<_> = m.keys().collect();
            keys.sort();
            for k in keys {
                let sub = value_to_dump(&m[k], indent + 1);
                lines.push(format!("{}  {}: {}", pad, k, sub.trim_start()));
            }
            lines.push(format!("{}}}", pad));
            lines.join("\n")
        }
        Value::List(items) => {
            if items.is_empty() {
                return format!("{}[]", pad);
            }
            let mut lines: Vec<String> = vec![format!("{}[", pad)];
            for (i, item) in items.iter().enumerate() {
                let sub = value_to_dump(item, indent + 1);
                lines.push(format!("{}  [{}] {}", pad, i, sub.trim_start()));
            }
            lines.push(format!("{}]", pad));
            lines.join("\n")
        }
        scalar => format!("{}{}", pad, format_scalar(scalar)),
    }
}
