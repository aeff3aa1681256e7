//! Decode a binary file with a schema and print the value tree.
//!
//! Usage:
//!   dump_bin --schema file.schema --root NAME data.bin
//!   dump_bin --format jpeg photo.jpg
//!   dump_bin --format png image.png
//!
//! Options:
//!   --schema FILE   Schema DSL source file
//!   --root NAME     Definition to use as root (default: last definition)
//!   --format NAME   Built-in schema: jpeg | png
//!   --check         Re-encode the decoded value and verify the bytes match

use anyhow::{anyhow, bail, Context};
use binschema::{adapter, dump, jpeg, parser, png, Schema};
use std::fs;

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let mut take_opt = |flag: &str| -> Option<String> {
        let pos = args.iter().position(|a| a == flag)?;
        args.remove(pos);
        if pos < args.len() {
            Some(args.remove(pos))
        } else {
            None
        }
    };
    let schema_path = take_opt("--schema");
    let root = take_opt("--root");
    let format = take_opt("--format");
    let check = if let Some(pos) = args.iter().position(|a| a == "--check") {
        args.remove(pos);
        true
    } else {
        false
    };

    let input = match args.as_slice() {
        [one] => one.clone(),
        _ => bail!("expected exactly one input file (see --help in the source header)"),
    };

    let schema = load_schema(schema_path.as_deref(), root.as_deref(), format.as_deref())?;
    let bytes = fs::read(&input).with_context(|| format!("read {}", input))?;

    let (value, consumed) = schema
        .decode(&bytes, 0)
        .with_context(|| format!("decode {}", input))?;
    println!("{}", dump::value_to_dump(&value, 0));
    eprintln!("{}: {} of {} byte(s)", input, consumed, bytes.len());

    if check {
        let encoded = adapter::encode_object(&schema, &value).context("re-encode")?;
        if encoded != bytes[..consumed] {
            bail!(
                "round-trip mismatch: re-encode produced {} byte(s), input had {}",
                encoded.len(),
                consumed
            );
        }
        eprintln!("round-trip: ok");
    }
    Ok(())
}

fn load_schema(
    schema_path: Option<&str>,
    root: Option<&str>,
    format: Option<&str>,
) -> anyhow::Result<Schema> {
    match (schema_path, format) {
        (Some(path), None) => {
            let source = fs::read_to_string(path).with_context(|| format!("read {}", path))?;
            let set = parser::parse(&source).map_err(|e| anyhow!(e))?;
            let root = match root {
                Some(name) => name.to_string(),
                None => set
                    .names()
                    .last()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("{}: no definitions", path))?,
            };
            Ok(set.make(&root)?)
        }
        (None, Some("jpeg")) => Ok(jpeg::stream()?),
        (None, Some("png")) => Ok(png::stream()?),
        (None, Some(other)) => bail!("unknown --format {:?} (jpeg or png)", other),
        (Some(_), Some(_)) => bail!("--schema and --format are mutually exclusive"),
        (None, None) => bail!("one of --schema or --format is required"),
    }
}
