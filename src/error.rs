//! Codec error type. Errors surface to the root call; composite nodes prefix
//! the child path (`player[2].name: ...`) as they unwind.

/// Errors produced while encoding or decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown type: {0}")]
    UnknownType(String),
    #[error("unexpected end of input at offset {offset}: need {needed} byte(s), {remaining} left")]
    Underflow {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("length mismatch: {0}")]
    LengthMismatch(String),
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("unrepresentable value: {0}")]
    Unrepresentable(String),
    #[error("no enum entry matched and no default entry is set")]
    EnumFallthrough,
    #[error("interior NUL in cstr")]
    InteriorNul,
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("{path}: {source}")]
    At {
        path: String,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Prefix a path segment (field name or `[index]`) onto the error.
    pub fn at(self, segment: &str) -> CodecError {
        match self {
            CodecError::At { path, source } => {
                let joined = if path.starts_with('[') {
                    format!("{}{}", segment, path)
                } else {
                    format!("{}.{}", segment, path)
                };
                CodecError::At {
                    path: joined,
                    source,
                }
            }
            other => CodecError::At {
                path: segment.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The path-stripped root cause.
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::At { source, .. } => source.root(),
            other => other,
        }
    }
}

pub(crate) fn underflow(offset: usize, needed: usize, len: usize) -> CodecError {
    CodecError::Underflow {
        offset,
        needed,
        remaining: len.saturating_sub(offset),
    }
}
