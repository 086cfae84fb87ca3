use thiserror::Error;

/// Everything that can go wrong while decoding (and, rarely, encoding) a parcel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WireError {
    #[error("unexpected end of input: needed {needed} byte(s), {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("invalid presence sentinel {0}")]
    InvalidPresence(i32),
    #[error("invalid boolean {0}")]
    InvalidBool(i32),
    #[error("invalid char scalar {0:#x}")]
    InvalidChar(u32),
    #[error("value {value} does not fit in {kind}")]
    OutOfRange { kind: &'static str, value: i64 },
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error("length {0} exceeds i32::MAX")]
    LengthOverflow(usize),
    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,
    #[error("unknown ordinal {ordinal} for enum {type_name}")]
    UnknownOrdinal { type_name: &'static str, ordinal: i32 },
    #[error("unknown type tag {tag} for {type_name}")]
    UnknownTypeTag { type_name: &'static str, tag: i32 },
    #[error("unknown value tag {0}")]
    UnknownValueTag(i32),
    #[error("value nesting exceeds depth {0}")]
    DepthExceeded(usize),
    #[error("adapter failed: {0}")]
    Adapter(String),
}
