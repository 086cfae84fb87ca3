//! Self-describing values for the polymorphic fallback tag.
//!
//! Each value carries its own one-slot kind tag, so a reader needs no static
//! type information. The decode side is bounded by [`DecodeContext::max_depth`].
use super::{DecodeContext, ParcelReader, ParcelWriter, WireError};

const TAG_NULL: i32 = 0;
const TAG_BOOL: i32 = 1;
const TAG_INT: i32 = 2;
const TAG_LONG: i32 = 3;
const TAG_DOUBLE: i32 = 4;
const TAG_STRING: i32 = 5;
const TAG_BYTES: i32 = 6;
const TAG_LIST: i32 = 7;
const TAG_MAP: i32 = 8;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Entries keep insertion order on the wire.
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn write_to(&self, dest: &mut ParcelWriter) -> Result<(), WireError> {
        match self {
            Value::Null => dest.write_tag(TAG_NULL),
            Value::Bool(b) => {
                dest.write_tag(TAG_BOOL);
                dest.write_bool(*b);
            }
            Value::Int(i) => {
                dest.write_tag(TAG_INT);
                dest.write_i32(*i);
            }
            Value::Long(l) => {
                dest.write_tag(TAG_LONG);
                dest.write_i64(*l);
            }
            Value::Double(d) => {
                dest.write_tag(TAG_DOUBLE);
                dest.write_f64(*d);
            }
            Value::String(s) => {
                dest.write_tag(TAG_STRING);
                dest.write_str(s)?;
            }
            Value::Bytes(b) => {
                dest.write_tag(TAG_BYTES);
                dest.write_bytes(b)?;
            }
            Value::List(items) => {
                dest.write_tag(TAG_LIST);
                dest.write_size(items.len())?;
                for item in items {
                    item.write_to(dest)?;
                }
            }
            Value::Map(entries) => {
                dest.write_tag(TAG_MAP);
                dest.write_size(entries.len())?;
                for (k, v) in entries {
                    k.write_to(dest)?;
                    v.write_to(dest)?;
                }
            }
        }
        Ok(())
    }

    pub fn read_from(src: &mut ParcelReader<'_>, ctx: &DecodeContext) -> Result<Value, WireError> {
        read_at_depth(src, ctx, 0)
    }
}

fn read_at_depth(src: &mut ParcelReader<'_>, ctx: &DecodeContext, depth: usize) -> Result<Value, WireError> {
    if depth > ctx.max_depth {
        return Err(WireError::DepthExceeded(ctx.max_depth));
    }
    let value = match src.read_tag()? {
        TAG_NULL => Value::Null,
        TAG_BOOL => Value::Bool(src.read_bool()?),
        TAG_INT => Value::Int(src.read_i32()?),
        TAG_LONG => Value::Long(src.read_i64()?),
        TAG_DOUBLE => Value::Double(src.read_f64()?),
        TAG_STRING => Value::String(src.read_string()?),
        TAG_BYTES => Value::Bytes(src.read_bytes()?),
        TAG_LIST => {
            let size = src.read_size()?;
            let mut items = Vec::with_capacity(src.capacity_hint(size));
            for _ in 0..size {
                items.push(read_at_depth(src, ctx, depth + 1)?);
            }
            Value::List(items)
        }
        TAG_MAP => {
            let size = src.read_size()?;
            let mut entries = Vec::with_capacity(src.capacity_hint(size));
            for _ in 0..size {
                let k = read_at_depth(src, ctx, depth + 1)?;
                let v = read_at_depth(src, ctx, depth + 1)?;
                entries.push((k, v));
            }
            Value::Map(entries)
        }
        other => return Err(WireError::UnknownValueTag(other)),
    };
    Ok(value)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::Map(vec![
            (Value::String("id".into()), Value::Long(42)),
            (
                Value::String("tags".into()),
                Value::List(vec![Value::String("a".into()), Value::Null, Value::Bool(false)]),
            ),
            (Value::Int(7), Value::Bytes(vec![1, 2, 3])),
            (Value::Null, Value::Double(0.5)),
        ])
    }

    #[test]
    fn nested_values_decode_to_the_same_tree() {
        let mut w = ParcelWriter::new();
        sample().write_to(&mut w).unwrap();
        let bytes = w.into_bytes();
        let mut r = ParcelReader::new(&bytes);
        assert_eq!(Value::read_from(&mut r, &DecodeContext::new()).unwrap(), sample());
        assert!(r.is_empty());
    }

    #[test]
    fn depth_limit_comes_from_the_context() {
        let deep = Value::List(vec![Value::List(vec![Value::List(vec![])])]);
        let mut w = ParcelWriter::new();
        deep.write_to(&mut w).unwrap();
        let bytes = w.into_bytes();

        let shallow = DecodeContext::with_max_depth(1);
        let err = Value::read_from(&mut ParcelReader::new(&bytes), &shallow).unwrap_err();
        assert_eq!(err, WireError::DepthExceeded(1));

        let roomy = DecodeContext::with_max_depth(2);
        assert_eq!(Value::read_from(&mut ParcelReader::new(&bytes), &roomy).unwrap(), deep);
    }

    #[test]
    fn unknown_tags_are_errors() {
        let mut w = ParcelWriter::new();
        w.write_tag(99);
        let bytes = w.into_bytes();
        let err = Value::read_from(&mut ParcelReader::new(&bytes), &DecodeContext::new()).unwrap_err();
        assert_eq!(err, WireError::UnknownValueTag(99));
    }
}
