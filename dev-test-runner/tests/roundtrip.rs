use std::collections::{BTreeMap, BTreeSet, HashMap, LinkedList, VecDeque};
use std::rc::Rc;

use dev_test_runner::fixtures::*;
use dev_test_runner::generated::*;
use indexmap::IndexMap;
use parcel_gen::wire::{DecodeContext, ParcelReader, ParcelWriter, SparseArray, Value, WireError, ABSENT, PRESENT};

// ---- Helpers ---- //

fn encode<T>(value: &T, write: fn(&T, &mut ParcelWriter) -> Result<(), WireError>) -> Vec<u8> {
    let mut dest = ParcelWriter::new();
    write(value, &mut dest).unwrap();
    dest.into_bytes()
}

fn decode<T>(bytes: &[u8], read: fn(&mut ParcelReader<'_>) -> Result<T, WireError>) -> T {
    let mut src = ParcelReader::new(bytes);
    let value = read(&mut src).unwrap();
    assert!(src.is_empty(), "{} trailing byte(s)", src.remaining());
    value
}

fn decode_ctx<T>(bytes: &[u8], read: fn(&mut ParcelReader<'_>, &DecodeContext) -> Result<T, WireError>) -> T {
    let mut src = ParcelReader::new(bytes);
    let value = read(&mut src, &DecodeContext::new()).unwrap();
    assert!(src.is_empty(), "{} trailing byte(s)", src.remaining());
    value
}

/// Little-endian `i32` words, the unit of almost everything on the wire.
fn words(words: &[i32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn string(text: &str) -> Vec<u8> {
    let mut out = words(&[text.len() as i32]);
    out.extend_from_slice(text.as_bytes());
    out
}

fn point(x: f32, y: f32) -> Point {
    Point { x, y }
}

// ---- Scenarios ---- //

#[test]
fn single_int_field_has_no_sentinel() {
    let bytes = encode(&Counter { value: 42 }, write_counter);
    assert_eq!(bytes, words(&[42]));
    assert_eq!(decode(&bytes, read_counter), Counter { value: 42 });
}

#[test]
fn nullable_array_of_nullable_ints() {
    let value = MaybeNumbers { numbers: Some(vec![Some(1), None, Some(3)].into_boxed_slice()) };
    let bytes = encode(&value, write_maybe_numbers);
    assert_eq!(bytes, words(&[PRESENT, 3, PRESENT, 1, ABSENT, PRESENT, 3]));
    assert_eq!(decode(&bytes, read_maybe_numbers), value);

    let empty = MaybeNumbers { numbers: None };
    let bytes = encode(&empty, write_maybe_numbers);
    assert_eq!(bytes, words(&[ABSENT]));
    assert_eq!(decode(&bytes, read_maybe_numbers), empty);
}

#[test]
fn sparse_map_writes_key_before_value() {
    let mut labels = SparseArray::new();
    labels.put(9, Some("b".to_string()));
    labels.put(5, Some("a".to_string()));
    let value = Labels { labels };
    let bytes = encode(&value, write_labels);

    let mut expected = words(&[2, 5, PRESENT]);
    expected.extend(string("a"));
    expected.extend(words(&[9, PRESENT]));
    expected.extend(string("b"));
    assert_eq!(bytes, expected);
    assert_eq!(decode(&bytes, read_labels), value);
}

#[test]
fn mutually_recursive_siblings_round_trip() {
    let alpha = Alpha {
        beta: Some(Box::new(Beta {
            alpha: Some(Rc::new(Alpha { beta: None, weight: 3 })),
            label: "inner".into(),
        })),
        weight: 1,
    };
    let beta = Beta { alpha: Some(Rc::new(alpha.clone())), label: "outer".into() };
    let value = Siblings { alpha, beta };
    let bytes = encode(&value, write_siblings);
    assert_eq!(decode(&bytes, read_siblings), value);
}

// ---- Variants ---- //

#[test]
fn scalars_and_text_round_trip() {
    let value = Scalars {
        flag: true,
        letter: 'ж',
        tiny: i8::MIN,
        small: -12_345,
        byte: u8::MAX,
        word: 40_000,
        dword: u32::MAX,
        qword: u64::MAX - 1,
        long: i64::MIN,
        single: 0.25,
        double: -1e300,
        maybe_flag: Some(false),
        maybe_letter: None,
        maybe_long: Some(7),
        text: "plain".into(),
        boxed_text: "boxed".into(),
        shared_text: Some(Rc::from("shared")),
        atomic_text: "atomic".into(),
    };
    let bytes = encode(&value, write_scalars);
    assert_eq!(decode(&bytes, read_scalars), value);

    let flags = Scalars { maybe_flag: None, shared_text: None, ..value };
    assert_eq!(decode(&encode(&flags, write_scalars), read_scalars), flags);
}

#[test]
fn narrow_scalars_take_one_word_each() {
    let value = Scalars {
        flag: true,
        letter: 'A',
        tiny: -1,
        small: 2,
        byte: 3,
        word: 4,
        dword: 5,
        qword: 6,
        long: 7,
        single: 0.0,
        double: 0.0,
        maybe_flag: None,
        maybe_letter: Some('B'),
        maybe_long: None,
        text: String::new(),
        boxed_text: "".into(),
        shared_text: None,
        atomic_text: "".into(),
    };
    let bytes = encode(&value, write_scalars);
    assert_eq!(&bytes[..28], &words(&[1, 'A' as i32, -1, 2, 3, 4, 5])[..]);
}

#[test]
fn depth_three_nesting_round_trips_with_nulls_everywhere() {
    let mut cell = HashMap::new();
    cell.insert("full".to_string(), Some(vec![Some(point(1.0, 2.0)), None].into_boxed_slice()));
    cell.insert("missing".to_string(), None);
    cell.insert("empty".to_string(), Some(Vec::new().into_boxed_slice()));

    let mut index = BTreeMap::new();
    index.insert(-4, VecDeque::from(vec![Some('x'), None, Some('y')]));
    index.insert(10, VecDeque::new());

    let mut shelves = IndexMap::new();
    shelves.insert("top".to_string(), LinkedList::from([BTreeSet::from([3, 1, 2]), BTreeSet::new()]));

    let mut sparse = SparseArray::new();
    sparse.put(2, vec![None, Some(point(-1.0, 0.5))]);
    sparse.put(-7, Vec::new());

    let value = Deep {
        grid: vec![cell, HashMap::new()],
        index,
        shelves: Some(shelves),
        matrix: vec![
            vec![Some(vec![1u8, 2].into_boxed_slice()), None].into_boxed_slice(),
            Vec::new().into_boxed_slice(),
        ]
        .into_boxed_slice(),
        sparse,
    };
    let bytes = encode(&value, write_deep);
    assert_eq!(decode(&bytes, read_deep), value);

    let bare = Deep { shelves: None, ..value };
    assert_eq!(decode(&encode(&bare, write_deep), read_deep), bare);
}

#[test]
fn enums_travel_as_ordinals() {
    let value = Palette { primary: Color::Blue, secondary: None, history: vec![Color::Red, Color::Green] };
    let bytes = encode(&value, write_palette);
    assert_eq!(bytes, words(&[2, ABSENT, 2, 0, 1]));
    assert_eq!(decode(&bytes, read_palette), value);
}

#[test]
fn unknown_ordinal_is_an_error() {
    let bytes = words(&[7, ABSENT, 0]);
    let err = read_palette(&mut ParcelReader::new(&bytes)).unwrap_err();
    assert!(matches!(err, WireError::UnknownOrdinal { ordinal: 7, .. }), "{err}");
}

#[test]
fn polymorphic_values_dispatch_on_tag() {
    let value = Drawing {
        name: "sketch".into(),
        shapes: vec![
            Shape::Circle(Circle { radius: 1.5 }),
            Shape::Square(Square { side: 2.0 }),
            Shape::Triangle(Triangle { a: 3.0, b: 4.0, c: 5.0 }),
            Shape::Other(Value::List(vec![Value::Int(1), Value::String("x".into())])),
        ],
        highlight: Some(Shape::Square(Square { side: 9.0 })),
    };
    let bytes = encode(&value, write_drawing);
    assert_eq!(decode_ctx(&bytes, read_drawing), value);

    // name, then count, then the circle's tag and payload
    let mut prefix = string("sketch");
    prefix.extend(words(&[4, 1]));
    prefix.extend(1.5f64.to_le_bytes());
    prefix.extend(words(&[2]));
    assert_eq!(&bytes[..prefix.len()], &prefix[..]);
}

#[test]
fn fallback_and_unknown_tags() {
    let value = Drawing { name: String::new(), shapes: vec![Shape::Other(Value::Null)], highlight: None };
    let bytes = encode(&value, write_drawing);
    let mut expected = string("");
    expected.extend(words(&[1, 0, 0, ABSENT]));
    assert_eq!(bytes, expected);

    let mut bad = string("");
    bad.extend(words(&[1, 42]));
    let err = read_drawing(&mut ParcelReader::new(&bad), &DecodeContext::new()).unwrap_err();
    assert!(matches!(err, WireError::UnknownTypeTag { tag: 42, .. }), "{err}");
}

#[test]
fn adapters_encode_opaque_types() {
    let value = Weather {
        today: Celsius(21.5),
        forecast: vec![Celsius(18.25), Celsius(-3.0)],
        record: None,
        readings: Bag(vec![1, 2, 3]),
        stations: Bag(vec!["north".into(), "south".into()]),
        backup: Some(Bag(Vec::new())),
    };
    let bytes = encode(&value, write_weather);
    assert_eq!(&bytes[..16], &words(&[2150, 2, 1825, -300])[..]);
    assert_eq!(decode_ctx(&bytes, read_weather), value);
}

#[test]
fn context_requirement_reaches_through_nested_classes() {
    let value = Station {
        id: 9,
        weather: Weather {
            today: Celsius(0.0),
            forecast: Vec::new(),
            record: Some(Celsius(40.0)),
            readings: Bag(vec![7]),
            stations: Bag(Vec::new()),
            backup: None,
        },
    };
    let bytes = encode(&value, write_station);
    // `read_station` only compiles with a context parameter.
    assert_eq!(decode_ctx(&bytes, read_station), value);
}

#[test]
fn tuple_singleton_getter_and_excluded_fields() {
    let value = Envelope {
        marker: Marker,
        pair: Pair(-1, Some("p".into())),
        session: Session::new(77, "ada", vec![1, 2, 3]),
        r#type: 4,
    };
    let bytes = encode(&value, write_envelope);

    let mut expected = words(&[-1, PRESENT]);
    expected.extend(string("p"));
    expected.extend(77i64.to_le_bytes());
    expected.extend(string("ada"));
    expected.extend(words(&[4]));
    assert_eq!(bytes, expected);

    let back = decode(&bytes, read_envelope);
    assert_eq!(back.session.cache, Vec::<u8>::new());
    assert_eq!(back.session.user(), "ada");
    assert_eq!(back.pair, value.pair);
    assert_eq!(back.r#type, 4);
}

#[test]
fn singleton_writes_nothing() {
    assert!(encode(&Marker, write_marker).is_empty());
    assert_eq!(decode(&[], read_marker), Marker);
}

#[test]
fn truncated_input_is_reported() {
    let bytes = encode(&Counter { value: 1 }, write_counter);
    let err = read_counter(&mut ParcelReader::new(&bytes[..2])).unwrap_err();
    assert_eq!(err, WireError::UnexpectedEof { needed: 4, remaining: 2 });
}
