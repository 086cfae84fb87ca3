use std::collections::{BTreeMap, BTreeSet, HashMap, LinkedList, VecDeque};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use parcel_gen::wire::{DecodeContext, ParcelReader, ParcelWriter, SparseArray, TypeAdapter, Value, WireError};

// ————————————————————————————————————————————————————————————————————————————
// SCENARIOS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaybeNumbers {
    pub numbers: Option<Box<[Option<i32>]>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    pub labels: SparseArray<Option<String>>,
}

/// Two sibling fields whose types refer to each other.
#[derive(Debug, Clone, PartialEq)]
pub struct Siblings {
    pub alpha: Alpha,
    pub beta: Beta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alpha {
    pub beta: Option<Box<Beta>>,
    pub weight: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Beta {
    pub alpha: Option<Rc<Alpha>>,
    pub label: String,
}

// ————————————————————————————————————————————————————————————————————————————
// SCALARS & TEXT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub struct Scalars {
    pub flag: bool,
    pub letter: char,
    pub tiny: i8,
    pub small: i16,
    pub byte: u8,
    pub word: u16,
    pub dword: u32,
    pub qword: u64,
    pub long: i64,
    pub single: f32,
    pub double: f64,
    pub maybe_flag: Option<bool>,
    pub maybe_letter: Option<char>,
    pub maybe_long: Option<i64>,
    pub text: String,
    pub boxed_text: Box<str>,
    pub shared_text: Option<Rc<str>>,
    pub atomic_text: Arc<str>,
}

// ————————————————————————————————————————————————————————————————————————————
// CONTAINERS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Three levels of nesting in every field, nullable slots at each level.
#[derive(Debug, Clone, PartialEq)]
pub struct Deep {
    pub grid: Vec<HashMap<String, Option<Box<[Option<Point>]>>>>,
    pub index: BTreeMap<i64, VecDeque<Option<char>>>,
    pub shelves: Option<IndexMap<String, LinkedList<BTreeSet<u16>>>>,
    pub matrix: Box<[Box<[Option<Box<[u8]>>]>]>,
    pub sparse: SparseArray<Vec<Option<Point>>>,
}

// ————————————————————————————————————————————————————————————————————————————
// ENUMS & INTERFACES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Option<Color>,
    pub history: Vec<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Square {
    pub side: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// `Triangle` is registered through configuration, not the declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Square(Square),
    Triangle(Triangle),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub name: String,
    pub shapes: Vec<Shape>,
    pub highlight: Option<Shape>,
}

// ————————————————————————————————————————————————————————————————————————————
// ADAPTERS
// ————————————————————————————————————————————————————————————————————————————

/// Opaque to the generator: only an adapter knows its layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Celsius(pub f64);

/// Travels as hundredths of a degree in one `i32`.
#[derive(Debug, Default)]
pub struct CelsiusAdapter;

impl TypeAdapter<Celsius> for CelsiusAdapter {
    fn write(&self, value: &Celsius, dest: &mut ParcelWriter) -> Result<(), WireError> {
        dest.write_i32((value.0 * 100.0).round() as i32);
        Ok(())
    }

    fn read(&self, src: &mut ParcelReader<'_>, _ctx: &DecodeContext) -> Result<Celsius, WireError> {
        Ok(Celsius(f64::from(src.read_i32()?) / 100.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bag<T>(pub Vec<T>);

#[derive(Debug)]
pub struct BagAdapter<T>(PhantomData<fn() -> T>);

impl<T> Default for BagAdapter<T> {
    fn default() -> Self { Self(PhantomData) }
}

impl TypeAdapter<Bag<i32>> for BagAdapter<i32> {
    fn write(&self, value: &Bag<i32>, dest: &mut ParcelWriter) -> Result<(), WireError> {
        dest.write_size(value.0.len())?;
        value.0.iter().for_each(|v| dest.write_i32(*v));
        Ok(())
    }

    fn read(&self, src: &mut ParcelReader<'_>, _ctx: &DecodeContext) -> Result<Bag<i32>, WireError> {
        let len = src.read_size()?;
        (0..len).map(|_| src.read_i32()).collect::<Result<Vec<i32>, _>>().map(Bag)
    }
}

impl TypeAdapter<Bag<String>> for BagAdapter<String> {
    fn write(&self, value: &Bag<String>, dest: &mut ParcelWriter) -> Result<(), WireError> {
        dest.write_size(value.0.len())?;
        value.0.iter().try_for_each(|v| dest.write_str(v))
    }

    fn read(&self, src: &mut ParcelReader<'_>, _ctx: &DecodeContext) -> Result<Bag<String>, WireError> {
        let len = src.read_size()?;
        (0..len).map(|_| src.read_string()).collect::<Result<Vec<String>, _>>().map(Bag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub today: Celsius,
    pub forecast: Vec<Celsius>,
    pub record: Option<Celsius>,
    pub readings: Bag<i32>,
    pub stations: Bag<String>,
    pub backup: Option<Bag<i32>>,
}

/// Reaches an adapter only through `Weather`.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: u32,
    pub weather: Weather,
}

// ————————————————————————————————————————————————————————————————————————————
// SHAPES OF STRUCT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub struct Pair(pub i32, pub Option<String>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: u64,
    /// Excluded from the wire; comes back as `Default::default()`.
    pub cache: Vec<u8>,
    pub(crate) user: String,
}

impl Session {
    pub fn new(id: u64, user: &str, cache: Vec<u8>) -> Self {
        Self { id, cache, user: user.to_string() }
    }

    pub fn user(&self) -> &String { &self.user }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub marker: Marker,
    pub pair: Pair,
    pub session: Session,
    pub r#type: u8,
}
