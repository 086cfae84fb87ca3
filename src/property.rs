//! The resolved "how to encode this slot" tree.
//!
//! One `Property` per field, children for every type argument. The variant set
//! is closed; the synthesizer matches on it exhaustively.
use serde::Serialize;

use crate::config::{ContainerFamily, TextKind};
use crate::ir::{TypePath, TypeRef};
use crate::registry::AdapterHandle;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    /// Stable name; every local the synthesizer introduces for this slot is
    /// derived from it.
    pub name: String,
    /// Declared type of the value, `Option` and wildcards already peeled off.
    pub ty: TypeRef,
    /// The slot carries a presence sentinel.
    pub nullable: bool,
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyKind {
    Primitive { primitive: Primitive },
    /// `Option<primitive>`.
    Boxed { primitive: Primitive },
    Textual { text: TextKind },
    Array { component: Box<Property> },
    /// Ordered or unordered, per `family.shape`.
    Collection { family: ContainerFamily, item: Box<Property> },
    Map { family: ContainerFamily, key: Box<Property>, value: Box<Property> },
    SparseIndexedMap { family: ContainerFamily, value: Box<Property> },
    Enumerated { path: TypePath, variants: Vec<String> },
    NestedDataClass { class: TypePath, pointer: Option<Pointer> },
    PolymorphicInterface {
        interface: TypePath,
        implementers: Vec<TaggedImplementer>,
        fallback: Option<String>,
    },
    AdapterDelegated { adapter: AdapterHandle },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

/// Smart pointer between a field and the data class it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pointer {
    Box,
    Rc,
    Arc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedImplementer {
    pub tag: i32,
    pub variant: String,
    /// Always a non-null `NestedDataClass`.
    pub property: Property,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Primitive {
    pub fn from_path(path: &TypePath) -> Option<Primitive> {
        let p = match path.as_str() {
            "bool" => Primitive::Bool,
            "char" => Primitive::Char,
            "i8" => Primitive::I8,
            "i16" => Primitive::I16,
            "i32" => Primitive::I32,
            "i64" => Primitive::I64,
            "u8" => Primitive::U8,
            "u16" => Primitive::U16,
            "u32" => Primitive::U32,
            "u64" => Primitive::U64,
            "f32" => Primitive::F32,
            "f64" => Primitive::F64,
            _ => return None,
        };
        Some(p)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
        }
    }

    pub fn write_method(self) -> String { format!("write_{}", self.keyword()) }
    pub fn read_method(self) -> String { format!("read_{}", self.keyword()) }
}

impl Pointer {
    pub fn from_path(path: &TypePath) -> Option<Pointer> {
        if path.is_any_of(&["Box", "std::boxed::Box", "alloc::boxed::Box"]) {
            Some(Pointer::Box)
        } else if path.is_any_of(&["Rc", "std::rc::Rc", "alloc::rc::Rc"]) {
            Some(Pointer::Rc)
        } else if path.is_any_of(&["Arc", "std::sync::Arc", "alloc::sync::Arc"]) {
            Some(Pointer::Arc)
        } else {
            None
        }
    }

    pub fn canonical(self) -> &'static str {
        match self {
            Pointer::Box => "::std::boxed::Box",
            Pointer::Rc => "::std::rc::Rc",
            Pointer::Arc => "::std::sync::Arc",
        }
    }
}

impl Property {
    /// `items` + `size` -> `items_size`.
    pub fn child_name(&self, role: &str) -> String {
        format!("{}_{}", self.name, role)
    }

    /// Type of the slot itself, `Option` included.
    pub fn slot_ty(&self) -> TypeRef {
        if self.nullable {
            TypeRef::Nullable(Box::new(self.ty.clone()))
        } else {
            self.ty.clone()
        }
    }

    pub fn children(&self) -> Vec<&Property> {
        match &self.kind {
            PropertyKind::Array { component } => vec![component],
            PropertyKind::Collection { item, .. } => vec![item],
            PropertyKind::Map { key, value, .. } => vec![key, value],
            PropertyKind::SparseIndexedMap { value, .. } => vec![value],
            PropertyKind::PolymorphicInterface { implementers, .. } => {
                implementers.iter().map(|i| &i.property).collect()
            }
            PropertyKind::Primitive { .. }
            | PropertyKind::Boxed { .. }
            | PropertyKind::Textual { .. }
            | PropertyKind::Enumerated { .. }
            | PropertyKind::NestedDataClass { .. }
            | PropertyKind::AdapterDelegated { .. } => Vec::new(),
        }
    }

    /// Whether decoding this slot (ignoring nested classes, which the unit
    /// accounts for separately) needs the ambient context.
    pub fn requires_context(&self) -> bool {
        let direct = match &self.kind {
            PropertyKind::AdapterDelegated { .. } => true,
            PropertyKind::PolymorphicInterface { fallback, .. } => fallback.is_some(),
            _ => false,
        };
        direct || self.children().into_iter().any(Property::requires_context)
    }

    /// Adapters referenced anywhere in this tree, first use first.
    pub fn adapters(&self) -> Vec<&AdapterHandle> {
        let mut out = Vec::new();
        self.collect_adapters(&mut out);
        out
    }

    fn collect_adapters<'p>(&'p self, out: &mut Vec<&'p AdapterHandle>) {
        if let PropertyKind::AdapterDelegated { adapter } = &self.kind {
            if !out.iter().any(|h| h.ident == adapter.ident) {
                out.push(adapter);
            }
        }
        for child in self.children() {
            child.collect_adapters(out);
        }
    }

    /// Data classes this tree delegates to.
    pub fn nested_classes(&self) -> Vec<&TypePath> {
        let mut out = Vec::new();
        self.collect_nested(&mut out);
        out
    }

    fn collect_nested<'p>(&'p self, out: &mut Vec<&'p TypePath>) {
        if let PropertyKind::NestedDataClass { class, .. } = &self.kind {
            out.push(class);
        }
        for child in self.children() {
            child.collect_nested(out);
        }
    }

    pub fn variant_label(&self) -> &'static str {
        match &self.kind {
            PropertyKind::Primitive { .. } => "primitive",
            PropertyKind::Boxed { .. } => "boxed",
            PropertyKind::Textual { .. } => "textual",
            PropertyKind::Array { .. } => "array",
            PropertyKind::Collection { .. } => "collection",
            PropertyKind::Map { .. } => "map",
            PropertyKind::SparseIndexedMap { .. } => "sparse_indexed_map",
            PropertyKind::Enumerated { .. } => "enumerated",
            PropertyKind::NestedDataClass { .. } => "nested_data_class",
            PropertyKind::PolymorphicInterface { .. } => "polymorphic_interface",
            PropertyKind::AdapterDelegated { .. } => "adapter_delegated",
        }
    }
}
