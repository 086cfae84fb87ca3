//! Normalized input produced by the discovery front end.
//!
//! A unit is every class generated into one output file, plus the enum and
//! interface declarations their fields may mention.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::ir::{TypePath, TypeRef};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitModel {
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub enums: Vec<EnumDecl>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceDecl>,
    #[serde(default)]
    pub classes: Vec<ClassModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassModel {
    pub path: TypePath,
    /// Field order is wire order.
    #[serde(default)]
    pub fields: Vec<FieldModel>,
    /// Unit struct: nothing on the wire, decoding yields the value itself.
    #[serde(default)]
    pub singleton: bool,
    /// The front end already knows decoding needs the ambient context.
    #[serde(default)]
    pub requires_context: bool,
    /// Overrides the snake-cased type name in `write_<stem>`/`read_<stem>`.
    #[serde(default)]
    pub routine_stem: Option<String>,
    /// Routines the target already declares by hand.
    #[serde(default)]
    pub existing_routines: Vec<ExistingRoutine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldModel {
    /// Field identifier, or a position (`"0"`) for tuple structs.
    pub name: String,
    pub ty: TypeRef,
    /// Read through `value.getter()` instead of `&value.name`.
    #[serde(default)]
    pub getter: Option<String>,
    #[serde(default)]
    pub annotations: Vec<String>,
}

/// A fieldless enum; ordinals follow declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub path: TypePath,
    pub variants: Vec<String>,
}

/// A closed Rust enum standing in for an open interface: each implementer is a
/// newtype variant around a data class, `fallback` (if any) wraps a
/// `wire::Value` for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub path: TypePath,
    #[serde(default)]
    pub implementers: Vec<Implementer>,
    #[serde(default)]
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementer {
    pub variant: String,
    pub class: TypePath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRoutine {
    pub name: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl UnitModel {
    pub fn from_json_str(src: &str) -> Result<UnitModel, String> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<UnitModel, String> {
        crate::path_de::from_slice_with_path(bytes)
    }

    /// Concatenate another unit's declarations after this one's.
    pub fn merge(&mut self, other: UnitModel) {
        self.config.merge(other.config);
        self.enums.extend(other.enums);
        self.interfaces.extend(other.interfaces);
        self.classes.extend(other.classes);
    }

    pub fn class(&self, path: &TypePath) -> Option<&ClassModel> {
        self.classes.iter().find(|c| c.path.same_as(path.as_str()))
    }

    pub fn enum_decl(&self, path: &TypePath) -> Option<&EnumDecl> {
        self.enums.iter().find(|e| e.path.same_as(path.as_str()))
    }

    pub fn interface(&self, path: &TypePath) -> Option<&InterfaceDecl> {
        self.interfaces.iter().find(|i| i.path.same_as(path.as_str()))
    }
}

impl ClassModel {
    pub fn new(path: &str) -> Self {
        Self {
            path: TypePath::new(path),
            fields: Vec::new(),
            singleton: false,
            requires_context: false,
            routine_stem: None,
            existing_routines: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &str, ty: TypeRef) -> Self {
        self.fields.push(FieldModel::new(name, ty));
        self
    }

    pub fn stem(&self) -> String {
        match &self.routine_stem {
            Some(stem) => stem.clone(),
            None => snake_case(self.path.last_segment()),
        }
    }

    pub fn write_routine(&self) -> String { format!("write_{}", self.stem()) }
    pub fn read_routine(&self) -> String { format!("read_{}", self.stem()) }

    pub fn is_tuple(&self) -> bool {
        self.fields.first().is_some_and(|f| f.is_positional())
    }
}

impl FieldModel {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self { name: name.to_string(), ty, getter: None, annotations: Vec::new() }
    }

    /// A field whose type is given as Rust source, e.g. `"Vec<Option<i32>>"`.
    pub fn parse(name: &str, ty: &str) -> Result<Self, crate::error::SynthError> {
        Ok(Self::new(name, TypeRef::parse(ty)?))
    }

    pub fn is_positional(&self) -> bool {
        !self.name.is_empty() && self.name.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// `HTTPServerConfig` -> `http_server_config`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_handles_acronyms() {
        assert_eq!(snake_case("Point"), "point");
        assert_eq!(snake_case("HTTPServerConfig"), "http_server_config");
        assert_eq!(snake_case("Vec3D"), "vec3_d");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn unit_json_reports_paths() {
        let err = UnitModel::from_json_str(r#"{ "classes": [ { "path": "crate::A", "fields": [ { "name": "x", "ty": "&str" } ] } ] }"#)
            .unwrap_err();
        assert!(err.contains("classes[0].fields[0].ty"), "{err}");
    }

    #[test]
    fn routine_names_follow_the_stem() {
        let mut class = ClassModel::new("crate::shapes::RoundedRect");
        assert_eq!(class.write_routine(), "write_rounded_rect");
        class.routine_stem = Some("rr".into());
        assert_eq!(class.read_routine(), "read_rr");
    }

    #[test]
    fn field_types_parse_from_source() {
        let field = FieldModel::parse("xs", "Vec<Option<i32>>").unwrap();
        assert_eq!(field.ty.to_string(), "Vec<Option<i32>>");
        let err = FieldModel::parse("r", "&'static str").unwrap_err();
        assert!(matches!(err, crate::error::SynthError::InvalidType(_)), "{err}");
    }

    #[test]
    fn tuple_structs_are_detected_by_positional_names() {
        let class = ClassModel::new("crate::Pair")
            .with_field("0", TypeRef::named("i32"))
            .with_field("1", TypeRef::named("i32"));
        assert!(class.is_tuple());
        assert!(!ClassModel::new("crate::Unit").is_tuple());
    }
}
