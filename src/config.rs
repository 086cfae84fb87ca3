//! The closed configuration surface of the generator.
//!
//! Every field has a default, so a unit file only spells out what it changes.
use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::ir::{TypePath, TypeRef};
use crate::model::Implementer;

pub const DEFAULT_RUNTIME_PATH: &str = "::parcel_gen::wire";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fields carrying any of these markers are skipped on the wire.
    pub excluded_annotations: BTreeSet<String>,
    pub adapter_candidates: Vec<AdapterCandidate>,
    pub containers: Vec<ContainerFamily>,
    pub textual_types: Vec<TextualType>,
    /// Interface path -> implementers appended after the declared ones.
    pub extra_implementers: BTreeMap<String, Vec<Implementer>>,
    /// Module path generated code uses to reach the wire runtime.
    pub runtime_path: String,
}

/// A user-declared adapter type, e.g. `crate::UuidAdapter` handling `uuid::Uuid`,
/// or `crate::ListAdapter<T>` with `params = ["T"]` handling `LinkedList<T>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterCandidate {
    pub provider: TypePath,
    #[serde(default)]
    pub params: Vec<String>,
    /// Type pattern over `params`.
    pub handles: TypeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerShape {
    List,
    Set,
    Map,
    SparseIndexed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerFamily {
    /// Raw paths this family is recognised by.
    pub aliases: Vec<String>,
    /// Path emitted in generated code.
    pub canonical: String,
    pub shape: ContainerShape,
    /// `canonical` is relative to the runtime module.
    #[serde(default)]
    pub runtime: bool,
    /// Has `with_capacity`.
    #[serde(default)]
    pub presized: bool,
    /// Method that adds one decoded element (or entry).
    pub insert: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    /// `String` itself.
    Native,
    /// Anything built `From<String>`: `Box<str>`, `Rc<str>`, ...
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextualType {
    pub ty: TypeRef,
    pub kind: TextKind,
}

// ————————————————————————————————————————————————————————————————————————————
// DEFAULTS
// ————————————————————————————————————————————————————————————————————————————

fn family(aliases: &[&str], canonical: &str, shape: ContainerShape, presized: bool, insert: &str) -> ContainerFamily {
    ContainerFamily {
        aliases: aliases.iter().map(|s| s.to_string()).collect(),
        canonical: canonical.to_string(),
        shape,
        runtime: false,
        presized,
        insert: insert.to_string(),
    }
}

static DEFAULT_CONTAINERS: Lazy<Vec<ContainerFamily>> = Lazy::new(|| {
    use ContainerShape::*;
    vec![
        family(&["Vec", "std::vec::Vec", "alloc::vec::Vec"], "::std::vec::Vec", List, true, "push"),
        family(&["VecDeque", "std::collections::VecDeque"], "::std::collections::VecDeque", List, true, "push_back"),
        family(&["LinkedList", "std::collections::LinkedList"], "::std::collections::LinkedList", List, false, "push_back"),
        family(&["HashSet", "std::collections::HashSet"], "::std::collections::HashSet", Set, true, "insert"),
        family(&["BTreeSet", "std::collections::BTreeSet"], "::std::collections::BTreeSet", Set, false, "insert"),
        family(&["IndexSet", "indexmap::IndexSet", "indexmap::set::IndexSet"], "::indexmap::IndexSet", Set, true, "insert"),
        family(&["HashMap", "std::collections::HashMap"], "::std::collections::HashMap", Map, true, "insert"),
        family(&["BTreeMap", "std::collections::BTreeMap"], "::std::collections::BTreeMap", Map, false, "insert"),
        family(&["IndexMap", "indexmap::IndexMap", "indexmap::map::IndexMap"], "::indexmap::IndexMap", Map, true, "insert"),
        ContainerFamily {
            runtime: true,
            ..family(&["SparseArray", "wire::SparseArray", "parcel_gen::wire::SparseArray"], "SparseArray", SparseIndexed, true, "put")
        },
    ]
});

static DEFAULT_TEXTUAL: Lazy<Vec<TextualType>> = Lazy::new(|| {
    let native = ["String", "std::string::String", "alloc::string::String"]
        .into_iter()
        .map(|p| TextualType { ty: TypeRef::named(p), kind: TextKind::Native });
    let generic = [
        "Box", "std::boxed::Box",
        "Rc", "std::rc::Rc",
        "Arc", "std::sync::Arc",
    ]
    .into_iter()
    .map(|p| TextualType { ty: TypeRef::generic(p, vec![TypeRef::named("str")]), kind: TextKind::Generic });
    native.chain(generic).collect()
});

impl Default for Config {
    fn default() -> Self {
        Self {
            excluded_annotations: BTreeSet::new(),
            adapter_candidates: Vec::new(),
            containers: DEFAULT_CONTAINERS.clone(),
            textual_types: DEFAULT_TEXTUAL.clone(),
            extra_implementers: BTreeMap::new(),
            runtime_path: DEFAULT_RUNTIME_PATH.to_string(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ContainerShape {
    /// Number of type arguments a family of this shape takes.
    pub fn arity(self) -> usize {
        match self {
            ContainerShape::Map => 2,
            ContainerShape::List | ContainerShape::Set | ContainerShape::SparseIndexed => 1,
        }
    }
}

impl ContainerFamily {
    pub fn recognises(&self, path: &TypePath) -> bool {
        self.aliases.iter().any(|a| path.same_as(a))
    }
}

impl Config {
    pub fn container_family(&self, path: &TypePath) -> Option<&ContainerFamily> {
        self.containers.iter().find(|f| f.recognises(path))
    }

    pub fn textual_kind(&self, ty: &TypeRef) -> Option<TextKind> {
        self.textual_types.iter().find(|t| same_type(&t.ty, ty)).map(|t| t.kind)
    }

    pub fn is_excluded(&self, annotations: &[String]) -> bool {
        annotations.iter().any(|a| self.excluded_annotations.contains(a))
    }

    /// Fold another unit's configuration into this one. Lists are appended
    /// without duplicates, so merge order decides precedence among families.
    pub fn merge(&mut self, other: Config) {
        self.excluded_annotations.extend(other.excluded_annotations);
        for candidate in other.adapter_candidates {
            if !self.adapter_candidates.contains(&candidate) {
                self.adapter_candidates.push(candidate);
            }
        }
        for fam in other.containers {
            if !self.containers.contains(&fam) {
                self.containers.push(fam);
            }
        }
        for text in other.textual_types {
            if !self.textual_types.contains(&text) {
                self.textual_types.push(text);
            }
        }
        for (iface, implementers) in other.extra_implementers {
            self.extra_implementers.entry(iface).or_default().extend(implementers);
        }
        if other.runtime_path != DEFAULT_RUNTIME_PATH {
            self.runtime_path = other.runtime_path;
        }
    }
}

/// Structural equality with paths compared modulo leading `::`.
fn same_type(a: &TypeRef, b: &TypeRef) -> bool {
    match (a, b) {
        (TypeRef::Path { path: pa, args: aa }, TypeRef::Path { path: pb, args: ab }) => {
            pa.same_as(pb.as_str())
                && aa.len() == ab.len()
                && aa.iter().zip(ab).all(|(x, y)| same_type(x, y))
        }
        (TypeRef::Nullable(x), TypeRef::Nullable(y)) | (TypeRef::Array(x), TypeRef::Array(y)) => same_type(x, y),
        (TypeRef::Wildcard(x), TypeRef::Wildcard(y)) => match (x, y) {
            (Some(x), Some(y)) => same_type(x, y),
            (None, None) => true,
            _ => false,
        },
        _ => false,
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_recognise_std_families_by_any_alias() {
        let cfg = Config::default();
        let fam = cfg.container_family(&TypePath::new("::std::collections::HashMap")).unwrap();
        assert_eq!(fam.shape, ContainerShape::Map);
        assert_eq!(fam.shape.arity(), 2);
        assert!(cfg.container_family(&TypePath::new("SparseArray")).unwrap().runtime);
        assert!(cfg.container_family(&TypePath::new("crate::MyList")).is_none());
    }

    #[test]
    fn textual_types_match_structurally() {
        let cfg = Config::default();
        assert_eq!(cfg.textual_kind(&TypeRef::parse("String").unwrap()), Some(TextKind::Native));
        assert_eq!(cfg.textual_kind(&TypeRef::parse("::std::rc::Rc<str>").unwrap()), Some(TextKind::Generic));
        assert_eq!(cfg.textual_kind(&TypeRef::parse("Box<String>").unwrap()), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_value(serde_json::json!({
            "excluded_annotations": ["transient"],
            "adapter_candidates": [
                { "provider": "crate::ListAdapter", "params": ["T"], "handles": "LinkedList<T>" }
            ]
        }))
        .unwrap();
        assert!(cfg.is_excluded(&["transient".to_string()]));
        assert_eq!(cfg.adapter_candidates[0].handles.to_string(), "LinkedList<T>");
        assert_eq!(cfg.containers, Config::default().containers);
        assert_eq!(cfg.runtime_path, DEFAULT_RUNTIME_PATH);
    }

    #[test]
    fn merge_appends_without_duplicates() {
        let mut a = Config::default();
        let mut b = Config::default();
        b.excluded_annotations.insert("skip".into());
        b.runtime_path = "crate::wire".into();
        a.merge(b);
        assert_eq!(a.containers.len(), Config::default().containers.len());
        assert!(a.excluded_annotations.contains("skip"));
        assert_eq!(a.runtime_path, "crate::wire");
    }
}
