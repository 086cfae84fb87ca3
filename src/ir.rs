// Static type IR consumed by property resolution. No syn types leak past `parse`.

use std::fmt;

use serde::{Deserialize, Serialize};
use syn::{GenericArgument, PathArguments, TypeParamBound};
use thiserror::Error;

const OPTION_PATHS: &[&str] = &["Option", "core::option::Option", "std::option::Option"];
const BOX_PATHS: &[&str] = &["Box", "std::boxed::Box", "alloc::boxed::Box"];

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A `::`-separated type path, compared without its leading `::`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypePath(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// `Vec<T>`, `crate::model::Point`, `i32`, ...
    Path { path: TypePath, args: Vec<TypeRef> },
    /// `Option<T>`: the slot may be empty.
    Nullable(Box<TypeRef>),
    /// `Box<[T]>`
    Array(Box<TypeRef>),
    /// `_` or `impl Bound`: an anonymous type known only through its upper bound.
    Wildcard(Option<Box<TypeRef>>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid type `{input}`: {reason}")]
pub struct TypeParseError {
    pub input: String,
    pub reason: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypePath {
    pub fn new(path: impl Into<String>) -> Self {
        let path: String = path.into();
        Self(path.chars().filter(|c| !c.is_whitespace()).collect())
    }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split("::").filter(|s| !s.is_empty())
    }

    pub fn last_segment(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    /// Same path, ignoring a leading `::`.
    pub fn same_as(&self, other: &str) -> bool {
        self.0.trim_start_matches("::") == other.trim_start_matches("::")
    }

    pub fn is_any_of(&self, candidates: &[&str]) -> bool {
        candidates.iter().any(|c| self.same_as(c))
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for TypePath {
    fn from(value: &str) -> Self { Self::new(value) }
}

impl TypeRef {
    pub fn parse(input: &str) -> Result<TypeRef, TypeParseError> {
        let fail = |reason: String| TypeParseError { input: input.to_string(), reason };
        let ty = syn::parse_str::<syn::Type>(input).map_err(|e| fail(e.to_string()))?;
        from_syn(&ty).map_err(fail)
    }

    /// A plain path with no type arguments.
    pub fn named(path: &str) -> TypeRef {
        TypeRef::Path { path: TypePath::new(path), args: Vec::new() }
    }

    pub fn generic(path: &str, args: Vec<TypeRef>) -> TypeRef {
        TypeRef::Path { path: TypePath::new(path), args }
    }

    pub fn raw_path(&self) -> Option<&TypePath> {
        match self {
            TypeRef::Path { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Path { args, .. } => args,
            _ => &[],
        }
    }

    /// Peel wildcards down to their upper bound. An unbounded wildcard stays as is.
    pub fn upper_bound(&self) -> &TypeRef {
        match self {
            TypeRef::Wildcard(Some(bound)) => bound.upper_bound(),
            other => other,
        }
    }

    /// Structural normal form: every bounded wildcard replaced by its bound.
    pub fn normalized(&self) -> TypeRef {
        match self.upper_bound() {
            TypeRef::Path { path, args } => TypeRef::Path {
                path: path.clone(),
                args: args.iter().map(TypeRef::normalized).collect(),
            },
            TypeRef::Nullable(inner) => TypeRef::Nullable(Box::new(inner.normalized())),
            TypeRef::Array(elem) => TypeRef::Array(Box::new(elem.normalized())),
            TypeRef::Wildcard(bound) => TypeRef::Wildcard(bound.clone()),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Path { path, args } => {
                write!(f, "{path}")?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 { f.write_str(", ")?; }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Nullable(inner) => write!(f, "Option<{inner}>"),
            TypeRef::Array(elem) => write!(f, "Box<[{elem}]>"),
            TypeRef::Wildcard(None) => f.write_str("_"),
            TypeRef::Wildcard(Some(bound)) => write!(f, "impl {bound}"),
        }
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeParseError;
    fn try_from(value: String) -> Result<Self, Self::Error> { TypeRef::parse(&value) }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self { value.to_string() }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn from_syn(ty: &syn::Type) -> Result<TypeRef, String> {
    match ty {
        syn::Type::Paren(p) => from_syn(&p.elem),
        syn::Type::Group(g) => from_syn(&g.elem),
        syn::Type::Infer(_) => Ok(TypeRef::Wildcard(None)),
        syn::Type::ImplTrait(it) => {
            let mut bounds = it.bounds.iter().filter_map(|b| match b {
                TypeParamBound::Trait(t) => Some(t),
                _ => None,
            });
            match (bounds.next(), bounds.next()) {
                (Some(bound), None) => Ok(TypeRef::Wildcard(Some(Box::new(from_path(&bound.path)?)))),
                _ => Err("`impl` must name exactly one upper bound".into()),
            }
        }
        syn::Type::Path(tp) => {
            if tp.qself.is_some() {
                return Err("qualified paths (`<T as Trait>::X`) are not supported".into());
            }
            from_path(&tp.path)
        }
        syn::Type::Slice(_) => Err("bare slices are unsized; use `Box<[T]>`".into()),
        syn::Type::Array(_) => Err("fixed-size arrays are not supported; use `Box<[T]>`".into()),
        syn::Type::Reference(_) => Err("references cannot be decoded into; use an owned type".into()),
        syn::Type::Tuple(_) => Err("tuples are not supported".into()),
        _ => Err("unsupported type syntax".into()),
    }
}

fn from_path(path: &syn::Path) -> Result<TypeRef, String> {
    let last = path.segments.len().saturating_sub(1);
    let mut segments = Vec::with_capacity(path.segments.len());
    let mut syn_args = Vec::<&syn::Type>::new();

    for (i, seg) in path.segments.iter().enumerate() {
        segments.push(seg.ident.to_string());
        match &seg.arguments {
            PathArguments::None => {}
            PathArguments::AngleBracketed(ab) if i == last => {
                for arg in &ab.args {
                    match arg {
                        GenericArgument::Type(t) => syn_args.push(t),
                        GenericArgument::Lifetime(_) => {}
                        _ => return Err(format!("unsupported generic argument on `{}`", seg.ident)),
                    }
                }
            }
            _ => return Err(format!("unexpected arguments on path segment `{}`", seg.ident)),
        }
    }

    let mut joined = segments.join("::");
    if path.leading_colon.is_some() {
        joined.insert_str(0, "::");
    }
    let path = TypePath::new(joined);

    // Box<[T]> is the array spelling; the slice inside is only legal here.
    if path.is_any_of(BOX_PATHS) && syn_args.len() == 1 {
        if let syn::Type::Slice(slice) = syn_args[0] {
            return Ok(TypeRef::Array(Box::new(from_syn(&slice.elem)?)));
        }
    }

    let args = syn_args.into_iter().map(from_syn).collect::<Result<Vec<_>, _>>()?;

    if path.is_any_of(OPTION_PATHS) {
        let mut args = args;
        return match (args.pop(), args.is_empty()) {
            (Some(TypeRef::Nullable(_)), _) => Err("`Option<Option<T>>` has no distinct encoding".into()),
            (Some(inner), true) => Ok(TypeRef::Nullable(Box::new(inner))),
            _ => Err("`Option` takes exactly one type argument".into()),
        };
    }

    Ok(TypeRef::Path { path, args })
}

// ------------------------------- Tests ------------------------------------ //
