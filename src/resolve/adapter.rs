//! Matching adapter candidates against field types.
//!
//! A candidate's `handles` pattern mentions its type parameters as bare names.
//! Unifying the pattern with a field type binds every parameter to a concrete
//! type; those bindings become the adapter's identity arguments.
use std::collections::HashMap;

use crate::config::AdapterCandidate;
use crate::ir::TypeRef;

pub(crate) enum Match {
    /// The pattern's outer shape differs; try the next candidate.
    NotApplicable,
    /// Same outer type, but the arguments do not fit.
    Mismatch(String),
    Bound(Vec<TypeRef>),
}

pub(crate) fn match_candidate(candidate: &AdapterCandidate, ty: &TypeRef) -> Match {
    let ty = ty.normalized();
    if !same_head(&candidate.handles, &ty, &candidate.params) {
        return Match::NotApplicable;
    }

    let mut bindings = HashMap::new();
    if let Err(reason) = unify(&candidate.handles, &ty, &candidate.params, &mut bindings) {
        return Match::Mismatch(reason);
    }

    let mut args = Vec::with_capacity(candidate.params.len());
    for param in &candidate.params {
        match bindings.remove(param.as_str()) {
            Some(bound) => args.push(bound),
            None => return Match::Mismatch(format!("parameter `{param}` does not occur in `{}`", candidate.handles)),
        }
    }
    Match::Bound(args)
}

fn same_head(pattern: &TypeRef, ty: &TypeRef, params: &[String]) -> bool {
    match (pattern, ty) {
        (TypeRef::Path { path, args }, _) if args.is_empty() && is_param(path.as_str(), params) => true,
        (TypeRef::Path { path: pp, .. }, TypeRef::Path { path: tp, .. }) => pp.same_as(tp.as_str()),
        (TypeRef::Nullable(_), TypeRef::Nullable(_)) | (TypeRef::Array(_), TypeRef::Array(_)) => true,
        (TypeRef::Wildcard(_), _) => true,
        _ => false,
    }
}

fn unify<'p>(
    pattern: &'p TypeRef,
    ty: &TypeRef,
    params: &'p [String],
    bindings: &mut HashMap<&'p str, TypeRef>,
) -> Result<(), String> {
    match (pattern, ty) {
        (TypeRef::Path { path, args }, _) if args.is_empty() && is_param(path.as_str(), params) => {
            let name = path.as_str();
            match bindings.get(name) {
                Some(prev) if prev != ty => {
                    Err(format!("parameter `{name}` would be both `{prev}` and `{ty}`"))
                }
                Some(_) => Ok(()),
                None => {
                    bindings.insert(name, ty.clone());
                    Ok(())
                }
            }
        }
        (TypeRef::Path { path: pp, args: pa }, TypeRef::Path { path: tp, args: ta }) if pp.same_as(tp.as_str()) => {
            if pa.len() != ta.len() {
                return Err(format!("`{pp}` is handled with {} type argument(s), the field has {}", pa.len(), ta.len()));
            }
            pa.iter().zip(ta).try_for_each(|(p, t)| unify(p, t, params, bindings))
        }
        (TypeRef::Nullable(p), TypeRef::Nullable(t)) | (TypeRef::Array(p), TypeRef::Array(t)) => {
            unify(p, t, params, bindings)
        }
        (TypeRef::Wildcard(_), _) => Ok(()),
        _ => Err(format!("`{ty}` does not fit `{pattern}`")),
    }
}

fn is_param(name: &str, params: &[String]) -> bool {
    params.iter().any(|p| p == name)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TypePath;

    fn candidate(params: &[&str], handles: &str) -> AdapterCandidate {
        AdapterCandidate {
            provider: TypePath::new("crate::A"),
            params: params.iter().map(|p| p.to_string()).collect(),
            handles: TypeRef::parse(handles).unwrap(),
        }
    }

    fn ty(src: &str) -> TypeRef { TypeRef::parse(src).unwrap() }

    #[test]
    fn parameters_bind_to_field_arguments() {
        let c = candidate(&["K", "V"], "crate::Table<K, V>");
        match match_candidate(&c, &ty("crate::Table<String, Option<i32>>")) {
            Match::Bound(args) => assert_eq!(args, vec![ty("String"), ty("Option<i32>")]),
            _ => panic!("expected a binding"),
        }
    }

    #[test]
    fn repeated_parameter_must_agree() {
        let c = candidate(&["T"], "crate::Pair<T, T>");
        assert!(matches!(match_candidate(&c, &ty("crate::Pair<i32, i32>")), Match::Bound(_)));
        assert!(matches!(match_candidate(&c, &ty("crate::Pair<i32, i64>")), Match::Mismatch(_)));
    }

    #[test]
    fn arity_difference_is_a_mismatch_not_a_miss() {
        let c = candidate(&["T"], "crate::Tree<T>");
        assert!(matches!(match_candidate(&c, &ty("crate::Tree<i32, i32>")), Match::Mismatch(_)));
        assert!(matches!(match_candidate(&c, &ty("crate::Forest<i32>")), Match::NotApplicable));
    }

    #[test]
    fn field_wildcards_unify_through_their_bound() {
        let c = candidate(&["T"], "crate::Tree<T>");
        match match_candidate(&c, &ty("crate::Tree<impl crate::Shape>")) {
            Match::Bound(args) => assert_eq!(args, vec![ty("crate::Shape")]),
            _ => panic!("expected a binding"),
        }
    }

    #[test]
    fn unused_parameter_is_reported() {
        let c = candidate(&["T", "U"], "crate::Tree<T>");
        assert!(matches!(match_candidate(&c, &ty("crate::Tree<i32>")), Match::Mismatch(_)));
    }
}
