//! Lowering IR names into tokens for generated code.
//!
//! Paths are rendered canonically: container families by their canonical
//! path, runtime families under the configured runtime module, std wrappers
//! fully qualified. Anything else is emitted exactly as declared.
use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::quote;

use crate::config::Config;
use crate::ir::{TypePath, TypeRef};
use crate::property::Pointer;

const STRING_PATHS: &[&str] = &["String", "std::string::String", "alloc::string::String"];

pub struct Lowering<'c> {
    config: &'c Config,
    runtime: TokenStream,
}

impl<'c> Lowering<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config, runtime: path_tokens(&config.runtime_path) }
    }

    /// Path of the wire runtime module.
    pub fn runtime(&self) -> &TokenStream { &self.runtime }

    pub fn ty(&self, ty: &TypeRef) -> TokenStream {
        match ty.upper_bound() {
            TypeRef::Path { path, args } => {
                let path = self.path(path);
                if args.is_empty() {
                    path
                } else {
                    let args = args.iter().map(|a| self.ty(a));
                    quote!(#path<#(#args),*>)
                }
            }
            TypeRef::Nullable(inner) => {
                let inner = self.ty(inner);
                quote!(::core::option::Option<#inner>)
            }
            TypeRef::Array(elem) => {
                let elem = self.ty(elem);
                quote!(::std::boxed::Box<[#elem]>)
            }
            TypeRef::Wildcard(_) => quote!(_),
        }
    }

    pub fn path(&self, path: &TypePath) -> TokenStream {
        if let Some(family) = self.config.container_family(path) {
            let canonical = path_tokens(&family.canonical);
            if family.runtime {
                let runtime = &self.runtime;
                return quote!(#runtime::#canonical);
            }
            return canonical;
        }
        if path.is_any_of(STRING_PATHS) {
            return quote!(::std::string::String);
        }
        if let Some(pointer) = Pointer::from_path(path) {
            return path_tokens(pointer.canonical());
        }
        path_tokens(path.as_str())
    }
}

/// `a::b::C` or `::a::b::C` as tokens. Segments must already be valid
/// identifiers; units are validated before anything is lowered.
pub fn path_tokens(path: &str) -> TokenStream {
    let global = path.trim_start().starts_with("::");
    let segments = path.split("::").map(str::trim).filter(|s| !s.is_empty()).map(ident);
    if global {
        quote!(#(::#segments)*)
    } else {
        quote!(#(#segments)::*)
    }
}

/// Identifier tokens, honouring the `r#` prefix.
pub fn ident(name: &str) -> Ident {
    match name.strip_prefix("r#") {
        Some(raw) => Ident::new_raw(raw, Span::call_site()),
        None => Ident::new(name, Span::call_site()),
    }
}

pub fn int(value: i32) -> Literal {
    Literal::i32_unsuffixed(value)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn render(src: &str) -> String {
        let cfg = Config::default();
        Lowering::new(&cfg).ty(&TypeRef::parse(src).unwrap()).to_string()
    }

    #[test]
    fn families_render_canonically() {
        assert_eq!(render("HashMap<String, Vec<i32>>"), quote!(::std::collections::HashMap<::std::string::String, ::std::vec::Vec<i32> >).to_string());
        assert_eq!(render("SparseArray<u8>"), quote!(::parcel_gen::wire::SparseArray<u8>).to_string());
    }

    #[test]
    fn sugar_renders_fully_qualified() {
        assert_eq!(
            render("Option<Box<[Rc<str>]>>"),
            quote!(::core::option::Option<::std::boxed::Box<[::std::rc::Rc<str> ]> >).to_string()
        );
        assert_eq!(render("crate::model::Point"), quote!(crate::model::Point).to_string());
        assert_eq!(render("Vec<impl crate::Shape>"), quote!(::std::vec::Vec<crate::Shape>).to_string());
    }

    #[test]
    fn raw_identifiers_survive() {
        assert_eq!(ident("r#type").to_string(), "r#type");
        assert_eq!(path_tokens("crate::r#mod::X").to_string(), quote!(crate::r#mod::X).to_string());
    }
}
