//! Code synthesis: resolved classes to `write_*`/`read_*` routines.
//!
//! Generated code expects the wire runtime at `config.runtime_path` and every
//! class, enum, interface and adapter type reachable by the paths the unit
//! declares. Output for one unit is a single token stream: adapter statics
//! first, then each class's routine pair in unit order.
mod read;
mod write;

use proc_macro2::TokenStream;
use quote::quote;
use rayon::prelude::*;

use crate::ir::TypePath;
use crate::lower::{ident, path_tokens, Lowering};
use crate::registry::AdapterHandle;
use crate::resolve::{ResolvedClass, ResolvedUnit};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Turns one resolved unit into source text.
pub struct Codegen<'u> {
    unit: &'u ResolvedUnit,
    out: String,
}

/// Per-thread emitter. Token streams are not `Send`, so each worker lowers
/// with its own instance and hands back rendered text.
pub struct Synthesizer<'u> {
    unit: &'u ResolvedUnit,
    lower: Lowering<'u>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<'u> Codegen<'u> {
    pub fn new(unit: &'u ResolvedUnit) -> Self {
        Self { unit, out: String::new() }
    }

    pub fn emit(&mut self) {
        let synth = Synthesizer::new(self.unit);
        let adapters = self.unit.adapters();
        log::debug!("emitting {} class(es), {} adapter(s)", self.unit.classes.len(), adapters.len());

        let statics = adapters.iter().map(|a| synth.adapter_static(a));
        self.out.push_str(&quote!(#(#statics)*).to_string());

        // Order is preserved by `collect`, so output does not depend on scheduling.
        let unit = self.unit;
        let routines: Vec<String> = unit
            .classes
            .par_iter()
            .map(|class| {
                let synth = Synthesizer::new(unit);
                let (write, read) = synth.emit_class(class);
                log::trace!("emitted {} / {}", class.write_routine, class.read_routine);
                quote!(#write #read).to_string()
            })
            .collect();

        for routine in routines {
            if !self.out.is_empty() {
                self.out.push('\n');
            }
            self.out.push_str(&routine);
        }
        log::info!("generated {} routine pair(s), {} byte(s) of source", self.unit.classes.len(), self.out.len());
    }

    pub fn into_string(self) -> String { self.out }
}

impl<'u> Synthesizer<'u> {
    pub fn new(unit: &'u ResolvedUnit) -> Self {
        Self { unit, lower: Lowering::new(&unit.config) }
    }

    /// The `write_*` and `read_*` functions for one class.
    pub fn emit_class(&self, class: &ResolvedClass) -> (TokenStream, TokenStream) {
        (self.emit_write_routine(class), self.emit_read_routine(class))
    }

    fn emit_write_routine(&self, class: &ResolvedClass) -> TokenStream {
        let rt = self.lower.runtime();
        let routine = ident(&class.write_routine);
        let class_ty = path_tokens(class.path.as_str());
        let doc = format!(" Encode a `{}`.", class.path.last_segment());

        let fields = class.fields.iter().filter_map(|field| {
            let property = field.property.as_ref()?;
            let local = ident(&property.name);
            let slot_ty = self.lower.ty(&property.slot_ty());
            let access = match &field.getter {
                Some(getter) => {
                    let getter = ident(getter);
                    quote!(__value.#getter())
                }
                None => {
                    let member = member(&field.member);
                    quote!(&__value.#member)
                }
            };
            let body = self.emit_write(property, &quote!(#local));
            Some(quote! {
                {
                    let #local: &#slot_ty = #access;
                    #body
                }
            })
        });

        quote! {
            #[doc = #doc]
            pub fn #routine(
                __value: &#class_ty,
                __dest: &mut #rt::ParcelWriter,
            ) -> ::core::result::Result<(), #rt::WireError> {
                #(#fields)*
                ::core::result::Result::Ok(())
            }
        }
    }

    fn emit_read_routine(&self, class: &ResolvedClass) -> TokenStream {
        let rt = self.lower.runtime();
        let routine = ident(&class.read_routine);
        let class_ty = path_tokens(class.path.as_str());
        let doc = format!(" Decode a `{}`.", class.path.last_segment());
        let ctx_param = class.requires_context.then(|| quote!(, __ctx: &#rt::DecodeContext));

        let reads = class.fields.iter().filter_map(|field| {
            let property = field.property.as_ref()?;
            let local = ident(&property.name);
            let slot_ty = self.lower.ty(&property.slot_ty());
            let expr = self.emit_read(property);
            Some(quote!(let #local: #slot_ty = #expr;))
        });
        let values: Vec<TokenStream> = class
            .fields
            .iter()
            .map(|field| match &field.property {
                Some(property) => {
                    let local = ident(&property.name);
                    quote!(#local)
                }
                None => quote!(::core::default::Default::default()),
            })
            .collect();

        let construct = if class.singleton {
            quote!(#class_ty)
        } else if class.tuple {
            quote!(#class_ty(#(#values),*))
        } else {
            let members = class.fields.iter().map(|f| member(&f.member));
            quote!(#class_ty { #(#members: #values),* })
        };

        quote! {
            #[doc = #doc]
            pub fn #routine(
                __src: &mut #rt::ParcelReader<'_>
                #ctx_param
            ) -> ::core::result::Result<#class_ty, #rt::WireError> {
                #(#reads)*
                ::core::result::Result::Ok(#construct)
            }
        }
    }

    fn adapter_static(&self, adapter: &AdapterHandle) -> TokenStream {
        let handle = ident(&adapter.ident);
        let adapter_ty = self.adapter_ty(adapter);
        quote! {
            static #handle: ::std::sync::LazyLock<#adapter_ty> =
                ::std::sync::LazyLock::new(|| ::core::default::Default::default());
        }
    }

    fn adapter_ty(&self, adapter: &AdapterHandle) -> TokenStream {
        let provider = path_tokens(adapter.key.provider.as_str());
        if adapter.key.args.is_empty() {
            return provider;
        }
        let args = adapter.key.args.iter().map(|a| self.lower.ty(a));
        quote!(#provider<#(#args),*>)
    }

    /// `(write, read, read takes a context)` for a class of this unit.
    fn routines(&self, class: &TypePath) -> (String, String, bool) {
        match self.unit.class(class) {
            Some(c) => (c.write_routine.clone(), c.read_routine.clone(), c.requires_context),
            // Resolution only produces nested references to classes it resolved.
            None => {
                let stem = crate::model::snake_case(class.last_segment());
                (format!("write_{stem}"), format!("read_{stem}"), false)
            }
        }
    }
}

/// A struct member: named, or positional in a tuple struct.
fn member(name: &str) -> TokenStream {
    match name.parse::<u32>() {
        Ok(index) => {
            let index = syn::Index::from(index as usize);
            quote!(#index)
        }
        Err(_) => {
            let name = ident(name);
            quote!(#name)
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TypeRef;
    use crate::model::{ClassModel, EnumDecl, UnitModel};
    use crate::resolve::resolve_unit;

    fn ty(src: &str) -> TypeRef { TypeRef::parse(src).unwrap() }

    fn generate(unit: &UnitModel) -> String {
        let resolved = resolve_unit(unit).unwrap();
        let mut cg = Codegen::new(&resolved);
        cg.emit();
        cg.into_string()
    }

    fn compact(code: &str) -> String {
        code.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn output_parses_as_rust() {
        let mut unit = UnitModel::default();
        unit.enums.push(EnumDecl { path: TypePath::new("crate::Kind"), variants: vec!["A".into(), "B".into()] });
        unit.classes.push(
            ClassModel::new("crate::Everything")
                .with_field("n", ty("i32"))
                .with_field("maybe", ty("Option<u8>"))
                .with_field("name", ty("String"))
                .with_field("tags", ty("std::collections::BTreeSet<Box<str>>"))
                .with_field("grid", ty("Box<[Box<[f64]>]>"))
                .with_field("lookup", ty("HashMap<String, Option<crate::Kind>>"))
                .with_field("sparse", ty("SparseArray<Vec<i64>>"))
                .with_field("next", ty("Option<Box<crate::Everything>>")),
        );
        let code = generate(&unit);
        let file = syn::parse_file(&code).unwrap_or_else(|err| panic!("{err}\n{code}"));
        assert_eq!(file.items.len(), 2);
    }

    #[test]
    fn raw_variant_names_emit_valid_code() {
        use crate::model::{Implementer, InterfaceDecl};
        let mut unit = UnitModel::default();
        unit.interfaces.push(InterfaceDecl {
            path: crate::ir::TypePath::new("crate::Step"),
            implementers: vec![Implementer { variant: "r#Move".into(), class: crate::ir::TypePath::new("crate::Move") }],
            fallback: None,
        });
        unit.classes.push(ClassModel::new("crate::Holder").with_field("s", ty("crate::Step")));
        unit.classes.push(ClassModel::new("crate::Move").with_field("dx", ty("i32")));
        let code = generate(&unit);
        syn::parse_file(&code).unwrap_or_else(|err| panic!("{err}\n{code}"));
        assert!(compact(&code).contains("crate::Step::r#Move(s_move)"), "{code}");
    }

    #[test]
    fn emission_is_deterministic() {
        let unit = UnitModel {
            classes: (0..16)
                .map(|i| ClassModel::new(&format!("crate::C{i}")).with_field("xs", ty("Vec<Option<String>>")))
                .collect(),
            ..UnitModel::default()
        };
        let first = generate(&unit);
        for _ in 0..4 {
            assert_eq!(generate(&unit), first);
        }
        let c3 = first.find("write_c3").unwrap();
        let c12 = first.find("write_c12").unwrap();
        assert!(c3 < c12);
    }

    #[test]
    fn nullable_slots_write_presence_before_the_value() {
        let unit = UnitModel {
            classes: vec![ClassModel::new("crate::A").with_field("x", ty("Option<i32>"))],
            ..UnitModel::default()
        };
        let code = compact(&generate(&unit));
        assert!(code.contains("Some(x)=>{__dest.write_presence(true);__dest.write_i32(*x);}"), "{code}");
        assert!(code.contains("None=>__dest.write_presence(false)"), "{code}");
        assert!(code.contains("if__src.read_presence()?{::core::option::Option::Some(__src.read_i32()?)}"), "{code}");
    }

    #[test]
    fn context_parameter_only_when_needed() {
        let mut unit = UnitModel {
            classes: vec![
                ClassModel::new("crate::Plain").with_field("x", ty("i32")),
                ClassModel::new("crate::Fancy").with_field("t", ty("crate::Tree<i32>")),
            ],
            ..UnitModel::default()
        };
        unit.config.adapter_candidates.push(crate::config::AdapterCandidate {
            provider: TypePath::new("crate::TreeAdapter"),
            params: vec!["T".into()],
            handles: ty("crate::Tree<T>"),
        });
        let code = compact(&generate(&unit));
        assert!(code.contains("pubfnread_plain(__src:&mut::parcel_gen::wire::ParcelReader<'_>)"), "{code}");
        assert!(code.contains("__ctx:&::parcel_gen::wire::DecodeContext"), "{code}");
        assert_eq!(code.matches("staticTREE_ADAPTER_I32").count(), 1);
    }

    #[test]
    fn excluded_fields_default_on_read() {
        let mut class = ClassModel::new("crate::A").with_field("keep", ty("i32")).with_field("drop", ty("i32"));
        class.fields[1].annotations.push("skip".into());
        let mut unit = UnitModel { classes: vec![class], ..UnitModel::default() };
        unit.config.excluded_annotations.insert("skip".into());
        let code = compact(&generate(&unit));
        assert!(code.contains("crate::A{keep:keep,drop:::core::default::Default::default()}"), "{code}");
        assert!(!code.contains("__value.drop"), "{code}");
    }

    #[test]
    fn tuple_and_singleton_shapes() {
        let mut unit_struct = ClassModel::new("crate::Marker");
        unit_struct.singleton = true;
        let unit = UnitModel {
            classes: vec![
                ClassModel::new("crate::Pair").with_field("0", ty("i32")).with_field("1", ty("String")),
                unit_struct,
            ],
            ..UnitModel::default()
        };
        let code = compact(&generate(&unit));
        assert!(code.contains("letfield_0:&i32=&__value.0;"), "{code}");
        assert!(code.contains("Ok(crate::Pair(field_0,field_1))"), "{code}");
        assert!(code.contains("Ok(crate::Marker)"), "{code}");
    }
}
