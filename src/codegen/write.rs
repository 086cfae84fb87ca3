//! Encoding statements.
use proc_macro2::TokenStream;
use quote::quote;

use super::Synthesizer;
use crate::lower::{ident, int, path_tokens};
use crate::property::{Property, PropertyKind};

impl Synthesizer<'_> {
    /// Statements writing `src` (an expression of type `&T`, or
    /// `&Option<T>` for a nullable slot) to `__dest`.
    pub fn emit_write(&self, property: &Property, src: &TokenStream) -> TokenStream {
        if !property.nullable {
            return self.write_value(property, src);
        }
        let inner = ident(&property.name);
        let body = self.write_value(property, &quote!(#inner));
        quote! {
            match #src {
                ::core::option::Option::Some(#inner) => {
                    __dest.write_presence(true);
                    #body
                }
                ::core::option::Option::None => __dest.write_presence(false),
            }
        }
    }

    fn write_value(&self, property: &Property, src: &TokenStream) -> TokenStream {
        let rt = self.lower.runtime();
        match &property.kind {
            PropertyKind::Primitive { primitive } | PropertyKind::Boxed { primitive } => {
                let method = ident(&primitive.write_method());
                quote!(__dest.#method(*#src);)
            }
            PropertyKind::Textual { .. } => quote!(__dest.write_str(#src)?;),
            PropertyKind::Array { component } | PropertyKind::Collection { item: component, .. } => {
                let item = ident(&component.name);
                let body = self.emit_write(component, &quote!(#item));
                quote! {
                    __dest.write_size(#src.len())?;
                    for #item in #src.iter() {
                        #body
                    }
                }
            }
            PropertyKind::Map { key, value, .. } => {
                let (k, v) = (ident(&key.name), ident(&value.name));
                let key_body = self.emit_write(key, &quote!(#k));
                let value_body = self.emit_write(value, &quote!(#v));
                quote! {
                    __dest.write_size(#src.len())?;
                    for (#k, #v) in #src.iter() {
                        #key_body
                        #value_body
                    }
                }
            }
            PropertyKind::SparseIndexedMap { value, .. } => {
                let size = ident(&property.child_name("size"));
                let index = ident(&property.child_name("index"));
                let key = ident(&property.child_name("key"));
                let v = ident(&value.name);
                let value_body = self.emit_write(value, &quote!(#v));
                quote! {
                    let #size = #src.len();
                    __dest.write_size(#size)?;
                    for #index in 0..#size {
                        let #key = #src.key_at(#index);
                        __dest.write_i32(#key);
                        let #v = #src.value_at(#index);
                        #value_body
                    }
                }
            }
            PropertyKind::Enumerated { path, variants } => {
                let path = path_tokens(path.as_str());
                let arms = variants.iter().enumerate().map(|(ordinal, variant)| {
                    let variant = ident(variant);
                    let ordinal = int(ordinal as i32);
                    quote!(#path::#variant => #ordinal,)
                });
                quote!(__dest.write_i32(match #src { #(#arms)* });)
            }
            PropertyKind::NestedDataClass { class, .. } => {
                let routine = ident(&self.routines(class).0);
                quote!(#routine(#src, __dest)?;)
            }
            PropertyKind::PolymorphicInterface { interface, implementers, fallback } => {
                let iface = path_tokens(interface.as_str());
                let arms = implementers.iter().map(|imp| {
                    let variant = ident(&imp.variant);
                    let payload = ident(&imp.property.name);
                    let tag = int(imp.tag);
                    let body = self.emit_write(&imp.property, &quote!(#payload));
                    quote! {
                        #iface::#variant(#payload) => {
                            __dest.write_tag(#tag);
                            #body
                        }
                    }
                });
                let fallback = fallback.as_ref().map(|variant| {
                    let variant = ident(variant);
                    let payload = ident(&property.child_name("fallback"));
                    quote! {
                        #iface::#variant(#payload) => {
                            __dest.write_tag(#rt::FALLBACK_TAG);
                            #rt::Value::write_to(#payload, __dest)?;
                        }
                    }
                });
                quote! {
                    match #src {
                        #(#arms)*
                        #fallback
                    }
                }
            }
            PropertyKind::AdapterDelegated { adapter } => {
                let handle = ident(&adapter.ident);
                let adapter_ty = self.adapter_ty(adapter);
                let ty = self.lower.ty(&property.ty);
                quote!(<#adapter_ty as #rt::TypeAdapter<#ty>>::write(&*#handle, #src, __dest)?;)
            }
        }
    }
}
