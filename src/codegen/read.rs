//! Decoding expressions.
use proc_macro2::TokenStream;
use quote::quote;

use super::Synthesizer;
use crate::config::TextKind;
use crate::lower::{ident, int, path_tokens};
use crate::property::{Property, PropertyKind};

impl Synthesizer<'_> {
    /// An expression decoding one value of the slot's type from `__src`.
    /// Locals it needs are scoped to a block inside the expression.
    pub fn emit_read(&self, property: &Property) -> TokenStream {
        let value = self.read_value(property);
        if !property.nullable {
            return value;
        }
        quote! {
            if __src.read_presence()? {
                ::core::option::Option::Some(#value)
            } else {
                ::core::option::Option::None
            }
        }
    }

    fn read_value(&self, property: &Property) -> TokenStream {
        let rt = self.lower.runtime();
        match &property.kind {
            PropertyKind::Primitive { primitive } | PropertyKind::Boxed { primitive } => {
                let method = ident(&primitive.read_method());
                quote!(__src.#method()?)
            }
            PropertyKind::Textual { text: TextKind::Native } => quote!(__src.read_string()?),
            PropertyKind::Textual { text: TextKind::Generic } => {
                let ty = self.lower.ty(&property.ty);
                quote!(<#ty as ::core::convert::From<::std::string::String>>::from(__src.read_string()?))
            }
            PropertyKind::Array { component } => {
                let size = ident(&property.child_name("size"));
                let name = ident(&property.name);
                let elem_ty = self.lower.ty(&component.slot_ty());
                let elem = self.emit_read(component);
                quote! {{
                    let #size = __src.read_size()?;
                    let mut #name: ::std::vec::Vec<#elem_ty> =
                        ::std::vec::Vec::with_capacity(__src.capacity_hint(#size));
                    for _ in 0..#size {
                        #name.push(#elem);
                    }
                    #name.into_boxed_slice()
                }}
            }
            PropertyKind::Collection { family, item } => {
                let size = ident(&property.child_name("size"));
                let name = ident(&property.name);
                let ty = self.lower.ty(&property.ty);
                let insert = ident(&family.insert);
                let init = allocate(&ty, family.presized, &size);
                let elem = self.emit_read(item);
                quote! {{
                    let #size = __src.read_size()?;
                    let mut #name: #ty = #init;
                    for _ in 0..#size {
                        #name.#insert(#elem);
                    }
                    #name
                }}
            }
            PropertyKind::Map { family, key, value } => {
                let size = ident(&property.child_name("size"));
                let name = ident(&property.name);
                let ty = self.lower.ty(&property.ty);
                let insert = ident(&family.insert);
                let init = allocate(&ty, family.presized, &size);
                let (k, v) = (ident(&key.name), ident(&value.name));
                let (key_expr, value_expr) = (self.emit_read(key), self.emit_read(value));
                quote! {{
                    let #size = __src.read_size()?;
                    let mut #name: #ty = #init;
                    for _ in 0..#size {
                        let #k = #key_expr;
                        let #v = #value_expr;
                        #name.#insert(#k, #v);
                    }
                    #name
                }}
            }
            PropertyKind::SparseIndexedMap { family, value } => {
                let size = ident(&property.child_name("size"));
                let key = ident(&property.child_name("key"));
                let name = ident(&property.name);
                let ty = self.lower.ty(&property.ty);
                let insert = ident(&family.insert);
                let init = allocate(&ty, family.presized, &size);
                let v = ident(&value.name);
                let value_expr = self.emit_read(value);
                quote! {{
                    let #size = __src.read_size()?;
                    let mut #name: #ty = #init;
                    for _ in 0..#size {
                        let #key = __src.read_i32()?;
                        let #v = #value_expr;
                        #name.#insert(#key, #v);
                    }
                    #name
                }}
            }
            PropertyKind::Enumerated { path, variants } => {
                let type_name = path.as_str();
                let path = path_tokens(type_name);
                let arms = variants.iter().enumerate().map(|(ordinal, variant)| {
                    let variant = ident(variant);
                    let ordinal = int(ordinal as i32);
                    quote!(#ordinal => #path::#variant,)
                });
                quote! {
                    match __src.read_i32()? {
                        #(#arms)*
                        __ordinal => {
                            return ::core::result::Result::Err(#rt::WireError::UnknownOrdinal {
                                type_name: #type_name,
                                ordinal: __ordinal,
                            })
                        }
                    }
                }
            }
            PropertyKind::NestedDataClass { class, pointer } => {
                let (_, routine, needs_ctx) = self.routines(class);
                let routine = ident(&routine);
                let call = if needs_ctx { quote!(#routine(__src, __ctx)?) } else { quote!(#routine(__src)?) };
                match pointer {
                    Some(pointer) => {
                        let pointer = path_tokens(pointer.canonical());
                        quote!(#pointer::new(#call))
                    }
                    None => call,
                }
            }
            PropertyKind::PolymorphicInterface { interface, implementers, fallback } => {
                let type_name = interface.as_str();
                let iface = path_tokens(type_name);
                let arms = implementers.iter().map(|imp| {
                    let variant = ident(&imp.variant);
                    let tag = int(imp.tag);
                    let payload = self.emit_read(&imp.property);
                    quote!(#tag => #iface::#variant(#payload),)
                });
                let fallback = fallback.as_ref().map(|variant| {
                    let variant = ident(variant);
                    let tag = int(crate::wire::FALLBACK_TAG);
                    quote!(#tag => #iface::#variant(#rt::Value::read_from(__src, __ctx)?),)
                });
                quote! {
                    match __src.read_tag()? {
                        #(#arms)*
                        #fallback
                        __tag => {
                            return ::core::result::Result::Err(#rt::WireError::UnknownTypeTag {
                                type_name: #type_name,
                                tag: __tag,
                            })
                        }
                    }
                }
            }
            PropertyKind::AdapterDelegated { adapter } => {
                let handle = ident(&adapter.ident);
                let adapter_ty = self.adapter_ty(adapter);
                let ty = self.lower.ty(&property.ty);
                quote!(<#adapter_ty as #rt::TypeAdapter<#ty>>::read(&*#handle, __src, __ctx)?)
            }
        }
    }
}

fn allocate(ty: &TokenStream, presized: bool, size: &proc_macro2::Ident) -> TokenStream {
    if presized {
        quote!(<#ty>::with_capacity(__src.capacity_hint(#size)))
    } else {
        quote!(<#ty>::new())
    }
}
