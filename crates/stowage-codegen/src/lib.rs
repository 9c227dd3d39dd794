// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, parse_quote, Data, DataEnum, DeriveInput, Field, Fields, Generics, Ident,
    Index, LitStr, Member,
};

/// Field options parsed from `#[stowage(...)]`
#[derive(Default)]
struct FieldOptions {
    /// Never serialized; default-constructed when an enum variant is rebuilt
    skip: bool,
    /// Visited by the partial traversal routine
    partial: bool,
}

/// Construction strategy selected by `#[stowage(reconstruct = "...")]`
enum Strategy {
    Default,
    Intrinsic,
    External,
}

fn field_options(field: &Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("stowage") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("partial") {
                options.partial = true;
                Ok(())
            } else {
                Err(meta.error("expected `skip` or `partial`"))
            }
        })?;
    }
    if options.skip && options.partial {
        return Err(syn::Error::new_spanned(
            field,
            "a field cannot be both `skip` and `partial`",
        ));
    }
    Ok(options)
}

fn strategy(input: &DeriveInput) -> syn::Result<Strategy> {
    let mut strategy = Strategy::Default;
    for attr in &input.attrs {
        if !attr.path().is_ident("stowage") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("reconstruct") {
                return Err(meta.error("expected `reconstruct = \"...\"`"));
            }
            let value: LitStr = meta.value()?.parse()?;
            strategy = match value.value().as_str() {
                "default" => Strategy::Default,
                "intrinsic" => Strategy::Intrinsic,
                "external" => Strategy::External,
                _ => {
                    return Err(syn::Error::new_spanned(
                        &value,
                        "expected \"default\", \"intrinsic\" or \"external\"",
                    ))
                }
            };
            Ok(())
        })?;
    }
    Ok(strategy)
}

/// Add `bound` to every type parameter.
fn with_bound(generics: &Generics, bound: &TokenStream2) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(#bound));
    }
    generics
}

/// Member access (`self.name` or `self.0`) for each field.
fn members(fields: &Fields) -> Vec<Member> {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(i)),
        })
        .collect()
}

/// `#[derive(Serialize)]`: generates the full traversal routine.
///
/// Structs visit their fields in declaration order. Enums write a `u32`
/// variant index, then the variant's fields; on unpack the variant is rebuilt
/// from the stream.
///
/// Field attributes:
/// - `#[stowage(skip)]`: not serialized
/// - `#[stowage(partial)]`: also visited by `#[derive(SerializePartial)]`
///
/// Example:
/// ```ignore
/// use stowage::Serialize;
///
/// #[derive(Serialize)]
/// struct Frame {
///     seq: u32,
///     payload: Vec<u8>,
///     #[stowage(skip)]
///     cached_crc: Option<u32>,
/// }
/// ```
#[proc_macro_derive(Serialize, attributes(stowage))]
pub fn derive_serialize(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_serialize(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_serialize(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let (body, bound) = match &input.data {
        Data::Struct(data) => (
            struct_body(&data.fields, &format_ident!("field"))?,
            quote!(::stowage::Serialize),
        ),
        Data::Enum(data) => (enum_body(name, data)?, quote!(::stowage::Reconstruct)),
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "unions cannot derive Serialize; use ByteCopy",
            ))
        }
    };

    let generics = with_bound(&input.generics, &bound);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::stowage::Serialize for #name #ty_generics #where_clause {
            fn serialize<__S: ::stowage::Serializer>(
                &mut self,
                __s: &mut __S,
            ) -> ::stowage::Result<()> {
                #body
            }
        }
    })
}

/// Visit every non-skipped field through `Serializer::<dispatch>`.
fn struct_body(fields: &Fields, dispatch: &Ident) -> syn::Result<TokenStream2> {
    let mut calls = Vec::new();
    for (field, member) in fields.iter().zip(members(fields)) {
        let options = field_options(field)?;
        let selected = if dispatch == "partial_field" {
            options.partial
        } else {
            !options.skip
        };
        if selected {
            calls.push(quote! {
                ::stowage::Serializer::#dispatch(__s, &mut self.#member)?;
            });
        }
    }
    Ok(quote! {
        #(#calls)*
        ::core::result::Result::Ok(())
    })
}

fn enum_body(name: &Ident, data: &DataEnum) -> syn::Result<TokenStream2> {
    if data.variants.is_empty() {
        return Ok(quote!(match *self {}));
    }
    let type_name = name.to_string();

    let mut index_arms = Vec::new();
    let mut rebuild_arms = Vec::new();
    let mut visit_arms = Vec::new();

    for (index, variant) in data.variants.iter().enumerate() {
        let index = u32::try_from(index).map_err(|_| {
            syn::Error::new_spanned(variant, "too many variants for a u32 index")
        })?;
        let ident = &variant.ident;

        let mut bindings = Vec::new();
        let mut visits = Vec::new();
        let mut rebuilt = Vec::new();
        for (i, field) in variant.fields.iter().enumerate() {
            let options = field_options(field)?;
            let binding = format_ident!("__f{}", i);
            let ty = &field.ty;
            let value = if options.skip {
                quote!(::core::default::Default::default())
            } else {
                visits.push(quote! {
                    ::stowage::Serializer::field(__s, #binding)?;
                });
                quote! {
                    ::stowage::lifecycle::materialize::<#ty, ::stowage::Full, __S>(__s)?
                }
            };
            match &field.ident {
                Some(field_name) => {
                    bindings.push(quote!(#field_name: #binding));
                    rebuilt.push(quote!(#field_name: #value));
                }
                None => {
                    bindings.push(quote!(#binding));
                    rebuilt.push(value);
                }
            }
        }

        let (pattern, construction) = match &variant.fields {
            Fields::Named(_) => (
                quote!(Self::#ident { #(#bindings,)* }),
                quote!(Self::#ident { #(#rebuilt,)* }),
            ),
            Fields::Unnamed(_) => (
                quote!(Self::#ident(#(#bindings,)*)),
                quote!(Self::#ident(#(#rebuilt,)*)),
            ),
            Fields::Unit => (quote!(Self::#ident), quote!(Self::#ident)),
        };
        let skip_pattern = match &variant.fields {
            Fields::Named(_) => quote!(Self::#ident { .. }),
            Fields::Unnamed(_) => quote!(Self::#ident(..)),
            Fields::Unit => quote!(Self::#ident),
        };

        index_arms.push(quote!(#skip_pattern => #index));
        rebuild_arms.push(quote!(#index => #construction));
        visit_arms.push(quote! {
            #[allow(unused_variables)]
            #pattern => { #(#visits)* }
        });
    }

    Ok(quote! {
        let mut __index: [u32; 1] = [match self { #(#index_arms,)* }];
        ::stowage::Serializer::contiguous_typed(__s, &mut __index)?;

        if ::stowage::Serializer::is_unpacking(__s) {
            *self = match __index[0] {
                #(#rebuild_arms,)*
                __other => {
                    return ::core::result::Result::Err(::stowage::Error::InvalidData {
                        offset: ::stowage::SerializerState::usage(__s) - 4,
                        reason: ::std::format!(
                            "invalid variant index {} for {}",
                            __other,
                            #type_name
                        ),
                    });
                }
            };
            return ::core::result::Result::Ok(());
        }

        match self {
            #(#visit_arms)*
        }
        ::core::result::Result::Ok(())
    })
}

/// `#[derive(SerializePartial)]`: generates the partial traversal routine.
///
/// Visits only the fields marked `#[stowage(partial)]`, in declaration order,
/// each through its own partial routine. Structs only.
#[proc_macro_derive(SerializePartial, attributes(stowage))]
pub fn derive_serialize_partial(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_serialize_partial(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_serialize_partial(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "SerializePartial can only be derived for structs",
        ));
    };

    let body = struct_body(&data.fields, &format_ident!("partial_field"))?;
    let generics = with_bound(&input.generics, &quote!(::stowage::SerializePartial));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::stowage::SerializePartial for #name #ty_generics #where_clause {
            fn serialize_partial<__S: ::stowage::Serializer>(
                &mut self,
                __s: &mut __S,
            ) -> ::stowage::Result<()> {
                #body
            }
        }
    })
}

/// `#[derive(ByteCopy)]`: declares a plain-data struct a byte-copyable leaf.
///
/// Requirements, checked at compile time:
/// - `#[repr(C)]` or `#[repr(transparent)]`
/// - no generic parameters
/// - every field is `ByteCopy`
/// - no padding (size equals the sum of the field sizes)
///
/// The type must also derive `Clone` and `Copy`.
///
/// Example:
/// ```ignore
/// use stowage::ByteCopy;
///
/// #[derive(Clone, Copy, ByteCopy)]
/// #[repr(C)]
/// struct Vec3 {
///     x: f32,
///     y: f32,
///     z: f32,
/// }
/// ```
#[proc_macro_derive(ByteCopy)]
pub fn derive_byte_copy(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_byte_copy(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_byte_copy(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "ByteCopy can only be derived for structs",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ByteCopy cannot be derived for generic types",
        ));
    }

    let mut has_layout = false;
    for attr in &input.attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("C") || meta.path.is_ident("transparent") {
                has_layout = true;
            }
            // Other repr hints (align, packed) are accepted; the size check
            // below rejects any padding they introduce.
            if meta.input.peek(syn::token::Paren) {
                let _content;
                syn::parenthesized!(_content in meta.input);
            }
            Ok(())
        })?;
    }
    if !has_layout {
        return Err(syn::Error::new(
            Span::call_site(),
            "ByteCopy requires #[repr(C)] or #[repr(transparent)]",
        ));
    }

    let types: Vec<_> = data.fields.iter().map(|f| &f.ty).collect();
    let message = format!("{} has padding bytes and cannot be ByteCopy", name);

    Ok(quote! {
        const _: fn() = || {
            fn __assert_byte_copy<T: ::stowage::ByteCopy>() {}
            #(__assert_byte_copy::<#types>();)*
        };

        const _: () = ::core::assert!(
            ::core::mem::size_of::<#name>() == 0 #(+ ::core::mem::size_of::<#types>())*,
            #message
        );

        // SAFETY: repr(C)/repr(transparent), every field is ByteCopy, and the
        // size assertion above rules out padding.
        unsafe impl ::stowage::ByteCopy for #name {}

        ::stowage::impl_leaf!(#name);
    })
}

/// `#[derive(Reconstruct)]`: declares how the type is constructed before
/// population during unpacking.
///
/// - `#[stowage(reconstruct = "default")]` (the default): `Default::default`
/// - `#[stowage(reconstruct = "intrinsic")]`: calls an inherent
///   `fn reconstruct(slot: &mut MaybeUninit<Self>) -> &mut Self`
/// - `#[stowage(reconstruct = "external")]`: requires a routine registered
///   with `stowage::register_reconstructor`
#[proc_macro_derive(Reconstruct, attributes(stowage))]
pub fn derive_reconstruct(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_reconstruct(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_reconstruct(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let mut generics = with_bound(&input.generics, &quote!(::stowage::Reconstruct));
    let strategy = strategy(input)?;
    if let Strategy::Default = strategy {
        let (_, ty_generics, _) = input.generics.split_for_impl();
        generics
            .make_where_clause()
            .predicates
            .push(parse_quote!(#name #ty_generics: ::core::default::Default));
    }

    let reconstructor = match strategy {
        Strategy::Default => quote! {
            ::stowage::Reconstructor::DefaultConstruct(
                <Self as ::core::default::Default>::default
            )
        },
        Strategy::Intrinsic => quote! {
            ::stowage::Reconstructor::Intrinsic(Self::reconstruct)
        },
        Strategy::External => quote!(::stowage::Reconstructor::External),
    };

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::stowage::Reconstruct for #name #ty_generics #where_clause {
            fn reconstructor() -> ::stowage::Reconstructor<Self> {
                #reconstructor
            }
        }
    })
}
