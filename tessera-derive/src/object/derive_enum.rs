// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataEnum, DeriveInput, Fields};

use super::field_meta::{parse_field_meta, TypeMeta};

pub fn derive_enum(
    input: &DeriveInput,
    data: &DataEnum,
    meta: &TypeMeta,
) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "TesseraObject enums cannot be generic",
        ));
    }
    if meta.blittable || meta.members.is_some() || meta.no_default || meta.eq {
        return Err(syn::Error::new_spanned(
            ident,
            "only `name` applies to enums",
        ));
    }
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "TesseraObject enums need at least one variant",
        ));
    }

    let mut names = Vec::with_capacity(data.variants.len());
    let mut variants = Vec::with_capacity(data.variants.len());
    let mut discriminants = Vec::with_capacity(data.variants.len());
    let mut previous: Option<TokenStream> = None;
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "TesseraObject only supports enums without fields",
            ));
        }
        let variant_meta = parse_field_meta(&variant.attrs)?;
        let name = match variant_meta.rename {
            Some(rename) => rename.value(),
            None => variant.ident.to_string(),
        };
        // Implicit discriminants continue from the previous one, like rustc.
        let discriminant = match (&variant.discriminant, &previous) {
            (Some((_, expr)), _) => quote!(((#expr) as i64)),
            (None, Some(previous)) => quote!((#previous + 1)),
            (None, None) => quote!(0i64),
        };
        previous = Some(discriminant.clone());
        names.push(name);
        variants.push(&variant.ident);
        discriminants.push(discriminant);
    }

    let name = meta.name.as_ref().map(|name| quote!(.name(#name)));

    Ok(quote! {
        impl ::tessera_core::reflect::ReflectEnum for #ident {
            const VARIANTS: &'static [(&'static str, i64)] = &[
                #((#names, #discriminants)),*
            ];

            fn to_discriminant(&self) -> i64 {
                match self {
                    #(Self::#variants => #discriminants,)*
                }
            }

            fn from_discriminant(discriminant: i64) -> Option<Self> {
                #(
                    if discriminant == #discriminants {
                        return Some(Self::#variants);
                    }
                )*
                None
            }
        }

        impl ::tessera_core::reflect::Reflect for #ident {
            fn describe() -> ::tessera_core::reflect::TypeDescriptor {
                ::tessera_core::reflect::EnumBuilder::<Self>::new()
                    #name
                    .build()
            }
        }
    })
}
