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
use quote::{format_ident, quote};
use syn::{DataStruct, DeriveInput, Fields, Index, Member, Type, Visibility};

use super::add_reflect_bounds;
use super::field_meta::{parse_field_meta, FieldMeta, TypeMeta};

struct StructField<'a> {
    name: String,
    member: Member,
    ty: &'a Type,
    public: bool,
    meta: FieldMeta,
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<StructField<'_>>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let (name, member) = match &field.ident {
                Some(ident) => {
                    let name = ident.to_string();
                    let name = name.strip_prefix("r#").unwrap_or(&name).to_string();
                    (name, Member::Named(ident.clone()))
                }
                None => (index.to_string(), Member::Unnamed(Index::from(index))),
            };
            Ok(StructField {
                name,
                member,
                ty: &field.ty,
                public: matches!(field.vis, Visibility::Public(_)),
                meta: parse_field_meta(&field.attrs)?,
            })
        })
        .collect()
}

fn member_options(field: &StructField<'_>) -> TokenStream {
    let mut options = if field.public {
        quote!(::tessera_core::reflect::MemberOptions::public())
    } else {
        quote!(::tessera_core::reflect::MemberOptions::private())
    };
    let meta = &field.meta;
    if let Some(rename) = &meta.rename {
        options = quote!(#options.rename(#rename));
    }
    for alias in &meta.aliases {
        options = quote!(#options.alias(#alias));
    }
    if meta.readonly {
        options = quote!(#options.readonly());
    }
    if meta.synthetic {
        options = quote!(#options.synthetic());
    }
    if meta.include {
        options = quote!(#options.include());
    }
    if meta.exclude {
        options = quote!(#options.exclude());
    }
    options
}

pub fn derive_struct(
    input: &DeriveInput,
    data: &DataStruct,
    meta: &TypeMeta,
) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let fields = collect_fields(&data.fields)?;
    if meta.blittable && !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "blittable types cannot be generic",
        ));
    }

    let mut generics = add_reflect_bounds(&input.generics);
    if !meta.no_default && !input.generics.params.is_empty() {
        // the builder constructs values through `Default`
        let (_, ty_generics, _) = input.generics.split_for_impl();
        generics
            .make_where_clause()
            .predicates
            .push(syn::parse_quote!(#ident #ty_generics: ::core::default::Default));
    }
    if meta.eq && !input.generics.params.is_empty() {
        let (_, ty_generics, _) = input.generics.split_for_impl();
        generics
            .make_where_clause()
            .predicates
            .push(syn::parse_quote!(#ident #ty_generics: ::core::cmp::PartialEq));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let constructor = if meta.no_default {
        quote!(::tessera_core::reflect::ObjectBuilder::<Self>::without_default())
    } else {
        quote!(::tessera_core::reflect::ObjectBuilder::<Self>::new())
    };
    let name = meta.name.as_ref().map(|name| quote!(.name(#name)));
    let members = meta.members.as_ref().map(|flags| {
        let flags = flags
            .iter()
            .map(|flag| quote!(::tessera_core::reflect::TargetMembers::#flag));
        quote!(.members(#(#flags)|*))
    });
    let blittable = meta.blittable.then(|| quote!(.blittable()));
    let eq = meta.eq.then(|| quote!(.with_eq()));
    let field_calls = fields.iter().map(|field| {
        let StructField {
            name, member, ty, ..
        } = field;
        let options = member_options(field);
        quote! {
            .field_with::<#ty>(
                #name,
                |object: &Self| &object.#member,
                |object: &mut Self| &mut object.#member,
                #options,
            )
        }
    });

    let blittable_impl = meta.blittable.then(|| blittable_impl(ident, &fields));

    Ok(quote! {
        impl #impl_generics ::tessera_core::reflect::Reflect for #ident #ty_generics #where_clause {
            fn describe() -> ::tessera_core::reflect::TypeDescriptor {
                #constructor
                    #name
                    #members
                    #(#field_calls)*
                    #blittable
                    #eq
                    .build()
            }
        }

        #blittable_impl
    })
}

/// Fields are laid out back to back in declaration order.
fn blittable_impl(ident: &syn::Ident, fields: &[StructField<'_>]) -> TokenStream {
    let types: Vec<&Type> = fields.iter().map(|field| field.ty).collect();
    let members: Vec<&Member> = fields.iter().map(|field| &field.member).collect();
    let locals: Vec<syn::Ident> = (0..fields.len())
        .map(|index| format_ident!("field_{}", index))
        .collect();

    quote! {
        impl ::tessera_core::reflect::Blittable for #ident {
            const SIZE: usize = 0 #(+ <#types as ::tessera_core::reflect::Blittable>::SIZE)*;

            #[allow(unused_mut, unused_variables)]
            fn write_to(&self, out: &mut [u8]) {
                let mut offset = 0usize;
                #(
                    let size = <#types as ::tessera_core::reflect::Blittable>::SIZE;
                    ::tessera_core::reflect::Blittable::write_to(
                        &self.#members,
                        &mut out[offset..offset + size],
                    );
                    offset += size;
                )*
                let _ = offset;
            }

            #[allow(unused_mut, unused_variables)]
            fn read_from(bytes: &[u8]) -> Self {
                let mut offset = 0usize;
                #(
                    let size = <#types as ::tessera_core::reflect::Blittable>::SIZE;
                    let #locals = <#types as ::tessera_core::reflect::Blittable>::read_from(
                        &bytes[offset..offset + size],
                    );
                    offset += size;
                )*
                let _ = offset;
                Self { #(#members: #locals),* }
            }
        }
    }
}
