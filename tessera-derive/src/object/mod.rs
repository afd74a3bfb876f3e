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
mod derive_enum;
mod derive_struct;
mod field_meta;

use proc_macro2::TokenStream;
use syn::{Data, DeriveInput, Generics};

pub fn derive_object(input: &DeriveInput) -> syn::Result<TokenStream> {
    let meta = field_meta::parse_type_meta(&input.attrs)?;
    match &input.data {
        Data::Struct(data) => derive_struct::derive_struct(input, data, &meta),
        Data::Enum(data) => derive_enum::derive_enum(input, data, &meta),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "TesseraObject cannot be derived for unions",
        )),
    }
}

/// Adds a `Reflect` bound to every type parameter.
fn add_reflect_bounds(generics: &Generics) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param
            .bounds
            .push(syn::parse_quote!(::tessera_core::reflect::Reflect));
    }
    generics
}
