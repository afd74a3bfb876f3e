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
//! Parsing of `#[tessera(...)]` attributes on types and fields.

use syn::meta::ParseNestedMeta;
use syn::{Attribute, LitStr};

/// Parsed `#[tessera(...)]` attributes of a struct or enum.
#[derive(Debug, Default)]
pub struct TypeMeta {
    pub name: Option<LitStr>,
    /// Member policy flags, already mapped to `TargetMembers` constant names.
    pub members: Option<Vec<syn::Ident>>,
    pub blittable: bool,
    pub no_default: bool,
    pub eq: bool,
}

/// Parsed `#[tessera(...)]` attributes of a field.
#[derive(Debug, Default)]
pub struct FieldMeta {
    pub rename: Option<LitStr>,
    pub aliases: Vec<LitStr>,
    pub readonly: bool,
    pub synthetic: bool,
    pub include: bool,
    pub exclude: bool,
}

pub fn parse_type_meta(attrs: &[Attribute]) -> syn::Result<TypeMeta> {
    let mut meta = TypeMeta::default();
    for attr in attrs {
        if !attr.path().is_ident("tessera") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("name") {
                meta.name = Some(nested.value()?.parse()?);
            } else if nested.path.is_ident("members") {
                let lit: LitStr = nested.value()?.parse()?;
                meta.members = Some(parse_member_policy(&lit)?);
            } else if nested.path.is_ident("blittable") {
                meta.blittable = parse_bool_or_flag(&nested)?;
            } else if nested.path.is_ident("no_default") {
                meta.no_default = parse_bool_or_flag(&nested)?;
            } else if nested.path.is_ident("eq") {
                meta.eq = parse_bool_or_flag(&nested)?;
            } else {
                return Err(nested.error("unknown tessera type attribute"));
            }
            Ok(())
        })?;
    }
    Ok(meta)
}

pub fn parse_field_meta(attrs: &[Attribute]) -> syn::Result<FieldMeta> {
    let mut meta = FieldMeta::default();
    for attr in attrs {
        if !attr.path().is_ident("tessera") {
            continue;
        }
        attr.parse_nested_meta(|nested| {
            if nested.path.is_ident("rename") {
                meta.rename = Some(nested.value()?.parse()?);
            } else if nested.path.is_ident("alias") {
                meta.aliases.push(nested.value()?.parse()?);
            } else if nested.path.is_ident("readonly") {
                meta.readonly = parse_bool_or_flag(&nested)?;
            } else if nested.path.is_ident("synthetic") {
                meta.synthetic = parse_bool_or_flag(&nested)?;
            } else if nested.path.is_ident("include") {
                meta.include = parse_bool_or_flag(&nested)?;
            } else if nested.path.is_ident("exclude") {
                meta.exclude = parse_bool_or_flag(&nested)?;
            } else {
                return Err(nested.error("unknown tessera field attribute"));
            }
            Ok(())
        })?;
    }
    if meta.include && meta.exclude {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "a field cannot be both included and excluded",
        ));
    }
    Ok(meta)
}

/// Parse a boolean value or treat a standalone flag as true.
fn parse_bool_or_flag(meta: &ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.is_empty() || meta.input.peek(syn::Token![,]) {
        Ok(true)
    } else {
        let lit: syn::LitBool = meta.value()?.parse()?;
        Ok(lit.value)
    }
}

/// Maps `"all_fields | public_properties"` onto `TargetMembers` constants.
fn parse_member_policy(lit: &LitStr) -> syn::Result<Vec<syn::Ident>> {
    let value = lit.value();
    let mut flags = Vec::new();
    for part in value.split('|').map(str::trim) {
        let constant = match part {
            "none" => "NONE",
            "public_fields" => "PUBLIC_FIELDS",
            "private_fields" => "PRIVATE_FIELDS",
            "public_properties" => "PUBLIC_PROPERTIES",
            "private_properties" => "PRIVATE_PROPERTIES",
            "all_fields" => "ALL_FIELDS",
            "all_properties" => "ALL_PROPERTIES",
            "all_public" => "ALL_PUBLIC",
            "all" => "ALL",
            other => {
                return Err(syn::Error::new(
                    lit.span(),
                    format!("unknown member policy `{other}`"),
                ))
            }
        };
        flags.push(syn::Ident::new(constant, lit.span()));
    }
    Ok(flags)
}
