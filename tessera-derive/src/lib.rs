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
//! # Tessera Derive Macros
//!
//! `#[derive(TesseraObject)]` writes the [`Reflect`] implementation of a
//! struct or fieldless enum. The generated code only builds a
//! `TypeDescriptor`; every formatter is resolved at runtime from it, so
//! deriving a type never changes how other types are encoded.
//!
//! ## Structs
//!
//! Named and tuple structs become objects. Each field turns into a member
//! whose visibility follows the Rust one: `pub` fields are public members,
//! everything else is private. The type must implement `Default` unless it
//! is marked `no_default`.
//!
//! ```rust
//! use tessera_derive::TesseraObject;
//!
//! #[derive(TesseraObject, Default, Debug, PartialEq)]
//! #[tessera(name = "Person")]
//! pub struct Person {
//!     pub name: String,
//!     pub health: i32,
//!     #[tessera(rename = "friend", alias = "best_friend")]
//!     pub best_friend: Option<std::rc::Rc<Person>>,
//! }
//! ```
//!
//! ## Enums
//!
//! Enums without fields are written as their discriminant. Explicit
//! discriminants are honored.
//!
//! ```rust
//! use tessera_derive::TesseraObject;
//!
//! #[derive(TesseraObject, Debug, PartialEq)]
//! enum Level {
//!     Low = 1,
//!     Mid,
//!     High = 10,
//! }
//! ```
//!
//! ## Type attributes
//!
//! - `name = "..."`: binding name written on the wire, the full Rust path otherwise
//! - `members = "all_fields | public_properties"`: default member policy of the type
//! - `blittable`: also implements `Blittable`, every field must be blittable
//! - `no_default`: the type has no `Default`, so it is only read in place
//! - `eq`: readonly members of this type are verified with `PartialEq`
//!
//! ## Field attributes
//!
//! - `rename = "..."`: persistent member name
//! - `alias = "..."`: former persistent name, may be repeated
//! - `readonly`: never assigned when reading, see the readonly policy
//! - `synthetic`: marks a generated backing member
//! - `include` / `exclude`: override the member policy for this field
//!
//! [`Reflect`]: https://docs.rs/tessera-core/latest/tessera_core/reflect/trait.Reflect.html

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod object;

/// Derives `Reflect` for structs and fieldless enums.
#[proc_macro_derive(TesseraObject, attributes(tessera))]
pub fn proc_macro_derive_tessera_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    object::derive_object(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
