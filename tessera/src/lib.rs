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
//! # Tessera
//!
//! Tessera is a binary serializer for Rust object graphs. It writes shared
//! (`Rc`) values once and restores their identity, follows cycles through
//! `Rc<RefCell<T>>`, and can embed just enough schema information to read
//! data written by an older or newer version of a type.
//!
//! ## Key Features
//!
//! - **Object graphs**: shared references and cycles survive a round trip
//! - **Version tolerance**: members can be added, removed or renamed
//! - **Runtime resolution**: one formatter per type, resolved on first use
//!   through an ordered chain that custom resolvers can extend
//! - **Guard rails**: protocol checksums, size limits and a depth limit
//!
//! ## Quick Start
//!
//! The derive macro generates code referring to `tessera_core`, so add
//! both crates:
//!
//! ```toml
//! [dependencies]
//! tessera = "0.1"
//! tessera-core = "0.1"
//! ```
//!
//! ```rust
//! use std::rc::Rc;
//! use tessera::{Config, Error, Tessera, TesseraObject};
//!
//! #[derive(TesseraObject, Default, Debug, PartialEq)]
//! #[tessera(name = "Person")]
//! struct Person {
//!     name: String,
//!     health: i32,
//!     best_friend: Option<Rc<Person>>,
//! }
//!
//! # fn main() -> Result<(), Error> {
//! let tessera = Tessera::new(Config::new())?;
//! let person = Person {
//!     name: "riki".to_string(),
//!     health: 100,
//!     best_friend: None,
//! };
//! let bytes = tessera.serialize_to_vec(&person)?;
//! let back: Person = tessera.deserialize_from(&bytes)?;
//! assert_eq!(person, back);
//! # Ok(())
//! # }
//! ```
//!
//! ## Shared references and cycles
//!
//! Every `Rc` is written once per call; later occurrences are written as a
//! back reference. Cycles need a cell so the value can be linked after it
//! has been shared:
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use tessera::{Config, Tessera, TesseraObject};
//!
//! #[derive(TesseraObject, Default)]
//! struct Node {
//!     value: i32,
//!     next: Option<Rc<RefCell<Node>>>,
//! }
//!
//! let node = Rc::new(RefCell::new(Node { value: 1, next: None }));
//! node.borrow_mut().next = Some(node.clone());
//!
//! let tessera = Tessera::new(Config::new()).unwrap();
//! let bytes = tessera.serialize_to_vec(&node).unwrap();
//! let back: Rc<RefCell<Node>> = tessera.deserialize_from(&bytes).unwrap();
//! let next = back.borrow().next.clone().unwrap();
//! assert!(Rc::ptr_eq(&back, &next));
//! # node.borrow_mut().next = None;
//! # back.borrow_mut().next = None;
//! ```
//!
//! ## Version tolerance
//!
//! With `version_tolerance(true)` each type's member names are written once
//! per call and every member is length-prefixed. Readers skip members they
//! no longer have and leave new ones at their default:
//!
//! ```rust
//! use tessera::{Config, Tessera, TesseraObject};
//!
//! #[derive(TesseraObject, Default)]
//! #[tessera(name = "Shape")]
//! struct OldShape {
//!     a: i32,
//!     b: String,
//! }
//!
//! #[derive(TesseraObject, Default)]
//! #[tessera(name = "Shape")]
//! struct NewShape {
//!     a: i32,
//!     d: Vec<u8>,
//! }
//!
//! let writer = Tessera::new(Config::new().version_tolerance(true)).unwrap();
//! let reader = Tessera::new(Config::new().version_tolerance(true)).unwrap();
//! let bytes = writer.serialize_to_vec(&OldShape { a: 7, b: "gone".into() }).unwrap();
//! let shape: NewShape = reader.deserialize_from(&bytes).unwrap();
//! assert_eq!(shape.a, 7);
//! assert!(shape.d.is_empty());
//! ```
//!
//! ## Configuration
//!
//! [`Config`] collects every setting; [`Tessera::new`] validates the
//! combination once. Asking for an embedded checksum together with a
//! persisted type cache is rejected, because types added later in the
//! session would change the checksum.

pub use tessera_core::config::{Config, DelegateSerialization, ReadonlyFieldHandling};
pub use tessera_core::error::Error;
pub use tessera_core::formatter::CustomFormatter;
pub use tessera_core::reflect::{
    AnyValue, Blittable, Delegate, KeyValuePair, MemberOptions, MemberRef, ObjectBuilder,
    Reflect, ReflectEnum, TargetMembers, TypeDescriptor,
};
pub use tessera_core::stream::{read_framed, write_framed, FramedStream};
pub use tessera_core::tessera::Tessera;
pub use tessera_derive::TesseraObject;
