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

//! # Tessera Core
//!
//! Binary object graph serializer. Values are described through the
//! [`Reflect`](reflect::Reflect) trait, and a [`Tessera`] instance resolves
//! one formatter per type to write and read them.
//!
//! ## Architecture
//!
//! - **`tessera`**: the serializer façade and its per-call caches
//! - **`buffer`**: little-endian `Writer`/`Reader` with varint and string helpers
//! - **`reflect`**: type descriptors, member accessors and builders
//! - **`formatter`**: one read/write strategy per type family
//! - **`resolver`**: type binding, reference caches, schema and formatter resolution
//! - **`meta`**: schemas and the protocol checksum
//! - **`stream`**: length-prefixed frames over `std::io`
//! - **`config`**, **`error`**, **`types`**
//!
//! ## Wire format
//!
//! A payload is `[checksum u32?][type token][value]`. Type tokens and shared
//! references use biased ids: `-1` is null, an id below the cache length is
//! a back reference, and the next free id announces a new entry.
//!
//! ### Version tolerance
//!
//! With `Config::version_tolerance(true)` every object type writes its
//! member names once per call and wraps each member in a length prefix.
//! Readers bind names to their own members, skip names they do not know and
//! leave members missing from the data at their default.
//!
//! ```rust
//! use tessera_core::config::Config;
//! use tessera_core::tessera::Tessera;
//!
//! let tessera = Tessera::new(Config::new()).unwrap();
//! let bytes = tessera.serialize_to_vec(&vec![Some(1u8), None]).unwrap();
//! let back: Vec<Option<u8>> = tessera.deserialize_from(&bytes).unwrap();
//! assert_eq!(back, vec![Some(1), None]);
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod formatter;
pub mod meta;
pub mod reflect;
pub mod resolver;
pub mod stream;
pub mod tessera;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use reflect::{
    AnyValue, Delegate, KeyValuePair, MemberOptions, MemberRef, ObjectBuilder, Reflect,
    ReflectEnum, TargetMembers, TypeDescriptor,
};
pub use tessera::Tessera;
