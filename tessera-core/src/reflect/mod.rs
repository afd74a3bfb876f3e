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

//! Type descriptions consumed by the serialization engine.
//!
//! Every serializable type implements [`Reflect`], producing a
//! [`TypeDescriptor`]: its binding name, its [`TypeKind`] with type-erased
//! operations, and for user structs the list of candidate members. Member
//! and element types are referenced through a [`TypeKey`], a lazy handle
//! that describes the type only when asked, so recursive types can be
//! described without recursing.

mod blittable;
mod builder;
mod descriptor;
mod impls;
mod member;
mod proxy;
mod value;

pub use blittable::{Blittable, BlittableOps};
pub use builder::{EnumBuilder, ObjectBuilder, ReflectEnum};
pub use descriptor::{
    ArrayOps, CellOps, CollectionOps, EnumOps, KeyValueOps, NullableOps, ObjectOps, SharedOps,
    TupleOps, TypeDescriptor, TypeKind, ValueOps, WrapperOps,
};
pub use impls::ArrayLike;
pub use member::{
    MemberDescriptor, MemberKind, MemberMarker, MemberOptions, MemberValue, TargetMembers,
    Visibility,
};
pub use proxy::{CollectionProxy, Item, ItemRef, MapProxy, SeqProxy};
pub use value::{AnyValue, Delegate, KeyValuePair, MemberRef};

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::Error;

/// A type that can describe itself to the serializer.
///
/// Implemented for the standard scalar, string, tuple, collection and
/// pointer types. User structs and fieldless enums get it from
/// `#[derive(TesseraObject)]` or implement it with an [`ObjectBuilder`].
pub trait Reflect: Any + Sized {
    fn describe() -> TypeDescriptor;
}

/// Lazy handle to a [`Reflect`] type.
#[derive(Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
    // describing is deferred so self-referential types stay finite
    describe: fn() -> TypeDescriptor,
}

impl TypeKey {
    #[inline]
    pub fn of<T: Reflect>() -> TypeKey {
        TypeKey {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            describe: T::describe,
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.type_id
    }

    /// Full Rust name of the type, as given by [`std::any::type_name`].
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn describe(&self) -> TypeDescriptor {
        (self.describe)()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.type_name)
    }
}

#[inline]
pub fn downcast_ref<T: Any>(value: &dyn Any) -> Result<&T, Error> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| Error::type_mismatch(type_name::<T>(), "a value of another type"))
}

#[inline]
pub fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T, Error> {
    value
        .downcast_mut::<T>()
        .ok_or_else(|| Error::type_mismatch(type_name::<T>(), "a value of another type"))
}

#[inline]
pub fn downcast_box<T: Any>(value: Box<dyn Any>) -> Result<T, Error> {
    value
        .downcast::<T>()
        .map(|v| *v)
        .map_err(|_| Error::type_mismatch(type_name::<T>(), "a value of another type"))
}
