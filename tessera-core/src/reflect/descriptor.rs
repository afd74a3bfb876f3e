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

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use super::{downcast_box, downcast_mut, BlittableOps, CollectionProxy};
use super::{MemberDescriptor, Reflect, TargetMembers, TypeKey};
use crate::error::Error;
use crate::types::{PrimitiveKind, StandardKind};

pub type ConstructFn = Rc<dyn Fn() -> Box<dyn Any>>;
pub type AssignFn = fn(&mut dyn Any, Box<dyn Any>) -> Result<(), Error>;
pub type EqFn = fn(&dyn Any, &dyn Any) -> bool;
pub type ElementFn = fn(&dyn Any) -> Result<&dyn Any, Error>;
pub type ElementMutFn = fn(&mut dyn Any) -> Result<&mut dyn Any, Error>;
pub type WrapFn = fn(Box<dyn Any>) -> Result<Box<dyn Any>, Error>;
pub type VisitFn = fn(&dyn Any, &mut dyn FnMut(&dyn Any) -> Result<(), Error>) -> Result<(), Error>;
pub type VisitMutFn =
    fn(&dyn Any, &mut dyn FnMut(&mut dyn Any) -> Result<(), Error>) -> Result<(), Error>;

/// Operations every described type supports regardless of its kind.
#[derive(Clone)]
pub struct ValueOps {
    pub construct: Option<ConstructFn>,
    pub assign: AssignFn,
    pub eq: Option<EqFn>,
}

fn construct_default<T: Any + Default>() -> Box<dyn Any> {
    Box::new(T::default())
}

fn assign_value<T: Any>(target: &mut dyn Any, value: Box<dyn Any>) -> Result<(), Error> {
    *downcast_mut::<T>(target)? = downcast_box::<T>(value)?;
    Ok(())
}

fn eq_value<T: Any + PartialEq>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl ValueOps {
    pub fn of<T: Any>() -> ValueOps {
        ValueOps {
            construct: None,
            assign: assign_value::<T>,
            eq: None,
        }
    }

    pub fn with_default<T: Any + Default>(mut self) -> ValueOps {
        self.construct = Some(Rc::new(construct_default::<T>));
        self
    }

    pub fn with_eq<T: Any + PartialEq>(mut self) -> ValueOps {
        self.eq = Some(eq_value::<T>);
        self
    }
}

#[derive(Clone)]
pub struct EnumOps {
    pub variants: Vec<(&'static str, i64)>,
    pub to_discriminant: fn(&dyn Any) -> Result<i64, Error>,
    pub from_discriminant: fn(i64) -> Option<Box<dyn Any>>,
}

#[derive(Clone)]
pub struct TupleOps {
    pub elements: Vec<TypeKey>,
    pub element: fn(&dyn Any, usize) -> Result<&dyn Any, Error>,
    pub assemble: fn(Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, Error>,
}

#[derive(Clone)]
pub struct NullableOps {
    pub inner: TypeKey,
    pub get: fn(&dyn Any) -> Result<Option<&dyn Any>, Error>,
    pub some: WrapFn,
    pub none: fn() -> Box<dyn Any>,
}

#[derive(Clone)]
pub struct KeyValueOps {
    pub key: TypeKey,
    pub value: TypeKey,
    pub parts: fn(&dyn Any) -> Result<(&dyn Any, &dyn Any), Error>,
    pub assemble: fn(Box<dyn Any>, Box<dyn Any>) -> Result<Box<dyn Any>, Error>,
}

/// Contiguous sequences written as a length followed by their items.
#[derive(Clone)]
pub struct ArrayOps {
    pub item: TypeKey,
    pub len: fn(&dyn Any) -> Result<usize, Error>,
    pub for_each: VisitFn,
    pub assemble: fn(Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, Error>,
}

/// Collections built through a [`CollectionProxy`].
#[derive(Clone)]
pub struct CollectionOps {
    pub item: TypeKey,
    pub proxy: Rc<dyn CollectionProxy>,
}

/// Reference counted shells (`Rc<T>`), the only identity-tracked kind.
#[derive(Clone)]
pub struct SharedOps {
    pub inner: TypeKey,
    pub address: fn(&dyn Any) -> Result<usize, Error>,
    pub keep_alive: fn(&dyn Any) -> Result<Rc<dyn Any>, Error>,
    pub get: ElementFn,
    pub wrap: WrapFn,
    /// Clones the shell, sharing the referent.
    pub share: fn(&dyn Any) -> Result<Box<dyn Any>, Error>,
}

/// Interior mutability cells (`RefCell<T>`).
#[derive(Clone)]
pub struct CellOps {
    pub inner: TypeKey,
    pub visit: VisitFn,
    pub visit_mut: VisitMutFn,
    pub wrap: WrapFn,
}

/// Transparent owning wrappers (`Box<T>`).
#[derive(Clone)]
pub struct WrapperOps {
    pub inner: TypeKey,
    pub get: ElementFn,
    pub get_mut: ElementMutFn,
    pub wrap: WrapFn,
}

#[derive(Clone)]
pub struct ObjectOps {
    pub members: Vec<MemberDescriptor>,
    /// Per-type default member policy, overriding the global one.
    pub member_policy: Option<TargetMembers>,
    pub blittable: Option<BlittableOps>,
}

#[derive(Clone)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    String,
    Enum(EnumOps),
    Standard(StandardKind),
    Tuple(TupleOps),
    Nullable(NullableOps),
    KeyValuePair(KeyValueOps),
    Array(ArrayOps),
    Collection(CollectionOps),
    Shared(SharedOps),
    Cell(CellOps),
    Boxed(WrapperOps),
    /// Polymorphic holder, see [`AnyValue`](super::AnyValue).
    Any,
    MemberRef,
    Delegate,
    Object(ObjectOps),
    /// A described type no formatter can handle.
    Opaque,
}

impl TypeKind {
    pub fn label(&self) -> &'static str {
        match self {
            TypeKind::Primitive(_) => "primitive",
            TypeKind::String => "string",
            TypeKind::Enum(_) => "enum",
            TypeKind::Standard(_) => "standard value",
            TypeKind::Tuple(_) => "tuple",
            TypeKind::Nullable(_) => "nullable",
            TypeKind::KeyValuePair(_) => "key value pair",
            TypeKind::Array(_) => "array",
            TypeKind::Collection(_) => "collection",
            TypeKind::Shared(_) => "shared reference",
            TypeKind::Cell(_) => "cell",
            TypeKind::Boxed(_) => "box",
            TypeKind::Any => "polymorphic value",
            TypeKind::MemberRef => "member reference",
            TypeKind::Delegate => "delegate",
            TypeKind::Object(_) => "object",
            TypeKind::Opaque => "opaque",
        }
    }
}

/// Description of one concrete type, created once per type and cached by
/// the type resolver.
pub struct TypeDescriptor {
    key: TypeKey,
    name: Cow<'static, str>,
    kind: TypeKind,
    ops: ValueOps,
}

impl TypeDescriptor {
    pub fn new<T: Reflect>(kind: TypeKind, ops: ValueOps) -> TypeDescriptor {
        let key = TypeKey::of::<T>();
        TypeDescriptor {
            key,
            name: Cow::Borrowed(key.type_name()),
            kind,
            ops,
        }
    }

    /// Replaces the binding name written on the wire.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> TypeDescriptor {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.key.id()
    }

    /// Stable name binding this type across processes.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn full_name(&self) -> &'static str {
        self.key.type_name()
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[inline]
    pub fn ops(&self) -> &ValueOps {
        &self.ops
    }

    /// False only for identity-tracked shells.
    pub fn is_value_type(&self) -> bool {
        !matches!(self.kind, TypeKind::Shared(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array(_))
    }

    /// Item type of arrays and collections.
    pub fn item_type(&self) -> Option<TypeKey> {
        match &self.kind {
            TypeKind::Array(ops) => Some(ops.item),
            TypeKind::Collection(ops) => Some(ops.item),
            _ => None,
        }
    }

    /// Whether every value of the type encodes to a bounded, known size.
    pub fn is_fixed_size(&self) -> bool {
        match &self.kind {
            TypeKind::Primitive(_) | TypeKind::Enum(_) => true,
            TypeKind::Standard(kind) => kind.is_fixed_size(),
            TypeKind::Object(ops) => ops.blittable.is_some(),
            _ => false,
        }
    }

    pub fn object(&self) -> Option<&ObjectOps> {
        match &self.kind {
            TypeKind::Object(ops) => Some(ops),
            _ => None,
        }
    }

    /// Candidate members; empty for anything but objects.
    pub fn members(&self) -> &[MemberDescriptor] {
        match &self.kind {
            TypeKind::Object(ops) => &ops.members,
            _ => &[],
        }
    }

    pub fn construct(&self) -> Result<Box<dyn Any>, Error> {
        match &self.ops.construct {
            Some(construct) => Ok(construct()),
            None => Err(Error::unsupported_type(format!(
                "{} has no default value to construct",
                self.full_name()
            ))),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("full_name", &self.full_name())
            .field("kind", &self.kind.label())
            .finish()
    }
}

