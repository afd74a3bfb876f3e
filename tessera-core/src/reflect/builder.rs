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

use std::any::{type_name, Any};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::rc::Rc;

use super::member::{Getter, GetterMut, Setter};
use super::{downcast_box, downcast_mut, downcast_ref};
use super::{Blittable, BlittableOps, EnumOps, ObjectOps, Reflect, TypeDescriptor, TypeKey};
use super::{MemberDescriptor, MemberKind, MemberOptions, MemberValue, TargetMembers};
use super::{TypeKind, ValueOps};
use crate::error::Error;

fn getter<F>(f: F) -> Getter
where
    F: for<'a> Fn(&'a dyn Any) -> Result<MemberValue<'a>, Error> + 'static,
{
    Rc::new(f)
}

fn getter_mut<F>(f: F) -> GetterMut
where
    F: for<'a> Fn(&'a mut dyn Any) -> Result<&'a mut dyn Any, Error> + 'static,
{
    Rc::new(f)
}

/// Builds the descriptor of a user struct member by member.
///
/// ```
/// use tessera_core::reflect::{MemberOptions, ObjectBuilder, Reflect, TypeDescriptor};
///
/// #[derive(Default)]
/// struct Point {
///     x: i32,
///     y: i32,
///     label: String,
/// }
///
/// impl Reflect for Point {
///     fn describe() -> TypeDescriptor {
///         ObjectBuilder::<Self>::new()
///             .name("Point")
///             .field::<i32>("x", |p: &Self| &p.x, |p: &mut Self| &mut p.x)
///             .field::<i32>("y", |p: &Self| &p.y, |p: &mut Self| &mut p.y)
///             .field_with::<String>(
///                 "label",
///                 |p: &Self| &p.label,
///                 |p: &mut Self| &mut p.label,
///                 MemberOptions::private().rename("name"),
///             )
///             .build()
///     }
/// }
///
/// let descriptor = Point::describe();
/// assert_eq!(descriptor.name(), "Point");
/// assert_eq!(descriptor.members().len(), 3);
/// ```
pub struct ObjectBuilder<T> {
    name: Option<Cow<'static, str>>,
    members: Vec<MemberDescriptor>,
    member_policy: Option<TargetMembers>,
    blittable: Option<BlittableOps>,
    ops: ValueOps,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect + Default> ObjectBuilder<T> {
    pub fn new() -> Self {
        let mut builder = Self::without_default();
        builder.ops = builder.ops.with_default::<T>();
        builder
    }
}

impl<T: Reflect + Default> Default for ObjectBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Reflect> ObjectBuilder<T> {
    /// A builder for a type that cannot be constructed empty; such types can
    /// be written but only read through a shell that already holds a value.
    pub fn without_default() -> Self {
        ObjectBuilder {
            name: None,
            members: Vec::new(),
            member_policy: None,
            blittable: None,
            ops: ValueOps::of::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the default value objects are read into.
    pub fn constructor(mut self, construct: fn() -> T) -> Self {
        self.ops.construct = Some(Rc::new(move || Box::new(construct()) as Box<dyn Any>));
        self
    }

    /// Default member policy for this type.
    pub fn members(mut self, policy: TargetMembers) -> Self {
        self.member_policy = Some(policy);
        self
    }

    pub fn field<M: Reflect>(
        self,
        name: &'static str,
        get: fn(&T) -> &M,
        get_mut: fn(&mut T) -> &mut M,
    ) -> Self {
        self.field_with(name, get, get_mut, MemberOptions::public())
    }

    pub fn field_with<M: Reflect>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &M,
        get_mut: fn(&mut T) -> &mut M,
        options: MemberOptions,
    ) -> Self {
        let read = getter(move |object: &dyn Any| {
            Ok(MemberValue::Borrowed(get(downcast_ref::<T>(object)?)))
        });
        let read_mut = getter_mut(move |object: &mut dyn Any| {
            Ok(get_mut(downcast_mut::<T>(object)?) as &mut dyn Any)
        });
        let write: Setter = Rc::new(move |object: &mut dyn Any, value: Box<dyn Any>| {
            *get_mut(downcast_mut::<T>(object)?) = downcast_box::<M>(value)?;
            Ok(())
        });
        self.push::<M>(name, MemberKind::Field, options, read, Some(read_mut), Some(write));
        self
    }

    /// A computed member. Without a setter it is never serialized.
    pub fn property<M: Reflect>(
        mut self,
        name: &'static str,
        get: fn(&T) -> M,
        set: Option<fn(&mut T, M)>,
        options: MemberOptions,
    ) -> Self {
        let read = getter(move |object: &dyn Any| {
            Ok(MemberValue::Owned(Box::new(get(downcast_ref::<T>(object)?))))
        });
        let write = set.map(|set| {
            Rc::new(move |object: &mut dyn Any, value: Box<dyn Any>| {
                set(downcast_mut::<T>(object)?, downcast_box::<M>(value)?);
                Ok(())
            }) as Setter
        });
        self.push::<M>(name, MemberKind::Property, options, read, None, write);
        self
    }

    fn push<M: Reflect>(
        &mut self,
        name: &'static str,
        kind: MemberKind,
        options: MemberOptions,
        getter: Getter,
        getter_mut: Option<GetterMut>,
        setter: Option<Setter>,
    ) {
        let persistent = options.rename.clone().unwrap_or(Cow::Borrowed(name));
        let declaring_type = options
            .declaring_type
            .clone()
            .unwrap_or(Cow::Borrowed(type_name::<T>()));
        self.members.push(MemberDescriptor {
            name: persistent,
            declared_name: name,
            declaring_type,
            member_type: TypeKey::of::<M>(),
            kind,
            options,
            getter,
            getter_mut,
            setter,
        });
    }

    /// Enables the raw memory layout path outside version tolerant mode.
    pub fn blittable(mut self) -> Self
    where
        T: Blittable,
    {
        self.blittable = Some(BlittableOps::of::<T>());
        self
    }

    pub fn with_eq(mut self) -> Self
    where
        T: PartialEq,
    {
        self.ops = self.ops.with_eq::<T>();
        self
    }

    pub fn build(self) -> TypeDescriptor {
        let descriptor = TypeDescriptor::new::<T>(
            TypeKind::Object(ObjectOps {
                members: self.members,
                member_policy: self.member_policy,
                blittable: self.blittable,
            }),
            self.ops,
        );
        match self.name {
            Some(name) => descriptor.with_name(name),
            None => descriptor,
        }
    }
}

/// Fieldless enums with integer discriminants.
pub trait ReflectEnum: Reflect {
    const VARIANTS: &'static [(&'static str, i64)];

    fn to_discriminant(&self) -> i64;

    fn from_discriminant(discriminant: i64) -> Option<Self>;
}

fn enum_to_discriminant<T: ReflectEnum>(value: &dyn Any) -> Result<i64, Error> {
    Ok(downcast_ref::<T>(value)?.to_discriminant())
}

fn enum_from_discriminant<T: ReflectEnum>(discriminant: i64) -> Option<Box<dyn Any>> {
    T::from_discriminant(discriminant).map(|v| Box::new(v) as Box<dyn Any>)
}

pub struct EnumBuilder<T> {
    name: Option<Cow<'static, str>>,
    ops: ValueOps,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ReflectEnum> EnumBuilder<T> {
    pub fn new() -> Self {
        EnumBuilder {
            name: None,
            ops: ValueOps::of::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_default(mut self) -> Self
    where
        T: Default,
    {
        self.ops = self.ops.with_default::<T>();
        self
    }

    pub fn build(self) -> TypeDescriptor {
        let descriptor = TypeDescriptor::new::<T>(
            TypeKind::Enum(EnumOps {
                variants: T::VARIANTS.to_vec(),
                to_discriminant: enum_to_discriminant::<T>,
                from_discriminant: enum_from_discriminant::<T>,
            }),
            self.ops,
        );
        match self.name {
            Some(name) => descriptor.with_name(name),
            None => descriptor,
        }
    }
}

impl<T: ReflectEnum> Default for EnumBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
