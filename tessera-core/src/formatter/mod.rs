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

//! Formatters: the resolved read and write strategy of one type.
//!
//! Every built-in formatter family lives in its own module together with the
//! [`Resolver`] that recognizes its types. Formatters registered per type
//! win over configured resolvers, which run ahead of the built-in families.

mod blittable;
mod collection;
mod enum_;
mod kv;
mod object;
mod option;
mod primitive;
mod reference;
mod reflection;
mod standard;
mod tuple;

pub use object::{
    FormatterFactory, InterpretedFactory, MemberPlan, ObjectFormatter, Procedures, ReadFn,
    ReadonlyMode, WriteFn,
};

use std::any::Any;
use std::cell::OnceCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::Error;
use crate::reflect::{downcast_ref, Reflect, TypeDescriptor};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};

/// Reads and writes values of exactly one type through `dyn Any`.
pub trait Formatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor>;

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error>;

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error>;

    /// Reads into an existing value. Formatters of types holding other
    /// values override this to populate them in place.
    fn read_into(&self, target: &mut dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        let value = self.read(ctx)?;
        (self.descriptor().ops().assign)(target, value)
    }

    /// Whether null fits in the type's own header, making a presence byte
    /// unnecessary for `Option<T>`.
    fn inline_null(&self) -> bool {
        false
    }

    fn write_null(&self, _ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        Err(Error::not_allowed(format!(
            "{} has no inline null encoding",
            self.descriptor().full_name()
        )))
    }

    fn read_nullable(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Box<dyn Any>>, Error> {
        self.read(ctx).map(Some)
    }

    /// Equality used to verify readonly members; `None` when the type
    /// cannot be compared.
    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        self.descriptor().ops().eq.map(|eq| eq(a, b))
    }
}

/// Forward declaration published before a type's formatter is built, so
/// recursive types can refer to themselves.
pub struct FormatterSlot {
    descriptor: Rc<TypeDescriptor>,
    inner: OnceCell<Rc<dyn Formatter>>,
}

impl FormatterSlot {
    pub fn new(descriptor: Rc<TypeDescriptor>) -> FormatterSlot {
        FormatterSlot {
            descriptor,
            inner: OnceCell::new(),
        }
    }

    pub fn fill(&self, formatter: Rc<dyn Formatter>) -> Result<(), Error> {
        self.inner.set(formatter).map_err(|_| {
            Error::not_allowed(format!(
                "formatter of {} resolved twice",
                self.descriptor.full_name()
            ))
        })
    }

    fn inner(&self) -> Result<&Rc<dyn Formatter>, Error> {
        self.inner.get().ok_or_else(|| {
            Error::not_allowed(format!(
                "formatter of {} used before its resolution finished",
                self.descriptor.full_name()
            ))
        })
    }
}

impl Formatter for FormatterSlot {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        self.inner()?.write(value, ctx)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        self.inner()?.read(ctx)
    }

    fn read_into(&self, target: &mut dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        self.inner()?.read_into(target, ctx)
    }

    fn inline_null(&self) -> bool {
        self.inner.get().is_some_and(|inner| inner.inline_null())
    }

    fn write_null(&self, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        self.inner()?.write_null(ctx)
    }

    fn read_nullable(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Box<dyn Any>>, Error> {
        self.inner()?.read_nullable(ctx)
    }

    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        self.inner.get().and_then(|inner| inner.values_equal(a, b))
    }
}

/// Hand-written encoding of one type, registered with
/// [`Config::formatter`](crate::config::Config::formatter).
///
/// ```
/// use tessera_core::config::Config;
/// use tessera_core::error::Error;
/// use tessera_core::formatter::CustomFormatter;
/// use tessera_core::resolver::context::{ReadContext, WriteContext};
///
/// struct Celsius;
///
/// impl CustomFormatter<f64> for Celsius {
///     fn write(&self, value: &f64, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
///         ctx.writer.write_i32((*value * 100.0).round() as i32);
///         Ok(())
///     }
///
///     fn read(&self, ctx: &mut ReadContext<'_>) -> Result<f64, Error> {
///         Ok(ctx.reader.read_i32()? as f64 / 100.0)
///     }
/// }
///
/// let config = Config::new().formatter::<f64, _>(Celsius);
/// ```
pub trait CustomFormatter<T>: 'static {
    fn write(&self, value: &T, ctx: &mut WriteContext<'_>) -> Result<(), Error>;

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<T, Error>;
}

pub struct CustomAdapter<T, F> {
    descriptor: Rc<TypeDescriptor>,
    inner: Rc<F>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> CustomAdapter<T, F> {
    pub fn new(descriptor: Rc<TypeDescriptor>, inner: Rc<F>) -> Self {
        CustomAdapter {
            descriptor,
            inner,
            _marker: PhantomData,
        }
    }
}

impl<T: Reflect, F: CustomFormatter<T>> Formatter for CustomAdapter<T, F> {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        self.inner.write(downcast_ref::<T>(value)?, ctx)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        Ok(Box::new(self.inner.read(ctx)?))
    }
}

struct CustomResolver;

impl Resolver for CustomResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        Ok(formatters
            .config()
            .custom_formatters
            .get(&descriptor.id())
            .map(|create| create(descriptor.clone())))
    }
}

/// The full chain: per-type formatters, then user resolvers, then the
/// built-in families.
pub(crate) fn resolution_chain(user: &[Rc<dyn Resolver>]) -> Vec<Rc<dyn Resolver>> {
    let mut chain = vec![Rc::new(CustomResolver) as Rc<dyn Resolver>];
    chain.extend(user.iter().cloned());
    chain.extend(builtin_resolvers());
    chain
}

/// Built-in resolvers in chain order.
fn builtin_resolvers() -> Vec<Rc<dyn Resolver>> {
    vec![
        Rc::new(primitive::PrimitiveResolver) as Rc<dyn Resolver>,
        Rc::new(enum_::EnumResolver) as Rc<dyn Resolver>,
        Rc::new(standard::StandardResolver) as Rc<dyn Resolver>,
        Rc::new(tuple::TupleResolver) as Rc<dyn Resolver>,
        Rc::new(option::NullableResolver) as Rc<dyn Resolver>,
        Rc::new(kv::KeyValueResolver) as Rc<dyn Resolver>,
        Rc::new(collection::CollectionResolver) as Rc<dyn Resolver>,
        Rc::new(reference::ReferenceResolver) as Rc<dyn Resolver>,
        Rc::new(reflection::ReflectionResolver) as Rc<dyn Resolver>,
        Rc::new(blittable::BlittableResolver) as Rc<dyn Resolver>,
        Rc::new(object::ObjectResolver) as Rc<dyn Resolver>,
    ]
}
