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

//! Shared shells, cells, boxes and polymorphic values.
//!
//! `Rc<T>` is the only identity-tracked kind. Its header is a biased object
//! id: null, a back reference, or the next free id for a new object whose
//! content follows.

use std::any::Any;
use std::rc::Rc;

use crate::buffer::NULL_BIAS;
use crate::error::Error;
use crate::reflect::{
    downcast_ref, AnyValue, CellOps, SharedOps, TypeDescriptor, TypeKind, WrapperOps,
};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};
use crate::resolver::ref_resolver::RefToken;
use crate::types::NULL_ID;

use super::Formatter;

/// `Rc<RefCell<T>>` with a constructible `T`: the shell can be registered
/// before its content is read, which is what lets cycles resolve.
struct CellShell {
    ops: CellOps,
    value: Rc<TypeDescriptor>,
    formatter: Rc<dyn Formatter>,
}

pub struct SharedFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: SharedOps,
    inner: Rc<dyn Formatter>,
    cell: Option<CellShell>,
}

impl SharedFormatter {
    fn write_content(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.enter(&self.descriptor)?;
        let result = self.inner.write((self.ops.get)(value)?, ctx);
        ctx.leave();
        result
    }

    fn read_token(&self, ctx: &mut ReadContext<'_>) -> Result<RefToken, Error> {
        let raw = ctx.reader.read_biased_varint32(NULL_BIAS)?;
        RefToken::classify(raw, ctx.objects().len(), "object")
    }

    fn read_new(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        ctx.enter(&self.descriptor)?;
        let result = self.read_new_content(ctx);
        ctx.leave();
        result
    }

    fn read_new_content(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        if !ctx.config().is_preserve_references() {
            return (self.ops.wrap)(self.inner.read(ctx)?);
        }
        if let Some(cell) = &self.cell {
            let shell = (self.ops.wrap)((cell.ops.wrap)(cell.value.construct()?)?)?;
            let local = (self.ops.share)(shell.as_ref())?;
            ctx.objects().push(shell);
            let referent = (self.ops.get)(local.as_ref())?;
            (cell.ops.visit_mut)(referent, &mut |inner| cell.formatter.read_into(inner, ctx))?;
            return Ok(local);
        }
        let id = ctx.objects().create_slot();
        let shell = (self.ops.wrap)(self.inner.read(ctx)?)?;
        let local = (self.ops.share)(shell.as_ref())?;
        ctx.objects().fill_slot(id, shell)?;
        Ok(local)
    }

    fn read_existing(&self, id: u32, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let shell = ctx.objects().get(id)?;
        (self.ops.share)(&**shell)
    }
}

impl Formatter for SharedFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        if !ctx.config().is_preserve_references() {
            let next = ctx.objects().len() as i32;
            ctx.writer.write_biased_varint32(next, NULL_BIAS);
            return self.write_content(value, ctx);
        }
        let address = (self.ops.address)(value)?;
        if let Some(id) = ctx.objects().try_get_id(address) {
            ctx.writer.write_biased_varint32(id as i32, NULL_BIAS);
            return Ok(());
        }
        let id = ctx
            .objects()
            .register_shared(address, (self.ops.keep_alive)(value)?);
        ctx.writer.write_biased_varint32(id as i32, NULL_BIAS);
        self.write_content(value, ctx)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        match self.read_nullable(ctx)? {
            Some(value) => Ok(value),
            None => Err(Error::invalid_data(format!(
                "null reference for non-optional {}",
                self.descriptor.full_name()
            ))),
        }
    }

    /// Populates the referent of an existing shell. A back reference must
    /// point at that same shell.
    fn read_into(&self, target: &mut dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        let target: &dyn Any = target;
        match self.read_token(ctx)? {
            RefToken::Null => Err(Error::readonly_conflict(format!(
                "cannot replace an existing {} with null",
                self.descriptor.full_name()
            ))),
            RefToken::Existing(id) => {
                let shell = ctx.objects().get(id)?;
                if (self.ops.address)(&**shell)? != (self.ops.address)(target)? {
                    return Err(Error::readonly_conflict(format!(
                        "{} refers to a different object than the existing one",
                        self.descriptor.full_name()
                    )));
                }
                Ok(())
            }
            RefToken::New => {
                if ctx.config().is_preserve_references() {
                    ctx.objects().push((self.ops.share)(target)?);
                }
                ctx.enter(&self.descriptor)?;
                let result = self.populate(target, ctx);
                ctx.leave();
                result
            }
        }
    }

    fn inline_null(&self) -> bool {
        true
    }

    fn write_null(&self, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.writer.write_biased_varint32(NULL_ID, NULL_BIAS);
        Ok(())
    }

    fn read_nullable(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Box<dyn Any>>, Error> {
        match self.read_token(ctx)? {
            RefToken::Null => Ok(None),
            RefToken::Existing(id) => self.read_existing(id, ctx).map(Some),
            RefToken::New => self.read_new(ctx).map(Some),
        }
    }

    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        if (self.ops.address)(a).ok()? == (self.ops.address)(b).ok()? {
            return Some(true);
        }
        self.inner
            .values_equal((self.ops.get)(a).ok()?, (self.ops.get)(b).ok()?)
    }
}

impl SharedFormatter {
    fn populate(&self, target: &dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        let referent = (self.ops.get)(target)?;
        if let Some(cell) = &self.cell {
            return (cell.ops.visit_mut)(referent, &mut |inner| {
                cell.formatter.read_into(inner, ctx)
            });
        }
        let incoming = self.inner.read(ctx)?;
        match self.inner.values_equal(referent, incoming.as_ref()) {
            Some(true) => Ok(()),
            _ => Err(Error::readonly_conflict(format!(
                "the referent of {} cannot be replaced in place",
                self.descriptor.full_name()
            ))),
        }
    }
}

pub struct CellFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: CellOps,
    inner: Rc<dyn Formatter>,
}

impl Formatter for CellFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        (self.ops.visit)(value, &mut |inner| self.inner.write(inner, ctx))
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        (self.ops.wrap)(self.inner.read(ctx)?)
    }

    fn read_into(&self, target: &mut dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        (self.ops.visit_mut)(target, &mut |inner| self.inner.read_into(inner, ctx))
    }

    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        let mut equal = None;
        (self.ops.visit)(a, &mut |a| {
            (self.ops.visit)(b, &mut |b| {
                equal = self.inner.values_equal(a, b);
                Ok(())
            })
        })
        .ok()?;
        equal
    }
}

pub struct BoxFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: WrapperOps,
    inner: Rc<dyn Formatter>,
}

impl Formatter for BoxFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        self.inner.write((self.ops.get)(value)?, ctx)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        (self.ops.wrap)(self.inner.read(ctx)?)
    }

    fn read_into(&self, target: &mut dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        self.inner.read_into((self.ops.get_mut)(target)?, ctx)
    }

    fn inline_null(&self) -> bool {
        self.inner.inline_null()
    }

    fn write_null(&self, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        self.inner.write_null(ctx)
    }

    fn read_nullable(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Box<dyn Any>>, Error> {
        self.inner
            .read_nullable(ctx)?
            .map(self.ops.wrap)
            .transpose()
    }

    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        self.inner
            .values_equal((self.ops.get)(a).ok()?, (self.ops.get)(b).ok()?)
    }
}

/// `AnyValue`: a type token, then the payload in that type's encoding.
pub struct AnyValueFormatter {
    descriptor: Rc<TypeDescriptor>,
}

impl Formatter for AnyValueFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        let value = downcast_ref::<AnyValue>(value)?;
        let descriptor = ctx.types().descriptor(value.type_key())?;
        let formatter = ctx.formatter_for(&descriptor)?;
        ctx.write_type_token(&descriptor);
        formatter.write(value.value(), ctx)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        match self.read_nullable(ctx)? {
            Some(value) => Ok(value),
            None => Err(Error::invalid_data("null type token for a non-optional AnyValue")),
        }
    }

    fn inline_null(&self) -> bool {
        true
    }

    fn write_null(&self, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.write_null_type_token();
        Ok(())
    }

    fn read_nullable(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Box<dyn Any>>, Error> {
        let Some(descriptor) = ctx.read_type_token()? else {
            return Ok(None);
        };
        let formatter = ctx.formatter_for(&descriptor)?;
        let value = formatter.read(ctx)?;
        Ok(Some(Box::new(AnyValue::from_parts(descriptor.key(), value)?)))
    }
}

pub struct ReferenceResolver;

impl Resolver for ReferenceResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        let formatter: Rc<dyn Formatter> = match descriptor.kind() {
            TypeKind::Shared(ops) => {
                let inner = formatters.types().descriptor(ops.inner)?;
                let cell = match inner.kind() {
                    TypeKind::Cell(cell) => {
                        let value = formatters.types().descriptor(cell.inner)?;
                        if value.ops().construct.is_some() {
                            Some(CellShell {
                                ops: cell.clone(),
                                formatter: formatters.get_for(&value)?,
                                value,
                            })
                        } else {
                            None
                        }
                    }
                    _ => None,
                };
                Rc::new(SharedFormatter {
                    descriptor: descriptor.clone(),
                    ops: ops.clone(),
                    inner: formatters.get_for(&inner)?,
                    cell,
                })
            }
            TypeKind::Cell(ops) => Rc::new(CellFormatter {
                descriptor: descriptor.clone(),
                ops: ops.clone(),
                inner: formatters.get(ops.inner)?,
            }),
            TypeKind::Boxed(ops) => Rc::new(BoxFormatter {
                descriptor: descriptor.clone(),
                ops: ops.clone(),
                inner: formatters.get(ops.inner)?,
            }),
            TypeKind::Any => Rc::new(AnyValueFormatter {
                descriptor: descriptor.clone(),
            }),
            _ => return Ok(None),
        };
        Ok(Some(formatter))
    }
}
