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

use std::any::Any;
use std::rc::Rc;

use crate::error::Error;
use crate::reflect::{NullableOps, TypeDescriptor, TypeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};
use crate::types::Presence;

use super::Formatter;

/// `Option<T>`. Inner formatters with an inline null encode `None` in their
/// own header; the rest get a presence byte.
pub struct NullableFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: NullableOps,
    inner: Rc<dyn Formatter>,
}

impl Formatter for NullableFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        let value = (self.ops.get)(value)?;
        if self.inner.inline_null() {
            return match value {
                Some(value) => self.inner.write(value, ctx),
                None => self.inner.write_null(ctx),
            };
        }
        match value {
            Some(value) => {
                ctx.writer.write_u8(Presence::Value.into());
                self.inner.write(value, ctx)
            }
            None => {
                ctx.writer.write_u8(Presence::Null.into());
                Ok(())
            }
        }
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let value = if self.inner.inline_null() {
            self.inner.read_nullable(ctx)?
        } else {
            let presence = Presence::try_from(ctx.reader.read_u8()?).map_err(|e| {
                Error::invalid_data(format!("invalid presence marker {}", e.number))
            })?;
            match presence {
                Presence::Value => Some(self.inner.read(ctx)?),
                Presence::Null => None,
            }
        };
        match value {
            Some(value) => (self.ops.some)(value),
            None => Ok((self.ops.none)()),
        }
    }

    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        match ((self.ops.get)(a).ok()?, (self.ops.get)(b).ok()?) {
            (Some(a), Some(b)) => self.inner.values_equal(a, b),
            (None, None) => Some(true),
            _ => Some(false),
        }
    }
}

pub struct NullableResolver;

impl Resolver for NullableResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        let TypeKind::Nullable(ops) = descriptor.kind() else {
            return Ok(None);
        };
        Ok(Some(Rc::new(NullableFormatter {
            descriptor: descriptor.clone(),
            ops: ops.clone(),
            inner: formatters.get(ops.inner)?,
        })))
    }
}
