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
use crate::reflect::{EnumOps, TypeDescriptor, TypeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};

use super::Formatter;

/// Fieldless enums, written as the zigzag varint of their discriminant.
pub struct EnumFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: EnumOps,
}

impl Formatter for EnumFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.writer.write_varint64((self.ops.to_discriminant)(value)?);
        Ok(())
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let discriminant = ctx.reader.read_varint64()?;
        (self.ops.from_discriminant)(discriminant).ok_or_else(|| {
            Error::unknown_enum(format!(
                "{} has no variant with discriminant {}",
                self.descriptor.full_name(),
                discriminant
            ))
        })
    }

    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        match ((self.ops.to_discriminant)(a), (self.ops.to_discriminant)(b)) {
            (Ok(a), Ok(b)) => Some(a == b),
            _ => None,
        }
    }
}

pub struct EnumResolver;

impl Resolver for EnumResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        _formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        let TypeKind::Enum(ops) = descriptor.kind() else {
            return Ok(None);
        };
        Ok(Some(Rc::new(EnumFormatter {
            descriptor: descriptor.clone(),
            ops: ops.clone(),
        })))
    }
}
