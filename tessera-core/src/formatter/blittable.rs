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
use crate::reflect::{BlittableOps, TypeDescriptor};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};

use super::Formatter;

/// Raw little-endian layout copy of a fixed-size struct.
pub struct BlittableFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: BlittableOps,
}

impl Formatter for BlittableFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        (self.ops.write)(value, ctx.writer.reserve_bytes(self.ops.size))
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        (self.ops.read)(ctx.reader.read_bytes(self.ops.size)?)
    }
}

/// Layout copies carry no member names, so version tolerant instances fall
/// through to the object formatter.
pub struct BlittableResolver;

impl Resolver for BlittableResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        if formatters.config().is_version_tolerant() {
            return Ok(None);
        }
        Ok(descriptor
            .object()
            .and_then(|object| object.blittable)
            .map(|ops| {
                Rc::new(BlittableFormatter {
                    descriptor: descriptor.clone(),
                    ops,
                }) as Rc<dyn Formatter>
            }))
    }
}
