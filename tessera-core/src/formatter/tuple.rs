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
use crate::reflect::{TupleOps, TypeDescriptor, TypeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};

use super::Formatter;

/// Tuples, written element by element with no header.
pub struct TupleFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: TupleOps,
    elements: Vec<Rc<dyn Formatter>>,
}

impl Formatter for TupleFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        for (index, element) in self.elements.iter().enumerate() {
            element.write((self.ops.element)(value, index)?, ctx)?;
        }
        Ok(())
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let mut values = Vec::with_capacity(self.elements.len());
        for element in &self.elements {
            values.push(element.read(ctx)?);
        }
        (self.ops.assemble)(values)
    }

    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        for (index, element) in self.elements.iter().enumerate() {
            let left = (self.ops.element)(a, index).ok()?;
            let right = (self.ops.element)(b, index).ok()?;
            if !element.values_equal(left, right)? {
                return Some(false);
            }
        }
        Some(true)
    }
}

pub struct TupleResolver;

impl Resolver for TupleResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        let TypeKind::Tuple(ops) = descriptor.kind() else {
            return Ok(None);
        };
        let elements = ops
            .elements
            .iter()
            .map(|key| formatters.get(*key))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Rc::new(TupleFormatter {
            descriptor: descriptor.clone(),
            ops: ops.clone(),
            elements,
        })))
    }
}
