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
use crate::reflect::{KeyValueOps, TypeDescriptor, TypeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};

use super::Formatter;

/// `KeyValuePair<K, V>`: the key, then the value.
pub struct KeyValueFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: KeyValueOps,
    key: Rc<dyn Formatter>,
    value: Rc<dyn Formatter>,
}

impl Formatter for KeyValueFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        let (key, value) = (self.ops.parts)(value)?;
        self.key.write(key, ctx)?;
        self.value.write(value, ctx)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let key = self.key.read(ctx)?;
        let value = self.value.read(ctx)?;
        (self.ops.assemble)(key, value)
    }

    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        let (a_key, a_value) = (self.ops.parts)(a).ok()?;
        let (b_key, b_value) = (self.ops.parts)(b).ok()?;
        Some(self.key.values_equal(a_key, b_key)? && self.value.values_equal(a_value, b_value)?)
    }
}

pub struct KeyValueResolver;

impl Resolver for KeyValueResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        let TypeKind::KeyValuePair(ops) = descriptor.kind() else {
            return Ok(None);
        };
        Ok(Some(Rc::new(KeyValueFormatter {
            descriptor: descriptor.clone(),
            ops: ops.clone(),
            key: formatters.get(ops.key)?,
            value: formatters.get(ops.value)?,
        })))
    }
}
