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

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::buffer::Reader;
use crate::config::Config;
use crate::error::Error;
use crate::meta::schema::intern;
use crate::meta::Schema;
use crate::reflect::TypeDescriptor;
use crate::resolver::type_resolver::TypeResolver;

/// Memoizes primary schemas per type and secondary schemas per type by shape.
#[derive(Default)]
pub struct SchemaResolver {
    primaries: RefCell<HashMap<TypeId, Rc<Schema>>>,
    secondaries: RefCell<HashMap<TypeId, Vec<Rc<Schema>>>>,
}

impl SchemaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(
        &self,
        descriptor: &TypeDescriptor,
        config: &Config,
        types: &TypeResolver,
    ) -> Result<Rc<Schema>, Error> {
        if let Some(schema) = self.primaries.borrow().get(&descriptor.id()) {
            return Ok(schema.clone());
        }
        let schema = Rc::new(Schema::compute_primary(descriptor, config, types)?);
        self.primaries
            .borrow_mut()
            .insert(descriptor.id(), schema.clone());
        Ok(schema)
    }

    /// Reads a schema from the wire, returning the primary instance when the
    /// writer's shape matches the local one.
    pub fn read_schema(
        &self,
        reader: &mut Reader,
        descriptor: &TypeDescriptor,
        config: &Config,
        types: &TypeResolver,
    ) -> Result<Rc<Schema>, Error> {
        let primary = self.primary(descriptor, config, types)?;
        let schema = Schema::read_from_wire(reader, descriptor, &primary, config)?;
        let mut secondaries = self.secondaries.borrow_mut();
        let known = secondaries.entry(descriptor.id()).or_default();
        let (schema, is_new) = intern(known, &primary, schema);
        if is_new {
            debug!(
                type_name = descriptor.full_name(),
                members = schema.members().len(),
                skipped = schema.members().iter().filter(|m| m.is_skip()).count(),
                "new secondary schema"
            );
        }
        Ok(schema)
    }

    pub fn secondary_count(&self, type_id: TypeId) -> usize {
        self.secondaries
            .borrow()
            .get(&type_id)
            .map_or(0, |schemas| schemas.len())
    }
}
