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

//! Resolution of one formatter per type, through an ordered resolver chain.

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::config::Config;
use crate::error::Error;
use crate::formatter::{self, Formatter, FormatterSlot};
use crate::reflect::{TypeDescriptor, TypeKey, TypeKind};
use crate::resolver::schema_resolver::SchemaResolver;
use crate::resolver::type_resolver::TypeResolver;

/// One link of the resolution chain.
///
/// Returns `Ok(None)` to let the next resolver try. Resolvers may ask
/// `formatters` for the formatters of inner types; a type currently being
/// resolved comes back as its forward-declared slot.
pub trait Resolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error>;
}

pub struct FormatterResolver {
    config: Rc<Config>,
    types: Rc<TypeResolver>,
    schemas: Rc<SchemaResolver>,
    chain: Vec<Rc<dyn Resolver>>,
    cache: RefCell<HashMap<TypeId, Rc<dyn Formatter>>>,
    in_flight: RefCell<Vec<TypeId>>,
    depth: Cell<u32>,
}

impl FormatterResolver {
    pub fn new(
        config: Rc<Config>,
        types: Rc<TypeResolver>,
        schemas: Rc<SchemaResolver>,
    ) -> FormatterResolver {
        let chain = formatter::resolution_chain(&config.resolvers);
        FormatterResolver {
            config,
            types,
            schemas,
            chain,
            cache: RefCell::new(HashMap::new()),
            in_flight: RefCell::new(Vec::new()),
            depth: Cell::new(0),
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline(always)]
    pub fn types(&self) -> &TypeResolver {
        &self.types
    }

    #[inline(always)]
    pub fn schemas(&self) -> &SchemaResolver {
        &self.schemas
    }

    pub fn get(&self, key: TypeKey) -> Result<Rc<dyn Formatter>, Error> {
        if let Some(formatter) = self.cache.borrow().get(&key.id()) {
            return Ok(formatter.clone());
        }
        let descriptor = self.types.descriptor(key)?;
        self.get_for(&descriptor)
    }

    pub fn get_for(&self, descriptor: &Rc<TypeDescriptor>) -> Result<Rc<dyn Formatter>, Error> {
        if let Some(formatter) = self.cache.borrow().get(&descriptor.id()) {
            return Ok(formatter.clone());
        }
        if self.config.is_denied(descriptor) {
            return Err(Error::unsupported_type(format!(
                "{} is on the type denylist",
                descriptor.full_name()
            )));
        }
        if matches!(descriptor.kind(), TypeKind::Opaque) {
            return Err(Error::unsupported_type(format!(
                "{} cannot be serialized",
                descriptor.full_name()
            )));
        }

        let type_id = descriptor.id();
        let slot = Rc::new(FormatterSlot::new(descriptor.clone()));
        self.cache.borrow_mut().insert(type_id, slot.clone());
        self.in_flight.borrow_mut().push(type_id);
        debug!(type_name = descriptor.full_name(), "published formatter slot");

        self.depth.set(self.depth.get() + 1);
        let resolved = self.run_chain(descriptor);
        self.depth.set(self.depth.get() - 1);
        let outermost = self.depth.get() == 0;

        match resolved {
            Ok(formatter) => {
                slot.fill(formatter.clone())?;
                self.cache.borrow_mut().insert(type_id, formatter.clone());
                if outermost {
                    self.in_flight.borrow_mut().clear();
                }
                debug!(
                    type_name = descriptor.full_name(),
                    kind = descriptor.kind().label(),
                    "resolved formatter"
                );
                Ok(formatter)
            }
            Err(err) => {
                if outermost {
                    let mut cache = self.cache.borrow_mut();
                    for id in self.in_flight.borrow_mut().drain(..) {
                        cache.remove(&id);
                    }
                }
                Err(err)
            }
        }
    }

    fn run_chain(&self, descriptor: &Rc<TypeDescriptor>) -> Result<Rc<dyn Formatter>, Error> {
        for resolver in &self.chain {
            if let Some(formatter) = resolver.resolve(descriptor, self)? {
                return Ok(formatter);
            }
        }
        Err(Error::unsupported_type(format!(
            "no formatter can handle {} ({})",
            descriptor.full_name(),
            descriptor.kind().label()
        )))
    }

    pub fn is_cached(&self, type_id: TypeId) -> bool {
        self.cache.borrow().contains_key(&type_id)
    }
}
