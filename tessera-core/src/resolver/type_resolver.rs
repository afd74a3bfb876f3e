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

use crate::error::Error;
use crate::reflect::{Reflect, TypeDescriptor, TypeKey};

/// Every type described so far, by id and by binding name.
#[derive(Default)]
pub struct TypeRegistry {
    by_id: HashMap<TypeId, Rc<TypeDescriptor>>,
    by_name: HashMap<String, Rc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn by_id(&self, type_id: TypeId) -> Option<&Rc<TypeDescriptor>> {
        self.by_id.get(&type_id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Rc<TypeDescriptor>> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Maps types to the names written in type tokens and back.
pub trait TypeBinder {
    fn name_of(&self, descriptor: &TypeDescriptor) -> String;

    fn type_of(&self, name: &str, registry: &TypeRegistry) -> Option<Rc<TypeDescriptor>>;
}

/// Binds every type by its descriptor name.
#[derive(Clone, Copy, Debug, Default)]
pub struct NameBinder;

impl TypeBinder for NameBinder {
    fn name_of(&self, descriptor: &TypeDescriptor) -> String {
        descriptor.name().to_owned()
    }

    fn type_of(&self, name: &str, registry: &TypeRegistry) -> Option<Rc<TypeDescriptor>> {
        registry.by_name(name).cloned()
    }
}

/// Describes types once and keeps their descriptors for the lifetime of a
/// serializer.
pub struct TypeResolver {
    binder: Rc<dyn TypeBinder>,
    registry: RefCell<TypeRegistry>,
    known: Vec<Rc<TypeDescriptor>>,
}

impl TypeResolver {
    /// Creates a resolver whose known types are sealed in the given order.
    pub fn new(binder: Rc<dyn TypeBinder>, known: &[TypeKey]) -> Result<TypeResolver, Error> {
        let mut resolver = TypeResolver {
            binder,
            registry: RefCell::new(TypeRegistry::default()),
            known: Vec::with_capacity(known.len()),
        };
        for key in known {
            let descriptor = resolver.descriptor(*key)?;
            resolver.known.push(descriptor);
        }
        Ok(resolver)
    }

    /// Descriptor of `key`, describing the type on first request.
    pub fn descriptor(&self, key: TypeKey) -> Result<Rc<TypeDescriptor>, Error> {
        if let Some(descriptor) = self.registry.borrow().by_id(key.id()) {
            return Ok(descriptor.clone());
        }
        let descriptor = Rc::new(key.describe());
        let name = self.binder.name_of(&descriptor);
        let mut registry = self.registry.borrow_mut();
        if let Some(existing) = registry.by_name(&name) {
            return Err(Error::configuration(format!(
                "{} and {} are both bound to the name {}",
                existing.full_name(),
                descriptor.full_name(),
                name
            )));
        }
        debug!(
            name = name.as_str(),
            kind = descriptor.kind().label(),
            "described type"
        );
        registry.by_id.insert(key.id(), descriptor.clone());
        registry.by_name.insert(name, descriptor.clone());
        Ok(descriptor)
    }

    pub fn descriptor_of<T: Reflect>(&self) -> Result<Rc<TypeDescriptor>, Error> {
        self.descriptor(TypeKey::of::<T>())
    }

    pub fn lookup(&self, type_id: TypeId) -> Option<Rc<TypeDescriptor>> {
        self.registry.borrow().by_id(type_id).cloned()
    }

    pub fn name_of(&self, descriptor: &TypeDescriptor) -> String {
        self.binder.name_of(descriptor)
    }

    pub fn try_bind_name(&self, name: &str) -> Option<Rc<TypeDescriptor>> {
        self.binder.type_of(name, &self.registry.borrow())
    }

    /// Resolves a name read from a type token.
    pub fn bind_name(&self, name: &str) -> Result<Rc<TypeDescriptor>, Error> {
        self.try_bind_name(name).ok_or_else(|| {
            Error::unsupported_type(format!(
                "no local type is bound to {name}; register it before reading"
            ))
        })
    }

    pub fn known_types(&self) -> &[Rc<TypeDescriptor>] {
        &self.known
    }

    pub fn is_known(&self, type_id: TypeId) -> bool {
        self.known.iter().any(|d| d.id() == type_id)
    }
}
