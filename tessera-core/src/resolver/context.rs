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

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::buffer::{Reader, Writer, NULL_BIAS};
use crate::config::Config;
use crate::error::Error;
use crate::formatter::Formatter;
use crate::meta::Schema;
use crate::reflect::{TypeDescriptor, TypeKey};
use crate::resolver::formatter_resolver::FormatterResolver;
use crate::resolver::ref_resolver::{ObjectRefWriter, RefReader, RefToken, RefWriter};
use crate::resolver::schema_resolver::SchemaResolver;
use crate::resolver::type_resolver::TypeResolver;
use crate::types::NULL_ID;

/// Serialize side caches of one pass (or of many, in persist mode).
pub struct WriteSession {
    pub(crate) objects: ObjectRefWriter,
    pub(crate) types: RefWriter<TypeId>,
    pub(crate) schemas_written: HashSet<TypeId>,
    /// Names registered after the known types, in id order.
    defined_types: Vec<String>,
    /// Schemas in the order they were first written.
    defined_schemas: Vec<(String, Rc<Schema>)>,
}

impl WriteSession {
    pub fn new(known: &[TypeId]) -> Self {
        let mut types = RefWriter::new();
        types.clear_but_reseed_known(known);
        WriteSession {
            objects: ObjectRefWriter::new(),
            types,
            schemas_written: HashSet::new(),
            defined_types: Vec::new(),
            defined_schemas: Vec::new(),
        }
    }

    pub fn reset_objects(&mut self) {
        self.objects.clear();
    }

    /// Schemas are announced once per type cache lifetime, so they reset together.
    pub fn reset_types(&mut self, known: &[TypeId]) {
        self.types.clear_but_reseed_known(known);
        self.schemas_written.clear();
        self.defined_types.clear();
        self.defined_schemas.clear();
    }
}

/// Deserialize side caches.
pub struct ReadSession {
    pub(crate) objects: RefReader<Box<dyn Any>>,
    pub(crate) types: RefReader<Rc<TypeDescriptor>>,
    pub(crate) active_schemas: HashMap<TypeId, Rc<Schema>>,
}

impl ReadSession {
    pub fn new(known: &[Rc<TypeDescriptor>]) -> Self {
        let mut types = RefReader::new("type");
        types.clear_but_reseed_known(known);
        ReadSession {
            objects: RefReader::new("object"),
            types,
            active_schemas: HashMap::new(),
        }
    }

    pub fn reset_objects(&mut self) {
        self.objects.clear();
    }

    pub fn reset_types(&mut self, known: &[Rc<TypeDescriptor>]) {
        self.types.clear_but_reseed_known(known);
        self.active_schemas.clear();
    }
}

/// Lengths of the write side logs before a length prefixed member.
#[derive(Clone, Copy, Debug)]
pub struct DefinitionMark {
    objects: usize,
    types: usize,
    schemas: usize,
}

pub struct WriteContext<'a> {
    pub writer: Writer<'a>,
    session: &'a mut WriteSession,
    formatters: &'a FormatterResolver,
    depth: u32,
}

impl<'a> WriteContext<'a> {
    pub fn new(
        writer: Writer<'a>,
        session: &'a mut WriteSession,
        formatters: &'a FormatterResolver,
    ) -> WriteContext<'a> {
        WriteContext {
            writer,
            session,
            formatters,
            depth: 0,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &'a Config {
        self.formatters.config()
    }

    #[inline(always)]
    pub fn types(&self) -> &'a TypeResolver {
        self.formatters.types()
    }

    #[inline(always)]
    pub fn schemas(&self) -> &'a SchemaResolver {
        self.formatters.schemas()
    }

    pub fn formatter(&self, key: TypeKey) -> Result<Rc<dyn Formatter>, Error> {
        self.formatters.get(key)
    }

    pub fn formatter_for(&self, descriptor: &Rc<TypeDescriptor>) -> Result<Rc<dyn Formatter>, Error> {
        self.formatters.get_for(descriptor)
    }

    pub fn objects(&mut self) -> &mut ObjectRefWriter {
        &mut self.session.objects
    }

    /// Writes the token of `descriptor`, followed by its bound name the first
    /// time the type appears in the type cache.
    pub fn write_type_token(&mut self, descriptor: &TypeDescriptor) {
        let type_id = descriptor.id();
        match self.session.types.try_get_id(&type_id) {
            Some(id) => self.writer.write_biased_varint32(id as i32, NULL_BIAS),
            None => {
                let id = self.session.types.register(type_id);
                self.writer.write_biased_varint32(id as i32, NULL_BIAS);
                let name = self.types().name_of(descriptor);
                self.writer.write_string(&name);
                self.session.defined_types.push(name);
            }
        }
    }

    pub fn write_null_type_token(&mut self) {
        self.writer.write_biased_varint32(NULL_ID, NULL_BIAS);
    }

    /// Returns true the first time a type's schema is due in the type cache lifetime.
    pub fn mark_schema_written(
        &mut self,
        descriptor: &TypeDescriptor,
        schema: &Rc<Schema>,
    ) -> bool {
        if !self.session.schemas_written.insert(descriptor.id()) {
            return false;
        }
        let name = self.types().name_of(descriptor);
        self.session.defined_schemas.push((name, schema.clone()));
        true
    }

    pub fn definition_mark(&self) -> DefinitionMark {
        DefinitionMark {
            objects: self.session.objects.len(),
            types: self.session.defined_types.len(),
            schemas: self.session.defined_schemas.len(),
        }
    }

    /// Writes what was introduced since `mark`: the number of new object
    /// ids, then new type names, then first schemas. A reader skipping the
    /// region replays them so later tokens keep their meaning.
    pub fn write_definitions(&mut self, mark: DefinitionMark) -> Result<(), Error> {
        let objects = self.session.objects.len().saturating_sub(mark.objects);
        self.writer.write_varuint32(objects as u32);
        let types = &self.session.defined_types[mark.types..];
        self.writer.write_varuint32(types.len() as u32);
        for name in types {
            self.writer.write_string(name);
        }
        let schemas = &self.session.defined_schemas[mark.schemas..];
        self.writer.write_varuint32(schemas.len() as u32);
        for (name, schema) in schemas {
            self.writer.write_string(name);
            schema.write_to_wire(&mut self.writer)?;
        }
        Ok(())
    }

    pub fn enter(&mut self, descriptor: &TypeDescriptor) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.config().depth_limit() {
            return Err(Error::depth_exceed(format!(
                "nesting exceeds {} levels while writing {}",
                self.config().depth_limit(),
                descriptor.full_name()
            )));
        }
        Ok(())
    }

    #[inline(always)]
    pub fn leave(&mut self) {
        self.depth -= 1;
    }
}

pub struct ReadContext<'a> {
    pub reader: Reader<'a>,
    session: &'a mut ReadSession,
    formatters: &'a FormatterResolver,
    depth: u32,
}

impl<'a> ReadContext<'a> {
    pub fn new(
        reader: Reader<'a>,
        session: &'a mut ReadSession,
        formatters: &'a FormatterResolver,
    ) -> ReadContext<'a> {
        ReadContext {
            reader,
            session,
            formatters,
            depth: 0,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &'a Config {
        self.formatters.config()
    }

    #[inline(always)]
    pub fn types(&self) -> &'a TypeResolver {
        self.formatters.types()
    }

    #[inline(always)]
    pub fn schemas(&self) -> &'a SchemaResolver {
        self.formatters.schemas()
    }

    pub fn formatter(&self, key: TypeKey) -> Result<Rc<dyn Formatter>, Error> {
        self.formatters.get(key)
    }

    pub fn formatter_for(&self, descriptor: &Rc<TypeDescriptor>) -> Result<Rc<dyn Formatter>, Error> {
        self.formatters.get_for(descriptor)
    }

    pub fn objects(&mut self) -> &mut RefReader<Box<dyn Any>> {
        &mut self.session.objects
    }

    /// Reads a type token; `None` for the null token.
    pub fn read_type_token(&mut self) -> Result<Option<Rc<TypeDescriptor>>, Error> {
        let raw = self.reader.read_biased_varint32(NULL_BIAS)?;
        match RefToken::classify(raw, self.session.types.len(), "type")? {
            RefToken::Null => Ok(None),
            RefToken::Existing(id) => Ok(Some(self.session.types.get(id)?.clone())),
            RefToken::New => {
                let name = self.reader.read_string(self.config().string_limit())?;
                let descriptor = self.types().bind_name(&name)?;
                self.session.types.push(descriptor.clone());
                Ok(Some(descriptor))
            }
        }
    }

    /// Steps over the definitions trailing a member that was read in full.
    pub fn skip_definitions(&mut self) -> Result<(), Error> {
        let config = self.config();
        self.reader.read_varuint32()?;
        let types = self.reader.read_varuint32()?;
        for _ in 0..types {
            self.reader.read_string(config.string_limit())?;
        }
        let schemas = self.reader.read_varuint32()?;
        for _ in 0..schemas {
            self.reader.read_string(config.string_limit())?;
            Schema::skip_wire(&mut self.reader, config)?;
        }
        Ok(())
    }

    /// Replays the definitions trailing a skipped member of `skipped` bytes.
    pub fn apply_definitions(&mut self, skipped: usize) -> Result<(), Error> {
        let (config, types, schemas) = (self.config(), self.types(), self.schemas());
        let objects = self.read_definition_count("object", skipped)?;
        self.session.objects.skip_slots(objects);
        for _ in 0..self.read_definition_count("type", skipped)? {
            let name = self.reader.read_string(config.string_limit())?;
            match types.try_bind_name(&name) {
                Some(descriptor) => {
                    self.session.types.push(descriptor);
                }
                None => self.session.types.skip_slots(1),
            }
        }
        for _ in 0..self.read_definition_count("schema", skipped)? {
            let name = self.reader.read_string(config.string_limit())?;
            match types.try_bind_name(&name).filter(|d| d.object().is_some()) {
                Some(descriptor) => {
                    let schema =
                        schemas.read_schema(&mut self.reader, &descriptor, config, types)?;
                    self.activate_schema(descriptor.id(), schema);
                }
                None => Schema::skip_wire(&mut self.reader, config)?,
            }
        }
        Ok(())
    }

    // every definition costs at least one byte of the skipped region
    fn read_definition_count(&mut self, what: &str, skipped: usize) -> Result<usize, Error> {
        let count = self.reader.read_varuint32()? as usize;
        if count > skipped {
            return Err(Error::framing(format!(
                "skipped member of {skipped} bytes claims {count} {what} definitions"
            )));
        }
        Ok(count)
    }

    pub fn active_schema(&self, type_id: TypeId) -> Option<Rc<Schema>> {
        self.session.active_schemas.get(&type_id).cloned()
    }

    pub fn activate_schema(&mut self, type_id: TypeId, schema: Rc<Schema>) {
        self.session.active_schemas.insert(type_id, schema);
    }

    pub fn enter(&mut self, descriptor: &TypeDescriptor) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.config().depth_limit() {
            return Err(Error::depth_exceed(format!(
                "nesting exceeds {} levels while reading {}",
                self.config().depth_limit(),
                descriptor.full_name()
            )));
        }
        Ok(())
    }

    #[inline(always)]
    pub fn leave(&mut self) {
        self.depth -= 1;
    }
}
