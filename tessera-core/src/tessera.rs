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
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::buffer::{Reader, Writer, NULL_BIAS};
use crate::config::Config;
use crate::error::Error;
use crate::formatter::Formatter;
use crate::meta::{protocol_checksum, Schema};
use crate::reflect::{downcast_box, AnyValue, Reflect, TypeDescriptor};
use crate::resolver::context::{ReadContext, ReadSession, WriteContext, WriteSession};
use crate::resolver::formatter_resolver::FormatterResolver;
use crate::resolver::ref_resolver::RefToken;
use crate::resolver::schema_resolver::SchemaResolver;
use crate::resolver::type_resolver::TypeResolver;

/// The serializer instance.
///
/// `Tessera` writes object graphs as `[checksum?][type token][payload]`,
/// where the payload is produced by the formatter resolved for the root
/// type. Shared references (`Rc<T>`) are written once and referred to by id
/// afterwards, so aliasing and cycles survive a round trip.
///
/// An instance owns its caches and is single threaded: it is `!Send`, and a
/// call made while another call on the same instance is running fails with
/// [`Error::NotAllowed`]. Use one instance per thread.
///
/// # Examples
///
/// ```rust
/// use tessera_core::config::Config;
/// use tessera_core::reflect::{ObjectBuilder, Reflect, TypeDescriptor};
/// use tessera_core::tessera::Tessera;
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Reflect for Point {
///     fn describe() -> TypeDescriptor {
///         ObjectBuilder::<Self>::new()
///             .name("Point")
///             .field::<i32>("x", |p: &Self| &p.x, |p: &mut Self| &mut p.x)
///             .field::<i32>("y", |p: &Self| &p.y, |p: &mut Self| &mut p.y)
///             .build()
///     }
/// }
///
/// let tessera = Tessera::new(Config::new()).unwrap();
/// let bytes = tessera.serialize_to_vec(&Point { x: 1, y: 2 }).unwrap();
/// let point: Point = tessera.deserialize_from(&bytes).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
pub struct Tessera {
    config: Rc<Config>,
    types: Rc<TypeResolver>,
    schemas: Rc<SchemaResolver>,
    formatters: FormatterResolver,
    checksum: u32,
    known_ids: Vec<TypeId>,
    write_session: RefCell<WriteSession>,
    read_session: RefCell<ReadSession>,
    in_progress: Cell<bool>,
}

/// Clears the in-progress flag when a call returns, errors included.
struct CallGuard<'a>(&'a Cell<bool>);

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Tessera {
    /// Validates `config`, seals its known types, resolves their formatters
    /// and computes the protocol checksum.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] when the checksum is embedded while the
    ///   type cache persists across calls, or when two types bind to the
    ///   same name.
    /// - [`Error::UnsupportedType`] when a known type has no formatter.
    pub fn new(config: Config) -> Result<Tessera, Error> {
        if config.is_embed_checksum() && config.is_persist_type_cache() {
            return Err(Error::configuration(
                "an embedded checksum cannot be combined with a persisted type cache",
            ));
        }
        let config = Rc::new(config);
        let types = Rc::new(TypeResolver::new(
            config.binder.clone(),
            config.known_types(),
        )?);
        let schemas = Rc::new(SchemaResolver::new());
        let formatters = FormatterResolver::new(config.clone(), types.clone(), schemas.clone());
        for descriptor in types.known_types() {
            formatters.get_for(descriptor)?;
        }
        let checksum = protocol_checksum(&config, &types, &schemas)?;
        let known_ids: Vec<TypeId> = types.known_types().iter().map(|d| d.id()).collect();
        debug!(
            known_types = known_ids.len(),
            checksum = checksum,
            version_tolerant = config.is_version_tolerant(),
            "serializer ready"
        );
        Ok(Tessera {
            write_session: RefCell::new(WriteSession::new(&known_ids)),
            read_session: RefCell::new(ReadSession::new(types.known_types())),
            config,
            types,
            schemas,
            formatters,
            checksum,
            known_ids,
            in_progress: Cell::new(false),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The checksum folded from the known types' schemas.
    pub fn protocol_checksum(&self) -> u32 {
        self.checksum
    }

    fn begin(&self) -> Result<CallGuard<'_>, Error> {
        if self.in_progress.replace(true) {
            return Err(Error::not_allowed(
                "the serializer was called again while a call was in progress",
            ));
        }
        Ok(CallGuard(&self.in_progress))
    }

    /// Describes `T` and resolves its formatter, making its name readable
    /// from type tokens before it is first written.
    pub fn register<T: Reflect>(&self) -> Result<Rc<TypeDescriptor>, Error> {
        let descriptor = self.types.descriptor_of::<T>()?;
        self.formatters.get_for(&descriptor)?;
        Ok(descriptor)
    }

    /// The primary schema of object type `T`.
    pub fn schema_of<T: Reflect>(&self) -> Result<Rc<Schema>, Error> {
        let descriptor = self.types.descriptor_of::<T>()?;
        if descriptor.object().is_none() {
            return Err(Error::unsupported_type(format!(
                "{} is a {}, only objects have a schema",
                descriptor.full_name(),
                descriptor.kind().label()
            )));
        }
        self.schemas.primary(&descriptor, &self.config, &self.types)
    }

    pub fn formatter_of<T: Reflect>(&self) -> Result<Rc<dyn Formatter>, Error> {
        self.formatters.get_for(&self.types.descriptor_of::<T>()?)
    }

    /// Serializes `value` into `bf` starting at `offset`.
    ///
    /// `bf` grows as needed and bytes past the written range are left as
    /// they were, so a buffer can be reused between calls.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    pub fn serialize<T: Reflect>(
        &self,
        value: &T,
        bf: &mut Vec<u8>,
        offset: usize,
    ) -> Result<usize, Error> {
        let _guard = self.begin()?;
        let descriptor = self.types.descriptor_of::<T>()?;
        let mut session = self.write_session.borrow_mut();
        let result = self.write_root(value, &descriptor, bf, offset, &mut session);
        self.finish_write(&mut session, result.is_ok());
        result
    }

    pub fn serialize_to_vec<T: Reflect>(&self, value: &T) -> Result<Vec<u8>, Error> {
        let mut bf = Vec::new();
        let written = self.serialize(value, &mut bf, 0)?;
        bf.truncate(written);
        Ok(bf)
    }

    /// Deserializes a `T` from `bf` starting at `offset`.
    ///
    /// The checksum is verified first, then the type token against `T`, and
    /// finally, when `expected_length` is given, the number of consumed bytes.
    ///
    /// # Errors
    ///
    /// - [`Error::ChecksumMismatch`] when the embedded checksum differs.
    /// - [`Error::TypeMismatch`] when the payload holds another type.
    /// - [`Error::Framing`] when the consumed length is not `expected_length`.
    pub fn deserialize<T: Reflect>(
        &self,
        bf: &[u8],
        offset: usize,
        expected_length: Option<usize>,
    ) -> Result<T, Error> {
        let _guard = self.begin()?;
        let descriptor = self.types.descriptor_of::<T>()?;
        let mut session = self.read_session.borrow_mut();
        let result = self
            .read_root(Some(&descriptor), bf, offset, &mut session)
            .and_then(|(_, value, consumed)| {
                check_length(consumed, expected_length)?;
                downcast_box::<T>(value)
            });
        self.finish_read(&mut session, result.is_ok());
        result
    }

    /// Deserializes a `T` that spans the whole of `bf`.
    pub fn deserialize_from<T: Reflect>(&self, bf: &[u8]) -> Result<T, Error> {
        self.deserialize(bf, 0, Some(bf.len()))
    }

    /// Populates an existing value, keeping whatever the payload does not
    /// cover. Returns the number of bytes consumed.
    pub fn deserialize_into<T: Reflect>(
        &self,
        target: &mut T,
        bf: &[u8],
        offset: usize,
    ) -> Result<usize, Error> {
        let _guard = self.begin()?;
        let descriptor = self.types.descriptor_of::<T>()?;
        let mut session = self.read_session.borrow_mut();
        let result = self.read_root_into(&descriptor, target, bf, offset, &mut session);
        self.finish_read(&mut session, result.is_ok());
        result
    }

    /// Deserializes whatever type the payload announces.
    pub fn deserialize_any(&self, bf: &[u8], offset: usize) -> Result<AnyValue, Error> {
        let _guard = self.begin()?;
        let mut session = self.read_session.borrow_mut();
        let result = self
            .read_root(None, bf, offset, &mut session)
            .and_then(|(descriptor, value, _)| AnyValue::from_parts(descriptor.key(), value));
        self.finish_read(&mut session, result.is_ok());
        result
    }

    /// Reads the checksum and the root type token without touching any cache.
    pub fn peek_type(&self, bf: &[u8], offset: usize) -> Result<Rc<TypeDescriptor>, Error> {
        let _guard = self.begin()?;
        let mut reader = Reader::at(bf, offset)?;
        self.verify_checksum(&mut reader)?;
        let session = self.read_session.borrow();
        let raw = reader.read_biased_varint32(NULL_BIAS)?;
        match RefToken::classify(raw, session.types.len(), "type")? {
            RefToken::Null => Err(Error::invalid_data("payload starts with a null type token")),
            RefToken::Existing(id) => Ok(session.types.get(id)?.clone()),
            RefToken::New => {
                let name = reader.read_string(self.config.string_limit())?;
                self.types.bind_name(&name)
            }
        }
    }

    /// Copies `value` through serialization, using scratch caches so the
    /// instance's own caches are left untouched.
    pub fn deep_clone<T: Reflect>(&self, value: &T) -> Result<T, Error> {
        let _guard = self.begin()?;
        let descriptor = self.types.descriptor_of::<T>()?;
        let mut scratch = Vec::new();
        let mut write_session = WriteSession::new(&self.known_ids);
        let written = self.write_root(value, &descriptor, &mut scratch, 0, &mut write_session)?;
        let mut read_session = ReadSession::new(self.types.known_types());
        let (_, copy, _) = self.read_root(
            Some(&descriptor),
            &scratch[..written],
            0,
            &mut read_session,
        )?;
        downcast_box::<T>(copy)
    }

    pub fn clear_object_cache(&self) -> Result<(), Error> {
        let _guard = self.begin()?;
        self.write_session.borrow_mut().reset_objects();
        self.read_session.borrow_mut().reset_objects();
        debug!("object caches cleared");
        Ok(())
    }

    /// Resets the type caches to the known types and forgets announced schemas.
    pub fn clear_type_cache(&self) -> Result<(), Error> {
        let _guard = self.begin()?;
        self.write_session.borrow_mut().reset_types(&self.known_ids);
        self.read_session
            .borrow_mut()
            .reset_types(self.types.known_types());
        debug!("type caches cleared");
        Ok(())
    }

    fn write_root(
        &self,
        value: &dyn Any,
        descriptor: &Rc<TypeDescriptor>,
        bf: &mut Vec<u8>,
        offset: usize,
        session: &mut WriteSession,
    ) -> Result<usize, Error> {
        let formatter = self.formatters.get_for(descriptor)?;
        let mut ctx = WriteContext::new(Writer::new(bf, offset), session, &self.formatters);
        if self.config.is_embed_checksum() {
            ctx.writer.write_u32(self.checksum);
        }
        ctx.write_type_token(descriptor);
        formatter.write(value, &mut ctx)?;
        Ok(ctx.writer.written())
    }

    fn read_root(
        &self,
        expected: Option<&Rc<TypeDescriptor>>,
        bf: &[u8],
        offset: usize,
        session: &mut ReadSession,
    ) -> Result<(Rc<TypeDescriptor>, Box<dyn Any>, usize), Error> {
        let mut ctx = ReadContext::new(Reader::at(bf, offset)?, session, &self.formatters);
        let descriptor = self.read_header(&mut ctx, expected)?;
        let formatter = ctx.formatter_for(&descriptor)?;
        let value = formatter.read(&mut ctx)?;
        let consumed = ctx.reader.cursor() - offset;
        Ok((descriptor, value, consumed))
    }

    fn read_root_into(
        &self,
        expected: &Rc<TypeDescriptor>,
        target: &mut dyn Any,
        bf: &[u8],
        offset: usize,
        session: &mut ReadSession,
    ) -> Result<usize, Error> {
        let mut ctx = ReadContext::new(Reader::at(bf, offset)?, session, &self.formatters);
        let descriptor = self.read_header(&mut ctx, Some(expected))?;
        let formatter = ctx.formatter_for(&descriptor)?;
        formatter.read_into(target, &mut ctx)?;
        Ok(ctx.reader.cursor() - offset)
    }

    fn read_header(
        &self,
        ctx: &mut ReadContext<'_>,
        expected: Option<&Rc<TypeDescriptor>>,
    ) -> Result<Rc<TypeDescriptor>, Error> {
        self.verify_checksum(&mut ctx.reader)?;
        let found = ctx
            .read_type_token()?
            .ok_or_else(|| Error::invalid_data("payload starts with a null type token"))?;
        match expected {
            Some(expected) if expected.id() != found.id() => Err(Error::type_mismatch(
                expected.full_name(),
                found.full_name(),
            )),
            _ => Ok(found),
        }
    }

    fn verify_checksum(&self, reader: &mut Reader) -> Result<(), Error> {
        if !self.config.is_embed_checksum() {
            return Ok(());
        }
        let actual = reader.read_u32()?;
        if actual != self.checksum {
            return Err(Error::checksum_mismatch(self.checksum, actual));
        }
        Ok(())
    }

    fn finish_write(&self, session: &mut WriteSession, ok: bool) {
        if !ok {
            warn!("serialization failed, resetting write caches");
            session.reset_objects();
            session.reset_types(&self.known_ids);
            return;
        }
        if !self.config.is_persist_object_cache() {
            session.reset_objects();
        }
        if !self.config.is_persist_type_cache() {
            session.reset_types(&self.known_ids);
        }
    }

    fn finish_read(&self, session: &mut ReadSession, ok: bool) {
        if !ok {
            warn!("deserialization failed, resetting read caches");
            session.reset_objects();
            session.reset_types(self.types.known_types());
            return;
        }
        if !self.config.is_persist_object_cache() {
            session.reset_objects();
        }
        if !self.config.is_persist_type_cache() {
            session.reset_types(self.types.known_types());
        }
    }
}

fn check_length(consumed: usize, expected: Option<usize>) -> Result<(), Error> {
    match expected {
        Some(expected) if expected != consumed => Err(Error::framing(format!(
            "expected {expected} bytes, consumed {consumed}"
        ))),
        _ => Ok(()),
    }
}
