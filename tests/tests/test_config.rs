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
use std::cell::OnceCell;
use std::rc::{Rc, Weak};

use tessera::{Config, CustomFormatter, Error, Tessera, TesseraObject, TypeDescriptor};
use tessera_core::buffer::Writer;
use tessera_core::formatter::Formatter;
use tessera_core::resolver::context::{ReadContext, WriteContext};
use tessera_core::resolver::formatter_resolver::{FormatterResolver, Resolver};
use tests::{Node, Person};

fn riki() -> Person {
    Person {
        name: "riki".to_string(),
        health: 100,
        best_friend: None,
    }
}

#[test]
fn checksum_guards_the_protocol() {
    #[derive(TesseraObject, Default)]
    #[tessera(name = "Person")]
    struct PersonV2 {
        pub name: String,
        pub health: i32,
        pub mana: i32,
    }

    let config = || Config::new().embed_checksum(true).known_type::<Person>();
    let writer = Tessera::new(config()).unwrap();
    let peer = Tessera::new(config()).unwrap();
    assert_eq!(writer.protocol_checksum(), peer.protocol_checksum());

    let bytes = writer.serialize_to_vec(&riki()).unwrap();
    assert_eq!(peer.deserialize_from::<Person>(&bytes).unwrap(), riki());

    let more_types = Tessera::new(config().known_type::<String>()).unwrap();
    assert_ne!(writer.protocol_checksum(), more_types.protocol_checksum());
    assert!(matches!(
        more_types.deserialize_from::<Person>(&bytes),
        Err(Error::ChecksumMismatch { .. })
    ));

    let changed = Tessera::new(
        Config::new()
            .embed_checksum(true)
            .known_type::<PersonV2>(),
    )
    .unwrap();
    assert_ne!(writer.protocol_checksum(), changed.protocol_checksum());
}

#[test]
fn known_types_shorten_tokens() {
    let plain = Tessera::new(Config::new()).unwrap();
    let known = Tessera::new(Config::new().known_type::<Person>()).unwrap();
    let plain_bytes = plain.serialize_to_vec(&riki()).unwrap();
    let known_bytes = known.serialize_to_vec(&riki()).unwrap();
    assert!(known_bytes.len() < plain_bytes.len());
    assert_eq!(known.deserialize_from::<Person>(&known_bytes).unwrap(), riki());
}

#[test]
fn persisted_type_cache_shortens_later_payloads() {
    let config = Config::new().persist_type_cache(true);
    let writer = Tessera::new(config.clone()).unwrap();
    let reader = Tessera::new(config).unwrap();

    let first = writer.serialize_to_vec(&riki()).unwrap();
    let second = writer.serialize_to_vec(&riki()).unwrap();
    assert!(second.len() < first.len());
    assert_eq!(reader.deserialize_from::<Person>(&first).unwrap(), riki());
    assert_eq!(reader.deserialize_from::<Person>(&second).unwrap(), riki());

    writer.clear_type_cache().unwrap();
    assert_eq!(writer.serialize_to_vec(&riki()).unwrap(), first);
}

#[test]
fn oversized_lengths_are_rejected() {
    let tessera = Tessera::new(Config::new().max_array_size(1024)).unwrap();
    let mut bytes = tessera.serialize_to_vec(&Vec::<u8>::new()).unwrap();
    // Replace the empty length with a huge claim and no items behind it.
    bytes.pop();
    let offset = bytes.len();
    Writer::new(&mut bytes, offset).write_length(Some(50_000_000));
    assert!(matches!(
        tessera.deserialize::<Vec<u8>>(&bytes, 0, None),
        Err(Error::SizeLimitExceeded { what: "array", .. })
    ));

    let strict = Tessera::new(Config::new().max_string_size(16)).unwrap();
    let long = Person {
        name: "x".repeat(100),
        ..riki()
    };
    let bytes = strict.serialize_to_vec(&long).unwrap();
    assert!(matches!(
        strict.deserialize_from::<Person>(&bytes),
        Err(Error::SizeLimitExceeded {
            what: "string",
            size: 100,
            limit: 16
        })
    ));
}

#[test]
fn peek_type_reads_only_the_header() {
    let writer = Tessera::new(Config::new()).unwrap();
    let bytes = writer.serialize_to_vec(&riki()).unwrap();

    let reader = Tessera::new(Config::new()).unwrap();
    assert!(matches!(
        reader.peek_type(&bytes, 0),
        Err(Error::UnsupportedType(_))
    ));
    reader.register::<Person>().unwrap();
    assert_eq!(reader.peek_type(&bytes, 0).unwrap().name(), "Person");

    let value = reader.deserialize_any(&bytes, 0).unwrap();
    assert!(value.is::<Person>());
    assert_eq!(value.downcast::<Person>().unwrap(), riki());
}

#[derive(TesseraObject, Default)]
struct Ticket;

struct Reentrant(Rc<OnceCell<Weak<Tessera>>>);

impl CustomFormatter<Ticket> for Reentrant {
    fn write(&self, _value: &Ticket, _ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        let tessera = self
            .0
            .get()
            .and_then(Weak::upgrade)
            .expect("serializer is set before use");
        tessera.serialize_to_vec(&1u8).map(|_| ())
    }

    fn read(&self, _ctx: &mut ReadContext<'_>) -> Result<Ticket, Error> {
        Ok(Ticket)
    }
}

#[test]
fn nested_calls_are_refused() {
    let cell = Rc::new(OnceCell::new());
    let tessera = Rc::new(
        Tessera::new(Config::new().formatter::<Ticket, _>(Reentrant(cell.clone()))).unwrap(),
    );
    cell.set(Rc::downgrade(&tessera)).unwrap();

    assert!(matches!(
        tessera.serialize_to_vec(&Ticket),
        Err(Error::NotAllowed(_))
    ));
    // The guard is released after the failed call.
    let bytes = tessera.serialize_to_vec(&5u8).unwrap();
    assert_eq!(tessera.deserialize_from::<u8>(&bytes).unwrap(), 5);
}

struct Centi;

impl CustomFormatter<f64> for Centi {
    fn write(&self, value: &f64, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.writer.write_i32((*value * 100.0).round() as i32);
        Ok(())
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<f64, Error> {
        Ok(ctx.reader.read_i32()? as f64 / 100.0)
    }
}

#[test]
fn custom_formatters_win_over_builtins() {
    #[derive(TesseraObject, Default, Debug, PartialEq)]
    struct Reading {
        pub celsius: f64,
    }

    let tessera = Tessera::new(Config::new().formatter::<f64, _>(Centi)).unwrap();
    let bytes = tessera.serialize_to_vec(&Reading { celsius: 21.456 }).unwrap();
    let back: Reading = tessera.deserialize_from(&bytes).unwrap();
    assert_eq!(back.celsius, 21.46);

    let plain = Tessera::new(Config::new()).unwrap();
    let plain_bytes = plain.serialize_to_vec(&Reading { celsius: 21.456 }).unwrap();
    assert_eq!(plain_bytes.len(), bytes.len() + 4);

    // new type token, the name "f64", then 2146 as a little endian i32
    let root = tessera.serialize_to_vec(&21.456f64).unwrap();
    assert_eq!(root, vec![1, 4, b'f', b'6', b'4', 0x62, 0x08, 0, 0]);
    assert_eq!(tessera.deserialize_from::<f64>(&root).unwrap(), 21.46);
}

/// Writes `f64` values truncated to whole numbers.
struct Whole {
    descriptor: Rc<TypeDescriptor>,
}

impl Formatter for Whole {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        let value = value
            .downcast_ref::<f64>()
            .ok_or_else(|| Error::invalid_data("expected an f64"))?;
        ctx.writer.write_i64(value.trunc() as i64);
        Ok(())
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        Ok(Box::new(ctx.reader.read_i64()? as f64))
    }
}

struct WholeNumbers;

impl Resolver for WholeNumbers {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        _formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        if !descriptor.key().is::<f64>() {
            return Ok(None);
        }
        Ok(Some(Rc::new(Whole {
            descriptor: descriptor.clone(),
        })))
    }
}

#[test]
fn per_type_formatters_win_over_resolvers() {
    let resolved = Tessera::new(Config::new().resolver(WholeNumbers)).unwrap();
    let bytes = resolved.serialize_to_vec(&21.456f64).unwrap();
    assert_eq!(resolved.deserialize_from::<f64>(&bytes).unwrap(), 21.0);

    let both = Tessera::new(
        Config::new()
            .resolver(WholeNumbers)
            .formatter::<f64, _>(Centi),
    )
    .unwrap();
    let bytes = both.serialize_to_vec(&21.456f64).unwrap();
    assert_eq!(both.deserialize_from::<f64>(&bytes).unwrap(), 21.46);
}

#[test]
fn populating_checks_the_root_type() {
    let tessera = Tessera::new(Config::new()).unwrap();
    let bytes = tessera.serialize_to_vec(&riki()).unwrap();
    let mut node = Node {
        value: 3,
        next: None,
    };
    assert!(matches!(
        tessera.deserialize_into(&mut node, &bytes, 0),
        Err(Error::TypeMismatch { .. })
    ));
    assert_eq!(node.value, 3);
    assert!(matches!(
        tessera.deserialize_from::<Node>(&bytes),
        Err(Error::TypeMismatch { .. })
    ));
}

#[test]
fn known_types_are_preseeded_by_name() {
    let plain = Tessera::new(Config::new()).unwrap();
    let known = Tessera::new(Config::new().known_type::<String>()).unwrap();
    let value = "riki".to_string();
    let plain_bytes = plain.serialize_to_vec(&value).unwrap();
    let known_bytes = known.serialize_to_vec(&value).unwrap();
    // token 0 of the seeded cache instead of a new token and the type name
    assert_eq!(known_bytes[0], 1);
    assert_eq!(&known_bytes[1..], &plain_bytes[plain_bytes.len() - 5..]);
    assert_eq!(known.deserialize_from::<String>(&known_bytes).unwrap(), value);
}
