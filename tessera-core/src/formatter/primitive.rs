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

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::reflect::{downcast_ref, TypeDescriptor, TypeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};
use crate::types::PrimitiveKind;

use super::Formatter;

/// Scalars: fixed width up to 16 bits and for floats, varints above.
pub struct PrimitiveFormatter<T> {
    descriptor: Rc<TypeDescriptor>,
    write: fn(&mut Writer, T),
    read: fn(&mut Reader) -> Result<T, Error>,
}

impl<T: Copy + 'static> Formatter for PrimitiveFormatter<T> {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    #[inline(always)]
    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        (self.write)(&mut ctx.writer, *downcast_ref::<T>(value)?);
        Ok(())
    }

    #[inline(always)]
    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        Ok(Box::new((self.read)(&mut ctx.reader)?))
    }
}

fn write_isize(writer: &mut Writer, value: isize) {
    writer.write_varint64(value as i64)
}

fn read_isize(reader: &mut Reader) -> Result<isize, Error> {
    let value = reader.read_varint64()?;
    isize::try_from(value)
        .map_err(|_| Error::invalid_data(format!("{value} does not fit in isize")))
}

fn write_usize(writer: &mut Writer, value: usize) {
    writer.write_varuint64(value as u64)
}

fn read_usize(reader: &mut Reader) -> Result<usize, Error> {
    let value = reader.read_varuint64()?;
    usize::try_from(value)
        .map_err(|_| Error::invalid_data(format!("{value} does not fit in usize")))
}

fn write_char(writer: &mut Writer, value: char) {
    writer.write_varuint32(value as u32)
}

fn read_char(reader: &mut Reader) -> Result<char, Error> {
    let value = reader.read_varuint32()?;
    char::from_u32(value)
        .ok_or_else(|| Error::invalid_data(format!("{value:#x} is not a unicode scalar value")))
}

fn primitive<T: Copy + 'static>(
    descriptor: &Rc<TypeDescriptor>,
    write: fn(&mut Writer, T),
    read: fn(&mut Reader) -> Result<T, Error>,
) -> Rc<dyn Formatter> {
    Rc::new(PrimitiveFormatter {
        descriptor: descriptor.clone(),
        write,
        read,
    })
}

macro_rules! primitive {
    ($descriptor:expr, $ty:ty, $write:ident, $read:ident) => {
        primitive::<$ty>(
            $descriptor,
            |writer: &mut Writer, value: $ty| writer.$write(value),
            |reader: &mut Reader| reader.$read(),
        )
    };
}

/// `String`, written as a biased byte length and its utf-8 bytes.
pub struct StringFormatter {
    descriptor: Rc<TypeDescriptor>,
}

impl Formatter for StringFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.writer.write_string(downcast_ref::<String>(value)?);
        Ok(())
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let limit = ctx.config().string_limit();
        Ok(Box::new(ctx.reader.read_string(limit)?))
    }

    fn inline_null(&self) -> bool {
        true
    }

    fn write_null(&self, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.writer.write_nullable_string(None);
        Ok(())
    }

    fn read_nullable(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Box<dyn Any>>, Error> {
        let limit = ctx.config().string_limit();
        Ok(ctx
            .reader
            .read_nullable_string(limit)?
            .map(|s| Box::new(s) as Box<dyn Any>))
    }
}

pub struct PrimitiveResolver;

impl Resolver for PrimitiveResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        _formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        let kind = match descriptor.kind() {
            TypeKind::Primitive(kind) => *kind,
            TypeKind::String => {
                return Ok(Some(Rc::new(StringFormatter {
                    descriptor: descriptor.clone(),
                })))
            }
            _ => return Ok(None),
        };
        let d = descriptor;
        let formatter = match kind {
            PrimitiveKind::Bool => primitive!(d, bool, write_bool, read_bool),
            PrimitiveKind::I8 => primitive!(d, i8, write_i8, read_i8),
            PrimitiveKind::U8 => primitive!(d, u8, write_u8, read_u8),
            PrimitiveKind::I16 => primitive!(d, i16, write_i16, read_i16),
            PrimitiveKind::U16 => primitive!(d, u16, write_u16, read_u16),
            PrimitiveKind::I32 => primitive!(d, i32, write_varint32, read_varint32),
            PrimitiveKind::U32 => primitive!(d, u32, write_varuint32, read_varuint32),
            PrimitiveKind::I64 => primitive!(d, i64, write_varint64, read_varint64),
            PrimitiveKind::U64 => primitive!(d, u64, write_varuint64, read_varuint64),
            PrimitiveKind::ISize => primitive::<isize>(d, write_isize, read_isize),
            PrimitiveKind::USize => primitive::<usize>(d, write_usize, read_usize),
            PrimitiveKind::F32 => primitive!(d, f32, write_f32, read_f32),
            PrimitiveKind::F64 => primitive!(d, f64, write_f64, read_f64),
            PrimitiveKind::Char => primitive::<char>(d, write_char, read_char),
        };
        Ok(Some(formatter))
    }
}
