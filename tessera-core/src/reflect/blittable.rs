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

use byteorder::{ByteOrder, LittleEndian};

use super::{downcast_ref, Reflect};
use crate::error::Error;

/// Types with a fixed little-endian memory image and no references.
///
/// `write_to` and `read_from` always receive exactly `SIZE` bytes.
pub trait Blittable: Sized {
    const SIZE: usize;

    fn write_to(&self, out: &mut [u8]);

    fn read_from(bytes: &[u8]) -> Self;
}

impl Blittable for u8 {
    const SIZE: usize = 1;

    fn write_to(&self, out: &mut [u8]) {
        out[0] = *self;
    }

    fn read_from(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl Blittable for i8 {
    const SIZE: usize = 1;

    fn write_to(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }

    fn read_from(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }
}

impl Blittable for bool {
    const SIZE: usize = 1;

    fn write_to(&self, out: &mut [u8]) {
        out[0] = *self as u8;
    }

    fn read_from(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

macro_rules! impl_blittable {
    ($($ty:ty => $size:expr, $write:ident, $read:ident);* $(;)?) => {
        $(
            impl Blittable for $ty {
                const SIZE: usize = $size;

                fn write_to(&self, out: &mut [u8]) {
                    LittleEndian::$write(out, *self);
                }

                fn read_from(bytes: &[u8]) -> Self {
                    LittleEndian::$read(bytes)
                }
            }
        )*
    };
}

impl_blittable! {
    u16 => 2, write_u16, read_u16;
    i16 => 2, write_i16, read_i16;
    u32 => 4, write_u32, read_u32;
    i32 => 4, write_i32, read_i32;
    u64 => 8, write_u64, read_u64;
    i64 => 8, write_i64, read_i64;
    f32 => 4, write_f32, read_f32;
    f64 => 8, write_f64, read_f64;
}

/// Type-erased raw layout copy of a [`Blittable`] type.
#[derive(Clone, Copy)]
pub struct BlittableOps {
    pub size: usize,
    pub write: fn(&dyn Any, &mut [u8]) -> Result<(), Error>,
    pub read: fn(&[u8]) -> Result<Box<dyn Any>, Error>,
}

fn blit_write<T: Blittable + Any>(value: &dyn Any, out: &mut [u8]) -> Result<(), Error> {
    downcast_ref::<T>(value)?.write_to(out);
    Ok(())
}

fn blit_read<T: Blittable + Any>(bytes: &[u8]) -> Result<Box<dyn Any>, Error> {
    if bytes.len() != T::SIZE {
        return Err(Error::buffer_out_of_bound(0, T::SIZE, bytes.len()));
    }
    Ok(Box::new(T::read_from(bytes)))
}

impl BlittableOps {
    pub fn of<T: Blittable + Reflect>() -> BlittableOps {
        BlittableOps {
            size: T::SIZE,
            write: blit_write::<T>,
            read: blit_read::<T>,
        }
    }
}
