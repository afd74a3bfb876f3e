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

//! Binary primitives: fixed-width little-endian values, LEB128 varints with
//! zigzag and bias variants, and length-prefixed strings.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;

pub const MAX_VARINT32_BYTES: usize = 5;
pub const MAX_VARINT64_BYTES: usize = 10;

/// Bias applied to nullable ids and lengths so that `-1` encodes as `0`.
pub const NULL_BIAS: i32 = 1;

/// Writes into a caller-owned `Vec<u8>` starting at an offset.
///
/// The vector is used as a flat byte array: writes land at the cursor and
/// grow the vector (at least doubling) when they would run past its end.
/// Bytes past the cursor are left untouched, so a buffer can be reused
/// between calls without reallocation.
pub struct Writer<'a> {
    bf: &'a mut Vec<u8>,
    start: usize,
    cursor: usize,
}

impl<'a> Writer<'a> {
    pub fn new(bf: &'a mut Vec<u8>, offset: usize) -> Writer<'a> {
        if bf.len() < offset {
            bf.resize(offset, 0);
        }
        Writer {
            bf,
            start: offset,
            cursor: offset,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Bytes written since the writer was created.
    #[inline(always)]
    pub fn written(&self) -> usize {
        self.cursor - self.start
    }

    pub fn written_bytes(&self) -> &[u8] {
        &self.bf[self.start..self.cursor]
    }

    #[inline(always)]
    fn ensure(&mut self, additional: usize) {
        let needed = self.cursor + additional;
        if needed > self.bf.len() {
            self.grow(needed);
        }
    }

    #[cold]
    fn grow(&mut self, needed: usize) {
        let doubled = self.bf.len().saturating_mul(2);
        self.bf.resize(doubled.max(needed), 0);
    }

    #[inline(always)]
    fn advance(&mut self, len: usize) -> &mut [u8] {
        self.ensure(len);
        let at = self.cursor;
        self.cursor += len;
        &mut self.bf[at..at + len]
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.advance(v.len()).copy_from_slice(v);
        v.len()
    }

    /// Reserves `len` zeroed bytes at the cursor and hands them out for filling.
    pub fn reserve_bytes(&mut self, len: usize) -> &mut [u8] {
        let slot = self.advance(len);
        slot.fill(0);
        slot
    }

    /// Reserves a 4-byte slot to be filled in later with [`Writer::patch_u32`].
    pub fn reserve_u32(&mut self) -> usize {
        let at = self.cursor;
        self.reserve_bytes(4);
        at
    }

    pub fn patch_u32(&mut self, position: usize, value: u32) {
        LittleEndian::write_u32(&mut self.bf[position..position + 4], value);
    }

    pub fn set_bytes(&mut self, position: usize, data: &[u8]) {
        self.bf[position..position + data.len()].copy_from_slice(data);
    }

    #[inline(always)]
    pub fn write_u8(&mut self, value: u8) {
        self.advance(1)[0] = value;
    }

    #[inline(always)]
    pub fn write_i8(&mut self, value: i8) {
        self.write_u8(value as u8);
    }

    #[inline(always)]
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn write_u16(&mut self, value: u16) {
        LittleEndian::write_u16(self.advance(2), value);
    }

    pub fn write_i16(&mut self, value: i16) {
        LittleEndian::write_i16(self.advance(2), value);
    }

    pub fn write_u32(&mut self, value: u32) {
        LittleEndian::write_u32(self.advance(4), value);
    }

    pub fn write_i32(&mut self, value: i32) {
        LittleEndian::write_i32(self.advance(4), value);
    }

    pub fn write_u64(&mut self, value: u64) {
        LittleEndian::write_u64(self.advance(8), value);
    }

    pub fn write_i64(&mut self, value: i64) {
        LittleEndian::write_i64(self.advance(8), value);
    }

    pub fn write_f32(&mut self, value: f32) {
        LittleEndian::write_f32(self.advance(4), value);
    }

    pub fn write_f64(&mut self, value: f64) {
        LittleEndian::write_f64(self.advance(8), value);
    }

    pub fn write_u128(&mut self, value: u128) {
        LittleEndian::write_u128(self.advance(16), value);
    }

    pub fn write_i128(&mut self, value: i128) {
        LittleEndian::write_i128(self.advance(16), value);
    }

    #[inline(always)]
    pub fn write_varuint32(&mut self, value: u32) {
        self.write_varuint64(value as u64)
    }

    pub fn write_varuint64(&mut self, mut value: u64) {
        if value < 0x80 {
            self.write_u8(value as u8);
            return;
        }
        let mut scratch = [0u8; MAX_VARINT64_BYTES];
        let mut n = 0;
        while value >= 0x80 {
            scratch[n] = (value as u8) | 0x80;
            value >>= 7;
            n += 1;
        }
        scratch[n] = value as u8;
        self.write_bytes(&scratch[..=n]);
    }

    pub fn write_varint32(&mut self, value: i32) {
        let zigzag = (value << 1) ^ (value >> 31);
        self.write_varuint32(zigzag as u32)
    }

    pub fn write_varint64(&mut self, value: i64) {
        let zigzag = (value << 1) ^ (value >> 63);
        self.write_varuint64(zigzag as u64)
    }

    /// Writes `value + bias` as an unsigned varint; `value + bias` must not be negative.
    pub fn write_biased_varint32(&mut self, value: i32, bias: i32) {
        let biased = value as i64 + bias as i64;
        debug_assert!((0..=u32::MAX as i64).contains(&biased));
        self.write_varuint32(biased as u32)
    }

    pub fn write_biased_varint64(&mut self, value: i64, bias: i64) {
        let biased = value as i128 + bias as i128;
        debug_assert!((0..=u64::MAX as i128).contains(&biased));
        self.write_varuint64(biased as u64)
    }

    /// Writes a nullable length, `None` encoding as `-1`.
    pub fn write_length(&mut self, len: Option<usize>) {
        match len {
            None => self.write_varuint64(0),
            Some(n) => self.write_varuint64(n as u64 + NULL_BIAS as u64),
        }
    }

    /// Writes `[length][utf8 bytes]`.
    pub fn write_string(&mut self, s: &str) {
        self.write_length(Some(s.len()));
        self.write_bytes(s.as_bytes());
    }

    pub fn write_nullable_string(&mut self, s: Option<&str>) {
        match s {
            Some(s) => self.write_string(s),
            None => self.write_length(None),
        }
    }
}

/// Bounds-checked reader over a byte slice.
pub struct Reader<'a> {
    bf: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader { bf, cursor: 0 }
    }

    pub fn at(bf: &'a [u8], offset: usize) -> Result<Reader<'a>, Error> {
        if offset > bf.len() {
            return Err(Error::buffer_out_of_bound(offset, 0, bf.len()));
        }
        Ok(Reader { bf, cursor: offset })
    }

    #[inline(always)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    pub fn slice_after_cursor(&self) -> &'a [u8] {
        &self.bf[self.cursor..]
    }

    #[inline(always)]
    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self
            .cursor
            .checked_add(len)
            .filter(|end| *end <= self.bf.len())
            .ok_or_else(|| Error::buffer_out_of_bound(self.cursor, len, self.bf.len()))?;
        let bytes = &self.bf[self.cursor..end];
        self.cursor = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.take(len).map(|_| ())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.take(len)
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        match self.bf.get(self.cursor) {
            Some(b) => {
                self.cursor += 1;
                Ok(*b)
            }
            None => Err(Error::buffer_out_of_bound(self.cursor, 1, self.bf.len())),
        }
    }

    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, Error> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::invalid_data(format!("invalid bool byte {other}"))),
        }
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    pub fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    pub fn read_u128(&mut self) -> Result<u128, Error> {
        Ok(LittleEndian::read_u128(self.take(16)?))
    }

    pub fn read_i128(&mut self) -> Result<i128, Error> {
        Ok(LittleEndian::read_i128(self.take(16)?))
    }

    pub fn read_varuint32(&mut self) -> Result<u32, Error> {
        let first = self.read_u8()?;
        if first < 0x80 {
            return Ok(first as u32);
        }
        let mut result = (first & 0x7F) as u32;
        let mut shift = 7;
        for _ in 1..MAX_VARINT32_BYTES {
            let b = self.read_u8()?;
            if shift == 28 && b > 0x0F {
                return Err(Error::framing("varint overflows 32 bits"));
            }
            result |= ((b & 0x7F) as u32) << shift;
            if b < 0x80 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(Error::framing(format!(
            "varint32 not terminated within {MAX_VARINT32_BYTES} bytes"
        )))
    }

    pub fn read_varuint64(&mut self) -> Result<u64, Error> {
        let first = self.read_u8()?;
        if first < 0x80 {
            return Ok(first as u64);
        }
        let mut result = (first & 0x7F) as u64;
        let mut shift = 7;
        for _ in 1..MAX_VARINT64_BYTES {
            let b = self.read_u8()?;
            if shift == 63 && b > 0x01 {
                return Err(Error::framing("varint overflows 64 bits"));
            }
            result |= ((b & 0x7F) as u64) << shift;
            if b < 0x80 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(Error::framing(format!(
            "varint64 not terminated within {MAX_VARINT64_BYTES} bytes"
        )))
    }

    pub fn read_varint32(&mut self) -> Result<i32, Error> {
        let encoded = self.read_varuint32()?;
        Ok(((encoded >> 1) as i32) ^ -((encoded & 1) as i32))
    }

    pub fn read_varint64(&mut self) -> Result<i64, Error> {
        let encoded = self.read_varuint64()?;
        Ok(((encoded >> 1) as i64) ^ -((encoded & 1) as i64))
    }

    pub fn read_biased_varint32(&mut self, bias: i32) -> Result<i32, Error> {
        let raw = self.read_varuint32()? as i64 - bias as i64;
        i32::try_from(raw).map_err(|_| Error::framing(format!("biased varint {raw} out of range")))
    }

    /// Decodes the next biased varint without moving the cursor.
    pub fn peek_biased_varint32(&self, bias: i32) -> Result<i32, Error> {
        Reader {
            bf: self.bf,
            cursor: self.cursor,
        }
        .read_biased_varint32(bias)
    }

    pub fn read_biased_varint64(&mut self, bias: i64) -> Result<i64, Error> {
        let raw = self.read_varuint64()? as i128 - bias as i128;
        i64::try_from(raw).map_err(|_| Error::framing(format!("biased varint {raw} out of range")))
    }

    /// Reads a nullable length written by [`Writer::write_length`].
    pub fn read_length(&mut self) -> Result<Option<usize>, Error> {
        match self.read_varuint64()? {
            0 => Ok(None),
            raw => usize::try_from(raw - NULL_BIAS as u64)
                .map(Some)
                .map_err(|_| Error::framing(format!("length {raw} does not fit in memory"))),
        }
    }

    /// Reads a non-null length and checks it against `limit` before anything is allocated.
    pub fn read_checked_length(&mut self, what: &'static str, limit: usize) -> Result<usize, Error> {
        match self.read_length()? {
            Some(len) if len > limit => Err(Error::size_limit(what, len, limit)),
            Some(len) => Ok(len),
            None => Err(Error::invalid_data(format!("unexpected null {what}"))),
        }
    }

    pub fn read_string(&mut self, limit: usize) -> Result<String, Error> {
        let len = self.read_checked_length("string", limit)?;
        self.read_utf8(len)
    }

    pub fn read_nullable_string(&mut self, limit: usize) -> Result<Option<String>, Error> {
        match self.read_length()? {
            None => Ok(None),
            Some(len) if len > limit => Err(Error::size_limit("string", len, limit)),
            Some(len) => self.read_utf8(len).map(Some),
        }
    }

    fn read_utf8(&mut self, len: usize) -> Result<String, Error> {
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| Error::invalid_data(format!("string is not valid utf-8: {e}")))
    }
}
