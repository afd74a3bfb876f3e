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

//! Length-prefixed frames over `std::io` streams.
//!
//! A frame is `[varuint32 length][payload]`, the payload being one
//! [`Tessera::serialize`] call. Lengths above the configured
//! `max_frame_size` are rejected before any payload byte is read.

use std::io::{Read, Write};

use crate::buffer::{Reader, Writer, MAX_VARINT32_BYTES};
use crate::error::Error;
use crate::reflect::Reflect;
use crate::tessera::Tessera;

/// Serializes `value` into `scratch` and writes it to `out` as one frame.
///
/// Returns the number of bytes written to `out`, prefix included.
pub fn write_framed<T: Reflect, W: Write>(
    tessera: &Tessera,
    value: &T,
    scratch: &mut Vec<u8>,
    out: &mut W,
) -> Result<usize, Error> {
    let len = tessera.serialize(value, scratch, 0)?;
    let limit = tessera.config().frame_limit();
    if len > limit {
        return Err(Error::size_limit("frame", len, limit));
    }
    let prefix = frame_prefix(len)?;
    let mut head = Vec::with_capacity(MAX_VARINT32_BYTES);
    let mut writer = Writer::new(&mut head, 0);
    writer.write_varuint32(prefix);
    let head_len = writer.written();
    out.write_all(&head[..head_len])?;
    out.write_all(&scratch[..len])?;
    Ok(head_len + len)
}

/// Reads one frame from `input` and deserializes its payload, which must
/// span the whole frame.
pub fn read_framed<T: Reflect, R: Read>(
    tessera: &Tessera,
    scratch: &mut Vec<u8>,
    input: &mut R,
) -> Result<T, Error> {
    let len = read_frame_length(input)?;
    let limit = tessera.config().frame_limit();
    if len > limit {
        return Err(Error::size_limit("frame", len, limit));
    }
    scratch.clear();
    scratch.resize(len, 0);
    input.read_exact(scratch)?;
    tessera.deserialize(scratch, 0, Some(len))
}

fn frame_prefix(len: usize) -> Result<u32, Error> {
    u32::try_from(len)
        .map_err(|_| Error::framing(format!("frame of {len} bytes does not fit a u32 length")))
}

fn read_frame_length<R: Read>(input: &mut R) -> Result<usize, Error> {
    let mut head = [0u8; MAX_VARINT32_BYTES];
    for i in 0..MAX_VARINT32_BYTES {
        input.read_exact(&mut head[i..=i])?;
        if head[i] < 0x80 {
            return Ok(Reader::new(&head[..=i]).read_varuint32()? as usize);
        }
    }
    Err(Error::framing(format!(
        "frame length not terminated within {MAX_VARINT32_BYTES} bytes"
    )))
}

/// A stream exchanging framed values, owning its scratch buffer.
pub struct FramedStream<'t, S: Read + Write> {
    tessera: &'t Tessera,
    stream: S,
    scratch: Vec<u8>,
}

impl<'t, S: Read + Write> FramedStream<'t, S> {
    pub fn new(tessera: &'t Tessera, stream: S) -> Self {
        FramedStream {
            tessera,
            stream,
            scratch: Vec::new(),
        }
    }

    /// Writes one frame and flushes the stream.
    pub fn send<T: Reflect>(&mut self, value: &T) -> Result<usize, Error> {
        let written = write_framed(self.tessera, value, &mut self.scratch, &mut self.stream)?;
        self.stream.flush()?;
        Ok(written)
    }

    pub fn receive<T: Reflect>(&mut self) -> Result<T, Error> {
        read_framed(self.tessera, &mut self.scratch, &mut self.stream)
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::config::Config;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn frame_lengths_must_fit_the_prefix() {
        assert_eq!(frame_prefix(300).unwrap(), 300);
        assert!(matches!(
            frame_prefix(u32::MAX as usize + 1),
            Err(Error::Framing(_))
        ));
    }

    #[test]
    fn frames_follow_each_other() {
        let tessera = Tessera::new(Config::new()).unwrap();
        let mut scratch = Vec::new();
        let mut out = Vec::new();
        write_framed(&tessera, &"first".to_string(), &mut scratch, &mut out).unwrap();
        write_framed(&tessera, &42u64, &mut scratch, &mut out).unwrap();

        let mut input = Cursor::new(out);
        let first: String = read_framed(&tessera, &mut scratch, &mut input).unwrap();
        let second: u64 = read_framed(&tessera, &mut scratch, &mut input).unwrap();
        assert_eq!(first, "first");
        assert_eq!(second, 42);
        assert!(matches!(
            read_framed::<u64, _>(&tessera, &mut scratch, &mut input),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn oversized_frames_are_rejected_before_reading() {
        let tessera = Tessera::new(Config::new().max_frame_size(4)).unwrap();
        let mut input = Cursor::new(vec![0x80, 0x01]);
        let mut scratch = Vec::new();
        assert!(matches!(
            read_framed::<String, _>(&tessera, &mut scratch, &mut input),
            Err(Error::SizeLimitExceeded { size: 128, .. })
        ));
    }

    #[test]
    fn framed_stream_round_trips() {
        let tessera = Tessera::new(Config::new()).unwrap();
        let mut stream = FramedStream::new(&tessera, Cursor::new(Vec::new()));
        stream.send(&vec![1u16, 2, 3]).unwrap();
        stream.get_mut().set_position(0);
        assert_eq!(stream.receive::<Vec<u16>>().unwrap(), vec![1, 2, 3]);
    }
}
