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
use std::io::{Cursor, Seek, SeekFrom};

use tessera::{read_framed, write_framed, Config, Error, FramedStream, Tessera};
use tests::Person;

fn riki() -> Person {
    Person {
        name: "riki".to_string(),
        health: 100,
        best_friend: None,
    }
}

#[test]
fn frames_carry_consecutive_messages() {
    let tessera = Tessera::new(Config::new()).unwrap();
    let mut stream = FramedStream::new(&tessera, Cursor::new(Vec::new()));
    stream.send(&riki()).unwrap();
    stream.send(&"bye".to_string()).unwrap();

    stream.get_mut().seek(SeekFrom::Start(0)).unwrap();
    assert_eq!(stream.receive::<Person>().unwrap(), riki());
    assert_eq!(stream.receive::<String>().unwrap(), "bye");
    assert!(matches!(stream.receive::<String>(), Err(Error::Io(_))));
}

#[test]
fn frame_length_matches_the_payload() {
    let tessera = Tessera::new(Config::new()).unwrap();
    let payload = tessera.serialize_to_vec(&riki()).unwrap();

    let mut scratch = Vec::new();
    let mut out = Vec::new();
    let written = write_framed(&tessera, &riki(), &mut scratch, &mut out).unwrap();
    assert_eq!(written, out.len());
    assert_eq!(&out[out.len() - payload.len()..], &payload[..]);

    let back: Person = read_framed(&tessera, &mut scratch, &mut Cursor::new(out)).unwrap();
    assert_eq!(back, riki());
}

#[test]
fn frame_limit() {
    let writer = Tessera::new(Config::new()).unwrap();
    let mut scratch = Vec::new();
    let mut out = Vec::new();
    write_framed(&writer, &"x".repeat(256), &mut scratch, &mut out).unwrap();

    let reader = Tessera::new(Config::new().max_frame_size(64)).unwrap();
    assert!(matches!(
        read_framed::<String, _>(&reader, &mut scratch, &mut Cursor::new(out)),
        Err(Error::SizeLimitExceeded { what: "frame", .. })
    ));
}
