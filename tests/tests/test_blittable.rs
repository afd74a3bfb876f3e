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
use tessera::{Blittable, Config, Tessera, TesseraObject};
use tests::round_trip;

#[derive(TesseraObject, Default, Debug, Clone, Copy, PartialEq)]
#[tessera(blittable, eq)]
struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(TesseraObject, Default, Debug, PartialEq)]
#[tessera(blittable)]
struct Particle {
    pub position: Vec3,
    pub mass: f64,
    pub alive: bool,
    pub id: u64,
}

#[test]
fn layout_is_packed_in_declaration_order() {
    assert_eq!(Vec3::SIZE, 12);
    assert_eq!(Particle::SIZE, 12 + 8 + 1 + 8);

    let mut out = [0u8; 12];
    Vec3 {
        x: 1.0,
        y: 2.0,
        z: 3.0,
    }
    .write_to(&mut out);
    assert_eq!(&out[4..8], &2.0f32.to_le_bytes());
    assert_eq!(Vec3::read_from(&out).z, 3.0);
}

#[test]
fn blittable_round_trip() {
    let particle = Particle {
        position: Vec3 {
            x: -1.5,
            y: 0.25,
            z: 8.0,
        },
        mass: 2.5,
        alive: true,
        id: u64::MAX,
    };
    assert_eq!(round_trip(Config::new(), &particle).unwrap(), particle);

    let cloud = vec![Vec3::default(); 4];
    assert_eq!(round_trip(Config::new(), &cloud).unwrap(), cloud);
}

#[test]
fn payload_is_the_raw_image() {
    let tessera = Tessera::new(Config::new()).unwrap();
    let one = tessera.serialize_to_vec(&vec![Vec3::default(); 1]).unwrap();
    let two = tessera.serialize_to_vec(&vec![Vec3::default(); 2]).unwrap();
    assert_eq!(two.len() - one.len(), Vec3::SIZE);
}

#[test]
fn version_tolerance_uses_members_instead() {
    let tolerant = Config::new().version_tolerance(true);
    let value = Vec3 {
        x: 1.0,
        y: 2.0,
        z: 3.0,
    };
    assert_eq!(round_trip(tolerant, &value).unwrap(), value);

    let strict = Tessera::new(Config::new()).unwrap();
    let tolerant = Tessera::new(Config::new().version_tolerance(true)).unwrap();
    assert!(
        tolerant.serialize_to_vec(&value).unwrap().len()
            > strict.serialize_to_vec(&value).unwrap().len()
    );
}
