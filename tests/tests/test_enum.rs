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
use tessera::{Config, Error, ReflectEnum, Tessera, TesseraObject};
use tests::{round_trip, transfer};

#[derive(TesseraObject, Debug, Clone, Copy, PartialEq)]
#[tessera(name = "Level")]
enum Level {
    Low = 1,
    Mid,
    #[tessera(rename = "Maximum")]
    High = 10,
    Negative = -3,
}

#[derive(TesseraObject, Debug, PartialEq)]
#[tessera(name = "Level")]
enum LevelV1 {
    Low = 1,
    Mid,
}

#[test]
fn discriminants_follow_the_declaration() {
    assert_eq!(
        Level::VARIANTS,
        &[("Low", 1), ("Mid", 2), ("Maximum", 10), ("Negative", -3)]
    );
    assert_eq!(Level::Mid.to_discriminant(), 2);
    assert_eq!(Level::from_discriminant(-3), Some(Level::Negative));
    assert_eq!(Level::from_discriminant(4), None);
}

#[test]
fn enum_round_trip() {
    for level in [Level::Low, Level::Mid, Level::High, Level::Negative] {
        assert_eq!(round_trip(Config::new(), &level).unwrap(), level);
    }
}

#[test]
fn enums_as_members() {
    #[derive(TesseraObject, Debug, PartialEq)]
    #[tessera(no_default)]
    struct Task {
        pub title: String,
        pub level: Level,
        pub history: Vec<Level>,
    }

    // Without a default a task can only be read into an existing one.
    let task = Task {
        title: "write".to_string(),
        level: Level::High,
        history: vec![Level::Low, Level::Negative],
    };
    let tessera = Tessera::new(Config::new()).unwrap();
    let bytes = tessera.serialize_to_vec(&task).unwrap();
    assert!(matches!(
        tessera.deserialize_from::<Task>(&bytes),
        Err(Error::UnsupportedType(_))
    ));
    let mut target = Task {
        title: String::new(),
        level: Level::Low,
        history: Vec::new(),
    };
    tessera.deserialize_into(&mut target, &bytes, 0).unwrap();
    assert_eq!(target, task);
}

#[test]
fn unknown_discriminants_are_rejected() {
    let writer = Tessera::new(Config::new()).unwrap();
    let reader = Tessera::new(Config::new()).unwrap();
    assert_eq!(
        transfer::<Level, LevelV1>(&writer, &reader, &Level::Mid).unwrap(),
        LevelV1::Mid
    );
    assert!(matches!(
        transfer::<Level, LevelV1>(&writer, &reader, &Level::High),
        Err(Error::UnknownEnum(_))
    ));
}
