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
use std::rc::Rc;

use tessera::{Config, Error, Tessera, TesseraObject};
use tests::{round_trip, Person};

#[test]
fn person_round_trip_and_stable_length() {
    let person = Person {
        name: "riki".to_string(),
        health: 100,
        best_friend: None,
    };

    let tessera = Tessera::new(Config::new()).unwrap();
    let first = tessera.serialize_to_vec(&person).unwrap();
    let second = tessera.serialize_to_vec(&person).unwrap();
    assert_eq!(first, second);

    let fresh = Tessera::new(Config::new()).unwrap();
    assert_eq!(fresh.serialize_to_vec(&person).unwrap(), first);

    let back: Person = tessera.deserialize_from(&first).unwrap();
    assert_eq!(back.name, "riki");
    assert_eq!(back.health, 100);
    assert!(back.best_friend.is_none());
}

#[test]
fn nested_objects() {
    let friend = Rc::new(Person {
        name: "lina".to_string(),
        health: 80,
        best_friend: None,
    });
    let person = Person {
        name: "riki".to_string(),
        health: 100,
        best_friend: Some(friend),
    };
    let back = round_trip(Config::new(), &person).unwrap();
    assert_eq!(back, person);
    assert_eq!(back.best_friend.unwrap().name, "lina");
}

#[test]
fn serialize_at_offset_keeps_surrounding_bytes() {
    let tessera = Tessera::new(Config::new()).unwrap();
    let mut bf = vec![0xAA; 3];
    let written = tessera.serialize(&-12i64, &mut bf, 3).unwrap();
    assert_eq!(&bf[..3], &[0xAA; 3]);
    let value: i64 = tessera.deserialize(&bf, 3, Some(written)).unwrap();
    assert_eq!(value, -12);

    // A shorter payload into a reused buffer leaves the tail untouched.
    let mut reused = vec![0x55; 64];
    let written = tessera.serialize(&1u8, &mut reused, 0).unwrap();
    assert!(written < 64);
    assert_eq!(reused[63], 0x55);
}

#[test]
fn tuple_struct_and_unit_struct() {
    #[derive(TesseraObject, Default, Debug, PartialEq)]
    struct Meters(pub f64, pub String);

    #[derive(TesseraObject, Default, Debug, PartialEq)]
    struct Marker;

    let value = Meters(12.5, "north".to_string());
    assert_eq!(round_trip(Config::new(), &value).unwrap(), value);
    assert_eq!(round_trip(Config::new(), &Marker).unwrap(), Marker);
}

#[test]
fn private_members_follow_the_policy() {
    use tessera::TargetMembers;

    #[derive(TesseraObject, Default, Debug, PartialEq)]
    struct Account {
        pub owner: String,
        balance: i64,
    }

    let account = Account {
        owner: "riki".to_string(),
        balance: 250,
    };
    assert_eq!(round_trip(Config::new(), &account).unwrap(), account);

    let public_only = Config::new().type_members::<Account>(TargetMembers::PUBLIC_FIELDS);
    let back = round_trip(public_only, &account).unwrap();
    assert_eq!(back.owner, "riki");
    assert_eq!(back.balance, 0);
}

#[test]
fn member_filter_and_markers() {
    #[derive(TesseraObject, Default, Debug, PartialEq)]
    #[tessera(members = "public_fields")]
    struct Session {
        pub user: String,
        #[tessera(include)]
        token: String,
        pub cache: Vec<u8>,
        #[tessera(exclude)]
        pub scratch: i32,
    }

    let session = Session {
        user: "riki".to_string(),
        token: "t0k3n".to_string(),
        cache: vec![1, 2, 3],
        scratch: 9,
    };

    let back = round_trip(Config::new(), &session).unwrap();
    assert_eq!(back.token, "t0k3n");
    assert_eq!(back.cache, vec![1, 2, 3]);
    assert_eq!(back.scratch, 0);

    let config = Config::new().should_serialize_member(|_, member| {
        (member.name() == "cache").then_some(false)
    });
    let back = round_trip(config, &session).unwrap();
    assert_eq!(back.user, "riki");
    assert!(back.cache.is_empty());
}

#[test]
fn only_synthetic_members_is_unsupported() {
    #[derive(TesseraObject, Default)]
    struct Generated {
        #[tessera(synthetic)]
        pub backing: i32,
    }

    let tessera = Tessera::new(Config::new()).unwrap();
    assert!(matches!(
        tessera.serialize_to_vec(&Generated::default()),
        Err(Error::UnsupportedType(_))
    ));
    let keep = Tessera::new(Config::new().skip_synthetic_members(false)).unwrap();
    let value = Generated { backing: 4 };
    let bytes = keep.serialize_to_vec(&value).unwrap();
    assert_eq!(keep.deserialize_from::<Generated>(&bytes).unwrap().backing, 4);
}

#[test]
fn denied_types_fail_at_first_use() {
    let tessera = Tessera::new(Config::new().deny_type("Person")).unwrap();
    let err = tessera
        .serialize_to_vec(&Person::default())
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedType(_)));
    assert!(err.to_string().contains("Person"));
}

#[test]
fn generic_struct() {
    #[derive(TesseraObject, Default, Debug, PartialEq)]
    struct Envelope<T> {
        pub id: u32,
        pub body: T,
    }

    let value = Envelope {
        id: 7,
        body: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(round_trip(Config::new(), &value).unwrap(), value);
}
