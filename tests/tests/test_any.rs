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
use tessera::{
    AnyValue, Config, Delegate, DelegateSerialization, Error, MemberRef, Tessera, TesseraObject,
};
use tests::{round_trip, Person};

#[derive(TesseraObject, Default, Debug)]
struct Slot {
    pub label: String,
    pub payload: AnyValue,
}

#[test]
fn polymorphic_members() {
    let tessera = Tessera::new(Config::new()).unwrap();
    let slots = vec![
        Slot {
            label: "number".to_string(),
            payload: AnyValue::new(42i64),
        },
        Slot {
            label: "list".to_string(),
            payload: AnyValue::new(vec!["a".to_string()]),
        },
        Slot {
            label: "again".to_string(),
            payload: AnyValue::new(7i64),
        },
    ];
    let bytes = tessera.serialize_to_vec(&slots).unwrap();
    let back: Vec<Slot> = tessera.deserialize_from(&bytes).unwrap();
    assert_eq!(back[0].payload.downcast_ref::<i64>(), Some(&42));
    assert_eq!(
        back[1].payload.downcast_ref::<Vec<String>>(),
        Some(&vec!["a".to_string()])
    );
    assert!(back[2].payload.is::<i64>());
}

#[test]
fn optional_any_values() {
    let values: Vec<Option<AnyValue>> = vec![None, Some(AnyValue::new('c'))];
    let back = round_trip(Config::new(), &values).unwrap();
    assert!(back[0].is_none());
    assert_eq!(back[1].as_ref().unwrap().downcast_ref::<char>(), Some(&'c'));
}

#[test]
fn unregistered_names_cannot_be_bound() {
    let writer = Tessera::new(Config::new()).unwrap();
    let bytes = writer
        .serialize_to_vec(&AnyValue::new(Person::default()))
        .unwrap();
    let reader = Tessera::new(Config::new()).unwrap();
    assert!(matches!(
        reader.deserialize_from::<AnyValue>(&bytes),
        Err(Error::UnsupportedType(_))
    ));
    reader.register::<Person>().unwrap();
    let value = reader.deserialize_from::<AnyValue>(&bytes).unwrap();
    assert!(value.is::<Person>());
}

#[test]
fn member_references() {
    let member = MemberRef::new::<Person>("health");
    assert_eq!(round_trip(Config::new(), &member).unwrap(), member);

    let tessera = Tessera::new(Config::new()).unwrap();
    let bytes = tessera
        .serialize_to_vec(&MemberRef::new::<Person>("mana"))
        .unwrap();
    assert!(matches!(
        tessera.deserialize_from::<MemberRef>(&bytes),
        Err(Error::InvalidData(_))
    ));
}

fn delegates(policy: DelegateSerialization) -> Tessera {
    Tessera::new(Config::new().delegate_serialization(policy)).unwrap()
}

#[test]
fn delegates_are_off_by_default() {
    let tessera = Tessera::new(Config::new()).unwrap();
    assert!(matches!(
        tessera.serialize_to_vec(&Delegate::from_static("math::abs")),
        Err(Error::NotAllowed(_))
    ));
}

#[test]
fn static_delegates() {
    let tessera = delegates(DelegateSerialization::StaticOnly);
    let bytes = tessera
        .serialize_to_vec(&Delegate::from_static("math::abs"))
        .unwrap();
    let back: Delegate = tessera.deserialize_from(&bytes).unwrap();
    assert_eq!(back.method(), "math::abs");
    assert!(back.is_static());

    let err = tessera
        .serialize_to_vec(&Delegate::bound("Person::heal", Person::default()))
        .unwrap_err();
    assert!(matches!(err, Error::NotAllowed(_)));
    assert!(err.to_string().contains("Person::heal"));
}

#[test]
fn instance_delegates_need_the_widest_policy() {
    let writer = delegates(DelegateSerialization::AllowInstanceTargets);
    let target = Person {
        name: "riki".to_string(),
        health: 10,
        best_friend: None,
    };
    let bytes = writer
        .serialize_to_vec(&Delegate::bound("Person::heal", target))
        .unwrap();
    let back: Delegate = writer.deserialize_from(&bytes).unwrap();
    let person = back.target().unwrap().downcast_ref::<Person>().unwrap();
    assert_eq!(person.health, 10);

    let reader = delegates(DelegateSerialization::StaticOnly);
    reader.register::<Person>().unwrap();
    assert!(matches!(
        reader.deserialize_from::<Delegate>(&bytes),
        Err(Error::NotAllowed(_))
    ));
}

#[derive(TesseraObject, Default)]
#[tessera(name = "Vault")]
struct Vault {
    pub secret: String,
}

#[test]
fn static_only_readers_refuse_targets_before_reading_them() {
    let writer = delegates(DelegateSerialization::AllowInstanceTargets);
    let target = Vault {
        secret: "hunter2".to_string(),
    };
    let bytes = writer
        .serialize_to_vec(&Delegate::bound("Vault::open", target))
        .unwrap();

    // Vault is unknown here; reading the target would fail to bind its name.
    let reader = delegates(DelegateSerialization::StaticOnly);
    assert!(matches!(
        reader.deserialize_from::<Delegate>(&bytes),
        Err(Error::NotAllowed(_))
    ));

    let denying = Tessera::new(
        Config::new()
            .delegate_serialization(DelegateSerialization::StaticOnly)
            .deny_type("Vault"),
    )
    .unwrap();
    assert!(matches!(
        denying.deserialize_from::<Delegate>(&bytes),
        Err(Error::NotAllowed(_))
    ));
}
