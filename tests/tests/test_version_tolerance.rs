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

use tessera::{AnyValue, Config, Error, Tessera, TesseraObject};
use tests::transfer;

#[derive(TesseraObject, Default, Debug, PartialEq)]
#[tessera(name = "Shape")]
struct OldShape {
    pub a: i32,
    pub b: String,
    pub c: Vec<u16>,
}

#[derive(TesseraObject, Default, Debug, PartialEq)]
#[tessera(name = "Shape")]
struct NewShape {
    pub a: i32,
    pub c: Vec<u16>,
    pub d: String,
}

#[derive(TesseraObject, Default, Debug, PartialEq)]
#[tessera(name = "Shape")]
struct RenamedShape {
    #[tessera(rename = "alpha", alias = "a")]
    pub alpha: i32,
    pub c: Vec<u16>,
}

fn tolerant() -> Tessera {
    Tessera::new(Config::new().version_tolerance(true)).unwrap()
}

fn old_shape() -> OldShape {
    OldShape {
        a: 42,
        b: "removed in the new shape".to_string(),
        c: vec![1, 2, 3],
    }
}

#[test]
fn removed_members_are_skipped_and_added_ones_defaulted() {
    let new: NewShape = transfer(&tolerant(), &tolerant(), &old_shape()).unwrap();
    assert_eq!(
        new,
        NewShape {
            a: 42,
            c: vec![1, 2, 3],
            d: String::new(),
        }
    );
}

#[test]
fn newer_writers_are_readable_by_older_readers() {
    let new = NewShape {
        a: -1,
        c: vec![9],
        d: "unknown to old readers".to_string(),
    };
    let old: OldShape = transfer(&tolerant(), &tolerant(), &new).unwrap();
    assert_eq!(old.a, -1);
    assert_eq!(old.b, "");
    assert_eq!(old.c, vec![9]);
}

#[test]
fn aliases_bind_former_names() {
    let renamed: RenamedShape = transfer(&tolerant(), &tolerant(), &old_shape()).unwrap();
    assert_eq!(renamed.alpha, 42);
    assert_eq!(renamed.c, vec![1, 2, 3]);
}

#[test]
fn schema_is_written_once_per_call() {
    let tessera = tolerant();
    let one = tessera.serialize_to_vec(&vec![old_shape()]).unwrap();
    let two = tessera
        .serialize_to_vec(&vec![old_shape(), old_shape()])
        .unwrap();
    let single = tessera.serialize_to_vec(&old_shape()).unwrap();
    // The second instance costs its members only, not the schema again.
    let instance = two.len() - one.len();
    assert!(instance < single.len());

    let back: Vec<NewShape> = tolerant().deserialize_from(&two).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back[1].a, 42);
}

#[test]
fn tolerant_payloads_are_larger() {
    let strict = Tessera::new(Config::new()).unwrap();
    let value = old_shape();
    let strict_len = strict.serialize_to_vec(&value).unwrap().len();
    let tolerant_len = tolerant().serialize_to_vec(&value).unwrap().len();
    assert!(tolerant_len > strict_len);
}

#[test]
fn schemas_are_deterministic() {
    let first = Tessera::new(Config::new()).unwrap();
    let second = Tessera::new(Config::new()).unwrap();
    let names = |tessera: &Tessera| {
        tessera
            .schema_of::<OldShape>()
            .unwrap()
            .members()
            .iter()
            .map(|member| member.name().to_string())
            .collect::<Vec<_>>()
    };
    let order = names(&first);
    assert_eq!(order, names(&second));
    // Fixed size members come first.
    assert_eq!(order[0], "a");
    assert_eq!(order.len(), 3);
    assert!(first.schema_of::<i32>().is_err());
}

#[derive(TesseraObject, Default, Debug, PartialEq)]
#[tessera(name = "Inner")]
struct Inner {
    pub x: i32,
    pub y: i32,
    pub label: String,
}

fn inner(x: i32) -> Inner {
    Inner {
        x,
        y: x * 2,
        label: format!("inner {x}"),
    }
}

#[derive(TesseraObject, Default, Debug, PartialEq)]
#[tessera(name = "Outer")]
struct Outer {
    pub flag: bool,
    pub inner: Inner,
}

#[test]
fn nested_object_types_keep_their_own_schemas() {
    let values = vec![
        Outer {
            flag: true,
            inner: inner(1),
        },
        Outer {
            flag: false,
            inner: inner(2),
        },
    ];
    let back: Vec<Outer> = transfer(&tolerant(), &tolerant(), &values).unwrap();
    assert_eq!(back, values);
}

#[derive(TesseraObject, Default, Debug, PartialEq)]
#[tessera(name = "Pair")]
struct OldPair {
    pub a: Inner,
    pub c: Inner,
}

#[derive(TesseraObject, Default, Debug, PartialEq)]
#[tessera(name = "Pair")]
struct NewPair {
    pub c: Inner,
}

#[test]
fn schemas_introduced_by_removed_members_survive_the_skip() {
    let old = vec![
        OldPair {
            a: inner(1),
            c: inner(2),
        },
        OldPair {
            a: inner(3),
            c: inner(4),
        },
    ];
    let new: Vec<NewPair> = transfer(&tolerant(), &tolerant(), &old).unwrap();
    assert_eq!(new, vec![NewPair { c: inner(2) }, NewPair { c: inner(4) }]);
}

#[derive(TesseraObject, Default, Debug)]
#[tessera(name = "Holder")]
struct OldHolder {
    pub a: Option<Rc<Inner>>,
    pub c: Option<Rc<Inner>>,
}

#[derive(TesseraObject, Default, Debug)]
#[tessera(name = "Holder")]
struct NewHolder {
    pub c: Option<Rc<Inner>>,
}

#[test]
fn reference_ids_stay_aligned_across_skipped_members() {
    let old = OldHolder {
        a: Some(Rc::new(inner(1))),
        c: Some(Rc::new(inner(2))),
    };
    let new: NewHolder = transfer(&tolerant(), &tolerant(), &old).unwrap();
    assert_eq!(*new.c.unwrap(), inner(2));

    let shared = Rc::new(inner(5));
    let old = OldHolder {
        a: Some(shared.clone()),
        c: Some(shared),
    };
    let result: Result<NewHolder, Error> = transfer(&tolerant(), &tolerant(), &old);
    assert!(matches!(
        result,
        Err(Error::SkippedReference { kind: "object", id: 0 })
    ));
}

#[derive(TesseraObject, Default, Debug)]
#[tessera(name = "Bag")]
struct OldBag {
    pub a: AnyValue,
    pub c: AnyValue,
}

#[derive(TesseraObject, Default, Debug)]
#[tessera(name = "Bag")]
struct NewBag {
    pub c: AnyValue,
}

#[test]
fn type_names_introduced_by_removed_members_survive_the_skip() {
    let old = OldBag {
        a: AnyValue::new(inner(1)),
        c: AnyValue::new(inner(2)),
    };
    let reader = tolerant();
    reader.register::<Inner>().unwrap();
    let new: NewBag = transfer(&tolerant(), &reader, &old).unwrap();
    assert_eq!(new.c.downcast_ref::<Inner>(), Some(&inner(2)));
}
