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
use std::cell::RefCell;
use std::rc::Rc;

use tessera::{Config, Error, ReadonlyFieldHandling, Tessera, TesseraObject};

#[derive(TesseraObject, Default, Debug, PartialEq)]
struct Settings {
    pub level: u8,
    pub tags: Vec<String>,
}

#[derive(TesseraObject, Default, Debug)]
struct Account {
    #[tessera(readonly)]
    pub id: i64,
    pub label: String,
    #[tessera(readonly)]
    pub settings: Rc<RefCell<Settings>>,
    #[tessera(readonly)]
    pub limits: Settings,
}

fn account() -> Account {
    Account {
        id: 5,
        label: "main".to_string(),
        settings: Rc::new(RefCell::new(Settings {
            level: 3,
            tags: vec!["a".to_string()],
        })),
        limits: Settings {
            level: 9,
            tags: Vec::new(),
        },
    }
}

fn with(handling: ReadonlyFieldHandling) -> Tessera {
    Tessera::new(Config::new().readonly_handling(handling)).unwrap()
}

#[test]
fn readonly_members_are_excluded_by_default() {
    let tessera = Tessera::new(Config::new()).unwrap();
    let bytes = tessera.serialize_to_vec(&account()).unwrap();
    let back: Account = tessera.deserialize_from(&bytes).unwrap();
    assert_eq!(back.id, 0);
    assert_eq!(back.label, "main");
    assert_eq!(back.settings.borrow().level, 0);
}

#[test]
fn forced_overwrite_assigns_readonly_members() {
    let tessera = with(ReadonlyFieldHandling::ForcedOverwrite);
    let bytes = tessera.serialize_to_vec(&account()).unwrap();
    let back: Account = tessera.deserialize_from(&bytes).unwrap();
    assert_eq!(back.id, 5);
    assert_eq!(back.settings.borrow().tags, vec!["a".to_string()]);
    assert_eq!(back.limits.level, 9);
}

#[test]
fn readonly_references_are_populated_in_place() {
    let tessera = with(ReadonlyFieldHandling::Members);
    let bytes = tessera.serialize_to_vec(&account()).unwrap();

    let existing = Rc::new(RefCell::new(Settings::default()));
    let mut target = Account {
        id: 5,
        settings: existing.clone(),
        ..Account::default()
    };
    tessera.deserialize_into(&mut target, &bytes, 0).unwrap();

    assert_eq!(target.label, "main");
    assert!(Rc::ptr_eq(&target.settings, &existing));
    assert_eq!(existing.borrow().level, 3);
    assert_eq!(target.limits.level, 9);
}

#[test]
fn readonly_values_must_not_change() {
    let tessera = with(ReadonlyFieldHandling::Members);
    let bytes = tessera.serialize_to_vec(&account()).unwrap();

    // A fresh default has id 0 where the data says 5.
    let err = tessera.deserialize_from::<Account>(&bytes).unwrap_err();
    assert!(matches!(err, Error::ReadonlyFieldConflict(_)));
    assert!(err.to_string().contains("id"));

    let mut target = Account {
        id: 6,
        ..Account::default()
    };
    assert!(matches!(
        tessera.deserialize_into(&mut target, &bytes, 0),
        Err(Error::ReadonlyFieldConflict(_))
    ));
}
