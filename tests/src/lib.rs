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
//! Integration tests for Tessera live under `tests/`; this library only
//! holds the fixtures several of them share.

use std::cell::RefCell;
use std::rc::Rc;

use tessera::{Config, Error, Reflect, Tessera, TesseraObject};

#[derive(TesseraObject, Default, Debug, PartialEq)]
#[tessera(name = "Person")]
pub struct Person {
    pub name: String,
    pub health: i32,
    pub best_friend: Option<Rc<Person>>,
}

/// A graph node; `RefCell` lets a node be linked after it is shared.
#[derive(TesseraObject, Default, Debug)]
#[tessera(name = "Node")]
pub struct Node {
    pub value: i32,
    pub next: Option<Rc<RefCell<Node>>>,
}

impl Node {
    pub fn new(value: i32) -> Rc<RefCell<Node>> {
        Rc::new(RefCell::new(Node { value, next: None }))
    }
}

/// Serializes with `writer` and reads the result back with `reader`.
pub fn transfer<T: Reflect, U: Reflect>(
    writer: &Tessera,
    reader: &Tessera,
    value: &T,
) -> Result<U, Error> {
    let bytes = writer.serialize_to_vec(value)?;
    reader.deserialize_from(&bytes)
}

pub fn round_trip<T: Reflect>(config: Config, value: &T) -> Result<T, Error> {
    let tessera = Tessera::new(config)?;
    transfer(&tessera, &tessera, value)
}
