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

use tessera::{Config, Error, Tessera, TesseraObject};
use tests::{round_trip, Node};

#[derive(TesseraObject, Default, Debug)]
struct Pair {
    pub left: Rc<String>,
    pub right: Rc<String>,
}

#[test]
fn shared_values_keep_identity() {
    let shared = Rc::new("shared".to_string());
    let pair = Pair {
        left: shared.clone(),
        right: shared,
    };
    let back = round_trip(Config::new(), &pair).unwrap();
    assert_eq!(*back.left, "shared");
    assert!(Rc::ptr_eq(&back.left, &back.right));
}

#[test]
fn shared_values_are_written_once() {
    let tessera = Tessera::new(Config::new()).unwrap();
    let text = "a fairly long string that would be expensive to repeat".to_string();
    let shared = Rc::new(text.clone());
    let same = tessera
        .serialize_to_vec(&Pair {
            left: shared.clone(),
            right: shared,
        })
        .unwrap();
    let distinct = tessera
        .serialize_to_vec(&Pair {
            left: Rc::new(text.clone()),
            right: Rc::new(text),
        })
        .unwrap();
    assert!(same.len() < distinct.len());
}

#[test]
fn without_reference_preservation_copies_are_independent() {
    let shared = Rc::new("shared".to_string());
    let pair = Pair {
        left: shared.clone(),
        right: shared,
    };
    let back = round_trip(Config::new().preserve_references(false), &pair).unwrap();
    assert_eq!(back.left, back.right);
    assert!(!Rc::ptr_eq(&back.left, &back.right));
}

#[test]
fn cycles_are_restored() {
    let a = Node::new(1);
    let b = Node::new(2);
    a.borrow_mut().next = Some(b.clone());
    b.borrow_mut().next = Some(a.clone());

    let tessera = Tessera::new(Config::new()).unwrap();
    let bytes = tessera.serialize_to_vec(&a).unwrap();
    let back: Rc<RefCell<Node>> = tessera.deserialize_from(&bytes).unwrap();

    let second = back.borrow().next.clone().unwrap();
    assert_eq!(back.borrow().value, 1);
    assert_eq!(second.borrow().value, 2);
    let third = second.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&back, &third));

    // Break the cycles so the test does not leak.
    a.borrow_mut().next = None;
    back.borrow_mut().next = None;
}

#[test]
fn self_reference() {
    let node = Node::new(7);
    node.borrow_mut().next = Some(node.clone());
    let back = round_trip(Config::new(), &node).unwrap();
    let next = back.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&back, &next));
    node.borrow_mut().next = None;
    back.borrow_mut().next = None;
}

#[test]
fn cycles_without_preservation_hit_the_depth_limit() {
    let node = Node::new(7);
    node.borrow_mut().next = Some(node.clone());
    let tessera = Tessera::new(Config::new().preserve_references(false).max_depth(32)).unwrap();
    assert!(matches!(
        tessera.serialize_to_vec(&node),
        Err(Error::DepthExceed(_))
    ));
    node.borrow_mut().next = None;
}

#[test]
fn persisted_object_cache_spans_calls() {
    let config = Config::new().persist_object_cache(true);
    let writer = Tessera::new(config.clone()).unwrap();
    let reader = Tessera::new(config).unwrap();

    let shared = Rc::new("session".to_string());
    let first = writer.serialize_to_vec(&shared).unwrap();
    let second = writer.serialize_to_vec(&shared).unwrap();
    assert!(second.len() < first.len());

    let a: Rc<String> = reader.deserialize_from(&first).unwrap();
    let b: Rc<String> = reader.deserialize_from(&second).unwrap();
    assert!(Rc::ptr_eq(&a, &b));

    // The back reference now points at nothing the reader knows.
    reader.clear_object_cache().unwrap();
    assert!(reader.deserialize_from::<Rc<String>>(&second).is_err());
}

#[test]
fn boxed_recursion() {
    #[derive(TesseraObject, Default, Debug, PartialEq)]
    struct Chain {
        pub value: u16,
        pub next: Option<Box<Chain>>,
    }

    let chain = Chain {
        value: 1,
        next: Some(Box::new(Chain {
            value: 2,
            next: Some(Box::new(Chain {
                value: 3,
                next: None,
            })),
        })),
    };
    assert_eq!(round_trip(Config::new(), &chain).unwrap(), chain);

    let shallow = Tessera::new(Config::new().max_depth(2)).unwrap();
    assert!(matches!(
        shallow.serialize_to_vec(&chain),
        Err(Error::DepthExceed(_))
    ));
}

#[test]
fn deep_clone_keeps_shape() {
    let shared = Rc::new("x".to_string());
    let pair = Pair {
        left: shared.clone(),
        right: shared.clone(),
    };
    let tessera = Tessera::new(Config::new()).unwrap();
    let copy = tessera.deep_clone(&pair).unwrap();
    assert!(Rc::ptr_eq(&copy.left, &copy.right));
    assert!(!Rc::ptr_eq(&copy.left, &shared));
}
