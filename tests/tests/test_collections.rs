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
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque};
use std::rc::Rc;

use tessera::{Config, Error, KeyValuePair, Tessera, TesseraObject};
use tests::round_trip;

#[test]
fn arrays() {
    let values = vec![1i32, -2, 3, i32::MAX, i32::MIN];
    assert_eq!(round_trip(Config::new(), &values).unwrap(), values);

    let fixed = [0.5f32, 1.5, -2.25];
    assert_eq!(round_trip(Config::new(), &fixed).unwrap(), fixed);

    let boxed: Box<[String]> = vec!["a".to_string(), String::new()].into_boxed_slice();
    assert_eq!(round_trip(Config::new(), &boxed).unwrap(), boxed);

    let empty: Vec<u64> = Vec::new();
    assert_eq!(round_trip(Config::new(), &empty).unwrap(), empty);
}

#[test]
fn fixed_arrays_check_their_length() {
    let tessera = Tessera::new(Config::new()).unwrap();
    let bytes = tessera.serialize_to_vec(&[1u8, 2, 3]).unwrap();
    assert_eq!(
        tessera.deserialize_from::<[u8; 3]>(&bytes).unwrap(),
        [1, 2, 3]
    );
}

#[test]
fn nullable_items() {
    let values = vec![Some("x".to_string()), None, Some(String::new())];
    assert_eq!(round_trip(Config::new(), &values).unwrap(), values);

    let nested: Option<Option<i32>> = Some(None);
    assert_eq!(round_trip(Config::new(), &nested).unwrap(), nested);

    let nested_vec: Vec<Option<Vec<u8>>> = vec![None, Some(vec![]), Some(vec![7])];
    assert_eq!(round_trip(Config::new(), &nested_vec).unwrap(), nested_vec);
}

#[test]
fn maps() {
    let mut hash = HashMap::new();
    hash.insert("one".to_string(), 1u32);
    hash.insert("two".to_string(), 2u32);
    assert_eq!(round_trip(Config::new(), &hash).unwrap(), hash);

    let tree: BTreeMap<i16, Vec<String>> =
        BTreeMap::from([(1, vec!["a".to_string()]), (-4, Vec::new())]);
    assert_eq!(round_trip(Config::new(), &tree).unwrap(), tree);

    let pair = KeyValuePair::new('k', 3.5f64);
    assert_eq!(round_trip(Config::new(), &pair).unwrap(), pair);
}

#[test]
fn sequences_and_sets() {
    let deque: VecDeque<u8> = VecDeque::from(vec![3, 1, 2]);
    assert_eq!(round_trip(Config::new(), &deque).unwrap(), deque);

    let list: LinkedList<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
    assert_eq!(round_trip(Config::new(), &list).unwrap(), list);

    let set: HashSet<i64> = HashSet::from([1, 5, 9]);
    assert_eq!(round_trip(Config::new(), &set).unwrap(), set);

    let ordered: BTreeSet<String> = BTreeSet::from(["b".to_string(), "a".to_string()]);
    assert_eq!(round_trip(Config::new(), &ordered).unwrap(), ordered);

    let heap: BinaryHeap<u32> = BinaryHeap::from(vec![4, 8, 1]);
    let back = round_trip(Config::new(), &heap).unwrap();
    assert_eq!(back.into_sorted_vec(), vec![1, 4, 8]);
}

#[test]
fn collection_limit_applies_to_proxies() {
    let tessera = Tessera::new(Config::new().max_collection_size(2)).unwrap();
    let bytes = tessera
        .serialize_to_vec(&VecDeque::from(vec![1u8, 2, 3]))
        .unwrap();
    assert!(matches!(
        tessera.deserialize_from::<VecDeque<u8>>(&bytes),
        Err(Error::SizeLimitExceeded {
            what: "collection",
            size: 3,
            limit: 2
        })
    ));
}

#[test]
fn tuples() {
    let pair = (1u8, "two".to_string());
    assert_eq!(round_trip(Config::new(), &pair).unwrap(), pair);

    let seven = (1i8, 2i16, 3i32, 4i64, 5u8, 6u16, "seven".to_string());
    assert_eq!(round_trip(Config::new(), &seven).unwrap(), seven);

    round_trip(Config::new(), &()).unwrap();

    let single = (Some(vec![1u32]),);
    assert_eq!(round_trip(Config::new(), &single).unwrap(), single);
}

#[test]
fn collections_of_objects_share_references() {
    #[derive(TesseraObject, Default, Debug, PartialEq)]
    struct Tag {
        pub label: String,
    }

    let tag = Rc::new(Tag {
        label: "hot".to_string(),
    });
    let mut index: HashMap<String, Rc<Tag>> = HashMap::new();
    index.insert("a".to_string(), tag.clone());
    index.insert("b".to_string(), tag);

    let back = round_trip(Config::new(), &index).unwrap();
    assert!(Rc::ptr_eq(&back["a"], &back["b"]));
    assert_eq!(back["a"].label, "hot");
}

#[test]
fn primitives() {
    assert!(round_trip(Config::new(), &true).unwrap());
    assert_eq!(round_trip(Config::new(), &'λ').unwrap(), 'λ');
    assert_eq!(round_trip(Config::new(), &u64::MAX).unwrap(), u64::MAX);
    assert_eq!(round_trip(Config::new(), &-0.0f64).unwrap(), -0.0);
    assert!(round_trip(Config::new(), &f32::NAN).unwrap().is_nan());
    assert_eq!(
        round_trip(Config::new(), &"héllo wörld".to_string()).unwrap(),
        "héllo wörld"
    );
}
