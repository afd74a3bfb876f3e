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

//! Reference caches: one per pass for objects, one for types.
//!
//! Ids are handed out in encounter order starting at 0 and written as a
//! biased varint, so `-1` encodes null, an id below the cache length is a
//! back reference and the id equal to the length introduces a new entry.

use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use crate::error::Error;
use crate::types::NULL_ID;

/// Serialize side of a reference cache.
///
/// ```
/// use tessera_core::resolver::ref_resolver::RefWriter;
///
/// let mut types = RefWriter::new();
/// assert_eq!(types.try_get_id(&"Person"), None);
/// assert_eq!(types.register("Person"), 0);
/// assert_eq!(types.try_get_id(&"Person"), Some(0));
/// ```
pub struct RefWriter<K> {
    ids: HashMap<K, u32>,
}

impl<K: Eq + Hash + Clone> RefWriter<K> {
    pub fn new() -> Self {
        RefWriter {
            ids: HashMap::new(),
        }
    }

    #[inline(always)]
    pub fn try_get_id(&self, key: &K) -> Option<u32> {
        self.ids.get(key).copied()
    }

    /// Assigns the next id to `key`; an already registered key keeps its id.
    pub fn register(&mut self, key: K) -> u32 {
        let next = self.ids.len() as u32;
        *self.ids.entry(key).or_insert(next)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn clear_but_reseed_known(&mut self, known: &[K]) {
        self.ids.clear();
        for key in known {
            self.register(key.clone());
        }
    }
}

impl<K: Eq + Hash + Clone> Default for RefWriter<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object side of the serialize cache, keyed by the address of the shared
/// referent.
///
/// Registered shells are kept alive until the cache is cleared: an address
/// only identifies an object while that object exists.
#[derive(Default)]
pub struct ObjectRefWriter {
    ids: RefWriter<usize>,
    keep_alive: Vec<Rc<dyn Any>>,
}

impl ObjectRefWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn try_get_id(&self, address: usize) -> Option<u32> {
        self.ids.try_get_id(&address)
    }

    pub fn register_shared(&mut self, address: usize, referent: Rc<dyn Any>) -> u32 {
        self.keep_alive.push(referent);
        self.ids.register(address)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.keep_alive.clear();
    }
}

enum Slot<V> {
    Pending,
    Filled(V),
    /// Introduced inside a member the reader skipped.
    Skipped,
}

/// Deserialize side of a reference cache.
///
/// A slot is created before the entry's content is read, so content can
/// refer back to its own container.
pub struct RefReader<V> {
    slots: Vec<Slot<V>>,
    kind: &'static str,
}

impl<V> RefReader<V> {
    pub fn new(kind: &'static str) -> Self {
        RefReader {
            slots: Vec::new(),
            kind,
        }
    }

    pub fn create_slot(&mut self) -> u32 {
        self.slots.push(Slot::Pending);
        (self.slots.len() - 1) as u32
    }

    pub fn fill_slot(&mut self, id: u32, value: V) -> Result<(), Error> {
        let known = self.slots.len();
        match self.slots.get_mut(id as usize) {
            Some(slot) => {
                *slot = Slot::Filled(value);
                Ok(())
            }
            None => Err(Error::unknown_reference(self.kind, id as u64, known)),
        }
    }

    /// Creates a slot that is populated from the start.
    pub fn push(&mut self, value: V) -> u32 {
        self.slots.push(Slot::Filled(value));
        (self.slots.len() - 1) as u32
    }

    /// Reserves `count` ids whose entries were never read.
    pub fn skip_slots(&mut self, count: usize) {
        self.slots.extend((0..count).map(|_| Slot::Skipped));
    }

    pub fn get(&self, id: u32) -> Result<&V, Error> {
        match self.slots.get(id as usize) {
            Some(Slot::Filled(value)) => Ok(value),
            Some(Slot::Pending) => Err(Error::invalid_data(format!(
                "{} reference {} is used before its content was read; \
                 cycles need a shell that can be populated in place",
                self.kind, id
            ))),
            Some(Slot::Skipped) => Err(Error::skipped_reference(self.kind, id as u64)),
            None => Err(Error::unknown_reference(
                self.kind,
                id as u64,
                self.slots.len(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<V: Clone> RefReader<V> {
    pub fn clear_but_reseed_known(&mut self, known: &[V]) {
        self.slots.clear();
        self.slots.extend(known.iter().cloned().map(Slot::Filled));
    }
}

/// Decoded reference marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefToken {
    Null,
    Existing(u32),
    New,
}

impl RefToken {
    /// Interprets a decoded biased id against the current cache length.
    pub fn classify(id: i32, len: usize, kind: &'static str) -> Result<RefToken, Error> {
        match id {
            NULL_ID => Ok(RefToken::Null),
            id if id < NULL_ID => Err(Error::framing(format!("negative {kind} reference {id}"))),
            id if (id as usize) < len => Ok(RefToken::Existing(id as u32)),
            id if id as usize == len => Ok(RefToken::New),
            id => Err(Error::unknown_reference(kind, id as u64, len)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_ids_follow_encounter_order() {
        let mut writer = RefWriter::new();
        assert_eq!(writer.register('a'), 0);
        assert_eq!(writer.register('b'), 1);
        assert_eq!(writer.register('a'), 0);
        assert_eq!(writer.len(), 2);
        writer.clear_but_reseed_known(&['k']);
        assert_eq!(writer.try_get_id(&'k'), Some(0));
        assert_eq!(writer.try_get_id(&'a'), None);
    }

    #[test]
    fn object_writer_keeps_referents_alive() {
        let mut objects = ObjectRefWriter::new();
        let value = Rc::new(5u32);
        let address = Rc::as_ptr(&value) as usize;
        assert_eq!(objects.register_shared(address, value.clone()), 0);
        assert_eq!(Rc::strong_count(&value), 2);
        assert_eq!(objects.try_get_id(address), Some(0));
        objects.clear();
        assert_eq!(Rc::strong_count(&value), 1);
        assert!(objects.is_empty());
    }

    #[test]
    fn reader_distinguishes_unknown_and_pending_slots() {
        let mut reader: RefReader<String> = RefReader::new("object");
        let id = reader.create_slot();
        assert!(matches!(reader.get(id), Err(Error::InvalidData(_))));
        reader.fill_slot(id, "done".to_string()).unwrap();
        assert_eq!(reader.get(id).unwrap(), "done");
        assert!(matches!(
            reader.get(4),
            Err(Error::UnknownReferenceId {
                kind: "object",
                id: 4,
                known: 1
            })
        ));
    }

    #[test]
    fn skipped_slots_keep_later_ids_stable() {
        let mut reader: RefReader<u8> = RefReader::new("object");
        reader.skip_slots(2);
        assert_eq!(reader.push(9), 2);
        assert_eq!(*reader.get(2).unwrap(), 9);
        assert!(matches!(
            reader.get(1),
            Err(Error::SkippedReference { kind: "object", id: 1 })
        ));
    }

    #[test]
    fn tokens_classify_against_cache_length() {
        assert_eq!(RefToken::classify(-1, 3, "type").unwrap(), RefToken::Null);
        assert_eq!(RefToken::classify(2, 3, "type").unwrap(), RefToken::Existing(2));
        assert_eq!(RefToken::classify(3, 3, "type").unwrap(), RefToken::New);
        assert!(matches!(
            RefToken::classify(5, 3, "type"),
            Err(Error::UnknownReferenceId { .. })
        ));
    }
}
