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

//! Builder protocol used to read collections without requiring them to
//! expose a mutable insertion API.

use std::any::{type_name, Any};
use std::marker::PhantomData;

use super::{downcast_box, downcast_mut, downcast_ref};
use crate::error::Error;

/// One item handed out while writing a collection.
pub enum ItemRef<'a> {
    Value(&'a dyn Any),
    Entry(&'a dyn Any, &'a dyn Any),
}

/// One item handed to a builder while reading a collection.
pub enum Item {
    Value(Box<dyn Any>),
    Entry(Box<dyn Any>, Box<dyn Any>),
}

/// Adapter between the generic collection formatter and one concrete
/// collection type.
///
/// Reading goes `create_builder(size_hint)`, `add_item` once per item, then
/// `finalize`, so collections without a public insertion API only need a
/// builder representation.
pub trait CollectionProxy {
    /// Whether items are key value entries rather than single values.
    fn is_map(&self) -> bool {
        false
    }

    fn len(&self, collection: &dyn Any) -> Result<usize, Error>;

    fn for_each(
        &self,
        collection: &dyn Any,
        f: &mut dyn FnMut(ItemRef<'_>) -> Result<(), Error>,
    ) -> Result<(), Error>;

    fn create_builder(&self, size_hint: usize) -> Box<dyn Any>;

    fn add_item(&self, builder: &mut dyn Any, item: Item) -> Result<(), Error>;

    fn finalize(&self, builder: Box<dyn Any>) -> Result<Box<dyn Any>, Error>;
}

/// Proxy for single-item collections buildable from an iterator.
pub struct SeqProxy<C, T>(PhantomData<fn() -> (C, T)>);

impl<C, T> SeqProxy<C, T> {
    pub fn new() -> Self {
        SeqProxy(PhantomData)
    }
}

impl<C, T> Default for SeqProxy<C, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, T> CollectionProxy for SeqProxy<C, T>
where
    C: Any + FromIterator<T>,
    T: Any,
    for<'a> &'a C: IntoIterator<Item = &'a T, IntoIter: ExactSizeIterator>,
{
    fn len(&self, collection: &dyn Any) -> Result<usize, Error> {
        Ok(downcast_ref::<C>(collection)?.into_iter().len())
    }

    fn for_each(
        &self,
        collection: &dyn Any,
        f: &mut dyn FnMut(ItemRef<'_>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        for item in downcast_ref::<C>(collection)? {
            f(ItemRef::Value(item))?;
        }
        Ok(())
    }

    fn create_builder(&self, size_hint: usize) -> Box<dyn Any> {
        Box::new(Vec::<T>::with_capacity(size_hint))
    }

    fn add_item(&self, builder: &mut dyn Any, item: Item) -> Result<(), Error> {
        let builder = downcast_mut::<Vec<T>>(builder)?;
        match item {
            Item::Value(value) => builder.push(downcast_box::<T>(value)?),
            Item::Entry(..) => {
                return Err(Error::type_mismatch(
                    type_name::<T>(),
                    "a key value entry",
                ))
            }
        }
        Ok(())
    }

    fn finalize(&self, builder: Box<dyn Any>) -> Result<Box<dyn Any>, Error> {
        let items = downcast_box::<Vec<T>>(builder)?;
        Ok(Box::new(items.into_iter().collect::<C>()))
    }
}

/// Proxy for maps, whose items are key value entries.
pub struct MapProxy<C, K, V>(PhantomData<fn() -> (C, K, V)>);

impl<C, K, V> MapProxy<C, K, V> {
    pub fn new() -> Self {
        MapProxy(PhantomData)
    }
}

impl<C, K, V> Default for MapProxy<C, K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, K, V> CollectionProxy for MapProxy<C, K, V>
where
    C: Any + FromIterator<(K, V)>,
    K: Any,
    V: Any,
    for<'a> &'a C: IntoIterator<Item = (&'a K, &'a V), IntoIter: ExactSizeIterator>,
{
    fn is_map(&self) -> bool {
        true
    }

    fn len(&self, collection: &dyn Any) -> Result<usize, Error> {
        Ok(downcast_ref::<C>(collection)?.into_iter().len())
    }

    fn for_each(
        &self,
        collection: &dyn Any,
        f: &mut dyn FnMut(ItemRef<'_>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        for (key, value) in downcast_ref::<C>(collection)? {
            f(ItemRef::Entry(key, value))?;
        }
        Ok(())
    }

    fn create_builder(&self, size_hint: usize) -> Box<dyn Any> {
        Box::new(Vec::<(K, V)>::with_capacity(size_hint))
    }

    fn add_item(&self, builder: &mut dyn Any, item: Item) -> Result<(), Error> {
        let builder = downcast_mut::<Vec<(K, V)>>(builder)?;
        match item {
            Item::Entry(key, value) => {
                builder.push((downcast_box::<K>(key)?, downcast_box::<V>(value)?))
            }
            Item::Value(_) => {
                return Err(Error::type_mismatch(
                    "a key value entry",
                    type_name::<V>(),
                ))
            }
        }
        Ok(())
    }

    fn finalize(&self, builder: Box<dyn Any>) -> Result<Box<dyn Any>, Error> {
        let entries = downcast_box::<Vec<(K, V)>>(builder)?;
        Ok(Box::new(entries.into_iter().collect::<C>()))
    }
}
