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

//! [`Reflect`] implementations for std, chrono and uuid types.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use uuid::Uuid;

use super::{downcast_box, downcast_mut, downcast_ref};
use super::{AnyValue, Delegate, KeyValuePair, MapProxy, MemberRef, SeqProxy};
use super::{ArrayOps, CellOps, CollectionOps, KeyValueOps, NullableOps, SharedOps, TupleOps};
use super::{Reflect, TypeDescriptor, TypeKey, TypeKind, ValueOps, WrapperOps};
use crate::error::Error;
use crate::types::{PrimitiveKind, StandardKind};

macro_rules! impl_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::new::<$ty>(
                        TypeKind::Primitive(PrimitiveKind::$kind),
                        ValueOps::of::<$ty>().with_default::<$ty>().with_eq::<$ty>(),
                    )
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    isize => ISize,
    usize => USize,
    f32 => F32,
    f64 => F64,
    char => Char,
}

impl Reflect for String {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<String>(
            TypeKind::String,
            ValueOps::of::<String>()
                .with_default::<String>()
                .with_eq::<String>(),
        )
        .with_name("String")
    }
}

macro_rules! impl_standard {
    ($($ty:ty => $kind:ident, $name:literal);* $(;)?) => {
        $(
            impl Reflect for $ty {
                fn describe() -> TypeDescriptor {
                    let mut ops = ValueOps::of::<$ty>().with_eq::<$ty>();
                    ops.construct = Some(Rc::new(standard_construct::<$ty>));
                    TypeDescriptor::new::<$ty>(TypeKind::Standard(StandardKind::$kind), ops)
                        .with_name($name)
                }
            }
        )*
    };
}

/// Zero value used when a standard value is constructed before being read.
trait StandardDefault {
    fn standard_default() -> Self;
}

fn standard_construct<T: StandardDefault + Any>() -> Box<dyn Any> {
    Box::new(T::standard_default())
}

impl StandardDefault for NaiveDate {
    fn standard_default() -> Self {
        NaiveDate::default()
    }
}

impl StandardDefault for NaiveDateTime {
    fn standard_default() -> Self {
        NaiveDateTime::default()
    }
}

impl StandardDefault for DateTime<Utc> {
    fn standard_default() -> Self {
        DateTime::<Utc>::default()
    }
}

impl StandardDefault for TimeDelta {
    fn standard_default() -> Self {
        TimeDelta::zero()
    }
}

impl StandardDefault for Duration {
    fn standard_default() -> Self {
        Duration::ZERO
    }
}

impl StandardDefault for Uuid {
    fn standard_default() -> Self {
        Uuid::nil()
    }
}

impl StandardDefault for i128 {
    fn standard_default() -> Self {
        0
    }
}

impl StandardDefault for u128 {
    fn standard_default() -> Self {
        0
    }
}

impl StandardDefault for IpAddr {
    fn standard_default() -> Self {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }
}

impl StandardDefault for SocketAddr {
    fn standard_default() -> Self {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
    }
}

impl StandardDefault for PathBuf {
    fn standard_default() -> Self {
        PathBuf::new()
    }
}

impl_standard! {
    NaiveDate => Date, "Date";
    NaiveDateTime => DateTime, "DateTime";
    DateTime<Utc> => UtcDateTime, "UtcDateTime";
    TimeDelta => TimeDelta, "TimeDelta";
    Duration => Duration, "Duration";
    Uuid => Uuid, "Uuid";
    i128 => I128, "i128";
    u128 => U128, "u128";
    IpAddr => IpAddr, "IpAddr";
    SocketAddr => SocketAddr, "SocketAddr";
    PathBuf => PathBuf, "PathBuf";
}

fn option_get<T: Any>(value: &dyn Any) -> Result<Option<&dyn Any>, Error> {
    Ok(downcast_ref::<Option<T>>(value)?
        .as_ref()
        .map(|inner| inner as &dyn Any))
}

fn option_some<T: Any>(value: Box<dyn Any>) -> Result<Box<dyn Any>, Error> {
    Ok(Box::new(Some(downcast_box::<T>(value)?)))
}

fn option_none<T: Any>() -> Box<dyn Any> {
    Box::new(None::<T>)
}

impl<T: Reflect> Reflect for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>(
            TypeKind::Nullable(NullableOps {
                inner: TypeKey::of::<T>(),
                get: option_get::<T>,
                some: option_some::<T>,
                none: option_none::<T>,
            }),
            ValueOps::of::<Self>().with_default::<Self>(),
        )
    }
}

/// Contiguous sequences described as arrays.
pub trait ArrayLike: Reflect {
    type Item: Reflect;

    fn as_slice(&self) -> &[Self::Item];

    fn from_vec(items: Vec<Self::Item>) -> Result<Self, Error>;
}

impl<T: Reflect> ArrayLike for Vec<T> {
    type Item = T;

    fn as_slice(&self) -> &[T] {
        self
    }

    fn from_vec(items: Vec<T>) -> Result<Self, Error> {
        Ok(items)
    }
}

impl<T: Reflect> ArrayLike for Box<[T]> {
    type Item = T;

    fn as_slice(&self) -> &[T] {
        self
    }

    fn from_vec(items: Vec<T>) -> Result<Self, Error> {
        Ok(items.into_boxed_slice())
    }
}

impl<T: Reflect, const N: usize> ArrayLike for [T; N] {
    type Item = T;

    fn as_slice(&self) -> &[T] {
        self
    }

    fn from_vec(items: Vec<T>) -> Result<Self, Error> {
        items.try_into().map_err(|items: Vec<T>| {
            Error::invalid_data(format!(
                "fixed array of {} items read with {} items",
                N,
                items.len()
            ))
        })
    }
}

fn array_len<A: ArrayLike>(value: &dyn Any) -> Result<usize, Error> {
    Ok(downcast_ref::<A>(value)?.as_slice().len())
}

fn array_for_each<A: ArrayLike>(
    value: &dyn Any,
    f: &mut dyn FnMut(&dyn Any) -> Result<(), Error>,
) -> Result<(), Error> {
    for item in downcast_ref::<A>(value)?.as_slice() {
        f(item)?;
    }
    Ok(())
}

fn array_assemble<A: ArrayLike>(items: Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, Error> {
    let items = items
        .into_iter()
        .map(downcast_box::<A::Item>)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Box::new(A::from_vec(items)?))
}

fn array_kind<A: ArrayLike>() -> TypeKind {
    TypeKind::Array(ArrayOps {
        item: TypeKey::of::<A::Item>(),
        len: array_len::<A>,
        for_each: array_for_each::<A>,
        assemble: array_assemble::<A>,
    })
}

impl<T: Reflect> Reflect for Vec<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>(
            array_kind::<Self>(),
            ValueOps::of::<Self>().with_default::<Self>(),
        )
    }
}

impl<T: Reflect> Reflect for Box<[T]> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>(
            array_kind::<Self>(),
            ValueOps::of::<Self>().with_default::<Self>(),
        )
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>(array_kind::<Self>(), ValueOps::of::<Self>())
    }
}

fn kv_parts<K: Any, V: Any>(value: &dyn Any) -> Result<(&dyn Any, &dyn Any), Error> {
    let pair = downcast_ref::<KeyValuePair<K, V>>(value)?;
    Ok((&pair.key as &dyn Any, &pair.value as &dyn Any))
}

fn kv_assemble<K: Any, V: Any>(
    key: Box<dyn Any>,
    value: Box<dyn Any>,
) -> Result<Box<dyn Any>, Error> {
    Ok(Box::new(KeyValuePair::new(
        downcast_box::<K>(key)?,
        downcast_box::<V>(value)?,
    )))
}

impl<K: Reflect, V: Reflect> Reflect for KeyValuePair<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>(
            TypeKind::KeyValuePair(KeyValueOps {
                key: TypeKey::of::<K>(),
                value: TypeKey::of::<V>(),
                parts: kv_parts::<K, V>,
                assemble: kv_assemble::<K, V>,
            }),
            ValueOps::of::<Self>(),
        )
    }
}

fn sequence<C, T>() -> TypeDescriptor
where
    C: Reflect + Default + FromIterator<T>,
    T: Reflect,
    for<'a> &'a C: IntoIterator<Item = &'a T, IntoIter: ExactSizeIterator>,
{
    TypeDescriptor::new::<C>(
        TypeKind::Collection(CollectionOps {
            item: TypeKey::of::<T>(),
            proxy: Rc::new(SeqProxy::<C, T>::new()),
        }),
        ValueOps::of::<C>().with_default::<C>(),
    )
}

fn map<C, K, V>() -> TypeDescriptor
where
    C: Reflect + Default + FromIterator<(K, V)>,
    K: Reflect,
    V: Reflect,
    for<'a> &'a C: IntoIterator<Item = (&'a K, &'a V), IntoIter: ExactSizeIterator>,
{
    TypeDescriptor::new::<C>(
        TypeKind::Collection(CollectionOps {
            item: TypeKey::of::<KeyValuePair<K, V>>(),
            proxy: Rc::new(MapProxy::<C, K, V>::new()),
        }),
        ValueOps::of::<C>().with_default::<C>(),
    )
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>()
    }
}

impl<T: Reflect> Reflect for LinkedList<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>()
    }
}

impl<T: Reflect + Eq + Hash> Reflect for HashSet<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>()
    }
}

impl<T: Reflect + Ord> Reflect for BTreeSet<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>()
    }
}

impl<T: Reflect + Ord> Reflect for BinaryHeap<T> {
    fn describe() -> TypeDescriptor {
        sequence::<Self, T>()
    }
}

impl<K: Reflect + Eq + Hash, V: Reflect> Reflect for HashMap<K, V> {
    fn describe() -> TypeDescriptor {
        map::<Self, K, V>()
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        map::<Self, K, V>()
    }
}

fn unit_element(_: &dyn Any, index: usize) -> Result<&dyn Any, Error> {
    Err(Error::invalid_data(format!(
        "tuple index {} out of range for ()",
        index
    )))
}

fn unit_assemble(items: Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, Error> {
    if !items.is_empty() {
        return Err(Error::invalid_data("() holds no elements"));
    }
    Ok(Box::new(()))
}

impl Reflect for () {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<()>(
            TypeKind::Tuple(TupleOps {
                elements: Vec::new(),
                element: unit_element,
                assemble: unit_assemble,
            }),
            ValueOps::of::<()>().with_default::<()>().with_eq::<()>(),
        )
        .with_name("()")
    }
}

fn next_element(items: &mut std::vec::IntoIter<Box<dyn Any>>) -> Result<Box<dyn Any>, Error> {
    items
        .next()
        .ok_or_else(|| Error::invalid_data("tuple assembled with too few elements"))
}

macro_rules! impl_tuple {
    ($element:ident, $assemble:ident, $len:literal => $($name:ident $idx:tt),+) => {
        fn $element<$($name: Any),+>(value: &dyn Any, index: usize) -> Result<&dyn Any, Error> {
            let tuple = downcast_ref::<($($name,)+)>(value)?;
            match index {
                $($idx => Ok(&tuple.$idx as &dyn Any),)+
                _ => Err(Error::invalid_data(format!(
                    "tuple index {} out of range for {} elements",
                    index, $len
                ))),
            }
        }

        fn $assemble<$($name: Any),+>(items: Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, Error> {
            if items.len() != $len {
                return Err(Error::invalid_data(format!(
                    "tuple of {} elements assembled from {} values",
                    $len,
                    items.len()
                )));
            }
            let mut items = items.into_iter();
            Ok(Box::new(($(downcast_box::<$name>(next_element(&mut items)?)?,)+)))
        }

        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::new::<Self>(
                    TypeKind::Tuple(TupleOps {
                        elements: vec![$(TypeKey::of::<$name>()),+],
                        element: $element::<$($name),+>,
                        assemble: $assemble::<$($name),+>,
                    }),
                    ValueOps::of::<Self>(),
                )
            }
        }
    };
}

impl_tuple!(tuple1_element, tuple1_assemble, 1 => A 0);
impl_tuple!(tuple2_element, tuple2_assemble, 2 => A 0, B 1);
impl_tuple!(tuple3_element, tuple3_assemble, 3 => A 0, B 1, C 2);
impl_tuple!(tuple4_element, tuple4_assemble, 4 => A 0, B 1, C 2, D 3);
impl_tuple!(tuple5_element, tuple5_assemble, 5 => A 0, B 1, C 2, D 3, E 4);
impl_tuple!(tuple6_element, tuple6_assemble, 6 => A 0, B 1, C 2, D 3, E 4, F 5);
impl_tuple!(tuple7_element, tuple7_assemble, 7 => A 0, B 1, C 2, D 3, E 4, F 5, G 6);

fn rc_address<T: Any>(value: &dyn Any) -> Result<usize, Error> {
    Ok(Rc::as_ptr(downcast_ref::<Rc<T>>(value)?) as *const () as usize)
}

fn rc_keep_alive<T: Any>(value: &dyn Any) -> Result<Rc<dyn Any>, Error> {
    let rc: Rc<T> = downcast_ref::<Rc<T>>(value)?.clone();
    Ok(rc as Rc<dyn Any>)
}

fn rc_get<T: Any>(value: &dyn Any) -> Result<&dyn Any, Error> {
    let inner: &T = downcast_ref::<Rc<T>>(value)?;
    Ok(inner as &dyn Any)
}

fn rc_wrap<T: Any>(value: Box<dyn Any>) -> Result<Box<dyn Any>, Error> {
    Ok(Box::new(Rc::new(downcast_box::<T>(value)?)))
}

fn rc_share<T: Any>(value: &dyn Any) -> Result<Box<dyn Any>, Error> {
    Ok(Box::new(Rc::clone(downcast_ref::<Rc<T>>(value)?)))
}

impl<T: Reflect> Reflect for Rc<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>(
            TypeKind::Shared(SharedOps {
                inner: TypeKey::of::<T>(),
                address: rc_address::<T>,
                keep_alive: rc_keep_alive::<T>,
                get: rc_get::<T>,
                wrap: rc_wrap::<T>,
                share: rc_share::<T>,
            }),
            ValueOps::of::<Self>(),
        )
    }
}

fn cell_visit<T: Any>(
    value: &dyn Any,
    f: &mut dyn FnMut(&dyn Any) -> Result<(), Error>,
) -> Result<(), Error> {
    let cell = downcast_ref::<RefCell<T>>(value)?;
    let inner = cell
        .try_borrow()
        .map_err(|_| Error::not_allowed("cell is mutably borrowed while being written"))?;
    f(&*inner)
}

fn cell_visit_mut<T: Any>(
    value: &dyn Any,
    f: &mut dyn FnMut(&mut dyn Any) -> Result<(), Error>,
) -> Result<(), Error> {
    let cell = downcast_ref::<RefCell<T>>(value)?;
    let mut inner = cell
        .try_borrow_mut()
        .map_err(|_| Error::not_allowed("cell is already borrowed while being read"))?;
    f(&mut *inner)
}

fn cell_wrap<T: Any>(value: Box<dyn Any>) -> Result<Box<dyn Any>, Error> {
    Ok(Box::new(RefCell::new(downcast_box::<T>(value)?)))
}

impl<T: Reflect> Reflect for RefCell<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>(
            TypeKind::Cell(CellOps {
                inner: TypeKey::of::<T>(),
                visit: cell_visit::<T>,
                visit_mut: cell_visit_mut::<T>,
                wrap: cell_wrap::<T>,
            }),
            ValueOps::of::<Self>(),
        )
    }
}

fn box_get<T: Any>(value: &dyn Any) -> Result<&dyn Any, Error> {
    let inner: &T = downcast_ref::<Box<T>>(value)?;
    Ok(inner as &dyn Any)
}

fn box_get_mut<T: Any>(value: &mut dyn Any) -> Result<&mut dyn Any, Error> {
    let inner: &mut T = downcast_mut::<Box<T>>(value)?;
    Ok(inner as &mut dyn Any)
}

fn box_wrap<T: Any>(value: Box<dyn Any>) -> Result<Box<dyn Any>, Error> {
    Ok(Box::new(Box::new(downcast_box::<T>(value)?)))
}

impl<T: Reflect> Reflect for Box<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>(
            TypeKind::Boxed(WrapperOps {
                inner: TypeKey::of::<T>(),
                get: box_get::<T>,
                get_mut: box_get_mut::<T>,
                wrap: box_wrap::<T>,
            }),
            ValueOps::of::<Self>(),
        )
    }
}

impl Reflect for AnyValue {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<AnyValue>(
            TypeKind::Any,
            ValueOps::of::<AnyValue>().with_default::<AnyValue>(),
        )
        .with_name("AnyValue")
    }
}

impl Reflect for MemberRef {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<MemberRef>(
            TypeKind::MemberRef,
            ValueOps::of::<MemberRef>()
                .with_default::<MemberRef>()
                .with_eq::<MemberRef>(),
        )
        .with_name("MemberRef")
    }
}

impl Reflect for Delegate {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Delegate>(
            TypeKind::Delegate,
            ValueOps::of::<Delegate>().with_default::<Delegate>(),
        )
        .with_name("Delegate")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_are_collections_of_pairs() {
        let descriptor = HashMap::<String, i32>::describe();
        let item = descriptor.item_type().unwrap();
        assert!(item.is::<KeyValuePair<String, i32>>());
        assert!(matches!(item.describe().kind(), TypeKind::KeyValuePair(_)));
    }

    #[test]
    fn tuple_elements_are_addressable() {
        let descriptor = <(i32, String, bool)>::describe();
        let TypeKind::Tuple(ops) = descriptor.kind() else {
            panic!("not a tuple");
        };
        let value = (7i32, "seven".to_string(), true);
        assert_eq!((ops.element)(&value, 0).unwrap().downcast_ref::<i32>(), Some(&7));
        assert!((ops.element)(&value, 3).is_err());
        let rebuilt = (ops.assemble)(vec![
            Box::new(1i32),
            Box::new("one".to_string()),
            Box::new(false),
        ])
        .unwrap();
        assert_eq!(
            *rebuilt.downcast::<(i32, String, bool)>().unwrap(),
            (1, "one".to_string(), false)
        );
    }

    #[test]
    fn fixed_arrays_check_their_length() {
        let descriptor = <[u16; 3]>::describe();
        let TypeKind::Array(ops) = descriptor.kind() else {
            panic!("not an array");
        };
        assert!((ops.assemble)(vec![Box::new(1u16), Box::new(2u16)]).is_err());
        assert!(descriptor.construct().is_err());
    }

    #[test]
    fn shared_shells_expose_their_address() {
        let TypeKind::Shared(ops) = Rc::<String>::describe().kind().clone() else {
            panic!("not shared");
        };
        let a = Rc::new("a".to_string());
        let b = a.clone();
        assert_eq!((ops.address)(&a).unwrap(), (ops.address)(&b).unwrap());
        let shared = (ops.share)(&a).unwrap();
        assert!(Rc::ptr_eq(&a, &shared.downcast::<Rc<String>>().unwrap()));
    }

    #[test]
    fn standard_values_have_stable_names() {
        assert_eq!(Uuid::describe().name(), "Uuid");
        assert!(NaiveDate::describe().is_fixed_size());
        assert!(!PathBuf::describe().is_fixed_size());
        let empty = IpAddr::describe().construct().unwrap();
        assert_eq!(*empty.downcast::<IpAddr>().unwrap(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
}
