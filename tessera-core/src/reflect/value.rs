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

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use super::{Reflect, TypeKey};
use crate::error::Error;

/// One entry of a map, the item type of map collections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyValuePair<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValuePair<K, V> {
    pub fn new(key: K, value: V) -> Self {
        KeyValuePair { key, value }
    }
}

/// A value whose concrete type is only known at runtime.
///
/// Written with a type token in front of the payload, so a member declared
/// as `AnyValue` can hold any registered or describable type.
pub struct AnyValue {
    key: TypeKey,
    value: Box<dyn Any>,
}

impl AnyValue {
    pub fn new<T: Reflect>(value: T) -> AnyValue {
        AnyValue {
            key: TypeKey::of::<T>(),
            value: Box::new(value),
        }
    }

    /// Wraps an already boxed value; `key` must describe its concrete type.
    pub(crate) fn from_parts(key: TypeKey, value: Box<dyn Any>) -> Result<AnyValue, Error> {
        if (*value).type_id() != key.id() {
            return Err(Error::type_mismatch(key.type_name(), "a value of another type"));
        }
        Ok(AnyValue { key, value })
    }

    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    pub fn is<T: Any>(&self) -> bool {
        self.key.is::<T>()
    }

    pub fn value(&self) -> &dyn Any {
        self.value.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }

    pub fn downcast<T: Any>(self) -> Result<T, AnyValue> {
        let key = self.key;
        self.value
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|value| AnyValue { key, value })
    }
}

impl Default for AnyValue {
    fn default() -> Self {
        AnyValue::new(())
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyValue({})", self.key.type_name())
    }
}

/// Reference to a member of a described type, written as the declaring
/// type token and the member's persistent name.
#[derive(Clone, PartialEq, Eq)]
pub struct MemberRef {
    declaring_type: TypeKey,
    member: Cow<'static, str>,
}

impl MemberRef {
    pub fn new<T: Reflect>(member: impl Into<Cow<'static, str>>) -> MemberRef {
        MemberRef {
            declaring_type: TypeKey::of::<T>(),
            member: member.into(),
        }
    }

    pub(crate) fn from_parts(declaring_type: TypeKey, member: String) -> MemberRef {
        MemberRef {
            declaring_type,
            member: Cow::Owned(member),
        }
    }

    pub fn declaring_type(&self) -> TypeKey {
        self.declaring_type
    }

    pub fn member(&self) -> &str {
        &self.member
    }
}

impl Default for MemberRef {
    fn default() -> Self {
        MemberRef::new::<()>("")
    }
}

impl fmt::Debug for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberRef({}::{})", self.declaring_type.type_name(), self.member)
    }
}

/// A named method, optionally bound to a target instance.
///
/// Written only when the delegate policy allows it; instance targets need
/// the most permissive setting.
#[derive(Default)]
pub struct Delegate {
    method: Cow<'static, str>,
    target: Option<AnyValue>,
}

impl Delegate {
    pub fn from_static(method: impl Into<Cow<'static, str>>) -> Delegate {
        Delegate {
            method: method.into(),
            target: None,
        }
    }

    pub fn bound<T: Reflect>(method: impl Into<Cow<'static, str>>, target: T) -> Delegate {
        Delegate {
            method: method.into(),
            target: Some(AnyValue::new(target)),
        }
    }

    pub(crate) fn from_parts(method: String, target: Option<AnyValue>) -> Delegate {
        Delegate {
            method: Cow::Owned(method),
            target,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> Option<&AnyValue> {
        self.target.as_ref()
    }

    pub fn is_static(&self) -> bool {
        self.target.is_none()
    }
}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("method", &self.method)
            .field("target", &self.target.as_ref().map(|t| t.key.type_name()))
            .finish()
    }
}
