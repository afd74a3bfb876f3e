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
use std::ops::BitOr;
use std::rc::Rc;

use super::TypeKey;
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    /// Accessed through getter and setter functions.
    Property,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
}

/// Explicit per-member inclusion marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberMarker {
    Include,
    Exclude,
}

/// Set of member categories selected by default.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetMembers(u8);

impl TargetMembers {
    pub const NONE: TargetMembers = TargetMembers(0);
    pub const PUBLIC_FIELDS: TargetMembers = TargetMembers(1);
    pub const PRIVATE_FIELDS: TargetMembers = TargetMembers(1 << 1);
    pub const PUBLIC_PROPERTIES: TargetMembers = TargetMembers(1 << 2);
    pub const PRIVATE_PROPERTIES: TargetMembers = TargetMembers(1 << 3);
    pub const ALL_FIELDS: TargetMembers = TargetMembers(0b0011);
    pub const ALL_PROPERTIES: TargetMembers = TargetMembers(0b1100);
    pub const ALL_PUBLIC: TargetMembers = TargetMembers(0b0101);
    pub const ALL: TargetMembers = TargetMembers(0b1111);

    #[inline]
    pub const fn contains(self, other: TargetMembers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn selects(self, kind: MemberKind, visibility: Visibility) -> bool {
        let bit = match (kind, visibility) {
            (MemberKind::Field, Visibility::Public) => Self::PUBLIC_FIELDS,
            (MemberKind::Field, Visibility::Private) => Self::PRIVATE_FIELDS,
            (MemberKind::Property, Visibility::Public) => Self::PUBLIC_PROPERTIES,
            (MemberKind::Property, Visibility::Private) => Self::PRIVATE_PROPERTIES,
        };
        self.contains(bit)
    }
}

impl BitOr for TargetMembers {
    type Output = TargetMembers;

    fn bitor(self, rhs: TargetMembers) -> TargetMembers {
        TargetMembers(self.0 | rhs.0)
    }
}

impl Default for TargetMembers {
    fn default() -> Self {
        TargetMembers::ALL_FIELDS | TargetMembers::PUBLIC_PROPERTIES
    }
}

impl fmt::Debug for TargetMembers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::PUBLIC_FIELDS, "PUBLIC_FIELDS"),
            (Self::PRIVATE_FIELDS, "PRIVATE_FIELDS"),
            (Self::PUBLIC_PROPERTIES, "PUBLIC_PROPERTIES"),
            (Self::PRIVATE_PROPERTIES, "PRIVATE_PROPERTIES"),
        ];
        let selected: Vec<&str> = names
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "TargetMembers({})", selected.join(" | "))
    }
}

/// A member value read through a getter: fields lend, properties compute.
pub enum MemberValue<'a> {
    Borrowed(&'a dyn Any),
    Owned(Box<dyn Any>),
}

impl MemberValue<'_> {
    pub fn as_any(&self) -> &dyn Any {
        match self {
            MemberValue::Borrowed(v) => *v,
            MemberValue::Owned(v) => v.as_ref(),
        }
    }
}

pub(crate) type Getter = Rc<dyn for<'a> Fn(&'a dyn Any) -> Result<MemberValue<'a>, Error>>;
pub(crate) type GetterMut = Rc<dyn for<'a> Fn(&'a mut dyn Any) -> Result<&'a mut dyn Any, Error>>;
pub(crate) type Setter = Rc<dyn Fn(&mut dyn Any, Box<dyn Any>) -> Result<(), Error>>;

/// Attributes of a member beyond its name, type and accessors.
#[derive(Clone, Debug)]
pub struct MemberOptions {
    pub(crate) visibility: Visibility,
    pub(crate) readonly: bool,
    pub(crate) synthetic: bool,
    pub(crate) indexer: bool,
    pub(crate) marker: Option<MemberMarker>,
    pub(crate) rename: Option<Cow<'static, str>>,
    pub(crate) alternate_names: Vec<Cow<'static, str>>,
    pub(crate) declaring_type: Option<Cow<'static, str>>,
}

impl MemberOptions {
    pub fn public() -> MemberOptions {
        MemberOptions {
            visibility: Visibility::Public,
            readonly: false,
            synthetic: false,
            indexer: false,
            marker: None,
            rename: None,
            alternate_names: Vec::new(),
            declaring_type: None,
        }
    }

    pub fn private() -> MemberOptions {
        MemberOptions {
            visibility: Visibility::Private,
            ..MemberOptions::public()
        }
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Marks a compiler or macro generated backing member.
    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    pub fn indexer(mut self) -> Self {
        self.indexer = true;
        self
    }

    pub fn include(mut self) -> Self {
        self.marker = Some(MemberMarker::Include);
        self
    }

    pub fn exclude(mut self) -> Self {
        self.marker = Some(MemberMarker::Exclude);
        self
    }

    /// Persistent name written on the wire instead of the declared one.
    pub fn rename(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.rename = Some(name.into());
        self
    }

    /// Previous persistent name still accepted when reading old data.
    pub fn alias(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.alternate_names.push(name.into());
        self
    }

    /// Records that the member was flattened in from another type.
    pub fn declared_in(mut self, type_name: impl Into<Cow<'static, str>>) -> Self {
        self.declaring_type = Some(type_name.into());
        self
    }
}

/// One candidate member of a user type.
#[derive(Clone)]
pub struct MemberDescriptor {
    pub(crate) name: Cow<'static, str>,
    pub(crate) declared_name: &'static str,
    pub(crate) declaring_type: Cow<'static, str>,
    pub(crate) member_type: TypeKey,
    pub(crate) kind: MemberKind,
    pub(crate) options: MemberOptions,
    pub(crate) getter: Getter,
    pub(crate) getter_mut: Option<GetterMut>,
    pub(crate) setter: Option<Setter>,
}

impl MemberDescriptor {
    /// Persistent name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name as declared in the source type.
    pub fn declared_name(&self) -> &'static str {
        self.declared_name
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn member_type(&self) -> TypeKey {
        self.member_type
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn is_field(&self) -> bool {
        self.kind == MemberKind::Field
    }

    pub fn visibility(&self) -> Visibility {
        self.options.visibility
    }

    pub fn is_readonly(&self) -> bool {
        self.options.readonly
    }

    pub fn is_synthetic(&self) -> bool {
        self.options.synthetic
    }

    pub fn is_indexer(&self) -> bool {
        self.options.indexer
    }

    pub fn marker(&self) -> Option<MemberMarker> {
        self.options.marker
    }

    pub fn alternate_names(&self) -> &[Cow<'static, str>] {
        &self.options.alternate_names
    }

    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.options.alternate_names.iter().any(|alt| alt == name)
    }

    /// Properties are candidates only when they can be both read and written.
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub fn get<'a>(&self, object: &'a dyn Any) -> Result<MemberValue<'a>, Error> {
        (self.getter)(object)
    }

    /// In-place access; `None` for computed properties.
    pub fn get_mut<'a>(&self, object: &'a mut dyn Any) -> Result<Option<&'a mut dyn Any>, Error> {
        match &self.getter_mut {
            Some(getter_mut) => getter_mut(object).map(Some),
            None => Ok(None),
        }
    }

    pub fn set(&self, object: &mut dyn Any, value: Box<dyn Any>) -> Result<(), Error> {
        match &self.setter {
            Some(setter) => setter(object, value),
            None => Err(Error::not_allowed(format!(
                "member {} of {} has no setter",
                self.name, self.declaring_type
            ))),
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("member_type", &self.member_type.type_name())
            .field("kind", &self.kind)
            .field("visibility", &self.options.visibility)
            .field("readonly", &self.options.readonly)
            .finish()
    }
}
