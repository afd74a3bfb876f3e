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

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::formatter::{CustomAdapter, CustomFormatter, Formatter};
use crate::formatter::{FormatterFactory, InterpretedFactory};
use crate::meta::{DeclaredMembers, MemberEnumerator};
use crate::reflect::{MemberDescriptor, Reflect, TargetMembers, TypeDescriptor, TypeKey};
use crate::resolver::formatter_resolver::Resolver;
use crate::resolver::type_resolver::{NameBinder, TypeBinder};

/// How members that cannot be assigned after construction are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadonlyFieldHandling {
    /// Readonly members are left out of the schema.
    #[default]
    Exclude,
    /// Readonly members are written and assigned like any other member.
    ForcedOverwrite,
    /// Readonly members are written; on read, reference-like members are
    /// populated in place and value members must equal the existing value.
    Members,
}

/// Which delegates may be written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DelegateSerialization {
    #[default]
    Off,
    /// Only delegates without a bound target.
    StaticOnly,
    AllowInstanceTargets,
}

/// Decides inclusion of one member ahead of markers and policies; `None`
/// defers to them.
pub type MemberFilter = Rc<dyn Fn(&TypeDescriptor, &MemberDescriptor) -> Option<bool>>;

pub(crate) type CustomFormatterFn = Rc<dyn Fn(Rc<TypeDescriptor>) -> Rc<dyn Formatter>>;

/// Configuration for a [`Tessera`](crate::Tessera) instance.
///
/// Built with chained setters and consumed by `Tessera::new`, which
/// validates the combination; an instance never sees its configuration
/// change afterwards.
///
/// ```
/// use tessera_core::config::{Config, ReadonlyFieldHandling};
///
/// let config = Config::new()
///     .version_tolerance(true)
///     .readonly_handling(ReadonlyFieldHandling::Members)
///     .known_type::<String>()
///     .max_depth(64);
/// assert!(config.is_version_tolerant());
/// ```
#[derive(Clone)]
pub struct Config {
    pub(crate) version_tolerance: bool,
    pub(crate) preserve_references: bool,
    pub(crate) embed_checksum: bool,
    pub(crate) persist_type_cache: bool,
    pub(crate) persist_object_cache: bool,
    pub(crate) known_types: Vec<TypeKey>,
    pub(crate) denied_types: HashSet<String>,
    pub(crate) default_members: TargetMembers,
    pub(crate) type_members: HashMap<TypeId, TargetMembers>,
    pub(crate) readonly_handling: ReadonlyFieldHandling,
    pub(crate) skip_synthetic_members: bool,
    pub(crate) delegate_serialization: DelegateSerialization,
    pub(crate) max_string_size: usize,
    pub(crate) max_array_size: usize,
    pub(crate) max_collection_size: usize,
    pub(crate) max_frame_size: usize,
    pub(crate) max_depth: u32,
    pub(crate) should_serialize_member: Option<MemberFilter>,
    pub(crate) custom_formatters: HashMap<TypeId, CustomFormatterFn>,
    pub(crate) resolvers: Vec<Rc<dyn Resolver>>,
    pub(crate) binder: Rc<dyn TypeBinder>,
    pub(crate) member_enumerator: Rc<dyn MemberEnumerator>,
    pub(crate) formatter_factory: Rc<dyn FormatterFactory>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version_tolerance: false,
            preserve_references: true,
            embed_checksum: false,
            persist_type_cache: false,
            persist_object_cache: false,
            known_types: Vec::new(),
            denied_types: HashSet::new(),
            default_members: TargetMembers::default(),
            type_members: HashMap::new(),
            readonly_handling: ReadonlyFieldHandling::default(),
            skip_synthetic_members: true,
            delegate_serialization: DelegateSerialization::default(),
            max_string_size: 16 * 1024 * 1024,
            max_array_size: 16 * 1024 * 1024,
            max_collection_size: 16 * 1024 * 1024,
            max_frame_size: 64 * 1024 * 1024,
            max_depth: 256,
            should_serialize_member: None,
            custom_formatters: HashMap::new(),
            resolvers: Vec::new(),
            binder: Rc::new(NameBinder),
            member_enumerator: Rc::new(DeclaredMembers),
            formatter_factory: Rc::new(InterpretedFactory),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes schemas ahead of objects and length-prefixes every member so
    /// data survives added, removed and renamed members.
    pub fn version_tolerance(mut self, enabled: bool) -> Self {
        self.version_tolerance = enabled;
        self
    }

    /// When off, every shell is written in full and cycles are not detected.
    pub fn preserve_references(mut self, enabled: bool) -> Self {
        self.preserve_references = enabled;
        self
    }

    /// Prefixes every payload with the protocol checksum.
    pub fn embed_checksum(mut self, enabled: bool) -> Self {
        self.embed_checksum = enabled;
        self
    }

    /// Keeps the type cache across calls, so repeated types shrink to ids.
    /// Both peers must process the same calls in the same order.
    pub fn persist_type_cache(mut self, enabled: bool) -> Self {
        self.persist_type_cache = enabled;
        self
    }

    pub fn persist_object_cache(mut self, enabled: bool) -> Self {
        self.persist_object_cache = enabled;
        self
    }

    /// Declares a type both peers know up front. Known types are written as
    /// small ids and contribute to the protocol checksum.
    pub fn known_type<T: Reflect>(mut self) -> Self {
        let key = TypeKey::of::<T>();
        if !self.known_types.contains(&key) {
            self.known_types.push(key);
        }
        self
    }

    /// Refuses a type by binding name or full Rust name.
    pub fn deny_type(mut self, name: impl Into<String>) -> Self {
        self.denied_types.insert(name.into());
        self
    }

    pub fn default_members(mut self, members: TargetMembers) -> Self {
        self.default_members = members;
        self
    }

    /// Member policy for one type, taking precedence over the type's own
    /// declaration and the global default.
    pub fn type_members<T: Reflect>(mut self, members: TargetMembers) -> Self {
        self.type_members.insert(TypeId::of::<T>(), members);
        self
    }

    pub fn readonly_handling(mut self, handling: ReadonlyFieldHandling) -> Self {
        self.readonly_handling = handling;
        self
    }

    pub fn skip_synthetic_members(mut self, enabled: bool) -> Self {
        self.skip_synthetic_members = enabled;
        self
    }

    pub fn delegate_serialization(mut self, policy: DelegateSerialization) -> Self {
        self.delegate_serialization = policy;
        self
    }

    /// Largest string, in bytes, accepted when reading.
    pub fn max_string_size(mut self, size: usize) -> Self {
        self.max_string_size = size;
        self
    }

    /// Largest array, in items, accepted when reading.
    pub fn max_array_size(mut self, size: usize) -> Self {
        self.max_array_size = size;
        self
    }

    /// Largest proxy collection or schema member count accepted when reading.
    pub fn max_collection_size(mut self, size: usize) -> Self {
        self.max_collection_size = size;
        self
    }

    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn should_serialize_member<F>(mut self, filter: F) -> Self
    where
        F: Fn(&TypeDescriptor, &MemberDescriptor) -> Option<bool> + 'static,
    {
        self.should_serialize_member = Some(Rc::new(filter));
        self
    }

    /// Replaces the built-in encoding of `T`.
    pub fn formatter<T, F>(mut self, formatter: F) -> Self
    where
        T: Reflect,
        F: CustomFormatter<T>,
    {
        let formatter = Rc::new(formatter);
        let create: CustomFormatterFn = Rc::new(move |descriptor: Rc<TypeDescriptor>| {
            Rc::new(CustomAdapter::new(descriptor, formatter.clone())) as Rc<dyn Formatter>
        });
        self.custom_formatters.insert(TypeId::of::<T>(), create);
        self
    }

    /// Adds a resolver consulted before every built-in one.
    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolvers.push(Rc::new(resolver));
        self
    }

    pub fn binder(mut self, binder: impl TypeBinder + 'static) -> Self {
        self.binder = Rc::new(binder);
        self
    }

    pub fn member_enumerator(mut self, enumerator: impl MemberEnumerator + 'static) -> Self {
        self.member_enumerator = Rc::new(enumerator);
        self
    }

    pub fn formatter_factory(mut self, factory: impl FormatterFactory + 'static) -> Self {
        self.formatter_factory = Rc::new(factory);
        self
    }

    #[inline(always)]
    pub fn is_version_tolerant(&self) -> bool {
        self.version_tolerance
    }

    #[inline(always)]
    pub fn is_preserve_references(&self) -> bool {
        self.preserve_references
    }

    #[inline(always)]
    pub fn is_embed_checksum(&self) -> bool {
        self.embed_checksum
    }

    #[inline(always)]
    pub fn is_persist_type_cache(&self) -> bool {
        self.persist_type_cache
    }

    #[inline(always)]
    pub fn is_persist_object_cache(&self) -> bool {
        self.persist_object_cache
    }

    pub fn known_types(&self) -> &[TypeKey] {
        &self.known_types
    }

    pub fn is_denied(&self, descriptor: &TypeDescriptor) -> bool {
        self.denied_types.contains(descriptor.name())
            || self.denied_types.contains(descriptor.full_name())
    }

    /// Member policy applied to `descriptor` when no marker decides.
    pub fn members_for(&self, descriptor: &TypeDescriptor) -> TargetMembers {
        self.type_members
            .get(&descriptor.id())
            .copied()
            .or_else(|| descriptor.object().and_then(|ops| ops.member_policy))
            .unwrap_or(self.default_members)
    }

    #[inline(always)]
    pub fn readonly(&self) -> ReadonlyFieldHandling {
        self.readonly_handling
    }

    #[inline(always)]
    pub fn is_skip_synthetic_members(&self) -> bool {
        self.skip_synthetic_members
    }

    #[inline(always)]
    pub fn delegates(&self) -> DelegateSerialization {
        self.delegate_serialization
    }

    #[inline(always)]
    pub fn string_limit(&self) -> usize {
        self.max_string_size
    }

    #[inline(always)]
    pub fn array_limit(&self) -> usize {
        self.max_array_size
    }

    #[inline(always)]
    pub fn collection_limit(&self) -> usize {
        self.max_collection_size
    }

    #[inline(always)]
    pub fn frame_limit(&self) -> usize {
        self.max_frame_size
    }

    #[inline(always)]
    pub fn depth_limit(&self) -> u32 {
        self.max_depth
    }

    pub fn member_filter(&self) -> Option<&MemberFilter> {
        self.should_serialize_member.as_ref()
    }

    pub fn binder_ref(&self) -> &dyn TypeBinder {
        self.binder.as_ref()
    }

    pub fn enumerator(&self) -> &dyn MemberEnumerator {
        self.member_enumerator.as_ref()
    }

    pub fn factory(&self) -> &Rc<dyn FormatterFactory> {
        &self.formatter_factory
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("version_tolerance", &self.version_tolerance)
            .field("preserve_references", &self.preserve_references)
            .field("embed_checksum", &self.embed_checksum)
            .field("persist_type_cache", &self.persist_type_cache)
            .field("persist_object_cache", &self.persist_object_cache)
            .field("known_types", &self.known_types)
            .field("readonly_handling", &self.readonly_handling)
            .field("delegate_serialization", &self.delegate_serialization)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
