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
use std::cmp::Ordering;
use std::collections::HashSet;
use std::rc::Rc;

use tracing::trace;

use crate::buffer::{Reader, Writer};
use crate::config::{Config, ReadonlyFieldHandling};
use crate::error::Error;
use crate::reflect::{MemberDescriptor, MemberKind, MemberMarker, TypeDescriptor};
use crate::resolver::type_resolver::TypeResolver;

/// Discovers the candidate members of a type.
///
/// Returns indexes into [`TypeDescriptor::members`]. Selection policies are
/// applied afterwards, so an enumerator only decides what exists.
pub trait MemberEnumerator {
    fn enumerate(&self, descriptor: &TypeDescriptor) -> Vec<usize>;
}

/// Every member the descriptor declares, in declaration order.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclaredMembers;

impl MemberEnumerator for DeclaredMembers {
    fn enumerate(&self, descriptor: &TypeDescriptor) -> Vec<usize> {
        (0..descriptor.members().len()).collect()
    }
}

/// One member slot of a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaMember {
    name: String,
    member: Option<usize>,
}

impl SchemaMember {
    /// Persistent name as written on the wire.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the bound live member in the descriptor.
    pub fn member(&self) -> Option<usize> {
        self.member
    }

    /// The name no longer maps to a live member; its bytes are skipped.
    pub fn is_skip(&self) -> bool {
        self.member.is_none()
    }
}

/// Ordered member list of one type.
///
/// The primary schema describes the local type; secondary schemas are read
/// from data written by another version of it.
#[derive(Debug)]
pub struct Schema {
    type_id: TypeId,
    type_name: &'static str,
    members: Vec<SchemaMember>,
    is_primary: bool,
}

struct Candidate<'d> {
    index: usize,
    member: &'d MemberDescriptor,
    fixed_size: bool,
}

fn member_order(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    let field_rank = |c: &Candidate<'_>| match c.member.kind() {
        MemberKind::Field => 0,
        MemberKind::Property => 1,
    };
    (!a.fixed_size)
        .cmp(&!b.fixed_size)
        .then_with(|| {
            a.member
                .member_type()
                .type_name()
                .cmp(b.member.member_type().type_name())
        })
        .then_with(|| a.member.name().cmp(b.member.name()))
        .then_with(|| a.member.declaring_type().cmp(b.member.declaring_type()))
        .then_with(|| field_rank(a).cmp(&field_rank(b)))
}

impl Schema {
    /// Computes the schema of the local type.
    pub fn compute_primary(
        descriptor: &TypeDescriptor,
        config: &Config,
        types: &TypeResolver,
    ) -> Result<Schema, Error> {
        let policy = config.members_for(descriptor);
        let members = descriptor.members();
        let mut candidates = Vec::new();
        let mut considered = 0usize;
        let mut synthetic_dropped = 0usize;

        for index in config.enumerator().enumerate(descriptor) {
            let member = members.get(index).ok_or_else(|| {
                Error::configuration(format!(
                    "member enumerator returned index {} but {} declares {} members",
                    index,
                    descriptor.full_name(),
                    members.len()
                ))
            })?;
            if member.is_indexer() || (!member.is_field() && !member.is_writable()) {
                continue;
            }
            considered += 1;
            if member.is_synthetic() && config.is_skip_synthetic_members() {
                trace!(member = member.name(), "synthetic member skipped");
                synthetic_dropped += 1;
                continue;
            }
            let included = config
                .member_filter()
                .and_then(|filter| filter(descriptor, member))
                .or_else(|| member.marker().map(|marker| marker == MemberMarker::Include))
                .unwrap_or_else(|| policy.selects(member.kind(), member.visibility()));
            if !included {
                trace!(
                    member = member.name(),
                    type_name = descriptor.full_name(),
                    "member not selected"
                );
                continue;
            }
            if member.is_readonly() && config.readonly() == ReadonlyFieldHandling::Exclude {
                trace!(member = member.name(), "readonly member excluded");
                continue;
            }
            let fixed_size = types.descriptor(member.member_type())?.is_fixed_size();
            candidates.push(Candidate {
                index,
                member,
                fixed_size,
            });
        }

        if considered > 0 && synthetic_dropped == considered {
            return Err(Error::unsupported_type(format!(
                "{} only has synthetic members, none of which are serialized",
                descriptor.full_name()
            )));
        }

        candidates.sort_by(member_order);

        if config.is_version_tolerant() {
            let mut seen = HashSet::new();
            for candidate in &candidates {
                if !seen.insert(candidate.member.name()) {
                    return Err(Error::configuration(format!(
                        "{} has two members persisted as {}",
                        descriptor.full_name(),
                        candidate.member.name()
                    )));
                }
            }
        }

        Ok(Schema {
            type_id: descriptor.id(),
            type_name: descriptor.full_name(),
            members: candidates
                .into_iter()
                .map(|c| SchemaMember {
                    name: c.member.name().to_owned(),
                    member: Some(c.index),
                })
                .collect(),
            is_primary: true,
        })
    }

    /// Steps over a schema of a type with no local counterpart.
    pub fn skip_wire(reader: &mut Reader, config: &Config) -> Result<(), Error> {
        let count = reader.read_varuint32()? as usize;
        if count > config.collection_limit() {
            return Err(Error::size_limit(
                "schema member count",
                count,
                config.collection_limit(),
            ));
        }
        for _ in 0..count {
            reader.read_string(config.string_limit())?;
        }
        Ok(())
    }

    /// Reads a schema written by [`Schema::write_to_wire`] and binds its
    /// names to the members of `primary`.
    pub fn read_from_wire(
        reader: &mut Reader,
        descriptor: &TypeDescriptor,
        primary: &Schema,
        config: &Config,
    ) -> Result<Schema, Error> {
        let count = reader.read_varuint32()? as usize;
        if count > config.collection_limit() {
            return Err(Error::size_limit(
                "schema member count",
                count,
                config.collection_limit(),
            ));
        }
        let members = descriptor.members();
        let mut bound = HashSet::new();
        let mut schema_members = Vec::with_capacity(count);
        for _ in 0..count {
            let name = reader.read_string(config.string_limit())?;
            let live = primary
                .members
                .iter()
                .filter_map(|m| m.member)
                .find(|&i| members[i].name() == name)
                .or_else(|| {
                    primary
                        .members
                        .iter()
                        .filter_map(|m| m.member)
                        .find(|&i| members[i].answers_to(&name))
                })
                .filter(|&i| bound.insert(i));
            schema_members.push(SchemaMember { name, member: live });
        }
        Ok(Schema {
            type_id: descriptor.id(),
            type_name: descriptor.full_name(),
            members: schema_members,
            is_primary: false,
        })
    }

    pub fn write_to_wire(&self, writer: &mut Writer) -> Result<(), Error> {
        if !self.is_primary {
            return Err(Error::not_allowed(format!(
                "only the primary schema of {} can be written",
                self.type_name
            )));
        }
        writer.write_varuint32(self.members.len() as u32);
        for member in &self.members {
            writer.write_string(&member.name);
        }
        Ok(())
    }

    pub fn id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn members(&self) -> &[SchemaMember] {
        &self.members
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Same member names bound to the same live members.
    pub fn same_shape(&self, other: &Schema) -> bool {
        self.type_id == other.type_id && self.members == other.members
    }

    /// Live members in schema order.
    pub fn bound_members<'s>(
        &'s self,
        descriptor: &'s TypeDescriptor,
    ) -> impl Iterator<Item = &'s MemberDescriptor> + 's {
        let members = descriptor.members();
        self.members
            .iter()
            .filter_map(move |m| m.member.map(|i| &members[i]))
    }
}

/// Returns the shared instance for `schema`, recording it when its shape is new.
pub(crate) fn intern(
    schemas: &mut Vec<Rc<Schema>>,
    primary: &Rc<Schema>,
    schema: Schema,
) -> (Rc<Schema>, bool) {
    if primary.same_shape(&schema) {
        return (primary.clone(), false);
    }
    if let Some(existing) = schemas.iter().find(|s| s.same_shape(&schema)) {
        return (existing.clone(), false);
    }
    let schema = Rc::new(schema);
    schemas.push(schema.clone());
    (schema, true)
}
