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

//! Dynamic object formatter.
//!
//! Members are written back to back in schema order. In version tolerant
//! mode the schema precedes the first instance of a type and every member
//! is wrapped in a `u32` length prefix, so readers can skip members they no
//! longer have. Each member is followed by the definitions its bytes
//! introduced (new object ids, type names, schemas); a reader replays them
//! after skipping the member and steps over them otherwise. The per-schema read and write procedures come from a
//! [`FormatterFactory`] and are memoized by schema identity.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::config::ReadonlyFieldHandling;
use crate::error::Error;
use crate::meta::Schema;
use crate::reflect::{MemberDescriptor, TypeDescriptor, TypeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};
use crate::types::MEMBER_LENGTH_SIZE;

use super::Formatter;

pub type WriteFn = Box<dyn Fn(&dyn Any, &mut WriteContext<'_>) -> Result<(), Error>>;
pub type ReadFn = Box<dyn Fn(&mut dyn Any, &mut ReadContext<'_>) -> Result<(), Error>>;

/// Compiled member loop of one schema.
pub struct Procedures {
    pub write: WriteFn,
    pub read: ReadFn,
}

/// How a member read from the wire reaches the object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadonlyMode {
    Assign,
    /// Read into the existing member value.
    PopulateInPlace,
    /// Read a value and require it to equal the existing one.
    VerifyUnchanged,
}

/// One schema slot with everything needed to move its bytes.
#[derive(Clone)]
pub struct MemberPlan {
    pub name: String,
    /// `None` for a skip member.
    pub member: Option<MemberDescriptor>,
    pub formatter: Option<Rc<dyn Formatter>>,
    pub readonly: ReadonlyMode,
}

/// Turns member plans into procedures.
pub trait FormatterFactory {
    fn create(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        schema: &Rc<Schema>,
        plans: Vec<MemberPlan>,
        version_tolerant: bool,
    ) -> Result<Procedures, Error>;
}

/// Interprets the member plans on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterpretedFactory;

struct BoundMember {
    name: String,
    member: MemberDescriptor,
    formatter: Rc<dyn Formatter>,
    readonly: ReadonlyMode,
}

impl BoundMember {
    fn read(&self, target: &mut dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        match self.readonly {
            ReadonlyMode::Assign => {
                let value = self.formatter.read(ctx)?;
                self.member.set(target, value)
            }
            ReadonlyMode::PopulateInPlace => match self.member.get_mut(target)? {
                Some(slot) => self.formatter.read_into(slot, ctx),
                None => self.verify(target, ctx),
            },
            ReadonlyMode::VerifyUnchanged => self.verify(target, ctx),
        }
    }

    fn verify(&self, target: &dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        let incoming = self.formatter.read(ctx)?;
        let current = self.member.get(target)?;
        match self.formatter.values_equal(current.as_any(), incoming.as_ref()) {
            Some(true) => Ok(()),
            Some(false) => Err(Error::readonly_conflict(format!(
                "readonly member {} of {} differs from the serialized value",
                self.name,
                self.member.declaring_type()
            ))),
            None => Err(Error::readonly_conflict(format!(
                "readonly member {} of {} cannot be compared",
                self.name,
                self.member.declaring_type()
            ))),
        }
    }
}

impl FormatterFactory for InterpretedFactory {
    fn create(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        schema: &Rc<Schema>,
        plans: Vec<MemberPlan>,
        version_tolerant: bool,
    ) -> Result<Procedures, Error> {
        // None marks a skip member.
        let mut slots: Vec<Option<BoundMember>> = Vec::with_capacity(plans.len());
        for plan in plans {
            match (plan.member, plan.formatter) {
                (Some(member), Some(formatter)) => slots.push(Some(BoundMember {
                    name: plan.name,
                    member,
                    formatter,
                    readonly: plan.readonly,
                })),
                (None, _) => slots.push(None),
                (Some(_), None) => {
                    return Err(Error::unsupported_type(format!(
                        "member {} of {} has no formatter",
                        plan.name,
                        descriptor.full_name()
                    )))
                }
            }
        }
        if !version_tolerant && slots.iter().any(Option::is_none) {
            return Err(Error::not_allowed(format!(
                "schema of {} has skip members outside version tolerant mode",
                descriptor.full_name()
            )));
        }
        let slots = Rc::new(slots);
        let type_name = schema.type_name();

        let write_slots = slots.clone();
        let write: WriteFn = Box::new(move |value: &dyn Any, ctx: &mut WriteContext<'_>| {
            for slot in write_slots.iter() {
                let Some(bound) = slot else {
                    return Err(Error::not_allowed(format!(
                        "cannot write {type_name} with a schema read from the wire"
                    )));
                };
                let member = bound.member.get(value)?;
                if !version_tolerant {
                    bound.formatter.write(member.as_any(), ctx)?;
                    continue;
                }
                let mark = ctx.definition_mark();
                let prefix = ctx.writer.reserve_u32();
                bound.formatter.write(member.as_any(), ctx)?;
                let len = ctx.writer.position() - prefix - MEMBER_LENGTH_SIZE;
                let len = u32::try_from(len).map_err(|_| {
                    Error::framing(format!(
                        "member {} of {type_name} takes {len} bytes",
                        bound.name
                    ))
                })?;
                ctx.writer.patch_u32(prefix, len);
                ctx.write_definitions(mark)?;
            }
            Ok(())
        });

        let read: ReadFn = Box::new(move |target: &mut dyn Any, ctx: &mut ReadContext<'_>| {
            for slot in slots.iter() {
                if !version_tolerant {
                    if let Some(bound) = slot {
                        bound.read(target, ctx)?;
                    }
                    continue;
                }
                let len = ctx.reader.read_u32()? as usize;
                let Some(bound) = slot else {
                    ctx.reader.skip(len)?;
                    ctx.apply_definitions(len)?;
                    continue;
                };
                let start = ctx.reader.cursor();
                bound.read(target, ctx)?;
                let consumed = ctx.reader.cursor() - start;
                if consumed != len {
                    return Err(Error::framing(format!(
                        "member {} of {} consumed {} bytes but its prefix says {}",
                        bound.name, type_name, consumed, len
                    )));
                }
                ctx.skip_definitions()?;
            }
            Ok(())
        });

        Ok(Procedures { write, read })
    }
}

pub struct ObjectFormatter {
    descriptor: Rc<TypeDescriptor>,
    primary: Rc<Schema>,
    /// Indexed like the descriptor's members; `None` for unselected members.
    members: Vec<Option<(Rc<dyn Formatter>, ReadonlyMode)>>,
    factory: Rc<dyn FormatterFactory>,
    version_tolerant: bool,
    procedures: RefCell<HashMap<*const Schema, (Rc<Schema>, Rc<Procedures>)>>,
}

impl ObjectFormatter {
    pub fn primary(&self) -> &Rc<Schema> {
        &self.primary
    }

    fn procedures_for(&self, schema: &Rc<Schema>) -> Result<Rc<Procedures>, Error> {
        if let Some((_, procedures)) = self.procedures.borrow().get(&Rc::as_ptr(schema)) {
            return Ok(procedures.clone());
        }
        let declared = self.descriptor.members();
        let plans = schema
            .members()
            .iter()
            .map(|slot| {
                let bound = slot
                    .member()
                    .and_then(|index| self.members.get(index)?.as_ref().map(|m| (index, m)));
                match bound {
                    Some((index, (formatter, readonly))) => MemberPlan {
                        name: slot.name().to_owned(),
                        member: Some(declared[index].clone()),
                        formatter: Some(formatter.clone()),
                        readonly: *readonly,
                    },
                    None => MemberPlan {
                        name: slot.name().to_owned(),
                        member: None,
                        formatter: None,
                        readonly: ReadonlyMode::Assign,
                    },
                }
            })
            .collect::<Vec<_>>();
        let procedures = Rc::new(self.factory.create(
            &self.descriptor,
            schema,
            plans,
            self.version_tolerant,
        )?);
        debug!(
            type_name = self.descriptor.full_name(),
            primary = schema.is_primary(),
            "compiled member procedures"
        );
        self.procedures
            .borrow_mut()
            .insert(Rc::as_ptr(schema), (schema.clone(), procedures.clone()));
        Ok(procedures)
    }

    fn write_members(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        if self.version_tolerant && ctx.mark_schema_written(&self.descriptor, &self.primary) {
            self.primary.write_to_wire(&mut ctx.writer)?;
        }
        let procedures = self.procedures_for(&self.primary)?;
        (procedures.write)(value, ctx)
    }

    fn read_members(&self, target: &mut dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        let schema = if self.version_tolerant {
            self.active_schema(ctx)?
        } else {
            self.primary.clone()
        };
        let procedures = self.procedures_for(&schema)?;
        (procedures.read)(target, ctx)
    }

    fn active_schema(&self, ctx: &mut ReadContext<'_>) -> Result<Rc<Schema>, Error> {
        let type_id = self.descriptor.id();
        if let Some(schema) = ctx.active_schema(type_id) {
            return Ok(schema);
        }
        let (schemas, config, types) = (ctx.schemas(), ctx.config(), ctx.types());
        let schema = schemas.read_schema(&mut ctx.reader, &self.descriptor, config, types)?;
        ctx.activate_schema(type_id, schema.clone());
        Ok(schema)
    }
}

impl Formatter for ObjectFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.enter(&self.descriptor)?;
        let result = self.write_members(value, ctx);
        ctx.leave();
        result
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let mut value = self.descriptor.construct()?;
        self.read_into(value.as_mut(), ctx)?;
        Ok(value)
    }

    fn read_into(&self, target: &mut dyn Any, ctx: &mut ReadContext<'_>) -> Result<(), Error> {
        ctx.enter(&self.descriptor)?;
        let result = self.read_members(target, ctx);
        ctx.leave();
        result
    }

    fn values_equal(&self, a: &dyn Any, b: &dyn Any) -> Option<bool> {
        if let Some(eq) = self.descriptor.ops().eq {
            return Some(eq(a, b));
        }
        let declared = self.descriptor.members();
        for slot in self.primary.members() {
            let index = slot.member()?;
            let (formatter, _) = self.members.get(index)?.as_ref()?;
            let left = declared[index].get(a).ok()?;
            let right = declared[index].get(b).ok()?;
            if !formatter.values_equal(left.as_any(), right.as_any())? {
                return Some(false);
            }
        }
        Some(true)
    }
}

fn readonly_mode(
    member: &MemberDescriptor,
    handling: ReadonlyFieldHandling,
    member_type: &TypeDescriptor,
) -> ReadonlyMode {
    if !member.is_readonly() || handling != ReadonlyFieldHandling::Members {
        return ReadonlyMode::Assign;
    }
    match member_type.kind() {
        TypeKind::Shared(_) | TypeKind::Cell(_) | TypeKind::Boxed(_) | TypeKind::Object(_) => {
            ReadonlyMode::PopulateInPlace
        }
        _ => ReadonlyMode::VerifyUnchanged,
    }
}

pub struct ObjectResolver;

impl Resolver for ObjectResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        if descriptor.object().is_none() {
            return Ok(None);
        }
        let config = formatters.config();
        let types = formatters.types();
        let primary = formatters.schemas().primary(descriptor, config, types)?;
        let declared = descriptor.members();
        let mut members = vec![None; declared.len()];
        for slot in primary.members() {
            let Some(index) = slot.member() else {
                continue;
            };
            let member = &declared[index];
            let member_type = types.descriptor(member.member_type())?;
            let formatter = formatters.get_for(&member_type)?;
            let readonly = readonly_mode(member, config.readonly(), &member_type);
            members[index] = Some((formatter, readonly));
        }
        Ok(Some(Rc::new(ObjectFormatter {
            descriptor: descriptor.clone(),
            primary,
            members,
            factory: config.factory().clone(),
            version_tolerant: config.is_version_tolerant(),
            procedures: RefCell::new(HashMap::new()),
        })))
    }
}
