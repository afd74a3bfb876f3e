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
use std::rc::Rc;

use crate::buffer::NULL_BIAS;
use crate::config::DelegateSerialization;
use crate::error::Error;
use crate::reflect::{
    downcast_box, downcast_ref, AnyValue, Delegate, MemberRef, TypeDescriptor, TypeKey, TypeKind,
};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};
use crate::types::NULL_ID;

use super::Formatter;

/// `MemberRef`: the declaring type token, then the member's persistent name.
pub struct MemberRefFormatter {
    descriptor: Rc<TypeDescriptor>,
}

impl Formatter for MemberRefFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        let member = downcast_ref::<MemberRef>(value)?;
        let declaring = ctx.types().descriptor(member.declaring_type())?;
        ctx.write_type_token(&declaring);
        ctx.writer.write_string(member.member());
        Ok(())
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let declaring = ctx
            .read_type_token()?
            .ok_or_else(|| Error::invalid_data("member reference without a declaring type"))?;
        let name = ctx.reader.read_string(ctx.config().string_limit())?;
        if !declaring.members().iter().any(|m| m.answers_to(&name)) {
            return Err(Error::invalid_data(format!(
                "{} has no member named {}",
                declaring.full_name(),
                name
            )));
        }
        Ok(Box::new(MemberRef::from_parts(declaring.key(), name)))
    }
}

/// `Delegate`: the method name, then its optional target as an `AnyValue`.
/// Gated by [`DelegateSerialization`] in both directions.
pub struct DelegateFormatter {
    descriptor: Rc<TypeDescriptor>,
    target: Rc<dyn Formatter>,
}

fn check_policy(policy: DelegateSerialization, bound: bool, method: &str) -> Result<(), Error> {
    match policy {
        DelegateSerialization::Off => Err(Error::not_allowed(format!(
            "delegate {method} cannot be serialized while delegate serialization is off"
        ))),
        DelegateSerialization::StaticOnly if bound => Err(Error::not_allowed(format!(
            "delegate {method} has an instance target but only static delegates are allowed"
        ))),
        _ => Ok(()),
    }
}

impl Formatter for DelegateFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        let delegate = downcast_ref::<Delegate>(value)?;
        check_policy(ctx.config().delegates(), !delegate.is_static(), delegate.method())?;
        ctx.writer.write_string(delegate.method());
        match delegate.target() {
            Some(target) => self.target.write(target, ctx),
            None => self.target.write_null(ctx),
        }
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let policy = ctx.config().delegates();
        let method = ctx.reader.read_string(ctx.config().string_limit())?;
        // decide on the target's null token before any of its graph is read
        let bound = ctx.reader.peek_biased_varint32(NULL_BIAS)? != NULL_ID;
        check_policy(policy, bound, &method)?;
        let target = match self.target.read_nullable(ctx)? {
            Some(target) => Some(downcast_box::<AnyValue>(target)?),
            None => None,
        };
        Ok(Box::new(Delegate::from_parts(method, target)))
    }
}

pub struct ReflectionResolver;

impl Resolver for ReflectionResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        let formatter: Rc<dyn Formatter> = match descriptor.kind() {
            TypeKind::MemberRef => Rc::new(MemberRefFormatter {
                descriptor: descriptor.clone(),
            }),
            TypeKind::Delegate => Rc::new(DelegateFormatter {
                descriptor: descriptor.clone(),
                target: formatters.get(TypeKey::of::<AnyValue>())?,
            }),
            _ => return Ok(None),
        };
        Ok(Some(formatter))
    }
}
