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

use crate::config::Config;
use crate::error::Error;
use crate::reflect::MemberKind;
use crate::resolver::schema_resolver::SchemaResolver;
use crate::resolver::type_resolver::TypeResolver;

use super::murmurhash3_x64_128;

const CHECKSUM_SEED: u64 = 47;

/// Folds the binding name, full name and primary schema of every known type
/// into a 32-bit value both peers can compare.
///
/// Anything that would change the wire layout of a known type changes the
/// checksum: a renamed or retyped member, a member flipping between field
/// and property, or a readonly flag.
pub fn protocol_checksum(
    config: &Config,
    types: &TypeResolver,
    schemas: &SchemaResolver,
) -> Result<u32, Error> {
    let mut signature = Vec::new();
    for descriptor in types.known_types() {
        push_part(&mut signature, &types.name_of(descriptor));
        push_part(&mut signature, descriptor.full_name());
        if descriptor.object().is_none() {
            continue;
        }
        let schema = schemas.primary(descriptor, config, types)?;
        for member in schema.bound_members(descriptor) {
            push_part(&mut signature, member.name());
            push_part(&mut signature, member.member_type().type_name());
            signature.push(match member.kind() {
                MemberKind::Field => b'f',
                MemberKind::Property => b'p',
            });
            signature.push(member.is_readonly() as u8);
        }
    }
    let (h1, _) = murmurhash3_x64_128(&signature, CHECKSUM_SEED);
    Ok(h1 as u32)
}

fn push_part(signature: &mut Vec<u8>, part: &str) {
    signature.extend_from_slice(part.as_bytes());
    signature.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadonlyFieldHandling;
    use crate::reflect::{MemberOptions, ObjectBuilder, Reflect, TypeDescriptor, TypeKey};

    #[derive(Default)]
    struct Gauge {
        id: u32,
        label: String,
    }

    impl Reflect for Gauge {
        fn describe() -> TypeDescriptor {
            ObjectBuilder::<Self>::new()
                .name("Gauge")
                .field::<u32>("id", |p: &Self| &p.id, |p: &mut Self| &mut p.id)
                .field_with::<String>(
                    "label",
                    |p: &Self| &p.label,
                    |p: &mut Self| &mut p.label,
                    MemberOptions::public().readonly(),
                )
                .build()
        }
    }

    fn checksum_of(config: &Config) -> u32 {
        let types = TypeResolver::new(config.binder.clone(), &[TypeKey::of::<Gauge>()]).unwrap();
        protocol_checksum(config, &types, &SchemaResolver::new()).unwrap()
    }

    #[test]
    fn stable_for_the_same_types() {
        let config = Config::default();
        assert_eq!(checksum_of(&config), checksum_of(&config));
    }

    #[test]
    fn follows_the_schema() {
        let excluded = Config::default();
        let overwritten = Config::default().readonly_handling(ReadonlyFieldHandling::ForcedOverwrite);
        assert_ne!(checksum_of(&excluded), checksum_of(&overwritten));
    }
}
