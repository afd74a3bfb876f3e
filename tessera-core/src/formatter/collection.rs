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

//! Arrays and proxy-built collections: `[length][items]`, with a null
//! length standing in for `None` when wrapped in `Option`.

use std::any::Any;
use std::rc::Rc;

use crate::error::Error;
use crate::reflect::{ArrayOps, CollectionOps, Item, ItemRef, TypeDescriptor, TypeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};

use super::Formatter;

fn read_nullable_len(
    ctx: &mut ReadContext<'_>,
    what: &'static str,
    limit: usize,
) -> Result<Option<usize>, Error> {
    match ctx.reader.read_length()? {
        Some(len) if len > limit => Err(Error::size_limit(what, len, limit)),
        len => Ok(len),
    }
}

fn null_length(descriptor: &TypeDescriptor) -> Error {
    Error::invalid_data(format!(
        "null length for non-optional {}",
        descriptor.full_name()
    ))
}

pub struct ArrayFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: ArrayOps,
    item: Rc<dyn Formatter>,
}

impl ArrayFormatter {
    fn read_items(&self, len: usize, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        // Each item takes at least one byte, so a corrupt length cannot
        // force a huge allocation.
        let mut items = Vec::with_capacity(len.min(ctx.reader.remaining()));
        for _ in 0..len {
            items.push(self.item.read(ctx)?);
        }
        (self.ops.assemble)(items)
    }
}

impl Formatter for ArrayFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.writer.write_length(Some((self.ops.len)(value)?));
        (self.ops.for_each)(value, &mut |item| self.item.write(item, ctx))
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        match self.read_nullable(ctx)? {
            Some(value) => Ok(value),
            None => Err(null_length(&self.descriptor)),
        }
    }

    fn inline_null(&self) -> bool {
        true
    }

    fn write_null(&self, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.writer.write_length(None);
        Ok(())
    }

    fn read_nullable(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Box<dyn Any>>, Error> {
        let limit = ctx.config().array_limit();
        match read_nullable_len(ctx, "array", limit)? {
            Some(len) => self.read_items(len, ctx).map(Some),
            None => Ok(None),
        }
    }
}

pub struct CollectionFormatter {
    descriptor: Rc<TypeDescriptor>,
    ops: CollectionOps,
    items: ItemFormatters,
}

enum ItemFormatters {
    Value(Rc<dyn Formatter>),
    Entry {
        key: Rc<dyn Formatter>,
        value: Rc<dyn Formatter>,
    },
}

impl CollectionFormatter {
    fn read_items(&self, len: usize, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        let proxy = &self.ops.proxy;
        let mut builder = proxy.create_builder(len.min(ctx.reader.remaining()));
        for _ in 0..len {
            let item = match &self.items {
                ItemFormatters::Value(item) => Item::Value(item.read(ctx)?),
                ItemFormatters::Entry { key, value } => {
                    let key = key.read(ctx)?;
                    Item::Entry(key, value.read(ctx)?)
                }
            };
            proxy.add_item(builder.as_mut(), item)?;
        }
        proxy.finalize(builder)
    }
}

impl Formatter for CollectionFormatter {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        let proxy = &self.ops.proxy;
        ctx.writer.write_length(Some(proxy.len(value)?));
        proxy.for_each(value, &mut |item| match (item, &self.items) {
            (ItemRef::Value(item), ItemFormatters::Value(formatter)) => formatter.write(item, ctx),
            (ItemRef::Entry(k, v), ItemFormatters::Entry { key, value }) => {
                key.write(k, ctx)?;
                value.write(v, ctx)
            }
            _ => Err(Error::type_mismatch(
                "collection item",
                self.descriptor.full_name(),
            )),
        })
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        match self.read_nullable(ctx)? {
            Some(value) => Ok(value),
            None => Err(null_length(&self.descriptor)),
        }
    }

    fn inline_null(&self) -> bool {
        true
    }

    fn write_null(&self, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        ctx.writer.write_length(None);
        Ok(())
    }

    fn read_nullable(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Box<dyn Any>>, Error> {
        let limit = ctx.config().collection_limit();
        match read_nullable_len(ctx, "collection", limit)? {
            Some(len) => self.read_items(len, ctx).map(Some),
            None => Ok(None),
        }
    }
}

pub struct CollectionResolver;

impl Resolver for CollectionResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        match descriptor.kind() {
            TypeKind::Array(ops) => Ok(Some(Rc::new(ArrayFormatter {
                descriptor: descriptor.clone(),
                ops: ops.clone(),
                item: formatters.get(ops.item)?,
            }))),
            TypeKind::Collection(ops) => {
                let items = if ops.proxy.is_map() {
                    let item = formatters.types().descriptor(ops.item)?;
                    let TypeKind::KeyValuePair(kv) = item.kind() else {
                        return Err(Error::unsupported_type(format!(
                            "map {} must have key value items, found {}",
                            descriptor.full_name(),
                            item.full_name()
                        )));
                    };
                    ItemFormatters::Entry {
                        key: formatters.get(kv.key)?,
                        value: formatters.get(kv.value)?,
                    }
                } else {
                    ItemFormatters::Value(formatters.get(ops.item)?)
                };
                Ok(Some(Rc::new(CollectionFormatter {
                    descriptor: descriptor.clone(),
                    ops: ops.clone(),
                    items,
                })))
            }
            _ => Ok(None),
        }
    }
}
