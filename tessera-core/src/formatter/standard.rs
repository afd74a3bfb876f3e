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

//! Standard library and ecosystem value types with a dedicated encoding.

use std::any::Any;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::buffer::Writer;
use crate::error::Error;
use crate::reflect::{downcast_ref, TypeDescriptor, TypeKind};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::formatter_resolver::{FormatterResolver, Resolver};
use crate::types::{AddressFamily, StandardKind};

use super::Formatter;

pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    None => {
        panic!("Unreachable code")
    }
    Some(epoch) => epoch,
};

const NANOS_PER_SEC: u32 = 1_000_000_000;

type WriteFn<T> = fn(&T, &mut Writer) -> Result<(), Error>;
type ReadFn<T> = fn(&mut ReadContext) -> Result<T, Error>;

pub struct StandardFormatter<T> {
    descriptor: Rc<TypeDescriptor>,
    write: WriteFn<T>,
    read: ReadFn<T>,
}

impl<T: 'static> Formatter for StandardFormatter<T> {
    fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    fn write(&self, value: &dyn Any, ctx: &mut WriteContext<'_>) -> Result<(), Error> {
        (self.write)(downcast_ref::<T>(value)?, &mut ctx.writer)
    }

    fn read(&self, ctx: &mut ReadContext<'_>) -> Result<Box<dyn Any>, Error> {
        Ok(Box::new((self.read)(ctx)?))
    }
}

fn standard<T: 'static>(
    descriptor: &Rc<TypeDescriptor>,
    write: WriteFn<T>,
    read: ReadFn<T>,
) -> Rc<dyn Formatter> {
    Rc::new(StandardFormatter {
        descriptor: descriptor.clone(),
        write,
        read,
    })
}

fn write_date(value: &NaiveDate, writer: &mut Writer) -> Result<(), Error> {
    let days = value.signed_duration_since(EPOCH).num_days();
    let days = i32::try_from(days)
        .map_err(|_| Error::invalid_data(format!("{value} is out of the encodable range")))?;
    writer.write_i32(days);
    Ok(())
}

fn read_date(ctx: &mut ReadContext) -> Result<NaiveDate, Error> {
    let days = ctx.reader.read_i32()?;
    EPOCH
        .checked_add_signed(TimeDelta::days(days as i64))
        .ok_or_else(|| Error::invalid_data(format!("{days} days from the epoch is not a date")))
}

fn write_timestamp(value: &DateTime<Utc>, writer: &mut Writer) -> Result<(), Error> {
    writer.write_i64(value.timestamp());
    writer.write_u32(value.timestamp_subsec_nanos());
    Ok(())
}

fn read_timestamp(ctx: &mut ReadContext) -> Result<DateTime<Utc>, Error> {
    let secs = ctx.reader.read_i64()?;
    let nanos = ctx.reader.read_u32()?;
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| Error::invalid_data(format!("timestamp {secs}.{nanos:09} is out of range")))
}

fn write_datetime(value: &NaiveDateTime, writer: &mut Writer) -> Result<(), Error> {
    write_timestamp(&value.and_utc(), writer)
}

fn read_datetime(ctx: &mut ReadContext) -> Result<NaiveDateTime, Error> {
    read_timestamp(ctx).map(|dt| dt.naive_utc())
}

fn write_time_delta(value: &TimeDelta, writer: &mut Writer) -> Result<(), Error> {
    writer.write_i64(value.num_seconds());
    writer.write_i32(value.subsec_nanos());
    Ok(())
}

fn read_time_delta(ctx: &mut ReadContext) -> Result<TimeDelta, Error> {
    let secs = ctx.reader.read_i64()?;
    let nanos = ctx.reader.read_i32()?;
    TimeDelta::try_seconds(secs)
        .and_then(|delta| delta.checked_add(&TimeDelta::nanoseconds(nanos as i64)))
        .ok_or_else(|| Error::invalid_data(format!("time delta {secs}s {nanos}ns is out of range")))
}

fn write_duration(value: &Duration, writer: &mut Writer) -> Result<(), Error> {
    writer.write_varuint64(value.as_secs());
    writer.write_varuint32(value.subsec_nanos());
    Ok(())
}

fn read_duration(ctx: &mut ReadContext) -> Result<Duration, Error> {
    let secs = ctx.reader.read_varuint64()?;
    let nanos = ctx.reader.read_varuint32()?;
    if nanos >= NANOS_PER_SEC {
        return Err(Error::invalid_data(format!(
            "duration has {nanos} sub-second nanoseconds"
        )));
    }
    Ok(Duration::new(secs, nanos))
}

fn write_uuid(value: &Uuid, writer: &mut Writer) -> Result<(), Error> {
    writer.write_bytes(value.as_bytes());
    Ok(())
}

fn read_uuid(ctx: &mut ReadContext) -> Result<Uuid, Error> {
    let bytes = ctx.reader.read_bytes(16)?;
    Uuid::from_slice(bytes).map_err(|e| Error::invalid_data(format!("invalid uuid: {e}")))
}

fn write_i128(value: &i128, writer: &mut Writer) -> Result<(), Error> {
    writer.write_i128(*value);
    Ok(())
}

fn read_i128(ctx: &mut ReadContext) -> Result<i128, Error> {
    ctx.reader.read_i128()
}

fn write_u128(value: &u128, writer: &mut Writer) -> Result<(), Error> {
    writer.write_u128(*value);
    Ok(())
}

fn read_u128(ctx: &mut ReadContext) -> Result<u128, Error> {
    ctx.reader.read_u128()
}

fn write_ip(value: &IpAddr, writer: &mut Writer) -> Result<(), Error> {
    match value {
        IpAddr::V4(ip) => {
            writer.write_u8(AddressFamily::V4 as u8);
            writer.write_bytes(&ip.octets());
        }
        IpAddr::V6(ip) => {
            writer.write_u8(AddressFamily::V6 as u8);
            writer.write_bytes(&ip.octets());
        }
    }
    Ok(())
}

fn read_ip(ctx: &mut ReadContext) -> Result<IpAddr, Error> {
    let family = AddressFamily::try_from(ctx.reader.read_u8()?)
        .map_err(|e| Error::invalid_data(format!("unknown address family {}", e.number)))?;
    match family {
        AddressFamily::V4 => {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(ctx.reader.read_bytes(4)?);
            Ok(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        AddressFamily::V6 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(ctx.reader.read_bytes(16)?);
            Ok(IpAddr::V6(Ipv6Addr::from(octets)))
        }
    }
}

fn write_socket(value: &SocketAddr, writer: &mut Writer) -> Result<(), Error> {
    write_ip(&value.ip(), writer)?;
    writer.write_u16(value.port());
    if let SocketAddr::V6(v6) = value {
        writer.write_u32(v6.flowinfo());
        writer.write_u32(v6.scope_id());
    }
    Ok(())
}

fn read_socket(ctx: &mut ReadContext) -> Result<SocketAddr, Error> {
    let ip = read_ip(ctx)?;
    let port = ctx.reader.read_u16()?;
    Ok(match ip {
        IpAddr::V4(ip) => SocketAddr::V4(SocketAddrV4::new(ip, port)),
        IpAddr::V6(ip) => {
            let flowinfo = ctx.reader.read_u32()?;
            let scope_id = ctx.reader.read_u32()?;
            SocketAddr::V6(SocketAddrV6::new(ip, port, flowinfo, scope_id))
        }
    })
}

fn write_path(value: &PathBuf, writer: &mut Writer) -> Result<(), Error> {
    let path = value
        .to_str()
        .ok_or_else(|| Error::invalid_data(format!("path {} is not valid utf-8", value.display())))?;
    writer.write_string(path);
    Ok(())
}

fn read_path(ctx: &mut ReadContext) -> Result<PathBuf, Error> {
    let limit = ctx.config().string_limit();
    Ok(PathBuf::from(ctx.reader.read_string(limit)?))
}

pub struct StandardResolver;

impl Resolver for StandardResolver {
    fn resolve(
        &self,
        descriptor: &Rc<TypeDescriptor>,
        _formatters: &FormatterResolver,
    ) -> Result<Option<Rc<dyn Formatter>>, Error> {
        let TypeKind::Standard(kind) = descriptor.kind() else {
            return Ok(None);
        };
        let d = descriptor;
        let formatter = match kind {
            StandardKind::Date => standard(d, write_date, read_date),
            StandardKind::DateTime => standard(d, write_datetime, read_datetime),
            StandardKind::UtcDateTime => standard(d, write_timestamp, read_timestamp),
            StandardKind::TimeDelta => standard(d, write_time_delta, read_time_delta),
            StandardKind::Duration => standard(d, write_duration, read_duration),
            StandardKind::Uuid => standard(d, write_uuid, read_uuid),
            StandardKind::I128 => standard(d, write_i128, read_i128),
            StandardKind::U128 => standard(d, write_u128, read_u128),
            StandardKind::IpAddr => standard(d, write_ip, read_ip),
            StandardKind::SocketAddr => standard(d, write_socket, read_socket),
            StandardKind::PathBuf => standard(d, write_path, read_path),
        };
        Ok(Some(formatter))
    }
}
