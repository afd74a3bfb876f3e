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

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Size of the protocol checksum that optionally opens a payload.
pub const CHECKSUM_SIZE: usize = 4;

/// Size of the length prefix wrapping each member in version tolerant mode.
pub const MEMBER_LENGTH_SIZE: usize = 4;

/// Wire value of a null object reference, type token or length.
pub const NULL_ID: i32 = -1;

/// Marker written ahead of an optional value whose formatter has no inline null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Presence {
    Null = 0,
    Value = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum AddressFamily {
    V4 = 4,
    V6 = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PrimitiveKind {
    Bool = 1,
    I8 = 2,
    U8 = 3,
    I16 = 4,
    U16 = 5,
    I32 = 6,
    U32 = 7,
    I64 = 8,
    U64 = 9,
    ISize = 10,
    USize = 11,
    F32 = 12,
    F64 = 13,
    Char = 14,
}

/// Well-known value types with a dedicated encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum StandardKind {
    /// `chrono::NaiveDate`, days since the unix epoch.
    Date = 1,
    /// `chrono::NaiveDateTime`, seconds and nanoseconds since the unix epoch.
    DateTime = 2,
    /// `chrono::DateTime<Utc>`, seconds and nanoseconds since the unix epoch.
    UtcDateTime = 3,
    /// `chrono::TimeDelta`, seconds and nanoseconds.
    TimeDelta = 4,
    /// `std::time::Duration`, seconds then nanoseconds.
    Duration = 5,
    Uuid = 6,
    I128 = 7,
    U128 = 8,
    IpAddr = 9,
    SocketAddr = 10,
    PathBuf = 11,
}

impl StandardKind {
    /// Whether every value of the kind encodes to a small bounded size.
    pub fn is_fixed_size(self) -> bool {
        !matches!(
            self,
            StandardKind::IpAddr | StandardKind::SocketAddr | StandardKind::PathBuf
        )
    }
}
