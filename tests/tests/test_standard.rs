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
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use tessera::{Config, TesseraObject};
use tests::round_trip;
use uuid::Uuid;

#[derive(TesseraObject, Debug, PartialEq)]
struct Event {
    pub id: Uuid,
    pub day: NaiveDate,
    pub at: NaiveDateTime,
    pub stamp: DateTime<Utc>,
    pub lasted: Duration,
    pub offset: TimeDelta,
    pub big: i128,
    pub bigger: u128,
    pub host: IpAddr,
    pub peer: SocketAddr,
    pub log: PathBuf,
}

impl Default for Event {
    fn default() -> Self {
        Event {
            id: Uuid::nil(),
            day: NaiveDate::default(),
            at: NaiveDateTime::default(),
            stamp: DateTime::<Utc>::default(),
            lasted: Duration::ZERO,
            offset: TimeDelta::zero(),
            big: 0,
            bigger: 0,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            peer: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            log: PathBuf::new(),
        }
    }
}

#[test]
fn standard_values_round_trip() {
    let day = NaiveDate::from_ymd_opt(1969, 7, 20).unwrap();
    let at = day.and_hms_nano_opt(20, 17, 40, 123_456_789).unwrap();
    let event = Event {
        id: Uuid::from_u128(0x1234_5678_9abc_def0_0fed_cba9_8765_4321),
        day,
        at,
        stamp: at.and_utc(),
        lasted: Duration::new(3, 500),
        offset: TimeDelta::try_seconds(-90).unwrap(),
        big: i128::MIN,
        bigger: u128::MAX,
        host: IpAddr::V6(Ipv6Addr::LOCALHOST),
        peer: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 8080),
        log: PathBuf::from("/var/log/tessera.log"),
    };
    assert_eq!(round_trip(Config::new(), &event).unwrap(), event);
}

#[test]
fn standard_values_at_the_root() {
    let id = Uuid::nil();
    assert_eq!(round_trip(Config::new(), &id).unwrap(), id);
    let before_epoch = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
    assert_eq!(round_trip(Config::new(), &before_epoch).unwrap(), before_epoch);
    let ips = vec![
        IpAddr::V4(Ipv4Addr::BROADCAST),
        IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    ];
    assert_eq!(round_trip(Config::new(), &ips).unwrap(), ips);
}
