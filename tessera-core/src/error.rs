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

//! Error type shared by every Tessera operation.
//!
//! Constructors are `#[cold]` and `#[track_caller]`: they sit on the failure
//! branch of every buffer read, so keeping them out of line keeps the hot
//! paths small.

use std::borrow::Cow;

use thiserror::Error;

/// Set `TESSERA_PANIC_ON_ERROR=1` at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("TESSERA_PANIC_ON_ERROR").is_some();

#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error type for Tessera serialization and deserialization.
///
/// Always build errors through the static constructors (`Error::framing`,
/// `Error::unsupported_type`, ...) rather than the variants, so that
/// `TESSERA_PANIC_ON_ERROR` can point at the exact failure site:
///
/// ```bash
/// RUST_BACKTRACE=1 TESSERA_PANIC_ON_ERROR=1 cargo test
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid combination of settings, detected at construction.
    #[error("configuration error: {0}")]
    Configuration(Cow<'static, str>),

    /// No formatter could be resolved for a type.
    #[error("unsupported type: {0}")]
    UnsupportedType(Cow<'static, str>),

    /// The embedded protocol checksum differs from the local one.
    #[error("protocol checksum mismatch: payload has {actual:#010x}, local is {expected:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Malformed varint, wrong consumed length or a corrupt member prefix.
    #[error("framing error: {0}")]
    Framing(Cow<'static, str>),

    /// A reference id outside the populated cache range.
    #[error("unknown {kind} reference id {id}, only {known} known")]
    UnknownReferenceId {
        kind: &'static str,
        id: u64,
        known: usize,
    },

    /// A back reference to an entry first written inside a member the reader skipped.
    #[error("{kind} reference {id} points into a member that was skipped")]
    SkippedReference { kind: &'static str, id: u64 },

    /// A readonly member would have to change but the overwrite policy forbids it.
    #[error("readonly member conflict: {0}")]
    ReadonlyFieldConflict(Cow<'static, str>),

    /// Read past the end of the input.
    #[error("buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// The payload holds a different type than the one requested.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
    },

    /// A length read from the wire exceeds a configured limit.
    #[error("{what} size {size} exceeds the configured limit {limit}")]
    SizeLimitExceeded {
        what: &'static str,
        size: usize,
        limit: usize,
    },

    /// Discriminant without a declared variant.
    #[error("{0}")]
    UnknownEnum(Cow<'static, str>),

    /// Operation not allowed in the current state.
    #[error("{0}")]
    NotAllowed(Cow<'static, str>),

    /// Maximum nesting depth exceeded.
    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    /// Invalid or corrupted data.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// I/O failure in the stream framing helper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    #[inline(always)]
    #[track_caller]
    fn check(self) -> Self {
        if PANIC_ON_ERROR {
            panic!("TESSERA_PANIC_ON_ERROR: {}", self);
        }
        self
    }

    /// Creates a new [`Error::Configuration`].
    ///
    /// ```
    /// use tessera_core::error::Error;
    ///
    /// let err = Error::configuration("checksum cannot be combined with a persisted type cache");
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn configuration<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::Configuration(s.into()).check()
    }

    /// Creates a new [`Error::UnsupportedType`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unsupported_type<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::UnsupportedType(s.into()).check()
    }

    /// Creates a new [`Error::ChecksumMismatch`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn checksum_mismatch(expected: u32, actual: u32) -> Self {
        Error::ChecksumMismatch { expected, actual }.check()
    }

    /// Creates a new [`Error::Framing`].
    ///
    /// ```
    /// use tessera_core::error::Error;
    ///
    /// let err = Error::framing(format!("expected {} bytes, consumed {}", 12, 10));
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn framing<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::Framing(s.into()).check()
    }

    /// Creates a new [`Error::UnknownReferenceId`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_reference(kind: &'static str, id: u64, known: usize) -> Self {
        Error::UnknownReferenceId { kind, id, known }.check()
    }

    /// Creates a new [`Error::SkippedReference`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn skipped_reference(kind: &'static str, id: u64) -> Self {
        Error::SkippedReference { kind, id }.check()
    }

    /// Creates a new [`Error::ReadonlyFieldConflict`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn readonly_conflict<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::ReadonlyFieldConflict(s.into()).check()
    }

    /// Creates a new [`Error::BufferOutOfBound`].
    ///
    /// ```
    /// use tessera_core::error::Error;
    ///
    /// let err = Error::buffer_out_of_bound(10, 20, 25);
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        Error::BufferOutOfBound(offset, length, capacity).check()
    }

    /// Creates a new [`Error::TypeMismatch`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_mismatch<A, B>(expected: A, found: B) -> Self
    where
        A: Into<Cow<'static, str>>,
        B: Into<Cow<'static, str>>,
    {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
        .check()
    }

    /// Creates a new [`Error::SizeLimitExceeded`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn size_limit(what: &'static str, size: usize, limit: usize) -> Self {
        Error::SizeLimitExceeded { what, size, limit }.check()
    }

    /// Creates a new [`Error::UnknownEnum`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_enum<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::UnknownEnum(s.into()).check()
    }

    /// Creates a new [`Error::NotAllowed`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn not_allowed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::NotAllowed(s.into()).check()
    }

    /// Creates a new [`Error::DepthExceed`].
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn depth_exceed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::DepthExceed(s.into()).check()
    }

    /// Creates a new [`Error::InvalidData`].
    ///
    /// ```
    /// use tessera_core::error::Error;
    ///
    /// let err = Error::invalid_data("string is not valid utf-8");
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::InvalidData(s.into()).check()
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// ```
/// use tessera_core::ensure;
/// use tessera_core::error::Error;
///
/// fn check_value(n: i32) -> Result<(), Error> {
///     ensure!(n > 0, "value must be positive");
///     ensure!(n < 10, "value {} too large", n);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`Error::InvalidData`].
///
/// ```
/// use tessera_core::bail;
/// use tessera_core::error::Error;
///
/// fn fail_fast() -> Result<(), Error> {
///     bail!("something went wrong");
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_data($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}

/// Returns early with an [`Error::NotAllowed`].
///
/// ```
/// use tessera_core::not_allowed;
/// use tessera_core::error::Error;
///
/// fn check_operation(op: &str) -> Result<(), Error> {
///     not_allowed!("operation {} not allowed", op);
/// }
/// ```
#[macro_export]
macro_rules! not_allowed {
    ($err:expr) => {
        return Err($crate::error::Error::not_allowed($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::not_allowed(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = Error::size_limit("string", 4096, 1024);
        assert_eq!(
            err.to_string(),
            "string size 4096 exceeds the configured limit 1024"
        );
        let err = Error::unknown_reference("object", 7, 3);
        assert_eq!(err.to_string(), "unknown object reference id 7, only 3 known");
        let err = Error::checksum_mismatch(1, 2);
        assert!(matches!(
            err,
            Error::ChecksumMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    fn positive(n: i32) -> Result<i32, Error> {
        ensure!(n > 0, "value {} must be positive", n);
        Ok(n)
    }

    #[test]
    fn ensure_returns_invalid_data() {
        assert_eq!(positive(3).unwrap(), 3);
        assert!(matches!(positive(-1), Err(Error::InvalidData(_))));
    }
}
