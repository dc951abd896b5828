//! The value every section read produces.
//!
//! Absence and failure are values, not errors: callers match on [`FactResult`] exhaustively and
//! no variant is ever converted into another behind their back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Expected, non-exceptional absence of a section.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UnavailableReason {
    ModuleDisabled,
    NotSupported,
    PermissionDenied,
    NativeImageUnsupported,
    PolicyRedacted,
    NotApplicable,
}

/// Recoverable-by-caller error category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    IoError,
    NativeCallError,
    ParseError,
    Timeout,
    TransientFailure,
    InsufficientResources,
    RateLimited,
}

/// The underlying error behind a [`FactResult::Failure`], if the producer kept one.
#[derive(Clone)]
pub struct FailureCause(Arc<dyn Error + Send + Sync>);

impl FailureCause {
    pub fn new(err: impl Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }

    #[must_use]
    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FailureCause").field(&self.0.to_string()).finish()
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// Causes compare by rendered message; the error types themselves are opaque.
impl PartialEq for FailureCause {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

/// Outcome of reading one fact section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum FactResult<T> {
    #[serde(rename_all = "camelCase")]
    Success { value: T, sampled_at: DateTime<Utc> },
    #[serde(rename_all = "camelCase")]
    Unavailable {
        reason: UnavailableReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<Cow<'static, str>>,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        code: FailureCode,
        message: Cow<'static, str>,
        #[serde(skip)]
        cause: Option<FailureCause>,
    },
}

impl<T> FactResult<T> {
    /// A successful sample taken now.
    pub fn success(value: T) -> Self {
        Self::Success { value, sampled_at: Utc::now() }
    }

    pub const fn unavailable(reason: UnavailableReason) -> Self {
        Self::Unavailable { reason, detail: None }
    }

    pub fn unavailable_with(reason: UnavailableReason, detail: impl Into<Cow<'static, str>>) -> Self {
        Self::Unavailable { reason, detail: Some(detail.into()) }
    }

    pub fn failure(code: FailureCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Failure { code, message: message.into(), cause: None }
    }

    pub fn failure_caused_by(
        code: FailureCode,
        message: impl Into<Cow<'static, str>>,
        cause: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::Failure { code, message: message.into(), cause: Some(FailureCause::new(cause)) }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Unavailable { .. } | Self::Failure { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success { value, .. } => Some(value),
            Self::Unavailable { .. } | Self::Failure { .. } => None,
        }
    }

    #[must_use]
    pub const fn sampled_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Success { sampled_at, .. } => Some(*sampled_at),
            Self::Unavailable { .. } | Self::Failure { .. } => None,
        }
    }

    #[must_use]
    pub const fn failure_code(&self) -> Option<FailureCode> {
        match self {
            Self::Failure { code, .. } => Some(*code),
            Self::Success { .. } | Self::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub const fn unavailable_reason(&self) -> Option<UnavailableReason> {
        match self {
            Self::Unavailable { reason, .. } => Some(*reason),
            Self::Success { .. } | Self::Failure { .. } => None,
        }
    }

    /// Transforms the success value, leaving absence and failure untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FactResult<U> {
        match self {
            Self::Success { value, sampled_at } => FactResult::Success { value: f(value), sampled_at },
            Self::Unavailable { reason, detail } => FactResult::Unavailable { reason, detail },
            Self::Failure { code, message, cause } => FactResult::Failure { code, message, cause },
        }
    }
}
