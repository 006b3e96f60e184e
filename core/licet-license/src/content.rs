//! The signed license content.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use licet_persist::Opaque;
use serde::{Deserialize, Serialize};

use crate::error::{LicenseError, LicenseResult};

/// Holder and issuer identity used when a license does not name one.
pub const DEFAULT_IDENTITY: &str = "CN=licet, OU=Licensing, O=licet, C=US";

/// Consumer type used when a license does not name one.
pub const DEFAULT_CONSUMER_TYPE: &str = "user";

/// What a license grants, to whom, and for how long.
///
/// Content is built with [`LicenseContent::builder`] and is read-only
/// afterwards. The subject is filled in from the parameters at issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicenseContent {
    subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issued_at: Option<DateTime<Utc>>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    holder: String,
    issuer: String,
    consumer_type: String,
    consumer_amount: u32,
    #[serde(default)]
    info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extra: Option<Opaque>,
}

impl LicenseContent {
    pub fn builder() -> LicenseContentBuilder {
        LicenseContentBuilder::default()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issue time. Always present on verified content.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn consumer_type(&self) -> &str {
        &self.consumer_type
    }

    pub fn consumer_amount(&self) -> u32 {
        self.consumer_amount
    }

    pub fn info(&self) -> &str {
        &self.info
    }

    /// The caller-defined constraint payload.
    pub fn extra(&self) -> Option<&Opaque> {
        self.extra.as_ref()
    }

    /// Checks that `now` lies inside `[not_before, not_after]`.
    pub fn check_window(&self, now: DateTime<Utc>) -> LicenseResult<()> {
        if now < self.not_before {
            return Err(LicenseError::NotYetValid {
                not_before: self.not_before,
            });
        }
        if now > self.not_after {
            return Err(LicenseError::Expired {
                not_after: self.not_after,
            });
        }
        Ok(())
    }

    pub(crate) fn validate(&self) -> LicenseResult<()> {
        if self.not_before > self.not_after {
            return Err(LicenseError::InvalidContent(format!(
                "not_before {} is after not_after {}",
                self.not_before, self.not_after
            )));
        }
        if self.consumer_type.trim().is_empty() {
            return Err(LicenseError::InvalidContent("consumer type is empty".into()));
        }
        if self.holder.trim().is_empty() || self.issuer.trim().is_empty() {
            return Err(LicenseError::InvalidContent(
                "holder and issuer must be named".into(),
            ));
        }
        Ok(())
    }

    /// Binds the content to `subject` and stamps the issue time if unset.
    pub(crate) fn prepare_for_issue(mut self, subject: &str, now: DateTime<Utc>) -> LicenseResult<Self> {
        self.subject = subject.to_string();
        self.issued_at.get_or_insert(now);
        self.validate()?;
        Ok(self)
    }
}

/// Builder for [`LicenseContent`].
#[derive(Debug, Clone)]
pub struct LicenseContentBuilder {
    issued_at: Option<DateTime<Utc>>,
    not_before: Option<DateTime<Utc>>,
    not_after: Option<DateTime<Utc>>,
    holder: String,
    issuer: String,
    consumer_type: String,
    consumer_amount: u32,
    info: String,
    extra: Option<Opaque>,
}

impl Default for LicenseContentBuilder {
    fn default() -> Self {
        Self {
            issued_at: None,
            not_before: None,
            not_after: None,
            holder: DEFAULT_IDENTITY.to_string(),
            issuer: DEFAULT_IDENTITY.to_string(),
            consumer_type: DEFAULT_CONSUMER_TYPE.to_string(),
            consumer_amount: 1,
            info: String::new(),
            extra: None,
        }
    }
}

impl LicenseContentBuilder {
    #[must_use]
    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    #[must_use]
    pub fn not_before(mut self, not_before: DateTime<Utc>) -> Self {
        self.not_before = Some(not_before);
        self
    }

    #[must_use]
    pub fn not_after(mut self, not_after: DateTime<Utc>) -> Self {
        self.not_after = Some(not_after);
        self
    }

    #[must_use]
    pub fn holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = holder.into();
        self
    }

    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    #[must_use]
    pub fn consumer_type(mut self, consumer_type: impl Into<String>) -> Self {
        self.consumer_type = consumer_type.into();
        self
    }

    #[must_use]
    pub fn consumer_amount(mut self, consumer_amount: u32) -> Self {
        self.consumer_amount = consumer_amount;
        self
    }

    #[must_use]
    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    /// Attaches a constraint payload, e.g. a
    /// [`HardwareBinding`](crate::HardwareBinding).
    #[must_use]
    pub fn extra(mut self, extra: Opaque) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Builds the content.
    ///
    /// # Errors
    ///
    /// [`LicenseError::InvalidContent`] if the validity window is missing or
    /// inverted, or a required field is blank.
    pub fn build(self) -> LicenseResult<LicenseContent> {
        let (Some(not_before), Some(not_after)) = (self.not_before, self.not_after) else {
            return Err(LicenseError::InvalidContent(
                "validity window needs both not_before and not_after".into(),
            ));
        };
        let content = LicenseContent {
            subject: String::new(),
            issued_at: self.issued_at,
            not_before,
            not_after,
            holder: self.holder,
            issuer: self.issuer,
            consumer_type: self.consumer_type,
            consumer_amount: self.consumer_amount,
            info: self.info,
            extra: self.extra,
        };
        content.validate()?;
        Ok(content)
    }
}

/// Parses a timestamp as RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(text: &str) -> LicenseResult<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
        .ok_or_else(|| LicenseError::InvalidContent(format!("unrecognized timestamp {text:?}")))
}
