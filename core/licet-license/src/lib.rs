//! Signed, time-bounded license files.
//!
//! An issuer builds [`LicenseContent`], and [`LicenseManager::issue`] signs it
//! with a key from a key store and writes it as a license file encrypted
//! under the store passphrase. A consumer calls [`LicenseManager::verify`]
//! with the matching public key store and the same store passphrase:
//!
//! 1. the file must open and the signature must match the signed bytes
//!    (`Integrity`);
//! 2. the license must name the expected subject;
//! 3. the clock must lie inside `[not_before, not_after]`;
//! 4. an attached constraint payload, such as a [`HardwareBinding`], must
//!    satisfy the configured [`ConstraintChecker`].
//!
//! Content is only ever read from a certificate that was signed or verified
//! in this process.

mod clock;
mod constraint;
mod content;
mod error;
mod hardware;
mod holder;
mod manager;
mod params;
mod sealed;

pub use clock::{Clock, FixedClock, SystemClock};
pub use constraint::ConstraintChecker;
pub use content::{
    DEFAULT_CONSUMER_TYPE, DEFAULT_IDENTITY, LicenseContent, LicenseContentBuilder,
    parse_timestamp,
};
pub use error::{LicenseError, LicenseResult};
pub use hardware::{
    AdapterSource, HARDWARE_BINDING_TAG, HardwareBinding, HardwareBindingDelegate,
    MacAddressChecker, StaticAdapters, SystemAdapters, normalize_mac,
};
pub use holder::{LicenseManagerHolder, shared_manager};
pub use manager::{LicenseManager, LicenseManagerBuilder};
pub use params::{DEFAULT_LICENSE_PATH, LicenseParameters};
