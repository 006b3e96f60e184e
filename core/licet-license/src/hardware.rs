//! Binding licenses to network adapters.
//!
//! A [`HardwareBinding`] lists the MAC addresses a license may run on. It is
//! carried as the license's constraint payload and persisted through
//! [`HardwareBindingDelegate`]. [`MacAddressChecker`] accepts the license
//! when any bound address belongs to an adapter of this host.

use std::fmt;

use licet_cert::BoxError;
use licet_persist::{Delegate, Node, Opaque};
use tracing::debug;

use crate::constraint::ConstraintChecker;
use crate::error::{LicenseError, LicenseResult};

/// Delegate tag under which bindings are written.
pub const HARDWARE_BINDING_TAG: &str = "licet.hardware-binding";

const MAC_LEN: usize = 6;

/// Normalizes a MAC address to upper-case, dash-separated form
/// (`E4-70-B8-DF-DC-1A`). Accepts `-`, `:` or no separators.
pub fn normalize_mac(text: &str) -> LicenseResult<String> {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | ':'))
        .collect();
    if digits.len() != MAC_LEN * 2 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LicenseError::InvalidContent(format!(
            "malformed MAC address {text:?}"
        )));
    }
    let upper = digits.to_ascii_uppercase();
    let octets: Vec<&str> = (0..MAC_LEN).map(|i| &upper[i * 2..i * 2 + 2]).collect();
    Ok(octets.join("-"))
}

/// The MAC addresses a license is bound to.
#[derive(Clone, PartialEq, Eq)]
pub struct HardwareBinding {
    mac_addresses: Vec<String>,
}

impl HardwareBinding {
    /// Normalizes and deduplicates `addresses`, keeping their order.
    ///
    /// # Errors
    ///
    /// [`LicenseError::InvalidContent`] for a malformed address or an empty
    /// list.
    pub fn new<I, S>(addresses: I) -> LicenseResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mac_addresses = Vec::new();
        for address in addresses {
            let mac = normalize_mac(address.as_ref())?;
            if !mac_addresses.contains(&mac) {
                mac_addresses.push(mac);
            }
        }
        if mac_addresses.is_empty() {
            return Err(LicenseError::InvalidContent(
                "hardware binding lists no MAC address".into(),
            ));
        }
        Ok(Self { mac_addresses })
    }

    pub fn mac_addresses(&self) -> &[String] {
        &self.mac_addresses
    }

    /// Wraps the binding as a constraint payload.
    pub fn into_opaque(self) -> Opaque {
        Opaque::new(self)
    }

    fn matches_any(&self, host: &[String]) -> bool {
        self.mac_addresses.iter().any(|mac| host.contains(mac))
    }
}

impl fmt::Debug for HardwareBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HardwareBinding")
            .field(&self.mac_addresses)
            .finish()
    }
}

/// Persists [`HardwareBinding`] as `{"mac_addresses": [...]}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardwareBindingDelegate;

impl Delegate<HardwareBinding> for HardwareBindingDelegate {
    fn encode(&self, value: &HardwareBinding) -> Result<Node, BoxError> {
        Ok(serde_json::json!({ "mac_addresses": value.mac_addresses }))
    }

    fn decode(&self, node: &Node) -> Result<HardwareBinding, BoxError> {
        let addresses = node
            .get("mac_addresses")
            .and_then(Node::as_array)
            .ok_or("hardware binding has no mac_addresses list")?;
        let addresses = addresses
            .iter()
            .map(|a| a.as_str().ok_or("MAC address is not a string"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HardwareBinding::new(addresses)?)
    }
}

/// Lists the MAC addresses of this host's adapters.
pub trait AdapterSource: Send + Sync {
    /// Normalized MAC addresses.
    fn mac_addresses(&self) -> Result<Vec<String>, BoxError>;
}

/// Reads adapters from the operating system.
///
/// On Linux every `/sys/class/net/*/address` is read; loopback and other
/// all-zero addresses are skipped. Other platforms report no adapters.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAdapters;

impl AdapterSource for SystemAdapters {
    fn mac_addresses(&self) -> Result<Vec<String>, BoxError> {
        #[cfg(target_os = "linux")]
        {
            let mut found = Vec::new();
            for entry in std::fs::read_dir("/sys/class/net")? {
                let path = entry?.path().join("address");
                let Ok(text) = std::fs::read_to_string(&path) else {
                    continue;
                };
                match normalize_mac(&text) {
                    Ok(mac) if mac != "00-00-00-00-00-00" => found.push(mac),
                    _ => {}
                }
            }
            found.sort();
            found.dedup();
            Ok(found)
        }

        #[cfg(not(target_os = "linux"))]
        {
            Ok(Vec::new())
        }
    }
}

/// A fixed adapter list.
#[derive(Debug, Clone, Default)]
pub struct StaticAdapters(Vec<String>);

impl StaticAdapters {
    pub fn new<I, S>(addresses: I) -> LicenseResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        addresses
            .into_iter()
            .map(|a| normalize_mac(a.as_ref()))
            .collect::<LicenseResult<Vec<_>>>()
            .map(Self)
    }
}

impl AdapterSource for StaticAdapters {
    fn mac_addresses(&self) -> Result<Vec<String>, BoxError> {
        Ok(self.0.clone())
    }
}

/// Accepts a [`HardwareBinding`] when any bound address is present on this
/// host. Payloads of any other type are rejected.
pub struct MacAddressChecker {
    adapters: Box<dyn AdapterSource>,
}

impl MacAddressChecker {
    pub fn new(adapters: impl AdapterSource + 'static) -> Self {
        Self {
            adapters: Box::new(adapters),
        }
    }

    /// Checks against the adapters of the running host.
    pub fn system() -> Self {
        Self::new(SystemAdapters)
    }
}

impl fmt::Debug for MacAddressChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacAddressChecker").finish_non_exhaustive()
    }
}

impl ConstraintChecker for MacAddressChecker {
    fn evaluate(&self, payload: &Opaque) -> Result<bool, BoxError> {
        let Some(binding) = payload.downcast_ref::<HardwareBinding>() else {
            debug!(payload = payload.type_name(), "not a hardware binding");
            return Ok(false);
        };
        let host = self.adapters.mac_addresses()?;
        let matched = binding.matches_any(&host);
        debug!(bound = ?binding.mac_addresses(), matched, "hardware binding checked");
        Ok(matched)
    }
}
