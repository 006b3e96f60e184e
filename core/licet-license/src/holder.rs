//! Lazily constructed, process-wide license manager.

use std::sync::OnceLock;

use crate::manager::LicenseManager;

/// Holds at most one [`LicenseManager`], built on first use.
///
/// When several threads race on [`get_or_init`](Self::get_or_init), exactly
/// one runs its initializer and all observe the same instance.
#[derive(Debug, Default)]
pub struct LicenseManagerHolder {
    cell: OnceLock<LicenseManager>,
}

impl LicenseManagerHolder {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the held manager, building it with `init` if there is none.
    pub fn get_or_init(&self, init: impl FnOnce() -> LicenseManager) -> &LicenseManager {
        self.cell.get_or_init(init)
    }

    /// Returns the held manager without building one.
    pub fn get(&self) -> Option<&LicenseManager> {
        self.cell.get()
    }
}

static SHARED: LicenseManagerHolder = LicenseManagerHolder::new();

/// The process-wide manager. `init` runs only for the first caller.
pub fn shared_manager(init: impl FnOnce() -> LicenseManager) -> &'static LicenseManager {
    SHARED.get_or_init(init)
}
