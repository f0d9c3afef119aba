//! Server state

use blueskid_core::{AdapterRegistry, Ledger};

/// Shared by every handler through an `Arc`
#[derive(Debug)]
pub struct AppState {
    pub ledger: Ledger,
    pub adapters: AdapterRegistry,
}

impl AppState {
    pub fn new(adapters: AdapterRegistry) -> Self {
        Self {
            ledger: Ledger::new(),
            adapters,
        }
    }

    pub fn with_ledger(ledger: Ledger, adapters: AdapterRegistry) -> Self {
        Self { ledger, adapters }
    }
}
