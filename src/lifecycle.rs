//! Process-wide state that is initialized once and then only read.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use tracing::info;

/// Idempotent one-time initialization slot
pub struct Lifecycle<T> {
    name: &'static str,
    cell: OnceCell<T>,
}

impl<T> Lifecycle<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    /// Runs `init` on the first call only; later calls return the same value
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(|| {
            info!(component = self.name, "initializing");
            init()
        })
    }

    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Settings of the external payment SDK used by the checkout flow
#[derive(Debug, Clone)]
pub struct PaymentSdk {
    pub publishable_key: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

pub static PAYMENT_SDK: Lifecycle<PaymentSdk> = Lifecycle::new("payment-sdk");

/// Loads the SDK on first use; the key given by the first caller wins
pub fn payment_sdk(publishable_key: Option<&str>) -> &'static PaymentSdk {
    PAYMENT_SDK.get_or_init(|| PaymentSdk {
        publishable_key: publishable_key.map(str::to_string),
        loaded_at: Utc::now(),
    })
}
