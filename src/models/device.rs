use serde::{Deserialize, Serialize};

use super::enums::SignalStrength;

/// A paired monitoring device. Static metadata; the core never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    /// Battery level in percent.
    pub battery: u8,
    pub signal: SignalStrength,
    /// Human-readable sync age as reported by the device ("2m ago").
    pub last_sync: String,
}
