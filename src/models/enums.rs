use crate::db::StoreError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde representation.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(StoreError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(
    /// Closed set of account roles. Stored lowercase.
    Role {
        Patient => "patient",
        Doctor => "doctor",
        Admin => "admin",
    }
);

impl Default for Role {
    fn default() -> Self {
        Role::Patient
    }
}

str_enum!(SignalStrength {
    Strong => "strong",
    Medium => "medium",
    Weak => "weak",
});

str_enum!(
    /// Triage priority as returned by the model (capitalized on the wire).
    TriagePriority {
        High => "High",
        Medium => "Medium",
        Low => "Low",
    }
);

str_enum!(
    /// Recommendation urgency (lowercase on the wire).
    Urgency {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
);
