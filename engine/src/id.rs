//! Opaque identifiers for combatants and their markers.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// Largest integer a JSON consumer can hold without precision loss.
const MAX_SAFE_ID: u64 = (1 << 53) - 1;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Draws a fresh random identifier.
            pub fn generate() -> Self {
                let n: u64 = rand::thread_rng().gen_range(1..=MAX_SAFE_ID);
                Self(n.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Ok(match RawId::deserialize(deserializer)? {
                    RawId::Number(n) => Self(n.to_string()),
                    RawId::Text(s) => Self(s),
                })
            }
        }
    };
}

id_type!(
    /// Identifies a combatant for the lifetime of an encounter.
    CombatantId
);

id_type!(
    /// Identifies a token or condition on one combatant.
    MarkerId
);
