//! Serde helpers that persist a `SecretString` as a plain string.
//!
//! Use with `#[serde(with = "wn_protocol::secret", default = "wn_protocol::secret::empty")]`.
//! Secrecy keeps values out of `Debug` output and logs; the settings file
//! itself holds the value.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    secret.expose_secret().serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::new(s.into()))
}

/// An empty secret; empty means "not set".
pub fn empty() -> SecretString {
    SecretString::new(String::new().into())
}

/// Wrap an owned string.
pub fn from_string(value: String) -> SecretString {
    SecretString::new(value.into())
}

pub fn is_set(secret: &SecretString) -> bool {
    !secret.expose_secret().is_empty()
}
