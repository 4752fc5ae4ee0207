use std::fmt;

use sha2::{Digest, Sha256};

/// Anonymous device fingerprint: lowercase hex SHA-256.
///
/// Advisory only. Any client can present any device id.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DeviceHash(String);

impl DeviceHash {
    /// Hash the first non-empty of the client-supplied id, the network address,
    /// or the literal `"unknown"`.
    pub fn fingerprint(client_supplied: Option<&str>, fallback_address: Option<&str>) -> Self {
        let source = client_supplied
            .filter(|s| !s.is_empty())
            .or(fallback_address.filter(|s| !s.is_empty()))
            .unwrap_or("unknown");
        Self(hex::encode(Sha256::digest(source.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DeviceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceHash({})", &self.0[..12])
    }
}

impl fmt::Display for DeviceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
