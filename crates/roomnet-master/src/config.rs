//! Master-side settings.
//!
//! Plain in-code configuration with sensible defaults — this package
//! deliberately has no config file or CLI surface; the host application
//! constructs a [`MasterConfig`] and hands it to the controller.  The
//! struct stays serde-derived so hosts that *do* persist settings can embed
//! it in their own schema.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Network settings for the master's transfer listeners.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasterConfig {
    /// IP address to bind transfer listeners to.  `0.0.0.0` binds all
    /// interfaces.
    pub bind_address: IpAddr,
    /// Host advertised to peers in `"host:port"` payloads.  Must be a
    /// colon-free IPv4 literal or hostname reachable by every client; this
    /// is validated when the controller is constructed.
    pub advertise_host: String,
    /// Port for transfer listeners.  `0` (the default) requests a fresh
    /// ephemeral port per worker, which is what lets several requesters be
    /// served concurrently.  A fixed port serializes workers and surfaces
    /// `BindInUse` when two overlap.
    pub transfer_port: u16,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".parse().expect("valid literal"),
            advertise_host: "127.0.0.1".to_string(),
            transfer_port: 0,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_ephemeral_ports_on_all_interfaces() {
        let cfg = MasterConfig::default();
        assert!(cfg.bind_address.is_unspecified());
        assert_eq!(cfg.transfer_port, 0);
        assert_eq!(cfg.advertise_host, "127.0.0.1");
    }
}
