//! Typed, overridable knobs the embedding process can tune.
//!
//! The core does not read environment variables or files itself - config
//! *loading* is left to the embedding process - but it exposes typed
//! pool-size/timeout-style knobs directly to its embedder.

/// How many times the IP allocator retries address selection after an
/// `EtagConflict` on its own bucket before the caller gives up.
pub const DEFAULT_ALLOCATOR_RETRIES: usize = 100;

/// How many times NIC provisioning redraws a random MAC after a
/// `DuplicateMAC`-shaped conflict on a caller-unsupplied MAC.
pub const DEFAULT_MAC_RETRIES: usize = 50;

/// The outer bound on the whole Create/Update retry loop.
pub const DEFAULT_NIC_PROVISION_RETRIES: usize = 100;

/// Default `limit` applied to `find`-backed list operations when the
/// caller does not supply one.
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// The hard cap list operations enforce regardless of a caller-supplied
/// limit.
pub const MAX_LIST_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub mac_retries: usize,
    pub nic_provision_retries: usize,
    pub allocator_retries: usize,
    pub default_list_limit: usize,
    pub max_list_limit: usize,
    /// The 24-bit OUI new MACs are drawn from when a Create request does
    /// not supply one.
    pub oui: napi_mac::Oui,
    /// Bucket name prefix; a test deployment sets this to `"test_"`.
    pub bucket_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            mac_retries: DEFAULT_MAC_RETRIES,
            nic_provision_retries: DEFAULT_NIC_PROVISION_RETRIES,
            allocator_retries: DEFAULT_ALLOCATOR_RETRIES,
            default_list_limit: DEFAULT_LIST_LIMIT,
            max_list_limit: MAX_LIST_LIMIT,
            // Locally administered, unicast: the same default the
            // original implementation ships for deployments that don't
            // configure one of their own.
            oui: napi_mac::Oui::new(0x90b8d0).expect("default OUI fits in 24 bits"),
            bucket_prefix: String::new(),
        }
    }
}

impl EngineConfig {
    pub fn bucket(&self, name: &str) -> String {
        format!("{}{name}", self.bucket_prefix)
    }

    /// Resolve a caller-supplied list `limit` against this config:
    /// `None` falls back to `default_list_limit`; any value, supplied or
    /// defaulted, is clamped to `max_list_limit`.
    pub fn list_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_list_limit).min(self.max_list_limit)
    }
}
