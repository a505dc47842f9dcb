use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::CipherSuite;
use crate::registry::{ProgramId, RegistryProgram, DEFAULT_DOMAIN_TAG};
use crate::retry::RetryPolicy;

/// Everything the registration pipeline needs besides its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Leading seed of every record address
    #[serde(default = "default_domain_tag")]
    pub domain_tag: String,
    #[serde(default)]
    pub program_id: ProgramId,
    #[serde(default)]
    pub cipher_suite: CipherSuite,
    #[serde(default)]
    pub publish_retry: RetryPolicy,
    #[serde(default)]
    pub ledger_retry: RetryPolicy,
    /// Bound on a single publish attempt
    #[serde(default = "default_timeout_ms")]
    pub publish_timeout_ms: u64,
    /// Bound on a single ledger read or submit
    #[serde(default = "default_timeout_ms")]
    pub submit_timeout_ms: u64,
}

fn default_domain_tag() -> String {
    DEFAULT_DOMAIN_TAG.to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            domain_tag: default_domain_tag(),
            program_id: ProgramId::default(),
            cipher_suite: CipherSuite::default(),
            publish_retry: RetryPolicy::default(),
            ledger_retry: RetryPolicy::default(),
            publish_timeout_ms: default_timeout_ms(),
            submit_timeout_ms: default_timeout_ms(),
        }
    }
}

impl RegistrarConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    /// The registry program this configuration addresses
    pub fn program(&self) -> RegistryProgram {
        RegistryProgram::new(self.program_id, self.domain_tag.as_bytes())
    }
}
