//! Package signatures.
//!
//! Signatures are opaque identifiers, not authentication. A one-time
//! signature hashes a timestamp with an issue counter; the global signature
//! is fixed when the manager is created. Validity is a prefix check.

use std::collections::HashSet;

use blake3::Hasher;
use chrono::{SecondsFormat, Utc};

/// Prefix of one-time (targeted) signatures.
pub const ONE_TIME_PREFIX: &str = "sig_";

/// Prefix of the broadcast signature.
pub const GLOBAL_PREFIX: &str = "GLOBAL_SIG_";

const ONE_TIME_HEX_LEN: usize = 16;
const GLOBAL_HEX_LEN: usize = 12;

fn digest(material: &str, len: usize) -> String {
    let mut h = Hasher::new();
    h.update(material.as_bytes());
    let hex = h.finalize().to_hex();
    hex.as_str()[..len].to_string()
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Issues one-time signatures and holds the global signature.
#[derive(Debug, Clone)]
pub struct SignatureManager {
    issued: HashSet<String>,
    global: String,
}

impl SignatureManager {
    /// Creates a manager with a fresh global signature.
    #[must_use]
    pub fn new() -> Self {
        Self {
            issued: HashSet::new(),
            global: format!("{GLOBAL_PREFIX}{}", digest(&now_stamp(), GLOBAL_HEX_LEN)),
        }
    }

    /// Issues a new `sig_` signature, distinct from every earlier one.
    pub fn generate_one_time(&mut self) -> String {
        loop {
            let counter = self.issued.len();
            let signature = format!(
                "{ONE_TIME_PREFIX}{}",
                digest(&format!("{}{counter}", now_stamp()), ONE_TIME_HEX_LEN)
            );
            if self.issued.insert(signature.clone()) {
                return signature;
            }
        }
    }

    /// The broadcast signature.
    #[must_use]
    pub fn global_signature(&self) -> &str {
        &self.global
    }

    /// Prefix check only.
    #[must_use]
    pub fn is_valid(signature: &str) -> bool {
        signature.starts_with(ONE_TIME_PREFIX) || signature.starts_with(GLOBAL_PREFIX)
    }

    /// True if this manager issued `signature`.
    #[must_use]
    pub fn is_recognized(&self, signature: &str) -> bool {
        signature == self.global || self.issued.contains(signature)
    }

    /// Number of one-time signatures issued.
    #[must_use]
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }
}

impl Default for SignatureManager {
    fn default() -> Self {
        Self::new()
    }
}
