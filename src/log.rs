//! Logging helpers.
//!
//! This crate is a library with no binary target, so it does not configure
//! a log sink (that's the consuming application's job: `log4rs`
//! initialization belongs in a binary, not library modules). It does
//! carry the PII-masking convention from surrounding CryptoNote wallet
//! tooling: amounts and addresses are redacted from log output unless
//! `REVEAL_PII` is set, so debug logging from this crate never leaks
//! wallet contents by default.

use std::sync::OnceLock;

fn reveal_pii() -> bool {
    static REVEAL_PII_CACHE: OnceLock<bool> = OnceLock::new();

    *REVEAL_PII_CACHE.get_or_init(|| {
        std::env::var("REVEAL_PII")
            .map(|v| {
                let val = v.to_lowercase();
                val == "true" || val == "1"
            })
            .unwrap_or(false)
    })
}

/// Masks a string (like an address), showing only the start and end.
pub fn mask_string(s: &str) -> String {
    if reveal_pii() {
        return s.to_string();
    }

    if s.len() <= 12 {
        return "***".to_string();
    }

    format!("{}...{}", &s[0..6], &s[s.len() - 6..])
}

/// Returns a redacted placeholder for an amount.
pub fn mask_amount(amount: u64) -> String {
    if reveal_pii() {
        return amount.to_string();
    }

    "<REDACTED>".to_string()
}
