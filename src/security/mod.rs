//! API key resolution
//!
//! The key comes from `OPENAI_API_KEY` when set, otherwise from the OS
//! keyring (with a private file as fallback).

pub mod keyring;

use anyhow::Result;

/// Environment variable checked before the keyring
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Store API key in the keyring
pub fn set_api_key(key: &str) -> Result<()> {
    keyring::set_api_key(key)
}

/// Resolve the API key: environment first, then keyring/file
pub fn get_api_key() -> Result<String> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => keyring::get_api_key(),
    }
}

/// Whether any API key source is configured
pub fn has_api_key() -> bool {
    std::env::var(API_KEY_ENV).map(|k| !k.trim().is_empty()).unwrap_or(false)
        || keyring::has_stored_api_key()
}
