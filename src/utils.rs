use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::{management::SelectionOp, types::Quality};

pub fn generate_code_verifier() -> String {
    random_alphanumeric(128)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn generate_csrf_state() -> String {
    random_alphanumeric(32)
}

/// Opaque id correlating one CLI session's submit/status/cancel/file calls on
/// a shared backend.
pub fn generate_user_id(now_ms: i64) -> String {
    format!("cli_{}_{}", now_ms, random_alphanumeric(9).to_lowercase())
}

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn parse_quality(s: &str) -> Result<Quality, String> {
    s.parse()
}

/// Parses a `--pick` value.
///
/// - `all:<playlist id>` selects every track of the playlist
/// - `toggle:<playlist id>` toggles the whole playlist
/// - `track:<playlist id>:<track uri>` toggles one track
pub fn parse_selection_op(s: &str) -> Result<SelectionOp, String> {
    let mut parts = s.trim().splitn(3, ':');
    let kind = parts.next().unwrap_or_default();
    let playlist_id = parts
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| format!("missing playlist id in '{}'", s))?
        .to_string();

    match (kind, parts.next()) {
        ("all", None) => Ok(SelectionOp::SelectAll(playlist_id)),
        ("toggle", None) => Ok(SelectionOp::Toggle(playlist_id)),
        ("track", Some(uri)) if !uri.is_empty() => Ok(SelectionOp::ToggleTrack {
            playlist_id,
            uri: uri.to_string(),
        }),
        ("track", _) => Err(format!("missing track uri in '{}'", s)),
        _ => Err(format!(
            "invalid pick '{}', expected all:<id>, toggle:<id> or track:<id>:<uri>",
            s
        )),
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}
