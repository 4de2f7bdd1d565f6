//! Relay encoding for handing records to a dashboard through a URL or a
//! key-value store: compact UTF-8 JSON wrapped in base64.

use crate::record::OrderRecord;
use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use url::Url;

/// Query parameter carrying the payload
pub const RELAY_PARAM: &str = "data";

/// Encode records as a transport-safe payload
pub fn encode(records: &[OrderRecord]) -> Result<String> {
    let json = serde_json::to_string(records)?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Decode a payload produced by [`encode`] or by an in-page relay script.
///
/// Accepts the standard and URL-safe alphabets, with or without padding.
pub fn decode(payload: &str) -> Result<Vec<OrderRecord>> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(Error::Codec("empty payload".to_string()));
    }

    let bytes = [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(compact.as_bytes()).ok())
        .ok_or_else(|| Error::Codec("not valid base64".to_string()))?;

    let json = String::from_utf8(bytes).map_err(|e| Error::Codec(format!("not UTF-8: {}", e)))?;
    let records: Vec<OrderRecord> =
        serde_json::from_str(&json).map_err(|e| Error::Codec(format!("not an order list: {}", e)))?;

    tracing::debug!("Decoded relay payload with {} records", records.len());
    Ok(records)
}

/// Dashboard URL carrying the records in its `data` parameter
pub fn relay_url(dashboard: &Url, records: &[OrderRecord]) -> Result<Url> {
    let payload = encode(records)?;
    let mut url = dashboard.clone();

    let kept: Vec<(String, String)> = dashboard
        .query_pairs()
        .filter(|(k, _)| k != RELAY_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(RELAY_PARAM, &payload);

    Ok(url)
}

/// Payload carried by a relay URL, if any.
///
/// Form decoding turns an unescaped `+` into a space; base64 has no spaces,
/// so they are mapped back.
pub fn payload_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == RELAY_PARAM)
        .map(|(_, v)| v.replace(' ', "+"))
}
