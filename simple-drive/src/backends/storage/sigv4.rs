//! Hand-rolled AWS Signature Version 4 request signing.
//!
//! Header canonicalization order, timestamp format and the keyed-hash chain
//! are all load-bearing; any deviation produces a request the endpoint
//! rejects.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Signing inputs that stay fixed for a backend instance.
#[derive(Clone, Copy, Debug)]
pub struct SigningContext<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("hmac-sha256 accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Signs a request with the current time, returning the augmented header
/// set carrying `authorization` plus any injected `host`/`x-amz-date`.
pub fn sign(
    method: &str,
    url: &Url,
    headers: BTreeMap<String, String>,
    payload: &[u8],
    context: &SigningContext<'_>,
) -> BTreeMap<String, String> {
    sign_at(method, url, headers, payload, context, Utc::now())
}

pub fn sign_at(
    method: &str,
    url: &Url,
    headers: BTreeMap<String, String>,
    payload: &[u8],
    context: &SigningContext<'_>,
    now: DateTime<Utc>,
) -> BTreeMap<String, String> {
    let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    // Lower-cased keys; the BTreeMap keeps them in canonical order.
    let mut headers: BTreeMap<String, String> = headers
        .into_iter()
        .map(|(key, value)| (key.to_ascii_lowercase(), value))
        .collect();

    if !headers.contains_key("x-amz-date") {
        headers.insert("x-amz-date".to_string(), timestamp.clone());
    }
    if !headers.contains_key("host") {
        headers.insert("host".to_string(), authority(url));
    }

    let payload_hash = sha256_hex(payload);
    let (canonical_headers, signed_headers) = canonicalize_headers(&headers);

    let path = url.path();
    let canonical_request = format!(
        "{method}\n{path}\n{query}\n{canonical_headers}\n\n{signed_headers}\n{payload_hash}",
        path = if path.is_empty() { "/" } else { path },
        query = url.query().unwrap_or(""),
    );

    let scope = format!("{date_stamp}/{region}/{service}/aws4_request",
        region = context.region,
        service = context.service,
    );
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{timestamp}\n{scope}\n{request_hash}",
        request_hash = sha256_hex(canonical_request.as_bytes()),
    );

    let signing_key = signing_key(context.secret_key, &date_stamp, context.region, context.service);
    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={access_key}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        access_key = context.access_key,
    );

    headers.insert("authorization".to_string(), authorization);

    headers
}

/// `key:trimmed-value` lines joined by newline, plus the semicolon-joined
/// signed-header key list. Keys must already be lower-cased.
fn canonicalize_headers(headers: &BTreeMap<String, String>) -> (String, String) {
    let canonical = headers
        .iter()
        .map(|(key, value)| format!("{}:{}", key, value.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    let signed = headers.keys().cloned().collect::<Vec<_>>().join(";");

    (canonical, signed)
}

/// Four-step keyed-hash chain deriving the per-date/region/service key.
fn signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}
