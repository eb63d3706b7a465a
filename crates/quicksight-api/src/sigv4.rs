//! AWS Signature Version 4 request signing
//!
//! Signs `host`, `x-amz-date`, `content-type` (when present) and
//! `x-amz-security-token` (when a session token is in use). The payload hash
//! covers the exact body bytes sent.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HOST, HeaderMap, HeaderValue};
use sha2::{Digest, Sha256};

use crate::credentials::Credentials;
use crate::error::{Error, Result};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const AMZ_DATE: &str = "x-amz-date";
const SECURITY_TOKEN: &str = "x-amz-security-token";

type HmacSha256 = Hmac<Sha256>;

/// Everything needed to sign one request besides the request itself.
pub struct SigningParams<'a> {
    pub credentials: &'a Credentials,
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
}

/// Add the signing headers and the `Authorization` header to `headers`.
pub fn sign(
    method: &str,
    url: &Url,
    headers: &mut HeaderMap,
    body: &[u8],
    params: &SigningParams<'_>,
) -> Result<()> {
    let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.time.format("%Y%m%d").to_string();

    let host = match (url.host_str(), url.port()) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.to_owned(),
        (None, _) => return Err(Error::Signing(format!("URL has no host: {url}"))),
    };
    headers.insert(HOST, header_value(&host)?);
    headers.insert(AMZ_DATE, header_value(&amz_date)?);
    if let Some(token) = &params.credentials.session_token {
        headers.insert(SECURITY_TOKEN, header_value(token.expose())?);
    }

    let mut signed: Vec<(&str, String)> = vec![
        ("host", host),
        (AMZ_DATE, amz_date.clone()),
    ];
    if let Some(ct) = headers.get(CONTENT_TYPE) {
        let ct = ct
            .to_str()
            .map_err(|e| Error::Signing(format!("content-type is not ASCII: {e}")))?;
        signed.push(("content-type", ct.trim().to_owned()));
    }
    if let Some(token) = &params.credentials.session_token {
        signed.push((SECURITY_TOKEN, token.expose().clone()));
    }
    signed.sort_by(|a, b| a.0.cmp(b.0));

    let canonical = canonical_request(method, url, &signed, &hex_sha256(body));
    let scope = format!("{date}/{}/{}/aws4_request", params.region, params.service);
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex_sha256(canonical.as_bytes())
    );

    let key = signing_key(
        params.credentials.secret_access_key.expose(),
        &date,
        params.region,
        params.service,
    )?;
    let signature = hex(&hmac(&key, string_to_sign.as_bytes())?);

    let signed_names: Vec<&str> = signed.iter().map(|(n, _)| *n).collect();
    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={}, Signature={signature}",
        params.credentials.access_key_id,
        signed_names.join(";"),
    );
    headers.insert(AUTHORIZATION, header_value(&authorization)?);
    Ok(())
}

fn canonical_request(
    method: &str,
    url: &Url,
    signed: &[(&str, String)],
    payload_hash: &str,
) -> String {
    let path = if url.path().is_empty() { "/" } else { url.path() };
    let canonical_uri = path
        .split('/')
        .map(uri_encode)
        .collect::<Vec<_>>()
        .join("/");

    let mut query: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
        .collect();
    query.sort();
    let canonical_query = query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_headers: String = signed
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();
    let signed_names = signed
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_names}\n{payload_hash}"
    )
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| Error::Signing(format!("HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex_sha256(data: &[u8]) -> String {
    hex(&Sha256::digest(data))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// RFC 3986 encoding: everything except unreserved characters.
fn uri_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn header_value(v: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(v).map_err(|e| Error::Signing(format!("invalid header value: {e}")))
}
