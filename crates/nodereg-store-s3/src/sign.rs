//! AWS Signature Version 4 request signing
//!
//! Minimal SigV4 implementation covering what the list store needs: GET and
//! PUT of a single object with a small, fixed header set. Reference:
//! https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// SigV4 signer for a fixed credential and region
#[derive(Clone)]
pub struct Signer {
    access_key: String,
    secret_key: String,
    region: String,
}

// The secret key must never appear in logs
impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<REDACTED>")
            .field("region", &self.region)
            .finish()
    }
}

impl Signer {
    /// Create a signer for the given credential and region
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }

    /// Produce the full header set for a request, including `authorization`
    ///
    /// # Parameters
    ///
    /// - `method`: HTTP method ("GET", "PUT")
    /// - `host`: The request host header value
    /// - `uri`: The absolute request path (e.g., "/bucket/seeds/nodes.json")
    /// - `payload`: The request body (empty for GET)
    /// - `extra_headers`: Additional headers to sign (content-type, x-amz-acl)
    /// - `now`: Signing timestamp
    pub fn signed_headers(
        &self,
        method: &str,
        host: &str,
        uri: &str,
        payload: &[u8],
        extra_headers: &[(&str, &str)],
        now: DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = hex::encode(Sha256::digest(payload));

        // Canonical headers, sorted by name
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        headers.insert("host".to_string(), host.to_string());
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
        headers.insert("x-amz-date".to_string(), amz_date.clone());
        for (name, value) in extra_headers {
            headers.insert(name.to_lowercase(), value.to_string());
        }

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();
        let signed_header_names = headers
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method,
            canonical_uri(uri),
            canonical_headers,
            signed_header_names,
            payload_hash
        );

        let scope = format!("{}/{}/s3/aws4_request", date, self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = hex::encode(self.signature(&date, string_to_sign.as_bytes()));
        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.access_key, scope, signed_header_names, signature
        );

        let mut out: Vec<(String, String)> = headers.into_iter().collect();
        out.push(("authorization".to_string(), authorization));
        // host is set by the HTTP client itself
        out.retain(|(name, _)| name != "host");
        out
    }

    /// Derive the signing key and sign the string-to-sign
    fn signature(&self, date: &str, string_to_sign: &[u8]) -> Vec<u8> {
        let k_date = hmac_sha256(format!("AWS4{}", self.secret_key).as_bytes(), date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, b"s3");
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        hmac_sha256(&k_signing, string_to_sign)
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Percent-encode a request path per SigV4 canonical URI rules
///
/// Unreserved characters and '/' pass through; everything else is encoded.
fn canonical_uri(uri: &str) -> String {
    let mut out = String::with_capacity(uri.len());
    for byte in uri.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_signer() -> Signer {
        Signer::new("AKIDEXAMPLE", "wJalrXUtnFEMI", "us-east-1")
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn signed_headers_include_authorization_and_scope() {
        let headers = test_signer().signed_headers(
            "GET",
            "testnet-seed.example.com",
            "/testnet-seed/seeds/nodes.json",
            b"",
            &[],
            test_time(),
        );

        let auth = headers
            .iter()
            .find(|(name, _)| name == "authorization")
            .map(|(_, value)| value.clone())
            .expect("authorization header present");

        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240501/us-east-1/s3/aws4_request"));
        assert!(auth.contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date"));

        // 64 hex chars of signature at the end
        let signature = auth.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn extra_headers_are_signed_in_sorted_order() {
        let headers = test_signer().signed_headers(
            "PUT",
            "testnet-seed.example.com",
            "/testnet-seed/seeds/nodes.json",
            b"[]",
            &[("x-amz-acl", "public-read"), ("content-type", "application/json")],
            test_time(),
        );

        let auth = &headers
            .iter()
            .find(|(name, _)| name == "authorization")
            .unwrap()
            .1;
        assert!(auth.contains(
            "SignedHeaders=content-type;host;x-amz-acl;x-amz-content-sha256;x-amz-date"
        ));
    }

    #[test]
    fn signature_depends_on_the_secret() {
        let a = test_signer().signed_headers("GET", "h", "/k", b"", &[], test_time());
        let other = Signer::new("AKIDEXAMPLE", "different-secret", "us-east-1");
        let b = other.signed_headers("GET", "h", "/k", b"", &[], test_time());

        let auth = |headers: &[(String, String)]| {
            headers
                .iter()
                .find(|(name, _)| name == "authorization")
                .unwrap()
                .1
                .clone()
        };
        assert_ne!(auth(&a), auth(&b));
    }

    #[test]
    fn canonical_uri_encodes_outside_unreserved() {
        assert_eq!(canonical_uri("/bucket/seeds/nodes.json"), "/bucket/seeds/nodes.json");
        assert_eq!(canonical_uri("/bucket/a b"), "/bucket/a%20b");
    }

    #[test]
    fn debug_redacts_the_secret() {
        let formatted = format!("{:?}", test_signer());
        assert!(formatted.contains("<REDACTED>"));
        assert!(!formatted.contains("wJalrXUtnFEMI"));
    }
}
