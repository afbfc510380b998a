//! AWS Signature Version 4 for single-part S3 `PUT` requests.
//!
//! Signed headers are `host`, `x-amz-content-sha256` and `x-amz-date`; the
//! payload hash is always computed (no `UNSIGNED-PAYLOAD`).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::storage::StorageError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Header values to attach to the signed request.
#[derive(Debug, Clone)]
pub struct PutSignature {
    pub amz_date: String,
    pub payload_hash: String,
    pub authorization: String,
}

pub struct PutRequest<'a> {
    /// `host` or `host:port`, exactly as sent in the `Host` header.
    pub host: &'a str,
    /// Already URI-encoded path, e.g. `/bucket/file.csv`.
    pub canonical_uri: &'a str,
    pub payload: &'a [u8],
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub region: &'a str,
}

pub fn sign_put(request: &PutRequest<'_>, now: DateTime<Utc>) -> Result<PutSignature, StorageError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(request.payload);

    let canonical_request = format!(
        "PUT\n{uri}\n\nhost:{host}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n\n{SIGNED_HEADERS}\n{payload_hash}",
        uri = request.canonical_uri,
        host = request.host,
    );

    let scope = format!("{date_stamp}/{}/{SERVICE}/aws4_request", request.region);
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(request.secret_key, &date_stamp, request.region, SERVICE)?;
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        request.access_key
    );

    Ok(PutSignature {
        amz_date,
        payload_hash,
        authorization,
    })
}

/// Derive the request signing key for a date/region/service scope.
pub fn signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, StorageError> {
    let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// Percent-encode one path segment (RFC 3986 unreserved characters pass through).
pub fn uri_encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, StorageError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| StorageError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(payload: &[u8]) -> PutRequest<'_> {
        PutRequest {
            host: "minio.example.com:9000",
            canonical_uri: "/fares/flight_prices_2026-10-07.csv",
            payload,
            access_key: "AKIDEXAMPLE",
            secret_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            region: "us-east-1",
        }
    }

    #[test]
    fn signing_key_matches_published_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        )
        .unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn empty_payload_hash() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn authorization_header_shape() {
        let now = Utc.with_ymd_and_hms(2026, 10, 7, 6, 30, 0).unwrap();
        let sig = sign_put(&request(b"origin,destination\n"), now).unwrap();

        assert_eq!(sig.amz_date, "20261007T063000Z");
        assert_eq!(sig.payload_hash, sha256_hex(b"origin,destination\n"));
        assert!(sig.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20261007/us-east-1/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature="
        ));
        let signature = sig.authorization.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_depends_on_payload_and_time() {
        let now = Utc.with_ymd_and_hms(2026, 10, 7, 6, 30, 0).unwrap();
        let a = sign_put(&request(b"a"), now).unwrap();
        let b = sign_put(&request(b"b"), now).unwrap();
        let a_again = sign_put(&request(b"a"), now).unwrap();
        let a_later = sign_put(&request(b"a"), now + chrono::Duration::seconds(1)).unwrap();
        assert_ne!(a.authorization, b.authorization);
        assert_eq!(a.authorization, a_again.authorization);
        assert_ne!(a.authorization, a_later.authorization);
    }

    #[test]
    fn uri_encoding_keeps_unreserved() {
        assert_eq!(uri_encode("flight_prices_2026-10-07.csv"), "flight_prices_2026-10-07.csv");
        assert_eq!(uri_encode("a b/c"), "a%20b%2Fc");
        assert_eq!(uri_encode("~x"), "~x");
    }
}
