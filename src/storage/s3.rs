//! S3-compatible (MinIO) object store.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::storage::sigv4::{PutRequest, sign_put, uri_encode};
use crate::storage::{ObjectStore, StorageError};

pub const DEFAULT_REGION: &str = "us-east-1";
const CONTENT_TYPE_CSV: &str = "application/csv";

/// Connection settings for one named storage target.
#[derive(Clone)]
pub struct StorageProfile {
    pub name: String,
    /// `https://host:port`, or bare `host:port` (HTTPS assumed).
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

impl std::fmt::Debug for StorageProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageProfile")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

pub struct S3Store {
    client: Client,
    profile: StorageProfile,
    endpoint: Url,
}

impl S3Store {
    pub fn new(profile: StorageProfile, timeout: Duration) -> Result<Self, StorageError> {
        let endpoint = parse_endpoint(&profile.endpoint)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            profile,
            endpoint,
        })
    }
}

impl ObjectStore for S3Store {
    fn upload(&self, path: &Path) -> Result<(), StorageError> {
        let key = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StorageError::Read {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no usable file name"),
            })?;

        let payload = std::fs::read(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let host = host_header(&self.endpoint)?;
        let canonical_uri = format!("/{}/{}", uri_encode(&self.profile.bucket), uri_encode(key));

        let signature = sign_put(
            &PutRequest {
                host: &host,
                canonical_uri: &canonical_uri,
                payload: &payload,
                access_key: &self.profile.access_key,
                secret_key: &self.profile.secret_key,
                region: &self.profile.region,
            },
            Utc::now(),
        )?;

        let url = format!("{}://{host}{canonical_uri}", self.endpoint.scheme());
        let size = payload.len();
        let resp = self
            .client
            .put(url)
            .header("x-amz-date", &signature.amz_date)
            .header("x-amz-content-sha256", &signature.payload_hash)
            .header(AUTHORIZATION, &signature.authorization)
            .header(CONTENT_TYPE, CONTENT_TYPE_CSV)
            .body(payload)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            target_name = %self.profile.name,
            bucket = %self.profile.bucket,
            key,
            bytes = size,
            "Artifact uploaded"
        );
        Ok(())
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, StorageError> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let url = Url::parse(&with_scheme).map_err(|e| StorageError::Endpoint {
        endpoint: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(StorageError::Endpoint {
            endpoint: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    // Requests are path-style from the root; a prefix would be dropped from the signed URI.
    if url.path() != "/" || url.query().is_some() {
        return Err(StorageError::Endpoint {
            endpoint: raw.to_string(),
            reason: "path prefixes are not supported; give scheme, host and port only".to_string(),
        });
    }
    Ok(url)
}

/// `host` or `host:port` when the port is not the scheme default.
fn host_header(url: &Url) -> Result<String, StorageError> {
    let host = url.host_str().ok_or_else(|| StorageError::Endpoint {
        endpoint: url.to_string(),
        reason: "missing host".to_string(),
    })?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
