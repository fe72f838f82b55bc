//! ImageKit remote-CDN client.
//!
//! Thin client over the ImageKit REST surface: upload, delete, list, URL
//! transformation, and client-upload auth parameters. The service is treated
//! as an opaque collaborator; responses we pass through untouched stay
//! `serde_json::Value`. All calls share one bounded-timeout HTTP client so a
//! slow CDN can never stall an upload request indefinitely.

use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

const UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1/files/upload";
const API_BASE_URL: &str = "https://api.imagekit.io/v1";

/// Client-upload auth parameters are valid for this long.
const AUTH_PARAMS_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Error)]
pub enum CdnError {
    #[error("CDN request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("CDN API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("CDN returned an unexpected response: {0}")]
    InvalidResponse(String),
}

impl CdnError {
    /// Timeouts are the expected degradation path, worth telling apart in logs.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CdnError::Request(e) if e.is_timeout())
    }
}

/// Successful upload response from the CDN.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnUploadResult {
    pub file_id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Parameters a browser needs to upload directly to the CDN.
#[derive(Debug, Clone, Serialize)]
pub struct CdnAuthParams {
    pub token: String,
    pub expire: u64,
    pub signature: String,
}

/// Options for server-side uploads.
#[derive(Debug, Clone, Default)]
pub struct CdnUploadOptions {
    pub folder: Option<String>,
    pub tags: Vec<String>,
}

/// Image transformation parameters for [`ImageKitClient::transform_url`].
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
    pub format: Option<String>,
}

/// ImageKit API client.
#[derive(Clone)]
pub struct ImageKitClient {
    http: Client,
    public_key: String,
    private_key: String,
    url_endpoint: String,
}

impl std::fmt::Debug for ImageKitClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never prints the private key
        f.debug_struct("ImageKitClient")
            .field("url_endpoint", &self.url_endpoint)
            .finish()
    }
}

impl ImageKitClient {
    pub fn new(
        public_key: String,
        private_key: String,
        url_endpoint: String,
        timeout_secs: u64,
    ) -> Result<Self, CdnError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(CdnError::Request)?;

        Ok(Self {
            http,
            public_key,
            private_key,
            url_endpoint: url_endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn url_endpoint(&self) -> &str {
        &self.url_endpoint
    }

    /// Upload file bytes to the CDN.
    pub async fn upload(
        &self,
        file_name: &str,
        data: Vec<u8>,
        options: CdnUploadOptions,
    ) -> Result<CdnUploadResult, CdnError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&data);

        let mut form = reqwest::multipart::Form::new()
            .text("file", encoded)
            .text("fileName", file_name.to_string())
            .text("useUniqueFileName", "true");

        if let Some(folder) = options.folder {
            form = form.text("folder", folder);
        }
        if !options.tags.is_empty() {
            form = form.text("tags", options.tags.join(","));
        }

        let response = self
            .http
            .post(UPLOAD_URL)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CdnError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let result: CdnUploadResult = response
            .json()
            .await
            .map_err(|e| CdnError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            file_id = %result.file_id,
            url = %result.url,
            "CDN upload successful"
        );

        Ok(result)
    }

    /// Delete a file from the CDN by its remote id.
    pub async fn delete_file(&self, file_id: &str) -> Result<(), CdnError> {
        let response = self
            .http
            .delete(format!("{}/files/{}", API_BASE_URL, file_id))
            .basic_auth(&self.private_key, Some(""))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CdnError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(file_id = %file_id, "CDN delete successful");
        Ok(())
    }

    /// List files on the CDN. The response is passed through untouched.
    pub async fn list_files(
        &self,
        skip: u32,
        limit: u32,
        search_query: Option<&str>,
        folder: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, CdnError> {
        let mut request = self
            .http
            .get(format!("{}/files", API_BASE_URL))
            .basic_auth(&self.private_key, Some(""))
            .query(&[("skip", skip.to_string()), ("limit", limit.to_string())]);

        if let Some(q) = search_query {
            request = request.query(&[("searchQuery", q)]);
        }
        if let Some(path) = folder {
            request = request.query(&[("path", path)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CdnError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CdnError::InvalidResponse(e.to_string()))
    }

    /// Build a transformation URL for a file path on the CDN.
    ///
    /// Transformations are encoded in the URL path (`tr:w-300,h-200,...`); an
    /// empty option set yields the plain endpoint URL.
    pub fn transform_url(&self, file_path: &str, options: &TransformOptions) -> String {
        let mut parts = Vec::new();
        if let Some(w) = options.width {
            parts.push(format!("w-{}", w));
        }
        if let Some(h) = options.height {
            parts.push(format!("h-{}", h));
        }
        if let Some(q) = options.quality {
            parts.push(format!("q-{}", q));
        }
        if let Some(ref f) = options.format {
            parts.push(format!("f-{}", f));
        }

        let path = if file_path.starts_with('/') {
            file_path.to_string()
        } else {
            format!("/{}", file_path)
        };

        if parts.is_empty() {
            format!("{}{}", self.url_endpoint, path)
        } else {
            format!("{}/tr:{}{}", self.url_endpoint, parts.join(","), path)
        }
    }

    /// Generate signed auth parameters for a direct client-side upload.
    ///
    /// Signature is an HMAC over `token + expire`, keyed by the private key,
    /// hex-encoded; valid for [`AUTH_PARAMS_TTL_SECS`].
    pub fn auth_params(&self) -> CdnAuthParams {
        let token = Uuid::new_v4().to_string();
        let expire = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            + AUTH_PARAMS_TTL_SECS;
        let signature = sign_auth_params(&self.private_key, &token, expire);
        CdnAuthParams {
            token,
            expire,
            signature,
        }
    }
}

fn sign_auth_params(private_key: &str, token: &str, expire: u64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(private_key.as_bytes())
        .expect("HMAC accepts any key size");
    mac.update(token.as_bytes());
    mac.update(expire.to_string().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
