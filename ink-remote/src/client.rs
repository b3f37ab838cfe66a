//! HTTP backend for OCR, handwriting synthesis and document storage.
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Operation  | Request                                  | Response            |
//! |------------|------------------------------------------|---------------------|
//! | recognize  | `POST ml/image-to-text` multipart `file`, `id` | `{"text": ...}` |
//! | synthesize | `POST ml/text-to-image` JSON `{"text": ...}`   | `{"paths": [...]}` |
//! | load       | `GET canvas/{id}`                        | `{"data": ..., "text": ...}` |
//! | save       | `PUT canvas/{id}` multipart `file`       | any 2xx             |
//!
//! Failed calls carry `{"message": ...}` in the body; when they don't, the
//! canonical status reason is used instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ink_core::{
    CapabilityError, DocumentStore, InkSynthesizer, SceneBlob, StoredDocument, SynthesizedInk,
    TextRecognizer,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};

/// Service name reported for OCR failures.
pub const OCR_SERVICE: &str = "ocr";
/// Service name reported for synthesis failures.
pub const SYNTHESIS_SERVICE: &str = "synthesis";
/// Service name reported for storage failures.
pub const STORAGE_SERVICE: &str = "storage";

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    #[serde(default)]
    data: Value,
    #[serde(default, alias = "recognizedTextCache")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Asynchronous client for the backend services.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    inner: Arc<InnerBackend>,
}

#[derive(Debug)]
struct InnerBackend {
    http: Client,
    base: Url,
}

impl HttpBackend {
    /// Create a client for the configured base URL.
    ///
    /// A base without a trailing slash is treated as a directory, so
    /// `https://host/api` and `https://host/api/` resolve endpoints alike.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidUrl`] if the URL is malformed.
    /// Returns [`RemoteError::Http`] if the HTTP client fails to build.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let mut base =
            Url::parse(&config.base_url).map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("inkboard/{}", env!("CARGO_PKG_VERSION")));
        let mut builder = Client::builder().user_agent(agent);
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http = builder.build()?;

        Ok(Self {
            inner: Arc::new(InnerBackend { http, base }),
        })
    }

    /// Resolved base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        self.inner
            .base
            .join(path)
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))
    }

    /// `canvas/{id}` with the id percent-encoded as a single segment.
    fn document_url(&self, document_id: &str) -> RemoteResult<Url> {
        let mut url = self.endpoint("canvas/")?;
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidUrl(self.inner.base.to_string()))?
            .pop_if_empty()
            .push(document_id);
        Ok(url)
    }

    /// Send a PNG to the OCR service and return the recognized text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a body
    /// without a `text` field.
    pub async fn recognize(&self, image: &[u8], document_id: &str) -> RemoteResult<String> {
        let url = self.endpoint("ml/image-to-text")?;
        let file = Part::bytes(image.to_vec())
            .file_name("canvas.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .part("file", file)
            .text("id", document_id.to_string());

        debug!(%url, bytes = image.len(), document_id, "requesting text recognition");
        let response = self.inner.http.post(url).multipart(form).send().await?;
        let body: RecognizeResponse = read_json(response).await?;
        Ok(body.text)
    }

    /// Ask the synthesis service to write `text` as handwriting.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or malformed
    /// path data.
    pub async fn synthesize(&self, text: &str) -> RemoteResult<SynthesizedInk> {
        let url = self.endpoint("ml/text-to-image")?;
        debug!(%url, chars = text.chars().count(), "requesting handwriting synthesis");
        let response = self
            .inner
            .http
            .post(url)
            .json(&SynthesizeRequest { text })
            .send()
            .await?;
        read_json(response).await
    }

    /// Fetch a stored document.
    ///
    /// `data` may arrive as an embedded JSON value or as a JSON string; both
    /// become the same blob. `null` or an empty string means a new document.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn fetch(&self, document_id: &str) -> RemoteResult<StoredDocument> {
        let url = self.document_url(document_id)?;
        debug!(%url, "fetching document");
        let response = self.inner.http.get(url).send().await?;
        let body: DocumentResponse = read_json(response).await?;

        let scene = match body.data {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(SceneBlob::from_bytes(s.into_bytes())),
            other => Some(SceneBlob::from_bytes(serde_json::to_vec(&other)?)),
        };
        Ok(StoredDocument {
            scene,
            recognized_text: body.text,
        })
    }

    /// Upload a scene blob.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx status.
    pub async fn store(&self, document_id: &str, blob: &SceneBlob) -> RemoteResult<()> {
        let url = self.document_url(document_id)?;
        let file = Part::bytes(blob.as_bytes().to_vec())
            .file_name("canvas.json")
            .mime_str("application/json")?;
        let form = Form::new().part("file", file);

        debug!(%url, bytes = blob.len(), "storing document");
        let response = self.inner.http.put(url).multipart(form).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Pass 2xx responses through; turn anything else into [`RemoteError::Status`].
async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    warn!(status = status.as_u16(), %message, "backend request failed");
    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
    let bytes = check_status(response).await?.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!(error = %e, "backend response did not parse");
        RemoteError::UnexpectedResponse(e.to_string())
    })
}

#[async_trait]
impl TextRecognizer for HttpBackend {
    async fn recognize_text(
        &self,
        image: &[u8],
        document_id: &str,
    ) -> Result<String, CapabilityError> {
        self.recognize(image, document_id)
            .await
            .map_err(|e| e.into_capability(OCR_SERVICE))
    }
}

#[async_trait]
impl InkSynthesizer for HttpBackend {
    async fn synthesize_ink(&self, text: &str) -> Result<SynthesizedInk, CapabilityError> {
        self.synthesize(text)
            .await
            .map_err(|e| e.into_capability(SYNTHESIS_SERVICE))
    }
}

#[async_trait]
impl DocumentStore for HttpBackend {
    async fn load_document(&self, document_id: &str) -> Result<StoredDocument, CapabilityError> {
        self.fetch(document_id)
            .await
            .map_err(|e| e.into_capability(STORAGE_SERVICE))
    }

    async fn save_document(
        &self,
        document_id: &str,
        blob: &SceneBlob,
    ) -> Result<(), CapabilityError> {
        self.store(document_id, blob)
            .await
            .map_err(|e| e.into_capability(STORAGE_SERVICE))
    }
}
