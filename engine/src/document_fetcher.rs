use crate::error::{QueryError, Result};
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;
use url::Url;

pub const DOCUMENT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Somewhere a document's plain text can be obtained from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_text(&self, url: &Url) -> Result<String>;
}

/// Downloads a document with a single GET and decodes the body as text in
/// the charset its `Content-Type` declares (UTF-8 when it declares none).
///
/// The body is streamed and rejected as soon as it grows past `max_bytes`,
/// whether or not the server announced a `Content-Length`.
pub struct DocumentFetcher {
    client: Client,
    max_bytes: u64,
}

impl DocumentFetcher {
    pub fn new(max_bytes: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(DOCUMENT_FETCH_TIMEOUT)
            .build()
            .map_err(|e| QueryError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, max_bytes })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn too_large(&self) -> QueryError {
        QueryError::DocumentTooLarge {
            limit: self.max_bytes,
        }
    }
}

#[async_trait]
impl DocumentSource for DocumentFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        log::info!("Downloading document: {}", url);

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| QueryError::document_fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::document_fetch(format!(
                "{} responded with status {}",
                url, status
            )));
        }

        let encoding = declared_encoding(response.headers());

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(self.too_large());
            }
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| QueryError::document_fetch(e.to_string()))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }

        let text = decode_body(&body, encoding)?;

        log::info!(
            "Downloaded document ({} bytes, {})",
            body.len(),
            encoding.name()
        );
        Ok(text)
    }
}

/// Charset named by the `Content-Type` header. Missing or unknown labels
/// fall back to UTF-8.
fn declared_encoding(headers: &reqwest::header::HeaderMap) -> &'static Encoding {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .and_then(|mime| {
            mime.get_param(mime::CHARSET)
                .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
        })
        .unwrap_or(UTF_8)
}

/// Decodes `body`, honouring a leading BOM over the declared encoding.
fn decode_body(body: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, actual, had_errors) = encoding.decode(body);
    if had_errors {
        return Err(QueryError::DocumentDecode(format!(
            "body is not valid {}",
            actual.name()
        )));
    }
    Ok(text.into_owned())
}
