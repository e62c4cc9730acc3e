/// Byte transports used by the image loader
///
/// A transport only moves bytes. Decoding and view updates are done by
/// the loader, so tests can swap in a transport that controls timing.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use super::ImageRequest;
use crate::error::LoadError;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Fetches the encoded bytes of an image
pub trait Transport: Send + Sync + 'static {
    fn fetch(&self, request: ImageRequest) -> BoxFuture<Result<Vec<u8>, LoadError>>;
}

/// HTTP(S) transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client with an optional per-request timeout
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, LoadError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build()?))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, request: ImageRequest) -> BoxFuture<Result<Vec<u8>, LoadError>> {
        let client = self.client.clone();

        Box::pin(async move {
            let url = request.url().to_string();
            debug!(url = %url, "fetching image");

            let resp = client
                .get(request.url().clone())
                .headers(request.headers().clone())
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                return Err(LoadError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            let bytes = resp.bytes().await?;
            debug!(url = %url, len = bytes.len(), "image fetched");
            Ok(bytes.to_vec())
        })
    }
}

/// Serves `file://` URLs from disk and everything else over HTTP
#[derive(Debug, Clone, Default)]
pub struct DefaultTransport {
    http: HttpTransport,
}

impl DefaultTransport {
    pub fn new(http: HttpTransport) -> Self {
        Self { http }
    }
}

impl Transport for DefaultTransport {
    fn fetch(&self, request: ImageRequest) -> BoxFuture<Result<Vec<u8>, LoadError>> {
        match request.url().scheme() {
            "http" | "https" => self.http.fetch(request),
            "file" => Box::pin(async move {
                let path = request
                    .url()
                    .to_file_path()
                    .map_err(|_| LoadError::InvalidFileUrl(request.url().to_string()))?;

                tokio::fs::read(&path).await.map_err(|source| LoadError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }),
            other => {
                let scheme = other.to_string();
                Box::pin(async move { Err(LoadError::UnsupportedScheme(scheme)) })
            }
        }
    }
}
