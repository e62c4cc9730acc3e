use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use url::Url;

use crate::error::LoadError;

/// A GET request for an image
#[derive(Debug, Clone)]
pub struct ImageRequest {
    url: Url,
    headers: HeaderMap,
}

impl ImageRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Attach `Authorization: Bearer <token>`
    ///
    /// The header value is marked sensitive so it never shows up in logs.
    pub fn bearer_auth(mut self, token: &str) -> Result<Self, LoadError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| LoadError::InvalidHeader("Authorization"))?;
        value.set_sensitive(true);

        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
