/// Remote image source
///
/// Fetches an image over HTTP(S) into an image view, attaching
/// `Authorization: Bearer <token>` when a token is set.

use std::sync::{Arc, Weak};

use tracing::warn;
use url::Url;

use super::{Callback, ImageSource};
use crate::bitmap::Image;
use crate::loader::{ImageRequest, ImageView};

#[derive(Debug)]
struct RemoteInner {
    url: Url,
    auth_token: Option<String>,
    placeholder: Option<Image>,
}

/// An image behind a URL
///
/// Clones share state. The source counts as released once the last clone
/// is dropped; loads still in flight then report `None` instead of the
/// placeholder.
#[derive(Debug, Clone)]
pub struct RemoteImageSource {
    inner: Arc<RemoteInner>,
}

impl RemoteImageSource {
    /// Create a source for `url`
    pub fn new(url: Url, token: Option<String>, placeholder: Option<Image>) -> Self {
        Self {
            inner: Arc::new(RemoteInner {
                url,
                auth_token: token,
                placeholder,
            }),
        }
    }

    /// Create a source from a URL string
    ///
    /// Returns `None` when the string is not a valid absolute URL.
    pub fn parse(url: &str, token: Option<String>, placeholder: Option<Image>) -> Option<Self> {
        match Url::parse(url) {
            Ok(url) => Some(Self::new(url, token, placeholder)),
            Err(e) => {
                warn!(url, error = %e, "invalid image url");
                None
            }
        }
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.inner.auth_token.as_deref()
    }

    pub fn placeholder(&self) -> Option<&Image> {
        self.inner.placeholder.as_ref()
    }

    fn request(&self) -> Result<ImageRequest, crate::error::LoadError> {
        let request = ImageRequest::new(self.inner.url.clone());
        match self.auth_token() {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => Ok(request),
        }
    }
}

/// Placeholder of a source that may already be gone
fn fallback(source: &Weak<RemoteInner>) -> Option<Image> {
    source.upgrade().and_then(|inner| inner.placeholder.clone())
}

impl ImageSource for RemoteImageSource {
    fn load(&self, view: &ImageView, callback: Callback) {
        let request = match self.request() {
            Ok(request) => request,
            Err(e) => {
                warn!(url = %self.inner.url, error = %e, "cannot build image request");
                callback(self.inner.placeholder.clone());
                return;
            }
        };

        let source = Arc::downgrade(&self.inner);
        view.set_image(
            request,
            self.inner.placeholder.clone(),
            Box::new(move |result| match result {
                Ok(image) => callback(Some(image)),
                Err(_) => callback(fallback(&source)),
            }),
        );
    }

    fn cancel_load(&self, view: &ImageView) {
        view.cancel_image_request();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::encode_png;
    use crate::loader::testing::{loader, Reply, StubTransport};
    use crate::loader::{DefaultTransport, ImageLoader};
    use reqwest::header::AUTHORIZATION;
    use tokio::sync::oneshot;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn callback() -> (Callback, oneshot::Receiver<Option<Image>>) {
        let (tx, rx) = oneshot::channel();
        let callback: Callback = Box::new(move |image| {
            let _ = tx.send(image);
        });
        (callback, rx)
    }

    fn placeholder() -> Image {
        Image::solid(1, 1, [128, 128, 128, 255])
    }

    #[test]
    fn test_parse_valid_url() {
        let source = RemoteImageSource::parse("https://example.com/a.png", None, None).unwrap();
        assert_eq!(source.url(), &Url::parse("https://example.com/a.png").unwrap());
        assert_eq!(source.auth_token(), None);
        assert!(source.placeholder().is_none());
    }

    #[test]
    fn test_parse_invalid_url() {
        assert!(RemoteImageSource::parse("not a url", None, None).is_none());
        assert!(RemoteImageSource::parse("", Some("abc".into()), None).is_none());
        assert!(RemoteImageSource::parse("/relative/a.png", None, None).is_none());
    }

    #[test]
    fn test_new_stores_fields_verbatim() {
        let url = Url::parse("https://example.com/a.png").unwrap();
        let source = RemoteImageSource::new(url.clone(), Some("abc123".into()), Some(placeholder()));

        assert_eq!(source.url(), &url);
        assert_eq!(source.auth_token(), Some("abc123"));
        assert_eq!(source.placeholder(), Some(&placeholder()));
    }

    #[tokio::test]
    async fn test_load_attaches_bearer_token() {
        let stub = StubTransport::with_replies(vec![Reply::Hang]);
        let view = ImageView::new(&loader(stub.clone()));

        let source = RemoteImageSource::parse("https://example.com/a.png", Some("abc123".into()), None).unwrap();
        let (cb, _rx) = callback();
        source.load(&view, cb);

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url().as_str(), "https://example.com/a.png");
        assert_eq!(requests[0].headers().get(AUTHORIZATION).unwrap(), "Bearer abc123");
    }

    #[tokio::test]
    async fn test_load_without_token_has_no_auth_header() {
        let stub = StubTransport::with_replies(vec![Reply::Hang, Reply::Hang]);
        let view = ImageView::new(&loader(stub.clone()));

        let (cb, _rx) = callback();
        RemoteImageSource::parse("https://example.com/a.png", None, None)
            .unwrap()
            .load(&view, cb);

        let (cb, _rx2) = callback();
        RemoteImageSource::parse("https://example.com/a.png", Some(String::new()), None)
            .unwrap()
            .load(&view, cb);

        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.headers().get(AUTHORIZATION).is_none()));
    }

    #[tokio::test]
    async fn test_success_calls_back_once_with_image() {
        let red = Image::solid(2, 2, [255, 0, 0, 255]);
        let stub = StubTransport::with_replies(vec![Reply::Bytes(encode_png(&red))]);
        let view = ImageView::new(&loader(stub));

        let source = RemoteImageSource::parse("https://example.com/a.png", None, Some(placeholder())).unwrap();
        let (cb, rx) = callback();
        source.load(&view, cb);

        assert_eq!(rx.await.unwrap(), Some(red.clone()));
        assert_eq!(view.image(), Some(red));
    }

    #[tokio::test]
    async fn test_failure_calls_back_with_placeholder() {
        let stub = StubTransport::with_replies(vec![Reply::Fail]);
        let view = ImageView::new(&loader(stub));

        let source = RemoteImageSource::parse("https://example.com/a.png", None, Some(placeholder())).unwrap();
        let (cb, rx) = callback();
        source.load(&view, cb);

        assert_eq!(rx.await.unwrap(), Some(placeholder()));
        assert_eq!(view.image(), Some(placeholder()));
    }

    #[tokio::test]
    async fn test_failure_after_release_calls_back_with_nothing() {
        let (gate_tx, gate_rx) = oneshot::channel();
        let stub = StubTransport::with_replies(vec![Reply::Gated(gate_rx, Box::new(Reply::Fail))]);
        let view = ImageView::new(&loader(stub));

        let source = RemoteImageSource::parse("https://example.com/a.png", None, Some(placeholder())).unwrap();
        let (cb, rx) = callback();
        source.load(&view, cb);
        drop(source);

        gate_tx.send(()).unwrap();
        assert_eq!(rx.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_token_calls_back_with_placeholder() {
        let stub = StubTransport::with_replies(vec![]);
        let view = ImageView::new(&loader(stub.clone()));

        let source = RemoteImageSource::parse("https://example.com/a.png", Some("bad\ntoken".into()), Some(placeholder())).unwrap();
        let (cb, rx) = callback();
        source.load(&view, cb);

        assert_eq!(rx.await.unwrap(), Some(placeholder()));
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_idle_view_is_noop() {
        let view = ImageView::new(&loader(StubTransport::with_replies(vec![])));
        let source = RemoteImageSource::parse("https://example.com/a.png", None, None).unwrap();

        source.cancel_load(&view);
        source.cancel_load(&view);
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_cancel_in_flight_calls_back_with_placeholder() {
        let stub = StubTransport::with_replies(vec![Reply::Hang]);
        let view = ImageView::new(&loader(stub));

        let source = RemoteImageSource::parse("https://example.com/a.png", None, Some(placeholder())).unwrap();
        let (cb, rx) = callback();
        source.load(&view, cb);
        source.cancel_load(&view);

        assert_eq!(rx.await.unwrap(), Some(placeholder()));
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_double_load_does_not_crash() {
        let red = Image::solid(1, 1, [255, 0, 0, 255]);
        let stub = StubTransport::with_replies(vec![Reply::Hang, Reply::Bytes(encode_png(&red))]);
        let view = ImageView::new(&loader(stub));

        let source = RemoteImageSource::parse("https://example.com/a.png", None, None).unwrap();
        let (first, first_rx) = callback();
        let (second, second_rx) = callback();
        source.load(&view, first);
        source.load(&view, second);

        // Both fire; which one carries the image is up to the loader
        let outcomes = [first_rx.await.unwrap(), second_rx.await.unwrap()];
        assert!(outcomes.iter().any(|image| image.is_some()));
    }

    #[tokio::test]
    async fn test_load_over_http() {
        let server = MockServer::start().await;
        let green = Image::solid(3, 3, [0, 255, 0, 255]);

        Mock::given(method("GET"))
            .and(path("/a.png"))
            .and(header("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(encode_png(&green)))
            .expect(1)
            .mount(&server)
            .await;

        let loader = ImageLoader::new(
            std::sync::Arc::new(DefaultTransport::default()),
            tokio::runtime::Handle::current(),
        );
        let view = ImageView::new(&loader);

        let url = format!("{}/a.png", server.uri());
        let source = RemoteImageSource::parse(&url, Some("abc123".into()), None).unwrap();
        let (cb, rx) = callback();
        source.load(&view, cb);

        assert_eq!(rx.await.unwrap(), Some(green));
    }

    #[tokio::test]
    async fn test_load_over_http_without_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let loader = ImageLoader::with_current_runtime();
        let view = ImageView::new(&loader);

        let url = format!("{}/b.png", server.uri());
        let source = RemoteImageSource::parse(&url, None, Some(placeholder())).unwrap();
        let (cb, rx) = callback();
        source.load(&view, cb);

        assert_eq!(rx.await.unwrap(), Some(placeholder()));

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(!received[0].headers.contains_key("authorization"));
    }
}
