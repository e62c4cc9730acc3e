/// Image loading client
///
/// The loader owns every in-flight load, keyed by the view it was issued
/// against:
/// - `request.rs` - the GET request and its headers
/// - `transport.rs` - byte transports (HTTP, local files)
/// - `view.rs` - the image view model the loader writes into
///
/// A view has at most one operation in flight. Issuing a new load on a busy
/// view supersedes the old one, which completes as `LoadError::Cancelled`
/// and never touches the view.

pub mod request;
pub mod transport;
pub mod view;

pub use request::ImageRequest;
pub use transport::{DefaultTransport, HttpTransport, Transport};
pub use view::{ImageView, ViewId};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::bitmap::Image;
use crate::error::LoadError;

/// Completion handler for a single load
pub type Completion = Box<dyn FnOnce(Result<Image, LoadError>) + Send + 'static>;

/// Bookkeeping for one in-flight operation
struct InFlight {
    ticket: u64,
    /// Dropping or firing this cancels the operation
    cancel: oneshot::Sender<()>,
}

struct LoaderInner {
    transport: Arc<dyn Transport>,
    runtime: Handle,
    in_flight: Mutex<HashMap<ViewId, InFlight>>,
    next_ticket: AtomicU64,
}

/// Cloneable handle to the image loading client
#[derive(Clone)]
pub struct ImageLoader {
    inner: Arc<LoaderInner>,
}

impl ImageLoader {
    /// Create a loader that spawns its work on `runtime`
    pub fn new(transport: Arc<dyn Transport>, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                transport,
                runtime,
                in_flight: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(1),
            }),
        }
    }

    /// Loader with the default transport on the current tokio runtime
    ///
    /// Panics when called outside a tokio runtime.
    pub fn with_current_runtime() -> Self {
        Self::new(Arc::new(DefaultTransport::default()), Handle::current())
    }

    /// Start loading `request` into `view`
    ///
    /// The placeholder (if any) is shown right away. `completion` is called
    /// exactly once, on the loader's runtime, after the view was updated.
    pub fn set_image(
        &self,
        view: &ImageView,
        request: ImageRequest,
        placeholder: Option<Image>,
        completion: Completion,
    ) {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        {
            let mut in_flight = self.in_flight();
            let superseded = in_flight.insert(
                view.id(),
                InFlight {
                    ticket,
                    cancel: cancel_tx,
                },
            );
            if let Some(previous) = superseded {
                debug!(view = %view.id(), ticket = previous.ticket, "superseding in-flight load");
                let _ = previous.cancel.send(());
            }

            // Shown under the lock so an older load cannot finish in between
            if let Some(placeholder) = placeholder {
                view.display(Some(placeholder));
            }
        }

        debug!(view = %view.id(), ticket, url = %request.url(), "load started");

        let inner = Arc::clone(&self.inner);
        let view = view.clone();
        let url = request.url().to_string();
        let fetch = self.inner.transport.fetch(request);

        self.inner.runtime.spawn(async move {
            let result = tokio::select! {
                bytes = fetch => match bytes {
                    Ok(bytes) => tokio::task::spawn_blocking(move || Image::decode(&bytes))
                        .await
                        .map_err(LoadError::from)
                        .and_then(|decoded| decoded),
                    Err(e) => Err(e),
                },
                _ = cancel_rx => Err(LoadError::Cancelled),
            };

            // Only the current operation for the view may write to it
            let result = {
                let mut in_flight = lock(&inner.in_flight);
                let current = in_flight
                    .get(&view.id())
                    .is_some_and(|op| op.ticket == ticket);

                if current {
                    in_flight.remove(&view.id());
                    if let Ok(image) = &result {
                        view.display(Some(image.clone()));
                    }
                    result
                } else {
                    Err(LoadError::Cancelled)
                }
            };

            match &result {
                Ok(image) => {
                    debug!(view = %view.id(), ticket, url = %url, width = image.width(), height = image.height(), "load completed")
                }
                Err(e) if e.is_cancelled() => debug!(view = %view.id(), ticket, url = %url, "load cancelled"),
                Err(e) => warn!(view = %view.id(), ticket, url = %url, error = %e, "load failed"),
            }

            completion(result);
        });
    }

    /// Cancel whatever is in flight for `view`
    ///
    /// Does nothing when the view is idle. Safe to call repeatedly.
    pub fn cancel(&self, view: &ImageView) {
        if let Some(op) = self.in_flight().remove(&view.id()) {
            debug!(view = %view.id(), ticket = op.ticket, "cancelling load");
            let _ = op.cancel.send(());
        }
    }

    /// Whether a load is currently in flight for `view`
    pub fn in_flight_for(&self, view: &ImageView) -> bool {
        self.in_flight().contains_key(&view.id())
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<ViewId, InFlight>> {
        lock(&self.inner.in_flight)
    }
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("in_flight", &self.in_flight().len())
            .finish()
    }
}

/// Poisoning only means another load panicked mid-update; the map is still usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
