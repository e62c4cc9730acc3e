use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{lock, Completion, ImageLoader, ImageRequest};
use crate::bitmap::Image;

/// Identity of an image view, used to key in-flight loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(u64);

impl ViewId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ViewId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// The image currently displayed by one slot of the UI
///
/// Cloning yields another handle to the same view. The UI reads
/// `image()` when it renders; the loader writes through `display`.
#[derive(Clone)]
pub struct ImageView {
    id: ViewId,
    shown: Arc<Mutex<Option<Image>>>,
    loader: ImageLoader,
}

impl ImageView {
    /// Create an empty view bound to `loader`
    pub fn new(loader: &ImageLoader) -> Self {
        Self {
            id: ViewId::next(),
            shown: Arc::new(Mutex::new(None)),
            loader: loader.clone(),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The image currently displayed, if any
    pub fn image(&self) -> Option<Image> {
        lock(&self.shown).clone()
    }

    /// Replace the displayed image
    pub fn display(&self, image: Option<Image>) {
        *lock(&self.shown) = image;
    }

    /// Load `request` into this view through the bound loader
    pub fn set_image(&self, request: ImageRequest, placeholder: Option<Image>, completion: Completion) {
        self.loader.set_image(self, request, placeholder, completion);
    }

    /// Cancel the load in flight for this view, if any
    pub fn cancel_image_request(&self) {
        self.loader.cancel(self);
    }

    pub fn is_loading(&self) -> bool {
        self.loader.in_flight_for(self)
    }
}

impl fmt::Debug for ImageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageView")
            .field("id", &self.id)
            .field("image", &self.image())
            .finish()
    }
}
