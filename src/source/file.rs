use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use url::Url;

use super::{Callback, ImageSource};
use crate::bitmap::Image;
use crate::loader::{ImageRequest, ImageView};

#[derive(Debug)]
struct FileInner {
    path: PathBuf,
    url: Url,
    placeholder: Option<Image>,
}

/// An image file on the local disk, loaded off the UI thread
#[derive(Debug, Clone)]
pub struct FileImageSource {
    inner: Arc<FileInner>,
}

impl FileImageSource {
    /// Returns `None` for relative paths, which have no `file://` URL
    pub fn new(path: impl Into<PathBuf>, placeholder: Option<Image>) -> Option<Self> {
        let path = path.into();
        let url = Url::from_file_path(&path).ok()?;

        Some(Self {
            inner: Arc::new(FileInner {
                path,
                url,
                placeholder,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}

fn fallback(source: &Weak<FileInner>) -> Option<Image> {
    source.upgrade().and_then(|inner| inner.placeholder.clone())
}

impl ImageSource for FileImageSource {
    fn load(&self, view: &ImageView, callback: Callback) {
        let source = Arc::downgrade(&self.inner);

        view.set_image(
            ImageRequest::new(self.inner.url.clone()),
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
