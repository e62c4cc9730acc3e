use super::{Callback, ImageSource};
use crate::bitmap::Image;
use crate::loader::ImageView;

/// An image that is already decoded
///
/// Loading is synchronous: the view is updated and the callback fires
/// before `load` returns.
#[derive(Debug, Clone)]
pub struct MemoryImageSource {
    image: Image,
}

impl MemoryImageSource {
    pub fn new(image: Image) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }
}

impl ImageSource for MemoryImageSource {
    fn load(&self, view: &ImageView, callback: Callback) {
        view.display(Some(self.image.clone()));
        callback(Some(self.image.clone()));
    }
}
