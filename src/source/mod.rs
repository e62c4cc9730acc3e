/// Image sources for the slideshow
///
/// Every page of a slideshow is backed by an `ImageSource`:
/// - `remote.rs` - HTTP(S) images with optional bearer auth
/// - `file.rs` - image files on disk
/// - `memory.rs` - images already decoded in memory
///
/// Sources only report success or not. On failure the callback receives
/// the source's placeholder, or nothing.

pub mod file;
pub mod memory;
pub mod remote;

pub use file::FileImageSource;
pub use memory::MemoryImageSource;
pub use remote::RemoteImageSource;

use crate::bitmap::Image;
use crate::loader::ImageView;

/// Called once per load with the loaded image or the fallback
pub type Callback = Box<dyn FnOnce(Option<Image>) + Send + 'static>;

/// Something that can put an image into an image view
pub trait ImageSource: Send + Sync {
    /// Load the image into `view` and report the outcome through `callback`
    fn load(&self, view: &ImageView, callback: Callback);

    /// Cancel a load previously started on `view`
    ///
    /// Sources that load synchronously have nothing to cancel.
    fn cancel_load(&self, _view: &ImageView) {}
}
