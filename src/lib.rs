/// Image slideshow library
///
/// - `source` - image sources (remote, file, memory) behind `ImageSource`
/// - `loader` - the image loading client, its transports and image views
/// - `slideshow` - page model with preloading
/// - `config` - JSON configuration
/// - `import` - folder import

pub mod bitmap;
pub mod config;
pub mod error;
pub mod import;
pub mod loader;
pub mod slideshow;
pub mod source;

pub use bitmap::Image;
pub use error::{ConfigError, LoadError};
pub use loader::{ImageLoader, ImageRequest, ImageView};
pub use slideshow::{Preload, Slideshow, SlideshowOptions};
pub use source::{Callback, FileImageSource, ImageSource, MemoryImageSource, RemoteImageSource};
