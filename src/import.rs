use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::bitmap::Image;
use crate::source::FileImageSource;

/// File extensions picked up by a folder import
const IMAGE_EXTENSIONS: [&str; 9] = [
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "ico",
];

/// Collect every image file below `folder`, sorted by path
pub fn scan_folder(folder: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_image(path))
        .collect();

    paths.sort();
    paths
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Scan `folder` off the UI thread and turn the hits into sources
pub async fn import_folder(folder: PathBuf, placeholder: Option<Image>) -> Vec<FileImageSource> {
    info!(folder = %folder.display(), "scanning folder");

    let paths = scanned_or_empty(tokio::task::spawn_blocking(move || scan_folder(&folder)).await);

    let sources: Vec<FileImageSource> = paths
        .into_iter()
        .filter_map(|path| FileImageSource::new(path, placeholder.clone()))
        .collect();

    info!(count = sources.len(), "folder import complete");
    sources
}

/// A scan that panicked imports nothing
fn scanned_or_empty(scan: Result<Vec<PathBuf>, tokio::task::JoinError>) -> Vec<PathBuf> {
    match scan {
        Ok(paths) => paths,
        Err(e) => {
            warn!(error = %e, "folder scan failed");
            Vec::new()
        }
    }
}
