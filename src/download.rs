//! Delivery of exported files.
//!
//! In the browser the bytes become a `Blob` behind a hidden `<a download>`
//! link that is clicked once. Native builds write the file into a folder.

use crate::error::SnapCheckError;

/// Hands a finished file over to the user.
pub trait Downloader {
    fn download(&mut self, filename: &str, mime: &str, bytes: &[u8]) -> Result<(), SnapCheckError>;
}

/// Writes exports into a folder on disk, never replacing an existing file.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FolderDownloader {
    folder: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FolderDownloader {
    pub fn new(folder: impl Into<std::path::PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &std::path::Path {
        &self.folder
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Downloader for FolderDownloader {
    fn download(&mut self, filename: &str, mime: &str, bytes: &[u8]) -> Result<(), SnapCheckError> {
        use std::io::Write;

        if std::path::Path::new(filename).file_name() != Some(std::ffi::OsStr::new(filename)) {
            return Err(SnapCheckError::Download(format!(
                "Not a plain file name: {}",
                filename
            )));
        }

        std::fs::create_dir_all(&self.folder)?;
        let path = self.folder.join(filename);
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(bytes)?;
        log::info!("Saved {} ({} bytes, {}) to {:?}", filename, bytes.len(), mime, path);
        Ok(())
    }
}

/// Triggers a browser download of an in-memory blob.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct BrowserDownloader;

#[cfg(target_arch = "wasm32")]
impl Downloader for BrowserDownloader {
    fn download(&mut self, filename: &str, mime: &str, bytes: &[u8]) -> Result<(), SnapCheckError> {
        use wasm_bindgen::JsCast;
        use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

        let err = |what: &str, e: wasm_bindgen::JsValue| {
            SnapCheckError::Download(format!("{}: {:?}", what, e))
        };

        let window =
            web_sys::window().ok_or_else(|| SnapCheckError::Download("No window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| SnapCheckError::Download("No document".to_string()))?;
        let body = document
            .body()
            .ok_or_else(|| SnapCheckError::Download("No document body".to_string()))?;

        let parts = js_sys::Array::new();
        parts.push(&js_sys::Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(mime);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| err("Failed to create blob", e))?;
        let url = Url::create_object_url_with_blob(&blob)
            .map_err(|e| err("Failed to create object URL", e))?;

        let anchor: HtmlAnchorElement = document
            .create_element("a")
            .map_err(|e| err("Failed to create link", e))?
            .dyn_into()
            .map_err(|_| SnapCheckError::Download("Not an anchor element".to_string()))?;
        anchor.set_href(&url);
        anchor.set_download(filename);
        anchor
            .style()
            .set_property("visibility", "hidden")
            .map_err(|e| err("Failed to hide link", e))?;

        body.append_child(&anchor)
            .map_err(|e| err("Failed to attach link", e))?;
        anchor.click();
        body.remove_child(&anchor)
            .map_err(|e| err("Failed to detach link", e))?;
        // Object URL left alive: the download may still be reading the blob

        log::info!("Triggered download of {} ({} bytes)", filename, bytes.len());
        Ok(())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_folder_downloader_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = FolderDownloader::new(dir.path().join("exports"));

        downloader
            .download("snapcheck_test.csv", "text/csv", b"Link,Clasificaci\xc3\xb3n\n")
            .unwrap();

        let written = std::fs::read_to_string(dir.path().join("exports/snapcheck_test.csv")).unwrap();
        assert_eq!(written, "Link,Clasificación\n");
    }

    #[test]
    fn test_folder_downloader_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = FolderDownloader::new(dir.path());

        downloader.download("same.csv", "text/csv", b"first").unwrap();
        let err = downloader
            .download("same.csv", "text/csv", b"second")
            .unwrap_err();

        assert!(matches!(err, SnapCheckError::Io(ref e) if e.kind() == std::io::ErrorKind::AlreadyExists));
        assert_eq!(std::fs::read(dir.path().join("same.csv")).unwrap(), b"first");
    }

    #[test]
    fn test_folder_downloader_stays_in_folder() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = FolderDownloader::new(dir.path().join("exports"));

        for name in ["../escape.csv", "sub/x.csv", ".."] {
            let err = downloader.download(name, "text/csv", b"x").unwrap_err();
            assert!(matches!(err, SnapCheckError::Download(_)), "accepted {}", name);
        }
        assert!(!dir.path().join("escape.csv").exists());
    }
}
