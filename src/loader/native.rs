//! Background image loading (native only)
//!
//! Fetches `http(s)` links with a blocking HTTP client, reads everything else
//! from the filesystem (with or without a `file://` prefix), and reads the
//! image header to confirm the bytes are an image. Every request runs on its
//! own worker thread, so a dead link never holds up the request that replaced
//! it. Results come back over a channel that the controller drains with
//! [`ImageLoader::poll`].

use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::{ImageLoader, LoadEvent, LoadToken};

/// Timeout for fetching a remote image.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Largest image body accepted, remote or local.
pub const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

/// Tokens whose outcome is still wanted.
type LiveTokens = Arc<Mutex<HashSet<LoadToken>>>;

/// Fetches and checks images on worker threads.
pub struct NativeImageLoader {
    client: Option<reqwest::blocking::Client>,
    live: LiveTokens,
    result_tx: Sender<LoadEvent>,
    result_rx: Receiver<LoadEvent>,
}

impl NativeImageLoader {
    /// Build the loader and its HTTP client.
    pub fn spawn() -> Result<Self, String> {
        let client = match reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
        {
            Ok(c) => Some(c),
            Err(e) => {
                log::warn!("HTTP client unavailable, only local files will load: {}", e);
                None
            }
        };
        let (result_tx, result_rx) = mpsc::channel::<LoadEvent>();

        Ok(Self {
            client,
            live: Arc::new(Mutex::new(HashSet::new())),
            result_tx,
            result_rx,
        })
    }

    fn worker(
        client: Option<reqwest::blocking::Client>,
        live: LiveTokens,
        result_tx: Sender<LoadEvent>,
        token: LoadToken,
        reference: String,
    ) {
        if !is_live(&live, token) {
            log::debug!("Skipping cancelled load {:?} for {}", token, reference);
            return;
        }

        let event = match fetch(client.as_ref(), &reference).and_then(|b| decode(&b)) {
            Ok((width, height)) => {
                log::debug!("Loaded {} ({}x{})", reference, width, height);
                LoadEvent::loaded(token, width, height)
            }
            Err(e) => {
                log::debug!("Failed to load {}: {}", reference, e);
                LoadEvent::failed(token, e)
            }
        };

        // Sending under the lock keeps a concurrent cancel from racing the result
        if let Ok(mut live) = live.lock() {
            if !live.remove(&token) {
                log::debug!("Dropping outcome of cancelled load {:?}", token);
            } else if result_tx.send(event).is_err() {
                log::debug!("Loader dropped before {:?} finished", token);
            }
        }
    }
}

fn is_live(live: &LiveTokens, token: LoadToken) -> bool {
    live.lock().map(|live| live.contains(&token)).unwrap_or(false)
}

/// Read the raw bytes behind a reference.
fn fetch(client: Option<&reqwest::blocking::Client>, reference: &str) -> Result<Vec<u8>, String> {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        let client = client.ok_or_else(|| "HTTP client unavailable".to_string())?;
        let response = client
            .get(reference)
            .send()
            .map_err(|e| format!("Request failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        if let Some(length) = response.content_length() {
            check_size(length)?;
        }
        read_capped(response, MAX_IMAGE_BYTES)
    } else {
        let path = Path::new(reference.strip_prefix("file://").unwrap_or(reference));
        let file = std::fs::File::open(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let length = file
            .metadata()
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?
            .len();
        check_size(length)?;
        read_capped(file, MAX_IMAGE_BYTES)
    }
}

fn check_size(length: u64) -> Result<(), String> {
    if length > MAX_IMAGE_BYTES {
        return Err(format!(
            "Image is {} bytes, limit is {}",
            length, MAX_IMAGE_BYTES
        ));
    }
    Ok(())
}

/// Read at most `limit` bytes, failing if the source holds more.
fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| format!("Failed to read body: {}", e))?;
    if bytes.len() as u64 > limit {
        return Err(format!("Image exceeds {} bytes", limit));
    }
    Ok(bytes)
}

/// Read the image header, returning its size without decoding pixels.
fn decode(bytes: &[u8]) -> Result<(u32, u32), String> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image: {}", e))?
        .into_dimensions()
        .map_err(|e| format!("Not an image: {}", e))
}

impl ImageLoader for NativeImageLoader {
    fn request(&mut self, token: LoadToken, reference: &str) {
        if let Ok(mut live) = self.live.lock() {
            live.insert(token);
        }

        let client = self.client.clone();
        let live = Arc::clone(&self.live);
        let result_tx = self.result_tx.clone();
        let reference = reference.to_string();
        let spawned = thread::Builder::new()
            .name("image-loader".to_string())
            .spawn({
                let reference = reference.clone();
                move || Self::worker(client, live, result_tx, token, reference)
            });

        match spawned {
            Ok(_) => log::debug!("Started load {:?} for {}", token, reference),
            Err(e) => {
                log::error!("Failed to spawn loader thread: {}", e);
                self.cancel(token);
                let _ = self
                    .result_tx
                    .send(LoadEvent::failed(token, format!("Loader unavailable: {}", e)));
            }
        }
    }

    fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        loop {
            match self.result_rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Loader result channel disconnected");
                    break;
                }
            }
        }
        events
    }

    fn cancel(&mut self, token: LoadToken) {
        if let Ok(mut live) = self.live.lock() {
            if live.remove(&token) {
                log::debug!("Cancelled load {:?}", token);
            }
        }
    }
}

impl Drop for NativeImageLoader {
    fn drop(&mut self) {
        // Workers still fetching finish on their own and discard the result
        if let Ok(mut live) = self.live.lock() {
            if !live.is_empty() {
                log::debug!("Abandoning {} in-flight load(s)", live.len());
            }
            live.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Instant;

    use super::*;
    use crate::loader::{LoadOutcome, LoadSlot, LoadTracker};

    fn wait_for_event(loader: &mut NativeImageLoader) -> LoadEvent {
        for _ in 0..500 {
            if let Some(event) = loader.poll().pop() {
                return event;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("loader produced no event");
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> String {
        let path = dir.join(name);
        image::RgbImage::new(width, height).save(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Address of a server that accepts connections and never answers.
    fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming() {
                held.push(stream);
            }
        });
        format!("http://{}/a.png", addr)
    }

    #[test]
    fn test_loads_local_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "pixel.png", 3, 2);

        let mut tracker = LoadTracker::new();
        let mut loader = NativeImageLoader::spawn().unwrap();
        let token = tracker.issue(LoadSlot::Current, path.clone());
        loader.request(token, &format!("file://{}", path));

        let event = wait_for_event(&mut loader);
        assert_eq!(event.token, token);
        assert_eq!(event.outcome, LoadOutcome::Loaded { width: 3, height: 2 });
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");

        let mut loader = NativeImageLoader::spawn().unwrap();
        let token = LoadTracker::new().issue(LoadSlot::Current, "missing");
        loader.request(token, &path.to_string_lossy());

        let event = wait_for_event(&mut loader);
        assert!(matches!(event.outcome, LoadOutcome::Failed(_)));
    }

    #[test]
    fn test_non_image_bytes_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "definitely not a png").unwrap();

        let mut loader = NativeImageLoader::spawn().unwrap();
        let token = LoadTracker::new().issue(LoadSlot::Current, "notes");
        loader.request(token, &path.to_string_lossy());

        let event = wait_for_event(&mut loader);
        assert!(matches!(event.outcome, LoadOutcome::Failed(_)));
    }

    #[test]
    fn test_stalled_link_does_not_delay_its_replacement() {
        let dir = tempfile::tempdir().unwrap();
        let local = write_png(dir.path(), "b.png", 1, 1);

        let mut tracker = LoadTracker::new();
        let mut loader = NativeImageLoader::spawn().unwrap();
        let stalled = tracker.issue(LoadSlot::Current, "a");
        loader.request(stalled, &silent_server());

        let started = Instant::now();
        let superseded = tracker.abandon(LoadSlot::Current).unwrap();
        loader.cancel(superseded);
        let current = tracker.issue(LoadSlot::Current, "b");
        loader.request(current, &local);

        let event = wait_for_event(&mut loader);
        assert_eq!(event.token, current);
        assert_eq!(event.outcome, LoadOutcome::Loaded { width: 1, height: 1 });
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cancelled_load_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_png(dir.path(), "a.png", 1, 1);
        let second = write_png(dir.path(), "b.png", 2, 2);

        let mut tracker = LoadTracker::new();
        let mut loader = NativeImageLoader::spawn().unwrap();
        let a = tracker.issue(LoadSlot::Current, "a");
        loader.request(a, &first);
        loader.cancel(a);
        let b = tracker.issue(LoadSlot::Current, "b");
        loader.request(b, &second);

        let event = wait_for_event(&mut loader);
        assert_eq!(event.token, b);
        thread::sleep(Duration::from_millis(100));
        assert!(loader.poll().is_empty());
    }

    #[test]
    fn test_read_capped() {
        assert_eq!(read_capped(&b"0123"[..], 4).unwrap(), b"0123");
        assert!(read_capped(&b"01234"[..], 4).is_err());
        assert!(check_size(MAX_IMAGE_BYTES).is_ok());
        assert!(check_size(MAX_IMAGE_BYTES + 1).is_err());
    }

    #[test]
    fn test_decode_reports_dimensions() {
        let mut png = Vec::new();
        image::RgbImage::new(7, 5)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(decode(&png).unwrap(), (7, 5));
        assert!(decode(b"GIF").is_err());
    }
}
