//! SnapCheck - Advertising Photo Validation
//!
//! Paste image links, review each image, tag it with defect labels and export
//! the labeled list as CSV. Runs in the browser (WASM) and as a native
//! console session.

pub mod app;
pub mod config;
pub mod download;
pub mod error;
pub mod format;
pub mod input;
pub mod loader;
pub mod message;
pub mod model;
pub mod store;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

pub use app::SnapCheckApp;
pub use error::SnapCheckError;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
