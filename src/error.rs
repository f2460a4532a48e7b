//! Error types for SnapCheck operations.

use thiserror::Error;

/// Errors surfaced to the operator.
///
/// None of these are fatal: each one is recovered from by a later action
/// (entering text again, picking another link, adding records before export).
#[derive(Error, Debug)]
pub enum SnapCheckError {
    /// Load was requested but the input held no non-blank line
    #[error("No se proporcionó ningún link")]
    EmptyInput,

    /// The image loader reported failure for a reference
    #[error("Error al cargar la imagen: {reference}")]
    ImageLoadFailed {
        /// The link that failed to load
        reference: String,
    },

    /// Export was requested with no records in the store
    #[error("No hay datos para exportar")]
    EmptyExport,

    /// Next was requested before any image finished loading
    #[error("Por favor, carga una imagen primero")]
    NoImageLoaded,

    /// A label identifier outside the vocabulary
    #[error("Unknown label: {0}")]
    UnknownLabel(String),

    /// I/O error while writing an export
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The download collaborator could not deliver the file
    #[error("Download failed: {0}")]
    Download(String),
}

impl SnapCheckError {
    /// Create an image load failure for a reference.
    pub fn image_load_failed(reference: impl Into<String>) -> Self {
        Self::ImageLoadFailed {
            reference: reference.into(),
        }
    }
}
