//! SnapCheck application controller.
//!
//! Holds the whole session state in one struct and changes it only through
//! [`Message`]s:
//! - Input: pasted link text and the load policy that interprets it
//! - Review: the image being shown and the labels picked for it
//! - Store: every committed record, exported to CSV on request
//!
//! Image loading and downloads go through the [`ImageLoader`] and
//! [`Downloader`] collaborators, so every transition can be driven in tests
//! without a browser.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::AppConfig;
use crate::download::Downloader;
use crate::error::SnapCheckError;
use crate::format::{CSV_MIME, CsvExporter, ExportOptions, export_filename_now};
use crate::input::{LoadPolicy, parse_references};
use crate::loader::{ImageLoader, LoadEvent, LoadOutcome, LoadSlot, LoadTracker};
use crate::message::{LabelTarget, Message};
use crate::model::{Label, LabelSet, RecordId};
use crate::store::RecordStore;

// ============================================================================
// View State
// ============================================================================

/// Display state of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ImageStatus {
    /// Waiting for the loader
    Loading,
    /// Loaded; safe to show
    Loaded {
        /// Natural width in pixels
        width: u32,
        /// Natural height in pixels
        height: u32,
    },
    /// The loader gave up on this link
    Failed {
        /// Operator-facing description
        message: String,
    },
}

impl ImageStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ImageStatus::Loaded { .. })
    }

    fn from_outcome(reference: &str, outcome: LoadOutcome) -> Self {
        match outcome {
            LoadOutcome::Loaded { width, height } => ImageStatus::Loaded { width, height },
            LoadOutcome::Failed(reason) => {
                log::warn!("Image failed to load: {} ({})", reference, reason);
                ImageStatus::Failed {
                    message: SnapCheckError::image_load_failed(reference).to_string(),
                }
            }
        }
    }
}

/// The image under review in single-image mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentImage {
    pub reference: String,
    pub status: ImageStatus,
}

// ============================================================================
// Snapshot (read-only view for hosts)
// ============================================================================

/// One record as seen by a renderer.
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub id: RecordId,
    pub reference: String,
    pub labels: Vec<&'static str>,
    pub status: Option<ImageStatus>,
}

/// Everything a renderer needs to draw the session.
#[derive(Debug, Clone, Serialize)]
pub struct AppSnapshot {
    pub load_policy: LoadPolicy,
    pub input: String,
    pub current: Option<CurrentImage>,
    pub selection: Vec<&'static str>,
    pub records: Vec<RecordView>,
    pub error: Option<String>,
    pub last_export: Option<String>,
}

// ============================================================================
// Application
// ============================================================================

/// The SnapCheck controller.
pub struct SnapCheckApp {
    config: AppConfig,
    store: RecordStore,
    tracker: LoadTracker,
    loader: Box<dyn ImageLoader>,
    downloader: Box<dyn Downloader>,

    /// Raw text of the link input
    input: String,
    /// Image being reviewed (single-image mode)
    current: Option<CurrentImage>,
    /// Labels picked for the current image, committed on `Next`
    selection: LabelSet,
    /// Per-record load state (batch mode)
    record_status: HashMap<RecordId, ImageStatus>,

    /// Last blocking error, shown until dismissed
    error: Option<SnapCheckError>,
    /// Filename of the last successful export
    last_export: Option<String>,
}

impl SnapCheckApp {
    pub fn new(
        config: AppConfig,
        loader: Box<dyn ImageLoader>,
        downloader: Box<dyn Downloader>,
    ) -> Self {
        log::info!(
            "SnapCheck started ({} mode, {:?} label order)",
            config.load_policy.name(),
            config.label_order
        );
        Self {
            config,
            store: RecordStore::new(),
            tracker: LoadTracker::new(),
            loader,
            downloader,
            input: String::new(),
            current: None,
            selection: LabelSet::new(),
            record_status: HashMap::new(),
            error: None,
            last_export: None,
        }
    }

    /// Apply one message. Errors are recorded for display, never returned.
    pub fn update(&mut self, message: Message) {
        match message {
            Message::InputChanged(text) => {
                self.input = text;
            }
            Message::LoadRequested => {
                if let Err(e) = self.load_input() {
                    self.report(e);
                }
            }
            Message::LoadFinished(event) => self.apply_load_event(event),
            Message::LabelToggled(target, label) => self.toggle_label(target, label),
            Message::Next => {
                if let Err(e) = self.commit_current() {
                    self.report(e);
                }
            }
            Message::ExportRequested => {
                if let Err(e) = self.export() {
                    self.report(e);
                }
            }
            Message::DismissError => {
                self.error = None;
            }
        }
    }

    /// Deliver completed loads. Call this from the host's event loop.
    ///
    /// Returns `true` if any outcome was received.
    pub fn tick(&mut self) -> bool {
        let events = self.loader.poll();
        let received = !events.is_empty();
        for event in events {
            self.update(Message::LoadFinished(event));
        }
        received
    }

    fn report(&mut self, error: SnapCheckError) {
        log::warn!("{}", error);
        self.error = Some(error);
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    fn load_input(&mut self) -> Result<(), SnapCheckError> {
        let references = parse_references(&self.input)?;

        match self.config.load_policy {
            LoadPolicy::AppendOne => {
                let mut references = references.into_iter();
                let Some(reference) = references.next() else {
                    return Err(SnapCheckError::EmptyInput);
                };
                // Remaining links wait in the input for the next round
                let queued: Vec<String> = references.collect();
                if !queued.is_empty() {
                    log::info!("{} more link(s) queued after {}", queued.len(), reference);
                }

                if let Some(previous) = self.tracker.abandon(LoadSlot::Current) {
                    self.loader.cancel(previous);
                }
                let token = self.tracker.issue(LoadSlot::Current, reference.clone());
                self.loader.request(token, &reference);
                self.current = Some(CurrentImage {
                    reference,
                    status: ImageStatus::Loading,
                });
            }
            LoadPolicy::ReplaceAll => {
                for token in self.tracker.abandon_all() {
                    self.loader.cancel(token);
                }
                self.record_status.clear();
                let ids = self.store.replace(references.iter().cloned());
                log::info!("Loaded batch of {} link(s)", ids.len());

                for (id, reference) in ids.into_iter().zip(references) {
                    let token = self.tracker.issue(LoadSlot::Record(id), reference.clone());
                    self.loader.request(token, &reference);
                    self.record_status.insert(id, ImageStatus::Loading);
                }
            }
        }
        Ok(())
    }

    fn apply_load_event(&mut self, event: LoadEvent) {
        let Some(pending) = self.tracker.resolve(event.token) else {
            log::debug!("Discarding stale load outcome {:?}", event.token);
            return;
        };
        let status = ImageStatus::from_outcome(&pending.reference, event.outcome);

        match pending.slot {
            LoadSlot::Current => match self.current.as_mut() {
                Some(current) if current.reference == pending.reference => {
                    log::debug!("Current image {}: {:?}", current.reference, status);
                    current.status = status;
                }
                _ => log::debug!("Current image changed, ignoring {}", pending.reference),
            },
            LoadSlot::Record(id) => {
                if self.store.get(id).is_some() {
                    self.record_status.insert(id, status);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------------

    fn toggle_label(&mut self, target: LabelTarget, label: Label) {
        match target {
            LabelTarget::Current => {
                let selected = self.selection.toggle(label);
                log::debug!(
                    "Selection: '{}' {}",
                    label,
                    if selected { "on" } else { "off" }
                );
            }
            LabelTarget::Record(id) => {
                self.store.toggle_label(id, label);
            }
        }
    }

    /// Append the loaded image with its selected labels and reset the form.
    fn commit_current(&mut self) -> Result<(), SnapCheckError> {
        if self.config.load_policy == LoadPolicy::ReplaceAll {
            log::debug!("Next has nothing to commit in batch mode");
            return Ok(());
        }

        let reference = match &self.current {
            Some(current) if current.status.is_loaded() => current.reference.clone(),
            _ => return Err(SnapCheckError::NoImageLoaded),
        };

        let labels = std::mem::take(&mut self.selection);
        let id = self.store.append_with_labels(reference.clone(), labels);
        log::info!("Committed record {}: {}", id, reference);

        self.current = None;
        if let Some(token) = self.tracker.abandon(LoadSlot::Current) {
            self.loader.cancel(token);
        }
        self.error = None;
        self.input = self.queued_input(&reference);
        Ok(())
    }

    /// Input text with the committed link removed, keeping any queued links.
    fn queued_input(&self, committed: &str) -> String {
        let mut lines = self
            .input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .peekable();
        if lines.peek() == Some(&committed) {
            lines.next();
        }
        lines.collect::<Vec<_>>().join("\n")
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    fn export(&mut self) -> Result<(), SnapCheckError> {
        let options = ExportOptions::new().label_order(self.config.label_order);
        let csv = CsvExporter::export(self.store.all(), &options)?;
        let filename = export_filename_now(&self.config.export_context);
        self.downloader
            .download(&filename, CSV_MIME, csv.as_bytes())?;
        self.last_export = Some(filename);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn current(&self) -> Option<&CurrentImage> {
        self.current.as_ref()
    }

    pub fn selection(&self) -> &LabelSet {
        &self.selection
    }

    pub fn record_status(&self, id: RecordId) -> Option<&ImageStatus> {
        self.record_status.get(&id)
    }

    pub fn error(&self) -> Option<&SnapCheckError> {
        self.error.as_ref()
    }

    pub fn last_export(&self) -> Option<&str> {
        self.last_export.as_deref()
    }

    /// Whether any load request is still waiting for its outcome.
    pub fn is_loading(&self) -> bool {
        self.tracker.pending_count() > 0
    }

    /// Build a serializable view of the session.
    pub fn snapshot(&self) -> AppSnapshot {
        let ids = |labels: &LabelSet| -> Vec<&'static str> {
            labels.in_vocabulary_order().map(|l| l.id()).collect()
        };
        AppSnapshot {
            load_policy: self.config.load_policy,
            input: self.input.clone(),
            current: self.current.clone(),
            selection: ids(&self.selection),
            records: self
                .store
                .all()
                .iter()
                .map(|r| RecordView {
                    id: r.id(),
                    reference: r.reference().to_string(),
                    labels: ids(r.labels()),
                    status: self.record_status.get(&r.id()).cloned(),
                })
                .collect(),
            error: self.error.as_ref().map(ToString::to_string),
            last_export: self.last_export.clone(),
        }
    }
}
