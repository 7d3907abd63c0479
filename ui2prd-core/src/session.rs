//! Editing session
//!
//! One screenshot, the items extracted from it, and the status shown to the
//! user. Analysis completions are tagged with the generation they were
//! started in; anything that resets the session bumps the generation so a
//! late result can never overwrite newer state.

use std::fmt;
use thiserror::Error;

use crate::ai::{AiError, AnalysisJob, Analyzer};
use crate::ai::background::AnalysisResult;
use crate::clipboard::ClipboardError;
use crate::image::{ImageError, ImagePayload};
use crate::store::{ItemStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A dismissible status message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// No usable API key; the user should supply one
    CredentialRequired,
    /// The service rejected the API key
    InvalidCredential(String),
    AnalysisFailed(String),
    ImageRejected(String),
    ClipboardFailed(String),
    ReorderRejected(String),
    ExportFailed(String),
    KeyNotSaved(String),
    Info(String),
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::CredentialRequired
            | Notice::InvalidCredential(_)
            | Notice::AnalysisFailed(_)
            | Notice::ImageRejected(_)
            | Notice::ReorderRejected(_)
            | Notice::ExportFailed(_)
            | Notice::KeyNotSaved(_) => Severity::Error,
            Notice::ClipboardFailed(_) => Severity::Warning,
            Notice::Info(_) => Severity::Info,
        }
    }

    /// True when the user should be asked for an API key
    pub fn wants_credential(&self) -> bool {
        matches!(
            self,
            Notice::CredentialRequired | Notice::InvalidCredential(_)
        )
    }

    pub fn message(&self) -> String {
        match self {
            Notice::CredentialRequired => "An API key is required. Please enter one.".to_string(),
            Notice::InvalidCredential(_) => {
                "The API key was rejected. Please enter a valid key.".to_string()
            }
            Notice::AnalysisFailed(reason) => format!(
                "Analysis failed, please retry or check your connection ({})",
                reason
            ),
            Notice::ImageRejected(reason) => format!("Image not accepted: {}", reason),
            Notice::ClipboardFailed(reason) => format!("Could not copy to clipboard: {}", reason),
            Notice::ReorderRejected(reason) => format!("Reorder rejected: {}", reason),
            Notice::ExportFailed(reason) => format!("Export failed: {}", reason),
            Notice::KeyNotSaved(reason) => format!("Could not save the API key: {}", reason),
            Notice::Info(message) => message.clone(),
        }
    }

    /// Maps a failed analysis to the notice shown for it
    pub fn from_ai_error(error: &AiError) -> Self {
        match error {
            AiError::MissingCredential => Notice::CredentialRequired,
            AiError::InvalidCredential(body) => Notice::InvalidCredential(body.clone()),
            other => Notice::AnalysisFailed(other.to_string()),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Why an analysis could not be started
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginError {
    #[error("No image loaded")]
    NoImage,

    #[error("An analysis is already running")]
    Busy,

    #[error("API key missing")]
    MissingCredential,
}

/// Everything needed to run one analysis outside the session
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub generation: u64,
    pub image: ImagePayload,
    pub api_key: String,
}

/// What happened to a finished analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Items were installed
    Applied(usize),
    /// The analysis failed; image and items were kept
    Failed,
    /// The session moved on since the analysis started; result discarded
    Stale,
}

#[derive(Debug, Default)]
pub struct Session {
    image: Option<ImagePayload>,
    store: ItemStore,
    busy: bool,
    notice: Option<Notice>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ItemStore {
        &mut self.store
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Resets to an empty session and invalidates any running analysis
    pub fn clear(&mut self) {
        self.generation += 1;
        self.busy = false;
        self.image = None;
        self.notice = None;
        self.store.clear();
        log::debug!("Session cleared (generation {})", self.generation);
    }

    /// Installs a new screenshot; previous items are discarded
    pub fn load_image(&mut self, image: ImagePayload) {
        self.clear();
        log::info!("Loaded {} screenshot ({} bytes)", image.format(), image.len());
        self.image = Some(image);
    }

    /// Records a screenshot that failed validation; current state is kept
    pub fn reject_image(&mut self, error: &ImageError) {
        log::warn!("Rejected image: {}", error);
        self.notice = Some(Notice::ImageRejected(error.to_string()));
    }

    pub fn report_clipboard_error(&mut self, error: &ClipboardError) {
        log::warn!("Clipboard failure: {}", error);
        self.notice = Some(Notice::ClipboardFailed(error.to_string()));
    }

    pub fn report_store_error(&mut self, error: &StoreError) {
        log::warn!("Store rejected an edit: {}", error);
        self.notice = Some(Notice::ReorderRejected(error.to_string()));
    }

    /// Marks the session busy and hands out what the analysis needs
    ///
    /// A blank key raises the credential notice without starting anything.
    pub fn begin_analysis(
        &mut self,
        api_key: Option<String>,
    ) -> Result<AnalysisRequest, BeginError> {
        if self.image.is_none() {
            return Err(BeginError::NoImage);
        }
        if self.busy {
            return Err(BeginError::Busy);
        }

        let Some(api_key) = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
        else {
            self.notice = Some(Notice::CredentialRequired);
            return Err(BeginError::MissingCredential);
        };

        let image = self.image.clone().ok_or(BeginError::NoImage)?;
        self.busy = true;
        self.notice = None;
        Ok(AnalysisRequest {
            generation: self.generation,
            image,
            api_key,
        })
    }

    /// Starts the analysis on a worker thread
    pub fn start_analysis(
        &mut self,
        analyzer: &Analyzer,
        api_key: Option<String>,
    ) -> Result<AnalysisJob, BeginError> {
        let request = self.begin_analysis(api_key)?;
        Ok(AnalysisJob::spawn(
            analyzer.clone(),
            request.image,
            Some(request.api_key),
            request.generation,
        ))
    }

    /// Applies a finished analysis if it still belongs to this session
    pub fn finish_analysis(&mut self, generation: u64, result: AnalysisResult) -> Completion {
        if generation != self.generation {
            log::warn!(
                "Discarding analysis result from generation {} (current {})",
                generation,
                self.generation
            );
            return Completion::Stale;
        }

        self.busy = false;
        match result {
            Ok(items) => {
                let count = items.len();
                self.store.replace_all(items);
                Completion::Applied(count)
            }
            Err(e) => {
                self.notice = Some(Notice::from_ai_error(&e));
                Completion::Failed
            }
        }
    }
}
