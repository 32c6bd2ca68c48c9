// file: src/pipeline/selection.rs
// description: single-file selection with format and size checks
// reference: accepts a candidate before it can enter the pipeline

use crate::models::FileHandle;
use crate::utils::validation::Validator;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Accepted(FileHandle),
    Cleared,
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SelectionController {
    held: Option<FileHandle>,
    max_file_size: u64,
}

impl SelectionController {
    /// `max_file_size` of 0 disables the size check.
    pub fn new(max_file_size: u64) -> Self {
        Self {
            held: None,
            max_file_size,
        }
    }

    pub fn held(&self) -> Option<&FileHandle> {
        self.held.as_ref()
    }

    /// `None` clears a held file, or is rejected when nothing is held.
    /// A rejected candidate is never retained; the previously held file
    /// stays as it was.
    pub fn select_file(&mut self, candidate: Option<FileHandle>) -> SelectionOutcome {
        let Some(candidate) = candidate else {
            return match self.held.take() {
                Some(previous) => {
                    debug!("Cleared selection of {}", previous.name());
                    SelectionOutcome::Cleared
                }
                None => SelectionOutcome::Rejected("no file supplied".to_string()),
            };
        };

        if let Err(e) = Validator::validate_csv_extension(candidate.name()) {
            warn!("Rejected {}: {}", candidate.name(), e);
            return SelectionOutcome::Rejected("wrong format".to_string());
        }

        if Validator::validate_file_size(candidate.size(), self.max_file_size).is_err() {
            warn!(
                "Rejected {}: {} exceeds limit",
                candidate.name(),
                Validator::format_bytes(candidate.size())
            );
            return SelectionOutcome::Rejected("file too large".to_string());
        }

        debug!("Accepted {}", candidate.name());
        self.held = Some(candidate.clone());
        SelectionOutcome::Accepted(candidate)
    }

    /// Drops the held file without producing an outcome, e.g. after a run.
    pub fn reset(&mut self) {
        self.held = None;
    }
}

impl SelectionOutcome {
    pub fn notification(&self) -> Notification {
        match self {
            SelectionOutcome::Accepted(file) => {
                Notification::success(format!("file {} was loaded!", file.display_stem()))
            }
            SelectionOutcome::Cleared => Notification::info("file removed"),
            SelectionOutcome::Rejected(reason) if reason == "no file supplied" => {
                Notification::warning("Please select a file first.")
            }
            SelectionOutcome::Rejected(reason) => {
                Notification::error(format!("File rejected: {}", reason))
            }
        }
    }
}
