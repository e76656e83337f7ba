//! Document tampering and duplication heuristics.
//!
//! Each signal contributes a weighted amount to a bounded [0,100] risk score;
//! the signals are independent so a reviewer can audit exactly which ones
//! fired. A byte-identical resubmission short-circuits everything else and
//! saturates the score.

pub mod barcode;
mod signals;
pub mod similarity;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

pub use barcode::{validate_barcode, BarcodeIssue, BarcodeValidation};
pub use similarity::{is_semantic_duplicate, text_similarity};

/// Score a document counts as tampered above.
const TAMPER_THRESHOLD: i32 = 50;
/// Contribution of a barcode/extracted amount disagreement.
const BARCODE_MISMATCH_WEIGHT: i32 = 25;

/// Declared file type of the submitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Image,
    Pdf,
    Other,
}

impl DocumentKind {
    pub fn from_declared(declared: &str) -> Self {
        match declared.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" => Self::Image,
            "pdf" => Self::Pdf,
            _ => Self::Other,
        }
    }
}

/// Named tampering signals. `label()` yields the stable snake_case name the
/// review queue displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "flag", content = "detail")]
pub enum DocumentFlag {
    DuplicateFile,
    MissingCaptureMetadata,
    EditingSoftware(String),
    ScreenshotIndicator,
    ModifiedAfterCreation,
    UnreadableMetadata,
    MissingAuthorMetadata,
    EditorAuthored(String),
    FileTooSmall,
    FileTooLarge,
    BarcodeAmountMismatch {
        barcode_cents: i64,
        extracted_cents: i64,
    },
}

impl DocumentFlag {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentFlag::DuplicateFile => "duplicate_file",
            DocumentFlag::MissingCaptureMetadata => "missing_capture_metadata",
            DocumentFlag::EditingSoftware(_) => "editing_software",
            DocumentFlag::ScreenshotIndicator => "screenshot_indicator",
            DocumentFlag::ModifiedAfterCreation => "modified_after_creation",
            DocumentFlag::UnreadableMetadata => "unreadable_metadata",
            DocumentFlag::MissingAuthorMetadata => "missing_author_metadata",
            DocumentFlag::EditorAuthored(_) => "editor_authored",
            DocumentFlag::FileTooSmall => "file_too_small",
            DocumentFlag::FileTooLarge => "file_too_large",
            DocumentFlag::BarcodeAmountMismatch { .. } => "barcode_amount_mismatch",
        }
    }
}

/// Risk assessment for one submitted document. `score` is clamped to
/// [0,100]; `tampered` is `score > 50`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub score: u8,
    pub flags: Vec<DocumentFlag>,
    pub tampered: bool,
}

impl DocumentAnalysis {
    fn from_raw(raw_score: i32, flags: Vec<DocumentFlag>) -> Self {
        let score = raw_score.clamp(0, 100) as u8;
        Self {
            score,
            flags,
            tampered: raw_score.clamp(0, 100) > TAMPER_THRESHOLD,
        }
    }

    /// Fold a barcode validation into the assessment: a value mismatch
    /// raises the score and records the discrepancy.
    pub fn absorb_barcode(&mut self, validation: &BarcodeValidation) {
        if let BarcodeValidation::Invalid {
            issue:
                BarcodeIssue::ValueMismatch {
                    barcode_cents,
                    extracted_cents,
                },
        } = validation
        {
            self.flags.push(DocumentFlag::BarcodeAmountMismatch {
                barcode_cents: *barcode_cents,
                extracted_cents: *extracted_cents,
            });
            let raised = i32::from(self.score) + BARCODE_MISMATCH_WEIGHT;
            self.score = raised.clamp(0, 100) as u8;
            self.tampered = i32::from(self.score) > TAMPER_THRESHOLD;
        }
    }
}

/// SHA-256 content hash in lowercase hex, the identity used for duplicate
/// detection.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Score a document's tampering risk from its bytes and submission context.
pub fn analyze(
    bytes: &[u8],
    declared_type: &str,
    hash: &str,
    known_hashes: &HashSet<String>,
) -> DocumentAnalysis {
    if known_hashes.contains(hash) {
        // A byte-identical resubmission is maximal risk regardless of what
        // the bytes themselves look like.
        debug!(hash, "duplicate document hash");
        return DocumentAnalysis {
            score: 100,
            flags: vec![DocumentFlag::DuplicateFile],
            tampered: true,
        };
    }

    let kind = DocumentKind::from_declared(declared_type);
    let mut raw_score: i32 = 0;
    let mut flags: Vec<DocumentFlag> = Vec::new();

    match kind {
        DocumentKind::Image => signals::inspect_image(bytes, &mut raw_score, &mut flags),
        DocumentKind::Pdf => signals::inspect_pdf(bytes, &mut raw_score, &mut flags),
        DocumentKind::Other => {}
    }

    if let Some(size_flag) = signals::size_anomaly(bytes.len(), kind) {
        flags.push(size_flag);
        raw_score += 10;
    }

    DocumentAnalysis::from_raw(raw_score, flags)
}
