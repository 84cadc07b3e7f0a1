//! Attachment preview categories
//!
//! Attachments are classified by content type and filename extension
//! into a fixed set of categories. The category decides whether the
//! file can be previewed and how.

use crate::model::Attachment;
use std::fmt;

/// How a category is presented when the user asks to view it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewMode {
    /// Rendered inline as an image.
    Image,
    /// Played inline.
    Audio,
    /// Played inline.
    Video,
    /// Decoded and shown inline as text.
    Text,
    /// Handed off to an external viewer.
    NewTab,
    /// Never previewed, always saved.
    Download,
}

/// The preview category of an attachment.
///
/// Rules are checked in declaration order and the first match wins,
/// so e.g. an Office document whose content type mentions both
/// `document` and `presentation` is a [`PreviewCategory::Document`].
///
/// # Examples
///
/// ```
/// use tempmail_proxy::{PreviewCategory, PreviewMode};
///
/// let category = PreviewCategory::classify("image/png", "a.png");
/// assert_eq!(category, PreviewCategory::Image);
/// assert!(category.is_previewable());
/// assert_eq!(category.mode(), PreviewMode::Image);
///
/// let category = PreviewCategory::classify("application/zip", "a.zip");
/// assert_eq!(category, PreviewCategory::Archive);
/// assert!(!category.is_previewable());
/// assert_eq!(category.mode(), PreviewMode::Download);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewCategory {
    Image,
    Pdf,
    Csv,
    Spreadsheet,
    Document,
    Presentation,
    Archive,
    Audio,
    Video,
    Html,
    Code,
    Text,
    /// Anything not matched by another rule.
    File,
}

const IMAGE_EXT: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"];
const SPREADSHEET_EXT: &[&str] = &["xls", "xlsx", "csv", "numbers"];
const DOCUMENT_EXT: &[&str] = &["doc", "docx", "odt", "rtf"];
const PRESENTATION_EXT: &[&str] = &["ppt", "pptx", "key", "odp"];
const ARCHIVE_EXT: &[&str] = &["zip", "rar", "tar", "gz", "7z", "bz2"];
const AUDIO_EXT: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "aac"];
const VIDEO_EXT: &[&str] = &["mp4", "avi", "mov", "wmv", "mkv", "webm", "flv"];
const CODE_EXT: &[&str] = &[
    "html", "css", "js", "jsx", "ts", "tsx", "php", "py", "json", "xml", "yaml", "yml", "md",
];
const TEXT_EXT: &[&str] = &["txt", "log", "text"];

impl PreviewCategory {
    /// Classify by content type and filename.
    #[must_use]
    pub fn classify(content_type: &str, filename: &str) -> Self {
        let ct = content_type.to_ascii_lowercase();
        let name = filename.to_lowercase();
        // No dot means the whole name is treated as the extension.
        let ext = name.rsplit('.').next().unwrap_or_default();
        let any = |types: &[&str]| types.iter().any(|t| ct.contains(t));

        if ct.starts_with("image/") || IMAGE_EXT.contains(&ext) {
            Self::Image
        } else if ct == "application/pdf" || ext == "pdf" {
            Self::Pdf
        } else if any(&["spreadsheet", "excel"]) || SPREADSHEET_EXT.contains(&ext) {
            if ext == "csv" { Self::Csv } else { Self::Spreadsheet }
        } else if any(&["word", "document"]) || DOCUMENT_EXT.contains(&ext) {
            Self::Document
        } else if any(&["presentation"]) || PRESENTATION_EXT.contains(&ext) {
            Self::Presentation
        } else if any(&["zip", "rar", "tar", "gzip"]) || ARCHIVE_EXT.contains(&ext) {
            Self::Archive
        } else if ct.starts_with("audio/") || AUDIO_EXT.contains(&ext) {
            Self::Audio
        } else if ct.starts_with("video/") || VIDEO_EXT.contains(&ext) {
            Self::Video
        } else if ct.starts_with("text/") || CODE_EXT.contains(&ext) {
            if ext == "html" || ext == "htm" { Self::Html } else { Self::Code }
        } else if TEXT_EXT.contains(&ext) {
            Self::Text
        } else {
            Self::File
        }
    }

    /// Classify an attachment's metadata.
    #[must_use]
    pub fn of(attachment: &Attachment) -> Self {
        Self::classify(&attachment.content_type, &attachment.filename)
    }

    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Pdf => "PDF",
            Self::Csv => "CSV",
            Self::Spreadsheet => "Spreadsheet",
            Self::Document => "Document",
            Self::Presentation => "Presentation",
            Self::Archive => "Archive",
            Self::Audio => "Audio",
            Self::Video => "Video",
            Self::Html => "HTML",
            Self::Code => "Code",
            Self::Text => "Text",
            Self::File => "File",
        }
    }

    #[must_use]
    pub const fn mode(self) -> PreviewMode {
        match self {
            Self::Image => PreviewMode::Image,
            Self::Pdf => PreviewMode::NewTab,
            Self::Audio => PreviewMode::Audio,
            Self::Video => PreviewMode::Video,
            Self::Csv | Self::Html | Self::Code | Self::Text => PreviewMode::Text,
            Self::Spreadsheet
            | Self::Document
            | Self::Presentation
            | Self::Archive
            | Self::File => PreviewMode::Download,
        }
    }

    #[must_use]
    pub const fn is_previewable(self) -> bool {
        !matches!(self.mode(), PreviewMode::Download)
    }
}

impl fmt::Display for PreviewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Human-readable size, e.g. `0 B`, `512 B`, `1.5 KB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
