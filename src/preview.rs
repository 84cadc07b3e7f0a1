//! Attachment preview lifecycle
//!
//! Inline previews own their bytes. The [`PreviewSlot`] holds at most
//! one; opening another or closing it drops the previous content right
//! away. Non-inline outcomes hand the bytes to the caller and keep
//! nothing.

use crate::attachment::{PreviewCategory, PreviewMode};
use bytes::Bytes;
use tracing::debug;

/// What the user asked to do with an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentAction {
    View,
    Download,
}

/// Downloaded attachment content.
#[derive(Debug, Clone)]
pub struct AttachmentBlob {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl AttachmentBlob {
    #[must_use]
    pub fn category(&self) -> PreviewCategory {
        PreviewCategory::classify(&self.content_type, &self.filename)
    }
}

/// Content of an inline preview.
#[derive(Debug, Clone)]
pub enum PreviewContent {
    Image(Bytes),
    Audio(Bytes),
    Video(Bytes),
    Text(String),
}

/// An open inline preview.
#[derive(Debug, Clone)]
pub struct Preview {
    pub title: String,
    pub category: PreviewCategory,
    pub content: PreviewContent,
}

/// Result of acting on an attachment.
#[derive(Debug, Clone)]
pub enum AttachmentOutcome {
    /// The preview slot now shows the attachment.
    Previewing,
    /// Open in an external viewer.
    OpenExternally(AttachmentBlob),
    /// Save to disk.
    Save(AttachmentBlob),
}

/// Holds the single active inline preview.
#[derive(Debug, Default)]
pub struct PreviewSlot {
    current: Option<Preview>,
}

impl PreviewSlot {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    #[must_use]
    pub const fn current(&self) -> Option<&Preview> {
        self.current.as_ref()
    }

    /// Route `blob` by its category and the requested action.
    ///
    /// Downloads and non-previewable files are always saved. Inline
    /// categories replace the current preview.
    pub fn show(&mut self, blob: AttachmentBlob, action: AttachmentAction) -> AttachmentOutcome {
        let category = blob.category();
        if action == AttachmentAction::Download {
            return AttachmentOutcome::Save(blob);
        }

        let content = match category.mode() {
            PreviewMode::Download => return AttachmentOutcome::Save(blob),
            PreviewMode::NewTab => return AttachmentOutcome::OpenExternally(blob),
            PreviewMode::Image => PreviewContent::Image(blob.bytes),
            PreviewMode::Audio => PreviewContent::Audio(blob.bytes),
            PreviewMode::Video => PreviewContent::Video(blob.bytes),
            PreviewMode::Text => {
                PreviewContent::Text(String::from_utf8_lossy(&blob.bytes).into_owned())
            }
        };

        debug!("Previewing {} as {}", blob.filename, category);
        self.current = Some(Preview {
            title: blob.filename,
            category,
            content,
        });
        AttachmentOutcome::Previewing
    }

    /// Drop the active preview, if any.
    pub fn close(&mut self) {
        self.current = None;
    }
}
