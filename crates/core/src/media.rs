//! Media selection: the images and short videos attached to a submission.
//!
//! A [`MediaList`] owns every selected [`MediaItem`] together with the
//! transient [`PreviewHandle`] a front end uses to display it. Handles are
//! released when their item is removed or the list is replaced, after which
//! [`MediaList::is_live`] reports them as invalid.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Accepted file types
// ---------------------------------------------------------------------------

/// JPEG image extension.
pub const EXT_JPG: &str = "jpg";
/// Alternate JPEG image extension.
pub const EXT_JPEG: &str = "jpeg";
/// MP4 video extension.
pub const EXT_MP4: &str = "mp4";

/// All extensions the picker accepts (compared case-insensitively).
pub const ACCEPTED_EXTENSIONS: &[&str] = &[EXT_JPG, EXT_JPEG, EXT_MP4];

/// Kind of media, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Jpeg,
    Mp4,
}

impl MediaKind {
    /// Detect the media kind from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Result<Self, CoreError> {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            EXT_JPG | EXT_JPEG => Ok(Self::Jpeg),
            EXT_MP4 => Ok(Self::Mp4),
            _ => Err(CoreError::Validation(format!(
                "Unsupported media file '{file_name}'. Accepted extensions: {}",
                ACCEPTED_EXTENSIONS.join(", ")
            ))),
        }
    }

    /// MIME type sent with the upload part.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Mp4 => "video/mp4",
        }
    }
}

// ---------------------------------------------------------------------------
// Items and handles
// ---------------------------------------------------------------------------

/// Opaque display reference for a selected item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewHandle(Uuid);

impl std::fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "preview:{}", self.0)
    }
}

/// One selected image or video.
#[derive(Debug, Clone)]
pub struct MediaItem {
    file_name: String,
    kind: MediaKind,
    bytes: Vec<u8>,
    preview: PreviewHandle,
}

impl MediaItem {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn preview(&self) -> PreviewHandle {
        self.preview
    }
}

// ---------------------------------------------------------------------------
// MediaList
// ---------------------------------------------------------------------------

/// Ordered list of selected media plus the set of live preview handles.
#[derive(Debug, Default)]
pub struct MediaList {
    items: Vec<MediaItem>,
    live_previews: HashSet<PreviewHandle>,
}

impl MediaList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file to the selection and register a preview for it.
    pub fn add(
        &mut self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<PreviewHandle, CoreError> {
        let file_name = file_name.into();
        let kind = MediaKind::from_file_name(&file_name)?;
        Ok(self.push(file_name, kind, bytes))
    }

    /// Remove the item at `index`, releasing its preview.
    ///
    /// Returns `None` (and changes nothing) when the index is out of range.
    pub fn remove(&mut self, index: usize) -> Option<MediaItem> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.live_previews.remove(&item.preview);
        Some(item)
    }

    /// Replace the whole selection.
    ///
    /// Every file is checked before anything changes, so a rejected file
    /// leaves the current selection (and its previews) untouched.
    pub fn replace<I, S>(&mut self, files: I) -> Result<(), CoreError>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let checked = files
            .into_iter()
            .map(|(name, bytes)| {
                let name = name.into();
                MediaKind::from_file_name(&name).map(|kind| (name, kind, bytes))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.clear();
        for (name, kind, bytes) in checked {
            self.push(name, kind, bytes);
        }
        Ok(())
    }

    /// Drop every item and release all previews.
    pub fn clear(&mut self) {
        self.items.clear();
        self.live_previews.clear();
    }

    /// Whether `handle` still refers to a selected item.
    pub fn is_live(&self, handle: PreviewHandle) -> bool {
        self.live_previews.contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    fn push(&mut self, file_name: String, kind: MediaKind, bytes: Vec<u8>) -> PreviewHandle {
        let preview = PreviewHandle(Uuid::new_v4());
        self.live_previews.insert(preview);
        self.items.push(MediaItem {
            file_name,
            kind,
            bytes,
            preview,
        });
        preview
    }
}
