//! Browser history entries written by the lightbox.
//!
//! Entries have the shape `{widgetLightbox: {containerId, post, mediaIndex}}`.
//! A closed lightbox writes `{}` so that going back from outside the
//! overlay does not reopen it.

use serde::{Deserialize, Serialize};

use crate::post::Post;

/// The lightbox position saved in a history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightboxEntry {
    pub container_id: String,
    pub post: Post,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_index: Option<usize>,
}

/// State object stored with a history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    #[serde(
        rename = "widgetLightbox",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub widget_lightbox: Option<LightboxEntry>,
}

impl HistoryState {
    pub fn lightbox(container_id: &str, post: &Post, media_index: Option<usize>) -> Self {
        Self {
            widget_lightbox: Some(LightboxEntry {
                container_id: container_id.to_string(),
                post: post.clone(),
                media_index,
            }),
        }
    }

    /// The lightbox entry if it belongs to `container_id`.
    pub fn entry_for(&self, container_id: &str) -> Option<&LightboxEntry> {
        self.widget_lightbox
            .as_ref()
            .filter(|entry| entry.container_id == container_id)
    }

    pub fn has_lightbox(&self) -> bool {
        self.widget_lightbox.is_some()
    }

    /// Read a state object of unknown origin. Anything that is not a
    /// lightbox entry reads as an empty state.
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_default()
    }
}

/// Access to the browser's session history.
pub trait HistoryBackend {
    /// State of the current history entry.
    fn current(&self) -> Option<HistoryState>;

    fn push(&mut self, state: &HistoryState);

    fn replace(&mut self, state: &HistoryState);
}
