//! Feed data model: posts, media and the feed response envelope.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One image or video reference. The widget never looks inside it; the
/// post renderer does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaItem(pub Value);

/// A post as returned by the feed API.
///
/// Fields the widget does not use are kept in `extra` so the post
/// renderer receives the post unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub images: Vec<MediaItem>,
    #[serde(default)]
    pub videos: Vec<MediaItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_metadata: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which parts of a post are viewable under the current configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaFilter {
    pub no_images: bool,
    pub no_videos: bool,
    pub include_linked_metadata: bool,
}

impl Post {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: None,
            images: Vec::new(),
            videos: Vec::new(),
            linked_metadata: None,
            extra: Map::new(),
        }
    }

    pub fn has_media(&self) -> bool {
        !self.images.is_empty() || !self.videos.is_empty()
    }

    /// Number of media items the lightbox can step through: videos
    /// first, then images unless images are disabled.
    pub fn media_count(&self, filter: &MediaFilter) -> usize {
        if filter.no_images {
            self.videos.len()
        } else {
            self.videos.len() + self.images.len()
        }
    }

    /// A post with nothing to display. Navigation never stops on one.
    pub fn is_empty(&self, filter: &MediaFilter) -> bool {
        let has_text = self.text.as_deref().is_some_and(|t| !t.is_empty());
        let has_image = !self.images.is_empty() && !filter.no_images;
        let has_video = !self.videos.is_empty() && !filter.no_videos;
        let has_link = self.linked_metadata.as_ref().is_some_and(|m| !m.is_null())
            && filter.include_linked_metadata;
        !has_text && !has_image && !has_video && !has_link
    }
}

/// Response metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedMeta {
    #[serde(default, deserialize_with = "truthy_flag")]
    pub branded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_tags: Option<Value>,
}

/// Body of a `listPost` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub data: Option<Vec<Post>>,
    #[serde(default)]
    pub meta: Option<FeedMeta>,
}

/// Feed flags are loosely typed: `null`, `0` or `"false"` all mean off.
fn truthy_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Value::deserialize(deserializer).map(|value| crate::config::truthy(&value))
}
