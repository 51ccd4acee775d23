//! Widget configuration: attribute normalization and derived options.
//!
//! Raw options arrive either as a JS object (already JSON) or as the
//! `data-*` attributes of the placeholder element. Both end up in an
//! [`Options`] map which [`WidgetConfig::from_options`] resolves once:
//! - `rows`/`cols` become numbers and `num_media = rows * cols`
//! - `hashtags` and `strip_hash` are derived from the `text` mode
//! - `inline_video`/`inline_link_embed` default to the opposite of `lightbox`
//!
//! Options the widget does not interpret are kept verbatim in
//! [`WidgetConfig::extra`] and handed through to the collaborators.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, WidgetError};
use crate::layout::LayoutKind;
use crate::post::MediaFilter;

/// Raw option map as read from the DOM or passed by the host page.
pub type Options = Map<String, Value>;

/// How hashtags are displayed by the post renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashtagMode {
    Show,
    Remove,
    RemoveTriggers,
}

impl HashtagMode {
    /// Hashtag mode implied by a `text` mode.
    pub fn for_text_mode(text: &str) -> Self {
        match text {
            "stripped" => HashtagMode::RemoveTriggers,
            "tagless" => HashtagMode::Remove,
            _ => HashtagMode::Show,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashtagMode::Show => "show",
            HashtagMode::Remove => "remove",
            HashtagMode::RemoveTriggers => "remove_triggers",
        }
    }
}

/// Fully resolved widget configuration.
///
/// Serializes back into the option object the CSS generator and the
/// post renderer expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub layout_type: Option<String>,
    pub rows: u32,
    pub cols: u32,
    pub num_media: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<String>,
    pub strip_hash: bool,
    pub lightbox: bool,
    pub inline_video: bool,
    pub inline_link_embed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_video: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_sound: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_link_description: Option<bool>,
    pub flatten_posts: bool,
    pub responsive: bool,
    pub no_images: bool,
    pub no_videos: bool,
    pub include_linked_metadata: bool,
    pub debug: bool,
    /// Set from feed metadata once the first response arrives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_tags: Option<Value>,
    #[serde(flatten)]
    pub extra: Options,
}

impl WidgetConfig {
    /// Resolve a raw option map into a configuration.
    pub fn from_options(mut raw: Options) -> Result<Self> {
        let rows = take_count(&mut raw, "rows")?;
        let cols = take_count(&mut raw, "cols")?;
        let num_media = (rows as usize).checked_mul(cols as usize).ok_or_else(|| {
            WidgetError::Config(format!("`rows` x `cols` is too large ({rows} x {cols})"))
        })?;

        let text = take_string(&mut raw, "text");
        let hashtags = match raw.remove("hashtags") {
            Some(value) => value_to_string(&value),
            None => text
                .as_deref()
                .map(|mode| HashtagMode::for_text_mode(mode).as_str().to_string()),
        };
        let strip_hash = match raw.remove("strip_hash") {
            Some(value) => truthy(&value),
            None => matches!(
                text.as_deref(),
                Some("normalized") | Some("stripped") | Some("tagless")
            ),
        };

        let lightbox = take_flag(&mut raw, "lightbox");
        // Heavy media is shown in the overlay instead of inline when a lightbox exists.
        let inline_video = take_bool(&mut raw, "inline_video").unwrap_or(!lightbox);
        let inline_link_embed = take_bool(&mut raw, "inline_link_embed").unwrap_or(!lightbox);

        Ok(Self {
            project: take_string(&mut raw, "project"),
            feed: take_string(&mut raw, "feed"),
            layout_type: take_string(&mut raw, "type"),
            rows,
            cols,
            num_media,
            text,
            hashtags,
            strip_hash,
            lightbox,
            inline_video,
            inline_link_embed,
            play_video: take_bool(&mut raw, "play_video"),
            play_sound: take_bool(&mut raw, "play_sound"),
            full_link_description: take_bool(&mut raw, "full_link_description"),
            flatten_posts: take_flag(&mut raw, "flatten_posts"),
            responsive: take_flag(&mut raw, "responsive"),
            no_images: take_flag(&mut raw, "no_images"),
            no_videos: take_flag(&mut raw, "no_videos"),
            include_linked_metadata: take_flag(&mut raw, "include_linked_metadata"),
            debug: take_flag(&mut raw, "debug"),
            trigger_tags: raw.remove("trigger_tags"),
            extra: raw,
        })
    }

    /// Parse a JSON object string (as produced by `JSON.stringify`).
    pub fn from_json(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => Self::from_options(map),
            other => Err(WidgetError::Config(format!(
                "expected a configuration object, got {other}"
            ))),
        }
    }

    /// Configuration used for the lightbox view; the overlay is the
    /// dedicated viewing surface so all heavy media is switched on.
    pub fn for_lightbox(&self) -> Self {
        let mut config = self.clone();
        config.inline_video = true;
        config.inline_link_embed = true;
        config.play_video = Some(true);
        config.play_sound = Some(true);
        config.full_link_description = Some(true);
        config
    }

    pub fn layout(&self) -> LayoutKind {
        LayoutKind::from_type(self.layout_type.as_deref())
    }

    pub fn hashtag_mode(&self) -> Option<HashtagMode> {
        match self.hashtags.as_deref()? {
            "show" => Some(HashtagMode::Show),
            "remove" => Some(HashtagMode::Remove),
            "remove_triggers" => Some(HashtagMode::RemoveTriggers),
            _ => None,
        }
    }

    pub fn media_filter(&self) -> MediaFilter {
        MediaFilter {
            no_images: self.no_images,
            no_videos: self.no_videos,
            include_linked_metadata: self.include_linked_metadata,
        }
    }

    pub fn set_trigger_tags(&mut self, tags: Option<Value>) {
        self.trigger_tags = tags;
    }

    /// Serialize back into a plain option map.
    pub fn to_options(&self) -> Result<Options> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(WidgetError::Config("configuration did not serialize to an object".into())),
        }
    }
}

/// Normalize placeholder attributes (`data-*` names with the prefix
/// already stripped) into an option map.
///
/// Attributes present without a value mean "enabled". Hyphenated names
/// are also exposed with underscores. Returns `None` when there is
/// nothing to configure.
pub fn options_from_attributes<I, K, V>(attrs: I) -> Option<Options>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut options = Options::new();
    for (key, value) in attrs {
        let key = key.into();
        let value = value.into();
        let value = if value.is_empty() {
            Value::Bool(true)
        } else {
            Value::String(value)
        };
        if key.contains('-') {
            options.insert(key.replace('-', "_"), value.clone());
        }
        options.insert(key, value);
    }
    if options.is_empty() {
        None
    } else {
        Some(options)
    }
}

/// Truthiness of a raw option value.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !matches!(s.trim(), "" | "false" | "0" | "no" | "off"),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn take_flag(raw: &mut Options, key: &str) -> bool {
    take_bool(raw, key).unwrap_or(false)
}

fn take_bool(raw: &mut Options, key: &str) -> Option<bool> {
    raw.remove(key).map(|value| truthy(&value))
}

fn take_string(raw: &mut Options, key: &str) -> Option<String> {
    raw.remove(key).and_then(|value| value_to_string(&value))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `rows`/`cols`: missing, empty, `0` or a bare attribute mean 1.
fn take_count(raw: &mut Options, key: &str) -> Result<u32> {
    let Some(value) = raw.remove(key) else {
        return Ok(1);
    };
    match &value {
        Value::Null | Value::Bool(_) => Ok(1),
        Value::Number(n) => match n.as_f64() {
            Some(f) => count_from_f64(key, f, &value),
            None => Err(invalid_count(key, &value)),
        },
        Value::String(s) if s.trim().is_empty() => Ok(1),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => count_from_f64(key, f, &value),
            Err(_) => Err(invalid_count(key, &value)),
        },
        Value::Array(_) | Value::Object(_) => Err(invalid_count(key, &value)),
    }
}

fn count_from_f64(key: &str, f: f64, value: &Value) -> Result<u32> {
    if !f.is_finite() || f < 0.0 || f.fract() != 0.0 || f > f64::from(u32::MAX) {
        return Err(invalid_count(key, value));
    }
    if f == 0.0 {
        Ok(1)
    } else {
        Ok(f as u32)
    }
}

fn invalid_count(key: &str, value: &Value) -> WidgetError {
    WidgetError::Config(format!("`{key}` must be a positive whole number, got {value}"))
}
