//! Bridges to the JS side: collaborator functions and browser history.
//!
//! Values cross the boundary as JSON (`JSON.stringify` / `JSON.parse`),
//! so the Rust side only ever sees serde types.

use js_sys::{Array, Function, Reflect, JSON};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, History};

use crate::config::WidgetConfig;
use crate::error::{Result, WidgetError};
use crate::history::{HistoryBackend, HistoryState};
use crate::post::{FeedResponse, Post};
use crate::widget::{FeedCallback, FeedClient, StyleGenerator};

/// Functions the host page supplies.
#[derive(Clone)]
pub struct Collaborators {
    pub create_client: Function,
    pub generate_css: Function,
    pub render_post: Function,
}

impl Collaborators {
    /// Read `{createClient, generateCSS, renderPost}` from a JS object.
    pub fn from_js(value: &JsValue) -> Result<Self> {
        Ok(Self {
            create_client: function_property(value, "createClient")?,
            generate_css: function_property(value, "generateCSS")?,
            render_post: function_property(value, "renderPost")?,
        })
    }

    pub fn create_client(&self, config: &WidgetConfig) -> Result<JsValue> {
        self.create_client
            .call1(&JsValue::NULL, &to_js(config)?)
            .map_err(js_error)
    }
}

fn function_property(target: &JsValue, name: &str) -> Result<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .map_err(js_error)?
        .dyn_into::<Function>()
        .map_err(|_| WidgetError::Config(format!("collaborator `{name}` is not a function")))
}

/// Convert a serde value into a plain JS value.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    let json = serde_json::to_string(value)?;
    JSON::parse(&json).map_err(js_error)
}

/// Convert a plain JS value into a serde type. `undefined` and `null`
/// read as `None`.
pub fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<Option<T>> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    let json = JSON::stringify(value)
        .map_err(js_error)?
        .as_string()
        .ok_or_else(|| WidgetError::Js("value is not JSON-serializable".into()))?;
    Ok(Some(serde_json::from_str(&json)?))
}

/// Describe a thrown JS value.
pub fn js_error(err: JsValue) -> WidgetError {
    WidgetError::Js(js_message(&err))
}

fn js_message(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            Reflect::get(err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Render one post with the `renderPost` collaborator.
///
/// The client handle goes into a copy of the option object made for
/// this call only.
pub fn render_post(
    renderer: &Function,
    client: &JsValue,
    post: &Post,
    config: &WidgetConfig,
    on_click: Option<&Closure<dyn FnMut()>>,
    media_index: Option<usize>,
) -> Result<Element> {
    let options = to_js(config)?;
    Reflect::set(&options, &JsValue::from_str("client"), client).map_err(js_error)?;

    let args = Array::new();
    args.push(&to_js(post)?);
    args.push(&options);
    args.push(&on_click.map_or(JsValue::NULL, |closure| closure.as_ref().clone()));
    args.push(&media_index.map_or(JsValue::UNDEFINED, |i| JsValue::from_f64(i as f64)));

    renderer
        .apply(&JsValue::NULL, &args)
        .map_err(js_error)?
        .dyn_into::<Element>()
        .map_err(|_| WidgetError::Render(format!("renderPost returned no element for {}", post.id)))
}

/// Feed client backed by a JS object exposing `listPost`.
pub struct JsFeedClient {
    client: JsValue,
}

impl JsFeedClient {
    pub fn new(client: JsValue) -> Self {
        Self { client }
    }
}

impl FeedClient for JsFeedClient {
    fn list_posts(&self, project: &str, feed: &str, limit: usize, done: FeedCallback) {
        let list_post = match function_property(&self.client, "listPost") {
            Ok(f) => f,
            Err(err) => return done(Err(err)),
        };
        let options = match to_js(&serde_json::json!({ "limit": limit })) {
            Ok(options) => options,
            Err(err) => return done(Err(err)),
        };

        let callback = Closure::once_into_js(move |error: JsValue, body: JsValue| {
            if !error.is_undefined() && !error.is_null() {
                return done(Err(WidgetError::Fetch(js_message(&error))));
            }
            let body = from_js::<FeedResponse>(&body)
                .map(Option::unwrap_or_default)
                .map_err(|err| WidgetError::Fetch(format!("malformed feed response: {err}")));
            done(body);
        });

        let args = Array::new();
        args.push(&JsValue::from_str(project));
        args.push(&JsValue::from_str(feed));
        args.push(&options);
        args.push(&callback);
        if let Err(err) = list_post.apply(&self.client, &args) {
            log::error!("[tagplay-widget] listPost threw: {}", js_error(err));
        }
    }
}

/// Style generator backed by the `generateCSS` collaborator.
pub struct JsStyleGenerator {
    generate_css: Function,
}

impl JsStyleGenerator {
    pub fn new(generate_css: Function) -> Self {
        Self { generate_css }
    }
}

impl StyleGenerator for JsStyleGenerator {
    fn generate(
        &self,
        selector_prefix: &str,
        config: &WidgetConfig,
        responsive: bool,
    ) -> Result<String> {
        self.generate_css
            .call3(
                &JsValue::NULL,
                &JsValue::from_str(selector_prefix),
                &to_js(config)?,
                &JsValue::from_bool(responsive),
            )
            .map_err(js_error)?
            .as_string()
            .ok_or_else(|| WidgetError::Render("generateCSS did not return a string".into()))
    }
}

/// `window.history`.
pub struct BrowserHistory {
    history: History,
}

impl BrowserHistory {
    pub fn new(history: History) -> Self {
        Self { history }
    }
}

impl HistoryBackend for BrowserHistory {
    fn current(&self) -> Option<HistoryState> {
        let state = self.history.state().ok()?;
        from_js::<serde_json::Value>(&state)
            .ok()
            .flatten()
            .map(|value| serde_json::from_value(value).unwrap_or_default())
    }

    fn push(&mut self, state: &HistoryState) {
        match to_js(state) {
            Ok(js) => {
                if let Err(err) = self.history.push_state(&js, "") {
                    log::warn!("[tagplay-widget] pushState failed: {}", js_error(err));
                }
            }
            Err(err) => log::warn!("[tagplay-widget] {err}"),
        }
    }

    fn replace(&mut self, state: &HistoryState) {
        match to_js(state) {
            Ok(js) => {
                if let Err(err) = self.history.replace_state(&js, "") {
                    log::warn!("[tagplay-widget] replaceState failed: {}", js_error(err));
                }
            }
            Err(err) => log::warn!("[tagplay-widget] {err}"),
        }
    }
}

/// Read a `popstate` event's state object.
pub fn history_state_from_js(state: &JsValue) -> HistoryState {
    from_js::<serde_json::Value>(state)
        .ok()
        .flatten()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}
