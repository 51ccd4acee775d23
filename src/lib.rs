//! Tagplay feed widget for the web.
//!
//! Compiled to WASM via wasm-bindgen. Renders a feed into a placeholder:
//! - configuration comes from a JS object or the placeholder's `data-*` attributes
//! - posts are fetched through the host's API client and rendered by its
//!   `renderPost` function into the container or waterfall columns
//! - an optional lightbox steps through every media item and keeps
//!   browser history in sync, so the back button closes it and shared
//!   links reopen it

use std::cell::RefCell;

use gloo::events::EventListener;
use wasm_bindgen::prelude::*;
use web_sys::{Element, PopStateEvent};

pub mod bindings;
pub mod config;
pub mod dom_renderer;
pub mod error;
pub mod flatten;
pub mod history;
pub mod layout;
pub mod lightbox;
pub mod lightbox_overlay;
pub mod logger;
pub mod navigation;
pub mod post;
pub mod style;
pub mod widget;

use bindings::{BrowserHistory, Collaborators, JsFeedClient, JsStyleGenerator};
use config::Options;
use dom_renderer::DomSurface;
use error::{Result, WidgetError};
use lightbox_overlay::DomOverlay;
use navigation::Direction;
use post::Post;
use widget::{Widget, WidgetParts, WidgetRegistry};

/// Global the host page may fill with placeholders before the widget loads.
const QUEUE_GLOBAL: &str = "tagplayWidgetQueue";

thread_local! {
    static REGISTRY: RefCell<WidgetRegistry> = RefCell::new(WidgetRegistry::default());
    static POPSTATE: RefCell<Option<EventListener>> = const { RefCell::new(None) };
}

/// A widget instance as seen from JS.
#[wasm_bindgen]
pub struct TagplayWidget {
    inner: Widget,
}

#[wasm_bindgen]
impl TagplayWidget {
    #[wasm_bindgen(getter, js_name = containerId)]
    pub fn container_id(&self) -> String {
        self.inner.container_id()
    }

    #[wasm_bindgen(getter, js_name = postCount)]
    pub fn post_count(&self) -> usize {
        self.inner.posts().len()
    }

    #[wasm_bindgen(getter, js_name = lightboxOpen)]
    pub fn lightbox_open(&self) -> bool {
        self.inner.is_lightbox_open()
    }

    /// Open the lightbox on the post with `post_id`.
    #[wasm_bindgen(js_name = openLightbox)]
    pub fn open_lightbox(&self, post_id: &str) -> bool {
        let Some(post) = self.inner.posts().into_iter().find(|p| p.id == post_id) else {
            log::warn!("[tagplay-widget] no post {post_id} in {}", self.inner.container_id());
            return false;
        };
        self.inner.open_lightbox(post, Some(0));
        true
    }

    #[wasm_bindgen(js_name = closeLightbox)]
    pub fn close_lightbox(&self) {
        self.inner.close_lightbox();
    }

    /// Step the open lightbox; `forward = false` goes back.
    pub fn navigate(&self, forward: bool) {
        let direction = if forward {
            Direction::Forward
        } else {
            Direction::Backward
        };
        self.inner.navigate_lightbox(direction);
    }
}

/// Set the console log level (`error`, `warn`, `info`, `debug`, `trace`, `off`).
#[wasm_bindgen]
pub fn tagplay_widget_init_logging(level: &str) {
    logger::init(logger::parse_level(level));
}

/// Create a widget in `container`.
///
/// `config` and `posts` are optional; without `config` the container's
/// `data-*` attributes are used, with `posts` no request is made.
/// Failures are logged and yield `undefined` so other widgets on the
/// page keep working.
#[wasm_bindgen]
pub fn tagplay_widget_create(
    container: JsValue,
    collaborators: JsValue,
    config: JsValue,
    posts: JsValue,
) -> Option<TagplayWidget> {
    logger::ensure_installed();
    let created = start(container, &collaborators, &config, &posts).map(|widget| {
        REGISTRY.with(|registry| registry.borrow_mut().register(widget.clone()));
        widget
    });
    match created {
        Ok(inner) => Some(TagplayWidget { inner }),
        Err(err) => {
            log::error!("[tagplay-widget] {err}");
            None
        }
    }
}

/// Initialize every placeholder in `queue` and empty it.
#[wasm_bindgen]
pub fn tagplay_widget_process_queue(queue: &js_sys::Array, collaborators: JsValue) -> usize {
    logger::ensure_installed();
    let mut pending: Vec<JsValue> = queue.iter().collect();
    queue.set_length(0);
    REGISTRY.with(|registry| {
        widget::drain_queue(
            &mut pending,
            |element| start(element, &collaborators, &JsValue::UNDEFINED, &JsValue::UNDEFINED),
            &mut registry.borrow_mut(),
        )
    })
}

/// Initialize `window.tagplayWidgetQueue` and set it to `null`.
#[wasm_bindgen]
pub fn tagplay_widget_process_global_queue(collaborators: JsValue) -> usize {
    let Some(window) = web_sys::window() else {
        return 0;
    };
    let key = JsValue::from_str(QUEUE_GLOBAL);
    let queue = js_sys::Reflect::get(&window, &key).unwrap_or(JsValue::UNDEFINED);
    let started = match queue.dyn_ref::<js_sys::Array>() {
        Some(queue) => tagplay_widget_process_queue(queue, collaborators),
        None => 0,
    };
    if let Err(err) = js_sys::Reflect::set(&window, &key, &JsValue::NULL) {
        log::warn!("[tagplay-widget] could not clear {QUEUE_GLOBAL}: {err:?}");
    }
    started
}

fn start(
    container: JsValue,
    collaborators: &JsValue,
    config: &JsValue,
    posts: &JsValue,
) -> Result<Widget> {
    let container = container
        .dyn_into::<Element>()
        .map_err(|_| WidgetError::Config("missing placeholder div element".into()))?;
    let collaborators = Collaborators::from_js(collaborators)?;
    let explicit = bindings::from_js::<Options>(config)?;
    let config = widget::resolve_config(explicit, || dom_renderer::placeholder_options(&container))?;
    if config.debug {
        log::set_max_level(log::LevelFilter::Debug);
    }
    let preloaded = bindings::from_js::<Vec<Post>>(posts)?;

    let window = web_sys::window().ok_or_else(|| WidgetError::Render("no window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| WidgetError::Render("no document".into()))?;
    let history = window.history().map_err(bindings::js_error)?;
    install_popstate_listener(&window);

    let client = collaborators.create_client(&config)?;
    let parts = WidgetParts {
        surface: Box::new(DomSurface::new(
            document.clone(),
            container,
            collaborators.render_post.clone(),
            client.clone(),
        )?),
        client: std::rc::Rc::new(JsFeedClient::new(client.clone())),
        styles: Box::new(JsStyleGenerator::new(collaborators.generate_css.clone())),
        history: Box::new(BrowserHistory::new(history)),
        overlay: Box::new(DomOverlay::new(document, collaborators.render_post, client)),
    };
    Widget::new(parts, config, preloaded)
}

/// One `popstate` listener per page, routing through the registry.
fn install_popstate_listener(window: &web_sys::Window) {
    POPSTATE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return;
        }
        *slot = Some(EventListener::new(window, "popstate", |event| {
            let state = event
                .dyn_ref::<PopStateEvent>()
                .map(|event| bindings::history_state_from_js(&event.state()))
                .unwrap_or_default();
            REGISTRY.with(|registry| registry.borrow().dispatch_history(Some(&state)));
        }));
    });
}
