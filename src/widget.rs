//! Widget sessions: fetch, render and lightbox wiring for one placeholder.
//!
//! A [`Widget`] owns everything for one container: its configuration,
//! the accepted posts, and the lightbox coordinator. Host-specific pieces
//! (DOM, JS collaborators, browser history) come in through [`WidgetParts`].
//! Several widgets on one page are kept apart by container id in a
//! [`WidgetRegistry`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::config::{Options, WidgetConfig};
use crate::error::{Result, WidgetError};
use crate::flatten::flatten_post;
use crate::history::{HistoryBackend, HistoryState};
use crate::layout::{choose_slot, LayoutKind, Slot};
use crate::lightbox::{LightboxCoordinator, Origin, Overlay, OverlayControls};
use crate::navigation::{Addressing, Direction, Navigator, PostSequence};
use crate::post::{FeedResponse, Post};
use crate::style;

/// Completion callback of a feed request. Invoked at most once.
pub type FeedCallback = Box<dyn FnOnce(Result<FeedResponse>)>;

/// Click handler attached to an inline post.
pub type PostClick = Rc<dyn Fn()>;

/// The feed API client.
pub trait FeedClient {
    fn list_posts(&self, project: &str, feed: &str, limit: usize, done: FeedCallback);
}

/// The stylesheet generator.
pub trait StyleGenerator {
    fn generate(
        &self,
        selector_prefix: &str,
        config: &WidgetConfig,
        responsive: bool,
    ) -> Result<String>;
}

/// The placeholder element and the document around it.
pub trait Surface {
    fn id(&self) -> Option<String>;

    fn set_id(&mut self, id: &str);

    /// Value of the placeholder's `name` attribute.
    fn name_attribute(&self) -> Option<String>;

    /// Id of the nearest ancestor element that has one.
    fn ancestor_id(&self) -> Option<String>;

    /// Install `css` under `style_id`, replacing an existing sheet with
    /// the same id.
    fn install_stylesheet(&mut self, style_id: &str, css: &str) -> Result<()>;

    fn create_columns(&mut self, count: usize) -> Result<()>;

    /// Current rendered height of every waterfall column.
    fn column_heights(&self) -> Vec<f64>;

    /// Render `post` through the post renderer and append it to `slot`.
    fn append_post(
        &mut self,
        slot: Slot,
        post: &Post,
        config: &WidgetConfig,
        on_click: Option<PostClick>,
    ) -> Result<()>;

    /// Branding affordance for branded feeds. Nothing is shown yet.
    fn show_branding(&mut self) {}
}

/// Host collaborators for one widget.
pub struct WidgetParts {
    pub surface: Box<dyn Surface>,
    pub client: Rc<dyn FeedClient>,
    pub styles: Box<dyn StyleGenerator>,
    pub history: Box<dyn HistoryBackend>,
    pub overlay: Box<dyn Overlay>,
}

struct WidgetState {
    name: String,
    container_id: String,
    config: WidgetConfig,
    surface: Box<dyn Surface>,
    client: Rc<dyn FeedClient>,
    posts: PostSequence,
    lightbox: LightboxCoordinator,
}

/// Handle to one widget session. Cloning shares the session.
#[derive(Clone)]
pub struct Widget {
    state: Rc<RefCell<WidgetState>>,
}

impl Widget {
    /// Set up the container, install styles and start loading posts.
    ///
    /// With `preloaded` posts no request is made.
    pub fn new(
        parts: WidgetParts,
        config: WidgetConfig,
        preloaded: Option<Vec<Post>>,
    ) -> Result<Self> {
        let WidgetParts {
            mut surface,
            client,
            styles,
            history,
            overlay,
        } = parts;

        let name = surface
            .name_attribute()
            .filter(|name| !name.is_empty())
            .or_else(|| config.feed.as_deref().map(|feed| feed.chars().take(6).collect()))
            .ok_or_else(|| WidgetError::Config("missing `feed` option".into()))?;

        let container_id = match surface.id() {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = style::default_container_id(&name);
                surface.set_id(&id);
                id
            }
        };

        let waterfall = config.layout() == LayoutKind::Waterfall;
        if waterfall {
            surface.create_columns(config.cols as usize)?;
        }

        let prefix = style::selector_prefix(&container_id, surface.ancestor_id().as_deref());
        let mut css = styles.generate(&prefix, &config, config.responsive)?;
        if waterfall {
            css.push_str(&style::column_css(&container_id, config.cols));
        }
        surface.install_stylesheet(&style::stylesheet_id(&name), &css)?;

        let navigator = Navigator::new(config.media_filter(), Addressing::PerMedia);
        let lightbox = LightboxCoordinator::new(&container_id, navigator, history, overlay);

        log::info!(
            "[tagplay-widget] {container_id}: {} posts, layout {:?}",
            config.num_media,
            config.layout()
        );

        let widget = Self {
            state: Rc::new(RefCell::new(WidgetState {
                name,
                container_id,
                posts: PostSequence::with_cap(config.num_media),
                config,
                surface,
                client,
                lightbox,
            })),
        };

        match preloaded {
            Some(posts) => widget.load_posts(posts),
            None => widget.fetch(),
        }
        Ok(widget)
    }

    pub fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    pub fn container_id(&self) -> String {
        self.state.borrow().container_id.clone()
    }

    pub fn config(&self) -> WidgetConfig {
        self.state.borrow().config.clone()
    }

    /// Posts accepted for display, in display order.
    pub fn posts(&self) -> Vec<Post> {
        self.state.borrow().posts.as_slice().to_vec()
    }

    pub fn is_lightbox_open(&self) -> bool {
        self.state.borrow().lightbox.is_open()
    }

    /// Post id and media index shown by the open lightbox.
    pub fn lightbox_position(&self) -> Option<(String, Option<usize>)> {
        let state = self.state.borrow();
        state
            .lightbox
            .current()
            .map(|cursor| (cursor.post.id.clone(), cursor.media_index))
    }

    fn fetch(&self) {
        let (client, project, feed, limit, container_id) = {
            let state = self.state.borrow();
            (
                state.client.clone(),
                state.config.project.clone(),
                state.config.feed.clone(),
                state.config.num_media,
                state.container_id.clone(),
            )
        };
        let (Some(project), Some(feed)) = (project, feed) else {
            log::error!("[tagplay-widget] {container_id}: missing `project` or `feed`, nothing to load");
            return;
        };

        log::debug!("[tagplay-widget] {container_id}: requesting {limit} posts from {project}/{feed}");
        let weak = Rc::downgrade(&self.state);
        client.list_posts(
            &project,
            &feed,
            limit,
            Box::new(move |result| {
                if let Some(widget) = Self::upgrade(&weak) {
                    widget.on_feed(result);
                }
            }),
        );
    }

    fn on_feed(&self, result: Result<FeedResponse>) {
        let body = match result {
            Ok(body) => body,
            Err(err) => {
                log::error!("[tagplay-widget] {}: {err}", self.container_id());
                return;
            }
        };

        if let Some(meta) = body.meta {
            let mut state = self.state.borrow_mut();
            if meta.branded {
                state.surface.show_branding();
            }
            state.config.set_trigger_tags(meta.trigger_tags);
        }

        if let Some(posts) = body.data {
            self.load_posts(posts);
        }
    }

    /// Accept and render `posts` until the display cap is reached, then
    /// restore a lightbox saved in the current history entry.
    pub fn load_posts(&self, posts: Vec<Post>) {
        let flatten = self.state.borrow().config.flatten_posts;
        let mut dropped = 0usize;
        for post in posts {
            let pieces = if flatten && post.has_media() {
                flatten_post(post)
            } else {
                vec![post]
            };
            for piece in pieces {
                if !self.add_post(piece) {
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            log::debug!(
                "[tagplay-widget] {}: dropped {dropped} posts over the display cap",
                self.container_id()
            );
        }

        let controls = self.controls();
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if let Err(err) = state
            .lightbox
            .restore(state.posts.as_slice(), &state.config, controls)
        {
            log::error!("[tagplay-widget] {}: {err}", state.container_id);
        }
    }

    fn add_post(&self, post: Post) -> bool {
        let on_click = self.click_handler(&post);
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.posts.is_full() {
            return false;
        }
        let slot = choose_slot(state.config.layout(), &state.surface.column_heights());
        if let Err(err) = state.surface.append_post(slot, &post, &state.config, on_click) {
            log::error!("[tagplay-widget] {}: {err}", state.container_id);
        }
        state.posts.accept(post)
    }

    fn click_handler(&self, post: &Post) -> Option<PostClick> {
        if !self.state.borrow().config.lightbox {
            return None;
        }
        let weak = Rc::downgrade(&self.state);
        let post = post.clone();
        Some(Rc::new(move || {
            if let Some(widget) = Self::upgrade(&weak) {
                widget.open_lightbox(post.clone(), Some(0));
            }
        }))
    }

    /// Open the lightbox from a user action.
    pub fn open_lightbox(&self, post: Post, media_index: Option<usize>) {
        let controls = self.controls();
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if let Err(err) = state.lightbox.open(
            state.posts.as_slice(),
            &state.config,
            post,
            media_index,
            Origin::User,
            controls,
        ) {
            log::error!("[tagplay-widget] {}: {err}", state.container_id);
        }
    }

    /// Close the lightbox from a user action.
    pub fn close_lightbox(&self) {
        self.state.borrow_mut().lightbox.close(Origin::User);
    }

    pub fn navigate_lightbox(&self, direction: Direction) {
        let controls = self.controls();
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if let Err(err) =
            state
                .lightbox
                .navigate(state.posts.as_slice(), &state.config, direction, controls)
        {
            log::error!("[tagplay-widget] {}: {err}", state.container_id);
        }
    }

    pub fn can_navigate(&self, direction: Direction) -> bool {
        let state = self.state.borrow();
        state.lightbox.can_navigate(state.posts.as_slice(), direction)
    }

    /// React to a browser history pop.
    pub fn handle_history(&self, history_state: Option<&HistoryState>) {
        let controls = self.controls();
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if let Err(err) = state.lightbox.handle_history(
            state.posts.as_slice(),
            &state.config,
            history_state,
            controls,
        ) {
            log::error!("[tagplay-widget] {}: {err}", state.container_id);
        }
    }

    fn controls(&self) -> OverlayControls {
        let navigate = Rc::downgrade(&self.state);
        let close = navigate.clone();
        OverlayControls {
            navigate: Rc::new(move |direction| {
                if let Some(widget) = Self::upgrade(&navigate) {
                    widget.navigate_lightbox(direction);
                }
            }),
            close: Rc::new(move || {
                if let Some(widget) = Self::upgrade(&close) {
                    widget.close_lightbox();
                }
            }),
        }
    }

    fn upgrade(weak: &Weak<RefCell<WidgetState>>) -> Option<Self> {
        weak.upgrade().map(|state| Self { state })
    }
}

/// Pick the configuration for a placeholder: the caller's object if
/// given, otherwise its attributes.
pub fn resolve_config(
    explicit: Option<Options>,
    attributes: impl FnOnce() -> Option<Options>,
) -> Result<WidgetConfig> {
    let options = explicit
        .or_else(attributes)
        .ok_or_else(|| WidgetError::Config("missing configuration".into()))?;
    WidgetConfig::from_options(options)
}

/// All widgets on a page, keyed by container id.
#[derive(Default)]
pub struct WidgetRegistry {
    widgets: HashMap<String, Widget>,
}

impl WidgetRegistry {
    /// Track `widget`. A widget already registered for the same
    /// container is replaced and returned.
    pub fn register(&mut self, widget: Widget) -> Option<Widget> {
        self.widgets.insert(widget.container_id(), widget)
    }

    pub fn get(&self, container_id: &str) -> Option<&Widget> {
        self.widgets.get(container_id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Route a history pop: an entry goes only to the widget it names;
    /// a state without a lightbox closes every open lightbox.
    pub fn dispatch_history(&self, state: Option<&HistoryState>) {
        match state.and_then(|s| s.widget_lightbox.as_ref()) {
            Some(entry) => match self.widgets.get(&entry.container_id) {
                Some(widget) => widget.handle_history(state),
                None => log::debug!(
                    "[tagplay-widget] no widget for history entry {}",
                    entry.container_id
                ),
            },
            None => {
                for widget in self.widgets.values() {
                    if widget.is_lightbox_open() {
                        widget.handle_history(state);
                    }
                }
            }
        }
    }
}

/// Initialize every queued placeholder once and leave the queue empty.
///
/// A placeholder that fails to initialize is reported and skipped.
pub fn drain_queue<T>(
    queue: &mut Vec<T>,
    mut init: impl FnMut(T) -> Result<Widget>,
    registry: &mut WidgetRegistry,
) -> usize {
    let mut started = 0;
    for placeholder in queue.drain(..) {
        match init(placeholder) {
            Ok(widget) => {
                registry.register(widget);
                started += 1;
            }
            Err(err) => log::error!("[tagplay-widget] {err}"),
        }
    }
    started
}
