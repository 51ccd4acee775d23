//! End-to-end widget sessions driven through fake host collaborators.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use tagplay_widget::config::{Options, WidgetConfig};
use tagplay_widget::error::{Result, WidgetError};
use tagplay_widget::history::{HistoryBackend, HistoryState};
use tagplay_widget::layout::Slot;
use tagplay_widget::lightbox::{LightboxView, Overlay, OverlayControls};
use tagplay_widget::navigation::Direction;
use tagplay_widget::post::{FeedMeta, FeedResponse, MediaItem, Post};
use tagplay_widget::widget::{
    drain_queue, FeedCallback, FeedClient, PostClick, StyleGenerator, Surface, Widget,
    WidgetParts, WidgetRegistry,
};

/// Session history shared by every widget on the fake page.
#[derive(Default)]
struct Browser {
    entries: Vec<HistoryState>,
    index: usize,
}

impl Browser {
    fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            entries: vec![HistoryState::default()],
            index: 0,
        }))
    }

    fn back(&mut self) -> HistoryState {
        self.index = self.index.saturating_sub(1);
        self.entries[self.index].clone()
    }

    fn forward(&mut self) -> HistoryState {
        if self.index + 1 < self.entries.len() {
            self.index += 1;
        }
        self.entries[self.index].clone()
    }

    fn top(&self) -> HistoryState {
        self.entries[self.index].clone()
    }
}

struct FakeHistory(Rc<RefCell<Browser>>);

impl HistoryBackend for FakeHistory {
    fn current(&self) -> Option<HistoryState> {
        Some(self.0.borrow().top())
    }

    fn push(&mut self, state: &HistoryState) {
        let mut browser = self.0.borrow_mut();
        let keep = browser.index + 1;
        browser.entries.truncate(keep);
        browser.entries.push(state.clone());
        browser.index = browser.entries.len() - 1;
    }

    fn replace(&mut self, state: &HistoryState) {
        let mut browser = self.0.borrow_mut();
        let index = browser.index;
        browser.entries[index] = state.clone();
    }
}

#[derive(Default)]
struct Page {
    id: Option<String>,
    name: Option<String>,
    ancestor: Option<String>,
    stylesheets: Vec<(String, String)>,
    columns: Vec<f64>,
    rendered: Vec<(Slot, String)>,
    clicks: Vec<PostClick>,
    branded: bool,
    shown: Vec<(String, Option<usize>, bool, bool)>,
    hidden: usize,
    controls: Option<OverlayControls>,
}

struct FakeSurface(Rc<RefCell<Page>>);

impl Surface for FakeSurface {
    fn id(&self) -> Option<String> {
        self.0.borrow().id.clone()
    }

    fn set_id(&mut self, id: &str) {
        self.0.borrow_mut().id = Some(id.to_string());
    }

    fn name_attribute(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    fn ancestor_id(&self) -> Option<String> {
        self.0.borrow().ancestor.clone()
    }

    fn install_stylesheet(&mut self, style_id: &str, css: &str) -> Result<()> {
        let mut page = self.0.borrow_mut();
        page.stylesheets.retain(|(id, _)| id != style_id);
        page.stylesheets.push((style_id.to_string(), css.to_string()));
        Ok(())
    }

    fn create_columns(&mut self, count: usize) -> Result<()> {
        self.0.borrow_mut().columns = vec![0.0; count];
        Ok(())
    }

    fn column_heights(&self) -> Vec<f64> {
        self.0.borrow().columns.clone()
    }

    fn append_post(
        &mut self,
        slot: Slot,
        post: &Post,
        _config: &WidgetConfig,
        on_click: Option<PostClick>,
    ) -> Result<()> {
        let mut page = self.0.borrow_mut();
        if let Slot::Column(index) = slot {
            // taller posts for longer texts
            page.columns[index] += 100.0 + post.text.as_deref().map_or(0, str::len) as f64;
        }
        page.rendered.push((slot, post.id.clone()));
        if let Some(click) = on_click {
            page.clicks.push(click);
        }
        Ok(())
    }

    fn show_branding(&mut self) {
        self.0.borrow_mut().branded = true;
    }
}

struct FakeOverlay(Rc<RefCell<Page>>);

impl Overlay for FakeOverlay {
    fn show(&mut self, view: &LightboxView<'_>, controls: OverlayControls) -> Result<()> {
        assert!(view.config.inline_video);
        let mut page = self.0.borrow_mut();
        page.shown.push((
            view.post.id.clone(),
            view.media_index,
            view.can_previous,
            view.can_next,
        ));
        page.controls = Some(controls);
        Ok(())
    }

    fn hide(&mut self) {
        let mut page = self.0.borrow_mut();
        page.hidden += 1;
        page.controls = None;
    }
}

struct FakeClient {
    response: RefCell<Option<Result<FeedResponse>>>,
    requests: RefCell<Vec<(String, String, usize)>>,
}

impl FakeClient {
    fn answering(response: Result<FeedResponse>) -> Rc<Self> {
        Rc::new(Self {
            response: RefCell::new(Some(response)),
            requests: RefCell::new(Vec::new()),
        })
    }
}

impl FeedClient for FakeClient {
    fn list_posts(&self, project: &str, feed: &str, limit: usize, done: FeedCallback) {
        self.requests
            .borrow_mut()
            .push((project.to_string(), feed.to_string(), limit));
        if let Some(response) = self.response.borrow_mut().take() {
            done(response);
        }
    }
}

struct FakeStyles;

impl StyleGenerator for FakeStyles {
    fn generate(&self, prefix: &str, config: &WidgetConfig, responsive: bool) -> Result<String> {
        Ok(format!("{prefix} {{ rows: {}; responsive: {responsive} }}", config.rows))
    }
}

fn options(value: serde_json::Value) -> Options {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("options must be an object"),
    }
}

fn config(value: serde_json::Value) -> WidgetConfig {
    WidgetConfig::from_options(options(value)).unwrap()
}

fn image_post(id: &str, images: usize) -> Post {
    let mut post = Post::new(id);
    post.images = (0..images)
        .map(|i| MediaItem(json!({ "src": format!("{id}-{i}.jpg") })))
        .collect();
    post
}

fn text_post(id: &str) -> Post {
    let mut post = Post::new(id);
    post.text = Some(format!("words from {id}"));
    post
}

struct Harness {
    page: Rc<RefCell<Page>>,
    client: Rc<FakeClient>,
}

impl Harness {
    fn parts(&self, browser: &Rc<RefCell<Browser>>) -> WidgetParts {
        WidgetParts {
            surface: Box::new(FakeSurface(self.page.clone())),
            client: self.client.clone(),
            styles: Box::new(FakeStyles),
            history: Box::new(FakeHistory(browser.clone())),
            overlay: Box::new(FakeOverlay(self.page.clone())),
        }
    }
}

fn harness(page: Page, response: Result<FeedResponse>) -> Harness {
    Harness {
        page: Rc::new(RefCell::new(page)),
        client: FakeClient::answering(response),
    }
}

fn feed(posts: Vec<Post>) -> Result<FeedResponse> {
    Ok(FeedResponse {
        data: Some(posts),
        meta: None,
    })
}

fn page_with_id(id: &str) -> Page {
    Page {
        id: Some(id.to_string()),
        ..Page::default()
    }
}

fn navigate(page: &Rc<RefCell<Page>>, direction: Direction) {
    let navigate = page
        .borrow()
        .controls
        .as_ref()
        .map(|controls| controls.navigate.clone())
        .expect("lightbox is open");
    navigate(direction);
}

#[test]
fn caps_rendered_posts_at_rows_times_cols() {
    let posts = (0..8).map(|i| text_post(&format!("p{i}"))).collect();
    let h = harness(Page::default(), feed(posts));
    let browser = Browser::new();
    let widget = Widget::new(
        h.parts(&browser),
        config(json!({"project": "proj", "feed": "feed123456", "rows": 2, "cols": 3})),
        None,
    )
    .unwrap();

    assert_eq!(widget.posts().len(), 6);
    assert_eq!(h.page.borrow().rendered.len(), 6);
    assert_eq!(
        h.client.requests.borrow()[0],
        ("proj".to_string(), "feed123456".to_string(), 6)
    );
}

#[test]
fn names_container_and_installs_scoped_stylesheet() {
    let h = harness(
        Page {
            ancestor: Some("sidebar".into()),
            ..Page::default()
        },
        feed(Vec::new()),
    );
    let browser = Browser::new();
    let widget = Widget::new(
        h.parts(&browser),
        config(json!({"project": "p", "feed": "abcdefghij", "responsive": true})),
        None,
    )
    .unwrap();

    assert_eq!(widget.name(), "abcdef");
    assert_eq!(widget.container_id(), "tagplay-widget-abcdef");
    let page = h.page.borrow();
    assert_eq!(page.id.as_deref(), Some("tagplay-widget-abcdef"));
    let (style_id, css) = &page.stylesheets[0];
    assert_eq!(style_id, "tagplay-widget-style-abcdef");
    assert!(css.starts_with("#sidebar #tagplay-widget-abcdef.tagplay-widget"));
    assert!(css.contains("responsive: true"));
}

#[test]
fn name_attribute_overrides_feed_prefix() {
    let h = harness(
        Page {
            name: Some("hero".into()),
            ..Page::default()
        },
        feed(Vec::new()),
    );
    let widget = Widget::new(
        h.parts(&Browser::new()),
        config(json!({"project": "p", "feed": "abcdefghij"})),
        None,
    )
    .unwrap();
    assert_eq!(widget.container_id(), "tagplay-widget-hero");
}

#[test]
fn missing_feed_and_name_is_a_config_error() {
    let h = harness(Page::default(), feed(Vec::new()));
    let err = Widget::new(h.parts(&Browser::new()), config(json!({"project": "p"})), None)
        .err()
        .expect("widget must not start");
    assert!(matches!(err, WidgetError::Config(_)));
}

#[test]
fn fetch_error_renders_nothing() {
    let h = harness(Page::default(), Err(WidgetError::Fetch("offline".into())));
    let widget = Widget::new(
        h.parts(&Browser::new()),
        config(json!({"project": "p", "feed": "feedfeed"})),
        None,
    )
    .unwrap();
    assert!(widget.posts().is_empty());
    assert!(h.page.borrow().rendered.is_empty());
}

#[test]
fn meta_sets_trigger_tags_and_branding() {
    let h = harness(
        Page::default(),
        Ok(FeedResponse {
            data: Some(vec![text_post("a")]),
            meta: Some(FeedMeta {
                branded: true,
                trigger_tags: Some(json!(["#tagplay"])),
            }),
        }),
    );
    let widget = Widget::new(
        h.parts(&Browser::new()),
        config(json!({"project": "p", "feed": "feedfeed"})),
        None,
    )
    .unwrap();
    assert!(h.page.borrow().branded);
    assert_eq!(widget.config().trigger_tags, Some(json!(["#tagplay"])));
}

#[test]
fn preloaded_posts_skip_the_request() {
    let h = harness(Page::default(), feed(Vec::new()));
    let widget = Widget::new(
        h.parts(&Browser::new()),
        config(json!({"feed": "feedfeed", "rows": 3})),
        Some(vec![text_post("a"), text_post("b")]),
    )
    .unwrap();
    assert!(h.client.requests.borrow().is_empty());
    assert_eq!(widget.posts().len(), 2);
}

#[test]
fn waterfall_fills_the_shortest_column() {
    let posts = vec![
        text_post("long-long-long-long-long-long-long"),
        text_post("b"),
        text_post("c"),
        text_post("d"),
    ];
    let h = harness(Page::default(), feed(posts));
    Widget::new(
        h.parts(&Browser::new()),
        config(json!({"project": "p", "feed": "feedfeed", "type": "waterfall", "rows": 2, "cols": 2})),
        None,
    )
    .unwrap();

    let page = h.page.borrow();
    assert_eq!(page.columns.len(), 2);
    let slots: Vec<Slot> = page.rendered.iter().map(|(slot, _)| *slot).collect();
    assert_eq!(
        slots,
        [Slot::Column(0), Slot::Column(1), Slot::Column(1), Slot::Column(0)]
    );
    assert!(page.stylesheets[0].1.contains("tagplay-waterfall-column"));
}

#[test]
fn flattened_pieces_count_against_the_cap() {
    let mut post = image_post("multi", 2);
    post.videos.push(MediaItem(json!({"src": "v.mp4"})));
    let h = harness(Page::default(), feed(vec![post, text_post("after")]));
    let widget = Widget::new(
        h.parts(&Browser::new()),
        config(json!({"project": "p", "feed": "feedfeed", "flatten_posts": true, "cols": 3})),
        None,
    )
    .unwrap();

    let ids: Vec<String> = widget.posts().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, ["multi-video-0", "multi-image-0", "multi-image-1"]);
}

#[test]
fn click_opens_and_round_trip_returns_home() {
    let posts = vec![image_post("a", 2), text_post("b"), Post::new("empty"), image_post("c", 1)];
    let h = harness(page_with_id("w"), feed(posts));
    let browser = Browser::new();
    let widget = Widget::new(
        h.parts(&browser),
        config(json!({"project": "p", "feed": "feedfeed", "lightbox": true, "cols": 4})),
        None,
    )
    .unwrap();

    let click = h.page.borrow().clicks[0].clone();
    click();
    assert_eq!(widget.lightbox_position(), Some(("a".into(), Some(0))));
    assert_eq!(browser.borrow().entries.len(), 2);

    // a#1, b, c#0 (empty post skipped)
    let mut steps = 0;
    while widget.can_navigate(Direction::Forward) {
        navigate(&h.page, Direction::Forward);
        steps += 1;
    }
    assert_eq!(steps, 3);
    assert_eq!(widget.lightbox_position(), Some(("c".into(), Some(0))));
    for _ in 0..steps {
        navigate(&h.page, Direction::Backward);
    }
    assert_eq!(widget.lightbox_position(), Some(("a".into(), Some(0))));
    assert!(widget.is_lightbox_open());

    // only the first open added an entry
    assert_eq!(browser.borrow().entries.len(), 2);
    assert!(h
        .page
        .borrow()
        .shown
        .iter()
        .all(|(id, _, _, _)| id != "empty"));
}

#[test]
fn navigating_past_either_edge_closes() {
    let posts = vec![image_post("a", 1), image_post("b", 1)];
    let h = harness(page_with_id("w"), feed(posts));
    let browser = Browser::new();
    let widget = Widget::new(
        h.parts(&browser),
        config(json!({"project": "p", "feed": "feedfeed", "lightbox": true, "cols": 2})),
        None,
    )
    .unwrap();

    let second = widget.posts()[1].clone();
    widget.open_lightbox(second, Some(0));
    widget.navigate_lightbox(Direction::Forward);
    assert!(!widget.is_lightbox_open());
    assert_eq!(browser.borrow().top(), HistoryState::default());

    let first = widget.posts()[0].clone();
    widget.open_lightbox(first, Some(0));
    widget.navigate_lightbox(Direction::Backward);
    assert!(!widget.is_lightbox_open());
    assert_eq!(h.page.borrow().hidden, 2);
}

#[test]
fn back_button_closes_and_forward_reopens() {
    let posts = vec![image_post("a", 1), image_post("b", 1)];
    let h = harness(page_with_id("w"), feed(posts));
    let browser = Browser::new();
    let widget = Widget::new(
        h.parts(&browser),
        config(json!({"project": "p", "feed": "feedfeed", "lightbox": true, "cols": 2})),
        None,
    )
    .unwrap();
    let mut registry = WidgetRegistry::default();
    registry.register(widget.clone());

    widget.open_lightbox(widget.posts()[0].clone(), Some(0));
    widget.navigate_lightbox(Direction::Forward);

    let state = browser.borrow_mut().back();
    registry.dispatch_history(Some(&state));
    assert!(!widget.is_lightbox_open());
    let entries_after_back = browser.borrow().entries.len();

    let state = browser.borrow_mut().forward();
    registry.dispatch_history(Some(&state));
    assert_eq!(widget.lightbox_position(), Some(("b".into(), Some(0))));
    // restoring from history never writes history
    assert_eq!(browser.borrow().entries.len(), entries_after_back);

    // the same pop again changes nothing
    let shown = h.page.borrow().shown.len();
    registry.dispatch_history(Some(&state));
    assert_eq!(h.page.borrow().shown.len(), shown);
}

#[test]
fn history_for_one_widget_leaves_the_other_alone() {
    let browser = Browser::new();
    let hx = harness(page_with_id("x"), feed(vec![image_post("x1", 1)]));
    let hy = harness(page_with_id("y"), feed(vec![image_post("y1", 1)]));
    let lightbox = json!({"project": "p", "feed": "feedfeed", "lightbox": true});
    let x = Widget::new(hx.parts(&browser), config(lightbox.clone()), None).unwrap();
    let y = Widget::new(hy.parts(&browser), config(lightbox), None).unwrap();
    let mut registry = WidgetRegistry::default();
    registry.register(x.clone());
    registry.register(y.clone());

    y.open_lightbox(y.posts()[0].clone(), Some(0));
    let for_x = HistoryState::lightbox("x", &x.posts()[0], Some(0));
    registry.dispatch_history(Some(&for_x));

    assert!(y.is_lightbox_open());
    assert_eq!(hy.page.borrow().hidden, 0);
    assert!(x.is_lightbox_open());

    // a plain entry closes both
    registry.dispatch_history(Some(&HistoryState::default()));
    assert!(!x.is_lightbox_open());
    assert!(!y.is_lightbox_open());
}

#[test]
fn entry_for_a_different_container_is_not_opened_here() {
    let browser = Browser::new();
    let h = harness(page_with_id("y"), feed(vec![image_post("y1", 1)]));
    let y = Widget::new(
        h.parts(&browser),
        config(json!({"project": "p", "feed": "feedfeed", "lightbox": true})),
        None,
    )
    .unwrap();
    y.handle_history(Some(&HistoryState::lightbox("x", &y.posts()[0], Some(0))));
    assert!(!y.is_lightbox_open());
    assert!(h.page.borrow().shown.is_empty());
}

#[test]
fn deep_link_restores_lightbox_after_load() {
    let browser = Browser::new();
    browser.borrow_mut().entries[0] = HistoryState::lightbox("w", &image_post("b", 2), Some(1));
    let h = harness(
        page_with_id("w"),
        feed(vec![image_post("a", 1), image_post("b", 2)]),
    );
    let widget = Widget::new(
        h.parts(&browser),
        config(json!({"project": "p", "feed": "feedfeed", "lightbox": true, "cols": 2})),
        None,
    )
    .unwrap();

    assert_eq!(widget.lightbox_position(), Some(("b".into(), Some(1))));
    assert_eq!(browser.borrow().entries.len(), 1);
    assert_eq!(h.page.borrow().shown[0], ("b".to_string(), Some(1), true, false));
}

#[test]
fn overlay_close_control_pushes_an_empty_entry() {
    let browser = Browser::new();
    let h = harness(page_with_id("w"), feed(vec![image_post("a", 1)]));
    let widget = Widget::new(
        h.parts(&browser),
        config(json!({"project": "p", "feed": "feedfeed", "lightbox": true})),
        None,
    )
    .unwrap();
    widget.open_lightbox(widget.posts()[0].clone(), Some(0));
    let close = h.page.borrow().controls.as_ref().unwrap().close.clone();
    close();
    assert!(!widget.is_lightbox_open());
    let browser = browser.borrow();
    assert_eq!(browser.entries.len(), 3);
    assert_eq!(browser.top(), HistoryState::default());
}

#[test]
fn queue_is_drained_once_and_failures_are_isolated() {
    let browser = Browser::new();
    let good = harness(page_with_id("good"), feed(vec![text_post("a")]));
    let bad = harness(page_with_id("bad"), feed(Vec::new()));
    let mut queue = vec![
        (good.parts(&browser), json!({"project": "p", "feed": "feedfeed"})),
        (bad.parts(&browser), json!({"rows": "many"})),
    ];
    let mut registry = WidgetRegistry::default();
    let started = drain_queue(
        &mut queue,
        |(parts, raw)| Widget::new(parts, WidgetConfig::from_options(options(raw))?, None),
        &mut registry,
    );
    assert_eq!(started, 1);
    assert!(queue.is_empty());
    assert_eq!(registry.len(), 1);
    assert!(registry.get("good").is_some());
}

#[test]
fn reinitializing_a_container_replaces_it() {
    let browser = Browser::new();
    let first = harness(page_with_id("same"), feed(Vec::new()));
    let second = harness(page_with_id("same"), feed(Vec::new()));
    let cfg = json!({"project": "p", "feed": "feedfeed"});
    let mut registry = WidgetRegistry::default();
    registry.register(Widget::new(first.parts(&browser), config(cfg.clone()), None).unwrap());
    let replaced =
        registry.register(Widget::new(second.parts(&browser), config(cfg), None).unwrap());
    assert!(replaced.is_some());
    assert_eq!(registry.len(), 1);
}
