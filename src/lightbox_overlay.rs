//! DOM overlay for the lightbox.
//!
//! Production implementation:
//! - one `<div class="tagplay-lightbox">` per widget, built on first show
//!   and detached from `<body>` while hidden
//! - previous / next / close buttons plus a content box filled by the
//!   `renderPost` collaborator
//! - ArrowLeft / ArrowRight / Escape while visible; clicking the backdrop closes
//!
//! Listeners are attached once and read the current controls from shared
//! state, so no listener is dropped from inside its own callback.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::events::EventListener;
use js_sys::Function;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, KeyboardEvent};

use crate::bindings::{self, js_error};
use crate::error::{Result, WidgetError};
use crate::lightbox::{LightboxView, Overlay, OverlayControls};
use crate::navigation::Direction;
use crate::style::LIGHTBOX_CLASS;

#[derive(Default)]
struct OverlayShared {
    controls: RefCell<Option<OverlayControls>>,
    visible: Cell<bool>,
}

impl OverlayShared {
    fn navigate(&self, direction: Direction) {
        let navigate = self.controls.borrow().as_ref().map(|c| c.navigate.clone());
        if let Some(navigate) = navigate {
            navigate(direction);
        }
    }

    fn close(&self) {
        let close = self.controls.borrow().as_ref().map(|c| c.close.clone());
        if let Some(close) = close {
            close();
        }
    }
}

struct OverlayElements {
    root: Element,
    content: Element,
    previous: Element,
    next: Element,
    _listeners: Vec<EventListener>,
}

/// The lightbox overlay of one widget.
pub struct DomOverlay {
    document: Document,
    renderer: Function,
    client: JsValue,
    shared: Rc<OverlayShared>,
    elements: Option<OverlayElements>,
}

impl DomOverlay {
    pub fn new(document: Document, renderer: Function, client: JsValue) -> Self {
        Self {
            document,
            renderer,
            client,
            shared: Rc::new(OverlayShared::default()),
            elements: None,
        }
    }

    fn build(&self) -> Result<OverlayElements> {
        let root = self.element("div", LIGHTBOX_CLASS)?;
        let content = self.element("div", &format!("{LIGHTBOX_CLASS}-content"))?;
        let previous = self.button("prev", "\u{2039}")?;
        let next = self.button("next", "\u{203a}")?;
        let close = self.button("close", "\u{00d7}")?;
        for child in [&previous, &content, &next, &close] {
            root.append_child(child).map_err(js_error)?;
        }

        let mut listeners = Vec::new();

        let shared = self.shared.clone();
        listeners.push(EventListener::new(&previous, "click", move |_| {
            shared.navigate(Direction::Backward);
        }));
        let shared = self.shared.clone();
        listeners.push(EventListener::new(&next, "click", move |_| {
            shared.navigate(Direction::Forward);
        }));
        let shared = self.shared.clone();
        listeners.push(EventListener::new(&close, "click", move |_| shared.close()));

        let shared = self.shared.clone();
        let backdrop = root.clone();
        listeners.push(EventListener::new(&root, "click", move |event: &Event| {
            let on_backdrop = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .is_some_and(|target| target == backdrop);
            if on_backdrop {
                shared.close();
            }
        }));

        let shared = self.shared.clone();
        listeners.push(EventListener::new(&self.document, "keydown", move |event: &Event| {
            if !shared.visible.get() {
                return;
            }
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            match event.key().as_str() {
                "ArrowLeft" => shared.navigate(Direction::Backward),
                "ArrowRight" => shared.navigate(Direction::Forward),
                "Escape" => shared.close(),
                _ => {}
            }
        }));

        Ok(OverlayElements {
            root,
            content,
            previous,
            next,
            _listeners: listeners,
        })
    }

    fn element(&self, tag: &str, class: &str) -> Result<Element> {
        let element = self.document.create_element(tag).map_err(js_error)?;
        element.set_attribute("class", class).map_err(js_error)?;
        Ok(element)
    }

    fn button(&self, role: &str, label: &str) -> Result<Element> {
        let button = self.element("button", &format!("{LIGHTBOX_CLASS}-{role}"))?;
        button.set_attribute("type", "button").map_err(js_error)?;
        button.set_attribute("aria-label", role).map_err(js_error)?;
        button.set_text_content(Some(label));
        Ok(button)
    }
}

fn set_enabled(button: &Element, enabled: bool) -> Result<()> {
    if enabled {
        button.remove_attribute("disabled").map_err(js_error)
    } else {
        button.set_attribute("disabled", "").map_err(js_error)
    }
}

impl Overlay for DomOverlay {
    fn show(&mut self, view: &LightboxView<'_>, controls: OverlayControls) -> Result<()> {
        if self.elements.is_none() {
            self.elements = Some(self.build()?);
        }
        let Some(elements) = self.elements.as_ref() else {
            return Err(WidgetError::Render("lightbox overlay was not built".into()));
        };

        let rendered = bindings::render_post(
            &self.renderer,
            &self.client,
            view.post,
            view.config,
            None,
            view.media_index,
        )?;
        elements.root.set_id(view.overlay_id);
        elements.content.set_inner_html("");
        elements.content.append_child(&rendered).map_err(js_error)?;
        set_enabled(&elements.previous, view.can_previous)?;
        set_enabled(&elements.next, view.can_next)?;

        if !elements.root.is_connected() {
            let body = self
                .document
                .body()
                .ok_or_else(|| WidgetError::Render("document has no <body>".into()))?;
            body.append_child(&elements.root).map_err(js_error)?;
        }

        *self.shared.controls.borrow_mut() = Some(controls);
        self.shared.visible.set(true);
        Ok(())
    }

    fn hide(&mut self) {
        self.shared.visible.set(false);
        self.shared.controls.borrow_mut().take();
        if let Some(elements) = &self.elements {
            elements.content.set_inner_html("");
            elements.root.remove();
        }
    }
}
