//! DOM rendering for the widget container.
//!
//! Production implementation:
//! - the placeholder gets the `tagplay-widget` class and, when missing, an id
//! - each widget owns one `<style>` in `<head>`, replaced on re-initialization
//! - waterfall mode appends one `<div class="tagplay-waterfall-column">` per column
//! - posts are rendered by the `renderPost` collaborator and appended in order

use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::bindings::{self, js_error};
use crate::config::{options_from_attributes, Options, WidgetConfig};
use crate::error::{Result, WidgetError};
use crate::layout::Slot;
use crate::post::Post;
use crate::style::{self, COLUMN_CLASS, WIDGET_CLASS};
use crate::widget::{PostClick, Surface};

/// Configuration read from a placeholder's `data-*` attributes.
pub fn placeholder_options(element: &Element) -> Option<Options> {
    let attributes = element.attributes();
    let pairs = (0..attributes.length())
        .filter_map(|i| attributes.item(i))
        .filter_map(|attr| {
            attr.name()
                .strip_prefix("data-")
                .map(|key| (key.to_string(), attr.value()))
        });
    options_from_attributes(pairs)
}

/// Add the page-wide overlay rules unless another widget already did.
pub fn ensure_overlay_stylesheet(document: &Document) -> Result<()> {
    if document.get_element_by_id(style::OVERLAY_STYLESHEET_ID).is_some() {
        return Ok(());
    }
    append_style(document, style::OVERLAY_STYLESHEET_ID, &style::overlay_css())
}

fn append_style(document: &Document, id: &str, css: &str) -> Result<()> {
    let head = document
        .head()
        .ok_or_else(|| WidgetError::Render("document has no <head>".into()))?;
    let style = document.create_element("style").map_err(js_error)?;
    style.set_id(id);
    style.set_attribute("type", "text/css").map_err(js_error)?;
    style.set_text_content(Some(css));
    head.append_child(&style).map_err(js_error)?;
    Ok(())
}

/// The placeholder element of one widget.
pub struct DomSurface {
    document: Document,
    container: Element,
    columns: Vec<Element>,
    renderer: Function,
    client: JsValue,
    // Kept alive for as long as the rendered posts may be clicked.
    click_handlers: Vec<Closure<dyn FnMut()>>,
}

impl DomSurface {
    pub fn new(
        document: Document,
        container: Element,
        renderer: Function,
        client: JsValue,
    ) -> Result<Self> {
        container.class_list().add_1(WIDGET_CLASS).map_err(js_error)?;
        ensure_overlay_stylesheet(&document)?;
        Ok(Self {
            document,
            container,
            columns: Vec::new(),
            renderer,
            client,
            click_handlers: Vec::new(),
        })
    }
}

impl Surface for DomSurface {
    fn id(&self) -> Option<String> {
        Some(self.container.id()).filter(|id| !id.is_empty())
    }

    fn set_id(&mut self, id: &str) {
        self.container.set_id(id);
    }

    fn name_attribute(&self) -> Option<String> {
        self.container.get_attribute("name")
    }

    fn ancestor_id(&self) -> Option<String> {
        let mut current = self.container.parent_element();
        while let Some(element) = current {
            let id = element.id();
            if !id.is_empty() {
                return Some(id);
            }
            current = element.parent_element();
        }
        None
    }

    fn install_stylesheet(&mut self, style_id: &str, css: &str) -> Result<()> {
        if let Some(existing) = self.document.get_element_by_id(style_id) {
            existing.remove();
        }
        append_style(&self.document, style_id, css)
    }

    fn create_columns(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let column = self.document.create_element("div").map_err(js_error)?;
            column.set_attribute("class", COLUMN_CLASS).map_err(js_error)?;
            self.container.append_child(&column).map_err(js_error)?;
            self.columns.push(column);
        }
        Ok(())
    }

    fn column_heights(&self) -> Vec<f64> {
        self.columns
            .iter()
            .map(|column| {
                column
                    .dyn_ref::<HtmlElement>()
                    .map_or(0.0, |el| f64::from(el.offset_height()))
            })
            .collect()
    }

    fn append_post(
        &mut self,
        slot: Slot,
        post: &Post,
        config: &WidgetConfig,
        on_click: Option<PostClick>,
    ) -> Result<()> {
        let closure = on_click.map(|click: Rc<dyn Fn()>| {
            Closure::<dyn FnMut()>::new(move || click())
        });
        let element = bindings::render_post(
            &self.renderer,
            &self.client,
            post,
            config,
            closure.as_ref(),
            None,
        )?;
        if let Some(closure) = closure {
            self.click_handlers.push(closure);
        }

        let parent = match slot {
            Slot::Column(index) => self.columns.get(index).unwrap_or(&self.container),
            Slot::Container => &self.container,
        };
        parent.append_child(&element).map_err(js_error)?;
        Ok(())
    }
}
