//! Per-instance naming and stylesheet helpers.
//!
//! Production: the feed CSS comes from the `generateCSS` collaborator;
//! this module only scopes it and adds the rules the overlay itself needs.

/// CSS class of the widget container.
pub const WIDGET_CLASS: &str = "tagplay-widget";
/// CSS class of the lightbox overlay.
pub const LIGHTBOX_CLASS: &str = "tagplay-lightbox";
/// CSS class of one waterfall column.
pub const COLUMN_CLASS: &str = "tagplay-waterfall-column";

/// Id given to a placeholder that has none.
pub fn default_container_id(name: &str) -> String {
    format!("tagplay-widget-{name}")
}

/// Id of the `<style>` element owned by the widget called `name`.
pub fn stylesheet_id(name: &str) -> String {
    format!("tagplay-widget-style-{name}")
}

/// Selector prefix covering both the container and its overlay,
/// narrowed by the nearest ancestor id when there is one.
pub fn selector_prefix(container_id: &str, ancestor_id: Option<&str>) -> String {
    let own = format!(
        "#{container_id}.{WIDGET_CLASS}, #{container_id}-lightbox.{LIGHTBOX_CLASS}"
    );
    match ancestor_id {
        Some(ancestor) if !ancestor.is_empty() => format!("#{ancestor} {own}"),
        _ => own,
    }
}

/// Id of the page-wide `<style>` element holding [`overlay_css`].
pub const OVERLAY_STYLESHEET_ID: &str = "tagplay-lightbox-style";

/// Equal-width waterfall columns for one container.
pub fn column_css(container_id: &str, cols: u32) -> String {
    let width = 100.0 / f64::from(cols.max(1));
    format!(
        r#"
#{container_id} > .{COLUMN_CLASS} {{
    display: inline-block;
    vertical-align: top;
    box-sizing: border-box;
    width: {width:.4}%;
}}
"#
    )
}

/// Rules for the overlay chrome, shared by every widget on the page.
pub fn overlay_css() -> String {
    format!(
        r#"
.{LIGHTBOX_CLASS} {{
    position: fixed;
    inset: 0;
    z-index: 10000;
    display: flex;
    align-items: center;
    justify-content: center;
    background: rgba(0, 0, 0, 0.85);
}}
.{LIGHTBOX_CLASS}-content {{
    max-width: 90vw;
    max-height: 90vh;
    overflow: auto;
}}
.{LIGHTBOX_CLASS}-prev,
.{LIGHTBOX_CLASS}-next,
.{LIGHTBOX_CLASS}-close {{
    position: absolute;
    border: none;
    background: transparent;
    color: #fff;
    font-size: 2em;
    cursor: pointer;
}}
.{LIGHTBOX_CLASS}-prev {{ left: 1em; top: 50%; }}
.{LIGHTBOX_CLASS}-next {{ right: 1em; top: 50%; }}
.{LIGHTBOX_CLASS}-close {{ right: 1em; top: 1em; }}
.{LIGHTBOX_CLASS} button:disabled {{
    opacity: 0.3;
    cursor: default;
}}
"#
    )
}
