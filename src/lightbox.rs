//! Lightbox coordination: overlay visibility kept in step with history.
//!
//! - opening from a user action pushes a history entry; moving inside an
//!   open lightbox replaces it instead, so one lightbox session costs a
//!   single back step
//! - closing from a user action pushes an empty entry
//! - a popped entry for this container reopens the overlay at the saved
//!   position; a popped entry without any lightbox closes it
//! - entries belonging to another container are ignored

use std::rc::Rc;

use crate::config::WidgetConfig;
use crate::error::Result;
use crate::history::{HistoryBackend, HistoryState};
use crate::navigation::{Addressing, Direction, Navigator};
use crate::post::Post;

/// What triggered an open or close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Click, key press or an overlay control.
    User,
    /// A history pop, or a deep link restored on load.
    History,
}

/// Content handed to the overlay for display.
pub struct LightboxView<'a> {
    pub overlay_id: &'a str,
    pub post: &'a Post,
    pub media_index: Option<usize>,
    /// Base configuration with the lightbox override applied.
    pub config: &'a WidgetConfig,
    pub can_previous: bool,
    pub can_next: bool,
}

/// Callbacks the overlay wires to its affordances.
#[derive(Clone)]
pub struct OverlayControls {
    pub navigate: Rc<dyn Fn(Direction)>,
    pub close: Rc<dyn Fn()>,
}

/// The overlay element itself.
pub trait Overlay {
    /// Show `view`, replacing whatever the overlay currently displays.
    fn show(&mut self, view: &LightboxView<'_>, controls: OverlayControls) -> Result<()>;

    /// Remove the overlay. Must tolerate being called when hidden.
    fn hide(&mut self);
}

/// Position currently displayed by an open lightbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub post: Post,
    pub media_index: Option<usize>,
}

/// Owns one widget's overlay and its view of browser history.
pub struct LightboxCoordinator {
    container_id: String,
    overlay_id: String,
    navigator: Navigator,
    history: Box<dyn HistoryBackend>,
    overlay: Box<dyn Overlay>,
    current: Option<Cursor>,
}

impl LightboxCoordinator {
    pub fn new(
        container_id: &str,
        navigator: Navigator,
        history: Box<dyn HistoryBackend>,
        overlay: Box<dyn Overlay>,
    ) -> Self {
        Self {
            container_id: container_id.to_string(),
            overlay_id: format!("{container_id}-lightbox"),
            navigator,
            history,
            overlay,
            current: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Cursor> {
        self.current.as_ref()
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn overlay_id(&self) -> &str {
        &self.overlay_id
    }

    /// Open (or move) the lightbox to `post` at `media_index`.
    pub fn open(
        &mut self,
        posts: &[Post],
        config: &WidgetConfig,
        post: Post,
        media_index: Option<usize>,
        origin: Origin,
        controls: OverlayControls,
    ) -> Result<()> {
        if origin == Origin::History && self.is_at(&post.id, media_index) {
            log::debug!("lightbox {} already shows {}", self.overlay_id, post.id);
            return Ok(());
        }

        // A post restored from history may be a stale copy.
        let post = posts
            .iter()
            .find(|p| p.id == post.id)
            .cloned()
            .unwrap_or(post);

        let navigator = if self.is_open() {
            self.navigator
        } else if media_index.is_some() {
            self.navigator.with_addressing(Addressing::PerMedia)
        } else {
            self.navigator.with_addressing(Addressing::PerPost)
        };

        let lightbox_config = config.for_lightbox();
        let view = LightboxView {
            overlay_id: &self.overlay_id,
            post: &post,
            media_index,
            config: &lightbox_config,
            can_previous: navigator
                .resolve(posts, &post, Direction::Backward, media_index)
                .is_some(),
            can_next: navigator
                .resolve(posts, &post, Direction::Forward, media_index)
                .is_some(),
        };
        // History follows the overlay: nothing is written unless it is shown.
        self.overlay.show(&view, controls)?;

        if origin == Origin::User {
            let state = HistoryState::lightbox(&self.container_id, &post, media_index);
            if self.is_open() {
                self.history.replace(&state);
            } else {
                self.history.push(&state);
            }
        }

        log::debug!(
            "lightbox {} showing {} (media {:?}, {:?})",
            self.overlay_id,
            post.id,
            media_index,
            origin
        );
        self.navigator = navigator;
        self.current = Some(Cursor { post, media_index });
        Ok(())
    }

    /// Close the lightbox. Does nothing when it is not open.
    pub fn close(&mut self, origin: Origin) {
        if self.current.take().is_none() {
            return;
        }
        self.overlay.hide();
        if origin == Origin::User {
            self.history.push(&HistoryState::default());
        }
        log::debug!("lightbox {} closed ({:?})", self.overlay_id, origin);
    }

    /// Step the open lightbox; closes it when there is nowhere to go.
    pub fn navigate(
        &mut self,
        posts: &[Post],
        config: &WidgetConfig,
        direction: Direction,
        controls: OverlayControls,
    ) -> Result<()> {
        let Some(cursor) = self.current.clone() else {
            return Ok(());
        };
        let next = self
            .navigator
            .resolve(posts, &cursor.post, direction, cursor.media_index)
            .map(|target| (target.post.clone(), target.media_index));
        match next {
            Some((post, media_index)) => {
                self.open(posts, config, post, media_index, Origin::User, controls)
            }
            None => {
                self.close(Origin::User);
                Ok(())
            }
        }
    }

    pub fn can_navigate(&self, posts: &[Post], direction: Direction) -> bool {
        self.current.as_ref().is_some_and(|cursor| {
            self.navigator
                .resolve(posts, &cursor.post, direction, cursor.media_index)
                .is_some()
        })
    }

    /// React to a history pop carrying `state`.
    pub fn handle_history(
        &mut self,
        posts: &[Post],
        config: &WidgetConfig,
        state: Option<&HistoryState>,
        controls: OverlayControls,
    ) -> Result<()> {
        let Some(state) = state else {
            self.close(Origin::History);
            return Ok(());
        };
        match state.entry_for(&self.container_id) {
            Some(entry) => self.open(
                posts,
                config,
                entry.post.clone(),
                entry.media_index,
                Origin::History,
                controls,
            ),
            None if state.has_lightbox() => {
                log::debug!("{}: ignoring history entry of another widget", self.container_id);
                Ok(())
            }
            None => {
                self.close(Origin::History);
                Ok(())
            }
        }
    }

    /// Reopen the lightbox if the current history entry was saved by
    /// this container (deep link or reload).
    pub fn restore(
        &mut self,
        posts: &[Post],
        config: &WidgetConfig,
        controls: OverlayControls,
    ) -> Result<()> {
        let Some(state) = self.history.current() else {
            return Ok(());
        };
        let Some(entry) = state.entry_for(&self.container_id).cloned() else {
            return Ok(());
        };
        log::info!("{}: restoring lightbox from history", self.container_id);
        self.open(
            posts,
            config,
            entry.post,
            entry.media_index,
            Origin::History,
            controls,
        )
    }

    fn is_at(&self, post_id: &str, media_index: Option<usize>) -> bool {
        self.current
            .as_ref()
            .is_some_and(|cursor| cursor.post.id == post_id && cursor.media_index == media_index)
    }
}
