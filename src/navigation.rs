//! Navigation state and the next/previous resolver used by the lightbox.
//!
//! The [`PostSequence`] is the ordered, capped list of posts accepted for
//! display. The [`Navigator`] walks it without mutating it:
//! - per-media addressing steps through every media item of a post
//!   before moving to the neighbouring post
//! - per-post addressing moves between posts directly
//! - empty posts are never a resolved target; the walk continues past
//!   them and gives up at the edge of the sequence

use crate::post::{MediaFilter, Post};

/// Direction of a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Direction::Backward => -1,
            Direction::Forward => 1,
        }
    }
}

/// Whether the lightbox tracks a media position inside each post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    PerMedia,
    PerPost,
}

/// A resolved navigation target.
#[derive(Debug, Clone, PartialEq)]
pub struct Target<'a> {
    pub post: &'a Post,
    pub media_index: Option<usize>,
}

/// Posts accepted for display, in display order, never longer than `cap`.
#[derive(Debug, Clone, Default)]
pub struct PostSequence {
    posts: Vec<Post>,
    cap: usize,
}

impl PostSequence {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            posts: Vec::new(),
            cap,
        }
    }

    /// Append `post` if there is room. Returns whether it was accepted.
    pub fn accept(&mut self, post: Post) -> bool {
        if self.posts.len() >= self.cap {
            return false;
        }
        self.posts.push(post);
        true
    }

    pub fn is_full(&self) -> bool {
        self.posts.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn as_slice(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }
}

/// Computes the next navigable (post, media index) pair.
#[derive(Debug, Clone, Copy)]
pub struct Navigator {
    filter: MediaFilter,
    addressing: Addressing,
}

impl Navigator {
    pub fn new(filter: MediaFilter, addressing: Addressing) -> Self {
        Self { filter, addressing }
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    pub fn with_addressing(self, addressing: Addressing) -> Self {
        Self { addressing, ..self }
    }

    /// Resolve one step from `current` in `direction`.
    ///
    /// `current` need not be a member of `posts` (it may come from a
    /// history entry); membership is checked by id only when the step
    /// leaves the current post. Returns `None` at either edge of the
    /// sequence, when `current` cannot be found, or when only empty
    /// posts remain in that direction.
    pub fn resolve<'a>(
        &self,
        posts: &'a [Post],
        current: &'a Post,
        direction: Direction,
        media_index: Option<usize>,
    ) -> Option<Target<'a>> {
        let mut post = current;
        let mut media = media_index;
        // Each iteration either leaves the post or moves within it, so the
        // walk cannot exceed all media plus all posts.
        let budget = posts.len() + 1 + media_budget(posts, &self.filter);
        for _ in 0..budget {
            let target = self.step(posts, post, direction, media)?;
            if !target.post.is_empty(&self.filter) {
                return Some(target);
            }
            log::debug!("skipping empty post {}", target.post.id);
            post = target.post;
            media = target.media_index;
        }
        None
    }

    fn step<'a>(
        &self,
        posts: &'a [Post],
        post: &'a Post,
        direction: Direction,
        media: Option<usize>,
    ) -> Option<Target<'a>> {
        match self.addressing {
            Addressing::PerPost => {
                let next = neighbour(posts, post, direction)?;
                Some(Target {
                    post: next,
                    media_index: None,
                })
            }
            Addressing::PerMedia => {
                let count = post.media_count(&self.filter);
                if let Some(index) = media.and_then(|i| i.checked_add_signed(direction.offset())) {
                    if index < count {
                        return Some(Target {
                            post,
                            media_index: Some(index),
                        });
                    }
                }
                let next = neighbour(posts, post, direction)?;
                let media_index = match direction {
                    Direction::Forward => Some(0),
                    Direction::Backward => next.media_count(&self.filter).checked_sub(1),
                };
                Some(Target {
                    post: next,
                    media_index,
                })
            }
        }
    }
}

fn neighbour<'a>(posts: &'a [Post], post: &Post, direction: Direction) -> Option<&'a Post> {
    let position = posts.iter().position(|p| p.id == post.id)?;
    let next = position.checked_add_signed(direction.offset())?;
    posts.get(next)
}

fn media_budget(posts: &[Post], filter: &MediaFilter) -> usize {
    posts.iter().map(|post| post.media_count(filter)).sum()
}
