//! Splitting multi-media posts into single-media pseudo-posts.
//!
//! Videos are emitted first, then images, each pass in source order.
//! Posts carry images and videos in separate lists, so a cross-type
//! ordering cannot be recovered.

use crate::post::Post;

/// Explode `post` into one pseudo-post per media item.
///
/// Pseudo-post ids are `<id>-video-<n>` and `<id>-image-<n>`. A post
/// without images or videos is returned as-is.
pub fn flatten_post(post: Post) -> Vec<Post> {
    if !post.has_media() {
        return vec![post];
    }

    let mut pieces = Vec::with_capacity(post.videos.len() + post.images.len());
    for (i, video) in post.videos.iter().enumerate() {
        let mut piece = shallow_copy(&post, format!("-video-{i}"));
        piece.videos = vec![video.clone()];
        pieces.push(piece);
    }
    for (i, image) in post.images.iter().enumerate() {
        let mut piece = shallow_copy(&post, format!("-image-{i}"));
        piece.images = vec![image.clone()];
        pieces.push(piece);
    }
    pieces
}

fn shallow_copy(post: &Post, suffix: String) -> Post {
    Post {
        id: format!("{}{suffix}", post.id),
        text: post.text.clone(),
        images: Vec::new(),
        videos: Vec::new(),
        linked_metadata: post.linked_metadata.clone(),
        extra: post.extra.clone(),
    }
}
