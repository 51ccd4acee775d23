//! Placement of rendered posts: flat container or waterfall columns.

/// Rendering mode taken from the `type` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Flat,
    Waterfall,
}

impl LayoutKind {
    /// Only `waterfall` needs columns; every other type is styled by CSS
    /// on a flat container.
    pub fn from_type(layout_type: Option<&str>) -> Self {
        match layout_type {
            Some("waterfall") => LayoutKind::Waterfall,
            _ => LayoutKind::Flat,
        }
    }
}

/// Where the next post element goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Container,
    Column(usize),
}

/// Pick the parent for the next post.
///
/// `column_heights` are the current rendered heights of the waterfall
/// columns, measured fresh for each post.
pub fn choose_slot(kind: LayoutKind, column_heights: &[f64]) -> Slot {
    match kind {
        LayoutKind::Flat => Slot::Container,
        LayoutKind::Waterfall => match shortest_column(column_heights) {
            Some(index) => Slot::Column(index),
            None => Slot::Container,
        },
    }
}

/// Index of the shortest column; ties go to the lowest index.
pub fn shortest_column(heights: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &height) in heights.iter().enumerate() {
        match best {
            Some((_, shortest)) if height >= shortest => {}
            _ => best = Some((index, height)),
        }
    }
    best.map(|(index, _)| index)
}
