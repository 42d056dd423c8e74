//! Scroll-into-view geometry

/// Bounding box in view coordinates (right/bottom exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollContainer {
    /// Outer box, including any scrollbar
    pub bounds: Bounds,
    pub scroll_top: i32,
    pub scroll_left: i32,
    /// Width of the vertical scrollbar gutter (layout box minus content box)
    pub gutter_width: i32,
    pub gutter_height: i32,
}

/// Scroll offsets to apply; `None` leaves that axis where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollTarget {
    pub top: Option<i32>,
    pub left: Option<i32>,
}

impl ScrollTarget {
    pub fn is_noop(&self) -> bool {
        self.top.is_none() && self.left.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOffsets {
    pub top: u16,
    pub left: u16,
}

impl ScrollOffsets {
    pub fn apply(&mut self, target: ScrollTarget) -> bool {
        let before = *self;
        if let Some(top) = target.top {
            self.top = top.clamp(0, u16::MAX as i32) as u16;
        }
        if let Some(left) = target.left {
            self.left = left.clamp(0, u16::MAX as i32) as u16;
        }
        before != *self
    }
}

pub trait ViewGeometry {
    fn container(&self) -> ScrollContainer;

    /// On-screen box of a cell, `None` if it was not laid out.
    fn cell_bounds(&self, row: usize, column: usize) -> Option<Bounds>;
}

/// Compute the scroll offsets that bring `child` fully into `parent`'s viewport.
pub fn calc_scroll_pos(parent: &ScrollContainer, child: &Bounds) -> ScrollTarget {
    ScrollTarget {
        left: axis(
            (child.left, child.right),
            (parent.bounds.left, parent.bounds.right),
            parent.scroll_left,
            parent.gutter_width,
        ),
        top: axis(
            (child.top, child.bottom),
            (parent.bounds.top, parent.bounds.bottom),
            parent.scroll_top,
            parent.gutter_height,
        ),
    }
}

fn axis(child: (i32, i32), parent: (i32, i32), scroll: i32, gutter: i32) -> Option<i32> {
    let (cs, ce) = child;
    let (ps, pe) = parent;
    if cs < ps {
        Some(scroll - (ps - cs))
    } else if ce > pe {
        Some(scroll + (ce - pe) + gutter)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(scroll_top: i32, scroll_left: i32) -> ScrollContainer {
        ScrollContainer {
            bounds: Bounds::new(0, 0, 40, 10),
            scroll_top,
            scroll_left,
            gutter_width: 1,
            gutter_height: 0,
        }
    }

    #[test]
    fn test_visible_child_needs_no_scroll() {
        let target = calc_scroll_pos(&container(0, 0), &Bounds::new(5, 2, 10, 1));
        assert!(target.is_noop());
    }

    #[test]
    fn test_child_above_aligns_leading_edge() {
        let target = calc_scroll_pos(&container(6, 0), &Bounds::new(0, -3, 10, 1));
        assert_eq!(target.top, Some(3));
        assert_eq!(target.left, None);
    }

    #[test]
    fn test_child_below_aligns_trailing_edge() {
        let target = calc_scroll_pos(&container(0, 0), &Bounds::new(0, 12, 10, 1));
        assert_eq!(target.top, Some(3));
    }

    #[test]
    fn test_child_right_includes_scrollbar_gutter() {
        let target = calc_scroll_pos(&container(0, 0), &Bounds::new(35, 0, 10, 1));
        assert_eq!(target.left, Some(6));
    }

    #[test]
    fn test_applying_twice_is_idempotent() {
        let parent = container(0, 0);
        let child = Bounds::new(35, 12, 10, 1);
        let first = calc_scroll_pos(&parent, &child);

        let (top, left) = (first.top.unwrap(), first.left.unwrap());
        let moved = ScrollContainer {
            scroll_top: top,
            scroll_left: left,
            ..parent
        };
        let child_after = child.offset(-left, -top);
        assert!(calc_scroll_pos(&moved, &child_after).is_noop());
    }

    #[test]
    fn test_scroll_offsets_clamp_at_zero() {
        let mut offsets = ScrollOffsets { top: 2, left: 0 };
        assert!(offsets.apply(ScrollTarget {
            top: Some(-4),
            left: None
        }));
        assert_eq!(offsets, ScrollOffsets { top: 0, left: 0 });
        assert!(!offsets.apply(ScrollTarget::default()));
    }
}
