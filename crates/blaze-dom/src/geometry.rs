//! Geometry APIs
//!
//! Layout boxes, viewport and per-element scroll state.

/// Rectangle geometry (document coordinates, CSS pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Grow the rect by a margin on each side
    pub fn inflate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x - dx, self.y - dy, self.width + 2.0 * dx, self.height + 2.0 * dy)
    }

    /// Check if rects overlap (touching edges count)
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.x
            || self.x > other.right()
            || self.bottom() < other.y
            || self.y > other.bottom())
    }
}

/// The visible region of the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { scroll_x: 0.0, scroll_y: 0.0, width, height }
    }

    /// Visible area in document coordinates
    pub fn rect(&self) -> Rect {
        Rect::new(self.scroll_x, self.scroll_y, self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// How a scroll is animated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
}

/// Vertical alignment for scroll-into-view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBlock {
    #[default]
    Start,
    Center,
    End,
}

/// Scroll offsets of a scroll container
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollState {
    pub left: f64,
    pub top: f64,
    /// Behavior of the most recent scroll request
    pub behavior: Option<ScrollBehavior>,
}
