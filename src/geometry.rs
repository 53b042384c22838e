//! Bounding-box math for recognition regions.
//!
//! Boxes use page-local pixel coordinates with the origin at the top-left
//! corner. `right` and `bottom` are exclusive edges.

use serde::{Deserialize, Serialize};

/// An axis-aligned box in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub left: u32,
    /// Top edge
    pub top: u32,
    /// Right edge (exclusive)
    pub right: u32,
    /// Bottom edge (exclusive)
    pub bottom: u32,
}

impl BBox {
    /// Create a box from its edges.
    ///
    /// Edges are normalized so that `left <= right` and `top <= bottom`.
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Create a box from a position and a size.
    pub fn from_xywh(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self::new(
            left,
            top,
            left.saturating_add(width),
            top.saturating_add(height),
        )
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Check if the box has no area.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Union of all boxes, or `None` for an empty input.
    pub fn union_all<'a, I>(boxes: I) -> Option<BBox>
    where
        I: IntoIterator<Item = &'a BBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BBox>, b| match acc {
                Some(u) => Some(u.union(b)),
                None => Some(*b),
            })
    }

    /// Grow the box outward by `margin` on every side.
    ///
    /// The left and top edges stop at zero.
    pub fn expand(&self, margin: u32) -> BBox {
        BBox {
            left: self.left.saturating_sub(margin),
            top: self.top.saturating_sub(margin),
            right: self.right.saturating_add(margin),
            bottom: self.bottom.saturating_add(margin),
        }
    }

    /// Intersect with the page rectangle `(0, 0, width, height)`.
    ///
    /// A box lying entirely outside the page collapses to a degenerate
    /// box on the page edge.
    pub fn clamp_to(&self, width: u32, height: u32) -> BBox {
        let left = self.left.min(width);
        let top = self.top.min(height);
        BBox {
            left,
            top,
            right: self.right.min(width).max(left),
            bottom: self.bottom.min(height).max(top),
        }
    }

    /// Check whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &BBox) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }
}
