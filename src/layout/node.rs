use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayoutRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn shorter_side(&self) -> f64 {
        self.width.min(self.height)
    }

    /// Shrinks the rect by `padding` on every side, collapsing to zero size
    /// rather than going negative.
    pub fn inset(&self, padding: f64) -> LayoutRect {
        let pad = padding.max(0.0);
        LayoutRect::new(
            self.x + pad,
            self.y + pad,
            (self.width - 2.0 * pad).max(0.0),
            (self.height - 2.0 * pad).max(0.0),
        )
    }
}

/// One positioned node in the final layout: a branch at any depth or a leaf
/// record tile.
#[derive(Clone, Debug, Serialize)]
pub struct LayoutCell {
    pub rect: LayoutRect,
    /// Group keys from the root down to (and including) this cell's branch.
    pub path: Vec<String>,
    pub label: String,
    pub weight: f64,
    pub depth: usize,
    pub aggregate: bool,
}
