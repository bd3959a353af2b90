use ratatui::layout::Rect;

use crate::data::LocationRecord;
use crate::map::LabelHandle;

/// On-screen label for one location. Owned by the UI layer; the projector
/// only toggles visibility and writes position and stacking order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelElement {
    pub name: String,
    pub url: String,
    pub visible: bool,
    /// Center position in canvas pixels
    pub x: f64,
    pub y: f64,
    pub z_order: i32,
}

impl LabelElement {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            visible: false,
            x: 0.0,
            y: 0.0,
            z_order: 0,
        }
    }

    /// Where the label text lands in the globe area, centered on the label
    /// position. `None` when hidden or off-screen.
    pub fn cell_span(&self, area: Rect) -> Option<LabelSpan> {
        if !self.visible {
            return None;
        }
        // Braille gives 2x4 pixels per character. The column snaps to the
        // nearest cell so sub-ulp projection error cannot shift the text.
        let center_col = (self.x / 2.0).round() as i64;
        let row = (self.y / 4.0).floor() as i64;
        if row < 0 || row >= area.height as i64 {
            return None;
        }

        let width = self.name.chars().count() as i64;
        let left = center_col - width / 2;
        let start = left.max(0);
        let end = (left + width).min(area.width as i64);
        if end <= start {
            return None;
        }
        Some(LabelSpan {
            col: start as u16,
            row: row as u16,
            width: (end - start) as u16,
            skip: (start - left) as usize,
        })
    }
}

/// Cells a label occupies, relative to the globe area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSpan {
    pub col: u16,
    pub row: u16,
    pub width: u16,
    /// Leading characters clipped by the left edge
    pub skip: usize,
}

impl LabelSpan {
    pub fn contains(&self, col: u16, row: u16) -> bool {
        row == self.row && col >= self.col && col < self.col + self.width
    }
}

impl LabelHandle for LabelElement {
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    fn set_z_order(&mut self, z_order: i32) {
        self.z_order = z_order;
    }
}

/// All labels, in load order (a location's label index points in here)
#[derive(Debug)]
pub struct LabelLayer {
    pub elements: Vec<LabelElement>,
    pub show: bool,
}

impl Default for LabelLayer {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            show: true,
        }
    }
}

impl LabelLayer {
    pub fn from_records(records: &[LocationRecord]) -> Self {
        Self {
            elements: records
                .iter()
                .map(|r| LabelElement::new(r.name.as_str(), r.url.as_str()))
                .collect(),
            show: true,
        }
    }

    pub fn toggle(&mut self) {
        self.show = !self.show;
    }

    pub fn visible_count(&self) -> usize {
        self.elements.iter().filter(|e| e.visible).count()
    }

    /// Visible labels from back to front, so nearer ones paint over farther ones
    pub fn draw_order(&self) -> Vec<&LabelElement> {
        if !self.show {
            return Vec::new();
        }
        let mut visible: Vec<&LabelElement> = self.elements.iter().filter(|e| e.visible).collect();
        visible.sort_by_key(|e| e.z_order);
        visible
    }

    /// Topmost visible label covering the cell (relative to the globe area)
    pub fn hit_test(&self, col: u16, row: u16, area: Rect) -> Option<&LabelElement> {
        self.draw_order().into_iter().rev().find(|label| {
            label
                .cell_span(area)
                .is_some_and(|span| span.contains(col, row))
        })
    }
}
