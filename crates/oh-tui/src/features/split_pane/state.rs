//! Split-pane state machine.
//!
//! Two regions share one axis, separated by a one-cell handle. The first
//! region's size is clamped to orientation-dependent bounds while split;
//! collapsing hides it and filling hides the second region.

use oh_core::config::{LayoutConfig, Orientation};
use ratatui::layout::Rect;

/// Cells taken by the drag handle.
pub const HANDLE_SIZE: u16 = 1;

/// Fraction of the remaining distance covered per animation tick.
const TRANSITION_DIVISOR: u16 = 2;

/// Absorbs float error so `40 * 0.7` floors to 28.
const RATIO_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapseMode {
    Collapsed,
    #[default]
    Split,
    Filled,
}

/// Size limits for the first region along the split axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneConstraints {
    pub first_min: u16,
    /// Minimum of the second region. `None` leaves it the remainder.
    pub second_min: Option<u16>,
    /// Maximum share of the axis the first region may take.
    pub max_ratio: f32,
}

impl PaneConstraints {
    pub fn for_orientation(layout: &LayoutConfig, orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => Self {
                first_min: layout.horizontal_min,
                second_min: None,
                max_ratio: layout.horizontal_max_ratio,
            },
            Orientation::Vertical => Self {
                first_min: layout.vertical_min,
                second_min: Some(layout.vertical_second_min),
                max_ratio: layout.vertical_max_ratio,
            },
        }
    }

    /// Returns `(min, max)` for an axis of `len` cells (handle excluded).
    ///
    /// When the viewport is too small for both, the max wins.
    pub fn bounds(&self, len: u16) -> (u16, u16) {
        let ratio = self.max_ratio.clamp(0.0, 1.0);
        let mut max = (f32::from(len) * ratio + RATIO_EPSILON).floor() as u16;
        if let Some(second_min) = self.second_min {
            max = max.min(len.saturating_sub(second_min));
        }
        let min = self.first_min.min(max);
        (min, max)
    }

    pub fn clamp(&self, size: u16, len: u16) -> u16 {
        let (min, max) = self.bounds(len);
        size.clamp(min, max)
    }
}

/// Where each part of the pane lands for a given area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneLayout {
    pub first: Rect,
    pub handle: Rect,
    pub second: Rect,
}

/// What a click on the handle hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleHit {
    Collapse,
    Expand,
    Bar,
}

#[derive(Debug, Clone)]
pub struct SplitPane {
    orientation: Orientation,
    constraints: PaneConstraints,
    first_size: u16,
    /// Size currently drawn; trails the target while a transition runs.
    displayed: u16,
    drag_origin: Option<u16>,
    mode: CollapseMode,
    transitions_enabled: bool,
    viewport: (u16, u16),
}

impl SplitPane {
    pub fn new(orientation: Orientation, constraints: PaneConstraints, initial_size: u16) -> Self {
        Self {
            orientation,
            constraints,
            first_size: initial_size,
            displayed: initial_size,
            drag_origin: None,
            mode: CollapseMode::Split,
            transitions_enabled: true,
            viewport: (0, 0),
        }
    }

    pub fn from_config(layout: &LayoutConfig) -> Self {
        let constraints = PaneConstraints::for_orientation(layout, layout.orientation);
        Self::new(layout.orientation, constraints, layout.initial_size)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn mode(&self) -> CollapseMode {
        self.mode
    }

    pub fn first_size(&self) -> u16 {
        self.first_size
    }

    pub fn displayed_size(&self) -> u16 {
        self.displayed
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }

    pub fn transitions_enabled(&self) -> bool {
        self.transitions_enabled
    }

    pub fn viewport(&self) -> (u16, u16) {
        self.viewport
    }

    /// Current `(min, max)` for the first region.
    pub fn bounds(&self) -> (u16, u16) {
        self.constraints.bounds(self.axis_len())
    }

    /// Cells available to the two regions along the split axis.
    fn axis_len(&self) -> u16 {
        let (width, height) = self.viewport;
        let len = match self.orientation {
            Orientation::Horizontal => width,
            Orientation::Vertical => height,
        };
        len.saturating_sub(HANDLE_SIZE)
    }

    /// Size the first region is heading to in the current mode.
    fn target(&self) -> u16 {
        match self.mode {
            CollapseMode::Collapsed => 0,
            CollapseMode::Split => self.first_size,
            CollapseMode::Filled => self.axis_len(),
        }
    }

    fn settle(&mut self) {
        if !self.transitions_enabled {
            self.displayed = self.target();
        }
    }

    /// Split → Collapsed, Collapsed → Split, Filled → Split.
    pub fn toggle_collapse(&mut self) {
        self.mode = match self.mode {
            CollapseMode::Split => CollapseMode::Collapsed,
            CollapseMode::Collapsed | CollapseMode::Filled => CollapseMode::Split,
        };
        self.settle();
    }

    /// Split → Filled, Filled → Split, Collapsed → Split.
    pub fn toggle_expand(&mut self) {
        self.mode = match self.mode {
            CollapseMode::Split => CollapseMode::Filled,
            CollapseMode::Filled | CollapseMode::Collapsed => CollapseMode::Split,
        };
        self.settle();
    }

    /// Begins a drag at `pos` along the split axis. Only allowed while split.
    pub fn start_drag(&mut self, pos: u16) -> bool {
        if self.mode != CollapseMode::Split {
            return false;
        }
        self.drag_origin = Some(pos);
        self.transitions_enabled = false;
        self.displayed = self.first_size;
        true
    }

    /// Moves the handle by the pointer delta since the last position.
    pub fn drag_to(&mut self, pos: u16) {
        let Some(origin) = self.drag_origin else {
            return;
        };
        let delta = i32::from(pos) - i32::from(origin);
        let proposed = (i32::from(self.first_size) + delta).clamp(0, i32::from(u16::MAX)) as u16;
        self.first_size = self.constraints.clamp(proposed, self.axis_len());
        self.displayed = self.first_size;
        self.drag_origin = Some(pos);
    }

    /// Applies the final position and ends the drag.
    pub fn end_drag(&mut self, pos: u16) {
        if self.drag_origin.is_none() {
            return;
        }
        self.drag_to(pos);
        self.drag_origin = None;
        self.transitions_enabled = true;
    }

    /// Records a new viewport and re-clamps the first region.
    ///
    /// Returns true only if the stored size changed.
    pub fn set_viewport(&mut self, width: u16, height: u16) -> bool {
        self.viewport = (width, height);
        let clamped = self.constraints.clamp(self.first_size, self.axis_len());
        if clamped == self.first_size {
            self.settle();
            return false;
        }
        self.first_size = clamped;
        if self.mode == CollapseMode::Split {
            self.displayed = clamped;
        }
        self.settle();
        true
    }

    /// Advances a running transition by one step. Returns true while the
    /// displayed size is still moving.
    pub fn tick(&mut self) -> bool {
        let target = self.target();
        if self.displayed == target {
            return false;
        }
        if !self.transitions_enabled {
            self.displayed = target;
            return true;
        }
        let diff = self.displayed.abs_diff(target);
        let step = (diff / TRANSITION_DIVISOR).max(1);
        self.displayed = if self.displayed < target {
            self.displayed + step
        } else {
            self.displayed - step
        };
        true
    }

    pub fn is_animating(&self) -> bool {
        self.displayed != self.target()
    }

    /// Pointer coordinate along the split axis.
    pub fn axis_position(&self, column: u16, row: u16) -> u16 {
        match self.orientation {
            Orientation::Horizontal => column,
            Orientation::Vertical => row,
        }
    }

    /// Lays the pane out inside `area`.
    pub fn layout(&self, area: Rect) -> PaneLayout {
        let len = match self.orientation {
            Orientation::Horizontal => area.width,
            Orientation::Vertical => area.height,
        };
        let available = len.saturating_sub(HANDLE_SIZE);
        let first = self.displayed.min(available);
        let handle = HANDLE_SIZE.min(len);
        let second = len.saturating_sub(first + handle);

        match self.orientation {
            Orientation::Horizontal => PaneLayout {
                first: Rect::new(area.x, area.y, first, area.height),
                handle: Rect::new(area.x + first, area.y, handle, area.height),
                second: Rect::new(area.x + first + handle, area.y, second, area.height),
            },
            Orientation::Vertical => PaneLayout {
                first: Rect::new(area.x, area.y, area.width, first),
                handle: Rect::new(area.x, area.y + first, area.width, handle),
                second: Rect::new(area.x, area.y + first + handle, area.width, second),
            },
        }
    }

    /// Positions of the collapse and expand glyphs on the handle.
    pub fn glyph_positions(&self, handle: Rect) -> Option<((u16, u16), (u16, u16))> {
        match self.orientation {
            Orientation::Horizontal if handle.height >= 3 && handle.width > 0 => {
                Some(((handle.x, handle.y + 1), (handle.x, handle.y + 2)))
            }
            Orientation::Vertical if handle.width >= 3 && handle.height > 0 => {
                Some(((handle.x + 1, handle.y), (handle.x + 2, handle.y)))
            }
            _ => None,
        }
    }

    /// Hit-tests a click against the handle.
    pub fn hit_test(&self, area: Rect, column: u16, row: u16) -> Option<HandleHit> {
        let handle = self.layout(area).handle;
        if handle.width == 0 || handle.height == 0 {
            return None;
        }
        let inside = column >= handle.x
            && column < handle.x + handle.width
            && row >= handle.y
            && row < handle.y + handle.height;
        if !inside {
            return None;
        }
        if let Some((collapse, expand)) = self.glyph_positions(handle) {
            if (column, row) == collapse {
                return Some(HandleHit::Collapse);
            }
            if (column, row) == expand {
                return Some(HandleHit::Expand);
            }
        }
        Some(HandleHit::Bar)
    }
}
