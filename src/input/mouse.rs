use crate::core::{display::WindowId, geometry::Rect};

pub const MIN_WINDOW_SIZE: u32 = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    None,
    Move,
    Resize,
    Swap,
}

/// Pointer interaction in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DragState {
    pub mode: DragMode,
    pub client: Option<WindowId>,
    pub start_x: i32,
    pub start_y: i32,
    /// Client geometry when the drag started.
    pub origin: Rect,
    pub last_motion: Option<u64>,
    /// Window currently previewed as the swap partner.
    pub swap_target: Option<WindowId>,
}

impl DragState {
    pub fn begin(mode: DragMode, client: WindowId, x: i32, y: i32, origin: Rect) -> Self {
        Self {
            mode,
            client: Some(client),
            start_x: x,
            start_y: y,
            origin,
            last_motion: None,
            swap_target: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode != DragMode::None
    }

    /// Whether a motion sample at `time` is far enough from the last one.
    /// Accepted samples become the new reference.
    pub fn should_sample(&mut self, time: u64, interval: u64) -> bool {
        if let Some(last) = self.last_motion {
            if time.wrapping_sub(last) < interval {
                return false;
            }
        }
        self.last_motion = Some(time);
        true
    }

    pub fn delta(&self, x: i32, y: i32) -> (i32, i32) {
        (x - self.start_x, y - self.start_y)
    }
}
