use crate::core::{display::WindowId, geometry::Rect};

/// A managed top-level window.
#[derive(Clone, Debug, PartialEq)]
pub struct Client {
    pub id: WindowId,
    pub geometry: Rect,
    /// Geometry before entering fullscreen.
    pub saved: Rect,
    pub workspace: usize,
    pub monitor: usize,
    pub fixed: bool,
    pub floating: bool,
    pub fullscreen: bool,
    /// Floating state to restore when leaving fullscreen.
    pub floating_before_fullscreen: bool,
    /// Whether the client should be shown while its workspace is visible.
    pub mapped: bool,
    pub stack_height: Option<u32>,
    pub pid: Option<u32>,
    /// The client this one hid when it was mapped.
    pub swallowed: Option<WindowId>,
    /// The client that hid this one.
    pub swallower: Option<WindowId>,
    /// Unmap notifications caused by our own requests, still to arrive.
    pub pending_unmaps: u32,
}

impl Client {
    pub fn new(id: WindowId, geometry: Rect, workspace: usize, monitor: usize) -> Self {
        Self {
            id,
            geometry,
            saved: geometry,
            workspace,
            monitor,
            fixed: false,
            floating: false,
            fullscreen: false,
            floating_before_fullscreen: false,
            mapped: true,
            stack_height: None,
            pid: None,
            swallowed: None,
            swallower: None,
            pending_unmaps: 0,
        }
    }

    pub fn is_tiled(&self) -> bool {
        self.mapped && !self.floating && !self.fullscreen
    }
}
