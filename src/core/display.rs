use crate::{
    core::geometry::{Rect, Strut},
    input::event::{ConfigureRequest, Event},
    ui::cursor::CursorKind,
};

pub type WindowId = u64;
pub type KeySym = u64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowAttributes {
    pub geometry: Rect,
    pub border_width: u32,
    pub override_redirect: bool,
    pub viewable: bool,
}

/// `WM_CLASS` of a window: (instance, class).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowClass {
    pub instance: String,
    pub class: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WindowType {
    #[default]
    Normal,
    Dock,
    Dialog,
    Utility,
    Toolbar,
    Splash,
    Menu,
}

impl WindowType {
    pub fn floats(self) -> bool {
        matches!(
            self,
            WindowType::Dialog
                | WindowType::Utility
                | WindowType::Toolbar
                | WindowType::Splash
                | WindowType::Menu
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pointer {
    pub x: i32,
    pub y: i32,
    /// Direct child of the root under the pointer, if any.
    pub child: Option<WindowId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Protocol {
    DeleteWindow,
    TakeFocus,
}

/// Modifier bits that depend on the keyboard layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockMasks {
    pub numlock: u32,
    pub mode_switch: u32,
}

/// Everything the window manager needs from the display server.
///
/// Requests on windows that vanished in the meantime must be tolerated by
/// implementations; callers never treat them as failures.
pub trait DisplayService {
    fn root(&self) -> WindowId;
    fn next_event(&mut self) -> Event;
    fn sync(&mut self);

    fn grab_server(&mut self);
    fn ungrab_server(&mut self);

    fn monitors(&mut self) -> Vec<Rect>;
    fn top_level_windows(&mut self) -> Vec<WindowId>;
    fn top_level(&mut self, window: WindowId) -> WindowId;
    fn query_pointer(&mut self) -> Pointer;
    fn warp_pointer(&mut self, x: i32, y: i32);

    fn window_attributes(&mut self, window: WindowId) -> Option<WindowAttributes>;
    fn window_type(&mut self, window: WindowId) -> WindowType;
    fn window_class(&mut self, window: WindowId) -> Option<WindowClass>;
    fn window_pid(&mut self, window: WindowId) -> Option<u32>;
    fn transient_for(&mut self, window: WindowId) -> Option<WindowId>;
    /// Size the client insists on, when its minimum and maximum hints agree.
    fn fixed_size(&mut self, window: WindowId) -> Option<(u32, u32)>;
    fn strut(&mut self, window: WindowId) -> Option<Strut>;
    fn wants_fullscreen(&mut self, window: WindowId) -> bool;
    fn supports_protocol(&mut self, window: WindowId, protocol: Protocol) -> bool;

    fn watch_window(&mut self, window: WindowId);
    fn map(&mut self, window: WindowId);
    fn unmap(&mut self, window: WindowId);
    fn raise(&mut self, window: WindowId);
    fn configure(&mut self, window: WindowId, geometry: Rect, border_width: u32);
    fn configure_unmanaged(&mut self, window: WindowId, request: ConfigureRequest);
    fn set_border_width(&mut self, window: WindowId, width: u32);
    fn set_border_color(&mut self, window: WindowId, color: u32);
    /// `None` hands the input focus back to the root window.
    fn set_input_focus(&mut self, window: Option<WindowId>);
    fn send_protocol(&mut self, window: WindowId, protocol: Protocol);
    fn kill_client(&mut self, window: WindowId);

    fn modifier_masks(&mut self) -> LockMasks;
    fn keysym_for(&mut self, keycode: u32) -> KeySym;
    fn grab_keys(&mut self, keys: &[(u32, KeySym)], masks: LockMasks);
    fn grab_buttons(&mut self, window: WindowId, modifier: u32, masks: LockMasks, click_to_focus: bool);
    fn grab_pointer(&mut self, cursor: CursorKind) -> bool;
    fn ungrab_pointer(&mut self);

    fn publish_supported(&mut self, workspaces: usize);
    fn set_active_window(&mut self, window: Option<WindowId>);
    fn set_current_desktop(&mut self, index: usize);
    fn set_client_list(&mut self, windows: &[WindowId]);
    fn set_window_desktop(&mut self, window: WindowId, index: usize);
    fn set_fullscreen_state(&mut self, window: WindowId, fullscreen: bool);
    fn set_frame_extents(&mut self, window: WindowId, border_width: u32);
    fn set_workarea(&mut self, areas: &[Rect]);
}
