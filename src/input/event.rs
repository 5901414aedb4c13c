use crate::core::display::WindowId;

/// What a client asked for through `_NET_WM_STATE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateAction {
    Remove,
    Add,
    Toggle,
}

impl StateAction {
    pub fn from_raw(action: i64) -> Option<Self> {
        match action {
            0 => Some(StateAction::Remove),
            1 => Some(StateAction::Add),
            2 => Some(StateAction::Toggle),
            _ => None,
        }
    }

    pub fn resolve(self, current: bool) -> bool {
        match self {
            StateAction::Remove => false,
            StateAction::Add => true,
            StateAction::Toggle => !current,
        }
    }
}

/// Client messages the window manager understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientRequest {
    Fullscreen(StateAction),
    Activate,
    CurrentDesktop(usize),
    Close,
}

/// A geometry change requested by a client before it is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub border_width: Option<u32>,
}

/// Display server events after translation out of the wire representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    MapRequest {
        window: WindowId,
    },
    UnmapNotify {
        window: WindowId,
    },
    DestroyNotify {
        window: WindowId,
    },
    ConfigureRequest {
        window: WindowId,
        request: ConfigureRequest,
    },
    /// The root window changed size, i.e. the output layout changed.
    ScreenChange,
    KeyPress {
        keycode: u32,
        state: u32,
    },
    ButtonPress {
        window: WindowId,
        button: u32,
        state: u32,
        x_root: i32,
        y_root: i32,
        time: u64,
    },
    ButtonRelease {
        button: u32,
    },
    MotionNotify {
        x_root: i32,
        y_root: i32,
        time: u64,
    },
    EnterNotify {
        window: WindowId,
    },
    StrutChange {
        window: WindowId,
    },
    ClientMessage {
        window: WindowId,
        request: ClientRequest,
    },
    /// The keyboard mapping changed and modifier bits must be re-detected.
    MappingNotify,
    Ignored,
}
