pub mod core {
    pub mod actions;
    pub mod client;
    pub mod display;
    pub mod drag;
    pub mod focus;
    pub mod geometry;
    pub mod modes;
    pub mod monitor;
    pub mod registry;
    pub mod scratchpad;
    pub mod tiling;
    pub mod wm;
    pub mod workspace;
}

pub mod utils {
    pub mod command;
    pub mod process;
    #[cfg(test)]
    pub mod testing;
    pub mod x11;
}

pub mod input {
    pub mod event;
    pub mod keyboard;
    pub mod mouse;
}

pub mod ui {
    pub mod cursor;
    pub mod layout;
}

pub mod config {
    pub mod appearance;
    pub mod command;
    pub mod keybind;
    pub mod loader;
    pub mod rules;
}

pub use config::loader::Config;
pub use core::wm::WindowManager;
pub use utils::x11::Display;

pub const VERSION: &str = concat!("stackwm ver. ", env!("CARGO_PKG_VERSION"));
