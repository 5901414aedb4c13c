use x11::xlib;

/// Pointer shapes shown by the root window and during drags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorKind {
    Normal,
    Move,
    Resize,
    Swap,
}

// Glyph indices from the standard X cursor font.
const XC_LEFT_PTR: u32 = 68;
const XC_FLEUR: u32 = 52;
const XC_BOTTOM_RIGHT_CORNER: u32 = 14;
const XC_EXCHANGE: u32 = 50;

pub struct Cursor {
    normal: xlib::Cursor,
    moving: xlib::Cursor,
    resizing: xlib::Cursor,
    swapping: xlib::Cursor,
    display: *mut xlib::Display,
}

impl Cursor {
    /// Creates the cursor set for the given X display.
    ///
    /// # Safety
    /// The display pointer must be valid and point to an active X display connection.
    /// The caller must ensure the display connection remains valid for the lifetime of the cursor.
    pub unsafe fn new(display: *mut xlib::Display) -> Self {
        Self {
            normal: xlib::XCreateFontCursor(display, XC_LEFT_PTR),
            moving: xlib::XCreateFontCursor(display, XC_FLEUR),
            resizing: xlib::XCreateFontCursor(display, XC_BOTTOM_RIGHT_CORNER),
            swapping: xlib::XCreateFontCursor(display, XC_EXCHANGE),
            display,
        }
    }

    pub fn get(&self, kind: CursorKind) -> xlib::Cursor {
        match kind {
            CursorKind::Normal => self.normal,
            CursorKind::Move => self.moving,
            CursorKind::Resize => self.resizing,
            CursorKind::Swap => self.swapping,
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        unsafe {
            xlib::XFreeCursor(self.display, self.normal);
            xlib::XFreeCursor(self.display, self.moving);
            xlib::XFreeCursor(self.display, self.resizing);
            xlib::XFreeCursor(self.display, self.swapping);
        }
    }
}
