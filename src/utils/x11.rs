use anyhow::{anyhow, bail, Result};
use log::{debug, error};
use std::{
    env,
    ffi::{CStr, CString},
    os::raw::{c_char, c_int, c_long, c_uchar, c_uint, c_ulong},
    ptr,
    sync::atomic::{AtomicBool, Ordering},
};
use x11::{keysym, xinerama, xlib};

use crate::{
    core::{
        display::{
            DisplayService, KeySym, LockMasks, Pointer, Protocol, WindowAttributes, WindowClass,
            WindowId, WindowType,
        },
        geometry::{Rect, Strut},
    },
    input::event::{ClientRequest, ConfigureRequest, Event, StateAction},
    ui::cursor::{Cursor, CursorKind},
};

static OTHER_WM: AtomicBool = AtomicBool::new(false);

// Protocol error codes.
const BAD_WINDOW: u8 = 3;
const BAD_MATCH: u8 = 8;
const BAD_ACCESS: u8 = 10;

// Core request opcodes.
const X_CONFIGURE_WINDOW: u8 = 12;
const X_GRAB_BUTTON: u8 = 28;
const X_GRAB_KEY: u8 = 33;
const X_SET_INPUT_FOCUS: u8 = 42;

const WM_NAME: &str = "stackwm";
const POINTER_ROOT: xlib::Window = 1;

/// Errors caused by windows disappearing between a request and its
/// processing.
pub fn is_benign(request: u8, error: u8) -> bool {
    error == BAD_WINDOW
        || (request == X_SET_INPUT_FOCUS && error == BAD_MATCH)
        || (request == X_CONFIGURE_WINDOW && error == BAD_MATCH)
        || (request == X_GRAB_BUTTON && error == BAD_ACCESS)
        || (request == X_GRAB_KEY && error == BAD_ACCESS)
}

/// Every combination of the lock modifiers, so grabs work whatever lock keys
/// are active.
pub fn lock_combinations(masks: LockMasks) -> Vec<u32> {
    let locks = [xlib::LockMask, masks.numlock, masks.mode_switch];
    let mut combos = Vec::with_capacity(8);
    for bits in 0..8u32 {
        let combo = locks
            .iter()
            .enumerate()
            .filter(|(i, _)| bits & (1 << i) != 0)
            .fold(0, |acc, (_, m)| acc | m);
        if !combos.contains(&combo) {
            combos.push(combo);
        }
    }
    combos
}

#[derive(Clone, Copy)]
struct Atoms {
    wm_protocols: xlib::Atom,
    wm_delete_window: xlib::Atom,
    wm_take_focus: xlib::Atom,
    utf8_string: xlib::Atom,
    net_supported: xlib::Atom,
    net_supporting_wm_check: xlib::Atom,
    net_wm_name: xlib::Atom,
    net_active_window: xlib::Atom,
    net_current_desktop: xlib::Atom,
    net_number_of_desktops: xlib::Atom,
    net_desktop_names: xlib::Atom,
    net_client_list: xlib::Atom,
    net_close_window: xlib::Atom,
    net_wm_desktop: xlib::Atom,
    net_wm_pid: xlib::Atom,
    net_wm_state: xlib::Atom,
    net_wm_state_fullscreen: xlib::Atom,
    net_wm_strut: xlib::Atom,
    net_wm_strut_partial: xlib::Atom,
    net_workarea: xlib::Atom,
    net_frame_extents: xlib::Atom,
    net_wm_window_type: xlib::Atom,
    type_dock: xlib::Atom,
    type_dialog: xlib::Atom,
    type_utility: xlib::Atom,
    type_toolbar: xlib::Atom,
    type_splash: xlib::Atom,
    type_menu: xlib::Atom,
}

impl Atoms {
    unsafe fn new(display: *mut xlib::Display) -> Self {
        let intern = |name: &CStr| xlib::XInternAtom(display, name.as_ptr(), 0);
        Self {
            wm_protocols: intern(c"WM_PROTOCOLS"),
            wm_delete_window: intern(c"WM_DELETE_WINDOW"),
            wm_take_focus: intern(c"WM_TAKE_FOCUS"),
            utf8_string: intern(c"UTF8_STRING"),
            net_supported: intern(c"_NET_SUPPORTED"),
            net_supporting_wm_check: intern(c"_NET_SUPPORTING_WM_CHECK"),
            net_wm_name: intern(c"_NET_WM_NAME"),
            net_active_window: intern(c"_NET_ACTIVE_WINDOW"),
            net_current_desktop: intern(c"_NET_CURRENT_DESKTOP"),
            net_number_of_desktops: intern(c"_NET_NUMBER_OF_DESKTOPS"),
            net_desktop_names: intern(c"_NET_DESKTOP_NAMES"),
            net_client_list: intern(c"_NET_CLIENT_LIST"),
            net_close_window: intern(c"_NET_CLOSE_WINDOW"),
            net_wm_desktop: intern(c"_NET_WM_DESKTOP"),
            net_wm_pid: intern(c"_NET_WM_PID"),
            net_wm_state: intern(c"_NET_WM_STATE"),
            net_wm_state_fullscreen: intern(c"_NET_WM_STATE_FULLSCREEN"),
            net_wm_strut: intern(c"_NET_WM_STRUT"),
            net_wm_strut_partial: intern(c"_NET_WM_STRUT_PARTIAL"),
            net_workarea: intern(c"_NET_WORKAREA"),
            net_frame_extents: intern(c"_NET_FRAME_EXTENTS"),
            net_wm_window_type: intern(c"_NET_WM_WINDOW_TYPE"),
            type_dock: intern(c"_NET_WM_WINDOW_TYPE_DOCK"),
            type_dialog: intern(c"_NET_WM_WINDOW_TYPE_DIALOG"),
            type_utility: intern(c"_NET_WM_WINDOW_TYPE_UTILITY"),
            type_toolbar: intern(c"_NET_WM_WINDOW_TYPE_TOOLBAR"),
            type_splash: intern(c"_NET_WM_WINDOW_TYPE_SPLASH"),
            type_menu: intern(c"_NET_WM_WINDOW_TYPE_MENU"),
        }
    }

    fn protocol(&self, protocol: Protocol) -> xlib::Atom {
        match protocol {
            Protocol::DeleteWindow => self.wm_delete_window,
            Protocol::TakeFocus => self.wm_take_focus,
        }
    }
}

/// Xlib connection acting as the window manager's display service.
pub struct Display {
    raw: *mut xlib::Display,
    root: xlib::Window,
    atoms: Atoms,
    cursor: Option<Cursor>,
    check_window: xlib::Window,
}

impl Display {
    /// Connects to `$DISPLAY` and takes over window management on its
    /// default screen. Fails when another window manager is running.
    pub fn new() -> Result<Self> {
        let display_name = env::var("DISPLAY").unwrap_or_else(|_| String::from(":0"));
        let c_display_name =
            CString::new(display_name).map_err(|_| anyhow!("Invalid DISPLAY variable"))?;
        let raw = unsafe { xlib::XOpenDisplay(c_display_name.as_ptr()) };

        if raw.is_null() {
            return Err(anyhow!("Failed to open X display"));
        }

        let root = unsafe { xlib::XDefaultRootWindow(raw) };

        unsafe {
            OTHER_WM.store(false, Ordering::SeqCst);
            xlib::XSetErrorHandler(Some(Self::detect_other_wm));
            xlib::XSelectInput(raw, root, xlib::SubstructureRedirectMask);
            xlib::XSync(raw, 0);
            if OTHER_WM.load(Ordering::SeqCst) {
                xlib::XCloseDisplay(raw);
                bail!("another window manager is already running");
            }
            xlib::XSetErrorHandler(Some(Self::error_handler));
            xlib::XSync(raw, 0);
        }

        let atoms = unsafe { Atoms::new(raw) };
        let cursor = unsafe { Cursor::new(raw) };

        unsafe {
            xlib::XSelectInput(
                raw,
                root,
                xlib::SubstructureRedirectMask
                    | xlib::SubstructureNotifyMask
                    | xlib::StructureNotifyMask
                    | xlib::PointerMotionMask
                    | xlib::PropertyChangeMask,
            );
            xlib::XDefineCursor(raw, root, cursor.get(CursorKind::Normal));
            xlib::XSync(raw, 0);
        }

        debug!("connected to X display, root window {:#x}", root);
        Ok(Self {
            raw,
            root,
            atoms,
            cursor: Some(cursor),
            check_window: 0,
        })
    }

    unsafe extern "C" fn detect_other_wm(
        _display: *mut xlib::Display,
        _e: *mut xlib::XErrorEvent,
    ) -> c_int {
        OTHER_WM.store(true, Ordering::SeqCst);
        0
    }

    unsafe extern "C" fn error_handler(
        display: *mut xlib::Display,
        e: *mut xlib::XErrorEvent,
    ) -> c_int {
        if is_benign((*e).request_code, (*e).error_code) {
            return 0;
        }

        let mut error_text = [0 as c_char; 1024];
        xlib::XGetErrorText(
            display,
            (*e).error_code as i32,
            error_text.as_mut_ptr(),
            error_text.len() as i32,
        );

        let error_msg = CStr::from_ptr(error_text.as_ptr())
            .to_string_lossy()
            .into_owned();

        error!(
            "X11 Error: {} (code: {}, resource id: {:#x}, request code: {})",
            error_msg,
            (*e).error_code,
            (*e).resourceid,
            (*e).request_code
        );

        0
    }

    unsafe fn property_longs(
        &self,
        window: xlib::Window,
        property: xlib::Atom,
        kind: xlib::Atom,
        length: c_long,
    ) -> Option<Vec<c_ulong>> {
        let mut actual_type: xlib::Atom = 0;
        let mut actual_format: c_int = 0;
        let mut nitems: c_ulong = 0;
        let mut bytes_after: c_ulong = 0;
        let mut prop: *mut c_uchar = ptr::null_mut();

        let status = xlib::XGetWindowProperty(
            self.raw,
            window,
            property,
            0,
            length,
            0,
            kind,
            &mut actual_type,
            &mut actual_format,
            &mut nitems,
            &mut bytes_after,
            &mut prop,
        );
        if status != 0 || prop.is_null() {
            return None;
        }

        let values = if actual_format == 32 && nitems > 0 {
            // Format 32 data arrives as an array of C longs.
            Some(std::slice::from_raw_parts(prop as *const c_ulong, nitems as usize).to_vec())
        } else {
            None
        };
        xlib::XFree(prop as *mut _);
        values
    }

    unsafe fn set_property32(
        &self,
        window: xlib::Window,
        property: xlib::Atom,
        kind: xlib::Atom,
        values: &[c_ulong],
    ) {
        xlib::XChangeProperty(
            self.raw,
            window,
            property,
            kind,
            32,
            xlib::PropModeReplace,
            values.as_ptr() as *const c_uchar,
            values.len() as c_int,
        );
    }

    unsafe fn set_utf8(&self, window: xlib::Window, property: xlib::Atom, value: &str) {
        xlib::XChangeProperty(
            self.raw,
            window,
            property,
            self.atoms.utf8_string,
            8,
            xlib::PropModeReplace,
            value.as_ptr(),
            value.len() as c_int,
        );
    }

    fn grab_button(&self, window: xlib::Window, button: c_uint, modifiers: c_uint) {
        unsafe {
            xlib::XGrabButton(
                self.raw,
                button,
                modifiers,
                window,
                0,
                (xlib::ButtonPressMask | xlib::ButtonReleaseMask) as c_uint,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                0,
                0,
            );
        }
    }

    fn translate(&mut self, event: xlib::XEvent) -> Event {
        match event.get_type() {
            xlib::MapRequest => {
                let e: xlib::XMapRequestEvent = From::from(event);
                Event::MapRequest { window: e.window }
            }
            xlib::UnmapNotify => {
                let e: xlib::XUnmapEvent = From::from(event);
                Event::UnmapNotify { window: e.window }
            }
            xlib::DestroyNotify => {
                let e: xlib::XDestroyWindowEvent = From::from(event);
                Event::DestroyNotify { window: e.window }
            }
            xlib::ConfigureRequest => {
                let e: xlib::XConfigureRequestEvent = From::from(event);
                let has = |flag: c_ulong| e.value_mask & flag != 0;
                Event::ConfigureRequest {
                    window: e.window,
                    request: ConfigureRequest {
                        x: has(xlib::CWX as c_ulong).then_some(e.x),
                        y: has(xlib::CWY as c_ulong).then_some(e.y),
                        width: has(xlib::CWWidth as c_ulong).then_some(e.width.max(1) as u32),
                        height: has(xlib::CWHeight as c_ulong).then_some(e.height.max(1) as u32),
                        border_width: has(xlib::CWBorderWidth as c_ulong)
                            .then_some(e.border_width.max(0) as u32),
                    },
                }
            }
            xlib::ConfigureNotify => {
                let e: xlib::XConfigureEvent = From::from(event);
                if e.window == self.root {
                    Event::ScreenChange
                } else {
                    Event::Ignored
                }
            }
            xlib::KeyPress => {
                let e: xlib::XKeyEvent = From::from(event);
                Event::KeyPress {
                    keycode: e.keycode,
                    state: e.state,
                }
            }
            xlib::ButtonPress => {
                let e: xlib::XButtonEvent = From::from(event);
                unsafe {
                    xlib::XAllowEvents(self.raw, xlib::ReplayPointer, xlib::CurrentTime);
                }
                Event::ButtonPress {
                    window: e.window,
                    button: e.button,
                    state: e.state,
                    x_root: e.x_root,
                    y_root: e.y_root,
                    time: e.time,
                }
            }
            xlib::ButtonRelease => {
                let e: xlib::XButtonEvent = From::from(event);
                Event::ButtonRelease { button: e.button }
            }
            xlib::MotionNotify => {
                let e: xlib::XMotionEvent = From::from(event);
                Event::MotionNotify {
                    x_root: e.x_root,
                    y_root: e.y_root,
                    time: e.time,
                }
            }
            xlib::EnterNotify => {
                let e: xlib::XCrossingEvent = From::from(event);
                if e.mode != xlib::NotifyNormal || e.detail == xlib::NotifyInferior {
                    Event::Ignored
                } else {
                    Event::EnterNotify { window: e.window }
                }
            }
            xlib::PropertyNotify => {
                let e: xlib::XPropertyEvent = From::from(event);
                if e.atom == self.atoms.net_wm_strut || e.atom == self.atoms.net_wm_strut_partial {
                    Event::StrutChange { window: e.window }
                } else {
                    Event::Ignored
                }
            }
            xlib::ClientMessage => {
                let e: xlib::XClientMessageEvent = From::from(event);
                self.translate_client_message(&e)
            }
            xlib::MappingNotify => {
                let mut e: xlib::XMappingEvent = From::from(event);
                unsafe {
                    xlib::XRefreshKeyboardMapping(&mut e);
                }
                if e.request == xlib::MappingKeyboard || e.request == xlib::MappingModifier {
                    Event::MappingNotify
                } else {
                    Event::Ignored
                }
            }
            _ => Event::Ignored,
        }
    }

    fn translate_client_message(&self, e: &xlib::XClientMessageEvent) -> Event {
        let data = |i: usize| e.data.get_long(i);
        let request = if e.message_type == self.atoms.net_wm_state {
            let fullscreen = self.atoms.net_wm_state_fullscreen;
            if data(1) as xlib::Atom == fullscreen || data(2) as xlib::Atom == fullscreen {
                StateAction::from_raw(data(0) as i64).map(ClientRequest::Fullscreen)
            } else {
                None
            }
        } else if e.message_type == self.atoms.net_active_window {
            Some(ClientRequest::Activate)
        } else if e.message_type == self.atoms.net_current_desktop {
            Some(ClientRequest::CurrentDesktop(data(0).max(0) as usize))
        } else if e.message_type == self.atoms.net_close_window {
            Some(ClientRequest::Close)
        } else {
            None
        };

        match request {
            Some(request) => Event::ClientMessage {
                window: e.window,
                request,
            },
            None => Event::Ignored,
        }
    }
}

impl DisplayService for Display {
    fn root(&self) -> WindowId {
        self.root
    }

    fn next_event(&mut self) -> Event {
        let mut event: xlib::XEvent = unsafe { std::mem::zeroed() };
        unsafe {
            xlib::XNextEvent(self.raw, &mut event);
        }
        self.translate(event)
    }

    fn sync(&mut self) {
        unsafe {
            xlib::XSync(self.raw, 0);
        }
    }

    fn grab_server(&mut self) {
        unsafe {
            xlib::XGrabServer(self.raw);
        }
    }

    fn ungrab_server(&mut self) {
        unsafe {
            xlib::XUngrabServer(self.raw);
            xlib::XSync(self.raw, 0);
        }
    }

    fn monitors(&mut self) -> Vec<Rect> {
        let mut rects = Vec::new();
        unsafe {
            if xinerama::XineramaIsActive(self.raw) != 0 {
                let mut count: c_int = 0;
                let screens = xinerama::XineramaQueryScreens(self.raw, &mut count);
                if !screens.is_null() {
                    for s in std::slice::from_raw_parts(screens, count.max(0) as usize) {
                        rects.push(Rect::new(
                            s.x_org as i32,
                            s.y_org as i32,
                            s.width.max(1) as u32,
                            s.height.max(1) as u32,
                        ));
                    }
                    xlib::XFree(screens as *mut _);
                }
            }
            if rects.is_empty() {
                let screen = xlib::XDefaultScreen(self.raw);
                rects.push(Rect::new(
                    0,
                    0,
                    xlib::XDisplayWidth(self.raw, screen).max(1) as u32,
                    xlib::XDisplayHeight(self.raw, screen).max(1) as u32,
                ));
            }
        }
        rects
    }

    fn top_level_windows(&mut self) -> Vec<WindowId> {
        let mut root_return: xlib::Window = 0;
        let mut parent: xlib::Window = 0;
        let mut children: *mut xlib::Window = ptr::null_mut();
        let mut count: c_uint = 0;
        unsafe {
            if xlib::XQueryTree(
                self.raw,
                self.root,
                &mut root_return,
                &mut parent,
                &mut children,
                &mut count,
            ) == 0
                || children.is_null()
            {
                return Vec::new();
            }
            let windows = std::slice::from_raw_parts(children, count as usize).to_vec();
            xlib::XFree(children as *mut _);
            windows
        }
    }

    fn top_level(&mut self, window: WindowId) -> WindowId {
        let mut current = window;
        for _ in 0..64 {
            let mut root_return: xlib::Window = 0;
            let mut parent: xlib::Window = 0;
            let mut children: *mut xlib::Window = ptr::null_mut();
            let mut count: c_uint = 0;
            unsafe {
                if xlib::XQueryTree(
                    self.raw,
                    current,
                    &mut root_return,
                    &mut parent,
                    &mut children,
                    &mut count,
                ) == 0
                {
                    return window;
                }
                if !children.is_null() {
                    xlib::XFree(children as *mut _);
                }
            }
            if parent == self.root || parent == 0 {
                return current;
            }
            current = parent;
        }
        window
    }

    fn query_pointer(&mut self) -> Pointer {
        let mut root_return: xlib::Window = 0;
        let mut child: xlib::Window = 0;
        let (mut x, mut y, mut wx, mut wy) = (0, 0, 0, 0);
        let mut mask: c_uint = 0;
        unsafe {
            xlib::XQueryPointer(
                self.raw,
                self.root,
                &mut root_return,
                &mut child,
                &mut x,
                &mut y,
                &mut wx,
                &mut wy,
                &mut mask,
            );
        }
        Pointer {
            x,
            y,
            child: (child != 0).then_some(child),
        }
    }

    fn warp_pointer(&mut self, x: i32, y: i32) {
        unsafe {
            xlib::XWarpPointer(self.raw, 0, self.root, 0, 0, 0, 0, x, y);
        }
    }

    fn window_attributes(&mut self, window: WindowId) -> Option<WindowAttributes> {
        let mut attrs: xlib::XWindowAttributes = unsafe { std::mem::zeroed() };
        if unsafe { xlib::XGetWindowAttributes(self.raw, window, &mut attrs) } == 0 {
            return None;
        }
        Some(WindowAttributes {
            geometry: Rect::new(
                attrs.x,
                attrs.y,
                attrs.width.max(1) as u32,
                attrs.height.max(1) as u32,
            ),
            border_width: attrs.border_width.max(0) as u32,
            override_redirect: attrs.override_redirect != 0,
            viewable: attrs.map_state == xlib::IsViewable,
        })
    }

    fn window_type(&mut self, window: WindowId) -> WindowType {
        let types = unsafe {
            self.property_longs(window, self.atoms.net_wm_window_type, xlib::XA_ATOM, 16)
        }
        .unwrap_or_default();
        let a = &self.atoms;
        for atom in types {
            let kind = match atom {
                t if t == a.type_dock => WindowType::Dock,
                t if t == a.type_dialog => WindowType::Dialog,
                t if t == a.type_utility => WindowType::Utility,
                t if t == a.type_toolbar => WindowType::Toolbar,
                t if t == a.type_splash => WindowType::Splash,
                t if t == a.type_menu => WindowType::Menu,
                _ => continue,
            };
            return kind;
        }
        WindowType::Normal
    }

    fn window_class(&mut self, window: WindowId) -> Option<WindowClass> {
        let mut hint = xlib::XClassHint {
            res_name: ptr::null_mut(),
            res_class: ptr::null_mut(),
        };
        unsafe {
            if xlib::XGetClassHint(self.raw, window, &mut hint) == 0 {
                return None;
            }
            let take = |s: *mut c_char| {
                if s.is_null() {
                    String::new()
                } else {
                    let value = CStr::from_ptr(s).to_string_lossy().into_owned();
                    xlib::XFree(s as *mut _);
                    value
                }
            };
            Some(WindowClass {
                instance: take(hint.res_name),
                class: take(hint.res_class),
            })
        }
    }

    fn window_pid(&mut self, window: WindowId) -> Option<u32> {
        unsafe { self.property_longs(window, self.atoms.net_wm_pid, xlib::XA_CARDINAL, 1) }
            .and_then(|v| v.first().copied())
            .map(|pid| pid as u32)
            .filter(|&pid| pid > 0)
    }

    fn transient_for(&mut self, window: WindowId) -> Option<WindowId> {
        let mut parent: xlib::Window = 0;
        let found = unsafe { xlib::XGetTransientForHint(self.raw, window, &mut parent) } != 0;
        (found && parent != 0).then_some(parent)
    }

    fn fixed_size(&mut self, window: WindowId) -> Option<(u32, u32)> {
        let mut hints: xlib::XSizeHints = unsafe { std::mem::zeroed() };
        let mut supplied: c_long = 0;
        if unsafe { xlib::XGetWMNormalHints(self.raw, window, &mut hints, &mut supplied) } == 0 {
            return None;
        }
        let sized = hints.flags & xlib::PMinSize != 0 && hints.flags & xlib::PMaxSize != 0;
        if sized
            && hints.min_width > 0
            && hints.min_height > 0
            && hints.min_width == hints.max_width
            && hints.min_height == hints.max_height
        {
            Some((hints.min_width as u32, hints.min_height as u32))
        } else {
            None
        }
    }

    fn strut(&mut self, window: WindowId) -> Option<Strut> {
        let values = unsafe {
            self.property_longs(window, self.atoms.net_wm_strut_partial, xlib::XA_CARDINAL, 12)
                .or_else(|| {
                    self.property_longs(window, self.atoms.net_wm_strut, xlib::XA_CARDINAL, 4)
                })
        }?;
        if values.len() < 4 {
            return None;
        }
        Some(Strut {
            left: values[0] as u32,
            right: values[1] as u32,
            top: values[2] as u32,
            bottom: values[3] as u32,
        })
    }

    fn wants_fullscreen(&mut self, window: WindowId) -> bool {
        unsafe { self.property_longs(window, self.atoms.net_wm_state, xlib::XA_ATOM, 32) }
            .is_some_and(|states| states.contains(&self.atoms.net_wm_state_fullscreen))
    }

    fn supports_protocol(&mut self, window: WindowId, protocol: Protocol) -> bool {
        let wanted = self.atoms.protocol(protocol);
        let mut protocols: *mut xlib::Atom = ptr::null_mut();
        let mut count: c_int = 0;
        unsafe {
            if xlib::XGetWMProtocols(self.raw, window, &mut protocols, &mut count) == 0
                || protocols.is_null()
            {
                return false;
            }
            let found = std::slice::from_raw_parts(protocols, count.max(0) as usize)
                .contains(&wanted);
            xlib::XFree(protocols as *mut _);
            found
        }
    }

    fn watch_window(&mut self, window: WindowId) {
        unsafe {
            xlib::XSelectInput(
                self.raw,
                window,
                xlib::EnterWindowMask | xlib::FocusChangeMask | xlib::PropertyChangeMask,
            );
        }
    }

    fn map(&mut self, window: WindowId) {
        unsafe {
            xlib::XMapWindow(self.raw, window);
        }
    }

    fn unmap(&mut self, window: WindowId) {
        unsafe {
            xlib::XUnmapWindow(self.raw, window);
        }
    }

    fn raise(&mut self, window: WindowId) {
        unsafe {
            xlib::XRaiseWindow(self.raw, window);
        }
    }

    fn configure(&mut self, window: WindowId, geometry: Rect, border_width: u32) {
        let mut changes = xlib::XWindowChanges {
            x: geometry.x,
            y: geometry.y,
            width: geometry.w.max(1) as c_int,
            height: geometry.h.max(1) as c_int,
            border_width: border_width as c_int,
            sibling: 0,
            stack_mode: 0,
        };
        let mask = xlib::CWX | xlib::CWY | xlib::CWWidth | xlib::CWHeight | xlib::CWBorderWidth;
        unsafe {
            xlib::XConfigureWindow(self.raw, window, mask as c_uint, &mut changes);
        }
    }

    fn configure_unmanaged(&mut self, window: WindowId, request: ConfigureRequest) {
        let mut changes: xlib::XWindowChanges = unsafe { std::mem::zeroed() };
        let mut mask: c_uint = 0;
        if let Some(x) = request.x {
            changes.x = x;
            mask |= xlib::CWX as c_uint;
        }
        if let Some(y) = request.y {
            changes.y = y;
            mask |= xlib::CWY as c_uint;
        }
        if let Some(w) = request.width {
            changes.width = w as c_int;
            mask |= xlib::CWWidth as c_uint;
        }
        if let Some(h) = request.height {
            changes.height = h as c_int;
            mask |= xlib::CWHeight as c_uint;
        }
        if let Some(bw) = request.border_width {
            changes.border_width = bw as c_int;
            mask |= xlib::CWBorderWidth as c_uint;
        }
        if mask != 0 {
            unsafe {
                xlib::XConfigureWindow(self.raw, window, mask, &mut changes);
            }
        }
    }

    fn set_border_width(&mut self, window: WindowId, width: u32) {
        unsafe {
            xlib::XSetWindowBorderWidth(self.raw, window, width);
        }
    }

    fn set_border_color(&mut self, window: WindowId, color: u32) {
        unsafe {
            xlib::XSetWindowBorder(self.raw, window, color as c_ulong);
        }
    }

    fn set_input_focus(&mut self, window: Option<WindowId>) {
        unsafe {
            xlib::XSetInputFocus(
                self.raw,
                window.unwrap_or(self.root),
                xlib::RevertToPointerRoot,
                xlib::CurrentTime,
            );
        }
    }

    fn send_protocol(&mut self, window: WindowId, protocol: Protocol) {
        unsafe {
            let mut data: xlib::ClientMessageData = std::mem::zeroed();
            data.set_long(0, self.atoms.protocol(protocol) as c_long);
            data.set_long(1, xlib::CurrentTime as c_long);

            let mut event = xlib::XEvent {
                client_message: xlib::XClientMessageEvent {
                    type_: xlib::ClientMessage,
                    serial: 0,
                    send_event: 1,
                    display: self.raw,
                    window,
                    message_type: self.atoms.wm_protocols,
                    format: 32,
                    data,
                },
            };
            xlib::XSendEvent(self.raw, window, 0, xlib::NoEventMask, &mut event);
        }
    }

    fn kill_client(&mut self, window: WindowId) {
        unsafe {
            xlib::XGrabServer(self.raw);
            xlib::XKillClient(self.raw, window);
            xlib::XSync(self.raw, 0);
            xlib::XUngrabServer(self.raw);
        }
    }

    fn modifier_masks(&mut self) -> LockMasks {
        let mut masks = LockMasks::default();
        unsafe {
            let map = xlib::XGetModifierMapping(self.raw);
            if map.is_null() {
                return masks;
            }
            let numlock = xlib::XKeysymToKeycode(self.raw, keysym::XK_Num_Lock as c_ulong);
            let mode_switch = xlib::XKeysymToKeycode(self.raw, keysym::XK_Mode_switch as c_ulong);
            let per_mod = (*map).max_keypermod.max(0) as usize;
            let codes = std::slice::from_raw_parts((*map).modifiermap, 8 * per_mod);
            for (i, chunk) in codes.chunks(per_mod.max(1)).enumerate() {
                for &code in chunk {
                    if code == 0 {
                        continue;
                    }
                    if code == numlock {
                        masks.numlock = 1 << i;
                    }
                    if code == mode_switch {
                        masks.mode_switch = 1 << i;
                    }
                }
            }
            xlib::XFreeModifiermap(map);
        }
        masks
    }

    fn keysym_for(&mut self, keycode: u32) -> KeySym {
        unsafe { xlib::XKeycodeToKeysym(self.raw, keycode as xlib::KeyCode, 0) }
    }

    fn grab_keys(&mut self, keys: &[(u32, KeySym)], masks: LockMasks) {
        let combos = lock_combinations(masks);
        unsafe {
            xlib::XUngrabKey(self.raw, xlib::AnyKey, xlib::AnyModifier, self.root);
            for &(mods, sym) in keys {
                let code = xlib::XKeysymToKeycode(self.raw, sym);
                if code == 0 {
                    debug!("no keycode for keysym {:#x}", sym);
                    continue;
                }
                for &lock in &combos {
                    xlib::XGrabKey(
                        self.raw,
                        code as c_int,
                        mods | lock,
                        self.root,
                        1,
                        xlib::GrabModeAsync,
                        xlib::GrabModeAsync,
                    );
                }
            }
        }
    }

    fn grab_buttons(
        &mut self,
        window: WindowId,
        modifier: u32,
        masks: LockMasks,
        click_to_focus: bool,
    ) {
        unsafe {
            xlib::XUngrabButton(self.raw, xlib::AnyButton as c_uint, xlib::AnyModifier, window);
            if click_to_focus {
                xlib::XGrabButton(
                    self.raw,
                    xlib::AnyButton as c_uint,
                    xlib::AnyModifier,
                    window,
                    0,
                    xlib::ButtonPressMask as c_uint,
                    xlib::GrabModeSync,
                    xlib::GrabModeAsync,
                    0,
                    0,
                );
            }
        }
        for lock in lock_combinations(masks) {
            self.grab_button(window, xlib::Button1, modifier | lock);
            self.grab_button(window, xlib::Button1, modifier | xlib::ShiftMask | lock);
            self.grab_button(window, xlib::Button3, modifier | lock);
        }
    }

    fn grab_pointer(&mut self, cursor: CursorKind) -> bool {
        let cursor = self.cursor.as_ref().map_or(0, |c| c.get(cursor));
        unsafe {
            xlib::XGrabPointer(
                self.raw,
                self.root,
                0,
                (xlib::ButtonPressMask | xlib::ButtonReleaseMask | xlib::PointerMotionMask)
                    as c_uint,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                0,
                cursor,
                xlib::CurrentTime,
            ) == xlib::GrabSuccess
        }
    }

    fn ungrab_pointer(&mut self) {
        unsafe {
            xlib::XUngrabPointer(self.raw, xlib::CurrentTime);
        }
    }

    fn publish_supported(&mut self, workspaces: usize) {
        let a = self.atoms;
        let supported = [
            a.net_supported,
            a.net_supporting_wm_check,
            a.net_wm_name,
            a.net_active_window,
            a.net_current_desktop,
            a.net_number_of_desktops,
            a.net_desktop_names,
            a.net_client_list,
            a.net_close_window,
            a.net_wm_desktop,
            a.net_wm_state,
            a.net_wm_state_fullscreen,
            a.net_wm_strut,
            a.net_wm_strut_partial,
            a.net_workarea,
            a.net_frame_extents,
            a.net_wm_window_type,
            a.type_dock,
            a.type_dialog,
            a.type_utility,
            a.type_toolbar,
            a.type_splash,
            a.type_menu,
        ];

        unsafe {
            if self.check_window == 0 {
                self.check_window = xlib::XCreateSimpleWindow(self.raw, self.root, 0, 0, 1, 1, 0, 0, 0);
            }
            let check = self.check_window;
            self.set_property32(check, a.net_supporting_wm_check, xlib::XA_WINDOW, &[check]);
            self.set_utf8(check, a.net_wm_name, WM_NAME);
            self.set_property32(self.root, a.net_supporting_wm_check, xlib::XA_WINDOW, &[check]);
            self.set_property32(self.root, a.net_supported, xlib::XA_ATOM, &supported);
            self.set_property32(
                self.root,
                a.net_number_of_desktops,
                xlib::XA_CARDINAL,
                &[workspaces as c_ulong],
            );

            let names = (0..workspaces)
                .map(|i| (i + 1).to_string())
                .collect::<Vec<_>>();
            let names_str = names.join("\0") + "\0";
            self.set_utf8(self.root, a.net_desktop_names, &names_str);
            xlib::XDeleteProperty(self.raw, self.root, a.net_client_list);
        }
    }

    fn set_active_window(&mut self, window: Option<WindowId>) {
        unsafe {
            match window {
                Some(w) => {
                    self.set_property32(self.root, self.atoms.net_active_window, xlib::XA_WINDOW, &[w])
                }
                None => {
                    xlib::XDeleteProperty(self.raw, self.root, self.atoms.net_active_window);
                }
            }
        }
    }

    fn set_current_desktop(&mut self, index: usize) {
        unsafe {
            self.set_property32(
                self.root,
                self.atoms.net_current_desktop,
                xlib::XA_CARDINAL,
                &[index as c_ulong],
            );
        }
    }

    fn set_client_list(&mut self, windows: &[WindowId]) {
        unsafe {
            self.set_property32(self.root, self.atoms.net_client_list, xlib::XA_WINDOW, windows);
        }
    }

    fn set_window_desktop(&mut self, window: WindowId, index: usize) {
        unsafe {
            self.set_property32(
                window,
                self.atoms.net_wm_desktop,
                xlib::XA_CARDINAL,
                &[index as c_ulong],
            );
        }
    }

    fn set_fullscreen_state(&mut self, window: WindowId, fullscreen: bool) {
        let states: &[c_ulong] = if fullscreen {
            &[self.atoms.net_wm_state_fullscreen]
        } else {
            &[]
        };
        unsafe {
            self.set_property32(window, self.atoms.net_wm_state, xlib::XA_ATOM, states);
        }
    }

    fn set_frame_extents(&mut self, window: WindowId, border_width: u32) {
        let bw = border_width as c_ulong;
        unsafe {
            self.set_property32(
                window,
                self.atoms.net_frame_extents,
                xlib::XA_CARDINAL,
                &[bw, bw, bw, bw],
            );
        }
    }

    fn set_workarea(&mut self, areas: &[Rect]) {
        let values: Vec<c_ulong> = areas
            .iter()
            .flat_map(|r| [r.x.max(0) as c_ulong, r.y.max(0) as c_ulong, r.w as c_ulong, r.h as c_ulong])
            .collect();
        unsafe {
            self.set_property32(self.root, self.atoms.net_workarea, xlib::XA_CARDINAL, &values);
        }
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        // Cursors are freed through the connection, so they go first.
        self.cursor.take();
        unsafe {
            if self.check_window != 0 {
                xlib::XDestroyWindow(self.raw, self.check_window);
            }
            xlib::XSetInputFocus(
                self.raw,
                POINTER_ROOT,
                xlib::RevertToPointerRoot,
                xlib::CurrentTime,
            );
            xlib::XCloseDisplay(self.raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanished_window_errors_are_benign() {
        assert!(is_benign(X_CONFIGURE_WINDOW, BAD_WINDOW));
        assert!(is_benign(X_SET_INPUT_FOCUS, BAD_MATCH));
        assert!(is_benign(X_GRAB_KEY, BAD_ACCESS));
        assert!(!is_benign(X_SET_INPUT_FOCUS, BAD_ACCESS));
        assert!(!is_benign(1, BAD_MATCH));
        // Nothing here draws, so a bad drawable is a real error.
        assert!(!is_benign(70, 9));
    }

    #[test]
    fn lock_combinations_cover_every_subset() {
        let combos = lock_combinations(LockMasks {
            numlock: xlib::Mod2Mask,
            mode_switch: xlib::Mod5Mask,
        });
        assert_eq!(combos.len(), 8);
        assert!(combos.contains(&0));
        assert!(combos.contains(&(xlib::LockMask | xlib::Mod2Mask | xlib::Mod5Mask)));
    }

    #[test]
    fn unknown_lock_masks_collapse() {
        let combos = lock_combinations(LockMasks::default());
        assert_eq!(combos, vec![0, xlib::LockMask]);
    }
}
