//! Headless display used by the behaviour tests.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{
    config::loader::Config,
    core::{
        display::{
            DisplayService, KeySym, LockMasks, Pointer, Protocol, WindowAttributes, WindowClass,
            WindowId, WindowType,
        },
        geometry::{Rect, Strut},
        wm::WindowManager,
    },
    input::event::{ConfigureRequest, Event},
    ui::cursor::CursorKind,
    utils::process::ProcessTree,
};

pub const SCREEN: Rect = Rect::new(0, 0, 1920, 1080);
pub const ROOT: WindowId = 1;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Map(WindowId),
    Unmap(WindowId),
    Raise(WindowId),
    Configure(WindowId, Rect, u32),
    ConfigureUnmanaged(WindowId, ConfigureRequest),
    BorderWidth(WindowId, u32),
    BorderColor(WindowId, u32),
    Focus(Option<WindowId>),
    SendProtocol(WindowId, Protocol),
    Kill(WindowId),
    Watch(WindowId),
    GrabServer,
    UngrabServer,
    GrabKeys(usize),
    GrabButtons(WindowId, bool),
    GrabPointer(CursorKind),
    UngrabPointer,
    Warp(i32, i32),
    Supported(usize),
    ActiveWindow(Option<WindowId>),
    CurrentDesktop(usize),
    ClientList(Vec<WindowId>),
    WindowDesktop(WindowId, usize),
    FullscreenState(WindowId, bool),
    FrameExtents(WindowId, u32),
    Workarea(Vec<Rect>),
}

#[derive(Clone, Debug, Default)]
pub struct FakeWindow {
    pub attrs: WindowAttributes,
    pub class: WindowClass,
    pub pid: Option<u32>,
    pub kind: WindowType,
    pub transient: Option<WindowId>,
    pub fixed: Option<(u32, u32)>,
    pub strut: Option<Strut>,
    pub protocols: Vec<Protocol>,
    pub fullscreen: bool,
}

#[derive(Default)]
pub struct FakeDisplay {
    pub calls: Vec<Call>,
    pub windows: HashMap<WindowId, FakeWindow>,
    pub mapped: HashSet<WindowId>,
    pub parents: HashMap<WindowId, WindowId>,
    pub monitors: Vec<Rect>,
    pub pointer: Pointer,
    pub keysyms: HashMap<u32, KeySym>,
    pub masks: LockMasks,
    pub events: VecDeque<Event>,
}

impl FakeDisplay {
    pub fn new(monitors: Vec<Rect>) -> Self {
        Self {
            monitors,
            pointer: Pointer {
                x: 100,
                y: 100,
                child: None,
            },
            ..Self::default()
        }
    }

    pub fn add_window(&mut self, id: WindowId, class: &str) -> &mut FakeWindow {
        self.windows.entry(id).or_insert_with(|| FakeWindow {
            attrs: WindowAttributes {
                geometry: Rect::new(0, 0, 400, 300),
                border_width: 0,
                override_redirect: false,
                viewable: false,
            },
            class: WindowClass {
                instance: class.to_lowercase(),
                class: class.to_string(),
            },
            ..FakeWindow::default()
        })
    }

    pub fn configures(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Configure(..)))
            .count()
    }

    /// Last geometry pushed for a window.
    pub fn geometry(&self, id: WindowId) -> Option<Rect> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Configure(w, r, _) if *w == id => Some(*r),
            _ => None,
        })
    }

    pub fn last_border_color(&self, id: WindowId) -> Option<u32> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::BorderColor(w, color) if *w == id => Some(*color),
            _ => None,
        })
    }

    pub fn is_mapped(&self, id: WindowId) -> bool {
        self.mapped.contains(&id)
    }
}

impl DisplayService for FakeDisplay {
    fn root(&self) -> WindowId {
        ROOT
    }

    fn next_event(&mut self) -> Event {
        self.events.pop_front().unwrap_or(Event::Ignored)
    }

    fn sync(&mut self) {}

    fn grab_server(&mut self) {
        self.calls.push(Call::GrabServer);
    }

    fn ungrab_server(&mut self) {
        self.calls.push(Call::UngrabServer);
    }

    fn monitors(&mut self) -> Vec<Rect> {
        self.monitors.clone()
    }

    fn top_level_windows(&mut self) -> Vec<WindowId> {
        let mut ids: Vec<_> = self.windows.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn top_level(&mut self, window: WindowId) -> WindowId {
        let mut current = window;
        while let Some(&parent) = self.parents.get(&current) {
            current = parent;
        }
        current
    }

    fn query_pointer(&mut self) -> Pointer {
        self.pointer
    }

    fn warp_pointer(&mut self, x: i32, y: i32) {
        self.pointer.x = x;
        self.pointer.y = y;
        self.calls.push(Call::Warp(x, y));
    }

    fn window_attributes(&mut self, window: WindowId) -> Option<WindowAttributes> {
        if window == ROOT {
            return Some(WindowAttributes {
                geometry: SCREEN,
                ..WindowAttributes::default()
            });
        }
        self.windows.get(&window).map(|w| w.attrs)
    }

    fn window_type(&mut self, window: WindowId) -> WindowType {
        self.windows.get(&window).map(|w| w.kind).unwrap_or_default()
    }

    fn window_class(&mut self, window: WindowId) -> Option<WindowClass> {
        self.windows.get(&window).map(|w| w.class.clone())
    }

    fn window_pid(&mut self, window: WindowId) -> Option<u32> {
        self.windows.get(&window).and_then(|w| w.pid)
    }

    fn transient_for(&mut self, window: WindowId) -> Option<WindowId> {
        self.windows.get(&window).and_then(|w| w.transient)
    }

    fn fixed_size(&mut self, window: WindowId) -> Option<(u32, u32)> {
        self.windows.get(&window).and_then(|w| w.fixed)
    }

    fn strut(&mut self, window: WindowId) -> Option<Strut> {
        self.windows.get(&window).and_then(|w| w.strut)
    }

    fn wants_fullscreen(&mut self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.fullscreen)
    }

    fn supports_protocol(&mut self, window: WindowId, protocol: Protocol) -> bool {
        self.windows
            .get(&window)
            .is_some_and(|w| w.protocols.contains(&protocol))
    }

    fn watch_window(&mut self, window: WindowId) {
        self.calls.push(Call::Watch(window));
    }

    fn map(&mut self, window: WindowId) {
        self.mapped.insert(window);
        if let Some(w) = self.windows.get_mut(&window) {
            w.attrs.viewable = true;
        }
        self.calls.push(Call::Map(window));
    }

    fn unmap(&mut self, window: WindowId) {
        self.mapped.remove(&window);
        if let Some(w) = self.windows.get_mut(&window) {
            w.attrs.viewable = false;
        }
        self.calls.push(Call::Unmap(window));
    }

    fn raise(&mut self, window: WindowId) {
        self.calls.push(Call::Raise(window));
    }

    fn configure(&mut self, window: WindowId, geometry: Rect, border_width: u32) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.attrs.geometry = geometry;
            w.attrs.border_width = border_width;
        }
        self.calls.push(Call::Configure(window, geometry, border_width));
    }

    fn configure_unmanaged(&mut self, window: WindowId, request: ConfigureRequest) {
        self.calls.push(Call::ConfigureUnmanaged(window, request));
    }

    fn set_border_width(&mut self, window: WindowId, width: u32) {
        self.calls.push(Call::BorderWidth(window, width));
    }

    fn set_border_color(&mut self, window: WindowId, color: u32) {
        self.calls.push(Call::BorderColor(window, color));
    }

    fn set_input_focus(&mut self, window: Option<WindowId>) {
        self.calls.push(Call::Focus(window));
    }

    fn send_protocol(&mut self, window: WindowId, protocol: Protocol) {
        self.calls.push(Call::SendProtocol(window, protocol));
    }

    fn kill_client(&mut self, window: WindowId) {
        self.calls.push(Call::Kill(window));
    }

    fn modifier_masks(&mut self) -> LockMasks {
        self.masks
    }

    fn keysym_for(&mut self, keycode: u32) -> KeySym {
        self.keysyms.get(&keycode).copied().unwrap_or(0)
    }

    fn grab_keys(&mut self, keys: &[(u32, KeySym)], _masks: LockMasks) {
        self.calls.push(Call::GrabKeys(keys.len()));
    }

    fn grab_buttons(&mut self, window: WindowId, _modifier: u32, _masks: LockMasks, click_to_focus: bool) {
        self.calls.push(Call::GrabButtons(window, click_to_focus));
    }

    fn grab_pointer(&mut self, cursor: CursorKind) -> bool {
        self.calls.push(Call::GrabPointer(cursor));
        true
    }

    fn ungrab_pointer(&mut self) {
        self.calls.push(Call::UngrabPointer);
    }

    fn publish_supported(&mut self, workspaces: usize) {
        self.calls.push(Call::Supported(workspaces));
    }

    fn set_active_window(&mut self, window: Option<WindowId>) {
        self.calls.push(Call::ActiveWindow(window));
    }

    fn set_current_desktop(&mut self, index: usize) {
        self.calls.push(Call::CurrentDesktop(index));
    }

    fn set_client_list(&mut self, windows: &[WindowId]) {
        self.calls.push(Call::ClientList(windows.to_vec()));
    }

    fn set_window_desktop(&mut self, window: WindowId, index: usize) {
        self.calls.push(Call::WindowDesktop(window, index));
    }

    fn set_fullscreen_state(&mut self, window: WindowId, fullscreen: bool) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.fullscreen = fullscreen;
        }
        self.calls.push(Call::FullscreenState(window, fullscreen));
    }

    fn set_frame_extents(&mut self, window: WindowId, border_width: u32) {
        self.calls.push(Call::FrameExtents(window, border_width));
    }

    fn set_workarea(&mut self, areas: &[Rect]) {
        self.calls.push(Call::Workarea(areas.to_vec()));
    }
}

/// Parent table standing in for `/proc`.
pub struct FakeProcesses(pub HashMap<u32, u32>);

impl ProcessTree for FakeProcesses {
    fn parent_of(&self, pid: u32) -> Option<u32> {
        self.0.get(&pid).copied()
    }
}

pub fn wm() -> WindowManager<FakeDisplay> {
    wm_with(Config::default())
}

pub fn wm_with(config: Config) -> WindowManager<FakeDisplay> {
    wm_on(vec![SCREEN], config)
}

/// A set-up window manager on the given monitors, with the call log cleared.
pub fn wm_on(monitors: Vec<Rect>, config: Config) -> WindowManager<FakeDisplay> {
    let mut wm = WindowManager::new(FakeDisplay::new(monitors), config);
    wm.setup();
    wm.display.calls.clear();
    wm
}

/// Creates a window of the given class and asks for it to be mapped.
pub fn open(wm: &mut WindowManager<FakeDisplay>, id: WindowId, class: &str) {
    wm.display.add_window(id, class);
    wm.handle_event(Event::MapRequest { window: id });
}
