use anyhow::Result;
use log::{debug, info, warn};

use crate::{
    config::loader::Config,
    core::{
        client::Client,
        display::{DisplayService, Protocol, WindowAttributes, WindowId, WindowType},
        geometry::Rect,
        monitor::Monitors,
        registry::{ClientRegistry, MAX_CLIENTS},
        scratchpad::{ScratchpadSlot, MAX_SCRATCHPADS},
    },
    input::{
        event::{ClientRequest, ConfigureRequest, Event},
        keyboard::KeyboardState,
        mouse::DragState,
    },
    utils::{
        command,
        process::{ProcFs, ProcessTree},
    },
};

/// Application context: every piece of window manager state, plus the
/// display it drives.
pub struct WindowManager<D: DisplayService> {
    pub(crate) display: D,
    pub(crate) running: bool,
    pub(crate) config: Config,
    pub(crate) monitors: Monitors,
    pub(crate) clients: ClientRegistry,
    pub(crate) current_workspace: usize,
    pub(crate) current_monitor: usize,
    pub(crate) focused: Option<WindowId>,
    pub(crate) docks: Vec<WindowId>,
    pub(crate) scratchpads: Vec<ScratchpadSlot>,
    pub(crate) drag: DragState,
    pub(crate) keyboard: KeyboardState,
    pub(crate) processes: Box<dyn ProcessTree>,
}

impl<D: DisplayService> WindowManager<D> {
    pub fn new(mut display: D, config: Config) -> Self {
        let fallback = Self::screen_rect(&mut display);
        let monitors = Monitors::new(display.monitors(), fallback);
        let clients = ClientRegistry::new(config.workspaces, MAX_CLIENTS);

        Self {
            display,
            running: true,
            config,
            monitors,
            clients,
            current_workspace: 0,
            current_monitor: 0,
            focused: None,
            docks: Vec::new(),
            scratchpads: vec![ScratchpadSlot::default(); MAX_SCRATCHPADS],
            drag: DragState::default(),
            keyboard: KeyboardState::default(),
            processes: Box::new(ProcFs),
        }
    }

    fn screen_rect(display: &mut D) -> Rect {
        let root = display.root();
        display
            .window_attributes(root)
            .map(|a| a.geometry)
            .unwrap_or(Rect::new(0, 0, 1, 1))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn current_workspace(&self) -> usize {
        self.current_workspace
    }

    /// Publishes EWMH support, grabs bindings, adopts windows that are
    /// already on screen and starts the configured programs.
    pub fn setup(&mut self) {
        self.display.publish_supported(self.clients.workspace_count());
        self.refresh_keyboard();
        self.scan();
        self.update_struts();
        self.display.set_current_desktop(self.current_workspace);
        self.update_client_list();
        if self.focused.is_none() {
            self.set_input_focus(None, false, false);
        }

        for argv in self.config.exec.clone() {
            if let Err(e) = command::spawn(&argv) {
                warn!("{:#}", e);
            }
        }
        info!("stackwm ready with {} monitor(s)", self.monitors.len());
    }

    pub fn run(&mut self) -> Result<()> {
        self.setup();
        while self.running {
            let event = self.display.next_event();
            self.handle_event(event);
        }
        info!("shutting down");
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::MapRequest { window } => self.map_request(window),
            Event::UnmapNotify { window } => self.unmap_notify(window),
            Event::DestroyNotify { window } => self.unmanage(window),
            Event::ConfigureRequest { window, request } => self.configure_request(window, request),
            Event::ScreenChange => self.screen_change(),
            Event::KeyPress { keycode, state } => self.handle_keypress(keycode, state),
            Event::ButtonPress {
                window,
                button,
                state,
                x_root,
                y_root,
                ..
            } => self.button_press(window, button, state, x_root, y_root),
            Event::ButtonRelease { .. } => self.button_release(),
            Event::MotionNotify {
                x_root,
                y_root,
                time,
            } => self.motion(x_root, y_root, time),
            Event::EnterNotify { window } => self.enter_notify(window),
            Event::StrutChange { window } => {
                if self.docks.contains(&window) {
                    self.update_struts();
                }
            }
            Event::ClientMessage { window, request } => self.client_message(window, request),
            Event::MappingNotify => self.refresh_keyboard(),
            Event::Ignored => {}
        }
    }

    /// Re-detects lock modifiers and grabs every key and button binding
    /// again.
    pub(crate) fn refresh_keyboard(&mut self) {
        let masks = self.display.modifier_masks();
        self.keyboard = KeyboardState::new(masks);
        let keys: Vec<_> = self.config.binds.iter().map(|b| (b.mods, b.keysym)).collect();
        self.display.grab_keys(&keys, masks);
        for id in self.clients.all_ids() {
            self.grab_client_buttons(id);
        }
    }

    pub(crate) fn grab_client_buttons(&mut self, window: WindowId) {
        self.display.grab_buttons(
            window,
            self.config.modifier,
            self.keyboard.masks,
            !self.config.focus_follows_mouse,
        );
    }

    fn scan(&mut self) {
        let windows = self.display.top_level_windows();
        let mut transients = Vec::new();
        for window in windows {
            let Some(attrs) = self.display.window_attributes(window) else {
                continue;
            };
            if attrs.override_redirect || !attrs.viewable {
                continue;
            }
            if self.display.transient_for(window).is_some() {
                transients.push(window);
            } else {
                self.map_request(window);
            }
        }
        for window in transients {
            self.map_request(window);
        }
    }

    pub(crate) fn find_client(&mut self, window: WindowId) -> Option<WindowId> {
        if self.clients.contains(window) {
            return Some(window);
        }
        let top = self.display.top_level(window);
        self.clients.contains(top).then_some(top)
    }

    pub(crate) fn border_width(&self) -> u32 {
        self.config.appearance.border_width
    }

    /// Whether the client is on screen right now.
    pub(crate) fn is_visible(&self, id: WindowId) -> bool {
        self.clients
            .get(id)
            .is_some_and(|c| c.mapped && c.workspace == self.current_workspace)
    }

    /// Unmaps a client that is on screen. The mapped flag is left alone; the
    /// resulting unmap notification is expected and skipped.
    pub(crate) fn hide_window(&mut self, id: WindowId) {
        if !self.is_visible(id) {
            return;
        }
        self.display.unmap(id);
        if let Some(client) = self.clients.get_mut(id) {
            client.pending_unmaps += 1;
        }
    }

    pub(crate) fn update_client_list(&mut self) {
        let ids = self.clients.all_ids();
        self.display.set_client_list(&ids);
    }

    /// Rect of the given size centred in a monitor's work area.
    pub(crate) fn centred(&self, geometry: Rect, monitor: usize) -> Rect {
        let area = self.monitors.get(monitor).work_area();
        let bw = 2 * self.border_width() as i32;
        Rect::new(
            area.x + (area.w as i32 - geometry.w as i32 - bw) / 2,
            area.y + (area.h as i32 - geometry.h as i32 - bw) / 2,
            geometry.w,
            geometry.h,
        )
    }

    fn map_request(&mut self, window: WindowId) {
        if let Some(client) = self.clients.get_mut(window) {
            client.mapped = true;
            let visible = client.workspace == self.current_workspace;
            if visible {
                self.display.map(window);
                self.tile();
            }
            return;
        }
        if self.docks.contains(&window) {
            self.display.map(window);
            return;
        }

        let Some(attrs) = self.display.window_attributes(window) else {
            return;
        };
        if attrs.override_redirect {
            return;
        }
        match self.display.window_type(window) {
            WindowType::Dock => self.manage_dock(window),
            kind => self.manage(window, attrs, kind),
        }
    }

    fn manage_dock(&mut self, window: WindowId) {
        debug!("managing dock {:#x}", window);
        self.docks.push(window);
        self.display.watch_window(window);
        self.display.map(window);
        self.update_struts();
    }

    fn manage(&mut self, window: WindowId, attrs: WindowAttributes, kind: WindowType) {
        let class = self.display.window_class(window).unwrap_or_default();
        let workspace = self
            .config
            .rules
            .workspace_for(&class)
            .filter(|&ws| ws < self.clients.workspace_count())
            .unwrap_or(self.current_workspace);
        let pointer = self.display.query_pointer();
        let monitor = self.monitors.monitor_for_point(pointer.x, pointer.y);

        let fixed = self.display.fixed_size(window);
        let transient = self.display.transient_for(window);
        let mut geometry = attrs.geometry;
        if let Some((w, h)) = fixed {
            geometry.w = w;
            geometry.h = h;
        }

        let mut client = Client::new(window, geometry, workspace, monitor);
        client.fixed = fixed.is_some();
        client.pid = self.display.window_pid(window);
        client.floating = client.fixed
            || transient.is_some()
            || kind.floats()
            || self.config.rules.should_float(&class)
            || self.clients.workspace(workspace).floating;
        if client.floating {
            client.geometry = self.centred(geometry, monitor);
        }
        let floating = client.floating;
        let geometry = client.geometry;

        if let Err(e) = self.clients.add(client, self.config.new_win_master) {
            warn!("not managing {:#x}: {}", window, e);
            return;
        }
        debug!(
            "managing {:#x} ({}) on workspace {}",
            window,
            class.class,
            workspace + 1
        );

        let bw = self.border_width();
        self.display.set_border_width(window, bw);
        self.display
            .set_border_color(window, self.config.appearance.unfocused_border_color);
        self.display.watch_window(window);
        self.grab_client_buttons(window);
        self.display.set_window_desktop(window, workspace);
        self.display.set_frame_extents(window, bw);
        if floating {
            self.display.configure(window, geometry, bw);
        }

        self.try_swallow(window, &class);

        let on_current = workspace == self.current_workspace;
        if on_current {
            self.display.map(window);
        } else if attrs.viewable {
            self.display.unmap(window);
            if let Some(client) = self.clients.get_mut(window) {
                client.pending_unmaps += 1;
            }
        }

        if self.config.rules.start_fullscreen(&class) || self.display.wants_fullscreen(window) {
            self.apply_fullscreen(window, true);
        } else {
            self.tile();
        }

        if on_current && self.config.new_win_focus {
            self.set_input_focus(Some(window), true, true);
        } else {
            self.update_borders();
        }
        self.update_client_list();
    }

    fn unmap_notify(&mut self, window: WindowId) {
        if let Some(client) = self.clients.get_mut(window) {
            if client.pending_unmaps > 0 {
                client.pending_unmaps -= 1;
                return;
            }
            client.mapped = false;
            let next = self.clients.successor(window);
            if self.focused == Some(window) {
                self.set_input_focus(next, true, false);
            }
            self.tile();
            return;
        }
        if let Some(pos) = self.docks.iter().position(|&d| d == window) {
            self.docks.remove(pos);
            self.update_struts();
        }
    }

    /// Forgets a destroyed window. A client it had swallowed comes back in
    /// its place.
    pub(crate) fn unmanage(&mut self, window: WindowId) {
        let Some(client) = self.clients.get(window) else {
            if let Some(pos) = self.docks.iter().position(|&d| d == window) {
                self.docks.remove(pos);
                self.update_struts();
            }
            return;
        };
        let swallowed = client.swallowed;
        let swallower = client.swallower;
        let was_focused = self.focused == Some(window);
        let mut next = self.clients.successor(window);

        for slot in self.scratchpads.iter_mut().filter(|s| s.client == Some(window)) {
            *slot = ScratchpadSlot::default();
        }
        if self.drag.client == Some(window) {
            self.display.ungrab_pointer();
            self.drag = DragState::default();
        } else if self.drag.swap_target == Some(window) {
            self.drag.swap_target = None;
        }

        if let Some(hidden) = swallowed {
            self.clients.swap(window, hidden);
        }
        self.clients.remove(window);
        debug!("unmanaged {:#x}", window);

        if let Some(parent) = swallower.and_then(|s| self.clients.get_mut(s)) {
            parent.swallowed = None;
        }
        if let Some(hidden) = swallowed {
            if let Some(client) = self.clients.get_mut(hidden) {
                client.swallower = None;
                client.mapped = true;
                if client.workspace == self.current_workspace {
                    self.display.map(hidden);
                }
                next = Some(hidden);
            }
        }

        self.tile();
        if was_focused {
            self.focused = None;
            self.set_input_focus(next, true, false);
        } else {
            self.update_borders();
        }
        self.update_client_list();
    }

    fn configure_request(&mut self, window: WindowId, request: ConfigureRequest) {
        let bw = self.border_width();
        let Some(client) = self.clients.get_mut(window) else {
            self.display.configure_unmanaged(window, request);
            return;
        };

        if client.floating && !client.fullscreen {
            let g = &mut client.geometry;
            g.x = request.x.unwrap_or(g.x);
            g.y = request.y.unwrap_or(g.y);
            g.w = request.width.unwrap_or(g.w).max(1);
            g.h = request.height.unwrap_or(g.h).max(1);
            let geometry = *g;
            client.monitor = self.monitors.monitor_for_rect(geometry);
            self.display.configure(window, geometry, bw);
        } else {
            let border = if client.fullscreen { 0 } else { bw };
            self.display.configure(window, client.geometry, border);
        }
    }

    fn client_message(&mut self, window: WindowId, request: ClientRequest) {
        match request {
            ClientRequest::CurrentDesktop(index) => self.change_workspace(index),
            _ if !self.clients.contains(window) => {}
            ClientRequest::Fullscreen(action) => {
                let current = self.clients.get(window).is_some_and(|c| c.fullscreen);
                self.apply_fullscreen(window, action.resolve(current));
            }
            ClientRequest::Activate => {
                let Some(client) = self.clients.get(window) else {
                    return;
                };
                if !client.mapped {
                    return;
                }
                let workspace = client.workspace;
                if workspace != self.current_workspace {
                    self.change_workspace(workspace);
                }
                self.set_input_focus(Some(window), true, false);
            }
            ClientRequest::Close => self.close_window(window),
        }
    }

    /// Asks the client to close, or disconnects it when it does not speak
    /// `WM_DELETE_WINDOW`.
    pub(crate) fn close_window(&mut self, window: WindowId) {
        if self.display.supports_protocol(window, Protocol::DeleteWindow) {
            self.display.send_protocol(window, Protocol::DeleteWindow);
        } else {
            self.display.kill_client(window);
        }
    }

    fn screen_change(&mut self) {
        let fallback = Self::screen_rect(&mut self.display);
        let rects = self.display.monitors();
        self.monitors.refresh(rects, fallback);
        for id in self.clients.all_ids() {
            let monitors = &self.monitors;
            let Some(client) = self.clients.get_mut(id) else {
                continue;
            };
            if client.monitor >= monitors.len() || !client.fullscreen {
                client.monitor = monitors.monitor_for_rect(client.geometry);
            }
            if client.fullscreen {
                let rect = monitors.get(client.monitor).rect;
                if client.geometry != rect {
                    client.geometry = rect;
                    self.display.configure(id, rect, 0);
                }
            }
        }
        self.current_monitor = self.current_monitor.min(self.monitors.len() - 1);
        info!("output layout changed, {} monitor(s)", self.monitors.len());
        self.update_struts();
    }

    /// Rebuilds reserved space from the dock windows and retiles.
    pub(crate) fn update_struts(&mut self) {
        let mut reserved = Vec::new();
        for dock in self.docks.clone() {
            let Some(attrs) = self.display.window_attributes(dock) else {
                continue;
            };
            if let Some(strut) = self.display.strut(dock) {
                reserved.push((attrs.geometry, strut));
            }
        }
        let root = Self::screen_rect(&mut self.display);
        self.monitors.apply_struts(root, &reserved);
        let areas = self.monitors.work_areas();
        self.display.set_workarea(&areas);
        self.tile();
    }

    pub fn change_workspace(&mut self, target: usize) {
        if target >= self.clients.workspace_count() || target == self.current_workspace {
            return;
        }
        self.display.grab_server();
        self.switch_workspace(target);
        self.display.ungrab_server();
        self.display.sync();
    }

    fn switch_workspace(&mut self, target: usize) {
        let old = self.current_workspace;
        debug!("switching to workspace {}", target + 1);

        let pads: Vec<WindowId> = self
            .scratchpads
            .iter()
            .filter(|s| s.enabled)
            .filter_map(|s| s.client)
            .filter(|&id| self.is_visible(id))
            .collect();

        for id in self.clients.ids(old) {
            if !pads.contains(&id) {
                self.hide_window(id);
            }
        }
        for &id in &pads {
            self.clients.move_to_workspace(id, target);
            self.display.set_window_desktop(id, target);
        }

        self.current_workspace = target;
        for id in self.clients.ids(target) {
            if self.clients.get(id).is_some_and(|c| c.mapped) {
                self.display.map(id);
            }
        }
        self.tile();

        let remembered = self
            .clients
            .workspace(target)
            .focused
            .filter(|&id| self.is_visible(id));
        let next = remembered.or_else(|| {
            self.clients
                .clients_on(target)
                .find(|c| c.mapped && c.monitor == self.current_monitor)
                .or_else(|| self.clients.clients_on(target).find(|c| c.mapped))
                .map(|c| c.id)
        });
        self.focused = None;
        self.set_input_focus(next, true, false);
        self.display.set_current_desktop(target);
    }

    /// Sends the focused client to another workspace.
    pub fn move_to_workspace(&mut self, target: usize) {
        let Some(id) = self.focused else {
            return;
        };
        if target >= self.clients.workspace_count()
            || self.clients.get(id).is_some_and(|c| c.workspace == target)
        {
            return;
        }
        let next = self.clients.successor(id);
        self.hide_window(id);
        self.clients.move_to_workspace(id, target);
        self.display.set_window_desktop(id, target);
        self.tile();
        self.focused = None;
        self.set_input_focus(next, true, false);
        self.update_client_list();
    }

    pub fn reload_config(&mut self) {
        match Config::load() {
            Ok(config) => self.apply_config(config),
            Err(e) => warn!("failed to reload configuration: {:#}", e),
        }
    }

    /// Replaces the configuration wholesale and reapplies everything derived
    /// from it.
    pub fn apply_config(&mut self, mut config: Config) {
        let workspaces = self.clients.workspace_count();
        if config.workspaces != workspaces {
            warn!(
                "workspace count changed to {}, restart to apply it",
                config.workspaces
            );
            config.workspaces = workspaces;
        }
        self.config = config;
        self.refresh_keyboard();

        let bw = self.border_width();
        for id in self.clients.all_ids() {
            let fullscreen = self.clients.get(id).is_some_and(|c| c.fullscreen);
            self.display.set_border_width(id, if fullscreen { 0 } else { bw });
            self.display.set_frame_extents(id, bw);
        }
        self.tile();
        self.update_borders();
        info!("configuration reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::display::Protocol,
        input::event::StateAction,
        utils::testing::{open, wm, wm_with, Call, SCREEN},
    };

    #[test]
    fn new_windows_are_tiled_and_focused() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        assert!(wm.display.is_mapped(10));
        assert_eq!(wm.focused(), Some(10));
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1898, 1058)));
        assert!(wm.display.calls.contains(&Call::ActiveWindow(Some(10))));
        assert!(wm.display.calls.contains(&Call::ClientList(vec![10])));
    }

    #[test]
    fn override_redirect_windows_are_ignored() {
        let mut wm = wm();
        wm.display.add_window(10, "menu").attrs.override_redirect = true;
        wm.handle_event(Event::MapRequest { window: 10 });
        assert!(!wm.clients.contains(10));
        assert!(wm.display.calls.is_empty());
    }

    #[test]
    fn capacity_leaves_extra_windows_unmanaged() {
        let mut wm = wm();
        for id in 0..MAX_CLIENTS as u64 {
            open(&mut wm, 100 + id, "st");
        }
        wm.display.calls.clear();
        open(&mut wm, 999, "st");
        assert!(!wm.clients.contains(999));
        assert!(!wm.display.is_mapped(999));
        assert_eq!(wm.clients.len(), MAX_CLIENTS);
    }

    #[test]
    fn destroying_focused_window_focuses_sibling() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        open(&mut wm, 11, "st");
        open(&mut wm, 12, "st");
        wm.set_input_focus(Some(11), false, false);
        wm.handle_event(Event::DestroyNotify { window: 11 });
        assert_eq!(wm.focused(), Some(12));
        wm.handle_event(Event::DestroyNotify { window: 12 });
        assert_eq!(wm.focused(), Some(10));
        wm.handle_event(Event::DestroyNotify { window: 10 });
        assert_eq!(wm.focused(), None);
        assert_eq!(wm.display.calls.last(), Some(&Call::ClientList(vec![])));
        assert!(wm.display.calls.contains(&Call::Focus(None)));
    }

    #[test]
    fn workspace_switch_is_bracketed_by_server_grab() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.display.calls.clear();
        wm.change_workspace(1);

        assert_eq!(wm.display.calls.first(), Some(&Call::GrabServer));
        assert_eq!(wm.display.calls.last(), Some(&Call::UngrabServer));
        assert!(!wm.display.is_mapped(10));
        assert_eq!(wm.focused(), None);

        // Our own unmap must not mark the client as withdrawn.
        wm.handle_event(Event::UnmapNotify { window: 10 });
        assert!(wm.clients.get(10).unwrap().mapped);

        wm.change_workspace(0);
        assert!(wm.display.is_mapped(10));
        assert_eq!(wm.focused(), Some(10));
    }

    #[test]
    fn switching_to_current_or_missing_workspace_does_nothing() {
        let mut wm = wm();
        wm.change_workspace(0);
        wm.change_workspace(42);
        assert!(wm.display.calls.is_empty());
    }

    #[test]
    fn moving_window_to_workspace_hides_it() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        open(&mut wm, 11, "st");
        wm.move_to_workspace(3);
        assert!(!wm.display.is_mapped(11));
        assert_eq!(wm.clients.get(11).unwrap().workspace, 3);
        assert_eq!(wm.focused(), Some(10));
        assert!(wm.display.calls.contains(&Call::WindowDesktop(11, 3)));
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1898, 1058)));
    }

    #[test]
    fn workspace_rules_place_windows_off_screen() {
        let mut config = Config::default();
        config.rules.add_open_in_workspace("firefox, 2", 9).unwrap();
        let mut wm = wm_with(config);
        open(&mut wm, 10, "firefox");
        assert_eq!(wm.clients.get(10).unwrap().workspace, 1);
        assert!(!wm.display.is_mapped(10));
        assert_eq!(wm.focused(), None);
    }

    #[test]
    fn client_withdrawing_itself_is_untiled() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        open(&mut wm, 11, "st");
        wm.handle_event(Event::UnmapNotify { window: 11 });
        assert!(!wm.clients.get(11).unwrap().mapped);
        assert_eq!(wm.focused(), Some(10));
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1898, 1058)));

        wm.handle_event(Event::MapRequest { window: 11 });
        assert!(wm.clients.get(11).unwrap().mapped);
        assert_eq!(wm.clients.len(), 2);
    }

    #[test]
    fn tiled_configure_requests_are_refused() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.display.calls.clear();
        let request = ConfigureRequest {
            width: Some(200),
            ..ConfigureRequest::default()
        };
        wm.handle_event(Event::ConfigureRequest { window: 10, request });
        assert_eq!(
            wm.display.calls,
            vec![Call::Configure(10, Rect::new(10, 10, 1898, 1058), 1)]
        );

        wm.handle_event(Event::ConfigureRequest { window: 77, request });
        assert_eq!(
            wm.display.calls.last(),
            Some(&Call::ConfigureUnmanaged(77, request))
        );
    }

    #[test]
    fn floating_configure_requests_are_honoured() {
        let mut wm = wm();
        wm.display.add_window(10, "dialog").transient = Some(5);
        wm.handle_event(Event::MapRequest { window: 10 });
        let request = ConfigureRequest {
            x: Some(50),
            height: Some(120),
            ..ConfigureRequest::default()
        };
        wm.handle_event(Event::ConfigureRequest { window: 10, request });
        let g = wm.clients.get(10).unwrap().geometry;
        assert_eq!((g.x, g.w, g.h), (50, 400, 120));
    }

    #[test]
    fn ewmh_fullscreen_requests_toggle_state() {
        let mut wm = wm();
        open(&mut wm, 10, "mpv");
        let request = ClientRequest::Fullscreen(StateAction::Toggle);
        wm.handle_event(Event::ClientMessage { window: 10, request });
        assert!(wm.clients.get(10).unwrap().fullscreen);
        assert!(wm.display.calls.contains(&Call::FullscreenState(10, true)));
        wm.handle_event(Event::ClientMessage { window: 10, request });
        assert!(!wm.clients.get(10).unwrap().fullscreen);
    }

    #[test]
    fn close_prefers_delete_protocol() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.display.windows.get_mut(&10).unwrap().protocols = vec![Protocol::DeleteWindow];
        open(&mut wm, 11, "xterm");
        wm.handle_event(Event::ClientMessage {
            window: 10,
            request: ClientRequest::Close,
        });
        wm.handle_event(Event::ClientMessage {
            window: 11,
            request: ClientRequest::Close,
        });
        assert!(wm
            .display
            .calls
            .contains(&Call::SendProtocol(10, Protocol::DeleteWindow)));
        assert!(wm.display.calls.contains(&Call::Kill(11)));
    }

    #[test]
    fn docks_reserve_space() {
        let mut wm = wm();
        let dock = wm.display.add_window(5, "bar");
        dock.kind = WindowType::Dock;
        dock.attrs.geometry = Rect::new(0, 0, 1920, 24);
        dock.strut = Some(crate::core::geometry::Strut {
            top: 24,
            ..Default::default()
        });
        wm.handle_event(Event::MapRequest { window: 5 });
        assert!(!wm.clients.contains(5));
        assert!(wm.display.is_mapped(5));

        open(&mut wm, 10, "st");
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 34, 1898, 1034)));
        assert!(wm
            .display
            .calls
            .contains(&Call::Workarea(vec![Rect::new(0, 24, 1920, 1056)])));

        wm.handle_event(Event::DestroyNotify { window: 5 });
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1898, 1058)));
    }

    #[test]
    fn screen_change_retiles_on_new_outputs() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.display.monitors = vec![Rect::new(0, 0, 1280, 1024)];
        wm.handle_event(Event::ScreenChange);
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1258, 1002)));
    }

    #[test]
    fn fullscreen_clients_follow_a_resized_output() {
        let mut wm = wm();
        open(&mut wm, 10, "mpv");
        wm.apply_fullscreen(10, true);
        let output = Rect::new(0, 0, 2560, 1440);
        wm.display.monitors = vec![output];
        wm.handle_event(Event::ScreenChange);
        assert_eq!(wm.clients.get(10).unwrap().geometry, output);
        assert!(wm.display.calls.contains(&Call::Configure(10, output, 0)));
    }

    #[test]
    fn existing_windows_are_adopted() {
        let mut display = crate::utils::testing::FakeDisplay::new(vec![SCREEN]);
        display.add_window(10, "st").attrs.viewable = true;
        display.add_window(11, "hidden");
        let mut wm = WindowManager::new(display, Config::default());
        wm.setup();
        assert!(wm.clients.contains(10));
        assert!(!wm.clients.contains(11));
    }

    #[test]
    fn reload_with_broken_file_restores_defaults() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.config.appearance.gaps = 40;
        wm.config.binds.clear();
        wm.display.calls.clear();

        wm.apply_config(Config::parse("gaps : -3\nbogus\ncall : mod + x : nope\n", "test"));
        assert_eq!(wm.config, Config::default());
        assert!(wm
            .display
            .calls
            .contains(&Call::GrabKeys(Config::default().binds.len())));
        assert!(wm.display.calls.contains(&Call::GrabButtons(10, false)));
        assert_eq!(wm.display.configures(), 0);
    }
}
