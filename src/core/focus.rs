use crate::core::{
    display::{DisplayService, Protocol, WindowId},
    wm::WindowManager,
};

impl<D: DisplayService> WindowManager<D> {
    /// Gives the input focus to a client, or to the root window for `None`.
    pub fn set_input_focus(&mut self, window: Option<WindowId>, raise: bool, warp: bool) {
        let Some(id) = window.filter(|&id| self.clients.contains(id)) else {
            self.focused = None;
            self.display.set_input_focus(None);
            self.display.set_active_window(None);
            self.update_borders();
            return;
        };

        self.focused = Some(id);
        let Some(client) = self.clients.get(id) else {
            return;
        };
        let (workspace, monitor, tiled, geometry) =
            (client.workspace, client.monitor, client.is_tiled(), client.geometry);
        self.current_monitor = monitor;
        self.clients.workspace_mut(workspace).focused = Some(id);

        self.display.set_input_focus(Some(id));
        if self.display.supports_protocol(id, Protocol::TakeFocus) {
            self.display.send_protocol(id, Protocol::TakeFocus);
        }

        if raise {
            self.display.raise(id);
            if tiled {
                // Keep floating windows above the tiled one just raised.
                self.restack();
            }
        }
        self.display.set_active_window(Some(id));
        self.update_borders();

        if warp && self.config.warp_cursor {
            let (x, y) = geometry.center();
            self.display.warp_pointer(x, y);
        }
    }

    /// Colours every visible client's border by focus.
    pub(crate) fn update_borders(&mut self) {
        let focused = self.config.appearance.focused_border_color;
        let unfocused = self.config.appearance.unfocused_border_color;
        for id in self.clients.ids(self.current_workspace) {
            let color = if self.focused == Some(id) {
                focused
            } else {
                unfocused
            };
            self.display.set_border_color(id, color);
        }
    }

    /// Moves focus to the next (or previous) mapped client on the current
    /// monitor, wrapping around the workspace list.
    pub fn cycle_focus(&mut self, forward: bool) {
        let ids = self.clients.ids(self.current_workspace);
        let count = ids.len();
        if count == 0 {
            return;
        }

        let origin = self
            .focused
            .and_then(|f| ids.iter().position(|&id| id == f))
            .unwrap_or(if forward { count - 1 } else { 0 });
        let eligible = |id: WindowId| {
            self.clients
                .get(id)
                .is_some_and(|c| c.mapped && c.monitor == self.current_monitor)
        };

        let target = (1..=count)
            .map(|step| {
                if forward {
                    (origin + step) % count
                } else {
                    (origin + count - step) % count
                }
            })
            .map(|i| ids[i])
            .find(|&id| eligible(id));

        match target {
            Some(id) if Some(id) != self.focused => self.set_input_focus(Some(id), true, true),
            _ => {}
        }
    }

    pub(crate) fn enter_notify(&mut self, window: WindowId) {
        if !self.config.focus_follows_mouse || self.drag.is_active() {
            return;
        }
        let Some(id) = self.find_client(window) else {
            return;
        };
        if self.focused != Some(id) && self.is_visible(id) {
            self.set_input_focus(Some(id), false, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        core::display::Protocol,
        input::event::Event,
        utils::testing::{open, wm, Call},
    };

    #[test]
    fn cycling_visits_every_client_and_wraps() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        let mut seen = Vec::new();
        for _ in 0..3 {
            wm.cycle_focus(true);
            seen.push(wm.focused().unwrap());
        }
        assert_eq!(seen, vec![10, 11, 12]);

        wm.cycle_focus(false);
        assert_eq!(wm.focused(), Some(11));
    }

    #[test]
    fn cycling_without_focus_starts_at_an_end() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        wm.set_input_focus(None, false, false);
        wm.cycle_focus(true);
        assert_eq!(wm.focused(), Some(10));

        wm.set_input_focus(None, false, false);
        wm.cycle_focus(false);
        assert_eq!(wm.focused(), Some(12));
    }

    #[test]
    fn cycling_skips_withdrawn_clients() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        wm.handle_event(Event::UnmapNotify { window: 10 });
        wm.cycle_focus(true);
        assert_eq!(wm.focused(), Some(11));
    }

    #[test]
    fn single_client_cycle_is_a_no_op() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.display.calls.clear();
        wm.cycle_focus(true);
        assert!(wm.display.calls.is_empty());
    }

    #[test]
    fn borders_follow_focus() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        open(&mut wm, 11, "st");
        let colors = wm.config().appearance;
        assert_eq!(wm.display.last_border_color(11), Some(colors.focused_border_color));
        assert_eq!(wm.display.last_border_color(10), Some(colors.unfocused_border_color));
    }

    #[test]
    fn take_focus_clients_are_told() {
        let mut wm = wm();
        wm.display.add_window(10, "java").protocols = vec![Protocol::TakeFocus];
        wm.handle_event(Event::MapRequest { window: 10 });
        assert!(wm
            .display
            .calls
            .contains(&Call::SendProtocol(10, Protocol::TakeFocus)));
    }

    #[test]
    fn pointer_entering_a_window_focuses_it() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        open(&mut wm, 11, "st");
        wm.display.parents.insert(500, 10);
        wm.handle_event(Event::EnterNotify { window: 500 });
        assert_eq!(wm.focused(), Some(10));
    }

    #[test]
    fn enter_is_ignored_without_focus_follows_mouse() {
        let mut config = crate::config::loader::Config::default();
        config.focus_follows_mouse = false;
        let mut wm = crate::utils::testing::wm_with(config);
        open(&mut wm, 10, "st");
        open(&mut wm, 11, "st");
        wm.handle_event(Event::EnterNotify { window: 10 });
        assert_eq!(wm.focused(), Some(11));
    }
}
