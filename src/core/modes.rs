use log::debug;

use crate::core::{
    display::{DisplayService, WindowClass, WindowId},
    wm::WindowManager,
};

impl<D: DisplayService> WindowManager<D> {
    pub fn toggle_floating(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(client) = self.clients.get_mut(id) else {
            return;
        };
        if client.fullscreen {
            return;
        }
        client.floating = !client.floating;
        if client.floating {
            self.display.raise(id);
        } else {
            client.monitor = self.monitors.monitor_for_rect(client.geometry);
        }
        self.tile();
        self.update_borders();
    }

    /// Flips the floating default of the current workspace and applies it to
    /// every client on it.
    pub fn toggle_floating_global(&mut self) {
        let workspace = self.clients.workspace_mut(self.current_workspace);
        workspace.floating = !workspace.floating;
        let floating = workspace.floating;

        for id in self.clients.ids(self.current_workspace) {
            if let Some(client) = self.clients.get_mut(id) {
                if !client.fullscreen {
                    client.floating = floating;
                }
            }
        }
        self.tile();
        self.update_borders();
    }

    /// Puts a client into or out of fullscreen, remembering the floating
    /// state and geometry it had before.
    pub fn apply_fullscreen(&mut self, id: WindowId, on: bool) {
        let bw = self.border_width();
        let Some(client) = self.clients.get_mut(id) else {
            return;
        };
        if client.fullscreen == on {
            return;
        }

        if on {
            client.saved = client.geometry;
            client.floating_before_fullscreen = client.floating;
            client.floating = false;
            client.fullscreen = true;
            let rect = self.monitors.get(client.monitor).rect;
            client.geometry = rect;
            self.display.set_border_width(id, 0);
            self.display.configure(id, rect, 0);
            self.display.raise(id);
        } else {
            client.fullscreen = false;
            client.floating = client.floating_before_fullscreen;
            client.geometry = client.saved;
            let saved = client.saved;
            client.monitor = self.monitors.monitor_for_rect(saved);
            self.display.set_border_width(id, bw);
            self.display.configure(id, saved, bw);
        }
        self.display.set_fullscreen_state(id, on);
        debug!("fullscreen {} for {:#x}", on, id);
        self.tile();
        self.update_borders();
    }

    pub fn toggle_fullscreen(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        let on = self.clients.get(id).is_some_and(|c| !c.fullscreen);
        self.apply_fullscreen(id, on);
    }

    pub fn toggle_monocle(&mut self) {
        let workspace = self.clients.workspace_mut(self.current_workspace);
        workspace.monocle = !workspace.monocle;
        self.tile();
    }

    /// Lets a newly managed client take the place of a terminal that spawned
    /// it. The terminal is hidden until the new client goes away.
    pub(crate) fn try_swallow(&mut self, window: WindowId, class: &WindowClass) -> bool {
        if !self.config.rules.can_be_swallowed(class) {
            return false;
        }
        let Some(new) = self.clients.get(window) else {
            return false;
        };
        let (workspace, pid) = (new.workspace, new.pid);

        let mut candidates: Vec<WindowId> = self
            .clients
            .clients_on(workspace)
            .filter(|c| c.id != window && c.mapped && c.swallowed.is_none())
            .filter(|c| c.swallower.is_none() && !c.fullscreen)
            .map(|c| c.id)
            .collect();
        if let Some(pos) = self.focused.and_then(|f| candidates.iter().position(|&id| id == f)) {
            let focused = candidates.remove(pos);
            candidates.insert(0, focused);
        }

        for candidate in candidates {
            let class = self.display.window_class(candidate).unwrap_or_default();
            if !self.config.rules.can_swallow(&class) {
                continue;
            }
            if self.config.swallow_requires_ancestry {
                let parent = self.clients.get(candidate).and_then(|c| c.pid);
                let related = match (parent, pid) {
                    (Some(parent), Some(child)) => self.processes.is_ancestor(parent, child),
                    _ => false,
                };
                if !related {
                    continue;
                }
            }

            self.hide_window(candidate);
            if let Some(host) = self.clients.get_mut(candidate) {
                host.swallower = Some(window);
                host.mapped = false;
            }
            if let Some(new) = self.clients.get_mut(window) {
                new.swallowed = Some(candidate);
            }
            self.clients.swap(window, candidate);
            debug!("{:#x} swallowed {:#x}", window, candidate);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{
        config::loader::Config,
        core::geometry::Rect,
        input::event::Event,
        utils::testing::{open, wm, wm_with, Call, FakeProcesses, SCREEN},
    };

    #[test]
    fn fullscreen_round_trip_restores_floating_geometry() {
        let mut wm = wm();
        open(&mut wm, 10, "mpv");
        wm.toggle_floating();
        let floating = wm.clients.get(10).unwrap().geometry;

        wm.toggle_fullscreen();
        let client = wm.clients.get(10).unwrap();
        assert!(client.fullscreen && !client.floating);
        assert_eq!(wm.display.geometry(10), Some(SCREEN));
        assert!(wm.display.calls.contains(&Call::Configure(10, SCREEN, 0)));

        wm.toggle_fullscreen();
        let client = wm.clients.get(10).unwrap();
        assert!(!client.fullscreen && client.floating);
        assert_eq!(client.geometry, floating);
        assert_eq!(wm.display.calls.last(), Some(&Call::BorderColor(10, 0xC0CBFF)));
        assert!(wm.display.calls.contains(&Call::FullscreenState(10, false)));
    }

    #[test]
    fn fullscreen_client_leaves_the_layout() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        open(&mut wm, 11, "mpv");
        wm.toggle_fullscreen();
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1898, 1058)));

        wm.toggle_fullscreen();
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1138, 1058)));
        assert_eq!(wm.display.geometry(11), Some(Rect::new(1160, 10, 748, 1058)));
    }

    #[test]
    fn floating_toggle_recolours_borders() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.display.calls.clear();
        wm.toggle_floating();
        assert_eq!(wm.display.calls.last(), Some(&Call::BorderColor(10, 0xC0CBFF)));
        wm.display.calls.clear();
        wm.toggle_floating();
        assert_eq!(wm.display.calls.last(), Some(&Call::BorderColor(10, 0xC0CBFF)));
    }

    #[test]
    fn floating_toggle_is_refused_in_fullscreen() {
        let mut wm = wm();
        open(&mut wm, 10, "mpv");
        wm.toggle_fullscreen();
        wm.toggle_floating();
        assert!(!wm.clients.get(10).unwrap().floating);
    }

    #[test]
    fn start_fullscreen_rule_applies_on_map() {
        let mut config = Config::default();
        config.rules.add_start_fullscreen("mpv").unwrap();
        let mut wm = wm_with(config);
        open(&mut wm, 10, "mpv");
        assert!(wm.clients.get(10).unwrap().fullscreen);
    }

    #[test]
    fn global_floating_covers_new_windows() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.toggle_floating_global();
        open(&mut wm, 11, "st");
        assert!(wm.clients.get(10).unwrap().floating);
        assert!(wm.clients.get(11).unwrap().floating);

        wm.toggle_floating_global();
        assert!(!wm.clients.get(11).unwrap().floating);
    }

    #[test]
    fn monocle_stacks_everything_full_size() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        wm.toggle_monocle();
        for id in [10, 11, 12] {
            assert_eq!(wm.display.geometry(id), Some(Rect::new(10, 10, 1898, 1058)));
        }
        assert_eq!(wm.display.calls.last(), Some(&Call::Raise(12)));
    }

    fn swallowing_wm() -> crate::core::wm::WindowManager<crate::utils::testing::FakeDisplay> {
        let mut config = Config::default();
        config.rules.add_can_swallow("st").unwrap();
        config.rules.add_can_be_swallowed("mpv").unwrap();
        let mut wm = wm_with(config);
        wm.processes = Box::new(FakeProcesses(HashMap::from([(300, 200), (200, 100)])));
        wm
    }

    #[test]
    fn child_window_swallows_its_terminal() {
        let mut wm = swallowing_wm();
        wm.display.add_window(10, "st").pid = Some(100);
        wm.handle_event(Event::MapRequest { window: 10 });
        open(&mut wm, 5, "xterm");
        wm.display.add_window(11, "mpv").pid = Some(300);
        wm.handle_event(Event::MapRequest { window: 11 });

        assert!(!wm.display.is_mapped(10));
        assert_eq!(wm.clients.ids(0), vec![11, 5, 10]);
        assert_eq!(wm.display.geometry(11), Some(Rect::new(10, 10, 1138, 1058)));

        wm.handle_event(Event::UnmapNotify { window: 10 });
        wm.handle_event(Event::DestroyNotify { window: 11 });
        assert!(wm.display.is_mapped(10));
        assert_eq!(wm.clients.ids(0), vec![10, 5]);
        assert_eq!(wm.focused(), Some(10));
        let terminal = wm.clients.get(10).unwrap();
        assert!(terminal.mapped && terminal.swallower.is_none());
        assert_eq!(wm.display.geometry(10), Some(Rect::new(10, 10, 1138, 1058)));
    }

    #[test]
    fn unrelated_processes_are_not_swallowed() {
        let mut wm = swallowing_wm();
        wm.display.add_window(10, "st").pid = Some(999);
        wm.handle_event(Event::MapRequest { window: 10 });
        wm.display.add_window(11, "mpv").pid = Some(300);
        wm.handle_event(Event::MapRequest { window: 11 });
        assert!(wm.display.is_mapped(10));
        assert!(wm.clients.get(11).unwrap().swallowed.is_none());
    }
}
