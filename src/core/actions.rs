use log::{debug, warn};

use crate::{
    config::command::{Action, Direction, Function, ScratchpadOp},
    core::{display::DisplayService, geometry::Rect, wm::WindowManager},
    input::mouse::MIN_WINDOW_SIZE,
    utils::command,
};

impl<D: DisplayService> WindowManager<D> {
    pub(crate) fn handle_keypress(&mut self, keycode: u32, state: u32) {
        let keysym = self.display.keysym_for(keycode);
        let Some(action) = self.keyboard.resolve(&self.config.binds, keysym, state).cloned() else {
            return;
        };
        debug!("key {} ({:#x}) -> {:?}", keycode, keysym, action);
        self.execute(action);
    }

    pub fn execute(&mut self, action: Action) {
        match action {
            Action::Spawn(argv) => {
                if let Err(e) = command::spawn(&argv) {
                    warn!("{:#}", e);
                }
            }
            Action::Call(function) => self.call(function),
            Action::ChangeWorkspace(index) => self.change_workspace(index),
            Action::MoveToWorkspace(index) => self.move_to_workspace(index),
            Action::Scratchpad(op, index) => match op {
                ScratchpadOp::Create => self.scratchpad_create(index),
                ScratchpadOp::Toggle => self.scratchpad_toggle(index),
                ScratchpadOp::Remove => self.scratchpad_remove(index),
            },
        }
    }

    fn call(&mut self, function: Function) {
        match function {
            Function::CloseWindow => {
                if let Some(id) = self.focused {
                    self.close_window(id);
                }
            }
            Function::IncreaseGaps => self.set_gaps(self.config.appearance.gaps.saturating_add(1)),
            Function::DecreaseGaps => self.set_gaps(self.config.appearance.gaps.saturating_sub(1)),
            Function::FocusNext => self.cycle_focus(true),
            Function::FocusPrevious => self.cycle_focus(false),
            Function::MasterNext => self.rotate_master(true),
            Function::MasterPrevious => self.rotate_master(false),
            Function::MasterIncrease => self.resize_master(1.0),
            Function::MasterDecrease => self.resize_master(-1.0),
            Function::StackIncrease => self.resize_stack(true),
            Function::StackDecrease => self.resize_stack(false),
            Function::Quit => self.running = false,
            Function::ReloadConfig => self.reload_config(),
            Function::ToggleFloating => self.toggle_floating(),
            Function::GlobalFloating => self.toggle_floating_global(),
            Function::Fullscreen => self.toggle_fullscreen(),
            Function::Monocle => self.toggle_monocle(),
            Function::CentreWindow => self.centre_window(),
            Function::NextWorkspace => {
                let count = self.clients.workspace_count();
                self.change_workspace((self.current_workspace + 1) % count);
            }
            Function::PrevWorkspace => {
                let count = self.clients.workspace_count();
                self.change_workspace((self.current_workspace + count - 1) % count);
            }
            Function::NextMonitor => self.focus_monitor(self.monitors.next(self.current_monitor)),
            Function::PrevMonitor => self.focus_monitor(self.monitors.prev(self.current_monitor)),
            Function::MoveNextMonitor => {
                self.move_to_monitor(self.monitors.next(self.current_monitor))
            }
            Function::MovePrevMonitor => {
                self.move_to_monitor(self.monitors.prev(self.current_monitor))
            }
            Function::MoveWindow(direction) => self.nudge(direction, false),
            Function::ResizeWindow(direction) => self.nudge(direction, true),
        }
    }

    fn set_gaps(&mut self, gaps: u32) {
        self.config.appearance.gaps = gaps;
        self.tile();
    }

    fn rotate_master(&mut self, forward: bool) {
        self.clients.rotate(self.current_workspace, forward);
        self.tile();
        if let Some(id) = self.focused {
            self.set_input_focus(Some(id), true, true);
        }
    }

    /// Changes the master width of the current monitor by the configured
    /// step, in percent.
    fn resize_master(&mut self, sign: f32) {
        let monitor = self.current_monitor;
        let step = self.config.resize_master_amount as f32 / 100.0;
        let fraction = self.config.master_width(monitor) + sign * step;
        self.config.set_master_width(monitor, fraction);
        self.tile();
    }

    /// Grows or shrinks the focused stack row. The master has no row.
    fn resize_stack(&mut self, grow: bool) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(client) = self.clients.get(id) else {
            return;
        };
        if !client.is_tiled() {
            return;
        }
        let monitor = client.monitor;
        let master = self
            .clients
            .clients_on(self.current_workspace)
            .find(|c| c.is_tiled() && c.monitor == monitor)
            .map(|c| c.id);
        if master == Some(id) {
            return;
        }

        let outer = client.geometry.h + 2 * self.border_width();
        let amount = self.config.resize_stack_amount;
        let height = if grow {
            outer.saturating_add(amount)
        } else {
            outer.saturating_sub(amount)
        };
        if let Some(client) = self.clients.get_mut(id) {
            client.stack_height = Some(height.max(MIN_WINDOW_SIZE));
        }
        self.tile();
    }

    fn centre_window(&mut self) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(client) = self.clients.get(id) else {
            return;
        };
        if !client.floating || client.fullscreen {
            return;
        }
        let rect = self.centred(client.geometry, client.monitor);
        self.move_floating(id, rect);
    }

    /// Moves or resizes the focused client by the configured step. Tiled
    /// clients are lifted out of the layout first.
    fn nudge(&mut self, direction: Direction, resize: bool) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(client) = self.clients.get_mut(id) else {
            return;
        };
        if client.fullscreen {
            return;
        }
        let mut g = client.geometry;
        if !client.floating {
            client.floating = true;
            self.tile();
        }

        if resize {
            let step = self.config.resize_window_amount as i64;
            let grow = |size: u32, delta: i64| (size as i64 + delta).max(MIN_WINDOW_SIZE as i64) as u32;
            match direction {
                Direction::Up => g.h = grow(g.h, -step),
                Direction::Down => g.h = grow(g.h, step),
                Direction::Left => g.w = grow(g.w, -step),
                Direction::Right => g.w = grow(g.w, step),
            }
        } else {
            let step = self.config.move_window_amount as i32;
            match direction {
                Direction::Up => g.y -= step,
                Direction::Down => g.y += step,
                Direction::Left => g.x -= step,
                Direction::Right => g.x += step,
            }
        }
        self.move_floating(id, g);
        let monitor = self.monitors.monitor_for_rect(g);
        if let Some(client) = self.clients.get_mut(id) {
            client.monitor = monitor;
        }
    }

    fn focus_monitor(&mut self, monitor: usize) {
        if monitor == self.current_monitor {
            return;
        }
        self.current_monitor = monitor;
        let target = self
            .clients
            .clients_on(self.current_workspace)
            .find(|c| c.mapped && c.monitor == monitor)
            .map(|c| c.id);
        match target {
            Some(id) => self.set_input_focus(Some(id), true, true),
            None => {
                let (x, y) = self.monitors.get(monitor).rect.center();
                self.display.warp_pointer(x, y);
                self.set_input_focus(None, false, false);
                self.current_monitor = monitor;
            }
        }
    }

    fn move_to_monitor(&mut self, monitor: usize) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(client) = self.clients.get(id) else {
            return;
        };
        if client.monitor == monitor || client.fullscreen {
            return;
        }
        let (floating, geometry) = (client.floating, client.geometry);
        let centred: Rect = self.centred(geometry, monitor);
        if let Some(client) = self.clients.get_mut(id) {
            client.monitor = monitor;
        }
        if floating {
            self.move_floating(id, centred);
        }
        self.tile();
        self.set_input_focus(Some(id), true, true);
    }
}

#[cfg(test)]
mod tests {
    use x11::xlib;

    use crate::{
        config::{
            command::{Action, Direction, Function, ScratchpadOp},
            keybind::get_keysym_for_key,
            loader::Config,
        },
        core::geometry::Rect,
        input::event::Event,
        utils::testing::{open, wm, wm_on},
    };

    const MOD: u32 = xlib::Mod1Mask;

    fn key(wm: &mut crate::core::wm::WindowManager<crate::utils::testing::FakeDisplay>, name: &str, state: u32) {
        let keysym = get_keysym_for_key(name).unwrap();
        wm.display.keysyms.insert(40, keysym);
        wm.handle_event(Event::KeyPress { keycode: 40, state });
    }

    #[test]
    fn key_presses_dispatch_bound_actions() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        open(&mut wm, 11, "st");
        key(&mut wm, "j", MOD);
        assert_eq!(wm.focused(), Some(10));

        // Caps Lock does not change the match.
        key(&mut wm, "j", MOD | xlib::LockMask);
        assert_eq!(wm.focused(), Some(11));

        key(&mut wm, "3", MOD);
        assert_eq!(wm.current_workspace(), 2);

        key(&mut wm, "e", MOD | xlib::ShiftMask);
        assert!(!wm.running);
    }

    #[test]
    fn unbound_keys_do_nothing() {
        let mut wm = wm();
        key(&mut wm, "z", MOD);
        assert!(wm.display.calls.is_empty());
    }

    #[test]
    fn gaps_change_the_layout() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.execute(Action::Call(Function::IncreaseGaps));
        assert_eq!(wm.display.geometry(10), Some(Rect::new(11, 11, 1896, 1056)));
        for _ in 0..20 {
            wm.execute(Action::Call(Function::DecreaseGaps));
        }
        assert_eq!(wm.config().appearance.gaps, 0);
        assert_eq!(wm.display.geometry(10), Some(Rect::new(0, 0, 1918, 1078)));
    }

    #[test]
    fn master_width_is_clamped() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        open(&mut wm, 11, "st");
        wm.config.resize_master_amount = 50;
        wm.execute(Action::Call(Function::MasterIncrease));
        assert_eq!(wm.config().master_width(0), 0.95);
        wm.execute(Action::Call(Function::MasterDecrease));
        wm.execute(Action::Call(Function::MasterDecrease));
        assert_eq!(wm.config().master_width(0), 0.05);
    }

    #[test]
    fn master_rotation_reorders_the_list() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        wm.execute(Action::Call(Function::MasterNext));
        assert_eq!(wm.clients.ids(0), vec![11, 12, 10]);
        assert_eq!(wm.display.geometry(11), Some(Rect::new(10, 10, 1138, 1058)));
        wm.execute(Action::Call(Function::MasterPrevious));
        assert_eq!(wm.clients.ids(0), vec![10, 11, 12]);
    }

    #[test]
    fn stack_rows_can_be_resized() {
        let mut wm = wm();
        for id in [10, 11, 12] {
            open(&mut wm, id, "st");
        }
        wm.set_input_focus(Some(11), false, false);
        wm.execute(Action::Call(Function::StackIncrease));
        assert_eq!(wm.clients.get(11).unwrap().stack_height, Some(545));
        assert_eq!(wm.display.geometry(11), Some(Rect::new(1160, 10, 748, 543)));
        assert_eq!(wm.display.geometry(12), Some(Rect::new(1160, 565, 748, 503)));

        wm.set_input_focus(Some(10), false, false);
        wm.execute(Action::Call(Function::StackIncrease));
        assert_eq!(wm.clients.get(10).unwrap().stack_height, None);
    }

    #[test]
    fn keyboard_moves_lift_tiled_windows() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.execute(Action::Call(Function::MoveWindow(Direction::Right)));
        assert!(wm.clients.get(10).unwrap().floating);
        assert_eq!(wm.display.geometry(10), Some(Rect::new(60, 10, 1898, 1058)));

        wm.execute(Action::Call(Function::ResizeWindow(Direction::Up)));
        assert_eq!(wm.display.geometry(10), Some(Rect::new(60, 10, 1898, 1008)));
    }

    #[test]
    fn centring_floating_windows() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.execute(Action::Call(Function::MoveWindow(Direction::Down)));
        wm.execute(Action::Call(Function::ResizeWindow(Direction::Left)));
        wm.execute(Action::Call(Function::CentreWindow));
        assert_eq!(wm.display.geometry(10), Some(Rect::new(35, 10, 1848, 1058)));
    }

    #[test]
    fn workspace_cycling_wraps() {
        let mut wm = wm();
        wm.execute(Action::Call(Function::PrevWorkspace));
        assert_eq!(wm.current_workspace(), 8);
        wm.execute(Action::Call(Function::NextWorkspace));
        assert_eq!(wm.current_workspace(), 0);
    }

    #[test]
    fn windows_move_between_monitors() {
        let monitors = vec![Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1920, 1080)];
        let mut wm = wm_on(monitors, Config::default());
        open(&mut wm, 10, "st");
        wm.execute(Action::Call(Function::MoveNextMonitor));
        assert_eq!(wm.clients.get(10).unwrap().monitor, 1);
        assert_eq!(wm.display.geometry(10), Some(Rect::new(1930, 10, 1898, 1058)));
        assert_eq!(wm.current_monitor, 1);

        wm.execute(Action::Call(Function::PrevMonitor));
        assert_eq!(wm.current_monitor, 0);
        assert_eq!(wm.focused(), None);
    }

    #[test]
    fn scratchpad_actions_are_routed() {
        let mut wm = wm();
        open(&mut wm, 10, "st");
        wm.execute(Action::Scratchpad(ScratchpadOp::Create, 1));
        assert_eq!(wm.scratchpads[1].client, Some(10));
        wm.execute(Action::Scratchpad(ScratchpadOp::Toggle, 1));
        assert!(wm.display.is_mapped(10));
    }
}
