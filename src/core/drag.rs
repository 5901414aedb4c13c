use log::debug;
use x11::xlib;

use crate::{
    core::{
        display::{DisplayService, WindowId},
        geometry::Rect,
        wm::WindowManager,
    },
    input::mouse::{DragMode, DragState, MIN_WINDOW_SIZE},
    ui::cursor::CursorKind,
};

const BUTTON_MOVE: u32 = 1;
const BUTTON_RESIZE: u32 = 3;

/// Pulls `pos` onto `low` or onto `high - size` when it comes within
/// `distance` of either edge.
fn snap_axis(pos: i32, size: i32, low: i32, high: i32, distance: i32) -> i32 {
    if (pos - low).abs() <= distance {
        low
    } else if (high - (pos + size)).abs() <= distance {
        high - size
    } else {
        pos
    }
}

impl<D: DisplayService> WindowManager<D> {
    pub(crate) fn button_press(&mut self, window: WindowId, button: u32, state: u32, x: i32, y: i32) {
        let Some(id) = self.find_client(window) else {
            return;
        };
        if self.focused != Some(id) {
            self.set_input_focus(Some(id), true, false);
        }
        let Some(client) = self.clients.get(id) else {
            return;
        };
        if client.fullscreen || self.drag.is_active() {
            return;
        }
        let (tiled, origin) = (client.is_tiled(), client.geometry);

        let modkey = self.keyboard.clean(self.config.modifier);
        let mods = self.keyboard.clean(state);
        let (mode, cursor) = match button {
            BUTTON_MOVE if mods == modkey => (DragMode::Move, CursorKind::Move),
            BUTTON_MOVE if mods == modkey | xlib::ShiftMask && tiled => {
                (DragMode::Swap, CursorKind::Swap)
            }
            BUTTON_RESIZE if mods == modkey => (DragMode::Resize, CursorKind::Resize),
            _ => return,
        };

        if mode == DragMode::Resize && tiled {
            if let Some(client) = self.clients.get_mut(id) {
                client.floating = true;
            }
            self.tile();
        }
        if !self.display.grab_pointer(cursor) {
            return;
        }
        self.drag = DragState::begin(mode, id, x, y, origin);
        if mode != DragMode::Swap {
            self.display.raise(id);
        }
        debug!("{:?} drag on {:#x}", mode, id);
    }

    pub(crate) fn motion(&mut self, x: i32, y: i32, time: u64) {
        if !self.drag.is_active() {
            let monitor = self.monitors.monitor_for_point(x, y);
            if monitor != self.current_monitor {
                self.current_monitor = monitor;
            }
            return;
        }
        let interval = self.config.motion_interval();
        if !self.drag.should_sample(time, interval) {
            return;
        }
        let Some(id) = self.drag.client else {
            return;
        };
        match self.drag.mode {
            DragMode::Move => self.drag_move(id, x, y),
            DragMode::Resize => self.drag_resize(id, x, y),
            DragMode::Swap => self.drag_swap(id),
            DragMode::None => {}
        }
    }

    fn drag_move(&mut self, id: WindowId, x: i32, y: i32) {
        let (dx, dy) = self.drag.delta(x, y);
        let snap = self.config.snap_distance as i32;
        let Some(client) = self.clients.get_mut(id) else {
            return;
        };
        if !client.floating {
            if dx.abs() <= snap && dy.abs() <= snap {
                return;
            }
            client.floating = true;
            self.tile();
        }

        let origin = self.drag.origin;
        let outer = 2 * self.border_width() as i32;
        let bounds = self.monitors.get(self.monitors.monitor_for_point(x, y)).rect;
        let rect = Rect::new(
            snap_axis(origin.x + dx, origin.w as i32 + outer, bounds.x, bounds.right(), snap),
            snap_axis(origin.y + dy, origin.h as i32 + outer, bounds.y, bounds.bottom(), snap),
            origin.w,
            origin.h,
        );
        self.move_floating(id, rect);
    }

    fn drag_resize(&mut self, id: WindowId, x: i32, y: i32) {
        let (dx, dy) = self.drag.delta(x, y);
        let origin = self.drag.origin;
        let outer = 2 * self.border_width() as i64;
        let bounds = self.monitors.get(self.monitors.monitor_for_rect(origin)).rect;

        let clamp = |size: u32, delta: i32, start: i32, far: i32| {
            let max = (far as i64 - start as i64 - outer).max(MIN_WINDOW_SIZE as i64);
            (size as i64 + delta as i64).clamp(MIN_WINDOW_SIZE as i64, max) as u32
        };
        let rect = Rect::new(
            origin.x,
            origin.y,
            clamp(origin.w, dx, origin.x, bounds.right()),
            clamp(origin.h, dy, origin.y, bounds.bottom()),
        );
        self.move_floating(id, rect);
    }

    /// Highlights the tiled client under the pointer as the swap partner.
    fn drag_swap(&mut self, id: WindowId) {
        let pointer = self.display.query_pointer();
        let target = pointer
            .child
            .and_then(|child| self.find_client(child))
            .filter(|&t| t != id && self.is_visible(t))
            .filter(|&t| self.clients.get(t).is_some_and(|c| c.is_tiled()));
        if target == self.drag.swap_target {
            return;
        }

        let colors = self.config.appearance;
        if let Some(previous) = self.drag.swap_target {
            let color = if self.focused == Some(previous) {
                colors.focused_border_color
            } else {
                colors.unfocused_border_color
            };
            self.display.set_border_color(previous, color);
        }
        if let Some(target) = target {
            self.display.set_border_color(target, colors.swap_border_color);
        }
        self.drag.swap_target = target;
    }

    pub(crate) fn move_floating(&mut self, id: WindowId, rect: Rect) {
        let bw = self.border_width();
        if let Some(client) = self.clients.get_mut(id) {
            if client.geometry == rect {
                return;
            }
            client.geometry = rect;
            self.display.configure(id, rect, bw);
        }
    }

    pub(crate) fn button_release(&mut self) {
        if !self.drag.is_active() {
            return;
        }
        let drag = std::mem::take(&mut self.drag);
        self.display.ungrab_pointer();
        let Some(id) = drag.client else {
            return;
        };

        match drag.mode {
            DragMode::Swap => {
                if let Some(target) = drag.swap_target {
                    self.clients.swap(id, target);
                    self.tile();
                }
                self.update_borders();
            }
            DragMode::Move | DragMode::Resize => {
                let monitors = &self.monitors;
                if let Some(client) = self.clients.get_mut(id) {
                    client.monitor = monitors.monitor_for_rect(client.geometry);
                    self.current_monitor = client.monitor;
                }
                self.tile();
            }
            DragMode::None => {}
        }
    }
}
