use log::{debug, warn};

use crate::core::{
    display::{DisplayService, WindowId},
    wm::WindowManager,
};

pub const MAX_SCRATCHPADS: usize = 20;

/// A client parked under a number so a key can summon or dismiss it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScratchpadSlot {
    pub client: Option<WindowId>,
    /// Whether the client is currently summoned.
    pub enabled: bool,
}

impl<D: DisplayService> WindowManager<D> {
    /// Parks the focused client in a slot and hides it.
    pub fn scratchpad_create(&mut self, index: usize) {
        let Some(id) = self.focused else {
            return;
        };
        let Some(slot) = self.scratchpads.get(index) else {
            return;
        };
        if slot.client.is_some_and(|c| c != id) {
            warn!("scratchpad {} is already in use", index + 1);
            return;
        }
        for slot in self.scratchpads.iter_mut().filter(|s| s.client == Some(id)) {
            *slot = ScratchpadSlot::default();
        }

        self.apply_fullscreen(id, false);
        let next = self.clients.successor(id);
        self.hide_window(id);
        if let Some(client) = self.clients.get_mut(id) {
            client.floating = true;
            client.mapped = false;
        }
        self.scratchpads[index] = ScratchpadSlot {
            client: Some(id),
            enabled: false,
        };
        debug!("{:#x} parked in scratchpad {}", id, index + 1);

        self.tile();
        self.focused = None;
        self.set_input_focus(next, true, false);
    }

    /// Shows a parked client on the current workspace, or hides it again when
    /// it is already showing there.
    pub fn scratchpad_toggle(&mut self, index: usize) {
        let Some(ScratchpadSlot {
            client: Some(id),
            enabled,
        }) = self.scratchpads.get(index).copied()
        else {
            return;
        };

        if enabled && self.is_visible(id) {
            let next = self.clients.successor(id);
            self.hide_window(id);
            if let Some(client) = self.clients.get_mut(id) {
                client.mapped = false;
            }
            self.scratchpads[index].enabled = false;
            self.tile();
            if self.focused == Some(id) {
                self.focused = None;
                self.set_input_focus(next, true, false);
            }
            return;
        }

        self.clients.move_to_workspace(id, self.current_workspace);
        self.display.set_window_desktop(id, self.current_workspace);
        if let Some(client) = self.clients.get_mut(id) {
            client.mapped = true;
        }
        self.display.map(id);
        self.scratchpads[index].enabled = true;
        self.display.raise(id);
        self.tile();
        self.set_input_focus(Some(id), true, true);
    }

    /// Forgets a slot. A hidden client comes back on screen.
    pub fn scratchpad_remove(&mut self, index: usize) {
        let Some(slot) = self.scratchpads.get_mut(index) else {
            return;
        };
        let Some(id) = slot.client.take() else {
            return;
        };
        slot.enabled = false;

        let hidden = self.clients.get(id).is_some_and(|c| !c.mapped);
        if hidden {
            self.clients.move_to_workspace(id, self.current_workspace);
            self.display.set_window_desktop(id, self.current_workspace);
            if let Some(client) = self.clients.get_mut(id) {
                client.mapped = true;
            }
            self.display.map(id);
            self.tile();
            self.set_input_focus(Some(id), true, false);
        }
    }
}
