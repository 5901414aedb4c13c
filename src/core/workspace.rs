use crate::core::display::WindowId;

/// Ordered client membership of one workspace. The first entry is the master.
pub struct Workspace {
    pub clients: Vec<WindowId>,
    pub focused: Option<WindowId>,
    pub index: usize,
    pub monocle: bool,
    pub floating: bool,
}

impl Workspace {
    pub fn new(index: usize) -> Self {
        Self {
            clients: Vec::new(),
            focused: None,
            index,
            monocle: false,
            floating: false,
        }
    }

    pub fn position(&self, window: WindowId) -> Option<usize> {
        self.clients.iter().position(|&id| id == window)
    }

    pub fn insert(&mut self, window: WindowId, as_master: bool) {
        if as_master {
            self.clients.insert(0, window);
        } else {
            self.clients.push(window);
        }
    }

    pub fn remove(&mut self, window: WindowId) -> bool {
        let Some(idx) = self.position(window) else {
            return false;
        };
        self.clients.remove(idx);
        if self.focused == Some(window) {
            self.focused = None;
        }
        true
    }
}
