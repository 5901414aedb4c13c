use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::core::{client::Client, display::WindowId, workspace::Workspace};

pub const MAX_CLIENTS: usize = 64;

/// Owns every managed client. Workspaces only hold window ids, so a client
/// lives in exactly one workspace list and in the arena, nowhere else.
pub struct ClientRegistry {
    clients: HashMap<WindowId, Client>,
    workspaces: Vec<Workspace>,
    capacity: usize,
}

impl ClientRegistry {
    pub fn new(workspaces: usize, capacity: usize) -> Self {
        Self {
            clients: HashMap::new(),
            workspaces: (0..workspaces.max(1)).map(Workspace::new).collect(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn workspace_count(&self) -> usize {
        self.workspaces.len()
    }

    pub fn add(&mut self, client: Client, as_master: bool) -> Result<&mut Client> {
        if self.clients.contains_key(&client.id) {
            bail!("window {:#x} is already managed", client.id);
        }
        if self.clients.len() >= self.capacity {
            bail!("client limit of {} reached", self.capacity);
        }

        let id = client.id;
        let workspace = client.workspace.min(self.workspaces.len() - 1);
        self.workspaces[workspace].insert(id, as_master);
        let client = self.clients.entry(id).or_insert(client);
        client.workspace = workspace;
        Ok(client)
    }

    /// Unlinks the client from whichever workspace holds it.
    pub fn remove(&mut self, window: WindowId) -> Option<Client> {
        let client = self.clients.remove(&window)?;
        for workspace in &mut self.workspaces {
            if workspace.remove(window) {
                break;
            }
        }
        Some(client)
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.clients.contains_key(&window)
    }

    pub fn get(&self, window: WindowId) -> Option<&Client> {
        self.clients.get(&window)
    }

    pub fn get_mut(&mut self, window: WindowId) -> Option<&mut Client> {
        self.clients.get_mut(&window)
    }

    pub fn workspace(&self, index: usize) -> &Workspace {
        &self.workspaces[index.min(self.workspaces.len() - 1)]
    }

    pub fn workspace_mut(&mut self, index: usize) -> &mut Workspace {
        let last = self.workspaces.len() - 1;
        &mut self.workspaces[index.min(last)]
    }

    /// Ids on a workspace in list order.
    pub fn ids(&self, workspace: usize) -> Vec<WindowId> {
        self.workspace(workspace).clients.clone()
    }

    /// Clients on a workspace in list order.
    pub fn clients_on(&self, workspace: usize) -> impl Iterator<Item = &Client> {
        self.workspace(workspace)
            .clients
            .iter()
            .filter_map(|id| self.clients.get(id))
    }

    pub fn all_ids(&self) -> Vec<WindowId> {
        self.workspaces
            .iter()
            .flat_map(|ws| ws.clients.iter().copied())
            .collect()
    }

    /// Moves the client to the end of another workspace's list.
    pub fn move_to_workspace(&mut self, window: WindowId, target: usize) -> bool {
        if target >= self.workspaces.len() {
            return false;
        }
        let Some(client) = self.clients.get_mut(&window) else {
            return false;
        };
        let source = client.workspace;
        if source == target {
            return false;
        }
        client.workspace = target;
        self.workspaces[source].remove(window);
        self.workspaces[target].insert(window, false);
        true
    }

    /// Swaps the list positions of two clients on the same workspace.
    pub fn swap(&mut self, a: WindowId, b: WindowId) -> bool {
        let (Some(ca), Some(cb)) = (self.clients.get(&a), self.clients.get(&b)) else {
            return false;
        };
        if ca.workspace != cb.workspace || a == b {
            return false;
        }
        let workspace = &mut self.workspaces[ca.workspace];
        match (workspace.position(a), workspace.position(b)) {
            (Some(ia), Some(ib)) => {
                workspace.clients.swap(ia, ib);
                true
            }
            _ => false,
        }
    }

    /// Rotates a workspace list: the master moves to the end, or the last
    /// client becomes the master when `forward` is false.
    pub fn rotate(&mut self, workspace: usize, forward: bool) {
        let clients = &mut self.workspace_mut(workspace).clients;
        if clients.len() < 2 {
            return;
        }
        if forward {
            clients.rotate_left(1);
        } else {
            clients.rotate_right(1);
        }
    }

    /// Who inherits focus when `window` goes away: the next mapped sibling on
    /// the same monitor, else the previous one.
    pub fn successor(&self, window: WindowId) -> Option<WindowId> {
        let client = self.clients.get(&window)?;
        let list = &self.workspace(client.workspace).clients;
        let idx = list.iter().position(|&id| id == window)?;
        let eligible = |id: &&WindowId| {
            self.clients
                .get(id)
                .is_some_and(|c| c.mapped && c.monitor == client.monitor)
        };

        list[idx + 1..]
            .iter()
            .find(eligible)
            .or_else(|| list[..idx].iter().rev().find(eligible))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Rect;

    fn client(id: WindowId, workspace: usize) -> Client {
        Client::new(id, Rect::new(0, 0, 100, 100), workspace, 0)
    }

    #[test]
    fn insertion_policy_picks_head_or_tail() {
        let mut registry = ClientRegistry::new(9, MAX_CLIENTS);
        registry.add(client(1, 0), false).unwrap();
        registry.add(client(2, 0), false).unwrap();
        registry.add(client(3, 0), true).unwrap();
        assert_eq!(registry.ids(0), vec![3, 1, 2]);
    }

    #[test]
    fn capacity_refuses_extra_clients() {
        let mut registry = ClientRegistry::new(1, 2);
        registry.add(client(1, 0), false).unwrap();
        registry.add(client(2, 0), false).unwrap();
        assert!(registry.add(client(3, 0), false).is_err());
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(3));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = ClientRegistry::new(2, MAX_CLIENTS);
        registry.add(client(1, 0), false).unwrap();
        assert!(registry.add(client(1, 1), false).is_err());
        assert_eq!(registry.ids(1), Vec::<WindowId>::new());
    }

    #[test]
    fn remove_finds_client_on_any_workspace() {
        let mut registry = ClientRegistry::new(3, MAX_CLIENTS);
        registry.add(client(1, 0), false).unwrap();
        registry.add(client(2, 2), false).unwrap();
        assert_eq!(registry.remove(2).map(|c| c.id), Some(2));
        assert!(registry.ids(2).is_empty());
        assert!(registry.remove(2).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn move_appends_to_target() {
        let mut registry = ClientRegistry::new(3, MAX_CLIENTS);
        for id in 1..=3 {
            registry.add(client(id, if id == 3 { 1 } else { 0 }), false).unwrap();
        }
        assert!(registry.move_to_workspace(1, 1));
        assert_eq!(registry.ids(0), vec![2]);
        assert_eq!(registry.ids(1), vec![3, 1]);
        assert_eq!(registry.get(1).unwrap().workspace, 1);
        assert!(!registry.move_to_workspace(1, 1));
        assert!(!registry.move_to_workspace(1, 7));
    }

    #[test]
    fn swap_handles_adjacent_and_distant_nodes() {
        let mut registry = ClientRegistry::new(1, MAX_CLIENTS);
        for id in 1..=4 {
            registry.add(client(id, 0), false).unwrap();
        }
        assert!(registry.swap(1, 2));
        assert_eq!(registry.ids(0), vec![2, 1, 3, 4]);
        assert!(registry.swap(2, 4));
        assert_eq!(registry.ids(0), vec![4, 1, 3, 2]);
        assert!(!registry.swap(4, 4));
    }

    #[test]
    fn rotation_moves_master() {
        let mut registry = ClientRegistry::new(1, MAX_CLIENTS);
        for id in 1..=3 {
            registry.add(client(id, 0), false).unwrap();
        }
        registry.rotate(0, true);
        assert_eq!(registry.ids(0), vec![2, 3, 1]);
        registry.rotate(0, false);
        assert_eq!(registry.ids(0), vec![1, 2, 3]);
    }

    #[test]
    fn successor_prefers_next_then_previous_on_same_monitor() {
        let mut registry = ClientRegistry::new(1, MAX_CLIENTS);
        for id in 1..=4 {
            registry.add(client(id, 0), false).unwrap();
        }
        registry.get_mut(3).unwrap().monitor = 1;
        assert_eq!(registry.successor(2), Some(4));
        assert_eq!(registry.successor(4), Some(2));
        registry.get_mut(4).unwrap().mapped = false;
        assert_eq!(registry.successor(2), Some(1));
        assert_eq!(registry.successor(3), None);
    }
}
