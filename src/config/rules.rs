use anyhow::{bail, Result};

use crate::core::display::WindowClass;

pub const MAX_RULES: usize = 256;

/// Per window class decisions, matched case-insensitively against either the
/// class or the instance name. The first matching entry wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rules {
    pub should_float: Vec<String>,
    pub start_fullscreen: Vec<String>,
    pub can_swallow: Vec<String>,
    pub can_be_swallowed: Vec<String>,
    pub open_in_workspace: Vec<(String, usize)>,
}

fn matches(pattern: &str, class: &WindowClass) -> bool {
    pattern.eq_ignore_ascii_case(&class.class) || pattern.eq_ignore_ascii_case(&class.instance)
}

fn push(list: &mut Vec<String>, entries: &str) -> Result<()> {
    for entry in entries.split(',').map(|e| e.trim().trim_matches('"').trim()) {
        if entry.is_empty() {
            continue;
        }
        if list.len() >= MAX_RULES {
            bail!("too many entries, ignoring '{}' and the rest", entry);
        }
        list.push(entry.to_string());
    }
    Ok(())
}

impl Rules {
    pub fn should_float(&self, class: &WindowClass) -> bool {
        self.should_float.iter().any(|p| matches(p, class))
    }

    pub fn start_fullscreen(&self, class: &WindowClass) -> bool {
        self.start_fullscreen.iter().any(|p| matches(p, class))
    }

    pub fn can_swallow(&self, class: &WindowClass) -> bool {
        self.can_swallow.iter().any(|p| matches(p, class))
    }

    pub fn can_be_swallowed(&self, class: &WindowClass) -> bool {
        self.can_be_swallowed.iter().any(|p| matches(p, class))
    }

    pub fn workspace_for(&self, class: &WindowClass) -> Option<usize> {
        self.open_in_workspace
            .iter()
            .find(|(p, _)| matches(p, class))
            .map(|(_, ws)| *ws)
    }

    pub fn add_should_float(&mut self, entries: &str) -> Result<()> {
        push(&mut self.should_float, entries)
    }

    pub fn add_start_fullscreen(&mut self, entries: &str) -> Result<()> {
        push(&mut self.start_fullscreen, entries)
    }

    pub fn add_can_swallow(&mut self, entries: &str) -> Result<()> {
        push(&mut self.can_swallow, entries)
    }

    pub fn add_can_be_swallowed(&mut self, entries: &str) -> Result<()> {
        push(&mut self.can_be_swallowed, entries)
    }

    /// `class, n` with `n` counted from one.
    pub fn add_open_in_workspace(&mut self, value: &str, workspaces: usize) -> Result<()> {
        let Some((class, index)) = value.rsplit_once(',') else {
            bail!("expected 'class, workspace'");
        };
        let class = class.trim().trim_matches('"').trim();
        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid workspace '{}'", index.trim()))?;
        if class.is_empty() || index == 0 || index > workspaces {
            bail!("invalid workspace rule '{}'", value);
        }
        if self.open_in_workspace.len() >= MAX_RULES {
            bail!("too many open_in_workspace entries");
        }
        self.open_in_workspace.push((class.to_string(), index - 1));
        Ok(())
    }
}
