use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};
use x11::{keysym, xlib};

use super::{
    appearance::{parse_color, Appearance},
    command::{split_command, Action, Function, ScratchpadOp},
    keybind::{get_modifier, parse_combo, Binding},
    rules::Rules,
};
use crate::{
    core::{display::KeySym, scratchpad::MAX_SCRATCHPADS},
    ui::layout::{MF_MAX, MF_MIN},
};

pub const MAX_BINDINGS: usize = 256;
pub const MAX_MONITORS: usize = 32;
pub const MAX_WORKSPACES: usize = 32;

const CONFIG_NAME: &str = "stackwmrc";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub modifier: u32,
    pub appearance: Appearance,
    /// Master fraction per monitor index.
    pub master_width: Vec<f32>,
    /// Motion samples per second while dragging.
    pub motion_throttle: u32,
    /// Master fraction step, in percent.
    pub resize_master_amount: u32,
    pub resize_stack_amount: u32,
    pub snap_distance: u32,
    pub move_window_amount: u32,
    pub resize_window_amount: u32,
    pub new_win_focus: bool,
    pub warp_cursor: bool,
    pub floating_on_top: bool,
    pub new_win_master: bool,
    pub focus_follows_mouse: bool,
    pub swallow_requires_ancestry: bool,
    pub workspaces: usize,
    pub rules: Rules,
    pub exec: Vec<Vec<String>>,
    pub binds: Vec<Binding>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_modifier(xlib::Mod1Mask)
    }
}

fn default_binds(modkey: u32) -> Vec<Binding> {
    use Function::*;

    let shift = xlib::ShiftMask;
    let key = |k: std::os::raw::c_uint| KeySym::from(k);
    let mut binds = vec![
        Binding::new(modkey | shift, key(keysym::XK_e), Action::Call(Quit)),
        Binding::new(modkey | shift, key(keysym::XK_r), Action::Call(ReloadConfig)),
        Binding::new(modkey | shift, key(keysym::XK_q), Action::Call(CloseWindow)),
        Binding::new(modkey, key(keysym::XK_j), Action::Call(FocusNext)),
        Binding::new(modkey, key(keysym::XK_k), Action::Call(FocusPrevious)),
        Binding::new(modkey | shift, key(keysym::XK_j), Action::Call(MasterNext)),
        Binding::new(modkey | shift, key(keysym::XK_k), Action::Call(MasterPrevious)),
        Binding::new(modkey, key(keysym::XK_l), Action::Call(MasterIncrease)),
        Binding::new(modkey, key(keysym::XK_h), Action::Call(MasterDecrease)),
        Binding::new(modkey, key(keysym::XK_equal), Action::Call(IncreaseGaps)),
        Binding::new(modkey, key(keysym::XK_minus), Action::Call(DecreaseGaps)),
        Binding::new(modkey, key(keysym::XK_space), Action::Call(ToggleFloating)),
        Binding::new(modkey | shift, key(keysym::XK_space), Action::Call(GlobalFloating)),
        Binding::new(modkey | shift, key(keysym::XK_f), Action::Call(Fullscreen)),
        Binding::new(modkey, key(keysym::XK_m), Action::Call(Monocle)),
        Binding::new(modkey, key(keysym::XK_Return), Action::spawn("st")),
        Binding::new(modkey, key(keysym::XK_b), Action::spawn("firefox")),
    ];

    let digits = [
        keysym::XK_1,
        keysym::XK_2,
        keysym::XK_3,
        keysym::XK_4,
        keysym::XK_5,
        keysym::XK_6,
        keysym::XK_7,
        keysym::XK_8,
        keysym::XK_9,
    ];
    for (ws, digit) in digits.into_iter().enumerate() {
        binds.push(Binding::new(modkey, key(digit), Action::ChangeWorkspace(ws)));
        binds.push(Binding::new(modkey | shift, key(digit), Action::MoveToWorkspace(ws)));
    }
    binds
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => bail!("'{}' is not a boolean", other),
    }
}

fn parse_number(value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| anyhow!("'{}' is not a non-negative number", value))
}

/// Parses `N` (counted from one) into an index below `limit`.
fn parse_index(value: &str, limit: usize) -> Result<usize> {
    let n: usize = value
        .trim()
        .parse()
        .map_err(|_| anyhow!("'{}' is not a number", value.trim()))?;
    if n == 0 || n > limit {
        bail!("{} is out of range 1..={}", n, limit);
    }
    Ok(n - 1)
}

/// Drops a trailing `# comment` from a rule list value.
fn strip_comment(value: &str) -> &str {
    value.split('#').next().unwrap_or("").trim()
}

impl Config {
    fn with_modifier(modifier: u32) -> Self {
        Self {
            modifier,
            appearance: Appearance::default(),
            master_width: vec![0.6; MAX_MONITORS],
            motion_throttle: 60,
            resize_master_amount: 1,
            resize_stack_amount: 20,
            snap_distance: 5,
            move_window_amount: 50,
            resize_window_amount: 50,
            new_win_focus: true,
            warp_cursor: true,
            floating_on_top: true,
            new_win_master: false,
            focus_follows_mouse: true,
            swallow_requires_ancestry: true,
            workspaces: 9,
            rules: Rules::default(),
            exec: Vec::new(),
            binds: default_binds(modifier),
        }
    }

    pub fn master_width(&self, monitor: usize) -> f32 {
        self.master_width
            .get(monitor)
            .copied()
            .unwrap_or(0.6)
            .clamp(MF_MIN, MF_MAX)
    }

    pub fn set_master_width(&mut self, monitor: usize, fraction: f32) {
        if let Some(mf) = self.master_width.get_mut(monitor) {
            *mf = fraction.clamp(MF_MIN, MF_MAX);
        }
    }

    /// Minimum spacing of motion samples, in milliseconds.
    pub fn motion_interval(&self) -> u64 {
        1000 / u64::from(self.motion_throttle.max(1))
    }

    /// Adds a binding. A binding with the same combination is replaced in
    /// place.
    pub fn bind(&mut self, mods: u32, keysym: KeySym, action: Action) -> Result<()> {
        if let Some(existing) = self
            .binds
            .iter_mut()
            .find(|b| b.mods == mods && b.keysym == keysym)
        {
            existing.action = action;
            return Ok(());
        }
        if self.binds.len() >= MAX_BINDINGS {
            bail!("binding table is full ({} entries)", MAX_BINDINGS);
        }
        self.binds.push(Binding::new(mods, keysym, action));
        Ok(())
    }

    /// Builds a configuration from file contents. Lines that fail to parse
    /// are logged and skipped; everything else keeps its default.
    pub fn parse(content: &str, origin: &str) -> Self {
        // `mod` in every binding, defaults included, means the last valid
        // mod_key of the file.
        let mut modifier = xlib::Mod1Mask;
        for (number, line) in Self::lines(content) {
            if let Some(("mod_key", value)) = Self::split_key(line) {
                match get_modifier(value) {
                    Ok(m) => modifier = m,
                    Err(e) => warn!("{}:{}: {}", origin, number, e),
                }
            }
        }

        let mut config = Self::with_modifier(modifier);
        for (number, line) in Self::lines(content) {
            if let Err(e) = config.parse_line(line) {
                warn!("{}:{}: {}", origin, number, e);
            }
        }
        config
    }

    fn lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
        content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
    }

    fn split_key(line: &str) -> Option<(&str, &str)> {
        line.split_once(':').map(|(k, v)| (k.trim(), v.trim()))
    }

    fn parse_line(&mut self, line: &str) -> Result<()> {
        let (key, value) = Self::split_key(line).ok_or_else(|| anyhow!("missing ':' in '{}'", line))?;
        if value.is_empty() {
            bail!("no value for '{}'", key);
        }

        match key {
            "mod_key" => {}
            "gaps" => self.appearance.gaps = parse_number(value)?,
            "border_width" => self.appearance.border_width = parse_number(value)?,
            "focused_border_colour" | "focused_border_color" => {
                self.appearance.focused_border_color = parse_color(value)?
            }
            "unfocused_border_colour" | "unfocused_border_color" => {
                self.appearance.unfocused_border_color = parse_color(value)?
            }
            "swap_border_colour" | "swap_border_color" => {
                self.appearance.swap_border_color = parse_color(value)?
            }
            "master_width" => {
                let mut mf: f32 = value
                    .trim_end_matches('%')
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("'{}' is not a number", value))?;
                if mf > 1.0 {
                    mf /= 100.0;
                }
                if !(MF_MIN..=MF_MAX).contains(&mf) {
                    bail!("master_width must lie between 5 and 95 percent");
                }
                self.master_width = vec![mf; MAX_MONITORS];
            }
            "motion_throttle" => {
                let rate = parse_number(value)?;
                if rate == 0 {
                    bail!("motion_throttle must be positive");
                }
                self.motion_throttle = rate;
            }
            "resize_master_amount" => self.resize_master_amount = parse_number(value)?,
            "resize_stack_amount" => self.resize_stack_amount = parse_number(value)?,
            "snap_distance" => self.snap_distance = parse_number(value)?,
            "move_window_amount" => self.move_window_amount = parse_number(value)?,
            "resize_window_amount" => self.resize_window_amount = parse_number(value)?,
            "new_win_focus" => self.new_win_focus = parse_bool(value)?,
            "warp_cursor" => self.warp_cursor = parse_bool(value)?,
            "floating_on_top" => self.floating_on_top = parse_bool(value)?,
            "new_win_master" => self.new_win_master = parse_bool(value)?,
            "focus_follows_mouse" => self.focus_follows_mouse = parse_bool(value)?,
            "swallow_requires_ancestry" => self.swallow_requires_ancestry = parse_bool(value)?,
            "workspaces" => {
                let count = parse_number(value)? as usize;
                if count == 0 || count > MAX_WORKSPACES {
                    bail!("workspaces must lie between 1 and {}", MAX_WORKSPACES);
                }
                self.workspaces = count;
            }
            "should_float" => self.rules.add_should_float(strip_comment(value))?,
            "start_fullscreen" => self.rules.add_start_fullscreen(strip_comment(value))?,
            "can_swallow" => self.rules.add_can_swallow(strip_comment(value))?,
            "can_be_swallowed" => self.rules.add_can_be_swallowed(strip_comment(value))?,
            "open_in_workspace" => self
                .rules
                .add_open_in_workspace(strip_comment(value), MAX_WORKSPACES)?,
            "exec" => {
                let argv = split_command(value);
                if argv.is_empty() {
                    bail!("empty exec command");
                }
                self.exec.push(argv);
            }
            "bind" | "call" | "workspace" | "scratchpad" => self.parse_binding(key, value)?,
            _ => bail!("unknown option '{}'", key),
        }
        Ok(())
    }

    fn parse_binding(&mut self, kind: &str, value: &str) -> Result<()> {
        let (combo, target) = value
            .split_once(':')
            .map(|(c, t)| (c.trim(), t.trim()))
            .ok_or_else(|| anyhow!("expected 'keys : action'"))?;
        if target.is_empty() {
            bail!("binding '{}' has no action", combo);
        }
        let (mods, keysym) = parse_combo(combo, self.modifier)?;

        let action = match kind {
            "bind" if target.starts_with('"') => Action::spawn(target),
            "bind" => match target.parse::<Function>() {
                Ok(function) => Action::Call(function),
                Err(_) => Action::spawn(target),
            },
            "call" => Action::Call(target.parse::<Function>().map_err(|e| anyhow!(e))?),
            "workspace" => {
                let (verb, n) = target
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("expected 'move N' or 'swap N'"))?;
                let index = parse_index(n, MAX_WORKSPACES)?;
                match verb {
                    "move" => Action::ChangeWorkspace(index),
                    "swap" => Action::MoveToWorkspace(index),
                    other => bail!("unknown workspace action '{}'", other),
                }
            }
            _ => {
                let (verb, n) = target
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("expected 'create|toggle|remove N'"))?;
                let slot = parse_index(n, MAX_SCRATCHPADS)?;
                let op = match verb {
                    "create" => ScratchpadOp::Create,
                    "toggle" => ScratchpadOp::Toggle,
                    "remove" => ScratchpadOp::Remove,
                    other => bail!("unknown scratchpad action '{}'", other),
                };
                Action::Scratchpad(op, slot)
            }
        };

        if let Action::Spawn(argv) = &action {
            if argv.is_empty() {
                bail!("empty command for '{}'", combo);
            }
        }
        self.bind(mods, keysym, action)
    }

    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").ok();
        let xdg = std::env::var("XDG_CONFIG_HOME").ok();

        let candidates = Self::candidate_paths(xdg.as_deref(), home.as_deref());
        if let Some(path) = candidates.iter().find(|p| p.is_file()) {
            return Self::load_from(path);
        }

        let target = Self::default_config_path(xdg.as_deref(), home.as_deref())?;
        match Self::create_default_config(&target) {
            Ok(()) => info!("wrote default configuration to {}", target.display()),
            Err(e) => warn!("{:#}", e),
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Ok(Self::parse(&content, &path.display().to_string()))
    }

    /// Configuration files in search order.
    pub fn candidate_paths(xdg: Option<&str>, home: Option<&str>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(xdg) = xdg.filter(|x| !x.is_empty()) {
            paths.push(PathBuf::from(xdg).join(CONFIG_NAME));
            paths.push(PathBuf::from(xdg).join("stackwm").join(CONFIG_NAME));
        }
        if let Some(home) = home.filter(|h| !h.is_empty()) {
            let config = PathBuf::from(home).join(".config");
            paths.push(config.join(CONFIG_NAME));
            paths.push(config.join("stackwm").join(CONFIG_NAME));
        }
        paths.push(PathBuf::from("/usr/local/share").join(CONFIG_NAME));
        paths
    }

    fn default_config_path(xdg: Option<&str>, home: Option<&str>) -> Result<PathBuf> {
        let base = match xdg.filter(|x| !x.is_empty()) {
            Some(xdg) => PathBuf::from(xdg),
            None => {
                let home = home
                    .filter(|h| !h.is_empty())
                    .context("Failed to get HOME directory")?;
                PathBuf::from(home).join(".config")
            }
        };
        Ok(base.join("stackwm").join(CONFIG_NAME))
    }

    fn create_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(path, DEFAULT_CONFIG).context("Failed to write default config")
    }
}

pub const DEFAULT_CONFIG: &str = r###"# stackwm configuration
# Format: option : value
# Lines starting with # are ignored.

# Modifier used wherever a binding says "mod".
# Available modifiers: alt, ctrl, shift, super (or win)
mod_key : alt

# Window appearance
gaps : 10
border_width : 1
focused_border_colour : #c0cbff
unfocused_border_colour : #555555
swap_border_colour : #fff4c0

# Master column width in percent of the usable monitor width
master_width : 60
# Pointer motion samples handled per second while dragging
motion_throttle : 60
resize_master_amount : 1
resize_stack_amount : 20
snap_distance : 5
move_window_amount : 50
resize_window_amount : 50

new_win_focus : true
warp_cursor : true
floating_on_top : true
new_win_master : false
focus_follows_mouse : true
# Only swallow a window's parent process terminal
swallow_requires_ancestry : true

workspaces : 9

# Window rules, matched against WM_CLASS class or instance names
# should_float : pavucontrol, nm-connection-editor
# start_fullscreen : mpv
# can_swallow : st, alacritty
# can_be_swallowed : mpv, sxiv
# open_in_workspace : firefox, 2

# Programs started with the window manager
# exec : picom

# Bindings
# bind : keys : "command args"    spawn a program
# bind : keys : function_name     call a window manager function
# workspace : keys : move N       switch to workspace N
# workspace : keys : swap N       send the focused window to workspace N
# scratchpad : keys : create N | toggle N | remove N
bind : mod + Return : "st"
bind : mod + b : "firefox"
call : mod + shift + e : quit
call : mod + shift + r : reload_config
call : mod + shift + q : close_window
call : mod + j : focus_next
call : mod + k : focus_previous
call : mod + shift + j : master_next
call : mod + shift + k : master_previous
call : mod + l : master_increase
call : mod + h : master_decrease
call : mod + equal : increase_gaps
call : mod + minus : decrease_gaps
call : mod + space : toggle_floating
call : mod + shift + space : global_floating
call : mod + shift + f : fullscreen
call : mod + m : monocle
workspace : mod + 1 : move 1
workspace : mod + shift + 1 : swap 1
workspace : mod + 2 : move 2
workspace : mod + shift + 2 : swap 2
"###;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keybind::get_keysym_for_key;

    #[test]
    fn default_file_describes_the_defaults() {
        assert_eq!(Config::parse(DEFAULT_CONFIG, "default"), Config::default());
    }

    #[test]
    fn invalid_lines_leave_defaults_untouched() {
        let content = "\
gaps : lots
nonsense line
unknown_option : 3
call : mod + q : no_such_function
bind : mod + hyper + q : \"st\"
workspace : mod + 1 : move 0
scratchpad : mod + s : create 99
master_width : 150
mod_key : meta
focused_border_colour : #12
workspaces : 0
";
        let first = Config::parse(content, "test");
        assert_eq!(first, Config::default());
        assert_eq!(Config::parse(content, "test"), first);
    }

    #[test]
    fn options_override_defaults() {
        let config = Config::parse(
            "gaps : 4\nmaster_width : 55\nwarp_cursor : false\nmotion_throttle : 100\n\
             should_float : pavucontrol # mixer\nexec : picom --daemon\n",
            "test",
        );
        assert_eq!(config.appearance.gaps, 4);
        assert!((config.master_width(0) - 0.55).abs() < f32::EPSILON);
        assert!(!config.warp_cursor);
        assert_eq!(config.motion_interval(), 10);
        assert_eq!(config.rules.should_float, vec!["pavucontrol".to_string()]);
        assert_eq!(config.exec, vec![vec!["picom".to_string(), "--daemon".to_string()]]);
    }

    #[test]
    fn later_binding_replaces_earlier_one() {
        let config = Config::parse(
            "bind : mod + Return : \"alacritty\"\ncall : mod + Return : monocle\n",
            "test",
        );
        let ret = KeySym::from(keysym::XK_Return);
        let matching: Vec<_> = config
            .binds
            .iter()
            .filter(|b| b.mods == xlib::Mod1Mask && b.keysym == ret)
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].action, Action::Call(Function::Monocle));
        assert_eq!(config.binds.len(), Config::default().binds.len());
    }

    #[test]
    fn mod_key_applies_to_every_binding() {
        let config = Config::parse(
            "workspace : mod + 3 : swap 3\nmod_key : super\nscratchpad : mod + s : toggle 2\n",
            "test",
        );
        assert_eq!(config.modifier, xlib::Mod4Mask);
        assert!(config.binds.iter().all(|b| b.mods & xlib::Mod1Mask == 0));
        assert!(config.binds.contains(&Binding::new(
            xlib::Mod4Mask | xlib::ShiftMask,
            KeySym::from(keysym::XK_3),
            Action::MoveToWorkspace(2),
        )));
        assert!(config.binds.contains(&Binding::new(
            xlib::Mod4Mask,
            KeySym::from(keysym::XK_s),
            Action::Scratchpad(ScratchpadOp::Toggle, 1),
        )));
    }

    #[test]
    fn bind_falls_back_to_spawning() {
        let config = Config::parse("bind : mod + t : st -e htop\nbind : mod + y : quit\n", "test");
        let t = config
            .binds
            .iter()
            .find(|b| b.keysym == KeySym::from(keysym::XK_t))
            .map(|b| b.action.clone());
        assert_eq!(
            t,
            Some(Action::Spawn(vec!["st".into(), "-e".into(), "htop".into()]))
        );
        assert!(config
            .binds
            .iter()
            .any(|b| b.keysym == KeySym::from(keysym::XK_y) && b.action == Action::Call(Function::Quit)));
    }

    #[test]
    fn search_order_prefers_xdg() {
        let paths = Config::candidate_paths(Some("/xdg"), Some("/home/u"));
        assert_eq!(paths[0], PathBuf::from("/xdg/stackwmrc"));
        assert_eq!(paths[1], PathBuf::from("/xdg/stackwm/stackwmrc"));
        assert_eq!(paths[2], PathBuf::from("/home/u/.config/stackwmrc"));
        assert_eq!(paths.last(), Some(&PathBuf::from("/usr/local/share/stackwmrc")));
        assert_eq!(Config::candidate_paths(Some(""), None).len(), 1);
    }

    #[test]
    fn bindings_resolve_keys_case_insensitively() {
        assert_eq!(get_keysym_for_key("RETURN"), Some(KeySym::from(keysym::XK_Return)));
    }

    #[test]
    fn media_and_named_keys_can_be_bound() {
        let config = Config::parse(
            "bind : mod + XF86AudioMute : pamixer -t\nbind : mod + Pause : st\n",
            "test",
        );
        assert_eq!(config.binds.len(), Config::default().binds.len() + 2);
        let mute = config
            .binds
            .iter()
            .find(|b| b.keysym == KeySym::from(keysym::XF86XK_AudioMute))
            .map(|b| b.action.clone());
        assert_eq!(mute, Some(Action::Spawn(vec!["pamixer".into(), "-t".into()])));
    }
}
