use std::ffi::CString;

use anyhow::{bail, Result};
use x11::{keysym, xlib};

use crate::core::display::KeySym;

pub use super::command::Action;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub mods: u32,
    pub keysym: KeySym,
    pub action: Action,
}

impl Binding {
    pub fn new(mods: u32, keysym: KeySym, action: Action) -> Self {
        Self { mods, keysym, action }
    }
}

/// Resolves a key name. Short aliases are matched case-insensitively, any
/// other name goes through Xlib's keysym table.
pub fn get_keysym_for_key(key: &str) -> Option<KeySym> {
    let sym = match key.to_lowercase().as_str() {
        "a" => keysym::XK_a,
        "b" => keysym::XK_b,
        "c" => keysym::XK_c,
        "d" => keysym::XK_d,
        "e" => keysym::XK_e,
        "f" => keysym::XK_f,
        "g" => keysym::XK_g,
        "h" => keysym::XK_h,
        "i" => keysym::XK_i,
        "j" => keysym::XK_j,
        "k" => keysym::XK_k,
        "l" => keysym::XK_l,
        "m" => keysym::XK_m,
        "n" => keysym::XK_n,
        "o" => keysym::XK_o,
        "p" => keysym::XK_p,
        "q" => keysym::XK_q,
        "r" => keysym::XK_r,
        "s" => keysym::XK_s,
        "t" => keysym::XK_t,
        "u" => keysym::XK_u,
        "v" => keysym::XK_v,
        "w" => keysym::XK_w,
        "x" => keysym::XK_x,
        "y" => keysym::XK_y,
        "z" => keysym::XK_z,
        "0" => keysym::XK_0,
        "1" => keysym::XK_1,
        "2" => keysym::XK_2,
        "3" => keysym::XK_3,
        "4" => keysym::XK_4,
        "5" => keysym::XK_5,
        "6" => keysym::XK_6,
        "7" => keysym::XK_7,
        "8" => keysym::XK_8,
        "9" => keysym::XK_9,
        "space" => keysym::XK_space,
        "return" | "enter" => keysym::XK_Return,
        "tab" => keysym::XK_Tab,
        "escape" | "esc" => keysym::XK_Escape,
        "backspace" => keysym::XK_BackSpace,
        "delete" => keysym::XK_Delete,
        "insert" => keysym::XK_Insert,
        "home" => keysym::XK_Home,
        "end" => keysym::XK_End,
        "page_up" | "prior" => keysym::XK_Page_Up,
        "page_down" | "next" => keysym::XK_Page_Down,
        "left" => keysym::XK_Left,
        "right" => keysym::XK_Right,
        "up" => keysym::XK_Up,
        "down" => keysym::XK_Down,
        "print" => keysym::XK_Print,
        "minus" | "-" => keysym::XK_minus,
        "equal" | "=" => keysym::XK_equal,
        "comma" | "," => keysym::XK_comma,
        "period" | "." => keysym::XK_period,
        "slash" | "/" => keysym::XK_slash,
        "backslash" => keysym::XK_backslash,
        "semicolon" | ";" => keysym::XK_semicolon,
        "apostrophe" | "'" => keysym::XK_apostrophe,
        "grave" | "`" => keysym::XK_grave,
        "bracketleft" | "[" => keysym::XK_bracketleft,
        "bracketright" | "]" => keysym::XK_bracketright,
        "f1" => keysym::XK_F1,
        "f2" => keysym::XK_F2,
        "f3" => keysym::XK_F3,
        "f4" => keysym::XK_F4,
        "f5" => keysym::XK_F5,
        "f6" => keysym::XK_F6,
        "f7" => keysym::XK_F7,
        "f8" => keysym::XK_F8,
        "f9" => keysym::XK_F9,
        "f10" => keysym::XK_F10,
        "f11" => keysym::XK_F11,
        "f12" => keysym::XK_F12,
        _ => return lookup_keysym(key),
    };
    Some(sym.into())
}

/// Tries the name as written, then capitalised, then upper case.
fn lookup_keysym(key: &str) -> Option<KeySym> {
    let mut chars = key.chars();
    let first = chars.next()?;
    let capitalised: String = first
        .to_uppercase()
        .chain(chars.as_str().to_lowercase().chars())
        .collect();
    [key.to_string(), capitalised, key.to_uppercase()]
        .into_iter()
        .find_map(|name| {
            let name = CString::new(name).ok()?;
            let sym = unsafe { xlib::XStringToKeysym(name.as_ptr()) };
            (sym != 0).then_some(sym as KeySym)
        })
}

pub fn get_modifier_for_key(key: &str) -> Option<u32> {
    match key.to_lowercase().as_str() {
        "alt" => Some(xlib::Mod1Mask),
        "ctrl" | "control" => Some(xlib::ControlMask),
        "shift" => Some(xlib::ShiftMask),
        "super" | "win" => Some(xlib::Mod4Mask),
        _ => None,
    }
}

/// Parses a modifier-only combination such as `alt+shift`.
pub fn get_modifier(modifier: &str) -> Result<u32> {
    let mut mask = 0;
    for token in modifier.split(['+', ' ']).filter(|t| !t.is_empty()) {
        match get_modifier_for_key(token) {
            Some(m) => mask |= m,
            None => bail!("unknown modifier '{}'", token),
        }
    }
    if mask == 0 {
        bail!("empty modifier");
    }
    Ok(mask)
}

/// Parses a key combination such as `mod+shift+Return`. `mod` stands for
/// the configured modifier key.
pub fn parse_combo(combo: &str, modkey: u32) -> Result<(u32, KeySym)> {
    let mut mods = 0;
    let mut sym = None;
    for token in combo.split(['+', ' ', '\t']).filter(|t| !t.is_empty()) {
        if token.eq_ignore_ascii_case("mod") {
            mods |= modkey;
        } else if let Some(m) = get_modifier_for_key(token) {
            mods |= m;
        } else {
            match get_keysym_for_key(token) {
                Some(ks) => sym = Some(ks),
                None => bail!("unknown key '{}'", token),
            }
        }
    }
    match sym {
        Some(ks) => Ok((mods, ks)),
        None => bail!("no key in '{}'", combo.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(get_keysym_for_key("Return"), Some(KeySym::from(keysym::XK_Return)));
        assert_eq!(get_keysym_for_key("Q"), Some(KeySym::from(keysym::XK_q)));
        assert_eq!(get_keysym_for_key("nonsense"), None);
    }

    #[test]
    fn names_outside_the_alias_table_come_from_xlib() {
        assert_eq!(
            get_keysym_for_key("XF86AudioMute"),
            Some(KeySym::from(keysym::XF86XK_AudioMute))
        );
        assert_eq!(get_keysym_for_key("Pause"), Some(KeySym::from(keysym::XK_Pause)));
        assert_eq!(get_keysym_for_key("pause"), Some(KeySym::from(keysym::XK_Pause)));
        assert_eq!(get_keysym_for_key("f13"), Some(KeySym::from(keysym::XK_F13)));
    }

    #[test]
    fn combos_resolve_mod_placeholder() {
        let (mods, ks) = parse_combo("mod + shift + j", xlib::Mod4Mask).unwrap();
        assert_eq!(mods, xlib::Mod4Mask | xlib::ShiftMask);
        assert_eq!(ks, KeySym::from(keysym::XK_j));
    }

    #[test]
    fn combo_without_key_is_rejected() {
        assert!(parse_combo("mod+shift", xlib::Mod1Mask).is_err());
        assert!(parse_combo("mod+hyper+a", xlib::Mod1Mask).is_err());
    }

    #[test]
    fn modifier_only_strings() {
        assert_eq!(get_modifier("super").unwrap(), xlib::Mod4Mask);
        assert_eq!(
            get_modifier("alt+ctrl").unwrap(),
            xlib::Mod1Mask | xlib::ControlMask
        );
        assert!(get_modifier("").is_err());
    }
}
