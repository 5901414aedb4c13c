use x11::xlib;

use crate::{
    config::keybind::{Action, Binding},
    core::display::{KeySym, LockMasks},
};

/// Modifier state that matters for matching bindings.
const RELEVANT: u32 = xlib::ShiftMask
    | xlib::ControlMask
    | xlib::Mod1Mask
    | xlib::Mod2Mask
    | xlib::Mod3Mask
    | xlib::Mod4Mask
    | xlib::Mod5Mask;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardState {
    pub masks: LockMasks,
}

impl KeyboardState {
    pub fn new(masks: LockMasks) -> Self {
        Self { masks }
    }

    /// Strips Lock, NumLock and Mode_switch from an event state.
    pub fn clean(&self, state: u32) -> u32 {
        state & !(xlib::LockMask | self.masks.numlock | self.masks.mode_switch) & RELEVANT
    }

    /// First binding matching the key exactly, after cleaning the state.
    pub fn resolve<'a>(&self, binds: &'a [Binding], keysym: KeySym, state: u32) -> Option<&'a Action> {
        let mods = self.clean(state);
        binds
            .iter()
            .find(|b| b.keysym == keysym && self.clean(b.mods) == mods)
            .map(|b| &b.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::command::Function;
    use x11::keysym;

    fn binds() -> Vec<Binding> {
        vec![
            Binding::new(
                xlib::Mod1Mask,
                KeySym::from(keysym::XK_j),
                Action::Call(Function::FocusNext),
            ),
            Binding::new(
                xlib::Mod1Mask | xlib::ShiftMask,
                KeySym::from(keysym::XK_j),
                Action::Call(Function::MasterNext),
            ),
        ]
    }

    #[test]
    fn lock_modifiers_are_ignored() {
        let kb = KeyboardState::new(LockMasks {
            numlock: xlib::Mod2Mask,
            mode_switch: xlib::Mod5Mask,
        });
        let state = xlib::Mod1Mask | xlib::Mod2Mask | xlib::LockMask | xlib::Mod5Mask;
        assert_eq!(
            kb.resolve(&binds(), KeySym::from(keysym::XK_j), state),
            Some(&Action::Call(Function::FocusNext))
        );
    }

    #[test]
    fn modifiers_must_match_exactly() {
        let kb = KeyboardState::default();
        let j = KeySym::from(keysym::XK_j);
        assert_eq!(
            kb.resolve(&binds(), j, xlib::Mod1Mask | xlib::ShiftMask),
            Some(&Action::Call(Function::MasterNext))
        );
        assert_eq!(kb.resolve(&binds(), j, xlib::ControlMask | xlib::Mod1Mask), None);
        assert_eq!(kb.resolve(&binds(), KeySym::from(keysym::XK_k), xlib::Mod1Mask), None);
    }

    #[test]
    fn numlock_position_is_not_assumed() {
        // NumLock on Mod3 leaves Mod2 significant.
        let kb = KeyboardState::new(LockMasks {
            numlock: xlib::Mod3Mask,
            mode_switch: 0,
        });
        assert_eq!(kb.clean(xlib::Mod2Mask | xlib::Mod3Mask), xlib::Mod2Mask);
        // Button masks never take part.
        assert_eq!(kb.clean(xlib::Button1Mask | xlib::ShiftMask), xlib::ShiftMask);
    }
}
