//! Key mapping from terminal events to virtual keys.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::VirtualKey;

/// Map a terminal key to the virtual key it drives.
///
/// Bare modifier keys (Ctrl, Shift) only arrive as key codes on terminals
/// with the kitty keyboard protocol enabled.
pub fn virtual_key(key: KeyEvent) -> Option<VirtualKey> {
    use crossterm::event::ModifierKeyCode as M;

    match key.code {
        KeyCode::Down => Some(VirtualKey::SoftDrop),
        KeyCode::Char(' ') => Some(VirtualKey::HardDrop),
        KeyCode::Left => Some(VirtualKey::ShiftLeft),
        KeyCode::Right => Some(VirtualKey::ShiftRight),

        KeyCode::Char('z') | KeyCode::Char('Z') => Some(VirtualKey::RotateLeft),
        KeyCode::Modifier(M::LeftControl | M::RightControl) => Some(VirtualKey::RotateLeft),
        KeyCode::Up | KeyCode::Char('x') | KeyCode::Char('X') => Some(VirtualKey::RotateRight),

        KeyCode::Char('c') | KeyCode::Char('C') if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(VirtualKey::Hold)
        }
        KeyCode::Modifier(M::LeftShift | M::RightShift) => Some(VirtualKey::Hold),

        _ => None,
    }
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(
        key.code,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc
    ) || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Check if key restarts a finished game.
pub fn is_restart(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::ModifierKeyCode;

    #[test]
    fn test_movement_keys() {
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Left)),
            Some(VirtualKey::ShiftLeft)
        );
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Right)),
            Some(VirtualKey::ShiftRight)
        );
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Down)),
            Some(VirtualKey::SoftDrop)
        );
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Char(' '))),
            Some(VirtualKey::HardDrop)
        );
    }

    #[test]
    fn test_rotation_keys() {
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Up)),
            Some(VirtualKey::RotateRight)
        );
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Char('x'))),
            Some(VirtualKey::RotateRight)
        );
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Char('Z'))),
            Some(VirtualKey::RotateLeft)
        );
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Modifier(
                ModifierKeyCode::LeftControl
            ))),
            Some(VirtualKey::RotateLeft)
        );
    }

    #[test]
    fn test_hold_keys() {
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Char('c'))),
            Some(VirtualKey::Hold)
        );
        assert_eq!(
            virtual_key(KeyEvent::from(KeyCode::Modifier(ModifierKeyCode::LeftShift))),
            Some(VirtualKey::Hold)
        );
        assert_eq!(
            virtual_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            None
        );
    }

    #[test]
    fn test_quit_and_restart_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(should_quit(KeyEvent::from(KeyCode::Esc)));
        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('x'))));
        assert!(is_restart(KeyEvent::from(KeyCode::Enter)));
        assert!(!is_restart(KeyEvent::from(KeyCode::Char(' '))));
    }
}
