use winit::event::VirtualKeyCode;

use crate::config::KeyBindings;
use crate::sprite::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Move(Direction),
    Quit,
}

pub struct PlayerController {
    key_bindings: KeyBindings,
    pending: Vec<Direction>,
}

impl PlayerController {
    pub fn new(key_bindings: KeyBindings) -> Self {
        Self {
            key_bindings,
            pending: Vec::new(),
        }
    }

    /// Maps a key press to an action. Moves are queued until the next
    /// [`PlayerController::drain_moves`]; releases are ignored.
    pub fn process_keyboard(&mut self, key: VirtualKeyCode, is_pressed: bool) -> Option<Action> {
        if !is_pressed {
            return None;
        }

        let action = if key == self.key_bindings.quit || key == VirtualKeyCode::Escape {
            Action::Quit
        } else if key == self.key_bindings.up {
            Action::Move(Direction::Up)
        } else if key == self.key_bindings.down {
            Action::Move(Direction::Down)
        } else if key == self.key_bindings.left {
            Action::Move(Direction::Left)
        } else if key == self.key_bindings.right {
            Action::Move(Direction::Right)
        } else {
            return None;
        };

        if let Action::Move(direction) = action {
            self.pending.push(direction);
        }
        Some(action)
    }

    pub fn drain_moves(&mut self) -> std::vec::Drain<'_, Direction> {
        self.pending.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys_move_and_quit() {
        let mut controller = PlayerController::new(KeyBindings::default());
        assert_eq!(
            controller.process_keyboard(VirtualKeyCode::Left, true),
            Some(Action::Move(Direction::Left))
        );
        assert_eq!(
            controller.process_keyboard(VirtualKeyCode::Up, true),
            Some(Action::Move(Direction::Up))
        );
        assert_eq!(
            controller.process_keyboard(VirtualKeyCode::Space, true),
            Some(Action::Quit)
        );
        assert_eq!(
            controller.process_keyboard(VirtualKeyCode::Escape, true),
            Some(Action::Quit)
        );
        assert_eq!(controller.process_keyboard(VirtualKeyCode::Q, true), None);
    }

    #[test]
    fn releases_do_nothing() {
        let mut controller = PlayerController::new(KeyBindings::default());
        assert_eq!(controller.process_keyboard(VirtualKeyCode::Down, false), None);
        assert_eq!(controller.drain_moves().count(), 0);
    }

    #[test]
    fn repeated_presses_queue_moves_in_order() {
        let mut controller = PlayerController::new(KeyBindings::default());
        for key in [
            VirtualKeyCode::Right,
            VirtualKeyCode::Right,
            VirtualKeyCode::Down,
        ] {
            controller.process_keyboard(key, true);
        }
        let moves: Vec<_> = controller.drain_moves().collect();
        assert_eq!(moves, vec![Direction::Right, Direction::Right, Direction::Down]);
        assert_eq!(controller.drain_moves().count(), 0);
    }
}
