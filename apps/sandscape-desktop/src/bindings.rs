use sandscape_input::{InputEvent, Intent, KeyTransition};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Physical key to intent. Unbound keys are ignored.
pub fn intent_for(key: KeyCode) -> Option<Intent> {
    let intent = match key {
        KeyCode::KeyW => Intent::MoveForward,
        KeyCode::KeyS => Intent::MoveBackward,
        KeyCode::KeyA => Intent::StrafeLeft,
        KeyCode::KeyD => Intent::StrafeRight,
        KeyCode::ArrowLeft => Intent::LookLeft,
        KeyCode::ArrowRight => Intent::LookRight,
        KeyCode::ArrowUp => Intent::LookUp,
        KeyCode::ArrowDown => Intent::LookDown,
        KeyCode::KeyJ => Intent::RugLeft,
        KeyCode::KeyL => Intent::RugRight,
        KeyCode::KeyI => Intent::RugUp,
        KeyCode::KeyK => Intent::RugDown,
        KeyCode::F1 => Intent::ToggleDebug,
        KeyCode::Escape => Intent::Quit,
        _ => return None,
    };
    Some(intent)
}

pub fn transition(state: ElementState, repeat: bool) -> KeyTransition {
    match (state, repeat) {
        (ElementState::Pressed, false) => KeyTransition::Pressed,
        (ElementState::Pressed, true) => KeyTransition::Repeated,
        (ElementState::Released, _) => KeyTransition::Released,
    }
}

/// Translate one key event, or `None` for an unbound key.
pub fn key_event(key: KeyCode, state: ElementState, repeat: bool) -> Option<InputEvent> {
    intent_for(key).map(|intent| InputEvent::new(intent, transition(state, repeat)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_intent_has_a_key() {
        let keys = [
            KeyCode::KeyW,
            KeyCode::KeyS,
            KeyCode::KeyA,
            KeyCode::KeyD,
            KeyCode::ArrowLeft,
            KeyCode::ArrowRight,
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
            KeyCode::KeyJ,
            KeyCode::KeyL,
            KeyCode::KeyI,
            KeyCode::KeyK,
            KeyCode::F1,
            KeyCode::Escape,
        ];
        let bound: Vec<Intent> = keys.iter().filter_map(|k| intent_for(*k)).collect();
        for intent in Intent::ALL {
            assert!(bound.contains(&intent), "{intent:?} unbound");
        }
    }

    #[test]
    fn unbound_key_is_ignored() {
        assert_eq!(intent_for(KeyCode::KeyQ), None);
        assert!(key_event(KeyCode::Space, ElementState::Pressed, false).is_none());
    }

    #[test]
    fn repeat_counts_as_held() {
        let event = key_event(KeyCode::KeyW, ElementState::Pressed, true).unwrap();
        assert_eq!(event.transition, KeyTransition::Repeated);
        assert!(event.transition.is_down());
    }
}
