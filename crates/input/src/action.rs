/// A high-level intent produced by the windowing backend's key events.
///
/// The scene consumes intents, never raw key codes. Which physical key maps
/// to which intent is the backend's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intent {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    LookLeft,
    LookRight,
    LookUp,
    LookDown,
    /// Shift the rug (and steer the spotlight) along +x.
    RugLeft,
    /// Shift the rug (and steer the spotlight) along -x.
    RugRight,
    RugUp,
    RugDown,
    /// Show or hide the debug overlay. Edge-triggered.
    ToggleDebug,
    /// Ask the frame loop to close. Edge-triggered.
    Quit,
}

impl Intent {
    pub const ALL: [Intent; 14] = [
        Intent::MoveForward,
        Intent::MoveBackward,
        Intent::StrafeLeft,
        Intent::StrafeRight,
        Intent::LookLeft,
        Intent::LookRight,
        Intent::LookUp,
        Intent::LookDown,
        Intent::RugLeft,
        Intent::RugRight,
        Intent::RugUp,
        Intent::RugDown,
        Intent::ToggleDebug,
        Intent::Quit,
    ];

    /// Edge-triggered intents fire once per press; the rest are sampled as held.
    pub fn is_edge_triggered(self) -> bool {
        matches!(self, Intent::ToggleDebug | Intent::Quit)
    }

    pub fn name(self) -> &'static str {
        match self {
            Intent::MoveForward => "move-forward",
            Intent::MoveBackward => "move-backward",
            Intent::StrafeLeft => "strafe-left",
            Intent::StrafeRight => "strafe-right",
            Intent::LookLeft => "look-left",
            Intent::LookRight => "look-right",
            Intent::LookUp => "look-up",
            Intent::LookDown => "look-down",
            Intent::RugLeft => "rug-left",
            Intent::RugRight => "rug-right",
            Intent::RugUp => "rug-up",
            Intent::RugDown => "rug-down",
            Intent::ToggleDebug => "toggle-debug",
            Intent::Quit => "quit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }
}

/// Key transition reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Pressed,
    Repeated,
    Released,
}

impl KeyTransition {
    pub fn is_down(self) -> bool {
        !matches!(self, KeyTransition::Released)
    }
}

/// One key event, already mapped to an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub intent: Intent,
    pub transition: KeyTransition,
}

impl InputEvent {
    pub fn new(intent: Intent, transition: KeyTransition) -> Self {
        Self { intent, transition }
    }

    pub fn pressed(intent: Intent) -> Self {
        Self::new(intent, KeyTransition::Pressed)
    }

    pub fn released(intent: Intent) -> Self {
        Self::new(intent, KeyTransition::Released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_toggle_and_quit_are_edge_triggered() {
        let edge: Vec<Intent> = Intent::ALL
            .into_iter()
            .filter(|i| i.is_edge_triggered())
            .collect();
        assert_eq!(edge, vec![Intent::ToggleDebug, Intent::Quit]);
    }

    #[test]
    fn names_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_name(intent.name()), Some(intent));
        }
        assert_eq!(Intent::from_name("jump"), None);
    }

    #[test]
    fn repeat_counts_as_down() {
        assert!(KeyTransition::Pressed.is_down());
        assert!(KeyTransition::Repeated.is_down());
        assert!(!KeyTransition::Released.is_down());
    }
}
