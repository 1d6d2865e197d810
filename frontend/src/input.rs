use std::collections::HashMap;

use phosphor_core::core::machine::InputButton;
use sdl2::keyboard::Scancode;

/// Maps SDL scancodes to machine button IDs.
pub struct KeyMap {
    map: HashMap<Scancode, u8>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a scancode to a machine button ID.
    pub fn bind(&mut self, scancode: Scancode, button_id: u8) {
        self.map.insert(scancode, button_id);
    }

    /// Look up the machine button ID for a scancode.
    pub fn get(&self, scancode: Scancode) -> Option<u8> {
        self.map.get(&scancode).copied()
    }
}

/// Build a default key map for a machine's input buttons.
/// Uses name-based matching: common button names across machines
/// get consistent default bindings without game-specific knowledge.
pub fn default_key_map(buttons: &[InputButton]) -> KeyMap {
    let mut km = KeyMap::new();

    for button in buttons {
        let scancode = match button.name {
            // Player 1
            "P1 Left" => Some(Scancode::Left),
            "P1 Right" => Some(Scancode::Right),
            "P1 Fire" => Some(Scancode::Space),
            "P1 Start" => Some(Scancode::Num1),

            // Player 2 (numeric keypad, mirroring cocktail-cabinet wiring)
            "P2 Left" => Some(Scancode::Kp4),
            "P2 Right" => Some(Scancode::Kp6),
            "P2 Fire" => Some(Scancode::Kp8),
            "P2 Start" => Some(Scancode::Num2),

            // System
            "Credit" => Some(Scancode::Return),

            _ => None,
        };

        if let Some(sc) = scancode {
            km.bind(sc, button.id);
        }
    }

    km
}
