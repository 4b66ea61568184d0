use crate::tui::action::Action;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Input context that selects which bindings apply
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Consulted after the active mode
    Global,
    #[default]
    Table,
    Search,
    ImportPrompt,
    LayoutEditor,
    FilterMenu,
    ColumnMenu,
    ImageView,
}

impl Mode {
    /// Modes whose printable keys are typed into a text field
    pub fn accepts_text(&self) -> bool {
        matches!(self, Mode::Search | Mode::ImportPrompt)
    }
}

/// Maps KeyEvents to Actions, per mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(rename = "bindings")]
    bindings_list: Vec<KeyBinding>,

    #[serde(skip)]
    bindings_map: HashMap<(Mode, KeyPattern), Action>,
}

/// Single keybinding entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub mode: Mode,
    pub key: String,
    pub action: Action,
}

/// Pattern for matching key events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use Action::*;
        use Mode as M;

        let table = [
            ("Up", MoveUp),
            ("Down", MoveDown),
            ("Left", MoveLeft),
            ("Right", MoveRight),
            ("k", MoveUp),
            ("j", MoveDown),
            ("h", MoveLeft),
            ("l", MoveRight),
            ("PageDown", NextPage),
            ("]", NextPage),
            ("PageUp", PreviousPage),
            ("[", PreviousPage),
            ("Home", FirstPage),
            ("End", LastPage),
            ("s", ToggleSort),
            ("/", FocusSearch),
            ("f", OpenFilterMenu),
            ("v", OpenColumnMenu),
            ("L", EditLayout),
            ("o", Import),
            ("c", CopyCell),
            ("Enter", Confirm),
            ("Esc", Cancel),
            ("q", Quit),
        ];
        let search = [("Enter", Confirm), ("Esc", Cancel)];
        let import = [("Tab", NextField), ("Enter", Confirm), ("Esc", Cancel)];
        let layout = [
            ("Up", MoveUp),
            ("Down", MoveDown),
            ("k", MoveUp),
            ("j", MoveDown),
            ("Space", PickUpColumn),
            ("Enter", DropIntoGap),
            ("x", DropOntoColumn),
            ("h", ToggleHidden),
            ("s", ToggleSortable),
            ("f", ToggleFilterable),
            ("n", ToggleSearchBy),
            ("Ctrl+s", SaveLayout),
            ("Esc", Cancel),
        ];
        let filter = [
            ("Up", MoveUp),
            ("Down", MoveDown),
            ("Left", MoveLeft),
            ("Right", MoveRight),
            ("k", MoveUp),
            ("j", MoveDown),
            ("Space", ToggleSelection),
            ("r", ClearFilters),
            ("Enter", Confirm),
            ("Esc", Cancel),
        ];
        let columns = [
            ("Up", MoveUp),
            ("Down", MoveDown),
            ("k", MoveUp),
            ("j", MoveDown),
            ("Space", ToggleSelection),
            ("a", ShowAllColumns),
            ("Enter", Confirm),
            ("Esc", Cancel),
        ];
        let image = [("Esc", Cancel), ("Enter", Confirm)];
        let global = [("Ctrl+c", Quit)];

        let groups: [(Mode, &[(&str, Action)]); 8] = [
            (M::Global, &global),
            (M::Table, &table),
            (M::Search, &search),
            (M::ImportPrompt, &import),
            (M::LayoutEditor, &layout),
            (M::FilterMenu, &filter),
            (M::ColumnMenu, &columns),
            (M::ImageView, &image),
        ];
        let bindings_list = groups
            .iter()
            .flat_map(|(mode, keys)| keys.iter().map(|(key, action)| KeyBinding::new(*mode, key, *action)))
            .collect::<Vec<_>>();

        let bindings_map = Self::build_map(&bindings_list);

        Self {
            bindings_list,
            bindings_map,
        }
    }
}

impl KeyBindings {
    /// Build hashmap from bindings list
    fn build_map(bindings: &[KeyBinding]) -> HashMap<(Mode, KeyPattern), Action> {
        bindings
            .iter()
            .filter_map(|b| {
                KeyPattern::from_string(&b.key)
                    .ok()
                    .map(|pattern| ((b.mode, pattern), b.action))
            })
            .collect()
    }

    /// Get action for key event in `mode`, falling back to global bindings
    pub fn get_action(&self, mode: Mode, key: &KeyEvent) -> Option<Action> {
        let pattern = KeyPattern::from_event(key);
        self.bindings_map
            .get(&(mode, pattern.clone()))
            .or_else(|| self.bindings_map.get(&(Mode::Global, pattern)))
            .copied()
    }

    /// Replace or add bindings; an override wins for its mode and key
    pub fn apply_overrides(&mut self, overrides: Vec<KeyBinding>) {
        for binding in overrides {
            match self
                .bindings_list
                .iter_mut()
                .find(|b| b.mode == binding.mode && b.key == binding.key)
            {
                Some(existing) => existing.action = binding.action,
                None => self.bindings_list.push(binding),
            }
        }
        self.bindings_map = Self::build_map(&self.bindings_list);
    }

    /// Load overrides from a JSON file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let overrides: KeyBindings = serde_json::from_str(&content)?;
        let mut bindings = Self::default();
        bindings.apply_overrides(overrides.bindings_list);
        Ok(bindings)
    }

    /// Save to JSON config file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get all bindings for an action in a mode (for hints)
    pub fn get_keys_for_action(&self, mode: Mode, action: Action) -> Vec<String> {
        self.bindings_list
            .iter()
            .filter(|b| b.action == action && (b.mode == mode || b.mode == Mode::Global))
            .map(|b| b.key.clone())
            .collect()
    }

    /// One-line "key: description" hint for the given actions
    pub fn hint(&self, mode: Mode, actions: &[Action]) -> String {
        actions
            .iter()
            .filter_map(|action| {
                self.get_keys_for_action(mode, *action)
                    .first()
                    .map(|key| format!("{key}: {}", action.description()))
            })
            .collect::<Vec<_>>()
            .join("  ")
    }

    /// Returns Vec of (Action, description) for actions with no binding in any mode
    pub fn get_unbound_actions(&self) -> Vec<(Action, &'static str)> {
        let bound_actions: HashSet<Action> = self.bindings_list.iter().map(|b| b.action).collect();

        Action::all()
            .into_iter()
            .filter(|action| !bound_actions.contains(action))
            .map(|action| (action, action.description()))
            .collect()
    }

    /// Validate bindings and return warnings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut seen_keys: HashMap<(Mode, &str), Action> = HashMap::new();
        for binding in &self.bindings_list {
            if let Some(existing_action) = seen_keys.get(&(binding.mode, binding.key.as_str())) {
                warnings.push(format!(
                    "Duplicate key '{}' in {:?}: bound to both {:?} and {:?}",
                    binding.key, binding.mode, existing_action, binding.action
                ));
            } else {
                seen_keys.insert((binding.mode, binding.key.as_str()), binding.action);
            }
        }

        let unbound = self.get_unbound_actions();
        if !unbound.is_empty() {
            warnings.push(format!(
                "Warning: {} action(s) have no keybindings: {}",
                unbound.len(),
                unbound
                    .iter()
                    .map(|(action, _)| format!("{:?}", action))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        for binding in &self.bindings_list {
            if KeyPattern::from_string(&binding.key).is_err() {
                warnings.push(format!(
                    "Invalid key pattern '{}' for action {:?}",
                    binding.key, binding.action
                ));
            }
        }

        warnings
    }
}

impl KeyBinding {
    pub fn new(mode: Mode, key: &str, action: Action) -> Self {
        Self {
            mode,
            key: key.to_string(),
            action,
        }
    }
}

impl KeyPattern {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self::normalized(code, modifiers)
    }

    /// Letters carry SHIFT by case; other characters never do, since
    /// terminals disagree on whether they report it
    fn normalized(code: KeyCode, mut modifiers: KeyModifiers) -> Self {
        let code = match code {
            KeyCode::Char(ch) if ch.is_alphabetic() => {
                modifiers.set(KeyModifiers::SHIFT, ch.is_uppercase());
                KeyCode::Char(ch.to_ascii_lowercase())
            }
            KeyCode::Char(ch) => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::Char(ch)
            }
            KeyCode::BackTab => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::BackTab
            }
            other => other,
        };
        Self { code, modifiers }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self::normalized(event.code, event.modifiers)
    }

    /// Parse from string (e.g., "Ctrl+c", "G", "Space")
    pub fn from_string(s: &str) -> Result<Self, String> {
        if s == "+" {
            return Ok(Self::normalized(KeyCode::Char('+'), KeyModifiers::empty()));
        }
        let parts: Vec<&str> = s.split('+').collect();

        let mut modifiers = KeyModifiers::empty();
        for part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                "cmd" | "command" | "super" => {
                    #[cfg(target_os = "macos")]
                    {
                        modifiers |= KeyModifiers::SUPER;
                    }
                    #[cfg(not(target_os = "macos"))]
                    {
                        modifiers |= KeyModifiers::CONTROL;
                    }
                }
                _ => return Err(format!("Unknown modifier: {}", part)),
            }
        }
        let key_part = parts[parts.len() - 1];

        let code = match key_part.to_lowercase().as_str() {
            "up" | "↑" => KeyCode::Up,
            "down" | "↓" => KeyCode::Down,
            "left" | "←" => KeyCode::Left,
            "right" | "→" => KeyCode::Right,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdown" | "pgdn" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "space" => KeyCode::Char(' '),

            // Single characters keep their case so "G" means Shift+g
            _ if key_part.chars().count() == 1 => match key_part.chars().next() {
                Some(ch) => {
                    let ch = if modifiers.contains(KeyModifiers::SHIFT) {
                        ch.to_ascii_uppercase()
                    } else {
                        ch
                    };
                    KeyCode::Char(ch)
                }
                None => return Err(format!("Unknown key: {}", key_part)),
            },

            s if s.starts_with('f') && (2..=3).contains(&s.len()) => match s[1..].parse::<u8>() {
                Ok(n) if (1..=12).contains(&n) => KeyCode::F(n),
                _ => return Err(format!("Invalid function key: {}", s)),
            },

            _ => return Err(format!("Unknown key: {}", key_part)),
        };

        Ok(Self::normalized(code, modifiers))
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut parts = Vec::new();

        if self.modifiers.contains(KeyModifiers::SUPER) {
            parts.push("Super".to_string());
        }
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }

        let key_str = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) if self.modifiers.contains(KeyModifiers::SHIFT) => {
                c.to_ascii_uppercase().to_string()
            }
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::PageUp => "PgUp".to_string(),
            KeyCode::PageDown => "PgDn".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "Shift+Tab".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::Delete => "Del".to_string(),
            KeyCode::F(n) => format!("F{}", n),
            _ => format!("{:?}", self.code),
        };

        parts.push(key_str);
        write!(f, "{}", parts.join("+"))
    }
}
