use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::{Action, Focus};

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    Table,
    Detail,
    SearchInput,
    Help,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::shift(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Char('h')), Action::ToggleHelp);
        global.insert(KeyBinding::new(KeyCode::Char('s')), Action::ToggleStats);
        global.insert(KeyBinding::new(KeyCode::Char('r')), Action::Reload);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Record table - less-like navigation
        let mut table = HashMap::new();
        table.insert(KeyBinding::new(KeyCode::Char('j')), Action::RowDown);
        table.insert(KeyBinding::new(KeyCode::Down), Action::RowDown);
        table.insert(KeyBinding::new(KeyCode::Char('k')), Action::RowUp);
        table.insert(KeyBinding::new(KeyCode::Up), Action::RowUp);
        table.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::PageDown);
        table.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        table.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        table.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        table.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        table.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        table.insert(KeyBinding::new(KeyCode::Char('g')), Action::RowTop);
        table.insert(KeyBinding::shift(KeyCode::Char('G')), Action::RowBottom);
        table.insert(KeyBinding::new(KeyCode::Home), Action::RowTop);
        table.insert(KeyBinding::new(KeyCode::End), Action::RowBottom);
        table.insert(KeyBinding::new(KeyCode::Enter), Action::OpenDetail);
        table.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        table.insert(KeyBinding::new(KeyCode::Char('f')), Action::OpenSearch);
        table.insert(KeyBinding::new(KeyCode::Esc), Action::ClearFilter);
        bindings.insert(KeyContext::Table, table);

        // Detail pane
        let mut detail = HashMap::new();
        detail.insert(KeyBinding::new(KeyCode::Char('j')), Action::DetailDown);
        detail.insert(KeyBinding::new(KeyCode::Down), Action::DetailDown);
        detail.insert(KeyBinding::new(KeyCode::Char('k')), Action::DetailUp);
        detail.insert(KeyBinding::new(KeyCode::Up), Action::DetailUp);
        detail.insert(KeyBinding::new(KeyCode::Enter), Action::ApplyDetailFilter);
        detail.insert(KeyBinding::new(KeyCode::Esc), Action::CloseDetail);
        bindings.insert(KeyContext::Detail, detail);

        // Filter input bindings (when search field has focus)
        let mut search = HashMap::new();
        search.insert(KeyBinding::new(KeyCode::Enter), Action::ApplySearch);
        search.insert(KeyBinding::new(KeyCode::Esc), Action::CancelSearch);
        search.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        search.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        search.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CancelSearch);
        bindings.insert(KeyContext::SearchInput, search);

        // Help overlay swallows everything except closing keys and quit
        let mut help = HashMap::new();
        help.insert(KeyBinding::new(KeyCode::Esc), Action::ToggleHelp);
        help.insert(KeyBinding::new(KeyCode::Char('h')), Action::ToggleHelp);
        help.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        help.insert(KeyBinding::shift(KeyCode::Char('?')), Action::ToggleHelp);
        help.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        help.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        bindings.insert(KeyContext::Help, help);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|bindings| bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Help is modal
        if context == KeyContext::Help {
            return None;
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in filter input mode
    /// Returns Some(Action) for special keys and typed characters
    pub fn get_search_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::SearchInput)
            .and_then(|bindings| bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Typed characters never reach global bindings here
        if let KeyCode::Char(c) = key.code
            && (key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT)
        {
            return Some(Action::SearchInput(c));
        }

        None
    }

    /// Resolve a key press given which widget has focus
    pub fn resolve(&self, focus: Focus, help_visible: bool, key: &KeyEvent) -> Option<Action> {
        if help_visible {
            return self.get_action(KeyContext::Help, key);
        }
        match focus {
            Focus::Search => self.get_search_input_action(key),
            Focus::Detail => self.get_action(KeyContext::Detail, key),
            Focus::Table => self.get_action(KeyContext::Table, key),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
