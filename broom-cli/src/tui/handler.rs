use broom_core::SortField;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{Action, AppMode};

/// Map key events to actions based on current mode
pub fn handle_key(key: KeyEvent, mode: AppMode) -> Action {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match mode {
        AppMode::Help => handle_key_help(key),
        AppMode::Loading | AppMode::Pending => handle_key_busy(key),
        AppMode::Prompt => handle_key_prompt(key),
        AppMode::Notice => handle_key_notice(key),
        AppMode::Browsing => handle_key_browsing(key),
    }
}

fn handle_key_help(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Action::HideHelp,
        _ => Action::Tick,
    }
}

fn handle_key_busy(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') => Action::Quit,
        _ => Action::Tick,
    }
}

fn handle_key_prompt(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => Action::Yes,
        KeyCode::Char('n') | KeyCode::Char('N') => Action::No,
        KeyCode::Esc => Action::CancelPrompt,
        _ => Action::Tick,
    }
}

fn handle_key_notice(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Action::DismissNotice,
        KeyCode::Char('q') => Action::Quit,
        _ => Action::Tick,
    }
}

fn handle_key_browsing(key: KeyEvent) -> Action {
    match key.code {
        // Quit
        KeyCode::Char('q') => Action::Quit,

        // Navigation
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        KeyCode::Home | KeyCode::Char('g') => Action::GoToFirst,
        KeyCode::End | KeyCode::Char('G') => Action::GoToLast,

        // Selection
        KeyCode::Char(' ') => Action::ToggleSelect,
        KeyCode::Char('a') => Action::ToggleSelectAll,

        // Sorting
        KeyCode::Char('1') => Action::SortBy(SortField::Name),
        KeyCode::Char('2') => Action::SortBy(SortField::EntityId),
        KeyCode::Char('3') => Action::SortBy(SortField::Platform),
        KeyCode::Char('4') => Action::SortBy(SortField::Status),
        KeyCode::Char('5') => Action::SortBy(SortField::DaysUnavailable),

        // Filter and threshold
        KeyCode::Char('f') | KeyCode::Tab => Action::NextFilter,
        KeyCode::Char('F') | KeyCode::BackTab => Action::PrevFilter,
        KeyCode::Char('+') | KeyCode::Char('=') => Action::IncreaseThreshold,
        KeyCode::Char('-') => Action::DecreaseThreshold,

        // Actions
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char('d') | KeyCode::Delete => Action::Delete,

        // Help
        KeyCode::Char('?') => Action::ShowHelp,

        _ => Action::Tick,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_prompt_keys() {
        assert_eq!(handle_key(key(KeyCode::Char('y')), AppMode::Prompt), Action::Yes);
        assert_eq!(handle_key(key(KeyCode::Char('n')), AppMode::Prompt), Action::No);
        assert_eq!(
            handle_key(key(KeyCode::Esc), AppMode::Prompt),
            Action::CancelPrompt
        );
        // Quitting mid-prompt is not offered
        assert_eq!(handle_key(key(KeyCode::Char('q')), AppMode::Prompt), Action::Tick);
    }

    #[test]
    fn test_browsing_keys() {
        assert_eq!(
            handle_key(key(KeyCode::Char('5')), AppMode::Browsing),
            Action::SortBy(SortField::DaysUnavailable)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char(' ')), AppMode::Browsing),
            Action::ToggleSelect
        );
        assert_eq!(handle_key(key(KeyCode::Char('d')), AppMode::Browsing), Action::Delete);
    }

    #[test]
    fn test_busy_modes_ignore_delete() {
        assert_eq!(handle_key(key(KeyCode::Char('d')), AppMode::Pending), Action::Tick);
        assert_eq!(handle_key(key(KeyCode::Char('r')), AppMode::Loading), Action::Tick);
        assert_eq!(handle_key(key(KeyCode::Char('q')), AppMode::Pending), Action::Quit);
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(ctrl_c, AppMode::Prompt), Action::Quit);
        assert_eq!(handle_key(ctrl_c, AppMode::Help), Action::Quit);
    }
}
