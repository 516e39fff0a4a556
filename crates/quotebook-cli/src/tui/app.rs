//! Application state and key handling
//!
//! `App` holds only what the catalog store does not: focus, the search input
//! buffer, the list selection and transient status text. Keys are turned into
//! `Intent`s which the event loop forwards to the controller.

use crossterm::event::{KeyCode, KeyModifiers};

use quotebook_core::{CatalogState, ExternalQuery, QuoteId, ViewMode};

/// Which widget receives typed characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Navigating the quote list
    List,
    /// Typing a search term
    Search,
    /// Typing the quote text in the form
    FormText,
    /// Typing the author in the form
    FormAuthor,
}

impl Focus {
    pub fn is_form(self) -> bool {
        matches!(self, Focus::FormText | Focus::FormAuthor)
    }
}

/// A user intent for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    InitialLoad,
    Reload,
    Search(String),
    ClearSearch,
    RefreshRandom,
    ToggleForm,
    BeginEdit(QuoteId),
    CancelEdit,
    SetDraftText(String),
    SetDraftAuthor(String),
    TextFocusLost,
    AuthorFocusLost,
    FetchExternal(ExternalQuery),
    UseSuggestion,
    AdoptSuggestion,
    Submit,
    Delete(QuoteId),
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    pub focus: Focus,
    /// Search input buffer
    pub search_input: String,
    /// Currently selected quote index
    pub list_index: usize,
    /// Quote awaiting delete confirmation
    pub pending_delete: Option<QuoteId>,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<std::time::Instant>,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// Catalog service shown in the title bar
    pub api_url: String,
}

impl App {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            focus: Focus::List,
            search_input: String::new(),
            list_index: 0,
            pending_delete: None,
            status_message: None,
            status_message_time: None,
            show_help: false,
            api_url: api_url.into(),
        }
    }

    /// Set a status message
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(std::time::Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > std::time::Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Reconcile UI-only state with the latest store snapshot
    pub fn sync_with(&mut self, state: &CatalogState) {
        if self.list_index >= state.quotes.len() {
            self.list_index = state.quotes.len().saturating_sub(1);
        }
        if self.focus.is_form() && !state.form_open {
            self.focus = Focus::List;
        }
        if let Some(id) = self.pending_delete {
            if state.quote(id).is_none() {
                self.pending_delete = None;
            }
        }
    }

    /// Id of the currently selected quote
    pub fn selected_id(&self, state: &CatalogState) -> Option<QuoteId> {
        state.quotes.get(self.list_index).map(|q| q.id)
    }

    pub fn move_up(&mut self) {
        self.list_index = self.list_index.saturating_sub(1);
    }

    pub fn move_down(&mut self, len: usize) {
        if self.list_index < len.saturating_sub(1) {
            self.list_index += 1;
        }
    }

    /// Handle a key press, returning the intent it triggers (if any)
    pub fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        state: &CatalogState,
    ) -> Option<Intent> {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        if let Some(id) = self.pending_delete.take() {
            return match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(Intent::Delete(id)),
                _ => {
                    self.set_status("Delete cancelled");
                    None
                }
            };
        }

        match self.focus {
            Focus::List => self.handle_list_key(code, state),
            Focus::Search => self.handle_search_key(code),
            Focus::FormText | Focus::FormAuthor => self.handle_form_key(code, modifiers, state),
        }
    }

    fn handle_list_key(&mut self, code: KeyCode, state: &CatalogState) -> Option<Intent> {
        match code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_up();
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_down(state.quotes.len());
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.list_index = 0;
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.list_index = state.quotes.len().saturating_sub(1);
                None
            }
            KeyCode::Char('/') => {
                self.search_input = state.search_term.clone();
                self.focus = Focus::Search;
                None
            }
            KeyCode::Esc if state.mode == ViewMode::Searching => {
                self.search_input.clear();
                Some(Intent::ClearSearch)
            }
            KeyCode::Char('r') => Some(Intent::RefreshRandom),
            KeyCode::Char('R') => Some(Intent::Reload),
            KeyCode::Char('a') => {
                if !state.form_open {
                    self.focus = Focus::FormText;
                }
                Some(Intent::ToggleForm)
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                let id = self.selected_id(state)?;
                self.focus = Focus::FormText;
                Some(Intent::BeginEdit(id))
            }
            KeyCode::Char('d') => {
                let id = self.selected_id(state)?;
                self.pending_delete = Some(id);
                None
            }
            KeyCode::Char('x') => Some(Intent::FetchExternal(ExternalQuery::Any)),
            KeyCode::Char('u') if state.suggestion.is_some() => {
                self.focus = Focus::FormText;
                Some(Intent::UseSuggestion)
            }
            KeyCode::Char('A') if state.suggestion.is_some() => Some(Intent::AdoptSuggestion),
            KeyCode::Tab if state.form_open => {
                self.focus = Focus::FormText;
                None
            }
            KeyCode::Char('?') => {
                self.toggle_help();
                None
            }
            _ => None,
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) -> Option<Intent> {
        match code {
            KeyCode::Enter => {
                self.focus = Focus::List;
                self.list_index = 0;
                Some(Intent::Search(self.search_input.clone()))
            }
            KeyCode::Esc => {
                self.focus = Focus::List;
                None
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_form_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        state: &CatalogState,
    ) -> Option<Intent> {
        let editing_text = self.focus == Focus::FormText;
        match code {
            KeyCode::Esc => {
                self.focus = Focus::List;
                if state.is_editing() {
                    Some(Intent::CancelEdit)
                } else {
                    Some(Intent::ToggleForm)
                }
            }
            KeyCode::Enter => Some(Intent::Submit),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
                if editing_text {
                    self.focus = Focus::FormAuthor;
                    Some(Intent::TextFocusLost)
                } else {
                    self.focus = Focus::FormText;
                    Some(Intent::AuthorFocusLost)
                }
            }
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                state.suggestion.as_ref().map(|_| Intent::UseSuggestion)
            }
            KeyCode::Backspace => {
                let mut value = self.field_value(state).to_string();
                value.pop()?;
                Some(self.set_field(value))
            }
            KeyCode::Char(c) => {
                let mut value = self.field_value(state).to_string();
                value.push(c);
                Some(self.set_field(value))
            }
            _ => None,
        }
    }

    fn field_value<'a>(&self, state: &'a CatalogState) -> &'a str {
        if self.focus == Focus::FormAuthor {
            &state.draft.author
        } else {
            &state.draft.text
        }
    }

    fn set_field(&self, value: String) -> Intent {
        if self.focus == Focus::FormAuthor {
            Intent::SetDraftAuthor(value)
        } else {
            Intent::SetDraftText(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotebook_core::{ExternalSuggestion, Quote, QuoteDraft};

    fn state_with(ids: &[i64]) -> CatalogState {
        let mut state = CatalogState::default();
        state.quotes = ids
            .iter()
            .map(|&id| Quote::new(id, format!("Quote {}", id), "Someone"))
            .collect();
        state
    }

    fn press(app: &mut App, code: KeyCode, state: &CatalogState) -> Option<Intent> {
        app.handle_key(code, KeyModifiers::NONE, state)
    }

    #[test]
    fn test_focus_is_form() {
        assert!(Focus::FormText.is_form());
        assert!(Focus::FormAuthor.is_form());
        assert!(!Focus::List.is_form());
        assert!(!Focus::Search.is_form());
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let state = state_with(&[1, 2, 3]);
        let mut app = App::new("http://localhost");

        press(&mut app, KeyCode::Up, &state);
        assert_eq!(app.list_index, 0);
        press(&mut app, KeyCode::Char('G'), &state);
        assert_eq!(app.list_index, 2);
        press(&mut app, KeyCode::Down, &state);
        assert_eq!(app.list_index, 2);
        assert_eq!(app.selected_id(&state), Some(QuoteId(3)));
    }

    #[test]
    fn test_sync_clamps_selection() {
        let mut app = App::new("http://localhost");
        app.list_index = 5;
        app.sync_with(&state_with(&[1, 2]));
        assert_eq!(app.list_index, 1);

        app.sync_with(&state_with(&[]));
        assert_eq!(app.list_index, 0);
    }

    #[test]
    fn test_search_input() {
        let state = state_with(&[1]);
        let mut app = App::new("http://localhost");

        assert_eq!(press(&mut app, KeyCode::Char('/'), &state), None);
        assert_eq!(app.focus, Focus::Search);
        for c in "lovex".chars() {
            press(&mut app, KeyCode::Char(c), &state);
        }
        press(&mut app, KeyCode::Backspace, &state);

        let intent = press(&mut app, KeyCode::Enter, &state);
        assert_eq!(intent, Some(Intent::Search("love".to_string())));
        assert_eq!(app.focus, Focus::List);
    }

    #[test]
    fn test_escape_clears_active_search() {
        let mut state = state_with(&[1]);
        let mut app = App::new("http://localhost");
        assert_eq!(press(&mut app, KeyCode::Esc, &state), None);

        state.mode = ViewMode::Searching;
        assert_eq!(
            press(&mut app, KeyCode::Esc, &state),
            Some(Intent::ClearSearch)
        );
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let state = state_with(&[4, 7]);
        let mut app = App::new("http://localhost");
        press(&mut app, KeyCode::Down, &state);

        assert_eq!(press(&mut app, KeyCode::Char('d'), &state), None);
        assert_eq!(app.pending_delete, Some(QuoteId(7)));
        assert_eq!(
            press(&mut app, KeyCode::Char('y'), &state),
            Some(Intent::Delete(QuoteId(7)))
        );

        press(&mut app, KeyCode::Char('d'), &state);
        assert_eq!(press(&mut app, KeyCode::Char('n'), &state), None);
        assert!(app.pending_delete.is_none());
        assert_eq!(app.status_message.as_deref(), Some("Delete cancelled"));
    }

    #[test]
    fn test_typing_in_form_edits_draft() {
        let mut state = state_with(&[]);
        state.form_open = true;
        state.draft = QuoteDraft::new("Hell", "");
        let mut app = App::new("http://localhost");
        app.focus = Focus::FormText;

        assert_eq!(
            press(&mut app, KeyCode::Char('o'), &state),
            Some(Intent::SetDraftText("Hello".to_string()))
        );
        assert_eq!(
            press(&mut app, KeyCode::Backspace, &state),
            Some(Intent::SetDraftText("Hel".to_string()))
        );
    }

    #[test]
    fn test_leaving_a_field_reports_focus_loss() {
        let mut state = state_with(&[]);
        state.form_open = true;
        let mut app = App::new("http://localhost");
        app.focus = Focus::FormText;

        assert_eq!(
            press(&mut app, KeyCode::Tab, &state),
            Some(Intent::TextFocusLost)
        );
        assert_eq!(app.focus, Focus::FormAuthor);
        assert_eq!(
            press(&mut app, KeyCode::Tab, &state),
            Some(Intent::AuthorFocusLost)
        );
        assert_eq!(app.focus, Focus::FormText);
    }

    #[test]
    fn test_form_escape_cancels_edit() {
        let mut state = state_with(&[1]);
        state.form_open = true;
        state.edit_target = Some(QuoteId(1));
        let mut app = App::new("http://localhost");
        app.focus = Focus::FormAuthor;

        assert_eq!(
            press(&mut app, KeyCode::Esc, &state),
            Some(Intent::CancelEdit)
        );
        assert_eq!(app.focus, Focus::List);
    }

    #[test]
    fn test_form_closes_focus_returns_to_list() {
        let mut app = App::new("http://localhost");
        app.focus = Focus::FormText;
        app.sync_with(&state_with(&[1]));
        assert_eq!(app.focus, Focus::List);
    }

    #[test]
    fn test_suggestion_keys() {
        let mut state = state_with(&[]);
        let mut app = App::new("http://localhost");
        assert_eq!(press(&mut app, KeyCode::Char('A'), &state), None);

        state.suggestion = Some(ExternalSuggestion::new("Carpe diem", "Horace"));
        assert_eq!(
            press(&mut app, KeyCode::Char('A'), &state),
            Some(Intent::AdoptSuggestion)
        );
        assert_eq!(
            press(&mut app, KeyCode::Char('u'), &state),
            Some(Intent::UseSuggestion)
        );
        assert_eq!(app.focus, Focus::FormText);
    }

    #[test]
    fn test_quit() {
        let state = state_with(&[]);
        let mut app = App::new("http://localhost");
        press(&mut app, KeyCode::Char('q'), &state);
        assert!(app.should_quit);

        let mut app = App::new("http://localhost");
        app.focus = Focus::Search;
        app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL, &state);
        assert!(app.should_quit);
    }
}
