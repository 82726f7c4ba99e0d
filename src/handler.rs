use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use crate::app::{App, Focus, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Tab cycles: Transcript -> File -> Question -> Transcript
        KeyCode::Tab => cycle_focus(app),

        // Jump straight into a field
        KeyCode::Char('f') => enter_editing(app, Focus::FileInput),
        KeyCode::Char('i') | KeyCode::Char('a') => enter_editing(app, Focus::QuestionInput),

        // Half-page scroll (must match before the plain 'u' upload binding)
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        // Upload the selected file
        KeyCode::Char('u') => app.submit_upload(),
        KeyCode::Enter if app.focus == Focus::FileInput => app.submit_upload(),

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::Char('G') => app.scroll_to_bottom(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }

        KeyCode::Tab => cycle_focus(app),

        KeyCode::Enter => match app.focus {
            // Commit the typed path as the selected file; upload stays a
            // separate step ('u' in normal mode or Enter on the file pane).
            Focus::FileInput => {
                app.select_file();
                app.input_mode = InputMode::Normal;
            }
            Focus::QuestionInput => app.submit_question(),
            Focus::Transcript => {}
        },

        KeyCode::Backspace => {
            let (input, cursor) = active_field(app);
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let (input, cursor) = active_field(app);
            if *cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            let (_, cursor) = active_field(app);
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let (input, cursor) = active_field(app);
            *cursor = (*cursor + 1).min(input.chars().count());
        }
        KeyCode::Home => {
            let (_, cursor) = active_field(app);
            *cursor = 0;
        }
        KeyCode::End => {
            let (input, cursor) = active_field(app);
            *cursor = input.chars().count();
        }
        KeyCode::Char(c) => {
            let (input, cursor) = active_field(app);
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => {}
    }
}

/// The input field and cursor the current focus edits. The transcript pane
/// never enters editing mode, so it falls back to the question field.
fn active_field(app: &mut App) -> (&mut String, &mut usize) {
    match app.focus {
        Focus::FileInput => (&mut app.file_input, &mut app.file_cursor),
        _ => (&mut app.question_input, &mut app.question_cursor),
    }
}

fn cycle_focus(app: &mut App) {
    app.focus = match app.focus {
        Focus::Transcript => Focus::FileInput,
        Focus::FileInput => Focus::QuestionInput,
        Focus::QuestionInput => Focus::Transcript,
    };

    match app.focus {
        Focus::Transcript => app.input_mode = InputMode::Normal,
        Focus::FileInput => {
            app.input_mode = InputMode::Editing;
            app.file_cursor = app.file_input.chars().count();
        }
        Focus::QuestionInput => {
            app.input_mode = InputMode::Editing;
            app.question_cursor = app.question_input.chars().count();
        }
    }
}

fn enter_editing(app: &mut App, focus: Focus) {
    app.focus = focus;
    app.input_mode = InputMode::Editing;
    match focus {
        Focus::FileInput => app.file_cursor = app.file_input.chars().count(),
        Focus::QuestionInput => app.question_cursor = app.question_input.chars().count(),
        Focus::Transcript => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_down();
            app.scroll_down();
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_up();
            app.scroll_up();
            app.scroll_up();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendClient;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn test_app() -> App {
        App::new(BackendClient::new("http://127.0.0.1:1"))
    }

    #[tokio::test]
    async fn test_typing_updates_question_field() {
        let mut app = test_app();
        app.focus = Focus::QuestionInput;
        app.input_mode = InputMode::Editing;

        for c in "hi?".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        assert_eq!(app.question_input, "hi?");
        assert_eq!(app.question_cursor, 3);

        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.question_input, "hi");
    }

    #[tokio::test]
    async fn test_utf8_editing_in_file_field() {
        let mut app = test_app();
        app.focus = Focus::FileInput;
        app.input_mode = InputMode::Editing;

        for c in "résumé.pdf".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, key(KeyCode::Home));
        handle_key(&mut app, key(KeyCode::Delete));
        assert_eq!(app.file_input, "ésumé.pdf");

        handle_key(&mut app, key(KeyCode::End));
        handle_key(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.file_input, "ésumé.pd");
    }

    #[tokio::test]
    async fn test_enter_on_file_field_commits_selection() {
        let mut app = test_app();
        app.focus = Focus::FileInput;
        app.input_mode = InputMode::Editing;
        app.file_input = "notes.pdf".to_string();

        handle_key(&mut app, key(KeyCode::Enter));

        assert_eq!(
            app.selected_file.as_deref(),
            Some(std::path::Path::new("notes.pdf"))
        );
        assert_eq!(app.input_mode, InputMode::Normal);
        // Selecting a file must not touch the transcript
        assert!(app.transcript.is_empty());
    }

    #[tokio::test]
    async fn test_tab_cycles_focus() {
        let mut app = test_app();
        app.focus = Focus::Transcript;
        app.input_mode = InputMode::Normal;

        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::FileInput);
        assert_eq!(app.input_mode, InputMode::Editing);

        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::QuestionInput);

        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Transcript);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_q_quits_only_in_normal_mode() {
        let mut app = test_app();
        app.focus = Focus::QuestionInput;
        app.input_mode = InputMode::Editing;

        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.question_input, "q");

        app.input_mode = InputMode::Normal;
        handle_key(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
