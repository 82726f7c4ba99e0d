use std::path::PathBuf;

use anyhow::Result;
use tokio::task::JoinHandle;

use crate::backend::{AskReply, BackendClient, UploadReply};
use crate::transcript::{EntryKind, Transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Transcript,
    FileInput,
    QuestionInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: Focus,
    pub input_mode: InputMode,

    // Transcript state
    pub transcript: Transcript,
    pub transcript_scroll: u16,
    pub transcript_height: u16, // inner height of the panel, set during render
    pub transcript_width: u16,  // inner width, for wrap calculations

    // File selection state
    pub file_input: String,
    pub file_cursor: usize, // cursor position in file_input, in chars
    pub selected_file: Option<PathBuf>,

    // Question state
    pub question_input: String,
    pub question_cursor: usize,

    // In-flight requests. `busy` is true exactly while an upload request is
    // outstanding; it is reset on every completion path by finish_upload.
    pub busy: bool,
    pub upload_task: Option<JoinHandle<Result<UploadReply>>>,
    pub ask_task: Option<JoinHandle<Result<AskReply>>>,

    // Animation state (ellipsis while waiting for an answer)
    pub animation_frame: u8,

    pub backend: BackendClient,
}

impl App {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            should_quit: false,
            focus: Focus::QuestionInput,
            input_mode: InputMode::Editing,

            transcript: Transcript::new(),
            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,

            file_input: String::new(),
            file_cursor: 0,
            selected_file: None,

            question_input: String::new(),
            question_cursor: 0,

            busy: false,
            upload_task: None,
            ask_task: None,

            animation_frame: 0,

            backend,
        }
    }

    pub fn upload_in_flight(&self) -> bool {
        self.upload_task.is_some()
    }

    pub fn ask_in_flight(&self) -> bool {
        self.ask_task.is_some()
    }

    /// Replace the held file reference with the path typed into the file
    /// field. No validation of extension, existence, or size; a blank field
    /// is a silent no-op.
    pub fn select_file(&mut self) {
        let path = self.file_input.trim();
        if path.is_empty() {
            return;
        }
        self.selected_file = Some(PathBuf::from(path));
    }

    /// Start uploading the selected file. Silent no-op when no file is
    /// selected or an upload is already in flight.
    pub fn submit_upload(&mut self) {
        let Some(path) = self.selected_file.clone() else {
            return;
        };
        if self.upload_task.is_some() {
            return;
        }

        self.busy = true;
        self.transcript.push(EntryKind::Info, "Uploading PDF…");
        self.scroll_to_bottom();

        let backend = self.backend.clone();
        self.upload_task = Some(tokio::spawn(async move { backend.upload(&path).await }));
    }

    /// Send the question field's trimmed text to the backend. A blank
    /// question, or a submit while an answer is still pending, is a no-op.
    /// The field clears at submit so the same text cannot be sent twice.
    pub fn submit_question(&mut self) {
        let question = self.question_input.trim().to_string();
        if question.is_empty() {
            return;
        }
        if self.ask_task.is_some() {
            return;
        }

        self.transcript.push(EntryKind::Question, question.clone());
        self.question_input.clear();
        self.question_cursor = 0;
        self.scroll_to_bottom();

        let backend = self.backend.clone();
        self.ask_task = Some(tokio::spawn(async move { backend.ask(&question).await }));
    }

    /// Reap finished request tasks and apply their outcomes. Called from the
    /// UI loop between events, so results only ever land on a live view.
    pub async fn poll_requests(&mut self) {
        if self.upload_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.upload_task.take() {
                self.finish_upload(flatten_join(task.await));
            }
        }

        if self.ask_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.ask_task.take() {
                self.finish_ask(flatten_join(task.await));
            }
        }
    }

    /// Apply an upload outcome. Busy drops back to false on every path,
    /// including transport failures, which render as error entries.
    pub fn finish_upload(&mut self, result: Result<UploadReply>) {
        self.busy = false;
        match result {
            Ok(reply) => match reply.error {
                Some(error) => self.transcript.push(EntryKind::Error, error),
                None => self
                    .transcript
                    .push(EntryKind::Success, reply.message.unwrap_or_default()),
            },
            Err(err) => self.transcript.push(EntryKind::Error, format!("{err:#}")),
        }
        self.scroll_to_bottom();
    }

    pub fn finish_ask(&mut self, result: Result<AskReply>) {
        match result {
            Ok(reply) => match reply.answer {
                Some(answer) => self.transcript.push(EntryKind::Answer, answer),
                None => self
                    .transcript
                    .push(EntryKind::Error, reply.error.unwrap_or_default()),
            },
            Err(err) => self.transcript.push(EntryKind::Error, format!("{err:#}")),
        }
        self.scroll_to_bottom();
    }

    /// Abort outstanding requests before tearing the terminal down.
    pub fn abort_requests(&mut self) {
        if let Some(task) = self.upload_task.take() {
            task.abort();
        }
        if let Some(task) = self.ask_task.take() {
            task.abort();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.busy || self.ask_in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Transcript scrolling
    pub fn scroll_up(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self.rendered_line_count().saturating_sub(self.transcript_height);
        if self.transcript_scroll < max {
            self.transcript_scroll += 1;
        }
    }

    pub fn scroll_half_page_up(&mut self) {
        self.transcript_scroll = self
            .transcript_scroll
            .saturating_sub(self.transcript_height / 2);
    }

    pub fn scroll_half_page_down(&mut self) {
        let max = self.rendered_line_count().saturating_sub(self.transcript_height);
        self.transcript_scroll = (self.transcript_scroll + self.transcript_height / 2).min(max);
    }

    pub fn scroll_to_top(&mut self) {
        self.transcript_scroll = 0;
    }

    /// Scroll so the newest entry (and the waiting indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        let total = self.rendered_line_count();
        let visible = if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        };

        self.transcript_scroll = total.saturating_sub(visible);
    }

    /// Estimate how many wrapped lines the transcript occupies, using the
    /// panel width measured during the last render.
    fn rendered_line_count(&self) -> u16 {
        let wrap_width = if self.transcript_width > 0 {
            self.transcript_width as usize
        } else {
            60
        };

        let mut total: u16 = 0;
        for entry in self.transcript.entries() {
            // Label prefix ("Q: ", "❌ ") adds a few cells to the first line.
            // Use character count, not byte length, for proper UTF-8 handling.
            let char_count = entry.text.chars().count() + 3;
            total += ((char_count / wrap_width) + 1) as u16;
            total += 1; // Blank line after each entry
        }

        if self.ask_in_flight() {
            total += 1; // "Thinking..."
        }

        total
    }
}

fn flatten_join<T>(joined: Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    match joined {
        Ok(result) => result,
        Err(err) => Err(anyhow::Error::new(err).context("request task failed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn test_app(base_url: &str) -> App {
        App::new(BackendClient::new(base_url))
    }

    fn temp_pdf() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4 test").unwrap();
        file
    }

    async fn settle(app: &mut App) {
        // Wait for whichever request is outstanding, then apply it.
        if let Some(task) = app.upload_task.take() {
            let result = flatten_join(task.await);
            app.finish_upload(result);
        }
        if let Some(task) = app.ask_task.take() {
            let result = flatten_join(task.await);
            app.finish_ask(result);
        }
    }

    #[tokio::test]
    async fn test_upload_without_selected_file_is_noop() {
        let mut app = test_app("http://127.0.0.1:1");
        app.submit_upload();

        assert!(app.transcript.is_empty());
        assert!(!app.busy);
        assert!(app.upload_task.is_none());
    }

    #[tokio::test]
    async fn test_blank_question_is_noop() {
        let mut app = test_app("http://127.0.0.1:1");
        app.question_input = "   ".to_string();
        app.submit_question();

        assert!(app.transcript.is_empty());
        assert!(app.ask_task.is_none());
    }

    #[tokio::test]
    async fn test_upload_success_appends_info_then_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Indexed 10 pages"}"#)
            .create_async()
            .await;

        let file = temp_pdf();
        let mut app = test_app(&server.url());
        app.file_input = file.path().display().to_string();
        app.select_file();
        app.submit_upload();
        assert!(app.busy);

        settle(&mut app).await;

        let kinds: Vec<EntryKind> = app.transcript.entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Info, EntryKind::Success]);
        assert_eq!(app.transcript.last().unwrap().text, "Indexed 10 pages");
        assert!(!app.busy);
    }

    #[tokio::test]
    async fn test_upload_backend_error_appends_error_entry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"Unsupported file type"}"#)
            .create_async()
            .await;

        let file = temp_pdf();
        let mut app = test_app(&server.url());
        app.file_input = file.path().display().to_string();
        app.select_file();
        app.submit_upload();
        settle(&mut app).await;

        let last = app.transcript.last().unwrap();
        assert_eq!(last.kind, EntryKind::Error);
        assert_eq!(last.text, "Unsupported file type");
        assert!(!app.busy);
    }

    #[tokio::test]
    async fn test_transport_failure_resets_busy_and_reports() {
        // Nothing is listening here; the request itself fails.
        let file = temp_pdf();
        let mut app = test_app("http://127.0.0.1:1");
        app.file_input = file.path().display().to_string();
        app.select_file();
        app.submit_upload();
        assert!(app.busy);

        settle(&mut app).await;

        assert!(!app.busy);
        assert_eq!(app.transcript.last().unwrap().kind, EntryKind::Error);
    }

    #[tokio::test]
    async fn test_duplicate_upload_while_in_flight_is_noop() {
        let file = temp_pdf();
        let mut app = test_app("http://127.0.0.1:1");
        app.file_input = file.path().display().to_string();
        app.select_file();

        app.submit_upload();
        app.submit_upload();

        let infos = app
            .transcript
            .entries()
            .iter()
            .filter(|e| e.kind == EntryKind::Info)
            .count();
        assert_eq!(infos, 1);

        app.abort_requests();
    }

    #[tokio::test]
    async fn test_question_flow_appends_question_then_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/ask")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"answer":"30 days."}"#)
            .create_async()
            .await;

        let mut app = test_app(&server.url());
        app.question_input = "What is the refund policy?".to_string();
        app.submit_question();

        assert!(app.question_input.is_empty());
        assert_eq!(app.transcript.last().unwrap().kind, EntryKind::Question);
        assert_eq!(
            app.transcript.last().unwrap().text,
            "What is the refund policy?"
        );

        settle(&mut app).await;

        let kinds: Vec<EntryKind> = app.transcript.entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Question, EntryKind::Answer]);
        assert_eq!(app.transcript.last().unwrap().text, "30 days.");
    }

    #[tokio::test]
    async fn test_question_backend_error_appends_error_entry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/ask")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"No document indexed"}"#)
            .create_async()
            .await;

        let mut app = test_app(&server.url());
        app.question_input = "What is the refund policy?".to_string();
        app.submit_question();
        settle(&mut app).await;

        let kinds: Vec<EntryKind> = app.transcript.entries().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Question, EntryKind::Error]);
        assert_eq!(app.transcript.last().unwrap().text, "No document indexed");
    }

    #[tokio::test]
    async fn test_reply_missing_both_fields_renders_empty_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let file = temp_pdf();
        let mut app = test_app(&server.url());
        app.file_input = file.path().display().to_string();
        app.select_file();
        app.submit_upload();
        settle(&mut app).await;

        let last = app.transcript.last().unwrap();
        assert_eq!(last.kind, EntryKind::Success);
        assert_eq!(last.text, "");
    }

    #[tokio::test]
    async fn test_select_file_replaces_previous_selection() {
        let mut app = test_app("http://127.0.0.1:1");
        app.file_input = "first.pdf".to_string();
        app.select_file();
        assert_eq!(app.selected_file.as_deref(), Some(std::path::Path::new("first.pdf")));

        app.file_input = "  second.pdf  ".to_string();
        app.select_file();
        assert_eq!(app.selected_file.as_deref(), Some(std::path::Path::new("second.pdf")));

        // Blank field leaves the held file alone
        app.file_input = "   ".to_string();
        app.select_file();
        assert_eq!(app.selected_file.as_deref(), Some(std::path::Path::new("second.pdf")));
    }
}
