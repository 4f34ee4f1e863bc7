use std::path::PathBuf;

use ratatui::layout::Rect;
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::delegate::{ChatDelegate, FileResultDelegate, ItemDelegate, PointerEvent};
use crate::error::{ErrorKind, KueError};
use crate::find::SearchBackend;
use crate::layers::SharedProject;
use crate::list_view::ListViewState;
use crate::model::{FindResultRow, Message, Transcript};
use crate::ollama::{ChatTransport, Reply};

/// Typing this prefix switches the panel to file search.
pub const FIND_PREFIX: &str = "/find ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Chat,
    Find,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Everything the panel talks to, built by `main` (or by tests with fakes).
pub struct Backends {
    pub search: Box<dyn SearchBackend>,
    pub transport: Box<dyn ChatTransport>,
    pub replies: Option<mpsc::UnboundedReceiver<Reply>>,
    pub chat_delegate: ChatDelegate,
    pub find_delegate: FileResultDelegate,
    pub project: SharedProject,
    pub home: Option<PathBuf>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub view: View,
    pub model_name: String,

    // Input line
    pub input: String,
    pub input_cursor: usize,

    // Chat transcript
    pub transcript: Transcript,
    pub chat_state: ListViewState,
    pub pending_replies: usize,
    pub animation_frame: u8,

    // Find results
    pub find_results: Vec<FindResultRow>,
    pub find_state: ListViewState,
    pub find_status: Option<String>,
    pub last_query: Option<String>,

    // Areas stored by the renderer for mouse hit-testing
    pub enter_button_area: Option<Rect>,

    pub chat_delegate: ChatDelegate,
    pub find_delegate: FileResultDelegate,
    pub project: SharedProject,

    search: Box<dyn SearchBackend>,
    transport: Box<dyn ChatTransport>,
    replies: Option<mpsc::UnboundedReceiver<Reply>>,
    home: Option<PathBuf>,
}

impl App {
    pub fn new(backends: Backends, model_name: &str) -> Self {
        Self {
            should_quit: false,
            view: View::Chat,
            model_name: model_name.to_string(),

            input: String::new(),
            input_cursor: 0,

            transcript: Transcript::new(),
            chat_state: ListViewState::following(),
            pending_replies: 0,
            animation_frame: 0,

            find_results: Vec::new(),
            find_state: ListViewState::default(),
            find_status: None,
            last_query: None,

            enter_button_area: None,

            chat_delegate: backends.chat_delegate,
            find_delegate: backends.find_delegate,
            project: backends.project,

            search: backends.search,
            transport: backends.transport,
            replies: backends.replies,
            home: backends.home,
        }
    }

    /// Runs after every edit of the input line, independent of submitting.
    pub fn on_text_changed(&mut self) {
        if let Some(query) = self.input.strip_prefix(FIND_PREFIX) {
            let query = query.to_string();
            self.view = View::Find;
            self.run_search(&query);
        } else {
            self.view = View::Chat;
        }
    }

    fn run_search(&mut self, query: &str) {
        // Stale rows go before the backend is asked, so a failure leaves an empty list.
        self.find_results.clear();
        self.find_state.reset();
        self.find_status = None;
        self.last_query = Some(query.to_string());

        match self.search.search(query) {
            Ok(hits) => {
                let home = self.home.as_deref();
                self.find_results
                    .extend(hits.into_iter().map(|hit| FindResultRow::from_hit(hit, home)));
                tracing::debug!(query, results = self.find_results.len(), "find results updated");
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "search failed");
                self.find_status = Some(e.to_string());
            }
        }
    }

    /// Enter: hand the text and the transcript so far to the chat transport.
    pub fn submit(&mut self) {
        let text = self.input.clone();
        if text.trim().is_empty() {
            return;
        }

        let history = self.transcript.history();
        self.append_message(Message::user(text.clone()));
        match self.transport.send(&text, &history) {
            Ok(()) => self.pending_replies += 1,
            Err(e) => self.report_error(e),
        }

        self.input.clear();
        self.input_cursor = 0;
        self.on_text_changed();
    }

    pub fn append_message(&mut self, msg: Message) {
        self.transcript.push(msg);
        self.chat_state.scroll_to_bottom();
    }

    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
        self.chat_state = ListViewState::following();
    }

    /// Up arrow on an empty input line brings back the last thing the user sent.
    pub fn recall_last_user_message(&mut self) {
        if !self.input.is_empty() {
            return;
        }
        if let Some(text) = self.transcript.last_user_text() {
            self.input = text.to_string();
            self.input_cursor = self.input.chars().count();
            self.on_text_changed();
        }
    }

    /// Move finished transport replies into the transcript.
    pub fn poll_transport(&mut self) {
        loop {
            let Some(rx) = self.replies.as_mut() else {
                return;
            };
            match rx.try_recv() {
                Ok(reply) => {
                    self.pending_replies = self.pending_replies.saturating_sub(1);
                    match reply {
                        Ok(text) => self.append_message(Message::assistant(text)),
                        Err(e) => self.report_error(e),
                    }
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("chat transport closed");
                    self.replies = None;
                    self.pending_replies = 0;
                    return;
                }
            }
        }
    }

    pub fn report_error(&mut self, err: KueError) {
        if err.kind() == ErrorKind::Input {
            tracing::debug!(error = %err, "ignored input");
            return;
        }
        tracing::warn!(kind = ?err.kind(), error = %err, "operation failed");
        self.append_message(Message::error(err.to_string()));
    }

    /// Route a primary-button event to the row under it. Rows get first
    /// refusal; an unconsumed press selects the row.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let outcome = match self.view {
            View::Chat => {
                let Some((index, rect, event)) = self.chat_state.hit(event) else {
                    return;
                };
                let Some(msg) = self.transcript.get(index) else {
                    return;
                };
                let outcome = self.chat_delegate.editor_event(msg, rect, event);
                if let Ok(false) = outcome {
                    self.chat_state.select(Some(index));
                }
                outcome
            }
            View::Find => {
                let Some((index, rect, event)) = self.find_state.hit(event) else {
                    return;
                };
                let Some(result) = self.find_results.get(index) else {
                    return;
                };
                let outcome = self.find_delegate.editor_event(result, rect, event);
                if let Ok(false) = outcome {
                    self.find_state.select(Some(index));
                }
                outcome
            }
        };

        if let Err(e) = outcome {
            self.report_error(e);
        }
    }

    /// Keyboard equivalent of double-clicking the selected find result.
    pub fn open_selected_result(&mut self) {
        if self.view != View::Find {
            return;
        }
        let Some(result) = self.find_state.selected().and_then(|i| self.find_results.get(i)) else {
            return;
        };
        if let Err(e) = self.find_delegate.open_row(result) {
            self.report_error(e);
        }
    }

    pub fn tick_animation(&mut self) {
        if self.pending_replies > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input line editing. Every edit re-runs the view switch.

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
        self.on_text_changed();
    }

    pub fn backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
            self.on_text_changed();
        }
    }

    pub fn delete(&mut self) {
        let char_count = self.input.chars().count();
        if self.input_cursor < char_count {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
            self.on_text_changed();
        }
    }

    pub fn clear_input(&mut self) {
        if self.input.is_empty() {
            return;
        }
        self.input.clear();
        self.input_cursor = 0;
        self.on_text_changed();
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input.chars().count();
    }
}
