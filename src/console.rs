//! "Run Code" executor: hands a message's code to the user's console.
//!
//! The payload goes on the system clipboard and into a scratch file the
//! user can run or open in an editor.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use arboard::Clipboard;

use crate::delegate::chat::ActionCallback;
use crate::error::{KueError, KueResult};
use crate::model::Message;

pub struct CodeConsole {
    scratch_file: PathBuf,
    use_clipboard: bool,
    // Kept alive: on X11 the clipboard contents disappear with their owner.
    clipboard: RefCell<Option<Clipboard>>,
}

impl CodeConsole {
    pub fn new(scratch_file: PathBuf, use_clipboard: bool) -> Self {
        Self {
            scratch_file,
            use_clipboard,
            clipboard: RefCell::new(None),
        }
    }

    pub fn scratch_file(&self) -> &Path {
        &self.scratch_file
    }

    fn copy_to_clipboard(&self, text: &str) -> KueResult<()> {
        let mut slot = self.clipboard.borrow_mut();
        if slot.is_none() {
            *slot = Some(Clipboard::new().map_err(|e| KueError::backend("clipboard", e))?);
        }
        if let Some(clipboard) = slot.as_mut() {
            clipboard
                .set_text(text.to_string())
                .map_err(|e| KueError::backend("clipboard", e))?;
        }
        Ok(())
    }
}

pub fn write_scratch(path: &Path, payload: &str) -> KueResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| KueError::backend("console", e))?;
    }
    fs::write(path, payload).map_err(|e| KueError::backend("console", e))
}

impl ActionCallback for CodeConsole {
    fn deliver(&self, msg: &Message) -> KueResult<()> {
        let payload = msg.action_payload();
        if payload.trim().is_empty() {
            return Err(KueError::Input("code block is empty".to_string()));
        }
        write_scratch(&self.scratch_file, payload)?;
        if self.use_clipboard {
            self.copy_to_clipboard(payload)?;
        }
        tracing::info!(
            bytes = payload.len(),
            scratch = %self.scratch_file.display(),
            clipboard = self.use_clipboard,
            "code delivered to console"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_deliver_writes_code_block() {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("nested").join("scratch.py");
        let console = CodeConsole::new(scratch.clone(), false);

        let msg = Message::assistant("Here:\n```python\nprint(1)\n```");
        console.deliver(&msg).unwrap();

        assert_eq!(fs::read_to_string(&scratch).unwrap(), "print(1)\n");
        assert_eq!(console.scratch_file(), scratch.as_path());
    }

    #[test]
    fn test_deliver_whole_text_without_fence() {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("scratch.py");
        let console = CodeConsole::new(scratch.clone(), false);

        console.deliver(&Message::system("x = 1")).unwrap();
        assert_eq!(fs::read_to_string(&scratch).unwrap(), "x = 1");
    }

    #[test]
    fn test_empty_code_block_is_input_error() {
        let dir = TempDir::new().unwrap();
        let console = CodeConsole::new(dir.path().join("scratch.py"), false);
        let err = console.deliver(&Message::assistant("```python\n```")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
        assert!(!console.scratch_file().exists());
    }
}
