//! Row records for the two panel lists.
//!
//! Records are built once and never mutated; the delegates paint straight
//! from them without asking any backend again.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::paths;

/// The sender of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
    Error,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
            Role::Error => "Error",
        }
    }
}

/// A chat transcript entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    text: String,
    has_action: bool,
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```[^\n]*\n([\s\S]*?)```").expect("fence pattern is valid"))
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>, has_action: bool) -> Self {
        Self {
            role,
            text: text.into(),
            has_action,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text, false)
    }

    /// Assistant replies that carry a fenced code block get a "Run Code" control.
    pub fn assistant(text: impl Into<String>) -> Self {
        let text = text.into();
        let has_action = code_fence().is_match(&text);
        Self::new(Role::Assistant, text, has_action)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text, false)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Role::Error, text, false)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_action(&self) -> bool {
        self.has_action
    }

    /// What "Run Code" hands to the executor: the first fenced block, else the whole text.
    pub fn action_payload(&self) -> &str {
        code_fence()
            .captures(&self.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or(&self.text)
    }
}

/// Ordered, append-only chat history
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Message> {
        self.messages.get(idx)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.text())
    }

    /// Serialized history handed to the chat transport.
    pub fn history(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::Error)
            .map(|m| format!("{}: {}", m.role.label(), m.text))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Vector,
    Raster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconCategory {
    Point,
    Line,
    Polygon,
    Raster,
}

impl IconCategory {
    pub fn for_kinds(file_kind: FileKind, geometry_kind: GeometryKind) -> Self {
        match (file_kind, geometry_kind) {
            (FileKind::Raster, _) => IconCategory::Raster,
            (FileKind::Vector, GeometryKind::Point) => IconCategory::Point,
            (FileKind::Vector, GeometryKind::LineString) => IconCategory::Line,
            (FileKind::Vector, _) => IconCategory::Polygon,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            IconCategory::Point => "•",
            IconCategory::Line => "╱",
            IconCategory::Polygon => "▰",
            IconCategory::Raster => "▦",
        }
    }
}

/// One result as the search backend reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub path: PathBuf,
    pub access_time: String,
    pub file_kind: FileKind,
    pub geometry_kind: GeometryKind,
    pub location: String,
}

/// A find list row, path already in `~` display form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindResultRow {
    path: String,
    access_time: String,
    file_kind: FileKind,
    geometry_kind: GeometryKind,
    location_label: String,
}

impl FindResultRow {
    pub fn from_hit(hit: SearchHit, home: Option<&Path>) -> Self {
        let path = match home {
            Some(home) => paths::canonicalize_home(&hit.path, home),
            None => hit.path.display().to_string(),
        };
        Self {
            path,
            access_time: hit.access_time,
            file_kind: hit.file_kind,
            geometry_kind: hit.geometry_kind,
            location_label: hit.location,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn access_time(&self) -> &str {
        &self.access_time
    }

    pub fn location_label(&self) -> &str {
        &self.location_label
    }

    pub fn icon(&self) -> IconCategory {
        IconCategory::for_kinds(self.file_kind, self.geometry_kind)
    }

    pub fn directory(&self) -> &str {
        paths::display_dir(&self.path)
    }

    pub fn file_name(&self) -> &str {
        paths::display_file(&self.path)
    }

    /// Absolute path for file operations.
    pub fn resolved_path(&self, home: Option<&Path>) -> PathBuf {
        match home {
            Some(home) => paths::expand_home(&self.path, home),
            None => PathBuf::from(&self.path),
        }
    }
}
