//! Three-column task board.
//!
//! The whole board is written to the store under [`STORAGE_KEY`] after every
//! mutation, as one JSON object keyed by column name. Storage failures are
//! logged; the in-memory board stays authoritative.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::store::KeyValueStore;

pub const STORAGE_KEY: &str = "tasks";

pub type BoardResult<T = ()> = Result<T, BoardError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    IndexOutOfRange { column: Column, index: usize, len: usize },
    UnknownColumn(String),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::IndexOutOfRange { column, index, len } => {
                write!(f, "no task at {column}[{index}] (column has {len})")
            }
            BoardError::UnknownColumn(name) => write!(f, "unknown column: {name}"),
        }
    }
}

impl std::error::Error for BoardError {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Todo,
    InProgress,
    Completed,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Todo, Column::InProgress, Column::Completed];

    pub fn name(self) -> &'static str {
        match self {
            Column::Todo => "todo",
            Column::InProgress => "inProgress",
            Column::Completed => "completed",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "todo" => Ok(Column::Todo),
            "inprogress" | "doing" => Ok(Column::InProgress),
            "completed" | "done" => Ok(Column::Completed),
            _ => Err(BoardError::UnknownColumn(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Columns {
    #[serde(default)]
    todo: Vec<Task>,
    #[serde(default)]
    in_progress: Vec<Task>,
    #[serde(default)]
    completed: Vec<Task>,
}

impl Columns {
    fn get(&self, c: Column) -> &Vec<Task> {
        match c {
            Column::Todo => &self.todo,
            Column::InProgress => &self.in_progress,
            Column::Completed => &self.completed,
        }
    }

    fn get_mut(&mut self, c: Column) -> &mut Vec<Task> {
        match c {
            Column::Todo => &mut self.todo,
            Column::InProgress => &mut self.in_progress,
            Column::Completed => &mut self.completed,
        }
    }

    fn max_id(&self) -> u64 {
        Column::ALL.iter().flat_map(|c| self.get(*c)).map(|t| t.id).max().unwrap_or(0)
    }
}

pub struct Board<S: KeyValueStore> {
    columns: Columns,
    store: S,
    last_id: u64,
}

impl<S: KeyValueStore> fmt::Debug for Board<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board").field("columns", &self.columns).field("last_id", &self.last_id).finish()
    }
}

impl<S: KeyValueStore> Board<S> {
    /// Rehydrate from `store`. A missing or unreadable entry gives an empty
    /// board.
    pub fn load(store: S) -> Self {
        let columns = match store.get(STORAGE_KEY) {
            None => Columns::default(),
            Some(raw) => match serde_json::from_str::<Columns>(&raw) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!(target: "board", "ignoring malformed stored tasks: {e}");
                    Columns::default()
                }
            },
        };
        let last_id = columns.max_id();
        Self { columns, store, last_id }
    }

    pub fn column(&self, column: Column) -> &[Task] { self.columns.get(column) }

    pub fn len(&self) -> usize { Column::ALL.iter().map(|c| self.columns.get(*c).len()).sum() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn store(&self) -> &S { &self.store }

    /// New task at the top of `todo`. Blank text is ignored and gives `None`.
    pub fn add(&mut self, text: &str) -> Option<u64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let id = self.next_id();
        self.columns.todo.insert(0, Task { id, text: text.to_string() });
        log::debug!(target: "board", "added task {id}");
        self.persist();
        Some(id)
    }

    /// Remove task `id` from `column`. Returns whether anything was removed.
    pub fn remove(&mut self, id: u64, column: Column) -> bool {
        let tasks = self.columns.get_mut(column);
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        let removed = tasks.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    pub fn clear_all(&mut self) {
        self.columns = Columns::default();
        log::info!(target: "board", "cleared all tasks");
        self.persist();
    }

    /// Take the task at `src[src_index]` and insert it at `dst[dst_index]`.
    ///
    /// The destination index is clamped to the column length. Moving a task
    /// onto its own position is a no-op.
    pub fn reorder(&mut self, src: Column, src_index: usize, dst: Column, dst_index: usize) -> BoardResult {
        let len = self.columns.get(src).len();
        if src_index >= len {
            return Err(BoardError::IndexOutOfRange { column: src, index: src_index, len });
        }
        if src == dst && src_index == dst_index {
            return Ok(());
        }
        let task = self.columns.get_mut(src).remove(src_index);
        let target = self.columns.get_mut(dst);
        let at = dst_index.min(target.len());
        target.insert(at, task);
        self.persist();
        Ok(())
    }

    fn next_id(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        self.last_id = now.max(self.last_id.saturating_add(1));
        self.last_id
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.columns) {
            Ok(j) => j,
            Err(e) => {
                log::error!(target: "board", "could not encode tasks: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(STORAGE_KEY, &json) {
            log::warn!(target: "board", "could not save tasks: {e}");
        }
    }
}
