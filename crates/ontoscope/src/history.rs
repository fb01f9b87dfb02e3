//! Undo/redo history with batches.
//!
//! The undo stack stores inverse commands: executing a command pushes the
//! command that reverses it. Undoing pops that inverse, runs it, and pushes
//! the inverse of the inverse onto the redo stack.
//!
//! # Batches
//!
//! [`History::start_batch`] opens a batch. While at least one batch is open,
//! every executed or registered command lands in the innermost batch instead
//! of the undo stack. [`History::store_batch`] closes the batch as a single
//! compound step; [`History::discard_batch`] rolls every command of the batch
//! back in reverse order and records nothing.

mod command;

pub use command::{Command, RestoreGeometry};

use log::{debug, trace};
use thiserror::Error;

use ontoscope_core::events::{EventSource, Events};

use crate::model::Graph;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("no batch is open")]
    NoOpenBatch,

    #[error("cannot {0} while a batch is open")]
    BatchInProgress(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryEvent {
    Changed { can_undo: bool, can_redo: bool },
}

#[derive(Debug)]
struct Batch {
    title: String,
    inverses: Vec<Command>,
}

#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    batches: Vec<Batch>,
    source: EventSource<HistoryEvent>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Events<HistoryEvent> {
        self.source.events()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_title(&self) -> Option<&str> {
        self.undo_stack.last().map(Command::title)
    }

    pub fn redo_title(&self) -> Option<&str> {
        self.redo_stack.last().map(Command::title)
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_batch_open(&self) -> bool {
        !self.batches.is_empty()
    }

    /// Runs `command` and records its inverse.
    pub fn execute(&mut self, graph: &mut Graph, command: Command) {
        trace!(title = command.title(); "Executing command");
        let inverse = command.invoke(graph);
        self.push_undo(inverse);
    }

    /// Records an already-applied change; `undo` is the command reverting it.
    pub fn register_to_undo(&mut self, undo: Command) {
        self.push_undo(undo);
    }

    fn push_undo(&mut self, inverse: Command) {
        if let Some(batch) = self.batches.last_mut() {
            batch.inverses.push(inverse);
            return;
        }
        self.undo_stack.push(inverse);
        self.redo_stack.clear();
        self.notify();
    }

    pub fn undo(&mut self, graph: &mut Graph) -> Result<bool, HistoryError> {
        if self.is_batch_open() {
            return Err(HistoryError::BatchInProgress("undo"));
        }
        let Some(command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        debug!(title = command.title(); "Undo");
        let redo = command.invoke(graph);
        self.redo_stack.push(redo);
        self.notify();
        Ok(true)
    }

    pub fn redo(&mut self, graph: &mut Graph) -> Result<bool, HistoryError> {
        if self.is_batch_open() {
            return Err(HistoryError::BatchInProgress("redo"));
        }
        let Some(command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        debug!(title = command.title(); "Redo");
        let undo = command.invoke(graph);
        self.undo_stack.push(undo);
        self.notify();
        Ok(true)
    }

    pub fn start_batch(&mut self, title: impl Into<String>) {
        let title = title.into();
        debug!(title = title.as_str(), depth = self.batches.len(); "Starting batch");
        self.batches.push(Batch {
            title,
            inverses: Vec::new(),
        });
    }

    /// Closes the innermost batch as one undo step. An empty batch records nothing.
    pub fn store_batch(&mut self) -> Result<(), HistoryError> {
        let batch = self.batches.pop().ok_or(HistoryError::NoOpenBatch)?;
        if batch.inverses.is_empty() {
            trace!(title = batch.title.as_str(); "Dropping empty batch");
            return Ok(());
        }
        let mut inverses = batch.inverses;
        inverses.reverse();
        self.push_undo(Command::compound(batch.title, inverses));
        Ok(())
    }

    /// Closes the innermost batch, rolling back everything executed in it.
    pub fn discard_batch(&mut self, graph: &mut Graph) -> Result<(), HistoryError> {
        let batch = self.batches.pop().ok_or(HistoryError::NoOpenBatch)?;
        debug!(title = batch.title.as_str(), commands = batch.inverses.len(); "Discarding batch");
        for inverse in batch.inverses.into_iter().rev() {
            inverse.invoke(graph);
        }
        Ok(())
    }

    /// Forgets every recorded step and open batch.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batches.clear();
        self.notify();
    }

    fn notify(&self) {
        self.source.trigger(&HistoryEvent::Changed {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        });
    }
}
