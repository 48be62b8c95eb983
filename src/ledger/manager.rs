use crate::errors::Result;

use super::book::AccountBook;
use super::command::{Command, Receipt};

/// Linear undo stack over executed commands.
///
/// `cursor` points at the newest executed, not-yet-undone command; `None` means nothing
/// is undoable. Commands past the cursor are undone and get discarded by the next
/// successful execution.
#[derive(Debug, Default)]
pub struct TransactionManager {
    commands: Vec<Command>,
    cursor: Option<usize>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes `command` and makes it the new top of the stack.
    ///
    /// A failed execution returns the error and leaves the stack exactly as it was. A
    /// command that was already executed posts nothing and is not recorded.
    pub fn execute_command(&mut self, mut command: Command, book: &mut AccountBook) -> Result<Receipt> {
        let receipt = command.execute(book)?;
        if receipt.is_empty() {
            return Ok(receipt);
        }
        let retained = self.cursor.map_or(0, |cursor| cursor + 1);
        self.commands.truncate(retained);
        self.commands.push(command);
        self.cursor = Some(retained);
        tracing::debug!(kind = %receipt.kind, depth = retained + 1, "command recorded");
        Ok(receipt)
    }

    /// Undoes the command at the cursor and steps the cursor back.
    pub fn undo_last(&mut self, book: &mut AccountBook) -> bool {
        let Some(cursor) = self.cursor else {
            return false;
        };
        let reversed = self.commands[cursor].undo(book);
        if !reversed {
            tracing::debug!(position = cursor, "command at cursor could not be reversed");
        }
        self.cursor = cursor.checked_sub(1);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    /// Commands up to and including the cursor, oldest first.
    pub fn history(&self) -> &[Command] {
        match self.cursor {
            Some(cursor) => &self.commands[..=cursor],
            None => &[],
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of undoable commands.
    pub fn len(&self) -> usize {
        self.history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_none()
    }
}
