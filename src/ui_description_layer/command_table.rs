/*
 * Declarative routing of application commands (menu items, accelerators,
 * toolbar buttons).
 *
 * A `CommandDispatchTable` is an ordered list of entries, each covering one
 * command id or an inclusive id range, with optional execute and update-UI
 * handlers, a toolbar icon index and a menu hint. Every query is a linear scan
 * that stops at the first sentinel. The first entry covering the id decides,
 * even when it lacks the requested handler. A miss returns `false`/`None`.
 *
 * `CommandChain` strings several tables together (for example application
 * commands, then view commands) and stops at the first table that recognises
 * the id.
 */

use crate::platform_layer::types::{CommandId, CommandUi};

use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Ends the table.
    None,
    Single,
    Range,
}

pub type ExecFn = Box<dyn Fn(CommandId)>;
pub type UpdateFn = Box<dyn Fn(CommandId, &mut CommandUi)>;

pub struct CommandEntry {
    kind: CommandKind,
    first: CommandId,
    last: CommandId,
    exec: Option<ExecFn>,
    update: Option<UpdateFn>,
    icon: Option<u32>,
    hint: Option<String>,
}

impl CommandEntry {
    pub fn single(id: CommandId) -> Self {
        Self::with_kind(CommandKind::Single, id, id)
    }

    /// Inclusive range. Reversed bounds are swapped; equal bounds make a single entry.
    pub fn range(first: CommandId, last: CommandId) -> Self {
        if first == last {
            return Self::single(first);
        }
        if first > last {
            log::warn!(
                "CommandDispatchTable: Range {first:?}..={last:?} is reversed; swapping bounds."
            );
            return Self::with_kind(CommandKind::Range, last, first);
        }
        Self::with_kind(CommandKind::Range, first, last)
    }

    pub fn sentinel() -> Self {
        Self::with_kind(CommandKind::None, CommandId(0), CommandId(0))
    }

    fn with_kind(kind: CommandKind, first: CommandId, last: CommandId) -> Self {
        Self {
            kind,
            first,
            last,
            exec: None,
            update: None,
            icon: None,
            hint: None,
        }
    }

    pub fn on_exec(mut self, handler: impl Fn(CommandId) + 'static) -> Self {
        self.exec = Some(Box::new(handler));
        self
    }

    pub fn on_update(mut self, handler: impl Fn(CommandId, &mut CommandUi) + 'static) -> Self {
        self.update = Some(Box::new(handler));
        self
    }

    pub fn icon(mut self, index: u32) -> Self {
        self.icon = Some(index);
        self
    }

    /// Status-bar help text shown while the menu item is highlighted.
    pub fn hint(mut self, text: impl Into<String>) -> Self {
        self.hint = Some(text.into());
        self
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn first(&self) -> CommandId {
        self.first
    }

    pub fn last(&self) -> CommandId {
        self.last
    }

    pub fn matches(&self, id: CommandId) -> bool {
        match self.kind {
            CommandKind::None => false,
            CommandKind::Single => self.first == id,
            CommandKind::Range => (self.first..=self.last).contains(&id),
        }
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("kind", &self.kind)
            .field("first", &self.first)
            .field("last", &self.last)
            .field("exec", &self.exec.is_some())
            .field("update", &self.update.is_some())
            .field("icon", &self.icon)
            .field("hint", &self.hint)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct CommandDispatchTable {
    entries: Vec<CommandEntry>,
}

impl CommandDispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_owner<T: 'static>(owner: Weak<T>) -> OwnedCommandTable<T> {
        OwnedCommandTable {
            owner,
            table: CommandDispatchTable::new(),
        }
    }

    pub fn entry(mut self, entry: CommandEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn end(self) -> Self {
        self.entry(CommandEntry::sentinel())
    }

    fn live_entries(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries
            .iter()
            .take_while(|entry| entry.kind != CommandKind::None)
    }

    /// First entry covering `id`, whatever it carries.
    pub fn find(&self, id: CommandId) -> Option<&CommandEntry> {
        self.live_entries().find(|entry| entry.matches(id))
    }

    pub fn recognises(&self, id: CommandId) -> bool {
        self.find(id).is_some()
    }

    pub fn execute(&self, id: CommandId) -> bool {
        let Some(handler) = self.find(id).and_then(|entry| entry.exec.as_ref()) else {
            return false;
        };
        log::debug!("CommandDispatchTable: Executing {id:?}.");
        handler(id);
        true
    }

    pub fn update_ui(&self, id: CommandId, state: &mut CommandUi) -> bool {
        match self.find(id).and_then(|entry| entry.update.as_ref()) {
            Some(handler) => {
                handler(id, state);
                true
            }
            None => false,
        }
    }

    pub fn icon_index(&self, id: CommandId) -> Option<u32> {
        self.find(id).and_then(|entry| entry.icon)
    }

    pub fn hint(&self, id: CommandId) -> Option<&str> {
        self.find(id).and_then(|entry| entry.hint.as_deref())
    }
}

pub type OwnedExecHandler<T> = fn(&T, CommandId);
pub type OwnedUpdateHandler<T> = fn(&T, CommandId, &mut CommandUi);

/// Builds a table whose handlers are plain functions of a weakly held owner.
pub struct OwnedCommandTable<T> {
    owner: Weak<T>,
    table: CommandDispatchTable,
}

impl<T: 'static> OwnedCommandTable<T> {
    pub fn single(
        self,
        id: CommandId,
        exec: Option<OwnedExecHandler<T>>,
        update: Option<OwnedUpdateHandler<T>>,
    ) -> Self {
        let entry = CommandEntry::single(id);
        self.bind(entry, exec, update)
    }

    pub fn range(
        self,
        first: CommandId,
        last: CommandId,
        exec: Option<OwnedExecHandler<T>>,
        update: Option<OwnedUpdateHandler<T>>,
    ) -> Self {
        let entry = CommandEntry::range(first, last);
        self.bind(entry, exec, update)
    }

    /// Adds a prepared entry as-is (icons, hints, closure handlers).
    pub fn entry(mut self, entry: CommandEntry) -> Self {
        self.table = self.table.entry(entry);
        self
    }

    fn bind(
        mut self,
        mut entry: CommandEntry,
        exec: Option<OwnedExecHandler<T>>,
        update: Option<OwnedUpdateHandler<T>>,
    ) -> Self {
        if let Some(exec) = exec {
            let owner = self.owner.clone();
            entry = entry.on_exec(move |id| {
                if let Some(owner) = owner.upgrade() {
                    exec(&owner, id);
                }
            });
        }
        if let Some(update) = update {
            let owner = self.owner.clone();
            entry = entry.on_update(move |id, state| {
                if let Some(owner) = owner.upgrade() {
                    update(&owner, id, state);
                }
            });
        }
        self.table = self.table.entry(entry);
        self
    }

    pub fn end(mut self) -> Self {
        self.table = self.table.end();
        self
    }

    pub fn build(self) -> CommandDispatchTable {
        self.table
    }
}

/// Several command tables consulted in order.
#[derive(Debug, Default, Clone)]
pub struct CommandChain {
    tables: Vec<Rc<CommandDispatchTable>>,
}

impl CommandChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: Rc<CommandDispatchTable>) {
        self.tables.push(table);
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The first table with an entry covering `id`; later tables are never asked.
    pub fn table_for(&self, id: CommandId) -> Option<&CommandDispatchTable> {
        self.tables
            .iter()
            .map(Rc::as_ref)
            .find(|table| table.recognises(id))
    }

    pub fn execute(&self, id: CommandId) -> bool {
        self.table_for(id).is_some_and(|table| table.execute(id))
    }

    pub fn update_ui(&self, id: CommandId, state: &mut CommandUi) -> bool {
        self.table_for(id)
            .is_some_and(|table| table.update_ui(id, state))
    }

    pub fn icon_index(&self, id: CommandId) -> Option<u32> {
        self.table_for(id).and_then(|table| table.icon_index(id))
    }

    pub fn hint(&self, id: CommandId) -> Option<&str> {
        self.table_for(id).and_then(|table| table.hint(id))
    }
}
