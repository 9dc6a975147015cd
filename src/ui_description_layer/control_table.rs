/*
 * Declarative routing of child-control notifications.
 *
 * A `ControlMessageTable` is an ordered list of `(class, control id, code)`
 * entries, each with a handler. The router consults the parent's table for every
 * child notification after the notification was reflected to the child itself.
 * Lookup is a linear scan from the start that stops at the first sentinel entry
 * (control id 0); the first exact match wins. A miss is not an error.
 *
 * The table also declares the child wrappers a dialog binds to its controls
 * when it initializes. Tables are built once and never mutated afterwards.
 */

use crate::platform_layer::types::{ControlEvent, ControlId, MessageClass};
use crate::ui_facade::context::DispatchContext;
use crate::ui_facade::window::WindowRef;

use std::fmt;
use std::rc::Weak;

pub type ControlHandlerFn = Box<dyn Fn(&mut DispatchContext, &ControlEvent)>;

pub struct ControlMessageEntry {
    pub class: MessageClass,
    pub control_id: ControlId,
    pub code: u32,
    handler: ControlHandlerFn,
}

impl ControlMessageEntry {
    pub fn is_sentinel(&self) -> bool {
        self.control_id.raw() == 0
    }

    fn matches(&self, class: MessageClass, control_id: ControlId, code: u32) -> bool {
        self.class == class && self.control_id == control_id && self.code == code
    }
}

impl fmt::Debug for ControlMessageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlMessageEntry")
            .field("class", &self.class)
            .field("control_id", &self.control_id)
            .field("code", &self.code)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct ControlMessageTable {
    entries: Vec<ControlMessageEntry>,
    children: Vec<(ControlId, WindowRef)>,
}

impl ControlMessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed builder whose handlers receive the owning wrapper.
    pub fn for_owner<T: 'static>(owner: Weak<T>) -> OwnedControlTable<T> {
        OwnedControlTable {
            owner,
            table: ControlMessageTable::new(),
        }
    }

    pub fn entry(
        mut self,
        class: MessageClass,
        control_id: ControlId,
        code: u32,
        handler: impl Fn(&mut DispatchContext, &ControlEvent) + 'static,
    ) -> Self {
        if control_id.raw() == 0 {
            log::warn!(
                "ControlMessageTable: Entry for {class:?} code {code} uses control id 0 and ends the table."
            );
        }
        self.entries.push(ControlMessageEntry {
            class,
            control_id,
            code,
            handler: Box::new(handler),
        });
        self
    }

    /// `WM_COMMAND` from control `control_id` with notification `code`.
    pub fn on_command(
        self,
        control_id: ControlId,
        code: u16,
        handler: impl Fn(&mut DispatchContext, &ControlEvent) + 'static,
    ) -> Self {
        self.entry(MessageClass::Command, control_id, u32::from(code), handler)
    }

    /// `WM_NOTIFY` from control `control_id` with notification `code`.
    pub fn on_notify(
        self,
        control_id: ControlId,
        code: u32,
        handler: impl Fn(&mut DispatchContext, &ControlEvent) + 'static,
    ) -> Self {
        self.entry(MessageClass::Notify, control_id, code, handler)
    }

    /// Declares a wrapper to bind to the dialog control `control_id` at initialization.
    pub fn child(mut self, control_id: ControlId, object: WindowRef) -> Self {
        self.children.push((control_id, object));
        self
    }

    /// Appends the sentinel; entries added after it are never reached.
    pub fn end(mut self) -> Self {
        self.entries.push(ControlMessageEntry {
            class: MessageClass::Command,
            control_id: ControlId::new(0),
            code: 0,
            handler: Box::new(|_, _| {}),
        });
        self
    }

    pub fn lookup(
        &self,
        class: MessageClass,
        control_id: ControlId,
        code: u32,
    ) -> Option<&ControlMessageEntry> {
        self.entries
            .iter()
            .take_while(|entry| !entry.is_sentinel())
            .find(|entry| entry.matches(class, control_id, code))
    }

    /*
     * Runs the first matching handler. The message counts as handled with result
     * 0 unless the handler sets another result or calls `mark_unhandled`.
     * Returns whether the message ended up handled.
     */
    pub fn dispatch(&self, ctx: &mut DispatchContext, event: &ControlEvent) -> bool {
        match self.lookup(event.class, event.control_id, event.code) {
            Some(entry) => {
                log::trace!(
                    "ControlMessageTable: {:?} {:?} code {} matched.",
                    event.class,
                    event.control_id,
                    event.code
                );
                ctx.set_handled(0);
                (entry.handler)(ctx, event);
                ctx.is_handled()
            }
            None => false,
        }
    }

    pub fn children(&self) -> &[(ControlId, WindowRef)] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ControlMessageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlMessageTable")
            .field("entries", &self.entries)
            .field(
                "children",
                &self.children.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

pub type OwnedControlHandler<T> = fn(&T, &mut DispatchContext, &ControlEvent);

/*
 * Builds a table whose handlers are plain functions of the owner. The owner is
 * held weakly; once it is gone its entries decline every message.
 */
pub struct OwnedControlTable<T> {
    owner: Weak<T>,
    table: ControlMessageTable,
}

impl<T: 'static> OwnedControlTable<T> {
    pub fn entry(
        mut self,
        class: MessageClass,
        control_id: ControlId,
        code: u32,
        handler: OwnedControlHandler<T>,
    ) -> Self {
        let owner = self.owner.clone();
        self.table = self
            .table
            .entry(class, control_id, code, move |ctx, event| {
                match owner.upgrade() {
                    Some(owner) => handler(&owner, ctx, event),
                    None => ctx.mark_unhandled(),
                }
            });
        self
    }

    pub fn on_command(self, control_id: ControlId, code: u16, handler: OwnedControlHandler<T>) -> Self {
        self.entry(MessageClass::Command, control_id, u32::from(code), handler)
    }

    pub fn on_notify(self, control_id: ControlId, code: u32, handler: OwnedControlHandler<T>) -> Self {
        self.entry(MessageClass::Notify, control_id, code, handler)
    }

    pub fn child(mut self, control_id: ControlId, object: WindowRef) -> Self {
        self.table = self.table.child(control_id, object);
        self
    }

    pub fn end(mut self) -> Self {
        self.table = self.table.end();
        self
    }

    pub fn build(self) -> ControlMessageTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_layer::messages::{BN_CLICKED, WM_COMMAND};
    use crate::platform_layer::types::Message;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event(class: MessageClass, id: i32, code: u32) -> ControlEvent {
        ControlEvent {
            class,
            control_id: ControlId::new(id),
            code,
            source: None,
            message: Message::new(WM_COMMAND, 0, 0),
        }
    }

    fn recording_table(log: &Rc<RefCell<Vec<&'static str>>>) -> ControlMessageTable {
        let on_click = Rc::clone(log);
        let on_notify = Rc::clone(log);
        ControlMessageTable::new()
            .on_command(ControlId::new(101), BN_CLICKED, move |_, _| {
                on_click.borrow_mut().push("h1")
            })
            .on_notify(ControlId::new(101), 5, move |_, _| {
                on_notify.borrow_mut().push("h2")
            })
    }

    #[test]
    fn exact_match_on_class_id_and_code() {
        // Arrange
        let log = Rc::new(RefCell::new(Vec::new()));
        let table = recording_table(&log);
        let mut ctx = DispatchContext::new(Message::new(WM_COMMAND, 0, 0));

        // Act & Assert
        assert!(table.dispatch(&mut ctx, &event(MessageClass::Command, 101, 0)));
        assert!(table.dispatch(&mut ctx, &event(MessageClass::Notify, 101, 5)));
        assert!(!table.dispatch(&mut ctx, &event(MessageClass::Command, 999, 0)));
        assert!(!table.dispatch(&mut ctx, &event(MessageClass::Notify, 101, 0)));
        assert_eq!(*log.borrow(), vec!["h1", "h2"]);
    }

    #[test]
    fn first_match_wins_and_sentinel_ends_the_scan() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&log);
        let second = Rc::clone(&log);
        let hidden = Rc::clone(&log);
        let table = ControlMessageTable::new()
            .on_command(ControlId::new(7), 0, move |_, _| first.borrow_mut().push("first"))
            .on_command(ControlId::new(7), 0, move |_, _| second.borrow_mut().push("second"))
            .end()
            .on_command(ControlId::new(8), 0, move |_, _| hidden.borrow_mut().push("hidden"));
        let mut ctx = DispatchContext::new(Message::new(WM_COMMAND, 0, 0));

        assert!(table.dispatch(&mut ctx, &event(MessageClass::Command, 7, 0)));
        assert!(!table.dispatch(&mut ctx, &event(MessageClass::Command, 8, 0)));
        assert_eq!(*log.borrow(), vec!["first"]);
    }

    #[test]
    fn handler_may_decline_a_matched_message() {
        let table = ControlMessageTable::new()
            .on_command(ControlId::new(3), 0, |ctx, _| ctx.mark_unhandled());
        let mut ctx = DispatchContext::new(Message::new(WM_COMMAND, 0, 0));

        assert!(!table.dispatch(&mut ctx, &event(MessageClass::Command, 3, 0)));
        assert!(!ctx.is_handled());
    }

    struct Owner {
        clicks: RefCell<u32>,
    }

    impl Owner {
        fn on_click(&self, ctx: &mut DispatchContext, _event: &ControlEvent) {
            *self.clicks.borrow_mut() += 1;
            ctx.set_handled(42);
        }
    }

    #[test]
    fn owned_table_calls_through_to_the_owner() {
        let owner = Rc::new(Owner {
            clicks: RefCell::new(0),
        });
        let table = ControlMessageTable::for_owner(Rc::downgrade(&owner))
            .on_command(ControlId::new(12), BN_CLICKED, Owner::on_click)
            .build();
        let mut ctx = DispatchContext::new(Message::new(WM_COMMAND, 0, 0));

        assert!(table.dispatch(&mut ctx, &event(MessageClass::Command, 12, 0)));
        assert_eq!(ctx.outcome(), Some(42));
        assert_eq!(*owner.clicks.borrow(), 1);

        drop(owner);
        let mut ctx = DispatchContext::new(Message::new(WM_COMMAND, 0, 0));
        assert!(!table.dispatch(&mut ctx, &event(MessageClass::Command, 12, 0)));
    }
}
