/*
 * An in-process implementation of the native window contract.
 *
 * `HeadlessNative` keeps its own window table and message queue and delivers
 * messages to the same two shared procedures the Win32 backend uses, in the
 * order the platform does: `WM_NCCREATE`/`WM_CREATE` during creation,
 * `WM_DESTROY` (parent before children) and `WM_NCDESTROY` (children before
 * parent) during destruction, `WM_INITDIALOG` for dialogs, and a nested pump for
 * modal dialogs. Dialog windows get the default dialog processing the platform
 * would apply, including the message-result slot and `WM_CLOSE` becoming
 * `IDCANCEL`.
 *
 * It backs non-Windows builds and the test suites. Helpers beyond the trait
 * simulate user input: control clicks and notifications, timer ticks, menus.
 *
 * No internal borrow is ever held while a message is delivered, so handlers may
 * call back into the backend freely.
 */

use super::error::{FacadeError, Result as FacadeResult};
use super::messages::*;
use super::native::NativeWindowOperations;
use super::types::{
    CommandId, CommandUi, ControlId, CreateParams, CreateStructPrefix, DialogLayout,
    DialogTemplate, Handle, Message, NotifyHeader, Point, Rect, Size, WindowClass,
};
use crate::ui_facade::dialog::dialog_proc;
use crate::ui_facade::popup::popup_window_proc;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::c_void;
use std::num::NonZeroUsize;

const FIRST_HANDLE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(0x0001_000F);
const HANDLE_STRIDE: usize = 4;
const FIRST_MENU: usize = 0x0002_0000;
const DEFAULT_WINDOW_RECT: Rect = Rect::new(64, 64, 704, 544);
const DEFAULT_WORK_AREA: Rect = Rect::new(0, 0, 1920, 1040);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowKind {
    /// Delivered to `popup_window_proc`.
    Popup,
    /// Delivered to `dialog_proc` with default dialog processing.
    Dialog,
    /// A predefined control; messages sent to it are ignored.
    Control,
}

#[derive(Debug, Default)]
struct DialogSlot {
    modal: bool,
    ended: Option<isize>,
    message_result: isize,
}

#[derive(Debug)]
struct HeadlessWindow {
    kind: WindowKind,
    class_name: String,
    text: String,
    /// Parent-client coordinates for child windows, screen coordinates otherwise.
    rect: Rect,
    parent: Option<Handle>,
    control_id: Option<ControlId>,
    visible: bool,
    enabled: bool,
    children: Vec<Handle>,
    destroying: bool,
    timers: HashMap<usize, u32>,
    dialog: Option<DialogSlot>,
}

impl HeadlessWindow {
    fn new(kind: WindowKind, class_name: &str, text: &str, rect: Rect, style: u32) -> Self {
        Self {
            kind,
            class_name: class_name.to_string(),
            text: text.to_string(),
            rect,
            parent: None,
            control_id: None,
            visible: style & WS_VISIBLE != 0,
            enabled: style & WS_DISABLED == 0,
            children: Vec::new(),
            destroying: false,
            timers: HashMap::new(),
            dialog: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Posted {
    /// `None` for thread messages (`WM_QUIT`).
    target: Option<Handle>,
    message: Message,
}

#[derive(Debug)]
pub struct HeadlessNative {
    windows: RefCell<HashMap<Handle, HeadlessWindow>>,
    next_handle: Cell<NonZeroUsize>,
    free_handles: RefCell<Vec<Handle>>,
    classes: RefCell<HashSet<String>>,
    queue: RefCell<VecDeque<Posted>>,
    resources: RefCell<HashMap<u16, DialogLayout>>,
    menus: RefCell<HashMap<usize, Vec<(CommandId, CommandUi)>>>,
    next_menu: Cell<usize>,
    focus: Cell<Option<Handle>>,
    work_area: Cell<Rect>,
    error_messages: RefCell<Vec<String>>,
}

impl Default for HeadlessNative {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessNative {
    pub fn new() -> Self {
        Self {
            windows: RefCell::new(HashMap::new()),
            next_handle: Cell::new(FIRST_HANDLE),
            free_handles: RefCell::new(Vec::new()),
            classes: RefCell::new(HashSet::new()),
            queue: RefCell::new(VecDeque::new()),
            resources: RefCell::new(HashMap::new()),
            menus: RefCell::new(HashMap::new()),
            next_menu: Cell::new(FIRST_MENU),
            focus: Cell::new(None),
            work_area: Cell::new(DEFAULT_WORK_AREA),
            error_messages: RefCell::new(Vec::new()),
        }
    }

    /// Makes `DialogTemplate::Resource(id)` resolve to `layout`.
    pub fn define_resource(&self, id: u16, layout: DialogLayout) {
        self.resources.borrow_mut().insert(id, layout);
    }

    pub fn set_work_area(&self, area: Rect) {
        self.work_area.set(area);
    }

    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }

    pub fn pending_messages(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn class_name(&self, handle: Handle) -> Option<String> {
        self.windows
            .borrow()
            .get(&handle)
            .map(|window| window.class_name.clone())
    }

    pub fn focused(&self) -> Option<Handle> {
        self.focus.get()
    }

    /// Texts of the error boxes shown so far.
    pub fn error_messages(&self) -> Vec<String> {
        self.error_messages.borrow().clone()
    }

    pub fn has_timer(&self, handle: Handle, timer_id: usize) -> bool {
        self.windows
            .borrow()
            .get(&handle)
            .is_some_and(|window| window.timers.contains_key(&timer_id))
    }

    /// Creates a predefined control (e.g. "Button") inside `parent`.
    pub fn create_control(
        &self,
        parent: Handle,
        id: ControlId,
        class_name: &str,
        rect: Rect,
    ) -> FacadeResult<Handle> {
        if !self.is_window(parent) {
            return Err(FacadeError::InvalidHandle(format!("{parent:?}")));
        }
        let mut control = HeadlessWindow::new(
            WindowKind::Control,
            class_name,
            "",
            rect,
            WS_CHILD | WS_VISIBLE,
        );
        control.control_id = Some(id);
        Ok(self.insert_window(control, Some(parent)))
    }

    /// Sends the parent the `BN_CLICKED` command a button click produces.
    pub fn click(&self, control: Handle) -> FacadeResult<isize> {
        let (parent, id) = self.control_origin(control)?;
        let wparam = make_wparam(id.raw() as u16, BN_CLICKED);
        Ok(self.send_message(parent, Message::new(WM_COMMAND, wparam, control.as_lparam())))
    }

    /// Sends the parent a `WM_NOTIFY` with `code` from `control`.
    pub fn notify(&self, control: Handle, code: u32) -> FacadeResult<isize> {
        let (parent, id) = self.control_origin(control)?;
        let header = NotifyHeader {
            hwnd_from: control.raw(),
            id_from: id.raw() as usize,
            code,
        };
        let lparam = &header as *const NotifyHeader as isize;
        Ok(self.send_message(parent, Message::new(WM_NOTIFY, id.raw() as usize, lparam)))
    }

    /// Sends a menu or accelerator command to `target`.
    pub fn invoke_command(&self, target: Handle, id: CommandId) -> isize {
        self.send_message(target, Message::new(WM_COMMAND, id.0 as usize, 0))
    }

    /// Delivers `WM_TIMER` if the timer is set.
    pub fn fire_timer(&self, handle: Handle, timer_id: usize) -> bool {
        if !self.has_timer(handle, timer_id) {
            return false;
        }
        self.send_message(handle, Message::new(WM_TIMER, timer_id, 0));
        true
    }

    /// Resizes the client area and delivers `WM_SIZE`.
    pub fn resize(&self, handle: Handle, client: Size) -> FacadeResult<()> {
        let rect = self.window_rect(handle)?;
        self.set_window_rect(handle, Rect::from_origin_size(rect.origin(), client))
    }

    pub fn create_menu(&self, items: &[CommandId]) -> usize {
        let menu = self.next_menu.get();
        self.next_menu.set(menu + HANDLE_STRIDE);
        let entries = items
            .iter()
            .map(|id| (*id, CommandUi::default()))
            .collect();
        self.menus.borrow_mut().insert(menu, entries);
        menu
    }

    /// Sends `WM_INITMENUPOPUP` as if `menu` were about to open over `owner`.
    pub fn open_menu(&self, owner: Handle, menu: usize) -> isize {
        self.send_message(owner, Message::new(WM_INITMENUPOPUP, menu, 0))
    }

    pub fn menu_item_state(&self, menu: usize, id: CommandId) -> Option<CommandUi> {
        self.menus.borrow().get(&menu).and_then(|items| {
            items
                .iter()
                .find(|(item, _)| *item == id)
                .map(|(_, state)| state.clone())
        })
    }

    fn control_origin(&self, control: Handle) -> FacadeResult<(Handle, ControlId)> {
        let windows = self.windows.borrow();
        let window = windows
            .get(&control)
            .ok_or_else(|| FacadeError::InvalidHandle(format!("{control:?}")))?;
        match (window.parent, window.control_id) {
            (Some(parent), Some(id)) => Ok((parent, id)),
            _ => Err(FacadeError::OperationFailed(format!(
                "{control:?} is not a child control"
            ))),
        }
    }

    fn allocate_handle(&self) -> Handle {
        if let Some(handle) = self.free_handles.borrow_mut().pop() {
            return handle;
        }
        let raw = self.next_handle.get();
        self.next_handle.set(raw.saturating_add(HANDLE_STRIDE));
        Handle::from_non_zero(raw)
    }

    fn insert_window(&self, mut window: HeadlessWindow, parent: Option<Handle>) -> Handle {
        let handle = self.allocate_handle();
        window.parent = parent;
        let mut windows = self.windows.borrow_mut();
        if let Some(parent) = parent.and_then(|parent| windows.get_mut(&parent)) {
            parent.children.push(handle);
        }
        windows.insert(handle, window);
        handle
    }

    fn with_window<R>(
        &self,
        handle: Handle,
        f: impl FnOnce(&mut HeadlessWindow) -> R,
    ) -> FacadeResult<R> {
        self.windows
            .borrow_mut()
            .get_mut(&handle)
            .map(f)
            .ok_or_else(|| FacadeError::InvalidHandle(format!("{handle:?}")))
    }

    fn kind_of(&self, handle: Handle) -> Option<WindowKind> {
        self.windows.borrow().get(&handle).map(|window| window.kind)
    }

    fn deliver(&self, handle: Handle, message: Message) -> isize {
        match self.kind_of(handle) {
            Some(WindowKind::Popup) => popup_window_proc(self, handle, message),
            Some(WindowKind::Dialog) => self.deliver_to_dialog(handle, message),
            Some(WindowKind::Control) | None => 0,
        }
    }

    /// The dialog procedure followed by the platform's default dialog processing.
    fn deliver_to_dialog(&self, handle: Handle, message: Message) -> isize {
        let _ = self.with_window(handle, |window| {
            if let Some(slot) = window.dialog.as_mut() {
                slot.message_result = 0;
            }
        });
        let handled = dialog_proc(self, handle, message);
        if dialog_returns_directly(message.id) {
            return handled;
        }
        if handled != 0 {
            return self
                .with_window(handle, |window| {
                    window.dialog.as_ref().map_or(0, |slot| slot.message_result)
                })
                .unwrap_or(0);
        }
        if message.id == WM_CLOSE {
            let cancel = self
                .dlg_item(handle, ControlId::new(IDCANCEL))
                .map_or(0, Handle::as_lparam);
            let wparam = make_wparam(IDCANCEL as u16, BN_CLICKED);
            let _ = self.post_message(handle, Message::new(WM_COMMAND, wparam, cancel));
        }
        0
    }

    fn send_size_and_move(&self, handle: Handle, old: Rect, new: Rect) {
        if old.origin() != new.origin() {
            let lparam = make_lparam(new.left as u16, new.top as u16);
            self.send_message(handle, Message::new(WM_MOVE, 0, lparam));
        }
        if old.size() != new.size() {
            let lparam = make_lparam(new.width() as u16, new.height() as u16);
            self.send_message(handle, Message::new(WM_SIZE, 0, lparam));
        }
    }

    /*
     * Instantiates a dialog and its controls, delivers WM_INITDIALOG and returns
     * the handle. One dialog unit maps to one pixel.
     */
    fn instantiate_dialog(
        &self,
        template: &DialogTemplate,
        owner: Option<Handle>,
        init_param: isize,
        modal: bool,
    ) -> FacadeResult<Handle> {
        let layout = match template {
            DialogTemplate::Inline(layout) => layout.clone(),
            DialogTemplate::Resource(id) => {
                self.resources.borrow().get(id).cloned().ok_or_else(|| {
                    FacadeError::DialogCreationFailed(format!("no dialog resource {id}"))
                })?
            }
        };

        let origin = owner
            .and_then(|owner| self.window_rect(owner).ok())
            .map_or(Point::default(), |rect| rect.origin());
        let style = if modal {
            layout.style | WS_VISIBLE
        } else {
            layout.style
        };
        let mut window = HeadlessWindow::new(
            WindowKind::Dialog,
            "#32770",
            &layout.title,
            Rect::from_origin_size(origin, layout.size),
            style,
        );
        window.dialog = Some(DialogSlot {
            modal,
            ..DialogSlot::default()
        });
        let handle = self.insert_window(window, owner);

        for item in &layout.items {
            let mut control = HeadlessWindow::new(
                WindowKind::Control,
                &item.class_name,
                &item.text,
                item.rect,
                item.style,
            );
            control.control_id = Some(item.id);
            self.insert_window(control, Some(handle));
        }

        log::trace!("HeadlessNative: Dialog {handle:?} created; sending WM_INITDIALOG.");
        self.send_message(handle, Message::new(WM_INITDIALOG, 0, init_param));
        Ok(handle)
    }

    fn dialog_ended(&self, handle: Handle) -> Option<isize> {
        self.windows
            .borrow()
            .get(&handle)
            .and_then(|window| window.dialog.as_ref())
            .and_then(|slot| slot.ended)
    }

    fn pop_posted(&self) -> Option<Posted> {
        self.queue.borrow_mut().pop_front()
    }

    fn dispatch_posted(&self, posted: Posted) {
        if let Some(target) = posted.target {
            self.deliver(target, posted.message);
        }
    }

    /*
     * The nested pump of a modal dialog. Returns the end code, or an error when
     * the queue runs dry (nothing could ever end the dialog) or the dialog is
     * destroyed without being ended.
     */
    fn modal_loop(&self, handle: Handle) -> FacadeResult<isize> {
        loop {
            if let Some(code) = self.dialog_ended(handle) {
                return Ok(code);
            }
            if !self.is_window(handle) {
                return Err(FacadeError::OperationFailed(format!(
                    "modal dialog {handle:?} was destroyed without being ended"
                )));
            }
            let Some(posted) = self.pop_posted() else {
                return Err(FacadeError::OperationFailed(format!(
                    "modal dialog {handle:?} has no messages left to process"
                )));
            };
            if posted.target.is_none() && posted.message.id == WM_QUIT {
                log::debug!("HeadlessNative: WM_QUIT inside modal loop; ending {handle:?}.");
                self.queue.borrow_mut().push_back(posted);
                return Ok(IDCANCEL as isize);
            }
            self.dispatch_posted(posted);
        }
    }
}

impl NativeWindowOperations for HeadlessNative {
    fn class_registered(&self, class_name: &str) -> bool {
        self.classes.borrow().contains(class_name)
    }

    fn register_class(&self, class: &WindowClass) -> FacadeResult<()> {
        if !self.classes.borrow_mut().insert(class.name.clone()) {
            return Err(FacadeError::ClassRegistrationFailed(format!(
                "class '{}' already exists",
                class.name
            )));
        }
        log::trace!("HeadlessNative: Registered class '{}'.", class.name);
        Ok(())
    }

    fn create_window(
        &self,
        class_name: &str,
        params: &CreateParams,
        create_param: isize,
    ) -> FacadeResult<Handle> {
        if !self.class_registered(class_name) {
            return Err(FacadeError::WindowCreationFailed(format!(
                "class '{class_name}' is not registered"
            )));
        }
        if let Some(parent) = params.parent {
            if !self.is_window(parent) {
                return Err(FacadeError::WindowCreationFailed(format!(
                    "parent {parent:?} does not exist"
                )));
            }
        }

        let mut window = HeadlessWindow::new(
            WindowKind::Popup,
            class_name,
            &params.title,
            params.rect.unwrap_or(DEFAULT_WINDOW_RECT),
            params.style,
        );
        if params.style & WS_CHILD != 0 {
            window.control_id = Some(ControlId::new(params.menu_or_id as i32));
        }
        let handle = self.insert_window(window, params.parent);

        let create_struct = CreateStructPrefix {
            create_params: create_param as *mut c_void,
        };
        let lparam = &create_struct as *const CreateStructPrefix as isize;

        if self.send_message(handle, Message::new(WM_NCCREATE, 0, lparam)) == 0 {
            self.send_message(handle, Message::new(WM_NCDESTROY, 0, 0));
            self.release(handle);
            return Err(FacadeError::WindowCreationFailed(
                "WM_NCCREATE rejected the window".to_string(),
            ));
        }
        if self.send_message(handle, Message::new(WM_CREATE, 0, lparam)) == -1 {
            let _ = self.destroy_window(handle);
            return Err(FacadeError::WindowCreationFailed(
                "WM_CREATE vetoed the window".to_string(),
            ));
        }

        let client = self.client_rect(handle)?;
        let size = make_lparam(client.width() as u16, client.height() as u16);
        self.send_message(handle, Message::new(WM_SIZE, 0, size));
        Ok(handle)
    }

    fn default_window_proc(&self, handle: Handle, message: Message) -> isize {
        match message.id {
            WM_NCCREATE => 1,
            WM_CLOSE => {
                let _ = self.destroy_window(handle);
                0
            }
            _ => 0,
        }
    }

    fn create_dialog(
        &self,
        template: &DialogTemplate,
        owner: Option<Handle>,
        init_param: isize,
    ) -> FacadeResult<Handle> {
        let handle = self.instantiate_dialog(template, owner, init_param, false)?;
        if !self.is_window(handle) {
            return Err(FacadeError::DialogCreationFailed(
                "dialog destroyed during initialization".to_string(),
            ));
        }
        Ok(handle)
    }

    fn dialog_box(
        &self,
        template: &DialogTemplate,
        owner: Option<Handle>,
        init_param: isize,
    ) -> FacadeResult<isize> {
        let owner_was_disabled = owner.map(|owner| self.enable_window(owner, false));
        let handle = self.instantiate_dialog(template, owner, init_param, true)?;
        let outcome = self.modal_loop(handle);
        if self.is_window(handle) {
            let _ = self.destroy_window(handle);
        }
        if let (Some(owner), Some(false)) = (owner, owner_was_disabled) {
            self.enable_window(owner, true);
        }
        outcome
    }

    fn end_dialog(&self, handle: Handle, code: isize) -> FacadeResult<()> {
        self.with_window(handle, |window| match window.dialog.as_mut() {
            Some(slot) if slot.modal => {
                slot.ended = Some(code);
                Ok(())
            }
            _ => Err(FacadeError::OperationFailed(format!(
                "{handle:?} is not a modal dialog"
            ))),
        })?
    }

    fn set_dialog_message_result(&self, handle: Handle, result: isize) {
        let _ = self.with_window(handle, |window| {
            if let Some(slot) = window.dialog.as_mut() {
                slot.message_result = result;
            }
        });
    }

    fn destroy_window(&self, handle: Handle) -> FacadeResult<()> {
        let first_request = self.with_window(handle, |window| {
            !std::mem::replace(&mut window.destroying, true)
        })?;
        if !first_request {
            return Ok(());
        }

        self.send_message(handle, Message::new(WM_DESTROY, 0, 0));
        let children = self
            .with_window(handle, |window| window.children.clone())
            .unwrap_or_default();
        for child in children {
            let _ = self.destroy_window(child);
        }
        self.send_message(handle, Message::new(WM_NCDESTROY, 0, 0));
        self.release(handle);
        Ok(())
    }

    fn is_window(&self, handle: Handle) -> bool {
        self.windows.borrow().contains_key(&handle)
    }

    fn send_message(&self, handle: Handle, message: Message) -> isize {
        if !self.is_window(handle) {
            log::trace!("HeadlessNative: Dropping {:#06x} sent to dead {handle:?}.", message.id);
            return 0;
        }
        self.deliver(handle, message)
    }

    fn post_message(&self, handle: Handle, message: Message) -> FacadeResult<()> {
        if !self.is_window(handle) {
            return Err(FacadeError::InvalidHandle(format!("{handle:?}")));
        }
        self.queue.borrow_mut().push_back(Posted {
            target: Some(handle),
            message,
        });
        Ok(())
    }

    fn show_window(&self, handle: Handle, visible: bool) -> bool {
        self.with_window(handle, |window| std::mem::replace(&mut window.visible, visible))
            .unwrap_or(false)
    }

    fn is_visible(&self, handle: Handle) -> bool {
        self.windows
            .borrow()
            .get(&handle)
            .is_some_and(|window| window.visible)
    }

    fn enable_window(&self, handle: Handle, enabled: bool) -> bool {
        self.with_window(handle, |window| !std::mem::replace(&mut window.enabled, enabled))
            .unwrap_or(false)
    }

    fn is_enabled(&self, handle: Handle) -> bool {
        self.windows
            .borrow()
            .get(&handle)
            .is_some_and(|window| window.enabled)
    }

    fn set_window_rect(&self, handle: Handle, rect: Rect) -> FacadeResult<()> {
        let old = self.with_window(handle, |window| std::mem::replace(&mut window.rect, rect))?;
        self.send_size_and_move(handle, old, rect);
        Ok(())
    }

    fn window_rect(&self, handle: Handle) -> FacadeResult<Rect> {
        self.with_window(handle, |window| window.rect)
    }

    fn client_rect(&self, handle: Handle) -> FacadeResult<Rect> {
        let size = self.with_window(handle, |window| window.rect.size())?;
        Ok(Rect::from_origin_size(Point::default(), size))
    }

    fn set_window_text(&self, handle: Handle, text: &str) -> FacadeResult<()> {
        self.with_window(handle, |window| window.text = text.to_string())
    }

    fn window_text(&self, handle: Handle) -> FacadeResult<String> {
        self.with_window(handle, |window| window.text.clone())
    }

    fn parent(&self, handle: Handle) -> Option<Handle> {
        self.windows
            .borrow()
            .get(&handle)
            .and_then(|window| window.parent)
    }

    fn dlg_item(&self, dialog: Handle, id: ControlId) -> Option<Handle> {
        let windows = self.windows.borrow();
        windows.get(&dialog)?.children.iter().copied().find(|child| {
            windows
                .get(child)
                .is_some_and(|window| window.control_id == Some(id))
        })
    }

    fn control_id(&self, handle: Handle) -> Option<ControlId> {
        self.windows
            .borrow()
            .get(&handle)
            .and_then(|window| window.control_id)
    }

    fn set_focus(&self, handle: Handle) -> FacadeResult<()> {
        if !self.is_window(handle) {
            return Err(FacadeError::InvalidHandle(format!("{handle:?}")));
        }
        let previous = self.focus.replace(Some(handle));
        if previous == Some(handle) {
            return Ok(());
        }
        if let Some(previous) = previous {
            self.send_message(previous, Message::new(WM_KILLFOCUS, handle.raw(), 0));
        }
        let previous_raw = previous.map_or(0, Handle::raw);
        self.send_message(handle, Message::new(WM_SETFOCUS, previous_raw, 0));
        Ok(())
    }

    fn invalidate(&self, handle: Handle, _erase: bool) -> FacadeResult<()> {
        let already_pending = self.queue.borrow().iter().any(|posted| {
            posted.target == Some(handle) && posted.message.id == WM_PAINT
        });
        if already_pending {
            return Ok(());
        }
        self.post_message(handle, Message::new(WM_PAINT, 0, 0))
    }

    fn set_timer(&self, handle: Handle, timer_id: usize, interval_ms: u32) -> FacadeResult<()> {
        self.with_window(handle, |window| {
            window.timers.insert(timer_id, interval_ms);
        })
    }

    fn kill_timer(&self, handle: Handle, timer_id: usize) -> FacadeResult<()> {
        self.with_window(handle, |window| window.timers.remove(&timer_id))?
            .map(|_| ())
            .ok_or_else(|| FacadeError::OperationFailed(format!("no timer {timer_id} on {handle:?}")))
    }

    fn work_area(&self) -> Rect {
        self.work_area.get()
    }

    fn menu_item_ids(&self, menu: usize) -> Vec<CommandId> {
        self.menus
            .borrow()
            .get(&menu)
            .map(|items| items.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    fn apply_menu_item_state(&self, menu: usize, id: CommandId, state: &CommandUi) {
        if let Some(items) = self.menus.borrow_mut().get_mut(&menu) {
            for (item, current) in items.iter_mut() {
                if *item == id {
                    *current = state.clone();
                }
            }
        }
    }

    fn run_message_loop(&self) -> i32 {
        while let Some(posted) = self.pop_posted() {
            if posted.target.is_none() && posted.message.id == WM_QUIT {
                log::debug!("HeadlessNative: WM_QUIT received; leaving the message loop.");
                return posted.message.wparam as i32;
            }
            self.dispatch_posted(posted);
        }
        log::debug!("HeadlessNative: Message queue drained; leaving the message loop.");
        0
    }

    fn post_quit(&self, exit_code: i32) {
        self.queue.borrow_mut().push_back(Posted {
            target: None,
            message: Message::new(WM_QUIT, exit_code as usize, 0),
        });
    }

    fn show_error_message(&self, _owner: Option<Handle>, title: &str, text: &str) {
        log::error!("HeadlessNative: Error box '{title}': {text}");
        self.error_messages.borrow_mut().push(text.to_string());
    }
}

impl HeadlessNative {
    // Drops every trace of a destroyed window and recycles its handle.
    fn release(&self, handle: Handle) {
        let removed = self.windows.borrow_mut().remove(&handle);
        if let Some(parent) = removed.as_ref().and_then(|window| window.parent) {
            let _ = self.with_window(parent, |window| window.children.retain(|c| *c != handle));
        }
        self.queue
            .borrow_mut()
            .retain(|posted| posted.target != Some(handle));
        if self.focus.get() == Some(handle) {
            self.focus.set(None);
        }
        self.free_handles.borrow_mut().push(handle);
    }
}
