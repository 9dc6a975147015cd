/*
 * The Win32 implementation of the native window contract.
 *
 * Every popup class is registered with `popup_trampoline` and every dialog is
 * created with `dialog_trampoline`; each converts the raw callback arguments and
 * forwards to the matching shared procedure. Handler panics are contained
 * inside those procedures, so nothing unwinds through the `extern "system"`
 * boundary.
 *
 * Inline dialog layouts are serialized into an in-memory DLGTEMPLATE. Resource
 * templates are loaded from the executable by ordinal.
 */

use super::error::{FacadeError, Result as FacadeResult};
use super::messages::{DS_SETFONT, WM_NCDESTROY, WS_CHILD};
use super::native::NativeWindowOperations;
use super::types::{
    CommandId, CommandUi, ControlId, CreateParams, DialogLayout, DialogTemplate, Handle, Message,
    Rect, WindowClass,
};
use crate::ui_facade::dialog::dialog_proc;
use crate::ui_facade::popup::popup_window_proc;

use std::cell::RefCell;
use std::ffi::c_void;
use std::mem::{align_of, size_of};

use windows::{
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM},
        Graphics::Gdi::{HBRUSH, InvalidateRect, MapWindowPoints},
        System::LibraryLoader::GetModuleHandleW,
        UI::Input::KeyboardAndMouse::{EnableWindow, IsWindowEnabled, SetFocus},
        UI::WindowsAndMessaging::*,
    },
    core::{HSTRING, PCWSTR, PWSTR},
};

thread_local! {
    // Modeless dialogs that need IsDialogMessage in the top-level loop.
    static MODELESS_DIALOGS: RefCell<Vec<Handle>> = const { RefCell::new(Vec::new()) };
}

fn hwnd(handle: Handle) -> HWND {
    HWND(handle.raw() as *mut c_void)
}

fn handle_of(hwnd: HWND) -> Option<Handle> {
    Handle::from_raw(hwnd.0 as usize)
}

fn rect_from_native(rect: RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right, rect.bottom)
}

#[derive(Debug, Clone, Copy)]
pub struct Win32Native {
    h_instance: HINSTANCE,
}

impl Win32Native {
    pub fn new() -> FacadeResult<Self> {
        let module = unsafe { GetModuleHandleW(PCWSTR::null())? };
        Ok(Self {
            h_instance: HINSTANCE(module.0),
        })
    }

    // The backend as seen from inside a callback for `hwnd`.
    fn for_window(hwnd: HWND) -> Self {
        let instance = unsafe { GetWindowLongPtrW(hwnd, GWLP_HINSTANCE) };
        Self {
            h_instance: HINSTANCE(instance as *mut c_void),
        }
    }

    fn is_child(&self, handle: Handle) -> bool {
        let style = unsafe { GetWindowLongPtrW(hwnd(handle), GWL_STYLE) } as u32;
        style & WS_CHILD != 0
    }
}

unsafe extern "system" fn popup_trampoline(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let Some(handle) = handle_of(hwnd) else {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    };
    let native = Win32Native::for_window(hwnd);
    LRESULT(popup_window_proc(
        &native,
        handle,
        Message::new(msg, wparam.0, lparam.0),
    ))
}

unsafe extern "system" fn dialog_trampoline(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> isize {
    let Some(handle) = handle_of(hwnd) else {
        return 0;
    };
    if msg == WM_NCDESTROY {
        MODELESS_DIALOGS.with(|dialogs| dialogs.borrow_mut().retain(|h| *h != handle));
    }
    let native = Win32Native::for_window(hwnd);
    dialog_proc(&native, handle, Message::new(msg, wparam.0, lparam.0))
}

// Helper to push a WORD (u16) to a byte vector.
fn push_word(vec: &mut Vec<u8>, word: u16) {
    vec.extend_from_slice(&word.to_le_bytes());
}

// Helper to push a null-terminated UTF-16 string to a byte vector.
fn push_str_utf16(vec: &mut Vec<u8>, s: &str) {
    for c in s.encode_utf16() {
        push_word(vec, c);
    }
    push_word(vec, 0);
}

// Helper to align a byte vector to a DWORD (4-byte) boundary.
fn align_to_dword(vec: &mut Vec<u8>) {
    while vec.len() % align_of::<u32>() != 0 {
        vec.push(0);
    }
}

/*
 * Serializes a layout into DLGTEMPLATE format: the header, menu/class/title,
 * the font (DS_SETFONT is always set) and one DWORD-aligned DLGITEMTEMPLATE per
 * item. The result is returned as DWORDs so the buffer itself is aligned.
 */
fn build_dialog_template(layout: &DialogLayout) -> Vec<u32> {
    let mut bytes = Vec::new();
    let header = DLGTEMPLATE {
        style: layout.style | DS_SETFONT,
        dwExtendedStyle: 0,
        cdit: layout.items.len() as u16,
        x: 0,
        y: 0,
        cx: layout.size.width as i16,
        cy: layout.size.height as i16,
    };
    bytes.extend_from_slice(unsafe {
        &*(std::ptr::addr_of!(header) as *const [u8; size_of::<DLGTEMPLATE>()])
    });
    push_word(&mut bytes, 0); // No menu
    push_word(&mut bytes, 0); // Default dialog class
    push_str_utf16(&mut bytes, &layout.title);
    push_word(&mut bytes, layout.font_size);
    push_str_utf16(&mut bytes, &layout.font_name);

    for item in &layout.items {
        align_to_dword(&mut bytes);
        let item_template = DLGITEMTEMPLATE {
            style: item.style,
            dwExtendedStyle: 0,
            x: item.rect.left as i16,
            y: item.rect.top as i16,
            cx: item.rect.width() as i16,
            cy: item.rect.height() as i16,
            id: item.id.raw() as u16,
        };
        bytes.extend_from_slice(unsafe {
            &*(std::ptr::addr_of!(item_template) as *const [u8; size_of::<DLGITEMTEMPLATE>()])
        });
        push_str_utf16(&mut bytes, &item.class_name);
        push_str_utf16(&mut bytes, &item.text);
        push_word(&mut bytes, 0); // No creation data
    }
    align_to_dword(&mut bytes);

    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn resource_name(id: u16) -> PCWSTR {
    // MAKEINTRESOURCEW
    PCWSTR(id as usize as *const u16)
}

impl NativeWindowOperations for Win32Native {
    fn class_registered(&self, class_name: &str) -> bool {
        let name = HSTRING::from(class_name);
        let mut info = WNDCLASSEXW::default();
        unsafe { GetClassInfoExW(Some(self.h_instance), PCWSTR(name.as_ptr()), &mut info).is_ok() }
    }

    fn register_class(&self, class: &WindowClass) -> FacadeResult<()> {
        let name = HSTRING::from(class.name.as_str());
        let background = class
            .background_color
            .map_or(HBRUSH::default(), |color| HBRUSH((color + 1) as isize as *mut c_void));
        unsafe {
            let wc = WNDCLASSEXW {
                cbSize: size_of::<WNDCLASSEXW>() as u32,
                style: WNDCLASS_STYLES(class.style),
                lpfnWndProc: Some(popup_trampoline),
                cbClsExtra: 0,
                cbWndExtra: 0,
                hInstance: self.h_instance,
                hIcon: LoadIconW(None, IDI_APPLICATION)?,
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                hbrBackground: background,
                lpszMenuName: PCWSTR::null(),
                lpszClassName: PCWSTR(name.as_ptr()),
                hIconSm: LoadIconW(None, IDI_APPLICATION)?,
            };
            if RegisterClassExW(&wc) == 0 {
                return Err(FacadeError::ClassRegistrationFailed(format!(
                    "RegisterClassExW failed for '{}': {:?}",
                    class.name,
                    windows::core::Error::from_win32()
                )));
            }
        }
        Ok(())
    }

    fn create_window(
        &self,
        class_name: &str,
        params: &CreateParams,
        create_param: isize,
    ) -> FacadeResult<Handle> {
        let (x, y, width, height) = match params.rect {
            Some(rect) => (rect.left, rect.top, rect.width(), rect.height()),
            None => (CW_USEDEFAULT, CW_USEDEFAULT, CW_USEDEFAULT, CW_USEDEFAULT),
        };
        let menu = (params.menu_or_id != 0).then(|| HMENU(params.menu_or_id as *mut c_void));
        let created = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(params.ex_style),
                &HSTRING::from(class_name),
                &HSTRING::from(params.title.as_str()),
                WINDOW_STYLE(params.style),
                x,
                y,
                width,
                height,
                params.parent.map(hwnd),
                menu,
                Some(self.h_instance),
                Some(create_param as *const c_void),
            )
        };
        match created {
            Ok(created) => handle_of(created).ok_or_else(|| {
                FacadeError::WindowCreationFailed("CreateWindowExW returned null".to_string())
            }),
            Err(e) => Err(FacadeError::WindowCreationFailed(format!(
                "CreateWindowExW for '{class_name}' failed: {e}"
            ))),
        }
    }

    fn default_window_proc(&self, handle: Handle, message: Message) -> isize {
        unsafe {
            DefWindowProcW(
                hwnd(handle),
                message.id,
                WPARAM(message.wparam),
                LPARAM(message.lparam),
            )
            .0
        }
    }

    fn create_dialog(
        &self,
        template: &DialogTemplate,
        owner: Option<Handle>,
        init_param: isize,
    ) -> FacadeResult<Handle> {
        let created = match template {
            DialogTemplate::Inline(layout) => {
                let buffer = build_dialog_template(layout);
                unsafe {
                    CreateDialogIndirectParamW(
                        Some(self.h_instance),
                        buffer.as_ptr() as *const DLGTEMPLATE,
                        owner.map(hwnd),
                        Some(dialog_trampoline),
                        LPARAM(init_param),
                    )
                }
            }
            DialogTemplate::Resource(id) => unsafe {
                CreateDialogParamW(
                    Some(self.h_instance),
                    resource_name(*id),
                    owner.map(hwnd),
                    Some(dialog_trampoline),
                    LPARAM(init_param),
                )
            },
        };
        let handle = created
            .ok()
            .and_then(handle_of)
            .ok_or_else(|| FacadeError::DialogCreationFailed(format!("{template:?}")))?;
        MODELESS_DIALOGS.with(|dialogs| dialogs.borrow_mut().push(handle));
        Ok(handle)
    }

    fn dialog_box(
        &self,
        template: &DialogTemplate,
        owner: Option<Handle>,
        init_param: isize,
    ) -> FacadeResult<isize> {
        let result = match template {
            DialogTemplate::Inline(layout) => {
                let buffer = build_dialog_template(layout);
                unsafe {
                    DialogBoxIndirectParamW(
                        Some(self.h_instance),
                        buffer.as_ptr() as *const DLGTEMPLATE,
                        owner.map(hwnd),
                        Some(dialog_trampoline),
                        LPARAM(init_param),
                    )
                }
            }
            DialogTemplate::Resource(id) => unsafe {
                DialogBoxParamW(
                    Some(self.h_instance),
                    resource_name(*id),
                    owner.map(hwnd),
                    Some(dialog_trampoline),
                    LPARAM(init_param),
                )
            },
        };
        if result == -1 {
            return Err(FacadeError::DialogCreationFailed(format!(
                "{template:?}: {:?}",
                windows::core::Error::from_win32()
            )));
        }
        Ok(result)
    }

    fn end_dialog(&self, handle: Handle, code: isize) -> FacadeResult<()> {
        unsafe { EndDialog(hwnd(handle), code)? };
        Ok(())
    }

    fn set_dialog_message_result(&self, handle: Handle, result: isize) {
        // DWLP_MSGRESULT
        unsafe { SetWindowLongPtrW(hwnd(handle), WINDOW_LONG_PTR_INDEX(0), result) };
    }

    fn destroy_window(&self, handle: Handle) -> FacadeResult<()> {
        unsafe { DestroyWindow(hwnd(handle))? };
        Ok(())
    }

    fn is_window(&self, handle: Handle) -> bool {
        unsafe { IsWindow(Some(hwnd(handle))).as_bool() }
    }

    fn send_message(&self, handle: Handle, message: Message) -> isize {
        unsafe {
            SendMessageW(
                hwnd(handle),
                message.id,
                Some(WPARAM(message.wparam)),
                Some(LPARAM(message.lparam)),
            )
            .0
        }
    }

    fn post_message(&self, handle: Handle, message: Message) -> FacadeResult<()> {
        unsafe {
            PostMessageW(
                Some(hwnd(handle)),
                message.id,
                WPARAM(message.wparam),
                LPARAM(message.lparam),
            )?
        };
        Ok(())
    }

    fn show_window(&self, handle: Handle, visible: bool) -> bool {
        let cmd = if visible { SW_SHOW } else { SW_HIDE };
        unsafe { ShowWindow(hwnd(handle), cmd).as_bool() }
    }

    fn is_visible(&self, handle: Handle) -> bool {
        unsafe { IsWindowVisible(hwnd(handle)).as_bool() }
    }

    fn enable_window(&self, handle: Handle, enabled: bool) -> bool {
        unsafe { EnableWindow(hwnd(handle), enabled).as_bool() }
    }

    fn is_enabled(&self, handle: Handle) -> bool {
        unsafe { IsWindowEnabled(hwnd(handle)).as_bool() }
    }

    fn set_window_rect(&self, handle: Handle, rect: Rect) -> FacadeResult<()> {
        unsafe {
            SetWindowPos(
                hwnd(handle),
                None,
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                SWP_NOZORDER | SWP_NOACTIVATE,
            )?
        };
        Ok(())
    }

    fn window_rect(&self, handle: Handle) -> FacadeResult<Rect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd(handle), &mut rect)? };
        if self.is_child(handle) {
            if let Some(parent) = self.parent(handle) {
                let mut corners = [
                    POINT {
                        x: rect.left,
                        y: rect.top,
                    },
                    POINT {
                        x: rect.right,
                        y: rect.bottom,
                    },
                ];
                unsafe { MapWindowPoints(None, Some(hwnd(parent)), &mut corners) };
                return Ok(Rect::new(
                    corners[0].x,
                    corners[0].y,
                    corners[1].x,
                    corners[1].y,
                ));
            }
        }
        Ok(rect_from_native(rect))
    }

    fn client_rect(&self, handle: Handle) -> FacadeResult<Rect> {
        let mut rect = RECT::default();
        unsafe { GetClientRect(hwnd(handle), &mut rect)? };
        Ok(rect_from_native(rect))
    }

    fn set_window_text(&self, handle: Handle, text: &str) -> FacadeResult<()> {
        unsafe { SetWindowTextW(hwnd(handle), &HSTRING::from(text))? };
        Ok(())
    }

    fn window_text(&self, handle: Handle) -> FacadeResult<String> {
        let length = unsafe { GetWindowTextLengthW(hwnd(handle)) };
        if length <= 0 {
            return Ok(String::new());
        }
        let mut buffer = vec![0u16; length as usize + 1];
        let copied = unsafe { GetWindowTextW(hwnd(handle), &mut buffer) };
        Ok(String::from_utf16_lossy(&buffer[..copied.max(0) as usize]))
    }

    fn parent(&self, handle: Handle) -> Option<Handle> {
        unsafe { GetParent(hwnd(handle)) }.ok().and_then(handle_of)
    }

    fn dlg_item(&self, dialog: Handle, id: ControlId) -> Option<Handle> {
        unsafe { GetDlgItem(Some(hwnd(dialog)), id.raw()) }
            .ok()
            .and_then(handle_of)
    }

    fn control_id(&self, handle: Handle) -> Option<ControlId> {
        match unsafe { GetDlgCtrlID(hwnd(handle)) } {
            0 => None,
            id => Some(ControlId::new(id)),
        }
    }

    fn set_focus(&self, handle: Handle) -> FacadeResult<()> {
        unsafe { SetFocus(Some(hwnd(handle)))? };
        Ok(())
    }

    fn invalidate(&self, handle: Handle, erase: bool) -> FacadeResult<()> {
        if unsafe { InvalidateRect(Some(hwnd(handle)), None, erase) }.as_bool() {
            Ok(())
        } else {
            Err(FacadeError::OperationFailed(format!(
                "InvalidateRect failed for {handle:?}"
            )))
        }
    }

    fn set_timer(&self, handle: Handle, timer_id: usize, interval_ms: u32) -> FacadeResult<()> {
        if unsafe { SetTimer(Some(hwnd(handle)), timer_id, interval_ms, None) } == 0 {
            return Err(FacadeError::OperationFailed(format!(
                "SetTimer {timer_id} failed for {handle:?}"
            )));
        }
        Ok(())
    }

    fn kill_timer(&self, handle: Handle, timer_id: usize) -> FacadeResult<()> {
        unsafe { KillTimer(Some(hwnd(handle)), timer_id)? };
        Ok(())
    }

    fn work_area(&self) -> Rect {
        let mut area = RECT::default();
        let queried = unsafe {
            SystemParametersInfoW(
                SPI_GETWORKAREA,
                0,
                Some(&mut area as *mut RECT as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
        };
        if let Err(e) = queried {
            log::warn!("Win32Native: SPI_GETWORKAREA failed: {e}");
        }
        rect_from_native(area)
    }

    fn menu_item_ids(&self, menu: usize) -> Vec<CommandId> {
        let hmenu = HMENU(menu as *mut c_void);
        let count = unsafe { GetMenuItemCount(Some(hmenu)) };
        (0..count.max(0))
            .map(|position| unsafe { GetMenuItemID(hmenu, position) })
            // Separators report 0, submenus u32::MAX.
            .filter(|id| *id != 0 && *id != u32::MAX)
            .map(CommandId)
            .collect()
    }

    fn apply_menu_item_state(&self, menu: usize, id: CommandId, state: &CommandUi) {
        let hmenu = HMENU(menu as *mut c_void);
        let enable = if state.enabled { MF_ENABLED } else { MF_GRAYED };
        let check = if state.checked { MF_CHECKED } else { MF_UNCHECKED };
        unsafe {
            let _ = EnableMenuItem(hmenu, id.0, MF_BYCOMMAND | enable);
            let _ = CheckMenuItem(hmenu, id.0, (MF_BYCOMMAND | check).0);
        }
        if let Some(text) = &state.text {
            let mut wide: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
            let info = MENUITEMINFOW {
                cbSize: size_of::<MENUITEMINFOW>() as u32,
                fMask: MIIM_STRING,
                dwTypeData: PWSTR(wide.as_mut_ptr()),
                ..Default::default()
            };
            if let Err(e) = unsafe { SetMenuItemInfoW(hmenu, id.0, false, &info) } {
                log::warn!("Win32Native: Setting the text of menu item {id:?} failed: {e}");
            }
        }
    }

    fn run_message_loop(&self) -> i32 {
        let mut msg = MSG::default();
        loop {
            let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
            match status.0 {
                0 => return msg.wParam.0 as i32,
                -1 => {
                    log::error!(
                        "Win32Native: GetMessageW failed: {:?}",
                        windows::core::Error::from_win32()
                    );
                    return -1;
                }
                _ => {}
            }
            let dialog_message = MODELESS_DIALOGS.with(|dialogs| dialogs.borrow().clone())
                .into_iter()
                .any(|dialog| unsafe { IsDialogMessageW(hwnd(dialog), &msg) }.as_bool());
            if dialog_message {
                continue;
            }
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }

    fn post_quit(&self, exit_code: i32) {
        unsafe { PostQuitMessage(exit_code) };
    }

    fn show_error_message(&self, owner: Option<Handle>, title: &str, text: &str) {
        unsafe {
            MessageBoxW(
                owner.map(hwnd),
                &HSTRING::from(text),
                &HSTRING::from(title),
                MB_OK | MB_ICONERROR,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform_layer::messages::{BS_PUSHBUTTON, IDOK, WS_VISIBLE};
    use crate::platform_layer::types::Size;

    #[test]
    fn template_is_dword_aligned_and_counts_items() {
        let layout = DialogLayout::new("Sample", Size::new(120, 60)).item(
            ControlId::new(IDOK),
            "Button",
            "OK",
            Rect::new(10, 40, 60, 54),
            WS_CHILD | WS_VISIBLE | BS_PUSHBUTTON,
        );

        let template = build_dialog_template(&layout);
        let header = unsafe { std::ptr::read_unaligned(template.as_ptr() as *const DLGTEMPLATE) };

        assert_eq!({ header.cdit }, 1);
        assert_eq!({ header.cx }, 120);
        assert_ne!({ header.style } & DS_SETFONT, 0);
        assert!(!template.is_empty());
    }
}
