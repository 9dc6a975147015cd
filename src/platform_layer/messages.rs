/*
 * Message identifiers, notification codes and style bits of the native window
 * protocol, plus the word-splitting helpers used to decode message parameters.
 * The values match the Win32 headers so the Win32 backend can pass messages
 * through unchanged and the headless backend speaks the same protocol.
 */

pub const WM_NULL: u32 = 0x0000;
pub const WM_CREATE: u32 = 0x0001;
pub const WM_DESTROY: u32 = 0x0002;
pub const WM_MOVE: u32 = 0x0003;
pub const WM_SIZE: u32 = 0x0005;
pub const WM_SETFOCUS: u32 = 0x0007;
pub const WM_KILLFOCUS: u32 = 0x0008;
pub const WM_SETTEXT: u32 = 0x000C;
pub const WM_GETTEXT: u32 = 0x000D;
pub const WM_PAINT: u32 = 0x000F;
pub const WM_CLOSE: u32 = 0x0010;
pub const WM_QUIT: u32 = 0x0012;
pub const WM_ERASEBKGND: u32 = 0x0014;
pub const WM_GETMINMAXINFO: u32 = 0x0024;
pub const WM_DRAWITEM: u32 = 0x002B;
pub const WM_VKEYTOITEM: u32 = 0x002E;
pub const WM_CHARTOITEM: u32 = 0x002F;
pub const WM_QUERYDRAGICON: u32 = 0x0037;
pub const WM_COMPAREITEM: u32 = 0x0039;
pub const WM_NOTIFY: u32 = 0x004E;
pub const WM_CONTEXTMENU: u32 = 0x007B;
pub const WM_NCCREATE: u32 = 0x0081;
pub const WM_NCDESTROY: u32 = 0x0082;
pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;
pub const WM_CHAR: u32 = 0x0102;
pub const WM_INITDIALOG: u32 = 0x0110;
pub const WM_COMMAND: u32 = 0x0111;
pub const WM_TIMER: u32 = 0x0113;
pub const WM_HSCROLL: u32 = 0x0114;
pub const WM_VSCROLL: u32 = 0x0115;
pub const WM_INITMENUPOPUP: u32 = 0x0117;
pub const WM_CTLCOLORMSGBOX: u32 = 0x0132;
pub const WM_CTLCOLOREDIT: u32 = 0x0133;
pub const WM_CTLCOLORLISTBOX: u32 = 0x0134;
pub const WM_CTLCOLORBTN: u32 = 0x0135;
pub const WM_CTLCOLORDLG: u32 = 0x0136;
pub const WM_CTLCOLORSCROLLBAR: u32 = 0x0137;
pub const WM_CTLCOLORSTATIC: u32 = 0x0138;
pub const WM_MOUSEMOVE: u32 = 0x0200;
pub const WM_LBUTTONDOWN: u32 = 0x0201;
pub const WM_LBUTTONUP: u32 = 0x0202;
pub const WM_LBUTTONDBLCLK: u32 = 0x0203;
pub const WM_RBUTTONDOWN: u32 = 0x0204;
pub const WM_RBUTTONUP: u32 = 0x0205;
pub const WM_RBUTTONDBLCLK: u32 = 0x0206;
pub const WM_MBUTTONDOWN: u32 = 0x0207;
pub const WM_MBUTTONUP: u32 = 0x0208;
pub const WM_MBUTTONDBLCLK: u32 = 0x0209;
pub const WM_MOUSEWHEEL: u32 = 0x020A;
pub const WM_USER: u32 = 0x0400;
pub const WM_APP: u32 = 0x8000;
// Application-defined messages end here; registered messages start at 0xC000.
pub const WM_APP_LAST: u32 = 0xBFFF;

// Dialog end codes / standard command ids.
pub const IDOK: i32 = 1;
pub const IDCANCEL: i32 = 2;
pub const IDABORT: i32 = 3;
pub const IDRETRY: i32 = 4;
pub const IDIGNORE: i32 = 5;
pub const IDYES: i32 = 6;
pub const IDNO: i32 = 7;

// Button notification codes.
pub const BN_CLICKED: u16 = 0;

// Window styles.
pub const WS_OVERLAPPED: u32 = 0x0000_0000;
pub const WS_POPUP: u32 = 0x8000_0000;
pub const WS_CHILD: u32 = 0x4000_0000;
pub const WS_VISIBLE: u32 = 0x1000_0000;
pub const WS_DISABLED: u32 = 0x0800_0000;
pub const WS_CLIPCHILDREN: u32 = 0x0200_0000;
pub const WS_CAPTION: u32 = 0x00C0_0000;
pub const WS_BORDER: u32 = 0x0080_0000;
pub const WS_SYSMENU: u32 = 0x0008_0000;
pub const WS_THICKFRAME: u32 = 0x0004_0000;
pub const WS_TABSTOP: u32 = 0x0001_0000;
pub const WS_MINIMIZEBOX: u32 = 0x0002_0000;
pub const WS_MAXIMIZEBOX: u32 = 0x0001_0000;
pub const WS_OVERLAPPEDWINDOW: u32 = WS_OVERLAPPED
    | WS_CAPTION
    | WS_SYSMENU
    | WS_THICKFRAME
    | WS_MINIMIZEBOX
    | WS_MAXIMIZEBOX;

// Dialog styles.
pub const DS_MODALFRAME: u32 = 0x0080;
pub const DS_SETFONT: u32 = 0x0040;
pub const DS_CENTER: u32 = 0x0800;

// Class styles.
pub const CS_VREDRAW: u32 = 0x0001;
pub const CS_HREDRAW: u32 = 0x0002;

pub const COLOR_WINDOW: i32 = 5;

// Button styles.
pub const BS_PUSHBUTTON: u32 = 0x0000;
pub const BS_DEFPUSHBUTTON: u32 = 0x0001;

/// Splits a packed `wparam` into its low word.
#[inline]
pub fn loword_from_wparam(wparam: usize) -> u16 {
    (wparam & 0xFFFF) as u16
}

#[inline]
pub fn hiword_from_wparam(wparam: usize) -> u16 {
    ((wparam >> 16) & 0xFFFF) as u16
}

#[inline]
pub fn loword_from_lparam(lparam: isize) -> u16 {
    (lparam & 0xFFFF) as u16
}

#[inline]
pub fn hiword_from_lparam(lparam: isize) -> u16 {
    ((lparam >> 16) & 0xFFFF) as u16
}

/// Packs two words the way `MAKEWPARAM` does.
#[inline]
pub fn make_wparam(low: u16, high: u16) -> usize {
    (low as usize) | ((high as usize) << 16)
}

#[inline]
pub fn make_lparam(low: u16, high: u16) -> isize {
    ((low as u32) | ((high as u32) << 16)) as i32 as isize
}

pub fn is_ctl_color(message_id: u32) -> bool {
    (WM_CTLCOLORMSGBOX..=WM_CTLCOLORSTATIC).contains(&message_id)
}

/*
 * Dialog procedures return their result directly for these messages instead of
 * storing it in the dialog's message-result slot and returning TRUE.
 */
pub fn dialog_returns_directly(message_id: u32) -> bool {
    matches!(
        message_id,
        WM_INITDIALOG
            | WM_COMPAREITEM
            | WM_VKEYTOITEM
            | WM_CHARTOITEM
            | WM_QUERYDRAGICON
    ) || is_ctl_color(message_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_round_trip_through_packed_params() {
        let wparam = make_wparam(101, 5);
        assert_eq!(loword_from_wparam(wparam), 101);
        assert_eq!(hiword_from_wparam(wparam), 5);

        let lparam = make_lparam(640, 480);
        assert_eq!(loword_from_lparam(lparam), 640);
        assert_eq!(hiword_from_lparam(lparam), 480);
    }

    #[test]
    fn ctl_color_and_direct_return_messages() {
        assert!(is_ctl_color(WM_CTLCOLORBTN));
        assert!(!is_ctl_color(WM_COMMAND));
        assert!(dialog_returns_directly(WM_INITDIALOG));
        assert!(dialog_returns_directly(WM_CTLCOLORSTATIC));
        assert!(!dialog_returns_directly(WM_NOTIFY));
    }
}
