//! Virtual key code <-> key name conversion.
//!
//! Both input streams name keys through `key_name`, so a key seen by the raw
//! device observer and the same key seen by the global hook always share a name.
//! `vk_from_name` is the lookup used by key-combination actions and accepts the
//! short aliases users type (`Ctrl`, `Enter`, `1`) as well as the logical names.

pub const VK_BACK: u16 = 0x08;
pub const VK_TAB: u16 = 0x09;
pub const VK_RETURN: u16 = 0x0D;
pub const VK_SHIFT: u16 = 0x10;
pub const VK_CONTROL: u16 = 0x11;
pub const VK_MENU: u16 = 0x12;
pub const VK_PAUSE: u16 = 0x13;
pub const VK_CAPITAL: u16 = 0x14;
pub const VK_ESCAPE: u16 = 0x1B;
pub const VK_SPACE: u16 = 0x20;
pub const VK_PRIOR: u16 = 0x21;
pub const VK_NEXT: u16 = 0x22;
pub const VK_END: u16 = 0x23;
pub const VK_HOME: u16 = 0x24;
pub const VK_LEFT: u16 = 0x25;
pub const VK_UP: u16 = 0x26;
pub const VK_RIGHT: u16 = 0x27;
pub const VK_DOWN: u16 = 0x28;
pub const VK_SNAPSHOT: u16 = 0x2C;
pub const VK_INSERT: u16 = 0x2D;
pub const VK_DELETE: u16 = 0x2E;
pub const VK_LWIN: u16 = 0x5B;
pub const VK_RWIN: u16 = 0x5C;
pub const VK_APPS: u16 = 0x5D;
pub const VK_NUMPAD0: u16 = 0x60;
pub const VK_MULTIPLY: u16 = 0x6A;
pub const VK_ADD: u16 = 0x6B;
pub const VK_SUBTRACT: u16 = 0x6D;
pub const VK_DECIMAL: u16 = 0x6E;
pub const VK_DIVIDE: u16 = 0x6F;
pub const VK_F1: u16 = 0x70;
pub const VK_NUMLOCK: u16 = 0x90;
pub const VK_SCROLL: u16 = 0x91;
pub const VK_LSHIFT: u16 = 0xA0;
pub const VK_RSHIFT: u16 = 0xA1;
pub const VK_LCONTROL: u16 = 0xA2;
pub const VK_RCONTROL: u16 = 0xA3;
pub const VK_LMENU: u16 = 0xA4;
pub const VK_RMENU: u16 = 0xA5;
pub const VK_OEM_1: u16 = 0xBA;
pub const VK_OEM_PLUS: u16 = 0xBB;
pub const VK_OEM_COMMA: u16 = 0xBC;
pub const VK_OEM_MINUS: u16 = 0xBD;
pub const VK_OEM_PERIOD: u16 = 0xBE;
pub const VK_OEM_2: u16 = 0xBF;
pub const VK_OEM_3: u16 = 0xC0;
pub const VK_OEM_4: u16 = 0xDB;
pub const VK_OEM_5: u16 = 0xDC;
pub const VK_OEM_6: u16 = 0xDD;
pub const VK_OEM_7: u16 = 0xDE;
pub const VK_OEM_102: u16 = 0xE2;

/// A character resolved to the key that types it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharKey {
    pub virtual_key: u16,
    pub shift: bool,
}

/// Convert a virtual key code to its logical key name.
///
/// Generic modifier codes (reported by raw input) share the name of their
/// left-hand variant (reported by the low-level hook).
pub fn key_name(vk: u16) -> String {
    match vk {
        0x41..=0x5A => char::from(vk as u8).to_string(),
        0x30..=0x39 => format!("D{}", vk - 0x30),
        0x60..=0x69 => format!("NumPad{}", vk - VK_NUMPAD0),
        0x70..=0x87 => format!("F{}", vk - VK_F1 + 1),
        VK_BACK => "Back".to_string(),
        VK_TAB => "Tab".to_string(),
        VK_RETURN => "Return".to_string(),
        VK_SHIFT | VK_LSHIFT => "LeftShift".to_string(),
        VK_RSHIFT => "RightShift".to_string(),
        VK_CONTROL | VK_LCONTROL => "LeftCtrl".to_string(),
        VK_RCONTROL => "RightCtrl".to_string(),
        VK_MENU | VK_LMENU => "LeftAlt".to_string(),
        VK_RMENU => "RightAlt".to_string(),
        VK_PAUSE => "Pause".to_string(),
        VK_CAPITAL => "CapsLock".to_string(),
        VK_ESCAPE => "Escape".to_string(),
        VK_SPACE => "Space".to_string(),
        VK_PRIOR => "PageUp".to_string(),
        VK_NEXT => "PageDown".to_string(),
        VK_END => "End".to_string(),
        VK_HOME => "Home".to_string(),
        VK_LEFT => "Left".to_string(),
        VK_UP => "Up".to_string(),
        VK_RIGHT => "Right".to_string(),
        VK_DOWN => "Down".to_string(),
        VK_SNAPSHOT => "PrintScreen".to_string(),
        VK_INSERT => "Insert".to_string(),
        VK_DELETE => "Delete".to_string(),
        VK_LWIN => "LWin".to_string(),
        VK_RWIN => "RWin".to_string(),
        VK_APPS => "Apps".to_string(),
        VK_MULTIPLY => "Multiply".to_string(),
        VK_ADD => "Add".to_string(),
        VK_SUBTRACT => "Subtract".to_string(),
        VK_DECIMAL => "Decimal".to_string(),
        VK_DIVIDE => "Divide".to_string(),
        VK_NUMLOCK => "NumLock".to_string(),
        VK_SCROLL => "Scroll".to_string(),
        VK_OEM_1 => "OemSemicolon".to_string(),
        VK_OEM_PLUS => "OemPlus".to_string(),
        VK_OEM_COMMA => "OemComma".to_string(),
        VK_OEM_MINUS => "OemMinus".to_string(),
        VK_OEM_PERIOD => "OemPeriod".to_string(),
        VK_OEM_2 => "OemQuestion".to_string(),
        VK_OEM_3 => "OemTilde".to_string(),
        VK_OEM_4 => "OemOpenBrackets".to_string(),
        VK_OEM_5 => "OemPipe".to_string(),
        VK_OEM_6 => "OemCloseBrackets".to_string(),
        VK_OEM_7 => "OemQuotes".to_string(),
        VK_OEM_102 => "OemBackslash".to_string(),
        _ => format!("VK_{:02X}", vk),
    }
}

/// Look up the virtual key code for a key name (case-insensitive).
pub fn vk_from_name(name: &str) -> Option<u16> {
    let upper = name.trim().to_ascii_uppercase();

    if let Some(vk) = single_char_vk(&upper) {
        return Some(vk);
    }
    if let Some(vk) = numbered_vk(&upper) {
        return Some(vk);
    }

    let vk = match upper.as_str() {
        "CTRL" | "CONTROL" | "LEFTCTRL" | "LCTRL" => VK_CONTROL,
        "RIGHTCTRL" | "RCTRL" => VK_RCONTROL,
        "ALT" | "LEFTALT" | "LALT" => VK_MENU,
        "RIGHTALT" | "RALT" | "ALTGR" => VK_RMENU,
        "SHIFT" | "LEFTSHIFT" | "LSHIFT" => VK_SHIFT,
        "RIGHTSHIFT" | "RSHIFT" => VK_RSHIFT,
        "WIN" | "WINDOWS" | "LWIN" => VK_LWIN,
        "RWIN" => VK_RWIN,
        "APPS" | "MENU" => VK_APPS,
        "TAB" => VK_TAB,
        "ENTER" | "RETURN" => VK_RETURN,
        "ESC" | "ESCAPE" => VK_ESCAPE,
        "SPACE" => VK_SPACE,
        "BACKSPACE" | "BACK" => VK_BACK,
        "DELETE" | "DEL" => VK_DELETE,
        "INSERT" | "INS" => VK_INSERT,
        "HOME" => VK_HOME,
        "END" => VK_END,
        "PAGEUP" | "PRIOR" => VK_PRIOR,
        "PAGEDOWN" | "NEXT" => VK_NEXT,
        "UP" => VK_UP,
        "DOWN" => VK_DOWN,
        "LEFT" => VK_LEFT,
        "RIGHT" => VK_RIGHT,
        "PRINTSCREEN" | "SNAPSHOT" => VK_SNAPSHOT,
        "PAUSE" => VK_PAUSE,
        "CAPSLOCK" | "CAPITAL" => VK_CAPITAL,
        "NUMLOCK" => VK_NUMLOCK,
        "SCROLL" | "SCROLLLOCK" => VK_SCROLL,
        "MULTIPLY" => VK_MULTIPLY,
        "ADD" => VK_ADD,
        "SUBTRACT" => VK_SUBTRACT,
        "DECIMAL" => VK_DECIMAL,
        "DIVIDE" => VK_DIVIDE,
        "OEMSEMICOLON" => VK_OEM_1,
        "OEMPLUS" => VK_OEM_PLUS,
        "OEMCOMMA" => VK_OEM_COMMA,
        "OEMMINUS" => VK_OEM_MINUS,
        "OEMPERIOD" => VK_OEM_PERIOD,
        "OEMQUESTION" => VK_OEM_2,
        "OEMTILDE" => VK_OEM_3,
        "OEMOPENBRACKETS" => VK_OEM_4,
        "OEMPIPE" => VK_OEM_5,
        "OEMCLOSEBRACKETS" => VK_OEM_6,
        "OEMQUOTES" => VK_OEM_7,
        "OEMBACKSLASH" => VK_OEM_102,
        _ => return None,
    };
    Some(vk)
}

/// Letters and top-row digits given as a single character
fn single_char_vk(upper: &str) -> Option<u16> {
    let mut chars = upper.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match c {
        'A'..='Z' | '0'..='9' => Some(c as u16),
        _ => None,
    }
}

/// `D0`..`D9`, `NumPad0`..`NumPad9`, `F1`..`F24`
fn numbered_vk(upper: &str) -> Option<u16> {
    if let Some(rest) = upper.strip_prefix("NUMPAD") {
        let n: u16 = rest.parse().ok()?;
        return (n <= 9).then_some(VK_NUMPAD0 + n);
    }
    if let Some(rest) = upper.strip_prefix('D') {
        if rest.len() == 1 {
            let n: u16 = rest.parse().ok()?;
            return Some(0x30 + n);
        }
        return None;
    }
    if let Some(rest) = upper.strip_prefix('F') {
        let n: u16 = rest.parse().ok()?;
        return (1..=24).contains(&n).then_some(VK_F1 + n - 1);
    }
    None
}

/// Resolve a character on the US layout.
///
/// Used where the OS layout lookup is unavailable. Characters with no key
/// return `None`.
pub fn us_layout_char_key(c: char) -> Option<CharKey> {
    let plain = |vk| Some(CharKey { virtual_key: vk, shift: false });
    let shifted = |vk| Some(CharKey { virtual_key: vk, shift: true });

    match c {
        'a'..='z' => plain(c.to_ascii_uppercase() as u16),
        'A'..='Z' => shifted(c as u16),
        '0'..='9' => plain(c as u16),
        ' ' => plain(VK_SPACE),
        '\t' => plain(VK_TAB),
        '\n' | '\r' => plain(VK_RETURN),
        ')' => shifted(0x30),
        '!' => shifted(0x31),
        '@' => shifted(0x32),
        '#' => shifted(0x33),
        '$' => shifted(0x34),
        '%' => shifted(0x35),
        '^' => shifted(0x36),
        '&' => shifted(0x37),
        '*' => shifted(0x38),
        '(' => shifted(0x39),
        ';' => plain(VK_OEM_1),
        ':' => shifted(VK_OEM_1),
        '=' => plain(VK_OEM_PLUS),
        '+' => shifted(VK_OEM_PLUS),
        ',' => plain(VK_OEM_COMMA),
        '<' => shifted(VK_OEM_COMMA),
        '-' => plain(VK_OEM_MINUS),
        '_' => shifted(VK_OEM_MINUS),
        '.' => plain(VK_OEM_PERIOD),
        '>' => shifted(VK_OEM_PERIOD),
        '/' => plain(VK_OEM_2),
        '?' => shifted(VK_OEM_2),
        '`' => plain(VK_OEM_3),
        '~' => shifted(VK_OEM_3),
        '[' => plain(VK_OEM_4),
        '{' => shifted(VK_OEM_4),
        '\\' => plain(VK_OEM_5),
        '|' => shifted(VK_OEM_5),
        ']' => plain(VK_OEM_6),
        '}' => shifted(VK_OEM_6),
        '\'' => plain(VK_OEM_7),
        '"' => shifted(VK_OEM_7),
        _ => None,
    }
}

/// Normalized form used to compare key names across streams and mappings
pub fn normalize_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Whether a key set contains Ctrl+Alt+Delete, which the OS reserves and
/// normally refuses to accept from synthesized input.
pub fn is_secure_attention_sequence(keys: &[u16]) -> bool {
    let has = |candidates: &[u16]| keys.iter().any(|k| candidates.contains(k));
    has(&[VK_CONTROL, VK_LCONTROL, VK_RCONTROL])
        && has(&[VK_MENU, VK_LMENU, VK_RMENU])
        && has(&[VK_DELETE, VK_DECIMAL])
}

#[cfg(test)]
#[path = "keymap_test.rs"]
mod tests;
