use super::*;

#[test]
fn test_letters_and_digits_have_logical_names() {
    assert_eq!(key_name(0x41), "A");
    assert_eq!(key_name(0x5A), "Z");
    assert_eq!(key_name(0x31), "D1");
    assert_eq!(key_name(0x30), "D0");
}

#[test]
fn test_function_and_numpad_names() {
    assert_eq!(key_name(VK_F1), "F1");
    assert_eq!(key_name(0x7B), "F12");
    assert_eq!(key_name(0x87), "F24");
    assert_eq!(key_name(0x60), "NumPad0");
    assert_eq!(key_name(0x69), "NumPad9");
}

#[test]
fn test_generic_modifiers_share_left_hand_names() {
    // Raw input reports the generic code, the low-level hook the sided one
    assert_eq!(key_name(VK_SHIFT), key_name(VK_LSHIFT));
    assert_eq!(key_name(VK_CONTROL), key_name(VK_LCONTROL));
    assert_eq!(key_name(VK_MENU), key_name(VK_LMENU));
    assert_eq!(key_name(VK_RCONTROL), "RightCtrl");
}

#[test]
fn test_unknown_vk_gets_hex_name() {
    assert_eq!(key_name(0xFF), "VK_FF");
}

#[test]
fn test_vk_from_name_aliases() {
    assert_eq!(vk_from_name("Ctrl"), Some(VK_CONTROL));
    assert_eq!(vk_from_name("control"), Some(VK_CONTROL));
    assert_eq!(vk_from_name("ALT"), Some(VK_MENU));
    assert_eq!(vk_from_name("Win"), Some(VK_LWIN));
    assert_eq!(vk_from_name("Enter"), Some(VK_RETURN));
    assert_eq!(vk_from_name("esc"), Some(VK_ESCAPE));
    assert_eq!(vk_from_name("PageDown"), Some(VK_NEXT));
}

#[test]
fn test_vk_from_name_accepts_logical_names() {
    assert_eq!(vk_from_name("D1"), Some(0x31));
    assert_eq!(vk_from_name("Return"), Some(VK_RETURN));
    assert_eq!(vk_from_name("Back"), Some(VK_BACK));
    assert_eq!(vk_from_name("NumPad7"), Some(0x67));
    assert_eq!(vk_from_name("LeftCtrl"), Some(VK_CONTROL));
    assert_eq!(vk_from_name("OemComma"), Some(VK_OEM_COMMA));
}

#[test]
fn test_vk_from_name_single_characters() {
    assert_eq!(vk_from_name("c"), Some(0x43));
    assert_eq!(vk_from_name("C"), Some(0x43));
    assert_eq!(vk_from_name("7"), Some(0x37));
    // "D" alone is the letter, not a digit prefix
    assert_eq!(vk_from_name("D"), Some(0x44));
    // "F" alone is the letter, not a function key prefix
    assert_eq!(vk_from_name("F"), Some(0x46));
}

#[test]
fn test_vk_from_name_function_key_range() {
    assert_eq!(vk_from_name("F1"), Some(VK_F1));
    assert_eq!(vk_from_name("f12"), Some(0x7B));
    assert_eq!(vk_from_name("F24"), Some(0x87));
    assert_eq!(vk_from_name("F25"), None);
    assert_eq!(vk_from_name("F0"), None);
}

#[test]
fn test_vk_from_name_unknown() {
    assert_eq!(vk_from_name("Hyper"), None);
    assert_eq!(vk_from_name(""), None);
    assert_eq!(vk_from_name("D12"), None);
}

#[test]
fn test_name_round_trips_through_lookup() {
    for vk in [0x41u16, 0x31, VK_F1, 0x65, VK_RETURN, VK_ESCAPE, VK_OEM_4] {
        assert_eq!(vk_from_name(&key_name(vk)), Some(vk), "vk {:#x}", vk);
    }
}

#[test]
fn test_us_layout_char_resolution() {
    assert_eq!(
        us_layout_char_key('A'),
        Some(CharKey { virtual_key: 0x41, shift: true })
    );
    assert_eq!(
        us_layout_char_key('b'),
        Some(CharKey { virtual_key: 0x42, shift: false })
    );
    assert_eq!(
        us_layout_char_key('1'),
        Some(CharKey { virtual_key: 0x31, shift: false })
    );
    assert_eq!(
        us_layout_char_key('!'),
        Some(CharKey { virtual_key: 0x31, shift: true })
    );
    assert_eq!(us_layout_char_key('é'), None);
}

#[test]
fn test_normalize_key_is_case_insensitive() {
    assert_eq!(normalize_key("F1"), normalize_key(" f1 "));
    assert_eq!(normalize_key("NumPad1"), "numpad1");
}

#[test]
fn test_secure_attention_sequence_detection() {
    assert!(is_secure_attention_sequence(&[VK_CONTROL, VK_MENU, VK_DELETE]));
    assert!(is_secure_attention_sequence(&[VK_DELETE, VK_LMENU, VK_RCONTROL]));
    assert!(!is_secure_attention_sequence(&[VK_CONTROL, VK_DELETE]));
    assert!(!is_secure_attention_sequence(&[VK_CONTROL, 0x43]));
}
