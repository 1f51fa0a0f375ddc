// Blocking synthesis sequences; run on a blocking worker, never on the hook thread

use super::injector::KeyInjector;
use super::ActionError;
use crate::keymap::VK_SHIFT;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthTiming {
    /// Gap between consecutive presses or releases
    pub key_press_delay: Duration,
    /// How long the full combination stays down
    pub key_hold_delay: Duration,
    /// Gap between typed characters
    pub text_char_delay: Duration,
}

/// Press `keys` in order, hold, then release in reverse order.
///
/// If a press fails, the keys already down are released before returning.
pub fn press_combination(
    injector: &dyn KeyInjector,
    keys: &[u16],
    timing: &SynthTiming,
) -> Result<(), ActionError> {
    let mut pressed: Vec<u16> = Vec::with_capacity(keys.len());

    for (i, &vk) in keys.iter().enumerate() {
        if let Err(e) = injector.key_down(vk) {
            release_all(injector, &pressed);
            return Err(e);
        }
        pressed.push(vk);
        if i + 1 < keys.len() {
            thread::sleep(timing.key_press_delay);
        }
    }

    thread::sleep(timing.key_hold_delay);

    let mut first_error = None;
    for (i, &vk) in pressed.iter().rev().enumerate() {
        if let Err(e) = injector.key_up(vk) {
            crate::warn!("Failed to release VK {:#04x}: {}", vk, e);
            first_error.get_or_insert(e);
        }
        if i + 1 < pressed.len() {
            thread::sleep(timing.key_press_delay);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn release_all(injector: &dyn KeyInjector, pressed: &[u16]) {
    for &vk in pressed.iter().rev() {
        let _ = injector.key_up(vk);
    }
}

/// Type `text` one character at a time. Returns the number of characters typed.
///
/// Characters without a key on the active layout are skipped.
pub fn type_text(
    injector: &dyn KeyInjector,
    text: &str,
    timing: &SynthTiming,
) -> Result<usize, ActionError> {
    let mut typed = 0;

    for c in text.chars() {
        let Some(key) = injector.resolve_char(c) else {
            crate::warn!("No key for character {:?}, skipping", c);
            continue;
        };

        if key.shift {
            injector.key_down(VK_SHIFT)?;
        }
        // Every press gets its release, even when the press fails
        let down = injector.key_down(key.virtual_key);
        let up = injector.key_up(key.virtual_key);
        if key.shift {
            let _ = injector.key_up(VK_SHIFT);
        }
        down?;
        up?;

        typed += 1;
        thread::sleep(timing.text_char_delay);
    }

    Ok(typed)
}
