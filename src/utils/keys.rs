//! Key-name tables and typed-text token parsing.
//!
//! Two lookups live here:
//! - [`lookup_key`] resolves a key name (with aliases, and single ASCII
//!   alphanumerics as unicode keys) to an [`enigo::Key`]. Used by hotkeys,
//!   special-key actions, and validation.
//! - [`parse_text_segments`] splits typed text into literal runs and embedded
//!   key tokens like `<enter>`. Only names from the fixed token list are
//!   treated as keys; anything else stays literal, as does an unclosed `<`.

use enigo::Key;

/// Token names recognized inside `<...>` in typed text.
///
/// Deliberately narrower than [`lookup_key`]: plain letters and aliases are
/// not tokens, so text like `"a < b"` or `"<a>"` types through unchanged.
const TYPED_TOKENS: &[&str] = &[
    "enter",
    "tab",
    "space",
    "backspace",
    "delete",
    "escape",
    "shift",
    "ctrl",
    "alt",
    "caps_lock",
    "page_up",
    "page_down",
    "home",
    "end",
    "up",
    "down",
    "left",
    "right",
    "f1",
    "f2",
    "f3",
    "f4",
    "f5",
    "f6",
    "f7",
    "f8",
    "f9",
    "f10",
    "f11",
    "f12",
];

/// One piece of typed text: either a literal run or a named key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment {
    Text(String),
    Key(String),
}

/// Resolve a key name to an [`enigo::Key`].
///
/// Names are case-insensitive and trimmed. Single ASCII alphanumeric
/// characters resolve to unicode keys so hotkeys like `["ctrl", "c"]` work.
/// Returns `None` for anything unknown.
pub fn lookup_key(name: &str) -> Option<Key> {
    let name = name.trim().to_ascii_lowercase();
    let key = match name.as_str() {
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "escape" | "esc" => Key::Escape,
        "shift" => Key::Shift,
        "ctrl" | "control" => Key::Control,
        "alt" | "option" => Key::Alt,
        "caps_lock" | "capslock" => Key::CapsLock,
        "page_up" | "pageup" => Key::PageUp,
        "page_down" | "pagedown" => Key::PageDown,
        "home" => Key::Home,
        "end" => Key::End,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "win" | "windows" | "cmd" | "command" | "super" | "meta" => Key::Meta,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => Key::Unicode(c),
                _ => return None,
            }
        }
    };
    Some(key)
}

/// Split typed text into literal runs and `<token>` key presses.
///
/// Tokens are matched case-insensitively against [`TYPED_TOKENS`]; segment
/// keys are returned lower-cased. Unknown tokens and unclosed brackets are
/// kept as literal text. Adjacent literals are merged; no empty segments are
/// produced.
pub fn parse_text_segments(text: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        let (before, from_open) = rest.split_at(open);
        literal.push_str(before);

        match from_open.find('>') {
            Some(close) => {
                let token = from_open[1..close].to_ascii_lowercase();
                if TYPED_TOKENS.contains(&token.as_str()) {
                    if !literal.is_empty() {
                        segments.push(TextSegment::Text(std::mem::take(&mut literal)));
                    }
                    segments.push(TextSegment::Key(token));
                    rest = &from_open[close + 1..];
                } else {
                    // Not a token: keep the '<' literal and keep scanning after it.
                    literal.push('<');
                    rest = &from_open[1..];
                }
            }
            None => {
                literal.push_str(from_open);
                rest = "";
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(TextSegment::Text(literal));
    }

    segments
}
