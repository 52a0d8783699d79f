//! Shared utility functions.
//!
//! The gateway wire format writes keys in camelCase while the crate's
//! field names use snake_case. The conversion is purely mechanical and
//! reversible for the field set we emit (no consecutive underscores,
//! no leading/trailing underscores, ASCII names).

/// Convert a snake_case field name to its camelCase wire key.
pub fn to_camel(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper_next = false;
    for ch in snake.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a camelCase wire key back to the snake_case field name.
pub fn to_snake(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for ch in camel.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
