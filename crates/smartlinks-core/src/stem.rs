//! Key normalization shared by index writes and lookups.

use crate::types::MAX_KEY_LEN;

/// Perform (very basic) stemming of free text:
///
/// - lower-case everything,
/// - drop every character that is not alphanumeric or `_`,
/// - keep at most [`MAX_KEY_LEN`] characters.
///
/// The limit counts `char`s (Unicode scalar values), not UTF-8 bytes: a key
/// of 300 `é` is 600 bytes long.
///
/// Lower-casing happens before filtering because some lower-case mappings
/// expand into combining marks, which must not survive into the key.
pub fn stem(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .take(MAX_KEY_LEN)
        .collect()
}
