//! Counterparty label masking
//!
//! Labels are redacted once, before a connection is persisted. The transform
//! is deterministic and length-preserving; characters are counted as Unicode
//! scalar values.

/// Masking character, one per hidden source character
pub const MASK_CHAR: char = '*';

/// Visible prefix/suffix lengths for labels up to `max_len` characters
struct Bucket {
    max_len: usize,
    keep_start: usize,
    keep_end: usize,
}

/// Length buckets, checked in order. The last bucket covers everything longer.
const BUCKETS: &[Bucket] = &[
    Bucket { max_len: 3, keep_start: 1, keep_end: 0 },
    Bucket { max_len: 5, keep_start: 1, keep_end: 1 },
    Bucket { max_len: 8, keep_start: 2, keep_end: 2 },
    Bucket { max_len: usize::MAX, keep_start: 3, keep_end: 3 },
];

/// Mask a counterparty label
///
/// | length | visible |
/// |---|---|
/// | ≤ 3 | first 1 |
/// | 4–5 | first 1 + last 1 |
/// | 6–8 | first 2 + last 2 |
/// | > 8 | first 3 + last 3 |
///
/// An empty label is returned unchanged.
///
/// ```
/// use agent_connections::masking::mask_label;
///
/// assert_eq!(mask_label("abcdefghij"), "abc****hij");
/// ```
#[must_use]
pub fn mask_label(label: &str) -> String {
    let chars: Vec<char> = label.chars().collect();
    let len = chars.len();
    if len == 0 {
        return String::new();
    }

    let bucket = BUCKETS
        .iter()
        .find(|b| len <= b.max_len)
        .unwrap_or(&BUCKETS[BUCKETS.len() - 1]);

    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i < bucket.keep_start || i >= len - bucket.keep_end {
                *c
            } else {
                MASK_CHAR
            }
        })
        .collect()
}

/// Mask an optional label, passing `None` through
#[must_use]
pub fn mask_optional(label: Option<&str>) -> Option<String> {
    label.map(mask_label)
}

/// A label that has been through [`mask_label`]
///
/// Storage only accepts this type, so an unmasked label cannot be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedLabel(String);

impl MaskedLabel {
    /// Mask `label`
    #[must_use]
    pub fn mask(label: &str) -> Self {
        Self(mask_label(label))
    }

    /// Masked text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked text, by value
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}
