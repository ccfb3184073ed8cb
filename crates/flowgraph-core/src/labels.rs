//! The generated sequence of allocatable short alphabetic labels.
//!
//! Labels are the one- and two-letter uppercase identifiers "A".."Z",
//! "AA".."ZZ" (26 + 676 = 702 entries), produced eagerly in generation
//! order and cached for the process lifetime.

use std::sync::OnceLock;

static LABELS: OnceLock<Vec<String>> = OnceLock::new();

/// Returns the full ordered label sequence.
///
/// Deterministic and pure; the result is computed once and cached.
pub fn all_labels() -> &'static [String] {
    LABELS.get_or_init(generate).as_slice()
}

fn generate() -> Vec<String> {
    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    let mut labels = Vec::with_capacity(LETTERS.len() + LETTERS.len() * LETTERS.len());
    for &a in LETTERS {
        labels.push((a as char).to_string());
    }
    for &a in LETTERS {
        for &b in LETTERS {
            labels.push(format!("{}{}", a as char, b as char));
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_count_is_702() {
        assert_eq!(all_labels().len(), 26 + 26 * 26);
    }

    #[test]
    fn generation_order() {
        let labels = all_labels();
        assert_eq!(labels[0], "A");
        assert_eq!(labels[1], "B");
        assert_eq!(labels[25], "Z");
        assert_eq!(labels[26], "AA");
        assert_eq!(labels[27], "AB");
        assert_eq!(labels[labels.len() - 1], "ZZ");
    }

    #[test]
    fn labels_are_unique() {
        let labels = all_labels();
        let mut seen = std::collections::HashSet::new();
        for label in labels {
            assert!(seen.insert(label), "duplicate label {label}");
        }
    }

    #[test]
    fn cached_across_calls() {
        let a = all_labels().as_ptr();
        let b = all_labels().as_ptr();
        assert_eq!(a, b);
    }
}
