//! Dictionary ordering for channel names
//!
//! Embedded runs of decimal digits compare by numeric value, so
//! "Channel 2" sorts before "Channel 10". Everything else compares by raw
//! byte value. The end of a string behaves like a zero byte.

use std::cmp::Ordering;

/// Compare two names in dictionary order
///
/// - Neither byte a digit: raw byte comparison, equal once both strings end
/// - Exactly one byte a digit: raw byte comparison decides
/// - Both bytes digits: the maximal digit runs compare numerically and, when
///   equal, scanning continues after them
///
/// Names that differ only in leading zeros ("Ch01", "Ch1") compare equal
/// here; [`NaturalKey`] breaks such ties.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0usize, 0usize);

    loop {
        let ca = a.get(i).copied().unwrap_or(0);
        let cb = b.get(j).copied().unwrap_or(0);

        match (ca.is_ascii_digit(), cb.is_ascii_digit()) {
            (false, false) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                if i >= a.len() && j >= b.len() {
                    return Ordering::Equal;
                }
                i += 1;
                j += 1;
            }
            (true, false) | (false, true) => return ca.cmp(&cb),
            (true, true) => {
                let end_a = i + digit_run(&a[i..]);
                let end_b = j + digit_run(&b[j..]);
                let ord = cmp_digit_runs(&a[i..end_a], &b[j..end_b]);
                if ord != Ordering::Equal {
                    return ord;
                }
                i = end_a;
                j = end_b;
            }
        }
    }
}

fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|c| c.is_ascii_digit()).count()
}

/// Numeric comparison of two ASCII digit runs of any length
fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn strip_leading_zeros(run: &[u8]) -> &[u8] {
    let zeros = run.iter().take_while(|&&c| c == b'0').count();
    &run[zeros..]
}

/// Map key ordering names by [`natural_cmp`]
///
/// Names the comparator considers equal but which differ byte-wise fall back
/// to raw byte order, keeping distinct names distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey(String);

impl NaturalKey {
    /// Wrap a name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The wrapped name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for NaturalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0).then_with(|| self.0.as_bytes().cmp(other.0.as_bytes()))
    }
}

impl PartialOrd for NaturalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
