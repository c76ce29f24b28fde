//! Chromosome ordering keys.
//!
//! Both input streams are sorted numerically by chromosome, with the sex
//! chromosomes after every autosome: `1 < 2 < ... < 22 < X < Y`. Labels may
//! carry a `chr` prefix in any case (`chr1`, `CHRX`). Anything else, such as
//! `MT` or a scaffold name, is rejected.

use std::fmt;

/// Total ordering key for a chromosome label.
///
/// The derived `Ord` follows variant order, so `X` and `Y` sort after every
/// numeric label regardless of its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChromKey {
    Numeric(u64),
    X,
    Y,
}

impl ChromKey {
    /// Parse a chromosome label into its ordering key.
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        let name = strip_chr_prefix(trimmed);

        if name.eq_ignore_ascii_case("x") {
            return Some(ChromKey::X);
        }
        if name.eq_ignore_ascii_case("y") {
            return Some(ChromKey::Y);
        }
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse().ok().map(ChromKey::Numeric)
    }
}

impl fmt::Display for ChromKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChromKey::Numeric(n) => write!(f, "{}", n),
            ChromKey::X => f.write_str("X"),
            ChromKey::Y => f.write_str("Y"),
        }
    }
}

#[inline]
fn strip_chr_prefix(label: &str) -> &str {
    match label.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &label[3..],
        _ => label,
    }
}
