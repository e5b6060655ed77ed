use std::fmt;

/// Represents the strand a location evaluates to.
///
/// Strand is never stored on a location; it is derived from the number of
/// enclosing `complement(..)` operators.
///
/// # Example
///
/// ```
/// use genbank::strand::Strand;
///
/// let strand = Strand::Forward;
/// assert_eq!(strand.flip(), Strand::Reverse);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strand {
    /// Positive strand (`+`).
    #[default]
    Forward,
    /// Negative strand (`-`).
    Reverse,
    /// Mixed strands, e.g. a `join(..)` of forward and complemented parts (`.`).
    Unknown,
}

impl Strand {
    /// Returns the opposite strand. `Unknown` stays `Unknown`.
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
            Strand::Unknown => Strand::Unknown,
        }
    }

    /// Folds the strands of several parts into one.
    ///
    /// Returns `Forward` for an empty iterator, the shared strand if all
    /// parts agree and `Unknown` otherwise.
    pub(crate) fn merge<I: IntoIterator<Item = Strand>>(parts: I) -> Self {
        let mut iter = parts.into_iter();
        let first = match iter.next() {
            Some(strand) => strand,
            None => return Strand::Forward,
        };
        if iter.all(|strand| strand == first) {
            first
        } else {
            Strand::Unknown
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => f.write_str("+"),
            Strand::Reverse => f.write_str("-"),
            Strand::Unknown => f.write_str("."),
        }
    }
}
