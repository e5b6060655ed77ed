use std::fmt;
use std::str::FromStr;

use crate::strand::Strand;

/// Marks an endpoint as exact or as lying beyond the written coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Fuzzy {
    /// The coordinate is exact.
    #[default]
    Exact,
    /// The true endpoint is at or before the coordinate (`<`).
    Before,
    /// The true endpoint is at or after the coordinate (`>`).
    After,
}

impl Fuzzy {
    fn as_str(self) -> &'static str {
        match self {
            Fuzzy::Exact => "",
            Fuzzy::Before => "<",
            Fuzzy::After => ">",
        }
    }
}

/// A closed interval of the record sequence.
///
/// Coordinates are stored 0-based and half-open: `1..10` in GenBank text is
/// `Range { start: 0, end: 10, .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// 0-based inclusive start.
    pub start: i64,
    /// 0-based exclusive end.
    pub end: i64,
    /// Fuzziness of the start coordinate.
    pub start_fuzzy: Fuzzy,
    /// Fuzziness of the end coordinate.
    pub end_fuzzy: Fuzzy,
}

impl Range {
    /// Creates an exact range from 0-based half-open coordinates.
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            start_fuzzy: Fuzzy::Exact,
            end_fuzzy: Fuzzy::Exact,
        }
    }

    /// Creates a range with fuzzy endpoints.
    pub fn fuzzy(start: i64, end: i64, start_fuzzy: Fuzzy, end_fuzzy: Fuzzy) -> Self {
        Self {
            start,
            end,
            start_fuzzy,
            end_fuzzy,
        }
    }

    /// Returns `true` if the range covers a single base written without `..`.
    fn is_single_base(&self) -> bool {
        self.start.checked_add(1) == Some(self.end) && self.end_fuzzy == Fuzzy::Exact
    }

    /// Returns `true` if both endpoints can be written as 1-based coordinates.
    fn is_writable(&self) -> bool {
        (0..i64::MAX).contains(&self.start) && self.end >= 1
    }
}

/// Length of an assembly gap in a CONTIG location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GapLength {
    /// `gap(N)`: a gap of known length.
    Known(u64),
    /// `gap()`: a gap of unknown length.
    Unknown,
    /// `gap(unkN)`: a gap of unknown length, conventionally drawn as N bases.
    Unk(u64),
}

/// A coordinate expression from a feature table, a CONTIG line or a caller.
///
/// Nesting is preserved exactly as parsed: `complement(complement(1..5))`
/// stays two `Complement` nodes even though it evaluates to the forward strand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// A contiguous interval.
    Range(Range),
    /// A zero-width site between two bases, written `x^y`. Both values are
    /// 0-based indices of the flanking bases.
    Between(i64, i64),
    /// The reverse complement of the inner location.
    Complement(Box<Location>),
    /// Segments joined into one contiguous molecule.
    Join(Vec<Location>),
    /// Segments in a known order, not necessarily joined.
    Order(Vec<Location>),
    /// Cross-linked residues.
    Bond(Vec<Location>),
    /// Mutually exclusive alternatives.
    OneOf(Vec<Location>),
    /// A location on another record, identified by accession.
    External(String, Box<Location>),
    /// An assembly gap (CONTIG only).
    Gap(GapLength),
}

impl Location {
    /// Creates an exact range from 0-based half-open coordinates.
    pub fn range(start: i64, end: i64) -> Self {
        Location::Range(Range::new(start, end))
    }

    /// Wraps a location in `complement(..)`.
    pub fn complement(inner: Location) -> Self {
        Location::Complement(Box::new(inner))
    }

    /// Creates a `join(..)`, rejecting an empty argument list.
    pub fn join(parts: Vec<Location>) -> Result<Self, LocationError> {
        non_empty("join", parts).map(Location::Join)
    }

    /// Creates an `order(..)`, rejecting an empty argument list.
    pub fn order(parts: Vec<Location>) -> Result<Self, LocationError> {
        non_empty("order", parts).map(Location::Order)
    }

    /// Creates a `bond(..)`, rejecting an empty argument list.
    pub fn bond(parts: Vec<Location>) -> Result<Self, LocationError> {
        non_empty("bond", parts).map(Location::Bond)
    }

    /// Creates a `one-of(..)`, rejecting an empty argument list.
    pub fn one_of(parts: Vec<Location>) -> Result<Self, LocationError> {
        non_empty("one-of", parts).map(Location::OneOf)
    }

    /// Creates a location on another record.
    pub fn external<S: Into<String>>(accession: S, inner: Location) -> Self {
        Location::External(accession.into(), Box::new(inner))
    }

    /// Returns the strand this location evaluates to.
    ///
    /// Each enclosing `complement(..)` flips the strand of its inner location;
    /// combinators report the shared strand of their parts, or `Unknown` when
    /// the parts disagree.
    pub fn strand(&self) -> Strand {
        match self {
            Location::Range(_) | Location::Between(..) | Location::Gap(_) => Strand::Forward,
            Location::Complement(inner) => inner.strand().flip(),
            Location::Join(parts)
            | Location::Order(parts)
            | Location::Bond(parts)
            | Location::OneOf(parts) => Strand::merge(parts.iter().map(Location::strand)),
            Location::External(_, inner) => inner.strand(),
        }
    }

    /// Returns the local segments of this location in written order, as
    /// 0-based half-open `(start, end, strand)` triples.
    ///
    /// Sites (`x^y`) yield an empty segment at the insertion point. Parts on
    /// other records and assembly gaps yield nothing.
    ///
    /// # Example
    ///
    /// ```
    /// use genbank::{Location, Strand};
    ///
    /// let loc: Location = "complement(join(1..10,20..30))".parse().unwrap();
    /// assert_eq!(
    ///     loc.ranges(),
    ///     vec![(0, 10, Strand::Reverse), (19, 30, Strand::Reverse)]
    /// );
    /// ```
    pub fn ranges(&self) -> Vec<(i64, i64, Strand)> {
        let mut out = Vec::new();
        self.collect_ranges(Strand::Forward, &mut out);
        out
    }

    fn collect_ranges(&self, strand: Strand, out: &mut Vec<(i64, i64, Strand)>) {
        match self {
            Location::Range(range) => out.push((range.start, range.end, strand)),
            Location::Between(left, _) => out.push((left + 1, left + 1, strand)),
            Location::Complement(inner) => inner.collect_ranges(strand.flip(), out),
            Location::Join(parts)
            | Location::Order(parts)
            | Location::Bond(parts)
            | Location::OneOf(parts) => {
                for part in parts {
                    part.collect_ranges(strand, out);
                }
            }
            Location::External(..) | Location::Gap(_) => {}
        }
    }

    /// Returns the smallest 0-based half-open span covering all local segments.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        self.ranges()
            .into_iter()
            .fold(None, |acc, (start, end, _)| match acc {
                None => Some((start, end)),
                Some((lo, hi)) => Some((lo.min(start), hi.max(end))),
            })
    }

    /// Returns `true` if any endpoint is marked with `<` or `>`.
    pub fn is_fuzzy(&self) -> bool {
        match self {
            Location::Range(range) => {
                range.start_fuzzy != Fuzzy::Exact || range.end_fuzzy != Fuzzy::Exact
            }
            Location::Between(..) | Location::Gap(_) => false,
            Location::Complement(inner) | Location::External(_, inner) => inner.is_fuzzy(),
            Location::Join(parts)
            | Location::Order(parts)
            | Location::Bond(parts)
            | Location::OneOf(parts) => parts.iter().any(Location::is_fuzzy),
        }
    }

    /// Checks that every combinator has at least one part and that every
    /// coordinate can be written back as a positive 1-based position.
    ///
    /// Locations built through the public enum variants can bypass the
    /// checked constructors; the writer calls this before rendering.
    /// Reversed ranges such as `10..5` are accepted, as the parser reads them.
    pub fn validate(&self) -> Result<(), LocationError> {
        match self {
            Location::Range(range) if !range.is_writable() => Err(LocationError::new(
                LocationErrorKind::InvalidNumber,
                &format!("{}..{}", range.start, range.end),
                0,
            )),
            Location::Between(left, right)
                if !(0..i64::MAX).contains(left) || !(0..i64::MAX).contains(right) =>
            {
                Err(LocationError::new(
                    LocationErrorKind::InvalidNumber,
                    &format!("{left}^{right}"),
                    0,
                ))
            }
            Location::Range(_) | Location::Between(..) | Location::Gap(_) => Ok(()),
            Location::Complement(inner) | Location::External(_, inner) => inner.validate(),
            Location::Join(parts)
            | Location::Order(parts)
            | Location::Bond(parts)
            | Location::OneOf(parts) => {
                if parts.is_empty() {
                    return Err(LocationError::new(
                        LocationErrorKind::EmptyCombinator(self.keyword().to_string()),
                        &format!("{}()", self.keyword()),
                        0,
                    ));
                }
                parts.iter().try_for_each(Location::validate)
            }
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Location::Join(_) => "join",
            Location::Order(_) => "order",
            Location::Bond(_) => "bond",
            Location::OneOf(_) => "one-of",
            Location::Complement(_) => "complement",
            Location::Gap(_) => "gap",
            Location::Range(_) | Location::Between(..) | Location::External(..) => "",
        }
    }
}

fn non_empty(name: &str, parts: Vec<Location>) -> Result<Vec<Location>, LocationError> {
    if parts.is_empty() {
        Err(LocationError::new(
            LocationErrorKind::EmptyCombinator(name.to_string()),
            &format!("{name}()"),
            0,
        ))
    } else {
        Ok(parts)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Range(range) => {
                if range.is_single_base() {
                    write!(f, "{}{}", range.start_fuzzy.as_str(), range.end)
                } else {
                    write!(
                        f,
                        "{}{}..{}{}",
                        range.start_fuzzy.as_str(),
                        i128::from(range.start) + 1,
                        range.end_fuzzy.as_str(),
                        range.end
                    )
                }
            }
            Location::Between(left, right) => write!(
                f,
                "{}^{}",
                i128::from(*left) + 1,
                i128::from(*right) + 1
            ),
            Location::Complement(inner) => write!(f, "complement({inner})"),
            Location::Join(parts)
            | Location::Order(parts)
            | Location::Bond(parts)
            | Location::OneOf(parts) => {
                f.write_str(self.keyword())?;
                f.write_str("(")?;
                for (idx, part) in parts.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
            Location::External(accession, inner) => write!(f, "{accession}:{inner}"),
            Location::Gap(GapLength::Unknown) => f.write_str("gap()"),
            Location::Gap(GapLength::Known(len)) => write!(f, "gap({len})"),
            Location::Gap(GapLength::Unk(len)) => write!(f, "gap(unk{len})"),
        }
    }
}

impl FromStr for Location {
    type Err = LocationError;

    /// Parses a GenBank location expression.
    ///
    /// Whitespace between tokens is ignored, so locations reassembled from
    /// wrapped feature lines parse the same as single-line ones.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new(text);
        let location = parser.location()?;
        parser.skip_ws();
        match parser.peek() {
            None => Ok(location),
            Some(b')') => Err(parser.error(LocationErrorKind::UnbalancedParenthesis)),
            Some(_) => Err(parser.unexpected()),
        }
    }
}

/// The category of a location syntax error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationErrorKind {
    /// A coordinate is missing, zero, or does not fit in 64 bits.
    InvalidNumber,
    /// A `(` without its `)` or a stray `)`.
    UnbalancedParenthesis,
    /// A `name(..)` operator that is not part of the grammar.
    UnknownCombinator(String),
    /// A combinator with no arguments, e.g. `join()`.
    EmptyCombinator(String),
    /// A character that cannot start or continue the expression.
    UnexpectedCharacter(char),
    /// The expression stopped in the middle of a term.
    UnexpectedEnd,
}

impl fmt::Display for LocationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationErrorKind::InvalidNumber => f.write_str("malformed coordinate"),
            LocationErrorKind::UnbalancedParenthesis => f.write_str("unbalanced parenthesis"),
            LocationErrorKind::UnknownCombinator(name) => {
                write!(f, "unknown location operator '{name}'")
            }
            LocationErrorKind::EmptyCombinator(name) => {
                write!(f, "'{name}' requires at least one location")
            }
            LocationErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character {c:?}"),
            LocationErrorKind::UnexpectedEnd => f.write_str("unexpected end of location"),
        }
    }
}

/// A location expression that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationError {
    /// What went wrong.
    pub kind: LocationErrorKind,
    /// The complete raw expression.
    pub text: String,
    /// Byte offset into `text` where the problem was found.
    pub offset: usize,
}

impl LocationError {
    fn new(kind: LocationErrorKind, text: &str, offset: usize) -> Self {
        Self {
            kind,
            text: text.to_string(),
            offset,
        }
    }
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in location {:?} at offset {}",
            self.kind, self.text, self.offset
        )
    }
}

impl std::error::Error for LocationError {}

/// Recursive-descent parser over the bytes of one expression.
struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, kind: LocationErrorKind) -> LocationError {
        LocationError::new(kind, self.text, self.pos)
    }

    fn unexpected(&self) -> LocationError {
        match self.text[self.pos..].chars().next() {
            Some(c) => self.error(LocationErrorKind::UnexpectedCharacter(c)),
            None => self.error(LocationErrorKind::UnexpectedEnd),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn location(&mut self) -> Result<Location, LocationError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error(LocationErrorKind::UnexpectedEnd)),
            Some(b'<' | b'>') => self.simple(),
            Some(b) if b.is_ascii_digit() => self.simple(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.named(),
            Some(_) => Err(self.unexpected()),
        }
    }

    /// Parses `name(..)` operators and `accession:location` references.
    fn named(&mut self) -> Result<Location, LocationError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
        {
            self.pos += 1;
        }
        let word = &self.text[start..self.pos];

        self.skip_ws();
        match self.peek() {
            Some(b'(') => {
                let open = self.pos;
                self.pos += 1;
                match word {
                    "complement" => {
                        let inner = self.location()?;
                        self.close(open)?;
                        Ok(Location::complement(inner))
                    }
                    "join" => self.arguments(word, open).map(Location::Join),
                    "order" => self.arguments(word, open).map(Location::Order),
                    "bond" => self.arguments(word, open).map(Location::Bond),
                    "one-of" => self.arguments(word, open).map(Location::OneOf),
                    "gap" => self.gap(open),
                    _ => Err(LocationError::new(
                        LocationErrorKind::UnknownCombinator(word.to_string()),
                        self.text,
                        start,
                    )),
                }
            }
            Some(b':') => {
                self.pos += 1;
                let inner = self.location()?;
                Ok(Location::external(word, inner))
            }
            None => Err(self.error(LocationErrorKind::UnexpectedEnd)),
            Some(_) => Err(self.unexpected()),
        }
    }

    /// Expects the `)` matching the `(` at byte offset `open`.
    fn close(&mut self, open: usize) -> Result<(), LocationError> {
        self.skip_ws();
        match self.peek() {
            Some(b')') => {
                self.pos += 1;
                Ok(())
            }
            None => Err(LocationError::new(
                LocationErrorKind::UnbalancedParenthesis,
                self.text,
                open,
            )),
            Some(_) => Err(self.unexpected()),
        }
    }

    fn arguments(&mut self, name: &str, open: usize) -> Result<Vec<Location>, LocationError> {
        if self.eat(b')') {
            return Err(LocationError::new(
                LocationErrorKind::EmptyCombinator(name.to_string()),
                self.text,
                open,
            ));
        }

        let mut parts = Vec::new();
        loop {
            if self.peek().is_none() {
                return Err(LocationError::new(
                    LocationErrorKind::UnbalancedParenthesis,
                    self.text,
                    open,
                ));
            }
            parts.push(self.location()?);
            if self.eat(b',') {
                continue;
            }
            self.close(open)?;
            return Ok(parts);
        }
    }

    fn gap(&mut self, open: usize) -> Result<Location, LocationError> {
        self.skip_ws();
        let length = if self.peek() == Some(b')') {
            GapLength::Unknown
        } else if self.text[self.pos..].starts_with("unk") {
            self.pos += 3;
            GapLength::Unk(self.count()?)
        } else {
            GapLength::Known(self.count()?)
        };
        self.close(open)?;
        Ok(Location::Gap(length))
    }

    fn fuzzy(&mut self) -> Fuzzy {
        self.skip_ws();
        match self.peek() {
            Some(b'<') => {
                self.pos += 1;
                Fuzzy::Before
            }
            Some(b'>') => {
                self.pos += 1;
                Fuzzy::After
            }
            _ => Fuzzy::Exact,
        }
    }

    /// Reads an unsigned decimal.
    fn count(&mut self) -> Result<u64, LocationError> {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        self.text[start..self.pos]
            .parse::<u64>()
            .map_err(|_| LocationError::new(LocationErrorKind::InvalidNumber, self.text, start))
    }

    /// Reads a 1-based coordinate.
    fn coordinate(&mut self) -> Result<i64, LocationError> {
        self.skip_ws();
        let start = self.pos;
        let value = self.count()?;
        if value == 0 || value > i64::MAX as u64 {
            return Err(LocationError::new(
                LocationErrorKind::InvalidNumber,
                self.text,
                start,
            ));
        }
        Ok(value as i64)
    }

    fn simple(&mut self) -> Result<Location, LocationError> {
        let start_fuzzy = self.fuzzy();
        let first = self.coordinate()?;
        self.skip_ws();

        if self.peek() == Some(b'^') {
            if start_fuzzy != Fuzzy::Exact {
                return Err(self.unexpected());
            }
            self.pos += 1;
            let second = self.coordinate()?;
            return Ok(Location::Between(first - 1, second - 1));
        }

        if self.text[self.pos..].starts_with("..") {
            self.pos += 2;
            let end_fuzzy = self.fuzzy();
            let second = self.coordinate()?;
            return Ok(Location::Range(Range::fuzzy(
                first - 1,
                second,
                start_fuzzy,
                end_fuzzy,
            )));
        }

        Ok(Location::Range(Range::fuzzy(
            first - 1,
            first,
            start_fuzzy,
            Fuzzy::Exact,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Location {
        text.parse()
            .unwrap_or_else(|err| panic!("failed to parse {text:?}: {err}"))
    }

    fn error_kind(text: &str) -> LocationErrorKind {
        match text.parse::<Location>() {
            Ok(loc) => panic!("expected {text:?} to fail, got {loc:?}"),
            Err(err) => err.kind,
        }
    }

    #[test]
    fn parses_simple_range_as_half_open() {
        assert_eq!(parse("1..10"), Location::range(0, 10));
        assert_eq!(parse("467"), Location::range(466, 467));
    }

    #[test]
    fn parses_fuzzy_endpoints() {
        match parse("<1..>888") {
            Location::Range(range) => {
                assert_eq!((range.start, range.end), (0, 888));
                assert_eq!(range.start_fuzzy, Fuzzy::Before);
                assert_eq!(range.end_fuzzy, Fuzzy::After);
            }
            other => panic!("unexpected location {other:?}"),
        }
    }

    #[test]
    fn parses_between_site() {
        assert_eq!(parse("102^103"), Location::Between(101, 102));
        assert_eq!(parse("102^103").to_string(), "102^103");
    }

    #[test]
    fn preserves_nested_complements() {
        let loc = parse("complement(complement(5..8))");
        assert_eq!(
            loc,
            Location::complement(Location::complement(Location::range(4, 8)))
        );
        assert_eq!(loc.strand(), Strand::Forward);
        assert_eq!(loc.to_string(), "complement(complement(5..8))");
    }

    #[test]
    fn parses_combinators_and_external() {
        let loc = parse("join(complement(4918..5163),J00194.1:100..202, 1..5)");
        match &loc {
            Location::Join(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(
                    parts[1],
                    Location::external("J00194.1", Location::range(99, 202))
                );
            }
            other => panic!("unexpected location {other:?}"),
        }
        assert_eq!(loc.strand(), Strand::Unknown);
        assert_eq!(
            loc.to_string(),
            "join(complement(4918..5163),J00194.1:100..202,1..5)"
        );

        assert!(matches!(parse("one-of(1..5,2..5)"), Location::OneOf(_)));
        assert!(matches!(parse("bond(30,42)"), Location::Bond(_)));
        assert!(matches!(parse("order(1..5,9..12)"), Location::Order(_)));
    }

    #[test]
    fn parses_gaps() {
        let loc = parse("join(AAAA01000001.1:1..100,gap(50),gap(),gap(unk100))");
        match loc {
            Location::Join(parts) => {
                assert_eq!(parts[1], Location::Gap(GapLength::Known(50)));
                assert_eq!(parts[2], Location::Gap(GapLength::Unknown));
                assert_eq!(parts[3], Location::Gap(GapLength::Unk(100)));
            }
            other => panic!("unexpected location {other:?}"),
        }
    }

    #[test]
    fn reports_distinct_errors() {
        assert_eq!(error_kind("1..x"), LocationErrorKind::InvalidNumber);
        assert_eq!(error_kind("0..5"), LocationErrorKind::InvalidNumber);
        assert_eq!(
            error_kind("join(1..5,6..9"),
            LocationErrorKind::UnbalancedParenthesis
        );
        assert_eq!(error_kind("1..5)"), LocationErrorKind::UnbalancedParenthesis);
        assert_eq!(
            error_kind("merge(1..5)"),
            LocationErrorKind::UnknownCombinator("merge".into())
        );
        assert_eq!(
            error_kind("join()"),
            LocationErrorKind::EmptyCombinator("join".into())
        );
        assert_eq!(error_kind(""), LocationErrorKind::UnexpectedEnd);
    }

    #[test]
    fn error_carries_text_and_offset() {
        let err = "join(1..5,abc)".parse::<Location>().unwrap_err();
        assert_eq!(err.text, "join(1..5,abc)");
        assert_eq!(err.offset, 13);
        assert!(err.to_string().contains("join(1..5,abc)"));
    }

    #[test]
    fn checked_constructors_reject_empty_parts() {
        assert!(Location::join(vec![]).is_err());
        assert!(Location::one_of(vec![Location::range(0, 1)]).is_ok());
        assert!(Location::Order(vec![]).validate().is_err());
    }

    #[test]
    fn bounds_span_all_segments() {
        assert_eq!(parse("join(5..10,1..3)").bounds(), Some((0, 10)));
        assert_eq!(parse("X1:1..5").bounds(), None);
    }
}
