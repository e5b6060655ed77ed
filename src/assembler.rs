//! Builds a [`Record`] from the sections of one record.

use crate::date::Date;
use crate::feature::parse_features;
use crate::location::Location;
use crate::reader::{ReaderError, ReaderOptions, ReaderResult};
use crate::record::{
    DbLink, LengthUnit, RawSection, Record, Reference, Source, Topology, UNKNOWN_DIVISION,
};
use crate::scanner::{scan, Block, Section, SectionKind};

/// Usable width of free-text content lines (columns 12..79).
pub(crate) const TEXT_WIDTH: usize = 79 - 12;

/// Parses the text of one record, terminator excluded.
///
/// `first_line` is the 1-based line number of the first line of `text` in
/// the input, so every error points at the offending line.
pub(crate) fn assemble(
    text: &str,
    first_line: usize,
    options: &ReaderOptions,
) -> ReaderResult<Record> {
    let sections = scan(text, first_line)?;

    let mut iter = sections.iter();
    let locus = match iter.next() {
        Some(section) if section.kind == SectionKind::Locus => section,
        Some(section) => {
            return Err(invalid_section(
                section,
                format!("record must start with LOCUS, found {}", section.keyword),
            ))
        }
        None => {
            return Err(ReaderError::InvalidSection {
                line: first_line,
                section: String::new(),
                message: "empty record".into(),
            })
        }
    };

    let mut record = parse_locus(locus)?;
    let mut seen: Vec<SectionKind<'_>> = vec![SectionKind::Locus];
    let mut origin_line = None;

    for section in iter {
        if is_singular(section.kind) {
            if seen.contains(&section.kind) {
                return Err(invalid_section(
                    section,
                    format!("duplicate {} section", section.keyword),
                ));
            }
            seen.push(section.kind);
        }

        match section.kind {
            SectionKind::Definition => record.definition = Some(join_section(section)),
            SectionKind::Accession => record.accession = Some(join_section(section)),
            SectionKind::Version => record.version = Some(join_section(section)),
            SectionKind::DbLink => record.dblink = parse_dblink(section)?,
            SectionKind::Keywords => record.keywords = Some(parse_keywords(section)),
            SectionKind::Source => record.source = Some(parse_source(section)),
            SectionKind::Reference => record.references.push(parse_reference(section)?),
            SectionKind::Comment => {
                let lines: Vec<&str> = section.content().into_iter().map(str::trim_end).collect();
                let text = lines.join("\n");
                match record.comment.as_mut() {
                    Some(comment) => {
                        comment.push('\n');
                        comment.push_str(&text);
                    }
                    None => record.comment = Some(text),
                }
            }
            SectionKind::Features => record.features = parse_features(&section.lines[1..])?,
            SectionKind::Locus | SectionKind::BaseCount => {}
            SectionKind::Origin => {
                record.sequence = parse_origin(section)?;
                origin_line = Some(section.line());
            }
            SectionKind::Contig => record.contig = Some(parse_contig(section)?),
            SectionKind::Other(keyword) => {
                if options.keeps_unknown_sections() {
                    log::debug!("line {}: keeping unknown section {}", section.line(), keyword);
                    record.unknown_sections.push(RawSection {
                        keyword: keyword.to_string(),
                        lines: section.lines.iter().map(|l| l.text.to_string()).collect(),
                    });
                } else {
                    log::debug!("line {}: dropping unknown section {}", section.line(), keyword);
                }
            }
        }
    }

    if let (Some(line), Some(declared)) = (origin_line, record.length) {
        if options.checks_length() && declared != record.sequence.len() {
            return Err(ReaderError::LengthMismatch {
                line,
                declared,
                actual: record.sequence.len(),
            });
        }
    }

    Ok(record)
}

fn is_singular(kind: SectionKind<'_>) -> bool {
    !matches!(
        kind,
        SectionKind::Reference | SectionKind::Comment | SectionKind::BaseCount | SectionKind::Other(_)
    )
}

fn invalid_section(section: &Section<'_>, message: String) -> ReaderError {
    ReaderError::InvalidSection {
        line: section.line(),
        section: section.keyword.to_string(),
        message,
    }
}

fn invalid_field(line: usize, field: &'static str, message: String) -> ReaderError {
    ReaderError::InvalidField {
        line,
        field,
        message,
    }
}

/// Joins wrapped free-text lines.
///
/// Lines are separated by a single space, except after a line that fills
/// `width` without containing any space: such a line was hard-split inside
/// one long word and is concatenated with the next. Lines are measured
/// before trailing whitespace is removed.
pub(crate) fn join_wrapped<'a, I>(lines: I, width: usize) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    let mut glue = false;
    for line in lines {
        let raw = line.trim_start();
        let line = raw.trim_end();
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() && !glue {
            out.push(' ');
        }
        out.push_str(line);
        glue = raw.chars().count() == width && !raw.contains(' ');
    }
    out
}

fn join_section(section: &Section<'_>) -> String {
    join_wrapped(section.content(), TEXT_WIDTH)
}

fn join_block(block: &Block<'_>) -> String {
    join_wrapped(block.content.iter().copied(), TEXT_WIDTH)
}

/// Splits a string into whitespace-separated tokens with their byte offsets.
fn tokenize(text: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(begin)) => {
                tokens.push((begin, &text[begin..idx]));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(begin) = start {
        tokens.push((begin, &text[begin..]));
    }
    tokens
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// `DD-MON-YYYY` shape; the month is checked when parsing.
fn looks_like_date(token: &str) -> bool {
    let parts: Vec<&str> = token.split('-').collect();
    parts.len() == 3 && is_number(parts[0]) && is_number(parts[2])
}

const DIVISIONS: &[&str] = &[
    "PRI", "ROD", "MAM", "VRT", "INV", "PLN", "BCT", "VRL", "PHG", "SYN", "UNA", "EST", "PAT",
    "STS", "GSS", "HTG", "HTC", "ENV", "CON", "TSA", "UNK",
];

/// Parses the LOCUS line.
///
/// The length is the first integer followed by `bp` or `aa`; everything
/// before it is the name, which may contain spaces. After the unit come the
/// molecule type, the topology, the division and the date, each optional.
fn parse_locus(section: &Section<'_>) -> ReaderResult<Record> {
    let line = section.line();
    let content = section.content().join(" ");
    let tokens = tokenize(&content);

    let unit_idx = tokens
        .windows(2)
        .position(|pair| is_number(pair[0].1) && matches!(pair[1].1, "bp" | "aa"))
        .ok_or_else(|| invalid_field(line, "locus", format!("missing length in {:?}", content)))?;

    let (length_offset, length_token) = tokens[unit_idx];
    let name = content[..length_offset].trim();
    if name.is_empty() {
        return Err(invalid_field(line, "locus", "missing locus name".into()));
    }

    let length: usize = length_token
        .parse()
        .map_err(|_| invalid_field(line, "locus", format!("invalid length {:?}", length_token)))?;

    let mut record = Record::new(name);
    record.length = Some(length);
    record.unit = match tokens[unit_idx + 1].1 {
        "aa" => LengthUnit::AminoAcids,
        _ => LengthUnit::BasePairs,
    };

    let mut rest: Vec<&str> = tokens[unit_idx + 2..].iter().map(|(_, t)| *t).collect();

    if let Some(last) = rest.last().filter(|token| looks_like_date(token)) {
        let date: Date = last
            .parse()
            .map_err(|err| invalid_field(line, "date", format!("{err}")))?;
        record.date = Some(date);
        rest.pop();
    }

    let topology_idx = rest
        .iter()
        .position(|t| t.eq_ignore_ascii_case("linear") || t.eq_ignore_ascii_case("circular"));

    let (molecule, division): (&[&str], &[&str]) = match topology_idx {
        Some(idx) => {
            if rest[idx].eq_ignore_ascii_case("circular") {
                record.topology = Topology::Circular;
            }
            (&rest[..idx], &rest[idx + 1..])
        }
        None => match rest.len() {
            0 => (&[], &[]),
            1 if DIVISIONS.contains(&rest[0]) => (&[], &rest[..]),
            1 => (&rest[..], &[]),
            n => (&rest[..n - 1], &rest[n - 1..]),
        },
    };

    if !molecule.is_empty() {
        record.molecule_type = Some(molecule.join(" "));
    }
    record.division = if division.is_empty() {
        UNKNOWN_DIVISION.to_string()
    } else {
        division.join(" ")
    };

    Ok(record)
}

fn parse_dblink(section: &Section<'_>) -> ReaderResult<Vec<DbLink>> {
    let mut links: Vec<DbLink> = Vec::new();
    for (line, text) in section.lines.iter().zip(section.content()) {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match text.split_once(':') {
            Some((key, value)) => links.push(DbLink::new(key.trim(), value.trim())),
            None => match links.last_mut() {
                Some(link) => {
                    link.value.push(' ');
                    link.value.push_str(text);
                }
                None => {
                    return Err(invalid_field(
                        line.number,
                        "dblink",
                        format!("expected 'key: value', found {:?}", text),
                    ))
                }
            },
        }
    }
    Ok(links)
}

fn parse_keywords(section: &Section<'_>) -> Vec<String> {
    let text = join_section(section);
    text.strip_suffix('.')
        .unwrap_or(&text)
        .split(';')
        .map(str::trim)
        .filter(|kw| !kw.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_source(section: &Section<'_>) -> Source {
    let mut source = Source::default();
    for block in section.blocks() {
        match block.keyword {
            "SOURCE" => source.name = join_block(&block),
            "ORGANISM" => {
                let lines: Vec<&str> = block.content.iter().map(|l| l.trim_start()).collect();
                let split = lines
                    .iter()
                    .skip(1)
                    .position(|l| l.contains(';') || l.trim_end().ends_with('.'))
                    .map(|idx| idx + 1)
                    .unwrap_or(lines.len());

                let organism = join_wrapped(lines[..split].iter().copied(), TEXT_WIDTH);
                source.organism = (!organism.is_empty()).then_some(organism);

                let lineage = join_wrapped(lines[split..].iter().copied(), TEXT_WIDTH);
                source.lineage = lineage
                    .strip_suffix('.')
                    .unwrap_or(&lineage)
                    .split(';')
                    .map(str::trim)
                    .filter(|taxon| !taxon.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            other => log::debug!("line {}: ignoring SOURCE sub-keyword {}", block.line, other),
        }
    }
    source
}

fn parse_reference(section: &Section<'_>) -> ReaderResult<Reference> {
    let mut reference = Reference::default();

    for block in section.blocks() {
        let text = join_block(&block);
        match block.keyword {
            "REFERENCE" => parse_reference_span(&text, block.line, &mut reference)?,
            "AUTHORS" => reference.authors = split_authors(&text),
            "CONSRTM" => reference.consortium = Some(text),
            "TITLE" => reference.title = Some(text),
            "JOURNAL" => reference.journal = Some(text),
            "PUBMED" => {
                let id = text.parse().map_err(|_| {
                    invalid_field(block.line, "pubmed", format!("not an integer: {:?}", text))
                })?;
                reference.pubmed = Some(id);
            }
            "REMARK" => reference.remark = Some(text),
            other => log::debug!("line {}: ignoring REFERENCE sub-keyword {}", block.line, other),
        }
    }

    Ok(reference)
}

/// Parses `1  (bases 1 to 10; 20 to 30)` and its `(residues ..)` and
/// `(sites)` variants.
fn parse_reference_span(text: &str, line: usize, reference: &mut Reference) -> ReaderResult<()> {
    let rest = text
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim();
    if rest.is_empty() {
        return Ok(());
    }

    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| invalid_field(line, "reference", format!("malformed span {:?}", rest)))?
        .trim();

    if inner == "sites" {
        reference.sites = true;
        return Ok(());
    }

    let spans = inner
        .strip_prefix("bases")
        .or_else(|| inner.strip_prefix("residues"))
        .ok_or_else(|| invalid_field(line, "reference", format!("malformed span {:?}", rest)))?;

    for span in spans.split(';') {
        let (start, end) = span
            .split_once(" to ")
            .ok_or_else(|| invalid_field(line, "reference", format!("malformed span {:?}", span)))?;
        let parse = |value: &str| {
            value.trim().parse::<i64>().map_err(|_| {
                invalid_field(line, "reference", format!("invalid position {:?}", value.trim()))
            })
        };
        reference.locations.push((parse(start)? - 1, parse(end)?));
    }

    Ok(())
}

/// Splits `A,B., C,D. and E,F.` into its authors.
fn split_authors(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut authors: Vec<String> = text.split(", ").map(str::to_string).collect();
    if let Some(last) = authors.pop() {
        match last.rsplit_once(" and ") {
            Some((head, tail)) => {
                authors.push(head.to_string());
                authors.push(tail.to_string());
            }
            None => authors.push(last),
        }
    }
    authors
}

/// Collects residues, dropping position numbers and spacing.
fn parse_origin(section: &Section<'_>) -> ReaderResult<Vec<u8>> {
    let mut sequence = Vec::new();
    for line in &section.lines[1..] {
        for c in line.text.chars() {
            match c {
                c if c.is_ascii_digit() || c.is_whitespace() => {}
                c if c.is_ascii_alphabetic() => sequence.push(c.to_ascii_uppercase() as u8),
                '-' | '.' | '*' => sequence.push(c as u8),
                other => {
                    return Err(invalid_field(
                        line.number,
                        "sequence",
                        format!("invalid residue {:?}", other),
                    ))
                }
            }
        }
    }
    Ok(sequence)
}

fn parse_contig(section: &Section<'_>) -> ReaderResult<Location> {
    let text: String = section.content().iter().map(|l| l.trim()).collect();
    text.parse().map_err(|source| ReaderError::InvalidLocation {
        line: section.line(),
        source,
    })
}
