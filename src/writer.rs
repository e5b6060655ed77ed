use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "gzip")]
use flate2::write::GzEncoder;
#[cfg(feature = "gzip")]
use flate2::Compression as GzCompression;

use crate::assembler::TEXT_WIDTH;
use crate::feature::{QUALIFIER_COLUMN, QUALIFIER_WIDTH, UNSPACED_KEYS};
use crate::record::{Feature, Qualifier, QualifierKind, Record, Reference};

/// Result alias for writer operations.
pub type WriterResult<T> = Result<T, WriterError>;

/// Errors that can occur while writing records.
#[derive(Debug)]
pub enum WriterError {
    /// An I/O error occurred while writing.
    Io(io::Error),
    /// A value cannot be represented in the flat-file format.
    Invalid {
        /// The offending field.
        field: &'static str,
        /// The error message.
        message: String,
    },
    /// The requested operation cannot be performed with the current feature set.
    Unsupported(String),
}

impl fmt::Display for WriterError {
    /// Formats the writer error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterError::Io(err) => write!(f, "write error: {err}"),
            WriterError::Invalid { field, message } => write!(f, "invalid {field}: {message}"),
            WriterError::Unsupported(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for WriterError {
    /// Returns the source error, if any.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriterError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for WriterError {
    /// Creates a new `WriterError` from an `io::Error`.
    fn from(err: io::Error) -> Self {
        WriterError::Io(err)
    }
}

fn invalid(field: &'static str, message: String) -> WriterError {
    WriterError::Invalid { field, message }
}

/// Letter case of the ORIGIN block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceCase {
    /// Write residues as stored. Parsed records hold uppercase residues.
    #[default]
    Preserve,
    /// Classic GenBank lowercase.
    Lower,
    /// Uppercase residues.
    Upper,
}

/// Layout switches for the [`Writer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriterOptions {
    escape_locus: bool,
    truncate_locus: bool,
    sequence_case: SequenceCase,
}

impl WriterOptions {
    /// Creates a new options builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whitespace in the locus name with `_`.
    pub fn escape_locus(mut self, escape: bool) -> Self {
        self.escape_locus = escape;
        self
    }

    /// Shortens the locus name until the LOCUS line fits in 79 columns.
    pub fn truncate_locus(mut self, truncate: bool) -> Self {
        self.truncate_locus = truncate;
        self
    }

    /// Sets the letter case of the ORIGIN block.
    pub fn sequence_case(mut self, case: SequenceCase) -> Self {
        self.sequence_case = case;
        self
    }
}

/// Serializes records to GenBank text.
///
/// Each record is rendered in full before anything reaches the sink, so a
/// record that fails validation writes nothing.
///
/// # Example
///
/// ```
/// use genbank::{Feature, Location, Qualifier, Record, Writer};
///
/// let mut record = Record::new("demo").with_sequence("ATGTAA");
/// record.features.push(
///     Feature::new("CDS", Location::range(0, 6))
///         .with_qualifier(Qualifier::new("translation", "M")),
/// );
///
/// let mut out = Vec::new();
/// Writer::from_record(&record, &mut out).unwrap();
/// assert!(String::from_utf8(out).unwrap().ends_with("        1 ATGTAA\n//\n"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Writer {
    options: WriterOptions,
}

impl Writer {
    /// Creates a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with the given options.
    pub fn with_options(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Writes a single record with default options.
    pub fn from_record<W: Write>(record: &Record, writer: &mut W) -> WriterResult<()> {
        Self::new().write_record(record, writer)
    }

    /// Writes all records with default options.
    pub fn from_records<W: Write>(records: &[Record], writer: &mut W) -> WriterResult<()> {
        Self::new().write_records(records, writer)
    }

    /// Opens a path and writes all records, gzip-compressing `.gz` outputs
    /// when the `gzip` feature is enabled.
    pub fn to_path<P: AsRef<Path>>(path: P, records: &[Record]) -> WriterResult<()> {
        Self::new().write_path(path, records)
    }

    /// Writes one record, `//` terminator included.
    pub fn write_record<W: Write>(&self, record: &Record, writer: &mut W) -> WriterResult<()> {
        let text = self.render(record)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Writes records in order, stopping at the first error.
    pub fn write_records<W: Write>(&self, records: &[Record], writer: &mut W) -> WriterResult<()> {
        for record in records {
            self.write_record(record, writer)?;
        }
        Ok(())
    }

    /// Like [`Writer::to_path`], with this writer's options.
    pub fn write_path<P: AsRef<Path>>(&self, path: P, records: &[Record]) -> WriterResult<()> {
        let path = path.as_ref();
        if path.extension().is_some_and(|ext| ext == "gz") {
            return self.write_gzip(path, records);
        }

        let mut writer = BufWriter::with_capacity(64 * 1024, File::create(path)?);
        self.write_records(records, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    #[cfg(feature = "gzip")]
    fn write_gzip(&self, path: &Path, records: &[Record]) -> WriterResult<()> {
        let encoder = GzEncoder::new(File::create(path)?, GzCompression::default());
        let mut writer = BufWriter::with_capacity(64 * 1024, encoder);
        self.write_records(records, &mut writer)?;
        writer
            .into_inner()
            .map_err(|err| WriterError::Io(err.into_error()))?
            .finish()?;
        Ok(())
    }

    #[cfg(not(feature = "gzip"))]
    fn write_gzip(&self, _path: &Path, _records: &[Record]) -> WriterResult<()> {
        Err(WriterError::Unsupported(
            "enable the `gzip` feature to write gzip outputs".into(),
        ))
    }

    /// Renders one record to a string.
    pub fn render(&self, record: &Record) -> WriterResult<String> {
        let mut out = String::with_capacity(256 + record.sequence.len() * 2);

        self.write_locus(record, &mut out)?;

        if let Some(definition) = &record.definition {
            write_field(&mut out, "DEFINITION  ", definition);
        }
        if let Some(accession) = &record.accession {
            write_field(&mut out, "ACCESSION   ", accession);
        }
        if let Some(version) = &record.version {
            write_field(&mut out, "VERSION     ", version);
        }
        for (idx, link) in record.dblink.iter().enumerate() {
            let header = if idx == 0 { "DBLINK      " } else { BLANK };
            write_field(&mut out, header, &format!("{}: {}", link.key, link.value));
        }
        if let Some(keywords) = &record.keywords {
            write_field(&mut out, "KEYWORDS    ", &format!("{}.", keywords.join("; ")));
        }
        if let Some(source) = &record.source {
            write_field(&mut out, "SOURCE      ", &source.name);
            if source.organism.is_some() || !source.lineage.is_empty() {
                write_field(
                    &mut out,
                    "  ORGANISM  ",
                    source.organism.as_deref().unwrap_or_default(),
                );
                if !source.lineage.is_empty() {
                    write_field(&mut out, BLANK, &format!("{}.", source.lineage.join("; ")));
                }
            }
        }
        for (idx, reference) in record.references.iter().enumerate() {
            write_reference(&mut out, idx + 1, reference, record.unit.span_word())?;
        }
        if let Some(comment) = &record.comment {
            for (idx, paragraph) in comment.split('\n').enumerate() {
                let header = if idx == 0 { "COMMENT     " } else { BLANK };
                write_field(&mut out, header, paragraph);
            }
        }
        for section in &record.unknown_sections {
            for line in &section.lines {
                out.push_str(line);
                out.push('\n');
            }
        }

        if !record.features.is_empty() {
            out.push_str("FEATURES             Location/Qualifiers\n");
            for feature in &record.features {
                write_feature(&mut out, feature)?;
            }
        }

        if let Some(contig) = &record.contig {
            contig
                .validate()
                .map_err(|err| invalid("contig", err.to_string()))?;
            let text = contig.to_string();
            for (idx, line) in split_location(&text, TEXT_WIDTH).into_iter().enumerate() {
                out.push_str(if idx == 0 { "CONTIG      " } else { BLANK });
                out.push_str(line);
                out.push('\n');
            }
        }

        let wants_origin = !record.sequence.is_empty()
            || (record.contig.is_none() && record.length.unwrap_or(0) == 0);
        if wants_origin {
            self.write_origin(&record.sequence, &mut out)?;
        }

        out.push_str("//\n");
        Ok(out)
    }

    /// Writes the LOCUS line.
    ///
    /// The length ends at column 40, the unit starts at column 41, the
    /// molecule type at 44 (with a strandedness prefix such as `ds-`) or 47,
    /// and the topology at 55.
    fn write_locus(&self, record: &Record, out: &mut String) -> WriterResult<()> {
        if !record.sequence.is_empty() {
            if let Some(length) = record.length {
                if length != record.sequence.len() {
                    return Err(invalid(
                        "length",
                        format!(
                            "declared length {} differs from sequence length {}",
                            length,
                            record.sequence.len()
                        ),
                    ));
                }
            }
        }

        let mut name: String = if self.options.escape_locus {
            record
                .name
                .chars()
                .map(|c| if c.is_whitespace() { '_' } else { c })
                .collect()
        } else {
            record.name.clone()
        };
        if name.trim().is_empty() || name.contains('\n') {
            return Err(invalid("name", format!("cannot write locus name {:?}", name)));
        }

        let length = record.length.unwrap_or(record.sequence.len());
        let mut line = locus_line(record, &name, length);
        if self.options.truncate_locus {
            while line.chars().count() > 79 && name.chars().count() > 1 {
                name.pop();
                line = locus_line(record, &name, length);
            }
        }

        out.push_str(&line);
        out.push('\n');
        Ok(())
    }

    fn write_origin(&self, sequence: &[u8], out: &mut String) -> WriterResult<()> {
        if let Some(pos) = sequence
            .iter()
            .position(|&b| !(b.is_ascii_alphabetic() || matches!(b, b'-' | b'.' | b'*')))
        {
            return Err(invalid(
                "sequence",
                format!("residue {:?} at position {} cannot be written", sequence[pos] as char, pos + 1),
            ));
        }

        out.push_str("ORIGIN      \n");
        for (line_idx, chunk) in sequence.chunks(60).enumerate() {
            out.push_str(&format!("{:>9}", line_idx * 60 + 1));
            for group in chunk.chunks(10) {
                out.push(' ');
                for &b in group {
                    let b = match self.options.sequence_case {
                        SequenceCase::Preserve => b,
                        SequenceCase::Lower => b.to_ascii_lowercase(),
                        SequenceCase::Upper => b.to_ascii_uppercase(),
                    };
                    out.push(b as char);
                }
            }
            out.push('\n');
        }
        Ok(())
    }
}

/// Twelve spaces: the indent of continuation lines.
const BLANK: &str = "            ";

fn pad_to(line: &mut String, column: usize) {
    let len = line.chars().count();
    if len >= column {
        line.push(' ');
    } else {
        line.extend(std::iter::repeat(' ').take(column - len));
    }
}

fn locus_line(record: &Record, name: &str, length: usize) -> String {
    let digits = length.to_string();
    let width = digits
        .len()
        .max(28usize.saturating_sub(name.chars().count() + 1));

    let mut line = format!(
        "LOCUS       {} {:>width$} {}",
        name,
        digits,
        record.unit.as_str(),
        width = width
    );

    if let Some(molecule) = &record.molecule_type {
        let stranded = molecule.as_bytes().get(2) == Some(&b'-');
        line.push_str(if stranded { " " } else { "    " });
        line.push_str(molecule);
    }
    pad_to(&mut line, 55);
    line.push_str(record.topology.as_str());
    line.push(' ');
    line.push_str(&record.division);
    if let Some(date) = record.date {
        line.push(' ');
        line.push_str(&date.to_string());
    }
    line
}

/// Wraps `text` at whitespace so no line exceeds `width` characters.
///
/// A word longer than `width` is split at the width. With `spaced == false`
/// the text is always split at the width, for residue strings.
///
/// A full-width line without a space reads back as one half of a split word,
/// so a word that fills the width on its own keeps the following space as a
/// trailing character.
fn wrap(text: &str, width: usize, spaced: bool) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text.trim_end();

    while rest.chars().count() > width {
        let limit = byte_offset(rest, width);
        let space_break = if spaced {
            let upto = byte_offset(rest, width + 1);
            rest[..upto].rfind(' ').filter(|&idx| idx > 0)
        } else {
            None
        };

        match space_break {
            Some(idx) => {
                let line = rest[..idx].trim_end();
                if line.len() == idx && idx == limit && !line.contains(' ') {
                    lines.push(&rest[..idx + 1]);
                } else {
                    lines.push(line);
                }
                rest = rest[idx..].trim_start();
            }
            None => {
                lines.push(&rest[..limit]);
                rest = &rest[limit..];
            }
        }
    }

    if !rest.is_empty() || lines.is_empty() {
        lines.push(rest);
    }
    lines
}

/// Byte offset of the `chars`-th character, or the end of `text`.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Writes a keyword line and its wrapped continuation lines.
fn write_field(out: &mut String, header: &str, text: &str) {
    for (idx, line) in wrap(text, TEXT_WIDTH, true).into_iter().enumerate() {
        let prefix = if idx == 0 { header } else { BLANK };
        if line.is_empty() {
            out.push_str(prefix.trim_end());
        } else {
            out.push_str(prefix);
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn write_reference(
    out: &mut String,
    number: usize,
    reference: &Reference,
    span_word: &str,
) -> WriterResult<()> {
    if let Some((start, end)) = reference
        .locations
        .iter()
        .find(|(start, end)| !(0..i64::MAX).contains(start) || *end < 1)
    {
        return Err(invalid(
            "reference",
            format!("span {start}..{end} of reference {number} cannot be written"),
        ));
    }

    let mut header = format!("{:<3}", number);
    if reference.sites {
        header.push_str("(sites)");
    } else if !reference.locations.is_empty() {
        let spans: Vec<String> = reference
            .locations
            .iter()
            .map(|(start, end)| format!("{} to {}", start + 1, end))
            .collect();
        header.push_str(&format!("({} {})", span_word, spans.join("; ")));
    }
    write_field(out, "REFERENCE   ", &header);

    if !reference.authors.is_empty() {
        write_field(out, "  AUTHORS   ", &join_authors(&reference.authors));
    }
    if let Some(consortium) = &reference.consortium {
        write_field(out, "  CONSRTM   ", consortium);
    }
    if let Some(title) = &reference.title {
        write_field(out, "  TITLE     ", title);
    }
    if let Some(journal) = &reference.journal {
        write_field(out, "  JOURNAL   ", journal);
    }
    if let Some(pubmed) = reference.pubmed {
        write_field(out, "   PUBMED   ", &pubmed.to_string());
    }
    if let Some(remark) = &reference.remark {
        write_field(out, "  REMARK    ", remark);
    }
    Ok(())
}

/// `a, b and c`
fn join_authors(authors: &[String]) -> String {
    match authors {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    }
}

/// Splits a location after commas so each line fits in `width`.
fn split_location(text: &str, width: usize) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while rest.chars().count() > width {
        let limit = byte_offset(rest, width);
        let idx = rest[..limit]
            .rfind(',')
            .map(|idx| idx + 1)
            .unwrap_or(limit);
        lines.push(&rest[..idx]);
        rest = &rest[idx..];
    }
    lines.push(rest);
    lines
}

fn write_feature(out: &mut String, feature: &Feature) -> WriterResult<()> {
    if feature.kind.is_empty() || feature.kind.contains(char::is_whitespace) {
        return Err(invalid(
            "feature",
            format!("feature key {:?} cannot be written", feature.kind),
        ));
    }
    feature
        .location
        .validate()
        .map_err(|err| invalid("location", err.to_string()))?;

    let location = feature.location.to_string();
    for (idx, line) in split_location(&location, QUALIFIER_WIDTH)
        .into_iter()
        .enumerate()
    {
        if idx == 0 {
            out.push_str(&format!("     {:<15} ", feature.kind));
        } else {
            out.push_str(&" ".repeat(QUALIFIER_COLUMN));
        }
        out.push_str(line);
        out.push('\n');
    }

    for qualifier in &feature.qualifiers {
        write_qualifier(out, qualifier)?;
    }
    Ok(())
}

fn write_qualifier(out: &mut String, qualifier: &Qualifier) -> WriterResult<()> {
    let key = &qualifier.key;
    if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '=') {
        return Err(invalid(
            "qualifier",
            format!("qualifier key {:?} cannot be written", key),
        ));
    }

    let text = match (qualifier.kind(), qualifier.value.as_deref()) {
        (QualifierKind::Flag, _) | (_, None) => format!("/{key}"),
        (QualifierKind::Bare, Some(value)) => {
            if value.contains(|c: char| c.is_whitespace() || c == '"') {
                return Err(invalid(
                    "qualifier",
                    format!("/{key} value {:?} must be written unquoted", value),
                ));
            }
            format!("/{key}={value}")
        }
        (QualifierKind::Quoted, Some(value)) => {
            if value.contains(['\n', '\r']) {
                return Err(invalid(
                    "qualifier",
                    format!("/{key} value contains a line break"),
                ));
            }
            format!("/{key}=\"{}\"", value.replace('"', "\"\""))
        }
    };

    let spaced = !UNSPACED_KEYS.contains(&key.as_str());
    let indent = " ".repeat(QUALIFIER_COLUMN);
    for line in wrap(&text, QUALIFIER_WIDTH, spaced) {
        out.push_str(&indent);
        out.push_str(line);
        out.push('\n');
    }
    Ok(())
}
