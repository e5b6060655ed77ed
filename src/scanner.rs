//! Splits the text of one record into its top-level sections.
//!
//! A line whose first column is not blank starts a new section; its keyword
//! is the trimmed text of columns 0..12. Every indented line continues the
//! section above it.

use crate::reader::{ReaderError, ReaderResult};

/// Column where section content starts.
pub(crate) const CONTENT_COLUMN: usize = 12;

/// A raw line and its 1-based number in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// Returns the text from column 12 on.
    ///
    /// Trailing whitespace is kept: a trailing space after a full-width word
    /// tells the text joiner that the next line starts a new word.
    pub fn content(&self) -> &'a str {
        split_keyword(self.text).1
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionKind<'a> {
    Locus,
    Definition,
    Accession,
    Version,
    DbLink,
    Keywords,
    Source,
    Reference,
    Comment,
    Features,
    BaseCount,
    Origin,
    Contig,
    Other(&'a str),
}

impl<'a> SectionKind<'a> {
    fn from_keyword(keyword: &'a str) -> Self {
        match keyword {
            "LOCUS" => SectionKind::Locus,
            "DEFINITION" => SectionKind::Definition,
            "ACCESSION" => SectionKind::Accession,
            "VERSION" => SectionKind::Version,
            "DBLINK" => SectionKind::DbLink,
            "KEYWORDS" => SectionKind::Keywords,
            "SOURCE" => SectionKind::Source,
            "REFERENCE" => SectionKind::Reference,
            "COMMENT" => SectionKind::Comment,
            "FEATURES" => SectionKind::Features,
            "BASE COUNT" => SectionKind::BaseCount,
            "ORIGIN" => SectionKind::Origin,
            "CONTIG" => SectionKind::Contig,
            other => SectionKind::Other(other),
        }
    }
}

/// A top-level section: the keyword line plus its continuation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section<'a> {
    pub kind: SectionKind<'a>,
    pub keyword: &'a str,
    pub lines: Vec<Line<'a>>,
}

/// A keyword-introduced block inside a section, such as `AUTHORS` in a
/// REFERENCE or `ORGANISM` in a SOURCE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block<'a> {
    pub keyword: &'a str,
    pub line: usize,
    pub content: Vec<&'a str>,
}

impl<'a> Section<'a> {
    /// Line number of the keyword line.
    pub fn line(&self) -> usize {
        self.lines.first().map(|line| line.number).unwrap_or(0)
    }

    /// Content of every line from column 12.
    pub fn content(&self) -> Vec<&'a str> {
        self.lines.iter().map(Line::content).collect()
    }

    /// Splits the section at indented sub-keywords.
    ///
    /// The first block carries the section keyword itself. A sub-keyword is
    /// any non-blank text in columns 0..12 of a continuation line.
    pub fn blocks(&self) -> Vec<Block<'a>> {
        let mut blocks: Vec<Block<'a>> = Vec::new();
        for line in &self.lines {
            let (keyword, _) = split_keyword(line.text);
            let keyword = if blocks.is_empty() {
                self.keyword
            } else {
                keyword.trim()
            };
            match blocks.last_mut() {
                Some(block) if keyword.is_empty() => block.content.push(line.content()),
                _ => blocks.push(Block {
                    keyword,
                    line: line.number,
                    content: vec![line.content()],
                }),
            }
        }
        blocks
    }
}

/// Splits a line into its keyword columns and content columns.
fn split_keyword(text: &str) -> (&str, &str) {
    if text.len() <= CONTENT_COLUMN {
        (text, "")
    } else if text.is_char_boundary(CONTENT_COLUMN) {
        text.split_at(CONTENT_COLUMN)
    } else {
        // Multi-byte text inside the keyword columns; fall back to the first
        // whitespace run.
        let idx = text
            .char_indices()
            .find(|(_, c)| c.is_whitespace())
            .map(|(idx, _)| idx)
            .unwrap_or(text.len());
        (&text[..idx], text[idx..].trim_start())
    }
}

/// Scans the lines of one record, `//` excluded.
///
/// `first_line` is the 1-based line number of the first line of `text`.
pub(crate) fn scan(text: &str, first_line: usize) -> ReaderResult<Vec<Section<'_>>> {
    let mut sections: Vec<Section<'_>> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = Line {
            number: first_line + idx,
            text: raw,
        };

        if starts_section(raw, sections.last()) {
            let keyword = split_keyword(raw).0.trim();
            log::trace!("line {}: section {}", line.number, keyword);
            sections.push(Section {
                kind: SectionKind::from_keyword(keyword),
                keyword,
                lines: vec![line],
            });
            continue;
        }

        match sections.last_mut() {
            Some(section) => section.lines.push(line),
            None if line.is_blank() => continue,
            None => {
                return Err(ReaderError::InvalidSection {
                    line: line.number,
                    section: String::new(),
                    message: format!("continuation line before any section: {:?}", raw.trim()),
                })
            }
        }
    }

    Ok(sections)
}

/// Returns `true` if `raw` opens a new top-level section.
fn starts_section(raw: &str, current: Option<&Section<'_>>) -> bool {
    let first = match raw.chars().next() {
        Some(c) => c,
        None => return false,
    };
    if first.is_whitespace() {
        return false;
    }
    // Sequence positions of nine digits or more reach column 0.
    !(first.is_ascii_digit() && matches!(current, Some(s) if s.kind == SectionKind::Origin))
}
