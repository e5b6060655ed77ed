//! Feature table parsing.
//!
//! Layout of the FEATURES section:
//!
//! ```text
//!      CDS             complement(join(1..10,
//!                      20..30))
//!                      /gene="abc"
//!                      /translation="MKV..."
//! ```
//!
//! Keys start at column 5, locations and qualifiers at column 21.

use crate::location::Location;
use crate::reader::{ReaderError, ReaderResult};
use crate::record::{Feature, Qualifier};
use crate::scanner::Line;

/// Column where feature locations and qualifiers start.
pub(crate) const QUALIFIER_COLUMN: usize = 21;
/// Usable width of a qualifier or location line.
pub(crate) const QUALIFIER_WIDTH: usize = 79 - QUALIFIER_COLUMN;

/// Qualifiers whose wrapped lines are concatenated without a separator.
pub(crate) const UNSPACED_KEYS: &[&str] = &["translation", "transcription", "peptide"];

/// Parses the lines that follow the `FEATURES` header.
pub(crate) fn parse_features(lines: &[Line<'_>]) -> ReaderResult<Vec<Feature>> {
    let mut features = Vec::new();
    let mut pending: Option<PendingFeature<'_>> = None;

    for line in lines {
        if line.is_blank() {
            continue;
        }

        let raw = line.text.trim_start();
        let indent = line.text.len() - raw.len();
        let body = raw.trim_end();

        if indent < QUALIFIER_COLUMN {
            if let Some(feature) = pending.take() {
                features.push(feature.finish()?);
            }
            let (kind, location) = match body.find(char::is_whitespace) {
                Some(idx) => (&body[..idx], body[idx..].trim_start()),
                None => (body, ""),
            };
            pending = Some(PendingFeature::new(kind, location, line.number));
            continue;
        }

        match pending.as_mut() {
            Some(feature) => feature.push(raw, line.number),
            None => {
                return Err(ReaderError::OrphanQualifier {
                    line: line.number,
                    text: body.to_string(),
                })
            }
        }
    }

    if let Some(feature) = pending.take() {
        features.push(feature.finish()?);
    }

    Ok(features)
}

/// A feature whose lines are still being collected.
struct PendingFeature<'a> {
    kind: &'a str,
    line: usize,
    location: String,
    qualifiers: Vec<PendingQualifier>,
}

impl<'a> PendingFeature<'a> {
    fn new(kind: &'a str, location: &str, line: usize) -> Self {
        Self {
            kind,
            line,
            location: location.to_string(),
            qualifiers: Vec::new(),
        }
    }

    /// Routes one line indented to the qualifier column.
    ///
    /// `raw` keeps its trailing whitespace, which the join policy inspects.
    fn push(&mut self, raw: &str, line: usize) {
        let open = self.qualifiers.last().is_some_and(|q| q.open);
        if !open && raw.starts_with('/') {
            self.qualifiers.push(PendingQualifier::new(raw, line));
            return;
        }
        match self.qualifiers.last_mut() {
            Some(qualifier) => qualifier.append(raw),
            None => self.location.push_str(raw.trim_end()),
        }
    }

    fn finish(self) -> ReaderResult<Feature> {
        let location: Location =
            self.location
                .parse()
                .map_err(|source| ReaderError::InvalidLocation {
                    line: self.line,
                    source,
                })?;

        let qualifiers = self
            .qualifiers
            .into_iter()
            .map(PendingQualifier::finish)
            .collect::<ReaderResult<Vec<_>>>()?;

        Ok(Feature {
            kind: self.kind.to_string(),
            location,
            qualifiers,
        })
    }
}

/// A qualifier whose value may still continue on the next line.
struct PendingQualifier {
    key: String,
    value: Option<String>,
    line: usize,
    quoted: bool,
    open: bool,
    /// Length and spacing of the last physical line, for the join policy.
    last_len: usize,
    last_spaced: bool,
}

impl PendingQualifier {
    fn new(raw: &str, line: usize) -> Self {
        let text = &raw.trim_end()[1..];
        let (key, value) = match text.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (text, None),
        };
        let quoted = value.is_some_and(|v| v.starts_with('"'));
        let open = quoted && !value.is_some_and(closes_quote);

        Self {
            key: key.trim().to_string(),
            value: value.map(str::to_string),
            line,
            quoted,
            open,
            last_len: raw.chars().count(),
            last_spaced: raw.contains(' '),
        }
    }

    /// Appends a continuation line.
    ///
    /// Quoted lines are joined with a single space unless the key holds a
    /// residue string, or the previous line filled the whole qualifier width
    /// without any space, which marks a value hard-split at the wrap column.
    /// Unquoted values never hold spaces and are concatenated.
    fn append(&mut self, raw: &str) {
        let body = raw.trim_end();
        let value = self.value.get_or_insert_with(String::new);
        let hard_split = self.last_len == QUALIFIER_WIDTH && !self.last_spaced;
        let glue = !self.quoted || hard_split || UNSPACED_KEYS.contains(&self.key.as_str());
        if !(value.is_empty() || glue) {
            value.push(' ');
        }
        value.push_str(body);

        self.last_len = raw.chars().count();
        self.last_spaced = raw.contains(' ');
        if self.quoted {
            self.open = !closes_quote(value);
        }
    }

    fn finish(self) -> ReaderResult<Qualifier> {
        if self.open {
            return Err(ReaderError::InvalidField {
                line: self.line,
                field: "qualifier",
                message: format!("unterminated quoted value for /{}", self.key),
            });
        }

        let value = match self.value {
            Some(raw) if self.quoted => {
                let inner = &raw[1..raw.len() - 1];
                Some(inner.replace("\"\"", "\""))
            }
            other => other,
        };

        Ok(Qualifier {
            key: self.key,
            value,
        })
    }
}

/// Returns `true` if a raw value starting with `"` has its closing quote.
///
/// Inner quotes are doubled, so the value is closed when the run of `"`
/// at its end (opening quote excluded) has odd length.
fn closes_quote(raw: &str) -> bool {
    let body = &raw[1..];
    let run = body.bytes().rev().take_while(|&b| b == b'"').count();
    run % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<Line<'_>> {
        text.lines()
            .enumerate()
            .map(|(idx, text)| Line {
                number: idx + 1,
                text,
            })
            .collect()
    }

    #[test]
    fn parses_features_with_qualifiers() {
        let text = "     source          1..100
                     /organism=\"Escherichia coli\"
                     /mol_type=\"genomic DNA\"
     CDS             complement(10..
                     90)
                     /codon_start=1
                     /pseudo
                     /db_xref=\"GI:1\"
                     /db_xref=\"GI:2\"";
        let features = parse_features(&lines(text)).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].kind, "source");
        assert_eq!(
            features[0].qualifier("organism"),
            Some(Some("Escherichia coli"))
        );

        let cds = &features[1];
        assert_eq!(
            cds.location,
            Location::complement(Location::range(9, 90))
        );
        assert_eq!(cds.qualifier("codon_start"), Some(Some("1")));
        assert_eq!(cds.qualifier("pseudo"), Some(None));
        let xrefs: Vec<_> = cds.qualifier_values("db_xref").collect();
        assert_eq!(xrefs, vec!["GI:1", "GI:2"]);
    }

    #[test]
    fn joins_wrapped_text_with_spaces() {
        let text = "     gene            1..3
                     /note=\"a long note that
                     continues here\"";
        let features = parse_features(&lines(text)).unwrap();
        assert_eq!(
            features[0].qualifier("note"),
            Some(Some("a long note that continues here"))
        );
    }

    #[test]
    fn concatenates_translation_lines() {
        let text = "     CDS             1..30
                     /translation=\"MKVLAAGIVG
                     LLLAA\"";
        let features = parse_features(&lines(text)).unwrap();
        assert_eq!(
            features[0].qualifier("translation"),
            Some(Some("MKVLAAGIVGLLLAA"))
        );
    }

    #[test]
    fn concatenates_hard_split_lines() {
        let first = format!("/db_xref=\"{}", "x".repeat(QUALIFIER_WIDTH - 10));
        assert_eq!(first.len(), QUALIFIER_WIDTH);
        let text = format!(
            "     gene            1..3\n{pad}{first}\n{pad}yz\"",
            pad = " ".repeat(QUALIFIER_COLUMN)
        );
        let features = parse_features(&lines(&text)).unwrap();
        let expected = format!("{}yz", "x".repeat(QUALIFIER_WIDTH - 10));
        assert_eq!(
            features[0].qualifier("db_xref"),
            Some(Some(expected.as_str()))
        );
    }

    #[test]
    fn trailing_space_ends_a_full_width_word() {
        let first = format!("/note=\"{} ", "x".repeat(QUALIFIER_WIDTH - 7));
        let text = format!(
            "     gene            1..3\n{pad}{first}\n{pad}tail\"",
            pad = " ".repeat(QUALIFIER_COLUMN)
        );
        let features = parse_features(&lines(&text)).unwrap();
        let expected = format!("{} tail", "x".repeat(QUALIFIER_WIDTH - 7));
        assert_eq!(features[0].qualifier("note"), Some(Some(expected.as_str())));
    }

    #[test]
    fn concatenates_unquoted_lines() {
        let text = "     CDS             1..30
                     /transl_except=(pos:join(5026..5027,5028),
                     aa:TERM)
                     /codon_start=1";
        let features = parse_features(&lines(text)).unwrap();
        assert_eq!(
            features[0].qualifier("transl_except"),
            Some(Some("(pos:join(5026..5027,5028),aa:TERM)"))
        );
        assert_eq!(features[0].qualifier("codon_start"), Some(Some("1")));
    }

    #[test]
    fn unescapes_doubled_quotes() {
        let text = "     misc_feature    1..3
                     /note=\"say \"\"hi\"\"\"
                     /gene=\"a\"";
        let features = parse_features(&lines(text)).unwrap();
        assert_eq!(features[0].qualifier("note"), Some(Some("say \"hi\"")));
        assert_eq!(features[0].qualifier("gene"), Some(Some("a")));
    }

    #[test]
    fn slash_inside_open_quote_is_text() {
        let text = "     misc_feature    1..3
                     /note=\"first line
                     /not a qualifier\"";
        let features = parse_features(&lines(text)).unwrap();
        assert_eq!(features[0].qualifiers.len(), 1);
        assert_eq!(
            features[0].qualifier("note"),
            Some(Some("first line /not a qualifier"))
        );
    }

    #[test]
    fn rejects_orphan_qualifier() {
        let text = "                     /gene=\"abc\"";
        let err = parse_features(&lines(text)).unwrap_err();
        assert!(matches!(err, ReaderError::OrphanQualifier { line: 1, .. }));
    }

    #[test]
    fn reports_bad_location_with_line() {
        let text = "     gene            1..3\n     CDS             join(1..";
        let err = parse_features(&lines(text)).unwrap_err();
        assert!(matches!(err, ReaderError::InvalidLocation { line: 2, .. }));
    }

    #[test]
    fn rejects_unterminated_value() {
        let text = "     gene            1..3\n                     /note=\"open";
        let err = parse_features(&lines(text)).unwrap_err();
        assert!(matches!(err, ReaderError::InvalidField { .. }));
    }
}
