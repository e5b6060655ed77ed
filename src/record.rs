use std::fmt;

use crate::date::Date;
use crate::location::Location;

/// Division code written when a record does not declare one.
pub const UNKNOWN_DIVISION: &str = "UNK";

/// Shape of the molecule declared on the LOCUS line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Topology {
    /// A linear molecule.
    #[default]
    Linear,
    /// A circular molecule such as a plasmid.
    Circular,
}

impl Topology {
    /// Returns the LOCUS token (`linear` or `circular`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Linear => "linear",
            Topology::Circular => "circular",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of the LOCUS length: base pairs for nucleotides, residues for proteins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LengthUnit {
    /// Nucleotide length (`bp`).
    #[default]
    BasePairs,
    /// Protein length (`aa`).
    AminoAcids,
}

impl LengthUnit {
    /// Returns the LOCUS token (`bp` or `aa`).
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthUnit::BasePairs => "bp",
            LengthUnit::AminoAcids => "aa",
        }
    }

    /// Returns the word used in REFERENCE spans (`bases` or `residues`).
    pub(crate) fn span_word(&self) -> &'static str {
        match self {
            LengthUnit::BasePairs => "bases",
            LengthUnit::AminoAcids => "residues",
        }
    }
}

/// A `DBLINK` cross-reference, e.g. `BioProject: PRJNA1234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbLink {
    /// Database name, e.g. `BioProject`.
    pub key: String,
    /// Identifier in that database.
    pub value: String,
}

impl DbLink {
    /// Creates a cross-reference.
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The `SOURCE` section and its `ORGANISM` sub-block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Source {
    /// Free-text source name from the SOURCE line.
    pub name: String,
    /// Formal organism name from the ORGANISM line.
    pub organism: Option<String>,
    /// Taxonomic lineage, broadest first.
    pub lineage: Vec<String>,
}

impl Source {
    /// Creates a source with a name and no organism or lineage.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            organism: None,
            lineage: Vec::new(),
        }
    }
}

/// A literature citation from a `REFERENCE` block.
///
/// Reference numbers are not stored; the writer numbers references by
/// their position in [`Record::references`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Reference {
    /// 0-based half-open spans the citation covers. Empty means the whole
    /// record.
    pub locations: Vec<(i64, i64)>,
    /// `true` for citations written `(sites)`.
    pub sites: bool,
    /// Author names in citation order.
    pub authors: Vec<String>,
    /// Consortium name (`CONSRTM`).
    pub consortium: Option<String>,
    /// Article title.
    pub title: Option<String>,
    /// Journal citation, or `Unpublished`.
    pub journal: Option<String>,
    /// PubMed identifier.
    pub pubmed: Option<u64>,
    /// Free-text remark.
    pub remark: Option<String>,
}

/// Whether a qualifier is written quoted, bare, or as a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualifierKind {
    /// `/key="value"`
    Quoted,
    /// `/key=value`
    Bare,
    /// `/key`
    Flag,
}

/// Qualifier keys whose values INSDC writes without quotes.
const BARE_KEYS: &[&str] = &[
    "anticodon",
    "citation",
    "codon_start",
    "compare",
    "direction",
    "estimated_length",
    "mod_base",
    "number",
    "rpt_type",
    "rpt_unit_range",
    "tag_peptide",
    "transl_except",
    "transl_table",
];

impl QualifierKind {
    /// Returns how a qualifier with this key and value is written.
    pub fn of(key: &str, value: Option<&str>) -> Self {
        match value {
            None => QualifierKind::Flag,
            Some(_) if BARE_KEYS.contains(&key) => QualifierKind::Bare,
            Some(_) => QualifierKind::Quoted,
        }
    }
}

/// A `/key=value` attribute of a feature. `value` is `None` for flags such
/// as `/pseudo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Qualifier {
    /// Qualifier name without the leading `/`.
    pub key: String,
    /// Unquoted, unescaped value.
    pub value: Option<String>,
}

impl Qualifier {
    /// Creates a qualifier with a value.
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a value-less qualifier.
    pub fn flag<K: Into<String>>(key: K) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    /// Returns how this qualifier is written.
    #[inline]
    pub fn kind(&self) -> QualifierKind {
        QualifierKind::of(&self.key, self.value.as_deref())
    }
}

/// An entry of the feature table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Feature {
    /// Feature key, e.g. `CDS` or `gene`.
    pub kind: String,
    /// Where the feature lies on the record sequence.
    pub location: Location,
    /// Qualifiers in file order; keys may repeat.
    pub qualifiers: Vec<Qualifier>,
}

impl Feature {
    /// Creates a feature without qualifiers.
    pub fn new<K: Into<String>>(kind: K, location: Location) -> Self {
        Self {
            kind: kind.into(),
            location,
            qualifiers: Vec::new(),
        }
    }

    /// Appends a qualifier, builder style.
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Returns the value of the first qualifier named `key`.
    ///
    /// A flag qualifier yields `Some(None)`.
    pub fn qualifier(&self, key: &str) -> Option<Option<&str>> {
        self.qualifiers
            .iter()
            .find(|q| q.key == key)
            .map(|q| q.value.as_deref())
    }

    /// Returns the values of every qualifier named `key`, in order.
    pub fn qualifier_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.qualifiers
            .iter()
            .filter(move |q| q.key == key)
            .filter_map(|q| q.value.as_deref())
    }
}

/// A top-level section the reader did not recognize, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawSection {
    /// The keyword in columns 0..12, trimmed.
    pub keyword: String,
    /// Complete raw lines, keyword line included.
    pub lines: Vec<String>,
}

/// One GenBank entry.
///
/// All fields are public; [`Record::new`] fills in the same defaults the
/// reader uses for sections that are absent from a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    /// Locus name.
    pub name: String,
    /// Declared length. Must match `sequence.len()` when the sequence is
    /// present.
    pub length: Option<usize>,
    /// Unit of `length`.
    pub unit: LengthUnit,
    /// Molecule type, e.g. `DNA`, `mRNA` or `ss-RNA`.
    pub molecule_type: Option<String>,
    /// Linear or circular.
    pub topology: Topology,
    /// GenBank division code. Defaults to `UNK`.
    pub division: String,
    /// Date from the LOCUS line.
    pub date: Option<Date>,
    /// One-line description (`DEFINITION`).
    pub definition: Option<String>,
    /// Primary accession followed by any secondary ones.
    pub accession: Option<String>,
    /// Accession with version (`VERSION`).
    pub version: Option<String>,
    /// `DBLINK` entries in file order.
    pub dblink: Vec<DbLink>,
    /// `None` when the record has no KEYWORDS section. `Some(vec![])` is
    /// written as `KEYWORDS    .`.
    pub keywords: Option<Vec<String>>,
    /// The `SOURCE` section.
    pub source: Option<Source>,
    /// Citations in file order.
    pub references: Vec<Reference>,
    /// Free text, one entry per physical COMMENT line, separated by `\n`.
    ///
    /// The writer word-wraps a line longer than 67 columns, and the reader
    /// keeps each wrapped piece as its own line. Comments read from a file
    /// therefore survive a write unchanged, while a long line built in memory
    /// comes back split at the wrap points.
    pub comment: Option<String>,
    /// Unrecognized sections, kept only when the reader is asked to.
    pub unknown_sections: Vec<RawSection>,
    /// The feature table in file order.
    pub features: Vec<Feature>,
    /// Residue codes, uppercase when read from a file.
    pub sequence: Vec<u8>,
    /// Assembly of the record from other records.
    pub contig: Option<Location>,
}

impl Record {
    /// Creates an empty record with the given locus name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            length: None,
            unit: LengthUnit::BasePairs,
            molecule_type: None,
            topology: Topology::Linear,
            division: UNKNOWN_DIVISION.to_string(),
            date: None,
            definition: None,
            accession: None,
            version: None,
            dblink: Vec::new(),
            keywords: None,
            source: None,
            references: Vec::new(),
            comment: None,
            unknown_sections: Vec::new(),
            features: Vec::new(),
            sequence: Vec::new(),
            contig: None,
        }
    }

    /// Sets the sequence and the declared length together.
    pub fn with_sequence<S: Into<Vec<u8>>>(mut self, sequence: S) -> Self {
        self.sequence = sequence.into();
        self.length = Some(self.sequence.len());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared length, falling back to the sequence length.
    #[inline]
    pub fn len(&self) -> usize {
        self.length.unwrap_or(self.sequence.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Returns features of the given kind, in file order.
    pub fn features_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Feature> + 'a {
        self.features.iter().filter(move |f| f.kind == kind)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new(String::new())
    }
}
