use std::io::{self, Cursor, Read};

use genbank::{
    load, load_from, Date, LengthUnit, Location, Reader, ReaderError, ReaderOptions, Strand,
    Topology, Writer,
};

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sample.gb");

fn from_str(text: &'static str) -> Reader {
    Reader::from_reader(Cursor::new(text.as_bytes())).unwrap()
}

#[test]
fn test_reader_sample_header_fields() {
    let records = load(SAMPLE).unwrap();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.name(), "SYNCONST1");
    assert_eq!(first.length, Some(150));
    assert_eq!(first.unit, LengthUnit::BasePairs);
    assert_eq!(first.molecule_type.as_deref(), Some("DNA"));
    assert_eq!(first.topology, Topology::Linear);
    assert_eq!(first.division, "SYN");
    assert_eq!(first.date, Some(Date::from_ymd(2021, 3, 12).unwrap()));
    assert_eq!(
        first.definition.as_deref(),
        Some("Synthetic construct SYNCONST1 carrying a short open reading frame and a terminator.")
    );
    assert_eq!(first.accession.as_deref(), Some("XX000001"));
    assert_eq!(first.version.as_deref(), Some("XX000001.1"));
    assert_eq!(first.dblink.len(), 2);
    assert_eq!(first.dblink[1].key, "BioSample");
    assert_eq!(first.dblink[1].value, "SAMN00000001");
    assert_eq!(
        first.keywords,
        Some(vec!["synthetic".to_string(), "test fixture".to_string()])
    );

    let source = first.source.as_ref().unwrap();
    assert_eq!(source.name, "synthetic construct");
    assert_eq!(source.organism.as_deref(), Some("synthetic construct"));
    assert_eq!(source.lineage, vec!["other sequences", "artificial sequences"]);

    assert_eq!(first.references.len(), 2);
    assert_eq!(first.references[0].authors, vec!["Doe,J.", "Roe,R.", "Poe,E."]);
    assert_eq!(first.references[0].locations, vec![(0, 150)]);
    assert_eq!(first.references[1].pubmed, Some(12345678));
    assert_eq!(
        first.comment.as_deref(),
        Some("Assembled by hand.\nSecond comment line.")
    );

    assert_eq!(first.sequence.len(), 150);
    assert!(first.sequence.starts_with(b"GCTAAAGACA"));
}

#[test]
fn test_reader_sample_features() {
    let records = load(SAMPLE).unwrap();
    let first = &records[0];
    let kinds: Vec<&str> = first.features.iter().map(|f| f.kind.as_str()).collect();
    assert_eq!(kinds, vec!["source", "gene", "CDS", "misc_feature", "terminator"]);

    let cds = first.features_of("CDS").next().unwrap();
    assert_eq!(cds.location, Location::range(9, 45));
    assert_eq!(cds.qualifier("codon_start"), Some(Some("1")));
    assert_eq!(cds.qualifier("transl_table"), Some(Some("11")));
    assert_eq!(
        cds.qualifier("note"),
        Some(Some(
            "a deliberately long note that needs to wrap over more than one line of the feature table"
        ))
    );
    assert_eq!(cds.qualifier("translation"), Some(Some("MKVLAAGIVGLL")));

    let misc = first.features_of("misc_feature").next().unwrap();
    assert_eq!(misc.location.strand(), Strand::Reverse);
    assert!(misc.location.is_fuzzy());
    assert_eq!(misc.location.bounds(), Some((59, 120)));

    let terminator = first.features_of("terminator").next().unwrap();
    assert_eq!(terminator.qualifier("pseudo"), Some(None));
}

#[test]
fn test_reader_sample_contig_record() {
    let records = load(SAMPLE).unwrap();
    let second = &records[1];
    assert_eq!(second.name(), "SYNCONT2");
    assert_eq!(second.topology, Topology::Circular);
    assert_eq!(second.division, "CON");
    assert_eq!(second.length, Some(500));
    assert!(second.sequence.is_empty());
    assert_eq!(second.keywords, Some(Vec::new()));
    assert_eq!(
        second.contig.as_ref().unwrap().to_string(),
        "join(XX000001.1:1..150,gap(100),complement(XX000001.1:1..150),gap(unk100))"
    );
}

#[test]
fn test_reader_streaming_matches_load() {
    let loaded = load(SAMPLE).unwrap();
    let mut reader = Reader::from_path(SAMPLE).unwrap();
    let streamed: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(loaded, streamed);

    let text = std::fs::read(SAMPLE).unwrap();
    assert_eq!(load_from(Cursor::new(text)).unwrap(), loaded);
}

#[test]
fn test_reader_empty_input() {
    assert_eq!(from_str("").count(), 0);
    assert_eq!(from_str("\n  \n\n").count(), 0);
}

#[test]
fn test_reader_truncated_record() {
    let mut reader = from_str("LOCUS       A   4 bp    DNA     linear   UNK\nORIGIN\n        1 acgt\n");
    let err = reader.next_record().unwrap().unwrap_err();
    assert!(matches!(err, ReaderError::Truncated { line: 3 }));
    assert!(reader.next_record().is_none());
}

#[test]
fn test_reader_length_mismatch() {
    let text = "LOCUS       A   5 bp    DNA     linear   UNK\nORIGIN\n        1 acgt\n//\n";
    let err = from_str(text).next().unwrap().unwrap_err();
    assert!(matches!(
        err,
        ReaderError::LengthMismatch {
            line: 2,
            declared: 5,
            actual: 4
        }
    ));

    let lenient = Reader::builder()
        .from_reader(Cursor::new(text.as_bytes()))
        .options(ReaderOptions::new().check_length(false))
        .build()
        .unwrap();
    let records: Vec<_> = lenient.map(|r| r.unwrap()).collect();
    assert_eq!(records[0].length, Some(5));
    assert_eq!(records[0].sequence, b"ACGT");
}

#[test]
fn test_reader_record_must_start_with_locus() {
    let err = from_str("DEFINITION  nothing\n//\n")
        .next()
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, ReaderError::InvalidSection { line: 1, .. }));
}

#[test]
fn test_reader_empty_record_is_an_error() {
    let err = from_str("\n//\n").next().unwrap().unwrap_err();
    assert!(matches!(err, ReaderError::InvalidSection { line: 2, .. }));
}

#[test]
fn test_reader_orphan_qualifier_line() {
    let text = "\
LOCUS       A   4 bp    DNA     linear   UNK
FEATURES             Location/Qualifiers
                     /gene=\"x\"
//
";
    let err = from_str(text).next().unwrap().unwrap_err();
    assert!(matches!(err, ReaderError::OrphanQualifier { line: 3, .. }));
}

#[test]
fn test_reader_wrapped_unquoted_qualifier() {
    let text = "\
LOCUS       TEX1                      30 bp    DNA     linear   BCT
FEATURES             Location/Qualifiers
     CDS             1..30
                     /transl_except=(pos:join(28..29,30),
                     aa:TERM)
                     /transl_table=11
ORIGIN
        1 atgaaaaaaa aaaaaaaaaa aaaaaaaata
//
";
    let record = from_str(text).next().unwrap().unwrap();
    let cds = &record.features[0];
    assert_eq!(
        cds.qualifier("transl_except"),
        Some(Some("(pos:join(28..29,30),aa:TERM)"))
    );
    assert_eq!(cds.qualifier("transl_table"), Some(Some("11")));

    let mut buf = Vec::new();
    Writer::from_record(&record, &mut buf).unwrap();
    let written = String::from_utf8(buf.clone()).unwrap();
    assert!(written.contains("                     /transl_except=(pos:join(28..29,30),aa:TERM)\n"));

    let again = load_from(Cursor::new(buf)).unwrap();
    assert_eq!(again, vec![record]);
}

#[test]
fn test_reader_unknown_sections() {
    let text = "\
LOCUS       A   4 bp    DNA     linear   UNK
PROJECT     GenomeProject:1234
ORIGIN
        1 acgt
//
";
    let dropped = from_str(text).next().unwrap().unwrap();
    assert!(dropped.unknown_sections.is_empty());

    let kept = Reader::builder()
        .from_reader(Cursor::new(text.as_bytes()))
        .options(ReaderOptions::new().keep_unknown_sections(true))
        .build()
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(kept.unknown_sections.len(), 1);
    assert_eq!(kept.unknown_sections[0].keyword, "PROJECT");
    assert_eq!(
        kept.unknown_sections[0].lines,
        vec!["PROJECT     GenomeProject:1234"]
    );
}

/// Yields `data` once, then fails.
struct FailingSource {
    data: Option<&'static [u8]>,
}

impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.take() {
            Some(data) => {
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
            None => Err(io::Error::new(io::ErrorKind::ConnectionReset, "source went away")),
        }
    }
}

#[test]
fn test_reader_propagates_io_errors() {
    let source = FailingSource {
        data: Some(b"LOCUS       A   4 bp    DNA     linear   UNK\n"),
    };
    let mut reader = Reader::from_reader(source).unwrap();
    let err = reader.next_record().unwrap().unwrap_err();
    assert!(err.is_io());
    assert!(!err.is_syntax());

    let io_err = err.into_io().unwrap();
    assert_eq!(io_err.kind(), io::ErrorKind::ConnectionReset);
    assert_eq!(io_err.to_string(), "source went away");
    assert!(reader.next_record().is_none());
}

#[test]
fn test_reader_missing_file() {
    let err = Reader::from_path("tests/data/does-not-exist.gb").err().unwrap();
    assert!(err.is_io());
}

#[cfg(feature = "gzip")]
#[test]
fn test_reader_gzip_input() {
    use flate2::write::GzEncoder;
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.gb.gz");
    let mut encoder = GzEncoder::new(
        std::fs::File::create(&path).unwrap(),
        flate2::Compression::default(),
    );
    encoder.write_all(&std::fs::read(SAMPLE).unwrap()).unwrap();
    encoder.finish().unwrap();

    assert_eq!(load(&path).unwrap(), load(SAMPLE).unwrap());
}

#[cfg(feature = "mmap")]
#[test]
fn test_reader_mmap_matches_buffered() {
    let mapped: Vec<_> = Reader::from_mmap(SAMPLE)
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(mapped, load(SAMPLE).unwrap());
}

#[cfg(feature = "rayon")]
#[test]
fn test_reader_parallel_keeps_order() {
    use rayon::prelude::*;

    let records: Vec<_> = Reader::from_path(SAMPLE)
        .unwrap()
        .par_records()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records, load(SAMPLE).unwrap());
}
