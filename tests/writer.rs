use std::io::Cursor;

use genbank::{
    load, load_from, Date, Feature, Location, Qualifier, Record, Reference, SequenceCase,
    Source, Writer, WriterError, WriterOptions,
};

fn write(record: &Record) -> String {
    let mut buf = Vec::new();
    Writer::from_record(record, &mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

fn reparse(text: String) -> Record {
    let mut records = load_from(Cursor::new(text.into_bytes())).unwrap();
    assert_eq!(records.len(), 1);
    records.remove(0)
}

fn minimal() -> Record {
    let mut record = Record::new("Test sequence").with_sequence("ATGC");
    record.date = Some(Date::from_ymd(2024, 4, 1).unwrap());
    record.source = Some(Source::new("Testus organismae"));
    record
}

#[test]
fn write_minimal_record_exactly() {
    let mut record = minimal();
    record.features.push(
        Feature::new("CDS", Location::range(0, 3))
            .with_qualifier(Qualifier::new("translation", "M")),
    );

    let expected = concat!(
        "LOCUS       Test sequence              4 bp            linear UNK 01-APR-2024\n",
        "SOURCE      Testus organismae\n",
        "FEATURES             Location/Qualifiers\n",
        "     CDS             1..3\n",
        "                     /translation=\"M\"\n",
        "ORIGIN      \n",
        "        1 ATGC\n",
        "//\n",
    );
    assert_eq!(write(&record), expected);
}

#[test]
fn write_duplicate_qualifiers_round_trip() {
    let mut record = minimal();
    record.features.push(
        Feature::new("gene", Location::range(0, 4))
            .with_qualifier(Qualifier::new("db_xref", "GeneID:1"))
            .with_qualifier(Qualifier::new("gene", "abc"))
            .with_qualifier(Qualifier::new("db_xref", "GeneID:2")),
    );

    let text = write(&record);
    assert!(text.contains(
        "                     /db_xref=\"GeneID:1\"\n                     /gene=\"abc\"\n                     /db_xref=\"GeneID:2\"\n"
    ));

    let parsed = reparse(text);
    let xrefs: Vec<_> = parsed.features[0].qualifier_values("db_xref").collect();
    assert_eq!(xrefs, vec!["GeneID:1", "GeneID:2"]);
    assert_eq!(parsed.features, record.features);
}

#[test]
fn write_wraps_long_values() {
    let note = "the quick brown fox jumps over the lazy dog ".repeat(5);
    let note = note.trim_end().to_string();
    let translation = "MKVLAAGIVGLLLAAPQRSTW".repeat(6);

    let mut record = minimal();
    record.definition = Some("A definition that is long enough to need a second line in the header of the record.".into());
    record.features.push(
        Feature::new("CDS", Location::range(0, 4))
            .with_qualifier(Qualifier::new("note", note.clone()))
            .with_qualifier(Qualifier::new("translation", translation.clone())),
    );

    let text = write(&record);
    for line in text.lines() {
        assert!(line.chars().count() <= 79, "line too long: {line:?}");
    }
    assert!(text.contains("DEFINITION  A definition that is long enough to need a second line in the\n            header of the record.\n"));

    let translation_lines: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.contains("/translation="))
        .take_while(|l| !l.starts_with("ORIGIN"))
        .collect();
    assert_eq!(translation_lines.len(), 3);
    assert_eq!(translation_lines[0].len(), 21 + 58);

    let parsed = reparse(text);
    assert_eq!(parsed.definition, record.definition);
    assert_eq!(parsed.features[0].qualifier("note"), Some(Some(note.as_str())));
    assert_eq!(
        parsed.features[0].qualifier("translation"),
        Some(Some(translation.as_str()))
    );
}

#[test]
fn write_long_location_breaks_after_commas() {
    let parts = (0..20)
        .map(|i| Location::range(i * 100, i * 100 + 50))
        .collect();
    let location = Location::complement(Location::join(parts).unwrap());

    let mut record = Record::new("LONG").with_sequence(vec![b'A'; 2000]);
    record
        .features
        .push(Feature::new("mRNA", location.clone()));

    let text = write(&record);
    let feature_lines: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.starts_with("     mRNA"))
        .take_while(|l| !l.starts_with("ORIGIN"))
        .collect();
    assert!(feature_lines.len() > 1);
    for line in &feature_lines[..feature_lines.len() - 1] {
        assert!(line.ends_with(','));
        assert!(line.len() <= 79);
    }

    assert_eq!(reparse(text).features[0].location, location);
}

#[test]
fn write_quotes_and_flags() {
    let mut record = minimal();
    record.features.push(
        Feature::new("misc_feature", Location::range(0, 4))
            .with_qualifier(Qualifier::new("note", "say \"hi\""))
            .with_qualifier(Qualifier::new("codon_start", "2"))
            .with_qualifier(Qualifier::flag("pseudo")),
    );

    let text = write(&record);
    assert!(text.contains("/note=\"say \"\"hi\"\"\"\n"));
    assert!(text.contains("/codon_start=2\n"));
    assert!(text.contains("                     /pseudo\n"));
    assert_eq!(reparse(text).features, record.features);
}

#[test]
fn write_origin_layout_and_case() {
    let sequence: Vec<u8> = b"ACGT".iter().copied().cycle().take(125).collect();
    let record = Record::new("SEQ").with_sequence(sequence);

    let writer = Writer::with_options(WriterOptions::new().sequence_case(SequenceCase::Lower));
    let text = writer.render(&record).unwrap();
    let origin: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.starts_with("ORIGIN"))
        .collect();
    assert_eq!(
        origin,
        vec![
            "ORIGIN      ",
            "        1 acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt",
            "       61 acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt",
            "      121 acgta",
            "//",
        ]
    );

    assert_eq!(reparse(text).sequence, record.sequence);
}

#[test]
fn write_header_sections() {
    let mut record = minimal();
    record.accession = Some("XX000001".into());
    record.keywords = Some(Vec::new());
    let mut source = Source::new("Testus organismae");
    source.organism = Some("Testus organismae".into());
    source.lineage = vec!["Eukaryota".into(), "Testia".into()];
    record.source = Some(source);
    record.references.push(Reference {
        locations: vec![(0, 4)],
        authors: vec!["Doe,J.".into(), "Roe,R.".into()],
        title: Some("Direct Submission".into()),
        journal: Some("Unpublished".into()),
        pubmed: Some(42),
        ..Reference::default()
    });
    record.comment = Some("first\nsecond".into());

    let text = write(&record);
    assert!(text.contains("KEYWORDS    .\n"));
    assert!(text.contains(
        "SOURCE      Testus organismae\n  ORGANISM  Testus organismae\n            Eukaryota; Testia.\n"
    ));
    assert!(text.contains("REFERENCE   1  (bases 1 to 4)\n  AUTHORS   Doe,J. and Roe,R.\n"));
    assert!(text.contains("   PUBMED   42\n"));
    assert!(text.contains("COMMENT     first\n            second\n"));

    assert_eq!(reparse(text), record);
}

#[test]
fn write_rejects_invalid_records() {
    let mut buf = Vec::new();

    let mut bare = minimal();
    bare.features.push(
        Feature::new("CDS", Location::range(0, 3))
            .with_qualifier(Qualifier::new("codon_start", "1 2")),
    );
    let err = Writer::from_record(&bare, &mut buf).unwrap_err();
    assert!(matches!(err, WriterError::Invalid { field: "qualifier", .. }));

    let mut empty_join = minimal();
    empty_join
        .features
        .push(Feature::new("CDS", Location::Join(Vec::new())));
    let err = Writer::from_record(&empty_join, &mut buf).unwrap_err();
    assert!(matches!(err, WriterError::Invalid { field: "location", .. }));

    let mut mismatch = minimal();
    mismatch.length = Some(10);
    let err = Writer::from_record(&mismatch, &mut buf).unwrap_err();
    assert!(matches!(err, WriterError::Invalid { field: "length", .. }));

    let err = Writer::from_record(&Record::new("  "), &mut buf).unwrap_err();
    assert!(matches!(err, WriterError::Invalid { field: "name", .. }));

    for location in [
        Location::range(-1, 3),
        Location::range(0, 0),
        Location::range(i64::MAX, i64::MAX),
        Location::Between(-1, 0),
        Location::complement(Location::range(-5, -2)),
    ] {
        let mut record = minimal();
        record.features.push(Feature::new("misc_feature", location));
        let err = Writer::from_record(&record, &mut buf).unwrap_err();
        assert!(matches!(err, WriterError::Invalid { field: "location", .. }));
    }

    let mut contig = minimal();
    contig.contig = Some(Location::range(-1, 3));
    let err = Writer::from_record(&contig, &mut buf).unwrap_err();
    assert!(matches!(err, WriterError::Invalid { field: "contig", .. }));

    let mut span = minimal();
    span.references.push(Reference {
        locations: vec![(-1, 4)],
        ..Reference::default()
    });
    let err = Writer::from_record(&span, &mut buf).unwrap_err();
    assert!(matches!(err, WriterError::Invalid { field: "reference", .. }));

    assert!(buf.is_empty());
}

#[test]
fn write_keeps_reversed_ranges() {
    let mut record = minimal();
    record
        .features
        .push(Feature::new("misc_feature", "4..2".parse().unwrap()));
    let text = write(&record);
    assert!(text.contains("     misc_feature    4..2\n"));
    assert_eq!(reparse(text).features, record.features);
}

#[test]
fn write_full_width_word_keeps_following_space() {
    // `/note="` plus 51 characters fills the 58 qualifier columns.
    let note = format!("{} tail", "x".repeat(51));
    let definition = format!("{} tail", "y".repeat(67));

    let mut record = minimal();
    record.definition = Some(definition.clone());
    record.features.push(
        Feature::new("misc_feature", Location::range(0, 4))
            .with_qualifier(Qualifier::new("note", note.clone())),
    );

    let text = write(&record);
    let parsed = reparse(text);
    assert_eq!(parsed.definition, Some(definition));
    assert_eq!(parsed.features[0].qualifier("note"), Some(Some(note.as_str())));
    assert_eq!(parsed.features, record.features);
}

#[test]
fn write_split_words_still_join() {
    let note = format!("{} end", "z".repeat(120));
    let mut record = minimal();
    record.features.push(
        Feature::new("misc_feature", Location::range(0, 4))
            .with_qualifier(Qualifier::new("note", note.clone())),
    );

    let parsed = reparse(write(&record));
    assert_eq!(parsed.features[0].qualifier("note"), Some(Some(note.as_str())));
}

#[test]
fn write_long_comment_lines_wrap() {
    let line = "word ".repeat(20);
    let mut record = minimal();
    record.comment = Some(line.trim_end().to_string());

    let text = write(&record);
    assert!(text.contains("COMMENT     word word"));

    let parsed = reparse(text.clone());
    let comment = parsed.comment.clone().unwrap();
    assert_eq!(comment.replace('\n', " "), line.trim_end());
    assert_eq!(comment.lines().count(), 2);
    assert_eq!(write(&parsed), text);
}

#[test]
fn write_escapes_locus_name() {
    let writer = Writer::with_options(WriterOptions::new().escape_locus(true));
    let text = writer.render(&minimal()).unwrap();
    assert!(text.starts_with("LOCUS       Test_sequence "));
}

#[test]
fn write_to_path_round_trip() {
    let records = load(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sample.gb")).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.gb");
    Writer::to_path(&path, &records).unwrap();

    assert_eq!(load(&path).unwrap(), records);
}

#[test]
fn write_to_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = Writer::to_path(dir.path(), &[minimal()]).unwrap_err();
    assert!(matches!(err, WriterError::Io(_)));
}

#[cfg(feature = "gzip")]
#[test]
fn write_gzip_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.gb.gz");
    Writer::to_path(&path, &[minimal()]).unwrap();

    let raw = std::fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    assert_eq!(load(&path).unwrap(), vec![minimal()]);
}
