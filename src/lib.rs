//! # genbank
//!
//! A streaming reader and byte-exact writer for the GenBank flat-file format
//! (the INSDC sequence record layout used by NCBI, ENA and DDBJ).
//!
//! ## Overview
//!
//! A GenBank file holds one or more records, each terminated by a line that
//! contains exactly `//`. A record carries a LOCUS header, free-text sections
//! (DEFINITION, ACCESSION, VERSION, KEYWORDS, SOURCE, REFERENCE, COMMENT), a
//! feature table whose entries are addressed by location expressions such as
//! `complement(join(<1..100,200..>300))`, and the sequence itself in the
//! ORIGIN block.
//!
//! This library reads such files one record at a time, without buffering the
//! whole input, and writes records back with the classic column layout.
//!
//! ## Features
//!
//! - **Streaming:** records are parsed lazily from any `Read` source
//! - **Typed locations:** a closed `Location` tree with strand and range helpers
//! - **Ordered qualifiers:** duplicate keys and their order are preserved
//! - **Precise errors:** every syntax error carries the 1-based line number
//! - **Multiple Reading Modes:**
//!   - Buffered streaming for large files
//!   - Memory-mapped (mmap) input
//!   - Parallel record assembly with Rayon
//! - **Compression Support:** gzip, zstd and bzip2 inputs, detected from the extension
//! - **Builder Pattern API** for readers and writer options
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! genbank = "0.1"
//!
//! # Optional features
//! genbank = { version = "0.1", features = ["compression", "mmap", "rayon"] }
//! ```
//!
//! ## Basic Usage
//!
//! ### Reading records
//!
//! ```rust,no_run
//! use genbank::Reader;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reader = Reader::from_path("tests/data/sample.gb")?;
//!
//!     for record in reader {
//!         let record = record?;
//!         println!("{}: {} bp, {} features",
//!             record.name(),
//!             record.len(),
//!             record.features.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Walking the feature table
//!
//! ```rust,no_run
//! use genbank::{Reader, Strand};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     for record in Reader::from_path("tests/data/sample.gb")? {
//!         let record = record?;
//!         for cds in record.features_of("CDS") {
//!             let gene = cds.qualifier("gene").flatten().unwrap_or("?");
//!             let strand = cds.location.strand();
//!             for (start, end, _) in cds.location.ranges() {
//!                 println!("{gene}\t{start}\t{end}\t{}", strand);
//!             }
//!             if strand == Strand::Reverse {
//!                 println!("{gene} is on the reverse strand");
//!             }
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Using the builder
//!
//! ```rust,no_run
//! use genbank::{Reader, ReaderMode, ReaderOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reader = Reader::builder()
//!         .from_path("tests/data/sample.gb")
//!         .mode(ReaderMode::Default)
//!         .buffer_capacity(128 * 1024)
//!         .options(ReaderOptions::new().keep_unknown_sections(true))
//!         .build()?;
//!
//!     let records = reader.collect::<Result<Vec<_>, _>>()?;
//!     println!("{} records", records.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Writing records
//!
//! ```rust
//! use genbank::{Feature, Location, Qualifier, Record, SequenceCase, Writer, WriterOptions};
//!
//! let mut record = Record::new("demo").with_sequence("ATGAAATAA");
//! record.features.push(
//!     Feature::new("CDS", Location::range(0, 9))
//!         .with_qualifier(Qualifier::new("gene", "demo"))
//!         .with_qualifier(Qualifier::new("codon_start", "1")),
//! );
//!
//! let writer = Writer::with_options(
//!     WriterOptions::new().sequence_case(SequenceCase::Lower),
//! );
//! let text = writer.render(&record).unwrap();
//! assert!(text.contains("                     /codon_start=1\n"));
//! assert!(text.contains("        1 atgaaataa\n"));
//! ```
//!
//! ### Reading from stdin
//!
//! ```rust,no_run
//! use genbank::Reader;
//! use std::io;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut reader = Reader::from_reader(io::stdin())?;
//!
//!     while let Some(record) = reader.next_record() {
//!         let record = record?;
//!         println!("{}", record.name());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! A syntax error ends the traversal: the reader yields the error once and
//! then `None`. I/O errors from the source are passed through unchanged.
//!
//! ```rust,no_run
//! use genbank::Reader;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     for record in Reader::from_path("tests/data/sample.gb")? {
//!         match record {
//!             Ok(r) => println!("ok: {}", r.name()),
//!             Err(e) if e.is_syntax() => {
//!                 eprintln!("line {}: {}", e.line().unwrap_or(0), e);
//!             }
//!             Err(e) => return Err(e.into()),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Coordinates
//!
//! Locations are stored 0-based and half-open: the text `10..20` becomes
//! `Range { start: 9, end: 20, .. }`, and `Display` converts back.
//!
//! ## Feature Flags
//!
//! - `compression`: alias for `gzip`
//! - `gzip`: gzip input and `.gz` output (adds `flate2`)
//! - `zstd`: zstd input (adds `zstd`)
//! - `bz2`: bzip2 input (adds `bzip2`)
//! - `mmap`: memory-mapped file support (adds `memmap2`)
//! - `rayon`: parallel record assembly (adds `rayon`)
//! - `cli`: the `genbank` binary (adds `clap` and `simple_logger`)
//!
//! ## Thread Safety
//!
//! `Reader` is `Send` but not `Sync`. Use one reader per thread, or
//! `.par_records()` to assemble the records of one file on the Rayon pool.

#![cfg_attr(doc, warn(missing_docs))]

mod assembler;
/// LOCUS dates.
pub mod date;
mod feature;
/// Feature and CONTIG coordinate expressions.
pub mod location;
/// Streaming record reader.
pub mod reader;
/// The record data model.
pub mod record;
mod scanner;
/// Strand of a location.
pub mod strand;
/// GenBank text writer.
pub mod writer;

pub use date::{Date, DateError};
pub use location::{Fuzzy, GapLength, Location, LocationError, LocationErrorKind, Range};
#[cfg(feature = "rayon")]
pub use reader::ParallelRecords;
pub use reader::{
    load, load_from, Reader, ReaderBuilder, ReaderError, ReaderMode, ReaderOptions, ReaderResult,
    Records,
};
#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
pub use reader::Compression;
pub use record::{
    DbLink, Feature, LengthUnit, Qualifier, QualifierKind, RawSection, Record, Reference, Source,
    Topology, UNKNOWN_DIVISION,
};
pub use strand::Strand;
pub use writer::{SequenceCase, Writer, WriterError, WriterOptions, WriterResult};
