use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

#[cfg(feature = "bz2")]
use bzip2::read::BzDecoder;
#[cfg(feature = "gzip")]
use flate2::read::MultiGzDecoder;
#[cfg(feature = "mmap")]
use memchr::memchr;
#[cfg(feature = "mmap")]
use memmap2::MmapOptions;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "zstd")]
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::assembler::assemble;
use crate::location::LocationError;
use crate::record::Record;

/// Result alias for reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// An error that can occur when reading a GenBank file.
///
/// I/O failures of the underlying source are passed through untouched as
/// [`ReaderError::Io`]; every other variant describes malformed input and
/// carries the 1-based line number where it was found.
#[derive(Debug)]
pub enum ReaderError {
    /// An I/O error from the underlying source.
    Io(io::Error),
    /// An error that occurred when memory-mapping a file.
    #[cfg(feature = "mmap")]
    Mmap(io::Error),
    /// A line is not valid UTF-8.
    InvalidEncoding {
        /// The line number where the error occurred.
        line: usize,
        /// The error message.
        message: String,
    },
    /// The section layout of a record is broken.
    InvalidSection {
        /// The line number where the error occurred.
        line: usize,
        /// Keyword of the offending section; empty when there is none.
        section: String,
        /// The error message.
        message: String,
    },
    /// A field inside a section could not be parsed.
    InvalidField {
        /// The line number where the error occurred.
        line: usize,
        /// The name of the field that could not be parsed.
        field: &'static str,
        /// The error message.
        message: String,
    },
    /// A feature or CONTIG location could not be parsed.
    InvalidLocation {
        /// The line where the location starts.
        line: usize,
        /// The syntax error.
        source: LocationError,
    },
    /// A qualifier line that belongs to no feature.
    OrphanQualifier {
        /// The line number where the error occurred.
        line: usize,
        /// The qualifier text.
        text: String,
    },
    /// The LOCUS length disagrees with the ORIGIN sequence.
    LengthMismatch {
        /// Line of the ORIGIN section.
        line: usize,
        /// Length from the LOCUS line.
        declared: usize,
        /// Residues found under ORIGIN.
        actual: usize,
    },
    /// The input ended before the `//` terminator of a record.
    Truncated {
        /// The last line read.
        line: usize,
    },
    /// An error that occurred when building a reader.
    Builder(String),
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::Io(err) => write!(f, "I/O error: {err}"),
            #[cfg(feature = "mmap")]
            ReaderError::Mmap(err) => write!(f, "mmap error: {err}"),
            ReaderError::InvalidEncoding { line, message } => {
                write!(f, "invalid UTF-8 at line {line}: {message}")
            }
            ReaderError::InvalidSection {
                line,
                section,
                message,
            } => {
                if section.is_empty() {
                    write!(f, "invalid record layout at line {line}: {message}")
                } else {
                    write!(f, "invalid {section} section at line {line}: {message}")
                }
            }
            ReaderError::InvalidField {
                line,
                field,
                message,
            } => write!(f, "invalid {field} at line {line}: {message}"),
            ReaderError::InvalidLocation { line, source } => {
                write!(f, "invalid location at line {line}: {source}")
            }
            ReaderError::OrphanQualifier { line, text } => {
                write!(f, "qualifier without a feature at line {line}: {text}")
            }
            ReaderError::LengthMismatch {
                line,
                declared,
                actual,
            } => write!(
                f,
                "sequence at line {line} has {actual} residues, LOCUS declares {declared}"
            ),
            ReaderError::Truncated { line } => {
                write!(f, "input ended at line {line} before the record terminator '//'")
            }
            ReaderError::Builder(msg) => write!(f, "builder error: {msg}"),
        }
    }
}

impl std::error::Error for ReaderError {
    /// Returns the source error, if any.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReaderError::Io(err) => Some(err),
            #[cfg(feature = "mmap")]
            ReaderError::Mmap(err) => Some(err),
            ReaderError::InvalidLocation { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for ReaderError {
    /// Creates a new `ReaderError` from an `io::Error`.
    fn from(err: io::Error) -> Self {
        ReaderError::Io(err)
    }
}

impl ReaderError {
    /// Returns `true` if the error came from the underlying source.
    pub fn is_io(&self) -> bool {
        matches!(self, ReaderError::Io(_))
    }

    /// Returns `true` if the error describes malformed input.
    pub fn is_syntax(&self) -> bool {
        self.line().is_some()
    }

    /// Returns the line the error points at, for input errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            ReaderError::InvalidEncoding { line, .. }
            | ReaderError::InvalidSection { line, .. }
            | ReaderError::InvalidField { line, .. }
            | ReaderError::InvalidLocation { line, .. }
            | ReaderError::OrphanQualifier { line, .. }
            | ReaderError::LengthMismatch { line, .. }
            | ReaderError::Truncated { line } => Some(*line),
            _ => None,
        }
    }

    /// Returns the original `io::Error` of an [`ReaderError::Io`], or the
    /// error itself otherwise.
    pub fn into_io(self) -> Result<io::Error, Self> {
        match self {
            ReaderError::Io(err) => Ok(err),
            other => Err(other),
        }
    }
}

/// Parsing switches shared by every reader mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Keep unrecognized top-level sections as raw text.
    keep_unknown_sections: bool,
    /// Compare the LOCUS length against the ORIGIN sequence.
    check_length: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            keep_unknown_sections: false,
            check_length: true,
        }
    }
}

impl ReaderOptions {
    /// Creates a new options builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retains unknown top-level sections in [`Record::unknown_sections`]
    /// so that the writer re-emits them. Off by default.
    pub fn keep_unknown_sections(mut self, keep: bool) -> Self {
        self.keep_unknown_sections = keep;
        self
    }

    /// Rejects records whose LOCUS length differs from the sequence length.
    /// On by default.
    pub fn check_length(mut self, check: bool) -> Self {
        self.check_length = check;
        self
    }

    pub(crate) fn keeps_unknown_sections(&self) -> bool {
        self.keep_unknown_sections
    }

    pub(crate) fn checks_length(&self) -> bool {
        self.check_length
    }
}

/// The mode to use when reading a GenBank file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderMode {
    /// Stream the input through a buffered reader. This is the default.
    Default,
    /// Memory-map the file. Requires the `mmap` feature and a path source.
    Mmap,
}

/// The compression format of the input file.
#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Detect the compression format from the file extension.
    #[default]
    Auto,
    /// No compression.
    None,
    /// Gzip compression.
    Gzip,
    /// Zstandard compression.
    Zstd,
    /// Bzip2 compression.
    Bzip2,
}

#[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
impl Compression {
    fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("zst" | "zstd") => Compression::Zstd,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            _ => Compression::None,
        }
    }
}

#[cfg_attr(
    all(
        not(feature = "mmap"),
        any(feature = "gzip", feature = "zstd", feature = "bz2")
    ),
    allow(dead_code)
)]
fn has_compressed_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| matches!(ext.to_str(), Some("gz" | "zst" | "zstd" | "bz2" | "bzip2")))
}

/// A builder for creating a [`Reader`].
///
/// # Example
///
/// ```rust,no_run
/// use genbank::{Reader, ReaderOptions};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let reader = Reader::builder()
///         .from_path("tests/data/sample.gb")
///         .options(ReaderOptions::new().keep_unknown_sections(true))
///         .build()?;
///
///     for record in reader {
///         let record = record?;
///         println!("{} ({} bp)", record.name, record.len());
///     }
///
///     Ok(())
/// }
/// ```
pub struct ReaderBuilder {
    source: Option<ReaderSource>,
    options: ReaderOptions,
    mode: ReaderMode,
    buffer_capacity: usize,
    #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
    compression: Compression,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self {
            source: None,
            options: ReaderOptions::default(),
            mode: ReaderMode::Default,
            buffer_capacity: 64 * 1024,
            #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
            compression: Compression::default(),
        }
    }
}

impl ReaderBuilder {
    /// Reads from a file.
    pub fn from_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(ReaderSource::Path(path.as_ref().into()));
        self
    }

    /// Reads from any byte source.
    pub fn from_reader<T>(mut self, reader: T) -> Self
    where
        T: Read + Send + 'static,
    {
        self.source = Some(ReaderSource::Reader(Box::new(reader)));
        self
    }

    /// Replaces the reader options.
    pub fn options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the reading mode.
    pub fn mode(mut self, mode: ReaderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the buffer capacity for the reader.
    ///
    /// The default is 64 KB; values below 8 KB are raised to 8 KB.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(8 * 1024);
        self
    }

    /// Sets the compression format of the input.
    #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Builds the `Reader`.
    pub fn build(mut self) -> ReaderResult<Reader> {
        let source = self
            .source
            .take()
            .ok_or_else(|| ReaderError::Builder("no input source configured".into()))?;

        match (source, self.mode) {
            (ReaderSource::Path(path), ReaderMode::Default) => {
                let stream = self.open_path_stream(&path)?;
                Ok(Reader::from_stream(stream, self.options, self.buffer_capacity))
            }
            (ReaderSource::Path(path), ReaderMode::Mmap) => self.build_mmap(path),
            (ReaderSource::Reader(reader), ReaderMode::Default) => {
                Ok(Reader::from_stream(reader, self.options, self.buffer_capacity))
            }
            (ReaderSource::Reader(_), ReaderMode::Mmap) => Err(ReaderError::Builder(
                "mmap mode requires a filesystem path".into(),
            )),
        }
    }

    /// Opens a path as a stream, decompressing when asked to.
    fn open_path_stream(&self, path: &Path) -> ReaderResult<Box<dyn Read + Send>> {
        #[cfg(any(feature = "gzip", feature = "zstd", feature = "bz2"))]
        {
            let compression = match self.compression {
                Compression::Auto => Compression::from_extension(path),
                other => other,
            };
            let file = File::open(path)?;

            match compression {
                Compression::None | Compression::Auto => Ok(Box::new(file)),
                #[cfg(feature = "gzip")]
                Compression::Gzip => Ok(Box::new(MultiGzDecoder::new(file))),
                #[cfg(feature = "zstd")]
                Compression::Zstd => Ok(Box::new(ZstdDecoder::new(file)?)),
                #[cfg(feature = "bz2")]
                Compression::Bzip2 => Ok(Box::new(BzDecoder::new(file))),
                #[allow(unreachable_patterns)]
                other => Err(ReaderError::Builder(format!(
                    "{other:?} input requested but the matching feature is disabled"
                ))),
            }
        }

        #[cfg(not(any(feature = "gzip", feature = "zstd", feature = "bz2")))]
        {
            if has_compressed_extension(path) {
                return Err(ReaderError::Builder(
                    "enable compression features to read compressed inputs".into(),
                ));
            }
            Ok(Box::new(File::open(path)?))
        }
    }

    #[cfg(feature = "mmap")]
    fn build_mmap(&self, path: PathBuf) -> ReaderResult<Reader> {
        if has_compressed_extension(&path) {
            return Err(ReaderError::Builder(
                "compression is only supported in buffered mode".into(),
            ));
        }

        let file = File::open(&path)?;
        // SAFETY: the map is read-only; concurrent truncation of the file by
        // another process is outside what this reader guards against.
        let map = unsafe { MmapOptions::new().map(&file) }.map_err(ReaderError::Mmap)?;

        Ok(Reader::with_inner(
            InnerSource::Mmap(MmapInner {
                data: map,
                cursor: 0,
            }),
            self.options,
        ))
    }

    #[cfg(not(feature = "mmap"))]
    fn build_mmap(&self, _path: PathBuf) -> ReaderResult<Reader> {
        Err(ReaderError::Builder(
            "enable the `mmap` feature to use mmap mode".into(),
        ))
    }
}

/// Reader source
enum ReaderSource {
    Path(PathBuf),
    Reader(Box<dyn Read + Send>),
}

/// Inner reader source
enum InnerSource {
    Buffered(BufReader<Box<dyn Read + Send>>),
    #[cfg(feature = "mmap")]
    Mmap(MmapInner),
}

/// Inner mmap reader source
#[cfg(feature = "mmap")]
struct MmapInner {
    data: memmap2::Mmap,
    cursor: usize,
}

impl InnerSource {
    /// Reads the next line into `buf`, newline included. Returns `false` at
    /// end of input.
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<bool> {
        buf.clear();
        match self {
            InnerSource::Buffered(reader) => Ok(reader.read_until(b'\n', buf)? > 0),
            #[cfg(feature = "mmap")]
            InnerSource::Mmap(inner) => {
                let data = &inner.data[inner.cursor..];
                if data.is_empty() {
                    return Ok(false);
                }
                let len = memchr(b'\n', data).map(|idx| idx + 1).unwrap_or(data.len());
                buf.extend_from_slice(&data[..len]);
                inner.cursor += len;
                Ok(true)
            }
        }
    }
}

/// The text of one record, terminator excluded.
struct RawRecord {
    text: String,
    first_line: usize,
}

impl RawRecord {
    fn assemble(&self, options: &ReaderOptions) -> ReaderResult<Record> {
        assemble(&self.text, self.first_line, options)
    }
}

/// A streaming reader for GenBank files.
///
/// The reader holds at most one record's text in memory at a time. Records
/// are yielded in file order; the first error ends the iteration.
///
/// # Example
///
/// ```rust,no_run
/// use genbank::Reader;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let reader = Reader::from_path("tests/data/sample.gb")?;
///
///     for record in reader {
///         let record = record?;
///         for feature in &record.features {
///             println!("{}\t{}", feature.kind, feature.location);
///         }
///     }
///
///     Ok(())
/// }
/// ```
pub struct Reader {
    inner: InnerSource,
    options: ReaderOptions,
    line: Vec<u8>,
    line_number: usize,
    failed: bool,
}

impl Reader {
    /// Creates a new `ReaderBuilder` to configure a `Reader`.
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Creates a new `Reader` from a path, decompressing by extension when
    /// the compression features are enabled.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ReaderResult<Self> {
        Self::builder().from_path(path).build()
    }

    /// Creates a new `Reader` from a path with custom options.
    pub fn from_path_with_options<P: AsRef<Path>>(
        path: P,
        options: ReaderOptions,
    ) -> ReaderResult<Self> {
        Self::builder().from_path(path).options(options).build()
    }

    /// Creates a new `Reader` from a byte source.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use genbank::Reader;
    ///
    /// fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let reader = Reader::from_reader(std::io::stdin())?;
    ///     println!("{} records", reader.count());
    ///     Ok(())
    /// }
    /// ```
    pub fn from_reader<T>(reader: T) -> ReaderResult<Self>
    where
        T: Read + Send + 'static,
    {
        Self::builder().from_reader(reader).build()
    }

    /// Creates a new `Reader` over a memory-mapped file.
    #[cfg(feature = "mmap")]
    pub fn from_mmap<P: AsRef<Path>>(path: P) -> ReaderResult<Self> {
        Self::builder()
            .from_path(path)
            .mode(ReaderMode::Mmap)
            .build()
    }

    fn from_stream(
        reader: Box<dyn Read + Send>,
        options: ReaderOptions,
        buffer_capacity: usize,
    ) -> Self {
        Self::with_inner(
            InnerSource::Buffered(BufReader::with_capacity(buffer_capacity, reader)),
            options,
        )
    }

    fn with_inner(inner: InnerSource, options: ReaderOptions) -> Self {
        Self {
            inner,
            options,
            line: Vec::with_capacity(128),
            line_number: 0,
            failed: false,
        }
    }

    /// Returns the options this reader parses with.
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Returns the number of lines consumed so far.
    pub fn current_line(&self) -> usize {
        self.line_number
    }

    /// Returns an iterator over the records in the reader.
    pub fn records(&mut self) -> Records<'_> {
        Records { reader: self }
    }

    /// Returns the next record, `None` at the end of input or after an
    /// error has been returned.
    pub fn next_record(&mut self) -> Option<ReaderResult<Record>> {
        if self.failed {
            return None;
        }

        let result = self
            .next_raw()
            .and_then(|raw| raw.map(|raw| raw.assemble(&self.options)).transpose());

        match result {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }

    /// Collects the lines of the next record up to its `//` terminator.
    fn next_raw(&mut self) -> ReaderResult<Option<RawRecord>> {
        let mut text = String::new();
        let mut first_line = 0;

        loop {
            if !self.inner.read_line(&mut self.line)? {
                if text.trim().is_empty() {
                    return Ok(None);
                }
                return Err(ReaderError::Truncated {
                    line: self.line_number,
                });
            }
            self.line_number += 1;

            let mut end = self.line.len();
            while end > 0 && matches!(self.line[end - 1], b'\n' | b'\r') {
                end -= 1;
            }
            let line = std::str::from_utf8(&self.line[..end]).map_err(|err| {
                ReaderError::InvalidEncoding {
                    line: self.line_number,
                    message: err.to_string(),
                }
            })?;

            if line.trim_end() == "//" {
                log::trace!(
                    "record terminated at line {} ({} lines)",
                    self.line_number,
                    self.line_number - first_line.max(1)
                );
                return Ok(Some(RawRecord {
                    text,
                    first_line: if first_line == 0 {
                        self.line_number
                    } else {
                        first_line
                    },
                }));
            }

            if text.is_empty() {
                if line.trim().is_empty() {
                    continue;
                }
                first_line = self.line_number;
            }
            text.push_str(line);
            text.push('\n');
        }
    }

    /// Returns a parallel iterator over the records in the reader.
    ///
    /// Record boundaries are found sequentially; the records themselves are
    /// parsed on the rayon thread pool. Collecting the iterator keeps file
    /// order. A reading error is yielded after the records that precede it.
    ///
    /// This requires the `rayon` feature.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use genbank::Reader;
    /// use rayon::prelude::*;
    ///
    /// fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let reader = Reader::from_path("tests/data/sample.gb")?;
    ///     let records: Vec<_> = reader.par_records().collect::<Result<_, _>>()?;
    ///     println!("{} records", records.len());
    ///     Ok(())
    /// }
    /// ```
    #[cfg(feature = "rayon")]
    pub fn par_records(mut self) -> ParallelRecords {
        let mut blocks = Vec::new();
        if !self.failed {
            loop {
                match self.next_raw() {
                    Ok(Some(raw)) => blocks.push(Ok(raw)),
                    Ok(None) => break,
                    Err(err) => {
                        blocks.push(Err(err));
                        break;
                    }
                }
            }
        }

        ParallelRecords {
            blocks,
            options: self.options,
        }
    }
}

impl Iterator for Reader {
    type Item = ReaderResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// An iterator over the records of a borrowed [`Reader`].
pub struct Records<'a> {
    reader: &'a mut Reader,
}

impl<'a> Iterator for Records<'a> {
    type Item = ReaderResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_record()
    }
}

/// A parallel iterator over the records of a file.
///
/// This requires the `rayon` feature.
#[cfg(feature = "rayon")]
pub struct ParallelRecords {
    blocks: Vec<ReaderResult<RawRecord>>,
    options: ReaderOptions,
}

#[cfg(feature = "rayon")]
impl ParallelIterator for ParallelRecords {
    type Item = ReaderResult<Record>;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: rayon::iter::plumbing::UnindexedConsumer<Self::Item>,
    {
        let options = self.options;
        self.blocks
            .into_par_iter()
            .map(move |block| block.and_then(|raw| raw.assemble(&options)))
            .drive_unindexed(consumer)
    }
}

/// Reads every record of a file into memory.
///
/// # Example
///
/// ```rust,no_run
/// fn main() -> Result<(), genbank::ReaderError> {
///     let records = genbank::load("tests/data/sample.gb")?;
///     println!("{} records", records.len());
///     Ok(())
/// }
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> ReaderResult<Vec<Record>> {
    Reader::from_path(path)?.collect()
}

/// Reads every record of a byte source into memory.
pub fn load_from<T>(reader: T) -> ReaderResult<Vec<Record>>
where
    T: Read + Send + 'static,
{
    Reader::from_reader(reader)?.collect()
}
