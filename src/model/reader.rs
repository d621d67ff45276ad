//! Model File Reader
//!
//! Streams a text vector file line by line in the configured encoding.
//!
//! File format:
//! - Optional header: `<vocab_size> <dimension>`
//! - Rows: `<word> <v1> <v2> ... <vD>`, fields separated by runs of whitespace

use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{HeaderMode, LoadOptions};
use crate::error::{LoadError, ParseError, ParseErrorKind};

/// Read buffer size for model files
const READ_BUFFER_SIZE: usize = 1 << 16;

/// Lines between cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Values from a `<vocab_size> <dimension>` header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelHeader {
    pub vocabulary: usize,
    pub dimension: usize,
}

/// One parsed model row, borrowed from the reader's buffers
#[derive(Debug)]
pub struct Row<'r> {
    pub word: &'r str,
    pub vector: &'r [f64],
    /// 1-based line number
    pub line: usize,
}

/// Streaming reader over a model file
pub struct ModelReader<'c> {
    reader: BufReader<DecodeReaderBytes<File, Vec<u8>>>,
    path: PathBuf,
    dimension: usize,
    header_mode: HeaderMode,
    cancel: &'c CancellationToken,
    line: String,
    vector: Vec<f64>,
    line_no: usize,
    seen_content: bool,
    header: Option<ModelHeader>,
    blank_lines: usize,
    lossy_words: usize,
}

impl<'c> ModelReader<'c> {
    /// Open the model file for one pass
    pub fn open(opts: &LoadOptions, cancel: &'c CancellationToken) -> Result<Self, LoadError> {
        let file = File::open(&opts.path).map_err(|e| LoadError::io(&opts.path, e))?;
        let decoder = DecodeReaderBytesBuilder::new()
            .encoding(Some(opts.encoding))
            .bom_override(true)
            .strip_bom(true)
            .build(file);

        debug!(
            "Opened model file {} as {}",
            opts.path.display(),
            opts.encoding.name()
        );

        Ok(Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, decoder),
            path: opts.path.clone(),
            dimension: opts.dim(),
            header_mode: opts.header,
            cancel,
            line: String::new(),
            vector: Vec::with_capacity(opts.dim()),
            line_no: 0,
            seen_content: false,
            header: None,
            blank_lines: 0,
            lossy_words: 0,
        })
    }

    /// Read the next data row, skipping blank lines and the header
    pub fn next_row(&mut self) -> Result<Option<Row<'_>>, LoadError> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| LoadError::io(&self.path, e))?;
            if n == 0 {
                return Ok(None);
            }

            self.line_no += 1;
            if self.line_no % CANCEL_CHECK_INTERVAL == 0 && self.cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }

            if self.line.trim().is_empty() {
                self.blank_lines += 1;
                continue;
            }

            if !self.seen_content {
                self.seen_content = true;
                let header = parse_header(&self.line, self.dimension);
                let skip = match self.header_mode {
                    HeaderMode::Auto => header.is_some(),
                    HeaderMode::Present => true,
                    HeaderMode::Absent => false,
                };
                if skip {
                    debug!("Skipping model header line: {}", self.line.trim_end());
                    self.header = header;
                    continue;
                }
            }

            break;
        }

        let word = parse_row(&self.line, self.line_no, self.dimension, &mut self.vector)?;
        if word.contains(char::REPLACEMENT_CHARACTER) {
            self.lossy_words += 1;
            debug!(
                "Model line {}: word {:?} has bytes invalid in the configured encoding",
                self.line_no, word
            );
        }
        Ok(Some(Row {
            word,
            vector: &self.vector,
            line: self.line_no,
        }))
    }

    /// Header values, if a header line was skipped
    pub fn header(&self) -> Option<ModelHeader> {
        self.header
    }

    /// Lines read so far, including blank and header lines
    pub fn lines_read(&self) -> usize {
        self.line_no
    }

    /// Blank lines skipped so far
    pub fn blank_lines(&self) -> usize {
        self.blank_lines
    }

    /// Words that needed replacement characters to decode
    pub fn lossy_words(&self) -> usize {
        self.lossy_words
    }
}

/// Recognize a `<vocab_size> <dimension>` header whose dimension matches.
pub fn parse_header(line: &str, dimension: usize) -> Option<ModelHeader> {
    let mut fields = line.split_whitespace();
    let vocabulary = fields.next()?.parse::<usize>().ok()?;
    let dim = fields.next()?.parse::<usize>().ok()?;
    if fields.next().is_some() || dim != dimension {
        return None;
    }
    Some(ModelHeader {
        vocabulary,
        dimension: dim,
    })
}

/// Split a row into its word and exactly `dimension` finite components.
///
/// Components are written into `out`; the word is returned.
pub fn parse_row<'l>(
    line: &'l str,
    line_no: usize,
    dimension: usize,
    out: &mut Vec<f64>,
) -> Result<&'l str, ParseError> {
    out.clear();
    let mut fields = line.split_whitespace();
    let word = fields.next().unwrap_or_default();

    let mut components = 0usize;
    let mut invalid: Option<(usize, &str)> = None;
    for field in fields {
        components += 1;
        if components > dimension || invalid.is_some() {
            continue;
        }
        match field.parse::<f64>() {
            Ok(v) if v.is_finite() => out.push(v),
            _ => invalid = Some((components, field)),
        }
    }

    if components != dimension {
        return Err(ParseError {
            line: line_no,
            kind: ParseErrorKind::FieldCount {
                expected: dimension + 1,
                found: components + 1,
            },
        });
    }

    if let Some((column, value)) = invalid {
        return Err(ParseError {
            line: line_no,
            kind: ParseErrorKind::InvalidComponent {
                column,
                value: value.to_string(),
            },
        });
    }

    Ok(word)
}
