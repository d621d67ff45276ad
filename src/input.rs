//! Document Input
//!
//! Reads pre-tokenized documents, one JSON object per line:
//!
//! ```text
//! {"fileId": "a.txt", "segmentId": "1", "sequenceNumber": 0, "tokens": ["king", "man"]}
//! ```
//!
//! `segmentId` may be omitted. A missing `sequenceNumber` becomes the
//! document's position in the stream, counting from zero.

use serde::Deserialize;
use std::io::BufRead;

use crate::error::InputError;
use crate::scoring::{Document, DocumentId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRecord {
    #[serde(default)]
    file_id: String,
    #[serde(default)]
    segment_id: String,
    sequence_number: Option<u64>,
    tokens: Vec<String>,
}

/// Streaming JSON-lines document reader
pub struct DocumentReader<R> {
    reader: R,
    line: String,
    line_no: usize,
    position: u64,
    failed: bool,
}

impl<R: BufRead> DocumentReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
            position: 0,
            failed: false,
        }
    }

    fn read_document(&mut self) -> Result<Option<Document>, InputError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }

            let record: DocumentRecord =
                serde_json::from_str(text).map_err(|source| InputError::Json {
                    line: self.line_no,
                    source,
                })?;

            let sequence_number = record.sequence_number.unwrap_or(self.position);
            self.position += 1;

            return Ok(Some(Document {
                id: DocumentId {
                    file_id: record.file_id,
                    segment_id: record.segment_id,
                    sequence_number,
                },
                tokens: record.tokens,
            }));
        }
    }
}

/// Stops after the first error
impl<R: BufRead> Iterator for DocumentReader<R> {
    type Item = Result<Document, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_document() {
            Ok(doc) => doc.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
