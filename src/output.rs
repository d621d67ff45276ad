//! Result Output
//!
//! CSV rows of `FileID,SegmentID,SequenceNumber` followed by one column per
//! word group, labelled with the group's definition string. Undefined
//! similarities are written as empty fields.

use std::io::Write;

use crate::scoring::ScoreRow;

/// Identifier columns preceding the group columns
pub const ID_COLUMNS: [&str; 3] = ["FileID", "SegmentID", "SequenceNumber"];

/// Writes score rows as CSV
pub struct ResultEmitter<W: Write> {
    writer: csv::Writer<W>,
    groups: usize,
    rows: usize,
}

impl<W: Write> ResultEmitter<W> {
    /// Create an emitter and write the header row
    pub fn new<I, S>(writer: W, labels: I) -> csv::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut writer = csv::Writer::from_writer(writer);
        let mut header: Vec<String> = ID_COLUMNS.iter().map(|c| c.to_string()).collect();
        header.extend(labels.into_iter().map(|l| l.as_ref().to_string()));
        let groups = header.len() - ID_COLUMNS.len();
        writer.write_record(&header)?;

        Ok(Self {
            writer,
            groups,
            rows: 0,
        })
    }

    /// Write one row
    pub fn emit(&mut self, row: &ScoreRow) -> csv::Result<()> {
        debug_assert_eq!(row.scores.len(), self.groups, "Row must score every group");

        let mut record = Vec::with_capacity(ID_COLUMNS.len() + row.scores.len());
        record.push(row.id.file_id.clone());
        record.push(row.id.segment_id.clone());
        record.push(row.id.sequence_number.to_string());
        record.extend(row.scores.iter().map(|s| s.to_string()));

        self.writer.write_record(&record)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer
    pub fn finish(self) -> csv::Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}
