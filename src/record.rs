use crate::error::SkipReason;

/// One input row: its fields in column order plus the 1-based row number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    row: u64,
    fields: Vec<String>,
}

impl Record {
    pub fn new(row: u64, fields: Vec<String>) -> Self {
        Record { row, fields }
    }

    pub fn row(&self) -> u64 {
        self.row
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, column: usize) -> Result<&str, SkipReason> {
        self.fields
            .get(column)
            .map(String::as_str)
            .ok_or(SkipReason::TooFewFields {
                expected: column + 1,
                found: self.fields.len(),
            })
    }
}
