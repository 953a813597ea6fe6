//! # Sheet Sources
//!
//! Everything that can hand over a worksheet as a grid of strings: Google
//! Sheets through the Sheets API, and xlsx workbooks on disk or behind a URL.
use crate::error::FetchError;
use crate::spreadsheet::google::GoogleSheetsSource;
use crate::spreadsheet::xlsx::WorkbookSource;
use log::debug;
use url::Url;

pub mod google;
pub(crate) mod reference;
pub mod xlsx;

/// Worksheet contents, row-major. Rows may have different lengths.
pub type RawTable = Vec<Vec<String>>;

/// Reads whole worksheets.
pub trait SheetSource {
    /// Fetches every row of `worksheet` in the sheet identified by `source_id`,
    /// header row first. Either the whole table is returned or an error, never
    /// a partial table.
    fn fetch(&self, source_id: &str, worksheet: &str) -> Result<RawTable, FetchError>;
}

impl<T: SheetSource + ?Sized> SheetSource for &T {
    fn fetch(&self, source_id: &str, worksheet: &str) -> Result<RawTable, FetchError> {
        (**self).fetch(source_id, worksheet)
    }
}

impl<T: SheetSource + ?Sized> SheetSource for Box<T> {
    fn fetch(&self, source_id: &str, worksheet: &str) -> Result<RawTable, FetchError> {
        (**self).fetch(source_id, worksheet)
    }
}

/// Sends workbook paths and URLs to [`WorkbookSource`], everything else to
/// Google Sheets.
pub struct SourceRouter {
    workbooks: WorkbookSource,
    google: GoogleSheetsSource,
}

impl SourceRouter {
    pub fn new(google: GoogleSheetsSource) -> Self {
        SourceRouter {
            workbooks: WorkbookSource,
            google,
        }
    }

    /// True if `source_id` names an `.xlsx` or `.xlsm` file, locally or by URL.
    pub fn is_workbook(source_id: &str) -> bool {
        let path = match Url::parse(source_id) {
            Ok(url) if url.scheme().len() > 1 => url.path().to_owned(),
            _ => source_id.to_owned(),
        };
        let path = path.to_ascii_lowercase();
        path.ends_with(".xlsx") || path.ends_with(".xlsm")
    }
}

impl SheetSource for SourceRouter {
    fn fetch(&self, source_id: &str, worksheet: &str) -> Result<RawTable, FetchError> {
        if Self::is_workbook(source_id) {
            debug!("Reading '{worksheet}' from workbook '{source_id}'");
            self.workbooks.fetch(source_id, worksheet)
        } else {
            debug!("Reading '{worksheet}' from Google Sheets '{source_id}'");
            self.google.fetch(source_id, worksheet)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_workbook() {
        assert!(SourceRouter::is_workbook("data/budget.xlsx"));
        assert!(SourceRouter::is_workbook("C:\\data\\Budget.XLSM"));
        assert!(SourceRouter::is_workbook("https://example.com/files/budget.xlsx?version=3"));
        assert!(SourceRouter::is_workbook("s3://bucket/budget.xlsx"));

        assert!(!SourceRouter::is_workbook("1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms"));
        assert!(!SourceRouter::is_workbook("data/budget.csv"));
    }
}
