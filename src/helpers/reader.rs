use crate::error::WorkbookError;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use url::Url;

/// Workbook bytes from either a local file or a remote URL.
pub(crate) enum UnifiedReader {
    Local(BufReader<File>),
    /// Remote content, downloaded in full
    Remote(Cursor<Vec<u8>>),
}

impl UnifiedReader {
    /// Opens a local path, or downloads a remote URL (http, https, s3, gs, ...)
    /// through DuckDB's `read_blob`, which resolves the protocol and any
    /// configured secrets.
    pub(crate) fn new(file_name: &str) -> Result<UnifiedReader, WorkbookError> {
        if Self::is_remote_url(file_name) {
            Self::read_blob_with_duckdb(file_name)
        } else {
            let path = file_name.strip_prefix("file://").unwrap_or(file_name);
            let file = File::open(path)?;
            Ok(UnifiedReader::Local(BufReader::new(file)))
        }
    }

    /// True for URLs with any scheme but `file`. Single-letter schemes are
    /// Windows drive letters, not URLs.
    pub(crate) fn is_remote_url(file_name: &str) -> bool {
        match Url::parse(file_name) {
            Ok(url) => url.scheme() != "file" && url.scheme().len() > 1,
            Err(_) => false,
        }
    }

    fn read_blob_with_duckdb(file_name: &str) -> Result<UnifiedReader, WorkbookError> {
        debug!("Downloading '{file_name}' with read_blob");
        let connection = duckdb::Connection::open_in_memory()?;
        let result: Result<Vec<u8>, _> = connection.query_row("SELECT content FROM read_blob(?)", [file_name], |row| row.get(0));
        connection.close().map_err(|(_, error)| error)?;

        let bytes = result?;
        if bytes.is_empty() {
            return Err(WorkbookError::RemoteEmpty(file_name.to_owned()));
        }
        Ok(UnifiedReader::Remote(Cursor::new(bytes)))
    }
}

impl Read for UnifiedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            UnifiedReader::Local(reader) => reader.read(buf),
            UnifiedReader::Remote(reader) => reader.read(buf),
        }
    }
}

impl Seek for UnifiedReader {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        match self {
            UnifiedReader::Local(reader) => reader.seek(pos),
            UnifiedReader::Remote(reader) => reader.seek(pos),
        }
    }
}
