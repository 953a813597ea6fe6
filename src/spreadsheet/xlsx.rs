//! Office Open XML workbooks (`.xlsx`, `.xlsm`).

use crate::error::FetchError;
use crate::error::WorkbookError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::RawTable;
use crate::spreadsheet::SheetSource;
use log::debug;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;

const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_SHEET: QName = QName(b"sheet");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh"); // furigana runs, not part of the value
const TAG_TEXT: QName = QName(b"t");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

/// Reads worksheets out of xlsx workbooks. The source id is a local path or a
/// remote URL.
///
/// Cells come back as the text stored in the file: numbers in their stored
/// form, booleans as `TRUE`/`FALSE`, errors as their code (`#N/A`). The grid
/// starts at A1; trailing empty cells and rows are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkbookSource;

impl SheetSource for WorkbookSource {
    fn fetch(&self, source_id: &str, worksheet: &str) -> Result<RawTable, FetchError> {
        let table = XlsxWorkbook::open(source_id)
            .and_then(|mut workbook| workbook.read_sheet(worksheet))
            .map_err(|error| error.into_fetch_error(source_id, worksheet))?;
        if table.is_empty() {
            return Err(FetchError::EmptyWorksheet {
                source_id: source_id.to_owned(),
                worksheet: worksheet.to_owned(),
            });
        }
        debug!("Read {} rows from '{source_id}'[{worksheet}]", table.len());
        Ok(table)
    }
}

/// Type of a cell as declared by its `t` attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum CellKind {
    Number,
    SharedString,
    InlineString,
    Boolean,
    Error,
}

impl CellKind {
    fn parse(kind: Option<&str>) -> CellKind {
        match kind {
            Some("s") => CellKind::SharedString,
            Some("inlineStr") | Some("str") => CellKind::InlineString,
            Some("b") => CellKind::Boolean,
            Some("e") => CellKind::Error,
            _ => CellKind::Number,
        }
    }
}

pub(crate) struct XlsxWorkbook {
    zip: zip::ZipArchive<UnifiedReader>,
    /// (worksheet name, part path) in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook {
    pub(crate) fn open(file_name: &str) -> Result<XlsxWorkbook, WorkbookError> {
        let reader = UnifiedReader::new(file_name)?;
        let mut zip = zip::ZipArchive::new(reader)?;
        let sheets = load_workbook(&mut zip)?;
        Ok(XlsxWorkbook { zip, sheets })
    }

    /// Exact name match wins over a case-insensitive one.
    fn sheet_path(&self, name: &str) -> Option<String> {
        self.sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .or_else(|| self.sheets.iter().find(|(sheet, _)| sheet.eq_ignore_ascii_case(name)))
            .map(|(_, path)| path.to_owned())
    }

    pub(crate) fn read_sheet(&mut self, name: &str) -> Result<RawTable, WorkbookError> {
        let path = self.sheet_path(name).ok_or(WorkbookError::WorksheetNotFound)?;
        let shared_strings = self.load_shared_strings()?;
        let mut reader = self.zip
            .xml_reader(&path)?
            .ok_or_else(|| WorkbookError::MissingPart(path.to_owned()))?;

        let mut cells = Vec::<(usize, usize, String)>::new();
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellKind::Number;
        let mut value = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(number) = event.parse_attribute_value::<usize>("r")? {
                    row_count = number.saturating_sub(1);
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_count, col_count));
                col_count = col + 1;
                kind = CellKind::parse(event.get_attribute_value("t")?.as_deref());
                value.clear();
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if !value.is_empty() {
                    cells.push((row, col, render_cell(kind, &value, &shared_strings)?));
                }
            }
        });
        Ok(into_grid(cells))
    }

    fn load_shared_strings(&mut self) -> Result<Vec<String>, WorkbookError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader("xl/sharedStrings.xml")? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }
}

fn render_cell(kind: CellKind, value: &str, shared_strings: &[String]) -> Result<String, WorkbookError> {
    match kind {
        CellKind::SharedString => {
            let index = value.trim().parse::<usize>()?;
            shared_strings
                .get(index)
                .cloned()
                .ok_or(WorkbookError::SharedStringOutOfRange(index))
        }
        CellKind::Boolean => Ok(if matches!(value.trim(), "1" | "true") { "TRUE" } else { "FALSE" }.to_owned()),
        CellKind::Number | CellKind::InlineString | CellKind::Error => Ok(value.to_owned()),
    }
}

/// Lays cells out on a grid anchored at A1. Empty values do not widen a row.
fn into_grid(cells: Vec<(usize, usize, String)>) -> RawTable {
    let mut grid = RawTable::new();
    for (row, col, value) in cells {
        if value.is_empty() {
            continue;
        }
        if grid.len() <= row {
            grid.resize_with(row + 1, Vec::new);
        }
        let cells = &mut grid[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value;
    }
    grid
}

/// Worksheet names and part paths from `xl/workbook.xml`, in workbook order.
fn load_workbook(zip: &mut zip::ZipArchive<UnifiedReader>) -> Result<Vec<(String, String)>, WorkbookError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| WorkbookError::MissingPart("xl/workbook.xml".to_owned()))?;
    let mut sheets = Vec::<(String, String)>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&*id) {
                    sheets.push((name.into_owned(), path.to_owned()));
                }
            }
        }
    });
    Ok(sheets)
}

/// Relationship id to worksheet part path.
fn load_relationships(zip: &mut zip::ZipArchive<UnifiedReader>, path: &str) -> Result<HashMap<String, String>, WorkbookError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| WorkbookError::MissingPart(path.to_owned()))?;
    let mut relationships = HashMap::<String, String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.into_owned(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Relationship targets are relative to `xl/` unless absolute.
fn to_zip_path(path: &str) -> String {
    if let Some(absolute) = path.strip_prefix('/') {
        absolute.to_owned()
    } else if path.starts_with("xl/") {
        path.to_owned()
    } else {
        format!("xl/{path}")
    }
}

/// Collects the text runs up to `end_tag`, skipping phonetic annotations.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, WorkbookError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
