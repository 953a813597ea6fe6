#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Writes a minimal xlsx package by hand. `sheets` holds (name, `<sheetData>` body).
pub fn write_workbook(path: &Path, sheets: &[(&str, &str)], shared_strings: &[&str]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    let mut part = |name: &str, content: String| {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    };

    let sheet_entries: String = sheets
        .iter()
        .enumerate()
        .map(|(index, (name, _))| format!(r#"<sheet name="{name}" sheetId="{}" r:id="rId{}"/>"#, index + 1, index + 1))
        .collect();
    part(
        "xl/workbook.xml",
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>{sheet_entries}</sheets></workbook>"#),
    );

    let relationships: String = (1..=sheets.len())
        .map(|index| {
            format!(r#"<Relationship Id="rId{index}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{index}.xml"/>"#)
        })
        .collect();
    part(
        "xl/_rels/workbook.xml.rels",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}<Relationship Id="rId99" Type="{REL_NS}/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#
        ),
    );

    for (index, (_, data)) in sheets.iter().enumerate() {
        part(
            &format!("xl/worksheets/sheet{}.xml", index + 1),
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{MAIN_NS}"><sheetData>{data}</sheetData></worksheet>"#),
        );
    }

    if !shared_strings.is_empty() {
        let items: String = shared_strings.iter().map(|text| format!("<si><t>{text}</t></si>")).collect();
        part(
            "xl/sharedStrings.xml",
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="{MAIN_NS}" count="{0}" uniqueCount="{0}">{items}</sst>"#, shared_strings.len()),
        );
    }
    zip.finish().unwrap();
}

/// Writes a single-sheet workbook with rust_xlsxwriter; every cell is a string.
pub fn write_string_workbook(path: &Path, sheet: &str, rows: &[&[&str]]) {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    for (row, cells) in rows.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            if !cell.is_empty() {
                worksheet.write_string(row as u32, col as u16, *cell).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
