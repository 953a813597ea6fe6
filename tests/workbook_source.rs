mod common;

use common::strings;
use common::write_string_workbook;
use common::write_workbook;
use sheet_sync::error::FetchError;
use sheet_sync::Credentials;
use sheet_sync::GoogleSheetsSource;
use sheet_sync::SheetSource;
use sheet_sync::SourceRouter;
use sheet_sync::WorkbookSource;

const PEOPLE: &str = concat!(
    r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="inlineStr"><is><t>Active</t></is></c></row>"#,
    r#"<row r="2"><c r="A2"><v>1</v></c><c r="B2" t="s"><v>2</v></c><c r="C2" t="b"><v>1</v></c><c r="D2" s="3"/></row>"#,
    r#"<row r="4"><c r="A4"><v>3.5</v></c><c r="C4" t="e"><v>#N/A</v></c><c r="D4" t="str"><f>A4&amp;"x"</f><v>3.5x</v></c></row>"#,
    r#"<row r="6"><c r="A6" s="1"/></row>"#,
);

#[test]
fn reads_a_worksheet_into_a_grid() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("people.xlsx");
    write_workbook(&path, &[("Other", ""), ("People", PEOPLE)], &["Name", "Score", "Ada &amp; Co"]);

    let table = WorkbookSource.fetch(path.to_str().unwrap(), "People").unwrap();
    assert_eq!(
        table,
        vec![
            strings(&["Name", "Score", "Active"]),
            strings(&["1", "Ada & Co", "TRUE"]),
            strings(&[]),
            strings(&["3.5", "", "#N/A", "3.5x"]),
        ]
    );
}

#[test]
fn reads_cells_without_references() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("loose.xlsx");
    let data = r#"<row><c t="inlineStr"><is><t>a</t></is></c><c><v>2</v></c></row><row><c r="B2"><v>x</v></c></row>"#;
    write_workbook(&path, &[("Loose", data)], &[]);

    let table = WorkbookSource.fetch(path.to_str().unwrap(), "Loose").unwrap();
    assert_eq!(table, vec![strings(&["a", "2"]), strings(&["", "x"])]);
}

#[test]
fn matches_worksheet_names_ignoring_case() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("people.xlsx");
    write_workbook(&path, &[("People", PEOPLE)], &["Name", "Score", "Ada"]);
    assert!(WorkbookSource.fetch(path.to_str().unwrap(), "PEOPLE").is_ok());
}

#[test]
fn reads_workbooks_written_by_excel_writers() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("written.xlsx");
    write_string_workbook(&path, "Q1 Sales", &[&["Region", "Total"], &["North", "12"], &["", "7"]]);

    let table = WorkbookSource.fetch(path.to_str().unwrap(), "Q1 Sales").unwrap();
    assert_eq!(table, vec![strings(&["Region", "Total"]), strings(&["North", "12"]), strings(&["", "7"])]);

    let url = format!("file://{}", path.display());
    assert_eq!(WorkbookSource.fetch(&url, "Q1 Sales").unwrap(), table);
}

#[test]
fn reports_fetch_failures() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("people.xlsx");
    write_workbook(&path, &[("People", PEOPLE), ("Blank", "")], &["Name", "Score", "Ada"]);
    let source_id = path.to_str().unwrap();

    assert!(matches!(
        WorkbookSource.fetch(source_id, "Missing"),
        Err(FetchError::NotFound { worksheet, .. }) if worksheet == "Missing"
    ));
    assert!(matches!(WorkbookSource.fetch(source_id, "Blank"), Err(FetchError::EmptyWorksheet { .. })));

    let missing = directory.path().join("missing.xlsx");
    assert!(matches!(
        WorkbookSource.fetch(missing.to_str().unwrap(), "People"),
        Err(FetchError::Unreachable { .. })
    ));

    let corrupt = directory.path().join("corrupt.xlsx");
    std::fs::write(&corrupt, "not a zip archive").unwrap();
    assert!(matches!(
        WorkbookSource.fetch(corrupt.to_str().unwrap(), "People"),
        Err(FetchError::Malformed { .. })
    ));
}

#[test]
fn router_sends_workbooks_to_the_workbook_source() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("people.xlsx");
    write_workbook(&path, &[("People", PEOPLE)], &["Name", "Score", "Ada"]);

    let google = GoogleSheetsSource::new(Credentials::Anonymous).unwrap();
    let router = SourceRouter::new(google);
    let table = router.fetch(path.to_str().unwrap(), "People").unwrap();
    assert_eq!(table[0], strings(&["Name", "Score", "Active"]));
}
