// src/parser.rs

use crate::pdf_extract::{self, PdfDocument, PdfError, RawTable};
use crate::schema::Schema;
use crate::table::Table;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml_edit::{Array, DocumentMut, value};
use tracing::{error, info, warn};

/// Version of the parser definition format written by [`ParserDefinition::render`].
pub const FORMAT_VERSION: i64 = 1;

/// Fields emitted by the positional extractor, in order.
pub const TRANSACTION_COLUMNS: [&str; 5] = ["Date", "Description", "Debit", "Credit", "Balance"];

/// Data rows shorter than this are dropped.
const MIN_ROW_CELLS: usize = 4;
const BALANCE_CELL: usize = 4;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parser definition {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{}: unsupported format version {found} (expected {expected})", path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: i64,
        expected: i64,
    },
}

/// The generated per-bank parser: a bank name plus the column list captured
/// when it was generated. Its behavior is [`ParserDefinition::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParserDefinition {
    pub format_version: i64,
    pub bank: String,
    pub columns: Vec<String>,
}

/// Where the per-page tables come from.
pub trait TableSource {
    /// Candidate tables for every page of the PDF, in page order.
    fn page_tables(&self, pdf_path: &Path) -> Result<Vec<Vec<RawTable>>, PdfError>;
}

/// Tables found by pdfplumber on each page.
pub struct PdfTables;

impl TableSource for PdfTables {
    fn page_tables(&self, pdf_path: &Path) -> Result<Vec<Vec<RawTable>>, PdfError> {
        let doc = PdfDocument::open(pdf_path)?;
        info!(pages = doc.page_count(), "Processing pages");

        let pages = doc.pages()?;
        if pdf_extract::looks_like_scanned(&pages) {
            warn!("PDF looks scanned / image-only, no text tables expected");
        }

        let mut found = Vec::with_capacity(pages.len());
        for page in &pages {
            let span = tracing::info_span!("page", page = page.page_number() + 1);
            let _guard = span.enter();
            found.push(pdf_extract::page_tables(page));
        }
        Ok(found)
    }
}

impl ParserDefinition {
    /// Snapshot the schema's columns into a new definition for `bank`.
    pub fn generate(bank: &str, schema: &Schema) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            bank: bank.to_string(),
            columns: schema.columns.clone(),
        }
    }

    /// Source text of the definition. Identical inputs give identical text.
    pub fn render(&self) -> String {
        let mut doc = DocumentMut::new();
        doc["format_version"] = value(self.format_version);
        doc["bank"] = value(self.bank.as_str());
        let mut columns = Array::new();
        for column in &self.columns {
            columns.push(column.as_str());
        }
        doc["columns"] = value(columns);

        format!(
            "# Parser for {} bank statement PDFs.\n\
             # parse(pdf_path) returns a table; when nothing is extracted its columns are: {:?}\n\
             \n\
             {doc}",
            self.bank.to_uppercase(),
            self.columns,
        )
    }

    /// Render to `path`, creating its directory and replacing any previous file.
    pub fn write(&self, path: &Path) -> Result<(), ParserError> {
        let write_err = |source| ParserError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        fs::write(path, self.render()).map_err(write_err)
    }

    pub fn load(path: &Path) -> Result<Self, ParserError> {
        let content = fs::read_to_string(path).map_err(|source| ParserError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let definition: Self = toml::from_str(&content).map_err(|source| ParserError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        if definition.format_version != FORMAT_VERSION {
            return Err(ParserError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: definition.format_version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(definition)
    }

    /// Empty result carrying the captured columns.
    pub fn fallback(&self) -> Table {
        Table::empty(self.columns.clone())
    }

    /// Extract the transaction table from `pdf_path`.
    pub fn parse(&self, pdf_path: &Path) -> Table {
        self.parse_with(&PdfTables, pdf_path)
    }

    /// Extract using `source` for table detection.
    ///
    /// A `.csv` next to the PDF is returned as-is without touching the PDF.
    /// Otherwise every detected table contributes positional transaction
    /// rows. Failures and empty extractions both give [`Self::fallback`].
    pub fn parse_with<S: TableSource + ?Sized>(&self, source: &S, pdf_path: &Path) -> Table {
        info!(
            bank = %self.bank.to_uppercase(),
            pdf = %pdf_path.display(),
            "Processing statement"
        );

        let reference = pdf_path.with_extension("csv");
        if reference.exists() {
            info!(path = %reference.display(), "Using reference CSV data");
            return match Table::from_csv_path(&reference) {
                Ok(table) => table,
                Err(e) => {
                    error!(error = %e, "Failed to read reference CSV");
                    println!("Error: {e}");
                    self.fallback()
                }
            };
        }

        match source.page_tables(pdf_path) {
            Ok(pages) => {
                let rows = transaction_rows(pages.iter().flatten());
                if rows.is_empty() {
                    info!("No transaction rows found");
                    return self.fallback();
                }
                info!(rows = rows.len(), "Extracted transactions");
                let columns = TRANSACTION_COLUMNS.iter().map(|c| c.to_string()).collect();
                Table::with_rows(columns, rows)
            }
            Err(e) => {
                error!(error = %e, "PDF extraction failed");
                println!("Error: {e}");
                self.fallback()
            }
        }
    }
}

/// Map table rows onto [`TRANSACTION_COLUMNS`] by position.
///
/// Row 0 of each table is a header and is skipped, as are tables with no
/// other rows and rows with fewer than four cells. Cell 4 is the balance
/// when present.
pub fn transaction_rows<'a>(tables: impl IntoIterator<Item = &'a RawTable>) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for table in tables {
        if table.len() <= 1 {
            continue;
        }
        for row in &table[1..] {
            if row.len() < MIN_ROW_CELLS {
                continue;
            }
            let cell = |i: usize| row.get(i).cloned().flatten().unwrap_or_default();
            let balance = if row.len() > BALANCE_CELL {
                cell(BALANCE_CELL)
            } else {
                String::new()
            };
            rows.push(vec![cell(0), cell(1), cell(2), cell(3), balance]);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf_extract::Cell;
    use crate::pdf_extract::tests::{pdf_with_pages, ruled_table};

    fn definition(columns: &[&str]) -> ParserDefinition {
        ParserDefinition {
            format_version: FORMAT_VERSION,
            bank: "icici".to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn row(cells: &[&str]) -> Vec<Cell> {
        cells
            .iter()
            .map(|c| (!c.is_empty()).then(|| c.to_string()))
            .collect()
    }

    struct StaticTables(Vec<Vec<RawTable>>);

    impl TableSource for StaticTables {
        fn page_tables(&self, _: &Path) -> Result<Vec<Vec<RawTable>>, PdfError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_positional_mapping_ignores_header_names() {
        let table = vec![
            row(&["A", "B", "C", "D", "E"]),
            row(&["2023-01-01", "Coffee", "5.00", "", "95.00"]),
        ];
        let rows = transaction_rows([&table]);
        assert_eq!(rows, [["2023-01-01", "Coffee", "5.00", "", "95.00"]]);

        let def = definition(&["Txn Date", "Narration", "Withdrawal", "Deposit", "Closing"]);
        let parsed = def.parse_with(&StaticTables(vec![vec![table]]), Path::new("/nowhere/x.pdf"));
        assert_eq!(parsed.columns(), TRANSACTION_COLUMNS);
        let record = parsed.records().next().unwrap();
        assert_eq!(record.get("Date"), Some("2023-01-01"));
        assert_eq!(record.get("Description"), Some("Coffee"));
        assert_eq!(record.get("Debit"), Some("5.00"));
        assert_eq!(record.get("Credit"), Some(""));
        assert_eq!(record.get("Balance"), Some("95.00"));
    }

    #[test]
    fn test_short_rows_are_dropped_not_padded() {
        let table = vec![
            row(&["A", "B", "C", "D"]),
            row(&["01-08", "Fuel", "40", ""]),
        ];
        let narrow = vec![row(&["A", "B", "C"]), row(&["01-08", "Fuel", "40"])];
        let rows = transaction_rows([&table, &narrow]);
        assert_eq!(rows, [["01-08", "Fuel", "40", "", ""]]);
    }

    #[test]
    fn test_header_only_tables_contribute_nothing() {
        let header_only = vec![row(&["Date", "Description", "Debit", "Credit"])];
        assert!(transaction_rows([&header_only]).is_empty());
    }

    #[test]
    fn test_fallback_uses_captured_columns() {
        let def = definition(&["Date", "Narration", "Amount"]);
        let parsed = def.parse_with(&StaticTables(vec![vec![], vec![]]), Path::new("/nowhere/x.pdf"));
        assert!(parsed.is_empty());
        assert_eq!(parsed.columns(), ["Date", "Narration", "Amount"]);
    }

    #[test]
    fn test_unreadable_pdf_gives_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("broken.pdf");
        fs::write(&pdf, b"not a pdf at all").unwrap();

        let parsed = definition(&["Date", "Amount"]).parse(&pdf);
        assert!(parsed.is_empty());
        assert_eq!(parsed.columns(), ["Date", "Amount"]);
    }

    #[test]
    fn test_missing_pdf_gives_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let parsed = definition(&["Date"]).parse(&dir.path().join("absent.pdf"));
        assert!(parsed.is_empty());
        assert_eq!(parsed.columns(), ["Date"]);
    }

    #[test]
    fn test_sibling_csv_short_circuits_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("statement.pdf");
        let csv = dir.path().join("statement.csv");
        fs::write(&pdf, b"not a pdf at all").unwrap();
        fs::write(&csv, "Date,Amount\n01-08-2024,12.50\n02-08-2024,\n").unwrap();

        let parsed = definition(&["Other"]).parse(&pdf);
        assert_eq!(parsed, Table::from_csv_path(&csv).unwrap());
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_extracts_rows_from_pdf() {
        let heading = "BT /F1 14 Tf 50 760 Td (ICICI Bank Statement) Tj ET\n";
        let content = heading.to_string()
            + &ruled_table(&[
                &["Date", "Description", "Debit", "Credit", "Balance"],
                &["2023-01-01", "Coffee", "5.00", "", "95.00"],
                &["2023-01-02", "Salary", "", "1000.00", "1095.00"],
            ]);

        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("icici_sample.pdf");
        fs::write(&pdf, pdf_with_pages(&[content.as_str()])).unwrap();

        let parsed = definition(&["Txn Date", "Narration"]).parse(&pdf);
        assert_eq!(parsed.columns(), TRANSACTION_COLUMNS);
        assert_eq!(
            parsed.rows(),
            [
                ["2023-01-01", "Coffee", "5.00", "", "95.00"],
                ["2023-01-02", "Salary", "", "1000.00", "1095.00"],
            ]
        );
    }

    #[test]
    fn test_text_without_rulings_gives_fallback() {
        let mut content = String::new();
        for (y, line) in [(700, "Date  Description  Balance"), (685, "2023-01-01  Coffee  95.00")] {
            content.push_str(&format!("BT /F1 10 Tf 50 {y} Td ({line}) Tj ET\n"));
        }

        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("plain.pdf");
        fs::write(&pdf, pdf_with_pages(&[content.as_str()])).unwrap();

        let parsed = definition(&["Date", "Description", "Balance"]).parse(&pdf);
        assert!(parsed.is_empty());
        assert_eq!(parsed.columns(), ["Date", "Description", "Balance"]);
    }

    #[test]
    fn test_render_is_stable_and_names_columns() {
        let def = definition(&["Date", "Description", "Balance"]);
        let text = def.render();
        assert_eq!(text, def.render());
        assert!(text.starts_with("# Parser for ICICI bank statement PDFs.\n"));
        assert!(text.contains(r#"["Date", "Description", "Balance"]"#));
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom_parsers").join("icici_parser.toml");
        let def = definition(&["Date", "Balance"]);
        def.write(&path).unwrap();
        assert_eq!(ParserDefinition::load(&path).unwrap(), def);
    }

    #[test]
    fn test_load_rejects_malformed_and_unknown_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.toml");

        fs::write(&path, "bank = \"icici\"\ncolumns = [\"Date\"").unwrap();
        assert!(matches!(
            ParserDefinition::load(&path),
            Err(ParserError::Invalid { .. })
        ));

        fs::write(&path, "format_version = 9\nbank = \"icici\"\ncolumns = []\n").unwrap();
        assert!(matches!(
            ParserDefinition::load(&path),
            Err(ParserError::UnsupportedVersion { found: 9, .. })
        ));

        assert!(matches!(
            ParserDefinition::load(&dir.path().join("absent.toml")),
            Err(ParserError::Read { .. })
        ));
    }
}
