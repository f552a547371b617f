// src/agent.rs

use crate::genai::GenAiClient;
use crate::parser::{ParserDefinition, ParserError};
use crate::paths::{BankPaths, Layout};
use crate::schema::{self, SchemaError};
use crate::table::{Table, TableError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Parsed rows echoed in the test summary.
const SAMPLE_OUTPUT_ROWS: usize = 2;
pub const RULE: &str = "============================================================";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("missing sample data files: {}", display_paths(.missing))]
    MissingInputs { missing: Vec<PathBuf> },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("could not save parser: {0}")]
    Save(#[source] ParserError),

    #[error("could not load parser: {0}")]
    Load(#[source] ParserError),

    #[error("failed to load reference table {}: {source}", path.display())]
    Reference {
        path: PathBuf,
        #[source]
        source: TableError,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of comparing the generated parser's output with the reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub parsed_row_count: usize,
    pub expected_row_count: usize,
    /// Same column names in the same order.
    pub columns_match: bool,
    pub sample: Table,
}

impl ValidationReport {
    pub fn compare(parsed: &Table, expected: &Table) -> Self {
        Self {
            parsed_row_count: parsed.len(),
            expected_row_count: expected.len(),
            columns_match: parsed.columns() == expected.columns(),
            sample: parsed.head(SAMPLE_OUTPUT_ROWS),
        }
    }

    pub fn counts_match(&self) -> bool {
        self.parsed_row_count == self.expected_row_count
    }

    pub fn print(&self) {
        println!("Test Results:");
        println!("   Parsed: {} transactions", self.parsed_row_count);
        println!("   Expected: {} transactions", self.expected_row_count);
        println!("   Columns match: {}", self.columns_match);
        if !self.sample.is_empty() {
            println!("   Sample output:");
            println!("{}", self.sample);
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub parser_path: PathBuf,
    pub report: ValidationReport,
}

pub struct Agent {
    layout: Layout,
    genai: Option<GenAiClient>,
}

impl Agent {
    pub fn new(layout: Layout, genai: Option<GenAiClient>) -> Self {
        Self { layout, genai }
    }

    pub fn announce(&self) {
        match &self.genai {
            Some(client) => println!("AI Agent initialized successfully ({})", client.model()),
            None => println!("AI Agent running in fallback mode"),
        }
    }

    /// Analyze, generate, save, load back and validate the parser for `bank`.
    ///
    /// Row-count or column differences are reported but do not fail the run.
    pub fn run(&self, bank: &str) -> Result<RunSummary, AgentError> {
        let span = tracing::info_span!("agent", bank = %bank);
        let _guard = span.enter();

        println!("Agent starting for {}...", bank.to_uppercase());
        println!("{RULE}");

        let paths = self.layout.bank(bank);
        check_inputs(&paths)?;
        println!("Input files validated");

        let schema = schema::analyze(&paths)?;
        println!("Analyzed {bank} data:");
        println!("   Columns: {:?}", schema.columns);
        println!("   Rows: {}", schema.row_count);

        println!("Generating parser...");
        let definition = ParserDefinition::generate(bank, &schema);
        definition.write(&paths.parser).map_err(AgentError::Save)?;
        info!(path = %paths.parser.display(), "Parser saved");
        println!("Parser saved: {}", self.relative(&paths.parser).display());

        println!("Testing parser...");
        let report = validate(&paths)?;
        report.print();

        println!("\n{RULE}");
        println!("SUCCESS! Agent completed for {}", bank.to_uppercase());
        println!("Generated: {}", self.relative(&paths.parser).display());

        Ok(RunSummary {
            parser_path: paths.parser,
            report,
        })
    }

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(self.layout.root()).unwrap_or(path)
    }
}

fn check_inputs(paths: &BankPaths) -> Result<(), AgentError> {
    let missing: Vec<PathBuf> = [&paths.pdf, &paths.csv]
        .into_iter()
        .filter(|p| !p.exists())
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AgentError::MissingInputs { missing })
    }
}

/// Load the saved parser, run it on the sample PDF and compare with the CSV.
pub fn validate(paths: &BankPaths) -> Result<ValidationReport, AgentError> {
    let definition = ParserDefinition::load(&paths.parser).map_err(AgentError::Load)?;
    let parsed = definition.parse(&paths.pdf);
    let expected =
        Table::from_csv_path(&paths.csv).map_err(|source| AgentError::Reference {
            path: paths.csv.clone(),
            source,
        })?;

    let report = ValidationReport::compare(&parsed, &expected);
    if !report.counts_match() || !report.columns_match {
        warn!(
            parsed = report.parsed_row_count,
            expected = report.expected_row_count,
            columns_match = report.columns_match,
            "Parser output differs from reference"
        );
    }
    Ok(report)
}
