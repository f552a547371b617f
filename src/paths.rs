use std::path::{Path, PathBuf};

const DATA_DIR: &str = "data";
const PARSER_DIR: &str = "custom_parsers";

/// Fixed on-disk layout the agent works in.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

/// Resolved input and output paths for one bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankPaths {
    pub bank: String,
    pub pdf: PathBuf,
    pub csv: PathBuf,
    pub parser: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn parser_dir(&self) -> PathBuf {
        self.root.join(PARSER_DIR)
    }

    pub fn bank(&self, bank: &str) -> BankPaths {
        let data = self.root.join(DATA_DIR).join(bank);
        BankPaths {
            bank: bank.to_string(),
            pdf: data.join(format!("{bank}_sample.pdf")),
            csv: data.join(format!("{bank}_sample.csv")),
            parser: self.parser_dir().join(format!("{bank}_parser.toml")),
        }
    }
}
