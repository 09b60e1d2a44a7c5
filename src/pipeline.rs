use crate::config::BreakdownConfig;
use crate::error::Result;
use crate::facts::{extract_with_selections, StatementExtraction, StatementFacts};
use crate::generator::{title_case, BreakdownGenerator, OutputWorkbook};
use crate::layout::Layout;
use crate::loader::{load_grid, RawGrid};
use crate::normalizer::normalize;
use crate::protect::WorkbookProtector;
use crate::writer::render_xlsx;
use chrono::NaiveDate;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// One statement to process, as supplied by the file-selection and
/// litigation-prompt collaborators.
#[derive(Debug, Clone)]
pub struct StatementJob {
    pub input: PathBuf,
    pub is_litigation: bool,
    pub passphrase: Option<String>,
}

impl StatementJob {
    pub fn new(input: impl Into<PathBuf>, is_litigation: bool) -> Self {
        Self {
            input: input.into(),
            is_litigation,
            passphrase: None,
        }
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionStatus {
    NotRequested,
    Applied,
    /// The unprotected workbook was still written.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ProcessedStatement {
    pub input: PathBuf,
    pub output: PathBuf,
    pub extraction: StatementExtraction,
    pub layout: Layout,
    pub protection: ProtectionStatus,
}

impl ProcessedStatement {
    pub fn facts(&self) -> &StatementFacts {
        &self.extraction.facts
    }
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub input: PathBuf,
    pub result: Result<ProcessedStatement>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &ProcessedStatement> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Statement file in, breakdown workbook out.
pub struct BreakdownPipeline {
    config: BreakdownConfig,
    output_dir: PathBuf,
    prepared_on: NaiveDate,
    protector: Option<Box<dyn WorkbookProtector>>,
}

impl BreakdownPipeline {
    pub fn new(config: BreakdownConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            prepared_on: chrono::Local::now().date_naive(),
            protector: None,
        }
    }

    pub fn with_prepared_on(mut self, prepared_on: NaiveDate) -> Self {
        self.prepared_on = prepared_on;
        self
    }

    pub fn with_protector(mut self, protector: Box<dyn WorkbookProtector>) -> Self {
        self.protector = Some(protector);
        self
    }

    pub fn config(&self) -> &BreakdownConfig {
        &self.config
    }

    pub fn extract_grid(&self, grid: &RawGrid) -> Result<StatementExtraction> {
        let records = normalize(grid, &self.config.columns, self.config.verbose_threshold)?;
        extract_with_selections(&records, &self.config)
    }

    pub fn extract_file(&self, path: &Path) -> Result<StatementExtraction> {
        let grid = load_grid(path)?;
        self.extract_grid(&grid)
    }

    pub fn build(&self, facts: &StatementFacts, is_litigation: bool) -> Result<(Layout, OutputWorkbook)> {
        let layout = Layout::plan(facts.medical_items.len());
        let book = BreakdownGenerator::new(self.prepared_on).generate(facts, is_litigation, &layout)?;
        Ok((layout, book))
    }

    pub fn output_path(&self, client_name: &str) -> PathBuf {
        self.output_dir
            .join(output_file_name(client_name, &self.config.output_suffix))
    }

    /// Nothing is written unless extraction and generation both succeed.
    pub fn process(&self, job: &StatementJob) -> Result<ProcessedStatement> {
        info!("Processing {}", job.input.display());

        let extraction = self.extract_file(&job.input)?;
        let (layout, book) = self.build(&extraction.facts, job.is_litigation)?;
        let bytes = render_xlsx(&book)?;

        fs::create_dir_all(&self.output_dir)?;
        let output = self.output_path(&extraction.facts.client_name);
        write_atomically(&output, &bytes)?;
        info!("Wrote {}", output.display());

        let protection = match (&job.passphrase, &self.protector) {
            (None, _) => ProtectionStatus::NotRequested,
            (Some(_), None) => {
                warn!("Passphrase given for {} but no protector is configured", output.display());
                ProtectionStatus::Failed("no protector configured".to_string())
            }
            (Some(passphrase), Some(protector)) => match protector.protect(&output, passphrase) {
                Ok(()) => ProtectionStatus::Applied,
                Err(e) => {
                    warn!("{}; leaving {} unprotected", e, output.display());
                    ProtectionStatus::Failed(e.to_string())
                }
            },
        };

        Ok(ProcessedStatement {
            input: job.input.clone(),
            output,
            extraction,
            layout,
            protection,
        })
    }

    /// A failing statement is reported and skipped; the rest still run.
    pub fn process_batch(&self, jobs: &[StatementJob]) -> BatchReport {
        let mut report = BatchReport::default();
        for job in jobs {
            let result = self.process(job);
            if let Err(e) = &result {
                warn!("Skipping {}: {}", job.input.display(), e);
            }
            report.outcomes.push(BatchOutcome {
                input: job.input.clone(),
                result,
            });
        }

        info!(
            "Batch finished: {} succeeded, {} failed",
            report.succeeded().count(),
            report.failed().count()
        );
        report
    }
}

/// `<Client Name><suffix>.xlsx` with characters invalid in file names replaced.
pub fn output_file_name(client_name: &str, suffix: &str) -> String {
    let cleaned: String = title_case(client_name)
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = cleaned.trim_matches(|c: char| c == '.' || c.is_whitespace());
    let stem = if stem.is_empty() { "Unnamed Client" } else { stem };
    format!("{}{}.xlsx", stem, suffix)
}

/// Writes to a sibling temp file and renames it into place.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.partial", file_name));

    if let Err(e) = fs::write(&temp, bytes).and_then(|_| fs::rename(&temp, path)) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("jane doe", " Breakdown"), "Jane Doe Breakdown.xlsx");
        assert_eq!(output_file_name("a/b: c?", ""), "A_b_ C_.xlsx");
        assert_eq!(output_file_name("   ", " Breakdown"), "Unnamed Client Breakdown.xlsx");
    }

    #[test]
    fn test_write_atomically_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.xlsx");
        write_atomically(&target, b"data").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"data");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_write_atomically_into_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.xlsx");
        assert!(write_atomically(&target, b"data").is_err());
        assert!(!target.exists());
    }

    #[test]
    fn test_batch_report_counts() {
        let report = BatchReport {
            outcomes: vec![BatchOutcome {
                input: PathBuf::from("a.xlsx"),
                result: Err(crate::error::BreakdownError::Structure("x".to_string())),
            }],
        };
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.succeeded().count(), 0);
        assert!(!report.all_succeeded());
    }
}
