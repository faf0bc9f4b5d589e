// Spreadsheet -> indices -> dictionary texts.

use std::path::PathBuf;

use rayon::prelude::*;

use super::cache;
use super::config::{column_role, Config};
use super::errors::Result;
use super::formatter::{clean_text, TextFormatter};
use super::processor::*;
use super::source::*;
use super::util::*;
use super::writer::IndexWriter;


const HEADER_ROWS: usize = 2;
const PROGRESS_INTERVAL: usize = 1000;


/// Counters of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub rows_read: usize,
    pub entries: usize,
    pub skipped: usize,
    pub from_cache: bool,
    pub written: Vec<PathBuf>,
}


pub struct Pipeline<'a> {
    config: &'a Config,
    formatter: TextFormatter,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Result<Pipeline<'a>> {
        Ok(Pipeline {
            config,
            formatter: TextFormatter::new()?,
        })
    }

    /// Builds the indices, from the cache when possible, and writes them.
    pub fn run(&self) -> Result<RunSummary> {
        let c = self.config;
        c.validate()?;

        let key = cache::fingerprint(c, mtime_nanos(&c.source_file)?);
        let cache_path = c.cache_path();

        if c.use_cache && !c.force_refresh_cache {
            if let Some(indices) = cache::load(&cache_path, &key) {
                log::info!("Loaded data from cache");
                let entries = indices.th_en.values().map(Vec::len).sum();
                let written = IndexWriter::new(c).write_all(&indices)?;
                return Ok(RunSummary {
                    entries,
                    from_cache: true,
                    written,
                    ..RunSummary::default()
                });
            }
        }

        let mut summary = RunSummary::default();
        let indices = self.process_source(&mut summary)?;

        if c.use_cache {
            match cache::save(&cache_path, &key, &indices) {
                Ok(()) => log::info!("Cache saved to {}", cache_path.display()),
                Err(e) => log::warn!("Failed to save cache {}: {}", cache_path.display(), e),
            }
        }

        summary.written = IndexWriter::new(c).write_all(&indices)?;
        Ok(summary)
    }

    fn process_source(&self, summary: &mut RunSummary) -> Result<Indices> {
        let c = self.config;
        log::info!("Processing {}", c.source_file.display());

        let mut source = open_source(&c.source_file, c.columns, &c.source_encoding)?;
        log::info!("Sheets: {}", source.sheet_names().join(", "));

        let mut rows = source.rows()?;
        if let Some(header) = rows.get(1) {
            log_column_mapping(header);
        }
        if c.row_limit_debug && rows.len() > c.row_limit {
            log::info!("Row limit reached, stopping after {} rows", c.row_limit);
            rows.truncate(c.row_limit);
        }

        log::info!("Processing rows...");
        let processor = RowProcessor::new(c, &self.formatter)?;
        let data_rows = rows.get(HEADER_ROWS..).unwrap_or(&[]);
        let results: Vec<Option<RowEntries>> = data_rows
            .par_iter()
            .map(|row| processor.entries(row))
            .collect();

        let mut indices = Indices::new();
        for (i, entries) in results.into_iter().enumerate() {
            match entries {
                Some(entries) => {
                    indices.insert(entries);
                    summary.entries += 1;
                },
                None => summary.skipped += 1,
            }
            let row = spreadsheet_row(i);
            if row % PROGRESS_INTERVAL == 0 {
                log::info!("Processed {} rows", row);
            }
        }
        summary.rows_read = data_rows.len();

        log::info!("Total processed entries: {}", summary.entries);
        if summary.skipped > 0 {
            log::info!("Skipped rows: {}", summary.skipped);
        }
        Ok(indices)
    }
}

/// 1-based spreadsheet row of the `i`th data row, header rows included.
fn spreadsheet_row(i: usize) -> usize {
    i + 1 + HEADER_ROWS
}

fn log_column_mapping(header: &[Option<String>]) {
    for (i, cell) in header.iter().enumerate() {
        let name = clean_text(cell.as_deref());
        if !name.is_empty() {
            log::debug!("{}: {} -> {}", i, name, column_role(i));
        }
    }
}
