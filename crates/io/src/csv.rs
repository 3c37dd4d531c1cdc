// CSV-file backed table store

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use rollcall_recon::store::{CellUpdate, Row, TableId, TableStore};
use rollcall_recon::StoreError;

/// One CSV (or TSV, semicolon, pipe) file per table.
///
/// Reads sniff the delimiter. Appends go to the end of the file in the
/// file's own delimiter. Cell updates rewrite the file through a temp file
/// in the same directory and an atomic rename; the rewritten file is always
/// plain UTF-8, so a leading BOM is dropped and Windows-1252 text is
/// re-encoded.
#[derive(Debug, Clone)]
pub struct CsvStore {
    paths: HashMap<TableId, PathBuf>,
}

impl CsvStore {
    pub fn new(intake: PathBuf, activities: PathBuf, roster: PathBuf, ledger: PathBuf) -> Self {
        let paths = HashMap::from([
            (TableId::Intake, intake),
            (TableId::Activities, activities),
            (TableId::Roster, roster),
            (TableId::Ledger, ledger),
        ]);
        Self { paths }
    }

    /// Build from a path lookup, e.g. config paths joined to a base dir.
    pub fn from_fn(mut path_for: impl FnMut(TableId) -> PathBuf) -> Self {
        Self { paths: TableId::ALL.into_iter().map(|t| (t, path_for(t))).collect() }
    }

    pub fn path(&self, table: TableId) -> &Path {
        &self.paths[&table]
    }

    /// The ledger is the only table allowed to be missing; it reads as empty.
    fn read_content(&self, table: TableId) -> Result<Option<(String, SourceEncoding)>, StoreError> {
        let path = self.path(table);
        if table == TableId::Ledger && !path.exists() {
            return Ok(None);
        }
        read_text(path)
            .map(Some)
            .map_err(|e| StoreError::new(table, format!("cannot read {}: {e}", path.display())))
    }

    fn write_all(&self, table: TableId, rows: &[Row], delimiter: u8) -> Result<(), StoreError> {
        let path = self.path(table);
        let err = |e: String| StoreError::new(table, format!("cannot write {}: {e}", path.display()));

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| err(e.to_string()))?;
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .flexible(true)
                .from_writer(tmp.as_file_mut());
            for row in rows {
                writer.write_record(row).map_err(|e| err(e.to_string()))?;
            }
            writer.flush().map_err(|e| err(e.to_string()))?;
        }
        tmp.persist(path).map_err(|e| err(e.error.to_string()))?;
        Ok(())
    }
}

impl TableStore for CsvStore {
    fn read_all_rows(&self, table: TableId) -> Result<Vec<Row>, StoreError> {
        match self.read_content(table)? {
            Some((content, _)) => parse_rows(&content, sniff_delimiter(&content))
                .map_err(|e| StoreError::new(table, format!("{}: {e}", self.path(table).display()))),
            None => Ok(Vec::new()),
        }
    }

    fn append_rows(&mut self, table: TableId, rows: &[Row]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let path = self.path(table);
        let err = |e: String| StoreError::new(table, format!("cannot append to {}: {e}", path.display()));

        let (existing, encoding) = self.read_content(table)?.unwrap_or_default();
        if encoding == SourceEncoding::Windows1252 {
            log::warn!("{} is Windows-1252; appended rows are UTF-8", path.display());
        }
        let delimiter = if existing.is_empty() { b',' } else { sniff_delimiter(&existing) };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| err(e.to_string()))?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            file.write_all(b"\n").map_err(|e| err(e.to_string()))?;
        }

        let mut writer = csv::WriterBuilder::new().delimiter(delimiter).flexible(true).from_writer(file);
        for row in rows {
            writer.write_record(row).map_err(|e| err(e.to_string()))?;
        }
        writer.flush().map_err(|e| err(e.to_string()))?;
        log::debug!("appended {} row(s) to {}", rows.len(), path.display());
        Ok(())
    }

    fn set_cell(&mut self, table: TableId, row: usize, col: usize, value: &str) -> Result<(), StoreError> {
        self.set_cells(table, &[CellUpdate { row, col, value: value.to_string() }])
    }

    /// Apply every update in memory, then rewrite the file once.
    fn set_cells(&mut self, table: TableId, updates: &[CellUpdate]) -> Result<(), StoreError> {
        if updates.is_empty() {
            return Ok(());
        }
        let (content, encoding) = self.read_content(table)?.unwrap_or_default();
        match encoding {
            SourceEncoding::Utf8 => {}
            SourceEncoding::Utf8Bom => log::debug!("{}: byte order mark dropped on rewrite", self.path(table).display()),
            SourceEncoding::Windows1252 => {
                log::warn!("{}: rewriting Windows-1252 text as UTF-8", self.path(table).display())
            }
        }
        let delimiter = sniff_delimiter(&content);
        let mut rows = parse_rows(&content, delimiter)
            .map_err(|e| StoreError::new(table, format!("{}: {e}", self.path(table).display())))?;

        for update in updates {
            let len = rows.len();
            let target = rows
                .get_mut(update.row)
                .ok_or_else(|| StoreError::new(table, format!("row index {} out of range ({len} rows)", update.row)))?;
            if target.len() <= update.col {
                target.resize(update.col + 1, String::new());
            }
            target[update.col] = update.value.clone();
        }

        self.write_all(table, &rows, delimiter)?;
        log::debug!("updated {} cell(s) in {}", updates.len(), self.path(table).display());
        Ok(())
    }
}

fn parse_rows(content: &str, delimiter: u8) -> Result<Vec<Row>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(|field| field.to_string()).collect())
                .map_err(|e| e.to_string())
        })
        .collect()
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Higher field count breaks ties
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// How a table file was decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum SourceEncoding {
    #[default]
    Utf8,
    Utf8Bom,
    /// Not valid UTF-8; decoded as Windows-1252, the usual Excel export.
    Windows1252,
}

fn read_text(path: &Path) -> Result<(String, SourceEncoding), String> {
    let mut bytes = Vec::new();
    std::fs::File::open(path)
        .and_then(|mut file| file.read_to_end(&mut bytes))
        .map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(text) => match text.strip_prefix('\u{feff}') {
            Some(rest) => Ok((rest.to_string(), SourceEncoding::Utf8Bom)),
            None => Ok((text, SourceEncoding::Utf8)),
        },
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok((decoded.into_owned(), SourceEncoding::Windows1252))
        }
    }
}
