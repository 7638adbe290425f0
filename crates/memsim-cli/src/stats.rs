//! JSON stats/epoch persistence (§6 "Persisted state").
//!
//! The epoch file is written incrementally as the run progresses (so a
//! killed process still leaves readable epoch history) and is only turned
//! into syntactically valid JSON at clean shutdown, by trimming the
//! trailing `,\n` left after the last entry and closing the array.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct Counters {
    pub reads_completed: u64,
    pub writes_completed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalStats {
    pub dispatcher: &'static str,
    pub total_cycles: u64,
    pub counters: Counters,
}

#[derive(Debug, Clone, Serialize)]
struct Epoch {
    cycle: u64,
    counters: Counters,
}

pub struct EpochWriter {
    file: File,
    wrote_any: bool,
}

impl EpochWriter {
    pub fn create(path: &Path) -> Result<Self, CliError> {
        let mut file = File::create(path).map_err(|source| CliError::OutputWrite {
            path: path.display().to_string(),
            source,
        })?;
        file.write_all(b"[\n").map_err(|source| CliError::OutputWrite {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { file, wrote_any: false })
    }

    pub fn record(&mut self, cycle: u64, counters: Counters) -> Result<(), CliError> {
        let entry = Epoch { cycle, counters };
        serde_json::to_writer(&mut self.file, &entry).map_err(|e| CliError::OutputWrite {
            path: "<epoch file>".to_string(),
            source: std::io::Error::other(e),
        })?;
        self.file.write_all(b",\n").map_err(|source| CliError::OutputWrite {
            path: "<epoch file>".to_string(),
            source,
        })?;
        self.wrote_any = true;
        Ok(())
    }

    /// Trim the trailing `,\n` (if any epoch was written) and close the array.
    pub fn finish(mut self) -> Result<(), CliError> {
        let wrap = |source| CliError::OutputWrite { path: "<epoch file>".to_string(), source };
        if self.wrote_any {
            let pos = self.file.stream_position().map_err(wrap)?;
            self.file.set_len(pos - 2).map_err(wrap)?;
            self.file.seek(SeekFrom::End(0)).map_err(wrap)?;
            self.file.write_all(b"\n]\n").map_err(wrap)?;
        } else {
            self.file.write_all(b"]\n").map_err(wrap)?;
        }
        Ok(())
    }
}

pub fn write_final_stats(path: &Path, stats: &FinalStats) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(stats).expect("FinalStats always serializes");
    std::fs::write(path, text).map_err(|source| CliError::OutputWrite {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("memsim-cli-test-{}-{name}", std::process::id()));
        p
    }

    #[test]
    fn epoch_file_is_valid_json_after_finish() {
        let path = scratch_path("epochs.json");
        let mut w = EpochWriter::create(&path).unwrap();
        w.record(10, Counters { reads_completed: 3, writes_completed: 1 }).unwrap();
        w.record(20, Counters { reads_completed: 5, writes_completed: 2 }).unwrap();
        w.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_epoch_file_is_an_empty_array() {
        let path = scratch_path("empty-epochs.json");
        let w = EpochWriter::create(&path).unwrap();
        w.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(parsed.as_array().unwrap().is_empty());
        std::fs::remove_file(&path).ok();
    }
}
