//! Rotating, pruning sample recorder.
//!
//! Each file holds at most `max_samples_per_file` records; exceeding the
//! limit finishes the gzip stream and starts a fresh timestamped file.
//! Rotation also prunes the oldest files so no more than
//! `max_file_count` remain on disk.

use crate::config::RecorderConfig;
use crate::error::RecorderError;
use crate::sample::{TickSample, INTERFACE_VERSION};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;

/// File extension for recorded sample files.
pub const FILE_EXTENSION: &str = ".stsq.gz";

/// Writes tick samples to rotating compressed files.
pub struct Recorder {
    config: RecorderConfig,
    writer: Option<GzEncoder<BufWriter<File>>>,
    samples_in_file: u64,
    next_seq: u32,
}

impl Recorder {
    /// Opens the recorder, creating the directory and the first file.
    /// A disabled recorder opens nothing and drops all samples.
    pub fn open(config: RecorderConfig) -> Result<Self, RecorderError> {
        let mut recorder = Self {
            config,
            writer: None,
            samples_in_file: 0,
            next_seq: 0,
        };

        if !recorder.config.enabled {
            tracing::info!("recorder disabled");
            return Ok(recorder);
        }

        std::fs::create_dir_all(&recorder.config.directory)?;
        recorder.rotate()?;
        Ok(recorder)
    }

    /// Appends one sample, rotating first if the current file is full.
    pub fn record(&mut self, sample: &TickSample) -> Result<(), RecorderError> {
        if !self.config.enabled {
            return Ok(());
        }

        if self.samples_in_file >= self.config.max_samples_per_file {
            self.rotate()?;
        }

        // rotate() always leaves a writer behind when enabled.
        let writer = self.writer.as_mut().ok_or_else(|| RecorderError::Corrupt {
            reason: "recorder has no open file".to_string(),
        })?;
        writer.write_all(&sample.encode())?;
        self.samples_in_file += 1;
        Ok(())
    }

    /// Flushes buffered data to the current file.
    pub fn flush(&mut self) -> Result<(), RecorderError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Finishes the gzip stream and closes the recorder.
    pub fn finish(mut self) -> Result<(), RecorderError> {
        self.close_current()
    }

    fn close_current(&mut self) -> Result<(), RecorderError> {
        if let Some(writer) = self.writer.take() {
            writer.finish()?.flush()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), RecorderError> {
        self.close_current()?;
        self.prune_old_files()?;

        let path = self.next_file_path()?;
        tracing::debug!(path = %path.display(), "recorder file opened");

        let file = OpenOptions::new().create_new(true).write(true).open(&path)?;
        let mut writer = GzEncoder::new(BufWriter::new(file), Compression::default());
        writer.write_all(&INTERFACE_VERSION.to_le_bytes())?;

        self.writer = Some(writer);
        self.samples_in_file = 0;
        Ok(())
    }

    /// Picks a fresh timestamped file name. Rotations within the same
    /// second are disambiguated by a sequence suffix that only moves
    /// forward, so name order stays age order even after pruning.
    fn next_file_path(&mut self) -> Result<PathBuf, RecorderError> {
        let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
        for seq in self.next_seq.. {
            let candidate = self
                .config
                .directory
                .join(format!("{stamp}-{seq:03}{FILE_EXTENSION}"));
            match candidate.symlink_metadata() {
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    self.next_seq = seq + 1;
                    return Ok(candidate);
                }
                Err(e) => return Err(e.into()),
                Ok(_) => continue,
            }
        }
        unreachable!("sequence space exhausted")
    }

    /// Deletes the oldest files until a slot is free for the next one.
    /// File names sort chronologically, so lexicographic order is age
    /// order.
    fn prune_old_files(&self) -> Result<(), RecorderError> {
        if self.config.max_file_count == 0 {
            return Ok(());
        }

        let mut files = self.list_files()?;
        files.sort();

        while files.len() >= self.config.max_file_count {
            let oldest = files.remove(0);
            tracing::debug!(path = %oldest.display(), "pruning old recorder file");
            std::fs::remove_file(&oldest)?;
        }
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<PathBuf>, RecorderError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.config.directory)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().ends_with(FILE_EXTENSION) {
                files.push(entry.path());
            }
        }
        Ok(files)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Err(e) = self.close_current() {
            tracing::warn!(error = %e, "failed to finish recorder file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleReader;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, max_samples: u64, max_files: usize) -> RecorderConfig {
        RecorderConfig {
            enabled: true,
            directory: dir.path().to_path_buf(),
            max_samples_per_file: max_samples,
            max_file_count: max_files,
        }
    }

    fn sample(n: u64) -> TickSample {
        TickSample {
            elapsed_ms: n * 100,
            procedure_id: 7,
            step_index: n as u32,
            step_id: n as u32 * 10,
            progress: n as f64 / 10.0,
        }
    }

    fn list_sorted(dir: &TempDir) -> Vec<PathBuf> {
        let mut files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let recorder_config = test_config(&dir, 100, 5);
        let mut recorder = Recorder::open(recorder_config).unwrap();

        for n in 0..10 {
            recorder.record(&sample(n)).unwrap();
        }
        recorder.finish().unwrap();

        let files = list_sorted(&dir);
        assert_eq!(files.len(), 1);

        let mut reader = SampleReader::open(&files[0]).unwrap();
        let samples = reader.read_all().unwrap();
        assert_eq!(samples.len(), 10);
        assert_eq!(samples[3], sample(3));
    }

    #[test]
    fn test_rotation_and_pruning() {
        let dir = TempDir::new().unwrap();
        // 3 samples per file, keep at most 2 files.
        let mut recorder = Recorder::open(test_config(&dir, 3, 2)).unwrap();

        for n in 0..10 {
            recorder.record(&sample(n)).unwrap();
        }
        recorder.finish().unwrap();

        // 10 samples span 4 files, pruned down to the cap.
        let files = list_sorted(&dir);
        assert_eq!(files.len(), 2);

        // The newest file holds the final sample.
        let mut reader = SampleReader::open(files.last().unwrap()).unwrap();
        let samples = reader.read_all().unwrap();
        assert_eq!(samples.last().unwrap(), &sample(9));
    }

    #[test]
    fn test_disabled_recorder_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir, 3, 2);
        config.enabled = false;
        let mut recorder = Recorder::open(config).unwrap();

        recorder.record(&sample(1)).unwrap();
        recorder.finish().unwrap();

        assert!(list_sorted(&dir).is_empty());
    }

    #[test]
    fn test_version_mismatch_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(format!("bogus{FILE_EXTENSION}"));
        let file = File::create(&path).unwrap();
        let mut writer = GzEncoder::new(BufWriter::new(file), Compression::default());
        writer.write_all(&999u64.to_le_bytes()).unwrap();
        writer.finish().unwrap().flush().unwrap();

        let result = SampleReader::open(&path);
        assert!(matches!(
            result,
            Err(RecorderError::VersionMismatch { actual: 999, .. })
        ));
    }
}
