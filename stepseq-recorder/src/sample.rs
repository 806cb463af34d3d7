//! Sample format and reading.
//!
//! A sample file is a gzip stream starting with a little-endian u64
//! interface version, followed by fixed-width sample records. The
//! version must be bumped on every layout change.

use crate::error::RecorderError;
use flate2::bufread::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Bump on every change to the sample layout.
pub const INTERFACE_VERSION: u64 = 1;

/// One recorded tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickSample {
    /// Milliseconds since the host started driving the procedure.
    pub elapsed_ms: u64,
    /// Procedure being driven, 0 if idle.
    pub procedure_id: i64,
    /// Runner step index at the end of the tick.
    pub step_index: u32,
    /// Published progress step id.
    pub step_id: u32,
    /// Published progress fraction.
    pub progress: f64,
}

impl TickSample {
    /// On-disk size of one encoded sample.
    pub const ENCODED_SIZE: usize = 8 + 8 + 4 + 4 + 8;

    /// Encodes the sample as fixed-width little-endian fields.
    pub fn encode(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        buf[0..8].copy_from_slice(&self.elapsed_ms.to_le_bytes());
        buf[8..16].copy_from_slice(&self.procedure_id.to_le_bytes());
        buf[16..20].copy_from_slice(&self.step_index.to_le_bytes());
        buf[20..24].copy_from_slice(&self.step_id.to_le_bytes());
        buf[24..32].copy_from_slice(&self.progress.to_le_bytes());
        buf
    }

    /// Decodes a sample from its fixed-width encoding.
    pub fn decode(buf: &[u8; Self::ENCODED_SIZE]) -> Self {
        // Slice bounds match ENCODED_SIZE, so the conversions cannot fail.
        Self {
            elapsed_ms: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            procedure_id: i64::from_le_bytes(buf[8..16].try_into().unwrap()),
            step_index: u32::from_le_bytes(buf[16..20].try_into().unwrap()),
            step_id: u32::from_le_bytes(buf[20..24].try_into().unwrap()),
            progress: f64::from_le_bytes(buf[24..32].try_into().unwrap()),
        }
    }
}

/// Streaming reader for recorded sample files.
pub struct SampleReader<R: Read> {
    inner: R,
}

impl SampleReader<GzDecoder<BufReader<File>>> {
    /// Opens a sample file and checks its interface version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecorderError> {
        let file = File::open(path.as_ref())?;
        let mut decoder = GzDecoder::new(BufReader::new(file));

        let mut version_buf = [0u8; 8];
        decoder
            .read_exact(&mut version_buf)
            .map_err(|_| RecorderError::Corrupt {
                reason: "missing version header".to_string(),
            })?;
        let version = u64::from_le_bytes(version_buf);
        if version != INTERFACE_VERSION {
            return Err(RecorderError::VersionMismatch {
                expected: INTERFACE_VERSION,
                actual: version,
            });
        }

        Ok(Self { inner: decoder })
    }
}

impl<R: Read> SampleReader<R> {
    /// Reads the next sample, or None at a clean end of stream.
    pub fn read_sample(&mut self) -> Result<Option<TickSample>, RecorderError> {
        let mut buf = [0u8; TickSample::ENCODED_SIZE];
        let mut filled = 0;

        while filled < buf.len() {
            let n = self.inner.read(&mut buf[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(RecorderError::Corrupt {
                    reason: format!("truncated sample: {filled} of {} bytes", buf.len()),
                });
            }
            filled += n;
        }

        Ok(Some(TickSample::decode(&buf)))
    }

    /// Drains the remaining samples.
    pub fn read_all(&mut self) -> Result<Vec<TickSample>, RecorderError> {
        let mut samples = Vec::new();
        while let Some(sample) = self.read_sample()? {
            samples.push(sample);
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_size_matches_layout() {
        let sample = TickSample {
            elapsed_ms: 1500,
            procedure_id: 7,
            step_index: 2,
            step_id: 40,
            progress: 0.5,
        };
        let encoded = sample.encode();
        assert_eq!(encoded.len(), TickSample::ENCODED_SIZE);
        assert_eq!(TickSample::decode(&encoded), sample);
    }

    #[test]
    fn test_reader_rejects_truncated_stream() {
        // A raw (already decompressed) stream with a partial record.
        let sample = TickSample::default();
        let mut bytes = sample.encode().to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);

        let mut reader = SampleReader {
            inner: bytes.as_slice(),
        };
        assert!(reader.read_sample().unwrap().is_some());
        assert!(matches!(
            reader.read_sample(),
            Err(RecorderError::Corrupt { .. })
        ));
    }
}
