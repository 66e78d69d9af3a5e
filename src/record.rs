//! Length-prefixed record files and the sample schema written into them.
//!
//! Every record is a little-endian `u64` payload length followed by the payload.

use crate::error::{Result, SamplerError};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{BufReader, BufWriter, ErrorKind, Read, Write},
    path::Path,
};
use tracing::debug;

const HEADER_LEN: usize = 8;

/// One fixed-size training sample for a single object instance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sample {
    pub class_id: i64,
    pub seq_id: i64,
    pub frame_id: i64,
    pub quaternion: [f32; 4],
    pub translation: [f32; 3],
    /// Refined segment size before downsampling.
    pub num_valid_points_in_segment: i64,
    /// `K * 3`, point-major.
    pub xyz: Vec<f32>,
    /// `K * 3`, same ordering as `xyz`.
    pub rgb: Vec<f32>,
}

impl Sample {
    pub fn num_points(&self) -> usize {
        self.xyz.len() / 3
    }

    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_payload(payload: &[u8]) -> Result<Sample> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// Append-only sink of opaque payloads.
pub trait RecordWriter {
    fn write_record(&mut self, payload: &[u8]) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

pub struct FramedRecordWriter<W: Write> {
    inner: W,
    written: usize,
}

impl FramedRecordWriter<BufWriter<fs::File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> FramedRecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn records_written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> RecordWriter for FramedRecordWriter<W> {
    fn write_record(&mut self, payload: &[u8]) -> Result<()> {
        let mut buffer = Vec::with_capacity(HEADER_LEN + payload.len());
        buffer.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buffer.extend_from_slice(payload);
        self.inner.write_all(&buffer)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.flush()?;
        debug!("flushed {} records", self.written);
        Ok(())
    }
}

/// Reads payloads back in file order.
pub struct RecordReader<R: Read> {
    inner: R,
}

impl RecordReader<BufReader<fs::File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Fills `buf` as far as the input allows, returning the byte count.
    fn fill(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>> {
        let mut header = [0u8; HEADER_LEN];
        let got = self.fill(&mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_LEN {
            return Err(SamplerError::TruncatedRecord {
                expected: HEADER_LEN,
                actual: got,
            });
        }
        let len = u64::from_le_bytes(header);
        // the header is untrusted, so grow the buffer with the data actually read
        let mut payload = Vec::new();
        let got = (&mut self.inner).take(len).read_to_end(&mut payload)?;
        if (got as u64) < len {
            return Err(SamplerError::TruncatedRecord {
                expected: usize::try_from(len).unwrap_or(usize::MAX),
                actual: got,
            });
        }
        Ok(Some(payload))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
