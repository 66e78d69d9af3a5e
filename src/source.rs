use crate::error::{Result, SamplerError};
use crate::record::RecordReader;
use glob::glob;
use std::{fs, io::BufReader, path::PathBuf};
use tracing::{debug, info};

/// Stream of raw frame payloads.
pub type FrameSource = Box<dyn Iterator<Item = Result<Vec<u8>>> + Send>;

/// Every record of every file matched by one glob pattern, files in sorted order.
pub struct RecordFileSource {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<RecordReader<BufReader<fs::File>>>,
}

impl RecordFileSource {
    pub fn from_pattern(pattern: &str) -> Result<RecordFileSource> {
        let mut files = glob(pattern)
            .map_err(|e| SamplerError::Glob(format!("{}: {}", pattern, e)))?
            .collect::<std::result::Result<Vec<PathBuf>, _>>()
            .map_err(|e| SamplerError::Glob(format!("{}: {}", pattern, e)))?;
        if files.is_empty() {
            return Err(SamplerError::Config(format!(
                "source pattern {} matched no files",
                pattern
            )));
        }
        files.sort();
        info!("source {}: {} files", pattern, files.len());
        Ok(RecordFileSource {
            files: files.into_iter(),
            current: None,
        })
    }
}

impl Iterator for RecordFileSource {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reader) = self.current.as_mut() {
                match reader.next_record() {
                    Ok(Some(payload)) => return Some(Ok(payload)),
                    Ok(None) => self.current = None,
                    Err(e) => {
                        self.current = None;
                        self.files = Vec::new().into_iter();
                        return Some(Err(e));
                    }
                }
            }
            let path = self.files.next()?;
            debug!("reading {}", path.display());
            match RecordReader::open(&path) {
                Ok(reader) => self.current = Some(reader),
                Err(e) => {
                    self.files = Vec::new().into_iter();
                    return Some(Err(e));
                }
            }
        }
    }
}

/// One source per pattern.
pub fn open_sources(patterns: &[String]) -> Result<Vec<FrameSource>> {
    patterns
        .iter()
        .map(|p| RecordFileSource::from_pattern(p).map(|s| Box::new(s) as FrameSource))
        .collect()
}
