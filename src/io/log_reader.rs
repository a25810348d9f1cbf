use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use super::error::IoError;

/// Line reader over a (usually gzip-compressed) log file
///
/// Files ending in `.gz` are decompressed transparently. Lines are decoded
/// lossily so a stray invalid byte surfaces as a parse error downstream
/// instead of aborting the file.
pub struct LogFileReader {
    path: PathBuf,
    reader: Box<dyn BufRead + Send>,
    buf: Vec<u8>,
}

impl LogFileReader {
    /// Open a log file for line-by-line reading
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| IoError::Open {
            path: path.clone(),
            source,
        })?;

        let is_gzip = path.extension().is_some_and(|ext| ext == "gz");
        let reader: Box<dyn BufRead + Send> = if is_gzip {
            Box::new(BufReader::new(MultiGzDecoder::new(BufReader::new(file))))
        } else {
            Box::new(BufReader::new(file))
        };

        Ok(Self::from_reader(path, reader))
    }

    /// Wrap an already-open reader (used for tests and stdin-like inputs)
    pub fn from_reader<R>(path: PathBuf, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            path,
            reader: Box::new(BufReader::new(reader)),
            buf: Vec::with_capacity(256),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for LogFileReader {
    type Item = Result<String, IoError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(String::from_utf8_lossy(&self.buf).into_owned())),
            Err(e) => Some(Err(IoError::Io(e))),
        }
    }
}
