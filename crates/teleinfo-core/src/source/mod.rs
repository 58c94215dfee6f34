//! Line sources.
//!
//! A line source yields raw, undecoded lines from the serial link (or a
//! capture of it) with their terminator kept. `Ok(None)` means the link is
//! gone: end of file, or the device was disconnected.

mod reader;

pub use reader::{MAX_LINE_LEN, ReaderLineSource};

use thiserror::Error;

pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, SourceError>;
}

impl<S: LineSource + ?Sized> LineSource for &mut S {
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        (**self).next_line()
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
