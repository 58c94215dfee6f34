use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::warn;

use crate::source::{LineSource, SourceError};

const LINE_TERMINATOR: u8 = b'\n';
/// Bytes buffered per line. A noisy link that never sends LF yields the
/// first `MAX_LINE_LEN` bytes as one line; the rest, up to the next LF, is
/// dropped.
pub const MAX_LINE_LEN: usize = 512;

/// Line source over any buffered reader: a capture file, a tty device
/// configured beforehand (`stty`), or an in-memory buffer.
pub struct ReaderLineSource<R> {
    reader: R,
}

impl ReaderLineSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReaderLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn skip_to_terminator(&mut self) -> Result<usize, SourceError> {
        let mut skipped = 0;
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(skipped);
            }
            let found = buf.iter().position(|&byte| byte == LINE_TERMINATOR);
            let len = buf.len();
            match found {
                Some(index) => {
                    self.reader.consume(index + 1);
                    return Ok(skipped + index + 1);
                }
                None => {
                    self.reader.consume(len);
                    skipped += len;
                }
            }
        }
    }
}

impl<R: BufRead> LineSource for ReaderLineSource<R> {
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let mut line = Vec::new();
        let read = (&mut self.reader)
            .take(MAX_LINE_LEN as u64)
            .read_until(LINE_TERMINATOR, &mut line)?;
        if read == 0 {
            return Ok(None);
        }
        if read == MAX_LINE_LEN && line.last() != Some(&LINE_TERMINATOR) {
            let skipped = self.skip_to_terminator()?;
            warn!(kept = read, skipped, "overlong line truncated");
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_LINE_LEN, ReaderLineSource};
    use crate::source::LineSource;
    use std::io::Cursor;

    #[test]
    fn splits_on_line_feed_and_keeps_terminator() {
        let bytes = b"\x02\nBASE 123456789 8\r\nPTEC TH.. $\r\x03\x02\n".to_vec();
        let mut source = ReaderLineSource::new(Cursor::new(bytes));
        assert_eq!(source.next_line().unwrap(), Some(b"\x02\n".to_vec()));
        assert_eq!(
            source.next_line().unwrap(),
            Some(b"BASE 123456789 8\r\n".to_vec())
        );
        assert_eq!(
            source.next_line().unwrap(),
            Some(b"PTEC TH.. $\r\x03\x02\n".to_vec())
        );
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn unterminated_tail_is_still_a_line() {
        let mut source = ReaderLineSource::new(Cursor::new(b"IINST 005 \\".to_vec()));
        assert_eq!(source.next_line().unwrap(), Some(b"IINST 005 \\".to_vec()));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn overlong_line_is_truncated_and_remainder_dropped() {
        let mut bytes = vec![b'X'; MAX_LINE_LEN * 4];
        bytes.extend_from_slice(b"\r\nIINST 005 \\\r\n");
        let mut source = ReaderLineSource::new(Cursor::new(bytes));
        assert_eq!(source.next_line().unwrap(), Some(vec![b'X'; MAX_LINE_LEN]));
        assert_eq!(
            source.next_line().unwrap(),
            Some(b"IINST 005 \\\r\n".to_vec())
        );
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn line_of_exactly_the_limit_is_kept_whole() {
        let mut bytes = vec![b'X'; MAX_LINE_LEN - 1];
        bytes.push(b'\n');
        bytes.extend_from_slice(b"BASE 123456789 8\r\n");
        let mut source = ReaderLineSource::new(Cursor::new(bytes.clone()));
        assert_eq!(
            source.next_line().unwrap(),
            Some(bytes[..MAX_LINE_LEN].to_vec())
        );
        assert_eq!(
            source.next_line().unwrap(),
            Some(b"BASE 123456789 8\r\n".to_vec())
        );
    }
}
