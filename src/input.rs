//! Input lines, read on their own thread so a pending read never holds up
//! shutdown.

use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;

const QUEUED_LINES: usize = 64;

pub struct LineReader {
    lines: mpsc::Receiver<io::Result<Vec<u8>>>,
}

impl LineReader {
    /// Start reading `input` on a background thread. The thread stops at end
    /// of input, on the first read error, or once the reader is dropped.
    pub fn spawn<R>(mut input: R) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (sender, lines) = mpsc::channel(QUEUED_LINES);
        thread::Builder::new().name("ts-input".to_string()).spawn(move || {
            loop {
                let mut line = Vec::new();
                let item = match input.read_until(b'\n', &mut line) {
                    Ok(0) => break,
                    Ok(_) => Ok(line),
                    Err(error) => Err(error),
                };
                let failed = item.is_err();
                if sender.blocking_send(item).is_err() || failed {
                    break;
                }
            }
        })?;
        Ok(Self { lines })
    }

    /// Next line with its trailing newline, if it had one. `None` at end of
    /// input.
    pub async fn next_line(&mut self) -> Option<io::Result<Vec<u8>>> {
        self.lines.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[tokio::test]
    async fn yields_lines_then_end_of_input() {
        let mut reader = LineReader::spawn(Cursor::new(b"first\nsecond".to_vec())).expect("spawn");
        assert_eq!(reader.next_line().await.expect("line").expect("read"), b"first\n".to_vec());
        assert_eq!(reader.next_line().await.expect("line").expect("read"), b"second".to_vec());
        assert!(reader.next_line().await.is_none());
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    #[tokio::test]
    async fn read_errors_end_the_stream() {
        let mut reader = LineReader::spawn(io::BufReader::new(Broken)).expect("spawn");
        let error = reader.next_line().await.expect("item").expect_err("read error");
        assert_eq!(error.to_string(), "device gone");
        assert!(reader.next_line().await.is_none());
    }
}
