use std::collections::VecDeque;
use std::io::{self, stdin, stdout, IsTerminal, Read, Write};

use console::{Key, Term};

use crate::output::Output;

/// Character I/O boundary of the machine.
///
/// Reads block until a byte is available. `Ok(None)` marks the end of input.
pub trait Console {
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;

    fn write_str(&mut self, string: &str) -> io::Result<()> {
        self.write_bytes(string.as_bytes())
    }
}

/// Console attached to the process' standard streams.
///
/// Interactive terminals are read unbuffered and without echo. Characters which encode to
/// several UTF-8 bytes are handed out one byte per read.
#[derive(Debug, Default)]
pub struct StdConsole {
    pending: VecDeque<u8>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from whichever of stdout and stderr is attached to the terminal.
    ///
    /// Returns `None` if neither is, in which case stdin is read as a plain stream.
    fn read_terminal(&mut self) -> Option<io::Result<Option<u8>>> {
        let term = [Term::stdout(), Term::stderr()]
            .into_iter()
            .find(Term::is_term)?;
        Some(self.read_key(&term))
    }

    fn read_key(&mut self, term: &Term) -> io::Result<Option<u8>> {
        let ch = loop {
            if let Some(ch) = key_char(term.read_key()?) {
                break ch;
            }
        };
        let mut bytes = [0u8; 4];
        let encoded = ch.encode_utf8(&mut bytes).as_bytes();
        self.pending.extend(&encoded[1..]);
        Ok(Some(encoded[0]))
    }
}

impl Console for StdConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pending.pop_front() {
            return Ok(Some(byte));
        }
        if stdin().is_terminal() {
            if let Some(result) = self.read_terminal() {
                return result;
            }
        }
        read_stream_byte(&mut stdin().lock())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        stdout().write_all(bytes)?;
        if let Some(last) = bytes.last() {
            Output::set_line_start(*last == b'\n');
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        stdout().flush()
    }
}

/// Single byte from a plain stream, `None` at end of input.
fn read_stream_byte(reader: &mut impl Read) -> io::Result<Option<u8>> {
    let mut buf = [0; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Character delivered to the program for a key press, if any.
fn key_char(key: Key) -> Option<char> {
    match key {
        Key::Char(ch) => Some(ch),
        Key::Enter => Some('\n'),
        Key::Backspace => Some('\x08'),
        Key::Tab => Some('\t'),
        Key::Escape => Some('\x1b'),
        _ => None,
    }
}

/// In-memory console with preset input, capturing everything written.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
    flushes: usize,
}

impl BufferConsole {
    pub fn new(input: impl AsRef<[u8]>) -> Self {
        BufferConsole {
            input: input.as_ref().iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Output decoded as text, replacing invalid UTF-8.
    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Amount of times output has been flushed.
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Console for BufferConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_keys_reach_program() {
        assert_eq!(key_char(Key::Char('a')), Some('a'));
        assert_eq!(key_char(Key::Enter), Some('\n'));
        assert_eq!(key_char(Key::Backspace), Some('\x08'));
        assert_eq!(key_char(Key::Tab), Some('\t'));
        assert_eq!(key_char(Key::Escape), Some('\x1b'));
        assert_eq!(key_char(Key::ArrowUp), None);
    }

    /// Fails once with `kind`, then yields `data`.
    struct FlakyReader {
        kind: Option<io::ErrorKind>,
        data: &'static [u8],
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if let Some(kind) = self.kind.take() {
                return Err(io::Error::from(kind));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn stream_read_retries_after_signal() {
        let mut reader = FlakyReader {
            kind: Some(io::ErrorKind::Interrupted),
            data: b"x",
        };
        assert_eq!(read_stream_byte(&mut reader).unwrap(), Some(b'x'));
        assert_eq!(read_stream_byte(&mut reader).unwrap(), None);

        let mut reader = FlakyReader {
            kind: Some(io::ErrorKind::BrokenPipe),
            data: b"x",
        };
        let err = read_stream_byte(&mut reader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn buffer_console_round_trip() {
        let mut cons = BufferConsole::new("ab");
        assert_eq!(cons.read_byte().unwrap(), Some(b'a'));
        assert_eq!(cons.read_byte().unwrap(), Some(b'b'));
        assert_eq!(cons.read_byte().unwrap(), None);

        cons.write_str("hi").unwrap();
        cons.write_bytes(b"!\n").unwrap();
        cons.flush().unwrap();
        assert_eq!(cons.output_str(), "hi!\n");
        assert_eq!(cons.flushes(), 1);
    }
}
