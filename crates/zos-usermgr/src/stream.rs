//! Deferred-open binary stream over a store value cell.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read};
use std::rc::Rc;

use zos_principal::Value;

struct LazyState {
    value: Value,
    reader: Option<BufReader<Box<dyn Read>>>,
    closed: bool,
}

/// Byte stream that opens the underlying binary only on first use.
///
/// Clones share one underlying reader, so the content is opened at most
/// once per stream.
#[derive(Clone)]
pub struct LazyStream {
    state: Rc<RefCell<LazyState>>,
}

impl LazyStream {
    /// Wrap a value cell without opening it.
    pub fn new(value: Value) -> Self {
        Self {
            state: Rc::new(RefCell::new(LazyState {
                value,
                reader: None,
                closed: false,
            })),
        }
    }

    /// True once the underlying content has been opened.
    pub fn is_opened(&self) -> bool {
        self.state.borrow().reader.is_some()
    }

    /// Content length, read from the cell without opening the content.
    pub fn len(&self) -> Option<u64> {
        self.state.borrow().value.get_binary().ok().map(|b| b.len())
    }

    /// True if the content is known to be empty.
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    fn with_reader<T>(
        &self,
        f: impl FnOnce(&mut BufReader<Box<dyn Read>>) -> io::Result<T>,
    ) -> io::Result<T> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(io::Error::other("stream closed"));
        }
        let reader = match state.reader.take() {
            Some(reader) => reader,
            None => {
                let binary = state.value.get_binary().map_err(io::Error::other)?;
                BufReader::new(binary.open().map_err(io::Error::other)?)
            }
        };
        f(state.reader.insert(reader))
    }

    /// Skip up to `n` bytes, returning how many were skipped.
    pub fn skip(&self, n: u64) -> io::Result<u64> {
        self.with_reader(|reader| io::copy(&mut reader.by_ref().take(n), &mut io::sink()))
    }

    /// Bytes readable without another fetch from the underlying content.
    pub fn available(&self) -> io::Result<usize> {
        self.with_reader(|reader| Ok(reader.fill_buf()?.len()))
    }

    /// Close the stream. Does nothing to the content if it was never opened.
    pub fn close(&self) {
        let mut state = self.state.borrow_mut();
        state.reader = None;
        state.closed = true;
    }
}

impl Read for LazyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.with_reader(|reader| reader.read(buf))
    }
}

impl PartialEq for LazyStream {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for LazyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("LazyStream")
            .field("value", &state.value.type_name())
            .field("opened", &state.reader.is_some())
            .field("closed", &state.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;
    use zos_principal::{Binary, BinarySource, StoreError};

    #[derive(Debug)]
    struct CountingSource {
        data: Vec<u8>,
        opens: Rc<Cell<usize>>,
        fail: bool,
    }

    impl BinarySource for CountingSource {
        fn len(&self) -> u64 {
            self.data.len() as u64
        }

        fn open(&self) -> Result<Box<dyn Read>, StoreError> {
            self.opens.set(self.opens.get() + 1);
            if self.fail {
                return Err(StoreError::repository("blob missing"));
            }
            Ok(Box::new(Cursor::new(self.data.clone())))
        }
    }

    fn counting(data: &[u8], fail: bool) -> (LazyStream, Rc<Cell<usize>>) {
        let opens = Rc::new(Cell::new(0));
        let source = CountingSource {
            data: data.to_vec(),
            opens: Rc::clone(&opens),
            fail,
        };
        (LazyStream::new(Value::Binary(Binary::new(source))), opens)
    }

    #[test]
    fn test_open_deferred_until_read() {
        let (mut stream, opens) = counting(b"payload", false);
        assert_eq!(opens.get(), 0);
        assert_eq!(stream.len(), Some(7));
        assert!(!stream.is_opened());

        let mut buf = [0u8; 3];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pay");
        assert_eq!(opens.get(), 1);

        let mut rest = String::new();
        stream.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "load");
        assert_eq!(opens.get(), 1);
    }

    #[test]
    fn test_skip_and_available() {
        let (mut stream, opens) = counting(b"0123456789", false);
        assert_eq!(stream.available().unwrap(), 10);
        assert_eq!(opens.get(), 1);
        assert_eq!(stream.skip(4).unwrap(), 4);
        let mut rest = String::new();
        stream.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "456789");
    }

    #[test]
    fn test_clones_share_reader() {
        let (stream, opens) = counting(b"abcdef", false);
        let mut a = stream.clone();
        let mut b = stream;
        let mut buf = [0u8; 3];
        a.read_exact(&mut buf).unwrap();
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"def");
        assert_eq!(opens.get(), 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_close_without_open() {
        let (stream, opens) = counting(b"x", false);
        stream.close();
        assert_eq!(opens.get(), 0);
        assert!(stream.available().is_err());
    }

    #[test]
    fn test_open_failure_surfaces_as_io_error() {
        let (mut stream, _) = counting(b"x", true);
        let mut buf = [0u8; 1];
        let err = stream.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(err.to_string().contains("blob missing"));
    }

    #[test]
    fn test_text_cell_streams_its_text() {
        let mut stream = LazyStream::new(Value::from("hello"));
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
    }
}
