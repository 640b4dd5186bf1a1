use std::io::{Read, Write};

use crate::{AlignedBuffer, Error};

/// Streams `input` to `output` through `buffer` until end of input and
/// returns the total number of bytes moved.
///
/// Each iteration reads up to `buffer.len()` bytes and hands them to the
/// output in a single write call. The output is assumed to be a blocking,
/// fully consuming sink, so a write that accepts fewer bytes than offered is
/// [`Error::ShortWrite`] and is never completed by looping. Nothing is
/// retried; the first failed read or write ends the copy.
pub fn copy<R: Read, W: Write>(
    input: &mut R,
    output: &mut W,
    buffer: &mut AlignedBuffer,
) -> Result<u64, Error> {
    let mut total = 0u64;

    loop {
        let n = input.read(&mut buffer[..]).map_err(Error::Read)?;
        if n == 0 {
            return Ok(total);
        }

        let written = output.write(&buffer[..n]).map_err(Error::Write)?;
        if written != n {
            return Err(Error::ShortWrite {
                written,
                expected: n,
            });
        }

        total += n as u64;
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, Cursor};

    use super::*;

    fn buffer(len: usize) -> AlignedBuffer {
        AlignedBuffer::new(len, 4096).unwrap()
    }

    /// Accepts half of whatever it is offered.
    struct ShortSink;

    impl io::Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len() / 2)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "input error"))
        }
    }

    struct FailingSink;

    impl io::Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn empty_input_writes_nothing() {
        let mut out = Vec::new();
        let copied = copy(&mut Cursor::new(vec![]), &mut out, &mut buffer(8)).unwrap();

        assert_eq!(copied, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn input_smaller_than_buffer() {
        let data = b"hello".to_vec();
        let mut out = Vec::new();
        let copied = copy(&mut Cursor::new(data.clone()), &mut out, &mut buffer(8)).unwrap();

        assert_eq!(copied, 5);
        assert_eq!(out, data);
    }

    #[test]
    fn input_exactly_a_multiple_of_buffer() {
        let data = (0..16).collect::<Vec<u8>>();
        let mut out = Vec::new();
        let copied = copy(&mut Cursor::new(data.clone()), &mut out, &mut buffer(8)).unwrap();

        assert_eq!(copied, 16);
        assert_eq!(out, data);
    }

    // One byte past a multiple forces a final one-byte iteration.
    #[test]
    fn input_one_byte_longer_than_buffer_multiple() {
        let data = (0..17).collect::<Vec<u8>>();
        let mut out = Vec::new();
        let copied = copy(&mut Cursor::new(data.clone()), &mut out, &mut buffer(8)).unwrap();

        assert_eq!(copied, 17);
        assert_eq!(out, data);
    }

    #[test]
    fn one_byte_buffer_copies_verbatim() {
        let data = b"byte at a time".to_vec();
        let mut out = Vec::new();
        let copied = copy(&mut Cursor::new(data.clone()), &mut out, &mut buffer(1)).unwrap();

        assert_eq!(copied, data.len() as u64);
        assert_eq!(out, data);
    }

    #[test]
    fn short_write_is_fatal() {
        let data = (0..8).collect::<Vec<u8>>();
        let err = copy(&mut Cursor::new(data), &mut ShortSink, &mut buffer(8)).unwrap_err();

        assert!(matches!(
            err,
            Error::ShortWrite {
                written: 4,
                expected: 8,
            }
        ));
    }

    #[test]
    fn read_error_is_fatal() {
        let err = copy(&mut FailingReader, &mut Vec::new(), &mut buffer(8)).unwrap_err();
        assert!(matches!(err, Error::Read(_)));
    }

    #[test]
    fn write_error_is_fatal() {
        let data = b"doomed".to_vec();
        let err = copy(&mut Cursor::new(data), &mut FailingSink, &mut buffer(8)).unwrap_err();
        assert!(matches!(err, Error::Write(_)));
    }
}
