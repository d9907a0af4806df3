use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom};

use crate::error::Result;

/// An opaque saved position in an [`InstructionStream`].
///
/// Markers stay valid for the life of the stream; seeking to one never
/// invalidates another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Marker(u64);

impl Marker {
    /// Byte offset of the next byte that will be read after seeking here.
    pub fn offset(self) -> u64 {
        self.0
    }
}

/// A forward cursor over program bytes that can return to saved positions.
///
/// The stream does not interpret or filter the bytes it yields.
pub trait InstructionStream {
    /// Read the next byte, or `None` at the end of the program.
    fn next_byte(&mut self) -> Result<Option<u8>>;

    /// Capture the position of the next byte to be read.
    fn position(&self) -> Marker;

    /// Resume reading from a previously captured marker.
    fn seek(&mut self, marker: Marker) -> Result<()>;
}

/// A stream over a program already held in memory.
#[derive(Debug, Clone)]
pub struct SliceStream<'a> {
    source: &'a [u8],
    pos: usize,
}

impl<'a> SliceStream<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self { source, pos: 0 }
    }
}

impl InstructionStream for SliceStream<'_> {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        let byte = self.source.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn position(&self) -> Marker {
        Marker(self.pos as u64)
    }

    fn seek(&mut self, marker: Marker) -> Result<()> {
        // A marker past the end just reads as end-of-stream.
        self.pos = usize::try_from(marker.0).unwrap_or(usize::MAX);
        Ok(())
    }
}

/// A stream over any seekable reader, such as an open source file.
///
/// Only the buffered window is held in memory. The offset is tracked here
/// rather than queried from the reader, and seeks go through
/// [`BufReader::seek_relative`] so jumping back inside a short loop reuses the
/// buffer.
#[derive(Debug)]
pub struct ReaderStream<R> {
    reader: BufReader<R>,
    offset: u64,
}

impl<R: Read + Seek> ReaderStream<R> {
    /// Wrap `reader`, rewinding it to its start; byte 0 of the reader is offset zero.
    pub fn new(mut reader: R) -> io::Result<Self> {
        reader.rewind()?;
        Ok(Self {
            reader: BufReader::new(reader),
            offset: 0,
        })
    }
}

impl<R: Read + Seek> InstructionStream for ReaderStream<R> {
    fn next_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.offset += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn position(&self) -> Marker {
        Marker(self.offset)
    }

    fn seek(&mut self, marker: Marker) -> Result<()> {
        let delta = marker.0 as i128 - self.offset as i128;
        match i64::try_from(delta) {
            Ok(delta) => self.reader.seek_relative(delta)?,
            Err(_) => {
                self.reader.seek(SeekFrom::Start(marker.0))?;
            }
        }
        self.offset = marker.0;
        Ok(())
    }
}
