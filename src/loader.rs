use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::error::MachineError;
use crate::memory::{Memory, MEMORY_MAX};

/// Parsed object image: a load origin followed by words to place from it onwards.
///
/// The file format is a stream of big-endian words, the first of which is the origin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    /// `None` for an image too short to contain an origin.
    origin: Option<u16>,
    words: Vec<u16>,
}

impl Image {
    pub fn new(origin: u16, words: Vec<u16>) -> Self {
        Image {
            origin: Some(origin),
            words,
        }
    }

    /// Decode a raw image. A trailing odd byte is not part of any word and is ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut words = bytes
            .chunks_exact(2)
            .map(|word| u16::from_be_bytes([word[0], word[1]]));
        let origin = words.next();
        Image {
            origin,
            words: words.collect(),
        }
    }

    pub fn read_from(mut reader: impl Read) -> io::Result<Self> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Ok(Self::from_bytes(&buffer))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, MachineError> {
        let path = path.as_ref();
        File::open(path)
            .and_then(Self::read_from)
            .map_err(|source| MachineError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn origin(&self) -> Option<u16> {
        self.origin
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Amount of words which do not fit between the origin and the end of memory.
    pub fn overflow(&self) -> usize {
        match self.origin {
            Some(origin) => self.words.len().saturating_sub(MEMORY_MAX - origin as usize),
            None => 0,
        }
    }

    /// Write the image into memory at its origin, dropping any words past the end of memory.
    ///
    /// Returns the amount of words written.
    pub fn load_into(&self, mem: &mut Memory) -> usize {
        match self.origin {
            Some(origin) => mem.load(origin, &self.words),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_big_endian_words_at_origin() {
        let image = Image::from_bytes(&[0x30, 0x00, 0x12, 0x34, 0x56, 0x78]);
        assert_eq!(image.origin(), Some(0x3000));
        assert_eq!(image.words(), &[0x1234, 0x5678]);

        let mut mem = Memory::new();
        assert_eq!(image.load_into(&mut mem), 2);
        assert_eq!(mem.read(0x3000).unwrap(), 0x1234);
        assert_eq!(mem.read(0x3001).unwrap(), 0x5678);
        assert_eq!(mem.read(0x3002).unwrap(), 0);
    }

    #[test]
    fn origin_only_image_loads_nothing() {
        let image = Image::from_bytes(&[0x40, 0x00]);
        assert_eq!(image.origin(), Some(0x4000));
        assert!(image.is_empty());
        assert_eq!(image.load_into(&mut Memory::new()), 0);
    }

    #[test]
    fn empty_stream_has_no_origin() {
        let image = Image::read_from(io::empty()).unwrap();
        assert_eq!(image.origin(), None);
        assert_eq!(image.load_into(&mut Memory::new()), 0);
    }

    #[test]
    fn trailing_byte_is_ignored() {
        let image = Image::from_bytes(&[0x30, 0x00, 0xAB, 0xCD, 0xEF]);
        assert_eq!(image.words(), &[0xABCD]);
    }

    #[test]
    fn load_stops_at_end_of_memory() {
        let image = Image::new(0xFFFD, vec![1, 2, 3, 4, 5]);
        assert_eq!(image.overflow(), 2);

        let mut mem = Memory::new();
        assert_eq!(image.load_into(&mut mem), 3);
        assert_eq!(mem.slice(0xFFFD, 3), &[1, 2, 3]);
        assert_eq!(mem.read(0u16).unwrap(), 0);
    }

    #[test]
    fn opens_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x30, 0x00, 0xF0, 0x25]).unwrap();
        file.flush().unwrap();

        let image = Image::open(file.path()).unwrap();
        assert_eq!(image, Image::new(0x3000, vec![0xF025]));
    }

    #[test]
    fn missing_file_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.obj");
        match Image::open(&path) {
            Err(MachineError::ImageLoad { path: p, source }) => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected load failure, got {other:?}"),
        }
    }
}
