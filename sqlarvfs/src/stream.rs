use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

#[cfg(feature = "deflate")]
use flate2::read::ZlibDecoder;
use rusqlite::blob::Blob;

use super::store::FileBlob;
use super::util::u64_from_usize;

enum InnerReader<'conn> {
    #[cfg(feature = "deflate")]
    Compressed {
        decoder: ZlibDecoder<Blob<'conn>>,
        position: u64,
        size: u64,
    },
    Uncompressed(Blob<'conn>),
}

impl<'conn> fmt::Debug for InnerReader<'conn> {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "deflate")]
            Self::Compressed { position, size, .. } => f
                .debug_struct("Compressed")
                .field("position", position)
                .field("size", size)
                .finish_non_exhaustive(),
            Self::Uncompressed(_) => f.debug_tuple("Uncompressed").finish(),
        }
    }
}

impl<'conn> Read for InnerReader<'conn> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            #[cfg(feature = "deflate")]
            InnerReader::Compressed {
                decoder, position, ..
            } => {
                let bytes_read = decoder.read(buf)?;
                *position += u64_from_usize(bytes_read);
                Ok(bytes_read)
            }
            InnerReader::Uncompressed(reader) => reader.read(buf),
        }
    }
}

#[cfg(feature = "deflate")]
fn seek_target(base: u64, offset: i64) -> io::Result<u64> {
    base.checked_add_signed(offset).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "Attempted to seek to a negative offset.",
        )
    })
}

impl<'conn> Seek for InnerReader<'conn> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            #[cfg(feature = "deflate")]
            InnerReader::Compressed {
                decoder,
                position,
                size,
            } => {
                let target = match pos {
                    SeekFrom::Start(offset) => offset,
                    SeekFrom::Current(offset) => seek_target(*position, offset)?,
                    SeekFrom::End(offset) => seek_target(*size, offset)?,
                };

                // A zlib stream can only be read front to back.
                if target < *position {
                    return Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        "Cannot seek backward in a compressed file.",
                    ));
                }

                let skipped =
                    io::copy(&mut decoder.by_ref().take(target - *position), &mut io::sink())?;
                *position += skipped;

                Ok(*position)
            }
            InnerReader::Uncompressed(reader) => reader.seek(pos),
        }
    }
}

/// A readable stream of the data in a [`File`].
///
/// This implements [`Read`] and [`Seek`]. If the file is stored uncompressed, it supports seeking
/// anywhere. If the file is compressed, it's decompressed as it's read, so it only supports seeking
/// forward, which is done by reading and discarding data. Seeking backward in a compressed file
/// returns an error of kind [`std::io::ErrorKind::Unsupported`].
///
/// The underlying blob is closed when the reader is dropped.
///
/// [`File`]: crate::File
#[derive(Debug)]
pub struct FileReader<'conn> {
    inner: InnerReader<'conn>,
}

impl<'conn> FileReader<'conn> {
    pub(super) fn new(blob: FileBlob<'conn>) -> crate::Result<Self> {
        if blob.is_compressed() {
            #[cfg(feature = "deflate")]
            return Ok(Self {
                inner: InnerReader::Compressed {
                    size: blob.original_size(),
                    decoder: ZlibDecoder::new(blob.into_blob()),
                    position: 0,
                },
            });

            #[cfg(not(feature = "deflate"))]
            return Err(crate::Error::CompressionNotSupported);
        }

        Ok(Self {
            inner: InnerReader::Uncompressed(blob.into_blob()),
        })
    }

    /// Whether the file is being decompressed as it's read.
    pub fn is_compressed(&self) -> bool {
        match self.inner {
            #[cfg(feature = "deflate")]
            InnerReader::Compressed { .. } => true,
            InnerReader::Uncompressed(_) => false,
        }
    }
}

impl<'conn> Read for FileReader<'conn> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<'conn> Seek for FileReader<'conn> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
