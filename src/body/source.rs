//! Body sources.
//!
//! # Responsibilities
//! - Report the body's total length when it is known up front
//! - Hand out the body in bounded pieces, advancing an internal cursor
//! - Surface short reads against a declared length as `LengthMismatch`
//!
//! A source is consumed at most once. Fixed sources must not change while
//! they are being sent; that is a caller precondition and is not re-checked.

use std::io::SeekFrom;
use std::path::Path;

use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};

use crate::transfer::TransferError;

/// Body of a transfer request.
pub enum BodySource {
    /// Known total size, transferable range by range.
    Fixed(FixedSource),
    /// Sequential producer read until it yields zero bytes.
    Stream(StreamSource),
}

impl BodySource {
    /// In-memory body. Pieces are sliced out of `data` without copying.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let length = data.len() as u64;
        BodySource::Fixed(FixedSource {
            region: Region::Memory(data),
            length,
            cursor: 0,
        })
    }

    /// A whole file, declared at its current size.
    pub async fn file(path: impl AsRef<Path>) -> Result<Self, TransferError> {
        let file = File::open(path.as_ref())
            .await
            .map_err(TransferError::SourceRead)?;
        let length = file
            .metadata()
            .await
            .map_err(TransferError::SourceRead)?
            .len();
        Ok(Self::file_region(file, 0, length))
    }

    /// `length` bytes of `file` starting at `offset`.
    pub fn file_region(file: File, offset: u64, length: u64) -> Self {
        BodySource::Fixed(FixedSource {
            region: Region::File {
                file,
                offset,
                positioned: false,
            },
            length,
            cursor: 0,
        })
    }

    /// Stream of unknown length; sent chunked.
    pub fn stream<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        BodySource::Stream(StreamSource {
            reader: Box::new(reader),
            declared: None,
            produced: 0,
            exhausted: false,
        })
    }

    /// Stream whose length the caller vouches for; sent length-delimited.
    pub fn stream_with_length<R>(reader: R, length: u64) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        BodySource::Stream(StreamSource {
            reader: Box::new(reader),
            declared: Some(length),
            produced: 0,
            exhausted: false,
        })
    }

    /// Total byte count if determinable before sending.
    pub fn known_length(&self) -> Option<u64> {
        match self {
            BodySource::Fixed(fixed) => Some(fixed.length),
            BodySource::Stream(stream) => stream.declared,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, BodySource::Stream(_))
    }

    /// Next piece of at most `max_size` bytes, or `None` once the source is done.
    pub async fn next_chunk(&mut self, max_size: usize) -> Result<Option<Bytes>, TransferError> {
        match self {
            BodySource::Fixed(fixed) => fixed.next_chunk(max_size).await,
            BodySource::Stream(stream) => stream.next_chunk(max_size).await,
        }
    }
}

impl std::fmt::Debug for BodySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodySource::Fixed(fixed) => f
                .debug_struct("Fixed")
                .field("length", &fixed.length)
                .field("cursor", &fixed.cursor)
                .finish(),
            BodySource::Stream(stream) => f
                .debug_struct("Stream")
                .field("declared", &stream.declared)
                .field("produced", &stream.produced)
                .finish(),
        }
    }
}

enum Region {
    Memory(Bytes),
    File {
        file: File,
        offset: u64,
        positioned: bool,
    },
}

/// A byte range with a known total size.
pub struct FixedSource {
    region: Region,
    length: u64,
    cursor: u64,
}

impl FixedSource {
    async fn next_chunk(&mut self, max_size: usize) -> Result<Option<Bytes>, TransferError> {
        let remaining = self.length - self.cursor;
        if remaining == 0 {
            return Ok(None);
        }
        let want = remaining.min(max_size as u64) as usize;

        let chunk = match &mut self.region {
            Region::Memory(data) => {
                let start = self.cursor as usize;
                data.slice(start..start + want)
            }
            Region::File {
                file,
                offset,
                positioned,
            } => {
                if !*positioned {
                    file.seek(SeekFrom::Start(*offset))
                        .await
                        .map_err(TransferError::SourceRead)?;
                    *positioned = true;
                }
                let mut buf = BytesMut::zeroed(want);
                let filled = fill(file, &mut buf).await?;
                if filled == 0 {
                    return Err(TransferError::LengthMismatch {
                        declared: self.length,
                        actual: self.cursor,
                    });
                }
                buf.truncate(filled);
                buf.freeze()
            }
        };

        self.cursor += chunk.len() as u64;
        Ok(Some(chunk))
    }
}

/// Read until `buf` is full or the file ends. Returns bytes read.
async fn fill(file: &mut File, buf: &mut [u8]) -> Result<usize, TransferError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file
            .read(&mut buf[filled..])
            .await
            .map_err(TransferError::SourceRead)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// A sequential producer of unknown (or caller-declared) size.
pub struct StreamSource {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    declared: Option<u64>,
    produced: u64,
    exhausted: bool,
}

impl StreamSource {
    async fn next_chunk(&mut self, max_size: usize) -> Result<Option<Bytes>, TransferError> {
        if self.exhausted {
            return Ok(None);
        }

        let want = match self.declared {
            Some(declared) => {
                let remaining = declared - self.produced;
                if remaining == 0 {
                    self.exhausted = true;
                    return self.check_drained(declared).await;
                }
                remaining.min(max_size as u64) as usize
            }
            None => max_size,
        };

        let mut buf = BytesMut::zeroed(want);
        let n = self
            .reader
            .read(&mut buf)
            .await
            .map_err(TransferError::SourceRead)?;

        if n == 0 {
            self.exhausted = true;
            if let Some(declared) = self.declared {
                return Err(TransferError::LengthMismatch {
                    declared,
                    actual: self.produced,
                });
            }
            return Ok(None);
        }

        buf.truncate(n);
        self.produced += n as u64;
        Ok(Some(buf.freeze()))
    }

    /// A declared-length producer must be at EOF once the declared bytes are out.
    /// `actual` in the error is a lower bound: the surplus is not read beyond one byte.
    async fn check_drained(&mut self, declared: u64) -> Result<Option<Bytes>, TransferError> {
        let mut extra = [0u8; 1];
        let n = self
            .reader
            .read(&mut extra)
            .await
            .map_err(TransferError::SourceRead)?;
        if n == 0 {
            return Ok(None);
        }
        Err(TransferError::LengthMismatch {
            declared,
            actual: declared + n as u64,
        })
    }
}
