//! Byte cursor and the tagged-chunk walker.
//!
//! The walker reads `(kind, length)` pairs, hands each chunk to a handler as a
//! bounded [`ChunkView`], then jumps to `chunk_start + length` no matter how
//! much the handler looked at. Container chunks may instead ask to descend,
//! which only steps over their header. Once the position reaches the declared
//! end-of-file offset, the position must equal it exactly.

use crate::error::TextureError;

// ── Cursor for reading from &[u8] ───────────────────────────────────

pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_position(&mut self, pos: usize) -> Result<(), TextureError> {
        if pos > self.data.len() {
            return Err(TextureError::truncated(self.data.len(), pos - self.data.len()));
        }
        self.pos = pos;
        Ok(())
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), TextureError> {
        let new_pos = self
            .pos
            .checked_add(n)
            .ok_or_else(|| TextureError::truncated(self.pos, n))?;
        self.set_position(new_pos)
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], TextureError> {
        let s = self
            .pos
            .checked_add(n)
            .and_then(|end| self.data.get(self.pos..end))
            .ok_or_else(|| TextureError::truncated(self.pos, n))?;
        self.pos += n;
        Ok(s)
    }

    pub(crate) fn read_fixed_bytes<const N: usize>(&mut self) -> Result<[u8; N], TextureError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, TextureError> {
        Ok(self.read_fixed_bytes::<1>()?[0])
    }

    pub(crate) fn read_u16_le(&mut self) -> Result<u16, TextureError> {
        Ok(u16::from_le_bytes(self.read_fixed_bytes()?))
    }

    pub(crate) fn read_u16_be(&mut self) -> Result<u16, TextureError> {
        Ok(u16::from_be_bytes(self.read_fixed_bytes()?))
    }

    pub(crate) fn read_u32_le(&mut self) -> Result<u32, TextureError> {
        Ok(u32::from_le_bytes(self.read_fixed_bytes()?))
    }

    pub(crate) fn read_u32_be(&mut self) -> Result<u32, TextureError> {
        Ok(u32::from_be_bytes(self.read_fixed_bytes()?))
    }

    pub(crate) fn read_i32_le(&mut self) -> Result<i32, TextureError> {
        Ok(i32::from_le_bytes(self.read_fixed_bytes()?))
    }
}

// ── Chunk walking ───────────────────────────────────────────────────

/// Location and size of one chunk, as declared in its header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub kind: u16,
    /// Absolute offset of the chunk header.
    pub offset: usize,
    /// Declared length, header included.
    pub length: usize,
}

impl ChunkHeader {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Where the walker goes after a handler returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChunkStep {
    /// Jump to `chunk_start + length`.
    Skip,
    /// Step over `header_len` bytes only; the chunk's children follow.
    Descend { header_len: usize },
}

/// A chunk's bytes. Reads are confined to `[offset, offset + length)`.
pub(crate) struct ChunkView<'a> {
    pub header: ChunkHeader,
    bytes: &'a [u8],
}

impl<'a> ChunkView<'a> {
    fn over_read(&self, rel: usize, n: usize) -> TextureError {
        TextureError::malformed(
            self.header.offset + rel,
            alloc::format!(
                "chunk {:#06x} field at +{rel:#x} ({n} bytes) runs past its length {:#x}",
                self.header.kind,
                self.header.length
            ),
        )
    }

    fn field<const N: usize>(&self, rel: usize) -> Result<[u8; N], TextureError> {
        let s = rel
            .checked_add(N)
            .and_then(|end| self.bytes.get(rel..end))
            .ok_or_else(|| self.over_read(rel, N))?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(s);
        Ok(buf)
    }

    pub fn u16_le(&self, rel: usize) -> Result<u16, TextureError> {
        Ok(u16::from_le_bytes(self.field(rel)?))
    }

    /// Bytes from `rel` to the end of the chunk.
    pub fn tail(&self, rel: usize) -> Result<&'a [u8], TextureError> {
        self.bytes.get(rel..).ok_or_else(|| self.over_read(rel, 0))
    }

    /// Absolute offset of a chunk-relative position.
    pub fn absolute(&self, rel: usize) -> usize {
        self.header.offset + rel
    }
}

/// Per-format chunk dispatch.
pub(crate) trait ChunkHandler<'a> {
    /// Absolute end-of-file offset, once a chunk has declared it.
    fn end_of_file(&self) -> Option<usize>;

    /// Consume one chunk. Unknown kinds must return an error.
    fn handle(&mut self, chunk: &ChunkView<'a>) -> Result<ChunkStep, TextureError>;
}

/// Walk little-endian `{u16 kind, u16 reserved, i32 length}` chunks from `start`.
///
/// Returns the final position, which equals the declared end-of-file offset.
pub(crate) fn walk<'a, H: ChunkHandler<'a>>(
    data: &'a [u8],
    start: usize,
    handler: &mut H,
) -> Result<usize, TextureError> {
    let mut cursor = Cursor::new(data);
    cursor.set_position(start)?;

    loop {
        let pos = cursor.position();
        match handler.end_of_file() {
            Some(eof) if pos >= eof => break,
            None if pos >= data.len() => {
                return Err(TextureError::malformed(
                    pos,
                    "stream ended before an end-of-file chunk was seen",
                ));
            }
            _ => {}
        }

        let kind = cursor.read_u16_le()?;
        cursor.skip(2)?;
        let length = cursor.read_i32_le()?;
        if length <= 0 {
            return Err(TextureError::malformed(
                pos,
                alloc::format!("chunk {kind:#06x} has non-positive length {length}"),
            ));
        }
        let header = ChunkHeader {
            kind,
            offset: pos,
            length: length as usize,
        };
        let bytes = data.get(pos..header.end()).ok_or_else(|| {
            TextureError::malformed(
                pos,
                alloc::format!(
                    "chunk {kind:#06x} length {length} runs past end of data ({} bytes)",
                    data.len()
                ),
            )
        })?;

        let step = handler.handle(&ChunkView { header, bytes })?;
        match step {
            ChunkStep::Skip => {
                log::trace!("chunk {kind:#06x} @ {pos:#x}: skip {length:#x}");
                cursor.set_position(header.end())?;
            }
            ChunkStep::Descend { header_len } => {
                log::trace!("chunk {kind:#06x} @ {pos:#x}: descend");
                cursor.set_position(pos + header_len.min(header.length))?;
            }
        }
    }

    let end = cursor.position();
    let eof = handler
        .end_of_file()
        .ok_or_else(|| TextureError::malformed(end, "no end-of-file chunk"))?;
    if end != eof {
        return Err(TextureError::malformed(
            end,
            alloc::format!("declared end-of-file {eof:#x} but chunks end at {end:#x}"),
        ));
    }
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    /// Kind 1 declares end-of-file = its length + `base`; kind 2 is a leaf.
    struct Toy {
        base: usize,
        eof: Option<usize>,
        seen: Vec<(u16, usize)>,
    }

    impl<'a> ChunkHandler<'a> for Toy {
        fn end_of_file(&self) -> Option<usize> {
            self.eof
        }

        fn handle(&mut self, chunk: &ChunkView<'a>) -> Result<ChunkStep, TextureError> {
            self.seen.push((chunk.header.kind, chunk.header.offset));
            match chunk.header.kind {
                1 => {
                    self.eof = Some(chunk.header.length + self.base);
                    Ok(ChunkStep::Descend { header_len: 8 })
                }
                2 => {
                    // Peeks at one field only; the walker still skips the whole chunk.
                    chunk.u16_le(8)?;
                    Ok(ChunkStep::Skip)
                }
                other => Err(TextureError::malformed(
                    chunk.header.offset,
                    alloc::format!("unknown chunk {other}"),
                )),
            }
        }
    }

    fn chunk(kind: u16, length: i32, body: usize) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&length.to_le_bytes());
        out.resize(8 + body, 0xee);
        out
    }

    fn toy() -> Toy {
        Toy {
            base: 0,
            eof: None,
            seen: Vec::new(),
        }
    }

    #[test]
    fn walks_and_verifies_end() {
        let mut data = chunk(1, 8 + 20 + 12, 0);
        data.extend(chunk(2, 20, 12));
        data.extend(chunk(2, 12, 4));
        let mut h = toy();
        assert_eq!(walk(&data, 0, &mut h).unwrap(), data.len());
        assert_eq!(h.seen, [(1, 0), (2, 8), (2, 28)]);
    }

    #[test]
    fn end_mismatch_rejected() {
        let mut data = chunk(1, 8 + 20 + 10, 0);
        data.extend(chunk(2, 20, 12));
        data.extend(chunk(2, 12, 4));
        let err = walk(&data, 0, &mut toy()).unwrap_err();
        assert!(matches!(err, TextureError::MalformedContainer { offset: 40, .. }));
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut data = chunk(1, 8 + 12 + 12, 0);
        data.extend(chunk(2, 12, 4));
        data.extend(chunk(7, 12, 4));
        let mut h = toy();
        assert!(walk(&data, 0, &mut h).is_err());
        assert_eq!(h.seen.last(), Some(&(7, 20)));
    }

    #[test]
    fn non_positive_length_rejected() {
        let mut data = chunk(1, 8 + 12, 0);
        data.extend(chunk(2, 0, 4));
        let err = walk(&data, 0, &mut toy()).unwrap_err();
        assert!(matches!(err, TextureError::MalformedContainer { offset: 8, .. }));
    }

    #[test]
    fn field_past_chunk_length_is_over_read() {
        let mut data = chunk(1, 8 + 9, 0);
        // Length 9 leaves only one byte for the two-byte field at +8.
        data.extend(chunk(2, 9, 1));
        let err = walk(&data, 0, &mut toy()).unwrap_err();
        assert!(matches!(err, TextureError::MalformedContainer { offset: 16, .. }));
    }

    #[test]
    fn missing_end_marker_rejected() {
        let data = chunk(2, 12, 4);
        assert!(walk(&data, 0, &mut toy()).is_err());
    }
}
