//! Single-pass binary writer with forward references.
//!
//! Records are written front to back. Anything whose location is not known
//! yet is written as a 32-bit placeholder and patched later:
//!
//! - **Fixups** point at a later position of the main structure.
//!   [`DeferredWriter::create_fixup`] writes the placeholder and hands out a
//!   handle; [`DeferredWriter::insert_fixup`] marks where the target starts.
//! - **Deferred payloads** (strings, byte blobs, vectors) are queued and
//!   appended after the main structure by
//!   [`DeferredWriter::write_deferred_data`], in the order they were added.
//!
//! Every pointer is stored relative to its own offset: reading the `i32` at
//! offset `p` and adding `p` gives the target offset. Zero means null.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use bytemuck::Pod;

use crate::error::{FormatError, Result};

/// Handle returned by [`DeferredWriter::create_fixup`].
pub type FixupId = usize;

/// Placeholder pointing into the main structure.
#[derive(Debug, Clone, Copy)]
struct LocalFixup {
    ref_pos: u32,
    dst: Option<u32>,
}

/// Payload appended after the main structure.
#[derive(Debug, Clone)]
struct DeferredData {
    ref_pos: u32,
    data: Vec<u8>,
    save_blob_size: bool,
}

/// Binary writer that resolves forward references in one pass.
pub struct DeferredWriter<W: Write + Seek> {
    writer: W,
    pos: u64,
    fixups: Vec<LocalFixup>,
    deferred: Vec<DeferredData>,
    pos_stack: Vec<u64>,
    block_stack: Vec<u64>,
    strict: bool,
}

impl DeferredWriter<BufWriter<File>> {
    /// Create (or truncate) `path` for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Seek> DeferredWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pos: 0,
            fixups: Vec::new(),
            deferred: Vec::new(),
            pos_stack: Vec::new(),
            block_stack: Vec::new(),
            strict: true,
        }
    }

    /// In strict mode (the default) an unresolved fixup is an error at
    /// [`write_deferred_data`](Self::write_deferred_data). Otherwise it is
    /// logged and left null.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn file_pos(&self) -> u64 {
        self.pos
    }

    pub fn set_file_pos(&mut self, pos: u64) -> Result<()> {
        self.pos = self.writer.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn push_file_pos(&mut self) {
        self.pos_stack.push(self.pos);
    }

    pub fn pop_file_pos(&mut self) -> Result<()> {
        match self.pos_stack.pop() {
            Some(pos) => self.set_file_pos(pos),
            None => Ok(()),
        }
    }

    fn offset32(&self) -> Result<u32> {
        u32::try_from(self.pos).map_err(|_| FormatError::OffsetOverflow(self.pos))
    }

    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write a plain-old-data value in its in-memory layout.
    pub fn write<T: Pod>(&mut self, value: &T) -> Result<()> {
        self.write_raw(bytemuck::bytes_of(value))
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.writer.write_i32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    /// Write a raw 32-bit pointer slot.
    pub fn write_ptr(&mut self, value: u32) -> Result<()> {
        self.write_u32(value)
    }

    /// Write a null pointer slot to be patched later; returns its offset.
    fn placeholder(&mut self) -> Result<u32> {
        let ref_pos = self.offset32()?;
        self.write_ptr(0)?;
        Ok(ref_pos)
    }

    pub fn create_fixup(&mut self) -> Result<FixupId> {
        let ref_pos = self.placeholder()?;
        self.fixups.push(LocalFixup { ref_pos, dst: None });
        Ok(self.fixups.len() - 1)
    }

    /// Create `count` consecutive fixups, one pointer slot each.
    pub fn create_fixup_range(&mut self, count: usize) -> Result<Vec<FixupId>> {
        (0..count).map(|_| self.create_fixup()).collect()
    }

    /// Mark the current position as the target of fixup `id`.
    pub fn insert_fixup(&mut self, id: FixupId) -> Result<()> {
        let dst = self.offset32()?;
        let fixup = self
            .fixups
            .get_mut(id)
            .ok_or(FormatError::UnknownFixup(id))?;
        if fixup.dst.is_some() {
            return Err(FormatError::FixupAlreadyInserted(id));
        }
        fixup.dst = Some(dst);
        Ok(())
    }

    /// Queue `s` as a NUL-terminated string.
    pub fn add_deferred_string(&mut self, s: &str) -> Result<()> {
        let mut data = Vec::with_capacity(s.len() + 1);
        data.extend_from_slice(s.as_bytes());
        data.push(0);
        self.queue(data, false)
    }

    /// Queue a byte blob, optionally prefixed by its 32-bit length. The
    /// pointer targets the prefix when there is one.
    pub fn add_deferred_data(&mut self, data: &[u8], save_blob_size: bool) -> Result<()> {
        self.queue(data.to_vec(), save_blob_size)
    }

    /// Queue the bytes of `items`. An empty slice writes a null pointer and
    /// queues nothing.
    pub fn add_deferred_vector<T: Pod>(&mut self, items: &[T]) -> Result<()> {
        if items.is_empty() {
            return self.write_ptr(0);
        }
        self.queue(bytemuck::cast_slice(items).to_vec(), false)
    }

    fn queue(&mut self, data: Vec<u8>, save_blob_size: bool) -> Result<()> {
        let ref_pos = self.placeholder()?;
        self.deferred.push(DeferredData {
            ref_pos,
            data,
            save_blob_size,
        });
        Ok(())
    }

    /// Seek to `ref_pos`, store the pointer to `dst` and come back.
    fn patch(&mut self, ref_pos: u32, dst: u32) -> Result<()> {
        let relative = i32::try_from(i64::from(dst) - i64::from(ref_pos))
            .map_err(|_| FormatError::OffsetOverflow(u64::from(dst)))?;
        self.push_file_pos();
        self.set_file_pos(u64::from(ref_pos))?;
        self.write_i32(relative)?;
        self.pop_file_pos()
    }

    /// Resolve every fixup and append the queued payloads.
    ///
    /// Must be called once, after the main structure. Returns the offset of
    /// the first payload byte.
    pub fn write_deferred_data(&mut self) -> Result<u64> {
        for (id, fixup) in std::mem::take(&mut self.fixups).into_iter().enumerate() {
            match fixup.dst {
                Some(dst) => self.patch(fixup.ref_pos, dst)?,
                None if self.strict => {
                    return Err(FormatError::UnresolvedFixup {
                        id,
                        ref_pos: fixup.ref_pos,
                    });
                }
                None => tracing::warn!(
                    id,
                    ref_pos = fixup.ref_pos,
                    "Fixup never inserted, leaving a null pointer"
                ),
            }
        }

        let start = self.pos;
        let deferred = std::mem::take(&mut self.deferred);
        let total: usize = deferred.iter().map(|d| d.data.len()).sum();
        for payload in deferred {
            let dst = self.offset32()?;
            self.patch(payload.ref_pos, dst)?;
            if payload.save_blob_size {
                let len = payload.data.len() as u64;
                self.write_u32(u32::try_from(len).map_err(|_| FormatError::OffsetOverflow(len))?)?;
            }
            self.write_raw(&payload.data)?;
        }

        tracing::debug!(start, bytes = total, "Deferred data written");
        Ok(start)
    }

    pub fn start_block_marker(&mut self) {
        self.block_stack.push(self.pos);
    }

    /// Close the innermost block and return the bytes written inside it.
    pub fn end_block_marker(&mut self) -> Result<u64> {
        let start = self
            .block_stack
            .pop()
            .ok_or(FormatError::UnbalancedBlockMarker)?;
        Ok(self.pos.saturating_sub(start))
    }

    /// Flush and hand back the underlying writer.
    pub fn close(mut self) -> Result<W> {
        if !self.block_stack.is_empty() {
            return Err(FormatError::OpenBlockMarkers(self.block_stack.len()));
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}
