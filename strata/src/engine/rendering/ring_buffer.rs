use crate::error::*;
use crate::rendering::{BufferId, RenderBackend};
use snafu::ensure;

/// Byte offset of a block in a uniform region split into one slot per frame in flight.
///
/// Slot `frame_index % frames_in_flight` starts at `slot * max_draws * block_size`,
/// block `draw_index` of that slot follows `draw_index * block_size` bytes later.
/// Offsets of different `(frame_index, draw_index)` pairs never overlap as long
/// as `draw_index < max_draws`.
#[inline]
pub const fn calc_ringbuffer(
    frame_index: u32,
    frames_in_flight: u32,
    draw_index: u32,
    block_size: u64,
    max_draws: u32,
) -> u64 {
    let slot = (frame_index % frames_in_flight) as u64;
    slot * max_draws as u64 * block_size + draw_index as u64 * block_size
}

/// Cursor over one ring-buffered uniform region.
///
/// Each frame writes into its own slot, so the CPU never overwrites a block
/// that a frame still in flight may be reading.
#[derive(Debug, Clone)]
pub struct UniformRing {
    buffer: BufferId,
    block_size: u64,
    capacity: u32,
    frames_in_flight: u32,
    frame_index: u32,
    cursor: u32,
}

impl UniformRing {
    pub fn new(buffer: BufferId, block_size: u64, capacity: u32, frames_in_flight: u32) -> Self {
        UniformRing {
            buffer,
            block_size,
            capacity,
            frames_in_flight,
            frame_index: 0,
            cursor: 0,
        }
    }

    /// Moves to the slot of `frame_index` and rewinds the cursor.
    pub fn begin_frame(&mut self, frame_index: u32) {
        self.frame_index = frame_index % self.frames_in_flight;
        self.cursor = 0;
    }

    pub fn offset_of(&self, index: u32) -> u64 {
        calc_ringbuffer(
            self.frame_index,
            self.frames_in_flight,
            index,
            self.block_size,
            self.capacity,
        )
    }

    /// Writes `data` into the next free block of the current slot and returns its offset.
    pub fn push(&mut self, backend: &dyn RenderBackend, data: &[u8]) -> Result<u64> {
        ensure!(
            self.cursor < self.capacity,
            UniformOverflowErr {
                draw: self.cursor,
                capacity: self.capacity
            }
        );

        let offset = self.offset_of(self.cursor);
        backend.write_uniform(self.buffer, offset, data);
        self.cursor += 1;

        Ok(offset)
    }

    /// Offset of the most recently pushed block in this frame, if any.
    pub fn last_offset(&self) -> Option<u64> {
        self.cursor.checked_sub(1).map(|index| self.offset_of(index))
    }

    #[inline]
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    #[inline]
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    #[inline]
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }
}
