//! Region-based bump allocation for per-connection scratch data.
//!
//! An [`Arena`] owns a chain of fixed-size regions. Allocation bumps a cursor
//! in the current region and opens a new region when the request does not fit.
//! Nothing is freed individually: dropping (or [`Arena::release`]-ing) the arena
//! frees every region at once.
//!
//! Allocations are addressed through [`Slot`] handles instead of raw pointers,
//! so a slot is only meaningful for the arena that produced it.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    #[error("zero-sized allocation")]
    ZeroSize,
    #[error("allocation of {size} bytes exceeds region size {region_size}")]
    Oversize { size: usize, region_size: usize },
    #[error("alignment {0} is not a power of two")]
    BadAlignment(usize),
}

/// Handle to a byte range inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    region: u32,
    offset: u32,
    len: u32,
}

impl Slot {
    /// A zero-length slot. Resolves to an empty slice in any arena.
    pub const EMPTY: Slot = Slot {
        region: 0,
        offset: 0,
        len: 0,
    };

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

struct Region {
    bytes: Box<[u8]>,
    free_cursor: usize,
}

impl Region {
    fn new(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size].into_boxed_slice(),
            free_cursor: 0,
        }
    }

    /// Offset of the first byte at or after the cursor whose address is
    /// aligned to `align`.
    fn aligned_cursor(&self, align: usize) -> usize {
        let base = self.bytes.as_ptr() as usize;
        let addr = base + self.free_cursor;
        let aligned = (addr + (align - 1)) & !(align - 1);
        aligned - base
    }
}

pub struct Arena {
    regions: Vec<Region>,
    region_size: usize,
}

impl Arena {
    /// Creates an arena holding a single region of `region_size` bytes.
    pub fn new(region_size: usize) -> Self {
        Self {
            regions: vec![Region::new(region_size)],
            region_size,
        }
    }

    /// Reserves `size` bytes aligned to `align`.
    ///
    /// Fails for zero-sized requests and for requests larger than one region;
    /// callers must size regions for their largest single object.
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<Slot, ArenaError> {
        if size == 0 {
            return Err(ArenaError::ZeroSize);
        }
        if size > self.region_size {
            return Err(ArenaError::Oversize {
                size,
                region_size: self.region_size,
            });
        }
        if !align.is_power_of_two() {
            return Err(ArenaError::BadAlignment(align));
        }

        let mut index = self.regions.len() - 1;
        let mut offset = self.regions[index].aligned_cursor(align);

        if offset + size > self.regions[index].bytes.len() {
            tracing::trace!(
                size,
                regions = self.regions.len() + 1,
                "arena region exhausted, opening a new one"
            );
            self.regions.push(Region::new(self.region_size));
            index += 1;
            offset = self.regions[index].aligned_cursor(align);

            // Alignment padding in a fresh region can still push an object
            // that is exactly region-sized past the end.
            if offset + size > self.region_size {
                return Err(ArenaError::Oversize {
                    size: size + offset,
                    region_size: self.region_size,
                });
            }
        }

        self.regions[index].free_cursor = offset + size;

        Ok(Slot {
            region: index as u32,
            offset: offset as u32,
            len: size as u32,
        })
    }

    /// Copies `bytes` into the arena. An empty slice yields [`Slot::EMPTY`]
    /// without touching any region.
    pub fn alloc_bytes(&mut self, bytes: &[u8]) -> Result<Slot, ArenaError> {
        if bytes.is_empty() {
            return Ok(Slot::EMPTY);
        }
        let slot = self.allocate(bytes.len(), 1)?;
        self.get_mut(slot).copy_from_slice(bytes);
        Ok(slot)
    }

    pub fn get(&self, slot: Slot) -> &[u8] {
        if slot.is_empty() {
            return &[];
        }
        let start = slot.offset as usize;
        &self.regions[slot.region as usize].bytes[start..start + slot.len()]
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut [u8] {
        if slot.is_empty() {
            return &mut [];
        }
        let start = slot.offset as usize;
        &mut self.regions[slot.region as usize].bytes[start..start + slot.len()]
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn region_size(&self) -> usize {
        self.region_size
    }

    /// Bytes consumed across all regions, alignment padding included.
    pub fn bytes_used(&self) -> usize {
        self.regions.iter().map(|r| r.free_cursor).sum()
    }

    /// Frees every region. Equivalent to dropping the arena.
    pub fn release(self) {}
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("region_size", &self.region_size)
            .field("region_count", &self.regions.len())
            .field("bytes_used", &self.bytes_used())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_allocation_starts_on_boundary() {
        let mut arena = Arena::new(64);
        arena.allocate(1, 1).unwrap();
        let slot = arena.allocate(8, 8).unwrap();

        let base = arena.regions[0].bytes.as_ptr() as usize;
        assert_eq!((base + slot.offset as usize) % 8, 0);
    }

    #[test]
    fn empty_slot_resolves_to_empty_slice() {
        let arena = Arena::new(16);
        assert!(arena.get(Slot::EMPTY).is_empty());
    }
}
