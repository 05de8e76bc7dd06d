//! Guest memory access.
//!
//! Data-source commands read wave buffers and ADPCM contexts out of guest
//! memory, and the circular-buffer sink writes PCM back into it. Guest
//! addresses are untrusted: every access is range-checked by the
//! [`MemoryManager`] implementation and failures come back as
//! [`MemoryError`], which callers turn into silence or a skipped write.
//!
//! [`GuestMemory`] is a plain byte vector mapped at a base address, used by
//! tests and demos and by hosts that keep guest memory in-process.

use crate::error::MemoryError;

/// Guest (CPU-side) address.
pub type CpuAddress = u64;

/// Range-checked access to guest memory.
pub trait MemoryManager {
    /// Borrow `size` bytes at `address` for the duration of the call.
    fn borrow_bytes(&self, address: CpuAddress, size: usize) -> Result<&[u8], MemoryError>;

    /// Write `data` at `address`.
    fn write_bytes(&mut self, address: CpuAddress, data: &[u8]) -> Result<(), MemoryError>;

    /// Read `dst.len()` bytes at `address`.
    fn read_bytes(&self, address: CpuAddress, dst: &mut [u8]) -> Result<(), MemoryError> {
        dst.copy_from_slice(self.borrow_bytes(address, dst.len())?);
        Ok(())
    }

    /// Read a little-endian `i16`.
    fn read_i16(&self, address: CpuAddress) -> Result<i16, MemoryError> {
        let mut bytes = [0; 2];
        self.read_bytes(address, &mut bytes)?;
        Ok(i16::from_le_bytes(bytes))
    }

    /// Read a little-endian `u32`.
    fn read_u32(&self, address: CpuAddress) -> Result<u32, MemoryError> {
        let mut bytes = [0; 4];
        self.read_bytes(address, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Write a little-endian `i16`.
    fn write_i16(&mut self, address: CpuAddress, value: i16) -> Result<(), MemoryError> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Read `dst.len()` little-endian `i16` values.
    fn read_i16_slice(&self, address: CpuAddress, dst: &mut [i16]) -> Result<(), MemoryError> {
        let bytes = self.borrow_bytes(address, dst.len() * 2)?;
        for (value, pair) in dst.iter_mut().zip(bytes.chunks_exact(2)) {
            *value = i16::from_le_bytes([pair[0], pair[1]]);
        }
        Ok(())
    }

    /// Read `dst.len()` little-endian `f32` values.
    fn read_f32_slice(&self, address: CpuAddress, dst: &mut [f32]) -> Result<(), MemoryError> {
        let bytes = self.borrow_bytes(address, dst.len() * 4)?;
        for (value, quad) in dst.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]);
        }
        Ok(())
    }
}

/// In-process guest memory: `bytes` mapped at `base`.
#[derive(Debug, Clone, Default)]
pub struct GuestMemory {
    base: CpuAddress,
    bytes: Vec<u8>,
}

impl GuestMemory {
    /// Zeroed region of `size` bytes starting at `base`.
    pub fn new(base: CpuAddress, size: usize) -> Self {
        Self {
            base,
            bytes: vec![0; size],
        }
    }

    /// First mapped address.
    pub fn base(&self) -> CpuAddress {
        self.base
    }

    /// Mapped size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Store `samples` as little-endian `i16` at `address`.
    pub fn write_i16_slice(&mut self, address: CpuAddress, samples: &[i16]) -> Result<(), MemoryError> {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.write_bytes(address, &bytes)
    }

    /// Store `samples` as little-endian `f32` at `address`.
    pub fn write_f32_slice(&mut self, address: CpuAddress, samples: &[f32]) -> Result<(), MemoryError> {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.write_bytes(address, &bytes)
    }

    fn range(&self, address: CpuAddress, size: usize) -> Result<core::ops::Range<usize>, MemoryError> {
        let invalid = MemoryError::InvalidAddress { address, size };
        let offset = address.checked_sub(self.base).ok_or(invalid.clone())?;
        let start = usize::try_from(offset).map_err(|_| invalid.clone())?;
        let end = start.checked_add(size).ok_or(invalid.clone())?;
        if end > self.bytes.len() {
            return Err(invalid);
        }
        Ok(start..end)
    }
}

impl MemoryManager for GuestMemory {
    fn borrow_bytes(&self, address: CpuAddress, size: usize) -> Result<&[u8], MemoryError> {
        let range = self.range(address, size)?;
        Ok(&self.bytes[range])
    }

    fn write_bytes(&mut self, address: CpuAddress, data: &[u8]) -> Result<(), MemoryError> {
        let range = self.range(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }
}
