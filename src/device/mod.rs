//! IO device backends: the byte-oriented capability set each backend must
//! implement.
//!
//! Offsets at this layer are always byte counts (`DevOff`), never bits --
//! endianness, bit alignment, and negative encodings are concerns of the
//! codec layer above, not of a device.

pub mod file;
pub mod memory;

#[cfg(feature = "nbd")]
pub mod nbd;
#[cfg(feature = "nbd")]
mod nbd_wire;

use crate::error::{IosError, IosResult};
use crate::flags::IosFlags;

/// Byte offset into a device, as opposed to [`crate::IosOff`] which counts
/// bits into a space.
pub type DevOff = u64;

/// The operations every IO device backend provides. All offsets here are
/// byte offsets.
pub trait Device {
    /// Read exactly `buf.len()` bytes at `offset`. A short read at the
    /// underlying resource is reported as [`IosError::Eoff`].
    fn pread(&mut self, buf: &mut [u8], offset: DevOff) -> IosResult<()>;

    /// Write exactly `buf.len()` bytes at `offset`. A short write is
    /// reported as [`IosError::Eoff`].
    fn pwrite(&mut self, buf: &[u8], offset: DevOff) -> IosResult<()>;

    /// The flags the device currently sees itself as operating under. Not
    /// necessarily identical to the flags passed to `open` -- some
    /// backends amend them (file auto-mode, nbd auto-mode).
    fn flags(&self) -> IosFlags;

    /// Size of the device, in bytes. For memory: the currently allocated
    /// buffer size. For a file: current file length. For nbd: the size
    /// advertised at connect time.
    fn size(&self) -> IosResult<u64>;

    /// For in-streams, drop buffered bytes below `offset`; for out-streams,
    /// flush and drop. Devices with genuine random access treat this as a
    /// no-op.
    fn flush(&mut self, offset: DevOff) -> IosResult<()>;

    /// Close the device. Best-effort: failures here are logged by the
    /// caller rather than propagated.
    fn close(&mut self) -> IosResult<()>;
}

/// Tagged union of the backends this crate ships. Modeled as an enum
/// rather than a boxed trait object since the backend set is closed and
/// known at compile time.
pub enum Backend {
    Memory(memory::MemoryDevice),
    File(file::FileDevice),
    #[cfg(feature = "nbd")]
    Nbd(nbd::NbdDevice),
}

impl Device for Backend {
    fn pread(&mut self, buf: &mut [u8], offset: DevOff) -> IosResult<()> {
        match self {
            Backend::Memory(d) => d.pread(buf, offset),
            Backend::File(d) => d.pread(buf, offset),
            #[cfg(feature = "nbd")]
            Backend::Nbd(d) => d.pread(buf, offset),
        }
    }

    fn pwrite(&mut self, buf: &[u8], offset: DevOff) -> IosResult<()> {
        match self {
            Backend::Memory(d) => d.pwrite(buf, offset),
            Backend::File(d) => d.pwrite(buf, offset),
            #[cfg(feature = "nbd")]
            Backend::Nbd(d) => d.pwrite(buf, offset),
        }
    }

    fn flags(&self) -> IosFlags {
        match self {
            Backend::Memory(d) => d.flags(),
            Backend::File(d) => d.flags(),
            #[cfg(feature = "nbd")]
            Backend::Nbd(d) => d.flags(),
        }
    }

    fn size(&self) -> IosResult<u64> {
        match self {
            Backend::Memory(d) => d.size(),
            Backend::File(d) => d.size(),
            #[cfg(feature = "nbd")]
            Backend::Nbd(d) => d.size(),
        }
    }

    fn flush(&mut self, offset: DevOff) -> IosResult<()> {
        match self {
            Backend::Memory(d) => d.flush(offset),
            Backend::File(d) => d.flush(offset),
            #[cfg(feature = "nbd")]
            Backend::Nbd(d) => d.flush(offset),
        }
    }

    fn close(&mut self) -> IosResult<()> {
        match self {
            Backend::Memory(d) => d.close(),
            Backend::File(d) => d.close(),
            #[cfg(feature = "nbd")]
            Backend::Nbd(d) => d.close(),
        }
    }
}

/// Try each backend's recognizer in the fixed order: memory, nbd (if
/// built), file last. File accepts any handler,
/// so it must be tried last or it would shadow every prefixed scheme.
///
/// Returns the normalized handler and a freshly opened backend.
pub(crate) fn open(handler: &str, flags: IosFlags) -> IosResult<(String, Backend)> {
    if let Some(normalized) = memory::recognize(handler) {
        let dev = memory::MemoryDevice::open(handler, flags)?;
        return Ok((normalized, Backend::Memory(dev)));
    }

    #[cfg(feature = "nbd")]
    if let Some(normalized) = nbd::recognize(handler) {
        let dev = nbd::NbdDevice::open(handler, flags)?;
        return Ok((normalized, Backend::Nbd(dev)));
    }

    if let Some(normalized) = file::recognize(handler) {
        let dev = file::FileDevice::open(handler, flags)?;
        return Ok((normalized, Backend::File(dev)));
    }

    Err(IosError::Error("no backend recognizes this handler"))
}
