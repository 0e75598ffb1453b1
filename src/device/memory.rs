//! The `*tag*` in-memory backend, grounded in
//! `examples/original_source/poke/libpoke/ios-dev-mem.c`.

use super::{Device, DevOff};
use crate::error::{IosError, IosResult};
use crate::flags::IosFlags;

/// Growth step: 512 * 8 = 4096 bytes, matching the original `MEM_STEP`.
pub const MEM_STEP: usize = 512 * 8;

/// Recognize handlers of the form `*anything*`. A lone `"*"` counts --
/// its one character is both the first and the last -- matching
/// `ios_dev_mem_handler_normalize`'s `handler[0] == '*' && handler[len-1]
/// == '*'` exactly. Normalization is identity.
pub fn recognize(handler: &str) -> Option<String> {
    let bytes = handler.as_bytes();
    if !bytes.is_empty() && bytes[0] == b'*' && bytes[bytes.len() - 1] == b'*' {
        Some(handler.to_string())
    } else {
        None
    }
}

/// State for one memory device: a growable, zero-initialized byte buffer.
pub struct MemoryDevice {
    buf: Vec<u8>,
    flags: IosFlags,
}

impl MemoryDevice {
    /// Opens ignoring the requested mode: memory devices are always
    /// readable and writable, and start as one zeroed step.
    pub fn open(_handler: &str, flags: IosFlags) -> IosResult<Self> {
        log::debug!("memory device: opening with flags {:#x}", flags.bits());
        Ok(MemoryDevice {
            buf: vec![0u8; MEM_STEP],
            flags,
        })
    }
}

impl Device for MemoryDevice {
    fn pread(&mut self, buf: &mut [u8], offset: DevOff) -> IosResult<()> {
        let offset = offset as usize;
        let end = offset.checked_add(buf.len()).ok_or(IosError::Eoff)?;
        if end > self.buf.len() {
            return Err(IosError::Eoff);
        }
        buf.copy_from_slice(&self.buf[offset..end]);
        Ok(())
    }

    fn pwrite(&mut self, buf: &[u8], offset: DevOff) -> IosResult<()> {
        let offset = offset as usize;
        let end = offset.checked_add(buf.len()).ok_or(IosError::Eoff)?;

        if end > self.buf.len() + MEM_STEP {
            return Err(IosError::Eoff);
        }

        if end > self.buf.len() {
            // Grow by exactly one step. A failed reallocation must leave the
            // existing buffer intact; `Vec::try_reserve` gives us that.
            let new_len = self.buf.len() + MEM_STEP;
            if self.buf.try_reserve(MEM_STEP).is_err() {
                return Err(IosError::Error("allocation failure growing memory device"));
            }
            self.buf.resize(new_len, 0);
        }

        self.buf[offset..end].copy_from_slice(buf);
        Ok(())
    }

    fn flags(&self) -> IosFlags {
        self.flags
    }

    fn size(&self) -> IosResult<u64> {
        Ok(self.buf.len() as u64)
    }

    fn flush(&mut self, _offset: DevOff) -> IosResult<()> {
        Ok(())
    }

    fn close(&mut self) -> IosResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognize_requires_both_asterisks() {
        assert_eq!(recognize("*scratch*").as_deref(), Some("*scratch*"));
        assert!(recognize("scratch*").is_none());
        assert!(recognize("*scratch").is_none());
        assert!(recognize("scratch").is_none());
    }

    #[test]
    fn single_asterisk_is_recognized() {
        // Its one character is simultaneously the first and the last,
        // same as `ios_dev_mem_handler_normalize`.
        assert_eq!(recognize("*").as_deref(), Some("*"));
    }

    #[test]
    fn empty_handler_is_not_recognized() {
        assert!(recognize("").is_none());
    }

    #[test]
    fn starts_at_one_step() {
        let dev = MemoryDevice::open("*x*", IosFlags::default()).unwrap();
        assert_eq!(dev.size().unwrap(), MEM_STEP as u64);
    }

    #[test]
    fn write_within_first_step_does_not_grow() {
        let mut dev = MemoryDevice::open("*x*", IosFlags::default()).unwrap();
        dev.pwrite(&[1, 2, 3], (MEM_STEP - 3) as u64).unwrap();
        assert_eq!(dev.size().unwrap(), MEM_STEP as u64);
    }

    #[test]
    fn write_past_one_step_grows_exactly_one_step() {
        let mut dev = MemoryDevice::open("*x*", IosFlags::default()).unwrap();
        dev.pwrite(&[0xff], MEM_STEP as u64).unwrap();
        assert_eq!(dev.size().unwrap(), 2 * MEM_STEP as u64);
    }

    #[test]
    fn write_more_than_one_step_past_end_is_eoff() {
        let mut dev = MemoryDevice::open("*x*", IosFlags::default()).unwrap();
        let err = dev.pwrite(&[0xff], (2 * MEM_STEP) as u64).unwrap_err();
        assert!(matches!(err, IosError::Eoff));
    }

    #[test]
    fn read_past_size_is_eoff() {
        let mut dev = MemoryDevice::open("*x*", IosFlags::default()).unwrap();
        let mut buf = [0u8; 1];
        let err = dev.pread(&mut buf, MEM_STEP as u64).unwrap_err();
        assert!(matches!(err, IosError::Eoff));
    }

    #[test]
    fn round_trip_write_read() {
        let mut dev = MemoryDevice::open("*x*", IosFlags::default()).unwrap();
        dev.pwrite(&[0xde, 0xad, 0xbe, 0xef], 10).unwrap();
        let mut buf = [0u8; 4];
        dev.pread(&mut buf, 10).unwrap();
        assert_eq!(buf, [0xde, 0xad, 0xbe, 0xef]);
    }
}
