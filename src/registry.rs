//! The space registry: tracks every open [`Space`], which one is current,
//! and hands out bias-adjusted codec access to them.

use crate::codec;
use crate::device;
use crate::error::{IosError, IosResult};
use crate::flags::IosFlags;
use crate::space::Space;
use crate::types::{Endian, IosOff, NegEncoding};

/// An explicit collection of open IO spaces, plus a cursor onto the
/// "current" one. Ordinary value: no global state, no internal locking.
/// Callers who want a process-wide default can reach for
/// [`crate::global::with_default`] instead of threading one of these
/// through every call.
#[derive(Default)]
pub struct Registry {
    spaces: Vec<Space>,
    current: Option<u32>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Open `handler` and link it at the head of the registry (`ios_open`
    /// prepends: `io->next = io_list; io_list = io`). Becomes current if
    /// the registry was empty or `set_current` is true.
    pub fn open(&mut self, handler: &str, flags: IosFlags, set_current: bool) -> IosResult<u32> {
        let (handler, dev) = device::open(handler, flags)?;
        let id = self.next_id;
        self.next_id += 1;
        self.spaces.insert(0, Space::new(id, handler, dev));
        if set_current || self.current.is_none() {
            self.current = Some(id);
        }
        Ok(id)
    }

    /// Close the space `id`: closes its device (logging, not propagating,
    /// a failure) and unlinks it, repointing `current` to the head of what
    /// remains (the newest surviving space) if it pointed at the space
    /// being closed.
    pub fn close(&mut self, id: u32) -> IosResult<()> {
        let pos = self
            .index_of(id)
            .ok_or(IosError::Error("no such space"))?;
        let mut space = self.spaces.remove(pos);
        if let Err(e) = space.device().close() {
            log::warn!("error closing space {id} ({}): {e}", space.handler());
        }
        if self.current == Some(id) {
            self.current = self.spaces.first().map(|s| s.id());
        }
        Ok(())
    }

    /// Close every remaining space. Errors are logged, not returned --
    /// matches the best-effort `close` contract applied in bulk.
    pub fn shutdown(&mut self) {
        let ids: Vec<u32> = self.spaces.iter().map(|s| s.id()).collect();
        for id in ids {
            let _ = self.close(id);
        }
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        self.spaces.iter().position(|s| s.id() == id)
    }

    fn space(&self, id: u32) -> IosResult<&Space> {
        self.spaces
            .iter()
            .find(|s| s.id() == id)
            .ok_or(IosError::Error("no such space"))
    }

    fn space_mut(&mut self, id: u32) -> IosResult<&mut Space> {
        self.spaces
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(IosError::Error("no such space"))
    }

    /// Find the first open space backed by `handler`, if any.
    pub fn search(&self, handler: &str) -> Option<u32> {
        self.spaces
            .iter()
            .find(|s| s.handler() == handler)
            .map(|s| s.id())
    }

    pub fn search_by_id(&self, id: u32) -> Option<&Space> {
        self.spaces.iter().find(|s| s.id() == id)
    }

    pub fn current(&self) -> Option<u32> {
        self.current
    }

    pub fn set_current(&mut self, id: u32) -> IosResult<()> {
        self.index_of(id).ok_or(IosError::Error("no such space"))?;
        self.current = Some(id);
        Ok(())
    }

    pub fn handler(&self, id: u32) -> IosResult<&str> {
        Ok(self.space(id)?.handler())
    }

    pub fn flags(&self, id: u32) -> IosResult<IosFlags> {
        Ok(self.space(id)?.flags())
    }

    pub fn get_bias(&self, id: u32) -> IosResult<IosOff> {
        Ok(self.space(id)?.bias())
    }

    pub fn set_bias(&mut self, id: u32, bias: IosOff) -> IosResult<()> {
        self.space_mut(id)?.set_bias(bias);
        Ok(())
    }

    /// Size of the space, in bits.
    pub fn size(&mut self, id: u32) -> IosResult<IosOff> {
        self.space_mut(id)?.size_bits()
    }

    /// Iterate every open space, head first -- newest-opened space first,
    /// matching `ios_map`'s traversal of `io_list`.
    pub fn iter(&self) -> impl Iterator<Item = &Space> {
        self.spaces.iter()
    }

    /// Call `f` with every open space, head first (newest-opened first).
    pub fn map(&self, mut f: impl FnMut(&Space)) {
        for space in &self.spaces {
            f(space);
        }
    }

    fn biased(&self, id: u32, offset: IosOff) -> IosResult<IosOff> {
        Ok(self.space(id)?.bias() + offset)
    }

    pub fn read_uint(&mut self, id: u32, offset: IosOff, bits: u32, endian: Endian) -> IosResult<u64> {
        let off = self.biased(id, offset)?;
        codec::read_uint(self.space_mut(id)?.device(), off, bits, endian)
    }

    pub fn read_int(
        &mut self,
        id: u32,
        offset: IosOff,
        bits: u32,
        endian: Endian,
        nenc: NegEncoding,
    ) -> IosResult<i64> {
        let off = self.biased(id, offset)?;
        codec::read_int(self.space_mut(id)?.device(), off, bits, endian, nenc)
    }

    pub fn write_uint(
        &mut self,
        id: u32,
        offset: IosOff,
        bits: u32,
        endian: Endian,
        value: u64,
    ) -> IosResult<()> {
        let off = self.biased(id, offset)?;
        codec::write_uint(self.space_mut(id)?.device(), off, bits, endian, value)
    }

    pub fn write_int(
        &mut self,
        id: u32,
        offset: IosOff,
        bits: u32,
        endian: Endian,
        nenc: NegEncoding,
        value: i64,
    ) -> IosResult<()> {
        let off = self.biased(id, offset)?;
        codec::write_int(self.space_mut(id)?.device(), off, bits, endian, nenc, value)
    }

    pub fn read_string(&mut self, id: u32, offset: IosOff) -> IosResult<Vec<u8>> {
        let off = self.biased(id, offset)?;
        codec::read_string(self.space_mut(id)?.device(), off)
    }

    pub fn write_string(&mut self, id: u32, offset: IosOff, s: &[u8]) -> IosResult<()> {
        let off = self.biased(id, offset)?;
        codec::write_string(self.space_mut(id)?.device(), off, s)
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_opened_space_becomes_current() {
        let mut reg = Registry::new();
        let id = reg.open("*a*", IosFlags::default(), false).unwrap();
        assert_eq!(reg.current(), Some(id));
    }

    #[test]
    fn set_current_moves_the_cursor() {
        let mut reg = Registry::new();
        let a = reg.open("*a*", IosFlags::default(), false).unwrap();
        let b = reg.open("*b*", IosFlags::default(), false).unwrap();
        assert_eq!(reg.current(), Some(a));
        reg.set_current(b).unwrap();
        assert_eq!(reg.current(), Some(b));
    }

    #[test]
    fn closing_current_repoints_to_head() {
        let mut reg = Registry::new();
        let a = reg.open("*a*", IosFlags::default(), false).unwrap();
        let b = reg.open("*b*", IosFlags::default(), true).unwrap();
        assert_eq!(reg.current(), Some(b));
        reg.close(b).unwrap();
        assert_eq!(reg.current(), Some(a));
    }

    #[test]
    fn search_finds_by_handler() {
        let mut reg = Registry::new();
        let id = reg.open("*tag*", IosFlags::default(), false).unwrap();
        assert_eq!(reg.search("*tag*"), Some(id));
        assert_eq!(reg.search("*missing*"), None);
    }

    #[test]
    fn bias_shifts_subsequent_offsets() {
        let mut reg = Registry::new();
        let id = reg
            .open("*x*", IosFlags::new(crate::flags::IOS_F_WRITE | crate::flags::IOS_F_READ), false)
            .unwrap();
        reg.set_bias(id, 8).unwrap();
        reg.write_uint(id, 0, 8, Endian::Msb, 0xAB).unwrap();
        assert_eq!(reg.read_uint(id, 0, 8, Endian::Msb).unwrap(), 0xAB);
        reg.set_bias(id, 0).unwrap();
        assert_eq!(reg.read_uint(id, 8, 8, Endian::Msb).unwrap(), 0xAB);
    }

    #[test]
    fn close_unknown_id_is_an_error() {
        let mut reg = Registry::new();
        assert!(reg.close(999).is_err());
    }
}
