//! A minimal client implementation of the NBD (Network Block Device) wire
//! protocol: fixed newstyle handshake plus the simple reply transmission
//! mode. Grounded in `examples/original_source/poke/libpoke/ios-dev-nbd.c`,
//! which drives the same exchange through `libnbd`; no equivalent crate
//! exists in this corpus, so the handshake and read/write commands are
//! hand-rolled here directly over a byte stream.
//!
//! Only what `ios-dev-nbd.c` actually exercises is implemented: export-name
//! negotiation (no TLS, no structured replies, no multiple exports) and the
//! read/write/disconnect commands.

use std::io::{Read, Write};

use crate::error::{IosError, IosResult};

const NBD_MAGIC: u64 = 0x4e42444d41474943; // "NBDMAGIC"
const NBD_IHAVEOPT: u64 = 0x49484156454f5054; // "IHAVEOPT"

const NBD_OPT_EXPORT_NAME: u32 = 1;

const NBD_FLAG_FIXED_NEWSTYLE: u16 = 1 << 0;
const NBD_FLAG_NO_ZEROES: u16 = 1 << 1;

const NBD_FLAG_READ_ONLY: u16 = 1 << 0;

const NBD_REQUEST_MAGIC: u32 = 0x25609513;
const NBD_SIMPLE_REPLY_MAGIC: u32 = 0x67446698;

const NBD_CMD_READ: u16 = 0;
const NBD_CMD_WRITE: u16 = 1;
const NBD_CMD_DISC: u16 = 2;

/// Export properties negotiated during the handshake.
pub struct Export {
    pub size: u64,
    pub read_only: bool,
}

/// A connected NBD session: handshake is complete and the connection is in
/// transmission mode.
pub struct Session<S: Read + Write> {
    stream: S,
    next_handle: u64,
}

impl<S: Read + Write> Session<S> {
    /// Perform the fixed newstyle handshake against `stream`, requesting
    /// `export_name`, and return the connected session plus what the
    /// server told us about the export.
    pub fn handshake(mut stream: S, export_name: &str) -> IosResult<(Self, Export)> {
        let mut magic = [0u8; 8];
        stream.read_exact(&mut magic).map_err(IosError::Io)?;
        if u64::from_be_bytes(magic) != NBD_MAGIC {
            return Err(IosError::Error("not an NBD server (bad magic)"));
        }

        let mut ihaveopt = [0u8; 8];
        stream.read_exact(&mut ihaveopt).map_err(IosError::Io)?;
        if u64::from_be_bytes(ihaveopt) != NBD_IHAVEOPT {
            return Err(IosError::Error("not an NBD server (expected newstyle negotiation)"));
        }

        let mut handshake_flags = [0u8; 2];
        stream.read_exact(&mut handshake_flags).map_err(IosError::Io)?;
        let handshake_flags = u16::from_be_bytes(handshake_flags);
        if handshake_flags & NBD_FLAG_FIXED_NEWSTYLE == 0 {
            return Err(IosError::Error("server does not support fixed newstyle negotiation"));
        }
        let no_zeroes = handshake_flags & NBD_FLAG_NO_ZEROES != 0;

        let client_flags: u32 = NBD_FLAG_FIXED_NEWSTYLE as u32 | NBD_FLAG_NO_ZEROES as u32;
        stream.write_all(&client_flags.to_be_bytes()).map_err(IosError::Io)?;

        stream.write_all(&NBD_IHAVEOPT.to_be_bytes()).map_err(IosError::Io)?;
        stream.write_all(&NBD_OPT_EXPORT_NAME.to_be_bytes()).map_err(IosError::Io)?;
        stream
            .write_all(&(export_name.len() as u32).to_be_bytes())
            .map_err(IosError::Io)?;
        stream.write_all(export_name.as_bytes()).map_err(IosError::Io)?;

        let mut size_buf = [0u8; 8];
        stream.read_exact(&mut size_buf).map_err(IosError::Io)?;
        let size = u64::from_be_bytes(size_buf);

        let mut transmission_flags = [0u8; 2];
        stream.read_exact(&mut transmission_flags).map_err(IosError::Io)?;
        let transmission_flags = u16::from_be_bytes(transmission_flags);

        if !no_zeroes {
            let mut zeroes = [0u8; 124];
            stream.read_exact(&mut zeroes).map_err(IosError::Io)?;
        }

        let export = Export {
            size,
            read_only: transmission_flags & NBD_FLAG_READ_ONLY != 0,
        };

        Ok((Session { stream, next_handle: 0 }, export))
    }

    fn handle(&mut self) -> u64 {
        self.next_handle = self.next_handle.wrapping_add(1);
        self.next_handle
    }

    fn send_request(&mut self, cmd: u16, offset: u64, length: u32, handle: u64) -> IosResult<()> {
        self.stream.write_all(&NBD_REQUEST_MAGIC.to_be_bytes()).map_err(IosError::Io)?;
        self.stream.write_all(&0u16.to_be_bytes()).map_err(IosError::Io)?; // command flags
        self.stream.write_all(&cmd.to_be_bytes()).map_err(IosError::Io)?;
        self.stream.write_all(&handle.to_be_bytes()).map_err(IosError::Io)?;
        self.stream.write_all(&offset.to_be_bytes()).map_err(IosError::Io)?;
        self.stream.write_all(&length.to_be_bytes()).map_err(IosError::Io)?;
        Ok(())
    }

    fn read_simple_reply(&mut self, expect_handle: u64) -> IosResult<()> {
        let mut magic = [0u8; 4];
        self.stream.read_exact(&mut magic).map_err(IosError::Io)?;
        if u32::from_be_bytes(magic) != NBD_SIMPLE_REPLY_MAGIC {
            return Err(IosError::Error("unexpected NBD reply magic"));
        }
        let mut error = [0u8; 4];
        self.stream.read_exact(&mut error).map_err(IosError::Io)?;
        let mut handle = [0u8; 8];
        self.stream.read_exact(&mut handle).map_err(IosError::Io)?;
        if u64::from_be_bytes(handle) != expect_handle {
            return Err(IosError::Error("unexpected NBD reply handle"));
        }
        if u32::from_be_bytes(error) != 0 {
            return Err(IosError::Eoff);
        }
        Ok(())
    }

    pub fn pread(&mut self, buf: &mut [u8], offset: u64) -> IosResult<()> {
        let handle = self.handle();
        self.send_request(NBD_CMD_READ, offset, buf.len() as u32, handle)?;
        self.read_simple_reply(handle)?;
        self.stream.read_exact(buf).map_err(IosError::Io)
    }

    pub fn pwrite(&mut self, buf: &[u8], offset: u64) -> IosResult<()> {
        let handle = self.handle();
        self.send_request(NBD_CMD_WRITE, offset, buf.len() as u32, handle)?;
        self.stream.write_all(buf).map_err(IosError::Io)?;
        self.read_simple_reply(handle)
    }

    pub fn disconnect(&mut self) -> IosResult<()> {
        let handle = self.handle();
        self.send_request(NBD_CMD_DISC, 0, 0, handle)
    }
}
