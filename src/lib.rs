//! A bit-addressable IO layer: open a handler (`*tag*`, a file path, or an
//! `nbd://` URI) as a [`Space`], then read and write integers and strings
//! at arbitrary bit offsets and alignments against it through a
//! [`Registry`].

pub mod codec;
pub mod device;
pub mod error;
pub mod flags;
pub mod global;
pub mod registry;
pub mod space;
pub mod types;

pub use error::{IosError, IosResult};
pub use flags::IosFlags;
pub use registry::Registry;
pub use space::Space;
pub use types::{Endian, IosOff, NegEncoding};
