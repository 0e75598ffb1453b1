//! An open IO space: a device plus the bias applied to every offset passed
//! through it.

use crate::device::{Backend, Device};
use crate::error::IosResult;
use crate::flags::IosFlags;
use crate::types::IosOff;

/// One entry in a [`Registry`](crate::registry::Registry): a handler, the
/// device backing it, and the bias applied to offsets addressed against it.
pub struct Space {
    id: u32,
    handler: String,
    bias: IosOff,
    dev: Backend,
}

impl Space {
    pub(crate) fn new(id: u32, handler: String, dev: Backend) -> Self {
        Space {
            id,
            handler,
            bias: 0,
            dev,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn bias(&self) -> IosOff {
        self.bias
    }

    pub fn set_bias(&mut self, bias: IosOff) {
        self.bias = bias;
    }

    pub fn flags(&self) -> IosFlags {
        self.dev.flags()
    }

    /// Size of the space, in bits.
    pub fn size_bits(&self) -> IosResult<IosOff> {
        Ok(self.dev.size()? as IosOff * 8)
    }

    pub(crate) fn device(&mut self) -> &mut dyn Device {
        &mut self.dev
    }
}
