//! Access rights bitfield.

use bitflags::bitflags;

bitflags! {
    /// Set of rights granted or denied by an access-control entry.
    ///
    /// Union is bitwise OR. An empty mask grants nothing. Bits without a
    /// name here are retained as-is, so object-specific rights pass through
    /// unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct AccessMask: u32 {
        const GENERIC_READ = 0x8000_0000;
        const GENERIC_WRITE = 0x4000_0000;
        const GENERIC_EXECUTE = 0x2000_0000;
        const GENERIC_ALL = 0x1000_0000;

        const DELETE = 0x0001_0000;
        const READ_CONTROL = 0x0002_0000;
        const WRITE_DAC = 0x0004_0000;
        const WRITE_OWNER = 0x0008_0000;
        const SYNCHRONIZE = 0x0010_0000;

        const STANDARD_RIGHTS_REQUIRED = 0x000F_0000;

        /// Every file-specific right plus the standard rights ("full control").
        const FILE_ALL_ACCESS = 0x001F_01FF;

        const _ = !0;
    }
}

impl AccessMask {
    /// Creates a mask from raw bits, keeping unnamed bits.
    #[must_use]
    pub const fn from_raw(bits: u32) -> Self {
        Self::from_bits_retain(bits)
    }

    /// Returns true if this mask grants read, write and execute in generic form.
    #[must_use]
    pub fn is_generic_rwx(&self) -> bool {
        self.contains(Self::GENERIC_READ | Self::GENERIC_WRITE | Self::GENERIC_EXECUTE)
    }
}
