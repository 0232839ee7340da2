//! Frame descriptor encoding and validation.
//!
//! A frame starts with two packed descriptor bytes:
//!
//! ```text
//! FLG  bit 0:    Preset_Dictionary_flag (rejected)
//!      bit 1:    Reserved (must be 0)
//!      bit 2:    Stream_Checksum_flag
//!      bit 3:    Stream_Size_flag
//!      bit 4:    Block_Checksum_flag
//!      bit 5:    Block_Independence_flag (must be 1)
//!      bits 6-7: Version_Number (must be 1)
//!
//! BD   bits 0-3: Reserved (must be 0)
//!      bits 4-6: Block_Maximum_Size (4..=7)
//!      bit 7:    Reserved (must be 0)
//! ```

use serde::{Deserialize, Serialize};

use seere_core::{Error, Result};

/// Parsed FLG byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameFlags {
    /// The frame was built against a preset dictionary. Unsupported.
    pub preset_dictionary: bool,
    /// Reserved bit 1, must be zero.
    pub reserved1: u8,
    /// A 32-bit stream checksum follows the end-of-stream marker.
    pub stream_checksum: bool,
    /// A 64-bit uncompressed size follows the descriptor.
    pub stream_size: bool,
    /// Every block carries a 32-bit checksum trailer.
    pub block_checksum: bool,
    /// Blocks are independently compressed. Dependence is unsupported.
    pub block_independence: bool,
    /// Format version, must be 1.
    pub version_number: u8,
}

impl FrameFlags {
    /// Pack into the wire FLG byte.
    pub fn to_byte(self) -> u8 {
        (self.preset_dictionary as u8)
            | ((self.reserved1 & 1) << 1)
            | ((self.stream_checksum as u8) << 2)
            | ((self.stream_size as u8) << 3)
            | ((self.block_checksum as u8) << 4)
            | ((self.block_independence as u8) << 5)
            | ((self.version_number & 3) << 6)
    }

    /// Unpack from the wire FLG byte.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            preset_dictionary: byte & 1 != 0,
            reserved1: (byte >> 1) & 1,
            stream_checksum: (byte >> 2) & 1 != 0,
            stream_size: (byte >> 3) & 1 != 0,
            block_checksum: (byte >> 4) & 1 != 0,
            block_independence: (byte >> 5) & 1 != 0,
            version_number: (byte >> 6) & 3,
        }
    }
}

/// Parsed BD byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// Reserved low nibble, must be zero.
    pub reserved3: u8,
    /// Block-maximum-size id, valid range 4..=7.
    pub block_maximum_size: u8,
    /// Reserved high bit, must be zero.
    pub reserved2: u8,
}

impl BlockDescriptor {
    /// Pack into the wire BD byte.
    pub fn to_byte(self) -> u8 {
        (self.reserved3 & 15) | ((self.block_maximum_size & 7) << 4) | ((self.reserved2 & 1) << 7)
    }

    /// Unpack from the wire BD byte.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            reserved3: byte & 15,
            block_maximum_size: (byte >> 4) & 7,
            reserved2: (byte >> 7) & 1,
        }
    }

    /// Block byte size for this id: `1 << (8 + 2 * id)`.
    ///
    /// Only meaningful for a validated descriptor (id in 4..=7, giving
    /// 64 KiB, 256 KiB, 1 MiB, 4 MiB).
    pub fn block_size_bytes(&self) -> usize {
        debug_assert!((4..=7).contains(&self.block_maximum_size));
        1 << (8 + 2 * self.block_maximum_size as usize)
    }
}

/// Complete stream descriptor: packed flags plus the optional fields
/// that follow them on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Parsed FLG byte.
    pub flags: FrameFlags,
    /// Parsed BD byte.
    pub bd: BlockDescriptor,
    /// Uncompressed stream size, present iff `flags.stream_size`.
    pub stream_size: Option<u64>,
    /// Dictionary id, reserved: `flags.preset_dictionary` is rejected.
    pub dict_id: Option<u32>,
}

impl StreamDescriptor {
    /// Descriptor defaults: version 1, independent blocks, stream
    /// checksum on, 4 MiB blocks, everything else off.
    pub fn new() -> Self {
        Self {
            flags: FrameFlags {
                preset_dictionary: false,
                reserved1: 0,
                stream_checksum: true,
                stream_size: false,
                block_checksum: false,
                block_independence: true,
                version_number: 1,
            },
            bd: BlockDescriptor {
                reserved3: 0,
                block_maximum_size: DEFAULT_BLOCK_MAXIMUM_SIZE,
                reserved2: 0,
            },
            stream_size: None,
            dict_id: None,
        }
    }

    /// Select the block-maximum-size id (4..=7).
    pub fn with_block_maximum_size(mut self, id: u8) -> Self {
        self.bd.block_maximum_size = id;
        self
    }

    /// Enable or disable per-block checksum trailers.
    pub fn with_block_checksum(mut self, enabled: bool) -> Self {
        self.flags.block_checksum = enabled;
        self
    }

    /// Enable or disable the trailing stream checksum.
    pub fn with_stream_checksum(mut self, enabled: bool) -> Self {
        self.flags.stream_checksum = enabled;
        self
    }

    /// Declare the uncompressed stream size in the header.
    pub fn with_stream_size(mut self, size: u64) -> Self {
        self.flags.stream_size = true;
        self.stream_size = Some(size);
        self
    }

    /// Validate the descriptor, in the order mismatches are reported.
    pub fn validate(&self) -> Result<()> {
        if self.flags.version_number != 1 {
            return Err(Error::InvalidVersion(self.flags.version_number));
        }
        if self.flags.preset_dictionary {
            return Err(Error::PresetDictionaryUnsupported);
        }
        if self.flags.reserved1 != 0 {
            return Err(Error::InvalidHeader);
        }
        if !self.flags.block_independence {
            return Err(Error::BlockDependenceUnsupported);
        }
        if !(4..=7).contains(&self.bd.block_maximum_size) {
            return Err(Error::InvalidBlockMaximumSize(self.bd.block_maximum_size));
        }
        if self.bd.reserved3 != 0 {
            return Err(Error::InvalidHeader);
        }
        if self.bd.reserved2 != 0 {
            return Err(Error::InvalidHeader);
        }
        Ok(())
    }

    /// Block byte size selected by the BD field.
    pub fn block_size_bytes(&self) -> usize {
        self.bd.block_size_bytes()
    }
}

impl Default for StreamDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

/// Default block-maximum-size id (4 MiB blocks).
pub const DEFAULT_BLOCK_MAXIMUM_SIZE: u8 = 7;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_pack_unpack_closure() {
        for byte in 0..=255u8 {
            assert_eq!(FrameFlags::from_byte(byte).to_byte(), byte);
        }
    }

    #[test]
    fn test_bd_pack_unpack_closure() {
        for byte in 0..=255u8 {
            assert_eq!(BlockDescriptor::from_byte(byte).to_byte(), byte);
        }
    }

    #[test]
    fn test_flag_bit_positions() {
        let flags = FrameFlags::from_byte(0b0110_0100);
        assert_eq!(flags.version_number, 1);
        assert!(flags.block_independence);
        assert!(flags.stream_checksum);
        assert!(!flags.block_checksum);
        assert!(!flags.stream_size);
        assert!(!flags.preset_dictionary);
        assert_eq!(flags.reserved1, 0);
    }

    #[test]
    fn test_default_descriptor_bytes() {
        let sd = StreamDescriptor::new();
        // version=1, independence, stream checksum.
        assert_eq!(sd.flags.to_byte(), 0b0110_0100);
        // 4 MiB blocks.
        assert_eq!(sd.bd.to_byte(), 0b0111_0000);
        assert!(sd.validate().is_ok());
    }

    #[test]
    fn test_block_sizes() {
        let sizes = [(4u8, 64 << 10), (5, 256 << 10), (6, 1 << 20), (7, 4 << 20)];
        for (id, bytes) in sizes {
            let sd = StreamDescriptor::new().with_block_maximum_size(id);
            assert_eq!(sd.block_size_bytes(), bytes);
        }
    }

    #[test]
    fn test_validate_version() {
        let mut sd = StreamDescriptor::new();
        sd.flags.version_number = 2;
        assert_eq!(sd.validate(), Err(Error::InvalidVersion(2)));
    }

    #[test]
    fn test_validate_preset_dictionary() {
        let mut sd = StreamDescriptor::new();
        sd.flags.preset_dictionary = true;
        assert_eq!(sd.validate(), Err(Error::PresetDictionaryUnsupported));
    }

    #[test]
    fn test_validate_block_dependence() {
        let mut sd = StreamDescriptor::new();
        sd.flags.block_independence = false;
        assert_eq!(sd.validate(), Err(Error::BlockDependenceUnsupported));
    }

    #[test]
    fn test_validate_block_maximum_size_range() {
        for id in [0u8, 1, 2, 3] {
            let sd = StreamDescriptor::new().with_block_maximum_size(id);
            assert_eq!(sd.validate(), Err(Error::InvalidBlockMaximumSize(id)));
        }
    }

    #[test]
    fn test_validate_reserved_bits() {
        let mut sd = StreamDescriptor::new();
        sd.flags.reserved1 = 1;
        assert_eq!(sd.validate(), Err(Error::InvalidHeader));

        let mut sd = StreamDescriptor::new();
        sd.bd.reserved2 = 1;
        assert_eq!(sd.validate(), Err(Error::InvalidHeader));

        let mut sd = StreamDescriptor::new();
        sd.bd.reserved3 = 5;
        assert_eq!(sd.validate(), Err(Error::InvalidHeader));
    }

    #[test]
    fn test_with_stream_size_sets_flag() {
        let sd = StreamDescriptor::new().with_stream_size(123456);
        assert!(sd.flags.stream_size);
        assert_eq!(sd.stream_size, Some(123456));
        assert!(sd.validate().is_ok());
    }
}
