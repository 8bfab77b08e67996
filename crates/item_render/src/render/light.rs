//! Packed light and overlay coordinates

/// Block and sky light packed into one lightmap coordinate
///
/// Block light lives in bits 4..8, sky light in bits 20..24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedLight(pub u32);

impl PackedLight {
    /// Maximum light level for either channel
    pub const MAX_LEVEL: u8 = 15;

    /// Full block and sky light
    pub const FULL_BRIGHT: Self = Self::pack(Self::MAX_LEVEL, Self::MAX_LEVEL);

    /// Pack block and sky light, clamping each to `MAX_LEVEL`
    pub const fn pack(block: u8, sky: u8) -> Self {
        let block = if block > Self::MAX_LEVEL { Self::MAX_LEVEL } else { block };
        let sky = if sky > Self::MAX_LEVEL { Self::MAX_LEVEL } else { sky };
        Self(((block as u32) << 4) | ((sky as u32) << 20))
    }

    /// Block light level
    pub const fn block(self) -> u8 {
        ((self.0 >> 4) & 0xF) as u8
    }

    /// Sky light level
    pub const fn sky(self) -> u8 {
        ((self.0 >> 20) & 0xF) as u8
    }
}

/// Overlay texture coordinates (hurt flash / white flash)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayCoords(pub u32);

impl OverlayCoords {
    /// No overlay tint
    pub const DEFAULT: Self = Self::pack(0, 10);

    /// Pack `u` into the low half and `v` into the high half
    pub const fn pack(u: u16, v: u16) -> Self {
        Self((u as u32) | ((v as u32) << 16))
    }

    /// Horizontal overlay coordinate
    pub const fn u(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Vertical overlay coordinate
    pub const fn v(self) -> u16 {
        (self.0 >> 16) as u16
    }
}

impl Default for OverlayCoords {
    fn default() -> Self {
        Self::DEFAULT
    }
}
