use bitflags::bitflags;

bitflags! {
    /// Face selection flags for [`FontDesc`](super::FontDesc).
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
    pub struct FontFlags: u32 {
        const BOLD   = 1 << 0;
        const ITALIC = 1 << 1;
    }
}

bitflags! {
    /// Alignment and effect flags for text drawing.
    ///
    /// The empty set draws left/top aligned with no effect.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
    pub struct TextFlags: u32 {
        const RIGHT       = 1 << 0;
        const CENTERED_X  = 1 << 1;
        const CENTERED_Y  = 1 << 2;
        const CENTERED    = Self::CENTERED_X.bits() | Self::CENTERED_Y.bits();
        const DROP_SHADOW = 1 << 3;
        const OUTLINE     = 1 << 4;
    }
}

impl TextFlags {
    /// True when the string must be measured before it is drawn.
    #[inline]
    pub fn needs_extent(self) -> bool {
        self.intersects(TextFlags::RIGHT | TextFlags::CENTERED)
    }
}
