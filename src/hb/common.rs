use core::ops::Range;

use bitflags::bitflags;

/// A script supported by the shaper.
///
/// The order of variants is fixed: it indexes the script engine registry
/// and the OpenType script tag table.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Script {
    #[default]
    Common = 0,
    Greek,
    Cyrillic,
    Armenian,
    Hebrew,
    Arabic,
    Syriac,
    Thaana,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Oriya,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Sinhala,
    Thai,
    Lao,
    Tibetan,
    Myanmar,
    Georgian,
    Hangul,
    Ogham,
    Runic,
    Khmer,
    /// Combining characters inheriting the script of their base.
    ///
    /// Treated as `Common` by every lookup.
    Inherited,
}

impl Script {
    /// The number of shapeable scripts, `Inherited` excluded.
    pub const COUNT: usize = Script::Inherited as usize;

    /// Every shapeable script, in registry order.
    pub const ALL: [Script; Script::COUNT] = [
        Script::Common,
        Script::Greek,
        Script::Cyrillic,
        Script::Armenian,
        Script::Hebrew,
        Script::Arabic,
        Script::Syriac,
        Script::Thaana,
        Script::Devanagari,
        Script::Bengali,
        Script::Gurmukhi,
        Script::Gujarati,
        Script::Oriya,
        Script::Tamil,
        Script::Telugu,
        Script::Kannada,
        Script::Malayalam,
        Script::Sinhala,
        Script::Thai,
        Script::Lao,
        Script::Tibetan,
        Script::Myanmar,
        Script::Georgian,
        Script::Hangul,
        Script::Ogham,
        Script::Runic,
        Script::Khmer,
    ];

    /// Returns the script with `Inherited` resolved to `Common`.
    #[inline]
    pub fn resolve(self) -> Script {
        match self {
            Script::Inherited => Script::Common,
            s => s,
        }
    }

    /// Index into per-script tables. Always less than [`Script::COUNT`].
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.resolve() as usize
    }

    /// Returns the script of a character.
    ///
    /// Scripts the shaper has no dedicated entry for are reported as `Common`.
    pub fn from_char(c: char) -> Script {
        use unicode_script as us;
        use unicode_script::UnicodeScript;

        match c.script() {
            us::Script::Greek => Script::Greek,
            us::Script::Cyrillic => Script::Cyrillic,
            us::Script::Armenian => Script::Armenian,
            us::Script::Hebrew => Script::Hebrew,
            us::Script::Arabic => Script::Arabic,
            us::Script::Syriac => Script::Syriac,
            us::Script::Thaana => Script::Thaana,
            us::Script::Devanagari => Script::Devanagari,
            us::Script::Bengali => Script::Bengali,
            us::Script::Gurmukhi => Script::Gurmukhi,
            us::Script::Gujarati => Script::Gujarati,
            us::Script::Oriya => Script::Oriya,
            us::Script::Tamil => Script::Tamil,
            us::Script::Telugu => Script::Telugu,
            us::Script::Kannada => Script::Kannada,
            us::Script::Malayalam => Script::Malayalam,
            us::Script::Sinhala => Script::Sinhala,
            us::Script::Thai => Script::Thai,
            us::Script::Lao => Script::Lao,
            us::Script::Tibetan => Script::Tibetan,
            us::Script::Myanmar => Script::Myanmar,
            us::Script::Georgian => Script::Georgian,
            us::Script::Hangul => Script::Hangul,
            us::Script::Ogham => Script::Ogham,
            us::Script::Runic => Script::Runic,
            us::Script::Khmer => Script::Khmer,
            us::Script::Inherited => Script::Inherited,
            _ => Script::Common,
        }
    }
}

/// A script run: a slice of the input string sharing one script and bidi level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScriptItem {
    /// Start of the run, in UTF-16 code units.
    pub pos: usize,
    /// Length of the run, in UTF-16 code units.
    pub length: usize,
    /// Script of the run.
    pub script: Script,
    /// Bidi embedding level. Odd levels are right-to-left.
    pub bidi_level: u8,
}

impl ScriptItem {
    /// Creates a new run descriptor.
    #[inline]
    pub fn new(pos: usize, length: usize, script: Script, bidi_level: u8) -> Self {
        ScriptItem {
            pos,
            length,
            script,
            bidi_level,
        }
    }

    /// Checks that the run is right-to-left.
    #[inline]
    pub fn is_rtl(&self) -> bool {
        self.bidi_level % 2 == 1
    }

    /// The code unit range covered by the run.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.pos..self.pos + self.length
    }
}

bitflags! {
    /// Flags controlling a shaping call.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ShaperFlags: u32 {
        /// Do not activate the OpenType `kern` feature.
        const NO_KERNING = 0x01;
        /// Request unhinted design metrics from the font.
        const USE_DESIGN_METRICS = 0x02;
    }
}
