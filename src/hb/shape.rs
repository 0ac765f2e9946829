//! Script engine dispatch and the shaping entry points.

use alloc::vec;
use alloc::vec::Vec;

use ttf_parser::GlyphId;

use super::common::{Script, ScriptItem, ShaperFlags};
use super::error::ShapeError;
use super::face::{hb_face_t, FontFuncs};
use super::glyph_attributes::{check_glyph_count, fill_glyph_attributes, GlyphAttributes};
use super::line_break::{fill_line_breaks, CharAttributes};
use super::ot_map::{select_script, BASIC_FEATURES};
use super::ot_shape::{ot_position, ot_shape, PositionOutcome};
use super::ot_shape_fallback::heuristic_position;
use super::unicode;

/// A shaping request: a script run inside a UTF-16 string.
#[derive(Clone, Copy, Debug)]
pub struct ShaperItem<'a> {
    /// The whole string. Runs index into it.
    pub string: &'a [u16],
    /// The run to shape.
    pub item: ScriptItem,
    /// Shaping flags.
    pub flags: ShaperFlags,
}

impl<'a> ShaperItem<'a> {
    /// Creates a new request with no flags set.
    #[inline]
    pub fn new(string: &'a [u16], item: ScriptItem) -> Self {
        ShaperItem {
            string,
            item,
            flags: ShaperFlags::empty(),
        }
    }

    /// Sets the shaping flags.
    #[inline]
    pub fn with_flags(mut self, flags: ShaperFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the code units of the run.
    ///
    /// Fails with [`ShapeError::InvalidRun`] when the run is outside of the string.
    pub fn text(&self) -> Result<&'a [u16], ShapeError> {
        run_text(self.string, &self.item)
    }

    /// Checks that the run is right-to-left.
    #[inline]
    pub fn is_rtl(&self) -> bool {
        self.item.is_rtl()
    }
}

fn run_text<'a>(string: &'a [u16], item: &ScriptItem) -> Result<&'a [u16], ShapeError> {
    let invalid = ShapeError::InvalidRun {
        pos: item.pos,
        end: item.pos.saturating_add(item.length),
        len: string.len(),
    };

    let end = item.pos.checked_add(item.length).ok_or(invalid)?;
    string.get(item.pos..end).ok_or(invalid)
}

/// Glyph placement relative to the pen position, in font units.
///
/// The y axis points down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlyphOffset {
    /// Horizontal offset.
    pub x: i32,
    /// Vertical offset.
    pub y: i32,
}

/// Caller-owned shaping output.
///
/// The glyph arrays have a fixed capacity. Shaping never writes past it:
/// when the result doesn't fit, shaping fails with
/// [`ShapeError::Capacity`], and the caller grows the output and retries.
#[derive(Clone, Debug, Default)]
pub struct ShapeOutput {
    pub(crate) glyphs: Vec<GlyphId>,
    pub(crate) attributes: Vec<GlyphAttributes>,
    pub(crate) advances: Vec<i32>,
    pub(crate) offsets: Vec<GlyphOffset>,
    pub(crate) log_clusters: Vec<u32>,
    pub(crate) num_glyphs: usize,
    pub(crate) num_chars: usize,
    pub(crate) kerning_applied: bool,
}

impl ShapeOutput {
    /// Creates an output able to hold `capacity` glyphs and a run of
    /// `capacity` code units.
    pub fn with_capacity(capacity: usize) -> Self {
        ShapeOutput {
            glyphs: vec![GlyphId(0); capacity],
            attributes: vec![GlyphAttributes::default(); capacity],
            advances: vec![0; capacity],
            offsets: vec![GlyphOffset::default(); capacity],
            log_clusters: vec![0; capacity],
            num_glyphs: 0,
            num_chars: 0,
            kerning_applied: false,
        }
    }

    /// Glyph capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.glyphs.len()
    }

    /// Grows the output to hold at least `required` glyphs.
    ///
    /// Never shrinks. Shaped data is kept.
    pub fn grow(&mut self, required: usize) {
        if required <= self.capacity() {
            return;
        }

        self.glyphs.resize(required, GlyphId(0));
        self.attributes.resize(required, GlyphAttributes::default());
        self.advances.resize(required, 0);
        self.offsets.resize(required, GlyphOffset::default());
        self.log_clusters.resize(required, 0);
    }

    /// Number of shaped glyphs.
    #[inline]
    pub fn num_glyphs(&self) -> usize {
        self.num_glyphs
    }

    /// Sets the number of shaped glyphs, clamped to the capacity.
    ///
    /// Used by custom shapers.
    #[inline]
    pub fn set_num_glyphs(&mut self, num_glyphs: usize) {
        self.num_glyphs = num_glyphs.min(self.capacity());
    }

    /// Shaped glyphs.
    #[inline]
    pub fn glyphs(&self) -> &[GlyphId] {
        &self.glyphs[..self.num_glyphs]
    }

    /// Attributes of the shaped glyphs.
    #[inline]
    pub fn attributes(&self) -> &[GlyphAttributes] {
        &self.attributes[..self.num_glyphs]
    }

    /// Horizontal advances of the shaped glyphs. Negative in right-to-left
    /// runs when set by GPOS.
    #[inline]
    pub fn advances(&self) -> &[i32] {
        &self.advances[..self.num_glyphs]
    }

    /// Offsets of the shaped glyphs.
    #[inline]
    pub fn offsets(&self) -> &[GlyphOffset] {
        &self.offsets[..self.num_glyphs]
    }

    /// Maps each code unit of the run to the first glyph of its cluster.
    #[inline]
    pub fn log_clusters(&self) -> &[u32] {
        &self.log_clusters[..self.num_chars]
    }

    /// Mutable cluster map of the run.
    #[inline]
    pub fn log_clusters_mut(&mut self) -> &mut [u32] {
        &mut self.log_clusters[..self.num_chars]
    }

    /// Checks that OpenType kerning was applied.
    #[inline]
    pub fn kerning_applied(&self) -> bool {
        self.kerning_applied
    }

    /// Sets the OpenType kerning flag. Used by custom shapers.
    #[inline]
    pub fn set_kerning_applied(&mut self, applied: bool) {
        self.kerning_applied = applied;
    }

    /// Mutable view of the shaped glyphs.
    pub fn run_mut(&mut self) -> GlyphRun<'_> {
        let n = self.num_glyphs;
        GlyphRun {
            glyphs: &mut self.glyphs[..n],
            attributes: &mut self.attributes[..n],
            advances: &mut self.advances[..n],
            offsets: &mut self.offsets[..n],
        }
    }

    // Copies everything into `dst`, reusing its allocations.
    pub(crate) fn save_to(&self, dst: &mut ShapeOutput) {
        dst.glyphs.clone_from(&self.glyphs);
        dst.attributes.clone_from(&self.attributes);
        dst.advances.clone_from(&self.advances);
        dst.offsets.clone_from(&self.offsets);
        dst.log_clusters.clone_from(&self.log_clusters);
        dst.num_glyphs = self.num_glyphs;
        dst.num_chars = self.num_chars;
        dst.kerning_applied = self.kerning_applied;
    }

    // Starts a run of `num_chars` code units.
    pub(crate) fn reset(&mut self, num_chars: usize) {
        debug_assert!(num_chars <= self.capacity());
        self.num_glyphs = 0;
        self.num_chars = num_chars;
        self.kerning_applied = false;
    }
}

/// Mutable view of shaped glyphs, all slices having the same length.
#[derive(Debug)]
pub struct GlyphRun<'a> {
    /// Glyphs.
    pub glyphs: &'a mut [GlyphId],
    /// Glyph attributes.
    pub attributes: &'a mut [GlyphAttributes],
    /// Horizontal advances.
    pub advances: &'a mut [i32],
    /// Glyph offsets.
    pub offsets: &'a mut [GlyphOffset],
}

impl GlyphRun<'_> {
    /// Number of glyphs.
    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Checks that the run has no glyphs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// A script shaping function.
///
/// Gets an output that can hold at least one glyph per code unit of the run.
pub type ShapeFunc = fn(&mut hb_face_t, &ShaperItem, &mut ShapeOutput) -> Result<(), ShapeError>;

/// Tailors the line breaking attributes of a run.
///
/// Gets the whole string, the run and the attributes of the whole string.
pub type AttributesFunc = fn(Script, &[u16], &ScriptItem, &mut [CharAttributes]);

/// How a script is shaped.
#[derive(Clone, Copy, Debug, Default)]
pub enum ScriptShaper {
    /// The default shaper: heuristic attributes, OpenType when the face
    /// supports the script and heuristic mark positioning otherwise.
    #[default]
    Basic,
    /// A script specific shaper.
    Custom(ShapeFunc),
}

/// Shaping capabilities of a script.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptEngine {
    /// The shaper.
    pub shaper: ScriptShaper,
    /// Line breaking tailoring, if any.
    pub char_attributes: Option<AttributesFunc>,
}

/// A script engine per script.
///
/// `Inherited` shares the `Common` engine.
#[derive(Clone, Debug)]
pub struct ScriptEngines {
    engines: [ScriptEngine; Script::COUNT],
}

impl Default for ScriptEngines {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngines {
    /// Creates a registry with the basic shaper for every script.
    pub const fn new() -> Self {
        ScriptEngines {
            engines: [ScriptEngine {
                shaper: ScriptShaper::Basic,
                char_attributes: None,
            }; Script::COUNT],
        }
    }

    /// Registers the engine of a script.
    pub fn register(&mut self, script: Script, engine: ScriptEngine) {
        self.engines[script.index()] = engine;
    }

    /// Returns the engine of a script.
    #[inline]
    pub fn get(&self, script: Script) -> &ScriptEngine {
        &self.engines[script.index()]
    }
}

static DEFAULT_ENGINES: ScriptEngines = ScriptEngines::new();

/// Shapes a run with the basic shaper of every script.
pub fn shape(
    face: &mut hb_face_t,
    item: &ShaperItem,
    output: &mut ShapeOutput,
) -> Result<(), ShapeError> {
    shape_item(face, &DEFAULT_ENGINES, item, output)
}

/// Shapes a run with the engine registered for its script.
///
/// The output must hold at least one glyph per code unit of the run,
/// otherwise [`ShapeError::Capacity`] is returned. Shapers may need more
/// room than that, in which case the same error is reported once the
/// shaped size is known. On any error the output is left as it was.
pub fn shape_item(
    face: &mut hb_face_t,
    engines: &ScriptEngines,
    item: &ShaperItem,
    output: &mut ShapeOutput,
) -> Result<(), ShapeError> {
    let text = item.text()?;

    if output.capacity() < text.len() {
        return Err(ShapeError::Capacity {
            required: text.len(),
        });
    }

    if text.is_empty() {
        output.reset(0);
        return Ok(());
    }

    output.save_to(&mut face.saved_output);
    output.reset(text.len());

    let result = match engines.get(item.item.script).shaper {
        ScriptShaper::Basic => basic_shape(face, item, output),
        ScriptShaper::Custom(f) => f(face, item, output),
    };

    if let Err(ref e) = result {
        log::debug!("shape_item: {}, output restored", e);
        core::mem::swap(output, &mut face.saved_output);
    }

    result
}

/// The default shaper.
pub fn basic_shape(
    face: &mut hb_face_t,
    item: &ShaperItem,
    output: &mut ShapeOutput,
) -> Result<(), ShapeError> {
    let text = item.text()?;
    let script = item.item.script;

    string_to_glyphs(face.font(), item, output)?;

    let num_glyphs = output.num_glyphs;
    check_glyph_count(text, num_glyphs)?;
    fill_glyph_attributes(
        text,
        face.is_symbol_font(),
        &mut output.attributes[..num_glyphs],
        &mut output.log_clusters[..text.len()],
    );

    if select_script(face, script, item.flags, BASIC_FEATURES) {
        ot_shape(face, item, output, None)?;
        if ot_position(face, item, output, true)? == PositionOutcome::Applied {
            return Ok(());
        }
    }

    heuristic_position(face.font(), output.run_mut(), script, item.flags, item.is_rtl());
    Ok(())
}

/// Maps the run to glyphs, one glyph per code point.
///
/// Characters are mirrored in right-to-left runs. Unmapped characters get
/// glyph 0. Also sets the number of glyphs and the cluster map size.
pub fn string_to_glyphs(
    font: &dyn FontFuncs,
    item: &ShaperItem,
    output: &mut ShapeOutput,
) -> Result<(), ShapeError> {
    let text = item.text()?;

    let required = unicode::code_points(text).count();
    if output.capacity() < required || output.capacity() < text.len() {
        return Err(ShapeError::Capacity {
            required: required.max(text.len()),
        });
    }

    let rtl = item.is_rtl();
    for (glyph, (_, u)) in output.glyphs.iter_mut().zip(unicode::code_points(text)) {
        let u = if rtl { unicode::mirrored(u) } else { u };
        *glyph = font.glyph_index(u).unwrap_or_default();
    }

    output.num_glyphs = required;
    output.num_chars = text.len();
    Ok(())
}

/// Computes the line breaking attributes of a string with the default engines.
pub fn char_attributes(text: &[u16], items: &[ScriptItem]) -> Result<Vec<CharAttributes>, ShapeError> {
    char_attributes_with(text, items, &DEFAULT_ENGINES)
}

/// Computes the line breaking attributes of a string, then lets the engine
/// of each run tailor them.
pub fn char_attributes_with(
    text: &[u16],
    items: &[ScriptItem],
    engines: &ScriptEngines,
) -> Result<Vec<CharAttributes>, ShapeError> {
    for item in items {
        run_text(text, item)?;
    }

    let mut attributes = vec![CharAttributes::default(); text.len()];
    fill_line_breaks(text, &mut attributes);

    for item in items {
        let script = item.script.resolve();
        if let Some(f) = engines.get(script).char_attributes {
            f(script, text, item, &mut attributes);
        }
    }

    Ok(attributes)
}
