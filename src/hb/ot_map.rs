//! OpenType script and feature selection.

use bitflags::bitflags;
use ttf_parser::opentype_layout::ScriptIndex;

use super::common::{Script, ShaperFlags};
use super::face::hb_face_t;
use super::hb_tag_t;
use super::ot_layout::{LayoutTable, PositioningTable, SubstitutionTable};

bitflags! {
    /// Layout tables a script needs to be shaped with OpenType.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RequiredTables: u8 {
        /// A GSUB table with the script.
        const GSUB = 0x01;
        /// A GPOS table with the script.
        const GPOS = 0x02;
    }
}

/// The default script tag.
pub const DEFAULT_SCRIPT: hb_tag_t = hb_tag_t::from_bytes(b"DFLT");

const KERN: hb_tag_t = hb_tag_t::from_bytes(b"kern");

/// Property bit of the basic substitution features.
pub const CCMP_PROPERTY: u32 = 0x0000_0001;

/// Property bit of every positioning feature.
pub const POSITIONING_PROPERTIES: u32 = 0x8000_0000;

/// A substitution feature to activate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OpenTypeFeature {
    /// Feature tag.
    pub tag: hb_tag_t,
    /// Property bits of the feature. Glyphs that have all of them set are
    /// skipped, so a feature without properties never applies.
    pub property: u32,
}

impl OpenTypeFeature {
    /// Creates a new feature.
    pub const fn new(tag: &[u8; 4], property: u32) -> Self {
        OpenTypeFeature {
            tag: hb_tag_t::from_bytes(tag),
            property,
        }
    }
}

/// Features applied by the default shaper.
pub const BASIC_FEATURES: &[OpenTypeFeature] = &[
    OpenTypeFeature::new(b"ccmp", CCMP_PROPERTY),
    OpenTypeFeature::new(b"liga", CCMP_PROPERTY),
    OpenTypeFeature::new(b"clig", CCMP_PROPERTY),
];

struct ScriptRecord {
    tag: hb_tag_t,
    requires: RequiredTables,
}

const fn record(tag: &[u8; 4], requires: RequiredTables) -> ScriptRecord {
    ScriptRecord {
        tag: hb_tag_t::from_bytes(tag),
        requires,
    }
}

const NONE: RequiredTables = RequiredTables::empty();
const GSUB: RequiredTables = RequiredTables::GSUB;

// Indexed by `Script`.
static SCRIPTS: [ScriptRecord; Script::COUNT] = [
    record(b"latn", NONE), // Common
    record(b"grek", NONE),
    record(b"cyrl", NONE),
    record(b"armn", NONE),
    record(b"hebr", GSUB),
    record(b"arab", GSUB),
    record(b"syrc", GSUB),
    record(b"thaa", GSUB),
    record(b"deva", GSUB),
    record(b"beng", GSUB),
    record(b"guru", GSUB),
    record(b"gujr", GSUB),
    record(b"orya", GSUB),
    record(b"taml", GSUB),
    record(b"telu", GSUB),
    record(b"knda", GSUB),
    record(b"mlym", GSUB),
    record(b"sinh", GSUB),
    record(b"thai", GSUB),
    record(b"lao ", GSUB),
    record(b"tibt", GSUB),
    record(b"mymr", GSUB),
    record(b"geor", NONE),
    record(b"hang", GSUB),
    record(b"ogam", NONE),
    record(b"runr", NONE),
    record(b"khmr", GSUB),
];

/// OpenType tag of a script.
pub fn script_tag(script: Script) -> hb_tag_t {
    SCRIPTS[script.index()].tag
}

/// Layout tables a script needs.
pub fn required_tables(script: Script) -> RequiredTables {
    SCRIPTS[script.index()].requires
}

fn find_script<T: LayoutTable + ?Sized>(table: &T, tag: hb_tag_t) -> Option<ScriptIndex> {
    table
        .select_script(tag)
        .or_else(|| table.select_script(DEFAULT_SCRIPT))
}

/// Checks that the layout tables can shape `script`.
pub(crate) fn check_script(
    gsub: Option<&dyn SubstitutionTable>,
    gpos: Option<&dyn PositioningTable>,
    script: Script,
) -> bool {
    let record = &SCRIPTS[script.index()];

    if record.requires.contains(RequiredTables::GSUB) {
        match gsub {
            Some(gsub) if find_script(gsub, record.tag).is_some() => {}
            _ => return false,
        }
    }

    if record.requires.contains(RequiredTables::GPOS) {
        match gpos {
            Some(gpos) if find_script(gpos, record.tag).is_some() => {}
            _ => return false,
        }
    }

    true
}

/// Selects the OpenType features used to shape `script` with `flags`.
///
/// `features` are looked up in GSUB, in order; absent ones are skipped.
/// Every GPOS feature of the script is activated, except `kern` when
/// kerning is disabled. The selection is cached per face, so selecting the
/// same script and flags again does nothing.
///
/// Returns `false` when the face can't shape the script with OpenType.
pub fn select_script(
    face: &mut hb_face_t,
    script: Script,
    flags: ShaperFlags,
    features: &[OpenTypeFeature],
) -> bool {
    let script = script.resolve();

    if !face.supports_script(script) {
        return false;
    }

    if face.current == Some((script, flags)) {
        return true;
    }

    face.current = Some((script, flags));
    let tag = script_tag(script);

    if let Some(gsub) = face.gsub.as_deref() {
        face.gsub_features.clear();
        match find_script(gsub, tag) {
            Some(script_index) => {
                for feature in features {
                    if let Some(index) = gsub.find_feature(script_index, feature.tag) {
                        log::debug!("GSUB: adding feature {}", feature.tag);
                        face.gsub_features.push((index, feature.property));
                    }
                }
            }
            None => log::debug!("GSUB: no script {}", tag),
        }
    }

    face.has_opentype_kerning = false;

    if let Some(gpos) = face.gpos.as_deref() {
        face.gpos_features.clear();
        if let Some(script_index) = find_script(gpos, tag) {
            for feature_tag in gpos.script_features(script_index) {
                if feature_tag == KERN {
                    if flags.contains(ShaperFlags::NO_KERNING) {
                        continue;
                    }
                    face.has_opentype_kerning = true;
                }

                if let Some(index) = gpos.find_feature(script_index, feature_tag) {
                    log::debug!("GPOS: adding feature {}", feature_tag);
                    face.gpos_features.push((index, POSITIONING_PROPERTIES));
                }
            }
        }
    }

    true
}
