
use std::cell::Cell;

use harfshape::{
    Face, LayoutError, PositionOutcome, Script, ScriptEngine, ScriptEngines, ScriptItem,
    ScriptShaper, ShapeError, ShapeOutput, ShaperFlags, ShaperItem, BASIC_FEATURES,
};
use shaping_impl::{face, gpos, gsub, shape, MockFont, Rule};

#[test]
fn ligature() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    assert_eq!(shape(&mut face, "fi", ""), "64257+500 [0,0]");
    assert_eq!(shape(&mut face, "afib", ""), "97+500|64257+500|98+500 [0,1,1,2]");
}

#[test]
#[should_panic(expected = "unused arguments")]
fn unknown_option() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    shape(&mut face, "fi", "--no-ligatures");
}

#[test]
fn ligature_after_surrogate_pair() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    assert_eq!(
        shape(&mut face, "a\u{1F600}fi", ""),
        "97+500|0+500|64257+500 [0,1,1,2,2]"
    );
}

#[test]
fn multiple_substitution_needs_more_room() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);

    let text: Vec<u16> = "xx".encode_utf16().collect();
    let item = ShaperItem::new(&text, ScriptItem::new(0, 2, Script::Common, 0));
    let mut output = ShapeOutput::with_capacity(2);
    assert_eq!(
        harfshape::shape(&mut face, &item, &mut output),
        Err(ShapeError::Capacity { required: 6 })
    );

    output.grow(6);
    harfshape::shape(&mut face, &item, &mut output).unwrap();
    assert_eq!(output.num_glyphs(), 6);
    assert_eq!(output.log_clusters(), &[0, 3]);
    let starts: Vec<bool> = output.attributes().iter().map(|a| a.cluster_start).collect();
    assert_eq!(starts, [true, false, false, true, false, false]);

    // The helper retries on its own.
    assert_eq!(
        shape(&mut face, "xx", ""),
        "1+500|2+500|3+500|1+500|2+500|3+500 [0,3]"
    );
}

#[test]
fn failed_shaping_keeps_the_output() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);

    let text: Vec<u16> = "abxx".encode_utf16().collect();
    let mut output = ShapeOutput::with_capacity(2);
    let ab = ShaperItem::new(&text, ScriptItem::new(0, 2, Script::Common, 0));
    harfshape::shape(&mut face, &ab, &mut output).unwrap();
    assert_eq!(shaping_impl::format_output(&output), "97+500|98+500 [0,1]");

    // `x` becomes three glyphs, which only shows up after substitution.
    let xx = ShaperItem::new(&text, ScriptItem::new(2, 2, Script::Common, 0));
    assert_eq!(
        harfshape::shape(&mut face, &xx, &mut output),
        Err(ShapeError::Capacity { required: 6 })
    );
    assert_eq!(output.capacity(), 2);
    assert_eq!(output.num_glyphs(), 2);
    assert_eq!(shaping_impl::format_output(&output), "97+500|98+500 [0,1]");

    output.grow(6);
    harfshape::shape(&mut face, &xx, &mut output).unwrap();
    assert_eq!(output.num_glyphs(), 6);
}

#[test]
fn too_small_for_the_run() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    assert_eq!(shape(&mut face, "fi", "--capacity 1"), "64257+500 [0,0]");
}

#[test]
fn kerning() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    assert_eq!(shape(&mut face, "AV", ""), "65+420|86+500 [0,1]");
    assert_eq!(shape(&mut face, "AV", "--no-kerning"), "65+500|86+500 [0,1]");
    assert_eq!(shape(&mut face, "AV", "--rtl"), "65+580|86+500 [0,1]");
}

#[test]
fn kerning_applied_flag() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    let text: Vec<u16> = "AV".encode_utf16().collect();
    let run = ScriptItem::new(0, 2, Script::Common, 0);
    let mut output = ShapeOutput::with_capacity(2);

    harfshape::shape(&mut face, &ShaperItem::new(&text, run), &mut output).unwrap();
    assert!(output.kerning_applied());

    let item = ShaperItem::new(&text, run).with_flags(ShaperFlags::NO_KERNING);
    harfshape::shape(&mut face, &item, &mut output).unwrap();
    assert!(!output.kerning_applied());
}

#[test]
fn mark_attachment() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    assert_eq!(shape(&mut face, "a\u{301}", ""), "97+500|769@-250,-700+0 [0,0]");
    assert_eq!(shape(&mut face, "a\u{301}", "--rtl"), "97+500|769@250,-700+0 [0,0]");
}

#[test]
fn heuristic_mark_position() {
    let lookups = Cell::new(0);
    let mut face = Face::with_tables(
        MockFont,
        None,
        gpos(vec![(b"kern", Rule::Kern(0x41, 0x56, -80))], &lookups),
    );
    assert_eq!(shape(&mut face, "a\u{301}", ""), "97+500|769@0,-724+0 [0,0]");
    assert_eq!(shape(&mut face, "a\u{301}", "--rtl"), "97+500|769@500,-724+0 [0,0]");
}

#[test]
fn selection_is_cached() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    let select = |face: &mut Face, flags| {
        harfshape::select_script(face, Script::Common, flags, BASIC_FEATURES)
    };

    // ccmp, liga and clig in GSUB, kern and mark in GPOS.
    assert!(select(&mut face, ShaperFlags::empty()));
    assert_eq!(lookups.get(), 5);
    assert!(face.has_opentype_kerning());

    assert!(select(&mut face, ShaperFlags::empty()));
    assert_eq!(lookups.get(), 5);

    assert!(select(&mut face, ShaperFlags::NO_KERNING));
    assert_eq!(lookups.get(), 9);
    assert!(!face.has_opentype_kerning());

    assert!(select(&mut face, ShaperFlags::empty()));
    assert_eq!(lookups.get(), 14);
    assert!(face.has_opentype_kerning());

    // Inherited is Common.
    assert!(harfshape::select_script(
        &mut face,
        Script::Inherited,
        ShaperFlags::empty(),
        BASIC_FEATURES
    ));
    assert_eq!(lookups.get(), 14);
}

#[test]
fn unsupported_script() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    assert!(face.supports_script(Script::Hebrew));
    assert!(!face.supports_script(Script::Arabic));
    assert!(!harfshape::select_script(
        &mut face,
        Script::Arabic,
        ShaperFlags::empty(),
        BASIC_FEATURES
    ));
    assert_eq!(lookups.get(), 0);

    // Shaped without OpenType.
    assert_eq!(shape(&mut face, "fi", "--script=arab"), "102+500|105+500 [0,1]");
}

#[test]
fn default_script() {
    let lookups = Cell::new(0);
    let table = shaping_impl::MockTable::new(
        &[b"DFLT"],
        vec![(b"liga", Rule::Ligature(vec![0x66, 0x69], shaping_impl::FI))],
        &lookups,
    );
    let mut face = Face::with_tables(MockFont, Some(Box::new(table)), None);
    assert!(face.supports_script(Script::Arabic));
    assert_eq!(shape(&mut face, "fi", "--script=arab"), "64257+500 [0,0]");
}

#[test]
fn substitution_failure() {
    let lookups = Cell::new(0);
    let mut face = Face::with_tables(MockFont, gsub(vec![(b"liga", Rule::Fail)], &lookups), None);

    let text: Vec<u16> = "fi".encode_utf16().collect();
    let item = ShaperItem::new(&text, ScriptItem::new(0, 2, Script::Common, 0));
    let mut output = ShapeOutput::with_capacity(2);
    assert_eq!(
        harfshape::shape(&mut face, &item, &mut output),
        Err(ShapeError::TableApplication(LayoutError::InvalidSubtable {
            lookup: 0
        }))
    );
}

#[test]
fn positioning_failure() {
    let lookups = Cell::new(0);
    let mut face = Face::with_tables(MockFont, None, gpos(vec![(b"kern", Rule::Fail)], &lookups));
    assert_eq!(
        shape(&mut face, "AV", ""),
        "error: layout table application failed: lookup 0 references missing subtable data"
    );
}

#[test]
fn scratch_never_shrinks() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    assert_eq!(face.scratch_capacity(), 0);

    shape(&mut face, "a long line of text", "");
    let capacity = face.scratch_capacity();
    assert!(capacity >= 19);

    shape(&mut face, "fi", "");
    assert_eq!(face.scratch_capacity(), capacity);
}

fn shape_without_ligatures(
    face: &mut Face,
    item: &ShaperItem,
    output: &mut ShapeOutput,
) -> Result<(), ShapeError> {
    let text = item.text()?;
    harfshape::string_to_glyphs(face.font(), item, output)?;

    let (attributes, clusters) =
        harfshape::heuristic_set_glyph_attributes(text, output.num_glyphs(), face.is_symbol_font())?;
    output.run_mut().attributes.copy_from_slice(&attributes);
    output.log_clusters_mut().copy_from_slice(&clusters);

    if harfshape::select_script(face, item.item.script, item.flags, BASIC_FEATURES) {
        let properties = vec![harfshape::CCMP_PROPERTY; output.num_glyphs()];
        harfshape::ot_shape(face, item, output, Some(&properties))?;
        if harfshape::ot_position(face, item, output, true)? == PositionOutcome::Applied {
            return Ok(());
        }
    }

    harfshape::heuristic_position(
        face.font(),
        output.run_mut(),
        item.item.script,
        item.flags,
        item.is_rtl(),
    );
    Ok(())
}

#[test]
fn custom_shaper_with_properties() {
    let lookups = Cell::new(0);
    let mut face = face(&lookups);
    let mut engines = ScriptEngines::new();
    engines.register(
        Script::Common,
        ScriptEngine {
            shaper: ScriptShaper::Custom(shape_without_ligatures),
            char_attributes: None,
        },
    );

    let text: Vec<u16> = "fi".encode_utf16().collect();
    let item = ShaperItem::new(&text, ScriptItem::new(0, 2, Script::Inherited, 0));
    let mut output = ShapeOutput::with_capacity(2);
    harfshape::shape_item(&mut face, &engines, &item, &mut output).unwrap();
    assert_eq!(shaping_impl::format_output(&output), "102+500|105+500 [0,1]");

    // Other scripts keep the basic shaper.
    let item = ShaperItem::new(&text, ScriptItem::new(0, 2, Script::Hebrew, 0));
    harfshape::shape_item(&mut face, &engines, &item, &mut output).unwrap();
    assert_eq!(shaping_impl::format_output(&output), "64257+500 [0,0]");
}
