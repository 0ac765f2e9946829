use super::common::{Script, ShaperFlags};
use super::face::{FontFuncs, GlyphMetrics};
use super::round;
use super::shape::{GlyphOffset, GlyphRun};
use super::unicode::combining_class as cc;

/// Sets the font advances of the run and resets offsets.
pub(crate) fn fetch_advances(font: &dyn FontFuncs, run: &mut GlyphRun, flags: ShaperFlags) {
    for ((glyph, advance), offset) in run
        .glyphs
        .iter()
        .zip(run.advances.iter_mut())
        .zip(run.offsets.iter_mut())
    {
        *advance = font.glyph_advance(*glyph, flags);
        *offset = GlyphOffset::default();
    }
}

/// Positions combining marks around their base glyph using glyph bounding
/// boxes and combining classes.
///
/// Fetches the font advances first. Marks get a zero advance and an offset
/// relative to the pen position after the base in left-to-right runs, and
/// relative to the base origin in right-to-left runs.
pub fn heuristic_position(
    font: &dyn FontFuncs,
    mut run: GlyphRun,
    script: Script,
    flags: ShaperFlags,
    rtl: bool,
) {
    fetch_advances(font, &mut run, flags);

    let mut cluster_end = None;
    for i in (0..run.len()).rev() {
        let mark = run.attributes[i].mark;
        match cluster_end {
            None if mark => cluster_end = Some(i),
            Some(end) if !mark => {
                position_cluster(font, &mut run, i, end, script, rtl);
                cluster_end = None;
            }
            _ => {}
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl Rect {
    fn from_metrics(m: &GlyphMetrics) -> Self {
        Rect {
            x: m.x as f32,
            y: m.y as f32,
            w: m.width as f32,
            h: m.height as f32,
        }
    }

    fn left(&self) -> f32 {
        self.x
    }

    fn right(&self) -> f32 {
        self.x + self.w
    }

    fn top(&self) -> f32 {
        self.y
    }

    fn bottom(&self) -> f32 {
        self.y + self.h
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    fn union(&self, other: &Rect) -> Rect {
        if self.w == 0.0 && self.h == 0.0 {
            return *other;
        }
        if other.w == 0.0 && other.h == 0.0 {
            return *self;
        }

        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect {
            x: left,
            y: top,
            w: right - left,
            h: bottom - top,
        }
    }
}

// Maps fixed position classes onto the positional ones.
// Only the Hebrew, Arabic, Thai and Lao classes are known.
fn recategorize_combining_class(class: u8) -> u8 {
    if class >= 200 {
        return class;
    }

    match class {
        // Hebrew points below, kasratan, kasra
        10..=18 | 20 | 22 | 29 | 32 => cc::Below,
        // rafe, Arabic harakat, shadda, sukun, superscript alef
        23 | 27 | 28 | 30 | 31 | 33..=36 => cc::Above,
        // Thai sara u, Lao sign u
        9 | 103 | 118 => cc::BelowRight,
        // shin dot, Thai and Lao mai
        24 | 107 | 122 => cc::AboveRight,
        // sin dot
        25 => cc::AboveLeft,
        // dagesh, holam: fixed
        _ => class,
    }
}

fn position_cluster(
    font: &dyn FontFuncs,
    run: &mut GlyphRun,
    base: usize,
    last: usize,
    script: Script,
    rtl: bool,
) {
    let base_info = font.glyph_metrics(run.glyphs[base]).unwrap_or_default();
    let mut base_rect = Rect::from_metrics(&base_info);
    if script == Script::Hebrew {
        // Attach below the baseline because of the iud.
        base_rect.h = base_rect.h.max(-base_rect.y);
    }

    let size = (font.ascent() / 10) as f32;
    let offset_base = (size - 4.0) / 4.0 + size.min(4.0) + 1.0;

    let mut last_class = 0;
    let mut attachment = Rect::default();

    for i in base + 1..=last {
        let mark_info = font.glyph_metrics(run.glyphs[i]).unwrap_or_default();
        let mut mark_rect = Rect::from_metrics(&mark_info);

        let mut offset = offset_base;
        let mut class = run.attributes[i].combining_class;
        if class < 200 {
            // Arabic marks need a bit more room.
            if (27..=36).contains(&class) && offset < 3.0 {
                offset += 1.0;
            }
            class = recategorize_combining_class(class);
        }

        // Marks of different classes don't interact.
        if class != last_class {
            attachment = base_rect;
        }

        let a = attachment;
        let m = mark_rect;
        let centered = (a.w - m.w) / 2.0;
        let (px, py) = match class {
            cc::DoubleBelow | cc::BelowLeft => (a.left() - m.left(), offset + a.bottom() - m.top()),
            cc::AttachedBelowLeft => (a.left() - m.left(), a.bottom() - m.top()),
            cc::Below => (a.left() - m.left() + centered, offset + a.bottom() - m.top()),
            cc::AttachedBelow => (a.left() - m.left() + centered, a.bottom() - m.top()),
            cc::BelowRight => (a.right() - m.right(), offset + a.bottom() - m.top()),
            cc::AttachedBelowRight => (a.right() - m.right(), a.bottom() - m.top()),
            cc::Left => (-offset, 0.0),
            cc::Right => (offset, 0.0),
            cc::DoubleAbove | cc::AboveLeft => (a.left() - m.left(), a.top() - m.bottom() - offset),
            cc::AttachedAboveLeft => (a.left() - m.left(), a.top() - m.bottom()),
            cc::Above => (a.left() - m.left() + centered, a.top() - m.bottom() - offset),
            cc::AttachedAbove => (a.left() - m.left() + centered, a.top() - m.bottom()),
            cc::AboveRight => (a.right() - m.right(), a.top() - m.bottom() - offset),
            cc::AttachedAboveRight => (a.right() - m.right(), a.top() - m.bottom()),
            // Attached left and right, iota subscript and the rest.
            _ => (0.0, 0.0),
        };

        mark_rect.translate(px, py);
        attachment = attachment.union(&mark_rect);
        last_class = class;

        let (x, y) = (round(px) as i32, round(py) as i32);
        run.offsets[i] = if rtl {
            GlyphOffset { x, y }
        } else {
            GlyphOffset {
                x: x - base_info.x_offset,
                y: y - base_info.y_offset,
            }
        };
        run.advances[i] = 0;
    }
}
