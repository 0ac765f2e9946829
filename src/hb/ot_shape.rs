//! OpenType substitution and positioning of a shaped run.

use alloc::vec;
use alloc::vec::Vec;

use super::error::{LayoutError, ShapeError};
use super::face::hb_face_t;
use super::ot_layout::Position;
use super::ot_shape_fallback::{fetch_advances, heuristic_position};
use super::shape::{GlyphOffset, ShapeOutput, ShaperItem};

/// Result of [`ot_position`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionOutcome {
    /// Neither GSUB nor GPOS changed anything. The output is untouched and
    /// still needs to be positioned.
    Unchanged,
    /// The output was rebuilt and positioned.
    Applied,
}

/// Applies GSUB to the glyphs of `output`.
///
/// The glyphs, attributes and cluster map of the run must be set. They are
/// copied into the face, the output itself is left as is until
/// [`ot_position`] writes the result back.
///
/// `properties` holds per-glyph property bits. A feature skips glyphs that
/// carry all of its property bits.
pub fn ot_shape(
    face: &mut hb_face_t,
    item: &ShaperItem,
    output: &ShapeOutput,
    properties: Option<&[u32]>,
) -> Result<(), ShapeError> {
    let num_glyphs = output.num_glyphs();

    face.buffer.clear();
    face.tmp_attributes.clear();
    face.tmp_log_clusters.clear();

    for (i, &glyph) in output.glyphs().iter().enumerate() {
        let props = properties.and_then(|p| p.get(i).copied()).unwrap_or(0);
        face.buffer.add_glyph(glyph, props, i as u32);
    }
    face.tmp_attributes.extend_from_slice(output.attributes());
    face.tmp_log_clusters.extend_from_slice(output.log_clusters());

    log::trace!(
        "ot_shape: {} glyphs, script {:?}",
        num_glyphs,
        item.item.script
    );

    face.glyphs_substituted = false;
    if let Some(gsub) = face.gsub.as_deref() {
        match gsub.substitute(&face.gsub_features, &mut face.buffer) {
            Ok(()) => face.glyphs_substituted = true,
            Err(LayoutError::NotCovered) => {}
            Err(e) => {
                log::warn!("GSUB failed: {}", e);
                return Err(e.into());
            }
        }
    }

    log::trace!(
        "ot_shape: substituted={} glyphs={:?}",
        face.glyphs_substituted,
        face.buffer.glyphs().iter().map(|g| g.glyph.0).collect::<Vec<_>>()
    );

    Ok(())
}

/// Applies GPOS and writes the shaped run back into `output`.
///
/// Must follow [`ot_shape`] on the same face and output. Fails with
/// [`ShapeError::Capacity`] without writing anything when the shaped run
/// doesn't fit the output.
///
/// With `log_clusters` unset the cluster map is left to the caller.
pub fn ot_position(
    face: &mut hb_face_t,
    item: &ShaperItem,
    output: &mut ShapeOutput,
    log_clusters: bool,
) -> Result<PositionOutcome, ShapeError> {
    let mut positioned = false;
    if let Some(gpos) = face.gpos.as_deref() {
        face.buffer.clear_positions();
        match gpos.position(&face.gpos_features, &mut face.buffer) {
            Ok(()) => positioned = true,
            Err(LayoutError::NotCovered) => {}
            Err(e) => {
                log::warn!("GPOS failed: {}", e);
                return Err(e.into());
            }
        }
    }

    if !face.glyphs_substituted && !positioned {
        return Ok(PositionOutcome::Unchanged);
    }

    let len = face.buffer.len();
    if output.capacity() < len {
        return Err(ShapeError::Capacity { required: len });
    }

    let original_len = face.tmp_attributes.len();
    for (i, g) in face.buffer.glyphs().iter().enumerate() {
        output.glyphs[i] = g.glyph;
        let mut attrs = face
            .tmp_attributes
            .get(g.cluster as usize)
            .copied()
            .unwrap_or_default();
        if i > 0 && face.buffer.glyphs()[i - 1].cluster == g.cluster {
            attrs.cluster_start = false;
        }
        output.attributes[i] = attrs;
    }
    output.num_glyphs = len;

    if log_clusters {
        // The first glyph of each original glyph slot.
        let mut slots = vec![0u32; original_len];
        let mut cluster_start = 0;
        let mut old = 0;
        for (i, g) in face.buffer.glyphs().iter().enumerate() {
            let ci = (g.cluster as usize).min(original_len);
            let attrs = &output.attributes[i];
            if !attrs.mark && attrs.cluster_start && ci != old {
                if old < ci {
                    slots[old..ci].fill(cluster_start);
                }
                cluster_start = i as u32;
                old = ci;
            }
        }
        slots[old..].fill(cluster_start);

        let num_chars = output.num_chars;
        for (c, &slot) in face.tmp_log_clusters.iter().take(num_chars).enumerate() {
            output.log_clusters[c] = slots.get(slot as usize).copied().unwrap_or(cluster_start);
        }
    }

    let rtl = item.is_rtl();
    if positioned {
        let num_glyphs = output.num_glyphs;
        fetch_advances(face.font(), &mut output.run_mut(), item.flags);
        apply_positions(
            face.buffer.positions(),
            &mut output.advances[..num_glyphs],
            &mut output.offsets[..num_glyphs],
            rtl,
        );
        output.kerning_applied = face.has_opentype_kerning;
    } else {
        heuristic_position(face.font(), output.run_mut(), item.item.script, item.flags, rtl);
    }

    log::debug!(
        "ot_position: {} glyphs, substituted={} positioned={}",
        len,
        face.glyphs_substituted,
        positioned
    );

    Ok(PositionOutcome::Applied)
}

// GPOS values are y-up, offsets are y-down.
fn apply_positions(
    positions: &[Position],
    advances: &mut [i32],
    offsets: &mut [GlyphOffset],
    rtl: bool,
) {
    let sign = if rtl { -1 } else { 1 };

    for i in 0..advances.len().min(positions.len()) {
        let pos = positions[i];
        if pos.new_advance {
            advances[i] = sign * pos.x_advance;
        } else {
            advances[i] += sign * pos.x_advance;
        }

        let mut x = pos.x_pos;
        let mut y = pos.y_pos;
        let mut correction = 0;

        // Walk the attachment chain.
        let mut back = 0;
        loop {
            let step = usize::from(positions[i - back].back);
            if step == 0 || back + step > i {
                break;
            }

            back += step;
            x += positions[i - back].x_pos;
            y += positions[i - back].y_pos;
            if !rtl {
                correction += advances[i - back];
            }
        }

        if rtl {
            let back = usize::from(pos.back).min(i + 1);
            correction = (0..back).map(|k| advances[i - k]).sum();
        }

        offsets[i].x = x - correction;
        offsets[i].y = -y;
    }
}
