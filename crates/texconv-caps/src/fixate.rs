//! Least-loss fixation of the output format and texture target.
//!
//! Every candidate is scored against the input format; the lowest score wins
//! and ties keep the earlier candidate, so the result depends on candidate
//! order and nothing else. The score constants are shared with other
//! negotiation peers and must not change.

use texconv_core::{
    Error, FormatDescriptor, FormatFlags, Result, TargetMask, TextureTarget, VideoFormat,
};
use tracing::{debug, trace};

use crate::caps::{Caps, PadDirection};
use crate::supported::conversion_formats_are_supported;

/// Any change of format.
pub const SCORE_FORMAT_CHANGE: u32 = 1;
/// Component depth changes.
pub const SCORE_DEPTH_CHANGE: u32 = 1;
/// Alpha presence changes.
pub const SCORE_ALPHA_CHANGE: u32 = 1;
/// Horizontal chroma subsampling changes.
pub const SCORE_CHROMA_W_CHANGE: u32 = 1;
/// Vertical chroma subsampling changes.
pub const SCORE_CHROMA_H_CHANGE: u32 = 1;
/// Palette presence changes.
pub const SCORE_PALETTE_CHANGE: u32 = 1;

/// RGB <-> YUV.
pub const SCORE_COLORSPACE_LOSS: u32 = 2;
/// Fewer bits per component.
pub const SCORE_DEPTH_LOSS: u32 = 4;
/// Alpha dropped.
pub const SCORE_ALPHA_LOSS: u32 = 8;
/// Coarser horizontal chroma.
pub const SCORE_CHROMA_W_LOSS: u32 = 16;
/// Coarser vertical chroma.
pub const SCORE_CHROMA_H_LOSS: u32 = 32;
/// Conversion into a palette format.
pub const SCORE_PALETTE_LOSS: u32 = 64;
/// Conversion into gray.
pub const SCORE_COLOR_LOSS: u32 = 128;

const SCORED_FLAGS_IGNORED: FormatFlags = FormatFlags::LE
    .union(FormatFlags::COMPLEX)
    .union(FormatFlags::TILED);

/// Loss of converting `input` into `candidate`, or `None` when no conversion
/// path exists. Identical formats cost nothing.
pub fn format_loss(input: &FormatDescriptor, candidate: &FormatDescriptor) -> Option<u32> {
    if input.format == candidate.format {
        return Some(0);
    }
    if !conversion_formats_are_supported(input, candidate) {
        return None;
    }

    let in_flags = input.flags.difference(SCORED_FLAGS_IGNORED);
    let t_flags = candidate.flags.difference(SCORED_FLAGS_IGNORED);
    let mut loss = SCORE_FORMAT_CHANGE;

    let palette = FormatFlags::PALETTE;
    if t_flags.intersect(palette) != in_flags.intersect(palette) {
        loss += SCORE_PALETTE_CHANGE;
        if t_flags.contains(palette) {
            loss += SCORE_PALETTE_LOSS;
        }
    }

    let colorspace = FormatFlags::COLORSPACE_MASK;
    if t_flags.intersect(colorspace) != in_flags.intersect(colorspace) {
        loss += SCORE_COLORSPACE_LOSS;
        if t_flags.contains(FormatFlags::GRAY) {
            loss += SCORE_COLOR_LOSS;
        }
    }

    let alpha = FormatFlags::ALPHA;
    if t_flags.intersect(alpha) != in_flags.intersect(alpha) {
        loss += SCORE_ALPHA_CHANGE;
        if in_flags.contains(alpha) {
            loss += SCORE_ALPHA_LOSS;
        }
    }

    if input.h_sub[1] != candidate.h_sub[1] {
        loss += SCORE_CHROMA_H_CHANGE;
        if input.h_sub[1] < candidate.h_sub[1] {
            loss += SCORE_CHROMA_H_LOSS;
        }
    }
    if input.w_sub[1] != candidate.w_sub[1] {
        loss += SCORE_CHROMA_W_CHANGE;
        if input.w_sub[1] < candidate.w_sub[1] {
            loss += SCORE_CHROMA_W_LOSS;
        }
    }

    if input.bits != candidate.bits {
        loss += SCORE_DEPTH_CHANGE;
        if input.bits > candidate.bits {
            loss += SCORE_DEPTH_LOSS;
        }
    }

    Some(loss)
}

/// Picks the least lossy candidate for `input`.
///
/// Returns the format and its loss, or `None` when no candidate is
/// convertible. An exact match wins immediately with loss 0; among equal
/// losses the first candidate is kept.
pub fn fixate_format(input: VideoFormat, candidates: &[VideoFormat]) -> Option<(VideoFormat, u32)> {
    let in_info = input.info();
    let mut best = None;
    let mut min_loss = u32::MAX;

    for &candidate in candidates {
        let Some(loss) = format_loss(in_info, candidate.info()) else {
            continue;
        };
        trace!(%input, %candidate, loss, "scored format");
        if loss < min_loss {
            min_loss = loss;
            best = Some((candidate, loss));
            if loss == 0 {
                break;
            }
        }
    }
    best
}

/// Outcome of [`fixate_format_target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatTarget {
    /// Chosen format.
    pub format: VideoFormat,
    /// Chosen texture target, `None` when no target is allowed.
    pub target: Option<TextureTarget>,
    /// Loss of the choice.
    pub loss: u32,
    /// Index of the candidate structure the choice came from.
    pub structure: usize,
}

/// Scores every (format, target) candidate of `candidates` against `input`
/// stored in `input_targets`.
///
/// Keeping the format keeps a common target when there is one. Any other
/// choice renders, so it can never produce an external target, and stays on
/// the input's target when the candidate allows it. Targets are picked 2D
/// first, then rectangle. An empty mask means any target.
pub fn fixate_format_target(
    input: VideoFormat,
    input_targets: TargetMask,
    candidates: &Caps,
) -> Option<FormatTarget> {
    let in_info = input.info();
    let targets_mask = or_all(input_targets);
    let mut best: Option<FormatTarget> = None;
    let mut min_loss = u32::MAX;

    for (index, st) in candidates.iter().enumerate() {
        let other_mask = or_all(st.texture_targets);
        for &candidate in &st.formats {
            if candidate == input && !targets_mask.intersect(other_mask).is_empty() {
                return Some(FormatTarget {
                    format: candidate,
                    target: targets_mask.intersect(other_mask).first(),
                    loss: 0,
                    structure: index,
                });
            }

            // only an unchanged frame may stay external
            let mut render_mask = other_mask.without(TextureTarget::ExternalOes);
            if !targets_mask.intersect(render_mask).is_empty() {
                render_mask = targets_mask.intersect(render_mask);
            }

            let Some(mut loss) = format_loss(in_info, candidate.info()) else {
                continue;
            };
            if loss == 0 {
                // same format, different target
                loss = SCORE_FORMAT_CHANGE;
            }
            trace!(%input, %candidate, loss, targets = %render_mask, "scored format target");
            if loss < min_loss {
                min_loss = loss;
                best = Some(FormatTarget {
                    format: candidate,
                    target: render_mask.first(),
                    loss,
                    structure: index,
                });
            }
        }
    }
    best
}

fn or_all(mask: TargetMask) -> TargetMask {
    if mask.is_empty() { TargetMask::ALL } else { mask }
}

/// Fixates `other` (the caps of the side opposite to `direction`) given the
/// fixed `caps`.
///
/// Caps compatible with `caps` are preferred; otherwise the least lossy
/// format and target of `other` are chosen and the remaining fields are
/// fixated to their first values. Fails with
/// [`Error::NegotiationFailed`] when nothing in `other` is reachable.
pub fn fixate_caps(direction: PadDirection, caps: &Caps, other: &Caps) -> Result<Caps> {
    let mut result = other.intersect(caps);
    if result.is_empty() {
        result = other.clone();
    }
    if result.is_empty() {
        return Err(Error::negotiation(format!("no caps to fixate against {caps}")));
    }

    if let Some(ins) = caps.first() {
        if let [in_format] = ins.formats[..] {
            let chosen = fixate_format_target(in_format, ins.texture_targets, &result)
                .ok_or_else(|| {
                    Error::negotiation(format!("no format in {result} is convertible from {in_format}"))
                })?;

            let structures = result.structures_mut();
            let mut st = structures.remove(chosen.structure);
            st.formats = vec![chosen.format];
            if let Some(target) = chosen.target {
                st.texture_targets = target.mask();
            }
            structures.insert(0, st);
            debug!(
                input = %in_format,
                output = %chosen.format,
                target = ?chosen.target,
                loss = chosen.loss,
                "fixated format"
            );
        }
    }

    let mut result = result.fixate();
    if direction == PadDirection::Sink && caps.is_subset_of(&result) {
        result = caps.clone();
    }

    match result.first() {
        Some(st) if !st.formats.is_empty() => Ok(result),
        _ => Err(Error::negotiation(format!("could not fixate a format from {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::CapsStructure;
    use VideoFormat as V;

    #[test]
    fn test_identity_is_free() {
        assert_eq!(fixate_format(V::Nv12, &[V::I420, V::Rgba, V::Nv12]), Some((V::Nv12, 0)));
    }

    #[test]
    fn test_rgba_prefers_itself() {
        assert_eq!(fixate_format(V::Rgba, &[V::I420, V::Rgba, V::Gray8]), Some((V::Rgba, 0)));
    }

    #[test]
    fn test_loss_values() {
        // colorspace 2 + alpha change 1 + alpha loss 8 + chroma w/h (1+16, 1+32)
        assert_eq!(format_loss(V::Rgba.info(), V::I420.info()), Some(1 + 2 + 9 + 17 + 33));
        // gray: colorspace + color loss + alpha loss
        assert_eq!(format_loss(V::Rgba.info(), V::Gray8.info()), Some(1 + 2 + 128 + 9));
        // reorder only
        assert_eq!(format_loss(V::Rgba.info(), V::Bgra.info()), Some(1));
        // depth loss
        assert_eq!(format_loss(V::Rgba64Le.info(), V::Rgba.info()), Some(1 + 1 + 4));
        // depth gain
        assert_eq!(format_loss(V::Rgba.info(), V::Rgba64Le.info()), Some(2));
        // finer chroma is a change, not a loss
        assert_eq!(format_loss(V::I420.info(), V::Y444.info()), Some(3));
        assert_eq!(format_loss(V::Nv12.info(), V::I420.info()), None);
    }

    #[test]
    fn test_tie_keeps_first() {
        // BGRA and ARGB both cost 1
        assert_eq!(fixate_format(V::Rgba, &[V::Bgra, V::Argb]), Some((V::Bgra, 1)));
        assert_eq!(fixate_format(V::Rgba, &[V::Argb, V::Bgra]), Some((V::Argb, 1)));
    }

    #[test]
    fn test_nothing_convertible() {
        assert_eq!(fixate_format(V::Nv12, &[V::I420, V::Y444]), None);
        assert_eq!(fixate_format(V::Rgba, &[]), None);
    }

    #[test]
    fn test_target_prefers_input_target() {
        let candidates: Caps = CapsStructure::gpu(&[V::Bgra]).into();
        let chosen =
            fixate_format_target(V::Rgba, TextureTarget::Rectangle.mask(), &candidates).unwrap();
        assert_eq!(chosen.target, Some(TextureTarget::Rectangle));
    }

    #[test]
    fn test_external_only_for_passthrough() {
        let ext = TextureTarget::ExternalOes.mask();
        let candidates: Caps = CapsStructure::gpu(&[V::Rgba, V::Nv12]).into();

        let same = fixate_format_target(V::Nv12, ext, &candidates).unwrap();
        assert_eq!(same.format, V::Nv12);
        assert_eq!(same.target, Some(TextureTarget::ExternalOes));

        let changed = fixate_format_target(V::I420, ext, &candidates).unwrap();
        assert_eq!(changed.format, V::Rgba);
        assert_eq!(changed.target, Some(TextureTarget::TwoD));
    }

    #[test]
    fn test_fixate_caps_picks_least_loss() {
        let input: Caps = CapsStructure::gpu(&[V::Rgba]).with_size(64, 48).into();
        let other: Caps = CapsStructure::gpu(&[V::I420, V::Gray8, V::Bgrx])
            .with_size(64, 48)
            .into();
        let fixed = fixate_caps(PadDirection::Sink, &input, &other).unwrap();
        assert!(fixed.is_fixed());
        // BGRx: change 1 + alpha change 1 + alpha loss 8
        assert_eq!(fixed.first().unwrap().formats, vec![V::Bgrx]);
        assert_eq!(fixed.first().unwrap().texture_target().unwrap(), TextureTarget::TwoD);
    }

    #[test]
    fn test_fixate_caps_surfaces_failure() {
        let input: Caps = CapsStructure::gpu(&[V::Nv12]).with_size(64, 48).into();
        let other: Caps = CapsStructure::gpu(&[V::I420]).with_size(64, 48).into();
        let err = fixate_caps(PadDirection::Sink, &input, &other).unwrap_err();
        assert!(matches!(err, Error::NegotiationFailed { .. }));
    }
}
