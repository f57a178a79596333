//! Caps transform: formats reachable on the other side of the converter.

use texconv_core::{DeviceCapabilities, TargetMask};
use tracing::debug;

use crate::caps::{Caps, CapsFeature, CapsStructure, PadDirection};
use crate::supported::{
    supported_formats, supported_planar_yuv_formats, supported_rgb_formats,
    supports_yuv_yuv_conversion,
};

/// Computes the caps reachable on the opposite side of `direction`.
///
/// Any RGB member makes every supported format reachable, since RGB is always
/// a valid intermediate. Without one, the result holds the unchanged
/// (passthrough) formats, then planar YUV formats when a YUV to YUV path
/// exists, then RGB formats. Conversion structures drop the fields a
/// conversion can change: colorimetry, chroma siting and texture target
/// (planar YUV keeps colorimetry).
///
/// Structures that are not GPU memory pass through untouched. When `filter`
/// is given the result is intersected with it, in the filter's order.
pub fn transform_caps(
    device: Option<&DeviceCapabilities>,
    direction: PadDirection,
    caps: &Caps,
    filter: Option<&Caps>,
) -> Caps {
    let output = direction == PadDirection::Sink;
    let supported = supported_formats(device, output);
    let supported_rgb = supported_rgb_formats(device, output);
    let supported_yuv = supported_planar_yuv_formats(device, output);

    let mut res = Caps::new_empty();
    for st in caps.iter() {
        let mut st = st.clone();

        if st.feature == CapsFeature::GpuMemory && !st.formats.is_empty() {
            let mut have_rgb = false;
            let mut have_planar_yuv = false;
            let mut passthrough = Vec::new();
            for format in &st.formats {
                let info = format.info();
                if info.is_rgb() {
                    have_rgb = true;
                    break;
                }
                passthrough.push(*format);
                if supports_yuv_yuv_conversion(info) {
                    have_planar_yuv = true;
                }
            }

            if have_rgb {
                st.formats = supported.clone();
                strip_conversion_fields(&mut st);
            } else {
                st.formats = passthrough;
                if have_planar_yuv {
                    res.push(st.clone());
                    st.formats = supported_yuv.clone();
                    st.texture_targets = TargetMask::EMPTY;
                }
                res.push(st.clone());
                st.formats = supported_rgb.clone();
                strip_conversion_fields(&mut st);
            }
        }
        res.push(st);
    }

    let res = match filter {
        Some(filter) => filter.intersect(&res),
        None => res,
    };
    debug!(?direction, input = %caps, result = %res, "transformed caps");
    res
}

fn strip_conversion_fields(st: &mut CapsStructure) {
    st.colorimetry = None;
    st.chroma_site = None;
    st.texture_targets = TargetMask::EMPTY;
}

#[cfg(test)]
mod tests {
    use super::*;
    use texconv_core::{Colorimetry, TextureTarget, VideoFormat};

    #[test]
    fn test_rgb_input_reaches_everything() {
        let caps: Caps = CapsStructure::gpu(&[VideoFormat::Rgba])
            .with_size(64, 48)
            .with_colorimetry(Colorimetry::SRGB)
            .with_targets(&[TextureTarget::Rectangle])
            .into();
        let out = transform_caps(None, PadDirection::Sink, &caps, None);
        assert_eq!(out.len(), 1);
        let st = out.first().unwrap();
        assert_eq!(st.formats, supported_formats(None, true));
        assert_eq!(st.width, Some(64));
        assert!(st.colorimetry.is_none());
        assert!(st.texture_targets.is_empty());
    }

    #[test]
    fn test_yuv_input_structures() {
        let caps: Caps = CapsStructure::gpu(&[VideoFormat::I420])
            .with_colorimetry(Colorimetry::BT709)
            .with_targets(&[TextureTarget::TwoD])
            .into();
        let out = transform_caps(None, PadDirection::Sink, &caps, None);
        assert_eq!(out.len(), 3);
        let s = out.structures();
        assert_eq!(s[0].formats, vec![VideoFormat::I420]);
        assert_eq!(s[0].texture_targets, TextureTarget::TwoD.mask());
        assert_eq!(s[1].formats, supported_planar_yuv_formats(None, true));
        assert_eq!(s[1].colorimetry, Some(Colorimetry::BT709));
        assert!(s[1].texture_targets.is_empty());
        assert_eq!(s[2].formats, supported_rgb_formats(None, true));
        assert!(s[2].colorimetry.is_none());
    }

    #[test]
    fn test_semi_planar_has_no_yuv_path() {
        let caps: Caps = CapsStructure::gpu(&[VideoFormat::Nv12]).into();
        let out = transform_caps(None, PadDirection::Sink, &caps, None);
        assert_eq!(out.len(), 2);
        assert_eq!(out.structures()[0].formats, vec![VideoFormat::Nv12]);
        assert!(out.structures()[1].formats.iter().all(|f| f.info().is_rgb()));
    }

    #[test]
    fn test_system_memory_untouched() {
        let caps: Caps = CapsStructure::system(&[VideoFormat::Rgba]).into();
        let out = transform_caps(None, PadDirection::Src, &caps, None);
        assert_eq!(out, caps);
    }

    #[test]
    fn test_filter_order() {
        let caps: Caps = CapsStructure::gpu(&[VideoFormat::Rgba]).into();
        let filter: Caps = CapsStructure::gpu(&[VideoFormat::Nv12, VideoFormat::Bgra]).into();
        let out = transform_caps(None, PadDirection::Sink, &caps, Some(&filter));
        assert_eq!(out.first().unwrap().formats, vec![VideoFormat::Nv12, VideoFormat::Bgra]);
    }
}
