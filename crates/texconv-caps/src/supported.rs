//! Formats the converter can read or write on a given device.

use texconv_core::{DeviceCapabilities, FormatDescriptor, TexelFormat, VideoFormat};

use VideoFormat as V;

/// Formats readable and writable on every device.
const ALWAYS: &[VideoFormat] = &[
    V::Rgba, V::Rgb, V::Rgbx, V::Bgr, V::Bgrx, V::Bgra, V::Xrgb, V::Xbgr, V::Argb, V::Abgr,
    V::Gray8, V::Gray16Le, V::Gray16Be, V::Ayuv, V::Vuya, V::Rbga,
];

/// Written by reading back a two channel framebuffer.
const PACKED_422: &[VideoFormat] = &[V::Yuy2, V::Uyvy];

/// [`PACKED_422`] layout in 16-bit channels.
const PACKED_422_16: &[VideoFormat] = &[V::Y210, V::Y212Le];

/// Written with one draw buffer per plane.
const MULTI_PLANE: &[VideoFormat] = &[
    V::Gbra, V::Gbr, V::Rgbp, V::Bgrp, V::Y444, V::I420, V::Yv12, V::Y42b, V::Y41b, V::Nv12,
    V::Nv21, V::Nv16, V::Nv61, V::A420, V::Av12, V::A444, V::A422,
];

const RGB565: &[VideoFormat] = &[V::Rgb16, V::Bgr16];

const RGBA16: &[VideoFormat] = &[V::Argb64, V::Rgba64Le, V::Y412Le];

const RGB10A2: &[VideoFormat] = &[V::Bgr10a2Le, V::Rgb10a2Le, V::Y410, V::V210];

const SEMI_PLANAR_16: &[VideoFormat] = &[V::P010_10le, V::P012le, V::P016le];

const PLANAR_16: &[VideoFormat] = &[
    V::A420_10le, V::A422_10le, V::A444_10le, V::A444_12le, V::A422_12le, V::A420_12le,
    V::A444_16le, V::A422_16le, V::A420_16le, V::I420_12le, V::I420_10le, V::I422_10le,
    V::I422_12le, V::Y444_10le, V::Y444_16le, V::Gbr10Le, V::Gbra10Le,
];

/// Read with integer texel fetches.
const TILED: &[VideoFormat] = &[V::Nv12_16l32s, V::Nv12_4l4];

/// RGB family members, in the order offered by caps transform.
pub const RGB_FORMATS: &[VideoFormat] = &[
    V::Rgba, V::Argb, V::Bgra, V::Abgr, V::Rgbx, V::Xrgb, V::Bgrx, V::Xbgr, V::Rgb, V::Bgr,
    V::Argb64, V::Bgr10a2Le, V::Rgb10a2Le, V::Rgba64Le, V::Rbga, V::Gbra, V::Gbr, V::Rgbp,
    V::Bgrp, V::Rgb16, V::Bgr16, V::Gbr10Le, V::Gbra10Le,
];

/// YUV formats with a direct YUV to YUV path, in the order offered by caps transform.
pub const PLANAR_YUV_FORMATS: &[VideoFormat] = &[
    V::Y444, V::Y444_10le, V::Y444_16le, V::I420, V::Yv12, V::Y42b, V::Y41b, V::A420, V::A444,
    V::A422, V::A420_10le, V::A422_10le, V::A444_10le, V::A444_12le, V::A422_12le,
    V::A420_12le, V::A444_16le, V::A422_16le, V::A420_16le, V::I420_12le, V::I420_10le,
    V::I422_10le, V::I422_12le, V::V210, V::Uyvy, V::Yuy2,
];

/// Whether a YUV format can be converted to another YUV format without an RGB
/// intermediate: fully planar YUV, v210, YUY2 and UYVY.
pub fn supports_yuv_yuv_conversion(desc: &FormatDescriptor) -> bool {
    (desc.is_yuv() && desc.n_planes == desc.n_components)
        || matches!(desc.format, V::V210 | V::Yuy2 | V::Uyvy)
}

/// Whether any shader path exists between the two format families.
pub fn conversion_formats_are_supported(input: &FormatDescriptor, output: &FormatDescriptor) -> bool {
    input.is_rgb()
        || output.is_rgb()
        || (supports_yuv_yuv_conversion(input) && supports_yuv_yuv_conversion(output))
}

/// Ordered list of formats usable on one side of the converter.
///
/// `device` of `None` means no device is known yet and every format is
/// assumed to work. `output` selects the write side, where multi-plane
/// formats need multiple draw buffers, packed 4:2:2 needs two channel render
/// targets and tiled layouts are not produced at all.
pub fn supported_formats(device: Option<&DeviceCapabilities>, output: bool) -> Vec<VideoFormat> {
    let Some(caps) = device else {
        let mut all = Vec::new();
        for group in [
            ALWAYS, PACKED_422, PACKED_422_16, MULTI_PLANE, RGB565, RGBA16, RGB10A2, SEMI_PLANAR_16,
            PLANAR_16,
        ] {
            all.extend_from_slice(group);
        }
        if !output {
            all.extend_from_slice(TILED);
        }
        return all;
    };

    let mut list: Vec<VideoFormat> = ALWAYS.to_vec();
    if !output || caps.rg_render {
        list.extend_from_slice(PACKED_422);
    }
    if (!output || caps.rg_render) && caps.supports(TexelFormat::Rg16) {
        list.extend_from_slice(PACKED_422_16);
    }
    if !output || caps.has_draw_buffers() {
        list.extend_from_slice(MULTI_PLANE);
    }
    if caps.supports(TexelFormat::Rgb565) {
        list.extend_from_slice(RGB565);
    }
    if caps.supports(TexelFormat::Rgba16) {
        list.extend_from_slice(RGBA16);
    }
    if caps.supports(TexelFormat::Rgb10a2) {
        list.extend_from_slice(RGB10A2);
    }
    if caps.supports(TexelFormat::R16) && caps.supports(TexelFormat::Rg16) {
        list.extend_from_slice(SEMI_PLANAR_16);
    }
    if caps.supports(TexelFormat::R16) {
        list.extend_from_slice(PLANAR_16);
    }
    if !output && caps.texel_fetch {
        list.extend_from_slice(TILED);
    }

    list.retain(|f| format_fits_device(caps, f.info(), output));
    list
}

/// Whether every plane of `desc` can be stored on the device, and for output,
/// drawn in a single pass.
pub fn format_fits_device(caps: &DeviceCapabilities, desc: &FormatDescriptor, output: bool) -> bool {
    if output && desc.n_planes > 1 && !caps.has_draw_buffers() {
        return false;
    }
    (0..desc.n_planes as usize).all(|p| {
        desc.texel_format(p)
            .and_then(|t| caps.plane_texel_format(t))
            .is_some()
    })
}

/// RGB members of the supported list, in [`RGB_FORMATS`] order.
pub fn supported_rgb_formats(device: Option<&DeviceCapabilities>, output: bool) -> Vec<VideoFormat> {
    intersect_ordered(RGB_FORMATS, &supported_formats(device, output))
}

/// YUV to YUV capable members of the supported list, in [`PLANAR_YUV_FORMATS`] order.
pub fn supported_planar_yuv_formats(
    device: Option<&DeviceCapabilities>,
    output: bool,
) -> Vec<VideoFormat> {
    intersect_ordered(PLANAR_YUV_FORMATS, &supported_formats(device, output))
}

fn intersect_ordered(order: &[VideoFormat], allowed: &[VideoFormat]) -> Vec<VideoFormat> {
    order.iter().copied().filter(|f| allowed.contains(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuv_yuv_support() {
        assert!(supports_yuv_yuv_conversion(V::I420.info()));
        assert!(supports_yuv_yuv_conversion(V::A420_10le.info()));
        assert!(supports_yuv_yuv_conversion(V::Yuy2.info()));
        assert!(supports_yuv_yuv_conversion(V::V210.info()));
        assert!(supports_yuv_yuv_conversion(V::A444_16le.info()));
        assert!(!supports_yuv_yuv_conversion(V::Y210.info()));
        assert!(!supports_yuv_yuv_conversion(V::P012le.info()));
        assert!(!supports_yuv_yuv_conversion(V::Nv12.info()));
        assert!(!supports_yuv_yuv_conversion(V::Ayuv.info()));
        assert!(!supports_yuv_yuv_conversion(V::Gbr.info()));
    }

    #[test]
    fn test_conversion_support() {
        assert!(conversion_formats_are_supported(V::Nv12.info(), V::Rgba.info()));
        assert!(conversion_formats_are_supported(V::Rgba.info(), V::Gray8.info()));
        assert!(conversion_formats_are_supported(V::I420.info(), V::Y444.info()));
        assert!(!conversion_formats_are_supported(V::Nv12.info(), V::I420.info()));
        assert!(!conversion_formats_are_supported(V::Gray8.info(), V::I420.info()));
    }

    #[test]
    fn test_full_device_lists() {
        let caps = DeviceCapabilities::full();
        let input = supported_formats(Some(&caps), false);
        let output = supported_formats(Some(&caps), true);
        assert_eq!(input[0], V::Rgba);
        assert!(input.contains(&V::Nv12_4l4));
        assert!(!output.contains(&V::Nv12_4l4));
        assert!(output.contains(&V::P010_10le));
        assert!(output.contains(&V::Yuy2));
        for format in [V::V210, V::Y210, V::Y212Le, V::Y410, V::Y412Le, V::P012le, V::Rgb16, V::Bgr16] {
            assert!(output.contains(&format), "{format}");
        }
    }

    #[test]
    fn test_lists_cover_every_format() {
        let all = supported_formats(None, false);
        for format in VideoFormat::ALL {
            if format != V::Rgb8p {
                assert!(all.contains(&format), "{format}");
            }
        }
    }

    #[test]
    fn test_gles2_lists() {
        let caps = DeviceCapabilities::gles2();
        let input = supported_formats(Some(&caps), false);
        let output = supported_formats(Some(&caps), true);

        // luminance uploads keep planar input readable
        assert!(input.contains(&V::Nv12));
        assert!(input.contains(&V::I420));
        assert!(!input.contains(&V::Nv12_4l4));
        assert!(!input.contains(&V::I420_10le));
        assert!(!input.contains(&V::V210));
        assert!(!input.contains(&V::Y210));
        assert!(output.contains(&V::Rgb16));

        assert!(!output.contains(&V::Nv12));
        assert!(!output.contains(&V::Yuy2));
        assert!(!output.contains(&V::Rgba64Le));
        assert!(output.contains(&V::Rgba));
    }

    #[test]
    fn test_filtered_lists_keep_order() {
        let rgb = supported_rgb_formats(None, true);
        assert_eq!(&rgb[..4], &[V::Rgba, V::Argb, V::Bgra, V::Abgr]);
        let yuv = supported_planar_yuv_formats(None, true);
        assert_eq!(yuv[0], V::Y444);
        assert!(yuv.iter().all(|f| supports_yuv_yuv_conversion(f.info())));
    }
}
