//! Negotiation tests for texconv-caps.

use texconv_caps::{
    fixate_caps, fixate_format, transform_caps, Caps, CapsStructure, PadDirection,
};
use texconv_core::{DeviceCapabilities, Error, TextureTarget, VideoFormat};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_fixation_is_deterministic() {
    let candidates = texconv_caps::supported_formats(None, true);
    for input in VideoFormat::ALL {
        let first = fixate_format(input, &candidates);
        for _ in 0..8 {
            assert_eq!(fixate_format(input, &candidates), first, "{input}");
        }
    }
}

#[test]
fn test_identity_wins_with_zero_loss() {
    let candidates = texconv_caps::supported_formats(None, false);
    for input in candidates.iter().copied() {
        assert_eq!(fixate_format(input, &candidates), Some((input, 0)), "{input}");
    }
}

#[test]
fn test_rgba_example() {
    let picked = fixate_format(
        VideoFormat::Rgba,
        &[VideoFormat::I420, VideoFormat::Rgba, VideoFormat::Gray8],
    );
    assert_eq!(picked, Some((VideoFormat::Rgba, 0)));
}

#[test]
fn test_output_target_never_external() {
    init_tracing();
    let device = DeviceCapabilities::full();
    for input in [VideoFormat::Nv12, VideoFormat::Rgba, VideoFormat::I420] {
        let caps: Caps = CapsStructure::gpu(&[input])
            .with_size(320, 240)
            .with_targets(&[TextureTarget::ExternalOes])
            .into();
        let reachable = transform_caps(Some(&device), PadDirection::Sink, &caps, None);
        let downstream: Caps = CapsStructure::gpu(&[VideoFormat::Bgrx, VideoFormat::Y444])
            .with_targets(&[TextureTarget::ExternalOes, TextureTarget::TwoD])
            .into();
        let offered = downstream.intersect(&reachable);
        let fixed = fixate_caps(PadDirection::Sink, &caps, &offered).unwrap();
        let st = fixed.first().unwrap();
        assert_ne!(st.texture_target().unwrap(), TextureTarget::ExternalOes, "{input}");
        assert_ne!(st.formats[0], input);
    }
}

#[test]
fn test_passthrough_preferred() {
    init_tracing();
    let caps: Caps = CapsStructure::gpu(&[VideoFormat::Nv12])
        .with_size(1280, 720)
        .with_targets(&[TextureTarget::TwoD])
        .into();
    let reachable = transform_caps(None, PadDirection::Sink, &caps, None);
    let fixed = fixate_caps(PadDirection::Sink, &caps, &reachable).unwrap();
    assert_eq!(fixed, caps);
}

#[test]
fn test_gles2_never_offers_planar_output() {
    let device = DeviceCapabilities::gles2();
    let caps: Caps = CapsStructure::gpu(&[VideoFormat::Rgba]).with_size(64, 64).into();
    let reachable = transform_caps(Some(&device), PadDirection::Sink, &caps, None);
    for st in reachable.iter() {
        assert!(st.formats.iter().all(|f| f.info().n_planes == 1), "{st}");
    }
}

#[test]
fn test_no_reachable_format_is_an_error() {
    let caps: Caps = CapsStructure::gpu(&[VideoFormat::Nv21]).with_size(64, 64).into();
    let downstream: Caps = CapsStructure::gpu(&[VideoFormat::Y444, VideoFormat::I420]).into();
    let err = fixate_caps(PadDirection::Sink, &caps, &downstream).unwrap_err();
    assert!(matches!(err, Error::NegotiationFailed { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn test_fixated_caps_build_info() {
    let caps: Caps = CapsStructure::gpu(&[VideoFormat::Rgba]).with_size(64, 48).into();
    let downstream: Caps = CapsStructure::gpu(&[VideoFormat::Nv12]).into();
    let reachable = transform_caps(None, PadDirection::Sink, &caps, Some(&downstream));
    let fixed = fixate_caps(PadDirection::Sink, &caps, &reachable).unwrap();
    let (info, target) = fixed.to_info().unwrap();
    assert_eq!(info.format, VideoFormat::Nv12);
    assert_eq!((info.width, info.height), (64, 48));
    assert_eq!(target, TextureTarget::TwoD);
}
