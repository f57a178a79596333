//! Caps: sets of acceptable video formats exchanged during negotiation.
//!
//! A [`Caps`] is an ordered list of [`CapsStructure`]s. Each structure
//! restricts the memory feature, the format list, the frame size, the texture
//! targets and the colorimetry. Unset fields (empty lists, `None`) accept
//! anything. Order matters: earlier structures and earlier list entries are
//! preferred by intersection and fixation.

use std::fmt;

use texconv_core::{
    ChromaSite, Colorimetry, Error, Result, TargetMask, TextureTarget, VideoFormat, VideoInfo,
};

/// Side of a conversion element a caps set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadDirection {
    /// Input side.
    Sink,
    /// Output side.
    Src,
}

impl PadDirection {
    /// The other side.
    pub fn opposite(self) -> Self {
        match self {
            Self::Sink => Self::Src,
            Self::Src => Self::Sink,
        }
    }
}

/// Where the frames described by a structure live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapsFeature {
    /// Planes are GPU textures.
    GpuMemory,
    /// Planes are in system memory.
    SystemMemory,
    /// Any memory.
    Any,
}

impl CapsFeature {
    fn intersect(self, other: Self) -> Option<Self> {
        match (self, other) {
            (Self::Any, o) => Some(o),
            (s, Self::Any) => Some(s),
            (a, b) if a == b => Some(a),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::GpuMemory => "memory:GPUMemory",
            Self::SystemMemory => "memory:SystemMemory",
            Self::Any => "ANY",
        }
    }
}

/// One alternative in a [`Caps`] set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsStructure {
    /// Memory feature.
    pub feature: CapsFeature,
    /// Acceptable formats in preference order; empty accepts any.
    pub formats: Vec<VideoFormat>,
    /// Fixed width.
    pub width: Option<u32>,
    /// Fixed height.
    pub height: Option<u32>,
    /// Acceptable texture targets; empty accepts any.
    pub texture_targets: TargetMask,
    /// Colorimetry.
    pub colorimetry: Option<Colorimetry>,
    /// Chroma siting.
    pub chroma_site: Option<ChromaSite>,
    /// Number of views.
    pub views: Option<u32>,
}

impl CapsStructure {
    /// GPU memory structure accepting `formats`.
    pub fn gpu(formats: &[VideoFormat]) -> Self {
        Self::with_feature(CapsFeature::GpuMemory, formats)
    }

    /// System memory structure accepting `formats`.
    pub fn system(formats: &[VideoFormat]) -> Self {
        Self::with_feature(CapsFeature::SystemMemory, formats)
    }

    fn with_feature(feature: CapsFeature, formats: &[VideoFormat]) -> Self {
        Self {
            feature,
            formats: formats.to_vec(),
            width: None,
            height: None,
            texture_targets: TargetMask::EMPTY,
            colorimetry: None,
            chroma_site: None,
            views: None,
        }
    }

    /// Fixed GPU structure describing `info` stored in `target` textures.
    pub fn from_info(info: &VideoInfo, target: TextureTarget) -> Self {
        Self {
            feature: CapsFeature::GpuMemory,
            formats: vec![info.format],
            width: Some(info.width),
            height: Some(info.height),
            texture_targets: target.mask(),
            colorimetry: Some(info.colorimetry),
            chroma_site: Some(info.chroma_site),
            views: Some(info.views),
        }
    }

    /// Sets the frame size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Restricts the texture targets.
    pub fn with_targets(mut self, targets: &[TextureTarget]) -> Self {
        self.texture_targets = TargetMask::from_targets(targets);
        self
    }

    /// Sets the colorimetry.
    pub fn with_colorimetry(mut self, colorimetry: Colorimetry) -> Self {
        self.colorimetry = Some(colorimetry);
        self
    }

    /// Sets the chroma siting.
    pub fn with_chroma_site(mut self, site: ChromaSite) -> Self {
        self.chroma_site = Some(site);
        self
    }

    /// Sets the number of views.
    pub fn with_views(mut self, views: u32) -> Self {
        self.views = Some(views);
        self
    }

    /// Whether the structure accepts `format`.
    pub fn accepts_format(&self, format: VideoFormat) -> bool {
        self.formats.is_empty() || self.formats.contains(&format)
    }

    /// Common subset of two structures, keeping `self`'s list order.
    pub fn intersect(&self, other: &CapsStructure) -> Option<CapsStructure> {
        let feature = self.feature.intersect(other.feature)?;

        let formats = match (self.formats.is_empty(), other.formats.is_empty()) {
            (true, _) => other.formats.clone(),
            (_, true) => self.formats.clone(),
            _ => {
                let common: Vec<_> = self
                    .formats
                    .iter()
                    .copied()
                    .filter(|f| other.formats.contains(f))
                    .collect();
                if common.is_empty() {
                    return None;
                }
                common
            }
        };

        let texture_targets = match (self.texture_targets.is_empty(), other.texture_targets.is_empty()) {
            (true, _) => other.texture_targets,
            (_, true) => self.texture_targets,
            _ => {
                let common = self.texture_targets.intersect(other.texture_targets);
                if common.is_empty() {
                    return None;
                }
                common
            }
        };

        Some(CapsStructure {
            feature,
            formats,
            width: intersect_field(self.width, other.width)?,
            height: intersect_field(self.height, other.height)?,
            texture_targets,
            colorimetry: intersect_field(self.colorimetry, other.colorimetry)?,
            chroma_site: intersect_field(self.chroma_site, other.chroma_site)?,
            views: intersect_field(self.views, other.views)?,
        })
    }

    /// Whether everything `self` accepts is accepted by `other`.
    pub fn is_subset_of(&self, other: &CapsStructure) -> bool {
        let feature = other.feature == CapsFeature::Any || self.feature == other.feature;
        let formats = other.formats.is_empty()
            || (!self.formats.is_empty() && self.formats.iter().all(|f| other.formats.contains(f)));
        let targets = other.texture_targets.is_empty()
            || (!self.texture_targets.is_empty()
                && self.texture_targets.intersect(other.texture_targets) == self.texture_targets);
        feature
            && formats
            && targets
            && subset_field(self.width, other.width)
            && subset_field(self.height, other.height)
            && subset_field(self.colorimetry, other.colorimetry)
            && subset_field(self.chroma_site, other.chroma_site)
            && subset_field(self.views, other.views)
    }

    /// Whether the structure describes exactly one frame layout.
    pub fn is_fixed(&self) -> bool {
        self.feature != CapsFeature::Any
            && self.formats.len() == 1
            && self.width.is_some()
            && self.height.is_some()
            && self.texture_targets.len() <= 1
    }

    /// Narrows every list to its first (most preferred) entry.
    pub fn fixate(&self) -> CapsStructure {
        let mut fixed = self.clone();
        fixed.formats.truncate(1);
        if let Some(target) = self.texture_targets.first() {
            fixed.texture_targets = target.mask();
        }
        if fixed.feature == CapsFeature::Any {
            fixed.feature = CapsFeature::SystemMemory;
        }
        fixed
    }

    /// The single texture target; 2D when unrestricted.
    pub fn texture_target(&self) -> Result<TextureTarget> {
        match self.texture_targets.len() {
            0 => Ok(TextureTarget::TwoD),
            1 => self
                .texture_targets
                .first()
                .ok_or_else(|| Error::InvalidCaps("empty texture target".into())),
            _ => Err(Error::InvalidCaps(format!(
                "texture-target {} is not fixed",
                self.texture_targets
            ))),
        }
    }

    /// Builds the [`VideoInfo`] of a fixed structure.
    pub fn to_info(&self) -> Result<VideoInfo> {
        let [format] = self.formats[..] else {
            return Err(Error::InvalidCaps(format!("format is not fixed in {self}")));
        };
        let (Some(width), Some(height)) = (self.width, self.height) else {
            return Err(Error::InvalidCaps(format!("size is not fixed in {self}")));
        };
        let mut info = VideoInfo::new(format, width, height)?;
        if let Some(colorimetry) = self.colorimetry {
            info = info.with_colorimetry(colorimetry);
        }
        if let Some(site) = self.chroma_site {
            info = info.with_chroma_site(site);
        }
        if let Some(views) = self.views {
            info = info.with_views(views);
        }
        Ok(info)
    }
}

fn intersect_field<T: PartialEq + Copy>(a: Option<T>, b: Option<T>) -> Option<Option<T>> {
    match (a, b) {
        (Some(x), Some(y)) if x != y => None,
        (x, y) => Some(x.or(y)),
    }
}

fn subset_field<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    match (a, b) {
        (_, None) => true,
        (Some(x), Some(y)) => x == y,
        (None, Some(_)) => false,
    }
}

impl fmt::Display for CapsStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video/x-raw({})", self.feature.as_str())?;
        match self.formats.as_slice() {
            [] => {}
            [one] => write!(f, ", format={one}")?,
            many => {
                let names: Vec<&str> = many.iter().map(|v| v.name()).collect();
                write!(f, ", format={{ {} }}", names.join(", "))?;
            }
        }
        if let Some(w) = self.width {
            write!(f, ", width={w}")?;
        }
        if let Some(h) = self.height {
            write!(f, ", height={h}")?;
        }
        if !self.texture_targets.is_empty() {
            write!(f, ", texture-target={}", self.texture_targets)?;
        }
        if let Some(c) = self.colorimetry {
            write!(f, ", colorimetry={c}")?;
        }
        if let Some(s) = self.chroma_site {
            write!(f, ", chroma-site={s}")?;
        }
        if let Some(v) = self.views {
            write!(f, ", views={v}")?;
        }
        Ok(())
    }
}

/// Ordered set of [`CapsStructure`] alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Caps {
    structures: Vec<CapsStructure>,
}

impl Caps {
    /// Caps accepting nothing.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Caps holding the given structures.
    pub fn from_structures(structures: Vec<CapsStructure>) -> Self {
        Self { structures }
    }

    /// Fixed GPU caps describing `info`.
    pub fn from_info(info: &VideoInfo, target: TextureTarget) -> Self {
        CapsStructure::from_info(info, target).into()
    }

    /// The structures, in preference order.
    pub fn structures(&self) -> &[CapsStructure] {
        &self.structures
    }

    /// Mutable access to the structures.
    pub fn structures_mut(&mut self) -> &mut Vec<CapsStructure> {
        &mut self.structures
    }

    /// Number of structures.
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    /// Whether nothing is accepted.
    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// First structure.
    pub fn first(&self) -> Option<&CapsStructure> {
        self.structures.first()
    }

    /// Appends a structure unless an identical one is already present.
    pub fn push(&mut self, structure: CapsStructure) {
        if !self.structures.contains(&structure) {
            self.structures.push(structure);
        }
    }

    /// Iterates the structures.
    pub fn iter(&self) -> impl Iterator<Item = &CapsStructure> {
        self.structures.iter()
    }

    /// Common subset, ordered by `self` first.
    pub fn intersect(&self, other: &Caps) -> Caps {
        let mut out = Caps::new_empty();
        for a in &self.structures {
            for b in &other.structures {
                if let Some(s) = a.intersect(b) {
                    out.push(s);
                }
            }
        }
        out
    }

    /// Whether every structure of `self` is contained in some structure of `other`.
    pub fn is_subset_of(&self, other: &Caps) -> bool {
        self.structures
            .iter()
            .all(|a| other.structures.iter().any(|b| a.is_subset_of(b)))
    }

    /// Whether the caps hold exactly one fixed structure.
    pub fn is_fixed(&self) -> bool {
        matches!(self.structures.as_slice(), [s] if s.is_fixed())
    }

    /// Keeps the first structure, narrowed to its first entries.
    pub fn fixate(&self) -> Caps {
        match self.structures.first() {
            Some(s) => s.fixate().into(),
            None => Caps::new_empty(),
        }
    }

    /// Builds the [`VideoInfo`] and texture target of fixed caps.
    pub fn to_info(&self) -> Result<(VideoInfo, TextureTarget)> {
        let s = self
            .first()
            .filter(|_| self.len() == 1)
            .ok_or_else(|| Error::InvalidCaps(format!("caps are not fixed: {self}")))?;
        Ok((s.to_info()?, s.texture_target()?))
    }
}

impl From<CapsStructure> for Caps {
    fn from(structure: CapsStructure) -> Self {
        Self { structures: vec![structure] }
    }
}

impl fmt::Display for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.structures.is_empty() {
            return f.write_str("EMPTY");
        }
        for (i, s) in self.structures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersect_keeps_first_order() {
        let a = CapsStructure::gpu(&[VideoFormat::Nv12, VideoFormat::Rgba, VideoFormat::I420]);
        let b = CapsStructure::gpu(&[VideoFormat::I420, VideoFormat::Nv12]).with_size(64, 48);
        let c = a.intersect(&b).unwrap();
        assert_eq!(c.formats, vec![VideoFormat::Nv12, VideoFormat::I420]);
        assert_eq!(c.width, Some(64));

        let d = b.intersect(&a).unwrap();
        assert_eq!(d.formats, vec![VideoFormat::I420, VideoFormat::Nv12]);
    }

    #[test]
    fn test_intersect_conflicts() {
        let a = CapsStructure::gpu(&[VideoFormat::Rgba]).with_size(64, 48);
        assert!(a.intersect(&CapsStructure::gpu(&[VideoFormat::Nv12])).is_none());
        assert!(a.intersect(&CapsStructure::gpu(&[]).with_size(32, 48)).is_none());
        assert!(a.intersect(&CapsStructure::system(&[VideoFormat::Rgba])).is_none());

        let ext = CapsStructure::gpu(&[]).with_targets(&[TextureTarget::ExternalOes]);
        let two_d = CapsStructure::gpu(&[]).with_targets(&[TextureTarget::TwoD]);
        assert!(ext.intersect(&two_d).is_none());
    }

    #[test]
    fn test_fixate_and_info() {
        let s = CapsStructure::gpu(&[VideoFormat::I420, VideoFormat::Nv12])
            .with_size(640, 480)
            .with_targets(&[TextureTarget::Rectangle, TextureTarget::TwoD]);
        assert!(!s.is_fixed());
        let fixed = s.fixate();
        assert!(fixed.is_fixed());
        assert_eq!(fixed.formats, vec![VideoFormat::I420]);
        assert_eq!(fixed.texture_target().unwrap(), TextureTarget::TwoD);

        let (info, target) = Caps::from(fixed).to_info().unwrap();
        assert_eq!(info.format, VideoFormat::I420);
        assert_eq!(info.colorimetry, Colorimetry::BT601);
        assert_eq!(target, TextureTarget::TwoD);
    }

    #[test]
    fn test_unfixed_info_rejected() {
        let s = CapsStructure::gpu(&[VideoFormat::I420, VideoFormat::Nv12]).with_size(8, 8);
        assert!(matches!(s.to_info(), Err(Error::InvalidCaps(_))));
        let s = CapsStructure::gpu(&[VideoFormat::I420]);
        assert!(s.to_info().is_err());
    }

    #[test]
    fn test_subset() {
        let info = VideoInfo::new(VideoFormat::Rgba, 16, 16).unwrap();
        let fixed = Caps::from_info(&info, TextureTarget::TwoD);
        let open = Caps::from(CapsStructure::gpu(&[VideoFormat::Bgra, VideoFormat::Rgba]));
        assert!(fixed.is_subset_of(&open));
        assert!(!open.is_subset_of(&fixed));
    }

    #[test]
    fn test_display() {
        let s = CapsStructure::gpu(&[VideoFormat::Rgba, VideoFormat::Nv12])
            .with_size(4, 2)
            .with_targets(&[TextureTarget::TwoD]);
        assert_eq!(
            s.to_string(),
            "video/x-raw(memory:GPUMemory), format={ RGBA, NV12 }, width=4, height=2, texture-target={ 2D }"
        );
        assert_eq!(Caps::new_empty().to_string(), "EMPTY");
    }
}
