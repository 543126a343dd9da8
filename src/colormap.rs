/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (straight, not premultiplied).
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    /// Opaque blue, used for the vehicle footprint outline.
    pub const BLUE: Self = Self::opaque(0, 0, 255);

    /// Build an opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Diverging colormap defined by evenly spaced opaque anchor colors.
///
/// Sampling interpolates linearly between neighbouring anchors; the input is
/// clamped to [0, 1].
#[derive(Clone, Copy, Debug)]
pub struct DivergingMap {
    anchors: &'static [[u8; 3]],
}

/// The RdYlGn scale: red at 0, yellow at 0.5, green at 1.
pub const RD_YL_GN: DivergingMap = DivergingMap {
    anchors: &[
        [0xa5, 0x00, 0x26],
        [0xd7, 0x30, 0x27],
        [0xf4, 0x6d, 0x43],
        [0xfd, 0xae, 0x61],
        [0xfe, 0xe0, 0x8b],
        [0xff, 0xff, 0xbf],
        [0xd9, 0xef, 0x8b],
        [0xa6, 0xd9, 0x6a],
        [0x66, 0xbd, 0x63],
        [0x1a, 0x98, 0x50],
        [0x00, 0x68, 0x37],
    ],
};

impl DivergingMap {
    /// Sample the map at `t`, clamping to [0, 1].
    pub fn sample(&self, t: f64) -> Rgba8 {
        let t = t.clamp(0.0, 1.0);
        let last = self.anchors.len() - 1;
        let scaled = t * last as f64;
        let lo = (scaled.floor() as usize).min(last);
        let hi = (lo + 1).min(last);
        let frac = scaled - lo as f64;

        let lerp = |a: u8, b: u8| -> u8 {
            let af = f64::from(a);
            let bf = f64::from(b);
            (af + (bf - af) * frac).round().clamp(0.0, 255.0) as u8
        };

        Rgba8::opaque(
            lerp(self.anchors[lo][0], self.anchors[hi][0]),
            lerp(self.anchors[lo][1], self.anchors[hi][1]),
            lerp(self.anchors[lo][2], self.anchors[hi][2]),
        )
    }
}
