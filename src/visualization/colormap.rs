//! Colour scales for the heatmaps

use plotters::style::RGBColor;

/// Piecewise-linear colormap through evenly spaced anchors
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Colormap {
    /// Green (low) through yellow to red (high)
    RdYlGnReversed,
    /// Blue (low) through white to red (high)
    Bwr,
}

const RD_YL_GN_R: [(u8, u8, u8); 11] = [
    (0, 104, 55),
    (26, 152, 80),
    (102, 189, 99),
    (166, 217, 106),
    (217, 239, 139),
    (255, 255, 191),
    (254, 224, 139),
    (253, 174, 97),
    (244, 109, 67),
    (215, 48, 39),
    (165, 0, 38),
];

const BWR: [(u8, u8, u8); 3] = [(0, 0, 255), (255, 255, 255), (255, 0, 0)];

impl Colormap {
    fn anchors(&self) -> &'static [(u8, u8, u8)] {
        match self {
            Colormap::RdYlGnReversed => &RD_YL_GN_R,
            Colormap::Bwr => &BWR,
        }
    }

    /// Colour at `u ∈ [0, 1]`; out-of-range values are clamped
    pub fn at(&self, u: f64) -> RGBColor {
        let anchors = self.anchors();
        let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
        let pos = u * (anchors.len() - 1) as f64;
        let k = (pos.floor() as usize).min(anchors.len() - 2);
        let frac = pos - k as f64;

        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        let (a, b) = (anchors[k], anchors[k + 1]);
        RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }
}

/// Maps data values onto a colormap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub vmin: f64,
    pub vmax: f64,
    pub log: bool,
    pub cmap: Colormap,
}

impl ColorScale {
    pub fn linear(vmin: f64, vmax: f64, cmap: Colormap) -> Self {
        let vmax = if vmax > vmin { vmax } else { vmin + 1.0 };
        Self { vmin, vmax, log: false, cmap }
    }

    /// `vmin` must be positive; values at or below it saturate low
    pub fn logarithmic(vmin: f64, vmax: f64, cmap: Colormap) -> Self {
        let vmax = if vmax > vmin { vmax } else { vmin * 10.0 };
        Self { vmin, vmax, log: true, cmap }
    }

    /// Position of `v` on the scale, clamped to `[0, 1]`
    pub fn normalize(&self, v: f64) -> f64 {
        let u = if self.log {
            if v <= 0.0 {
                return 0.0;
            }
            (v.log10() - self.vmin.log10()) / (self.vmax.log10() - self.vmin.log10())
        } else {
            (v - self.vmin) / (self.vmax - self.vmin)
        };
        if u.is_nan() { 0.0 } else { u.clamp(0.0, 1.0) }
    }

    /// Inverse of [`ColorScale::normalize`] for `u ∈ [0, 1]`
    pub fn value_at(&self, u: f64) -> f64 {
        if self.log {
            self.vmin * (self.vmax / self.vmin).powf(u)
        } else {
            self.vmin + (self.vmax - self.vmin) * u
        }
    }

    pub fn color(&self, v: f64) -> RGBColor {
        self.cmap.at(self.normalize(v))
    }
}
