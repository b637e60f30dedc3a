/// Piecewise-linear curve over explicit control points.
///
/// Inputs between two stops are interpolated linearly. Inputs outside the
/// stop range continue along the slope of the nearest outer segment, so
/// `eval` is total over every finite input.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearCurve {
    stops: Vec<(f64, f64)>,
}

impl LinearCurve {
    /// Build a curve from `(input, output)` stops. Stops are sorted by input.
    pub fn new(mut stops: Vec<(f64, f64)>) -> Self {
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { stops }
    }

    /// A curve that returns `value` everywhere
    pub fn constant(value: f64) -> Self {
        Self {
            stops: vec![(0.0, value)],
        }
    }

    pub fn stops(&self) -> &[(f64, f64)] {
        &self.stops
    }

    pub fn eval(&self, x: f64) -> f64 {
        match self.stops.as_slice() {
            [] => 0.0,
            [(_, y)] => *y,
            stops => {
                // Pick the segment containing x, or the outer segment on either side
                let last = stops.len() - 1;
                let seg = stops
                    .windows(2)
                    .position(|w| x <= w[1].0)
                    .unwrap_or(last - 1);
                let (x0, y0) = stops[seg];
                let (x1, y1) = stops[seg + 1];
                if x1 == x0 {
                    return y1;
                }
                y0 + (x - x0) * (y1 - y0) / (x1 - x0)
            }
        }
    }
}

/// 8-bit color with a fractional alpha channel
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: (self.a * opacity).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Alpha-composite this color over an opaque background
    pub fn over(self, bg: (u8, u8, u8)) -> (u8, u8, u8) {
        let mix = |fg: u8, bg: u8| -> u8 {
            (fg as f64 * self.a + bg as f64 * (1.0 - self.a)).round() as u8
        };
        (mix(self.r, bg.0), mix(self.g, bg.1), mix(self.b, bg.2))
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        let ch = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * t).round() as u8 };
        Self {
            r: ch(self.r, other.r),
            g: ch(self.g, other.g),
            b: ch(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Rough perceived brightness, used to check ramp ordering
    pub fn luminance(self) -> f64 {
        (0.2126 * self.r as f64 + 0.7152 * self.g as f64 + 0.0722 * self.b as f64) / 255.0
    }
}

/// Color ramp over density in [0, 1]
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRamp {
    stops: Vec<(f64, Rgba)>,
}

impl ColorRamp {
    pub fn new(mut stops: Vec<(f64, Rgba)>) -> Self {
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { stops }
    }

    pub fn stops(&self) -> &[(f64, Rgba)] {
        &self.stops
    }

    /// Density is clamped into [0, 1] before lookup; the ramp never extrapolates.
    pub fn eval(&self, density: f64) -> Rgba {
        let d = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        let Some(&(first_x, first_c)) = self.stops.first() else {
            return Rgba::rgba(0, 0, 0, 0.0);
        };
        if d <= first_x {
            return first_c;
        }
        for w in self.stops.windows(2) {
            let (x0, c0) = w[0];
            let (x1, c1) = w[1];
            if d <= x1 {
                if x1 == x0 {
                    return c1;
                }
                return c0.lerp(c1, (d - x0) / (x1 - x0));
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}

/// Risk score 0..6 to weight 0..1
pub fn weight_curve() -> LinearCurve {
    LinearCurve::new(vec![(0.0, 0.0), (6.0, 1.0)])
}

/// Zoom 0..9 to intensity 1..3
pub fn intensity_curve() -> LinearCurve {
    LinearCurve::new(vec![(0.0, 1.0), (9.0, 3.0)])
}

/// Zoom 0..9 to kernel radius 2..20 px
pub fn radius_curve() -> LinearCurve {
    LinearCurve::new(vec![(0.0, 2.0), (9.0, 20.0)])
}

/// Transparent blue through white to opaque red
pub fn density_ramp() -> ColorRamp {
    ColorRamp::new(vec![
        (0.0, Rgba::rgba(33, 102, 172, 0.0)),
        (0.2, Rgba::rgb(103, 169, 207)),
        (0.4, Rgba::rgb(209, 229, 240)),
        (0.6, Rgba::rgb(253, 219, 199)),
        (0.8, Rgba::rgb(239, 138, 98)),
        (1.0, Rgba::rgb(178, 24, 43)),
    ])
}

pub const DENSITY_OPACITY: f64 = 0.7;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_range_and_monotonic() {
        let curve = weight_curve();
        let mut prev = f64::MIN;
        for i in 0..=60 {
            let w = curve.eval(i as f64 / 10.0);
            assert!((0.0..=1.0).contains(&w));
            assert!(w >= prev);
            prev = w;
        }
    }

    #[test]
    fn test_intensity_and_radius_over_zoom_range() {
        let intensity = intensity_curve();
        let radius = radius_curve();
        let (mut prev_i, mut prev_r) = (f64::MIN, f64::MIN);
        for i in 0..=90 {
            let z = i as f64 / 10.0;
            let (v, r) = (intensity.eval(z), radius.eval(z));
            assert!((1.0..=3.0).contains(&v), "intensity {v} at zoom {z}");
            assert!((2.0..=20.0).contains(&r), "radius {r} at zoom {z}");
            assert!(v >= prev_i && r >= prev_r);
            prev_i = v;
            prev_r = r;
        }
    }

    #[test]
    fn test_extrapolates_outside_stops() {
        let curve = weight_curve();
        assert!((curve.eval(12.0) - 2.0).abs() < 1e-12);
        assert!((curve.eval(-3.0) + 0.5).abs() < 1e-12);

        // Zoom 11 is past the last radius stop
        assert!((radius_curve().eval(11.0) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_curve() {
        let c = LinearCurve::constant(0.7);
        assert_eq!(c.eval(-100.0), 0.7);
        assert_eq!(c.eval(100.0), 0.7);
    }

    #[test]
    fn test_ramp_endpoints_and_clamp() {
        let ramp = density_ramp();
        assert_eq!(ramp.eval(0.0).a, 0.0);
        assert_eq!(ramp.eval(-1.0), ramp.eval(0.0));
        assert_eq!(ramp.eval(1.0), Rgba::rgb(178, 24, 43));
        assert_eq!(ramp.eval(5.0), Rgba::rgb(178, 24, 43));
        assert_eq!(ramp.eval(0.4), Rgba::rgb(209, 229, 240));
    }

    #[test]
    fn test_ramp_midpoint_lerp() {
        let c = density_ramp().eval(0.1);
        // Halfway between stop 0 and stop 0.2
        assert_eq!((c.r, c.g, c.b), (68, 136, 190));
        assert!((c.a - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_over_blends_with_background() {
        let c = Rgba::rgba(200, 100, 0, 0.5);
        assert_eq!(c.over((0, 0, 0)), (100, 50, 0));
        assert_eq!(Rgba::rgb(1, 2, 3).over((9, 9, 9)), (1, 2, 3));
    }
}
