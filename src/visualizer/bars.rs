//! Bar geometry for a spectrum frame on a cell grid.

/// Tallest bar relative to the surface height.
pub const BAR_HEIGHT_RATIO: f32 = 0.8;

/// Color at the top of every bar.
pub const GRADIENT_TOP: (u8, u8, u8) = (0x00, 0xff, 0x88);
pub const GRADIENT_MID: (u8, u8, u8) = (0x00, 0xd4, 0xff);
/// Color at the base of every bar.
pub const GRADIENT_BASE: (u8, u8, u8) = (0x1e, 0x90, 0xff);

/// Surface background.
pub const BACKGROUND: (u8, u8, u8) = (0x0a, 0x0a, 0x0a);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bar {
    /// Left column, relative to the surface.
    pub x: u16,
    pub width: u16,
    /// In cells; fractional parts are drawn with partial blocks.
    pub height: f32,
}

/// One bar per bin, or per averaged group of bins when there are more bins
/// than columns. Empty when the surface has no area.
pub fn layout(frame: &[u8], width: u16, height: u16) -> Vec<Bar> {
    if width == 0 || height == 0 || frame.is_empty() {
        return Vec::new();
    }
    let bins = frame.len();
    let count = bins.min(width as usize);
    let max_height = height as f32 * BAR_HEIGHT_RATIO;

    (0..count)
        .map(|i| {
            let lo = i * bins / count;
            let hi = ((i + 1) * bins / count).max(lo + 1);
            let group = &frame[lo..hi];
            let mean = group.iter().map(|&b| b as f32).sum::<f32>() / group.len() as f32;

            let x = i * width as usize / count;
            let next = (i + 1) * width as usize / count;
            Bar {
                x: x as u16,
                width: (next - x).max(1) as u16,
                height: mean / 255.0 * max_height,
            }
        })
        .collect()
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

/// Gradient color `t` of the way from a bar's top (0) to its base (1).
pub fn gradient_color(t: f32) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    let (from, to, t) = if t <= 0.5 {
        (GRADIENT_TOP, GRADIENT_MID, t * 2.0)
    } else {
        (GRADIENT_MID, GRADIENT_BASE, (t - 0.5) * 2.0)
    };
    (
        lerp(from.0, to.0, t),
        lerp(from.1, to.1, t),
        lerp(from.2, to.2, t),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_stay_within_eighty_percent() {
        let frame: Vec<u8> = (0..128).map(|i| (i * 2) as u8).chain([255]).collect();
        for bar in layout(&frame, 80, 20) {
            assert!(bar.height >= 0.0 && bar.height <= 20.0 * BAR_HEIGHT_RATIO);
        }
        let full = layout(&[255; 4], 4, 10);
        assert!(full.iter().all(|b| (b.height - 8.0).abs() < 1e-4));
    }

    #[test]
    fn silence_draws_flat_bars() {
        assert!(layout(&[0; 128], 40, 10).iter().all(|b| b.height == 0.0));
    }

    #[test]
    fn zero_area_draws_nothing() {
        assert!(layout(&[200; 128], 0, 10).is_empty());
        assert!(layout(&[200; 128], 40, 0).is_empty());
    }

    #[test]
    fn bins_are_averaged_when_wider_than_surface() {
        let bars = layout(&[0, 255, 255, 255], 2, 10);
        assert_eq!(bars.len(), 2);
        assert!((bars[0].height - 4.0).abs() < 1e-4);
        assert!((bars[1].height - 8.0).abs() < 1e-4);
        assert_eq!((bars[1].x, bars[1].width), (1, 1));
    }

    #[test]
    fn narrow_frames_spread_over_the_surface() {
        let bars = layout(&[10, 20, 30, 40], 10, 5);
        assert_eq!(bars.len(), 4);
        assert_eq!(bars.iter().map(|b| b.width).sum::<u16>(), 10);
        assert_eq!(bars[0].x, 0);
        assert!(bars.windows(2).all(|w| w[0].x + w[0].width == w[1].x));
    }

    #[test]
    fn gradient_runs_green_cyan_blue() {
        assert_eq!(gradient_color(0.0), GRADIENT_TOP);
        assert_eq!(gradient_color(0.5), GRADIENT_MID);
        assert_eq!(gradient_color(1.0), GRADIENT_BASE);
        assert_eq!(gradient_color(-3.0), GRADIENT_TOP);
    }
}
