//! Palette builder for indexed targets.
//!
//! Images with no more distinct colors than the palette capacity get an exact
//! palette in first-seen raster order. Anything larger goes through a
//! deterministic median cut: the box with the largest squared error is split
//! at the weighted median of its widest channel until the capacity is reached,
//! then every pixel is mapped to its nearest representative.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use rgb::RGBA8;

use crate::error::TextureError;

/// How to handle an image with more colors than the palette holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PaletteMode {
    /// Fall back to median-cut quantization.
    #[default]
    Quantize,
    /// Fail with [`TextureError::CapacityExceeded`].
    Exact,
}

/// Palette plus one index per pixel, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedImage {
    palette: Vec<RGBA8>,
    indices: Vec<u8>,
    exact: bool,
}

impl IndexedImage {
    pub fn palette(&self) -> &[RGBA8] {
        &self.palette
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// True when every source color is present in the palette unchanged.
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn into_parts(self) -> (Vec<RGBA8>, Vec<u8>) {
        (self.palette, self.indices)
    }
}

#[inline]
fn key(px: RGBA8) -> u32 {
    u32::from_be_bytes([px.r, px.g, px.b, px.a])
}

#[inline]
fn from_key(k: u32) -> [u8; 4] {
    k.to_be_bytes()
}

/// Build a palette of at most `capacity` colors (1..=256) for `pixels`.
pub fn build_palette(
    pixels: &[RGBA8],
    capacity: usize,
    mode: PaletteMode,
) -> Result<IndexedImage, TextureError> {
    if pixels.is_empty() {
        return Err(TextureError::InvariantViolation(
            "cannot build a palette for an empty image".into(),
        ));
    }
    if capacity == 0 || capacity > 256 {
        return Err(TextureError::InvariantViolation(alloc::format!(
            "palette capacity must be 1..=256, got {capacity}"
        )));
    }

    if let Some(exact) = exact_palette(pixels, capacity) {
        return Ok(exact);
    }

    match mode {
        PaletteMode::Exact => {
            let distinct = histogram(pixels).len();
            Err(TextureError::CapacityExceeded {
                needed: distinct,
                capacity,
            })
        }
        PaletteMode::Quantize => {
            log::debug!(
                "palette: more than {capacity} distinct colors, quantizing {} pixels",
                pixels.len()
            );
            Ok(median_cut(pixels, capacity))
        }
    }
}

/// First-seen ordered palette, or `None` as soon as it would exceed `capacity`.
fn exact_palette(pixels: &[RGBA8], capacity: usize) -> Option<IndexedImage> {
    let mut lookup: BTreeMap<u32, u8> = BTreeMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity(pixels.len());

    for &px in pixels {
        let k = key(px);
        let index = match lookup.get(&k) {
            Some(&i) => i,
            None => {
                if palette.len() == capacity {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push(px);
                lookup.insert(k, i);
                i
            }
        };
        indices.push(index);
    }

    Some(IndexedImage {
        palette,
        indices,
        exact: true,
    })
}

/// Distinct colors with pixel counts, ordered by packed value.
fn histogram(pixels: &[RGBA8]) -> Vec<([u8; 4], u64)> {
    let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
    for &px in pixels {
        *counts.entry(key(px)).or_insert(0) += 1;
    }
    counts.into_iter().map(|(k, n)| (from_key(k), n)).collect()
}

#[derive(Clone, Copy, Debug)]
struct ColorBox {
    start: usize,
    end: usize,
}

/// Per-channel weighted sums over a range of histogram entries.
struct BoxStats {
    weight: u64,
    sum: [u64; 4],
    sum_sq: [u64; 4],
}

impl BoxStats {
    fn of(colors: &[([u8; 4], u64)]) -> Self {
        let mut stats = BoxStats {
            weight: 0,
            sum: [0; 4],
            sum_sq: [0; 4],
        };
        for (c, w) in colors {
            stats.weight += w;
            for ch in 0..4 {
                let v = u64::from(c[ch]);
                stats.sum[ch] += v * w;
                stats.sum_sq[ch] += v * v * w;
            }
        }
        stats
    }

    /// Summed squared error of channel `ch` around its weighted mean.
    fn channel_error(&self, ch: usize) -> f64 {
        if self.weight == 0 {
            return 0.0;
        }
        let s = self.sum[ch] as f64;
        self.sum_sq[ch] as f64 - s * s / self.weight as f64
    }

    fn error(&self) -> f64 {
        (0..4).map(|ch| self.channel_error(ch)).sum()
    }

    fn widest_channel(&self) -> usize {
        let mut best = 0;
        for ch in 1..4 {
            if self.channel_error(ch) > self.channel_error(best) {
                best = ch;
            }
        }
        best
    }

    fn mean(&self) -> RGBA8 {
        let w = self.weight.max(1);
        let m = |ch: usize| ((self.sum[ch] + w / 2) / w) as u8;
        RGBA8::new(m(0), m(1), m(2), m(3))
    }
}

fn median_cut(pixels: &[RGBA8], capacity: usize) -> IndexedImage {
    let mut colors = histogram(pixels);
    let mut boxes = alloc::vec![ColorBox {
        start: 0,
        end: colors.len(),
    }];

    while boxes.len() < capacity {
        // Largest error among boxes that still hold two or more colors; ties keep the earliest.
        let mut pick: Option<(usize, f64)> = None;
        for (i, b) in boxes.iter().enumerate() {
            if b.end - b.start < 2 {
                continue;
            }
            let err = BoxStats::of(&colors[b.start..b.end]).error();
            if pick.is_none_or(|(_, best)| err > best) {
                pick = Some((i, err));
            }
        }
        let Some((i, _)) = pick else { break };

        let b = boxes[i];
        let slice = &mut colors[b.start..b.end];
        let stats = BoxStats::of(slice);
        let ch = stats.widest_channel();
        slice.sort_by(|(ca, _), (cb, _)| ca[ch].cmp(&cb[ch]).then(ca.cmp(cb)));

        let half = stats.weight.div_ceil(2);
        let mut acc = 0u64;
        let mut split = slice.len() - 1;
        for (j, (_, w)) in slice.iter().enumerate() {
            acc += w;
            if acc >= half {
                split = j + 1;
                break;
            }
        }
        let split = split.clamp(1, slice.len() - 1);

        boxes[i] = ColorBox {
            start: b.start,
            end: b.start + split,
        };
        boxes.push(ColorBox {
            start: b.start + split,
            end: b.end,
        });
    }

    let palette: Vec<RGBA8> = boxes
        .iter()
        .map(|b| BoxStats::of(&colors[b.start..b.end]).mean())
        .collect();

    let indices = remap(pixels, &palette);
    IndexedImage {
        palette,
        indices,
        exact: false,
    }
}

/// Nearest palette entry per pixel (squared RGBA distance, ties to the lower index).
fn remap(pixels: &[RGBA8], palette: &[RGBA8]) -> Vec<u8> {
    let mut cache: BTreeMap<u32, u8> = BTreeMap::new();
    pixels
        .iter()
        .map(|&px| {
            *cache.entry(key(px)).or_insert_with(|| nearest(px, palette))
        })
        .collect()
}

fn nearest(px: RGBA8, palette: &[RGBA8]) -> u8 {
    let dist = |c: &RGBA8| {
        let d = |a: u8, b: u8| {
            let v = i32::from(a) - i32::from(b);
            (v * v) as u32
        };
        d(px.r, c.r) + d(px.g, c.g) + d(px.b, c.b) + d(px.a, c.a)
    };
    let mut best = 0usize;
    let mut best_dist = u32::MAX;
    for (i, c) in palette.iter().enumerate() {
        let dd = dist(c);
        if dd < best_dist {
            best = i;
            best_dist = dd;
        }
    }
    best as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn noise(n: usize) -> Vec<RGBA8> {
        let mut state: u32 = 0xDEAD_BEEF;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let [r, g, b, a] = state.to_le_bytes();
                RGBA8::new(r, g, b, a)
            })
            .collect()
    }

    #[test]
    fn exact_palette_keeps_first_seen_order() {
        let red = RGBA8::new(255, 0, 0, 255);
        let blue = RGBA8::new(0, 0, 255, 255);
        let clear = RGBA8::new(0, 0, 0, 0);
        let pixels = vec![blue, blue, red, clear, blue, red];
        let result = build_palette(&pixels, 4, PaletteMode::Quantize).unwrap();
        assert!(result.is_exact());
        assert_eq!(result.palette(), &[blue, red, clear]);
        assert_eq!(result.indices(), &[0, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn exact_mode_reports_overflow() {
        let pixels = noise(64);
        let err = build_palette(&pixels, 16, PaletteMode::Exact).unwrap_err();
        assert!(matches!(
            err,
            TextureError::CapacityExceeded { capacity: 16, .. }
        ));
    }

    #[test]
    fn fallback_is_deterministic() {
        let pixels = noise(4096);
        let a = build_palette(&pixels, 16, PaletteMode::Quantize).unwrap();
        let b = build_palette(&pixels, 16, PaletteMode::Quantize).unwrap();
        assert!(!a.is_exact());
        assert_eq!(a, b);
        assert_eq!(a.palette().len(), 16);
        assert_eq!(a.indices().len(), pixels.len());
        assert!(a.indices().iter().all(|&i| (i as usize) < a.palette().len()));
    }

    #[test]
    fn fallback_separates_clusters() {
        // Two tight clusters of 40 shades each must end up on distinct entries.
        let mut pixels = Vec::new();
        for i in 0..40u8 {
            pixels.push(RGBA8::new(i, 0, 0, 255));
            pixels.push(RGBA8::new(0, 0, 215 + i, 255));
        }
        let result = build_palette(&pixels, 2, PaletteMode::Quantize).unwrap();
        assert_eq!(result.palette().len(), 2);
        let dark = result.indices()[0];
        let blue = result.indices()[1];
        assert_ne!(dark, blue);
        for pair in result.indices().chunks_exact(2) {
            assert_eq!(pair, &[dark, blue]);
        }
    }

    #[test]
    fn quantized_colors_stay_close() {
        let pixels: Vec<RGBA8> = (0..=255u8).map(|v| RGBA8::new(v, v, v, 255)).collect();
        let result = build_palette(&pixels, 16, PaletteMode::Quantize).unwrap();
        for (px, &i) in pixels.iter().zip(result.indices()) {
            let q = result.palette()[i as usize];
            assert!(px.r.abs_diff(q.r) <= 16, "{px:?} → {q:?}");
        }
    }

    #[test]
    fn invalid_capacity_rejected() {
        let pixels = vec![RGBA8::default()];
        assert!(build_palette(&pixels, 0, PaletteMode::Quantize).is_err());
        assert!(build_palette(&pixels, 257, PaletteMode::Quantize).is_err());
        assert!(build_palette(&[], 16, PaletteMode::Quantize).is_err());
    }
}
