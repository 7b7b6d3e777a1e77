//! Best-effort enhancement of frames for on-screen text legibility.

use crate::config::EnhancementSettings;
use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use thiserror::Error;
use tracing::{debug, warn};

const UPSCALE_FACTOR: f32 = 1.5;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const EDGE_CONTRAST: f32 = 30.0;
const BILATERAL_RADIUS: i32 = 3;
const BILATERAL_SIGMA_SPACE: f32 = 3.0;
const BILATERAL_SIGMA_COLOR: f32 = 25.0;
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

#[derive(Error, Debug)]
enum EnhanceError {
    #[error("image is empty")]
    Empty,
    #[error("image {0}x{1} is too small for {2}")]
    TooSmall(u32, u32, &'static str),
    #[error("invalid parameter: {0}")]
    Parameter(&'static str),
}

type StageResult = std::result::Result<RgbImage, EnhanceError>;

#[derive(Debug, Clone, Copy)]
enum Stage {
    Bilateral,
    EdgeBoost,
    Clahe,
    Sharpen,
    Saturation,
}

/// Enhancement parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementConfig {
    pub upscale: bool,
    pub ui_capture: bool,
    pub edge_boost_ratio: f32,
    pub clahe_clip_limit: f32,
    pub clahe_tiles: u32,
    pub saturation: f32,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self::from(&EnhancementSettings::default())
    }
}

impl From<&EnhancementSettings> for EnhancementConfig {
    fn from(settings: &EnhancementSettings) -> Self {
        Self {
            upscale: settings.upscale,
            ui_capture: settings.ui_capture,
            edge_boost_ratio: settings.edge_boost_ratio,
            clahe_clip_limit: settings.clahe_clip_limit,
            clahe_tiles: settings.clahe_tiles,
            saturation: settings.saturation,
        }
    }
}

/// Runs the enhancement chain: upscale, edge-preserving denoise, edge-masked
/// contrast boost, CLAHE on lightness, sharpen, saturation, downscale.
#[derive(Debug, Clone, Default)]
pub struct ImageEnhancer {
    config: EnhancementConfig,
}

impl ImageEnhancer {
    pub fn new(config: EnhancementConfig) -> Self {
        Self { config }
    }

    /// Enhance a frame. Never fails: when a stage fails the chain stops and
    /// the best image produced so far is returned.
    pub fn enhance(&self, frame: &RgbImage) -> RgbImage {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return frame.clone();
        }

        let mut current = frame.clone();
        let mut upscaled = false;

        if self.config.upscale {
            match upscale(&current) {
                Ok(img) => {
                    current = img;
                    upscaled = true;
                }
                Err(e) => {
                    warn!("Enhancement stopped at upscale: {}", e);
                    return current;
                }
            }
        }

        let mut stages = Vec::with_capacity(5);
        if self.config.ui_capture {
            stages.push(Stage::Bilateral);
        }
        stages.extend([Stage::EdgeBoost, Stage::Clahe, Stage::Sharpen, Stage::Saturation]);

        for stage in stages {
            match self.apply(stage, &current) {
                Ok(img) => current = img,
                Err(e) => {
                    warn!("Enhancement stopped at {:?}: {}", stage, e);
                    break;
                }
            }
        }

        if upscaled && current.dimensions() != (width, height) {
            current = imageops::resize(&current, width, height, FilterType::CatmullRom);
        }

        debug!("Enhanced {}x{} frame", width, height);
        current
    }

    fn apply(&self, stage: Stage, img: &RgbImage) -> StageResult {
        match stage {
            Stage::Bilateral => bilateral_filter(img),
            // The edge-masked boost is optional: failures leave the image unchanged.
            Stage::EdgeBoost => match edge_boost(img, self.config.edge_boost_ratio) {
                Ok(boosted) => Ok(boosted),
                Err(e) => {
                    debug!("Skipping edge boost: {}", e);
                    Ok(img.clone())
                }
            },
            Stage::Clahe => clahe_lightness(img, self.config.clahe_clip_limit, self.config.clahe_tiles),
            Stage::Sharpen => sharpen(img),
            Stage::Saturation => adjust_saturation(img, self.config.saturation),
        }
    }
}

/// Pixel-wise mean of frames with identical dimensions.
///
/// Returns `None` for an empty slice or mismatched sizes.
pub fn average_frames(frames: &[RgbImage]) -> Option<RgbImage> {
    let first = frames.first()?;
    let dims = first.dimensions();
    if frames.iter().any(|f| f.dimensions() != dims) {
        return None;
    }
    if frames.len() == 1 {
        return Some(first.clone());
    }

    let mut sums = vec![0u32; first.as_raw().len()];
    for frame in frames {
        for (sum, &value) in sums.iter_mut().zip(frame.as_raw()) {
            *sum += value as u32;
        }
    }
    let n = frames.len() as u32;
    let data: Vec<u8> = sums.into_iter().map(|s| ((s + n / 2) / n) as u8).collect();
    RgbImage::from_raw(dims.0, dims.1, data)
}

fn upscale(img: &RgbImage) -> StageResult {
    let (w, h) = img.dimensions();
    let new_w = (w as f32 * UPSCALE_FACTOR).round() as u32;
    let new_h = (h as f32 * UPSCALE_FACTOR).round() as u32;
    if new_w == 0 || new_h == 0 {
        return Err(EnhanceError::Empty);
    }
    Ok(imageops::resize(img, new_w, new_h, FilterType::CatmullRom))
}

fn bilateral_filter(img: &RgbImage) -> StageResult {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(EnhanceError::Empty);
    }

    let r = BILATERAL_RADIUS;
    let side = (2 * r + 1) as usize;
    let mut spatial = vec![0f32; side * side];
    for dy in -r..=r {
        for dx in -r..=r {
            let d2 = (dx * dx + dy * dy) as f32;
            spatial[((dy + r) as usize) * side + (dx + r) as usize] =
                (-d2 / (2.0 * BILATERAL_SIGMA_SPACE * BILATERAL_SIGMA_SPACE)).exp();
        }
    }
    let range: Vec<f32> = (0..256)
        .map(|d| {
            let d = d as f32;
            (-d * d / (2.0 * BILATERAL_SIGMA_COLOR * BILATERAL_SIGMA_COLOR)).exp()
        })
        .collect();

    let mut out = RgbImage::new(w, h);
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let center = img.get_pixel(x as u32, y as u32).0;
            let mut acc = [0f32; 3];
            let mut total = 0f32;
            for dy in -r..=r {
                let ny = (y + dy).clamp(0, h as i32 - 1) as u32;
                for dx in -r..=r {
                    let nx = (x + dx).clamp(0, w as i32 - 1) as u32;
                    let p = img.get_pixel(nx, ny).0;
                    let diff = (p[0].abs_diff(center[0]) as u32
                        + p[1].abs_diff(center[1]) as u32
                        + p[2].abs_diff(center[2]) as u32)
                        / 3;
                    let weight =
                        spatial[((dy + r) as usize) * side + (dx + r) as usize] * range[diff as usize];
                    for c in 0..3 {
                        acc[c] += p[c] as f32 * weight;
                    }
                    total += weight;
                }
            }
            let px = [0, 1, 2].map(|c| (acc[c] / total).round().clamp(0.0, 255.0) as u8);
            out.put_pixel(x as u32, y as u32, Rgb(px));
        }
    }
    Ok(out)
}

/// Blend a contrast-boosted copy of the image in along dilated Canny edges.
fn edge_boost(img: &RgbImage, ratio: f32) -> StageResult {
    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return Err(EnhanceError::TooSmall(w, h, "edge detection"));
    }
    if !(0.0..=1.0).contains(&ratio) {
        return Err(EnhanceError::Parameter("edge_boost_ratio must be in [0, 1]"));
    }

    let gray: GrayImage = imageops::grayscale(img);
    let edges = imageproc::edges::canny(&gray, CANNY_LOW, CANNY_HIGH);
    let mask = imageproc::morphology::dilate(&edges, Norm::LInf, 1);
    let boosted = imageops::contrast(img, EDGE_CONTRAST);

    let mut out = img.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if mask.get_pixel(x, y).0[0] == 0 {
            continue;
        }
        let b = boosted.get_pixel(x, y).0;
        for c in 0..3 {
            let blended = pixel.0[c] as f32 * (1.0 - ratio) + b[c] as f32 * ratio;
            pixel.0[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(out)
}

fn sharpen(img: &RgbImage) -> StageResult {
    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return Err(EnhanceError::TooSmall(w, h, "sharpening"));
    }
    Ok(imageops::filter3x3(img, &SHARPEN_KERNEL))
}

// sRGB <-> CIELAB (D65)

const WHITE: [f32; 3] = [0.950_47, 1.0, 1.088_83];

fn srgb_to_linear(v: u8) -> f32 {
    let c = v as f32 / 255.0;
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let v = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

fn lab_f(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

fn rgb_to_lab(p: [u8; 3]) -> [f32; 3] {
    let [r, g, b] = p.map(srgb_to_linear);
    let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
    let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175 * b;
    let z = 0.019_333_9 * r + 0.119_192 * g + 0.950_304_1 * b;
    let (fx, fy, fz) = (lab_f(x / WHITE[0]), lab_f(y / WHITE[1]), lab_f(z / WHITE[2]));
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

fn lab_to_rgb(lab: [f32; 3]) -> [u8; 3] {
    let fy = (lab[0] + 16.0) / 116.0;
    let fx = fy + lab[1] / 500.0;
    let fz = fy - lab[2] / 200.0;
    let x = WHITE[0] * lab_f_inv(fx);
    let y = WHITE[1] * lab_f_inv(fy);
    let z = WHITE[2] * lab_f_inv(fz);
    let r = 3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z;
    let g = -0.969_266 * x + 1.876_010_8 * y + 0.041_556 * z;
    let b = 0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z;
    [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b)]
}

/// Contrast-limited adaptive histogram equalization of the LAB lightness.
fn clahe_lightness(img: &RgbImage, clip_limit: f32, tiles: u32) -> StageResult {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(EnhanceError::Empty);
    }
    if tiles == 0 || clip_limit <= 0.0 {
        return Err(EnhanceError::Parameter("CLAHE needs positive tiles and clip limit"));
    }
    let tiles_x = tiles.min(w);
    let tiles_y = tiles.min(h);

    let lab: Vec<[f32; 3]> = img.pixels().map(|p| rgb_to_lab(p.0)).collect();
    let lightness: Vec<u8> = lab
        .iter()
        .map(|l| (l[0] * 2.55).round().clamp(0.0, 255.0) as u8)
        .collect();

    let tile_w = w.div_ceil(tiles_x);
    let tile_h = h.div_ceil(tiles_y);

    // One lookup table per tile.
    let mut luts = vec![[0u8; 256]; (tiles_x * tiles_y) as usize];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[lightness[(y * w + x) as usize] as usize] += 1;
                }
            }
            let area = (x1.saturating_sub(x0) * y1.saturating_sub(y0)).max(1);
            luts[(ty * tiles_x + tx) as usize] = clipped_equalization(hist, area, clip_limit);
        }
    }

    let lut_value = |tx: u32, ty: u32, v: u8| luts[(ty * tiles_x + tx) as usize][v as usize] as f32;

    let mut out = RgbImage::new(w, h);
    for y in 0..h {
        // Tile-center coordinates for bilinear interpolation.
        let gy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let ty0 = gy.floor().clamp(0.0, (tiles_y - 1) as f32) as u32;
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let fy = (gy - ty0 as f32).clamp(0.0, 1.0);

        for x in 0..w {
            let gx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let tx0 = gx.floor().clamp(0.0, (tiles_x - 1) as f32) as u32;
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let fx = (gx - tx0 as f32).clamp(0.0, 1.0);

            let idx = (y * w + x) as usize;
            let v = lightness[idx];
            let top = lut_value(tx0, ty0, v) * (1.0 - fx) + lut_value(tx1, ty0, v) * fx;
            let bottom = lut_value(tx0, ty1, v) * (1.0 - fx) + lut_value(tx1, ty1, v) * fx;
            let mapped = top * (1.0 - fy) + bottom * fy;

            let [_, a, b] = lab[idx];
            out.put_pixel(x, y, Rgb(lab_to_rgb([mapped / 2.55, a, b])));
        }
    }
    Ok(out)
}

/// Histogram equalization with the excess above the clip limit spread evenly.
fn clipped_equalization(mut hist: [u32; 256], area: u32, clip_limit: f32) -> [u8; 256] {
    let limit = ((clip_limit * area as f32 / 256.0).round() as u32).max(1);

    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let share = excess / 256;
    for bin in hist.iter_mut() {
        *bin += share;
    }
    let mut remainder = (excess % 256) as usize;
    if remainder > 0 {
        let step = (256 / remainder).max(1);
        let mut i = 0;
        while i < 256 && remainder > 0 {
            hist[i] += 1;
            i += step;
            remainder -= 1;
        }
    }

    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    let scale = 255.0 / area as f32;
    for (value, count) in hist.iter().enumerate() {
        cumulative += count;
        lut[value] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

fn rgb_to_hsv(p: [u8; 3]) -> (f32, f32, f32) {
    let [r, g, b] = p.map(|c| c as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    (hue, saturation, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [r, g, b].map(|ch| ((ch + m) * 255.0).round().clamp(0.0, 255.0) as u8)
}

fn adjust_saturation(img: &RgbImage, factor: f32) -> StageResult {
    if !factor.is_finite() || factor < 0.0 {
        return Err(EnhanceError::Parameter("saturation must be non-negative"));
    }
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(pixel.0);
        pixel.0 = hsv_to_rgb(h, (s * factor).min(1.0), v);
    }
    Ok(out)
}
