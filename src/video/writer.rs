//! Screenshot persistence and filename scheme.
//!
//! Filenames encode transcript id, moment index, sequence index and
//! timestamp, so moments can be rebuilt from a screenshots directory when
//! the transcript JSON has lost them.

use crate::config::ScreenshotSettings;
use crate::error::{GlimtError, Result};
use crate::moments::{KeyMoment, SequenceInfo};
use crate::transcript::format_file_stamp;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use jpeg_encoder::{ColorType as JpegColor, Encoder as JpegEncoder};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};

static SCREENSHOT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:backup_)?(?P<id>.+)_screenshot_(?P<moment>\d{2,})(?:_(?P<seq>\d+))?_(?P<min>\d{2,})m(?P<sec>\d{2})s\.(?:png|jpe?g)$",
    )
    .expect("Invalid regex")
});

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenshotFormat {
    #[default]
    Png,
    Jpeg,
}

impl ScreenshotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ScreenshotFormat::Png => "png",
            ScreenshotFormat::Jpeg => "jpg",
        }
    }
}

impl FromStr for ScreenshotFormat {
    type Err = GlimtError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ScreenshotFormat::Png),
            "jpg" | "jpeg" => Ok(ScreenshotFormat::Jpeg),
            other => Err(GlimtError::InvalidInput(format!(
                "Unknown screenshot format: {}. Use png or jpg.",
                other
            ))),
        }
    }
}

/// PNG compression effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngCompression {
    Fast,
    #[default]
    Default,
    Best,
}

impl FromStr for PngCompression {
    type Err = GlimtError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(PngCompression::Fast),
            "default" => Ok(PngCompression::Default),
            "best" => Ok(PngCompression::Best),
            other => Err(GlimtError::Config(format!(
                "Unknown PNG compression: {}. Use fast, default or best.",
                other
            ))),
        }
    }
}

impl From<PngCompression> for CompressionType {
    fn from(level: PngCompression) -> Self {
        match level {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

/// Outcome of a save. A failed save is reported here, never raised.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveResult {
    pub success: bool,
    pub path: Option<PathBuf>,
    pub web_path: Option<String>,
}

impl SaveResult {
    fn failed() -> Self {
        Self {
            success: false,
            path: None,
            web_path: None,
        }
    }
}

/// `{id}_screenshot_{moment:02}[_{sequence}]_{MM}m{SS}s.{ext}`
pub fn screenshot_filename(
    transcript_id: &str,
    moment_index: usize,
    sequence_index: Option<usize>,
    timestamp: f64,
    format: ScreenshotFormat,
) -> String {
    let sequence = sequence_index.map(|s| format!("_{}", s)).unwrap_or_default();
    format!(
        "{}_screenshot_{:02}{}_{}.{}",
        transcript_id,
        moment_index,
        sequence,
        format_file_stamp(timestamp),
        format.extension()
    )
}

/// Web path for a file under a `static` directory: `/static/...`.
///
/// Paths without a `static` component are returned as-is.
pub fn web_path(path: &Path) -> String {
    let components: Vec<Component> = path.components().collect();
    match components
        .iter()
        .position(|c| c.as_os_str() == "static")
    {
        Some(pos) => {
            let rest: Vec<String> = components[pos..]
                .iter()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            format!("/{}", rest.join("/"))
        }
        None => path.to_string_lossy().to_string(),
    }
}

/// Fields recovered from a screenshot filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotName {
    pub transcript_id: String,
    pub moment_index: usize,
    pub sequence_index: Option<usize>,
    /// Whole-second approximation of the moment's timestamp.
    pub timestamp: f64,
}

pub fn parse_screenshot_filename(name: &str) -> Option<ScreenshotName> {
    let caps = SCREENSHOT_NAME.captures(name)?;
    let minutes: u64 = caps.name("min")?.as_str().parse().ok()?;
    let seconds: u64 = caps.name("sec")?.as_str().parse().ok()?;
    Some(ScreenshotName {
        transcript_id: caps.name("id")?.as_str().to_string(),
        moment_index: caps.name("moment")?.as_str().parse().ok()?,
        sequence_index: match caps.name("seq") {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        },
        timestamp: (minutes * 60 + seconds) as f64,
    })
}

/// Rebuild minimal moments from the screenshots in `dir`.
///
/// Only files belonging to `transcript_id` are considered. Context fields
/// are left at the recovered timestamp.
pub fn recover_moments_from_dir(dir: &Path, transcript_id: &str) -> Result<Vec<KeyMoment>> {
    let mut by_moment: BTreeMap<usize, Vec<(ScreenshotName, PathBuf)>> = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(parsed) = parse_screenshot_filename(name) else {
            continue;
        };
        if parsed.transcript_id == transcript_id {
            by_moment.entry(parsed.moment_index).or_default().push((parsed, path));
        }
    }

    let count = by_moment.len();
    let moments = by_moment
        .into_values()
        .enumerate()
        .map(|(position, mut files)| {
            files.sort_by_key(|(name, _)| name.sequence_index.map_or(0, |s| s + 1));
            let (primary, primary_path) = &files[0];
            let timestamp = primary.timestamp;

            let sequence_files: Vec<String> = files
                .iter()
                .filter(|(name, _)| name.sequence_index.is_some())
                .map(|(_, path)| web_path(path))
                .collect();

            let title = if position == 0 {
                "Introduction".to_string()
            } else if position + 1 == count {
                "Conclusion".to_string()
            } else {
                format!("Key point {}", position)
            };

            KeyMoment {
                timestamp,
                title,
                description: "Recovered from screenshots".to_string(),
                transcript_text: String::new(),
                context_start_time: timestamp,
                context_end_time: timestamp,
                screenshot_path: Some(web_path(primary_path)),
                sequence: (!sequence_files.is_empty()).then(|| SequenceInfo::new(sequence_files)),
            }
        })
        .collect::<Vec<_>>();

    info!("Recovered {} moments from {}", moments.len(), dir.display());
    Ok(moments)
}

/// Writes screenshots into one directory.
#[derive(Debug, Clone)]
pub struct ScreenshotWriter {
    output_dir: PathBuf,
    format: ScreenshotFormat,
    png_compression: PngCompression,
    jpeg_quality: u8,
}

impl ScreenshotWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            format: ScreenshotFormat::Png,
            png_compression: PngCompression::Default,
            jpeg_quality: 95,
        }
    }

    /// Writer for `output_dir` configured from settings.
    pub fn from_settings(output_dir: impl Into<PathBuf>, settings: &ScreenshotSettings) -> Result<Self> {
        Ok(Self::new(output_dir)
            .with_format(settings.format.parse()?)
            .with_png_compression(settings.png_compression.parse()?)
            .with_jpeg_quality(settings.jpeg_quality))
    }

    pub fn with_format(mut self, format: ScreenshotFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_png_compression(mut self, compression: PngCompression) -> Self {
        self.png_compression = compression;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn format(&self) -> ScreenshotFormat {
        self.format
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save a moment's screenshot under the standard filename.
    pub fn save_moment(
        &self,
        image: &RgbImage,
        transcript_id: &str,
        moment_index: usize,
        sequence_index: Option<usize>,
        timestamp: f64,
    ) -> SaveResult {
        let filename = screenshot_filename(transcript_id, moment_index, sequence_index, timestamp, self.format);
        self.save(image, &filename)
    }

    /// Save `image` as `filename`, retrying once as `backup_<filename>`.
    pub fn save(&self, image: &RgbImage, filename: &str) -> SaveResult {
        let primary = self.output_dir.join(filename);
        match self.write(image, &primary) {
            Ok(()) => return self.saved(primary),
            Err(e) => warn!("Failed to save {}: {}", primary.display(), e),
        }

        let backup = self.output_dir.join(format!("backup_{}", filename));
        match self.write(image, &backup) {
            Ok(()) => {
                info!("Saved screenshot to backup path {}", backup.display());
                self.saved(backup)
            }
            Err(e) => {
                error!("Backup save also failed for {}: {}", backup.display(), e);
                SaveResult::failed()
            }
        }
    }

    fn saved(&self, path: PathBuf) -> SaveResult {
        debug!("Saved screenshot {}", path.display());
        SaveResult {
            success: true,
            web_path: Some(web_path(&path)),
            path: Some(path),
        }
    }

    fn write(&self, image: &RgbImage, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        let (width, height) = image.dimensions();

        match self.format {
            ScreenshotFormat::Png => {
                PngEncoder::new_with_quality(writer, self.png_compression.into(), PngFilter::Adaptive)
                    .write_image(image.as_raw(), width, height, ExtendedColorType::Rgb8)?;
            }
            ScreenshotFormat::Jpeg => {
                let too_large = || {
                    GlimtError::InvalidInput(format!("{}x{} is too large for JPEG", width, height))
                };
                let width = u16::try_from(width).map_err(|_| too_large())?;
                let height = u16::try_from(height).map_err(|_| too_large())?;
                let mut encoder = JpegEncoder::new(writer, self.jpeg_quality);
                encoder.set_progressive(true);
                encoder.encode(image.as_raw(), width, height, JpegColor::Rgb)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn image() -> RgbImage {
        RgbImage::from_fn(16, 9, |x, y| Rgb([(x * 10) as u8, (y * 20) as u8, 128]))
    }

    #[test]
    fn test_filename_scheme() {
        assert_eq!(
            screenshot_filename("abc", 3, None, 75.4, ScreenshotFormat::Png),
            "abc_screenshot_03_01m15s.png"
        );
        assert_eq!(
            screenshot_filename("abc", 12, Some(2), 3725.0, ScreenshotFormat::Jpeg),
            "abc_screenshot_12_2_62m05s.jpg"
        );
    }

    #[test]
    fn test_parse_filename() {
        let parsed = parse_screenshot_filename("my_talk_screenshot_03_2_01m15s.png").unwrap();
        assert_eq!(parsed.transcript_id, "my_talk");
        assert_eq!(parsed.moment_index, 3);
        assert_eq!(parsed.sequence_index, Some(2));
        assert_eq!(parsed.timestamp, 75.0);

        let backup = parse_screenshot_filename("backup_x_screenshot_00_00m05s.jpg").unwrap();
        assert_eq!(backup.transcript_id, "x");
        assert_eq!(backup.sequence_index, None);

        assert!(parse_screenshot_filename("holiday.png").is_none());
    }

    #[test]
    fn test_web_path() {
        assert_eq!(
            web_path(Path::new("/srv/app/static/screenshots/t1/a.png")),
            "/static/screenshots/t1/a.png"
        );
        assert_eq!(web_path(Path::new("/tmp/shots/a.png")), "/tmp/shots/a.png");
    }

    #[test]
    fn test_save_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("static").join("screenshots").join("t1");

        let png = ScreenshotWriter::new(&out).save_moment(&image(), "t1", 0, None, 90.0);
        assert!(png.success);
        let path = png.path.unwrap();
        assert!(path.exists());
        assert_eq!(png.web_path.as_deref(), Some("/static/screenshots/t1/t1_screenshot_00_01m30s.png"));
        assert_eq!(image::open(&path).unwrap().to_rgb8(), image());

        let jpg = ScreenshotWriter::new(&out)
            .with_format(ScreenshotFormat::Jpeg)
            .with_jpeg_quality(80)
            .save_moment(&image(), "t1", 1, Some(0), 100.0);
        assert!(jpg.success);
        assert!(jpg.path.unwrap().extension().is_some_and(|e| e == "jpg"));
    }

    #[test]
    fn test_jpeg_is_progressive() {
        let dir = tempfile::tempdir().unwrap();
        let result = ScreenshotWriter::new(dir.path())
            .with_format(ScreenshotFormat::Jpeg)
            .save(&image(), "a.jpg");
        assert!(result.success);

        let path = result.path.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // SOF2 marks a progressive DCT frame.
        assert!(bytes.windows(2).any(|w| w == [0xFF, 0xC2]));
        assert_eq!(image::open(&path).unwrap().to_rgb8().dimensions(), (16, 9));
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the output directory should be.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"not a dir").unwrap();

        let result = ScreenshotWriter::new(&blocked).save(&image(), "a.png");
        assert_eq!(result, SaveResult::failed());
    }

    #[test]
    fn test_backup_name_on_primary_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory occupying the primary filename makes the first write fail.
        std::fs::create_dir(dir.path().join("a.png")).unwrap();

        let result = ScreenshotWriter::new(dir.path()).save(&image(), "a.png");
        assert!(result.success);
        assert_eq!(result.path.unwrap(), dir.path().join("backup_a.png"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<ScreenshotFormat>().unwrap(), ScreenshotFormat::Png);
        assert_eq!("jpeg".parse::<ScreenshotFormat>().unwrap(), ScreenshotFormat::Jpeg);
        assert!("gif".parse::<ScreenshotFormat>().is_err());
        assert_eq!("best".parse::<PngCompression>().unwrap(), PngCompression::Best);
    }

    #[test]
    fn test_recover_moments() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ScreenshotWriter::new(dir.path());
        writer.save_moment(&image(), "t1", 0, None, 90.0);
        writer.save_moment(&image(), "t1", 1, None, 300.0);
        writer.save_moment(&image(), "t1", 1, Some(0), 298.0);
        writer.save_moment(&image(), "t1", 1, Some(1), 302.0);
        writer.save_moment(&image(), "t1", 2, None, 1710.0);
        writer.save_moment(&image(), "other", 0, None, 5.0);

        let moments = recover_moments_from_dir(dir.path(), "t1").unwrap();
        assert_eq!(moments.len(), 3);
        assert_eq!(moments[0].title, "Introduction");
        assert_eq!(moments[1].title, "Key point 1");
        assert_eq!(moments[1].timestamp, 300.0);
        assert_eq!(moments[1].sequence.as_ref().unwrap().sequence_count, 2);
        assert_eq!(moments[2].title, "Conclusion");
        assert_eq!(moments[2].timestamp, 1710.0);
    }
}
