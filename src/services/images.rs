//! Product image optimization: responsive resize variants, JPEG re-encoding,
//! and watermarking.

use futures::future::join_all;
use image::{imageops, DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::errors::ServiceError;

/// Responsive variant widths, in pixels. Variants wider than the source are
/// never generated.
pub const VARIANT_WIDTHS: [u32; 4] = [320, 640, 1024, 1600];

/// `photo.png` -> `photo_w640.jpg` alongside the original.
pub fn variant_path(base: &Path, width: u32) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    base.with_file_name(format!("{}_w{}.jpg", stem, width))
}

/// All variant paths that could exist for a source file.
pub fn variant_paths(base: &Path) -> Vec<PathBuf> {
    VARIANT_WIDTHS
        .iter()
        .map(|w| variant_path(base, *w))
        .collect()
}

/// Outcome of optimizing a single source image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub source: PathBuf,
    pub source_width: u32,
    pub source_height: u32,
    pub variants_written: Vec<u32>,
    pub watermarked: bool,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub processed: Vec<ImageReport>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub source: PathBuf,
    pub error: String,
}

#[derive(Clone)]
pub struct ImagePipeline {
    jpeg_quality: u8,
    watermark: bool,
}

impl ImagePipeline {
    pub fn new(jpeg_quality: u8, watermark: bool) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
            watermark,
        }
    }

    /// Widths that will actually be generated for a source of the given
    /// width. A variant is never upscaled past the native resolution.
    pub fn applicable_widths(source_width: u32) -> Vec<u32> {
        VARIANT_WIDTHS
            .iter()
            .copied()
            .filter(|w| *w <= source_width)
            .collect()
    }

    /// Generates JPEG resize variants next to the source file.
    ///
    /// Decoding and re-encoding are CPU bound, so the whole unit runs on the
    /// blocking pool.
    #[instrument(skip(self))]
    pub async fn optimize_file(&self, source: &Path) -> Result<ImageReport, ServiceError> {
        let source = source.to_path_buf();
        let quality = self.jpeg_quality;
        let watermark = self.watermark;

        tokio::task::spawn_blocking(move || Self::optimize_blocking(&source, quality, watermark))
            .await
            .map_err(|e| ServiceError::InternalError(format!("Image task panicked: {}", e)))?
    }

    fn optimize_blocking(
        source: &Path,
        quality: u8,
        watermark: bool,
    ) -> Result<ImageReport, ServiceError> {
        let img = image::open(source)
            .map_err(|e| ServiceError::ImageError(format!("{}: {}", source.display(), e)))?;
        let (source_width, source_height) = img.dimensions();

        let widths = Self::applicable_widths(source_width);
        if widths.is_empty() {
            debug!(
                source = %source.display(),
                width = source_width,
                "source narrower than the smallest variant, nothing to do"
            );
        }

        let mut variants_written = Vec::with_capacity(widths.len());
        for width in widths {
            let height = (source_height as u64 * width as u64 / source_width as u64).max(1) as u32;
            let mut resized = img.resize_exact(width, height, imageops::FilterType::Lanczos3);
            if watermark {
                resized = Self::apply_watermark(resized);
            }

            let target = variant_path(source, width);
            Self::write_jpeg(&resized, &target, quality)?;
            variants_written.push(width);
        }

        info!(
            source = %source.display(),
            variants = variants_written.len(),
            "image optimized"
        );
        Ok(ImageReport {
            source: source.to_path_buf(),
            source_width,
            source_height,
            variants_written,
            watermarked: watermark,
        })
    }

    fn write_jpeg(img: &DynamicImage, target: &Path, quality: u8) -> Result<(), ServiceError> {
        let file = std::fs::File::create(target)?;
        let mut writer = std::io::BufWriter::new(file);
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality);
        img.to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| ServiceError::ImageError(format!("{}: {}", target.display(), e)))?;
        Ok(())
    }

    /// Stamps a translucent diagonal stripe pattern across the lower third of
    /// the image.
    // TODO: render the configured shop name instead of stripes once a glyph
    // rasterizer dependency is picked.
    fn apply_watermark(img: DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        let mut canvas: RgbaImage = img.to_rgba8();
        let band_top = height - height / 3;

        for y in band_top..height {
            for x in 0..width {
                if (x + y) % 24 < 3 {
                    let Rgba([r, g, b, a]) = *canvas.get_pixel(x, y);
                    let blend = |c: u8| ((c as u16 * 3 + 255) / 4) as u8;
                    canvas.put_pixel(x, y, Rgba([blend(r), blend(g), blend(b), a]));
                }
            }
        }
        DynamicImage::ImageRgba8(canvas)
    }

    /// Optimizes many files concurrently, `batch_size` at a time. Failures
    /// are collected per file instead of aborting the run.
    #[instrument(skip(self, sources))]
    pub async fn optimize_batch(&self, sources: &[PathBuf], batch_size: usize) -> BatchReport {
        let mut report = BatchReport::default();
        let batch_size = batch_size.max(1);

        for chunk in sources.chunks(batch_size) {
            let results = join_all(chunk.iter().map(|path| async move {
                (path.clone(), self.optimize_file(path).await)
            }))
            .await;

            for (path, result) in results {
                match result {
                    Ok(item) => report.processed.push(item),
                    Err(e) => {
                        warn!(source = %path.display(), "optimization failed: {}", e);
                        report.failed.push(BatchFailure {
                            source: path,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
        report
    }
}

/// Recursively collects image files under a directory.
pub fn collect_image_files(dir: &Path) -> Result<Vec<PathBuf>, ServiceError> {
    const EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            // Skip files we generated ourselves.
            let is_variant = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| VARIANT_WIDTHS.iter().any(|w| s.ends_with(&format!("_w{}", w))))
                .unwrap_or(false);
            if is_image && !is_variant {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_never_exceed_native_width() {
        assert_eq!(ImagePipeline::applicable_widths(2000), vec![320, 640, 1024, 1600]);
        assert_eq!(ImagePipeline::applicable_widths(1024), vec![320, 640, 1024]);
        assert_eq!(ImagePipeline::applicable_widths(700), vec![320, 640]);
        assert_eq!(ImagePipeline::applicable_widths(100), Vec::<u32>::new());
    }

    #[test]
    fn variant_path_keeps_directory_and_stem() {
        let base = Path::new("uploads/products/chair.png");
        assert_eq!(
            variant_path(base, 640),
            PathBuf::from("uploads/products/chair_w640.jpg")
        );
    }

    #[tokio::test]
    async fn optimize_writes_only_applicable_variants() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        let img = RgbaImage::from_pixel(700, 500, Rgba([120, 80, 40, 255]));
        img.save(&source).unwrap();

        let pipeline = ImagePipeline::new(80, false);
        let report = pipeline.optimize_file(&source).await.unwrap();

        assert_eq!(report.variants_written, vec![320, 640]);
        assert!(variant_path(&source, 320).exists());
        assert!(variant_path(&source, 640).exists());
        assert!(!variant_path(&source, 1024).exists());
        assert!(!variant_path(&source, 1600).exists());
    }

    #[tokio::test]
    async fn batch_reports_failures_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 255]))
            .save(&good)
            .unwrap();
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"not an image").unwrap();

        let pipeline = ImagePipeline::new(80, false);
        let report = pipeline.optimize_batch(&[good, bad.clone()], 4).await;

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].source, bad);
    }

    #[test]
    fn collect_skips_generated_variants() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("a_w640.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = collect_image_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.jpg"));
    }
}
