//! Static Chart Renderer
//! Rasterizes a composed `Figure` and writes it next to the input data.
//!
//! Layout:
//! 1. Canvas of `figure.size` inches at the requested dpi, white background
//! 2. Two panels stacked vertically (functions on top, derivatives below)
//! 3. Each panel: caption, grid, axis descriptions, one line per curve, legend
//! 4. Raster output is cropped to its content plus a small pad (tight bbox)

use crate::charts::{Figure, Panel};
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::{imageops, ImageError, ImageFormat, Rgb, RgbImage};
use log::{debug, info};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Background color of every output
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Padding kept around the content when cropping, in inches
const TIGHT_PAD_INCHES: f64 = 0.1;

/// Largest canvas side we agree to allocate, in pixels
const MAX_CANVAS_SIDE: u64 = 20_000;

const METERS_PER_INCH: f64 = 0.0254;

// Typography and strokes (points)
const TITLE_PT: f64 = 16.0;
const AXIS_DESC_PT: f64 = 12.0;
const TICK_LABEL_PT: f64 = 10.0;
const LEGEND_PT: f64 = 10.0;
const GRID_PT: f64 = 0.8;
const LEGEND_SAMPLE_PT: f64 = 20.0;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unsupported output format `{0}` (expected png, jpg, bmp or svg)")]
    UnsupportedFormat(String),
    #[error("Canvas of {width}x{height} px is too large")]
    CanvasTooLarge { width: u64, height: u64 },
    #[error("Drawing failed: {0}")]
    Drawing(String),
    #[error("Image encoding failed: {0}")]
    Encode(#[source] ImageError),
    #[error("PNG encoding failed: {0}")]
    Png(#[source] png::EncodingError),
}

impl RenderError {
    pub fn is_io(&self) -> bool {
        matches!(self, RenderError::Io { .. })
    }
}

fn drawing_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Drawing(err.to_string())
}

/// Where and how the figure is written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    pub directory: PathBuf,
    pub file_name: String,
    pub dpi: u32,
}

impl OutputOptions {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Encoding chosen from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Raster(ImageFormat),
    Svg,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "png" => Ok(OutputFormat::Raster(ImageFormat::Png)),
            "jpg" | "jpeg" => Ok(OutputFormat::Raster(ImageFormat::Jpeg)),
            "bmp" => Ok(OutputFormat::Raster(ImageFormat::Bmp)),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Converts point sizes to pixels for a given dpi.
#[derive(Debug, Clone, Copy)]
struct Scale {
    dpi: f64,
}

impl Scale {
    fn px(&self, points: f64) -> u32 {
        (points * self.dpi / 72.0).round().max(1.0) as u32
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render `figure` to `options.path()` and report the written path.
    ///
    /// The format is validated and the directory checked before any drawing
    /// happens, so a failure never leaves a partial file behind.
    pub fn write(figure: &Figure, options: &OutputOptions) -> Result<PathBuf, RenderError> {
        let path = options.path();
        let format = OutputFormat::from_path(&path)?;

        if !options.directory.is_dir() {
            return Err(RenderError::Io {
                path: options.directory.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "output directory does not exist"),
            });
        }

        match format {
            OutputFormat::Raster(image_format) => {
                let canvas = Self::rasterize(figure, options.dpi)?;
                let pad = (TIGHT_PAD_INCHES * f64::from(options.dpi)).round() as u32;
                let image = Self::tight_crop(&canvas, BACKGROUND, pad);
                debug!(
                    "Cropped {}x{} canvas to {}x{}",
                    canvas.width(),
                    canvas.height(),
                    image.width(),
                    image.height()
                );

                Self::encode_raster(&image, &path, image_format, options.dpi)?;
            }
            OutputFormat::Svg => {
                let svg = Self::render_svg(figure, options.dpi)?;
                fs::write(&path, svg).map_err(|source| RenderError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
        }

        info!("Wrote figure at {} dpi to {}", options.dpi, path.display());
        println!("Plot saved as:");
        println!("   {}", path.display());

        Ok(path)
    }

    /// Encode a cropped raster, recording `dpi` as the physical resolution
    /// where the format can carry it (PNG `pHYs`, JPEG JFIF density).
    fn encode_raster(
        image: &RgbImage,
        path: &Path,
        format: ImageFormat,
        dpi: u32,
    ) -> Result<(), RenderError> {
        let io_error = |source: io::Error| RenderError::Io {
            path: path.to_path_buf(),
            source,
        };
        let image_error = |err: ImageError| match err {
            ImageError::IoError(source) => io_error(source),
            other => RenderError::Encode(other),
        };

        match format {
            ImageFormat::Png => {
                let file = File::create(path).map_err(io_error)?;
                Self::encode_png(image, BufWriter::new(file), dpi).map_err(|err: png::EncodingError| match err {
                    png::EncodingError::IoError(source) => io_error(source),
                    other => RenderError::Png(other),
                })
            }
            ImageFormat::Jpeg => {
                let file = File::create(path).map_err(io_error)?;
                let mut writer = BufWriter::new(file);
                {
                    let mut encoder = JpegEncoder::new(&mut writer);
                    encoder.set_pixel_density(PixelDensity::dpi(
                        u16::try_from(dpi).unwrap_or(u16::MAX),
                    ));
                    encoder.encode_image(image).map_err(image_error)?;
                }
                writer.flush().map_err(io_error)
            }
            other => image.save_with_format(path, other).map_err(image_error),
        }
    }

    /// Write an 8-bit RGB PNG with a `pHYs` chunk in pixels per meter.
    pub fn encode_png<W: Write>(
        image: &RgbImage,
        writer: W,
        dpi: u32,
    ) -> Result<(), png::EncodingError> {
        let pixels_per_meter = (f64::from(dpi) / METERS_PER_INCH).round() as u32;

        let mut encoder = png::Encoder::new(writer, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: pixels_per_meter,
            yppu: pixels_per_meter,
            unit: png::Unit::Meter,
        }));

        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
        writer.finish()
    }

    /// Canvas size in pixels for a figure at `dpi`.
    pub fn canvas_size(figure: &Figure, dpi: u32) -> Result<(u32, u32), RenderError> {
        let (w_in, h_in) = figure.size;
        let width = (w_in * f64::from(dpi)).round().max(1.0) as u64;
        let height = (h_in * f64::from(dpi)).round().max(1.0) as u64;

        if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(RenderError::CanvasTooLarge { width, height });
        }
        Ok((width as u32, height as u32))
    }

    /// Draw the full, uncropped figure into an RGB buffer.
    pub fn rasterize(figure: &Figure, dpi: u32) -> Result<RgbImage, RenderError> {
        let (width, height) = Self::canvas_size(figure, dpi)?;
        debug!("Rasterizing {width}x{height} px canvas");

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            Self::draw_figure(&root, figure, Scale { dpi: f64::from(dpi) })?;
            root.present().map_err(drawing_error)?;
        }

        RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Drawing("pixel buffer size mismatch".to_string()))
    }

    fn render_svg(figure: &Figure, dpi: u32) -> Result<String, RenderError> {
        let size = Self::canvas_size(figure, dpi)?;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            Self::draw_figure(&root, figure, Scale { dpi: f64::from(dpi) })?;
            root.present().map_err(drawing_error)?;
        }
        Ok(svg)
    }

    fn draw_figure<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        figure: &Figure,
        scale: Scale,
    ) -> Result<(), RenderError> {
        root.fill(&WHITE).map_err(drawing_error)?;

        let areas = root.split_evenly((2, 1));
        for (area, panel) in areas.iter().zip(figure.panels()) {
            Self::draw_panel(area, panel, scale)?;
        }
        Ok(())
    }

    fn draw_panel<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        panel: &Panel,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let mut chart = ChartBuilder::on(area)
            .margin(scale.px(8.0))
            .caption(&panel.title, (FontFamily::SansSerif, scale.px(TITLE_PT)))
            .x_label_area_size(scale.px(32.0))
            .y_label_area_size(scale.px(48.0))
            .build_cartesian_2d(panel.x_range.clone(), panel.y_range.clone())
            .map_err(drawing_error)?;

        {
            let mut mesh = chart.configure_mesh();
            mesh.x_desc(panel.x_label.as_str())
                .y_desc(panel.y_label.as_str())
                .label_style((FontFamily::SansSerif, scale.px(TICK_LABEL_PT)))
                .axis_desc_style((FontFamily::SansSerif, scale.px(AXIS_DESC_PT)))
                .axis_style(BLACK.stroke_width(scale.px(GRID_PT)));

            if panel.grid {
                mesh.bold_line_style(BLACK.mix(0.3).stroke_width(scale.px(GRID_PT)))
                    .light_line_style(TRANSPARENT);
            } else {
                mesh.disable_mesh();
            }
            mesh.draw().map_err(drawing_error)?;
        }

        let sample_len = scale.px(LEGEND_SAMPLE_PT) as i32;
        for curve in &panel.curves {
            let style = curve.color.stroke_width(scale.px(curve.line_width));
            chart
                .draw_series(LineSeries::new(curve.points.iter().copied(), style))
                .map_err(drawing_error)?
                .label(curve.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + sample_len, y)], style));
        }

        if panel.legend && !panel.curves.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .margin(scale.px(6.0))
                .label_font((FontFamily::SansSerif, scale.px(LEGEND_PT)))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK.mix(0.3))
                .draw()
                .map_err(drawing_error)?;
        }

        Ok(())
    }

    /// Crop to the bounding box of non-background pixels, keeping `pad` pixels
    /// around it. An image with no content is returned unchanged.
    pub fn tight_crop(image: &RgbImage, background: Rgb<u8>, pad: u32) -> RgbImage {
        let (width, height) = image.dimensions();

        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in image.enumerate_pixels() {
            if *pixel != background {
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }

        let Some((x0, y0, x1, y1)) = bounds else {
            return image.clone();
        };

        let left = x0.saturating_sub(pad);
        let top = y0.saturating_sub(pad);
        let right = x1.saturating_add(pad).min(width - 1);
        let bottom = y1.saturating_add(pad).min(height - 1);

        imageops::crop_imm(image, left, top, right - left + 1, bottom - top + 1).to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartPlotter, ChartStyle};
    use crate::data::{Sample, SeriesSet};

    const TEST_DPI: u32 = 40;

    fn figure(orders: usize, rows: usize) -> Figure {
        let series = SeriesSet::from_samples(
            orders,
            (0..rows).map(|i| {
                let x = -1.0 + 2.0 * i as f64 / (rows.max(2) - 1) as f64;
                Sample::new(x, (0..orders).map(|k| (x.powi(k as i32), k as f64 * x)).collect())
            }),
        )
        .unwrap();
        ChartPlotter::compose(&series, &ChartStyle::default())
    }

    fn options(dir: &Path, name: &str) -> OutputOptions {
        OutputOptions {
            directory: dir.to_path_buf(),
            file_name: name.to_string(),
            dpi: TEST_DPI,
        }
    }

    #[test]
    fn test_canvas_size_follows_dpi() {
        let fig = figure(1, 2);
        assert_eq!(StaticChartRenderer::canvas_size(&fig, 300).unwrap(), (3600, 2700));
        assert_eq!(StaticChartRenderer::canvas_size(&fig, 40).unwrap(), (480, 360));
        assert!(matches!(
            StaticChartRenderer::canvas_size(&fig, 5000),
            Err(RenderError::CanvasTooLarge { .. })
        ));
    }

    #[test]
    fn test_rasterize_draws_on_white() {
        let image = StaticChartRenderer::rasterize(&figure(6, 41), TEST_DPI).unwrap();
        assert_eq!(image.dimensions(), (480, 360));
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
        assert!(image.pixels().any(|p| *p != BACKGROUND));
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            StaticChartRenderer::write(&figure(6, 41), &options(dir.path(), "out.png")).unwrap();
        assert_eq!(path, dir.path().join("out.png"));

        let written = image::open(&path).unwrap().to_rgb8();
        let (w, h) = written.dimensions();
        assert!(w > 0 && w <= 480);
        assert!(h > 0 && h <= 360);
        assert_eq!(*written.get_pixel(0, 0), BACKGROUND);
    }

    #[test]
    fn test_empty_figure_renders() {
        let dir = tempfile::tempdir().unwrap();
        let empty = ChartPlotter::compose(&SeriesSet::empty(6), &ChartStyle::default());
        let path = StaticChartRenderer::write(&empty, &options(dir.path(), "empty.png")).unwrap();
        assert!(path.exists());

        let no_orders = ChartPlotter::compose(&SeriesSet::empty(0), &ChartStyle::default());
        StaticChartRenderer::write(&no_orders, &options(dir.path(), "none.png")).unwrap();
    }

    #[test]
    fn test_same_input_same_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let fig = figure(6, 41);
        let a = StaticChartRenderer::write(&fig, &options(dir.path(), "a.png")).unwrap();
        let b = StaticChartRenderer::write(&fig, &options(dir.path(), "b.png")).unwrap();
        assert_eq!(
            image::image_dimensions(&a).unwrap(),
            image::image_dimensions(&b).unwrap()
        );
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = StaticChartRenderer::write(&figure(2, 5), &options(&missing, "out.png"))
            .unwrap_err();
        assert!(err.is_io());
        assert!(!missing.join("out.png").exists());
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let err = StaticChartRenderer::write(&figure(2, 5), &options(dir.path(), "out.pdf"))
            .unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat(ref ext) if ext == "pdf"));
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[test]
    fn test_svg_output() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            StaticChartRenderer::write(&figure(3, 11), &options(dir.path(), "out.svg")).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("<svg"));
    }

    #[test]
    fn test_png_records_dpi() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            StaticChartRenderer::write(&figure(2, 11), &options(dir.path(), "dpi.png")).unwrap();

        let file = io::BufReader::new(File::open(&path).unwrap());
        let reader = png::Decoder::new(file).read_info().unwrap();
        let dims = reader.info().pixel_dims.unwrap();
        assert_eq!(dims.unit, png::Unit::Meter);
        // 40 dpi = 1574.8 px/m
        assert_eq!(dims.xppu, 1575);
        assert_eq!(dims.yppu, 1575);
    }

    #[test]
    fn test_jpeg_output() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            StaticChartRenderer::write(&figure(2, 11), &options(dir.path(), "out.jpg")).unwrap();
        assert_eq!(image::ImageFormat::from_path(&path).unwrap(), ImageFormat::Jpeg);
        assert!(image::open(&path).is_ok());
    }

    #[test]
    fn test_unwritable_target_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // Existing directories where the files should go
        fs::create_dir(dir.path().join("taken.png")).unwrap();
        fs::create_dir(dir.path().join("taken.bmp")).unwrap();

        let fig = figure(2, 5);
        for name in ["taken.png", "taken.bmp"] {
            let err = StaticChartRenderer::write(&fig, &options(dir.path(), name)).unwrap_err();
            assert!(err.is_io(), "{name}: {err:?}");
            assert!(err.to_string().contains(name));
        }
    }

    #[test]
    fn test_regular_file_as_directory_is_io_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = StaticChartRenderer::write(&figure(2, 5), &options(file.path(), "out.png"))
            .unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_extreme_magnitudes_render() {
        let series = SeriesSet::from_samples(
            1,
            vec![
                Sample::new(-0.5, vec![(1e308, -f64::MAX)]),
                Sample::new(0.5, vec![(-1e308, f64::MAX)]),
            ],
        )
        .unwrap();
        let fig = ChartPlotter::compose(&series, &ChartStyle::default());
        for panel in fig.panels() {
            assert!((panel.y_range.end - panel.y_range.start).is_finite());
        }

        let image = StaticChartRenderer::rasterize(&fig, TEST_DPI).unwrap();
        assert_eq!(image.dimensions(), (480, 360));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b.PNG")).unwrap(),
            OutputFormat::Raster(ImageFormat::Png)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("b.jpeg")).unwrap(),
            OutputFormat::Raster(ImageFormat::Jpeg)
        );
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_tight_crop() {
        let mut image = RgbImage::from_pixel(100, 80, BACKGROUND);
        for x in 20..30 {
            for y in 40..45 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        let cropped = StaticChartRenderer::tight_crop(&image, BACKGROUND, 5);
        assert_eq!(cropped.dimensions(), (20, 15));
        assert_eq!(*cropped.get_pixel(5, 5), Rgb([0, 0, 0]));
        assert_eq!(*cropped.get_pixel(0, 0), BACKGROUND);

        // Pad is clamped at the image border
        let edge = StaticChartRenderer::tight_crop(&image, BACKGROUND, 50);
        assert_eq!(edge.dimensions(), (80, 80));

        let blank = RgbImage::from_pixel(10, 10, BACKGROUND);
        assert_eq!(StaticChartRenderer::tight_crop(&blank, BACKGROUND, 2).dimensions(), (10, 10));
    }
}
