//! Page rasterization with fallback strategies

use log::{debug, warn};

use super::backend::{ColorMode, PdfDocument, RenderSpec};
use super::types::Bitmap;

/// One rasterization attempt. Tried in [`RenderStrategy::FALLBACK_ORDER`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Full color at `zoom * high_dpi_scale`
    HighDpiRgb,
    /// Full color at `zoom`
    Rgb,
    /// Full color with alpha channel at `zoom`
    RgbAlpha,
    /// Grayscale at `zoom`, last resort
    Grayscale,
}

impl RenderStrategy {
    pub const FALLBACK_ORDER: [Self; 4] =
        [Self::HighDpiRgb, Self::Rgb, Self::RgbAlpha, Self::Grayscale];

    /// Default multiplier applied by [`RenderStrategy::HighDpiRgb`]
    pub const HIGH_DPI_SCALE: f32 = 2.0;

    #[must_use]
    pub fn spec(self, zoom: f32, high_dpi_scale: f32) -> RenderSpec {
        match self {
            Self::HighDpiRgb => RenderSpec {
                scale: zoom * high_dpi_scale,
                color: ColorMode::Rgb,
                alpha: false,
            },
            Self::Rgb => RenderSpec {
                scale: zoom,
                color: ColorMode::Rgb,
                alpha: false,
            },
            Self::RgbAlpha => RenderSpec {
                scale: zoom,
                color: ColorMode::Rgb,
                alpha: true,
            },
            Self::Grayscale => RenderSpec {
                scale: zoom,
                color: ColorMode::Gray,
                alpha: false,
            },
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HighDpiRgb => "rgb high dpi",
            Self::Rgb => "rgb",
            Self::RgbAlpha => "rgb with alpha",
            Self::Grayscale => "grayscale",
        }
    }
}

/// Successful raster plus the strategy and scale that produced it
#[derive(Clone, Debug)]
pub struct RenderedPage {
    pub page: usize,
    pub bitmap: Bitmap,
    pub strategy: RenderStrategy,
    /// Pixels per point of `bitmap`
    pub scale: f32,
}

/// Every strategy failed for this page
#[derive(Debug, thiserror::Error)]
#[error("page {page} could not be rendered ({attempts} strategies failed)")]
pub struct RenderFailure {
    pub page: usize,
    pub attempts: usize,
}

/// Render one page, walking the fallback chain. Individual strategy errors
/// are logged and swallowed.
pub fn render_with_fallback<D: PdfDocument + ?Sized>(
    doc: &D,
    page: usize,
    zoom: f32,
    high_dpi_scale: f32,
) -> Result<RenderedPage, RenderFailure> {
    for strategy in RenderStrategy::FALLBACK_ORDER {
        let spec = strategy.spec(zoom, high_dpi_scale);
        match doc.render(page, &spec) {
            Ok(bitmap) if bitmap.is_well_formed() => {
                debug!(
                    "Rendered page {page} via {} ({}x{})",
                    strategy.as_str(),
                    bitmap.width,
                    bitmap.height
                );
                return Ok(RenderedPage {
                    page,
                    bitmap,
                    strategy,
                    scale: spec.scale,
                });
            }
            Ok(_) => {
                debug!("Page {page}: {} produced no pixels", strategy.as_str());
            }
            Err(e) => {
                debug!("Page {page}: {} failed: {e}", strategy.as_str());
            }
        }
    }

    warn!("Page {page}: all render strategies failed, skipping");
    Err(RenderFailure {
        page,
        attempts: RenderStrategy::FALLBACK_ORDER.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeDocument, FakePage};

    #[test]
    fn first_strategy_uses_high_dpi_scale() {
        let doc = FakeDocument::with_pages(vec![FakePage::new(100.0, 200.0)]);
        let rendered = render_with_fallback(&doc, 0, 1.0, 2.0).unwrap();

        assert_eq!(rendered.strategy, RenderStrategy::HighDpiRgb);
        assert_eq!(rendered.scale, 2.0);
        assert_eq!((rendered.bitmap.width, rendered.bitmap.height), (200, 400));
    }

    #[test]
    fn falls_through_to_grayscale() {
        let page = FakePage::new(100.0, 100.0).rgb_unsupported();
        let doc = FakeDocument::with_pages(vec![page]);
        let rendered = render_with_fallback(&doc, 0, 1.5, 2.0).unwrap();

        assert_eq!(rendered.strategy, RenderStrategy::Grayscale);
        assert_eq!(rendered.scale, 1.5);
        assert_eq!(rendered.bitmap.format, crate::pdf::PixelFormat::Gray8);
        assert_eq!(doc.render_calls(), 4);
    }

    #[test]
    fn empty_bitmap_counts_as_failure() {
        let page = FakePage::new(100.0, 100.0).blank_above(1.5);
        let doc = FakeDocument::with_pages(vec![page]);
        let rendered = render_with_fallback(&doc, 0, 1.0, 2.0).unwrap();

        assert_eq!(rendered.strategy, RenderStrategy::Rgb);
    }

    #[test]
    fn alpha_render_used_when_opaque_rgb_fails() {
        let page = FakePage::new(50.0, 50.0).needs_alpha();
        let doc = FakeDocument::with_pages(vec![page]);
        let rendered = render_with_fallback(&doc, 0, 1.0, 2.0).unwrap();

        assert_eq!(rendered.strategy, RenderStrategy::RgbAlpha);
        assert_eq!(rendered.bitmap.format, crate::pdf::PixelFormat::Rgba8);
    }

    #[test]
    fn all_strategies_failing_reports_page() {
        let doc = FakeDocument::with_pages(vec![FakePage::new(10.0, 10.0).broken()]);
        let err = render_with_fallback(&doc, 0, 1.0, 2.0).unwrap_err();

        assert_eq!(err.page, 0);
        assert_eq!(err.attempts, 4);
    }
}
