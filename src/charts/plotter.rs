//! Chart Plotter Module
//! Composes the two-panel function/derivative figure from a `SeriesSet`.
//!
//! The figure is a plain description (titles, ranges, curves); turning it
//! into pixels is the renderer's job.

use crate::data::{OrderSeries, SeriesSet};
use log::{debug, info, warn};
use plotters::style::RGBColor;
use std::ops::Range;

/// Curve color cycle
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),  // Blue
    RGBColor(255, 127, 14),  // Orange
    RGBColor(44, 160, 44),   // Green
    RGBColor(214, 39, 40),   // Red
    RGBColor(148, 103, 189), // Purple
    RGBColor(140, 86, 75),   // Brown
    RGBColor(227, 119, 194), // Pink
    RGBColor(127, 127, 127), // Gray
    RGBColor(188, 189, 34),  // Olive
    RGBColor(23, 190, 207),  // Cyan
];

pub const FUNCTION_Y_LABEL: &str = "Pₙ(x)";
pub const DERIVATIVE_Y_LABEL: &str = "dPₙ/dx";
pub const DERIVATIVE_TITLE: &str = "Derivatives computed with Automatic Differentiation";

/// Fraction of the data span added above and below each panel
const Y_MARGIN: f64 = 0.05;

/// Largest magnitude shown on a vertical axis. Keeps the padded span finite;
/// samples beyond it are clipped at the panel edge.
const Y_LIMIT: f64 = f64::MAX / 4.0;

/// Layout knobs for composition.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    /// Horizontal axis bounds shared by both panels
    pub domain: Range<f64>,
    /// Figure size in inches (width, height)
    pub figure_size: (f64, f64),
    /// Curve line width in points
    pub line_width: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            domain: -1.0..1.0,
            figure_size: (12.0, 9.0),
            line_width: 2.5,
        }
    }
}

/// A single labeled polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    pub color: RGBColor,
    /// Line width in points
    pub line_width: f64,
    pub points: Vec<(f64, f64)>,
}

/// One set of axes with its curves.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub grid: bool,
    pub legend: bool,
    pub curves: Vec<Curve>,
}

/// The composed chart: functions on top, derivatives below.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    /// Size in inches (width, height)
    pub size: (f64, f64),
    pub functions: Panel,
    pub derivatives: Panel,
}

impl Figure {
    /// Panels in drawing order, top to bottom.
    pub fn panels(&self) -> [&Panel; 2] {
        [&self.functions, &self.derivatives]
    }
}

/// Builds chart descriptions from loaded series.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Compose the two-panel figure.
    ///
    /// Any order count and any series length are accepted; an empty dataset
    /// yields panels with empty curves.
    pub fn compose(series: &SeriesSet, style: &ChartStyle) -> Figure {
        let orders = series.order_count();

        let functions = Self::panel(
            Self::function_title(orders),
            FUNCTION_Y_LABEL,
            series,
            style,
            OrderSeries::values,
            Self::function_label,
        );
        let derivatives = Self::panel(
            DERIVATIVE_TITLE.to_string(),
            DERIVATIVE_Y_LABEL,
            series,
            style,
            OrderSeries::derivatives,
            Self::derivative_label,
        );

        info!(
            "Composed figure with {} curves per panel over {} samples",
            orders,
            series.len()
        );

        Figure {
            size: style.figure_size,
            functions,
            derivatives,
        }
    }

    fn panel(
        title: String,
        y_label: &str,
        series: &SeriesSet,
        style: &ChartStyle,
        column: impl Fn(&OrderSeries) -> &[f64],
        label: impl Fn(usize) -> String,
    ) -> Panel {
        let curves: Vec<Curve> = series
            .orders()
            .iter()
            .map(|order| Curve {
                label: label(order.order()),
                color: Self::color(order.order()),
                line_width: style.line_width,
                points: Self::points(series.x(), column(order), order.order()),
            })
            .collect();

        let y_range = Self::value_range(&curves);
        debug!("Panel `{}` y-range {:?}", title, y_range);

        Panel {
            title,
            x_label: "x".to_string(),
            y_label: y_label.to_string(),
            x_range: style.domain.clone(),
            y_range,
            grid: true,
            legend: true,
            curves,
        }
    }

    /// Pair abscissae with ordinates, dropping non-finite samples.
    fn points(x: &[f64], y: &[f64], order: usize) -> Vec<(f64, f64)> {
        let points: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .map(|(&x, &y)| (x, y))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();

        let skipped = x.len().min(y.len()) - points.len();
        if skipped > 0 {
            warn!("Order {order}: skipped {skipped} non-finite samples");
        }
        points
    }

    /// Vertical bounds covering every curve, padded by a small margin.
    pub fn value_range(curves: &[Curve]) -> Range<f64> {
        let (min, max) = curves
            .iter()
            .flat_map(|c| c.points.iter().map(|&(_, y)| y))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });

        if min > max {
            return -1.0..1.0;
        }

        let (min, max) = (min.clamp(-Y_LIMIT, Y_LIMIT), max.clamp(-Y_LIMIT, Y_LIMIT));
        let span = max - min;
        let pad = if span > 0.0 {
            span * Y_MARGIN
        } else {
            (min.abs() * Y_MARGIN).max(0.5)
        };
        (min - pad)..(max + pad)
    }

    /// Get color for an order.
    pub fn color(order: usize) -> RGBColor {
        PALETTE[order % PALETTE.len()]
    }

    pub fn function_label(order: usize) -> String {
        format!("P{}(x)", subscript(order))
    }

    pub fn derivative_label(order: usize) -> String {
        format!("P{}'(x)", subscript(order))
    }

    fn function_title(orders: usize) -> String {
        match orders {
            0 => "Legendre Polynomials".to_string(),
            1 => format!("Legendre Polynomial {}", Self::function_label(0)),
            n => format!(
                "Legendre Polynomials {} – {}",
                Self::function_label(0),
                Self::function_label(n - 1)
            ),
        }
    }
}

/// Render a non-negative integer with Unicode subscript digits.
fn subscript(n: usize) -> String {
    const DIGITS: [char; 10] = ['₀', '₁', '₂', '₃', '₄', '₅', '₆', '₇', '₈', '₉'];
    n.to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| DIGITS[d as usize])
        .collect()
}
