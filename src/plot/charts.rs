//! PNG chart battery rendered with Plotters.
//!
//! Charts are described as data (`ChartSpec`: lines, filled bands, bounds) and
//! rendered by one function, so the set of charts and their series can be tested
//! without a font stack or a filesystem.

use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::error::AppError;
use crate::plot::derive::{Dataset, DerivedRow};

pub const NET_RATIO_PNG: &str = "taux_net_effectif_net_sur_brut.png";
pub const SUPERNET_RATIO_PNG: &str = "taux_supernet_effectif_supernet_sur_superbrut.png";
pub const SUPERNET_REBUILT_PNG: &str = "superbrut_vers_supernet_reconstruit.png";
pub const GROSS_VS_COST_PNG: &str = "brut_vs_superbrut.png";
pub const TAX_IMPACT_PNG: &str = "impact_impot.png";
pub const TAX_RATE_PNG: &str = "taux_imposition.png";
pub const GROSS_VS_SUPERNET_PNG: &str = "brut_vs_supernet.png";

const ORANGE: RGBColor = RGBColor(255, 165, 0);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const GRAY: RGBColor = RGBColor(128, 128, 128);
const DARK_GREEN: RGBColor = RGBColor(0, 128, 0);
const STEEL_BLUE: RGBColor = RGBColor(31, 119, 180);
const DARK_ORANGE: RGBColor = RGBColor(255, 127, 14);

const X_GROSS: &str = "Salaire brut annuel (€)";
const X_COST: &str = "Coût total employeur annuel (€) (superbrut)";
const Y_AMOUNT: &str = "Montant annuel (€)";

#[derive(Debug, Clone)]
pub struct LineSpec {
    pub points: Vec<(f64, f64)>,
    pub label: Option<&'static str>,
    pub color: RGBColor,
    pub alpha: f64,
    pub dashed: bool,
    pub width: u32,
}

impl LineSpec {
    fn solid(points: Vec<(f64, f64)>, color: RGBColor) -> Self {
        Self {
            points,
            label: None,
            color,
            alpha: 1.0,
            dashed: false,
            width: 3,
        }
    }

    fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }

    fn labelled(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }
}

/// Filled region between two curves sharing the same x values.
#[derive(Debug, Clone)]
pub struct BandSpec {
    pub upper: Vec<(f64, f64)>,
    pub lower: Vec<(f64, f64)>,
    pub label: &'static str,
    pub color: RGBColor,
    pub alpha: f64,
}

#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub file_name: &'static str,
    pub title: &'static str,
    pub x_desc: &'static str,
    pub y_desc: &'static str,
    /// Fixed y bounds; computed from the data when `None`.
    pub y_range: Option<(f64, f64)>,
    pub fmt_y: fn(f64) -> String,
    pub bands: Vec<BandSpec>,
    pub lines: Vec<LineSpec>,
}

impl ChartSpec {
    fn has_legend(&self) -> bool {
        !self.bands.is_empty() || self.lines.iter().any(|l| l.label.is_some())
    }

    fn points(&self) -> impl Iterator<Item = &(f64, f64)> {
        self.lines
            .iter()
            .flat_map(|l| l.points.iter())
            .chain(self.bands.iter().flat_map(|b| b.upper.iter().chain(b.lower.iter())))
    }

    pub fn x_bounds(&self) -> (f64, f64) {
        let (lo, hi) = min_max(self.points().map(|p| p.0)).unwrap_or((0.0, 1.0));
        widen_if_flat(lo, hi)
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        if let Some(range) = self.y_range {
            return range;
        }
        let (lo, hi) = min_max(self.points().map(|p| p.1)).unwrap_or((0.0, 1.0));
        let (lo, hi) = widen_if_flat(lo, hi);
        pad_range(lo, hi, 0.05)
    }
}

/// Build every chart the dataset calls for, in output order.
///
/// The tax-rate chart only appears when some tax was computed.
pub fn chart_specs(ds: &Dataset) -> Vec<ChartSpec> {
    let rows = &ds.rows;
    let by_gross = |f: fn(&DerivedRow) -> f64| -> Vec<(f64, f64)> {
        rows.iter().map(|r| (r.gross, f(r))).collect()
    };
    let by_cost = |f: fn(&DerivedRow) -> f64| -> Vec<(f64, f64)> {
        rows.iter().map(|r| (r.employer_cost, f(r))).collect()
    };

    let mut specs = Vec::with_capacity(7);

    specs.push(ChartSpec {
        file_name: NET_RATIO_PNG,
        title: "Taux net effectif (net / brut)",
        x_desc: X_GROSS,
        y_desc: "Net / Brut",
        y_range: Some((0.0, 1.0)),
        fmt_y: fmt_ratio,
        bands: Vec::new(),
        lines: vec![LineSpec::solid(by_gross(|r| r.net_ratio), STEEL_BLUE)],
    });

    specs.push(ChartSpec {
        file_name: SUPERNET_RATIO_PNG,
        title: "Taux supernet effectif (supernet / superbrut)",
        x_desc: X_COST,
        y_desc: "Supernet / Superbrut",
        y_range: Some((0.0, 1.0)),
        fmt_y: fmt_ratio,
        bands: Vec::new(),
        lines: vec![LineSpec::solid(by_cost(|r| r.supernet_ratio), DARK_GREEN)],
    });

    specs.push(ChartSpec {
        file_name: SUPERNET_REBUILT_PNG,
        title: "Supernet en fonction du superbrut (reconstruit via taux effectif)",
        x_desc: X_COST,
        y_desc: "Salaire net après impôt annuel (€) (supernet)",
        y_range: None,
        fmt_y: fmt_amount,
        bands: Vec::new(),
        lines: vec![
            LineSpec::solid(by_cost(|r| r.supernet_rebuilt), STEEL_BLUE)
                .labelled("Supernet reconstruit (taux×superbrut)"),
            LineSpec::solid(by_cost(|r| r.net_after_tax), DARK_ORANGE)
                .dashed()
                .alpha(0.7)
                .labelled("Supernet CSV (direct)"),
        ],
    });

    specs.push(ChartSpec {
        file_name: GROSS_VS_COST_PNG,
        title: "Comparaison: Salaire brut vs Coût total employeur",
        x_desc: X_GROSS,
        y_desc: Y_AMOUNT,
        y_range: None,
        fmt_y: fmt_amount,
        bands: Vec::new(),
        lines: vec![
            LineSpec::solid(by_gross(|r| r.gross), STEEL_BLUE)
                .dashed()
                .alpha(0.5)
                .labelled("Salaire brut"),
            LineSpec::solid(by_gross(|r| r.employer_cost), DARK_ORANGE)
                .labelled("Coût total employeur (superbrut)"),
        ],
    });

    let net = by_gross(|r| r.net);
    let net_after = by_gross(|r| r.net_after_tax);
    let mut tax_bands = Vec::new();
    if ds.has_tax() {
        tax_bands.push(BandSpec {
            upper: net.clone(),
            lower: net_after.clone(),
            label: "Impôt sur le revenu",
            color: ORANGE,
            alpha: 0.3,
        });
    }
    specs.push(ChartSpec {
        file_name: TAX_IMPACT_PNG,
        title: "Impact de l'impôt sur le revenu",
        x_desc: X_GROSS,
        y_desc: "Salaire net annuel (€)",
        y_range: None,
        fmt_y: fmt_amount,
        bands: tax_bands,
        lines: vec![
            LineSpec::solid(net, BLUE).labelled("Net avant impôt"),
            LineSpec::solid(net_after.clone(), RED).labelled("Net après impôt (supernet)"),
        ],
    });

    if ds.has_tax() {
        specs.push(ChartSpec {
            file_name: TAX_RATE_PNG,
            title: "Taux d'imposition effectif (impôt / net avant impôt)",
            x_desc: X_GROSS,
            y_desc: "Taux d'imposition (%)",
            y_range: None,
            fmt_y: fmt_pct,
            bands: Vec::new(),
            lines: vec![LineSpec::solid(by_gross(|r| r.tax_rate_pct), PURPLE)],
        });
    }

    let gross = by_gross(|r| r.gross);
    let max_val = ds
        .max_gross()
        .max(rows.iter().map(|r| r.net_after_tax).fold(f64::NEG_INFINITY, f64::max));
    specs.push(ChartSpec {
        file_name: GROSS_VS_SUPERNET_PNG,
        title: "Comparaison: Salaire brut vs Supernet",
        x_desc: X_GROSS,
        y_desc: Y_AMOUNT,
        y_range: None,
        fmt_y: fmt_amount,
        bands: vec![BandSpec {
            upper: gross.clone(),
            lower: net_after.clone(),
            label: "Écart (cotisations + impôt)",
            color: ORANGE,
            alpha: 0.2,
        }],
        lines: vec![
            LineSpec::solid(gross, GRAY)
                .dashed()
                .alpha(0.6)
                .labelled("Salaire brut"),
            LineSpec::solid(net_after, RED).labelled("Supernet (net après impôt)"),
            LineSpec::solid(vec![(0.0, 0.0), (max_val, max_val)], BLACK)
                .dashed()
                .alpha(0.2)
                .width(1),
        ],
    });

    specs
}

/// Render one chart to `out_dir/<file_name>`, overwriting any previous file.
pub fn render_chart(spec: &ChartSpec, out_dir: &Path, size: (u32, u32)) -> Result<PathBuf, AppError> {
    let path = out_dir.join(spec.file_name);
    draw_png(spec, &path, size)
        .map_err(|e| AppError::plot(format!("Failed to render '{}': {e}", path.display())))?;
    Ok(path)
}

fn draw_png(spec: &ChartSpec, path: &Path, size: (u32, u32)) -> Result<(), String> {
    let (x0, x1) = spec.x_bounds();
    let (y0, y1) = spec.y_bounds();

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;

    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title, ("sans-serif", 40).into_font().style(FontStyle::Bold))
        .margin(30)
        .x_label_area_size(90)
        .y_label_area_size(130)
        .build_cartesian_2d(x0..x1, y0..y1)
        .map_err(|e| e.to_string())?;

    chart
        .configure_mesh()
        .x_desc(spec.x_desc)
        .y_desc(spec.y_desc)
        .x_labels(10)
        .y_labels(10)
        .x_label_formatter(&|v| fmt_amount(*v))
        .y_label_formatter(&|v| (spec.fmt_y)(*v))
        .label_style(("sans-serif", 24))
        .axis_desc_style(("sans-serif", 28))
        .bold_line_style(&BLACK.mix(0.15))
        .light_line_style(&BLACK.mix(0.05))
        .draw()
        .map_err(|e| e.to_string())?;

    // Bands first so the curves stay visible on top.
    for band in &spec.bands {
        let outline: Vec<(f64, f64)> = band
            .upper
            .iter()
            .copied()
            .chain(band.lower.iter().rev().copied())
            .collect();
        let fill = band.color.mix(band.alpha).filled();
        chart
            .draw_series(std::iter::once(Polygon::new(outline, fill)))
            .map_err(|e| e.to_string())?
            .label(band.label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 8), (x + 24, y + 8)], fill));
    }

    for line in &spec.lines {
        let style = line.color.mix(line.alpha).stroke_width(line.width);
        let drawn = if line.dashed {
            chart.draw_series(DashedLineSeries::new(line.points.iter().copied(), 14, 8, style))
        } else {
            chart.draw_series(LineSeries::new(line.points.iter().copied(), style))
        };
        let anno = drawn.map_err(|e| e.to_string())?;

        if let Some(label) = line.label {
            anno.label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], style));
        }
    }

    if spec.has_legend() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(("sans-serif", 24))
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| e.to_string())?;
    }

    root.present().map_err(|e| e.to_string())?;
    Ok(())
}

fn fmt_amount(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_ratio(v: f64) -> String {
    format!("{v:.2}")
}

fn fmt_pct(v: f64) -> String {
    format!("{v:.0}%")
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn widen_if_flat(lo: f64, hi: f64) -> (f64, f64) {
    if hi - lo > 1e-9 {
        (lo, hi)
    } else {
        let half = (lo.abs() * 0.05).max(0.5);
        (lo - half, hi + half)
    }
}

fn pad_range(lo: f64, hi: f64, frac: f64) -> (f64, f64) {
    let pad = (hi - lo) * frac;
    (lo - pad, hi + pad)
}
