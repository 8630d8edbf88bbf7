#[cfg(feature = "gridplotting")]
use plotters::prelude::*;
#[cfg(feature = "use_serde")]
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::io::{self, Write};
use thiserror::Error;

/// Every estimate is multiplied by this factor, so that the quarter circle
/// integrates to π.
pub const SCALE: f64 = 4.;

/// The default integrand: the upper-right quarter of the unit circle.
pub fn quarter_circle(x: f64) -> f64 {
    (1. - x * x).sqrt()
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplePointsError {
    #[error("a sample sequence needs at least two points, got {0}")]
    TooFewPoints(usize),
}

/// Ordered x-coordinates at which the integrand is evaluated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "use_serde", serde(try_from = "UncheckedSamplePoints"))]
pub struct SamplePoints {
    points: Vec<f64>,
}

/// Wire shape of [`SamplePoints`], checked through `from_points` before use.
#[cfg(feature = "use_serde")]
#[derive(Deserialize)]
struct UncheckedSamplePoints {
    points: Vec<f64>,
}

#[cfg(feature = "use_serde")]
impl TryFrom<UncheckedSamplePoints> for SamplePoints {
    type Error = SamplePointsError;

    fn try_from(unchecked: UncheckedSamplePoints) -> Result<SamplePoints, SamplePointsError> {
        SamplePoints::from_points(unchecked.points)
    }
}

impl SamplePoints {
    /// The initial sequence `[0, 1]`.
    pub fn new() -> SamplePoints {
        SamplePoints {
            points: vec![0., 1.],
        }
    }

    pub fn from_points(points: Vec<f64>) -> Result<SamplePoints, SamplePointsError> {
        if points.len() < 2 {
            return Err(SamplePointsError::TooFewPoints(points.len()));
        }

        Ok(SamplePoints { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.points
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.points
    }

    /// Insert the midpoint between every adjacent pair, turning `n + 1`
    /// points into `2n + 1`. The endpoints are kept as they are.
    pub fn refine(&self) -> SamplePoints {
        let mut refined = Vec::with_capacity(2 * self.points.len() - 1);
        refined.push(self.points[0]);

        for w in self.points.windows(2) {
            refined.push((w[0] + w[1]) / 2.);
            refined.push(w[1]);
        }

        log::trace!("refined {} points into {}", self.points.len(), refined.len());

        SamplePoints { points: refined }
    }

    pub fn evaluate<F: Fn(f64) -> f64>(&self, f: F) -> Vec<f64> {
        self.points.iter().map(|&x| f(x)).collect()
    }

    #[cfg(feature = "gridplotting")]
    pub fn plot(
        &self,
        f: &dyn Fn(f64) -> f64,
        filename: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let f_evals: Vec<(f32, f32)> = (0..101)
            .map(|i| (i as f32 / 100., f(i as f64 / 100.) as f32))
            .collect();
        let y_max = f_evals
            .iter()
            .map(|e| e.1)
            .filter(|y| y.is_finite())
            .fold(1f32, f32::max);

        let root = SVGBackend::new(filename, (640, 640)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.margin(10, 10, 10, 10);
        let mut chart = ChartBuilder::on(&root)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_ranged(0f32..1f32, 0f32..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(10)
            .y_labels(10)
            .draw()?;

        chart.draw_series(LineSeries::new(f_evals.into_iter(), &RED))?;

        // one vertical tick per sample, as high as the function value there
        for &x in &self.points {
            let fx = f(x) as f32;
            let top = if fx.is_finite() { fx } else { 0. };
            let tick = vec![(x as f32, 0f32), (x as f32, top)];
            chart.draw_series(LineSeries::new(tick.into_iter(), &BLACK))?;
        }

        Ok(())
    }
}

impl Default for SamplePoints {
    fn default() -> SamplePoints {
        SamplePoints::new()
    }
}

impl TryFrom<Vec<f64>> for SamplePoints {
    type Error = SamplePointsError;

    fn try_from(points: Vec<f64>) -> Result<SamplePoints, SamplePointsError> {
        SamplePoints::from_points(points)
    }
}

/// Weight every value, endpoints included, by the full slice width
/// `1 / (len - 1)` and scale the sum by [`SCALE`].
pub fn riemann_estimate<F: Fn(f64) -> f64>(points: &SamplePoints, f: F) -> f64 {
    let values = points.evaluate(f);
    let slice_width = 1. / (values.len() - 1) as f64;

    values.iter().map(|v| v * slice_width).sum::<f64>() * SCALE
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "use_serde", derive(Serialize, Deserialize))]
pub struct Estimate {
    /// 1-based refinement count.
    pub iteration: usize,
    /// Number of sample points the estimate was computed from.
    pub n_points: usize,
    /// The scaled integral estimate.
    pub value: f64,
}

/// Refines the sample sequence once per step and yields a fresh estimate.
/// As an iterator it never ends.
pub struct Refiner<F: Fn(f64) -> f64> {
    function: F,
    points: SamplePoints,
    iteration: usize,
}

impl<F: Fn(f64) -> f64> Refiner<F> {
    pub fn new(function: F) -> Refiner<F> {
        Refiner {
            function,
            points: SamplePoints::new(),
            iteration: 0,
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn points(&self) -> &SamplePoints {
        &self.points
    }

    pub fn step(&mut self) -> Estimate {
        self.iteration += 1;
        self.points = self.points.refine();

        let value = riemann_estimate(&self.points, &self.function);
        log::debug!(
            "iteration {}: {} points, estimate {}",
            self.iteration,
            self.points.len(),
            value
        );

        Estimate {
            iteration: self.iteration,
            n_points: self.points.len(),
            value,
        }
    }
}

impl<F: Fn(f64) -> f64> Iterator for Refiner<F> {
    type Item = Estimate;

    fn next(&mut self) -> Option<Estimate> {
        Some(self.step())
    }
}

/// Write one estimate per line to `out`. Without a limit this only returns
/// when writing fails.
pub fn run<F: Fn(f64) -> f64, W: Write>(
    refiner: &mut Refiner<F>,
    out: &mut W,
    limit: Option<usize>,
) -> io::Result<()> {
    let mut remaining = limit;
    loop {
        if remaining == Some(0) {
            return Ok(());
        }

        let estimate = refiner.step();
        writeln!(out, "{:?}", estimate.value)?;
        out.flush()?;

        remaining = remaining.map(|r| r - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::convert::TryFrom;

    #[test]
    fn refine_initial_points() {
        let refined = SamplePoints::new().refine();
        assert_eq!(refined.as_slice(), &[0., 0.5, 1.]);

        let refined = refined.refine();
        assert_eq!(refined.as_slice(), &[0., 0.25, 0.5, 0.75, 1.]);
    }

    #[test]
    fn refine_keeps_endpoints_of_arbitrary_sequence() {
        let points = SamplePoints::from_points(vec![-2., 1., 7.]).unwrap();
        assert_eq!(points.refine().as_slice(), &[-2., -0.5, 1., 4., 7.]);
    }

    #[test]
    fn too_few_points() {
        assert_eq!(
            SamplePoints::from_points(vec![0.5]),
            Err(SamplePointsError::TooFewPoints(1))
        );
        assert_eq!(
            SamplePoints::try_from(Vec::<f64>::new()),
            Err(SamplePointsError::TooFewPoints(0))
        );
        assert_eq!(
            SamplePointsError::TooFewPoints(1).to_string(),
            "a sample sequence needs at least two points, got 1"
        );
    }

    #[test]
    fn estimate_weights_endpoints_fully() {
        // f(0) and f(1) both count with the full slice width
        let points = SamplePoints::new().refine();
        assert_approx_eq!(riemann_estimate(&points, |x| x), 3.0, 1e-12);
        assert_approx_eq!(riemann_estimate(&SamplePoints::new(), |_| 1.), 8.0, 1e-12);
    }

    #[test]
    fn nan_propagates() {
        let points = SamplePoints::from_points(vec![0., 2.]).unwrap();
        assert!(riemann_estimate(&points, quarter_circle).is_nan());
    }

    #[test]
    fn step_counts_iterations() {
        let mut refiner = Refiner::new(|_| 1.);
        assert_eq!(refiner.iteration(), 0);
        assert_eq!(refiner.points().len(), 2);

        let estimate = refiner.step();
        assert_eq!(estimate.iteration, 1);
        assert_eq!(estimate.n_points, 3);
        assert_eq!(refiner.points().as_slice(), &[0., 0.5, 1.]);
    }

    #[test]
    fn run_respects_limit() {
        let mut out = Vec::new();
        let mut refiner = Refiner::new(|_| 1.);
        run(&mut refiner, &mut out, Some(3)).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "6.0\n5.0\n4.5\n");
        assert_eq!(refiner.iteration(), 3);
    }

    #[test]
    fn run_with_zero_limit_does_nothing() {
        let mut out = Vec::new();
        let mut refiner = Refiner::new(quarter_circle);
        run(&mut refiner, &mut out, Some(0)).unwrap();

        assert!(out.is_empty());
        assert_eq!(refiner.iteration(), 0);
    }
}
