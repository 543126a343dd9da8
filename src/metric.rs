use crate::dataset::Sample;

/// Per-row scalar used for color mapping.
///
/// The pipeline is polymorphic over this single capability so alternative
/// metrics (plain speed, lateral acceleration, ...) can be substituted
/// without touching the windowing or rendering code.
pub trait SampleMetric {
    /// Evaluate the metric for one sample.
    fn eval(&self, sample: &Sample) -> f64;
}

/// Default metric: the euclidean velocity magnitude, squared.
///
/// Computed as `sqrt(vx² + vy² + vz²)` followed by a square, which
/// algebraically collapses to `vx² + vy² + vz²`. The colorbar is labelled in
/// m/s regardless; swap in a metric without the final square to plot plain
/// speed.
#[derive(Clone, Copy, Debug, Default)]
pub struct SquaredSpeed;

impl SampleMetric for SquaredSpeed {
    fn eval(&self, sample: &Sample) -> f64 {
        let magnitude = (sample.velocity_x.powi(2)
            + sample.velocity_y.powi(2)
            + sample.velocity_z.powi(2))
        .sqrt();
        magnitude * magnitude
    }
}
