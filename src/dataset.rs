use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::error::{TrackplotError, TrackplotResult};
use crate::metric::SampleMetric;

/// One recorded sample of one vehicle.
///
/// Column names are fixed and case-sensitive; a file missing any of them
/// fails deserialization of its first row.
#[derive(Clone, Debug, Deserialize)]
pub struct Sample {
    /// Identifier of the tracked vehicle.
    pub vehicle_id: String,
    /// Timestamp of the sample.
    pub time: f64,
    /// Position x in meters.
    pub location_x: f64,
    /// Position y in meters.
    pub location_y: f64,
    /// Heading in degrees.
    pub rotation_yaw: f64,
    /// Velocity x component in m/s.
    pub velocity_x: f64,
    /// Velocity y component in m/s.
    pub velocity_y: f64,
    /// Velocity z component in m/s.
    pub velocity_z: f64,
}

/// The loaded trajectory table plus its derived metric columns.
///
/// Samples and derived columns are computed once at load time and read-only
/// afterwards; every frame is evaluated against the same `Dataset`.
#[derive(Clone, Debug)]
pub struct Dataset {
    samples: Vec<Sample>,
    metric: Vec<f64>,
    metric_norm: Vec<f64>,
    metric_min: f64,
    metric_max: f64,
}

impl Dataset {
    /// Load a CSV file and derive the metric columns.
    pub fn load_csv(path: &Path, metric: &dyn SampleMetric) -> TrackplotResult<Self> {
        let file = File::open(path).map_err(|e| {
            TrackplotError::dataset(format!("failed to open '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(file), metric)
    }

    /// Deserialize CSV rows from any reader and derive the metric columns.
    pub fn from_reader<R: io::Read>(reader: R, metric: &dyn SampleMetric) -> TrackplotResult<Self> {
        let mut samples = Vec::new();
        for rec in csv::Reader::from_reader(reader).deserialize() {
            let rec: Sample =
                rec.map_err(|e| TrackplotError::dataset(format!("malformed row: {e}")))?;
            samples.push(rec);
        }
        Self::from_samples(samples, metric)
    }

    /// Build a dataset from already-parsed samples.
    pub fn from_samples(
        samples: Vec<Sample>,
        metric: &dyn SampleMetric,
    ) -> TrackplotResult<Self> {
        if samples.is_empty() {
            return Err(TrackplotError::dataset("dataset contains no rows"));
        }

        let metric_vals: Vec<f64> = samples.iter().map(|s| metric.eval(s)).collect();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &metric_vals {
            min = min.min(v);
            max = max.max(v);
        }
        // Also rejects NaN metrics: a NaN never satisfies max > min.
        if !(max > min) {
            return Err(TrackplotError::validation(
                "metric range is degenerate (dataset-wide max equals min); \
                 min-max normalization is undefined",
            ));
        }

        let span = max - min;
        let metric_norm = metric_vals.iter().map(|v| (v - min) / span).collect();

        Ok(Self {
            samples,
            metric: metric_vals,
            metric_norm,
            metric_min: min,
            metric_max: max,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the table holds no rows (never for a constructed dataset).
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All rows in file order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Raw metric column, indexed like [`Self::samples`].
    pub fn metric(&self) -> &[f64] {
        &self.metric
    }

    /// Min-max normalized metric column in [0, 1].
    pub fn metric_norm(&self) -> &[f64] {
        &self.metric_norm
    }

    /// Dataset-wide metric minimum.
    pub fn metric_min(&self) -> f64 {
        self.metric_min
    }

    /// Dataset-wide metric maximum.
    pub fn metric_max(&self) -> f64 {
        self.metric_max
    }

    /// Distinct timestamps, sorted ascending.
    ///
    /// File order is not trusted to be monotonic; windowing requires a sorted
    /// time axis.
    pub fn distinct_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self.samples.iter().map(|s| s.time).collect();
        times.sort_by(f64::total_cmp);
        times.dedup();
        times
    }

    /// Indices of all rows with `time <= bound`, in file order.
    pub fn rows_through(&self, bound: f64) -> Vec<usize> {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.time <= bound)
            .map(|(i, _)| i)
            .collect()
    }

    /// Vehicle ids present among `rows`, in order of first appearance.
    pub fn vehicles_in(&self, rows: &[usize]) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for &i in rows {
            let id = self.samples[i].vehicle_id.as_str();
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    /// The subset of `rows` belonging to `vehicle`, sorted by time ascending.
    pub fn vehicle_rows_sorted(&self, rows: &[usize], vehicle: &str) -> Vec<usize> {
        let mut out: Vec<usize> = rows
            .iter()
            .copied()
            .filter(|&i| self.samples[i].vehicle_id == vehicle)
            .collect();
        out.sort_by(|&a, &b| f64::total_cmp(&self.samples[a].time, &self.samples[b].time));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::SquaredSpeed;

    const CSV: &str = "\
vehicle_id,time,location_x,location_y,rotation_yaw,velocity_x,velocity_y,velocity_z
a,0.0,0.0,0.0,0.0,1.0,0.0,0.0
a,0.1,1.0,0.0,0.0,2.0,0.0,0.0
b,0.0,5.0,5.0,90.0,3.0,0.0,0.0
b,0.1,5.0,6.0,90.0,4.0,0.0,0.0
";

    fn dataset() -> Dataset {
        Dataset::from_reader(CSV.as_bytes(), &SquaredSpeed).unwrap()
    }

    #[test]
    fn loads_rows_and_derives_columns() {
        let ds = dataset();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.metric(), &[1.0, 4.0, 9.0, 16.0]);
        assert_eq!(ds.metric_min(), 1.0);
        assert_eq!(ds.metric_max(), 16.0);
    }

    #[test]
    fn normalization_hits_exact_bounds_at_global_extrema() {
        let ds = dataset();
        let norm = ds.metric_norm();
        assert_eq!(norm[0], 0.0);
        assert_eq!(norm[3], 1.0);
        assert!(norm.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn constant_metric_is_rejected() {
        let csv = "\
vehicle_id,time,location_x,location_y,rotation_yaw,velocity_x,velocity_y,velocity_z
a,0.0,0.0,0.0,0.0,1.0,0.0,0.0
a,0.1,1.0,0.0,0.0,1.0,0.0,0.0
";
        let err = Dataset::from_reader(csv.as_bytes(), &SquaredSpeed).unwrap_err();
        assert!(matches!(err, TrackplotError::Validation(_)));
    }

    #[test]
    fn missing_column_is_a_dataset_error() {
        let csv = "vehicle_id,time\na,0.0\n";
        let err = Dataset::from_reader(csv.as_bytes(), &SquaredSpeed).unwrap_err();
        assert!(matches!(err, TrackplotError::Dataset(_)));
    }

    #[test]
    fn empty_table_is_a_dataset_error() {
        let csv = "vehicle_id,time,location_x,location_y,rotation_yaw,velocity_x,velocity_y,velocity_z\n";
        let err = Dataset::from_reader(csv.as_bytes(), &SquaredSpeed).unwrap_err();
        assert!(matches!(err, TrackplotError::Dataset(_)));
    }

    #[test]
    fn distinct_times_are_sorted_and_deduplicated() {
        let csv = "\
vehicle_id,time,location_x,location_y,rotation_yaw,velocity_x,velocity_y,velocity_z
a,0.2,0.0,0.0,0.0,1.0,0.0,0.0
a,0.0,1.0,0.0,0.0,2.0,0.0,0.0
b,0.2,5.0,5.0,0.0,3.0,0.0,0.0
b,0.1,5.0,6.0,0.0,4.0,0.0,0.0
";
        let ds = Dataset::from_reader(csv.as_bytes(), &SquaredSpeed).unwrap();
        assert_eq!(ds.distinct_times(), vec![0.0, 0.1, 0.2]);
    }

    #[test]
    fn rows_through_is_cumulative() {
        let ds = dataset();
        let early = ds.rows_through(0.0);
        let late = ds.rows_through(0.1);
        assert_eq!(early, vec![0, 2]);
        assert_eq!(late, vec![0, 1, 2, 3]);
        assert!(early.iter().all(|i| late.contains(i)));
    }

    #[test]
    fn vehicles_in_keeps_first_appearance_order() {
        let ds = dataset();
        let rows = ds.rows_through(0.1);
        assert_eq!(ds.vehicles_in(&rows), vec!["a", "b"]);
    }

    #[test]
    fn vehicle_rows_come_back_time_sorted() {
        let csv = "\
vehicle_id,time,location_x,location_y,rotation_yaw,velocity_x,velocity_y,velocity_z
a,0.2,2.0,0.0,0.0,1.0,0.0,0.0
a,0.0,0.0,0.0,0.0,2.0,0.0,0.0
a,0.1,1.0,0.0,0.0,3.0,0.0,0.0
";
        let ds = Dataset::from_reader(csv.as_bytes(), &SquaredSpeed).unwrap();
        let rows = ds.rows_through(0.2);
        let sorted = ds.vehicle_rows_sorted(&rows, "a");
        assert_eq!(sorted, vec![1, 2, 0]);
    }
}
