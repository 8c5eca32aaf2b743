#[cfg(feature = "python")]
use pyo3::prelude::*;

use crate::config::{EffortLevel, FormatSpec, Options, ReferenceMetric, RiderField};
use crate::constants::TURN_LENGTH_ROUNDING_SECONDS;
use crate::error::{PacingError, Result};
use crate::multiplier::MultiplierSource;
use crate::riders::{Riders, Stats};

/// Target power for the lead rider while `remaining` riders are still in the line.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerBandRow {
    pub remaining: usize,
    pub min: f64,
    pub max: f64,
}

/// Rounded turn length for one rider.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq)]
pub struct TurnLengthRow {
    pub number: usize,
    pub name: Option<String>,
    pub raw_seconds: f64,
    pub seconds: u32,
}

#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingSummary {
    pub average_turn_length: f64,

    /// Seconds a rider spends off the front per rotation
    pub rest_time: f64,
}

/// Everything the results page shows.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq)]
pub struct PacingReport {
    pub metric: ReferenceMetric,
    pub stats: Stats,
    pub power_band: Vec<PowerBandRow>,
    pub turn_lengths: Vec<TurnLengthRow>,
    pub summary: PacingSummary,
}

/// Target power band for every rider count from `riders` down to 1.
///
/// The upper bound scales the team average, the lower bound the second
/// average, both by the same multiplier. Rows above the team size are never
/// looked up.
pub fn target_power_band<S>(
    stats: &Stats,
    riders: usize,
    effort: EffortLevel,
    source: &S,
) -> Result<Vec<PowerBandRow>>
where
    S: MultiplierSource + ?Sized,
{
    if riders == 0 {
        return Err(PacingError::Computation(
            "power band needs at least one rider".to_string(),
        ));
    }
    (1..=riders)
        .rev()
        .map(|remaining| {
            let multiplier = source.lookup(remaining, effort)?;
            Ok(PowerBandRow {
                remaining,
                min: stats.second_average * multiplier,
                max: stats.average * multiplier,
            })
        })
        .collect()
}

pub fn format_spec(metric: ReferenceMetric) -> FormatSpec {
    metric.format_spec()
}

/// Render a value in `metric`: whole watts, or W/kg to one decimal.
pub fn format_power(value: f64, metric: ReferenceMetric) -> String {
    format!("{:.*}", metric.format_spec().decimals, value)
}

/// Nearest multiple of 5 seconds, ties to even, as whole seconds.
///
/// Fails on NaN, negative, or out-of-range input instead of clamping.
pub fn round_turn_length(raw: f64) -> Result<u32> {
    let rounded =
        (raw / TURN_LENGTH_ROUNDING_SECONDS).round_ties_even() * TURN_LENGTH_ROUNDING_SECONDS;
    if !(0.0..=f64::from(u32::MAX)).contains(&rounded) {
        return Err(PacingError::Computation(format!(
            "turn length must be a finite, non-negative number of seconds, got {}",
            raw
        )));
    }
    Ok(rounded as u32)
}

pub fn rounded_turn_lengths(raw: &[f64]) -> Result<Vec<u32>> {
    raw.iter().copied().map(round_turn_length).collect()
}

pub fn average_turn_length(rounded: &[u32]) -> Result<f64> {
    if rounded.is_empty() {
        return Err(PacingError::Computation(
            "no turn lengths to average".to_string(),
        ));
    }
    let total: f64 = rounded.iter().map(|&s| f64::from(s)).sum();
    Ok(total / rounded.len() as f64)
}

/// Time a rider rests while everyone else takes their turn: the full
/// rotation minus one average turn.
pub fn rest_time(rounded: &[u32]) -> Result<f64> {
    let average = average_turn_length(rounded)?;
    let total: f64 = rounded.iter().map(|&s| f64::from(s)).sum();
    Ok(total - average)
}

/// `"{minutes}min {seconds}s"`, both truncated.
pub fn format_rest_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    format!("{}min {}s", (seconds / 60.0) as u64, (seconds % 60.0) as u64)
}

/// Run the whole calculation for one team.
///
/// Power must be set for every rider, and weight too when pacing on W/kg.
/// The first problem found aborts the run.
#[tracing::instrument(skip_all, fields(riders = riders.len(), metric = ?options.reference_metric))]
pub fn compute_pacing<S>(riders: &Riders, options: &Options, source: &S) -> Result<PacingReport>
where
    S: MultiplierSource + ?Sized,
{
    if riders.len() != options.riders {
        return Err(PacingError::Configuration(format!(
            "options expect {} riders, team has {}",
            options.riders,
            riders.len()
        )));
    }

    options.validate_pacing()?;

    let metric = options.reference_metric;
    riders.validate(RiderField::Power)?;
    if metric == ReferenceMetric::Wkg {
        riders.validate(RiderField::Weight)?;
    }

    let stats = riders.stats(metric.field())?;
    let power_band = target_power_band(&stats, riders.len(), options.effort, source)?;

    let raw = riders.turn_lengths(
        metric,
        options.target_turn_length,
        options.reference_power_scale,
    )?;
    let rounded = rounded_turn_lengths(&raw)?;
    let summary = PacingSummary {
        average_turn_length: average_turn_length(&rounded)?,
        rest_time: rest_time(&rounded)?,
    };

    let turn_lengths = riders
        .iter()
        .zip(raw.iter().zip(&rounded))
        .map(|(rider, (&raw_seconds, &seconds))| TurnLengthRow {
            number: rider.number,
            name: rider.name.clone(),
            raw_seconds,
            seconds,
        })
        .collect();

    tracing::debug!(
        average = stats.average,
        second_average = stats.second_average,
        rest_time = summary.rest_time,
        "pacing computed"
    );

    Ok(PacingReport {
        metric,
        stats,
        power_band,
        turn_lengths,
        summary,
    })
}

#[cfg(feature = "python")]
#[pymethods]
impl PowerBandRow {
    fn __repr__(&self) -> String {
        format!(
            "PowerBandRow(remaining={}, min={:.2}, max={:.2})",
            self.remaining, self.min, self.max
        )
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl TurnLengthRow {
    fn __repr__(&self) -> String {
        format!(
            "TurnLengthRow(number={}, name={:?}, seconds={})",
            self.number, self.name, self.seconds
        )
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl PacingSummary {
    /// Rest time as shown to riders, e.g. `"3min 30s"`
    #[getter]
    fn rest_time_display(&self) -> String {
        format_rest_time(self.rest_time)
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl PacingReport {
    fn __repr__(&self) -> String {
        format!(
            "PacingReport({} riders, average={:.1}, rest_time={:.0}s)",
            self.turn_lengths.len(),
            self.stats.average,
            self.summary.rest_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplier::{MultiplierTable, ScalarMultiplier};
    use crate::rider::Rider;

    fn team(powers: &[u32]) -> Riders {
        Riders::from_riders(
            powers
                .iter()
                .enumerate()
                .map(|(i, &p)| Rider::new(i).with_power(p).with_name(format!("R{}", i)))
                .collect(),
        )
        .unwrap()
    }

    fn options(riders: usize) -> Options {
        Options {
            riders,
            ..Options::default()
        }
    }

    #[test]
    fn test_power_band_scalar() {
        let stats = Stats {
            average: 280.0,
            stddev: 10.0,
            second_average: 270.0,
        };
        let band = target_power_band(&stats, 4, EffortLevel::Medium, &ScalarMultiplier).unwrap();
        let remaining: Vec<usize> = band.iter().map(|r| r.remaining).collect();
        assert_eq!(remaining, vec![4, 3, 2, 1]);
        for row in &band {
            assert!((row.max - 364.0).abs() < 1e-9);
            assert!((row.min - 351.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_power_band_table_uses_only_team_rows() {
        // 5 rows in the table, team of 3
        let csv = "1,2,3\n1.5,1.5,1.5\n1.4,1.4,1.4\n1.3,1.35,1.4\n1.2,1.25,1.3\n1.1,1.15,1.2\n";
        let table = MultiplierTable::from_reader(csv.as_bytes()).unwrap();
        let stats = Stats {
            average: 200.0,
            stddev: 0.0,
            second_average: 200.0,
        };
        let band = target_power_band(&stats, 3, EffortLevel::Medium, &table).unwrap();
        assert_eq!(band.len(), 3);
        assert_eq!(band[0].remaining, 3);
        assert!((band[0].max - 270.0).abs() < 1e-9);
        assert!((band[1].max - 250.0).abs() < 1e-9);
        assert!((band[2].max - 230.0).abs() < 1e-9);
    }

    #[test]
    fn test_power_band_missing_effort() {
        let mut table = MultiplierTable::new();
        table.insert(1, 1, 1.2).unwrap();
        let stats = Stats {
            average: 200.0,
            stddev: 0.0,
            second_average: 200.0,
        };
        assert!(matches!(
            target_power_band(&stats, 1, EffortLevel::Hard, &table),
            Err(PacingError::Configuration(_))
        ));
    }

    #[test]
    fn test_format_power() {
        assert_eq!(format_power(280.4, ReferenceMetric::Power), "280");
        assert_eq!(format_power(3.96, ReferenceMetric::Wkg), "4.0");
        assert_eq!(format_power(3.84, ReferenceMetric::Wkg), "3.8");
        assert_eq!(format_spec(ReferenceMetric::Power).unit, "Watts");
    }

    #[test]
    fn test_round_turn_length() {
        assert_eq!(round_turn_length(0.0).unwrap(), 0);
        assert_eq!(round_turn_length(31.0).unwrap(), 30);
        assert_eq!(round_turn_length(33.0).unwrap(), 35);
        assert_eq!(round_turn_length(36.4).unwrap(), 35);
        // ties go to the even multiple
        assert_eq!(round_turn_length(12.5).unwrap(), 10);
        assert_eq!(round_turn_length(17.5).unwrap(), 20);
        assert_eq!(rounded_turn_lengths(&[22.4, 47.6]).unwrap(), vec![20, 50]);
    }

    #[test]
    fn test_round_turn_length_rejects_bad_input() {
        for raw in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -10.0, 1e12] {
            assert!(matches!(
                round_turn_length(raw),
                Err(PacingError::Computation(_))
            ));
        }
        // rounds to zero rather than below it
        assert_eq!(round_turn_length(-2.0).unwrap(), 0);
        assert!(rounded_turn_lengths(&[30.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_compute_pacing_rejects_bad_power_scale() {
        let riders = team(&[300, 280, 260]);
        for scale in [f64::NAN, 0.0, -3.0, f64::INFINITY] {
            let opts = Options {
                reference_power_scale: scale,
                ..options(3)
            };
            assert!(matches!(
                compute_pacing(&riders, &opts, &ScalarMultiplier),
                Err(PacingError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_compute_pacing_rejects_zero_target_turn() {
        let riders = team(&[300, 280, 260]);
        let opts = Options {
            target_turn_length: 0,
            ..options(3)
        };
        assert!(matches!(
            compute_pacing(&riders, &opts, &ScalarMultiplier),
            Err(PacingError::Configuration(_))
        ));
    }

    #[test]
    fn test_compute_pacing_allows_two_riders() {
        let riders = team(&[200, 300]);
        let report = compute_pacing(&riders, &options(2), &ScalarMultiplier).unwrap();
        assert!((report.stats.second_average - (250.0 - 100.0 / 8.0_f64.sqrt())).abs() < 1e-9);
    }

    #[test]
    fn test_rest_time() {
        let rest = rest_time(&[30, 40, 20]).unwrap();
        assert!((rest - 60.0).abs() < 1e-12);
        assert!((average_turn_length(&[30, 40, 20]).unwrap() - 30.0).abs() < 1e-12);
        assert!(rest_time(&[]).is_err());
    }

    #[test]
    fn test_format_rest_time() {
        assert_eq!(format_rest_time(210.0), "3min 30s");
        assert_eq!(format_rest_time(59.9), "0min 59s");
        assert_eq!(format_rest_time(0.0), "0min 0s");
    }

    #[test]
    fn test_compute_pacing_three_riders() {
        let riders = team(&[300, 280, 260]);
        let report = compute_pacing(&riders, &options(3), &ScalarMultiplier).unwrap();

        assert_eq!(report.metric, ReferenceMetric::Power);
        assert!((report.stats.average - 280.0).abs() < 1e-9);
        assert!((report.stats.stddev - 10.0).abs() < 1e-9);
        assert!((report.stats.second_average - 270.0).abs() < 1e-9);

        let seconds: Vec<u32> = report.turn_lengths.iter().map(|r| r.seconds).collect();
        // 36.9, 30.0, 24.0
        assert_eq!(seconds, vec![35, 30, 25]);
        assert_eq!(report.turn_lengths[0].name.as_deref(), Some("R0"));
        assert!((report.summary.average_turn_length - 30.0).abs() < 1e-12);
        assert!((report.summary.rest_time - 60.0).abs() < 1e-12);

        assert_eq!(report.power_band.len(), 3);
        assert!((report.power_band[0].max - 280.0 * 1.3).abs() < 1e-9);
        assert!((report.power_band[0].min - 270.0 * 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_compute_pacing_wkg_needs_weight() {
        let riders = team(&[300, 280, 260]);
        let opts = Options {
            reference_metric: ReferenceMetric::Wkg,
            ..options(3)
        };
        assert!(matches!(
            compute_pacing(&riders, &opts, &ScalarMultiplier),
            Err(PacingError::Validation { number: 0, field: RiderField::Weight })
        ));
    }

    #[test]
    fn test_compute_pacing_missing_power() {
        let mut riders = team(&[300, 280, 260]);
        riders.get_mut(2).unwrap().power = None;
        assert!(matches!(
            compute_pacing(&riders, &options(3), &ScalarMultiplier),
            Err(PacingError::Validation { number: 2, field: RiderField::Power })
        ));
    }

    #[test]
    fn test_compute_pacing_team_size_mismatch() {
        let riders = team(&[300, 280, 260]);
        assert!(matches!(
            compute_pacing(&riders, &options(4), &ScalarMultiplier),
            Err(PacingError::Configuration(_))
        ));
    }

    #[test]
    fn test_compute_pacing_is_repeatable() {
        let riders = team(&[310, 295, 280, 250]);
        let opts = options(4);
        let first = compute_pacing(&riders, &opts, &ScalarMultiplier).unwrap();
        let second = compute_pacing(&riders, &opts, &ScalarMultiplier).unwrap();
        assert_eq!(first, second);
    }
}
