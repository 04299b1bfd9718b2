//! Wall-clock time spent in each stage of a feature-finding run.

use serde::Serialize;
use std::time::Duration;

use crate::pipeline::Stage;

#[derive(Debug, Default, Clone, Copy)]
pub struct StageTimings {
    pub accumulate: Duration,
    pub detect_peaks: Duration,
    pub estimate_isotopes: Duration,
    pub match_ms2: Duration,
    pub deconvolute: Duration,
    pub link_features: Duration,
}

impl StageTimings {
    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        let slot = match stage {
            Stage::Accumulate => &mut self.accumulate,
            Stage::DetectPeaks => &mut self.detect_peaks,
            Stage::EstimateIsotopes => &mut self.estimate_isotopes,
            Stage::MatchMs2 => &mut self.match_ms2,
            Stage::Deconvolute => &mut self.deconvolute,
            Stage::LinkFeatures => &mut self.link_features,
        };
        *slot += elapsed;
    }

    pub fn total(&self) -> Duration {
        self.accumulate
            + self.detect_peaks
            + self.estimate_isotopes
            + self.match_ms2
            + self.deconvolute
            + self.link_features
    }
}

impl Serialize for StageTimings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("StageTimings", 7)?;
        state.serialize_field("accumulate_ms", &self.accumulate.as_millis())?;
        state.serialize_field("detect_peaks_ms", &self.detect_peaks.as_millis())?;
        state.serialize_field("estimate_isotopes_ms", &self.estimate_isotopes.as_millis())?;
        state.serialize_field("match_ms2_ms", &self.match_ms2.as_millis())?;
        state.serialize_field("deconvolute_ms", &self.deconvolute.as_millis())?;
        state.serialize_field("link_features_ms", &self.link_features.as_millis())?;
        state.serialize_field("total_ms", &self.total().as_millis())?;
        state.end()
    }
}

impl std::ops::AddAssign for StageTimings {
    fn add_assign(&mut self, rhs: Self) {
        self.accumulate += rhs.accumulate;
        self.detect_peaks += rhs.detect_peaks;
        self.estimate_isotopes += rhs.estimate_isotopes;
        self.match_ms2 += rhs.match_ms2;
        self.deconvolute += rhs.deconvolute;
        self.link_features += rhs.link_features;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_serialize() {
        let mut t = StageTimings::default();
        t.record(Stage::MatchMs2, Duration::from_millis(12));
        t.record(Stage::MatchMs2, Duration::from_millis(3));
        t += StageTimings {
            accumulate: Duration::from_millis(5),
            ..Default::default()
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&t).unwrap()).unwrap();
        assert_eq!(json["match_ms2_ms"], 15);
        assert_eq!(json["accumulate_ms"], 5);
        assert_eq!(json["total_ms"], 20);
    }
}
