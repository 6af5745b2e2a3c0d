use super::PoloError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

pub const PRELAYOUT_TAG: &str = "prelay";
const VALUE_PATTERN: &str = r"\s*([\w_]*)=([-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?)";

/// Extraction flow that produced the post-layout result; selects the stage
/// tag searched for in the simulation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum ExtractionView {
    #[default]
    #[serde(rename = "polo")]
    Polo,
    #[serde(rename = "oa")]
    Oa,
    #[serde(rename = "smc-oa")]
    SmcOa,
}

impl ExtractionView {
    pub const fn post_layout_tag(self) -> &'static str {
        match self {
            Self::Polo => "polo",
            Self::Oa => "oa",
            Self::SmcOa => "smc-oa",
        }
    }
}

impl fmt::Display for ExtractionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.post_layout_tag())
    }
}

impl FromStr for ExtractionView {
    type Err = PoloError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "polo" => Ok(Self::Polo),
            "oa" => Ok(Self::Oa),
            "smc-oa" => Ok(Self::SmcOa),
            other => Err(PoloError::UnknownExtractionView(other.to_string())),
        }
    }
}

/// One `name=value` result; the value keeps its textual form for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measurement {
    pub name: String,
    pub value: String,
}

impl Measurement {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn numeric(&self) -> Result<f64, PoloError> {
        self.value
            .parse::<f64>()
            .map_err(|_| PoloError::InvalidValue {
                name: self.name.clone(),
                value: self.value.clone(),
            })
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

/// Pre-layout and post-layout results of one simulation output file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MeasurementRecord {
    pub prelayout: Option<Measurement>,
    pub post_layout: Option<Measurement>,
}

fn stage_pattern(tag: &str) -> Result<Regex, PoloError> {
    let pattern = format!(r"\({}\){}", regex::escape(tag), VALUE_PATTERN);
    Regex::new(&pattern).map_err(|source| PoloError::InvalidNamePattern { pattern, source })
}

fn capture(pattern: &Regex, line: &str) -> Option<Measurement> {
    let captures = pattern.captures(line)?;
    Some(Measurement::new(&captures[1], &captures[2]))
}

/// Scans simulation output for `(stage) name=value` results. A later line
/// for the same stage replaces an earlier one.
pub fn parse_measurements(text: &str, view: ExtractionView) -> Result<MeasurementRecord, PoloError> {
    let prelayout = stage_pattern(PRELAYOUT_TAG)?;
    let post_layout = stage_pattern(view.post_layout_tag())?;

    let mut record = MeasurementRecord::default();
    for line in text.lines() {
        if let Some(measurement) = capture(&prelayout, line) {
            debug!(stage = PRELAYOUT_TAG, %measurement, "measurement found");
            record.prelayout = Some(measurement);
        }
        if let Some(measurement) = capture(&post_layout, line) {
            debug!(stage = view.post_layout_tag(), %measurement, "measurement found");
            record.post_layout = Some(measurement);
        }
    }
    Ok(record)
}

pub fn read_measurements(
    path: impl AsRef<Path>,
    view: ExtractionView,
) -> Result<MeasurementRecord, PoloError> {
    let path = path.as_ref();
    info!(path = %path.display(), "reading simulation output");
    let text = fs::read_to_string(path).map_err(|source| PoloError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_measurements(&text, view)
}

#[cfg(test)]
mod tests {
    use super::{ExtractionView, Measurement, parse_measurements, read_measurements};
    use crate::polo::PoloError;
    use tempfile::TempDir;

    #[test]
    fn last_matching_line_wins_per_stage() {
        let text = "\
(prelay) freq=1.0e9
(polo) freq=0.98e9
noise line
(prelay) freq=1.1e9
";
        let record = parse_measurements(text, ExtractionView::Polo).expect("parse should succeed");

        assert_eq!(record.prelayout, Some(Measurement::new("freq", "1.1e9")));
        assert_eq!(record.post_layout, Some(Measurement::new("freq", "0.98e9")));
    }

    #[test]
    fn view_selects_post_layout_tag() {
        let text = "(prelay) freq=100\n(polo) freq=90\n(smc-oa)  freq=95\n(oa) freq=97\n";

        let smc = parse_measurements(text, ExtractionView::SmcOa).expect("parse should succeed");
        assert_eq!(smc.post_layout, Some(Measurement::new("freq", "95")));

        let oa = parse_measurements(text, ExtractionView::Oa).expect("parse should succeed");
        assert_eq!(oa.post_layout, Some(Measurement::new("freq", "97")));
    }

    #[test]
    fn missing_stage_stays_unset() {
        let record = parse_measurements("(prelay) period=-2.5E-10\n", ExtractionView::Polo)
            .expect("parse should succeed");
        assert_eq!(record.prelayout, Some(Measurement::new("period", "-2.5E-10")));
        assert_eq!(record.post_layout, None);
        assert_eq!(
            record
                .prelayout
                .as_ref()
                .map(|measurement| measurement.numeric().expect("value should be numeric")),
            Some(-2.5e-10)
        );
    }

    #[test]
    fn extraction_view_round_trips_through_text() {
        for view in [ExtractionView::Polo, ExtractionView::Oa, ExtractionView::SmcOa] {
            assert_eq!(view.to_string().parse::<ExtractionView>().ok(), Some(view));
        }
        assert!(matches!(
            "spf".parse::<ExtractionView>(),
            Err(PoloError::UnknownExtractionView(_))
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = read_measurements(temp.path().join("absent.out"), ExtractionView::Polo)
            .expect_err("missing file should fail");
        assert!(matches!(error, PoloError::Read { .. }));
    }
}
