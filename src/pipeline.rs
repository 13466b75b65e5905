use std::path::Path;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::detection::DetectionRow;
use crate::error::Error;
use crate::interpolate::interpolate_track;
use crate::store::{DetectionSink, DetectionSource, Fetched};
use crate::track::{group_tracks, DuplicateFrame, Track};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Interpolate tracks on the rayon pool
    pub parallel: bool,
    /// Below this many tracks the batch is processed sequentially
    pub min_parallel_tracks: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallel: false,
            min_parallel_tracks: 64,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(contents)?)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub input_rows: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub tracks: usize,
    pub observed: usize,
    pub imputed: usize,
}

impl Report {
    #[inline]
    pub fn output_rows(&self) -> usize {
        self.observed + self.imputed
    }
}

#[derive(Debug, Default)]
pub struct Reconstruction {
    /// Grouped by track in ascending id, frame-ascending inside a track
    pub rows: Vec<DetectionRow>,
    pub duplicates: Vec<DuplicateFrame>,
    /// Entries skipped as malformed, labelled with their source line
    pub rejected: Vec<Error>,
    pub report: Report,
}

pub struct Interpolator {
    config: Config,
}

impl Interpolator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parses, groups and fills a batch of stored records. Records that fail
    /// to parse are logged and skipped; the rest of the batch is unaffected.
    pub fn reconstruct<I>(&self, records: I) -> Reconstruction
    where
        I: IntoIterator<Item = Fetched>,
    {
        let mut report = Report::default();
        let mut rows = Vec::new();
        let mut rejected = Vec::new();

        for Fetched { line, record } in records {
            report.input_rows += 1;

            match record.and_then(|r| r.into_row(line)) {
                Ok(row) => rows.push(row),
                Err(err) => {
                    warn!("skipping row: {}", err);
                    rejected.push(err);
                }
            }
        }

        report.malformed = rejected.len();

        let grouping = group_tracks(rows);
        let tracks: Vec<&Track> = grouping.tracks.values().collect();

        report.duplicates = grouping.duplicates.len();
        report.tracks = tracks.len();

        let rows = self.interpolate(&tracks);

        report.imputed = rows.iter().filter(|r| r.is_imputed()).count();
        report.observed = rows.len() - report.imputed;

        Reconstruction {
            rows,
            duplicates: grouping.duplicates,
            rejected,
            report,
        }
    }

    fn interpolate(&self, tracks: &[&Track]) -> Vec<DetectionRow> {
        let parallel = self.config.parallel && tracks.len() >= self.config.min_parallel_tracks;
        debug!("interpolating {} tracks, parallel: {}", tracks.len(), parallel);

        if parallel {
            tracks
                .par_iter()
                .flat_map(|track| interpolate_track(track))
                .collect()
        } else {
            tracks
                .iter()
                .flat_map(|track| interpolate_track(track))
                .collect()
        }
    }

    /// Fetches everything from `source`, reconstructs it and upserts the
    /// result into `sink`. An empty source is not an error and leaves the
    /// sink untouched. Sink errors are returned as they are.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<Report, Error>
    where
        S: DetectionSource + ?Sized,
        K: DetectionSink + ?Sized,
    {
        let records = source.fetch_all()?;
        if records.is_empty() {
            info!("no detection records, nothing to do");
            return Ok(Report::default());
        }

        let Reconstruction { rows, report, .. } = self.reconstruct(records);

        if !rows.is_empty() {
            sink.upsert_all(&rows)?;
        }

        info!(
            "{} input rows ({} malformed, {} duplicate) -> {} tracks, {} observed + {} imputed rows",
            report.input_rows,
            report.malformed,
            report.duplicates,
            report.tracks,
            report.observed,
            report.imputed
        );

        Ok(report)
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
