use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use log::{info, warn};

use crate::detection::{DetectionRow, FrameNumber, TrackId};
use crate::error::Error;
use crate::record::DetectionRecord;

/// One entry read from a source.
#[derive(Debug)]
pub struct Fetched {
    /// 1-based position of the entry in its source, blank lines included
    pub line: usize,
    pub record: Result<DetectionRecord, Error>,
}

impl Fetched {
    #[inline]
    pub fn new(line: usize, record: Result<DetectionRecord, Error>) -> Self {
        Self { line, record }
    }
}

/// Where raw detection records come from.
pub trait DetectionSource {
    /// Every stored record. Entries that could not even be decoded as a
    /// record are reported as `Err` next to the good ones.
    fn fetch_all(&mut self) -> Result<Vec<Fetched>, Error>;
}

/// Where reconciled rows go. Writing the same batch twice must leave the
/// stored state as if it had been written once.
pub trait DetectionSink {
    fn upsert_all(&mut self, rows: &[DetectionRow]) -> Result<(), Error>;
}

/// In-memory table keyed by `(track_id, frame_number)`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: BTreeMap<(TrackId, FrameNumber), DetectionRecord>,
    unkeyed: Vec<DetectionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw insert, as the detection stage would do it.
    pub fn insert(&mut self, record: DetectionRecord) {
        match record.key() {
            Some(key) => {
                self.records.insert(key, record);
            }
            None => self.unkeyed.push(record),
        }
    }

    #[inline]
    pub fn get(&self, track_id: TrackId, frame_number: FrameNumber) -> Option<&DetectionRecord> {
        self.records.get(&(track_id, frame_number))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len() + self.unkeyed.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &DetectionRecord> {
        self.records.values().chain(self.unkeyed.iter())
    }
}

impl FromIterator<DetectionRecord> for MemoryStore {
    fn from_iter<T: IntoIterator<Item = DetectionRecord>>(iter: T) -> Self {
        let mut store = MemoryStore::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

impl DetectionSource for MemoryStore {
    fn fetch_all(&mut self) -> Result<Vec<Fetched>, Error> {
        Ok(self
            .iter()
            .enumerate()
            .map(|(i, record)| Fetched::new(i + 1, Ok(record.clone())))
            .collect())
    }
}

impl DetectionSink for MemoryStore {
    fn upsert_all(&mut self, rows: &[DetectionRow]) -> Result<(), Error> {
        for row in rows {
            self.records.insert(row.key(), DetectionRecord::from(row));
        }

        Ok(())
    }
}

/// One JSON record per line.
pub struct JsonLinesSource<R> {
    reader: R,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> DetectionSource for JsonLinesSource<R> {
    fn fetch_all(&mut self) -> Result<Vec<Fetched>, Error> {
        let mut records = Vec::new();
        let mut line = String::new();
        let mut lineno = 0;

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }
            lineno += 1;

            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let record =
                serde_json::from_str(text).map_err(|e| Error::malformed(lineno, e.to_string()));

            records.push(Fetched::new(lineno, record));
        }

        info!("fetched {} records", records.len());

        Ok(records)
    }
}

/// Writes a batch as JSON lines ordered by `(track_id, frame_number)`.
/// Rows repeating a key inside one batch replace the earlier one.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DetectionSink for JsonLinesSink<W> {
    fn upsert_all(&mut self, rows: &[DetectionRow]) -> Result<(), Error> {
        let mut batch = BTreeMap::new();
        for row in rows {
            if batch.insert(row.key(), row).is_some() {
                warn!("row for track {} frame {} written twice", row.track_id, row.frame_number);
            }
        }

        for row in batch.values() {
            let line = serde_json::to_string(&DetectionRecord::from(*row))
                .map_err(|e| Error::Sink(e.to_string()))?;

            writeln!(self.writer, "{}", line).map_err(|e| Error::Sink(e.to_string()))?;
        }

        self.writer.flush().map_err(|e| Error::Sink(e.to_string()))?;
        info!("wrote {} rows", batch.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::detection::{Origin, Recognition};
    use std::io::Cursor;

    fn row(track_id: TrackId, frame_number: FrameNumber, origin: Origin) -> DetectionRow {
        DetectionRow {
            frame_number,
            track_id,
            vehicle_box: BBox::ltrb(0.0, 0.0, 10.0, 10.0),
            plate_box: BBox::ltrb(2.0, 6.0, 8.0, 9.0),
            recognition: Recognition::unknown(),
            origin,
        }
    }

    #[test]
    fn test_memory_upsert_idempotent() {
        let rows = vec![row(1, 1, Origin::Observed), row(1, 2, Origin::Imputed), row(2, 1, Origin::Observed)];

        let mut once = MemoryStore::new();
        once.upsert_all(&rows).unwrap();

        let mut twice = MemoryStore::new();
        twice.upsert_all(&rows).unwrap();
        twice.upsert_all(&rows).unwrap();

        assert_eq!(once.len(), 3);
        assert_eq!(
            once.iter().cloned().collect::<Vec<_>>(),
            twice.iter().cloned().collect::<Vec<_>>()
        );
        assert_eq!(twice.get(1, 2).unwrap().origin, Some(Origin::Imputed));
    }

    #[test]
    fn test_memory_upsert_replaces_raw_record() {
        let raw: DetectionRecord = serde_json::from_str(
            r#"{"frame_nmr": "1", "car_id": "1.0", "car_bbox": "[0 0 5 5]", "license_plate_bbox": "[1 1 2 2]"}"#,
        )
        .unwrap();

        let mut store: MemoryStore = vec![raw].into_iter().collect();
        store.upsert_all(&[row(1, 1, Origin::Observed)]).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1, 1).unwrap().origin, Some(Origin::Observed));
    }

    #[test]
    fn test_json_lines_source() {
        let input = "{\"frame_nmr\": 1, \"car_id\": 1, \"car_bbox\": \"[0 0 5 5]\", \"license_plate_bbox\": \"[1 1 2 2]\"}\n\
                     \n\
                     not json\n\
                     {\"frame_nmr\": 2, \"car_id\": 1, \"car_bbox\": \"[0 0 5 5]\", \"license_plate_bbox\": \"[1 1 2 2]\"}\n";

        let mut source = JsonLinesSource::new(Cursor::new(input));
        let records = source.fetch_all().unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().map(|f| f.line).collect::<Vec<_>>(), vec![1, 3, 4]);
        assert!(records[0].record.is_ok());
        assert!(matches!(records[1].record, Err(Error::MalformedRow { line: 3, .. })));
        assert_eq!(records[2].record.as_ref().unwrap().key(), Some((1, 2)));
    }

    #[test]
    fn test_json_lines_sink_repeatable() {
        let rows = vec![row(2, 1, Origin::Observed), row(1, 5, Origin::Imputed), row(2, 1, Origin::Observed)];

        let mut first = JsonLinesSink::new(Vec::new());
        first.upsert_all(&rows).unwrap();
        let first = String::from_utf8(first.into_inner()).unwrap();

        let mut second = JsonLinesSink::new(Vec::new());
        second.upsert_all(&rows).unwrap();
        let second = String::from_utf8(second.into_inner()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.lines().count(), 2);
        assert!(first.lines().next().unwrap().contains("\"car_id\":1"));
    }
}
