//! Prediction history
//!
//! One record per gateway request: who asked, what they sent and what came
//! back. Writes are best-effort; a failed write is logged and never changes
//! the prediction returned to the caller.
//!
//! `SqlitePredictionLog` persists to a SQLite file keyed by `prediction_id`.
//! Without a database path the server keeps the most recent records in a
//! bounded `MemoryPredictionLog`.

use crate::reading::{PredictionResult, Reading};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Identity recorded when the caller supplies none
pub const ANONYMOUS_USER: &str = "anonymous";

/// Records kept by the in-memory store before the oldest is evicted
pub const DEFAULT_MEMORY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub prediction_id: Uuid,
    pub user_email: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub temperature: f64,
    pub salinity: f64,
    pub season: String,
    pub predicted_zone: String,
    /// Species joined with ", "
    pub fish_recommendations: String,
    pub gps_zone: String,
    pub timestamp: DateTime<Utc>,
}

impl PredictionRecord {
    /// Fresh record with a new v4 id, stamped now
    pub fn new(user_email: &str, reading: &Reading, result: &PredictionResult) -> Self {
        Self {
            prediction_id: Uuid::new_v4(),
            user_email: user_email.to_string(),
            latitude: reading.gps.map(|p| p.lat),
            longitude: reading.gps.map(|p| p.lon),
            temperature: reading.temperature,
            salinity: reading.salinity,
            season: reading.season.to_string(),
            predicted_zone: result.predicted_zone.clone(),
            fish_recommendations: result.fish_recommendations.join(", "),
            gps_zone: result.gps_zone.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history database error at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt prediction record: {0}")]
    Corrupt(String),

    #[error("history store lock poisoned")]
    Poisoned,
}

/// Key-value record store for prediction history
pub trait PredictionLog: Send + Sync {
    fn put(&self, record: &PredictionRecord) -> Result<(), HistoryError>;
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS predictions (
    prediction_id TEXT PRIMARY KEY,
    user_email TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    temperature REAL NOT NULL,
    salinity REAL NOT NULL,
    season TEXT NOT NULL,
    predicted_zone TEXT NOT NULL,
    fish_recommendations TEXT NOT NULL,
    gps_zone TEXT NOT NULL,
    timestamp TEXT NOT NULL
);";

/// SQLite-backed store, one row per prediction
pub struct SqlitePredictionLog {
    conn: Mutex<Connection>,
}

impl SqlitePredictionLog {
    /// Open (or create) the database file and ensure the table exists
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        let open_err = |source| HistoryError::Open { path: path.to_path_buf(), source };

        let conn = Connection::open(path).map_err(open_err)?;
        conn.execute_batch(SCHEMA).map_err(open_err)?;

        tracing::info!("Prediction history: {:?}", path);
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Every stored record in insertion order
    pub fn records(&self) -> Result<Vec<PredictionRecord>, HistoryError> {
        let conn = self.conn.lock().map_err(|_| HistoryError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT prediction_id, user_email, latitude, longitude, temperature, salinity,
                    season, predicted_zone, fish_recommendations, gps_zone, timestamp
             FROM predictions
             ORDER BY rowid",
        )?;

        let rows = stmt
            .query_map([], StoredRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredRow::into_record).collect()
    }
}

impl PredictionLog for SqlitePredictionLog {
    fn put(&self, record: &PredictionRecord) -> Result<(), HistoryError> {
        let conn = self.conn.lock().map_err(|_| HistoryError::Poisoned)?;
        conn.execute(
            "INSERT INTO predictions (
                prediction_id,
                user_email,
                latitude,
                longitude,
                temperature,
                salinity,
                season,
                predicted_zone,
                fish_recommendations,
                gps_zone,
                timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.prediction_id.to_string(),
                record.user_email,
                record.latitude,
                record.longitude,
                record.temperature,
                record.salinity,
                record.season,
                record.predicted_zone,
                record.fish_recommendations,
                record.gps_zone,
                record.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

/// Row as stored; id and timestamp are still text
struct StoredRow {
    prediction_id: String,
    user_email: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    temperature: f64,
    salinity: f64,
    season: String,
    predicted_zone: String,
    fish_recommendations: String,
    gps_zone: String,
    timestamp: String,
}

impl StoredRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            prediction_id: row.get("prediction_id")?,
            user_email: row.get("user_email")?,
            latitude: row.get("latitude")?,
            longitude: row.get("longitude")?,
            temperature: row.get("temperature")?,
            salinity: row.get("salinity")?,
            season: row.get("season")?,
            predicted_zone: row.get("predicted_zone")?,
            fish_recommendations: row.get("fish_recommendations")?,
            gps_zone: row.get("gps_zone")?,
            timestamp: row.get("timestamp")?,
        })
    }

    fn into_record(self) -> Result<PredictionRecord, HistoryError> {
        let prediction_id = Uuid::parse_str(&self.prediction_id).map_err(|e| {
            HistoryError::Corrupt(format!("prediction_id '{}': {}", self.prediction_id, e))
        })?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| HistoryError::Corrupt(format!("timestamp '{}': {}", self.timestamp, e)))?;

        Ok(PredictionRecord {
            prediction_id,
            user_email: self.user_email,
            latitude: self.latitude,
            longitude: self.longitude,
            temperature: self.temperature,
            salinity: self.salinity,
            season: self.season,
            predicted_zone: self.predicted_zone,
            fish_recommendations: self.fish_recommendations,
            gps_zone: self.gps_zone,
            timestamp,
        })
    }
}

/// In-process store holding at most `capacity` records, oldest evicted first
pub struct MemoryPredictionLog {
    capacity: usize,
    records: Mutex<VecDeque<PredictionRecord>>,
}

impl Default for MemoryPredictionLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }
}

impl MemoryPredictionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_MEMORY_CAPACITY))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained records, oldest first
    pub fn records(&self) -> Vec<PredictionRecord> {
        self.records
            .lock()
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl PredictionLog for MemoryPredictionLog {
    fn put(&self, record: &PredictionRecord) -> Result<(), HistoryError> {
        if self.capacity == 0 {
            return Ok(());
        }

        let mut records = self.records.lock().map_err(|_| HistoryError::Poisoned)?;
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }
}

/// Write a record, logging instead of propagating failures
pub fn record_best_effort(log: &dyn PredictionLog, record: &PredictionRecord) {
    match log.put(record) {
        Ok(()) => tracing::debug!("Recorded prediction {}", record.prediction_id),
        Err(e) => tracing::warn!("Failed to record prediction {}: {}", record.prediction_id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::Season;

    fn sample() -> (Reading, PredictionResult) {
        let reading = Reading::new(12.0, None, Season::Spring).with_gps(44.6, -63.6);
        let result = PredictionResult {
            predicted_zone: "Zone A".to_string(),
            gps_zone: "Zone B".to_string(),
            fish_recommendations: vec!["Cod".to_string(), "Herring".to_string(), "Hake".to_string()],
            lat: 44.6,
            lon: -63.6,
            radius_km: 7.0,
            area_name: "Near Point Pleasant".to_string(),
        };
        (reading, result)
    }

    struct FailingLog;

    impl PredictionLog for FailingLog {
        fn put(&self, _record: &PredictionRecord) -> Result<(), HistoryError> {
            Err(HistoryError::Poisoned)
        }
    }

    #[test]
    fn test_record_fields() {
        let (reading, result) = sample();
        let record = PredictionRecord::new("angler@example.com", &reading, &result);
        assert_eq!(record.fish_recommendations, "Cod, Herring, Hake");
        assert_eq!(record.latitude, Some(44.6));
        assert_eq!(record.season, "Spring");
        assert_eq!(record.gps_zone, "Zone B");

        let other = PredictionRecord::new("angler@example.com", &reading, &result);
        assert_ne!(record.prediction_id, other.prediction_id);
    }

    #[test]
    fn test_sqlite_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        let (reading, result) = sample();

        let first = PredictionRecord::new(ANONYMOUS_USER, &reading, &result);
        let second = PredictionRecord::new(
            "angler@example.com",
            &Reading::new(18.0, Some(31.0), Season::Summer),
            &result,
        );
        {
            let log = SqlitePredictionLog::open(&path).unwrap();
            log.put(&first).unwrap();
            log.put(&second).unwrap();
        }

        // Reopen: rows survive and the schema is not recreated
        let log = SqlitePredictionLog::open(&path).unwrap();
        let records = log.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prediction_id, first.prediction_id);
        assert_eq!(records[0].latitude, Some(44.6));
        assert_eq!(records[1].user_email, "angler@example.com");
        assert_eq!(records[1].latitude, None);
        assert_eq!(records[1].season, "Summer");
        assert_eq!(records[1].timestamp.timestamp_micros(), second.timestamp.timestamp_micros());
    }

    #[test]
    fn test_sqlite_rejects_duplicate_id() {
        let dir = tempfile::tempdir().unwrap();
        let log = SqlitePredictionLog::open(&dir.path().join("history.db")).unwrap();
        let (reading, result) = sample();
        let record = PredictionRecord::new(ANONYMOUS_USER, &reading, &result);

        log.put(&record).unwrap();
        assert!(matches!(log.put(&record), Err(HistoryError::Sqlite(_))));
        assert_eq!(log.records().unwrap().len(), 1);
    }

    #[test]
    fn test_memory_log_evicts_oldest() {
        let (reading, result) = sample();
        let memory = MemoryPredictionLog::with_capacity(3);

        let records: Vec<PredictionRecord> = (0..5)
            .map(|_| PredictionRecord::new(ANONYMOUS_USER, &reading, &result))
            .collect();
        for record in &records {
            memory.put(record).unwrap();
        }

        let kept = memory.records();
        assert_eq!(kept.len(), 3);
        assert_eq!(kept, records[2..].to_vec());

        let disabled = MemoryPredictionLog::with_capacity(0);
        disabled.put(&records[0]).unwrap();
        assert!(disabled.records().is_empty());

        assert_eq!(MemoryPredictionLog::new().capacity(), DEFAULT_MEMORY_CAPACITY);
    }

    #[test]
    fn test_best_effort_swallows_failures() {
        let (reading, result) = sample();
        let record = PredictionRecord::new(ANONYMOUS_USER, &reading, &result);
        record_best_effort(&FailingLog, &record);

        let memory = MemoryPredictionLog::new();
        record_best_effort(&memory, &record);
        assert_eq!(memory.records().len(), 1);
    }
}
