//! Saved runs on disk
//!
//! Every collection is a plain text table: one header line with the column
//! names, then one whitespace-separated row per record. Floats are written
//! with their shortest round-trip representation, so reading a table back
//! yields bit-identical values.
//!
//! ```text
//! <root>/
//! └── 20261018-093012/
//!     ├── parameters.txt
//!     ├── movements.txt
//!     ├── tasks.txt
//!     └── results.txt
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use mcs_core::{SimulationParameters, SimulationResult, Task, UserMovementEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PersistenceError, StoreResult};

pub const PARAMETERS_FILE: &str = "parameters.txt";
pub const MOVEMENTS_FILE: &str = "movements.txt";
pub const TASKS_FILE: &str = "tasks.txt";
pub const RESULTS_FILE: &str = "results.txt";

/// A value that maps to one row of a text table
pub trait Record: Sized {
    /// Column names, in field order
    const COLUMNS: &'static [&'static str];

    fn to_fields(&self) -> Vec<String>;

    fn from_fields(fields: &[&str]) -> Result<Self, String>;
}

fn field<T: FromStr>(fields: &[&str], index: usize, name: &str) -> Result<T, String>
where
    T::Err: fmt::Display,
{
    let raw = fields.get(index).ok_or_else(|| format!("missing column '{}'", name))?;
    raw.parse()
        .map_err(|e| format!("column '{}': cannot parse '{}': {}", name, raw, e))
}

impl Record for UserMovementEvent {
    const COLUMNS: &'static [&'static str] =
        &["userId", "latitude", "longitude", "timestamp", "day", "hour", "minute", "second"];

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.user_id.to_string(),
            self.latitude.to_string(),
            self.longitude.to_string(),
            self.timestamp.to_string(),
            self.day.to_string(),
            self.hour.to_string(),
            self.minute.to_string(),
            self.second.to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(UserMovementEvent {
            user_id: field(fields, 0, "userId")?,
            latitude: field(fields, 1, "latitude")?,
            longitude: field(fields, 2, "longitude")?,
            timestamp: field(fields, 3, "timestamp")?,
            day: field(fields, 4, "day")?,
            hour: field(fields, 5, "hour")?,
            minute: field(fields, 6, "minute")?,
            second: field(fields, 7, "second")?,
        })
    }
}

impl Record for Task {
    const COLUMNS: &'static [&'static str] =
        &["taskId", "latitude", "longitude", "timestamp", "duration", "distance", "timeslots"];

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.task_id.to_string(),
            self.latitude.to_string(),
            self.longitude.to_string(),
            self.timestamp.to_string(),
            self.duration.to_string(),
            self.distance.to_string(),
            self.timeslots.to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(Task {
            task_id: field(fields, 0, "taskId")?,
            latitude: field(fields, 1, "latitude")?,
            longitude: field(fields, 2, "longitude")?,
            timestamp: field(fields, 3, "timestamp")?,
            duration: field(fields, 4, "duration")?,
            distance: field(fields, 5, "distance")?,
            timeslots: field(fields, 6, "timeslots")?,
        })
    }
}

impl Record for SimulationResult {
    const COLUMNS: &'static [&'static str] = &["taskId", "candidates"];

    fn to_fields(&self) -> Vec<String> {
        vec![self.task_id.to_string(), self.candidates.to_string()]
    }

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(SimulationResult {
            task_id: field(fields, 0, "taskId")?,
            candidates: field(fields, 1, "candidates")?,
        })
    }
}

impl Record for SimulationParameters {
    const COLUMNS: &'static [&'static str] = &[
        "days",
        "numberOfUsers",
        "locomotionType",
        "numberOfTasks",
        "executionRange",
        "taskDuration",
        "timeslotDuration",
        "platformType",
    ];

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.days.to_string(),
            self.number_of_users.to_string(),
            self.locomotion_type.to_string(),
            self.number_of_tasks.to_string(),
            self.execution_range.to_string(),
            self.task_duration.to_string(),
            self.timeslot_duration.to_string(),
            self.platform_type.to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(SimulationParameters {
            days: field(fields, 0, "days")?,
            number_of_users: field(fields, 1, "numberOfUsers")?,
            locomotion_type: field(fields, 2, "locomotionType")?,
            number_of_tasks: field(fields, 3, "numberOfTasks")?,
            execution_range: field(fields, 4, "executionRange")?,
            task_duration: field(fields, 5, "taskDuration")?,
            timeslot_duration: field(fields, 6, "timeslotDuration")?,
            platform_type: field(fields, 7, "platformType")?,
        })
    }
}

/// Write `records` as a text table, replacing any existing file
pub fn write_table<R: Record>(path: &Path, records: &[R]) -> StoreResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{}", R::COLUMNS.join(" "))?;
    for record in records {
        writeln!(out, "{}", record.to_fields().join(" "))?;
    }
    out.flush()?;
    debug!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Read a text table written by [`write_table`]. Blank lines are skipped.
pub fn read_table<R: Record>(path: &Path) -> StoreResult<Vec<R>> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let bad_header = || PersistenceError::BadHeader {
        path: path.to_path_buf(),
        expected: R::COLUMNS.join(" "),
    };
    let header = lines.next().ok_or_else(bad_header)??;
    if !header.split_whitespace().eq(R::COLUMNS.iter().copied()) {
        return Err(bad_header());
    }

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        // Header is line 1
        let line_number = index + 2;
        if fields.len() != R::COLUMNS.len() {
            return Err(PersistenceError::parse(
                path,
                line_number,
                format!("expected {} columns, found {}", R::COLUMNS.len(), fields.len()),
            ));
        }
        let record = R::from_fields(&fields).map_err(|msg| PersistenceError::parse(path, line_number, msg))?;
        records.push(record);
    }

    Ok(records)
}

/// Identifier of a saved run, derived from its generation time
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for a run generated at `at`
    pub fn from_time(at: chrono::DateTime<chrono::Utc>) -> Self {
        Self(at.format("%Y%m%d-%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `YYYYMMDD-HHMMSS`, optionally followed by `-N`
    pub fn is_well_formed(&self) -> bool {
        let bytes = self.0.as_bytes();
        if bytes.len() < 15 {
            return false;
        }
        let (stamp, suffix) = bytes.split_at(15);
        let stamp_ok = stamp.iter().enumerate().all(|(i, b)| match i {
            8 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
        let suffix_ok = match suffix.split_first() {
            None => true,
            Some((b'-', digits)) => !digits.is_empty() && digits.iter().all(u8::is_ascii_digit),
            Some(_) => false,
        };
        stamp_ok && suffix_ok
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything persisted for one run
#[derive(Debug, Clone, PartialEq)]
pub struct SavedRun {
    pub id: RunId,
    pub parameters: Option<SimulationParameters>,
    pub movements: Vec<UserMovementEvent>,
    pub tasks: Vec<Task>,
    pub results: Vec<SimulationResult>,
}

/// Directory of saved runs
#[derive(Debug, Clone)]
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, id: &RunId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Create a fresh run directory stamped with the current time.
    ///
    /// Identifiers that already exist get a `-N` suffix.
    pub fn create_run(&self) -> StoreResult<RunId> {
        fs::create_dir_all(&self.root)?;
        let base = RunId::from_time(chrono::Utc::now());

        let mut id = base.clone();
        let mut suffix = 1;
        while self.run_dir(&id).exists() {
            id = RunId(format!("{}-{}", base, suffix));
            suffix += 1;
        }

        fs::create_dir(self.run_dir(&id))?;
        info!("Created run {} in {}", id, self.root.display());
        Ok(id)
    }

    /// Saved run identifiers, oldest first
    pub fn list_runs(&self) -> StoreResult<Vec<RunId>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().to_str().map(RunId::new) {
                Some(id) if id.is_well_formed() => runs.push(id),
                _ => debug!("Skipping {} in run store", entry.path().display()),
            }
        }
        runs.sort();
        Ok(runs)
    }

    pub fn delete_run(&self, id: &RunId) -> StoreResult<()> {
        let dir = self.existing_run_dir(id)?;
        fs::remove_dir_all(&dir)?;
        info!("Deleted run {}", id);
        Ok(())
    }

    pub fn write_parameters(&self, id: &RunId, params: &SimulationParameters) -> StoreResult<()> {
        write_table(&self.existing_run_dir(id)?.join(PARAMETERS_FILE), std::slice::from_ref(params))
    }

    pub fn write_movements(&self, id: &RunId, movements: &[UserMovementEvent]) -> StoreResult<()> {
        write_table(&self.existing_run_dir(id)?.join(MOVEMENTS_FILE), movements)
    }

    pub fn write_tasks(&self, id: &RunId, tasks: &[Task]) -> StoreResult<()> {
        write_table(&self.existing_run_dir(id)?.join(TASKS_FILE), tasks)
    }

    pub fn write_results(&self, id: &RunId, results: &[SimulationResult]) -> StoreResult<()> {
        write_table(&self.existing_run_dir(id)?.join(RESULTS_FILE), results)
    }

    pub fn read_parameters(&self, id: &RunId) -> StoreResult<SimulationParameters> {
        let path = self.existing_run_dir(id)?.join(PARAMETERS_FILE);
        read_table(&path)?
            .into_iter()
            .next()
            .ok_or_else(|| PersistenceError::parse(&path, 2, "no parameter row"))
    }

    pub fn read_movements(&self, id: &RunId) -> StoreResult<Vec<UserMovementEvent>> {
        self.read_optional(id, MOVEMENTS_FILE)
    }

    pub fn read_tasks(&self, id: &RunId) -> StoreResult<Vec<Task>> {
        self.read_optional(id, TASKS_FILE)
    }

    pub fn read_results(&self, id: &RunId) -> StoreResult<Vec<SimulationResult>> {
        self.read_optional(id, RESULTS_FILE)
    }

    /// Load every table of a run; tables not yet written come back empty
    pub fn load_run(&self, id: &RunId) -> StoreResult<SavedRun> {
        let dir = self.existing_run_dir(id)?;
        let parameters = if dir.join(PARAMETERS_FILE).exists() {
            Some(self.read_parameters(id)?)
        } else {
            None
        };

        Ok(SavedRun {
            id: id.clone(),
            parameters,
            movements: self.read_movements(id)?,
            tasks: self.read_tasks(id)?,
            results: self.read_results(id)?,
        })
    }

    fn read_optional<R: Record>(&self, id: &RunId, file: &str) -> StoreResult<Vec<R>> {
        let path = self.existing_run_dir(id)?.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_table(&path)
    }

    fn existing_run_dir(&self, id: &RunId) -> StoreResult<PathBuf> {
        let mut components = Path::new(id.as_str()).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        let dir = self.run_dir(id);
        if !single_name || id.as_str().contains(['/', '\\']) || !dir.is_dir() {
            return Err(PersistenceError::RunNotFound(id.to_string()));
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcs_core::{LocomotionType, PlatformType};
    use tempfile::TempDir;

    fn sample_movements() -> Vec<UserMovementEvent> {
        vec![
            UserMovementEvent {
                user_id: 1,
                latitude: 40.640_123_456_789,
                longitude: 22.944_4,
                timestamp: 1_700_000_000.123_456,
                day: 0,
                hour: 22,
                minute: 13,
                second: 20,
            },
            UserMovementEvent {
                user_id: 2,
                latitude: -0.1,
                longitude: 1e-7,
                timestamp: 1_700_086_399.5,
                day: 1,
                hour: 23,
                minute: 59,
                second: 59,
            },
        ]
    }

    fn sample_tasks() -> Vec<Task> {
        vec![Task {
            task_id: 1,
            latitude: 40.65,
            longitude: 22.95,
            timestamp: 1_700_000_100.25,
            duration: 60,
            distance: 150.5,
            timeslots: 15,
        }]
    }

    #[test]
    fn test_table_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MOVEMENTS_FILE);

        let movements = sample_movements();
        write_table(&path, &movements).unwrap();
        let read: Vec<UserMovementEvent> = read_table(&path).unwrap();

        assert_eq!(read, movements);
    }

    #[test]
    fn test_header_and_row_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(RESULTS_FILE);

        write_table(&path, &[SimulationResult { task_id: 3, candidates: 12 }]).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert_eq!(text, "taskId candidates\n3 12\n");
    }

    #[test]
    fn test_parameters_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PARAMETERS_FILE);
        let params = SimulationParameters {
            days: 3,
            number_of_users: 120,
            locomotion_type: LocomotionType::Drive,
            number_of_tasks: 40,
            execution_range: 750.5,
            task_duration: 90,
            timeslot_duration: 30,
            platform_type: PlatformType::MecMcs,
        };

        write_table(&path, std::slice::from_ref(&params)).unwrap();
        let read: Vec<SimulationParameters> = read_table(&path).unwrap();

        assert_eq!(read, vec![params]);
    }

    #[test]
    fn test_wrong_header_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TASKS_FILE);
        fs::write(&path, "taskId candidates\n1 2\n").unwrap();

        let result: StoreResult<Vec<Task>> = read_table(&path);
        assert!(matches!(result, Err(PersistenceError::BadHeader { .. })));
    }

    #[test]
    fn test_bad_row_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(RESULTS_FILE);
        fs::write(&path, "taskId candidates\n1 2\n\n2 many\n").unwrap();

        let result: StoreResult<Vec<SimulationResult>> = read_table(&path);
        match result {
            Err(PersistenceError::Parse { line, message, .. }) => {
                assert_eq!(line, 4);
                assert!(message.contains("candidates"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_run_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path().join("runs"));
        assert!(store.list_runs().unwrap().is_empty());

        let first = store.create_run().unwrap();
        let second = store.create_run().unwrap();
        assert_ne!(first, second);

        let params = SimulationParameters::default();
        store.write_parameters(&first, &params).unwrap();
        store.write_movements(&first, &sample_movements()).unwrap();
        store.write_tasks(&first, &sample_tasks()).unwrap();
        store
            .write_results(&first, &[SimulationResult { task_id: 1, candidates: 2 }])
            .unwrap();

        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.contains(&first) && runs.contains(&second));

        let saved = store.load_run(&first).unwrap();
        assert_eq!(saved.parameters, Some(params));
        assert_eq!(saved.movements, sample_movements());
        assert_eq!(saved.tasks, sample_tasks());
        assert_eq!(saved.results, vec![SimulationResult { task_id: 1, candidates: 2 }]);

        // Nothing written yet
        let empty = store.load_run(&second).unwrap();
        assert!(empty.parameters.is_none() && empty.movements.is_empty());

        store.delete_run(&first).unwrap();
        assert_eq!(store.list_runs().unwrap(), vec![second]);
        assert!(matches!(store.load_run(&first), Err(PersistenceError::RunNotFound(_))));
    }

    #[test]
    fn test_unknown_run_rejected() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());

        assert!(matches!(
            store.delete_run(&RunId::new("19700101-000000")),
            Err(PersistenceError::RunNotFound(_))
        ));
        assert!(matches!(
            store.delete_run(&RunId::new("../elsewhere")),
            Err(PersistenceError::RunNotFound(_))
        ));
    }

    #[test]
    fn test_dot_ids_never_leave_the_store() {
        let dir = TempDir::new().unwrap();
        let keep = dir.path().join("keep");
        let store = RunStore::new(keep.join("runs"));
        store.create_run().unwrap();
        fs::write(keep.join("precious.txt"), "keep me").unwrap();

        for id in ["..", ".", "./", ""] {
            assert!(matches!(
                store.delete_run(&RunId::new(id)),
                Err(PersistenceError::RunNotFound(_))
            ));
            assert!(matches!(
                store.load_run(&RunId::new(id)),
                Err(PersistenceError::RunNotFound(_))
            ));
        }

        assert!(keep.join("precious.txt").exists());
        assert!(keep.join("runs").is_dir());
        assert_eq!(store.list_runs().unwrap().len(), 1);
    }

    #[test]
    fn test_list_runs_skips_foreign_entries() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());
        let id = store.create_run().unwrap();

        fs::create_dir(dir.path().join("notes")).unwrap();
        fs::create_dir(dir.path().join("20261018-093012-x")).unwrap();
        fs::write(dir.path().join("20261018-093013"), "not a directory").unwrap();

        assert_eq!(store.list_runs().unwrap(), vec![id]);
    }

    #[test]
    fn test_run_id_shape() {
        assert!(RunId::new("20261018-093012").is_well_formed());
        assert!(RunId::new("20261018-093012-2").is_well_formed());
        assert!(!RunId::new("20261018-093012-").is_well_formed());
        assert!(!RunId::new("20261018_093012").is_well_formed());
        assert!(!RunId::new("notes").is_well_formed());
        assert!(!RunId::new("..").is_well_formed());
    }

    #[test]
    fn test_run_id_format() {
        let at = chrono::DateTime::parse_from_rfc3339("2026-10-18T09:30:12Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert_eq!(RunId::from_time(at).as_str(), "20261018-093012");
    }
}
