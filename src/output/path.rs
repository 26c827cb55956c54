//! Hour-bucket path generation for output files
//!
//! Every window is filed under the UTC hour its start falls in:
//!
//! ```text
//! {outbox}/{YYYY}/{MM}/{DD}/{HH}/compliance-{YYYY}-{MM}-{DD}-{HH}.json
//! ```
//!
//! # Usage Example
//!
//! ```rust
//! use compliance_poller::output::OutputPathBuilder;
//! use chrono::{TimeZone, Utc};
//! use std::path::PathBuf;
//!
//! let start = Utc.with_ymd_and_hms(2013, 11, 15, 15, 46, 0).unwrap();
//! let path = OutputPathBuilder::for_window_start(PathBuf::from("data"), start).build();
//! assert_eq!(
//!     path,
//!     PathBuf::from("data/2013/11/15/15/compliance-2013-11-15-15.json")
//! );
//! ```

use super::{OutputError, OutputResult};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fmt;
use std::path::PathBuf;

/// File name prefix of every output file
pub const FILE_PREFIX: &str = "compliance";

/// File extension of every output file
pub const FILE_EXTENSION: &str = "json";

/// UTC hour an output file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HourBucket {
    /// Year (e.g., 2013)
    pub year: i32,
    /// Month (1-12)
    pub month: u32,
    /// Day of month (1-31)
    pub day: u32,
    /// Hour (0-23)
    pub hour: u32,
}

impl HourBucket {
    /// Bucket containing `time`
    pub fn from_datetime(time: DateTime<Utc>) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
            day: time.day(),
            hour: time.hour(),
        }
    }

    /// Relative directory: `YYYY/MM/DD/HH`
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(format!("{:04}", self.year))
            .join(format!("{:02}", self.month))
            .join(format!("{:02}", self.day))
            .join(format!("{:02}", self.hour))
    }

    /// File name: `compliance-YYYY-MM-DD-HH.json`
    pub fn file_name(&self) -> String {
        format!("{FILE_PREFIX}-{self}.{FILE_EXTENSION}")
    }
}

impl fmt::Display for HourBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}-{:02}",
            self.year, self.month, self.day, self.hour
        )
    }
}

/// Path builder for output files
#[derive(Debug, Clone)]
pub struct OutputPathBuilder {
    root_dir: PathBuf,
    bucket: HourBucket,
}

impl OutputPathBuilder {
    /// Builder rooted at `root_dir` for `bucket`
    pub fn new(root_dir: PathBuf, bucket: HourBucket) -> Self {
        Self { root_dir, bucket }
    }

    /// Builder for the bucket the window starting at `start` falls in
    pub fn for_window_start(root_dir: PathBuf, start: DateTime<Utc>) -> Self {
        Self::new(root_dir, HourBucket::from_datetime(start))
    }

    /// Bucket
    pub fn bucket(&self) -> HourBucket {
        self.bucket
    }

    /// Directory holding the file
    pub fn directory(&self) -> PathBuf {
        self.root_dir.join(self.bucket.relative_dir())
    }

    /// Complete file path
    pub fn build(&self) -> PathBuf {
        self.directory().join(self.bucket.file_name())
    }

    /// Create the bucket directory; succeeds if it already exists
    pub fn ensure_directories(&self) -> OutputResult<()> {
        let dir_path = self.directory();
        std::fs::create_dir_all(&dir_path).map_err(|e| {
            OutputError::IoError(format!(
                "Failed to create directory {}: {}",
                dir_path.display(),
                e
            ))
        })
    }
}
