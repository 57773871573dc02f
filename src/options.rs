use std::sync::LazyLock;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Deserializer, de};

use crate::time::{TimeLayout, default_layouts};

/// Default nesting limit for container conversion and normalization.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Unit of a bare number read as an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpochUnit {
    Seconds,
    Millis,
    Micros,
    Nanos,
}

impl EpochUnit {
    pub(crate) fn nanos(self) -> i128 {
        match self {
            EpochUnit::Seconds => 1_000_000_000,
            EpochUnit::Millis => 1_000_000,
            EpochUnit::Micros => 1_000,
            EpochUnit::Nanos => 1,
        }
    }
}

/// Conversion policy
///
/// Every field has a default, so a config document only needs the keys it
/// changes:
///
/// ```
/// use valcast::{EpochUnit, Options};
///
/// let options: Options = serde_json::from_str(r#"{"epoch": "millis"}"#).unwrap();
/// assert_eq!(options.epoch, Some(EpochUnit::Millis));
/// assert_eq!(options.max_depth, valcast::DEFAULT_MAX_DEPTH);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// How numbers convert to instants; `None` rejects them
    pub epoch: Option<EpochUnit>,
    /// Offset applied to zone-less times and epoch instants, configured as
    /// seconds east of UTC
    #[serde(deserialize_with = "offset_seconds")]
    pub default_offset: FixedOffset,
    /// Accepted instant layouts, tried in order
    pub time_layouts: Vec<TimeLayout>,
    /// Deepest container nesting accepted before failing with `TooDeep`
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            epoch: None,
            default_offset: Utc.fix(),
            time_layouts: default_layouts(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

fn offset_seconds<'de, D>(deserializer: D) -> Result<FixedOffset, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = i32::deserialize(deserializer)?;
    FixedOffset::east_opt(seconds).ok_or_else(|| {
        de::Error::invalid_value(
            de::Unexpected::Signed(i64::from(seconds)),
            &"an offset within 24 hours of UTC, in seconds",
        )
    })
}

static DEFAULT_OPTIONS: LazyLock<Options> = LazyLock::new(Options::default);

impl Options {
    /// Shared default policy used by the module-level conversion functions
    pub fn global() -> &'static Options {
        &DEFAULT_OPTIONS
    }

    pub fn with_epoch(mut self, unit: EpochUnit) -> Self {
        self.epoch = Some(unit);
        self
    }

    pub fn with_default_offset(mut self, offset: FixedOffset) -> Self {
        self.default_offset = offset;
        self
    }

    pub fn with_time_layouts(mut self, layouts: Vec<TimeLayout>) -> Self {
        self.time_layouts = layouts;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.default_offset
    }
}
