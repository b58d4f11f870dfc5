use std::fmt;
use std::str::FromStr;

use crate::parse::ParseError;

/// Highest zoom level number accepted in a level specification.
pub const MAX_LEVEL: u8 = 16;

/// Finest resolution, in bits, of a map level.
pub const MAX_RESOLUTION: u8 = 24;

/// One map zoom level and the resolution it is drawn at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub level: u8,
    pub bits: u8,
}

/// The map's level configuration, e.g. `"0:24, 1:22, 2:20, 3:18, 4:16"`.
///
/// Levels are kept ordered from the coarsest (highest level number) to level
/// zero, which is the order resolution ranges are folded into level ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSpec {
    levels: Vec<LevelInfo>,
}

impl Default for LevelSpec {
    fn default() -> Self {
        Self {
            levels: [(4, 16), (3, 18), (2, 20), (1, 22), (0, 24)]
                .into_iter()
                .map(|(level, bits)| LevelInfo { level, bits })
                .collect(),
        }
    }
}

impl LevelSpec {
    /// Build a level spec from `(level, bits)` pairs in any order.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the list is empty, a level is repeated or
    /// above [`MAX_LEVEL`], or a resolution is outside `1..=24`.
    pub fn new(pairs: impl IntoIterator<Item = (u8, u8)>) -> Result<Self, ParseError> {
        let mut levels: Vec<LevelInfo> = pairs
            .into_iter()
            .map(|(level, bits)| LevelInfo { level, bits })
            .collect();
        if levels.is_empty() {
            return Err(ParseError::new("no levels given"));
        }
        for info in &levels {
            if info.level > MAX_LEVEL {
                return Err(ParseError::new(format!(
                    "level {} is above the maximum of {MAX_LEVEL}",
                    info.level
                )));
            }
            if info.bits == 0 || info.bits > MAX_RESOLUTION {
                return Err(ParseError::new(format!(
                    "resolution {} for level {} is outside 1-{MAX_RESOLUTION}",
                    info.bits, info.level
                )));
            }
        }
        levels.sort_by(|a, b| b.level.cmp(&a.level));
        if let Some(pair) = levels.windows(2).find(|w| w[0].level == w[1].level) {
            return Err(ParseError::new(format!(
                "level {} is given more than once",
                pair[0].level
            )));
        }
        Ok(Self { levels })
    }

    /// The highest configured level number.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        self.levels.first().map_or(0, |l| l.level)
    }

    /// The resolution drawn at `level`, if that level is configured.
    #[must_use]
    pub fn bits_for_level(&self, level: u8) -> Option<u8> {
        self.levels.iter().find(|l| l.level == level).map(|l| l.bits)
    }

    /// The levels from coarsest to finest.
    #[must_use]
    pub fn levels(&self) -> &[LevelInfo] {
        &self.levels
    }

    /// Fold a resolution range into the `(min_level, max_level)` it is
    /// visible at. `max_level` is `None` when the feature is too detailed to
    /// appear at any configured level.
    #[must_use]
    pub fn level_range(&self, min_resolution: u8, max_resolution: u8) -> (u8, Option<u8>) {
        let mut min_level = 0;
        let mut max_level = None;
        for info in &self.levels {
            if info.bits <= min_resolution {
                max_level = Some(info.level);
            }
            if info.bits <= max_resolution {
                min_level = info.level;
            }
        }
        (min_level, max_level)
    }
}

impl FromStr for LevelSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse::parse_levels(s)
    }
}

impl fmt::Display for LevelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, info) in self.levels.iter().rev().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", info.level, info.bits)?;
        }
        Ok(())
    }
}
