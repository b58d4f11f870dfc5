use std::fmt;

use super::error::CompileError;
use super::levels::{LevelSpec, MAX_RESOLUTION};

/// Tag written on a result when its type carries a default name.
pub const DEFAULT_NAME_TAG: &str = "mkgmap:default_name";

/// The kind of map feature a rule set produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Point,
    Polyline,
    Polygon,
    Relation,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Point => write!(f, "point"),
            FeatureKind::Polyline => write!(f, "polyline"),
            FeatureKind::Polygon => write!(f, "polygon"),
            FeatureKind::Relation => write!(f, "relation"),
        }
    }
}

/// Routing attributes of a road type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadAttributes {
    pub class: u8,
    pub speed: u8,
}

/// The map feature a matching rule resolves to.
///
/// Built once from a [`FeatureTypeBuilder`] when the rule set is compiled and
/// shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureType {
    kind: FeatureKind,
    code: u32,
    min_resolution: u8,
    max_resolution: u8,
    min_level: u8,
    max_level: Option<u8>,
    road: Option<RoadAttributes>,
    continue_search: bool,
    propagate_actions: bool,
    default_name: Option<String>,
}

impl FeatureType {
    /// Start describing a feature type with the given type code.
    #[must_use]
    pub fn builder(code: u32) -> FeatureTypeBuilder {
        FeatureTypeBuilder {
            code,
            span: Span::Default,
            road_class: None,
            road_speed: None,
            continue_search: false,
            propagate: None,
            default_name: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// The numeric type code. Point codes are always in their widened
    /// `type << 8 | subtype` form.
    #[must_use]
    pub fn code(&self) -> u32 {
        self.code
    }

    #[must_use]
    pub fn min_resolution(&self) -> u8 {
        self.min_resolution
    }

    #[must_use]
    pub fn max_resolution(&self) -> u8 {
        self.max_resolution
    }

    #[must_use]
    pub fn min_level(&self) -> u8 {
        self.min_level
    }

    /// The coarsest level the feature appears at, or `None` if it is too
    /// detailed for every configured level.
    #[must_use]
    pub fn max_level(&self) -> Option<u8> {
        self.max_level
    }

    #[must_use]
    pub fn road(&self) -> Option<RoadAttributes> {
        self.road
    }

    #[must_use]
    pub fn is_road(&self) -> bool {
        self.road.is_some()
    }

    #[must_use]
    pub fn continue_search(&self) -> bool {
        self.continue_search
    }

    /// Whether a continuing match's actions stay visible to later rules.
    #[must_use]
    pub fn propagate_actions(&self) -> bool {
        self.propagate_actions
    }

    #[must_use]
    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}", self.code)?;
        match self.max_level {
            None if self.max_resolution == MAX_RESOLUTION => {
                write!(f, " resolution {}", self.min_resolution)?;
            }
            None => write!(
                f,
                " resolution {}-{}",
                self.max_resolution, self.min_resolution
            )?,
            Some(max) if self.min_level == 0 => write!(f, " level {max}")?,
            Some(max) => write!(f, " level {}-{max}", self.min_level)?,
        }
        if let Some(road) = self.road {
            write!(f, " road_class={} road_speed={}", road.class, road.speed)?;
        }
        if let Some(name) = &self.default_name {
            write!(f, " default_name='{name}'")?;
        }
        if self.continue_search {
            write!(f, " continue")?;
            if self.propagate_actions {
                write!(f, " propagate")?;
            }
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Default,
    Resolution(u8, Option<u8>),
    Level(u8, Option<u8>),
}

/// Description of a feature type as written in a rule's type clause.
///
/// Validation against the feature kind and level configuration happens in
/// [`build`](Self::build), which the rule set compiler calls.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct FeatureTypeBuilder {
    code: u32,
    span: Span,
    road_class: Option<u8>,
    road_speed: Option<u8>,
    continue_search: bool,
    propagate: Option<bool>,
    default_name: Option<String>,
}

impl FeatureTypeBuilder {
    /// Minimum resolution; the maximum stays at 24.
    pub fn resolution(mut self, min: u8) -> Self {
        self.span = Span::Resolution(min, None);
        self
    }

    /// A resolution range. Reversed bounds are swapped.
    pub fn resolution_range(mut self, a: u8, b: u8) -> Self {
        self.span = Span::Resolution(a, Some(b));
        self
    }

    /// Highest level the feature is shown at, converted to a resolution
    /// through the level configuration.
    pub fn level(mut self, max: u8) -> Self {
        self.span = Span::Level(max, None);
        self
    }

    pub fn level_range(mut self, a: u8, b: u8) -> Self {
        self.span = Span::Level(a, Some(b));
        self
    }

    pub fn default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    pub fn road_class(mut self, class: u8) -> Self {
        self.road_class = Some(class);
        self
    }

    pub fn road_speed(mut self, speed: u8) -> Self {
        self.road_speed = Some(speed);
        self
    }

    /// Keep searching for further matches after this type is produced.
    /// Actions are no longer propagated unless [`propagate`](Self::propagate)
    /// is also given.
    pub fn continue_search(mut self) -> Self {
        self.continue_search = true;
        self
    }

    pub fn propagate(mut self) -> Self {
        self.propagate = Some(true);
        self
    }

    pub fn no_propagate(mut self) -> Self {
        self.propagate = Some(false);
        self
    }

    #[must_use]
    pub fn is_continue(&self) -> bool {
        self.continue_search
    }

    /// Validate and freeze the type for a rule set of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if the code is invalid for `kind`, a
    /// resolution is above 24, a level is not configured in `levels` or a
    /// road attribute is out of range.
    pub fn build(&self, kind: FeatureKind, levels: &LevelSpec) -> Result<FeatureType, CompileError> {
        let code = check_code(kind, self.code)?;

        let (min_resolution, max_resolution) = match self.span {
            Span::Default => (MAX_RESOLUTION, MAX_RESOLUTION),
            Span::Resolution(min, None) => (check_resolution(min)?, MAX_RESOLUTION),
            Span::Resolution(a, Some(b)) => {
                ordered(check_resolution(a)?, check_resolution(b)?)
            }
            Span::Level(max, None) => (level_to_resolution(levels, max)?, MAX_RESOLUTION),
            Span::Level(a, Some(b)) => ordered(
                level_to_resolution(levels, a)?,
                level_to_resolution(levels, b)?,
            ),
        };
        let (min_level, max_level) = levels.level_range(min_resolution, max_resolution);

        let road = match (self.road_class, self.road_speed) {
            (None, None) => None,
            (class, speed) => Some(RoadAttributes {
                class: check_road("road_class", class.unwrap_or(0), 4)?,
                speed: check_road("road_speed", speed.unwrap_or(0), 7)?,
            }),
        };

        Ok(FeatureType {
            kind,
            code,
            min_resolution,
            max_resolution,
            min_level,
            max_level,
            road,
            continue_search: self.continue_search,
            propagate_actions: self.propagate.unwrap_or(!self.continue_search),
            default_name: self.default_name.clone(),
        })
    }
}

fn ordered(a: u8, b: u8) -> (u8, u8) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

fn check_code(kind: FeatureKind, code: u32) -> Result<u32, CompileError> {
    let invalid = || CompileError::InvalidTypeCode {
        kind,
        code,
        location: None,
    };
    if code >= 0x10000 {
        return if code & 0xff <= 0x1f && kind != FeatureKind::Relation {
            Ok(code)
        } else {
            Err(invalid())
        };
    }
    let valid = match kind {
        FeatureKind::Polyline => (0x01..=0x3f).contains(&code),
        FeatureKind::Polygon => (0x01..=0x7f).contains(&code) && code != 0x4a,
        FeatureKind::Point => {
            let widened = if code <= 0xff { code << 8 } else { code };
            return if (0x0100..=0xffff).contains(&widened) && widened & 0xff <= 0x1f {
                Ok(widened)
            } else {
                Err(invalid())
            };
        }
        FeatureKind::Relation => false,
    };
    if valid {
        Ok(code)
    } else {
        Err(invalid())
    }
}

fn check_resolution(resolution: u8) -> Result<u8, CompileError> {
    if resolution > MAX_RESOLUTION {
        return Err(CompileError::InvalidResolution {
            resolution,
            location: None,
        });
    }
    Ok(resolution)
}

fn level_to_resolution(levels: &LevelSpec, level: u8) -> Result<u8, CompileError> {
    // Levels are stored coarsest first, so level n is counted from the end.
    let configured = levels.levels();
    let max = u8::try_from(configured.len().saturating_sub(1)).unwrap_or(u8::MAX);
    if level > max {
        return Err(CompileError::LevelOutOfRange {
            level,
            max,
            location: None,
        });
    }
    Ok(configured[usize::from(max - level)].bits)
}

fn check_road(attribute: &'static str, value: u8, max: u8) -> Result<u8, CompileError> {
    if value > max {
        return Err(CompileError::InvalidRoadAttribute {
            attribute,
            value,
            location: None,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(kind: FeatureKind, b: FeatureTypeBuilder) -> Result<FeatureType, CompileError> {
        b.build(kind, &LevelSpec::default())
    }

    #[test]
    fn polyline_codes() {
        assert!(build(FeatureKind::Polyline, FeatureType::builder(0x3)).is_ok());
        assert!(build(FeatureKind::Polyline, FeatureType::builder(0x3f)).is_ok());
        assert!(matches!(
            build(FeatureKind::Polyline, FeatureType::builder(0x40)),
            Err(CompileError::InvalidTypeCode { code: 0x40, .. })
        ));
    }

    #[test]
    fn polygon_codes() {
        assert!(build(FeatureKind::Polygon, FeatureType::builder(0x3c)).is_ok());
        assert!(build(FeatureKind::Polygon, FeatureType::builder(0x4a)).is_err());
        assert!(build(FeatureKind::Polygon, FeatureType::builder(0x80)).is_err());
    }

    #[test]
    fn point_codes_are_widened() {
        let ty = build(FeatureKind::Point, FeatureType::builder(0x2f)).unwrap();
        assert_eq!(ty.code(), 0x2f00);
        let ty = build(FeatureKind::Point, FeatureType::builder(0x2f06)).unwrap();
        assert_eq!(ty.code(), 0x2f06);
        assert!(build(FeatureKind::Point, FeatureType::builder(0x2f20)).is_err());
        assert!(build(FeatureKind::Point, FeatureType::builder(0)).is_err());
    }

    #[test]
    fn extended_codes() {
        assert!(build(FeatureKind::Polyline, FeatureType::builder(0x10e10)).is_ok());
        assert!(build(FeatureKind::Polygon, FeatureType::builder(0x10f20)).is_err());
    }

    #[test]
    fn relations_have_no_type() {
        assert!(build(FeatureKind::Relation, FeatureType::builder(0x3)).is_err());
    }

    #[test]
    fn resolution_range_is_swapped() {
        let ty = build(
            FeatureKind::Polyline,
            FeatureType::builder(0x3).resolution_range(22, 18),
        )
        .unwrap();
        assert_eq!((ty.min_resolution(), ty.max_resolution()), (18, 22));
        assert!(build(FeatureKind::Polyline, FeatureType::builder(0x3).resolution(25)).is_err());
    }

    #[test]
    fn level_converts_to_resolution() {
        let ty = build(FeatureKind::Polyline, FeatureType::builder(0x3).level(2)).unwrap();
        assert_eq!(ty.min_resolution(), 20);
        assert_eq!(ty.max_resolution(), 24);
        assert_eq!(ty.min_level(), 0);
        assert_eq!(ty.max_level(), Some(2));
        assert_eq!(ty.to_string(), "[0x3 level 2]");
    }

    #[test]
    fn level_range_display() {
        let ty = build(FeatureKind::Polyline, FeatureType::builder(0x3).level_range(3, 1)).unwrap();
        assert_eq!((ty.min_resolution(), ty.max_resolution()), (18, 22));
        assert_eq!(ty.to_string(), "[0x3 level 1-3]");
    }

    #[test]
    fn level_above_maximum() {
        let err = build(FeatureKind::Polyline, FeatureType::builder(0x3).level(5)).unwrap_err();
        assert_eq!(err.to_string(), "level number 5 too large, max=4");
    }

    #[test]
    fn resolution_display_when_no_level_fits() {
        let levels: LevelSpec = "0:24".parse().unwrap();
        let ty = FeatureType::builder(0x2f06)
            .resolution(20)
            .build(FeatureKind::Point, &levels)
            .unwrap();
        assert_eq!(ty.max_level(), None);
        assert_eq!(ty.to_string(), "[0x2f06 resolution 20]");
        let ty = FeatureType::builder(0x2f06)
            .resolution_range(20, 22)
            .build(FeatureKind::Point, &levels)
            .unwrap();
        assert_eq!(ty.max_level(), None);
        assert_eq!(ty.to_string(), "[0x2f06 resolution 22-20]");
    }

    #[test]
    fn continue_turns_off_propagation() {
        let ty = build(FeatureKind::Polyline, FeatureType::builder(0x3).continue_search()).unwrap();
        assert!(ty.continue_search());
        assert!(!ty.propagate_actions());
        let ty = build(
            FeatureKind::Polyline,
            FeatureType::builder(0x3).continue_search().propagate(),
        )
        .unwrap();
        assert!(ty.propagate_actions());
        assert_eq!(ty.to_string(), "[0x3 level 0 continue propagate]");
        let ty = build(FeatureKind::Polyline, FeatureType::builder(0x3)).unwrap();
        assert!(ty.propagate_actions());
    }

    #[test]
    fn road_attributes() {
        let ty = build(
            FeatureKind::Polyline,
            FeatureType::builder(0x1).road_class(4).road_speed(7),
        )
        .unwrap();
        assert_eq!(ty.road(), Some(RoadAttributes { class: 4, speed: 7 }));
        assert!(build(FeatureKind::Polyline, FeatureType::builder(0x1).road_class(5)).is_err());
        assert!(build(FeatureKind::Polyline, FeatureType::builder(0x1).road_speed(8)).is_err());
        assert!(!build(FeatureKind::Polyline, FeatureType::builder(0x1)).unwrap().is_road());
    }
}
