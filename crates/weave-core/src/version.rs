//! Maven version ordering and version range expressions

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// One component of a parsed version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Item {
    Number(u64),
    Qualifier(String),
}

/// A version string with Maven comparison semantics.
///
/// `1`, `1.0` and `1.0.0` are equal; qualifiers sort before releases
/// (`1.0-alpha < 1.0-rc1 < 1.0-SNAPSHOT < 1.0 < 1.0-sp1`) and numbers sort
/// after any qualifier at the same position.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    raw: String,
    items: Vec<Item>,
}

impl MavenVersion {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut items = Vec::new();
        for token in tokenize(&raw.to_ascii_lowercase()) {
            match token.parse::<u64>() {
                Ok(n) => items.push(Item::Number(n)),
                Err(_) if token.chars().all(|c| c.is_ascii_digit()) => {
                    items.push(Item::Number(u64::MAX))
                }
                Err(_) => items.push(Item::Qualifier(normalize_qualifier(&token))),
            }
        }

        // Trailing zeros and release markers carry no ordering information.
        while let Some(last) = items.last() {
            let trailing = match last {
                Item::Number(n) => *n == 0,
                Item::Qualifier(q) => q.is_empty(),
            };
            if !trailing {
                break;
            }
            items.pop();
        }

        MavenVersion {
            raw: raw.to_string(),
            items,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn tokenize(version: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = None;

    for c in version.chars() {
        if c == '.' || c == '-' || c == '_' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            current_is_digit = None;
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if current_is_digit.is_some_and(|d| d != is_digit) && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        current.push(c);
        current_is_digit = Some(is_digit);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn normalize_qualifier(q: &str) -> String {
    match q {
        "a" => "alpha".to_string(),
        "b" => "beta".to_string(),
        "m" => "milestone".to_string(),
        "cr" => "rc".to_string(),
        "ga" | "final" | "release" => String::new(),
        other => other.to_string(),
    }
}

fn qualifier_rank(q: &str) -> u8 {
    match q {
        "alpha" => 0,
        "beta" => 1,
        "milestone" => 2,
        "rc" => 3,
        "snapshot" => 4,
        "" => 5,
        "sp" => 6,
        _ => 7,
    }
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    let (ra, rb) = (qualifier_rank(a), qualifier_rank(b));
    if ra == 7 && rb == 7 {
        a.cmp(b)
    } else {
        ra.cmp(&rb)
    }
}

fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(Item::Number(x)), Some(Item::Number(y))) => x.cmp(y),
        (Some(Item::Number(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::Qualifier(_)), Some(Item::Number(_))) => Ordering::Less,
        (Some(Item::Qualifier(x)), Some(Item::Qualifier(y))) => compare_qualifiers(x, y),
        (Some(Item::Number(n)), None) => n.cmp(&0),
        (Some(Item::Qualifier(q)), None) => compare_qualifiers(q, ""),
        (None, Some(_)) => compare_items(b, a).reverse(),
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        for i in 0..len {
            let ordering = compare_items(self.items.get(i), other.items.get(i));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl Hash for MavenVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.items.hash(state);
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for MavenVersion {
    fn from(raw: &str) -> Self {
        MavenVersion::parse(raw)
    }
}

/// One end of a version interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: MavenVersion,
    pub inclusive: bool,
}

/// A contiguous interval of versions; `None` ends are unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl Interval {
    fn exact(version: MavenVersion) -> Self {
        Interval {
            lower: Some(Bound {
                version: version.clone(),
                inclusive: true,
            }),
            upper: Some(Bound {
                version,
                inclusive: true,
            }),
        }
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        let above_lower = match &self.lower {
            None => true,
            Some(b) if b.inclusive => version >= &b.version,
            Some(b) => version > &b.version,
        };
        let below_upper = match &self.upper {
            None => true,
            Some(b) if b.inclusive => version <= &b.version,
            Some(b) => version < &b.version,
        };
        above_lower && below_upper
    }
}

/// A Maven version range expression.
///
/// Supported forms: `1.0` (exactly 1.0), `[1.0]`, `[1.0,2.0)`, `(,1.0]`,
/// `[1.5,)`, unions such as `(,1.0],[1.2,)`, and `*` or the empty string for
/// any version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    raw: String,
    intervals: Vec<Interval>,
}

impl VersionRange {
    pub fn any() -> Self {
        VersionRange {
            raw: "*".to_string(),
            intervals: vec![Interval {
                lower: None,
                upper: None,
            }],
        }
    }

    pub fn exact(version: &str) -> Self {
        VersionRange {
            raw: version.to_string(),
            intervals: vec![Interval::exact(MavenVersion::parse(version))],
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(VersionRange::any());
        }
        if !trimmed.starts_with('[') && !trimmed.starts_with('(') {
            if trimmed.contains([',', '[', ']', '(', ')']) {
                return Err(invalid(raw, "unbracketed range"));
            }
            return Ok(VersionRange::exact(trimmed));
        }

        let mut intervals = Vec::new();
        let mut rest = trimmed;
        while !rest.is_empty() {
            let open = rest.chars().next().ok_or_else(|| invalid(raw, "empty interval"))?;
            let close_at = rest
                .find([']', ')'])
                .ok_or_else(|| invalid(raw, "missing closing bracket"))?;
            let close = &rest[close_at..close_at + 1];
            let body = &rest[1..close_at];
            intervals.push(parse_interval(raw, open == '[', body, close == "]")?);

            rest = rest[close_at + 1..].trim_start();
            if let Some(stripped) = rest.strip_prefix(',') {
                rest = stripped.trim_start();
                if rest.is_empty() {
                    return Err(invalid(raw, "trailing comma"));
                }
            } else if !rest.is_empty() {
                return Err(invalid(raw, "expected ',' between intervals"));
            }
            if !rest.is_empty() && !rest.starts_with(['[', '(']) {
                return Err(invalid(raw, "interval must start with '[' or '('"));
            }
        }

        Ok(VersionRange {
            raw: trimmed.to_string(),
            intervals,
        })
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        self.intervals.iter().any(|i| i.contains(version))
    }

    pub fn is_any(&self) -> bool {
        self.intervals
            .iter()
            .any(|i| i.lower.is_none() && i.upper.is_none())
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn invalid(range: &str, reason: &str) -> ParseError {
    ParseError::InvalidRange {
        range: range.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_interval(
    raw: &str,
    lower_inclusive: bool,
    body: &str,
    upper_inclusive: bool,
) -> Result<Interval, ParseError> {
    match body.split_once(',') {
        None => {
            let version = body.trim();
            if version.is_empty() || !lower_inclusive || !upper_inclusive {
                return Err(invalid(raw, "single-version interval must be [v]"));
            }
            Ok(Interval::exact(MavenVersion::parse(version)))
        }
        Some((low, high)) => {
            if high.contains(',') {
                return Err(invalid(raw, "too many bounds in interval"));
            }
            let bound = |v: &str, inclusive: bool| {
                let v = v.trim();
                (!v.is_empty()).then(|| Bound {
                    version: MavenVersion::parse(v),
                    inclusive,
                })
            };
            let interval = Interval {
                lower: bound(low, lower_inclusive),
                upper: bound(high, upper_inclusive),
            };
            if let (Some(l), Some(u)) = (&interval.lower, &interval.upper) {
                if l.version > u.version {
                    return Err(invalid(raw, "lower bound above upper bound"));
                }
            }
            Ok(interval)
        }
    }
}

impl FromStr for VersionRange {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionRange::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        VersionRange::parse(&value)
    }
}

impl From<VersionRange> for String {
    fn from(range: VersionRange) -> Self {
        range.raw
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
