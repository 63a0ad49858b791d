use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Simple "YYYY-MM" utility with safe arithmetic and ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: u16,
    pub month: u8, // 1..=12
}

impl YearMonth {
    pub fn new(year: u16, month: u8) -> Self {
        assert!((1..=12).contains(&month), "Month must be 1..=12");
        Self { year, month }
    }

    /// Strict parse: exactly four digits, a dash, and a two-digit month 01..=12.
    pub fn parse_strict(s: &str) -> Option<Self> {
        let caps = year_month_re().captures(s)?;
        let year: u16 = caps[1].parse().ok()?;
        let month: u8 = caps[2].parse().ok()?;
        Some(Self { year, month })
    }

    pub fn first_of_year(year: u16) -> Self {
        Self { year, month: 1 }
    }

    pub fn last_of_year(year: u16) -> Self {
        Self { year, month: 12 }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(s).ok_or_else(|| format!("expected YYYY-MM, got {s:?}"))
    }
}

fn year_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(0[1-9]|1[0-2])$").expect("static regex"))
}

fn partition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})(?:-(\d{2}))?$").expect("static regex"))
}

/// Calendar value of a partition folder name: `YYYY` or `YYYY-MM`.
///
/// Ordering puts a year-only value before every month of the same year, which
/// gives the folder order used when concatenating results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartitionValue {
    Year(u16),
    Month(YearMonth),
}

impl PartitionValue {
    /// Parse a folder name. Returns `None` for names that do not match the
    /// partition pattern or carry an impossible month (e.g. `2023-13`).
    pub fn parse(name: &str) -> Option<Self> {
        let caps = partition_re().captures(name)?;
        let year: u16 = caps[1].parse().ok()?;
        match caps.get(2) {
            None => Some(Self::Year(year)),
            Some(m) => {
                let month: u8 = m.as_str().parse().ok()?;
                if (1..=12).contains(&month) {
                    Some(Self::Month(YearMonth { year, month }))
                } else {
                    None
                }
            }
        }
    }

    pub fn year(&self) -> u16 {
        match self {
            Self::Year(y) => *y,
            Self::Month(ym) => ym.year,
        }
    }

    /// Sort key: (year, month) with 0 standing for "whole year".
    fn key(&self) -> (u16, u8) {
        match self {
            Self::Year(y) => (*y, 0),
            Self::Month(ym) => (ym.year, ym.month),
        }
    }
}

impl Ord for PartitionValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for PartitionValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PartitionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(y) => write!(f, "{y:04}"),
            Self::Month(ym) => ym.fmt(f),
        }
    }
}
