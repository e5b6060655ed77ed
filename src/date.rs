use std::fmt;
use std::str::FromStr;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// A calendar date as written on the LOCUS line (`01-APR-2024`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    year: u16,
    month: u8,
    day: u8,
}

impl Date {
    /// Creates a validated date.
    ///
    /// # Example
    ///
    /// ```
    /// use genbank::Date;
    ///
    /// let date = Date::from_ymd(2024, 4, 1).unwrap();
    /// assert_eq!(date.to_string(), "01-APR-2024");
    /// assert!(Date::from_ymd(2023, 2, 29).is_err());
    /// ```
    pub fn from_ymd(year: u16, month: u8, day: u8) -> Result<Self, DateError> {
        if !(1..=12).contains(&month) {
            return Err(DateError::InvalidMonth(month.to_string()));
        }
        if day == 0 || day > days_in_month(year, month) {
            return Err(DateError::InvalidDay { year, month, day });
        }
        Ok(Self { year, month, day })
    }

    /// Four-digit year.
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Month in `1..=12`.
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Day of the month, starting at 1.
    pub fn day(&self) -> u8 {
        self.day
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn is_leap(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

impl FromStr for Date {
    type Err = DateError;

    /// Parses `DD-MON-YYYY`; the month abbreviation is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('-');
        let (day, month, year) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(day), Some(month), Some(year), None) => (day, month, year),
            _ => return Err(DateError::InvalidFormat(s.to_string())),
        };

        if day.is_empty()
            || day.len() > 2
            || year.len() != 4
            || !day.bytes().all(|b| b.is_ascii_digit())
            || !year.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(DateError::InvalidFormat(s.to_string()));
        }

        let month_idx = MONTHS
            .iter()
            .position(|name| name.eq_ignore_ascii_case(month))
            .ok_or_else(|| DateError::InvalidMonth(month.to_string()))?;

        let day: u8 = day
            .parse()
            .map_err(|_| DateError::InvalidFormat(s.to_string()))?;
        let year: u16 = year
            .parse()
            .map_err(|_| DateError::InvalidFormat(s.to_string()))?;

        Date::from_ymd(year, month_idx as u8 + 1, day)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}-{}-{:04}",
            self.day,
            MONTHS[usize::from(self.month - 1)],
            self.year
        )
    }
}

/// Errors produced when building or parsing a [`Date`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The text is not shaped like `DD-MON-YYYY`.
    InvalidFormat(String),
    /// The month is not a known abbreviation or not in `1..=12`.
    InvalidMonth(String),
    /// The day does not exist in the given month.
    InvalidDay { year: u16, month: u8, day: u8 },
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateError::InvalidFormat(text) => {
                write!(f, "invalid date '{}': expected DD-MON-YYYY", text)
            }
            DateError::InvalidMonth(month) => write!(f, "invalid month '{}'", month),
            DateError::InvalidDay { year, month, day } => {
                write!(f, "day {} does not exist in {:04}-{:02}", day, year, month)
            }
        }
    }
}

impl std::error::Error for DateError {}
