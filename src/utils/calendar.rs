use chrono::{Datelike, NaiveDate};
use derive_more::Display;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "invalid month {:?}, expected YYYY-MM", _0)]
pub struct MonthParseError(pub String);

impl std::error::Error for MonthParseError {}

/// A calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, MonthParseError> {
        let err = || MonthParseError(input.to_string());
        let (year, month) = input.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;

        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self::containing)
            .ok_or_else(err)
    }

    pub fn first_day(self) -> NaiveDate {
        // year/month were validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(self) -> NaiveDate {
        self.days().last().unwrap_or_else(|| self.first_day())
    }

    /// Every date of the month in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let month = self.month;
        self.first_day()
            .iter_days()
            .take_while(move |d| d.month() == month)
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2026-10", 31)]
    #[case("2026-02", 28)]
    #[case("2028-02", 29)]
    #[case("2026-04", 30)]
    fn yields_every_day_of_the_month(#[case] input: &str, #[case] len: usize) {
        let month = Month::parse(input).unwrap();
        let days: Vec<NaiveDate> = month.days().collect();
        assert_eq!(days.len(), len);
        assert_eq!(days[0], month.first_day());
        assert_eq!(*days.last().unwrap(), month.last_day());
    }

    #[test]
    fn december_does_not_spill_into_january() {
        let month = Month::parse("2026-12").unwrap();
        assert_eq!(month.last_day(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[rstest]
    #[case("2026")]
    #[case("2026-13")]
    #[case("2026-00")]
    #[case("abcd-01")]
    #[case("")]
    fn rejects_bad_months(#[case] input: &str) {
        assert_eq!(Month::parse(input), Err(MonthParseError(input.to_string())));
    }

    #[test]
    fn displays_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(Month::containing(date).to_string(), "2026-03");
    }
}
