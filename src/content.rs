//! Typed qualifier content: numeric and date comparisons.
//!
//! Comparison syntax: `v`, `>v`, `>=v`, `<v`, `<=v`, and the inclusive range `a..b`.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison<T> {
    Eq(T),
    Gt(T),
    Ge(T),
    Lt(T),
    Le(T),
    Between(T, T),
}

impl<T: PartialOrd> Comparison<T> {
    pub fn holds(&self, value: &T) -> bool {
        match self {
            Comparison::Eq(v) => value == v,
            Comparison::Gt(v) => value > v,
            Comparison::Ge(v) => value >= v,
            Comparison::Lt(v) => value < v,
            Comparison::Le(v) => value <= v,
            Comparison::Between(low, high) => low <= value && value <= high,
        }
    }
}

/// Parses a comparison whose operand(s) are parsed by `operand`.
pub fn parse_comparison<T>(content: &str, operand: impl Fn(&str) -> Option<T>) -> Option<Comparison<T>> {
    let content = content.trim();
    if let Some(rest) = content.strip_prefix(">=") {
        operand(rest).map(Comparison::Ge)
    } else if let Some(rest) = content.strip_prefix("<=") {
        operand(rest).map(Comparison::Le)
    } else if let Some(rest) = content.strip_prefix('>') {
        operand(rest).map(Comparison::Gt)
    } else if let Some(rest) = content.strip_prefix('<') {
        operand(rest).map(Comparison::Lt)
    } else if let Some((low, high)) = content.split_once("..") {
        Some(Comparison::Between(operand(low)?, operand(high)?))
    } else {
        operand(content).map(Comparison::Eq)
    }
}

pub fn parse_integer(content: &str) -> Option<i64> {
    content.trim().parse().ok()
}

pub fn parse_date(content: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(content.trim(), "%Y-%m-%d").ok()
}

/// Content of `created:` and `updated:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCondition {
    /// Compares the calendar date of the timestamp.
    Date(Comparison<NaiveDate>),
    /// Compares the age of the timestamp in whole hours.
    AgeInHours(Comparison<i64>),
}

impl DateCondition {
    pub fn parse(content: &str) -> Option<Self> {
        parse_comparison(content, parse_date)
            .map(DateCondition::Date)
            .or_else(|| parse_comparison(content, parse_integer).map(DateCondition::AgeInHours))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_comparisons() {
        let cases = vec![
            ("5", Some(Comparison::Eq(5))),
            (">5", Some(Comparison::Gt(5))),
            (">=5", Some(Comparison::Ge(5))),
            ("<5", Some(Comparison::Lt(5))),
            ("<=5", Some(Comparison::Le(5))),
            ("2..7", Some(Comparison::Between(2, 7))),
            ("-1", Some(Comparison::Eq(-1))),
            ("buggy", None),
            ("2..", None),
            (">", None),
            ("", None),
        ];

        for (content, expected) in cases {
            assert_eq!(parse_comparison(content, parse_integer), expected, "content: {:?}", content);
        }
    }

    #[test]
    fn test_holds() {
        assert!(Comparison::Between(2, 4).holds(&2));
        assert!(Comparison::Between(2, 4).holds(&4));
        assert!(!Comparison::Between(2, 4).holds(&5));
        assert!(Comparison::Ge(3).holds(&3));
        assert!(!Comparison::Gt(3).holds(&3));
        assert!(Comparison::Lt(3).holds(&-3));
    }

    #[test]
    fn test_date_conditions() {
        let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
        assert_eq!(DateCondition::parse("2024-02-03"), Some(DateCondition::Date(Comparison::Eq(day(2, 3)))));
        assert_eq!(
            DateCondition::parse("2024-01-01..2024-03-01"),
            Some(DateCondition::Date(Comparison::Between(day(1, 1), day(3, 1))))
        );
        assert_eq!(DateCondition::parse("<24"), Some(DateCondition::AgeInHours(Comparison::Lt(24))));
        assert_eq!(DateCondition::parse("2024-13-01"), None);
        assert_eq!(DateCondition::parse("yesterday"), None);
    }
}
