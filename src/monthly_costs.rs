use bigdecimal::BigDecimal;
use jiff::Zoned;
use jiff::civil::Date;
use std::collections::BTreeMap;
use std::fmt;

/// Calendar month key. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i16,
    /// 1 through 12.
    pub month: i8,
}

impl YearMonth {
    pub fn new(year: i16, month: i8) -> Self {
        assert!((1..=12).contains(&month), "Invalid month: {}", month);
        Self { year, month }
    }

    pub fn of(date: &Zoned) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn from_date(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Fuel costs summed per calendar month. Buckets only exist for months that had a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyCosts {
    buckets: BTreeMap<YearMonth, BigDecimal>,
}

impl MonthlyCosts {
    pub fn add(&mut self, month: YearMonth, cost: &BigDecimal) {
        *self.buckets.entry(month).or_default() += cost;
    }

    pub fn get(&self, month: YearMonth) -> BigDecimal {
        self.buckets.get(&month).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, &BigDecimal)> {
        self.buckets.iter().map(|(month, total)| (*month, total))
    }

    pub fn total_for_year(&self, year: i16) -> BigDecimal {
        let mut total = BigDecimal::default();
        for (_, cost) in self
            .buckets
            .range(YearMonth::new(year, 1)..=YearMonth::new(year, 12))
        {
            total += cost;
        }
        total
    }

    /// The `count` calendar months ending with `end`, oldest first. Months without
    /// records report zero.
    pub fn trailing_months(&self, end: YearMonth, count: usize) -> Vec<(YearMonth, BigDecimal)> {
        let mut months = Vec::with_capacity(count);
        let mut month = end;
        for _ in 0..count {
            months.push((month, self.get(month)));
            month = month.previous();
        }
        months.reverse();
        months
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn year_months_order_chronologically() {
        assert!(YearMonth::new(2023, 12) < YearMonth::new(2024, 1));
        assert!(YearMonth::new(2024, 2) > YearMonth::new(2024, 1));
        assert_eq!(YearMonth::new(2024, 1).previous(), YearMonth::new(2023, 12));
        assert_eq!(YearMonth::new(2024, 7).previous(), YearMonth::new(2024, 6));
        assert_eq!(YearMonth::new(2024, 3).to_string(), "2024-03");
    }

    #[test]
    fn buckets_accumulate_lazily() {
        let mut costs = MonthlyCosts::default();
        assert!(costs.is_empty());
        costs.add(YearMonth::new(2024, 5), &dec("10.50"));
        costs.add(YearMonth::new(2024, 5), &dec("4.25"));
        costs.add(YearMonth::new(2024, 6), &dec("1"));
        assert_eq!(costs.len(), 2);
        assert_eq!(costs.get(YearMonth::new(2024, 5)), dec("14.75"));
        assert_eq!(costs.get(YearMonth::new(2024, 4)), dec("0"));
    }

    #[test]
    fn year_total_ignores_other_years() {
        let mut costs = MonthlyCosts::default();
        costs.add(YearMonth::new(2023, 12), &dec("99"));
        costs.add(YearMonth::new(2024, 1), &dec("10"));
        costs.add(YearMonth::new(2024, 12), &dec("20"));
        costs.add(YearMonth::new(2025, 1), &dec("40"));
        assert_eq!(costs.total_for_year(2024), dec("30"));
        assert_eq!(costs.total_for_year(2022), dec("0"));
    }

    #[test]
    fn trailing_months_cross_year_boundary() {
        let mut costs = MonthlyCosts::default();
        costs.add(YearMonth::new(2023, 11), &dec("5"));
        costs.add(YearMonth::new(2024, 2), &dec("7"));
        costs.add(YearMonth::new(2024, 3), &dec("100"));

        let window = costs.trailing_months(YearMonth::new(2024, 2), 4);
        assert_eq!(
            window,
            vec![
                (YearMonth::new(2023, 11), dec("5")),
                (YearMonth::new(2023, 12), dec("0")),
                (YearMonth::new(2024, 1), dec("0")),
                (YearMonth::new(2024, 2), dec("7")),
            ]
        );
        assert!(costs.trailing_months(YearMonth::new(2024, 2), 0).is_empty());
    }
}
