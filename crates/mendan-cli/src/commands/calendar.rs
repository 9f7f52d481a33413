//! Calendar command handler

use anyhow::{anyhow, Result};
use chrono::Local;

use mendan_core::{MonthCursor, MonthGrid, RecordStore};

use crate::output::Output;

/// Print one month, defaulting to the current one
pub fn show(
    store: &RecordStore,
    year: Option<i32>,
    month: Option<u32>,
    output: &Output,
) -> Result<()> {
    let today = Local::now().date_naive();
    let cursor = resolve_cursor(MonthCursor::containing(today), year, month)?;

    let grid = MonthGrid::build(cursor, today, store.days());
    output.print_month(&grid);
    Ok(())
}

fn resolve_cursor(current: MonthCursor, year: Option<i32>, month: Option<u32>) -> Result<MonthCursor> {
    let year = year.unwrap_or(current.year());
    let month = month.unwrap_or(current.month());
    MonthCursor::new(year, month).ok_or_else(|| anyhow!("Invalid month: {}-{}", year, month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_resolve_cursor() {
        let current = MonthCursor::new(2025, 6).unwrap();

        assert_eq!(resolve_cursor(current, None, None).unwrap(), current);

        let other = resolve_cursor(current, Some(2024), Some(2)).unwrap();
        assert_eq!((other.year(), other.month()), (2024, 2));

        assert_eq!(resolve_cursor(current, None, Some(11)).unwrap().year(), 2025);
        assert!(resolve_cursor(current, None, Some(13)).is_err());
    }

    #[test]
    fn test_resolve_cursor_rejects_month_past_date_range() {
        let current = MonthCursor::new(2025, 6).unwrap();
        let last_year = chrono::NaiveDate::MAX.year();

        assert!(resolve_cursor(current, Some(last_year), Some(12)).is_err());
        assert!(resolve_cursor(current, Some(last_year), Some(11)).is_ok());
    }
}
