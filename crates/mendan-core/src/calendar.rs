//! Month grid
//!
//! Builds the 6x7 Sunday-first grid shown by the calendar view. The grid
//! always has 42 cells: trailing days of the previous month, every day of
//! the displayed month, then leading days of the next month. Cursors only
//! point at months whose whole grid lies inside the representable date range.

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::models::{date_key, DayRecord};

/// Cells in a month grid
pub const GRID_CELLS: usize = 42;

/// Weekday column headers, Sunday first
pub const WEEKDAY_HEADERS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// Years offered on either side of the displayed year
const YEAR_SPAN: i32 = 10;

/// Number of days in a month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

/// First cell of the grid for a month starting on `first`
fn grid_start(first: NaiveDate) -> Option<NaiveDate> {
    let lead = i64::from(first.weekday().num_days_from_sunday());
    first.checked_sub_signed(Duration::days(lead))
}

fn grid_fits(first: NaiveDate) -> bool {
    grid_start(first)
        .and_then(|start| start.checked_add_signed(Duration::days(GRID_CELLS as i64 - 1)))
        .is_some()
}

/// The month currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    first: NaiveDate,
}

impl MonthCursor {
    /// Cursor for the month containing `date`
    ///
    /// At the very ends of the date range this is the nearest month whose
    /// grid fits.
    pub fn containing(date: NaiveDate) -> Self {
        let mut first = date.with_day(1).unwrap_or(date);
        while !grid_fits(first) {
            let inward = if first.year() < 0 {
                first.checked_add_months(Months::new(1))
            } else {
                first.checked_sub_months(Months::new(1))
            };
            match inward {
                Some(month) => first = month,
                None => break,
            }
        }
        Self { first }
    }

    /// Cursor for a year and month (1-12), `None` if out of range
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .filter(|first| grid_fits(*first))
            .map(|first| Self { first })
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn prev(self) -> Self {
        self.first
            .checked_sub_months(Months::new(1))
            .filter(|first| grid_fits(*first))
            .map(|first| Self { first })
            .unwrap_or(self)
    }

    pub fn next(self) -> Self {
        self.first
            .checked_add_months(Months::new(1))
            .filter(|first| grid_fits(*first))
            .map(|first| Self { first })
            .unwrap_or(self)
    }

    /// Same month in another year
    pub fn with_year(self, year: i32) -> Self {
        Self::new(year, self.month()).unwrap_or(self)
    }

    /// Another month of the same year; out-of-range months are ignored
    pub fn with_month(self, month: u32) -> Self {
        Self::new(self.year(), month).unwrap_or(self)
    }

    /// Selectable years: the displayed year plus or minus ten
    pub fn year_options(&self) -> Vec<i32> {
        let year = self.year();
        ((year - YEAR_SPAN)..=(year + YEAR_SPAN)).collect()
    }

    /// Header label, e.g. `2025年6月`
    pub fn label(&self) -> String {
        format!("{}年{}月", self.year(), self.month())
    }

    /// Whether `date` falls inside this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }
}

/// One cell of the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// Date key (`yyyy-MM-dd`)
    pub key: String,
    pub day: u32,
    pub in_current_month: bool,
    pub is_today: bool,
    /// Names of the day's entries; only for current-month days with entries
    pub summary: Option<String>,
    pub entry_count: usize,
}

/// A full 42-cell month grid
#[derive(Debug, Clone)]
pub struct MonthGrid {
    pub cursor: MonthCursor,
    pub cells: Vec<CalendarCell>,
}

impl MonthGrid {
    pub fn build(cursor: MonthCursor, today: NaiveDate, days: &[DayRecord]) -> Self {
        let first = cursor.first_day();
        let start = grid_start(first).unwrap_or(first);

        let today_key = date_key(today);

        let cells = start
            .iter_days()
            .take(GRID_CELLS)
            .map(|date| {
                let key = date_key(date);
                let in_current_month = cursor.contains(date);

                let record = in_current_month
                    .then(|| days.iter().find(|d| d.date == key))
                    .flatten()
                    .filter(|d| !d.records.is_empty());

                CalendarCell {
                    date,
                    day: date.day(),
                    in_current_month,
                    is_today: in_current_month && key == today_key,
                    summary: record.map(DayRecord::summary),
                    entry_count: record.map_or(0, |d| d.records.len()),
                    key,
                }
            })
            .collect();

        Self { cursor, cells }
    }

    /// Rows of seven cells
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(7)
    }

    /// Grid position of a date, if shown
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.cells.iter().position(|c| c.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Entry, EntryOptions};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn test_cursor_navigation() {
        let cursor = MonthCursor::new(2025, 1).unwrap();

        let prev = cursor.prev();
        assert_eq!((prev.year(), prev.month()), (2024, 12));

        let next = prev.next().next();
        assert_eq!((next.year(), next.month()), (2025, 2));

        assert_eq!(cursor.with_year(2030).year(), 2030);
        assert_eq!(cursor.with_month(7).month(), 7);
        assert_eq!(cursor.with_month(13), cursor);
    }

    #[test]
    fn test_cursor_containing() {
        let cursor = MonthCursor::containing(ymd(2025, 6, 18));
        assert_eq!(cursor.first_day(), ymd(2025, 6, 1));
        assert_eq!(cursor.label(), "2025年6月");
    }

    #[test]
    fn test_cursor_at_latest_date() {
        let cursor = MonthCursor::containing(NaiveDate::MAX);
        assert_eq!((cursor.year(), cursor.month()), (NaiveDate::MAX.year(), 11));
        assert_eq!(cursor.next(), cursor);
        assert!(MonthCursor::new(NaiveDate::MAX.year(), 12).is_none());
        assert_eq!(cursor.with_month(12), cursor);

        let grid = MonthGrid::build(cursor, NaiveDate::MAX, &[]);
        assert_eq!(grid.cells.len(), GRID_CELLS);
    }

    #[test]
    fn test_cursor_at_earliest_date() {
        let cursor = MonthCursor::containing(NaiveDate::MIN);
        assert_eq!(cursor.year(), NaiveDate::MIN.year());
        assert_eq!(cursor.prev(), cursor);

        let grid = MonthGrid::build(cursor, NaiveDate::MIN, &[]);
        assert_eq!(grid.cells.len(), GRID_CELLS);
        assert!(grid.cells.iter().any(|c| c.in_current_month));
    }

    #[test]
    fn test_year_options() {
        let years = MonthCursor::new(2025, 6).unwrap().year_options();
        assert_eq!(years.len(), 21);
        assert_eq!(years[0], 2015);
        assert_eq!(years[20], 2035);
    }

    #[test]
    fn test_grid_shape_for_every_month() {
        for year in [2023, 2024, 2025] {
            for month in 1..=12 {
                let cursor = MonthCursor::new(year, month).unwrap();
                let grid = MonthGrid::build(cursor, ymd(2025, 6, 15), &[]);

                assert_eq!(grid.cells.len(), GRID_CELLS);

                let current: Vec<u32> = grid
                    .cells
                    .iter()
                    .filter(|c| c.in_current_month)
                    .map(|c| c.day)
                    .collect();
                let expected: Vec<u32> = (1..=days_in_month(year, month)).collect();
                assert_eq!(current, expected, "{}-{}", year, month);

                let lead = cursor.first_day().weekday().num_days_from_sunday() as usize;
                assert!(grid.cells[..lead].iter().all(|c| !c.in_current_month));
                assert!(grid.cells[lead].in_current_month);
                assert_eq!(grid.cells[lead].day, 1);
            }
        }
    }

    #[test]
    fn test_grid_june_2025() {
        // 2025-06-01 is a Sunday: no leading cells
        let grid = MonthGrid::build(MonthCursor::new(2025, 6).unwrap(), ymd(2025, 6, 15), &[]);
        assert_eq!(grid.cells[0].date, ymd(2025, 6, 1));
        assert_eq!(grid.cells[30].date, ymd(2025, 7, 1));
        assert!(!grid.cells[41].in_current_month);
        assert_eq!(grid.weeks().count(), 6);
    }

    #[test]
    fn test_grid_leading_days_from_previous_month() {
        // 2025-01-01 is a Wednesday
        let grid = MonthGrid::build(MonthCursor::new(2025, 1).unwrap(), ymd(2025, 1, 1), &[]);
        let leading: Vec<NaiveDate> = grid.cells[..3].iter().map(|c| c.date).collect();
        assert_eq!(leading, vec![ymd(2024, 12, 29), ymd(2024, 12, 30), ymd(2024, 12, 31)]);
    }

    #[test]
    fn test_today_marked_only_in_current_month() {
        let today = ymd(2025, 6, 1);

        let june = MonthGrid::build(MonthCursor::new(2025, 6).unwrap(), today, &[]);
        let marked: Vec<_> = june.cells.iter().filter(|c| c.is_today).collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].date, today);

        // June 1st appears as a trailing cell of May's grid
        let may = MonthGrid::build(MonthCursor::new(2025, 5).unwrap(), today, &[]);
        assert!(may.index_of(today).is_some());
        assert!(may.cells.iter().all(|c| !c.is_today));
    }

    #[test]
    fn test_summary_only_for_current_month_days() {
        let options = EntryOptions::default();
        let days = vec![
            DayRecord::new(
                "2025-06-15",
                vec![
                    Entry::with_fields(&options, "Alice", "a"),
                    Entry::with_fields(&options, "Bob", "b"),
                ],
            ),
            DayRecord::new("2025-07-01", vec![Entry::with_fields(&options, "Carol", "c")]),
            DayRecord::new("2025-06-20", Vec::new()),
        ];

        let grid = MonthGrid::build(MonthCursor::new(2025, 6).unwrap(), ymd(2025, 6, 1), &days);

        let cell = &grid.cells[grid.index_of(ymd(2025, 6, 15)).unwrap()];
        assert_eq!(cell.summary.as_deref(), Some("Alice, Bob"));
        assert_eq!(cell.entry_count, 2);

        let next_month = &grid.cells[grid.index_of(ymd(2025, 7, 1)).unwrap()];
        assert!(next_month.summary.is_none());

        let empty = &grid.cells[grid.index_of(ymd(2025, 6, 20)).unwrap()];
        assert!(empty.summary.is_none());
        assert_eq!(empty.entry_count, 0);
    }
}
