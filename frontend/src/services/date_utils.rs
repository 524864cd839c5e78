use chrono::{Datelike, Local, NaiveDate};
use shared::YearMonth;

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January", 2 => "February", 3 => "March", 4 => "April",
        5 => "May", 6 => "June", 7 => "July", 8 => "August",
        9 => "September", 10 => "October", 11 => "November", 12 => "December",
        _ => "January",
    }
}

/// Format a date for display (e.g., "January 15, 2025")
pub fn format_display_date(date: NaiveDate) -> String {
    format!("{} {}, {}", month_name(date.month()), date.day(), date.year())
}

/// Format a billing period for display (e.g., "March 2025")
pub fn format_billing_period(period: YearMonth) -> String {
    format!("{} {}", month_name(period.month), period.year)
}
