/// Recurrence date arithmetic
///
/// Dates are UTC calendar days. Monthly steps keep the day of month where it
/// exists and otherwise clamp to the last day of the target month, so a task
/// due on January 31st next falls due on February 28th (or 29th).

use chrono::{Days, Months, NaiveDate, Utc};

use crate::models::task::Recurrence;

/// Moves `date` forward by one unit of `cadence`
///
/// ```
/// use chrono::NaiveDate;
/// use taskhub_shared::models::task::Recurrence;
/// use taskhub_shared::recurrence::advance;
///
/// let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
/// assert_eq!(advance(jan31, Recurrence::Monthly), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
/// ```
pub fn advance(date: NaiveDate, cadence: Recurrence) -> NaiveDate {
    let next = match cadence {
        Recurrence::Daily => date.checked_add_days(Days::new(1)),
        Recurrence::Weekly => date.checked_add_days(Days::new(7)),
        Recurrence::Monthly => date.checked_add_months(Months::new(1)),
    };

    // Only fails at the end of chrono's representable range
    next.unwrap_or(NaiveDate::MAX)
}

/// First occurrence of a newly recurring task, one unit after `today`
pub fn first_occurrence(today: NaiveDate, cadence: Recurrence) -> NaiveDate {
    advance(today, cadence)
}

/// Current UTC calendar day
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
