use chrono::{DateTime, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar date used for deadline comparisons.
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Whether ranking is still locked by the offer's deadline.
pub fn is_before_deadline(deadline: Option<NaiveDate>, today: NaiveDate) -> bool {
    deadline.map_or(false, |deadline| today < deadline)
}
