use aerodesk_core::reports::DateRange;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;

/// Optional `?start=&end=` window for report endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RangeQuery {
    /// Both bounds or neither; a half-open window is rejected.
    pub fn into_range(self) -> Result<Option<DateRange>, AppError> {
        match (self.start, self.end) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => Ok(Some(DateRange::new(start, end)?)),
            _ => Err(AppError::ValidationError(
                "start and end must be given together".to_string(),
            )),
        }
    }
}
