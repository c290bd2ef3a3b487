//! Service queries on a connection.

use chrono::{Duration, Local, NaiveDate};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::constants::{paging, services::DEFAULT_FIELDS};
use crate::elvanto::api::Connection;
use crate::elvanto::paging::Listing;
use crate::elvanto::types::Service;
use crate::error::{Error, Result};
use crate::filters::{self, LocationFilter};

/// Options for service queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceQuery {
    /// Location criterion applied after reshaping.
    pub location: LocationFilter,
    /// Extra sections requested with each service.
    pub fields: Vec<String>,
}

impl Default for ServiceQuery {
    fn default() -> Self {
        Self {
            location: LocationFilter::Any,
            fields: DEFAULT_FIELDS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ServiceQuery {
    /// Default fields, filtered to one location.
    pub fn at(location: LocationFilter) -> Self {
        Self { location, ..Self::default() }
    }
}

impl Connection {
    /// Services from yesterday through `days` days ahead.
    pub async fn services_upcoming(&mut self, days: i64, query: &ServiceQuery) -> Result<Vec<Service>> {
        let raw = self.services_upcoming_raw(days, &query.fields).await?;
        Ok(reshape(&raw, &query.location))
    }

    /// Unparsed records for [`Connection::services_upcoming`].
    pub async fn services_upcoming_raw(&mut self, days: i64, fields: &[String]) -> Result<Vec<Value>> {
        let today = Local::now().date_naive();
        self.services_between(
            shift(today, -1)?,
            shift(today, days)?,
            paging::UPCOMING_SERVICES_PAGE_SIZE,
            fields,
        )
        .await
    }

    /// Services within a day either side of `date`.
    pub async fn services_on_date(&mut self, date: NaiveDate, query: &ServiceQuery) -> Result<Vec<Service>> {
        let raw = self.services_on_date_raw(date, &query.fields).await?;
        Ok(reshape(&raw, &query.location))
    }

    /// Unparsed records for [`Connection::services_on_date`].
    pub async fn services_on_date_raw(&mut self, date: NaiveDate, fields: &[String]) -> Result<Vec<Value>> {
        self.services_between(
            shift(date, -1)?,
            shift(date, 1)?,
            paging::DAY_SERVICES_PAGE_SIZE,
            fields,
        )
        .await
    }

    /// Services around the next date falling on `day_index` (0 = Monday .. 6 = Sunday).
    pub async fn services_on_day(&mut self, day_index: u8, query: &ServiceQuery) -> Result<Vec<Service>> {
        let date = filters::next_weekday(day_index)?;
        self.services_on_date(date, query).await
    }

    /// One page of `services/getAll` for a date window.
    ///
    /// A response without a `services` section (any non-ok status) yields no
    /// records.
    async fn services_between(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        page_size: u32,
        fields: &[String],
    ) -> Result<Vec<Value>> {
        let response = self
            .post(
                "services/getAll",
                json!({
                    "page_size": page_size,
                    "start": start.format("%Y-%m-%d").to_string(),
                    "end": end.format("%Y-%m-%d").to_string(),
                    "fields": fields,
                }),
            )
            .await?;

        let records = response
            .get(Listing::SERVICES.collection)
            .and_then(|s| s.get(Listing::SERVICES.record))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        debug!(%start, %end, count = records.len(), "Fetched services");
        Ok(records)
    }
}

/// `date` moved by `days`, or `InvalidArgument` when that leaves chrono's range.
fn shift(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| Error::InvalidArgument(format!("{date} shifted by {days} days is out of range")))
}

/// Malformed records are skipped with a warning; the raw variants still return them.
fn reshape(raw: &[Value], location: &LocationFilter) -> Vec<Service> {
    let services = raw
        .iter()
        .filter_map(|record| match Service::from_value(record) {
            Ok(service) => Some(service),
            Err(e) => {
                warn!(error = %e, "Skipping malformed service record");
                None
            }
        })
        .collect();
    location.apply(services)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_query_requests_all_sections() {
        let query = ServiceQuery::default();
        assert_eq!(query.fields, vec!["plans", "volunteers", "songs"]);
        assert_eq!(query.location, LocationFilter::Any);
    }

    #[test]
    fn reshape_applies_location() {
        let raw = vec![
            json!({"id": "a", "name": "AM", "date": "2026-10-25 09:00:00",
                   "location": {"id": "l1", "name": "Main Campus"}}),
            json!({"id": "b", "name": "PM", "date": "2026-10-25 18:00:00",
                   "location": {"id": "l2", "name": "North"}}),
        ];
        let kept = reshape(&raw, &LocationFilter::Name("MAIN CAMPUS".into()));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "AM");
    }

    #[test]
    fn reshape_skips_malformed_records() {
        let raw = vec![
            json!({"id": "a", "name": "AM", "date": "2026-10-25 09:00:00"}),
            json!({"id": "b", "name": "Broken", "date": "25/10/2026"}),
            json!({"name": "No id", "date": "2026-10-25 18:00:00"}),
        ];
        let kept = reshape(&raw, &LocationFilter::Any);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id.as_str(), "a");
    }

    #[test]
    fn shift_rejects_out_of_range_days() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(shift(date, -1).unwrap(), NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert!(matches!(shift(date, i64::MAX / 1000), Err(Error::InvalidArgument(_))));
        assert!(matches!(shift(date, i64::MAX), Err(Error::InvalidArgument(_))));
        assert!(matches!(shift(NaiveDate::MAX, 1), Err(Error::InvalidArgument(_))));
    }
}
