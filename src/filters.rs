//! Selection helpers over reshaped records.
//!
//! Pure functions: location filtering for services, next-weekday date
//! arithmetic, and contact search.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};

use crate::elvanto::types::{Contact, Service};
use crate::error::{Error, Result};
use crate::types::PersonId;

/// Location criterion for service queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LocationFilter {
    /// Keep every service.
    #[default]
    Any,
    /// Location name, case-insensitive.
    Name(String),
    /// Location id, case-insensitive.
    Id(String),
}

impl LocationFilter {
    /// Apply the criterion.
    pub fn apply(&self, services: Vec<Service>) -> Vec<Service> {
        match self {
            Self::Any => services,
            Self::Name(name) => filter_by_location_name(services, Some(name)),
            Self::Id(id) => filter_by_location_id(services, Some(id)),
        }
    }
}

/// Keep services whose location name equals `name`, ignoring case.
///
/// `None` returns the input unchanged.
pub fn filter_by_location_name(services: Vec<Service>, name: Option<&str>) -> Vec<Service> {
    let Some(name) = name else { return services };
    let wanted = name.to_lowercase();
    services
        .into_iter()
        .filter(|s| s.location.as_ref().is_some_and(|l| l.name.to_lowercase() == wanted))
        .collect()
}

/// Keep services whose location id equals `id`, ignoring case.
///
/// `None` returns the input unchanged.
pub fn filter_by_location_id(services: Vec<Service>, id: Option<&str>) -> Vec<Service> {
    let Some(id) = id else { return services };
    let wanted = id.to_lowercase();
    services
        .into_iter()
        .filter(|s| s.location.as_ref().is_some_and(|l| l.id.to_lowercase() == wanted))
        .collect()
}

/// Nearest date on or after `today` falling on `weekday`.
pub fn next_date(weekday: Weekday, today: NaiveDate) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    today + Duration::days(i64::from(ahead))
}

/// Nearest upcoming date with weekday `day_index` (0 = Monday .. 6 = Sunday).
///
/// Today counts when it already matches.
pub fn next_weekday(day_index: u8) -> Result<NaiveDate> {
    let weekday = weekday_from_index(day_index)?;
    Ok(next_date(weekday, Local::now().date_naive()))
}

/// Map 0 = Monday .. 6 = Sunday onto [`Weekday`].
pub fn weekday_from_index(day_index: u8) -> Result<Weekday> {
    match day_index {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        _ => Err(Error::InvalidArgument(format!(
            "day index {day_index} out of range (0 = Monday .. 6 = Sunday)"
        ))),
    }
}

/// Contact search criteria.
///
/// A non-empty `id` is an exact lookup and ignores the other fields; an empty
/// one counts as unset. Text fields are case-insensitive substring matches,
/// all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactQuery {
    /// Exact person id.
    pub id: Option<PersonId>,
    /// Substring of the first (or preferred) name.
    pub first_name: Option<String>,
    /// Substring of the middle name.
    pub middle_name: Option<String>,
    /// Substring of the last name.
    pub last_name: Option<String>,
    /// Substring of the email address.
    pub email: Option<String>,
}

impl ContactQuery {
    /// Exact id lookup.
    pub fn by_id(id: impl Into<PersonId>) -> Self {
        Self { id: Some(id.into()), ..Self::default() }
    }

    /// Set the first-name criterion.
    #[must_use]
    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    /// Set the middle-name criterion.
    #[must_use]
    pub fn middle_name(mut self, value: impl Into<String>) -> Self {
        self.middle_name = Some(value.into());
        self
    }

    /// Set the last-name criterion.
    #[must_use]
    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    /// Set the email criterion.
    #[must_use]
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }
}

/// Find contacts in `people` matching `query`.
pub fn find_contact<'a>(
    people: &'a BTreeMap<PersonId, Contact>,
    query: &ContactQuery,
) -> Result<Vec<&'a Contact>> {
    if let Some(id) = query.id.as_ref().filter(|id| !id.as_str().is_empty()) {
        return people
            .get(id)
            .map(|c| vec![c])
            .ok_or_else(|| Error::NotFound(format!("contact id {id}")));
    }

    let needles = [
        &query.first_name,
        &query.middle_name,
        &query.last_name,
        &query.email,
    ]
    .map(|needle| needle.as_deref().filter(|n| !n.is_empty()).map(str::to_lowercase));

    if needles.iter().all(Option::is_none) {
        return Err(Error::InvalidArgument(
            "contact search needs an id, name or email".to_string(),
        ));
    }

    Ok(people
        .values()
        .filter(|contact| {
            let fields = [
                &contact.first_name,
                &contact.middle_name,
                &contact.last_name,
                &contact.email,
            ];
            needles.iter().zip(fields).all(|(needle, field)| match needle {
                Some(needle) => field.to_lowercase().contains(needle.as_str()),
                None => true,
            })
        })
        .collect())
}

/// Like [`find_contact`], returning only the ids of the matches.
pub fn find_contact_ids(people: &BTreeMap<PersonId, Contact>, query: &ContactQuery) -> Result<Vec<PersonId>> {
    Ok(find_contact(people, query)?.into_iter().map(|c| c.id.clone()).collect())
}
