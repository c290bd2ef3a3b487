//! `Elvanto` data types.
//!
//! Reshapes the nested JSON the API returns for services, plans, rosters,
//! songs and people into plain values.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use serde_json::Value;

use crate::constants::services::DATE_FORMAT;
use crate::error::{Error, Result};
use crate::types::{ItemId, PersonId, ServiceId};

/// Text of a field, tolerating numbers and treating null/absent as empty.
pub(crate) fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn non_empty(value: &Value, key: &str) -> Option<String> {
    Some(text(value, key)).filter(|s| !s.is_empty())
}

/// Display name: preferred-or-first name, optional middle name, last name.
pub(crate) fn display_name(person: &Value) -> String {
    let first = non_empty(person, "preferred_name").unwrap_or_else(|| text(person, "firstname"));
    [first, text(person, "middle_name"), text(person, "lastname")]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// First element of `value[outer][inner]`, when that is a non-empty array.
fn first_of<'a>(value: &'a Value, outer: &str, inner: &str) -> Option<&'a Value> {
    value.get(outer)?.get(inner)?.as_array()?.first()
}

/// Array at `value[outer][inner]`, empty when any level is missing.
fn array_at<'a>(value: &'a Value, outer: &str, inner: &str) -> &'a [Value] {
    value
        .get(outer)
        .and_then(|v| v.get(inner))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// An `{id, name}` reference such as a service type or location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRef {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl NamedRef {
    fn from_value(value: &Value) -> Option<Self> {
        let id = non_empty(value, "id")?;
        Some(Self { id, name: text(value, "name") })
    }
}

/// A scheduled service.
#[derive(Debug, Clone)]
pub struct Service {
    /// Service identifier.
    pub id: ServiceId,
    /// Service name.
    pub name: String,
    date_utc: NaiveDateTime,
    /// Service type, when the record carries one.
    pub service_type: Option<NamedRef>,
    /// Location, when the record carries one.
    pub location: Option<NamedRef>,
    /// Running order; `None` when plans were not requested.
    pub plan: Option<Vec<PlanItem>>,
    /// Roster; `None` when volunteers were not requested.
    pub volunteers: Option<Volunteers>,
    /// Songs; `None` when songs were not requested.
    pub songs: Option<Vec<Song>>,
    raw: Value,
}

impl Service {
    /// Reshape a raw `services/getAll` record.
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = non_empty(value, "id")
            .ok_or_else(|| Error::parse("Service record without 'id'", None))?;

        let date_str = text(value, "date");
        let date_utc = NaiveDateTime::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
            Error::parse(format!("Invalid service date '{date_str}': {e}"), format!("service {id}"))
        })?;

        let plan = value.get("plans").map(|_| {
            first_of(value, "plans", "plan")
                .map(|plan| array_at(plan, "items", "item").iter().map(PlanItem::from_value).collect::<Vec<_>>())
                .unwrap_or_default()
        });

        let volunteers = value.get("volunteers").map(|_| Volunteers::from_service(value));

        let songs = value
            .get("songs")
            .map(|_| array_at(value, "songs", "song").iter().map(Song::from_value).collect::<Vec<_>>());

        Ok(Self {
            id: ServiceId(id),
            name: text(value, "name"),
            date_utc,
            service_type: value.get("service_type").and_then(NamedRef::from_value),
            location: value.get("location").and_then(NamedRef::from_value),
            plan,
            volunteers,
            songs,
            raw: value.clone(),
        })
    }

    /// Start time in UTC.
    pub fn date_utc(&self) -> DateTime<Utc> {
        self.date_utc.and_utc()
    }

    /// Start time shifted by the process's current UTC offset.
    ///
    /// The offset is taken now, not at the service date, so services on the
    /// far side of a daylight-saving change are off by the DST delta.
    pub fn date(&self) -> DateTime<FixedOffset> {
        let offset = *Local::now().offset();
        self.date_utc().with_timezone(&offset)
    }

    /// Location name, or empty when the record has none.
    pub fn location_name(&self) -> &str {
        self.location.as_ref().map_or("", |l| l.name.as_str())
    }

    /// The record as the API returned it.
    pub const fn raw(&self) -> &Value {
        &self.raw
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.name, self.date().format("%-I:%M%p %d/%m/%Y"))
    }
}

/// A non-song plan entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Item identifier.
    pub id: ItemId,
    /// Item title.
    pub title: String,
    /// Item description.
    pub description: String,
    /// Duration as the API formats it (e.g. `00:05:00`).
    pub duration: String,
}

/// One entry of a service plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanItem {
    /// Section heading.
    Header {
        /// Item identifier.
        id: ItemId,
        /// Heading text.
        title: String,
    },
    /// Ordinary item (reading, prayer, sermon, ...).
    Item(Item),
    /// Item linked to a song.
    Song {
        /// Item fields.
        item: Item,
        /// Linked song.
        song: Song,
    },
}

impl PlanItem {
    /// Classify and reshape a raw plan item.
    pub fn from_value(value: &Value) -> Self {
        let id = ItemId(text(value, "id"));
        let title = text(value, "title");

        let song = value.get("song").filter(|s| s.is_object());
        let heading = match value.get("heading") {
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            Some(Value::String(s)) => s == "1",
            Some(Value::Bool(b)) => *b,
            _ => false,
        };

        if song.is_none() && heading {
            return Self::Header { id, title };
        }

        let item = Item {
            id,
            title,
            description: text(value, "description"),
            duration: text(value, "duration"),
        };
        match song {
            Some(song) => Self::Song { item, song: Song::from_value(song) },
            None => Self::Item(item),
        }
    }

    /// Item identifier.
    pub const fn id(&self) -> &ItemId {
        match self {
            Self::Header { id, .. } => id,
            Self::Item(item) | Self::Song { item, .. } => &item.id,
        }
    }

    /// Item title.
    pub fn title(&self) -> &str {
        match self {
            Self::Header { title, .. } => title,
            Self::Item(item) | Self::Song { item, .. } => &item.title,
        }
    }
}

impl fmt::Display for PlanItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Header { .. } => "Header",
            Self::Item(_) => "Item",
            Self::Song { .. } => "Song",
        };
        write!(f, "{kind}(\"{}\")", self.title())
    }
}

/// Song metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    /// Song identifier.
    pub id: String,
    /// CCLI song number.
    pub ccli_number: String,
    /// Title.
    pub title: String,
    /// Artist.
    pub artist: String,
    /// Album.
    pub album: String,
    /// Arrangement used, if any.
    pub arrangement: Option<Arrangement>,
}

impl Song {
    fn from_value(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            ccli_number: text(value, "ccli_number"),
            title: text(value, "title"),
            artist: text(value, "artist"),
            album: text(value, "album"),
            arrangement: value
                .get("arrangement")
                .filter(|a| a.is_object())
                .map(Arrangement::from_value),
        }
    }
}

/// Song arrangement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrangement {
    /// Arrangement identifier.
    pub id: String,
    /// Arrangement title.
    pub title: String,
    /// Tempo.
    pub bpm: String,
    /// Length, `mm:ss`.
    pub duration: String,
    /// Section sequence.
    pub sequence: String,
    /// Musical key.
    pub key_name: String,
}

impl Arrangement {
    fn from_value(value: &Value) -> Self {
        Self {
            id: text(value, "id"),
            title: text(value, "title"),
            bpm: text(value, "bpm"),
            duration: text(value, "duration"),
            sequence: text(value, "sequence"),
            key_name: text(value, "key_name"),
        }
    }
}

/// A person assigned to a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volunteer {
    /// Person identifier.
    pub id: PersonId,
    /// Composed display name.
    pub name: String,
    /// Assignment status (e.g. `Confirmed`), when given.
    pub status: Option<String>,
}

impl fmt::Display for Volunteer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A rostered position and the people assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Department identifier.
    pub department_id: String,
    /// Department name.
    pub department_name: String,
    /// Sub-department identifier.
    pub sub_department_id: String,
    /// Sub-department name.
    pub sub_department_name: String,
    /// Position identifier.
    pub position_id: String,
    /// Position name.
    pub position_name: String,
    /// Assigned people.
    pub volunteers: Vec<Volunteer>,
}

impl Position {
    fn from_value(value: &Value) -> Self {
        let volunteers = array_at(value, "volunteers", "volunteer")
            .iter()
            .filter_map(|entry| {
                let person = entry.get("person")?;
                Some(Volunteer {
                    id: PersonId(non_empty(person, "id")?),
                    name: display_name(person),
                    status: non_empty(entry, "status"),
                })
            })
            .collect();

        Self {
            department_id: text(value, "department_id"),
            department_name: text(value, "department_name"),
            sub_department_id: text(value, "sub_department_id"),
            sub_department_name: text(value, "sub_department_name"),
            position_id: text(value, "position_id"),
            position_name: text(value, "position_name"),
            volunteers,
        }
    }
}

/// Volunteer roster of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Volunteers {
    /// Positions in roster order.
    pub positions: Vec<Position>,
}

impl Volunteers {
    fn from_service(service: &Value) -> Self {
        let positions = first_of(service, "volunteers", "plan")
            .map(|plan| array_at(plan, "positions", "position").iter().map(Position::from_value).collect::<Vec<_>>())
            .unwrap_or_default();
        Self { positions }
    }

    fn matching(&self, wanted: &str, field: impl Fn(&Position) -> &str) -> Vec<&Volunteer> {
        let wanted = wanted.to_lowercase();
        self.positions
            .iter()
            .filter(|p| field(p).to_lowercase() == wanted)
            .flat_map(|p| &p.volunteers)
            .collect()
    }

    /// People in positions under a department id.
    pub fn by_department_id(&self, id: &str) -> Vec<&Volunteer> {
        self.matching(id, |p| &p.department_id)
    }

    /// People in positions under a department name.
    pub fn by_department_name(&self, name: &str) -> Vec<&Volunteer> {
        self.matching(name, |p| &p.department_name)
    }

    /// People in positions under a sub-department id.
    pub fn by_sub_department_id(&self, id: &str) -> Vec<&Volunteer> {
        self.matching(id, |p| &p.sub_department_id)
    }

    /// People in positions under a sub-department name.
    pub fn by_sub_department_name(&self, name: &str) -> Vec<&Volunteer> {
        self.matching(name, |p| &p.sub_department_name)
    }

    /// People assigned to a position id.
    pub fn by_position_id(&self, id: &str) -> Vec<&Volunteer> {
        self.matching(id, |p| &p.position_id)
    }

    /// People assigned to a position name.
    pub fn by_position_name(&self, name: &str) -> Vec<&Volunteer> {
        self.matching(name, |p| &p.position_name)
    }

    /// True when no positions are rostered.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// A person from the contact directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Person identifier.
    pub id: PersonId,
    /// Preferred name when set, otherwise first name.
    pub first_name: String,
    /// Middle name.
    pub middle_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
}

impl Contact {
    /// Reshape a raw `people/getAll` record.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            id: PersonId(non_empty(value, "id")?),
            first_name: non_empty(value, "preferred_name").unwrap_or_else(|| text(value, "firstname")),
            middle_name: text(value, "middle_name"),
            last_name: text(value, "lastname"),
            email: text(value, "email"),
        })
    }

    /// Full display name.
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    fn service_json() -> Value {
        json!({
            "id": "svc-1",
            "name": "Sunday Morning",
            "date": "2026-10-25 23:30:00",
            "service_type": {"id": "type-1", "name": "Morning"},
            "location": {"id": "loc-1", "name": "Main Campus"},
            "plans": {"plan": [{"items": {"item": [
                {"id": "i1", "title": "Welcome", "heading": 1, "song": null},
                {"id": "i2", "title": "Reading", "heading": 0, "description": "Psalm 23",
                 "duration": "00:05:00", "song": null},
                {"id": "i3", "title": "10,000 Reasons", "heading": 0, "description": "",
                 "duration": "00:04:00",
                 "song": {"id": "s1", "ccli_number": "6016351", "title": "10,000 Reasons",
                          "artist": "Redman", "album": "",
                          "arrangement": {"id": "a1", "title": "Standard Arrangement",
                                          "bpm": "0", "duration": "00:00", "sequence": "",
                                          "key_id": null, "key_name": "", "key": null}}}
            ]}}]},
            "volunteers": {"plan": [{"positions": {"position": [
                {"department_id": "d1", "department_name": "Music",
                 "sub_department_id": "sd1", "sub_department_name": "Band",
                 "position_id": "p1", "position_name": "Drums",
                 "volunteers": {"volunteer": [
                     {"status": "Confirmed", "person": {"id": "u1", "firstname": "Robert",
                      "preferred_name": "Bob", "middle_name": "", "lastname": "Smith"}}
                 ]}},
                {"department_id": "d1", "department_name": "Music",
                 "sub_department_id": "sd2", "sub_department_name": "Vocals",
                 "position_id": "p2", "position_name": "Lead Vocals",
                 "volunteers": {"volunteer": [
                     {"person": {"id": "u2", "firstname": "Jane", "preferred_name": "",
                      "middle_name": "Anne", "lastname": "Doe"}}
                 ]}},
                {"department_id": "d2", "department_name": "Tech",
                 "sub_department_id": "sd3", "sub_department_name": "Sound",
                 "position_id": "p3", "position_name": "Desk", "volunteers": ""}
            ]}}]}
        })
    }

    #[test]
    fn reshapes_core_fields() {
        let service = Service::from_value(&service_json()).unwrap();
        assert_eq!(service.id.as_str(), "svc-1");
        assert_eq!(service.name, "Sunday Morning");
        assert_eq!(service.location_name(), "Main Campus");
        assert_eq!(service.service_type.as_ref().unwrap().name, "Morning");
        assert_eq!(
            service.date_utc().format("%Y-%m-%d %H:%M:%S").to_string(),
            "2026-10-25 23:30:00"
        );

        let local = service.date();
        let offset = *Local::now().offset();
        assert_eq!(local.offset(), &offset);
        assert_eq!(
            local.naive_local(),
            service.date_utc().naive_utc() + chrono::Duration::seconds(i64::from(offset.local_minus_utc()))
        );
    }

    #[test]
    fn classifies_plan_items() {
        let service = Service::from_value(&service_json()).unwrap();
        let plan = service.plan.unwrap();
        assert_eq!(plan.len(), 3);
        assert!(matches!(&plan[0], PlanItem::Header { title, .. } if title == "Welcome"));
        assert!(matches!(&plan[1], PlanItem::Item(item) if item.duration == "00:05:00"));
        match &plan[2] {
            PlanItem::Song { song, .. } => {
                assert_eq!(song.ccli_number, "6016351");
                assert_eq!(song.arrangement.as_ref().unwrap().title, "Standard Arrangement");
            }
            other => panic!("expected song, got {other:?}"),
        }
        assert_eq!(plan[2].to_string(), "Song(\"10,000 Reasons\")");
    }

    #[test]
    fn missing_sections_are_none() {
        let mut raw = service_json();
        let obj = raw.as_object_mut().unwrap();
        obj.remove("plans");
        obj.remove("volunteers");
        let service = Service::from_value(&raw).unwrap();
        assert!(service.songs.is_none());
        assert!(service.plan.is_none());
        assert!(service.volunteers.is_none());
    }

    #[test]
    fn present_but_empty_sections_are_empty() {
        let mut raw = service_json();
        raw["plans"] = json!([]);
        raw["volunteers"] = json!([]);
        raw["songs"] = json!([]);
        let service = Service::from_value(&raw).unwrap();
        assert_eq!(service.plan, Some(vec![]));
        assert!(service.volunteers.unwrap().is_empty());
        assert_eq!(service.songs, Some(vec![]));
    }

    #[test]
    fn plan_with_empty_item_list() {
        let mut raw = service_json();
        raw["plans"] = json!({"plan": [{"items": {"item": []}}]});
        let service = Service::from_value(&raw).unwrap();
        assert_eq!(service.plan, Some(vec![]));
    }

    #[test]
    fn roster_lookups_are_case_insensitive() {
        let service = Service::from_value(&service_json()).unwrap();
        let roster = service.volunteers.unwrap();

        let music: Vec<_> = roster.by_department_name("music").iter().map(|v| v.name.clone()).collect();
        assert_eq!(music, vec!["Bob Smith", "Jane Anne Doe"]);

        assert_eq!(roster.by_position_name("DRUMS")[0].id.as_str(), "u1");
        assert_eq!(roster.by_sub_department_id("sd2")[0].name, "Jane Anne Doe");
        assert_eq!(roster.by_position_id("p1")[0].status.as_deref(), Some("Confirmed"));
        assert!(roster.by_department_id("d2").is_empty());
        assert!(roster.by_sub_department_name("Lighting").is_empty());
    }

    #[test]
    fn roster_lookups_fold_non_ascii_case() {
        let mut raw = service_json();
        raw["volunteers"]["plan"][0]["positions"]["position"][0]["department_name"] = json!("Música");
        raw["volunteers"]["plan"][0]["positions"]["position"][0]["position_name"] = json!("Batería");
        let roster = Service::from_value(&raw).unwrap().volunteers.unwrap();

        assert_eq!(roster.by_department_name("MÚSICA").len(), 1);
        assert_eq!(roster.by_position_name("BATERÍA")[0].id.as_str(), "u1");
    }

    #[test]
    fn rejects_malformed_date() {
        let mut raw = service_json();
        raw["date"] = json!("25/10/2026");
        assert!(matches!(Service::from_value(&raw), Err(Error::Parse { .. })));
    }

    #[test]
    fn contact_prefers_preferred_name() {
        let contact = Contact::from_value(&json!({
            "id": "u1", "firstname": "Robert", "preferred_name": "Bob",
            "middle_name": null, "lastname": "Smith", "email": "bob@example.com"
        }))
        .unwrap();
        assert_eq!(contact.first_name, "Bob");
        assert_eq!(contact.middle_name, "");
        assert_eq!(contact.display_name(), "Bob Smith");
    }
}
