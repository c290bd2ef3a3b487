//! Contact directory on a connection.

use std::collections::BTreeMap;

use serde_json::Map;
use tracing::{debug, warn};

use crate::constants::paging::PEOPLE_PAGE_SIZE;
use crate::elvanto::api::Connection;
use crate::elvanto::paging::{self, EndpointPages, Listing};
use crate::elvanto::types::Contact;
use crate::error::Result;
use crate::filters::{self, ContactQuery};
use crate::types::PersonId;

impl Connection {
    /// Pull the whole people directory, replacing the cached copy.
    pub async fn get_people(&mut self) -> Result<&BTreeMap<PersonId, Contact>> {
        let records = {
            let mut pages = EndpointPages::new(self, "people/getAll", Map::new());
            paging::fetch_all(&mut pages, PEOPLE_PAGE_SIZE, Listing::PEOPLE).await?
        };

        let people: BTreeMap<_, _> = records
            .values()
            .filter_map(|record| {
                let contact = Contact::from_value(record);
                if contact.is_none() {
                    warn!("Skipping person record without id");
                }
                contact
            })
            .map(|c| (c.id.clone(), c))
            .collect();

        debug!(count = people.len(), "Loaded people directory");
        self.people = people;
        Ok(&self.people)
    }

    /// Directory from the last [`Connection::get_people`] call.
    pub const fn people(&self) -> &BTreeMap<PersonId, Contact> {
        &self.people
    }

    /// Search the cached directory.
    pub fn find_contact(&self, query: &ContactQuery) -> Result<Vec<&Contact>> {
        filters::find_contact(&self.people, query)
    }

    /// Search the cached directory for ids only.
    pub fn find_contact_ids(&self, query: &ContactQuery) -> Result<Vec<PersonId>> {
        filters::find_contact_ids(&self.people, query)
    }
}
