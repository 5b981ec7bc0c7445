//! Hosted document-store contact gateway.
//!
//! Contacts live in a per-user collection at `users/{uid}/contacts`; the
//! store assigns document ids and manages the `createdAt`/`updatedAt`
//! timestamps. Access scoping is enforced by the store's own rules; this
//! gateway only ever constructs correctly-scoped paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use mayday::config::StoreConfig;
use mayday::contact::{ContactPatch, EmergencyContact, NewContact, MAX_CONTACTS};
use mayday::store::{require_contact_id, require_user_id, sort_and_cap, ContactStore};
use mayday::{Error, Result};

use crate::join_url;

/// [`ContactStore`] backed by the hosted document store.
#[derive(Debug, Clone)]
pub struct HostedContactStore {
    client: reqwest::Client,
    base_url: String,
}

/// One contact document as the store returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactDocument {
    id: String,
    name: String,
    whatsapp_number: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<ContactDocument> for EmergencyContact {
    fn from(doc: ContactDocument) -> Self {
        Self {
            id: Some(doc.id),
            name: doc.name,
            whatsapp_number: doc.whatsapp_number,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// A collection listing on the wire.
#[derive(Debug, Default, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<ContactDocument>,
}

fn transport_error(operation: &'static str, err: &reqwest::Error) -> Error {
    Error::store(operation, format!("store unreachable: {err}"))
}

fn status_error(operation: &'static str, status: StatusCode, body: &str) -> Error {
    Error::store(operation, format!("{status}: {body}"))
}

impl HostedContactStore {
    /// Create a gateway over the configured store deployment.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    fn collection_url(&self, user_id: &str) -> String {
        join_url(&self.base_url, &format!("users/{user_id}/contacts"))
    }

    fn document_url(&self, user_id: &str, contact_id: &str) -> String {
        join_url(
            &self.base_url,
            &format!("users/{user_id}/contacts/{contact_id}"),
        )
    }

    /// Fetch the whole collection, uncapped. Used for the write-time
    /// re-count as well as listing.
    async fn fetch_all(
        &self,
        operation: &'static str,
        user_id: &str,
    ) -> Result<Vec<EmergencyContact>> {
        let response = self
            .client
            .get(self.collection_url(user_id))
            .send()
            .await
            .map_err(|err| transport_error(operation, &err))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // An empty collection, not an error.
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(operation, status, &body));
        }

        let listing: DocumentList = response
            .json()
            .await
            .map_err(|err| Error::store(operation, format!("malformed listing: {err}")))?;
        Ok(listing.documents.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ContactStore for HostedContactStore {
    async fn list(&self, user_id: &str) -> Result<Vec<EmergencyContact>> {
        require_user_id(user_id)?;
        Ok(sort_and_cap(self.fetch_all("list", user_id).await?))
    }

    async fn create(&self, user_id: &str, contact: NewContact) -> Result<EmergencyContact> {
        require_user_id(user_id)?;
        contact.validate()?;

        // Re-count from the store at write time; a client-side cached
        // count can be stale across tabs and devices.
        let owned = self.fetch_all("create", user_id).await?;
        if owned.len() >= MAX_CONTACTS {
            return Err(Error::limit_exceeded());
        }

        let response = self
            .client
            .post(self.collection_url(user_id))
            .json(&contact)
            .send()
            .await
            .map_err(|err| transport_error("create", &err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("create", status, &body));
        }

        let doc: ContactDocument = response
            .json()
            .await
            .map_err(|err| Error::store("create", format!("malformed document: {err}")))?;
        debug!(contact_id = %doc.id, "contact created");
        Ok(doc.into())
    }

    async fn update(
        &self,
        user_id: &str,
        contact_id: &str,
        patch: ContactPatch,
    ) -> Result<EmergencyContact> {
        require_user_id(user_id)?;
        require_contact_id(contact_id)?;
        patch.validate()?;

        let response = self
            .client
            .patch(self.document_url(user_id, contact_id))
            .json(&patch)
            .send()
            .await
            .map_err(|err| transport_error("update", &err))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::not_found(contact_id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("update", status, &body));
        }

        let doc: ContactDocument = response
            .json()
            .await
            .map_err(|err| Error::store("update", format!("malformed document: {err}")))?;
        Ok(doc.into())
    }

    async fn delete(&self, user_id: &str, contact_id: &str) -> Result<()> {
        require_user_id(user_id)?;
        require_contact_id(contact_id)?;

        let response = self
            .client
            .delete(self.document_url(user_id, contact_id))
            .send()
            .await
            .map_err(|err| transport_error("delete", &err))?;

        let status = response.status();
        // Deleting an already-absent document is a success.
        if status == StatusCode::NOT_FOUND || status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error("delete", status, &body))
    }
}
