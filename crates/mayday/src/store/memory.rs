//! In-memory contact store.
//!
//! Backs tests and offline dry runs with the same contract as the hosted
//! document store, including the write-time re-count of the contact cap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::contact::{ContactPatch, EmergencyContact, NewContact, MAX_CONTACTS};
use crate::error::{Error, Result};

use super::{require_contact_id, require_user_id, sort_and_cap, ContactStore};

/// A [`ContactStore`] held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryContactStore {
    collections: Mutex<HashMap<String, Vec<EmergencyContact>>>,
    next_id: AtomicU64,
}

impl MemoryContactStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("contact-{n}")
    }

    /// Total number of contacts stored for a user, uncapped.
    #[must_use]
    pub fn count(&self, user_id: &str) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(user_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn list(&self, user_id: &str) -> Result<Vec<EmergencyContact>> {
        require_user_id(user_id)?;
        let collections = self
            .collections
            .lock()
            .map_err(|_| Error::store("list", "store lock poisoned"))?;
        Ok(sort_and_cap(
            collections.get(user_id).cloned().unwrap_or_default(),
        ))
    }

    async fn create(&self, user_id: &str, contact: NewContact) -> Result<EmergencyContact> {
        require_user_id(user_id)?;
        contact.validate()?;

        let mut collections = self
            .collections
            .lock()
            .map_err(|_| Error::store("create", "store lock poisoned"))?;
        let owned = collections.entry(user_id.to_string()).or_default();
        if owned.len() >= MAX_CONTACTS {
            return Err(Error::limit_exceeded());
        }

        let created = EmergencyContact {
            id: Some(self.assign_id()),
            name: contact.name,
            whatsapp_number: contact.whatsapp_number,
            created_at: Some(Utc::now()),
            updated_at: None,
        };
        owned.push(created.clone());
        Ok(created)
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

        let mut collections = self
            .collections
            .lock()
            .map_err(|_| Error::store("update", "store lock poisoned"))?;
        let owned = collections
            .get_mut(user_id)
            .ok_or_else(|| Error::not_found(contact_id))?;
        let contact = owned
            .iter_mut()
            .find(|c| c.id.as_deref() == Some(contact_id))
            .ok_or_else(|| Error::not_found(contact_id))?;

        patch.apply_to(contact);
        contact.updated_at = Some(Utc::now());
        Ok(contact.clone())
    }

    async fn delete(&self, user_id: &str, contact_id: &str) -> Result<()> {
        require_user_id(user_id)?;
        require_contact_id(contact_id)?;

        let mut collections = self
            .collections
            .lock()
            .map_err(|_| Error::store("delete", "store lock poisoned"))?;
        if let Some(owned) = collections.get_mut(user_id) {
            owned.retain(|c| c.id.as_deref() != Some(contact_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> NewContact {
        NewContact::new(name, "+15551234567")
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamp() {
        let store = MemoryContactStore::new();
        let created = store.create("u1", input("Mom")).await.unwrap();

        assert!(created.id.is_some());
        assert!(created.created_at.is_some());
        assert!(created.updated_at.is_none());
        assert_eq!(created.name, "Mom");
    }

    #[tokio::test]
    async fn test_create_rejects_seventh_contact_and_leaves_store_unchanged() {
        let store = MemoryContactStore::new();
        for i in 0..MAX_CONTACTS {
            store.create("u1", input(&format!("c{i}"))).await.unwrap();
        }

        let err = store.create("u1", input("extra")).await.unwrap_err();
        assert!(err.is_limit_exceeded());
        assert_eq!(store.count("u1"), MAX_CONTACTS);
    }

    #[tokio::test]
    async fn test_cap_is_per_user() {
        let store = MemoryContactStore::new();
        for i in 0..MAX_CONTACTS {
            store.create("u1", input(&format!("c{i}"))).await.unwrap();
        }

        assert!(store.create("u2", input("other")).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_sorted_and_capped() {
        let store = MemoryContactStore::new();
        store.create("u1", input("Zoe")).await.unwrap();
        store.create("u1", input("Ana")).await.unwrap();

        let listed = store.list("u1").await.unwrap();
        let names: Vec<_> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Zoe"]);
    }

    #[tokio::test]
    async fn test_list_unknown_user_is_empty() {
        let store = MemoryContactStore::new();
        assert!(store.list("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_user_id_rejected_everywhere() {
        let store = MemoryContactStore::new();
        assert!(store.list("").await.is_err());
        assert!(store.create("", input("Mom")).await.is_err());
        assert!(store.update("", "c1", ContactPatch::name("X")).await.is_err());
        assert!(store.delete("", "c1").await.is_err());
    }

    #[tokio::test]
    async fn test_update_merges_and_preserves_other_fields() {
        let store = MemoryContactStore::new();
        let created = store.create("u1", input("Mom")).await.unwrap();
        let id = created.id.clone().unwrap();

        let updated = store
            .update("u1", &id, ContactPatch::name("X"))
            .await
            .unwrap();

        assert_eq!(updated.name, "X");
        assert_eq!(updated.whatsapp_number, "+15551234567");
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_contact_is_not_found() {
        let store = MemoryContactStore::new();
        store.create("u1", input("Mom")).await.unwrap();

        let err = store
            .update("u1", "ghost", ContactPatch::name("X"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_patch() {
        let store = MemoryContactStore::new();
        let created = store.create("u1", input("Mom")).await.unwrap();
        let id = created.id.unwrap();

        let err = store
            .update("u1", &id, ContactPatch::number("bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_contact() {
        let store = MemoryContactStore::new();
        let created = store.create("u1", input("Mom")).await.unwrap();
        let id = created.id.unwrap();

        store.delete("u1", &id).await.unwrap();
        assert!(store.list("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryContactStore::new();
        assert!(store.delete("u1", "never-existed").await.is_ok());

        let created = store.create("u1", input("Mom")).await.unwrap();
        let id = created.id.unwrap();
        store.delete("u1", &id).await.unwrap();
        assert!(store.delete("u1", &id).await.is_ok());
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = MemoryContactStore::new();
        let created = store.create("u1", input("Mom")).await.unwrap();
        let id = created.id.unwrap();

        assert!(store.list("u2").await.unwrap().is_empty());
        store.delete("u2", &id).await.unwrap();
        assert_eq!(store.list("u1").await.unwrap().len(), 1);
    }
}
