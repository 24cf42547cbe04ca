use std::collections::HashMap;

use crate::model::{EntityId, Resource};

/// The held collection of one entity type, with the status of the last
/// command that touched it.
#[derive(Clone, Debug)]
pub struct EntitySlice<R> {
    items: Vec<R>,
    versions: HashMap<EntityId, String>,
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
}

impl<R> Default for EntitySlice<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            versions: HashMap::new(),
            loading: false,
            error: None,
            success: false,
        }
    }
}

impl<R: Resource> EntitySlice<R> {
    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn get(&self, id: &EntityId) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut R> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn version(&self, id: &EntityId) -> Option<&str> {
        self.versions.get(id).map(String::as_str)
    }

    pub fn pending(&mut self) {
        self.loading = true;
        self.error = None;
        self.success = false;
    }

    pub fn fulfilled(&mut self) {
        self.loading = false;
        self.error = None;
        self.success = true;
    }

    pub fn rejected<M: Into<String>>(&mut self, message: M) {
        self.loading = false;
        self.error = Some(message.into());
        self.success = false;
    }

    /// Back to idle without recording an outcome.
    pub fn settled(&mut self) {
        self.loading = false;
    }

    pub fn clear_status(&mut self) {
        self.error = None;
        self.success = false;
    }

    /// Replaces the collection. Version tags of entities that are gone are
    /// dropped.
    pub fn replace(&mut self, items: Vec<R>) {
        self.versions
            .retain(|id, _| items.iter().any(|item| item.id() == id));
        self.items = items;
    }

    /// Replaces the entity with the same id in place, or appends it.
    pub fn upsert(&mut self, item: R) {
        match self.items.iter().position(|held| held.id() == item.id()) {
            Some(index) => self.items[index] = item,
            None => self.items.push(item),
        }
    }

    pub fn remember_version(&mut self, id: EntityId, version: Option<String>) {
        match version {
            Some(version) => {
                self.versions.insert(id, version);
            }
            None => {
                self.versions.remove(&id);
            }
        }
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<R> {
        self.versions.remove(id);
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }
}
