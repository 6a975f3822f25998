//! Defines the controller behind every list screen: transactions,
//! categories, budgets, and goals all follow the same
//! load → submit → reload shape.
//!
//! Writes never patch the local list. A successful create or delete
//! re-fetches the whole list so ordering and identity always reflect what
//! the backend stored (reload-after-mutation). Failures surface the
//! backend's message verbatim when it sent one, else a generic per-action
//! fallback.

use crate::api::ResourceClient;

/// The client-side copy of one entity list plus the last error to display.
#[derive(Debug)]
pub struct ListPane<T, C: ResourceClient<T>> {
    client: C,
    items: Vec<T>,
    last_error: Option<String>,
}

impl<T, C: ResourceClient<T>> ListPane<T, C> {
    /// Create an empty pane. Call [ListPane::load] to populate it.
    pub fn new(client: C) -> Self {
        Self {
            client,
            items: Vec::new(),
            last_error: None,
        }
    }

    /// Replace the local list with the backend's.
    ///
    /// On failure the local list becomes empty rather than keeping stale
    /// entries, and the failure is surfaced like any other.
    pub async fn load(&mut self) {
        match self.client.list().await {
            Ok(items) => {
                self.items = items;
                self.last_error = None;
            }
            Err(error) => {
                tracing::warn!("could not load {}: {error}", C::NOUN_PLURAL);
                self.items = Vec::new();
                self.last_error =
                    Some(error.surface_message(&format!("Failed to load {}.", C::NOUN_PLURAL)));
            }
        }
    }

    /// Submit a new entity, then reload the list on success.
    ///
    /// On failure the list is left as it was.
    pub async fn create(&mut self, draft: &C::Draft) {
        match self.client.create(draft).await {
            Ok(_) => self.load().await,
            Err(error) => {
                self.last_error =
                    Some(error.surface_message(&format!("Failed to create {}.", C::NOUN)));
            }
        }
    }

    /// Delete an entity by ID, then reload the list on success.
    ///
    /// On failure the stale entry stays visible, which is accurate: nothing
    /// was removed optimistically.
    pub async fn remove(&mut self, id: C::Id) {
        match self.client.remove(id).await {
            Ok(()) => self.load().await,
            Err(error) => {
                self.last_error =
                    Some(error.surface_message(&format!("Failed to delete {}.", C::NOUN)));
            }
        }
    }

    /// The current local copy of the list.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The message to display for the most recent failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
