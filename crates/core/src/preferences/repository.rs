//! User preferences repository
//!
//! Translates between the flat preference store and [`UserPreferences`].

use std::sync::Arc;

use futures::stream::{self, BoxStream};
use futures::StreamExt;
use tracing::{debug, warn};

use super::model::{SortFlags, SortOrder, UserPreferences};
use crate::store::{PreferenceKey, PreferenceStore, Preferences};
use crate::Result;

/// Stored key of the "show completed tasks" switch
pub const SHOW_COMPLETED: PreferenceKey<bool> = PreferenceKey::new("show_completed");
/// Stored key of the sort order name
pub const SORT_ORDER: PreferenceKey<String> = PreferenceKey::new("sort_order");

/// Reads and updates the task list preferences
#[derive(Clone)]
pub struct UserPreferencesRepository {
    store: Arc<dyn PreferenceStore>,
}

impl UserPreferencesRepository {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Subscribe to preference changes.
    ///
    /// Yields one snapshot per store emission. A transient I/O failure is
    /// replaced by the default preferences and the stream carries on; any
    /// other error is yielded once and ends the stream.
    pub fn observe(&self) -> BoxStream<'static, Result<UserPreferences>> {
        // The state becomes `None` once an error has been yielded, so the
        // upstream subscription is dropped instead of polled again.
        stream::unfold(Some(self.store.data()), |upstream| async move {
            let Some(mut upstream) = upstream else {
                return None;
            };
            let Some(item) = upstream.next().await else {
                return None;
            };
            let decoded = match item {
                Ok(prefs) => decode(&prefs),
                Err(e) if e.is_transient() => {
                    warn!("Error reading preferences, using defaults: {}", e);
                    Ok(UserPreferences::default())
                }
                Err(e) => Err(e),
            };
            let upstream = decoded.is_ok().then_some(upstream);
            Some((decoded, upstream))
        })
        .boxed()
    }

    /// Read the current preferences once
    pub async fn fetch_initial(&self) -> Result<UserPreferences> {
        let prefs = self.store.read().await?;
        decode(&prefs)
    }

    pub async fn update_show_completed(&self, show_completed: bool) -> Result<()> {
        self.store
            .update(Box::new(move |prefs: &mut Preferences| {
                prefs.set(&SHOW_COMPLETED, show_completed);
                Ok(())
            }))
            .await?;
        debug!("Updated show_completed to {}", show_completed);
        Ok(())
    }

    /// Turn sorting by deadline on or off, keeping the priority criterion
    pub async fn set_sort_by_deadline(&self, enable: bool) -> Result<()> {
        let order = self
            .update_sort_flags(move |flags| flags.by_deadline = enable)
            .await?;
        debug!("Sort by deadline {}: sort order is now {}", enable, order);
        Ok(())
    }

    /// Turn sorting by priority on or off, keeping the deadline criterion
    pub async fn set_sort_by_priority(&self, enable: bool) -> Result<()> {
        let order = self
            .update_sort_flags(move |flags| flags.by_priority = enable)
            .await?;
        debug!("Sort by priority {}: sort order is now {}", enable, order);
        Ok(())
    }

    /// Read-modify-write of the stored sort order inside one transaction
    async fn update_sort_flags(
        &self,
        apply: impl FnOnce(&mut SortFlags) + Send + 'static,
    ) -> Result<SortOrder> {
        let committed = self
            .store
            .update(Box::new(move |prefs: &mut Preferences| {
                let mut flags = SortFlags::from(decode_sort_order(prefs)?);
                apply(&mut flags);
                prefs.set(&SORT_ORDER, SortOrder::from(flags).name().to_string());
                Ok(())
            }))
            .await?;
        decode_sort_order(&committed)
    }
}

fn decode_sort_order(prefs: &Preferences) -> Result<SortOrder> {
    match prefs.get(&SORT_ORDER) {
        Some(name) => name.parse(),
        None => Ok(SortOrder::default()),
    }
}

fn decode(prefs: &Preferences) -> Result<UserPreferences> {
    Ok(UserPreferences {
        show_completed: prefs.get(&SHOW_COMPLETED).unwrap_or(false),
        sort_order: decode_sort_order(prefs)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryPreferenceStore, Mutator};
    use crate::Error;
    use async_trait::async_trait;
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;

    fn create_repository() -> (UserPreferencesRepository, Arc<InMemoryPreferenceStore>) {
        let store = Arc::new(InMemoryPreferenceStore::new());
        let repository = UserPreferencesRepository::new(store.clone());
        (repository, store)
    }

    fn stored_order(order: &str) -> Preferences {
        let mut prefs = Preferences::new();
        prefs.set(&SORT_ORDER, order.to_string());
        prefs
    }

    /// Store whose stream replays a fixed script of emissions
    struct ScriptedStore {
        script: Mutex<Vec<Result<Preferences>>>,
    }

    impl ScriptedStore {
        fn new(script: Vec<Result<Preferences>>) -> Self {
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl PreferenceStore for ScriptedStore {
        fn data(&self) -> BoxStream<'static, Result<Preferences>> {
            let script = std::mem::take(&mut *self.script.lock().unwrap());
            futures::stream::iter(script).boxed()
        }

        async fn update(&self, _mutator: Mutator) -> Result<Preferences> {
            Err(Error::Storage("read-only".to_string()))
        }
    }

    #[tokio::test]
    async fn test_empty_store_yields_defaults() {
        let (repository, _store) = create_repository();

        let prefs = repository.fetch_initial().await.unwrap();
        assert_eq!(prefs, UserPreferences::new(false, SortOrder::None));
    }

    #[tokio::test]
    async fn test_update_show_completed() {
        let (repository, store) = create_repository();

        for value in [true, false, true] {
            repository.update_show_completed(value).await.unwrap();
            assert_eq!(repository.fetch_initial().await.unwrap().show_completed, value);
        }
        assert_eq!(store.snapshot().get(&SHOW_COMPLETED), Some(true));
    }

    #[tokio::test]
    async fn test_deadline_transition_table() {
        let cases = [
            (SortOrder::None, true, SortOrder::ByDeadline),
            (SortOrder::None, false, SortOrder::None),
            (SortOrder::ByDeadline, true, SortOrder::ByDeadline),
            (SortOrder::ByDeadline, false, SortOrder::None),
            (SortOrder::ByPriority, true, SortOrder::ByDeadlineAndPriority),
            (SortOrder::ByPriority, false, SortOrder::ByPriority),
            (SortOrder::ByDeadlineAndPriority, true, SortOrder::ByDeadlineAndPriority),
            (SortOrder::ByDeadlineAndPriority, false, SortOrder::ByPriority),
        ];

        for (current, enable, expected) in cases {
            let store = Arc::new(InMemoryPreferenceStore::with_preferences(stored_order(
                current.name(),
            )));
            let repository = UserPreferencesRepository::new(store);

            repository.set_sort_by_deadline(enable).await.unwrap();
            let prefs = repository.fetch_initial().await.unwrap();
            assert_eq!(
                prefs.sort_order, expected,
                "{} with deadline={}",
                current, enable
            );
        }
    }

    #[tokio::test]
    async fn test_priority_transition_table() {
        let cases = [
            (SortOrder::None, true, SortOrder::ByPriority),
            (SortOrder::None, false, SortOrder::None),
            (SortOrder::ByPriority, true, SortOrder::ByPriority),
            (SortOrder::ByPriority, false, SortOrder::None),
            (SortOrder::ByDeadline, true, SortOrder::ByDeadlineAndPriority),
            (SortOrder::ByDeadline, false, SortOrder::ByDeadline),
            (SortOrder::ByDeadlineAndPriority, true, SortOrder::ByDeadlineAndPriority),
            (SortOrder::ByDeadlineAndPriority, false, SortOrder::ByDeadline),
        ];

        for (current, enable, expected) in cases {
            let store = Arc::new(InMemoryPreferenceStore::with_preferences(stored_order(
                current.name(),
            )));
            let repository = UserPreferencesRepository::new(store);

            repository.set_sort_by_priority(enable).await.unwrap();
            let prefs = repository.fetch_initial().await.unwrap();
            assert_eq!(
                prefs.sort_order, expected,
                "{} with priority={}",
                current, enable
            );
        }
    }

    #[tokio::test]
    async fn test_sort_order_written_by_name() {
        let (repository, store) = create_repository();

        repository.set_sort_by_priority(true).await.unwrap();
        assert_eq!(
            store.snapshot().get(&SORT_ORDER),
            Some("BY_PRIORITY".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_sort_order_fails_fetch() {
        let store = Arc::new(InMemoryPreferenceStore::with_preferences(stored_order(
            "BY_COLOR",
        )));
        let repository = UserPreferencesRepository::new(store);

        let result = repository.fetch_initial().await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_unknown_sort_order_aborts_setter() {
        let store = Arc::new(InMemoryPreferenceStore::with_preferences(stored_order(
            "BY_COLOR",
        )));
        let repository = UserPreferencesRepository::new(store.clone());

        let result = repository.set_sort_by_deadline(true).await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert_eq!(
            store.snapshot().get(&SORT_ORDER),
            Some("BY_COLOR".to_string())
        );
    }

    #[tokio::test]
    async fn test_observe_emits_on_change() {
        let (repository, _store) = create_repository();
        let mut stream = repository.observe();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, UserPreferences::default());

        repository.update_show_completed(true).await.unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second, UserPreferences::new(true, SortOrder::None));
    }

    #[tokio::test]
    async fn test_observe_recovers_from_io_error() {
        let mut with_deadline = Preferences::new();
        with_deadline.set(&SORT_ORDER, "BY_DEADLINE".to_string());

        let store = Arc::new(ScriptedStore::new(vec![
            Ok(with_deadline.clone()),
            Err(Error::Io(io::Error::new(io::ErrorKind::Other, "disk hiccup"))),
            Ok(with_deadline),
        ]));
        let repository = UserPreferencesRepository::new(store);

        let emitted: Vec<_> = repository.observe().collect().await;
        assert_eq!(emitted.len(), 3);
        assert_eq!(
            emitted[0].as_ref().unwrap().sort_order,
            SortOrder::ByDeadline
        );
        assert_eq!(*emitted[1].as_ref().unwrap(), UserPreferences::default());
        assert_eq!(
            emitted[2].as_ref().unwrap().sort_order,
            SortOrder::ByDeadline
        );
    }

    #[tokio::test]
    async fn test_observe_terminates_on_other_error() {
        let store = Arc::new(ScriptedStore::new(vec![
            Ok(Preferences::new()),
            Err(Error::Corruption("bad file".to_string())),
            Ok(Preferences::new()),
        ]));
        let repository = UserPreferencesRepository::new(store);

        let emitted: Vec<_> = repository.observe().collect().await;
        assert_eq!(emitted.len(), 2);
        assert!(emitted[0].is_ok());
        assert!(matches!(emitted[1], Err(Error::Corruption(_))));
    }

    #[tokio::test]
    async fn test_observe_terminates_on_unknown_sort_order() {
        let store = Arc::new(ScriptedStore::new(vec![
            Ok(stored_order("SIDEWAYS")),
            Ok(Preferences::new()),
        ]));
        let repository = UserPreferencesRepository::new(store);

        let emitted: Vec<_> = repository.observe().collect().await;
        assert_eq!(emitted.len(), 1);
        assert!(matches!(emitted[0], Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_observe_ends_after_error_on_live_store() {
        let store = Arc::new(InMemoryPreferenceStore::with_preferences(stored_order(
            "BY_COLOR",
        )));
        let repository = UserPreferencesRepository::new(store);
        let mut stream = repository.observe();

        let first = stream.next().await.unwrap();
        assert!(matches!(first, Err(Error::InvalidState(_))));

        // The store never emits again, so only termination can resolve this.
        let after_error = tokio::time::timeout(Duration::from_millis(500), stream.next())
            .await
            .expect("stream should end right after the error");
        assert!(after_error.is_none());
    }

    #[tokio::test]
    async fn test_update_failure_propagates() {
        let store = Arc::new(ScriptedStore::new(Vec::new()));
        let repository = UserPreferencesRepository::new(store);

        let result = repository.update_show_completed(true).await;
        assert!(matches!(result, Err(Error::Storage(_))));

        let result = repository.set_sort_by_priority(true).await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }
}
