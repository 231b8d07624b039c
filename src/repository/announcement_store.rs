use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{self, Announcement, AnnouncementInput, AnnouncementPatch, Category};

/// Immutable copy of the collection handed to observers.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub revision: u64,
    pub announcements: Arc<[Announcement]>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.announcements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
    }
}

type Observer = Arc<dyn Fn(&Snapshot) + Send + Sync>;

struct StoreState {
    announcements: Vec<Announcement>,
    issued_ids: HashSet<Uuid>,
    observers: Vec<(u64, Observer)>,
    next_observer_id: u64,
    revision: u64,
}

impl StoreState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            announcements: self.announcements.as_slice().into(),
        }
    }

    fn broadcast(&mut self) {
        self.revision += 1;
        let snapshot = self.snapshot();
        tracing::debug!(
            "Broadcasting revision {} ({} announcements) to {} subscribers",
            snapshot.revision,
            snapshot.len(),
            self.observers.len()
        );
        for (_, observer) in &self.observers {
            observer(&snapshot);
        }
    }

    fn find_mut(&mut self, id: Uuid) -> Option<&mut Announcement> {
        self.announcements.iter_mut().find(|a| a.id == id)
    }

    fn next_id(&mut self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if self.issued_ids.insert(id) {
                return id;
            }
        }
    }
}

/// Canonical in-memory announcement collection.
///
/// Every mutation runs under one lock that also covers the broadcast, so
/// observers see revisions in mutation order and never a half-applied
/// change. Observers are called with that lock held and must not call back
/// into the store. Unknown ids are a silent no-op for every mutation.
pub struct AnnouncementStore {
    state: Arc<Mutex<StoreState>>,
}

impl AnnouncementStore {
    pub fn new() -> Self {
        Self::from_announcements(Vec::new())
    }

    /// Start from an existing collection (e.g. loaded from persistence).
    /// Its ids are reserved so `add` never reissues them.
    pub fn from_announcements(announcements: Vec<Announcement>) -> Self {
        let issued_ids = announcements.iter().map(|a| a.id).collect();
        Self {
            state: Arc::new(Mutex::new(StoreState {
                announcements,
                issued_ids,
                observers: Vec::new(),
                next_observer_id: 0,
                revision: 0,
            })),
        }
    }

    /// Seed with fresh inputs, keeping the given order.
    pub fn with_inputs(inputs: Vec<AnnouncementInput>) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for input in inputs {
                let id = state.next_id();
                state.announcements.push(Announcement::from_input(id, input));
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, input: AnnouncementInput) -> Announcement {
        let mut state = self.lock();
        let id = state.next_id();
        let announcement = Announcement::from_input(id, input);
        state.announcements.insert(0, announcement.clone());
        state.broadcast();
        tracing::info!("Added announcement {}: {}", announcement.id, announcement.title);
        announcement
    }

    /// Returns whether an entry matched.
    pub fn update(&self, id: Uuid, patch: AnnouncementPatch) -> bool {
        let mut state = self.lock();
        let Some(announcement) = state.find_mut(id) else {
            tracing::debug!("Update ignored, no announcement {}", id);
            return false;
        };
        announcement.apply(patch);
        state.broadcast();
        tracing::info!("Updated announcement {}", id);
        true
    }

    /// Returns whether an entry was removed. Broadcasts either way.
    pub fn delete(&self, id: Uuid) -> bool {
        let mut state = self.lock();
        let before = state.announcements.len();
        state.announcements.retain(|a| a.id != id);
        let removed = state.announcements.len() != before;
        state.broadcast();
        if removed {
            tracing::info!("Deleted announcement {}", id);
        } else {
            tracing::debug!("Delete matched nothing for {}", id);
        }
        removed
    }

    /// Returns the new flag, or `None` when the id is unknown.
    pub fn toggle_active(&self, id: Uuid) -> Option<bool> {
        let mut state = self.lock();
        let announcement = state.find_mut(id)?;
        announcement.is_active = !announcement.is_active;
        let is_active = announcement.is_active;
        state.broadcast();
        tracing::info!("Toggled announcement {} active={}", id, is_active);
        Some(is_active)
    }

    /// Returns the new count, or `None` when the id is unknown.
    pub fn increment_views(&self, id: Uuid) -> Option<u64> {
        let mut state = self.lock();
        let announcement = state.find_mut(id)?;
        announcement.views += 1;
        let views = announcement.views;
        state.broadcast();
        Some(views)
    }

    pub fn active_sorted(&self, as_of: DateTime<Utc>) -> Vec<Announcement> {
        domain::active_sorted(&self.lock().announcements, as_of)
    }

    pub fn by_category(&self, category: Category) -> Vec<Announcement> {
        domain::by_category(&self.lock().announcements, category)
    }

    pub fn get(&self, id: Uuid) -> Option<Announcement> {
        self.lock().announcements.iter().find(|a| a.id == id).cloned()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock().announcements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().announcements.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Register an observer. It receives the current collection right away
    /// and then every broadcast until the returned handle is dropped.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let observer: Observer = Arc::new(observer);
        let mut state = self.lock();
        let id = state.next_observer_id;
        state.next_observer_id += 1;
        observer(&state.snapshot());
        state.observers.push((id, observer));

        Subscription {
            id,
            state: Arc::downgrade(&self.state),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Drop every observer. The collection itself is kept.
    pub fn dispose(&self) {
        let mut state = self.lock();
        let count = state.observers.len();
        state.observers.clear();
        tracing::debug!("Disposed announcement store, released {} subscribers", count);
    }
}

impl Default for AnnouncementStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one observer registration. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    state: Weak<Mutex<StoreState>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.observers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{demo_announcements, utc_date, Priority};

    fn input(title: &str, priority: Priority, posted: DateTime<Utc>) -> AnnouncementInput {
        AnnouncementInput {
            title: title.to_string(),
            content: "C".to_string(),
            category: Category::General,
            priority,
            posted_by: "X".to_string(),
            posted_date: posted,
            expiry_date: None,
            image_url: None,
            attachments: None,
            is_active: true,
        }
    }

    fn recorder(store: &AnnouncementStore) -> (Arc<Mutex<Vec<Snapshot>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = store.subscribe(move |s| sink.lock().unwrap().push(s.clone()));
        (seen, sub)
    }

    #[test]
    fn test_add_assigns_unique_ids_and_inserts_first() {
        let store = AnnouncementStore::new();
        let mut ids = HashSet::new();
        for i in 0..200 {
            let a = store.add(input(&format!("a{}", i), Priority::Low, Utc::now()));
            assert!(ids.insert(a.id));
            assert_eq!(a.views, 0);
        }
        assert_eq!(store.len(), 200);
        assert_eq!(store.snapshot().announcements[0].title, "a199");
    }

    #[test]
    fn test_demo_scenario_active_sorted() {
        let store = AnnouncementStore::with_inputs(demo_announcements());
        let active = store.active_sorted(utc_date(2024, 11, 29));

        let categories: Vec<Category> = active.iter().map(|a| a.category).collect();
        assert_eq!(
            categories,
            vec![Category::General, Category::Event, Category::Academic]
        );
        assert_eq!(active[0].priority, Priority::High);
        assert!(active.iter().all(|a| a.category != Category::Maintenance));
    }

    #[test]
    fn test_demo_maintenance_notice_active_until_expiry() {
        let store = AnnouncementStore::with_inputs(demo_announcements());

        let before = store.active_sorted(utc_date(2024, 11, 26));
        assert_eq!(before.len(), 4);
        assert_eq!(before[0].category, Category::Maintenance);

        assert!(store
            .active_sorted(utc_date(2024, 11, 28))
            .iter()
            .all(|a| a.category != Category::Maintenance));
    }

    #[test]
    fn test_active_sorted_order_and_filter() {
        let store = AnnouncementStore::new();
        let now = utc_date(2024, 11, 29);
        store.add(input("low", Priority::Low, utc_date(2024, 11, 25)));
        store.add(input("urgent-old", Priority::Urgent, utc_date(2024, 11, 1)));
        store.add(input("urgent-new", Priority::Urgent, utc_date(2024, 11, 20)));
        let inactive = store.add(input("inactive", Priority::Urgent, utc_date(2024, 11, 24)));
        store.toggle_active(inactive.id);
        let mut expired = input("expired", Priority::High, utc_date(2024, 11, 24));
        expired.expiry_date = Some(now);
        store.add(expired);

        let active = store.active_sorted(now);
        let titles: Vec<&str> = active.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["urgent-new", "urgent-old", "low"]);

        for pair in active.windows(2) {
            let (x, y) = (&pair[0], &pair[1]);
            assert!(x.priority.rank() <= y.priority.rank());
            if x.priority == y.priority {
                assert!(x.posted_date >= y.posted_date);
            }
        }
    }

    #[test]
    fn test_add_then_increment_views_three_times() {
        let store = AnnouncementStore::with_inputs(demo_announcements());
        let created = store.add(input("T", Priority::Low, Utc::now()));
        for _ in 0..3 {
            store.increment_views(created.id);
        }

        let stored = store.get(created.id).unwrap();
        assert_eq!(stored.views, 3);
        assert_eq!(stored.id, created.id);
        assert_eq!(store.snapshot().announcements[0].id, created.id);
    }

    #[test]
    fn test_unknown_id_leaves_collection_unchanged() {
        let store = AnnouncementStore::with_inputs(demo_announcements());
        let before = store.snapshot();
        let unknown = Uuid::new_v4();

        assert!(!store.delete(unknown));
        assert_eq!(store.increment_views(unknown), None);
        assert_eq!(store.toggle_active(unknown), None);
        assert!(!store.update(unknown, AnnouncementPatch::default()));

        assert_eq!(&*store.snapshot().announcements, &*before.announcements);
    }

    #[test]
    fn test_toggle_twice_restores_flag() {
        let store = AnnouncementStore::new();
        let a = store.add(input("t", Priority::Normal, Utc::now()));
        assert_eq!(store.toggle_active(a.id), Some(false));
        assert_eq!(store.toggle_active(a.id), Some(true));
        assert!(store.get(a.id).unwrap().is_active);
    }

    #[test]
    fn test_subscribe_replays_then_follows_mutations() {
        let store = AnnouncementStore::with_inputs(demo_announcements());
        let (seen, _sub) = recorder(&store);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(seen.lock().unwrap()[0].len(), 4);

        let a = store.add(input("t", Priority::Normal, Utc::now()));
        store.increment_views(a.id);
        store.update(a.id, AnnouncementPatch {
            title: Some("renamed".into()),
            ..Default::default()
        });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        let last = seen.last().unwrap();
        assert_eq!(&*last.announcements, &*store.snapshot().announcements);
        let revisions: Vec<u64> = seen.iter().map(|s| s.revision).collect();
        assert_eq!(revisions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_broadcast_rules_for_no_ops() {
        let store = AnnouncementStore::new();
        let (seen, _sub) = recorder(&store);
        let unknown = Uuid::new_v4();

        store.update(unknown, AnnouncementPatch::default());
        store.toggle_active(unknown);
        store.increment_views(unknown);
        assert_eq!(seen.lock().unwrap().len(), 1);

        store.delete(unknown);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_unsubscribe_and_dispose_stop_delivery() {
        let store = AnnouncementStore::new();
        let (first, sub) = recorder(&store);
        let (second, _keep) = recorder(&store);
        assert_eq!(store.subscriber_count(), 2);

        sub.unsubscribe();
        store.add(input("a", Priority::Low, Utc::now()));
        assert_eq!(first.lock().unwrap().len(), 1);
        assert_eq!(second.lock().unwrap().len(), 2);

        store.dispose();
        assert_eq!(store.subscriber_count(), 0);
        store.add(input("b", Priority::Low, Utc::now()));
        assert_eq!(second.lock().unwrap().len(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_deleted_ids_are_never_reissued() {
        let seed = AnnouncementStore::with_inputs(demo_announcements()).snapshot();
        let reserved: HashSet<Uuid> = seed.announcements.iter().map(|a| a.id).collect();
        let store = AnnouncementStore::from_announcements(seed.announcements.to_vec());
        for a in seed.announcements.iter() {
            store.delete(a.id);
        }
        for _ in 0..50 {
            let a = store.add(input("n", Priority::Low, Utc::now()));
            assert!(!reserved.contains(&a.id));
        }
    }

    #[test]
    fn test_snapshot_does_not_alias_store() {
        let store = AnnouncementStore::new();
        let a = store.add(input("a", Priority::Low, Utc::now()));
        let before = store.snapshot();
        store.increment_views(a.id);
        assert_eq!(before.announcements[0].views, 0);
        assert_eq!(store.get(a.id).unwrap().views, 1);
    }
}
