//! In-memory entity store with immutable-snapshot semantics.
//!
//! Each collection sits behind an `Arc` and is copied on first write, so a mutation produces a new
//! [`StoreSnapshot`] while readers holding an earlier snapshot keep seeing the old values. Writers go
//! through [`EntityStore::transact`], which swaps the new snapshot in only when the whole closure
//! succeeds.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use super::domain::{
    Application, ApplicationId, MessageId, Notification, NotificationId, User, UserId,
};

/// Entities addressable by a stable identifier.
pub trait Keyed {
    type Key: Clone + Eq + Hash;

    fn key(&self) -> &Self::Key;
}

impl Keyed for User {
    type Key = UserId;

    fn key(&self) -> &UserId {
        &self.id
    }
}

impl Keyed for Application {
    type Key = ApplicationId;

    fn key(&self) -> &ApplicationId {
        &self.id
    }
}

impl Keyed for Notification {
    type Key = NotificationId;

    fn key(&self) -> &NotificationId {
        &self.id
    }
}

/// Insertion-ordered collection with O(1) lookup by key.
#[derive(Debug, Clone)]
pub struct Collection<V: Keyed> {
    entries: Arc<Vec<V>>,
    index: Arc<HashMap<V::Key, usize>>,
}

impl<V: Keyed> Default for Collection<V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            index: Arc::new(HashMap::new()),
        }
    }
}

impl<V: Keyed + Clone> Collection<V> {
    pub fn get(&self, key: &V::Key) -> Option<&V> {
        self.index.get(key).and_then(|slot| self.entries.get(*slot))
    }

    pub fn contains(&self, key: &V::Key) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the entry sharing `value`'s key, or append it.
    fn upsert(&mut self, value: V) {
        match self.index.get(value.key()).copied() {
            Some(slot) => {
                if let Some(existing) = Arc::make_mut(&mut self.entries).get_mut(slot) {
                    *existing = value;
                }
            }
            None => {
                let slot = self.entries.len();
                Arc::make_mut(&mut self.index).insert(value.key().clone(), slot);
                Arc::make_mut(&mut self.entries).push(value);
            }
        }
    }

    fn get_mut(&mut self, key: &V::Key) -> Option<&mut V> {
        let slot = *self.index.get(key)?;
        Arc::make_mut(&mut self.entries).get_mut(slot)
    }

    fn for_each_mut(&mut self, mut visit: impl FnMut(&mut V)) {
        Arc::make_mut(&mut self.entries).iter_mut().for_each(|entry| visit(entry));
    }
}

/// High-water marks for the numeric suffix of each identifier family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Sequences {
    user: u64,
    application: u64,
    message: u64,
    notification: u64,
}

fn numeric_suffix(raw: &str) -> Option<u64> {
    raw.rsplit('-').next().and_then(|tail| tail.parse().ok())
}

/// Largest suffix that raises a sequence. Anything above it is out of reach of allocation anyway,
/// and tracking it would leave the counter no room to advance.
const MAX_TRACKED_SUFFIX: u64 = u32::MAX as u64;

fn observe(counter: &mut u64, raw: &str) {
    if let Some(value) = numeric_suffix(raw).filter(|value| *value <= MAX_TRACKED_SUFFIX) {
        *counter = (*counter).max(value);
    }
}

/// Point-in-time view over every collection.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    users: Collection<User>,
    applications: Collection<Application>,
    notifications: Collection<Notification>,
    sequences: Sequences,
}

impl StoreSnapshot {
    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    pub fn application(&self, id: &ApplicationId) -> Option<&Application> {
        self.applications.get(id)
    }

    pub fn notification(&self, id: &NotificationId) -> Option<&Notification> {
        self.notifications.get(id)
    }

    pub fn users(&self) -> std::slice::Iter<'_, User> {
        self.users.iter()
    }

    pub fn applications(&self) -> std::slice::Iter<'_, Application> {
        self.applications.iter()
    }

    pub fn notifications(&self) -> std::slice::Iter<'_, Notification> {
        self.notifications.iter()
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let needle = email.trim();
        self.users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(needle))
    }

    pub fn applications_of<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> impl Iterator<Item = &'a Application> + 'a {
        self.applications
            .iter()
            .filter(move |application| application.is_owned_by(user_id))
    }

    pub fn upsert_user(&mut self, user: User) {
        observe(&mut self.sequences.user, user.id.as_str());
        self.users.upsert(user);
    }

    pub fn upsert_application(&mut self, application: Application) {
        observe(&mut self.sequences.application, application.id.as_str());
        for message in &application.messages {
            observe(&mut self.sequences.message, message.id.as_str());
        }
        self.applications.upsert(application);
    }

    pub fn append_notification(&mut self, notification: Notification) {
        observe(&mut self.sequences.notification, notification.id.as_str());
        self.notifications.upsert(notification);
    }

    pub(crate) fn notification_mut(&mut self, id: &NotificationId) -> Option<&mut Notification> {
        self.notifications.get_mut(id)
    }

    pub(crate) fn for_each_notification_mut(&mut self, visit: impl FnMut(&mut Notification)) {
        self.notifications.for_each_mut(visit);
    }

    pub(crate) fn next_user_id(&mut self) -> UserId {
        self.sequences.user += 1;
        UserId(format!("user-{}", self.sequences.user))
    }

    pub(crate) fn next_application_id(&mut self) -> ApplicationId {
        self.sequences.application += 1;
        ApplicationId(format!("APP-{:03}", self.sequences.application))
    }

    pub(crate) fn next_message_id(&mut self) -> MessageId {
        self.sequences.message += 1;
        MessageId(format!("msg-{}", self.sequences.message))
    }

    pub(crate) fn next_notification_id(&mut self) -> NotificationId {
        self.sequences.notification += 1;
        NotificationId(format!("notif-{}", self.sequences.notification))
    }
}

/// Shared handle over the current snapshot. Writes are serialized; reads never block on them.
#[derive(Debug)]
pub struct EntityStore {
    state: watch::Sender<Arc<StoreSnapshot>>,
    writer: Mutex<()>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(StoreSnapshot::default())
    }
}

impl EntityStore {
    pub fn new(snapshot: StoreSnapshot) -> Self {
        let (state, _) = watch::channel(Arc::new(snapshot));
        Self {
            state,
            writer: Mutex::new(()),
        }
    }

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.state.borrow().clone()
    }

    /// Receive every committed snapshot from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.state.subscribe()
    }

    pub fn get_user(&self, id: &UserId) -> Option<User> {
        self.snapshot().user(id).cloned()
    }

    pub fn get_application(&self, id: &ApplicationId) -> Option<Application> {
        self.snapshot().application(id).cloned()
    }

    pub fn list_applications(&self) -> Vec<Application> {
        self.snapshot().applications().cloned().collect()
    }

    pub fn list_notifications(&self) -> Vec<Notification> {
        self.snapshot().notifications().cloned().collect()
    }

    pub fn upsert_user(&self, user: User) {
        self.commit(|draft| draft.upsert_user(user));
    }

    pub fn upsert_application(&self, application: Application) {
        self.commit(|draft| draft.upsert_application(application));
    }

    pub fn append_notification(&self, notification: Notification) {
        self.commit(|draft| draft.append_notification(notification));
    }

    /// Apply `apply` to a private copy of the current snapshot and publish it only on success.
    pub fn transact<T, E>(
        &self,
        apply: impl FnOnce(&mut StoreSnapshot) -> Result<T, E>,
    ) -> Result<T, E> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let base = self.snapshot();
        let mut draft = StoreSnapshot::clone(&base);
        let value = apply(&mut draft)?;
        self.state.send_replace(Arc::new(draft));
        Ok(value)
    }

    fn commit(&self, apply: impl FnOnce(&mut StoreSnapshot)) {
        let _ = self.transact(|draft| {
            apply(draft);
            Ok::<(), std::convert::Infallible>(())
        });
    }
}
