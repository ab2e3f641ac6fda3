use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::database::seed;
use crate::models::Activity;

/// Activities keyed by name, in seed order.
pub type ActivityMap = IndexMap<String, Activity>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Activity not found")]
    ActivityNotFound,
    #[error("Student is already signed up for this activity")]
    AlreadyRegistered,
    #[error("Student is not registered for this activity")]
    NotRegistered,
}

/// In-memory board state. Cloning shares the same underlying map, so the
/// store can be handed to axum as router state.
#[derive(Debug, Clone, Default)]
pub struct ActivityStore {
    inner: Arc<RwLock<ActivityMap>>,
}

impl ActivityStore {
    pub fn from_activities<I, S>(activities: I) -> Self
    where
        I: IntoIterator<Item = (S, Activity)>,
        S: Into<String>,
    {
        let map = activities
            .into_iter()
            .map(|(name, activity)| (name.into(), activity))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Store holding the default board.
    pub fn seeded() -> Self {
        Self::from_activities(seed::default_activities())
    }

    pub async fn list(&self) -> ActivityMap {
        self.inner.read().await.clone()
    }

    pub async fn get(&self, activity_name: &str) -> Option<Activity> {
        self.inner.read().await.get(activity_name).cloned()
    }

    /// Appends `email` to the roster and returns the updated activity.
    /// Capacity is not checked.
    pub async fn signup(&self, activity_name: &str, email: &str) -> Result<Activity, StoreError> {
        let mut activities = self.inner.write().await;
        let activity = activities
            .get_mut(activity_name)
            .ok_or(StoreError::ActivityNotFound)?;
        if activity.is_registered(email) {
            return Err(StoreError::AlreadyRegistered);
        }
        activity.participants.push(email.to_string());
        Ok(activity.clone())
    }

    /// Removes `email` from the roster, keeping the order of everyone else.
    pub async fn unregister(
        &self,
        activity_name: &str,
        email: &str,
    ) -> Result<Activity, StoreError> {
        let mut activities = self.inner.write().await;
        let activity = activities
            .get_mut(activity_name)
            .ok_or(StoreError::ActivityNotFound)?;
        let pos = activity
            .participants
            .iter()
            .position(|p| p == email)
            .ok_or(StoreError::NotRegistered)?;
        activity.participants.remove(pos);
        Ok(activity.clone())
    }

    /// Replaces the whole board.
    pub async fn reset_to<I, S>(&self, activities: I)
    where
        I: IntoIterator<Item = (S, Activity)>,
        S: Into<String>,
    {
        let mut guard = self.inner.write().await;
        *guard = activities
            .into_iter()
            .map(|(name, activity)| (name.into(), activity))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chess_only() -> ActivityStore {
        ActivityStore::from_activities([(
            "Chess Club",
            Activity::new("Learn strategies", "Fridays, 3:30 PM - 5:00 PM", 12),
        )])
    }

    async fn roster(store: &ActivityStore, name: &str) -> Vec<String> {
        store.get(name).await.unwrap().participants
    }

    #[tokio::test]
    async fn signup_then_repeat_is_rejected() {
        let store = chess_only();

        let updated = store.signup("Chess Club", "a@b.com").await.unwrap();
        assert_eq!(updated.participants, vec!["a@b.com"]);

        let err = store.signup("Chess Club", "a@b.com").await.unwrap_err();
        assert_eq!(err, StoreError::AlreadyRegistered);
        assert_eq!(roster(&store, "Chess Club").await, vec!["a@b.com"]);
    }

    #[tokio::test]
    async fn unregister_unknown_email_leaves_roster_alone() {
        let store = chess_only();
        store.signup("Chess Club", "a@b.com").await.unwrap();

        let err = store.unregister("Chess Club", "c@d.com").await.unwrap_err();
        assert_eq!(err, StoreError::NotRegistered);
        assert_eq!(roster(&store, "Chess Club").await, vec!["a@b.com"]);
    }

    #[tokio::test]
    async fn signup_unregister_round_trip_restores_roster() {
        let store = ActivityStore::seeded();
        let before = store.list().await;

        store.signup("Science Club", "new@mergington.edu").await.unwrap();
        store
            .unregister("Science Club", "new@mergington.edu")
            .await
            .unwrap();

        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn unknown_activity_is_not_found_and_nothing_changes() {
        let store = ActivityStore::seeded();
        let before = store.list().await;

        assert_eq!(
            store.signup("Knitting", "a@b.com").await.unwrap_err(),
            StoreError::ActivityNotFound
        );
        assert_eq!(
            store.unregister("Knitting", "a@b.com").await.unwrap_err(),
            StoreError::ActivityNotFound
        );
        // Names are case sensitive.
        assert_eq!(
            store.signup("chess club", "a@b.com").await.unwrap_err(),
            StoreError::ActivityNotFound
        );
        assert_eq!(store.list().await, before);
    }

    #[tokio::test]
    async fn participants_keep_signup_order() {
        let store = chess_only();
        for email in ["one@b.com", "two@b.com", "three@b.com"] {
            store.signup("Chess Club", email).await.unwrap();
        }
        store.unregister("Chess Club", "two@b.com").await.unwrap();
        assert_eq!(
            roster(&store, "Chess Club").await,
            vec!["one@b.com", "three@b.com"]
        );
    }

    #[tokio::test]
    async fn signup_is_allowed_past_capacity() {
        let store =
            ActivityStore::from_activities([("Tiny", Activity::new("d", "s", 1))]);
        store.signup("Tiny", "a@b.com").await.unwrap();
        let over = store.signup("Tiny", "b@b.com").await.unwrap();
        assert!(over.is_over_capacity());
        assert_eq!(over.spots_left(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_signups_admit_one() {
        let store = chess_only();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.signup("Chess Club", "race@b.com").await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert_eq!(e, StoreError::AlreadyRegistered),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(roster(&store, "Chess Club").await, vec!["race@b.com"]);
    }

    #[tokio::test]
    async fn reset_replaces_state() {
        let store = ActivityStore::seeded();
        store.signup("Chess Club", "a@b.com").await.unwrap();

        store.reset_to(seed::default_activities()).await;
        assert!(!roster(&store, "Chess Club").await.contains(&"a@b.com".to_string()));
    }

    #[tokio::test]
    async fn list_preserves_seed_order() {
        let store = ActivityStore::seeded();
        let names: Vec<String> = store.list().await.keys().cloned().collect();
        assert_eq!(names.first().map(String::as_str), Some("Chess Club"));
        assert_eq!(names.last().map(String::as_str), Some("Science Club"));
    }
}
