use thiserror::Error;
use tracing::{info, warn};

use crate::database::{ActivityMap, ActivityStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignupError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn require_email(email: Option<&str>) -> Result<&str, SignupError> {
    match email {
        None => Err(SignupError::Validation(
            "Missing required query parameter: email".to_string(),
        )),
        Some("") => Err(SignupError::Validation(
            "Parameter email must not be empty".to_string(),
        )),
        Some(v) => Ok(v),
    }
}

// The router never matches an empty segment; direct callers can still pass one.
fn check_activity_name(activity_name: &str) -> Result<(), SignupError> {
    if activity_name.is_empty() {
        return Err(SignupError::Validation(
            "Parameter activity_name must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_activities(store: &ActivityStore) -> ActivityMap {
    store.list().await
}

pub async fn signup(
    store: &ActivityStore,
    activity_name: &str,
    email: Option<&str>,
) -> Result<String, SignupError> {
    check_activity_name(activity_name)?;
    let email = require_email(email)?;

    match store.signup(activity_name, email).await {
        Ok(activity) => {
            info!(
                activity = %activity_name,
                email = %email,
                spots_left = activity.spots_left(),
                "signup accepted"
            );
            if activity.is_over_capacity() {
                warn!(
                    activity = %activity_name,
                    participants = activity.participants.len(),
                    max_participants = activity.max_participants,
                    "activity is over capacity"
                );
            }
            Ok(format!("Signed up {} for {}", email, activity_name))
        }
        Err(e) => {
            warn!(activity = %activity_name, email = %email, error = %e, "signup rejected");
            Err(e.into())
        }
    }
}

pub async fn unregister(
    store: &ActivityStore,
    activity_name: &str,
    email: Option<&str>,
) -> Result<String, SignupError> {
    check_activity_name(activity_name)?;
    let email = require_email(email)?;

    match store.unregister(activity_name, email).await {
        Ok(activity) => {
            info!(
                activity = %activity_name,
                email = %email,
                spots_left = activity.spots_left(),
                "unregister accepted"
            );
            Ok(format!("Unregistered {} from {}", email, activity_name))
        }
        Err(e) => {
            warn!(activity = %activity_name, email = %email, error = %e, "unregister rejected");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Activity;

    fn store() -> ActivityStore {
        ActivityStore::from_activities([("Chess Club", Activity::new("d", "s", 12))])
    }

    #[tokio::test]
    async fn signup_message_names_email_and_activity() {
        let store = store();
        let msg = signup(&store, "Chess Club", Some("a@b.com")).await.unwrap();
        assert_eq!(msg, "Signed up a@b.com for Chess Club");

        let msg = unregister(&store, "Chess Club", Some("a@b.com")).await.unwrap();
        assert_eq!(msg, "Unregistered a@b.com from Chess Club");
    }

    #[tokio::test]
    async fn missing_or_empty_email_is_rejected_before_the_store() {
        let store = store();

        let err = signup(&store, "Chess Club", None).await.unwrap_err();
        assert!(matches!(err, SignupError::Validation(ref m) if m.contains("email")));

        let err = signup(&store, "Chess Club", Some("")).await.unwrap_err();
        assert!(matches!(err, SignupError::Validation(_)));

        let err = unregister(&store, "", Some("a@b.com")).await.unwrap_err();
        assert!(matches!(err, SignupError::Validation(ref m) if m.contains("activity_name")));

        assert!(store.get("Chess Club").await.unwrap().participants.is_empty());
    }

    #[tokio::test]
    async fn email_is_not_normalized() {
        let store = store();
        signup(&store, "Chess Club", Some(" A@b.com")).await.unwrap();
        signup(&store, "Chess Club", Some("a@b.com")).await.unwrap();
        assert_eq!(
            store.get("Chess Club").await.unwrap().participants,
            vec![" A@b.com", "a@b.com"]
        );
    }

    #[tokio::test]
    async fn store_errors_pass_through() {
        let store = store();
        let err = unregister(&store, "Chess Club", Some("a@b.com")).await.unwrap_err();
        assert_eq!(err, SignupError::Store(StoreError::NotRegistered));
        assert_eq!(err.to_string(), "Student is not registered for this activity");
    }
}
