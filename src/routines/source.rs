use std::future::Future;

use anyhow::Result;

use crate::{
    error::LoadError,
    models::{Routine, RoutineDocument},
    settings::RestDefaults,
};

use super::{validate, RoutineRegistry};

const ENABLE_LOGS: bool = true;
use crate::{log_info, log_warn};

/// Who is asking for a routine. Only user routines need a signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: Option<String>,
}

impl UserContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }
}

/// A per-user collection of stored routines.
pub trait UserRoutineStore: Send + Sync {
    fn fetch_user_routines(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<RoutineDocument>>> + Send;
}

/// Store used when only built-in routines are available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUserStore;

impl UserRoutineStore for NoUserStore {
    async fn fetch_user_routines(&self, _user_id: &str) -> Result<Vec<RoutineDocument>> {
        Ok(Vec::new())
    }
}

/// One-shot, read-only routine lookup.
pub trait RoutineSource: Send + Sync {
    fn load(
        &self,
        routine_id: &str,
        user: &UserContext,
    ) -> impl Future<Output = Result<Routine, LoadError>> + Send;
}

/// Looks a routine up in the built-in registry first, then in the user's store.
pub struct RoutineLoader<S> {
    registry: RoutineRegistry,
    store: S,
    rest_defaults: RestDefaults,
}

impl RoutineLoader<NoUserStore> {
    pub fn built_in_only(registry: RoutineRegistry, rest_defaults: RestDefaults) -> Self {
        Self::new(registry, NoUserStore, rest_defaults)
    }
}

impl<S: UserRoutineStore> RoutineLoader<S> {
    pub fn new(registry: RoutineRegistry, store: S, rest_defaults: RestDefaults) -> Self {
        Self {
            registry,
            store,
            rest_defaults,
        }
    }

    pub fn registry(&self) -> &RoutineRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn find_document(
        &self,
        routine_id: &str,
        user: &UserContext,
    ) -> Result<RoutineDocument, LoadError> {
        if let Some(document) = self.registry.get(routine_id) {
            log_info!("Loading built-in routine {}", routine_id);
            return Ok(document.clone());
        }

        let user_id = user
            .user_id
            .as_deref()
            .ok_or_else(|| LoadError::Unauthenticated(routine_id.to_string()))?;

        log_info!("Loading routine {} for user {}", routine_id, user_id);
        let documents = self
            .store
            .fetch_user_routines(user_id)
            .await
            .map_err(|source| LoadError::Store {
                id: routine_id.to_string(),
                source,
            })?;

        documents
            .into_iter()
            .find(|document| document.id.as_deref() == Some(routine_id))
            .ok_or_else(|| LoadError::NotFound(routine_id.to_string()))
    }
}

impl<S: UserRoutineStore> RoutineSource for RoutineLoader<S> {
    async fn load(&self, routine_id: &str, user: &UserContext) -> Result<Routine, LoadError> {
        if routine_id.trim().is_empty() {
            return Err(LoadError::MissingId);
        }

        let document = self.find_document(routine_id, user).await?;
        validate(document, routine_id, &self.rest_defaults).map_err(|err| {
            log_warn!("Rejecting routine {}: {}", routine_id, err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockDocument, ExerciseDocument};
    use anyhow::anyhow;

    struct MemoryStore {
        routines: Vec<(String, RoutineDocument)>,
    }

    impl UserRoutineStore for MemoryStore {
        async fn fetch_user_routines(&self, user_id: &str) -> Result<Vec<RoutineDocument>> {
            Ok(self
                .routines
                .iter()
                .filter(|(owner, _)| owner == user_id)
                .map(|(_, doc)| doc.clone())
                .collect())
        }
    }

    struct BrokenStore;

    impl UserRoutineStore for BrokenStore {
        async fn fetch_user_routines(&self, _user_id: &str) -> Result<Vec<RoutineDocument>> {
            Err(anyhow!("connection refused"))
        }
    }

    fn doc(id: &str, blocks: Vec<BlockDocument>) -> RoutineDocument {
        RoutineDocument {
            id: Some(id.into()),
            name: id.into(),
            blocks,
            ..Default::default()
        }
    }

    fn one_block() -> Vec<BlockDocument> {
        vec![BlockDocument {
            title: "Main".into(),
            repeat: 1,
            exercises: vec![ExerciseDocument {
                name: "Plank".into(),
                duration: Some(20),
                ..Default::default()
            }],
            ..Default::default()
        }]
    }

    fn loader() -> RoutineLoader<MemoryStore> {
        RoutineLoader::new(
            RoutineRegistry::empty().with("local", doc("local", one_block())),
            MemoryStore {
                routines: vec![
                    ("alice".into(), doc("mine", one_block())),
                    ("alice".into(), doc("hollow", vec![])),
                    ("bob".into(), doc("theirs", one_block())),
                ],
            },
            RestDefaults::default(),
        )
    }

    #[tokio::test]
    async fn registry_wins_without_a_user() {
        let routine = loader().load("local", &UserContext::anonymous()).await.unwrap();
        assert_eq!(routine.id, "local");
    }

    #[tokio::test]
    async fn falls_back_to_user_store() {
        let routine = loader().load("mine", &UserContext::user("alice")).await.unwrap();
        assert_eq!(routine.name, "mine");
    }

    #[tokio::test]
    async fn other_users_routines_are_not_found() {
        let err = loader()
            .load("theirs", &UserContext::user("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(id) if id == "theirs"));
    }

    #[tokio::test]
    async fn user_routine_requires_sign_in() {
        let err = loader().load("mine", &UserContext::anonymous()).await.unwrap_err();
        assert!(matches!(err, LoadError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn malformed_user_routine_is_rejected() {
        let err = loader()
            .load("hollow", &UserContext::user("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Invalid { .. }));
    }

    #[tokio::test]
    async fn blank_id_is_rejected() {
        let err = loader().load("  ", &UserContext::anonymous()).await.unwrap_err();
        assert!(matches!(err, LoadError::MissingId));
    }

    #[tokio::test]
    async fn store_failures_surface_as_store_errors() {
        let loader = RoutineLoader::new(
            RoutineRegistry::empty(),
            BrokenStore,
            RestDefaults::default(),
        );
        let err = loader
            .load("anything", &UserContext::user("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Store { .. }));
    }
}
