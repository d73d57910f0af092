//! The application store and its actions
//!
//! Every action updates [`AppState`] synchronously, then queues the matching
//! write on the persistence worker. Callers never see storage failures; they
//! are logged by the worker.

use std::sync::Arc;

use super::persist::{PersistCommand, PersistHandle, spawn_worker};
use super::state::AppState;
use crate::identity::{IdentityError, IdentityProvider};
use crate::models::{
    ImageAsset, MAX_SAVED_LOOKS, ProfileEdit, ProviderProfile, SavedLook, UserProfile,
    prepend_capped,
};
use crate::storage::Storage;

/// Owner of the in-memory session and its write-through persistence
pub struct AppStore {
    state: AppState,
    storage: Storage,
    persist: PersistHandle,
    identity: Arc<dyn IdentityProvider>,
    max_quota: u32,
}

impl AppStore {
    /// Create a store; spawns the persistence worker on the current runtime
    pub fn new(storage: Storage, identity: Arc<dyn IdentityProvider>, max_quota: u32) -> Self {
        let persist = spawn_worker(storage.clone());
        Self {
            state: AppState::default(),
            storage,
            persist,
            identity,
            max_quota,
        }
    }

    /// Current state
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Quota granted to new sessions
    pub const fn max_quota(&self) -> u32 {
        self.max_quota
    }

    /// Persistence writes that have failed so far
    pub fn persist_failures(&self) -> usize {
        self.persist.failures()
    }

    /// Wait until every queued write has been applied
    pub async fn flush(&self) {
        self.persist.flush().await;
    }

    /// Bearer token for backend calls; developer sessions never send one
    pub fn access_token(&self) -> Option<String> {
        if self.state.is_dev_mode {
            None
        } else {
            self.identity.access_token()
        }
    }

    /// Replace the current user, persisting or removing it
    pub fn set_user(&mut self, user: Option<UserProfile>) {
        match &user {
            Some(profile) => self
                .persist
                .enqueue(PersistCommand::SaveUser(profile.clone())),
            None => self.persist.enqueue(PersistCommand::RemoveUser),
        }
        self.state.user = user;
    }

    /// Set the loading flag
    pub fn set_loading(&mut self, loading: bool) {
        self.state.is_loading = loading;
    }

    /// Set and persist the developer-mode flag
    pub fn set_dev_mode(&mut self, enabled: bool) {
        self.state.is_dev_mode = enabled;
        self.persist.enqueue(PersistCommand::SetDevMode(enabled));
    }

    /// Stage or clear the subject image
    pub fn set_user_img(&mut self, img: Option<ImageAsset>) {
        self.state.user_img = img;
    }

    /// Stage or clear the garment image
    pub fn set_fit_img(&mut self, img: Option<ImageAsset>) {
        self.state.fit_img = img;
    }

    /// Replace the in-memory gallery without persisting it
    pub fn set_saved_looks(&mut self, mut looks: Vec<SavedLook>) {
        looks.truncate(MAX_SAVED_LOOKS);
        self.state.saved_looks = looks;
    }

    /// Prepend a look in memory and in storage
    pub fn add_saved_look(&mut self, look: SavedLook) {
        prepend_capped(&mut self.state.saved_looks, look.clone());
        self.persist.enqueue(PersistCommand::SaveLook(look));
    }

    /// Drop a look by id; unknown ids are ignored
    pub fn remove_saved_look(&mut self, id: &str) {
        self.state.saved_looks.retain(|look| look.id != id);
        self.persist
            .enqueue(PersistCommand::RemoveLook { id: id.to_string() });
    }

    /// Count one generation against the signed-in user
    pub fn increment_quota(&mut self) {
        let Some(user) = self.state.user.as_mut() else {
            return;
        };
        user.quota = user.quota.saturating_add(1);
        let updated = user.clone();
        self.persist.enqueue(PersistCommand::SaveUser(updated));
    }

    /// Apply a personal-info edit; returns `false` when nobody is signed in
    pub fn update_profile(&mut self, edit: ProfileEdit) -> bool {
        let Some(mut user) = self.state.user.clone() else {
            return false;
        };
        user.apply_edit(edit);
        self.set_user(Some(user));
        true
    }

    /// End the session
    ///
    /// The provider sign-out is best-effort: a failure is logged and the local
    /// session is cleared regardless.
    pub async fn sign_out(&mut self) {
        if let Err(e) = self.identity.sign_out().await {
            tracing::error!("{} sign out error: {e}", self.identity.name());
        }

        self.state.user = None;
        self.state.is_dev_mode = false;
        self.state.user_img = None;
        self.state.fit_img = None;

        self.persist.enqueue(PersistCommand::RemoveUser);
        self.persist.enqueue(PersistCommand::RemoveDevMode);
    }

    /// Start a local developer session
    pub async fn sign_in_as_developer(&mut self) {
        if let Err(e) = self.identity.sign_in_developer().await {
            tracing::warn!("{} developer sign-in hook failed: {e}", self.identity.name());
        }

        let user = UserProfile::developer(self.max_quota);
        tracing::info!("Signed in as developer {}", user.uid);

        self.state.user = Some(user.clone());
        self.state.is_dev_mode = true;
        self.persist.enqueue(PersistCommand::SaveUser(user));
        self.persist.enqueue(PersistCommand::SetDevMode(true));
    }

    /// Start a session from identity-provider fields; quota starts at zero
    pub fn sign_in_with_google(&mut self, profile: ProviderProfile) {
        let user = UserProfile::from_provider(profile, self.max_quota);
        self.state.user = Some(user.clone());
        self.state.is_dev_mode = false;
        self.persist.enqueue(PersistCommand::SaveUser(user));
        self.persist.enqueue(PersistCommand::SetDevMode(false));
    }

    /// Resolve a provider token and start a session with the result
    ///
    /// Provider failures leave the store signed out and are returned.
    pub async fn sign_in_with_provider(&mut self, token: &str) -> Result<(), IdentityError> {
        let profile = self.identity.sign_in_with_provider(token).await?;
        self.sign_in_with_google(profile);
        Ok(())
    }

    /// Hydrate from storage
    ///
    /// All three entities are read concurrently. If any read fails nothing is
    /// applied and the app carries on signed out.
    pub async fn load_from_storage(&mut self) {
        self.state.is_loading = true;
        self.flush().await;

        let users = self.storage.user();
        let looks = self.storage.looks();
        let dev_mode = self.storage.dev_mode();

        match tokio::try_join!(users.get(), looks.get_all(), dev_mode.is_enabled()) {
            Ok((user, mut saved_looks, is_dev_mode)) => {
                saved_looks.truncate(MAX_SAVED_LOOKS);
                self.state.user = user;
                self.state.saved_looks = saved_looks;
                self.state.is_dev_mode = is_dev_mode;
                tracing::debug!(
                    "Loaded {} saved looks (signed in: {})",
                    self.state.saved_looks.len(),
                    self.state.user.is_some()
                );
            }
            Err(e) => {
                tracing::error!("Failed to load from storage: {e}");
            }
        }

        self.state.is_loading = false;
    }

    /// Forget every saved look and remove all persisted data
    pub fn clear_all_data(&mut self) {
        self.state.saved_looks.clear();
        self.persist.enqueue(PersistCommand::ClearAll);
    }
}

impl Drop for AppStore {
    fn drop(&mut self) {
        self.persist.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Session;
    use crate::identity::DeveloperIdentity;
    use crate::kv::{KeyValueStore, MemoryStore};
    use crate::models::ImageKind;
    use crate::storage::keys;
    use async_trait::async_trait;

    struct FailingIdentity;

    #[async_trait]
    impl IdentityProvider for FailingIdentity {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn sign_in_developer(&self) -> Result<(), IdentityError> {
            Err(IdentityError::Provider("offline".to_string()))
        }

        async fn sign_in_with_provider(&self, _token: &str) -> Result<ProviderProfile, IdentityError> {
            Err(IdentityError::Provider("token rejected".to_string()))
        }

        async fn sign_out(&self) -> Result<(), IdentityError> {
            Err(IdentityError::Provider("offline".to_string()))
        }
    }

    struct StubIdentity;

    #[async_trait]
    impl IdentityProvider for StubIdentity {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn sign_in_developer(&self) -> Result<(), IdentityError> {
            Ok(())
        }

        async fn sign_in_with_provider(&self, token: &str) -> Result<ProviderProfile, IdentityError> {
            Ok(ProviderProfile {
                uid: format!("uid-{token}"),
                display_name: Some("Grace".to_string()),
                email: Some("grace@example.com".to_string()),
                photo_url: None,
            })
        }

        async fn sign_out(&self) -> Result<(), IdentityError> {
            Ok(())
        }

        fn access_token(&self) -> Option<String> {
            Some("provider-token".to_string())
        }
    }

    fn store_with(identity: Arc<dyn IdentityProvider>) -> (Arc<MemoryStore>, AppStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = AppStore::new(Storage::new(kv.clone()), identity, 10);
        (kv, store)
    }

    fn store() -> (Arc<MemoryStore>, AppStore) {
        store_with(Arc::new(DeveloperIdentity))
    }

    fn profile(quota: u32) -> UserProfile {
        UserProfile {
            uid: "u-1".to_string(),
            display_name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            photo_url: None,
            quota,
            max_quota: 10,
        }
    }

    fn stage_images(store: &mut AppStore) {
        store.set_user_img(Some(ImageAsset::new("file:///me.jpg", ImageKind::User)));
        store.set_fit_img(Some(ImageAsset::new("file:///fit.jpg", ImageKind::Fit)));
    }

    #[tokio::test]
    async fn test_set_user_round_trip() {
        let (_, mut store) = store();
        let p = profile(2);

        store.set_user(Some(p.clone()));
        store.flush().await;
        assert_eq!(store.storage.user().get().await.unwrap(), Some(p));

        store.set_user(None);
        store.flush().await;
        assert_eq!(store.storage.user().get().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_persisted_looks_match_memory() {
        let (_, mut store) = store();
        for i in 0..(MAX_SAVED_LOOKS + 3) {
            store.add_saved_look(SavedLook::new(format!("look-{i}")));
        }
        store.flush().await;

        let persisted = store.storage.looks().get_all().await.unwrap();
        assert_eq!(store.state().saved_looks.len(), MAX_SAVED_LOOKS);
        assert_eq!(persisted, store.state().saved_looks);
        assert_eq!(persisted[0].image, format!("look-{}", MAX_SAVED_LOOKS + 2));
    }

    #[tokio::test]
    async fn test_remove_saved_look_is_idempotent() {
        let (_, mut store) = store();
        let keep = SavedLook::new("keep");
        let drop = SavedLook::new("drop");
        store.add_saved_look(keep.clone());
        store.add_saved_look(drop.clone());

        store.remove_saved_look(&drop.id);
        store.remove_saved_look(&drop.id);
        store.remove_saved_look("never-existed");
        store.flush().await;

        assert_eq!(store.state().saved_looks, vec![keep.clone()]);
        assert_eq!(store.storage.looks().get_all().await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn test_increment_quota_signed_out_is_noop() {
        let (kv, mut store) = store();
        let before = store.state().clone();

        store.increment_quota();
        store.flush().await;

        assert_eq!(store.state(), &before);
        assert_eq!(kv.write_count(keys::USER), 0);
    }

    #[tokio::test]
    async fn test_increment_quota_persists_each_step() {
        let (kv, mut store) = store();
        store.set_user(Some(profile(3)));
        store.flush().await;
        let writes_before = kv.write_count(keys::USER);

        for _ in 0..4 {
            store.increment_quota();
        }
        store.flush().await;

        assert_eq!(store.state().user.as_ref().unwrap().quota, 7);
        assert_eq!(kv.write_count(keys::USER), writes_before + 4);
        assert_eq!(store.storage.user().get().await.unwrap(), Some(profile(7)));
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_if_provider_fails() {
        let (kv, mut store) = store_with(Arc::new(FailingIdentity));
        store.sign_in_as_developer().await;
        stage_images(&mut store);
        store.flush().await;
        assert_eq!(store.state().session(), Session::SignedIn);

        store.sign_out().await;

        let state = store.state();
        assert!(state.user.is_none());
        assert!(!state.is_dev_mode);
        assert!(state.user_img.is_none());
        assert!(state.fit_img.is_none());

        store.flush().await;
        assert_eq!(kv.raw(keys::USER), None);
        assert_eq!(kv.raw(keys::DEV_MODE), None);
    }

    #[tokio::test]
    async fn test_sign_out_from_signed_out_state() {
        let (_, mut store) = store();
        store.sign_out().await;
        store.flush().await;

        assert_eq!(store.state().session(), Session::SignedOut);
        assert!(!store.state().is_dev_mode);
        assert_eq!(store.persist_failures(), 0);
    }

    #[tokio::test]
    async fn test_sign_in_as_developer() {
        let (kv, mut store) = store();
        store.sign_in_as_developer().await;
        store.flush().await;

        let user = store.state().user.clone().unwrap();
        assert!(user.uid.starts_with("dev-user-"));
        assert_eq!(user.quota, 0);
        assert_eq!(user.max_quota, 10);
        assert!(store.state().is_dev_mode);
        assert_eq!(kv.raw(keys::DEV_MODE).as_deref(), Some("true"));
        assert_eq!(store.storage.user().get().await.unwrap(), Some(user));
        assert!(store.access_token().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_with_provider() {
        let (_, mut store) = store_with(Arc::new(StubIdentity));
        store.set_dev_mode(true);

        store.sign_in_with_provider("abc").await.unwrap();
        store.flush().await;

        let user = store.state().user.clone().unwrap();
        assert_eq!(user.uid, "uid-abc");
        assert_eq!(user.quota, 0);
        assert!(!store.state().is_dev_mode);
        assert_eq!(store.access_token().as_deref(), Some("provider-token"));
        assert_eq!(store.storage.user().get().await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_provider_session_survives_reload_after_dev_session() {
        let kv = Arc::new(MemoryStore::new());
        let mut store = AppStore::new(Storage::new(kv.clone()), Arc::new(StubIdentity), 10);
        store.sign_in_as_developer().await;
        store.sign_in_with_provider("abc").await.unwrap();
        store.flush().await;
        drop(store);

        assert_eq!(kv.raw(keys::DEV_MODE).as_deref(), Some("false"));

        let mut reloaded = AppStore::new(Storage::new(kv.clone()), Arc::new(StubIdentity), 10);
        reloaded.load_from_storage().await;

        assert_eq!(reloaded.state().user.as_ref().unwrap().uid, "uid-abc");
        assert!(!reloaded.state().is_dev_mode);
        assert_eq!(reloaded.access_token().as_deref(), Some("provider-token"));
    }

    #[tokio::test]
    async fn test_provider_failure_stays_signed_out() {
        let (kv, mut store) = store_with(Arc::new(FailingIdentity));

        let result = store.sign_in_with_provider("abc").await;
        store.flush().await;

        assert!(matches!(result, Err(IdentityError::Provider(_))));
        assert_eq!(store.state().session(), Session::SignedOut);
        assert_eq!(kv.raw(keys::USER), None);
    }

    #[tokio::test]
    async fn test_load_with_empty_storage() {
        let (_, mut store) = store();
        assert!(store.state().is_loading);

        store.load_from_storage().await;

        assert!(store.state().user.is_none());
        assert!(!store.state().is_loading);
        assert!(store.state().saved_looks.is_empty());
        assert!(!store.state().is_dev_mode);
    }

    #[tokio::test]
    async fn test_load_hydrates_everything() {
        let kv = Arc::new(MemoryStore::new());
        let storage = Storage::new(kv.clone());
        let look = SavedLook::new("data:image/png;base64,AAAA");
        storage.user().save(&profile(5)).await.unwrap();
        storage.looks().save(&look).await.unwrap();
        storage.dev_mode().set_enabled(true).await.unwrap();

        let mut store = AppStore::new(storage, Arc::new(DeveloperIdentity), 10);
        store.load_from_storage().await;

        assert_eq!(store.state().user, Some(profile(5)));
        assert_eq!(store.state().saved_looks, vec![look]);
        assert!(store.state().is_dev_mode);
        assert!(!store.state().is_loading);
    }

    #[tokio::test]
    async fn test_load_aborts_on_any_failure() {
        let kv = Arc::new(MemoryStore::new());
        let storage = Storage::new(kv.clone());
        storage.user().save(&profile(5)).await.unwrap();
        storage.dev_mode().set_enabled(true).await.unwrap();
        kv.fail_reads_for(keys::SAVED_LOOKS);

        let mut store = AppStore::new(storage, Arc::new(DeveloperIdentity), 10);
        store.load_from_storage().await;

        assert!(store.state().user.is_none());
        assert!(!store.state().is_dev_mode);
        assert!(!store.state().is_loading);
    }

    #[tokio::test]
    async fn test_load_treats_corrupt_user_as_failure() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(keys::USER, "not json").await.unwrap();

        let mut store = AppStore::new(Storage::new(kv.clone()), Arc::new(DeveloperIdentity), 10);
        store.load_from_storage().await;

        assert_eq!(store.state().session(), Session::SignedOut);
        assert!(!store.state().is_loading);
    }

    #[tokio::test]
    async fn test_storage_failure_does_not_roll_back_memory() {
        let (kv, mut store) = store();
        kv.fail_writes_for(keys::SAVED_LOOKS);

        let look = SavedLook::new("x");
        store.add_saved_look(look.clone());
        store.flush().await;

        assert_eq!(store.state().saved_looks, vec![look]);
        assert_eq!(store.persist_failures(), 1);
        assert_eq!(kv.raw(keys::SAVED_LOOKS), None);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (_, mut store) = store();
        assert!(!store.update_profile(ProfileEdit::default()));

        store.set_user(Some(profile(4)));
        assert!(store.update_profile(ProfileEdit {
            display_name: Some("Ada L.".to_string()),
            email: Some(String::new()),
            photo_url: Some("file:///avatar.png".to_string()),
        }));
        store.flush().await;

        let user = store.storage.user().get().await.unwrap().unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Ada L."));
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.photo_url.as_deref(), Some("file:///avatar.png"));
        assert_eq!(user.quota, 4);
    }

    #[tokio::test]
    async fn test_clear_all_data() {
        let (kv, mut store) = store();
        store.sign_in_as_developer().await;
        store.add_saved_look(SavedLook::new("x"));

        store.clear_all_data();
        store.flush().await;

        assert!(store.state().saved_looks.is_empty());
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_staged_images_are_not_persisted() {
        let (kv, mut store) = store();
        stage_images(&mut store);
        store.flush().await;

        assert!(store.state().is_ready());
        assert!(kv.is_empty());

        store.set_fit_img(None);
        assert!(!store.state().is_ready());
    }
}
