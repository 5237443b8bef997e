// service/permission_service.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::{
    db::{
        cache::{CacheHelper, PERMISSION_CACHE_TTL},
        roledb::RoleExt,
        DBClient,
    },
    service::error::ServiceError,
};

const PERMISSION_CACHE_CAPACITY: u64 = 10_000;

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn role_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError>;

    async fn permission_names_for_roles(&self, role_ids: &[Uuid]) -> Result<Vec<String>, ServiceError>;
}

#[async_trait]
impl PermissionStore for DBClient {
    async fn role_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        Ok(self.get_user_role_ids(user_id).await?)
    }

    async fn permission_names_for_roles(&self, role_ids: &[Uuid]) -> Result<Vec<String>, ServiceError> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.get_permission_names_for_roles(role_ids).await?)
    }
}

/// Per-user permission sets. Cache failures never fail a permission check;
/// implementations log them and behave as a miss.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Option<Vec<String>>;

    async fn put(&self, user_id: Uuid, permissions: Vec<String>);

    async fn remove(&self, user_id: Uuid);

    async fn remove_all(&self);
}

#[derive(Clone)]
pub struct MemoryPermissionCache {
    inner: Cache<Uuid, Arc<Vec<String>>>,
}

impl MemoryPermissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(PERMISSION_CACHE_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl PermissionCache for MemoryPermissionCache {
    async fn get(&self, user_id: Uuid) -> Option<Vec<String>> {
        self.inner.get(&user_id).await.map(|perms| perms.as_ref().clone())
    }

    async fn put(&self, user_id: Uuid, permissions: Vec<String>) {
        self.inner.insert(user_id, Arc::new(permissions)).await;
    }

    async fn remove(&self, user_id: Uuid) {
        self.inner.invalidate(&user_id).await;
    }

    async fn remove_all(&self) {
        self.inner.invalidate_all();
    }
}

pub struct RedisPermissionCache {
    redis: Arc<ConnectionManager>,
    ttl_seconds: usize,
}

impl RedisPermissionCache {
    pub fn new(redis: Arc<ConnectionManager>, ttl_seconds: usize) -> Self {
        Self { redis, ttl_seconds }
    }

    fn key(user_id: Uuid) -> String {
        format!("permissions:user:{}", user_id)
    }
}

#[async_trait]
impl PermissionCache for RedisPermissionCache {
    async fn get(&self, user_id: Uuid) -> Option<Vec<String>> {
        match CacheHelper::get::<Vec<String>>(&self.redis, &Self::key(user_id)).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Permission cache read failed for {}: {}", user_id, e);
                None
            }
        }
    }

    async fn put(&self, user_id: Uuid, permissions: Vec<String>) {
        if let Err(e) =
            CacheHelper::set(&self.redis, &Self::key(user_id), &permissions, self.ttl_seconds).await
        {
            tracing::warn!("Permission cache write failed for {}: {}", user_id, e);
        }
    }

    async fn remove(&self, user_id: Uuid) {
        if let Err(e) = CacheHelper::delete(&self.redis, &Self::key(user_id)).await {
            tracing::warn!("Permission cache delete failed for {}: {}", user_id, e);
        }
    }

    async fn remove_all(&self) {
        if let Err(e) = CacheHelper::delete_pattern(&self.redis, "permissions:user:*").await {
            tracing::warn!("Permission cache flush failed: {}", e);
        }
    }
}

/// Answers "may this user do X?" from role membership, caching each user's
/// permission names for an hour.
#[derive(Clone)]
pub struct PermissionService {
    store: Arc<dyn PermissionStore>,
    cache: Arc<dyn PermissionCache>,
}

impl PermissionService {
    pub fn new(store: Arc<dyn PermissionStore>, cache: Arc<dyn PermissionCache>) -> Self {
        Self { store, cache }
    }

    /// Uses Redis when the client has a connection, an in-process cache otherwise.
    pub fn for_db(db_client: Arc<DBClient>) -> Self {
        let cache: Arc<dyn PermissionCache> = match &db_client.redis_client {
            Some(redis) => Arc::new(RedisPermissionCache::new(redis.clone(), PERMISSION_CACHE_TTL)),
            None => Arc::new(MemoryPermissionCache::new(Duration::from_secs(
                PERMISSION_CACHE_TTL as u64,
            ))),
        };
        tracing::info!("Permission cache backend: {}", db_client.cache_status());

        Self::new(db_client, cache)
    }

    pub async fn permissions_for(&self, user_id: Uuid) -> Result<Vec<String>, ServiceError> {
        if let Some(cached) = self.cache.get(user_id).await {
            return Ok(cached);
        }

        let role_ids = self.store.role_ids_for_user(user_id).await?;
        let permissions = self.store.permission_names_for_roles(&role_ids).await?;
        self.cache.put(user_id, permissions.clone()).await;

        Ok(permissions)
    }

    pub async fn has_permission(&self, user_id: Uuid, permission: &str) -> Result<bool, ServiceError> {
        let permissions = self.permissions_for(user_id).await?;
        Ok(permissions.iter().any(|p| p == permission))
    }

    /// Drops one user's cached permissions, e.g. after their roles change.
    pub async fn clear(&self, user_id: Uuid) {
        self.cache.remove(user_id).await;
    }

    /// Drops every cached permission set, e.g. after a role's grants change.
    pub async fn clear_all(&self) {
        self.cache.remove_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingStore {
        user_roles: Mutex<HashMap<Uuid, Vec<Uuid>>>,
        role_permissions: HashMap<Uuid, Vec<String>>,
        role_lookups: AtomicUsize,
        permission_lookups: AtomicUsize,
    }

    #[async_trait]
    impl PermissionStore for CountingStore {
        async fn role_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
            self.role_lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .user_roles
                .lock()
                .unwrap()
                .get(&user_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn permission_names_for_roles(&self, role_ids: &[Uuid]) -> Result<Vec<String>, ServiceError> {
            self.permission_lookups.fetch_add(1, Ordering::SeqCst);
            let mut names: Vec<String> = role_ids
                .iter()
                .filter_map(|id| self.role_permissions.get(id))
                .flatten()
                .cloned()
                .collect();
            names.sort();
            names.dedup();
            Ok(names)
        }
    }

    fn setup() -> (Arc<CountingStore>, PermissionService, Uuid, Uuid) {
        let landlord_role = Uuid::new_v4();
        let tenant_role = Uuid::new_v4();
        let user = Uuid::new_v4();

        let mut store = CountingStore::default();
        store.role_permissions.insert(
            landlord_role,
            vec!["submit_readings".into(), "manage_utilities".into()],
        );
        store.role_permissions.insert(tenant_role, vec![]);
        store.user_roles.lock().unwrap().insert(user, vec![landlord_role]);

        let store = Arc::new(store);
        let cache = Arc::new(MemoryPermissionCache::new(Duration::from_secs(3600)));
        let service = PermissionService::new(store.clone(), cache);
        (store, service, user, tenant_role)
    }

    #[tokio::test]
    async fn first_check_queries_store_and_second_hits_cache() {
        let (store, service, user, _) = setup();

        assert!(service.has_permission(user, "submit_readings").await.unwrap());
        assert_eq!(store.role_lookups.load(Ordering::SeqCst), 1);
        assert_eq!(store.permission_lookups.load(Ordering::SeqCst), 1);

        assert!(service.has_permission(user, "manage_utilities").await.unwrap());
        assert!(!service.has_permission(user, "manage_users").await.unwrap());
        assert_eq!(store.role_lookups.load(Ordering::SeqCst), 1);
        assert_eq!(store.permission_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_forces_a_fresh_lookup() {
        let (store, service, user, tenant_role) = setup();

        assert!(service.has_permission(user, "submit_readings").await.unwrap());

        store.user_roles.lock().unwrap().insert(user, vec![tenant_role]);
        // still served from cache until cleared
        assert!(service.has_permission(user, "submit_readings").await.unwrap());

        service.clear(user).await;
        assert!(!service.has_permission(user, "submit_readings").await.unwrap());
        assert_eq!(store.role_lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn clear_all_drops_every_user() {
        let (store, service, user, _) = setup();
        let other = Uuid::new_v4();

        service.permissions_for(user).await.unwrap();
        service.permissions_for(other).await.unwrap();
        assert_eq!(store.role_lookups.load(Ordering::SeqCst), 2);

        service.clear_all().await;
        service.permissions_for(user).await.unwrap();
        service.permissions_for(other).await.unwrap();
        assert_eq!(store.role_lookups.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn expired_entries_are_reloaded() {
        let (store, _, user, _) = setup();
        let cache = Arc::new(MemoryPermissionCache::new(Duration::from_millis(50)));
        let service = PermissionService::new(store.clone(), cache);

        service.permissions_for(user).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        service.permissions_for(user).await.unwrap();

        assert_eq!(store.role_lookups.load(Ordering::SeqCst), 2);
    }
}
