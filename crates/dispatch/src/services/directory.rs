//! User directory trait and in-memory implementation.
//!
//! Authentication and role storage live outside this engine; the
//! directory is the read interface the dispatch layer consumes for
//! permission checks, admin fan-out and pickup address resolution.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::Address;
use serde::{Deserialize, Serialize};

/// A role a marketplace user can hold.
///
/// Users may hold several roles at once; a seller who also rides
/// deliveries is one record with two roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Places orders and receives deliveries.
    Buyer,

    /// Lists produce and hands goods to agents.
    Seller,

    /// Oversees the marketplace and sees every new job.
    Admin,

    /// Claims and rides delivery jobs.
    DeliveryAgent,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Admin => "admin",
            Role::DeliveryAgent => "delivery_agent",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered marketplace user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// The user's identifier.
    pub user_id: UserId,

    /// Display name.
    pub name: String,

    /// Roles the user holds.
    pub roles: Vec<Role>,

    /// Registered pickup address, for sellers.
    pub pickup_address: Option<Address>,

    /// When the user registered.
    pub registered_at: DateTime<Utc>,
}

impl UserRecord {
    /// Creates a new user record with the given roles.
    pub fn new(user_id: UserId, name: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            name: name.into(),
            roles,
            pickup_address: None,
            registered_at: Utc::now(),
        }
    }

    /// Sets the seller's registered pickup address.
    pub fn with_pickup_address(mut self, address: Address) -> Self {
        self.pickup_address = Some(address);
        self
    }

    /// Returns true if the user holds the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Trait for user and role lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns true if the user is known to the directory.
    async fn exists(&self, user_id: UserId) -> bool;

    /// Returns true if the user holds the given role.
    async fn has_role(&self, user_id: UserId, role: Role) -> bool;

    /// Returns the ids of every admin user.
    async fn admin_ids(&self) -> Vec<UserId>;

    /// Returns the seller's registered pickup address, if any.
    async fn pickup_address_for(&self, seller_id: UserId) -> Option<Address>;
}

#[derive(Debug, Default)]
struct InMemoryDirectoryState {
    users: HashMap<UserId, UserRecord>,
}

/// In-memory user directory.
///
/// Default wiring for local runs and tests; a deployment would put an
/// adapter over the real account service behind the same trait.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    state: Arc<RwLock<InMemoryDirectoryState>>,
}

impl InMemoryUserDirectory {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user, replacing any existing record with the same id.
    pub fn register(&self, record: UserRecord) {
        self.state.write().unwrap().users.insert(record.user_id, record);
    }

    /// Returns the record for a user, if registered.
    pub fn user(&self, user_id: UserId) -> Option<UserRecord> {
        self.state.read().unwrap().users.get(&user_id).cloned()
    }

    /// Returns the number of registered users.
    pub fn user_count(&self) -> usize {
        self.state.read().unwrap().users.len()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn exists(&self, user_id: UserId) -> bool {
        self.state.read().unwrap().users.contains_key(&user_id)
    }

    async fn has_role(&self, user_id: UserId, role: Role) -> bool {
        self.state
            .read()
            .unwrap()
            .users
            .get(&user_id)
            .is_some_and(|user| user.has_role(role))
    }

    async fn admin_ids(&self) -> Vec<UserId> {
        self.state
            .read()
            .unwrap()
            .users
            .values()
            .filter(|user| user.has_role(Role::Admin))
            .map(|user| user.user_id)
            .collect()
    }

    async fn pickup_address_for(&self, seller_id: UserId) -> Option<Address> {
        self.state
            .read()
            .unwrap()
            .users
            .get(&seller_id)
            .filter(|user| user.has_role(Role::Seller))
            .and_then(|user| user.pickup_address.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm_address() -> Address {
        Address::new("Musa Bello", "7 Farm Lane", "Kano", "Kano", "+2348098765432")
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let directory = InMemoryUserDirectory::new();
        let user_id = UserId::new();

        assert!(!directory.exists(user_id).await);

        directory.register(UserRecord::new(user_id, "Ada Obi", vec![Role::Buyer]));

        assert!(directory.exists(user_id).await);
        assert!(directory.has_role(user_id, Role::Buyer).await);
        assert!(!directory.has_role(user_id, Role::Admin).await);
        assert_eq!(directory.user_count(), 1);
        assert_eq!(directory.user(user_id).unwrap().name, "Ada Obi");
    }

    #[tokio::test]
    async fn test_user_with_multiple_roles() {
        let directory = InMemoryUserDirectory::new();
        let user_id = UserId::new();

        directory.register(UserRecord::new(
            user_id,
            "Musa Bello",
            vec![Role::Seller, Role::DeliveryAgent],
        ));

        assert!(directory.has_role(user_id, Role::Seller).await);
        assert!(directory.has_role(user_id, Role::DeliveryAgent).await);
        assert!(!directory.has_role(user_id, Role::Buyer).await);
    }

    #[tokio::test]
    async fn test_admin_ids() {
        let directory = InMemoryUserDirectory::new();
        let admin_1 = UserId::new();
        let admin_2 = UserId::new();

        directory.register(UserRecord::new(admin_1, "Admin One", vec![Role::Admin]));
        directory.register(UserRecord::new(admin_2, "Admin Two", vec![Role::Admin]));
        directory.register(UserRecord::new(UserId::new(), "Ada Obi", vec![Role::Buyer]));

        let admins = directory.admin_ids().await;
        assert_eq!(admins.len(), 2);
        assert!(admins.contains(&admin_1));
        assert!(admins.contains(&admin_2));
    }

    #[tokio::test]
    async fn test_pickup_address_for_seller() {
        let directory = InMemoryUserDirectory::new();
        let seller_id = UserId::new();

        directory.register(
            UserRecord::new(seller_id, "Musa Bello", vec![Role::Seller])
                .with_pickup_address(farm_address()),
        );

        assert_eq!(
            directory.pickup_address_for(seller_id).await,
            Some(farm_address())
        );
    }

    #[tokio::test]
    async fn test_pickup_address_missing() {
        let directory = InMemoryUserDirectory::new();
        let seller_id = UserId::new();

        // Seller registered without an address
        directory.register(UserRecord::new(seller_id, "Musa Bello", vec![Role::Seller]));
        assert_eq!(directory.pickup_address_for(seller_id).await, None);

        // Unknown user
        assert_eq!(directory.pickup_address_for(UserId::new()).await, None);
    }

    #[tokio::test]
    async fn test_reregistration_replaces_record() {
        let directory = InMemoryUserDirectory::new();
        let user_id = UserId::new();

        directory.register(UserRecord::new(user_id, "Ada", vec![Role::Buyer]));
        directory.register(UserRecord::new(
            user_id,
            "Ada Obi",
            vec![Role::Buyer, Role::DeliveryAgent],
        ));

        assert_eq!(directory.user_count(), 1);
        assert!(directory.has_role(user_id, Role::DeliveryAgent).await);
        assert_eq!(directory.user(user_id).unwrap().name, "Ada Obi");
    }

    #[test]
    fn test_role_serialization_is_snake_case() {
        let json = serde_json::to_string(&Role::DeliveryAgent).unwrap();
        assert_eq!(json, "\"delivery_agent\"");

        let deserialized: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(deserialized, Role::Admin);
    }
}
