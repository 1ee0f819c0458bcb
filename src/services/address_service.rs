use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::database::models::{Address, UserAddress};
use crate::database::{Statement, Store};

use super::ServiceError;

pub const DEFAULT_ADDRESS_TYPE: &str = "home";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub full_address: String,
    pub address_type: Option<String>,
}

/// An address as seen by its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAddressView {
    #[serde(flatten)]
    pub address: Address,
    pub address_type: String,
}

/// One address per user, linked through `user_address`.
pub struct AddressService {
    store: Arc<dyn Store>,
}

impl AddressService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn link(&self, user_id: i64) -> Result<Option<UserAddress>, ServiceError> {
        let stmt = Statement::new(
            "SELECT * FROM \"user_address\" WHERE \"user_id\" = $1 AND \"deleted_at\" IS NULL LIMIT 1",
        )
        .bind(user_id);
        Ok(self.store.fetch_optional_as::<UserAddress>(stmt).await?)
    }

    pub async fn create(&self, user_id: i64, input: AddressInput) -> Result<UserAddressView, ServiceError> {
        validate_coordinates(&input)?;
        if self.link(user_id).await?.is_some() {
            return Err(ServiceError::Conflict("An address is already registered for this account".to_string()));
        }

        let mut address = Address {
            xid: Uuid::new_v4().simple().to_string(),
            ..Default::default()
        };
        apply(&mut address, &input);
        address.id = self.store.insert_entity(&address).await?;

        let link = UserAddress {
            user_id,
            address_id: address.id,
            address_type: input
                .address_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ADDRESS_TYPE.to_string()),
            ..Default::default()
        };
        self.store.insert_entity(&link).await?;

        info!("Created address {} for user {}", address.id, user_id);
        self.get(user_id).await
    }

    pub async fn get(&self, user_id: i64) -> Result<UserAddressView, ServiceError> {
        let stmt = Statement::new(
            "SELECT \"address\".*, \"user_address\".\"address_type\" FROM \"address\" \
             JOIN \"user_address\" ON \"address\".\"id\" = \"user_address\".\"address_id\" \
             WHERE \"user_address\".\"user_id\" = $1 AND \"address\".\"deleted_at\" IS NULL \
             AND \"user_address\".\"deleted_at\" IS NULL LIMIT 1",
        )
        .bind(user_id);

        self.store
            .fetch_optional_as::<UserAddressView>(stmt)
            .await?
            .ok_or_else(|| ServiceError::NotFound("No address for this account".to_string()))
    }

    /// Only the caller's own address is reachable; ids in the body are ignored.
    pub async fn update(&self, user_id: i64, input: AddressInput) -> Result<UserAddressView, ServiceError> {
        validate_coordinates(&input)?;
        let current = self.get(user_id).await?;

        let mut address = current.address;
        apply(&mut address, &input);
        self.store.update_entity(&address).await?;

        if let Some(address_type) = input.address_type.filter(|t| !t.trim().is_empty()) {
            if let Some(mut link) = self.link(user_id).await? {
                link.address_type = address_type;
                self.store.update_entity(&link).await?;
            }
        }

        self.get(user_id).await
    }

    pub async fn remove(&self, user_id: i64) -> Result<(), ServiceError> {
        let current = self.get(user_id).await?;
        if let Some(link) = self.link(user_id).await? {
            self.store.delete_entity(&link).await?;
        }
        self.store.delete_entity(&current.address).await?;
        info!("Removed address {} of user {}", current.address.id, user_id);
        Ok(())
    }
}

fn apply(address: &mut Address, input: &AddressInput) {
    address.country = input.country.trim().to_string();
    address.city = input.city.trim().to_string();
    address.latitude = input.latitude;
    address.longitude = input.longitude;
    address.street = input.street.trim().to_string();
    address.full_address = input.full_address.trim().to_string();
}

fn validate_coordinates(input: &AddressInput) -> Result<(), ServiceError> {
    if !(-90.0..=90.0).contains(&input.latitude) {
        return Err(ServiceError::validation("latitude", "Latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&input.longitude) {
        return Err(ServiceError::validation("longitude", "Longitude must be between -180 and 180"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{row, FakeStore, Reply};
    use serde_json::json;

    fn address_row() -> Reply {
        Reply::Row(Some(row(json!({
            "id": 12,
            "created_at": "2024-01-01T00:00:00+00:00",
            "updated_at": null,
            "deleted_at": null,
            "country": "Mali",
            "city": "Bamako",
            "latitude": 12.65,
            "longitude": -8.0,
            "street": "Rue 10",
            "full_address": "Rue 10, Bamako",
            "xid": "c0ffee",
            "address_type": "home"
        }))))
    }

    fn link_row() -> Reply {
        Reply::Row(Some(row(json!({ "id": 3, "user_id": 5, "address_id": 12, "address_type": "home" }))))
    }

    fn input() -> AddressInput {
        AddressInput {
            country: "Mali".into(),
            city: " Bamako ".into(),
            latitude: 12.65,
            longitude: -8.0,
            street: "Rue 10".into(),
            full_address: "Rue 10, Bamako".into(),
            address_type: None,
        }
    }

    #[tokio::test]
    async fn test_second_address_conflicts() {
        let store = Arc::new(FakeStore::new(|_| link_row()));
        let err = AddressService::new(store.clone()).create(5, input()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.count_matching("INSERT"), 0);
    }

    #[tokio::test]
    async fn test_create_links_address() {
        let store = Arc::new(FakeStore::new(|stmt| {
            if stmt.sql.starts_with("SELECT * FROM \"user_address\"") {
                Reply::Row(None)
            } else if stmt.sql.starts_with("INSERT INTO \"address\"") {
                Reply::Inserted(12)
            } else if stmt.sql.starts_with("INSERT INTO \"user_address\"") {
                Reply::Inserted(3)
            } else {
                address_row()
            }
        }));
        let view = AddressService::new(store.clone()).create(5, input()).await.unwrap();
        assert_eq!(view.address.id, 12);
        assert_eq!(view.address_type, "home");

        let statements = store.statements();
        let address_insert = statements.iter().find(|s| s.sql.starts_with("INSERT INTO \"address\"")).unwrap();
        assert_eq!(address_insert.params[1].as_str(), Some("Bamako"));
        let link_insert = statements.iter().find(|s| s.sql.starts_with("INSERT INTO \"user_address\"")).unwrap();
        assert_eq!(link_insert.params[0].as_i64(), Some(5));
        assert_eq!(link_insert.params[1].as_i64(), Some(12));
        assert_eq!(link_insert.params[2].as_str(), Some(DEFAULT_ADDRESS_TYPE));
    }

    #[tokio::test]
    async fn test_get_without_address_is_not_found() {
        let store = Arc::new(FakeStore::new(|_| Reply::Row(None)));
        let err = AddressService::new(store).get(5).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_targets_own_address() {
        let store = Arc::new(FakeStore::new(|stmt| {
            if stmt.sql.starts_with("UPDATE") {
                Reply::Affected(1)
            } else {
                address_row()
            }
        }));
        let mut changed = input();
        changed.city = "Kayes".into();
        AddressService::new(store.clone()).update(5, changed).await.unwrap();

        let update = store.statements().into_iter().find(|s| s.sql.starts_with("UPDATE")).unwrap();
        assert_eq!(update.params[1].as_str(), Some("Kayes"));
        assert_eq!(update.params[6].as_str(), Some("c0ffee"));
        assert_eq!(update.params.last().and_then(|p| p.as_i64()), Some(12));
    }

    #[tokio::test]
    async fn test_remove_deletes_link_and_address() {
        let store = Arc::new(FakeStore::new(|stmt| {
            if stmt.sql.starts_with("DELETE") {
                Reply::Affected(1)
            } else if stmt.sql.starts_with("SELECT * FROM \"user_address\"") {
                link_row()
            } else {
                address_row()
            }
        }));
        AddressService::new(store.clone()).remove(5).await.unwrap();
        assert_eq!(store.count_matching("DELETE FROM \"user_address\""), 1);
        assert_eq!(store.count_matching("DELETE FROM \"address\""), 1);
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let mut bad = input();
        bad.latitude = 91.0;
        assert!(validate_coordinates(&bad).is_err());
    }
}
