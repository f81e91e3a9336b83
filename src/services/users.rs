use crate::{
    config::AppConfig,
    entities::{address, user, Address, AddressModel, User, UserModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Account service: registration, login, profile, and shipping addresses.
///
/// Address writes maintain the single-default invariant: saving an address
/// with the default flag set clears the flag on the user's other addresses
/// inside the same transaction.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl UserService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Registers a new account. The email address is the login identity and
    /// must be unique.
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterUserInput) -> Result<UserModel, ServiceError> {
        self.ensure_unique_email(&input.email).await?;

        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let user = user::ActiveModel {
            id: Set(user_id),
            email: Set(input.email.to_lowercase()),
            username: Set(input.username),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            phone: Set(input.phone),
            password_hash: Set(hash_password(&input.password)?),
            birth_date: Set(input.birth_date),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let user = user.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserRegistered(user_id))
            .await;

        info!("Registered user: {}", user_id);
        Ok(user)
    }

    /// Verifies credentials and issues a signed login token.
    #[instrument(skip(self, input))]
    pub async fn authenticate(&self, input: LoginInput) -> Result<LoginOutput, ServiceError> {
        let user = User::find()
            .filter(user::Column::Email.eq(input.email.to_lowercase()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::AuthError("invalid email or password".to_string()))?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(ServiceError::AuthError(
                "invalid email or password".to_string(),
            ));
        }

        if !user.is_active {
            return Err(ServiceError::AuthError("account is disabled".to_string()));
        }

        let expires_in = self.config.jwt_expiration as i64;
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(expires_in)).timestamp(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("token creation failed: {}", e)))?;

        info!("User logged in: {}", user.id);
        Ok(LoginOutput {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            user,
        })
    }

    /// Fetches a user by id.
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserModel, ServiceError> {
        User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }

    /// Updates profile fields; absent fields are left untouched.
    #[instrument(skip(self, input))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<UserModel, ServiceError> {
        let user = self.get_user(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(username) = input.username {
            active.username = Set(username);
        }
        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(birth_date) = input.birth_date {
            active.birth_date = Set(Some(birth_date));
        }
        active.updated_at = Set(Utc::now());

        let user = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UserUpdated(user_id))
            .await;

        Ok(user)
    }

    /// Lists a user's addresses, default first.
    pub async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<AddressModel>, ServiceError> {
        self.get_user(user_id).await?;

        Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_desc(address::Column::IsDefault)
            .order_by_asc(address::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    /// Creates an address. When the default flag is set, the user's previous
    /// default is cleared in the same transaction.
    #[instrument(skip(self, input))]
    pub async fn create_address(
        &self,
        user_id: Uuid,
        input: AddressInput,
    ) -> Result<AddressModel, ServiceError> {
        self.get_user(user_id).await?;

        let txn = self.db.begin().await?;

        if input.is_default {
            clear_default_address(&txn, user_id).await?;
        }

        let address_id = Uuid::new_v4();
        let address = address::ActiveModel {
            id: Set(address_id),
            user_id: Set(user_id),
            label: Set(input.label),
            street: Set(input.street),
            number: Set(input.number),
            complement: Set(input.complement),
            neighborhood: Set(input.neighborhood),
            city: Set(input.city),
            state: Set(input.state),
            zip_code: Set(input.zip_code),
            is_default: Set(input.is_default),
            created_at: Set(Utc::now()),
        };

        let address = address.insert(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AddressCreated {
                user_id,
                address_id,
            })
            .await;

        info!("Created address {} for user {}", address_id, user_id);
        Ok(address)
    }

    /// Updates an address owned by `user_id`. Setting the default flag
    /// clears the user's previous default in the same transaction.
    #[instrument(skip(self, input))]
    pub async fn update_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        input: UpdateAddressInput,
    ) -> Result<AddressModel, ServiceError> {
        let txn = self.db.begin().await?;

        let address = Address::find_by_id(address_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))?;

        if address.user_id != user_id {
            return Err(ServiceError::InvalidOperation(
                "Address does not belong to this user".to_string(),
            ));
        }

        if input.is_default == Some(true) && !address.is_default {
            clear_default_address(&txn, user_id).await?;
        }

        let mut active: address::ActiveModel = address.into();
        if let Some(label) = input.label {
            active.label = Set(label);
        }
        if let Some(street) = input.street {
            active.street = Set(street);
        }
        if let Some(number) = input.number {
            active.number = Set(number);
        }
        if let Some(complement) = input.complement {
            active.complement = Set(Some(complement));
        }
        if let Some(neighborhood) = input.neighborhood {
            active.neighborhood = Set(neighborhood);
        }
        if let Some(city) = input.city {
            active.city = Set(city);
        }
        if let Some(state) = input.state {
            active.state = Set(state);
        }
        if let Some(zip_code) = input.zip_code {
            active.zip_code = Set(zip_code);
        }
        if let Some(is_default) = input.is_default {
            active.is_default = Set(is_default);
        }

        let address = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AddressUpdated {
                user_id,
                address_id,
            })
            .await;

        Ok(address)
    }

    /// Deletes an address owned by `user_id`.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, user_id: Uuid, address_id: Uuid) -> Result<(), ServiceError> {
        let address = Address::find_by_id(address_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))?;

        if address.user_id != user_id {
            return Err(ServiceError::InvalidOperation(
                "Address does not belong to this user".to_string(),
            ));
        }

        address.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::AddressRemoved {
                user_id,
                address_id,
            })
            .await;

        info!("Deleted address {} for user {}", address_id, user_id);
        Ok(())
    }

    async fn ensure_unique_email(&self, email: &str) -> Result<(), ServiceError> {
        let existing = User::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(&*self.db)
            .await?;

        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Email {} is already registered",
                email
            )));
        }

        Ok(())
    }
}

/// Clears the default flag on every address of `user_id` as a single
/// statement, so the set that follows leaves exactly one default row.
async fn clear_default_address(
    conn: &impl sea_orm::ConnectionTrait,
    user_id: Uuid,
) -> Result<(), ServiceError> {
    Address::update_many()
        .col_expr(address::Column::IsDefault, Expr::value(false))
        .filter(address::Column::UserId.eq(user_id))
        .filter(address::Column::IsDefault.eq(true))
        .exec(conn)
        .await?;
    Ok(())
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ServiceError::InternalError(format!("stored hash is malformed: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// JWT claims carried by login tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Input for registering a user
#[derive(Debug, Deserialize)]
pub struct RegisterUserInput {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub password: String,
    pub birth_date: Option<NaiveDate>,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful login payload
#[derive(Debug, Serialize)]
pub struct LoginOutput {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserModel,
}

/// Input for updating profile fields
#[derive(Debug, Deserialize)]
pub struct UpdateProfileInput {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Input for creating an address
#[derive(Debug, Deserialize)]
pub struct AddressInput {
    pub label: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Input for updating an address
#[derive(Debug, Deserialize)]
pub struct UpdateAddressInput {
    pub label: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub is_default: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery staple", &hash).expect("verify"));
        assert!(!verify_password("wrong password", &hash).expect("verify"));
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        let err = verify_password("pw", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, ServiceError::InternalError(_)));
    }

    #[test]
    fn register_input_deserializes_with_optional_fields_absent() {
        let json = r#"{
            "email": "ana@example.com",
            "username": "ana",
            "first_name": "Ana",
            "last_name": "Souza",
            "password": "hunter2hunter2"
        }"#;

        let input: RegisterUserInput =
            serde_json::from_str(json).expect("deserialization should succeed");
        assert_eq!(input.email, "ana@example.com");
        assert!(input.phone.is_none());
        assert!(input.birth_date.is_none());
    }

    #[test]
    fn address_input_default_flag_defaults_to_false() {
        let json = r#"{
            "label": "Home",
            "street": "Av. Paulista",
            "number": "1000",
            "neighborhood": "Bela Vista",
            "city": "Sao Paulo",
            "state": "SP",
            "zip_code": "01310-100"
        }"#;

        let input: AddressInput =
            serde_json::from_str(json).expect("deserialization should succeed");
        assert!(!input.is_default);
    }
}
