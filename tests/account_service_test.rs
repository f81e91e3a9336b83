mod common;

use common::TestApp;
use storefront_api::{
    errors::ServiceError,
    services::users::{AddressInput, LoginInput, RegisterUserInput, UpdateAddressInput},
};

fn register_input(email: &str) -> RegisterUserInput {
    RegisterUserInput {
        email: email.to_string(),
        username: email.split('@').next().unwrap_or("user").to_string(),
        first_name: "Ana".to_string(),
        last_name: "Souza".to_string(),
        phone: None,
        password: "correct horse battery staple".to_string(),
        birth_date: None,
    }
}

fn address_input(label: &str, is_default: bool) -> AddressInput {
    AddressInput {
        label: label.to_string(),
        street: "Av. Paulista".to_string(),
        number: "1000".to_string(),
        complement: None,
        neighborhood: "Bela Vista".to_string(),
        city: "Sao Paulo".to_string(),
        state: "SP".to_string(),
        zip_code: "01310-100".to_string(),
        is_default,
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn register_normalizes_email_and_hashes_password() {
    let app = TestApp::new().await;
    let users = app.state.services.users.clone();

    let user = users
        .register(register_input("Ana@Example.com"))
        .await
        .expect("registration should succeed");

    assert_eq!(user.email, "ana@example.com");
    assert!(user.password_hash.starts_with("$argon2"));
    assert!(user.is_active);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::new().await;
    let users = app.state.services.users.clone();

    users
        .register(register_input("ana@example.com"))
        .await
        .expect("first registration should succeed");

    let err = users
        .register(register_input("ANA@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn login_returns_a_bearer_token() {
    let app = TestApp::new().await;
    let users = app.state.services.users.clone();

    users
        .register(register_input("ana@example.com"))
        .await
        .expect("registration");

    let output = users
        .authenticate(LoginInput {
            email: "ana@example.com".to_string(),
            password: "correct horse battery staple".to_string(),
        })
        .await
        .expect("login should succeed");

    assert_eq!(output.token_type, "Bearer");
    assert!(!output.access_token.is_empty());
    assert_eq!(output.user.email, "ana@example.com");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn wrong_password_is_rejected_without_detail() {
    let app = TestApp::new().await;
    let users = app.state.services.users.clone();

    users
        .register(register_input("ana@example.com"))
        .await
        .expect("registration");

    let err = users
        .authenticate(LoginInput {
            email: "ana@example.com".to_string(),
            password: "wrong password".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AuthError(_)));

    // Unknown account fails the same way.
    let err = users
        .authenticate(LoginInput {
            email: "nobody@example.com".to_string(),
            password: "whatever password".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AuthError(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn a_new_default_address_clears_the_previous_default() {
    let app = TestApp::new().await;
    let users = app.state.services.users.clone();

    let user = users
        .register(register_input("ana@example.com"))
        .await
        .expect("registration");

    let home = users
        .create_address(user.id, address_input("Home", true))
        .await
        .expect("home address");
    assert!(home.is_default);

    let office = users
        .create_address(user.id, address_input("Office", true))
        .await
        .expect("office address");
    assert!(office.is_default);

    let addresses = users.list_addresses(user.id).await.expect("addresses");
    assert_eq!(addresses.len(), 2);

    let default_ids: Vec<_> = addresses
        .iter()
        .filter(|a| a.is_default)
        .map(|a| a.id)
        .collect();
    assert_eq!(default_ids, vec![office.id]);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn promoting_an_address_via_update_keeps_one_default() {
    let app = TestApp::new().await;
    let users = app.state.services.users.clone();

    let user = users
        .register(register_input("ana@example.com"))
        .await
        .expect("registration");

    let home = users
        .create_address(user.id, address_input("Home", true))
        .await
        .expect("home address");
    let office = users
        .create_address(user.id, address_input("Office", false))
        .await
        .expect("office address");

    users
        .update_address(
            user.id,
            office.id,
            UpdateAddressInput {
                label: None,
                street: None,
                number: None,
                complement: None,
                neighborhood: None,
                city: None,
                state: None,
                zip_code: None,
                is_default: Some(true),
            },
        )
        .await
        .expect("promotion should succeed");

    let addresses = users.list_addresses(user.id).await.expect("addresses");
    let default_ids: Vec<_> = addresses
        .iter()
        .filter(|a| a.is_default)
        .map(|a| a.id)
        .collect();
    assert_eq!(default_ids, vec![office.id]);

    let home_after = addresses
        .iter()
        .find(|a| a.id == home.id)
        .expect("home address still listed");
    assert!(!home_after.is_default);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn addresses_are_scoped_to_their_owner() {
    let app = TestApp::new().await;
    let users = app.state.services.users.clone();

    let ana = users
        .register(register_input("ana@example.com"))
        .await
        .expect("ana");
    let bruno = users
        .register(register_input("bruno@example.com"))
        .await
        .expect("bruno");

    let address = users
        .create_address(ana.id, address_input("Home", false))
        .await
        .expect("address");

    let err = users.delete_address(bruno.id, address.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    users
        .delete_address(ana.id, address.id)
        .await
        .expect("owner can delete");

    let remaining = users.list_addresses(ana.id).await.expect("addresses");
    assert!(remaining.is_empty());
}
