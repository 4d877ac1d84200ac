//! Authentication and session-lifecycle tests against the mock backend.

use secrecy::ExposeSecret;

use fernway_integration_tests::TestContext;
use fernway_storefront::api::ApiError;

#[tokio::test]
async fn test_login_writes_session() {
    let ctx = TestContext::new().await;
    ctx.backend
        .seed_account("mira@example.com", "hunter2", "Mira", "Holt", "2345550123");

    let user = ctx
        .services
        .auth()
        .login("mira@example.com", "hunter2")
        .await
        .expect("login");

    assert_eq!(user.first_name, "Mira");
    assert!(ctx.session().is_authenticated());
    assert!(!ctx.session().token().expect("token").expose_secret().is_empty());
    assert_eq!(
        ctx.session().user().expect("user snapshot").email.as_str(),
        "mira@example.com"
    );
}

#[tokio::test]
async fn test_login_bad_credentials_is_business_error() {
    let ctx = TestContext::new().await;
    ctx.backend
        .seed_account("mira@example.com", "hunter2", "Mira", "Holt", "2345550123");

    let err = ctx
        .services
        .auth()
        .login("mira@example.com", "wrong")
        .await
        .expect_err("login should fail");

    match err {
        ApiError::Backend { code, message, .. } => {
            assert_eq!(code, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!ctx.session().is_authenticated());
}

#[tokio::test]
async fn test_blocked_account_has_distinct_error() {
    let ctx = TestContext::new().await;
    ctx.backend
        .seed_account("mira@example.com", "hunter2", "Mira", "Holt", "2345550123");
    ctx.backend.block_account("mira@example.com");

    let err = ctx
        .services
        .auth()
        .login("mira@example.com", "hunter2")
        .await
        .expect_err("blocked login should fail");

    assert!(matches!(err, ApiError::AccountBlocked));
    assert!(err.user_message().contains("blocked"));
}

#[tokio::test]
async fn test_register_sets_session_and_rejects_duplicates() {
    let ctx = TestContext::new().await;

    let account = fernway_storefront::models::NewAccount {
        first_name: "Theo".to_owned(),
        last_name: "Sand".to_owned(),
        email: "theo@example.com".to_owned(),
        phone: "2345550188".to_owned(),
        password: "correct horse".to_owned(),
    };

    let user = ctx.services.auth().register(&account).await.expect("register");
    assert_eq!(user.display_name(), "Theo Sand");
    assert!(ctx.session().is_authenticated());

    let err = ctx
        .services
        .auth()
        .register(&account)
        .await
        .expect_err("duplicate email should fail");
    match err {
        ApiError::Backend { code, .. } => assert_eq!(code, 409),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_call_clears_session() {
    let ctx = TestContext::new().await;
    ctx.backend
        .seed_account("mira@example.com", "hunter2", "Mira", "Holt", "2345550123");

    ctx.services
        .auth()
        .login("mira@example.com", "hunter2")
        .await
        .expect("login");
    assert!(ctx.session().is_authenticated());

    // The backend forgets the token; the next authenticated call answers
    // 401 and the client drops its session as a side effect of that call.
    ctx.backend.revoke_tokens();

    let err = ctx
        .services
        .shipping()
        .addresses()
        .await
        .expect_err("revoked token should 401");
    assert!(matches!(err, ApiError::Unauthorized));

    assert!(ctx.session().token().is_none());
    assert!(ctx.session().user().is_none());
}

#[tokio::test]
async fn test_profile_edit_refreshes_session_snapshot() {
    let ctx = TestContext::new().await;
    ctx.backend
        .seed_account("mira@example.com", "hunter2", "Mira", "Holt", "2345550123");
    ctx.services
        .auth()
        .login("mira@example.com", "hunter2")
        .await
        .expect("login");

    let info = fernway_storefront::models::PersonalInfo {
        first_name: "Mira".to_owned(),
        last_name: "Holt-Vance".to_owned(),
        email: "mira@example.com".to_owned(),
        phone: "2345550199".to_owned(),
    };

    let updated = ctx
        .services
        .auth()
        .update_profile(&info)
        .await
        .expect("update profile");
    assert_eq!(updated.last_name, "Holt-Vance");

    let snapshot = ctx.session().user().expect("snapshot");
    assert_eq!(snapshot.last_name, "Holt-Vance");
    assert_eq!(snapshot.phone, "2345550199");
}

#[tokio::test]
async fn test_profile_fetch_roundtrip() {
    let ctx = TestContext::new().await;
    ctx.backend
        .seed_account("mira@example.com", "hunter2", "Mira", "Holt", "2345550123");
    ctx.services
        .auth()
        .login("mira@example.com", "hunter2")
        .await
        .expect("login");

    let profile = ctx.services.auth().profile().await.expect("profile");
    assert_eq!(profile.email.as_str(), "mira@example.com");
}
