//! Test support for the Fernway storefront client.
//!
//! [`MockBackend`] is an in-process axum server speaking the Fernway REST
//! surface - envelope responses, bearer auth, the multipart form endpoints -
//! over in-memory state, bound to an ephemeral port. [`TestContext`] wires a
//! throwaway session store and a full [`Services`] bundle against it, so the
//! suites in `tests/` exercise the real client end to end with no external
//! dependencies.

// Test support crate: panicking on broken fixtures is the right behavior.
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use fernway_core::{
    AddressId, Email, OrderId, OrderStatus, PaymentId, PaymentStatus, Price, ProductId,
    ShippingMethodId, SizeId, UserId,
};
use fernway_storefront::config::{Environment, StorefrontConfig};
use fernway_storefront::models::{
    Order, Payment, Product, ProductSize, ShippingAddress, ShippingMethod, User,
};
use fernway_storefront::services::Services;
use fernway_storefront::session::SessionStore;

// =============================================================================
// Backend state
// =============================================================================

struct Account {
    user: User,
    password: String,
    blocked: bool,
}

#[derive(Default)]
struct BackendState {
    accounts: Vec<Account>,
    tokens: HashMap<String, UserId>,
    addresses: HashMap<UserId, Vec<ShippingAddress>>,
    products: Vec<Product>,
    methods: Vec<ShippingMethod>,
    orders: Vec<(UserId, Order)>,
    payments: Vec<(UserId, Payment)>,
    next_user_id: i64,
    next_address_id: i64,
    next_order_id: i64,
    fail_next_order: Option<String>,
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// MockBackend
// =============================================================================

/// An in-process Fernway backend for tests.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
}

impl MockBackend {
    /// Start the mock backend on an ephemeral port with a seeded catalog.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(seeded_state()));

        let router = Router::new()
            .route("/auth/login", post(auth_login))
            .route("/auth/register", post(auth_register))
            .route("/user/profile", get(user_profile))
            .route("/user/edit", post(user_edit))
            .route("/shipping/get", get(shipping_get))
            .route("/shipping/add", post(shipping_add))
            .route("/shipping/edit/{id}", post(shipping_edit))
            .route("/shipping/delete/{id}", get(shipping_delete))
            .route("/shipping/methods", get(shipping_methods))
            .route("/freshorder/create", post(order_create))
            .route("/orders/{id}", get(order_get))
            .route("/product/{id}", get(product_get))
            .route("/payments/get", get(payments_get))
            .route("/payment/status/{id}", get(payment_status))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve mock backend");
        });

        Self { addr, state }
    }

    /// Base URL for client configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Seed an account and return its user record.
    pub fn seed_account(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        phone: &str,
    ) -> User {
        let mut s = lock(&self.state);
        s.next_user_id += 1;
        let user = User {
            id: UserId::new(s.next_user_id),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email: Email::parse(email).unwrap(),
            phone: phone.to_owned(),
        };
        s.accounts.push(Account {
            user: user.clone(),
            password: password.to_owned(),
            blocked: false,
        });
        user
    }

    /// Mark an account blocked; its auth attempts answer HTTP 403.
    pub fn block_account(&self, email: &str) {
        let mut s = lock(&self.state);
        if let Some(account) = s.accounts.iter_mut().find(|a| a.user.email.as_str() == email) {
            account.blocked = true;
        }
    }

    /// Invalidate every issued token; the next authenticated call answers
    /// HTTP 401.
    pub fn revoke_tokens(&self) {
        lock(&self.state).tokens.clear();
    }

    /// Make the next order creation fail with a business error.
    pub fn fail_next_order(&self, message: &str) {
        lock(&self.state).fail_next_order = Some(message.to_owned());
    }

    /// Number of orders the backend has accepted.
    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.state).orders.len()
    }

    /// The seeded demo product.
    #[must_use]
    pub fn demo_product_id(&self) -> ProductId {
        ProductId::new(12)
    }
}

fn seeded_state() -> BackendState {
    BackendState {
        products: vec![Product {
            id: ProductId::new(12),
            name: "High Garden Oolong".to_owned(),
            description: "Rolled oolong from high-elevation spring pluck.".to_owned(),
            image: Some("/img/oolong.jpg".to_owned()),
            stock: 10,
            sizes: vec![
                ProductSize {
                    id: SizeId::new(1),
                    name: "50g".to_owned(),
                    weight: 50,
                    price: Price::from_cents(1400),
                },
                ProductSize {
                    id: SizeId::new(2),
                    name: "100g".to_owned(),
                    weight: 100,
                    price: Price::from_cents(2600),
                },
            ],
        }],
        methods: vec![
            ShippingMethod {
                id: ShippingMethodId::new(1),
                title: "Standard".to_owned(),
                description: "3-5 business days".to_owned(),
                price: Price::from_cents(450),
            },
            ShippingMethod {
                id: ShippingMethodId::new(2),
                title: "Express".to_owned(),
                description: "Next business day".to_owned(),
                price: Price::from_cents(1200),
            },
        ],
        next_user_id: 100,
        next_address_id: 500,
        next_order_id: 900,
        ..BackendState::default()
    }
}

// =============================================================================
// Envelope helpers
// =============================================================================

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "code": 200, "message": "ok", "data": data, "errors": [] }))
}

fn business_err(code: u16, message: &str) -> Json<Value> {
    Json(json!({ "code": code, "message": message, "data": null, "errors": [message] }))
}

fn authed(s: &BackendState, headers: &HeaderMap) -> Option<UserId> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    s.tokens.get(token).copied()
}

async fn form_fields(mut multipart: Multipart) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        if let Ok(text) = field.text().await {
            fields.insert(name, text);
        }
    }
    fields
}

// =============================================================================
// Auth handlers
// =============================================================================

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn auth_login(State(state): State<Shared>, Json(body): Json<LoginRequest>) -> Response {
    let mut s = lock(&state);

    let Some(account) = s.accounts.iter().find(|a| a.user.email.as_str() == body.email) else {
        return business_err(401, "Invalid email or password").into_response();
    };
    if account.blocked {
        return StatusCode::FORBIDDEN.into_response();
    }
    if account.password != body.password {
        return business_err(401, "Invalid email or password").into_response();
    }

    let user = account.user.clone();
    let token = Uuid::new_v4().to_string();
    s.tokens.insert(token.clone(), user.id);

    ok(json!({ "token": token, "user": user })).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    password: String,
}

async fn auth_register(State(state): State<Shared>, Json(body): Json<RegisterRequest>) -> Response {
    let mut s = lock(&state);

    if s.accounts.iter().any(|a| a.user.email.as_str() == body.email) {
        return business_err(409, "An account with this email already exists").into_response();
    }
    let Ok(email) = Email::parse(&body.email) else {
        return business_err(422, "Invalid email address").into_response();
    };

    s.next_user_id += 1;
    let user = User {
        id: UserId::new(s.next_user_id),
        first_name: body.first_name,
        last_name: body.last_name,
        email,
        phone: body.phone,
    };
    s.accounts.push(Account {
        user: user.clone(),
        password: body.password,
        blocked: false,
    });

    let token = Uuid::new_v4().to_string();
    s.tokens.insert(token.clone(), user.id);

    ok(json!({ "token": token, "user": user })).into_response()
}

async fn user_profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Some(account) = s.accounts.iter().find(|a| a.user.id == uid) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    ok(json!(account.user)).into_response()
}

async fn user_edit(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let fields = form_fields(multipart).await;
    let mut s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let Some(account) = s.accounts.iter_mut().find(|a| a.user.id == uid) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    if let Some(first) = fields.get("first_name") {
        account.user.first_name = first.clone();
    }
    if let Some(last) = fields.get("last_name") {
        account.user.last_name = last.clone();
    }
    if let Some(email) = fields.get("email")
        && let Ok(parsed) = Email::parse(email)
    {
        account.user.email = parsed;
    }
    if let Some(phone) = fields.get("phone_number") {
        account.user.phone = phone.clone();
    }

    ok(json!(account.user)).into_response()
}

// =============================================================================
// Shipping handlers
// =============================================================================

async fn shipping_get(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let list = s.addresses.get(&uid).cloned().unwrap_or_default();
    ok(json!(list)).into_response()
}

fn address_from_fields(fields: &HashMap<String, String>, id: AddressId, is_default: bool) -> ShippingAddress {
    ShippingAddress {
        id,
        address: fields.get("address").cloned().unwrap_or_default(),
        city: fields.get("city").cloned().unwrap_or_default(),
        zipcode: fields.get("zipcode").cloned().unwrap_or_default(),
        country: fields.get("country").cloned().unwrap_or_default(),
        shipping_method: fields
            .get("shipping_method")
            .and_then(|m| m.parse::<i64>().ok())
            .map(ShippingMethodId::new),
        is_default,
    }
}

async fn shipping_add(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let fields = form_fields(multipart).await;
    let mut s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    s.next_address_id += 1;
    let id = AddressId::new(s.next_address_id);
    let entry = s.addresses.entry(uid).or_default();
    // First saved address becomes the default.
    let created = address_from_fields(&fields, id, entry.is_empty());
    entry.push(created.clone());

    ok(json!(created)).into_response()
}

async fn shipping_edit(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let fields = form_fields(multipart).await;
    let mut s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let Some(list) = s.addresses.get_mut(&uid) else {
        return business_err(404, "No such address").into_response();
    };
    let Some(saved) = list.iter_mut().find(|a| a.id == AddressId::new(id)) else {
        return business_err(404, "No such address").into_response();
    };

    let updated = address_from_fields(&fields, saved.id, saved.is_default);
    *saved = updated.clone();

    ok(json!(updated)).into_response()
}

async fn shipping_delete(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let mut s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let Some(list) = s.addresses.get_mut(&uid) else {
        return business_err(404, "No such address").into_response();
    };
    let before = list.len();
    list.retain(|a| a.id != AddressId::new(id));
    if list.len() == before {
        return business_err(404, "No such address").into_response();
    }

    ok(Value::Null).into_response()
}

async fn shipping_methods(State(state): State<Shared>) -> Response {
    let s = lock(&state);
    ok(json!(s.methods)).into_response()
}

// =============================================================================
// Order and payment handlers
// =============================================================================

async fn order_create(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let fields = form_fields(multipart).await;
    let mut s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    if let Some(message) = s.fail_next_order.take() {
        return business_err(422, &message).into_response();
    }

    let product_id = fields
        .get("productID")
        .and_then(|v| v.parse::<i64>().ok())
        .map(ProductId::new);
    let quantity = fields.get("quantity").and_then(|v| v.parse::<u32>().ok());
    let size_index = fields.get("size_index").and_then(|v| v.parse::<usize>().ok());
    let address_id = fields
        .get("shipping_address")
        .and_then(|v| v.parse::<i64>().ok())
        .map(AddressId::new);
    let method_id = fields
        .get("shipping_method")
        .and_then(|v| v.parse::<i64>().ok())
        .map(ShippingMethodId::new);

    let (Some(product_id), Some(quantity), Some(size_index), Some(address_id), Some(method_id)) =
        (product_id, quantity, size_index, address_id, method_id)
    else {
        return business_err(422, "Missing order fields").into_response();
    };

    let Some(product) = s.products.iter().find(|p| p.id == product_id) else {
        return business_err(404, "No such product").into_response();
    };
    let Some(size) = product.sizes.get(size_index) else {
        return business_err(422, "No such size").into_response();
    };
    if quantity == 0 || quantity > product.stock {
        return business_err(422, "Out of stock").into_response();
    }
    let product_name = product.name.clone();
    let unit_price = size.price;

    if !s
        .addresses
        .get(&uid)
        .is_some_and(|list| list.iter().any(|a| a.id == address_id))
    {
        return business_err(422, "Unknown shipping address").into_response();
    }
    let Some(method) = s.methods.iter().find(|m| m.id == method_id) else {
        return business_err(422, "Unknown shipping method").into_response();
    };
    let method_price = method.price;

    s.next_order_id += 1;
    let order = Order {
        id: OrderId::new(s.next_order_id),
        product_name,
        quantity,
        total: unit_price * quantity + method_price,
        status: OrderStatus::Pending,
        created_at: Utc::now(),
    };
    let payment = Payment {
        id: PaymentId::new(s.next_order_id),
        order_id: order.id,
        amount: order.total,
        status: PaymentStatus::Paid,
        created_at: Utc::now(),
    };

    s.orders.push((uid, order.clone()));
    s.payments.push((uid, payment));

    ok(json!(order)).into_response()
}

async fn order_get(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    s.orders
        .iter()
        .find(|(owner, order)| *owner == uid && order.id == OrderId::new(id))
        .map_or_else(
            || business_err(404, "No such order").into_response(),
            |(_, order)| ok(json!(order)).into_response(),
        )
}

async fn product_get(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let s = lock(&state);
    s.products
        .iter()
        .find(|p| p.id == ProductId::new(id))
        .map_or_else(
            || business_err(404, "No such product").into_response(),
            |product| ok(json!(product)).into_response(),
        )
}

async fn payments_get(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let list: Vec<&Payment> = s
        .payments
        .iter()
        .filter(|(owner, _)| *owner == uid)
        .map(|(_, payment)| payment)
        .collect();
    ok(json!(list)).into_response()
}

async fn payment_status(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let s = lock(&state);
    let Some(uid) = authed(&s, &headers) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    s.payments
        .iter()
        .find(|(owner, payment)| *owner == uid && payment.id == PaymentId::new(id))
        .map_or_else(
            || business_err(404, "No such payment").into_response(),
            |(_, payment)| ok(json!(payment)).into_response(),
        )
}

// =============================================================================
// TestContext
// =============================================================================

/// A mock backend plus a real client wired against it.
pub struct TestContext {
    pub backend: MockBackend,
    pub services: Services,
    pub session_file: PathBuf,
}

impl TestContext {
    /// Spin up a backend and a client with a throwaway session store.
    pub async fn new() -> Self {
        let backend = MockBackend::spawn().await;

        let session_file = std::env::temp_dir()
            .join("fernway-tests")
            .join(format!("session-{}.json", Uuid::new_v4()));

        let config = StorefrontConfig {
            api_base_url: backend.base_url().parse().unwrap(),
            timeout: std::time::Duration::from_secs(10),
            environment: Environment::Development,
            session_file: session_file.clone(),
        };

        let session = SessionStore::open_at(&config.session_file).unwrap();
        let services = Services::new(&config, session).unwrap();

        Self {
            backend,
            services,
            session_file,
        }
    }

    /// The shared session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        self.services.session()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.session_file);
    }
}
