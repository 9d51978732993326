use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use foodie_db::seed::seed_catalog;
use foodie_db::{Database, DbConfig};
use storefront_api::{build_router, ApiConfig, AppState};

// Seeded Bella Italia menu item ids
const BRUSCHETTA: i64 = 1;
const CARBONARA: i64 = 3;
const CALIFORNIA_ROLL: i64 = 5;

struct TestApp {
    router: Router,
}

impl TestApp {
    /// Seeded catalog, mock accounts, same router as prod.
    async fn spawn() -> Self {
        let db = Database::new(DbConfig::in_memory())
            .await
            .expect("failed to open in-memory database");
        seed_catalog(&db).await.expect("failed to seed catalog");

        let state = AppState::new(db, ApiConfig::default());
        TestApp {
            router: build_router(state),
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["accessToken"].as_str().unwrap().to_string()
    }

    async fn place_order(&self, token: &str, items: Value) -> (StatusCode, Value) {
        self.post(
            "/api/orders",
            Some(token),
            json!({
                "items": items,
                "deliveryAddress": {
                    "street": "1 Elm Street",
                    "city": "Springfield",
                    "state": "IL",
                    "zipCode": "62701"
                },
                "paymentMethod": "card"
            }),
        )
        .await
    }
}

// =============================================================================
// Health & Auth
// =============================================================================

#[tokio::test]
async fn health_reports_database_and_backend() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["schema"]["applied"], body["schema"]["expected"]);
    assert!(body["schema"]["applied"].as_u64().unwrap() >= 1);
    assert_eq!(body["authBackend"], "mock");
}

#[tokio::test]
async fn login_issues_token_pair() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "john@example.com", "password": "password" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "john@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert_eq!(body["tokenType"], "Bearer");
    assert!(body["refreshToken"].as_str().is_some());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "john@example.com", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = app
        .post("/api/auth/login", None, json!({ "email": "", "password": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and password are required");
}

#[tokio::test]
async fn register_then_me_and_refresh() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "username": "sam_lee",
                "name": "Sam Lee",
                "email": "Sam@Example.com",
                "password": "secret123"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["firstName"], "Sam");
    assert_eq!(body["user"]["lastName"], "Lee");
    assert_eq!(body["user"]["email"], "sam@example.com");

    let access = body["accessToken"].as_str().unwrap().to_string();
    let refresh = body["refreshToken"].as_str().unwrap().to_string();

    let (status, me) = app.get("/api/auth/me", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["username"], "sam_lee");

    // A refresh token is not an access token
    let (status, _) = app.get("/api/auth/me", Some(&refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, refreshed) = app
        .post("/api/auth/refresh", None, json!({ "refreshToken": refresh }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["user"]["email"], "sam@example.com");

    // Same email again
    let (status, _) = app
        .post(
            "/api/auth/register",
            None,
            json!({
                "username": "sam_two",
                "name": "Sam Two",
                "email": "sam@example.com",
                "password": "secret123"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn me_requires_token() {
    let app = TestApp::spawn().await;

    let (status, _) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/auth/me", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn restaurant_listing_filters() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/api/restaurants", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 8);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 12);
    assert_eq!(body["totalPages"], 1);

    let (_, body) = app.get("/api/restaurants?cuisine=Italian,Thai", None).await;
    assert_eq!(body["total"], 2);

    let (_, body) = app.get("/api/restaurants?cuisine=all", None).await;
    assert_eq!(body["total"], 8);

    let (_, body) = app.get("/api/restaurants?featured=true", None).await;
    assert_eq!(body["total"], 3);

    let (_, body) = app.get("/api/restaurants?limit=3&page=2", None).await;
    assert_eq!(body["restaurants"].as_array().unwrap().len(), 3);
    assert_eq!(body["totalPages"], 3);

    let (status, _) = app.get("/api/restaurants?minRating=7", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn restaurant_by_slug_or_id_with_menu() {
    let app = TestApp::spawn().await;

    let (status, by_slug) = app.get("/api/restaurants/bella-italia", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["name"], "Bella Italia");
    assert_eq!(by_slug["deliveryFee"], 299);

    let (_, by_id) = app.get("/api/restaurants/1", None).await;
    assert_eq!(by_id["slug"], "bella-italia");

    let (status, menu) = app.get("/api/restaurants/bella-italia/menu", None).await;
    assert_eq!(status, StatusCode::OK);
    let categories = menu["categories"].as_array().unwrap();
    assert_eq!(categories[0]["name"], "Appetizers");
    assert_eq!(categories[0]["items"][0]["name"], "Bruschetta");
    assert_eq!(categories[0]["items"][0]["price"], 899);

    let (status, body) = app.get("/api/restaurants/no-such-place", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Restaurant not found");
}

// =============================================================================
// Cart & Promotions
// =============================================================================

#[tokio::test]
async fn quote_applies_welcome_promotion() {
    let app = TestApp::spawn().await;

    let (status, quote) = app
        .post(
            "/api/cart/quote",
            None,
            json!({
                "items": [
                    { "menuItemId": CARBONARA, "quantity": 2 },
                    { "menuItemId": BRUSCHETTA, "quantity": 1 }
                ],
                "promoCode": "welcome20"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["restaurantId"], 1);
    assert_eq!(quote["subtotal"], 4297);
    assert_eq!(quote["deliveryFee"], 299);
    assert_eq!(quote["discount"], 859);
    assert_eq!(quote["tax"], 344);
    assert_eq!(quote["total"], 4297 + 299 + 344 - 859);
    assert_eq!(quote["promotion"]["code"], "WELCOME20");
    assert_eq!(quote["items"][0]["lineTotal"], 3398);
    assert_eq!(quote["meetsMinimum"], true);
}

#[tokio::test]
async fn quote_rejects_bad_carts() {
    let app = TestApp::spawn().await;

    // Two restaurants in one cart
    let (status, body) = app
        .post(
            "/api/cart/quote",
            None,
            json!({ "items": [
                { "menuItemId": BRUSCHETTA, "quantity": 1 },
                { "menuItemId": CALIFORNIA_ROLL, "quantity": 1 }
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = app
        .post("/api/cart/quote", None, json!({ "items": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/cart/quote",
            None,
            json!({ "items": [{ "menuItemId": 9999, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post(
            "/api/cart/quote",
            None,
            json!({
                "items": [{ "menuItemId": CARBONARA, "quantity": 1 }],
                "promoCode": "NOPE"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired promo code");
}

#[tokio::test]
async fn promotion_validation() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post(
            "/api/promotions/validate",
            None,
            json!({ "code": "WELCOME20", "orderTotal": 3000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["promotion"]["discountType"], "percentage");
    assert_eq!(body["promotion"]["discountAmount"], 600);
    assert_eq!(body["promotion"]["minOrder"], 1500);

    let (status, body) = app
        .post(
            "/api/promotions/validate",
            None,
            json!({ "code": "WELCOME20", "orderTotal": 1000 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_promo");

    let (status, body) = app
        .post(
            "/api/promotions/validate",
            None,
            json!({ "code": "", "orderTotal": 1000 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Code and order total are required");

    let (status, body) = app
        .post(
            "/api/promotions/validate",
            None,
            json!({ "code": "WELCOME20", "orderTotal": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Code and order total are required");

    let (status, body) = app
        .post(
            "/api/promotions/validate",
            None,
            json!({ "code": "WELCOME20", "orderTotal": -500 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_ne!(body["message"], "Code and order total are required");

    let (status, body) = app.get("/api/promotions?active=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["promotions"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn checkout_and_track_order() {
    let app = TestApp::spawn().await;
    let john = app.login("john@example.com", "password").await;

    let (status, _) = app
        .place_order("", json!([{ "menuItemId": CARBONARA, "quantity": 1 }]))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, placed) = app
        .place_order(
            &john,
            json!([
                { "menuItemId": CARBONARA, "quantity": 2, "specialInstructions": "extra pepper" },
                { "menuItemId": BRUSCHETTA, "quantity": 1 }
            ]),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["success"], true);

    let order = &placed["order"];
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["userId"], "1");
    assert_eq!(order["total"], 4297 + 299 + 344);
    assert_eq!(order["restaurant"]["name"], "Bella Italia");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert!(order["orderNumber"].as_str().unwrap().starts_with("ORD-"));

    let id = order["id"].as_i64().unwrap();

    let (status, detail) = app.get(&format!("/api/orders/{id}"), Some(&john)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["statusHistory"][0]["status"], "confirmed");

    let (status, list) = app.get("/api/orders", Some(&john)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);

    // Another customer cannot see it
    let jane = app.login("jane@example.com", "password").await;
    let (status, _) = app.get(&format!("/api/orders/{id}"), Some(&jane)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, list) = app.get("/api/orders", Some(&jane)).await;
    assert_eq!(list["total"], 0);

    let (status, _) = app.get("/api/orders?userId=1", Some(&jane)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn checkout_enforces_restaurant_minimum() {
    let app = TestApp::spawn().await;
    let john = app.login("john@example.com", "password").await;

    let (status, quote) = app
        .post(
            "/api/cart/quote",
            None,
            json!({ "items": [{ "menuItemId": BRUSCHETTA, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["meetsMinimum"], false);

    let (status, body) = app
        .place_order(&john, json!([{ "menuItemId": BRUSCHETTA, "quantity": 1 }]))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "unprocessable");
}

#[tokio::test]
async fn admin_moves_order_through_lifecycle() {
    let app = TestApp::spawn().await;
    let john = app.login("john@example.com", "password").await;
    let admin = app.login("admin@foodie.com", "admin123").await;

    let (_, placed) = app
        .place_order(&john, json!([{ "menuItemId": CARBONARA, "quantity": 1 }]))
        .await;
    let id = placed["order"]["id"].as_i64().unwrap();
    let uri = format!("/api/orders/{id}");

    let (status, _) = app
        .put(&uri, Some(&john), json!({ "status": "preparing" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&uri, Some(&admin), json!({ "status": "preparing", "notes": "Kitchen has it" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "preparing");

    // No going back
    let (status, body) = app
        .put(&uri, Some(&admin), json!({ "status": "confirmed" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "unprocessable");

    let (status, _) = app
        .put(&uri, Some(&admin), json!({ "status": "delivered" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = app.get(&uri, Some(&john)).await;
    assert_eq!(detail["status"], "delivered");
    assert!(detail["deliveredAt"].is_string());
    assert_eq!(detail["statusHistory"].as_array().unwrap().len(), 3);
}

// =============================================================================
// Reviews
// =============================================================================

#[tokio::test]
async fn review_tied_to_order_only_once() {
    let app = TestApp::spawn().await;
    let john = app.login("john@example.com", "password").await;
    let jane = app.login("jane@example.com", "password").await;

    let (_, placed) = app
        .place_order(&john, json!([{ "menuItemId": CARBONARA, "quantity": 1 }]))
        .await;
    let order_id = placed["order"]["id"].as_i64().unwrap();
    let uri = "/api/restaurants/bella-italia/reviews";
    let review = json!({ "orderId": order_id, "rating": 5, "comment": "Perfect carbonara" });

    let (status, _) = app.post(uri, None, review.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post(uri, Some(&jane), review.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post(uri, Some(&john), review.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["review"]["authorName"], "John Doe");
    let review_id = body["review"]["id"].as_i64().unwrap();

    let (status, body) = app.post(uri, Some(&john), review).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You have already reviewed this order");

    let (status, _) = app
        .post(uri, Some(&john), json!({ "rating": 6, "comment": "Too good" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = app.get(uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["reviews"][0]["user"]["name"], "John Doe");
    assert_eq!(list["reviews"][0]["helpful"], 0);

    let (status, body) = app
        .post(&format!("/api/reviews/{review_id}/helpful"), Some(&jane), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["helpfulCount"], 1);
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn admin_endpoints_require_admin_role() {
    let app = TestApp::spawn().await;
    let john = app.login("john@example.com", "password").await;

    let (status, _) = app.get("/api/admin/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/admin/stats", Some(&john)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let (status, _) = app.get("/api/admin/orders", Some(&john)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_dashboard_and_catalog_management() {
    let app = TestApp::spawn().await;
    let john = app.login("john@example.com", "password").await;
    let admin = app.login("admin@foodie.com", "admin123").await;

    app.place_order(&john, json!([{ "menuItemId": CARBONARA, "quantity": 1 }]))
        .await;

    let (status, stats) = app.get("/api/admin/stats", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalOrders"], 1);
    assert_eq!(stats["activeRestaurants"], 8);
    assert_eq!(stats["revenueTrend"].as_array().unwrap().len(), 7);

    let (status, orders) = app.get("/api/admin/orders", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders["total"], 1);

    let (status, created) = app
        .post(
            "/api/admin/restaurants",
            Some(&admin),
            json!({
                "name": "Noodle Bar",
                "cuisine": "Japanese",
                "phone": "+15551230099",
                "address": "900 Main Street",
                "deliveryFee": 199,
                "minimumOrder": 1000,
                "deliveryTimeMin": 20,
                "deliveryTimeMax": 30
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "noodle-bar");
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = app
        .put(
            &format!("/api/admin/restaurants/{id}"),
            Some(&admin),
            json!({ "isOpen": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isOpen"], false);
    assert_eq!(updated["name"], "Noodle Bar");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/admin/restaurants/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/restaurants/noodle-bar", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, promo) = app
        .post(
            "/api/admin/promotions",
            Some(&admin),
            json!({
                "title": "Free Delivery Friday",
                "code": "freeship",
                "discountType": "free_delivery",
                "minimumOrder": 2000,
                "validUntil": "2099-01-01T00:00:00Z"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(promo["promotion"]["code"], "FREESHIP");

    let (_, quote) = app
        .post(
            "/api/cart/quote",
            None,
            json!({
                "items": [{ "menuItemId": CARBONARA, "quantity": 2 }],
                "promoCode": "FREESHIP"
            }),
        )
        .await;
    assert_eq!(quote["subtotal"], 3398);
    assert_eq!(quote["deliveryFee"], 0);
    assert_eq!(quote["discount"], 299);
    assert_eq!(quote["tax"], 272);
    assert_eq!(quote["total"], 3398 + 272 - 299);
}

#[tokio::test]
async fn admin_menu_availability_blocks_checkout() {
    let app = TestApp::spawn().await;
    let admin = app.login("admin@foodie.com", "admin123").await;

    let (status, body) = app
        .put(
            &format!("/api/menu-items/{CARBONARA}/availability"),
            Some(&admin),
            json!({ "isAvailable": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["menuItem"]["isAvailable"], false);

    let (status, _) = app
        .post(
            "/api/cart/quote",
            None,
            json!({ "items": [{ "menuItemId": CARBONARA, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
