use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use storefront_api::{
    AppState, create_router,
    config::AppConfig,
    models::{
        CatalogStats, Category, CreateCategoryRequest, CreateProductRequest, CreateTagRequest,
        Product, Tag, UpdateCategoryRequest, UpdateProductRequest, User,
    },
    repository::{RepoError, Repository},
};
use tower::ServiceExt;
use uuid::Uuid;

// --- Mock repository backing the full router ---

// The router is exercised end to end (routing, extractors, error envelopes)
// against canned data; requests authenticate through the Env::Local
// x-user-id bypass.
struct MockCatalogRepo {
    role: &'static str,
}

const ADMIN_ID: Uuid = Uuid::from_u128(7);

#[async_trait]
impl Repository for MockCatalogRepo {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        Some(User {
            id,
            email: "user@example.com".to_string(),
            role: self.role.to_string(),
        })
    }

    async fn list_categories(&self, _include_inactive: bool) -> Vec<Category> {
        vec![Category::default()]
    }
    async fn get_category(&self, _id: Uuid) -> Option<Category> {
        Some(Category::default())
    }
    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RepoError> {
        Ok(Category {
            name: req.name,
            ..Category::default()
        })
    }
    async fn update_category(
        &self,
        _id: Uuid,
        _req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, RepoError> {
        Ok(Some(Category::default()))
    }
    async fn delete_category(&self, _id: Uuid) -> bool {
        true
    }
    async fn list_products(
        &self,
        _category: Option<String>,
        _search: Option<String>,
        _include_inactive: bool,
    ) -> Vec<Product> {
        vec![Product::default()]
    }
    async fn get_product(&self, _id: Uuid) -> Option<Product> {
        Some(Product::default())
    }
    async fn get_product_by_slug(&self, _slug: &str) -> Option<Product> {
        None
    }
    async fn create_product(&self, req: CreateProductRequest) -> Result<Product, RepoError> {
        Ok(Product {
            title: req.title,
            ..Product::default()
        })
    }
    async fn update_product(
        &self,
        _id: Uuid,
        _req: UpdateProductRequest,
    ) -> Result<Option<Product>, RepoError> {
        Ok(Some(Product::default()))
    }
    async fn delete_product(&self, _id: Uuid) -> bool {
        true
    }
    async fn list_tags(&self) -> Vec<Tag> {
        vec![]
    }
    async fn create_tag(&self, req: CreateTagRequest) -> Result<Tag, RepoError> {
        Ok(Tag {
            name: req.name,
            ..Tag::default()
        })
    }
    async fn delete_tag(&self, _id: Uuid) -> bool {
        false
    }
    async fn get_stats(&self) -> CatalogStats {
        CatalogStats {
            total_products: 1,
            ..CatalogStats::default()
        }
    }
}

fn test_router(role: &'static str) -> Router {
    let state = AppState {
        repo: Arc::new(MockCatalogRepo { role }),
        config: AppConfig::default(),
    };
    create_router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_product_body() -> serde_json::Value {
    serde_json::json!({
        "title": "Cold Brew Coffee",
        "description": "Slow-steeped for 18 hours.",
        "brand": "Acme Roasters",
        "category": "cold-brew",
        "thumbnail": "https://cdn.example.com/cold-brew/thumb.png",
        "images": ["https://cdn.example.com/cold-brew/hero.jpg"],
        "variants": [{ "size": "330ml", "price": 4.95, "stock": 40 }],
        "accordion": { "details": "", "shipping": "", "returns": "" }
    })
}

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let response = test_router("customer")
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_product_listing_needs_no_auth() {
    let response = test_router("customer")
        .oneshot(Request::get("/api/products").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["products"].is_array());
    // The derived field rides along with every product.
    assert!(json["products"][0]["discounted_prices"].is_array());
}

#[tokio::test]
async fn test_create_product_rejected_without_auth() {
    let response = test_router("admin")
        .oneshot(
            Request::post("/api/products")
                .header("content-type", "application/json")
                .body(Body::from(valid_product_body().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_create_product_forbidden_for_customer() {
    let response = test_router("customer")
        .oneshot(
            Request::post("/api/products")
                .header("content-type", "application/json")
                .header("x-user-id", ADMIN_ID.to_string())
                .body(Body::from(valid_product_body().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_product_as_admin() {
    let response = test_router("admin")
        .oneshot(
            Request::post("/api/products")
                .header("content-type", "application/json")
                .header("x-user-id", ADMIN_ID.to_string())
                .body(Body::from(valid_product_body().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["product"]["title"], "Cold Brew Coffee");
}

#[tokio::test]
async fn test_create_product_validation_failure() {
    let mut body = valid_product_body();
    body["discount_percentage"] = serde_json::json!(150.0);
    body["variants"] = serde_json::json!([]);

    let response = test_router("admin")
        .oneshot(
            Request::post("/api/products")
                .header("content-type", "application/json")
                .header("x-user-id", ADMIN_ID.to_string())
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["errors"]["discount_percentage"].is_string());
    assert!(json["errors"]["variants"].is_string());
}

#[tokio::test]
async fn test_create_product_unknown_category_literal() {
    let mut body = valid_product_body();
    body["category"] = serde_json::json!("electronics");

    let response = test_router("admin")
        .oneshot(
            Request::post("/api/products")
                .header("content-type", "application/json")
                .header("x-user-id", ADMIN_ID.to_string())
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    // Enum literal mismatch fails deserialization, not rule validation.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let response = test_router("admin")
        .oneshot(
            Request::post("/api/categories")
                .header("content-type", "application/json")
                .header("x-user-id", ADMIN_ID.to_string())
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_category_as_admin() {
    let response = test_router("admin")
        .oneshot(
            Request::post("/api/categories")
                .header("content-type", "application/json")
                .header("x-user-id", ADMIN_ID.to_string())
                .body(Body::from(
                    serde_json::json!({
                        "name": "Single Origin",
                        "category_type": "product"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["category"]["name"], "Single Origin");
}

#[tokio::test]
async fn test_product_slug_lookup_miss() {
    let response = test_router("customer")
        .oneshot(
            Request::get("/api/products/slug/no-such-product")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_invalid_uuid_path_segment() {
    let response = test_router("customer")
        .oneshot(
            Request::get("/api/products/not-a-uuid-at-all-xx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_stats_roundtrip() {
    let response = test_router("super-admin")
        .oneshot(
            Request::get("/api/admin/stats")
                .header("x-user-id", ADMIN_ID.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["stats"]["total_products"], 1);
}

#[tokio::test]
async fn test_request_id_header_present() {
    let response = test_router("customer")
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
