use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use storefront_api::{
    AppState,
    auth::{ADMIN_ROLES, AuthUser, Claims, role_allowed},
    config::{AppConfig, Env},
    error::ApiError,
    models::{
        CatalogStats, Category, CreateCategoryRequest, CreateProductRequest, CreateTagRequest,
        Product, Tag, UpdateCategoryRequest, UpdateProductRequest, User,
    },
    repository::{RepoError, Repository},
};
use uuid::Uuid;

// --- Mock Repository for Auth Logic ---

#[derive(Default)]
struct MockAuthRepo {
    user_to_return: Option<User>,
}

#[async_trait]
impl Repository for MockAuthRepo {
    async fn get_user(&self, _id: Uuid) -> Option<User> {
        self.user_to_return.clone()
    }

    // Placeholders for the rest of the contract; the extractor never calls
    // these.
    async fn list_categories(&self, _include_inactive: bool) -> Vec<Category> {
        vec![]
    }
    async fn get_category(&self, _id: Uuid) -> Option<Category> {
        None
    }
    async fn create_category(&self, _req: CreateCategoryRequest) -> Result<Category, RepoError> {
        Ok(Category::default())
    }
    async fn update_category(
        &self,
        _id: Uuid,
        _req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, RepoError> {
        Ok(None)
    }
    async fn delete_category(&self, _id: Uuid) -> bool {
        false
    }
    async fn list_products(
        &self,
        _category: Option<String>,
        _search: Option<String>,
        _include_inactive: bool,
    ) -> Vec<Product> {
        vec![]
    }
    async fn get_product(&self, _id: Uuid) -> Option<Product> {
        None
    }
    async fn get_product_by_slug(&self, _slug: &str) -> Option<Product> {
        None
    }
    async fn create_product(&self, _req: CreateProductRequest) -> Result<Product, RepoError> {
        Ok(Product::default())
    }
    async fn update_product(
        &self,
        _id: Uuid,
        _req: UpdateProductRequest,
    ) -> Result<Option<Product>, RepoError> {
        Ok(None)
    }
    async fn delete_product(&self, _id: Uuid) -> bool {
        false
    }
    async fn list_tags(&self) -> Vec<Tag> {
        vec![]
    }
    async fn create_tag(&self, _req: CreateTagRequest) -> Result<Tag, RepoError> {
        Ok(Tag::default())
    }
    async fn delete_tag(&self, _id: Uuid) -> bool {
        false
    }
    async fn get_stats(&self) -> CatalogStats {
        CatalogStats::default()
    }
}

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn create_token_with_exp(user_id: Uuid, exp: u64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: exp as usize,
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn create_token(user_id: Uuid, exp_offset: u64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    create_token_with_exp(user_id, now + exp_offset)
}

fn create_app_state(env: Env, repo: MockAuthRepo, jwt_secret: String) -> AppState {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = jwt_secret;

    AppState {
        repo: Arc::new(repo),
        config,
    }
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn customer() -> Option<User> {
    Some(User {
        id: TEST_USER_ID,
        email: "test@example.com".to_string(),
        role: "customer".to_string(),
    })
}

// --- Tests ---

#[test]
fn test_role_allowed_truth_table() {
    assert!(role_allowed("admin", ADMIN_ROLES));
    assert!(role_allowed("super-admin", ADMIN_ROLES));
    assert!(!role_allowed("customer", ADMIN_ROLES));
    assert!(!role_allowed("", ADMIN_ROLES));
    // Role matching is exact, never prefix-based.
    assert!(!role_allowed("admin2", ADMIN_ROLES));
    assert!(!role_allowed("Admin", ADMIN_ROLES));
}

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let token = create_token(TEST_USER_ID, 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: customer(),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.role, "customer");
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::Unauthorized);
}

#[tokio::test]
async fn test_auth_failure_with_wrong_secret() {
    let token = create_token(TEST_USER_ID, 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: customer(),
    };
    // The service validates against a different secret than the one the
    // token was signed with.
    let app_state = create_app_state(Env::Production, mock_repo, "another-secret".to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::Unauthorized);
}

#[tokio::test]
async fn test_auth_failure_with_expired_jwt() {
    // Expired an hour ago, well past any decoder leeway.
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let token = create_token_with_exp(TEST_USER_ID, now - 3600);

    let mock_repo = MockAuthRepo {
        user_to_return: customer(),
    };
    let app_state = create_app_state(Env::Production, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::Unauthorized);
}

#[tokio::test]
async fn test_auth_failure_for_deleted_user() {
    // A structurally valid token whose subject no longer exists in the store.
    let token = create_token(TEST_USER_ID, 3600);

    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo {
            user_to_return: None,
        },
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::Unauthorized);
}

#[tokio::test]
async fn test_local_bypass_success() {
    let mock_user_id = Uuid::new_v4();
    let mock_repo = MockAuthRepo {
        user_to_return: Some(User {
            id: mock_user_id,
            email: "local@dev.com".to_string(),
            role: "admin".to_string(),
        }),
    };
    let app_state = create_app_state(Env::Local, mock_repo, TEST_JWT_SECRET.to_string());

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert!(auth_user.is_ok());
    let user = auth_user.unwrap();
    assert_eq!(user.id, mock_user_id);
    assert_eq!(user.role, "admin");
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let mock_user_id = Uuid::new_v4();
    let app_state = create_app_state(
        Env::Production,
        MockAuthRepo::default(),
        TEST_JWT_SECRET.to_string(),
    );

    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    // Provide ONLY the local bypass header.
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&mock_user_id.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &app_state).await;

    assert_eq!(auth_user.unwrap_err(), ApiError::Unauthorized);
}

#[tokio::test]
async fn test_require_role_gates_customer() {
    let admin = AuthUser {
        id: TEST_USER_ID,
        role: "super-admin".to_string(),
    };
    assert!(admin.require_role(ADMIN_ROLES).is_ok());

    let shopper = AuthUser {
        id: TEST_USER_ID,
        role: "customer".to_string(),
    };
    assert_eq!(
        shopper.require_role(ADMIN_ROLES).unwrap_err(),
        ApiError::Forbidden
    );
}
