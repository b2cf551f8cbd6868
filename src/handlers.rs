use crate::{
    AppState,
    auth::{ADMIN_ROLES, AuthUser},
    error::ApiError,
    models::{
        CategoriesResponse, CategoryResponse, CreateCategoryRequest, CreateProductRequest,
        CreateTagRequest, MeResponse, MessageResponse, ProductCategory, ProductPayload,
        ProductResponse, ProductsResponse, StatsResponse, TagResponse, TagsResponse,
        UpdateCategoryRequest, UpdateProductRequest,
    },
    validation::ValidatedJson,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// ProductFilter
///
/// Accepted query parameters for the public product listing endpoint
/// (GET /api/products). Bound safely by Axum's Query extractor; an unknown
/// category literal is rejected before the handler runs.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProductFilter {
    /// Restrict to one product category.
    pub category: Option<ProductCategory>,
    /// Case-insensitive search across title, brand and description.
    pub search: Option<String>,
}

// --- Category Handlers ---

/// [Public Route] Lists active categories.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Active categories", body = CategoriesResponse))
)]
pub async fn list_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let categories = state.repo.list_categories(false).await;
    Json(CategoriesResponse {
        success: true,
        categories,
    })
}

/// [Public Route] Retrieves a single category by id.
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Found", body = CategoryResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, ApiError> {
    match state.repo.get_category(id).await {
        Some(category) => Ok(Json(CategoryResponse {
            success: true,
            category,
        })),
        None => Err(ApiError::NotFound("category")),
    }
}

/// [Admin Route] Creates a category. Validation runs in the extractor; the
/// role gate runs here, before any write.
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = CategoryResponse),
        (status = 403, description = "Not Admin"),
        (status = 422, description = "Validation Failed")
    )
)]
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    let category = state.repo.create_category(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            success: true,
            category,
        }),
    ))
}

/// [Admin Route] Partial update; omitted fields keep their stored values.
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = CategoryResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    match state.repo.update_category(id, payload).await? {
        Some(category) => Ok(Json(CategoryResponse {
            success: true,
            category,
        })),
        None => Err(ApiError::NotFound("category")),
    }
}

/// [Admin Route] Hard delete. A missing id is a 404, never a server error.
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    if state.repo.delete_category(id).await {
        Ok(Json(MessageResponse {
            success: true,
            message: "category deleted".to_string(),
        }))
    } else {
        Err(ApiError::NotFound("category"))
    }
}

// --- Product Handlers ---

/// [Public Route] Lists active products with category/search filtering.
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductFilter),
    responses((status = 200, description = "Active products", body = ProductsResponse))
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Json<ProductsResponse> {
    let products = state
        .repo
        .list_products(
            filter.category.map(|c| c.as_str().to_string()),
            filter.search,
            false,
        )
        .await;
    Json(ProductsResponse {
        success: true,
        products: products.into_iter().map(ProductPayload::from).collect(),
    })
}

/// [Public Route] Retrieves a single product by id, with derived
/// discounted prices.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Found", body = ProductResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    match state.repo.get_product(id).await {
        Some(product) => Ok(Json(ProductResponse {
            success: true,
            product: product.into(),
        })),
        None => Err(ApiError::NotFound("product")),
    }
}

/// [Public Route] Slug-based product lookup (storefront detail pages).
#[utoipa::path(
    get,
    path = "/api/products/slug/{slug}",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Found", body = ProductResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    match state.repo.get_product_by_slug(&slug).await {
        Some(product) => Ok(Json(ProductResponse {
            success: true,
            product: product.into(),
        })),
        None => Err(ApiError::NotFound("product")),
    }
}

/// [Admin Route] Creates a product. Tag references are resolved and the
/// slug derived/checked at write time; a slug collision surfaces as 409.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created", body = ProductResponse),
        (status = 409, description = "Slug Conflict"),
        (status = 422, description = "Validation Failed")
    )
)]
pub async fn create_product(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    let product = state.repo.create_product(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            product: product.into(),
        }),
    ))
}

/// [Admin Route] Partial update. An already-set slug is never rewritten
/// unless the payload supplies one.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated", body = ProductResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    match state.repo.update_product(id, payload).await? {
        Some(product) => Ok(Json(ProductResponse {
            success: true,
            product: product.into(),
        })),
        None => Err(ApiError::NotFound("product")),
    }
}

/// [Admin Route] Hard delete.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_product(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    if state.repo.delete_product(id).await {
        Ok(Json(MessageResponse {
            success: true,
            message: "product deleted".to_string(),
        }))
    } else {
        Err(ApiError::NotFound("product"))
    }
}

// --- Tag Handlers ---

/// [Public Route] Lists all tags.
#[utoipa::path(
    get,
    path = "/api/tags",
    responses((status = 200, description = "Tags", body = TagsResponse))
)]
pub async fn list_tags(State(state): State<AppState>) -> Json<TagsResponse> {
    let tags = state.repo.list_tags().await;
    Json(TagsResponse {
        success: true,
        tags,
    })
}

/// [Admin Route] Creates a tag; a duplicate name surfaces as 409.
#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Created", body = TagResponse),
        (status = 409, description = "Duplicate Name")
    )
)]
pub async fn create_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagResponse>), ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    let tag = state.repo.create_tag(payload).await?;
    Ok((StatusCode::CREATED, Json(TagResponse { success: true, tag })))
}

/// [Admin Route] Deletes a tag. Products keep their (now-dangling) tag ids
/// out of scope here; reference checks only run on product writes.
#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    if state.repo.delete_tag(id).await {
        Ok(Json(MessageResponse {
            success: true,
            message: "tag deleted".to_string(),
        }))
    } else {
        Err(ApiError::NotFound("tag"))
    }
}

// --- Identity & Admin Dashboard ---

/// [Authenticated Route] The authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "Profile", body = MeResponse))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state.repo.get_user(id).await.ok_or(ApiError::Unauthorized)?;
    Ok(Json(MeResponse {
        success: true,
        user,
    }))
}

/// [Admin Route] Full catalog overview including soft-disabled products.
#[utoipa::path(
    get,
    path = "/api/admin/products",
    responses(
        (status = 200, description = "All products", body = ProductsResponse),
        (status = 403, description = "Not Admin")
    )
)]
pub async fn list_all_products(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse>, ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    let products = state.repo.list_products(None, None, true).await;
    Ok(Json(ProductsResponse {
        success: true,
        products: products.into_iter().map(ProductPayload::from).collect(),
    }))
}

/// [Admin Route] Catalog counters for the dashboard.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Stats", body = StatsResponse),
        (status = 403, description = "Not Admin")
    )
)]
pub async fn get_catalog_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    auth.require_role(ADMIN_ROLES)?;
    Ok(Json(StatsResponse {
        success: true,
        stats: state.repo.get_stats().await,
    }))
}
