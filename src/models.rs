use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow, types::Json};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enumerated Field Domains ---

/// CategoryType
///
/// Discriminates the two category trees served by the storefront: product
/// categories and blog categories. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CategoryType {
    #[default]
    Product,
    Blog,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Product => "product",
            CategoryType::Blog => "blog",
        }
    }
}

impl std::str::FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(CategoryType::Product),
            "blog" => Ok(CategoryType::Blog),
            other => Err(format!("unknown category type: {other}")),
        }
    }
}

/// ProductCategory
///
/// The fixed literal set a product can belong to. This is deliberately a
/// closed enum (not a Category reference): the storefront's product taxonomy
/// is part of the schema contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ProductCategory {
    #[default]
    Coffee,
    Tea,
    ColdBrew,
    Merchandise,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Coffee => "coffee",
            ProductCategory::Tea => "tea",
            ProductCategory::ColdBrew => "cold-brew",
            ProductCategory::Merchandise => "merchandise",
        }
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coffee" => Ok(ProductCategory::Coffee),
            "tea" => Ok(ProductCategory::Tea),
            "cold-brew" => Ok(ProductCategory::ColdBrew),
            "merchandise" => Ok(ProductCategory::Merchandise),
            other => Err(format!("unknown product category: {other}")),
        }
    }
}

/// Packaging
///
/// Allowed packaging formats. Serialized verbatim (capitalized), matching the
/// public API contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub enum Packaging {
    #[default]
    Bottle,
    Box,
    Canister,
}

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical identity record mirrored from the external identity
/// provider. Only ever read here; the provider owns creation and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    // The RBAC field: 'customer', 'admin' or 'super-admin'.
    pub role: String,
}

/// Category
///
/// A node in the category tree. `parent` is a plain foreign-key style
/// reference to another Category; referential existence is checked at write
/// time in the repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub category_type: CategoryType,
    pub description: Option<String>,
    pub parent: Option<Uuid>,
    // Soft-disable flag; public listings only serve active categories.
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// category_type is stored as text, so the row mapping is spelled out rather
// than derived.
impl FromRow<'_, PgRow> for Category {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let category_type: String = row.try_get("category_type")?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category_type: category_type
                .parse()
                .map_err(|e: String| sqlx::Error::ColumnDecode {
                    index: "category_type".into(),
                    source: e.into(),
                })?,
            description: row.try_get("description")?,
            parent: row.try_get("parent_id")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Variant
///
/// A purchasable size/price/stock combination within a Product. Persisted
/// inside the product row as JSONB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Variant {
    pub size: String,
    pub price: f64,
    #[serde(default)]
    pub stock: i32,
}

/// Accordion
///
/// The required descriptive sub-document rendered as collapsible sections on
/// the product page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct Accordion {
    #[validate(length(max = 1000, message = "details must be at most 1000 characters"))]
    pub details: String,
    #[validate(length(max = 1000, message = "shipping must be at most 1000 characters"))]
    pub shipping: String,
    #[validate(length(max = 1000, message = "returns must be at most 1000 characters"))]
    pub returns: String,
}

/// Product
///
/// The primary catalog entity. List-shaped fields (images, variants,
/// packaging, accordion) live in the same row as arrays/JSONB, keeping the
/// document shape of the API intact.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub discount_percentage: f64,
    pub brand: String,
    // Unique, lowercase, derived from the title when not supplied.
    pub slug: String,
    pub rating: f64,
    pub category: ProductCategory,
    pub thumbnail: String,
    pub product_bg: Option<String>,
    pub images: Vec<String>,
    pub variants: Vec<Variant>,
    pub packaging: Vec<Packaging>,
    pub accordion: Accordion,
    // References into the tags table; existence is checked at write time.
    pub tags: Vec<Uuid>,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Virtual field: per-variant prices after applying the product-level
    /// discount percentage, rounded to cents. Never stored.
    pub fn discounted_prices(&self) -> Vec<f64> {
        self.variants
            .iter()
            .map(|v| {
                let discounted = v.price * (1.0 - self.discount_percentage / 100.0);
                (discounted * 100.0).round() / 100.0
            })
            .collect()
    }
}

impl FromRow<'_, PgRow> for Product {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let category: String = row.try_get("category")?;
        let Json(variants): Json<Vec<Variant>> = row.try_get("variants")?;
        let Json(packaging): Json<Vec<Packaging>> = row.try_get("packaging")?;
        let Json(accordion): Json<Accordion> = row.try_get("accordion")?;
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            discount_percentage: row.try_get("discount_percentage")?,
            brand: row.try_get("brand")?,
            slug: row.try_get("slug")?,
            rating: row.try_get("rating")?,
            category: category
                .parse()
                .map_err(|e: String| sqlx::Error::ColumnDecode {
                    index: "category".into(),
                    source: e.into(),
                })?,
            thumbnail: row.try_get("thumbnail")?,
            product_bg: row.try_get("product_bg")?,
            images: row.try_get("images")?,
            variants,
            packaging,
            accordion,
            tags: row.try_get("tags")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Tag
///
/// A flat label that products reference by id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateCategoryRequest
///
/// Input payload for POST /api/categories. Name and type are mandatory;
/// everything else is optional.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: String,
    pub category_type: CategoryType,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    pub parent: Option<Uuid>,
}

/// UpdateCategoryRequest
///
/// Partial update payload for PUT /api/categories/{id}. All fields optional;
/// omitted fields keep their stored values (COALESCE semantics in the
/// repository).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 100, message = "name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_type: Option<CategoryType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// CreateProductRequest
///
/// Input payload for POST /api/products. The slug is optional; when omitted
/// the repository derives it from the title.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateProductRequest {
    #[validate(
        length(min = 3, max = 100, message = "title must be between 3 and 100 characters"),
        custom = "crate::validation::validate_title"
    )]
    pub title: String,
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: String,
    #[serde(default)]
    #[validate(range(
        min = 0.0,
        max = 100.0,
        message = "discount percentage must be between 0 and 100"
    ))]
    pub discount_percentage: f64,
    #[validate(length(max = 50, message = "brand must be at most 50 characters"))]
    pub brand: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "crate::validation::validate_slug")]
    pub slug: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 5.0, message = "rating must be between 0 and 5"))]
    pub rating: f64,
    pub category: ProductCategory,
    #[validate(custom = "crate::validation::validate_image_url")]
    pub thumbnail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "crate::validation::validate_image_url")]
    pub product_bg: Option<String>,
    #[validate(custom = "crate::validation::validate_images")]
    pub images: Vec<String>,
    #[validate(custom = "crate::validation::validate_variants")]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub packaging: Vec<Packaging>,
    #[validate]
    pub accordion: Accordion,
    #[serde(default)]
    pub tags: Vec<Uuid>,
}

/// UpdateProductRequest
///
/// Partial update payload for PUT /api/products/{id}. Every field is
/// optional but must satisfy the same shape constraints when present.
/// Supplying a slug overwrites the stored one; omitting it never does.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 3, max = 100, message = "title must be between 3 and 100 characters"),
        custom = "crate::validation::validate_title"
    )]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(
        min = 0.0,
        max = 100.0,
        message = "discount percentage must be between 0 and 100"
    ))]
    pub discount_percentage: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 50, message = "brand must be at most 50 characters"))]
    pub brand: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "crate::validation::validate_slug")]
    pub slug: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 5.0, message = "rating must be between 0 and 5"))]
    pub rating: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "crate::validation::validate_image_url")]
    pub thumbnail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "crate::validation::validate_image_url")]
    pub product_bg: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "crate::validation::validate_images")]
    pub images: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "crate::validation::validate_variants")]
    pub variants: Option<Vec<Variant>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<Vec<Packaging>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate]
    pub accordion: Option<Accordion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Uuid>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// CreateTagRequest
///
/// Input payload for POST /api/tags.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 50, message = "name must be between 1 and 50 characters"))]
    pub name: String,
}

// --- Response Envelopes (Output Schemas) ---

/// ProductPayload
///
/// A Product plus its derived (virtual) discounted prices, as served by
/// every product-returning endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProductPayload {
    #[serde(flatten)]
    pub product: Product,
    pub discounted_prices: Vec<f64>,
}

impl From<Product> for ProductPayload {
    fn from(product: Product) -> Self {
        let discounted_prices = product.discounted_prices();
        Self {
            product,
            discounted_prices,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategoryResponse {
    pub success: bool,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProductResponse {
    pub success: bool,
    pub product: ProductPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProductsResponse {
    pub success: bool,
    pub products: Vec<ProductPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TagResponse {
    pub success: bool,
    pub tag: Tag,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TagsResponse {
    pub success: bool,
    pub tags: Vec<Tag>,
}

/// MessageResponse
///
/// Generic success envelope for operations that return no entity (deletes).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MeResponse {
    pub success: bool,
    pub user: User,
}

/// CatalogStats
///
/// Counters for the admin dashboard (GET /api/admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CatalogStats {
    pub total_products: i64,
    pub total_categories: i64,
    pub total_tags: i64,
    /// Products currently soft-disabled via `is_active = false`.
    pub inactive_products: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: CatalogStats,
}
