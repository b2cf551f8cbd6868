use crate::models::{
    CatalogStats, Category, CreateCategoryRequest, CreateProductRequest, CreateTagRequest,
    Product, Tag, UpdateCategoryRequest, UpdateProductRequest, User,
};
use crate::slug::slugify;
use async_trait::async_trait;
use sqlx::{PgPool, error::ErrorKind, query_builder::QueryBuilder, types::Json};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepoError
///
/// Write-time failures the persistence layer distinguishes for the API:
/// uniqueness violations and dangling references get their own variants so
/// handlers can surface structured 409/422 responses; everything else is a
/// generic database failure logged and hidden behind a 500.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0} already exists")]
    Duplicate(&'static str),
    #[error("unknown {0} reference")]
    UnknownReference(&'static str),
    #[error("{0} cannot be its own parent")]
    SelfParent(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

fn violation_kind(err: &sqlx::Error) -> Option<ErrorKind> {
    match err {
        sqlx::Error::Database(db) => Some(db.kind()),
        _ => None,
    }
}

/// Repository
///
/// Abstract contract for all persistence operations, so handlers interact
/// with the data layer without knowing the concrete implementation
/// (Postgres in production, an in-memory mock in tests).
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`)
/// safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Categories ---
    /// Public listing serves only active categories; admins pass
    /// `include_inactive = true`.
    async fn list_categories(&self, include_inactive: bool) -> Vec<Category>;
    async fn get_category(&self, id: Uuid) -> Option<Category>;
    /// Enforces the parent-reference invariant at write time.
    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RepoError>;
    /// Partial update; omitted fields keep their stored values. Returns
    /// `Ok(None)` when the id does not exist.
    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, RepoError>;
    /// Returns true only if a row was removed.
    async fn delete_category(&self, id: Uuid) -> bool;

    // --- Products ---
    async fn list_products(
        &self,
        category: Option<String>,
        search: Option<String>,
        include_inactive: bool,
    ) -> Vec<Product>;
    async fn get_product(&self, id: Uuid) -> Option<Product>;
    async fn get_product_by_slug(&self, slug: &str) -> Option<Product>;
    /// Derives the slug from the title when none is supplied and enforces
    /// the tag-reference invariant. Slug uniqueness is the database's job;
    /// a collision comes back as `RepoError::Duplicate`.
    async fn create_product(&self, req: CreateProductRequest) -> Result<Product, RepoError>;
    async fn update_product(
        &self,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> Result<Option<Product>, RepoError>;
    async fn delete_product(&self, id: Uuid) -> bool;

    // --- Tags ---
    async fn list_tags(&self) -> Vec<Tag>;
    async fn create_tag(&self, req: CreateTagRequest) -> Result<Tag, RepoError>;
    async fn delete_tag(&self, id: Uuid) -> bool;

    // --- Identity & Dashboard ---
    /// Resolves the authenticated user's current role for the auth extractor.
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_stats(&self) -> CatalogStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by PostgreSQL.
/// All queries are runtime-checked (`query_as::<_, T>`), so the crate builds
/// without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verifies every id in `tags` resolves to a stored Tag. Duplicates in
    /// the request are collapsed before counting.
    async fn assert_tags_exist(&self, tags: &[Uuid]) -> Result<(), RepoError> {
        if tags.is_empty() {
            return Ok(());
        }
        let unique: Vec<Uuid> = tags.iter().copied().collect::<HashSet<_>>().into_iter().collect();
        let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
            .bind(&unique)
            .fetch_one(&self.pool)
            .await?;
        if known != unique.len() as i64 {
            return Err(RepoError::UnknownReference("tag"));
        }
        Ok(())
    }

    /// Verifies a parent category id resolves to a stored row. Lookup
    /// failures propagate as `Database`, so a transient outage is not
    /// misreported as a missing reference.
    async fn assert_parent_exists(&self, parent: Uuid) -> Result<(), RepoError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(parent)
                .fetch_one(&self.pool)
                .await?;
        if exists {
            Ok(())
        } else {
            Err(RepoError::UnknownReference("parent category"))
        }
    }
}

const CATEGORY_COLUMNS: &str =
    "id, name, category_type, description, parent_id, is_active, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, title, description, discount_percentage, brand, slug, rating, \
     category, thumbnail, product_bg, images, variants, packaging, accordion, tags, is_active, \
     created_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_categories(&self, include_inactive: bool) -> Vec<Category> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE 1=1"
        ));
        if !include_inactive {
            builder.push(" AND is_active = true");
        }
        builder.push(" ORDER BY created_at DESC");

        match builder.build_query_as::<Category>().fetch_all(&self.pool).await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::error!("list_categories error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_category(&self, id: Uuid) -> Option<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_category error: {:?}", e);
            None
        })
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RepoError> {
        // Referential check before the write; the FK constraint is the
        // atomic backstop for races.
        if let Some(parent) = req.parent {
            self.assert_parent_exists(parent).await?;
        }

        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (id, name, category_type, description, parent_id, is_active, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, true, NOW(), NOW()) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .bind(req.category_type.as_str())
        .bind(&req.description)
        .bind(req.parent)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation_kind(&e) {
            Some(ErrorKind::ForeignKeyViolation) => RepoError::UnknownReference("parent category"),
            _ => RepoError::Database(e),
        })
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, RepoError> {
        if let Some(parent) = req.parent {
            // A category referencing itself would corrupt the tree shape.
            if parent == id {
                return Err(RepoError::SelfParent("category"));
            }
            self.assert_parent_exists(parent).await?;
        }

        sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories SET \
               name = COALESCE($2, name), \
               category_type = COALESCE($3, category_type), \
               description = COALESCE($4, description), \
               parent_id = COALESCE($5, parent_id), \
               is_active = COALESCE($6, is_active), \
               updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.name)
        .bind(req.category_type.map(|t| t.as_str()))
        .bind(&req.description)
        .bind(req.parent)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match violation_kind(&e) {
            Some(ErrorKind::ForeignKeyViolation) => RepoError::UnknownReference("parent category"),
            _ => RepoError::Database(e),
        })
    }

    async fn delete_category(&self, id: Uuid) -> bool {
        // Children are detached (parent_id set to NULL) by the schema.
        match sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_category error: {:?}", e);
                false
            }
        }
    }

    async fn list_products(
        &self,
        category: Option<String>,
        search: Option<String>,
        include_inactive: bool,
    ) -> Vec<Product> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1"));
        if !include_inactive {
            builder.push(" AND is_active = true");
        }
        if let Some(category) = category {
            builder.push(" AND category = ");
            builder.push_bind(category);
        }
        if let Some(search) = search {
            // Case-insensitive search across title, brand and description.
            let pattern = format!("%{}%", search);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR brand ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        builder.push(" ORDER BY created_at DESC");

        match builder.build_query_as::<Product>().fetch_all(&self.pool).await {
            Ok(products) => products,
            Err(e) => {
                tracing::error!("list_products error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_product(&self, id: Uuid) -> Option<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_product error: {:?}", e);
            None
        })
    }

    async fn get_product_by_slug(&self, slug: &str) -> Option<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_product_by_slug error: {:?}", e);
            None
        })
    }

    async fn create_product(&self, req: CreateProductRequest) -> Result<Product, RepoError> {
        self.assert_tags_exist(&req.tags).await?;

        // Slug derivation happens exactly once, at first persistence.
        let slug = match &req.slug {
            Some(slug) => slug.clone(),
            None => slugify(&req.title),
        };

        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (id, title, description, discount_percentage, brand, slug, \
             rating, category, thumbnail, product_bg, images, variants, packaging, accordion, \
             tags, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, true, NOW()) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.discount_percentage)
        .bind(&req.brand)
        .bind(&slug)
        .bind(req.rating)
        .bind(req.category.as_str())
        .bind(&req.thumbnail)
        .bind(&req.product_bg)
        .bind(&req.images)
        .bind(Json(&req.variants))
        .bind(Json(&req.packaging))
        .bind(Json(&req.accordion))
        .bind(&req.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation_kind(&e) {
            Some(ErrorKind::UniqueViolation) => RepoError::Duplicate("product slug"),
            _ => RepoError::Database(e),
        })
    }

    async fn update_product(
        &self,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> Result<Option<Product>, RepoError> {
        if let Some(tags) = &req.tags {
            self.assert_tags_exist(tags).await?;
        }

        // COALESCE keeps stored values for omitted fields; in particular the
        // slug is never rewritten unless explicitly supplied.
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET \
               title = COALESCE($2, title), \
               description = COALESCE($3, description), \
               discount_percentage = COALESCE($4, discount_percentage), \
               brand = COALESCE($5, brand), \
               slug = COALESCE($6, slug), \
               rating = COALESCE($7, rating), \
               category = COALESCE($8, category), \
               thumbnail = COALESCE($9, thumbnail), \
               product_bg = COALESCE($10, product_bg), \
               images = COALESCE($11, images), \
               variants = COALESCE($12, variants), \
               packaging = COALESCE($13, packaging), \
               accordion = COALESCE($14, accordion), \
               tags = COALESCE($15, tags), \
               is_active = COALESCE($16, is_active) \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.discount_percentage)
        .bind(&req.brand)
        .bind(&req.slug)
        .bind(req.rating)
        .bind(req.category.map(|c| c.as_str()))
        .bind(&req.thumbnail)
        .bind(&req.product_bg)
        .bind(&req.images)
        .bind(req.variants.as_ref().map(Json))
        .bind(req.packaging.as_ref().map(Json))
        .bind(req.accordion.as_ref().map(Json))
        .bind(&req.tags)
        .bind(req.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match violation_kind(&e) {
            Some(ErrorKind::UniqueViolation) => RepoError::Duplicate("product slug"),
            _ => RepoError::Database(e),
        })
    }

    async fn delete_product(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_product error: {:?}", e);
                false
            }
        }
    }

    async fn list_tags(&self) -> Vec<Tag> {
        match sqlx::query_as::<_, Tag>("SELECT id, name, created_at FROM tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
        {
            Ok(tags) => tags,
            Err(e) => {
                tracing::error!("list_tags error: {:?}", e);
                vec![]
            }
        }
    }

    async fn create_tag(&self, req: CreateTagRequest) -> Result<Tag, RepoError> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (id, name, created_at) VALUES ($1, $2, NOW()) \
             RETURNING id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&req.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violation_kind(&e) {
            Some(ErrorKind::UniqueViolation) => RepoError::Duplicate("tag name"),
            _ => RepoError::Database(e),
        })
    }

    async fn delete_tag(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_tag error: {:?}", e);
                false
            }
        }
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, email, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or(None)
    }

    async fn get_stats(&self) -> CatalogStats {
        let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let inactive_products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = false")
                .fetch_one(&self.pool)
                .await
                .unwrap_or(0);
        CatalogStats {
            total_products,
            total_categories,
            total_tags,
            inactive_products,
        }
    }
}
