//! # Catalog Service
//!
//! Product and category maintenance. Every write keeps the category's
//! `total_product` counter and the category → product deactivation
//! cascade consistent inside one write transaction.
//!
//! ## Cascades
//! ```text
//! create_product(P in C)          ──► C.total_product + 1
//! update_product(P: C1 → C2)      ──► C1.total_product - 1, C2 + 1
//! delete_product(P in C)          ──► C.total_product - 1 (floored at 0)
//! update_category(C, status=off)  ──► every live product of C: active = 0
//! delete_category(C)              ──► every live product of C: active = 0
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::DbError;
use crate::pool::{begin_write, commit};
use crate::repository::category::CategoryRepository;
use crate::repository::product::ProductRepository;
use crate::service::ServiceResult;
use kasir_core::validation::{
    normalize_category_name, validate_amount, validate_category_name, validate_discount,
    validate_product_name, validate_search_query, validate_stock,
};
use kasir_core::{
    CoreError, CoreResult, NewCategory, NewProduct, Product, ProductCategory, ProductView,
    UpdateCategory, UpdateProduct, ValidationError,
};

/// Product and category maintenance.
#[derive(Debug, Clone)]
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogService { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates a product and bumps its category counter.
    ///
    /// ## Errors
    /// - `Validation` for a bad name, price, stock or discount, or a name
    ///   already used by a live product
    /// - `CategoryNotFound` when the category is missing or deleted
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: NewProduct) -> ServiceResult<ProductView> {
        validate_product_input(&input)?;
        let name = input.name.trim().to_string();

        let mut tx = begin_write(&self.pool).await?;

        if CategoryRepository::get_by_id_in(&mut tx, &input.category_id)
            .await?
            .is_none()
        {
            return Err(CoreError::CategoryNotFound(input.category_id).into());
        }

        if ProductRepository::get_by_name_in(&mut tx, &name).await?.is_some() {
            return Err(duplicate_name(&name).into());
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name,
            category_id: input.category_id,
            description: input.description,
            normal_price: input.normal_price,
            cost_price: input.cost_price,
            discount_type: input.discount_type,
            discount_amount: input.discount_amount,
            stock: input.stock,
            active: input.active,
            available: input.available,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        ProductRepository::insert_in(&mut tx, &product)
            .await
            .map_err(|e| map_duplicate(e, "products.name", &product.name))?;
        CategoryRepository::increment_count_in(&mut tx, &product.category_id).await?;

        commit(tx).await?;

        info!(id = %product.id, stock = product.stock, "Product created");
        Ok(product.into())
    }

    /// Rewrites a product. Name uniqueness ignores the product itself;
    /// a category change moves one unit of `total_product` across.
    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: &str, input: UpdateProduct) -> ServiceResult<ProductView> {
        validate_product_input(&input)?;
        let name = input.name.trim().to_string();

        let mut tx = begin_write(&self.pool).await?;

        let current = ProductRepository::get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        if let Some(other) = ProductRepository::get_by_name_in(&mut tx, &name).await? {
            if other.id != current.id {
                return Err(duplicate_name(&name).into());
            }
        }

        let moved = current.category_id != input.category_id;
        if moved
            && CategoryRepository::get_by_id_in(&mut tx, &input.category_id)
                .await?
                .is_none()
        {
            return Err(CoreError::CategoryNotFound(input.category_id).into());
        }

        let updated = Product {
            name,
            category_id: input.category_id,
            description: input.description,
            normal_price: input.normal_price,
            cost_price: input.cost_price,
            discount_type: input.discount_type,
            discount_amount: input.discount_amount,
            stock: input.stock,
            active: input.active,
            available: input.available,
            updated_at: Utc::now(),
            ..current.clone()
        };

        ProductRepository::update_in(&mut tx, &updated)
            .await
            .map_err(|e| map_duplicate(e, "products.name", &updated.name))?;

        if moved {
            CategoryRepository::decrement_count_in(&mut tx, &current.category_id).await?;
            CategoryRepository::increment_count_in(&mut tx, &updated.category_id).await?;
        }

        commit(tx).await?;

        info!(id = %updated.id, moved, "Product updated");
        Ok(updated.into())
    }

    /// Tombstones a product and decrements its category counter.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> ServiceResult<ProductView> {
        let mut tx = begin_write(&self.pool).await?;

        let mut product = ProductRepository::get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        let now = Utc::now();
        ProductRepository::soft_delete_in(&mut tx, id, now).await?;
        CategoryRepository::decrement_count_in(&mut tx, &product.category_id).await?;

        commit(tx).await?;

        product.deleted_at = Some(now);
        product.updated_at = now;
        info!(id = %id, "Product deleted");
        Ok(product.into())
    }

    pub async fn get_product(&self, id: &str) -> ServiceResult<ProductView> {
        ProductRepository::new(self.pool.clone())
            .get_by_id(id)
            .await?
            .map(ProductView::from)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    pub async fn get_product_by_name(&self, name: &str) -> ServiceResult<ProductView> {
        ProductRepository::new(self.pool.clone())
            .get_by_name(name)
            .await?
            .map(ProductView::from)
            .ok_or_else(|| CoreError::ProductNotFound(name.trim().to_string()).into())
    }

    pub async fn list_products(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<ProductView>> {
        let search = search
            .map(validate_search_query)
            .transpose()
            .map_err(CoreError::from)?;

        let products = ProductRepository::new(self.pool.clone())
            .list(search.as_deref(), limit, offset)
            .await?;

        Ok(products.into_iter().map(ProductView::from).collect())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Creates a category. Names are stored lower-cased.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_category(&self, input: NewCategory) -> ServiceResult<ProductCategory> {
        validate_category_name(&input.name).map_err(CoreError::from)?;
        let name = normalize_category_name(&input.name);

        let mut tx = begin_write(&self.pool).await?;

        if CategoryRepository::get_by_name_in(&mut tx, &name).await?.is_some() {
            return Err(CoreError::from(ValidationError::duplicate("category name", name)).into());
        }

        let now = Utc::now();
        let category = ProductCategory {
            id: Uuid::new_v4().to_string(),
            name,
            total_product: 0,
            status: input.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        CategoryRepository::insert_in(&mut tx, &category)
            .await
            .map_err(|e| map_duplicate(e, "product_categories.name", &category.name))?;

        commit(tx).await?;

        info!(id = %category.id, "Category created");
        Ok(category)
    }

    /// Renames and/or toggles a category. Turning `status` off deactivates
    /// every member product in the same transaction.
    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        id: &str,
        input: UpdateCategory,
    ) -> ServiceResult<ProductCategory> {
        validate_category_name(&input.name).map_err(CoreError::from)?;
        let name = normalize_category_name(&input.name);

        let mut tx = begin_write(&self.pool).await?;

        let current = CategoryRepository::get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?;

        if let Some(other) = CategoryRepository::get_by_name_in(&mut tx, &name).await? {
            if other.id != current.id {
                return Err(
                    CoreError::from(ValidationError::duplicate("category name", name)).into(),
                );
            }
        }

        let updated = ProductCategory {
            name,
            status: input.status,
            updated_at: Utc::now(),
            ..current
        };

        CategoryRepository::update_in(&mut tx, &updated)
            .await
            .map_err(|e| map_duplicate(e, "product_categories.name", &updated.name))?;

        let deactivated = if updated.status {
            0
        } else {
            ProductRepository::deactivate_by_category_in(&mut tx, id).await?
        };

        commit(tx).await?;

        info!(id = %id, status = updated.status, deactivated, "Category updated");
        Ok(updated)
    }

    /// Tombstones a category and deactivates its products.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: &str) -> ServiceResult<ProductCategory> {
        let mut tx = begin_write(&self.pool).await?;

        let mut category = CategoryRepository::get_by_id_in(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?;

        let now = Utc::now();
        CategoryRepository::soft_delete_in(&mut tx, id, now).await?;
        let deactivated = ProductRepository::deactivate_by_category_in(&mut tx, id).await?;

        commit(tx).await?;

        category.deleted_at = Some(now);
        category.updated_at = now;
        info!(id = %id, deactivated, "Category deleted");
        Ok(category)
    }

    pub async fn get_category(&self, id: &str) -> ServiceResult<ProductCategory> {
        CategoryRepository::new(self.pool.clone())
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()).into())
    }

    pub async fn list_categories(&self, limit: i64, offset: i64) -> ServiceResult<Vec<ProductCategory>> {
        Ok(CategoryRepository::new(self.pool.clone())
            .list(limit, offset)
            .await?)
    }
}

fn validate_product_input(input: &NewProduct) -> CoreResult<()> {
    validate_product_name(&input.name)?;
    validate_amount("normal price", input.normal_price)?;
    validate_amount("cost price", input.cost_price)?;
    validate_stock(input.stock)?;
    validate_discount(input.discount_type, input.discount_amount)?;
    Ok(())
}

fn duplicate_name(name: &str) -> CoreError {
    ValidationError::duplicate("name", name).into()
}

/// A losing race on a unique name index reads the same as the pre-check.
fn map_duplicate(err: DbError, target: &str, name: &str) -> crate::service::ServiceError {
    if err.is_unique_violation_on(target) {
        CoreError::from(ValidationError::duplicate("name", name)).into()
    } else {
        err.into()
    }
}
