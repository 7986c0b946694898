use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    category, product,
    product::ProductStatus,
    product_image,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::images;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub vendor_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub currency: Option<String>,
    pub stock_quantity: i32,
    pub status: Option<ProductStatus>,
    pub is_featured: Option<bool>,
    pub is_premium: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub category_id: Option<Option<Uuid>>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub compare_at_price: Option<Option<Decimal>>,
    pub stock_quantity: Option<i32>,
    pub status: Option<ProductStatus>,
    pub is_featured: Option<bool>,
    pub is_premium: Option<bool>,
    pub meta_title: Option<Option<String>>,
    pub meta_description: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub vendor_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
    pub featured: Option<bool>,
    pub premium: Option<bool>,
    /// Case-insensitive substring match on the product name.
    pub q: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterImageInput {
    /// Path relative to the uploads directory. The file must already exist.
    pub file_path: String,
    pub alt_text: Option<String>,
    pub position: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub position: Option<i32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
    pub description: Option<Option<String>>,
    pub image_path: Option<Option<String>>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
    pub meta_title: Option<Option<String>>,
    pub meta_description: Option<Option<String>>,
}

/// Turns arbitrary text into a URL slug: lowercase ASCII alphanumerics joined
/// by single hyphens.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_hyphen = true;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Product and category management for the storefront and vendor portal.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    uploads_dir: PathBuf,
}

impl CatalogService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        uploads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            uploads_dir: uploads_dir.into(),
        }
    }

    /// Resolves a unique product slug, appending a numeric suffix on
    /// collision.
    async fn unique_product_slug(
        &self,
        base: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<String, ServiceError> {
        let base = slugify(base);
        if base.is_empty() {
            return Err(ServiceError::ValidationError(
                "Slug must contain at least one alphanumeric character".to_string(),
            ));
        }

        let mut candidate = base.clone();
        for attempt in 2..100 {
            let mut query =
                product::Entity::find().filter(product::Column::Slug.eq(candidate.clone()));
            if let Some(id) = exclude_id {
                query = query.filter(product::Column::Id.ne(id));
            }
            if query.count(&*self.db_pool).await? == 0 {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, attempt);
        }
        Err(ServiceError::Conflict(format!(
            "Could not find a free slug for '{}'",
            base
        )))
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name is required".to_string(),
            ));
        }
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }

        let slug_source = input.slug.as_deref().unwrap_or(&input.name);
        let slug = self.unique_product_slug(slug_source, None).await?;
        let now = Utc::now();

        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(input.vendor_id),
            category_id: Set(input.category_id),
            name: Set(input.name.trim().to_string()),
            slug: Set(slug),
            description: Set(input.description),
            price: Set(input.price),
            compare_at_price: Set(input.compare_at_price),
            currency: Set(input.currency.unwrap_or_else(|| "USD".to_string())),
            stock_quantity: Set(input.stock_quantity.max(0)),
            status: Set(input.status.unwrap_or(ProductStatus::Draft)),
            is_featured: Set(input.is_featured.unwrap_or(false)),
            is_premium: Set(input.is_premium.unwrap_or(false)),
            meta_title: Set(input.meta_title),
            meta_description: Set(input.meta_description),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&*self.db_pool)
        .await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;
        Ok(product)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let product = self.find_product(product_id).await?;
        let mut active: product::ActiveModel = product.into();

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Product name is required".to_string(),
                ));
            }
            active.name = Set(name.trim().to_string());
        }
        if let Some(slug) = input.slug {
            active.slug = Set(self.unique_product_slug(&slug, Some(product_id)).await?);
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price cannot be negative".to_string(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(compare_at_price) = input.compare_at_price {
            active.compare_at_price = Set(compare_at_price);
        }
        if let Some(stock_quantity) = input.stock_quantity {
            active.stock_quantity = Set(stock_quantity.max(0));
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(is_featured) = input.is_featured {
            active.is_featured = Set(is_featured);
        }
        if let Some(is_premium) = input.is_premium {
            active.is_premium = Set(is_premium);
        }
        if let Some(meta_title) = input.meta_title {
            active.meta_title = Set(meta_title);
        }
        if let Some(meta_description) = input.meta_description {
            active.meta_description = Set(meta_description);
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db_pool).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;
        Ok(updated)
    }

    /// Deletes a product along with its image rows and their files on disk,
    /// including any generated responsive variants.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let product = self.find_product(product_id).await?;

        let product_images = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .all(&*self.db_pool)
            .await?;
        for image in &product_images {
            self.remove_image_files(&image.file_path).await;
        }

        product_image::Entity::delete_many()
            .filter(product_image::Column::ProductId.eq(product_id))
            .exec(&*self.db_pool)
            .await?;
        product.delete(&*self.db_pool).await?;

        info!(product_id = %product_id, images = product_images.len(), "product deleted");
        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;
        Ok(())
    }

    async fn remove_image_files(&self, relative_path: &str) {
        let base = self.uploads_dir.join(relative_path);
        for path in std::iter::once(base.clone())
            .chain(images::variant_paths(&base).into_iter())
        {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "failed to remove image file: {}", e),
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        product_id: Uuid,
    ) -> Result<(product::Model, Vec<product_image::Model>), ServiceError> {
        let product = self.find_product(product_id).await?;
        let product_images = self.list_images(product_id).await?;
        Ok((product, product_images))
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_slug(
        &self,
        slug: &str,
    ) -> Result<(product::Model, Vec<product_image::Model>), ServiceError> {
        let product = product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))?;
        let product_images = self.list_images(product.id).await?;
        Ok((product, product_images))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = product::Entity::find().order_by_desc(product::Column::CreatedAt);
        if let Some(vendor_id) = filter.vendor_id {
            query = query.filter(product::Column::VendorId.eq(vendor_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(product::Column::Status.eq(status));
        }
        if let Some(featured) = filter.featured {
            query = query.filter(product::Column::IsFeatured.eq(featured));
        }
        if let Some(premium) = filter.premium {
            query = query.filter(product::Column::IsPremium.eq(premium));
        }
        if let Some(q) = filter.q {
            query = query.filter(product::Column::Name.contains(&q));
        }

        let paginator = query.paginate(&*self.db_pool, per_page.max(1));
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((products, total))
    }

    /// Registers an already-uploaded file as a product image. The file must
    /// exist under the uploads directory.
    #[instrument(skip(self, input))]
    pub async fn register_image(
        &self,
        product_id: Uuid,
        input: RegisterImageInput,
    ) -> Result<product_image::Model, ServiceError> {
        self.find_product(product_id).await?;

        if input.file_path.contains("..") || Path::new(&input.file_path).is_absolute() {
            return Err(ServiceError::ValidationError(
                "Image path must be relative to the uploads directory".to_string(),
            ));
        }

        let full_path = self.uploads_dir.join(&input.file_path);
        let metadata = tokio::fs::metadata(&full_path).await.map_err(|_| {
            ServiceError::NotFound(format!("Uploaded file '{}' not found", input.file_path))
        })?;

        let image = product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            file_path: Set(input.file_path),
            alt_text: Set(input.alt_text),
            position: Set(input.position.unwrap_or(0)),
            width: Set(input.width),
            height: Set(input.height),
            file_size_bytes: Set(Some(metadata.len() as i64)),
            is_watermarked: Set(false),
        }
        .insert(&*self.db_pool)
        .await?;
        Ok(image)
    }

    #[instrument(skip(self))]
    pub async fn update_image_alt_text(
        &self,
        image_id: Uuid,
        alt_text: Option<String>,
    ) -> Result<product_image::Model, ServiceError> {
        let image = product_image::Entity::find_by_id(image_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {} not found", image_id)))?;
        let mut active: product_image::ActiveModel = image.into();
        active.alt_text = Set(alt_text);
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_image(&self, image_id: Uuid) -> Result<(), ServiceError> {
        let image = product_image::Entity::find_by_id(image_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {} not found", image_id)))?;
        self.remove_image_files(&image.file_path).await;
        image.delete(&*self.db_pool).await?;
        Ok(())
    }

    pub async fn list_images(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<product_image::Model>, ServiceError> {
        Ok(product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::Position)
            .all(&*self.db_pool)
            .await?)
    }

    async fn find_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    // Categories

    #[instrument(skip(self, input))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name is required".to_string(),
            ));
        }

        let slug_source = input.slug.as_deref().unwrap_or(&input.name);
        let slug = slugify(slug_source);
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Slug must contain at least one alphanumeric character".to_string(),
            ));
        }
        let existing = category::Entity::find()
            .filter(category::Column::Slug.eq(slug.clone()))
            .count(&*self.db_pool)
            .await?;
        if existing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category slug '{}' is already in use",
                slug
            )));
        }

        if let Some(parent_id) = input.parent_id {
            self.find_category(parent_id).await?;
        }

        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            slug: Set(slug),
            parent_id: Set(input.parent_id),
            description: Set(input.description),
            image_path: Set(input.image_path),
            position: Set(input.position.unwrap_or(0)),
            is_active: Set(true),
            meta_title: Set(input.meta_title),
            meta_description: Set(input.meta_description),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db_pool)
        .await?;
        Ok(category)
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        let category = self.find_category(category_id).await?;
        let mut active: category::ActiveModel = category.into();

        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(slug) = input.slug {
            let slug = slugify(&slug);
            let clash = category::Entity::find()
                .filter(category::Column::Slug.eq(slug.clone()))
                .filter(category::Column::Id.ne(category_id))
                .count(&*self.db_pool)
                .await?;
            if clash > 0 {
                return Err(ServiceError::Conflict(format!(
                    "Category slug '{}' is already in use",
                    slug
                )));
            }
            active.slug = Set(slug);
        }
        if let Some(parent_id) = input.parent_id {
            if parent_id == Some(category_id) {
                return Err(ServiceError::ValidationError(
                    "Category cannot be its own parent".to_string(),
                ));
            }
            active.parent_id = Set(parent_id);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(image_path) = input.image_path {
            active.image_path = Set(image_path);
        }
        if let Some(position) = input.position {
            active.position = Set(position);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(meta_title) = input.meta_title {
            active.meta_title = Set(meta_title);
        }
        if let Some(meta_description) = input.meta_description {
            active.meta_description = Set(meta_description);
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db_pool).await?)
    }

    /// A category with products or child categories cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let category = self.find_category(category_id).await?;

        let product_count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .count(&*self.db_pool)
            .await?;
        if product_count > 0 {
            return Err(ServiceError::Conflict(
                "Category still has products assigned".to_string(),
            ));
        }
        let child_count = category::Entity::find()
            .filter(category::Column::ParentId.eq(category_id))
            .count(&*self.db_pool)
            .await?;
        if child_count > 0 {
            return Err(ServiceError::Conflict(
                "Category still has child categories".to_string(),
            ));
        }

        category.delete(&*self.db_pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        only_active: bool,
    ) -> Result<Vec<category::Model>, ServiceError> {
        let mut query = category::Entity::find()
            .order_by_asc(category::Column::Position)
            .order_by_asc(category::Column::Name);
        if only_active {
            query = query.filter(category::Column::IsActive.eq(true));
        }
        Ok(query.all(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<category::Model, ServiceError> {
        category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category '{}' not found", slug)))
    }

    async fn find_category(&self, category_id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugify_normalizes_text() {
        assert_eq!(slugify("Handmade Oak Table"), "handmade-oak-table");
        assert_eq!(slugify("  Déjà  vu!  "), "d-j-vu");
        assert_eq!(slugify("--already--slugged--"), "already-slugged");
        assert_eq!(slugify("***"), "");
    }
}
