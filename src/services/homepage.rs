use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    banner, homepage_section,
    homepage_section::SectionKind,
    product,
    product::ProductStatus,
};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBannerInput {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_path: String,
    pub link_url: Option<String>,
    pub position: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBannerInput {
    pub title: Option<String>,
    pub subtitle: Option<Option<String>>,
    pub image_path: Option<String>,
    pub link_url: Option<Option<String>>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSectionInput {
    pub title: String,
    pub kind: SectionKind,
    pub category_id: Option<Uuid>,
    pub position: Option<i32>,
}

/// One storefront carousel with its resolved products.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSection {
    pub section: homepage_section::Model,
    pub products: Vec<product::Model>,
}

/// The composed public homepage payload.
#[derive(Debug, Clone, Serialize)]
pub struct HomepageView {
    pub banners: Vec<banner::Model>,
    pub sections: Vec<ResolvedSection>,
}

/// Banners and curated homepage sections.
#[derive(Clone)]
pub struct HomepageService {
    db_pool: Arc<DbPool>,
    section_size: u64,
}

impl HomepageService {
    /// `section_size` caps how many products each carousel resolves to.
    pub fn new(db_pool: Arc<DbPool>, section_size: u64) -> Self {
        Self {
            db_pool,
            section_size: section_size.max(1),
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create_banner(
        &self,
        input: CreateBannerInput,
    ) -> Result<banner::Model, ServiceError> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Banner title is required".to_string(),
            ));
        }
        if let (Some(starts), Some(ends)) = (input.starts_at, input.ends_at) {
            if ends <= starts {
                return Err(ServiceError::ValidationError(
                    "Banner end must be after its start".to_string(),
                ));
            }
        }

        Ok(banner::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title.trim().to_string()),
            subtitle: Set(input.subtitle),
            image_path: Set(input.image_path),
            link_url: Set(input.link_url),
            position: Set(input.position.unwrap_or(0)),
            is_active: Set(true),
            starts_at: Set(input.starts_at),
            ends_at: Set(input.ends_at),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_banner(
        &self,
        banner_id: Uuid,
        input: UpdateBannerInput,
    ) -> Result<banner::Model, ServiceError> {
        let banner = self.find_banner(banner_id).await?;
        let mut active: banner::ActiveModel = banner.into();

        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(subtitle) = input.subtitle {
            active.subtitle = Set(subtitle);
        }
        if let Some(image_path) = input.image_path {
            active.image_path = Set(image_path);
        }
        if let Some(link_url) = input.link_url {
            active.link_url = Set(link_url);
        }
        if let Some(position) = input.position {
            active.position = Set(position);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(starts_at) = input.starts_at {
            active.starts_at = Set(starts_at);
        }
        if let Some(ends_at) = input.ends_at {
            active.ends_at = Set(ends_at);
        }

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_banner(&self, banner_id: Uuid) -> Result<(), ServiceError> {
        let banner = self.find_banner(banner_id).await?;
        banner.delete(&*self.db_pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_banners(&self) -> Result<Vec<banner::Model>, ServiceError> {
        Ok(banner::Entity::find()
            .order_by_asc(banner::Column::Position)
            .all(&*self.db_pool)
            .await?)
    }

    /// Banners currently inside their active window, in display order.
    pub async fn live_banners(&self, now: DateTime<Utc>) -> Result<Vec<banner::Model>, ServiceError> {
        Ok(self
            .list_banners()
            .await?
            .into_iter()
            .filter(|b| b.is_live(now))
            .collect())
    }

    #[instrument(skip(self, input))]
    pub async fn create_section(
        &self,
        input: CreateSectionInput,
    ) -> Result<homepage_section::Model, ServiceError> {
        if input.kind == SectionKind::Category && input.category_id.is_none() {
            return Err(ServiceError::ValidationError(
                "Category sections must reference a category".to_string(),
            ));
        }

        Ok(homepage_section::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title.trim().to_string()),
            kind: Set(input.kind),
            category_id: Set(input.category_id),
            position: Set(input.position.unwrap_or(0)),
            is_active: Set(true),
        }
        .insert(&*self.db_pool)
        .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_section(&self, section_id: Uuid) -> Result<(), ServiceError> {
        let section = homepage_section::Entity::find_by_id(section_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Section {} not found", section_id)))?;
        section.delete(&*self.db_pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_sections(&self) -> Result<Vec<homepage_section::Model>, ServiceError> {
        Ok(homepage_section::Entity::find()
            .order_by_asc(homepage_section::Column::Position)
            .all(&*self.db_pool)
            .await?)
    }

    /// Composes the public homepage: live banners plus each active section
    /// resolved to its products.
    #[instrument(skip(self))]
    pub async fn compose(&self, now: DateTime<Utc>) -> Result<HomepageView, ServiceError> {
        let banners = self.live_banners(now).await?;
        let sections = self.list_sections().await?;

        let mut resolved = Vec::new();
        for section in sections.into_iter().filter(|s| s.is_active) {
            let mut query = product::Entity::find()
                .filter(product::Column::Status.eq(ProductStatus::Active))
                .order_by_desc(product::Column::CreatedAt)
                .limit(self.section_size);
            query = match section.kind {
                SectionKind::Featured => query.filter(product::Column::IsFeatured.eq(true)),
                SectionKind::Premium => query.filter(product::Column::IsPremium.eq(true)),
                SectionKind::Category => {
                    query.filter(product::Column::CategoryId.eq(section.category_id))
                }
            };
            let products = query.all(&*self.db_pool).await?;
            resolved.push(ResolvedSection { section, products });
        }

        Ok(HomepageView {
            banners,
            sections: resolved,
        })
    }

    async fn find_banner(&self, banner_id: Uuid) -> Result<banner::Model, ServiceError> {
        banner::Entity::find_by_id(banner_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Banner {} not found", banner_id)))
    }
}
