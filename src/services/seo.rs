//! SEO tooling: catalog audits, alt-text suggestions, and sitemap generation.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{category, product, product::ProductStatus, product_image};
use crate::errors::ServiceError;

/// Meta titles longer than this get truncated on result pages.
pub const MAX_META_TITLE_CHARS: usize = 60;
pub const MIN_META_DESCRIPTION_CHARS: usize = 50;
pub const MAX_META_DESCRIPTION_CHARS: usize = 160;
pub const MIN_ALT_TEXT_CHARS: usize = 5;
/// Images above this size hurt page speed scores.
pub const MAX_IMAGE_BYTES: i64 = 300 * 1024;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9-]+$").unwrap_or_else(|e| panic!("invalid slug regex: {}", e))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeoIssue {
    pub code: &'static str,
    pub severity: IssueSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductAudit {
    pub product_id: Uuid,
    pub slug: String,
    /// 100 minus penalties, floored at zero.
    pub score: u32,
    pub issues: Vec<SeoIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub audited: usize,
    pub average_score: u32,
    pub products: Vec<ProductAudit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryAudit {
    pub category_id: Uuid,
    pub slug: String,
    pub score: u32,
    pub issues: Vec<SeoIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryAuditReport {
    pub audited: usize,
    pub average_score: u32,
    pub categories: Vec<CategoryAudit>,
}

/// Audits one product against the storefront SEO heuristics. Pure so the
/// maintenance CLI and the API share it.
pub fn audit_product(product: &product::Model, images: &[product_image::Model]) -> ProductAudit {
    let mut issues = Vec::new();

    match product.meta_title.as_deref().map(str::trim) {
        None | Some("") => issues.push(SeoIssue {
            code: "missing_meta_title",
            severity: IssueSeverity::Error,
            message: "Product has no meta title".to_string(),
        }),
        Some(title) if title.chars().count() > MAX_META_TITLE_CHARS => issues.push(SeoIssue {
            code: "meta_title_too_long",
            severity: IssueSeverity::Warning,
            message: format!(
                "Meta title is {} characters, maximum is {}",
                title.chars().count(),
                MAX_META_TITLE_CHARS
            ),
        }),
        Some(_) => {}
    }

    match product.meta_description.as_deref().map(str::trim) {
        None | Some("") => issues.push(SeoIssue {
            code: "missing_meta_description",
            severity: IssueSeverity::Error,
            message: "Product has no meta description".to_string(),
        }),
        Some(desc) => {
            let len = desc.chars().count();
            if len < MIN_META_DESCRIPTION_CHARS {
                issues.push(SeoIssue {
                    code: "meta_description_too_short",
                    severity: IssueSeverity::Warning,
                    message: format!(
                        "Meta description is {} characters, minimum is {}",
                        len, MIN_META_DESCRIPTION_CHARS
                    ),
                });
            } else if len > MAX_META_DESCRIPTION_CHARS {
                issues.push(SeoIssue {
                    code: "meta_description_too_long",
                    severity: IssueSeverity::Warning,
                    message: format!(
                        "Meta description is {} characters, maximum is {}",
                        len, MAX_META_DESCRIPTION_CHARS
                    ),
                });
            }
        }
    }

    if !SLUG_RE.is_match(&product.slug) {
        issues.push(SeoIssue {
            code: "invalid_slug",
            severity: IssueSeverity::Error,
            message: format!(
                "Slug '{}' contains characters outside a-z, 0-9 and '-'",
                product.slug
            ),
        });
    }

    if images.is_empty() {
        issues.push(SeoIssue {
            code: "no_images",
            severity: IssueSeverity::Warning,
            message: "Product has no images".to_string(),
        });
    }
    for image in images {
        let alt_ok = image
            .alt_text
            .as_deref()
            .map(|alt| alt.trim().chars().count() >= MIN_ALT_TEXT_CHARS)
            .unwrap_or(false);
        if !alt_ok {
            issues.push(SeoIssue {
                code: "missing_alt_text",
                severity: IssueSeverity::Warning,
                message: format!("Image '{}' has no usable alt text", image.file_path),
            });
        }
        if let Some(size) = image.file_size_bytes {
            if size > MAX_IMAGE_BYTES {
                issues.push(SeoIssue {
                    code: "image_too_large",
                    severity: IssueSeverity::Warning,
                    message: format!(
                        "Image '{}' is {} KB, maximum is {} KB",
                        image.file_path,
                        size / 1024,
                        MAX_IMAGE_BYTES / 1024
                    ),
                });
            }
        }
    }

    let penalty: u32 = issues
        .iter()
        .map(|i| match i.severity {
            IssueSeverity::Error => 25,
            IssueSeverity::Warning => 10,
        })
        .sum();

    ProductAudit {
        product_id: product.id,
        slug: product.slug.clone(),
        score: 100u32.saturating_sub(penalty),
        issues,
    }
}

/// Audits one category against the same metadata heuristics as products.
pub fn audit_category(category: &category::Model) -> CategoryAudit {
    let mut issues = Vec::new();

    match category.meta_title.as_deref().map(str::trim) {
        None | Some("") => issues.push(SeoIssue {
            code: "missing_meta_title",
            severity: IssueSeverity::Error,
            message: "Category has no meta title".to_string(),
        }),
        Some(title) if title.chars().count() > MAX_META_TITLE_CHARS => issues.push(SeoIssue {
            code: "meta_title_too_long",
            severity: IssueSeverity::Warning,
            message: format!(
                "Meta title is {} characters, maximum is {}",
                title.chars().count(),
                MAX_META_TITLE_CHARS
            ),
        }),
        Some(_) => {}
    }

    match category.meta_description.as_deref().map(str::trim) {
        None | Some("") => issues.push(SeoIssue {
            code: "missing_meta_description",
            severity: IssueSeverity::Error,
            message: "Category has no meta description".to_string(),
        }),
        Some(desc) => {
            let len = desc.chars().count();
            if len < MIN_META_DESCRIPTION_CHARS {
                issues.push(SeoIssue {
                    code: "meta_description_too_short",
                    severity: IssueSeverity::Warning,
                    message: format!(
                        "Meta description is {} characters, minimum is {}",
                        len, MIN_META_DESCRIPTION_CHARS
                    ),
                });
            } else if len > MAX_META_DESCRIPTION_CHARS {
                issues.push(SeoIssue {
                    code: "meta_description_too_long",
                    severity: IssueSeverity::Warning,
                    message: format!(
                        "Meta description is {} characters, maximum is {}",
                        len, MAX_META_DESCRIPTION_CHARS
                    ),
                });
            }
        }
    }

    if !SLUG_RE.is_match(&category.slug) {
        issues.push(SeoIssue {
            code: "invalid_slug",
            severity: IssueSeverity::Error,
            message: format!(
                "Slug '{}' contains characters outside a-z, 0-9 and '-'",
                category.slug
            ),
        });
    }

    let penalty: u32 = issues
        .iter()
        .map(|i| match i.severity {
            IssueSeverity::Error => 25,
            IssueSeverity::Warning => 10,
        })
        .sum();

    CategoryAudit {
        category_id: category.id,
        slug: category.slug.clone(),
        score: 100u32.saturating_sub(penalty),
        issues,
    }
}

/// Template alt text for an image with none: product name plus category name.
pub fn suggest_alt_text(product_name: &str, category_name: &str) -> String {
    format!("{} in {}", product_name.trim(), category_name.trim())
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[derive(Clone)]
pub struct SeoService {
    db_pool: Arc<DbPool>,
    public_base_url: String,
}

impl SeoService {
    pub fn new(db_pool: Arc<DbPool>, public_base_url: impl Into<String>) -> Self {
        Self {
            db_pool,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Audits every active product.
    #[instrument(skip(self))]
    pub async fn audit_catalog(&self) -> Result<AuditReport, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .order_by_asc(product::Column::Slug)
            .all(&*self.db_pool)
            .await?;

        let mut audits = Vec::with_capacity(products.len());
        for item in &products {
            let images = product_image::Entity::find()
                .filter(product_image::Column::ProductId.eq(item.id))
                .all(&*self.db_pool)
                .await?;
            audits.push(audit_product(item, &images));
        }

        let average_score = if audits.is_empty() {
            100
        } else {
            audits.iter().map(|a| a.score).sum::<u32>() / audits.len() as u32
        };

        Ok(AuditReport {
            audited: audits.len(),
            average_score,
            products: audits,
        })
    }

    /// Audits every active category.
    #[instrument(skip(self))]
    pub async fn audit_categories(&self) -> Result<CategoryAuditReport, ServiceError> {
        let categories = category::Entity::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Slug)
            .all(&*self.db_pool)
            .await?;

        let audits: Vec<CategoryAudit> = categories.iter().map(audit_category).collect();
        let average_score = if audits.is_empty() {
            100
        } else {
            audits.iter().map(|a| a.score).sum::<u32>() / audits.len() as u32
        };

        Ok(CategoryAuditReport {
            audited: audits.len(),
            average_score,
            categories: audits,
        })
    }

    /// Fills in missing or too-short alt text from the suggestion template.
    /// Returns the number of images updated.
    #[instrument(skip(self))]
    pub async fn fix_missing_alt_text(&self) -> Result<u64, ServiceError> {
        let products = product::Entity::find().all(&*self.db_pool).await?;
        let mut updated = 0u64;

        for item in products {
            let category_name = match item.category_id {
                Some(category_id) => category::Entity::find_by_id(category_id)
                    .one(&*self.db_pool)
                    .await?
                    .map(|c| c.name),
                None => None,
            }
            .unwrap_or_else(|| "the marketplace".to_string());

            let images = product_image::Entity::find()
                .filter(product_image::Column::ProductId.eq(item.id))
                .all(&*self.db_pool)
                .await?;
            for image in images {
                let usable = image
                    .alt_text
                    .as_deref()
                    .map(|alt| alt.trim().chars().count() >= MIN_ALT_TEXT_CHARS)
                    .unwrap_or(false);
                if usable {
                    continue;
                }
                let suggestion = suggest_alt_text(&item.name, &category_name);
                let mut active: product_image::ActiveModel = image.into();
                active.alt_text = Set(Some(suggestion));
                active.update(&*self.db_pool).await?;
                updated += 1;
            }
        }

        info!(updated, "alt text backfilled");
        Ok(updated)
    }

    /// Renders `sitemap.xml` covering the storefront root, active categories,
    /// and active products.
    #[instrument(skip(self))]
    pub async fn generate_sitemap(&self) -> Result<String, ServiceError> {
        let categories = category::Entity::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Slug)
            .all(&*self.db_pool)
            .await?;
        let products = product::Entity::find()
            .filter(product::Column::Status.eq(ProductStatus::Active))
            .order_by_asc(product::Column::Slug)
            .all(&*self.db_pool)
            .await?;

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
        self.push_url(&mut xml, "", None);
        for cat in &categories {
            self.push_url(
                &mut xml,
                &format!("/categories/{}", cat.slug),
                cat.updated_at.or(Some(cat.created_at)),
            );
        }
        for item in &products {
            self.push_url(
                &mut xml,
                &format!("/products/{}", item.slug),
                item.updated_at.or(Some(item.created_at)),
            );
        }
        xml.push_str("</urlset>\n");
        Ok(xml)
    }

    fn push_url(
        &self,
        xml: &mut String,
        path: &str,
        last_modified: Option<chrono::DateTime<chrono::Utc>>,
    ) {
        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}{}</loc>\n",
            xml_escape(&self.public_base_url),
            xml_escape(path)
        ));
        if let Some(modified) = last_modified {
            xml.push_str(&format!(
                "    <lastmod>{}</lastmod>\n",
                modified.format("%Y-%m-%d")
            ));
        }
        xml.push_str("  </url>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn sample_product(meta_title: Option<&str>, meta_description: Option<&str>, slug: &str) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            category_id: None,
            name: "Walnut Desk".to_string(),
            slug: slug.to_string(),
            description: None,
            price: dec!(100),
            compare_at_price: None,
            currency: "USD".to_string(),
            stock_quantity: 3,
            status: ProductStatus::Active,
            is_featured: false,
            is_premium: false,
            meta_title: meta_title.map(String::from),
            meta_description: meta_description.map(String::from),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn sample_image(alt: Option<&str>, size: i64) -> product_image::Model {
        product_image::Model {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            file_path: "products/desk.jpg".to_string(),
            alt_text: alt.map(String::from),
            position: 0,
            width: Some(1200),
            height: Some(800),
            file_size_bytes: Some(size),
            is_watermarked: false,
        }
    }

    #[test]
    fn clean_product_scores_full_marks() {
        let product = sample_product(
            Some("Walnut Desk | Handmade Furniture"),
            Some("A solid walnut desk handmade in our workshop, finished with natural oil."),
            "walnut-desk",
        );
        let images = [sample_image(Some("Walnut desk front view"), 120 * 1024)];
        let audit = audit_product(&product, &images);
        assert_eq!(audit.score, 100);
        assert!(audit.issues.is_empty());
    }

    #[test]
    fn missing_metadata_is_flagged() {
        let product = sample_product(None, None, "walnut-desk");
        let audit = audit_product(&product, &[]);
        let codes: Vec<_> = audit.issues.iter().map(|i| i.code).collect();
        assert!(codes.contains(&"missing_meta_title"));
        assert!(codes.contains(&"missing_meta_description"));
        assert!(codes.contains(&"no_images"));
        assert_eq!(audit.score, 40);
    }

    #[test]
    fn length_and_slug_violations_are_flagged() {
        let long_title = "x".repeat(61);
        let product = sample_product(Some(&long_title), Some("too short"), "Walnut_Desk");
        let images = [sample_image(Some("alt"), 400 * 1024)];
        let audit = audit_product(&product, &images);
        let codes: Vec<_> = audit.issues.iter().map(|i| i.code).collect();
        assert!(codes.contains(&"meta_title_too_long"));
        assert!(codes.contains(&"meta_description_too_short"));
        assert!(codes.contains(&"invalid_slug"));
        assert!(codes.contains(&"missing_alt_text"));
        assert!(codes.contains(&"image_too_large"));
    }

    #[test]
    fn category_audit_checks_metadata_and_slug() {
        let clean = category::Model {
            id: Uuid::new_v4(),
            name: "Furniture".to_string(),
            slug: "furniture".to_string(),
            parent_id: None,
            description: None,
            image_path: None,
            position: 0,
            is_active: true,
            meta_title: Some("Furniture | The Marketplace".to_string()),
            meta_description: Some(
                "Handmade furniture from independent makers, shipped straight from the workshop."
                    .to_string(),
            ),
            created_at: Utc::now(),
            updated_at: None,
        };
        assert_eq!(audit_category(&clean).score, 100);

        let bare = category::Model {
            slug: "Bad_Slug".to_string(),
            meta_title: None,
            meta_description: None,
            ..clean
        };
        let audit = audit_category(&bare);
        let codes: Vec<_> = audit.issues.iter().map(|i| i.code).collect();
        assert!(codes.contains(&"missing_meta_title"));
        assert!(codes.contains(&"missing_meta_description"));
        assert!(codes.contains(&"invalid_slug"));
        assert_eq!(audit.score, 25);
    }

    #[test]
    fn alt_text_suggestion_uses_product_and_category() {
        assert_eq!(
            suggest_alt_text(" Walnut Desk ", "Office Furniture"),
            "Walnut Desk in Office Furniture"
        );
    }

    #[test]
    fn xml_escaping() {
        assert_eq!(xml_escape("a&b<c>"), "a&amp;b&lt;c&gt;");
    }
}
