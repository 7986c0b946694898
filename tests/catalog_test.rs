mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use marketplace_api::entities::product::ProductStatus;
use marketplace_api::errors::ServiceError;
use marketplace_api::services::catalog::{
    CatalogService, CreateCategoryInput, CreateProductInput, ProductFilter, RegisterImageInput,
};
use marketplace_api::services::images::variant_path;

fn product_input(vendor_id: uuid::Uuid, name: &str) -> CreateProductInput {
    CreateProductInput {
        vendor_id,
        category_id: None,
        name: name.to_string(),
        slug: None,
        description: None,
        price: dec!(10.00),
        compare_at_price: None,
        currency: None,
        stock_quantity: 5,
        status: Some(ProductStatus::Active),
        is_featured: None,
        is_premium: None,
        meta_title: None,
        meta_description: None,
    }
}

#[tokio::test]
async fn slugs_are_deduplicated_with_numeric_suffixes() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Slugs", None).await;
    let uploads = tempfile::tempdir().unwrap();
    let service = CatalogService::new(pool.clone(), common::drained_events(), uploads.path());

    let first = service
        .create_product(product_input(vendor.id, "Walnut Desk"))
        .await
        .unwrap();
    let second = service
        .create_product(product_input(vendor.id, "Walnut Desk"))
        .await
        .unwrap();

    assert_eq!(first.slug, "walnut-desk");
    assert_eq!(second.slug, "walnut-desk-2");

    let (found, _) = service
        .list_products(
            ProductFilter {
                vendor_id: Some(vendor.id),
                q: Some("walnut".to_string()),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn image_registration_validates_the_path_and_file() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Pics", None).await;
    let uploads = tempfile::tempdir().unwrap();
    let service = CatalogService::new(pool.clone(), common::drained_events(), uploads.path());

    let product = service
        .create_product(product_input(vendor.id, "Framed Print"))
        .await
        .unwrap();

    let traversal = service
        .register_image(
            product.id,
            RegisterImageInput {
                file_path: "../etc/passwd".to_string(),
                alt_text: None,
                position: None,
                width: None,
                height: None,
            },
        )
        .await;
    assert_matches!(traversal, Err(ServiceError::ValidationError(_)));

    let missing = service
        .register_image(
            product.id,
            RegisterImageInput {
                file_path: "nope.jpg".to_string(),
                alt_text: None,
                position: None,
                width: None,
                height: None,
            },
        )
        .await;
    assert_matches!(missing, Err(ServiceError::NotFound(_)));

    std::fs::write(uploads.path().join("print.jpg"), b"jpegbytes").unwrap();
    let image = service
        .register_image(
            product.id,
            RegisterImageInput {
                file_path: "print.jpg".to_string(),
                alt_text: Some("A framed print".to_string()),
                position: None,
                width: None,
                height: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(image.file_size_bytes, Some(9));
}

#[tokio::test]
async fn deleting_a_product_removes_its_files_and_variants() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Cleanup", None).await;
    let uploads = tempfile::tempdir().unwrap();
    let service = CatalogService::new(pool.clone(), common::drained_events(), uploads.path());

    let product = service
        .create_product(product_input(vendor.id, "Short Lived"))
        .await
        .unwrap();

    let original = uploads.path().join("shot.jpg");
    std::fs::write(&original, b"jpegbytes").unwrap();
    let w640 = variant_path(&original, 640);
    std::fs::write(&w640, b"jpegbytes").unwrap();

    service
        .register_image(
            product.id,
            RegisterImageInput {
                file_path: "shot.jpg".to_string(),
                alt_text: None,
                position: None,
                width: None,
                height: None,
            },
        )
        .await
        .unwrap();

    service.delete_product(product.id).await.unwrap();

    assert!(!original.exists());
    assert!(!w640.exists());
    let gone = service.get_product(product.id).await;
    assert_matches!(gone, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn categories_with_products_or_children_refuse_deletion() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Taxonomy", None).await;
    let uploads = tempfile::tempdir().unwrap();
    let service = CatalogService::new(pool.clone(), common::drained_events(), uploads.path());

    let parent = service
        .create_category(CreateCategoryInput {
            name: "Furniture".to_string(),
            slug: None,
            parent_id: None,
            description: None,
            image_path: None,
            position: None,
            meta_title: None,
            meta_description: None,
        })
        .await
        .unwrap();
    let child = service
        .create_category(CreateCategoryInput {
            name: "Chairs".to_string(),
            slug: None,
            parent_id: Some(parent.id),
            description: None,
            image_path: None,
            position: None,
            meta_title: None,
            meta_description: None,
        })
        .await
        .unwrap();

    let duplicate = service
        .create_category(CreateCategoryInput {
            name: "Furniture".to_string(),
            slug: None,
            parent_id: None,
            description: None,
            image_path: None,
            position: None,
            meta_title: None,
            meta_description: None,
        })
        .await;
    assert_matches!(duplicate, Err(ServiceError::Conflict(_)));

    let blocked_by_child = service.delete_category(parent.id).await;
    assert_matches!(blocked_by_child, Err(ServiceError::Conflict(_)));

    let mut input = product_input(vendor.id, "Dining Chair");
    input.category_id = Some(child.id);
    service.create_product(input).await.unwrap();

    let blocked_by_products = service.delete_category(child.id).await;
    assert_matches!(blocked_by_products, Err(ServiceError::Conflict(_)));
}
