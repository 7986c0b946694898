mod common;

use assert_matches::assert_matches;
use sea_orm::ModelTrait;

use marketplace_api::entities::inquiry::InquiryStatus;
use marketplace_api::entities::user::UserRole;
use marketplace_api::errors::ServiceError;
use marketplace_api::services::inquiries::{CreateInquiryInput, InquiryFilter, InquiryService};

async fn open_thread(
    service: &InquiryService,
    customer_id: uuid::Uuid,
    vendor_id: uuid::Uuid,
) -> marketplace_api::entities::inquiry::Model {
    let (inquiry, _) = service
        .create_inquiry(CreateInquiryInput {
            customer_id,
            vendor_id,
            product_id: None,
            order_id: None,
            subject: "Where is my order?".to_string(),
            body: "It has been a week.".to_string(),
        })
        .await
        .unwrap();
    inquiry
}

#[tokio::test]
async fn opening_a_thread_records_the_first_message() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Support Co", None).await;
    let customer = common::seed_customer(&pool).await;
    let service = InquiryService::new(pool.clone(), common::drained_events());

    let inquiry = open_thread(&service, customer.id, vendor.id).await;
    assert_eq!(inquiry.status, InquiryStatus::Open);
    assert!(inquiry.first_response_at.is_none());

    let (_, messages) = service.get_inquiry(inquiry.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].author_role, UserRole::Customer);

    // The thread resolves back to its vendor through the entity relation.
    let thread_vendor = inquiry
        .find_related(marketplace_api::entities::vendor::Entity)
        .one(&*pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(thread_vendor.id, vendor.id);
}

#[tokio::test]
async fn first_staff_reply_stamps_first_response_exactly_once() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Prompt Sellers", None).await;
    let customer = common::seed_customer(&pool).await;
    let service = InquiryService::new(pool.clone(), common::drained_events());
    let inquiry = open_thread(&service, customer.id, vendor.id).await;

    // A customer follow-up never counts as a response.
    service
        .add_message(inquiry.id, customer.id, UserRole::Customer, "Any news?".into())
        .await
        .unwrap();
    let (after_customer, _) = service.get_inquiry(inquiry.id).await.unwrap();
    assert!(after_customer.first_response_at.is_none());
    assert_eq!(after_customer.status, InquiryStatus::Open);

    service
        .add_message(inquiry.id, vendor.id, UserRole::Vendor, "Shipped today.".into())
        .await
        .unwrap();
    let (after_first, _) = service.get_inquiry(inquiry.id).await.unwrap();
    let stamped = after_first.first_response_at.unwrap();
    assert_eq!(after_first.status, InquiryStatus::InProgress);

    service
        .add_message(inquiry.id, vendor.id, UserRole::Vendor, "Tracking attached.".into())
        .await
        .unwrap();
    let (after_second, messages) = service.get_inquiry(inquiry.id).await.unwrap();
    assert_eq!(after_second.first_response_at.unwrap(), stamped);
    assert_eq!(messages.len(), 4);
}

#[tokio::test]
async fn customer_reply_unparks_a_waiting_thread() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Waiting Game", None).await;
    let customer = common::seed_customer(&pool).await;
    let service = InquiryService::new(pool.clone(), common::drained_events());
    let inquiry = open_thread(&service, customer.id, vendor.id).await;

    service
        .update_status(inquiry.id, InquiryStatus::WaitingCustomer)
        .await
        .unwrap();

    service
        .add_message(inquiry.id, customer.id, UserRole::Customer, "Here you go.".into())
        .await
        .unwrap();
    let (after, _) = service.get_inquiry(inquiry.id).await.unwrap();
    assert_eq!(after.status, InquiryStatus::InProgress);
}

#[tokio::test]
async fn closed_threads_reject_new_messages() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Done Deals", None).await;
    let customer = common::seed_customer(&pool).await;
    let service = InquiryService::new(pool.clone(), common::drained_events());
    let inquiry = open_thread(&service, customer.id, vendor.id).await;

    let resolved = service
        .update_status(inquiry.id, InquiryStatus::Resolved)
        .await
        .unwrap();
    assert!(resolved.resolved_at.is_some());

    service
        .update_status(inquiry.id, InquiryStatus::Closed)
        .await
        .unwrap();

    let rejected = service
        .add_message(inquiry.id, customer.id, UserRole::Customer, "Reopening?".into())
        .await;
    assert_matches!(rejected, Err(ServiceError::InquiryError(_)));

    let reopened = service.update_status(inquiry.id, InquiryStatus::Open).await;
    assert_matches!(reopened, Err(ServiceError::InvalidStatus(_)));
}

#[tokio::test]
async fn metrics_count_answered_and_resolved_threads() {
    let pool = common::test_pool().await;
    let vendor = common::seed_vendor(&pool, "Metrics Inc", None).await;
    let other_vendor = common::seed_vendor(&pool, "Elsewhere", None).await;
    let customer = common::seed_customer(&pool).await;
    let service = InquiryService::new(pool.clone(), common::drained_events());

    let answered = open_thread(&service, customer.id, vendor.id).await;
    service
        .add_message(answered.id, vendor.id, UserRole::Vendor, "On it.".into())
        .await
        .unwrap();
    service
        .update_status(answered.id, InquiryStatus::Resolved)
        .await
        .unwrap();

    open_thread(&service, customer.id, vendor.id).await;
    open_thread(&service, customer.id, other_vendor.id).await;

    let metrics = service.metrics(Some(vendor.id)).await.unwrap();
    assert_eq!(metrics.total, 2);
    assert_eq!(metrics.open, 1);
    assert_eq!(metrics.resolved, 1);
    assert_eq!(metrics.answered, 1);
    assert!(metrics.avg_first_response_secs.is_some());
    assert!(metrics.avg_resolution_secs.is_some());

    let (vendor_threads, total) = service
        .list_inquiries(
            InquiryFilter {
                vendor_id: Some(vendor.id),
                customer_id: None,
                status: None,
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(vendor_threads.len(), 2);
}
