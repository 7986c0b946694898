//! Embedded schema migrations.

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_identity_tables::Migration),
            Box::new(m20240101_000002_create_catalog_tables::Migration),
            Box::new(m20240101_000003_create_order_tables::Migration),
            Box::new(m20240101_000004_create_vendor_order_tables::Migration),
            Box::new(m20240101_000005_create_inquiry_tables::Migration),
            Box::new(m20240101_000006_create_content_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_identity_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_identity_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Vendors::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Vendors::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Vendors::Name).string().not_null())
                        .col(
                            ColumnDef::new(Vendors::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Vendors::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Vendors::Phone).string().null())
                        .col(ColumnDef::new(Vendors::Description).text().null())
                        .col(ColumnDef::new(Vendors::LogoPath).string().null())
                        .col(ColumnDef::new(Vendors::CommissionRate).decimal().null())
                        .col(
                            ColumnDef::new(Vendors::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Vendors::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Vendors::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::DisplayName).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(ColumnDef::new(Users::VendorId).uuid().null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PaymentAccounts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentAccounts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAccounts::VendorId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PaymentAccounts::BankName).string().not_null())
                        .col(
                            ColumnDef::new(PaymentAccounts::AccountHolder)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentAccounts::AccountNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentAccounts::Iban).string().null())
                        .col(
                            ColumnDef::new(PaymentAccounts::IsVerified)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PaymentAccounts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PaymentAccounts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Vendors::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Vendors {
        Table,
        Id,
        Name,
        Slug,
        Email,
        Phone,
        Description,
        LogoPath,
        CommissionRate,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Email,
        PasswordHash,
        DisplayName,
        Role,
        VendorId,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum PaymentAccounts {
        Table,
        Id,
        VendorId,
        BankName,
        AccountHolder,
        AccountNumber,
        Iban,
        IsVerified,
        UpdatedAt,
    }
}

mod m20240101_000002_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(
                            ColumnDef::new(Categories::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::ParentId).uuid().null())
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .col(ColumnDef::new(Categories::ImagePath).string().null())
                        .col(
                            ColumnDef::new(Categories::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Categories::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Categories::MetaTitle).string().null())
                        .col(ColumnDef::new(Categories::MetaDescription).string().null())
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::VendorId).uuid().not_null())
                        .col(ColumnDef::new(Products::CategoryId).uuid().null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::Price).decimal().not_null())
                        .col(ColumnDef::new(Products::CompareAtPrice).decimal().null())
                        .col(ColumnDef::new(Products::Currency).string().not_null())
                        .col(
                            ColumnDef::new(Products::StockQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Status).string().not_null())
                        .col(
                            ColumnDef::new(Products::IsFeatured)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::IsPremium)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::MetaTitle).string().null())
                        .col(ColumnDef::new(Products::MetaDescription).string().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_vendor_id")
                        .table(Products::Table)
                        .col(Products::VendorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductImages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductImages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductImages::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductImages::FilePath).string().not_null())
                        .col(ColumnDef::new(ProductImages::AltText).string().null())
                        .col(
                            ColumnDef::new(ProductImages::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ProductImages::Width).integer().null())
                        .col(ColumnDef::new(ProductImages::Height).integer().null())
                        .col(
                            ColumnDef::new(ProductImages::FileSizeBytes)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductImages::IsWatermarked)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_images_product_id")
                        .table(ProductImages::Table)
                        .col(ProductImages::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductImages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Categories {
        Table,
        Id,
        Name,
        Slug,
        ParentId,
        Description,
        ImagePath,
        Position,
        IsActive,
        MetaTitle,
        MetaDescription,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        VendorId,
        CategoryId,
        Name,
        Slug,
        Description,
        Price,
        CompareAtPrice,
        Currency,
        StockQuantity,
        Status,
        IsFeatured,
        IsPremium,
        MetaTitle,
        MetaDescription,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ProductImages {
        Table,
        Id,
        ProductId,
        FilePath,
        AltText,
        Position,
        Width,
        Height,
        FileSizeBytes,
        IsWatermarked,
    }
}

mod m20240101_000003_create_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Currency).string().not_null())
                        .col(ColumnDef::new(Orders::ShippingAddress).string().null())
                        .col(ColumnDef::new(Orders::Notes).string().null())
                        .col(
                            ColumnDef::new(Orders::ForwardedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::PlacedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::VendorId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductName).string().not_null())
                        .col(ColumnDef::new(OrderItems::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::IsCancelled)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CancelledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_vendor_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::VendorId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        Status,
        TotalAmount,
        Currency,
        ShippingAddress,
        Notes,
        ForwardedAt,
        PlacedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        VendorId,
        ProductName,
        UnitPrice,
        Quantity,
        IsCancelled,
        CancelledAt,
        CreatedAt,
    }
}

mod m20240101_000004_create_vendor_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_vendor_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(VendorOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VendorOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorOrders::VendorOrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(VendorOrders::OrderId).uuid().not_null())
                        .col(ColumnDef::new(VendorOrders::VendorId).uuid().not_null())
                        .col(ColumnDef::new(VendorOrders::Status).string().not_null())
                        .col(ColumnDef::new(VendorOrders::Subtotal).decimal().not_null())
                        .col(
                            ColumnDef::new(VendorOrders::CommissionRate)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorOrders::CommissionAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorOrders::ForwardedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_vendor_orders_order_id")
                        .table(VendorOrders::Table)
                        .col(VendorOrders::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_vendor_orders_vendor_id")
                        .table(VendorOrders::Table)
                        .col(VendorOrders::VendorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VendorOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VendorOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorOrderItems::VendorOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorOrderItems::OrderItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(VendorOrderItems::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(VendorOrderItems::ProductName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorOrderItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorOrderItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CommissionEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CommissionEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CommissionEntries::VendorOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CommissionEntries::VendorId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CommissionEntries::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(CommissionEntries::BaseAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CommissionEntries::Rate).decimal().not_null())
                        .col(
                            ColumnDef::new(CommissionEntries::Amount)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CommissionEntries::Status).string().not_null())
                        .col(
                            ColumnDef::new(CommissionEntries::SettledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(CommissionEntries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_commission_entries_vendor_id")
                        .table(CommissionEntries::Table)
                        .col(CommissionEntries::VendorId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CommissionEntries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(VendorOrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(VendorOrders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum VendorOrders {
        Table,
        Id,
        VendorOrderNumber,
        OrderId,
        VendorId,
        Status,
        Subtotal,
        CommissionRate,
        CommissionAmount,
        ForwardedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum VendorOrderItems {
        Table,
        Id,
        VendorOrderId,
        OrderItemId,
        ProductId,
        ProductName,
        UnitPrice,
        Quantity,
    }

    #[derive(Iden)]
    enum CommissionEntries {
        Table,
        Id,
        VendorOrderId,
        VendorId,
        OrderId,
        BaseAmount,
        Rate,
        Amount,
        Status,
        SettledAt,
        CreatedAt,
    }
}

mod m20240101_000005_create_inquiry_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_inquiry_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inquiries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inquiries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Inquiries::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Inquiries::VendorId).uuid().not_null())
                        .col(ColumnDef::new(Inquiries::ProductId).uuid().null())
                        .col(ColumnDef::new(Inquiries::OrderId).uuid().null())
                        .col(ColumnDef::new(Inquiries::Subject).string().not_null())
                        .col(ColumnDef::new(Inquiries::Status).string().not_null())
                        .col(
                            ColumnDef::new(Inquiries::FirstResponseAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Inquiries::ResolvedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Inquiries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Inquiries::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inquiries_vendor_id")
                        .table(Inquiries::Table)
                        .col(Inquiries::VendorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InquiryMessages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InquiryMessages::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InquiryMessages::InquiryId).uuid().not_null())
                        .col(ColumnDef::new(InquiryMessages::AuthorId).uuid().not_null())
                        .col(
                            ColumnDef::new(InquiryMessages::AuthorRole)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InquiryMessages::Body).text().not_null())
                        .col(
                            ColumnDef::new(InquiryMessages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inquiry_messages_inquiry_id")
                        .table(InquiryMessages::Table)
                        .col(InquiryMessages::InquiryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InquiryMessages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Inquiries::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Inquiries {
        Table,
        Id,
        CustomerId,
        VendorId,
        ProductId,
        OrderId,
        Subject,
        Status,
        FirstResponseAt,
        ResolvedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum InquiryMessages {
        Table,
        Id,
        InquiryId,
        AuthorId,
        AuthorRole,
        Body,
        CreatedAt,
    }
}

mod m20240101_000006_create_content_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_content_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Banners::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Banners::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Banners::Title).string().not_null())
                        .col(ColumnDef::new(Banners::Subtitle).string().null())
                        .col(ColumnDef::new(Banners::ImagePath).string().not_null())
                        .col(ColumnDef::new(Banners::LinkUrl).string().null())
                        .col(
                            ColumnDef::new(Banners::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Banners::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Banners::StartsAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Banners::EndsAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Banners::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(HomepageSections::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(HomepageSections::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(HomepageSections::Title).string().not_null())
                        .col(ColumnDef::new(HomepageSections::Kind).string().not_null())
                        .col(ColumnDef::new(HomepageSections::CategoryId).uuid().null())
                        .col(
                            ColumnDef::new(HomepageSections::Position)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(HomepageSections::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(HomepageSections::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Banners::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Banners {
        Table,
        Id,
        Title,
        Subtitle,
        ImagePath,
        LinkUrl,
        Position,
        IsActive,
        StartsAt,
        EndsAt,
        CreatedAt,
    }

    #[derive(Iden)]
    enum HomepageSections {
        Table,
        Id,
        Title,
        Kind,
        CategoryId,
        Position,
        IsActive,
    }
}
