use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_identity_tables::Migration),
            Box::new(m20240301_000002_create_catalog_tables::Migration),
            Box::new(m20240301_000003_create_marketing_tables::Migration),
            Box::new(m20240301_000004_create_flash_sale_tables::Migration),
            Box::new(m20240301_000005_create_shipping_tables::Migration),
            Box::new(m20240301_000006_create_order_tables::Migration),
            Box::new(m20240301_000007_create_affiliate_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_identity_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_identity_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string_len(255)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Name).string_len(120).not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::LastLoginAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Stores::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Stores::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Stores::OwnerId).uuid().not_null().unique_key())
                        .col(ColumnDef::new(Stores::Name).string_len(120).not_null())
                        .col(
                            ColumnDef::new(Stores::Slug)
                                .string_len(140)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Stores::Description).text().null())
                        .col(ColumnDef::new(Stores::LogoUrl).string().null())
                        .col(ColumnDef::new(Stores::BannerUrl).string().null())
                        .col(ColumnDef::new(Stores::Email).string().null())
                        .col(ColumnDef::new(Stores::Phone).string_len(32).null())
                        .col(ColumnDef::new(Stores::AddressLine).string().null())
                        .col(ColumnDef::new(Stores::City).string_len(120).null())
                        .col(ColumnDef::new(Stores::Country).string_len(2).null())
                        .col(ColumnDef::new(Stores::PostalCode).string_len(20).null())
                        .col(ColumnDef::new(Stores::Latitude).double().null())
                        .col(ColumnDef::new(Stores::Longitude).double().null())
                        .col(ColumnDef::new(Stores::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Stores::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Stores::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stores_owner_id")
                                .from(Stores::Table, Stores::OwnerId)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stores_status")
                        .table(Stores::Table)
                        .col(Stores::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Stores::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Email,
        Name,
        PasswordHash,
        Role,
        IsActive,
        LastLoginAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Stores {
        Table,
        Id,
        OwnerId,
        Name,
        Slug,
        Description,
        LogoUrl,
        BannerUrl,
        Email,
        Phone,
        AddressLine,
        City,
        Country,
        PostalCode,
        Latitude,
        Longitude,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_catalog_tables {

    use super::m20240301_000001_create_identity_tables::Stores;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_catalog_tables"
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
                        .col(ColumnDef::new(Categories::Name).string_len(120).not_null())
                        .col(
                            ColumnDef::new(Categories::Slug)
                                .string_len(140)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::Description).text().null())
                        .col(ColumnDef::new(Categories::ImageUrl).string().null())
                        .col(ColumnDef::new(Categories::ParentId).uuid().null())
                        .col(
                            ColumnDef::new(Categories::SortOrder)
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
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Brands::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Brands::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Brands::Name).string_len(120).not_null())
                        .col(
                            ColumnDef::new(Brands::Slug)
                                .string_len(140)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Brands::Description).text().null())
                        .col(ColumnDef::new(Brands::LogoUrl).string().null())
                        .col(ColumnDef::new(Brands::Website).string().null())
                        .col(
                            ColumnDef::new(Brands::IsFeatured)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Brands::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Brands::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Brands::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
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
                        .col(ColumnDef::new(Products::StoreId).uuid().not_null())
                        .col(ColumnDef::new(Products::CategoryId).uuid().null())
                        .col(ColumnDef::new(Products::BrandId).uuid().null())
                        .col(ColumnDef::new(Products::Name).string_len(200).not_null())
                        .col(
                            ColumnDef::new(Products::Slug)
                                .string_len(220)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::Price).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Products::CompareAtPrice)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::Stock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::WeightKg)
                                .decimal_len(10, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::ImageUrl).string().null())
                        .col(ColumnDef::new(Products::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_store_id")
                                .from(Products::Table, Products::StoreId)
                                .to(Stores::Table, Stores::Id),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, col) in [
                ("idx_products_store_id", Products::StoreId),
                ("idx_products_category_id", Products::CategoryId),
                ("idx_products_brand_id", Products::BrandId),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Products::Table)
                            .col(col)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Brands::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Categories {
        Table,
        Id,
        Name,
        Slug,
        Description,
        ImageUrl,
        ParentId,
        SortOrder,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Brands {
        Table,
        Id,
        Name,
        Slug,
        Description,
        LogoUrl,
        Website,
        IsFeatured,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        StoreId,
        CategoryId,
        BrandId,
        Name,
        Slug,
        Description,
        Price,
        CompareAtPrice,
        Stock,
        WeightKg,
        ImageUrl,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_marketing_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_marketing_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Campaigns::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Campaigns::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Campaigns::Name).string_len(120).not_null())
                        .col(ColumnDef::new(Campaigns::Description).text().null())
                        .col(ColumnDef::new(Campaigns::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Campaigns::StartsAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Campaigns::EndsAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Campaigns::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Campaigns::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Banners::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Banners::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Banners::Title).string_len(160).not_null())
                        .col(ColumnDef::new(Banners::Subtitle).string().null())
                        .col(ColumnDef::new(Banners::ImageUrl).string().not_null())
                        .col(ColumnDef::new(Banners::MobileImageUrl).string().null())
                        .col(ColumnDef::new(Banners::LinkUrl).string().null())
                        .col(ColumnDef::new(Banners::Placement).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Banners::Priority)
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
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Banners::EndsAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Banners::CampaignId).uuid().null())
                        .col(ColumnDef::new(Banners::Devices).json().not_null())
                        .col(ColumnDef::new(Banners::Audience).string_len(24).not_null())
                        .col(ColumnDef::new(Banners::Countries).json().not_null())
                        .col(ColumnDef::new(Banners::ExcludedCountries).json().not_null())
                        .col(
                            ColumnDef::new(Banners::Impressions)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Banners::Clicks)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Banners::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Banners::UpdatedAt)
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
                        .name("idx_banners_placement")
                        .table(Banners::Table)
                        .col(Banners::Placement)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Promotions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Promotions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::Code)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Promotions::Name).string_len(120).not_null())
                        .col(ColumnDef::new(Promotions::Description).text().null())
                        .col(ColumnDef::new(Promotions::StoreId).uuid().null())
                        .col(
                            ColumnDef::new(Promotions::PromotionType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::DiscountValue)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::MinOrderAmount)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::MaxDiscountAmount)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(Promotions::UsageLimit).integer().null())
                        .col(
                            ColumnDef::new(Promotions::UsageCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Promotions::PerUserLimit).integer().null())
                        .col(
                            ColumnDef::new(Promotions::StartsAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::EndsAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Promotions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Promotions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PromotionRedemptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PromotionRedemptions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PromotionRedemptions::PromotionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PromotionRedemptions::UserId).uuid().not_null())
                        .col(ColumnDef::new(PromotionRedemptions::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(PromotionRedemptions::DiscountAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PromotionRedemptions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_promotion_redemptions_promotion_id")
                                .from(
                                    PromotionRedemptions::Table,
                                    PromotionRedemptions::PromotionId,
                                )
                                .to(Promotions::Table, Promotions::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_promotion_redemptions_promotion_user")
                        .table(PromotionRedemptions::Table)
                        .col(PromotionRedemptions::PromotionId)
                        .col(PromotionRedemptions::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PromotionRedemptions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Promotions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Banners::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Campaigns::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Campaigns {
        Table,
        Id,
        Name,
        Description,
        Status,
        StartsAt,
        EndsAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Banners {
        Table,
        Id,
        Title,
        Subtitle,
        ImageUrl,
        MobileImageUrl,
        LinkUrl,
        Placement,
        Priority,
        IsActive,
        StartsAt,
        EndsAt,
        CampaignId,
        Devices,
        Audience,
        Countries,
        ExcludedCountries,
        Impressions,
        Clicks,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Promotions {
        Table,
        Id,
        Code,
        Name,
        Description,
        StoreId,
        PromotionType,
        DiscountValue,
        MinOrderAmount,
        MaxDiscountAmount,
        UsageLimit,
        UsageCount,
        PerUserLimit,
        StartsAt,
        EndsAt,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum PromotionRedemptions {
        Table,
        Id,
        PromotionId,
        UserId,
        OrderId,
        DiscountAmount,
        CreatedAt,
    }
}

mod m20240301_000004_create_flash_sale_tables {

    use super::m20240301_000002_create_catalog_tables::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_flash_sale_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FlashSales::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FlashSales::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FlashSales::Name).string_len(120).not_null())
                        .col(ColumnDef::new(FlashSales::Description).text().null())
                        .col(ColumnDef::new(FlashSales::StoreId).uuid().null())
                        .col(
                            ColumnDef::new(FlashSales::StartsAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FlashSales::EndsAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FlashSales::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(FlashSales::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FlashSales::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FlashSaleItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FlashSaleItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FlashSaleItems::FlashSaleId).uuid().not_null())
                        .col(ColumnDef::new(FlashSaleItems::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(FlashSaleItems::OriginalPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FlashSaleItems::SalePrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FlashSaleItems::DiscountPercent)
                                .decimal_len(5, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(FlashSaleItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(FlashSaleItems::Sold)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(FlashSaleItems::PerUserLimit).integer().null())
                        .col(
                            ColumnDef::new(FlashSaleItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FlashSaleItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_flash_sale_items_flash_sale_id")
                                .from(FlashSaleItems::Table, FlashSaleItems::FlashSaleId)
                                .to(FlashSales::Table, FlashSales::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_flash_sale_items_product_id")
                                .from(FlashSaleItems::Table, FlashSaleItems::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_flash_sale_items_sale_product")
                        .table(FlashSaleItems::Table)
                        .col(FlashSaleItems::FlashSaleId)
                        .col(FlashSaleItems::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FlashSalePurchases::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FlashSalePurchases::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FlashSalePurchases::FlashSaleItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FlashSalePurchases::UserId).uuid().not_null())
                        .col(ColumnDef::new(FlashSalePurchases::OrderId).uuid().null())
                        .col(ColumnDef::new(FlashSalePurchases::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(FlashSalePurchases::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_flash_sale_purchases_item_id")
                                .from(
                                    FlashSalePurchases::Table,
                                    FlashSalePurchases::FlashSaleItemId,
                                )
                                .to(FlashSaleItems::Table, FlashSaleItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_flash_sale_purchases_item_user")
                        .table(FlashSalePurchases::Table)
                        .col(FlashSalePurchases::FlashSaleItemId)
                        .col(FlashSalePurchases::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FlashSalePurchases::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FlashSaleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FlashSales::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum FlashSales {
        Table,
        Id,
        Name,
        Description,
        StoreId,
        StartsAt,
        EndsAt,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum FlashSaleItems {
        Table,
        Id,
        FlashSaleId,
        ProductId,
        OriginalPrice,
        SalePrice,
        DiscountPercent,
        Quantity,
        Sold,
        PerUserLimit,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum FlashSalePurchases {
        Table,
        Id,
        FlashSaleItemId,
        UserId,
        OrderId,
        Quantity,
        CreatedAt,
    }
}

mod m20240301_000005_create_shipping_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_shipping_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ShippingProviders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShippingProviders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingProviders::Name)
                                .string_len(120)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingProviders::Code)
                                .string_len(40)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(ShippingProviders::TrackingUrlTemplate)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(ShippingProviders::LogoUrl).string().null())
                        .col(
                            ColumnDef::new(ShippingProviders::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ShippingProviders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingProviders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ShippingRates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShippingRates::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShippingRates::ProviderId).uuid().not_null())
                        .col(ColumnDef::new(ShippingRates::Name).string_len(120).not_null())
                        .col(ColumnDef::new(ShippingRates::Country).string_len(2).null())
                        .col(
                            ColumnDef::new(ShippingRates::BasePrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingRates::PerKgPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingRates::MinWeightKg)
                                .decimal_len(10, 3)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ShippingRates::MaxWeightKg)
                                .decimal_len(10, 3)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ShippingRates::FreeShippingThreshold)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ShippingRates::EstimatedDaysMin)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingRates::EstimatedDaysMax)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingRates::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ShippingRates::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingRates::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_shipping_rates_provider_id")
                                .from(ShippingRates::Table, ShippingRates::ProviderId)
                                .to(ShippingProviders::Table, ShippingProviders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ShippingRates::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ShippingProviders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ShippingProviders {
        Table,
        Id,
        Name,
        Code,
        TrackingUrlTemplate,
        LogoUrl,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ShippingRates {
        Table,
        Id,
        ProviderId,
        Name,
        Country,
        BasePrice,
        PerKgPrice,
        MinWeightKg,
        MaxWeightKg,
        FreeShippingThreshold,
        EstimatedDaysMin,
        EstimatedDaysMax,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000006_create_order_tables {

    use super::m20240301_000001_create_identity_tables::{Stores, Users};
    use super::m20240301_000005_create_shipping_tables::ShippingProviders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_order_tables"
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
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(ColumnDef::new(Orders::StoreId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::Subtotal).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(Orders::DiscountTotal)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::ShippingTotal)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Total).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Orders::Currency).string_len(3).not_null())
                        .col(ColumnDef::new(Orders::PromotionId).uuid().null())
                        .col(ColumnDef::new(Orders::AffiliateId).uuid().null())
                        .col(ColumnDef::new(Orders::ShippingRateId).uuid().null())
                        .col(ColumnDef::new(Orders::RecipientName).string_len(120).not_null())
                        .col(ColumnDef::new(Orders::AddressLine).string().not_null())
                        .col(ColumnDef::new(Orders::City).string_len(120).not_null())
                        .col(ColumnDef::new(Orders::Country).string_len(2).not_null())
                        .col(ColumnDef::new(Orders::PostalCode).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::Phone).string_len(32).null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_user_id")
                                .from(Orders::Table, Orders::UserId)
                                .to(Users::Table, Users::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_store_id")
                                .from(Orders::Table, Orders::StoreId)
                                .to(Stores::Table, Stores::Id),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, col) in [
                ("idx_orders_user_id", Orders::UserId),
                ("idx_orders_store_id", Orders::StoreId),
                ("idx_orders_status", Orders::Status),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Orders::Table)
                            .col(col)
                            .to_owned(),
                    )
                    .await?;
            }

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
                        .col(ColumnDef::new(OrderItems::FlashSaleItemId).uuid().null())
                        .col(ColumnDef::new(OrderItems::ProductName).string_len(200).not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::LineTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Shipments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Shipments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Shipments::OrderId).uuid().not_null())
                        .col(ColumnDef::new(Shipments::ProviderId).uuid().not_null())
                        .col(ColumnDef::new(Shipments::TrackingNumber).string_len(64).null())
                        .col(ColumnDef::new(Shipments::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Shipments::Cost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Shipments::ShippedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::DeliveredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_shipments_order_id")
                                .from(Shipments::Table, Shipments::OrderId)
                                .to(Orders::Table, Orders::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_shipments_provider_id")
                                .from(Shipments::Table, Shipments::ProviderId)
                                .to(ShippingProviders::Table, ShippingProviders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Shipments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        UserId,
        StoreId,
        Status,
        Subtotal,
        DiscountTotal,
        ShippingTotal,
        Total,
        Currency,
        PromotionId,
        AffiliateId,
        ShippingRateId,
        RecipientName,
        AddressLine,
        City,
        Country,
        PostalCode,
        Phone,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        FlashSaleItemId,
        ProductName,
        UnitPrice,
        Quantity,
        LineTotal,
    }

    #[derive(DeriveIden)]
    enum Shipments {
        Table,
        Id,
        OrderId,
        ProviderId,
        TrackingNumber,
        Status,
        Cost,
        ShippedAt,
        DeliveredAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000007_create_affiliate_tables {

    use super::m20240301_000001_create_identity_tables::Users;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000007_create_affiliate_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Affiliates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Affiliates::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Affiliates::UserId).uuid().not_null().unique_key())
                        .col(
                            ColumnDef::new(Affiliates::ReferralCode)
                                .string_len(16)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Affiliates::CommissionRate)
                                .decimal_len(5, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Affiliates::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Affiliates::PayoutEmail).string().null())
                        .col(ColumnDef::new(Affiliates::Website).string().null())
                        .col(
                            ColumnDef::new(Affiliates::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Affiliates::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_affiliates_user_id")
                                .from(Affiliates::Table, Affiliates::UserId)
                                .to(Users::Table, Users::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Commissions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Commissions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Commissions::AffiliateId).uuid().not_null())
                        .col(
                            ColumnDef::new(Commissions::OrderId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Commissions::OrderTotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Commissions::Rate).decimal_len(5, 2).not_null())
                        .col(ColumnDef::new(Commissions::Amount).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Commissions::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Commissions::PaidAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Commissions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Commissions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_commissions_affiliate_id")
                                .from(Commissions::Table, Commissions::AffiliateId)
                                .to(Affiliates::Table, Affiliates::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Commissions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Affiliates::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Affiliates {
        Table,
        Id,
        UserId,
        ReferralCode,
        CommissionRate,
        Status,
        PayoutEmail,
        Website,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Commissions {
        Table,
        Id,
        AffiliateId,
        OrderId,
        OrderTotal,
        Rate,
        Amount,
        Status,
        PaidAt,
        CreatedAt,
        UpdatedAt,
    }
}
