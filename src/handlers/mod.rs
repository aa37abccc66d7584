pub mod affiliates;
pub mod auth;
pub mod banners;
pub mod brands;
pub mod campaigns;
pub mod categories;
pub mod common;
pub mod dashboards;
pub mod flash_sales;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod shipments;
pub mod shipping;
pub mod stores;
pub mod users;

use crate::{
    config::AppConfig,
    events::EventSender,
    services::{
        affiliates::AffiliateService, banners::BannerService, brands::BrandService,
        campaigns::CampaignService, categories::CategoryService, common::AssetPolicy,
        dashboards::DashboardService, flash_sales::FlashSaleService, orders::OrderService,
        products::ProductService, promotions::PromotionService, shipments::ShipmentService,
        shipping::ShippingService, stores::StoreService, users::UserService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub stores: Arc<StoreService>,
    pub categories: Arc<CategoryService>,
    pub brands: Arc<BrandService>,
    pub campaigns: Arc<CampaignService>,
    pub banners: Arc<BannerService>,
    pub products: Arc<ProductService>,
    pub promotions: Arc<PromotionService>,
    pub flash_sales: Arc<FlashSaleService>,
    pub shipping: Arc<ShippingService>,
    pub shipments: Arc<ShipmentService>,
    pub affiliates: Arc<AffiliateService>,
    pub orders: Arc<OrderService>,
    pub dashboards: Arc<DashboardService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        let assets = AssetPolicy::new(config.asset_hosts());

        Self {
            users: Arc::new(UserService::new(db.clone(), event_sender.clone())),
            stores: Arc::new(StoreService::new(
                db.clone(),
                event_sender.clone(),
                assets.clone(),
            )),
            categories: Arc::new(CategoryService::new(db.clone(), assets.clone())),
            brands: Arc::new(BrandService::new(db.clone(), assets.clone())),
            campaigns: Arc::new(CampaignService::new(db.clone())),
            banners: Arc::new(BannerService::new(db.clone(), assets.clone())),
            products: Arc::new(ProductService::new(
                db.clone(),
                event_sender.clone(),
                assets.clone(),
            )),
            promotions: Arc::new(PromotionService::new(db.clone())),
            flash_sales: Arc::new(FlashSaleService::new(db.clone())),
            shipping: Arc::new(ShippingService::new(db.clone(), assets)),
            shipments: Arc::new(ShipmentService::new(db.clone(), event_sender.clone())),
            affiliates: Arc::new(AffiliateService::new(
                db.clone(),
                event_sender.clone(),
                config.default_commission_rate,
            )),
            orders: Arc::new(OrderService::new(
                db.clone(),
                event_sender,
                config.default_currency.clone(),
            )),
            dashboards: Arc::new(DashboardService::new(db)),
        }
    }
}
