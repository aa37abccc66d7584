// Shared helpers
pub mod common;

// Accounts and tenants
pub mod stores;
pub mod users;

// Catalog
pub mod brands;
pub mod categories;
pub mod products;

// Merchandising
pub mod banners;
pub mod campaigns;
pub mod flash_sales;
pub mod promotions;

// Checkout and fulfilment
pub mod orders;
pub mod shipments;
pub mod shipping;

// Referrals
pub mod affiliates;

// Reporting
pub mod dashboards;
