pub mod affiliate;
pub mod banner;
pub mod brand;
pub mod campaign;
pub mod category;
pub mod commission;
pub mod flash_sale;
pub mod flash_sale_item;
pub mod flash_sale_purchase;
pub mod order;
pub mod order_item;
pub mod product;
pub mod promotion;
pub mod promotion_redemption;
pub mod shipment;
pub mod shipping_provider;
pub mod shipping_rate;
pub mod store;
pub mod user;
