//! # Costing Core
//!
//! 核心資料模型與類型定義

pub mod cogs;
pub mod config;
pub mod dataset;
pub mod exchange;
pub mod material;
pub mod order;
pub mod record;
pub mod sales;
pub mod snapshot;
pub mod stock;

// Re-export 主要類型
pub use cogs::{CogsEntry, FailedCogsEntry, INITIATION_FULFILLED_BY_PREFIX, REASON_NO_INVENTORY};
pub use config::CostingConfig;
pub use dataset::WorkingSet;
pub use exchange::{FailedStockExchange, StockExchange, REASON_INSUFFICIENT_EXCHANGE};
pub use material::RawMaterialLot;
pub use order::{rank_orders, ManufactureComponent, RankedOrder};
pub use record::{
    FailedManufactureRecord, ManufactureRecord, SupplySource, FIRST_EXCHANGE_ORDER_ID,
    INITIATION_ORDER_ID, REASON_INSUFFICIENT_STOCK, RETURN_ORDER_ID,
};
pub use sales::SalesRecord;
pub use snapshot::{InventorySnapshot, SnapshotKind};
pub use stock::{ReturnLot, StockInitiationLot};

/// 成本分配引擎錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum CostingError {
    #[error("用料清單為空，無法計算配比")]
    EmptyBillOfMaterials,

    #[error("無效的用料數量: {product} 數量 {quantity}")]
    InvalidQuantity { product: String, quantity: i64 },

    #[error("用料數量非基準倍數: {product} 需求 {quantity}，基準 {base}")]
    RatioNotExact {
        product: String,
        quantity: i64,
        base: i64,
    },

    #[error("找不到產品配比: 訂單 {order_id} 產品 {product}")]
    MissingRatio { order_id: i64, product: String },

    #[error("找不到製造訂單用料明細: 訂單 {0}")]
    MissingComponents(i64),

    #[error("計算錯誤: {0}")]
    CalculationError(String),

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CostingError>;
