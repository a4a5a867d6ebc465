//! 庫存換貨請求模型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 換貨缺貨失敗的理由字串（落盤資料契約，不可改動）
pub const REASON_INSUFFICIENT_EXCHANGE: &str = "Insufficient stock to fulfill exchange";

/// 庫存換貨請求（外部輸入）
///
/// 把 `quantity` 個 `sku_original` 的已製造存貨轉為 `sku_new`。
/// 請求由外部建立；重分配器依換貨日期遞增逐筆處理。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockExchange {
    /// 請求ID
    pub id: Uuid,

    /// 原 SKU
    pub sku_original: String,

    /// 新 SKU
    pub sku_new: String,

    /// 換貨數量（完成品單位）
    pub quantity: i64,

    /// 換貨日期
    pub exchange_date: NaiveDate,
}

impl StockExchange {
    /// 創建新的換貨請求
    pub fn new(
        sku_original: String,
        sku_new: String,
        quantity: i64,
        exchange_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sku_original,
            sku_new,
            quantity,
            exchange_date,
        }
    }
}

/// 失敗的換貨請求
///
/// 可用存貨不足時整筆不套用，僅落一列失敗記錄；不會自動重試。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedStockExchange {
    /// 原請求ID
    pub exchange_id: Uuid,

    /// 原 SKU
    pub sku_original: String,

    /// 新 SKU
    pub sku_new: String,

    /// 換貨數量
    pub quantity: i64,

    /// 換貨日期
    pub exchange_date: NaiveDate,

    /// 失敗理由
    pub reason: String,
}

impl FailedStockExchange {
    /// 由原請求建立失敗記錄
    pub fn from_request(request: &StockExchange, reason: String) -> Self {
        Self {
            exchange_id: request.id,
            sku_original: request.sku_original.clone(),
            sku_new: request.sku_new.clone(),
            quantity: request.quantity,
            exchange_date: request.exchange_date,
            reason,
        }
    }
}
