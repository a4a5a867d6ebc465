//! 銷貨成本總帳模型

use crate::record::SupplySource;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 期初建帳來源在 `fulfilled_by` 欄位的前綴（落盤資料契約，不可改動）
pub const INITIATION_FULFILLED_BY_PREFIX: &str = "INITIATION & ADDITION ";

/// 完全無可用存貨時的理由字串（落盤資料契約，不可改動）
pub const REASON_NO_INVENTORY: &str = "No available inventory";

/// 銷貨成本總帳列
///
/// 記錄哪個供應批次滿足了哪筆銷售。製造來源每個同批兄弟產品
/// 各落一列；退貨與期初建帳來源單列，產品即 SKU 本身。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CogsEntry {
    /// 銷售記錄編號
    pub sales_record_id: String,

    /// 銷售 SKU
    pub sku: String,

    /// 銷售日期
    pub sales_date: NaiveDate,

    /// 供應來源標記
    pub source: SupplySource,

    /// 用料產品代號（非製造來源為 SKU 本身）
    pub product: String,

    /// 供料識別（批次鍵；期初建帳來源帶前綴）
    pub fulfilled_by: String,

    /// 消耗數量
    pub quantity: i64,

    /// 單位成本
    pub unit_cost: Decimal,

    /// 成本（數量 × 單位成本）
    pub cost: Decimal,
}

impl CogsEntry {
    /// 對應總帳的哨兵來源訂單編號
    pub fn source_order_id(&self) -> i64 {
        self.source.order_id()
    }

    /// 對應總帳的來源批號
    pub fn source_batch_number(&self) -> u32 {
        self.source.batch_number()
    }
}

/// 失敗的銷貨成本列
///
/// 記錄一筆銷售中無法被滿足的數量；部分成功是常態，已分配的
/// 部分仍以 `CogsEntry` 落盤。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCogsEntry {
    /// 銷售記錄編號
    pub sales_record_id: String,

    /// 銷售 SKU
    pub sku: String,

    /// 未滿足數量
    pub quantity: i64,

    /// 銷售日期
    pub sales_date: NaiveDate,

    /// 失敗理由
    pub reason: String,
}
