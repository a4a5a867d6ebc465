//! 庫存快照模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 快照種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// 完成品存貨（依 SKU 彙總製造結果、退貨、期初建帳）
    FinishedSku,
    /// 原物料存貨（依產品彙總採購批次）
    RawProduct,
}

/// 庫存快照列（衍生彙總，依 (鍵, 截止日期) 為鍵）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// 快照種類
    pub kind: SnapshotKind,

    /// 彙總鍵（SKU 或產品代號）
    pub key: String,

    /// 截止日期
    pub as_of: NaiveDate,

    /// 總數量（製造/採購）
    pub quantity_total: i64,

    /// 剩餘數量
    pub quantity_remaining: i64,

    /// 估值（Σ 剩餘數量 × 單位成本）
    pub valuation: Decimal,
}
