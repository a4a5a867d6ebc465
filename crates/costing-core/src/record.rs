//! 製造結果總帳模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 退貨來源的哨兵訂單編號
pub const RETURN_ORDER_ID: i64 = 0;

/// 期初建帳來源的哨兵訂單編號
pub const INITIATION_ORDER_ID: i64 = -1;

/// 換貨合成訂單的起始哨兵編號（之後每筆換貨嚴格遞減）
pub const FIRST_EXCHANGE_ORDER_ID: i64 = -2;

/// 缺料失敗的理由字串（落盤資料契約，不可改動）
pub const REASON_INSUFFICIENT_STOCK: &str = "Insufficient stock to fulfill order";

/// 製造結果總帳列
///
/// 每列對應 (訂單編號, 批號, 產品, 供料批次)。`quantity_remaining`
/// 由下游的 COGS 生成與換貨重分配遞減。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufactureRecord {
    /// 訂單編號（> 0 實際訂單；<= -2 換貨合成批）
    pub order_id: i64,

    /// 批號（每張訂單內從 1 起算）
    pub batch_number: u32,

    /// 完成品 SKU
    pub sku: String,

    /// 用料產品代號
    pub product: String,

    /// 供料批次鍵
    pub lot_id: String,

    /// 消耗原料數量（完成品數 × 配比）
    pub fulfilled_quantity: i64,

    /// 供料批次單位成本
    pub unit_cost: Decimal,

    /// 成本（數量 × 單位成本）
    pub cost: Decimal,

    /// 完成日期
    pub completion_date: NaiveDate,

    /// 剩餘數量（可變，初始 = 消耗原料數量）
    pub quantity_remaining: i64,
}

impl ManufactureRecord {
    /// 創建新的製造結果列
    pub fn new(
        order_id: i64,
        batch_number: u32,
        sku: String,
        product: String,
        lot_id: String,
        fulfilled_quantity: i64,
        unit_cost: Decimal,
        completion_date: NaiveDate,
    ) -> Self {
        Self {
            order_id,
            batch_number,
            sku,
            product,
            lot_id,
            fulfilled_quantity,
            unit_cost,
            cost: Decimal::from(fulfilled_quantity) * unit_cost,
            completion_date,
            quantity_remaining: fulfilled_quantity,
        }
    }

    /// 已被下游消耗的數量
    pub fn quantity_consumed(&self) -> i64 {
        self.fulfilled_quantity - self.quantity_remaining
    }

    /// 檢查是否為換貨合成批
    pub fn is_exchange_batch(&self) -> bool {
        self.order_id <= FIRST_EXCHANGE_ORDER_ID
    }

    /// 對應的供應來源標記
    pub fn source(&self) -> SupplySource {
        SupplySource::Manufacture {
            order_id: self.order_id,
            batch_number: self.batch_number,
        }
    }
}

/// 失敗的製造結果列
///
/// 每列對應 (訂單編號, 產品)；與同一張訂單的 `ManufactureRecord`
/// 互斥。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedManufactureRecord {
    /// 訂單編號
    pub order_id: i64,

    /// 完成品 SKU
    pub sku: String,

    /// 用料產品代號
    pub product: String,

    /// 需求數量
    pub required_quantity: i64,

    /// 製造日期
    pub manufacture_date: NaiveDate,

    /// 失敗理由
    pub reason: String,
}

/// 完成品供應來源（管線內的顯式標記聯集）
///
/// 對外總帳仍以哨兵整數編號落盤：> 0 實際製造訂單、0 退貨、
/// -1 期初建帳、<= -2 換貨合成批。管線內部一律以此列舉傳遞，
/// 不再攜帶裸整數。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplySource {
    /// 製造結果批
    Manufacture { order_id: i64, batch_number: u32 },
    /// 退貨批
    Return { lot_id: String },
    /// 期初建帳批
    Initiation { lot_id: String },
}

impl SupplySource {
    /// 對應總帳的哨兵訂單編號
    pub fn order_id(&self) -> i64 {
        match self {
            SupplySource::Manufacture { order_id, .. } => *order_id,
            SupplySource::Return { .. } => RETURN_ORDER_ID,
            SupplySource::Initiation { .. } => INITIATION_ORDER_ID,
        }
    }

    /// 對應總帳的批號（非製造來源為 0）
    pub fn batch_number(&self) -> u32 {
        match self {
            SupplySource::Manufacture { batch_number, .. } => *batch_number,
            _ => 0,
        }
    }
}
