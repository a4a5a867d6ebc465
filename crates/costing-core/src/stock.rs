//! 退貨與期初建帳批次模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 退貨批次
///
/// 完成品供應來源之一，與原物料批次相同的可變剩餘數量模式。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnLot {
    /// 退貨編號
    pub return_id: String,

    /// 退回的 SKU
    pub sku: String,

    /// 退貨日期
    pub return_date: NaiveDate,

    /// 退貨數量
    pub quantity: i64,

    /// 剩餘數量（可變，初始 = 退貨數量）
    pub quantity_remaining: i64,

    /// 單位成本
    pub unit_cost: Decimal,
}

impl ReturnLot {
    /// 創建新的退貨批次
    pub fn new(
        return_id: String,
        sku: String,
        return_date: NaiveDate,
        quantity: i64,
        unit_cost: Decimal,
    ) -> Self {
        Self {
            return_id,
            sku,
            return_date,
            quantity,
            quantity_remaining: quantity,
            unit_cost,
        }
    }

    /// 重設剩餘數量（COGS 生成運行開始時呼叫）
    pub fn reset_remaining(&mut self) {
        self.quantity_remaining = self.quantity;
    }

    /// 已消耗數量
    pub fn quantity_consumed(&self) -> i64 {
        self.quantity - self.quantity_remaining
    }
}

/// 期初建帳批次
///
/// 系統導入時既有的完成品存貨；在 COGS 總帳中以
/// `INITIATION & ADDITION ` 前綴標示供應來源，避免與實際
/// 採購單號混淆。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockInitiationLot {
    /// 建帳編號
    pub initiation_id: String,

    /// SKU
    pub sku: String,

    /// 建帳日期
    pub initiation_date: NaiveDate,

    /// 建帳數量
    pub quantity: i64,

    /// 剩餘數量（可變，初始 = 建帳數量）
    pub quantity_remaining: i64,

    /// 單位成本
    pub unit_cost: Decimal,
}

impl StockInitiationLot {
    /// 創建新的期初建帳批次
    pub fn new(
        initiation_id: String,
        sku: String,
        initiation_date: NaiveDate,
        quantity: i64,
        unit_cost: Decimal,
    ) -> Self {
        Self {
            initiation_id,
            sku,
            initiation_date,
            quantity,
            quantity_remaining: quantity,
            unit_cost,
        }
    }

    /// 重設剩餘數量（COGS 生成運行開始時呼叫）
    pub fn reset_remaining(&mut self) {
        self.quantity_remaining = self.quantity;
    }

    /// 已消耗數量
    pub fn quantity_consumed(&self) -> i64 {
        self.quantity - self.quantity_remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_lot_reset() {
        let mut lot = ReturnLot::new(
            "RET-01".to_string(),
            "SKU-A".to_string(),
            NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
            5,
            Decimal::from(12),
        );

        lot.quantity_remaining = 1;
        assert_eq!(lot.quantity_consumed(), 4);

        lot.reset_remaining();
        assert_eq!(lot.quantity_remaining, 5);
    }
}
