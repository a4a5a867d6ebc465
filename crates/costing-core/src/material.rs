//! 原物料批次模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 原物料批次（採購訂單明細行）
///
/// 批次以 (採購單號, 產品) 為複合鍵。`quantity_remaining` 只由
/// 批次分配器遞減，任何時刻必須落在 0 與採購數量之間。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMaterialLot {
    /// 採購訂單編號
    pub order_id: String,

    /// 原料代號
    pub product: String,

    /// 下單日期
    pub order_date: NaiveDate,

    /// 採購數量
    pub quantity_purchased: i64,

    /// 剩餘數量（可變，初始 = 採購數量）
    pub quantity_remaining: i64,

    /// 單位成本（單價 × 匯率）
    pub unit_cost: Decimal,
}

impl RawMaterialLot {
    /// 創建新的原物料批次
    pub fn new(
        order_id: String,
        product: String,
        order_date: NaiveDate,
        quantity_purchased: i64,
        unit_cost: Decimal,
    ) -> Self {
        Self {
            order_id,
            product,
            order_date,
            quantity_purchased,
            quantity_remaining: quantity_purchased,
            unit_cost,
        }
    }

    /// 建構器模式：套用匯率（原單價 × 匯率 = 入帳單位成本）
    pub fn with_exchange_rate(mut self, rate: Decimal) -> Self {
        self.unit_cost *= rate;
        self
    }

    /// 複合批次鍵（採購單號 + 產品）
    pub fn lot_id(&self) -> String {
        format!("{}-{}", self.order_id, self.product)
    }

    /// 消耗數量（不得超過剩餘數量）
    pub fn consume(&mut self, quantity: i64) -> crate::Result<()> {
        if quantity < 0 || quantity > self.quantity_remaining {
            return Err(crate::CostingError::CalculationError(format!(
                "批次 {} 消耗超量：消耗 {}, 剩餘 {}",
                self.lot_id(),
                quantity,
                self.quantity_remaining
            )));
        }
        self.quantity_remaining -= quantity;
        Ok(())
    }

    /// 重設剩餘數量為採購數量（生成運行開始時呼叫）
    pub fn reset_remaining(&mut self) {
        self.quantity_remaining = self.quantity_purchased;
    }

    /// 已消耗數量
    pub fn quantity_consumed(&self) -> i64 {
        self.quantity_purchased - self.quantity_remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_lot() {
        let lot = RawMaterialLot::new(
            "PO-1001".to_string(),
            "BEAN".to_string(),
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            100,
            Decimal::new(250, 2), // 2.50
        );

        assert_eq!(lot.lot_id(), "PO-1001-BEAN");
        assert_eq!(lot.quantity_remaining, 100);
        assert_eq!(lot.quantity_consumed(), 0);
    }

    #[test]
    fn test_exchange_rate_builder() {
        let lot = RawMaterialLot::new(
            "PO-1002".to_string(),
            "BAG".to_string(),
            NaiveDate::from_ymd_opt(2025, 10, 2).unwrap(),
            50,
            Decimal::from(10),
        )
        .with_exchange_rate(Decimal::new(32, 1)); // 匯率 3.2

        assert_eq!(lot.unit_cost, Decimal::from(32));
    }

    #[test]
    fn test_consume_and_reset() {
        let mut lot = RawMaterialLot::new(
            "PO-1003".to_string(),
            "LID".to_string(),
            NaiveDate::from_ymd_opt(2025, 10, 3).unwrap(),
            30,
            Decimal::ONE,
        );

        assert!(lot.consume(20).is_ok());
        assert_eq!(lot.quantity_remaining, 10);
        assert_eq!(lot.quantity_consumed(), 20);

        // 超量消耗應該失敗，剩餘數量不變
        assert!(lot.consume(11).is_err());
        assert_eq!(lot.quantity_remaining, 10);

        lot.reset_remaining();
        assert_eq!(lot.quantity_remaining, 30);
    }
}
