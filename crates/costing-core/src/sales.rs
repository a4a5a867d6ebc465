//! 銷售記錄模型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 銷售記錄（外部輸入）
///
/// 以 (銷售記錄編號, SKU) 為複合鍵。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRecord {
    /// 銷售記錄編號
    pub sales_record_id: String,

    /// 銷售 SKU
    pub sku: String,

    /// 銷售數量
    pub quantity_sold: i64,

    /// 銷售日期
    pub sales_date: NaiveDate,
}

impl SalesRecord {
    /// 創建新的銷售記錄
    pub fn new(
        sales_record_id: String,
        sku: String,
        quantity_sold: i64,
        sales_date: NaiveDate,
    ) -> Self {
        Self {
            sales_record_id,
            sku,
            quantity_sold,
            sales_date,
        }
    }
}
