//! 製造訂單模型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 製造訂單用料明細行（外部輸入）
///
/// 同一 (製造日期, SKU) 的多行合起來構成一張訂單的用料清單。
/// 訂單編號不由外部提供，而是在每次生成運行前重新密集編號。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManufactureComponent {
    /// 完成品 SKU
    pub sku: String,

    /// 用料產品代號
    pub product: String,

    /// 需求數量
    pub required_quantity: i64,

    /// 製造日期
    pub manufacture_date: NaiveDate,
}

impl ManufactureComponent {
    /// 創建新的用料明細行
    pub fn new(
        sku: String,
        product: String,
        required_quantity: i64,
        manufacture_date: NaiveDate,
    ) -> Self {
        Self {
            sku,
            product,
            required_quantity,
            manufacture_date,
        }
    }
}

/// 排序編號後的製造訂單
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedOrder {
    /// 訂單編號（依 (製造日期, SKU) 密集編號，從 1 起算）
    pub order_id: i64,

    /// 完成品 SKU
    pub sku: String,

    /// 製造日期
    pub manufacture_date: NaiveDate,

    /// 用料需求（產品 → 需求數量）
    pub components: Vec<(String, i64)>,
}

/// 依 (製造日期, SKU) 將用料明細行重新密集編號為訂單序列
///
/// 編號在每次生成運行前重算，刪單留下的編號空洞不會出現；
/// 相同 (製造日期, SKU) 的明細行合併為同一張訂單，重複產品
/// 的需求數量相加。
pub fn rank_orders(components: &[ManufactureComponent]) -> Vec<RankedOrder> {
    let mut grouped: BTreeMap<(NaiveDate, String), Vec<(String, i64)>> = BTreeMap::new();

    for row in components {
        let entry = grouped
            .entry((row.manufacture_date, row.sku.clone()))
            .or_default();

        match entry.iter_mut().find(|(product, _)| product == &row.product) {
            Some((_, quantity)) => *quantity += row.required_quantity,
            None => entry.push((row.product.clone(), row.required_quantity)),
        }
    }

    grouped
        .into_iter()
        .enumerate()
        .map(|(index, ((manufacture_date, sku), components))| RankedOrder {
            order_id: index as i64 + 1,
            sku,
            manufacture_date,
            components,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rank_orders_dense_by_date_then_sku() {
        let components = vec![
            ManufactureComponent::new("SKU-B".to_string(), "BEAN".to_string(), 10, date(2025, 11, 5)),
            ManufactureComponent::new("SKU-A".to_string(), "BEAN".to_string(), 4, date(2025, 11, 1)),
            ManufactureComponent::new("SKU-A".to_string(), "BAG".to_string(), 8, date(2025, 11, 1)),
            ManufactureComponent::new("SKU-A".to_string(), "BEAN".to_string(), 2, date(2025, 11, 5)),
        ];

        let orders = rank_orders(&components);

        assert_eq!(orders.len(), 3);

        // 11/1 SKU-A 最先，編號 1，兩個產品
        assert_eq!(orders[0].order_id, 1);
        assert_eq!(orders[0].sku, "SKU-A");
        assert_eq!(orders[0].components.len(), 2);

        // 同日期時依 SKU 排序
        assert_eq!(orders[1].order_id, 2);
        assert_eq!(orders[1].sku, "SKU-A");
        assert_eq!(orders[2].order_id, 3);
        assert_eq!(orders[2].sku, "SKU-B");
    }

    #[test]
    fn test_rank_orders_merges_duplicate_product_rows() {
        let components = vec![
            ManufactureComponent::new("SKU-A".to_string(), "BEAN".to_string(), 4, date(2025, 11, 1)),
            ManufactureComponent::new("SKU-A".to_string(), "BEAN".to_string(), 6, date(2025, 11, 1)),
        ];

        let orders = rank_orders(&components);

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].components, vec![("BEAN".to_string(), 10)]);
    }

    #[test]
    fn test_rank_orders_empty_input() {
        assert!(rank_orders(&[]).is_empty());
    }
}
