//! 產品配比計算

use costing_core::{CostingConfig, CostingError};
use std::collections::HashMap;

/// 產品配比計算結果
#[derive(Debug, Clone)]
pub struct ProductRatios {
    /// 基準用量（最小需求數量，即每一完成品單位的正規化因子）
    pub base: i64,

    /// 產品 → 每完成品單位的用量配比
    pub ratios: HashMap<String, i64>,

    /// 需求數量非基準整數倍的產品（寬鬆模式下向下取整）
    pub inexact_products: Vec<String>,
}

impl ProductRatios {
    /// 查詢單一產品的配比
    pub fn ratio_of(&self, product: &str) -> Option<i64> {
        self.ratios.get(product).copied()
    }
}

/// 產品配比計算器
pub struct RatioCalculator;

impl RatioCalculator {
    /// 計算配比
    ///
    /// `base` 取所有產品需求數量的最小值；每個產品的配比為
    /// `需求數量 / base`（整數向下取整）。配比必須每次從當前的
    /// 用料明細重算，不可快取：換貨重分配會在日後以不同脈絡
    /// 引用同一張訂單的配比。
    pub fn calculate(
        components: &[(String, i64)],
        config: &CostingConfig,
    ) -> costing_core::Result<ProductRatios> {
        if components.is_empty() {
            return Err(CostingError::EmptyBillOfMaterials);
        }

        let mut base = i64::MAX;
        for (product, quantity) in components {
            if *quantity <= 0 {
                return Err(CostingError::InvalidQuantity {
                    product: product.clone(),
                    quantity: *quantity,
                });
            }
            base = base.min(*quantity);
        }

        let mut ratios = HashMap::new();
        let mut inexact_products = Vec::new();
        for (product, quantity) in components {
            if quantity % base != 0 {
                if config.strict_ratios {
                    return Err(CostingError::RatioNotExact {
                        product: product.clone(),
                        quantity: *quantity,
                        base,
                    });
                }
                inexact_products.push(product.clone());
            }
            ratios.insert(product.clone(), quantity / base);
        }

        Ok(ProductRatios {
            base,
            ratios,
            inexact_products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pairs(input: &[(&str, i64)]) -> Vec<(String, i64)> {
        input
            .iter()
            .map(|(product, quantity)| (product.to_string(), *quantity))
            .collect()
    }

    #[rstest]
    #[case(&[("A", 10), ("B", 4)], 4, &[("A", 2), ("B", 1)])]
    #[case(&[("A", 6), ("B", 6)], 6, &[("A", 1), ("B", 1)])]
    #[case(&[("A", 9), ("B", 3), ("C", 6)], 3, &[("A", 3), ("B", 1), ("C", 2)])]
    #[case(&[("A", 7)], 7, &[("A", 1)])]
    fn test_ratio_table(
        #[case] input: &[(&str, i64)],
        #[case] expected_base: i64,
        #[case] expected: &[(&str, i64)],
    ) {
        let config = CostingConfig::new();
        let result = RatioCalculator::calculate(&pairs(input), &config).unwrap();

        assert_eq!(result.base, expected_base);
        for (product, ratio) in expected {
            assert_eq!(result.ratio_of(product), Some(*ratio));
        }
    }

    #[test]
    fn test_ratio_is_idempotent() {
        let config = CostingConfig::new();
        let components = pairs(&[("A", 10), ("B", 4)]);

        let first = RatioCalculator::calculate(&components, &config).unwrap();
        let second = RatioCalculator::calculate(&components, &config).unwrap();

        assert_eq!(first.base, second.base);
        assert_eq!(first.ratios, second.ratios);
    }

    #[test]
    fn test_empty_components_fails() {
        let config = CostingConfig::new();
        assert!(matches!(
            RatioCalculator::calculate(&[], &config),
            Err(CostingError::EmptyBillOfMaterials)
        ));
    }

    #[test]
    fn test_zero_quantity_fails() {
        let config = CostingConfig::new();
        let components = pairs(&[("A", 0), ("B", 4)]);

        assert!(matches!(
            RatioCalculator::calculate(&components, &config),
            Err(CostingError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_inexact_multiple_floors_and_flags() {
        // 10 非 4 的整數倍：寬鬆模式下配比取整為 2，並回報產品
        let config = CostingConfig::new();
        let components = pairs(&[("A", 10), ("B", 4)]);

        let result = RatioCalculator::calculate(&components, &config).unwrap();

        assert_eq!(result.ratio_of("A"), Some(2));
        assert_eq!(result.inexact_products, vec!["A".to_string()]);
    }

    #[test]
    fn test_inexact_multiple_strict_mode_fails() {
        let config = CostingConfig::new().with_strict_ratios(true);
        let components = pairs(&[("A", 10), ("B", 4)]);

        assert!(matches!(
            RatioCalculator::calculate(&components, &config),
            Err(CostingError::RatioNotExact { base: 4, .. })
        ));
    }
}
