//! 成本引擎配置模型

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// 成本分配引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostingConfig {
    /// 收料寬限天數
    ///
    /// 批次在 `order_date <= manufacture_date + 寬限天數` 時可供
    /// 製造訂單取用：下單略晚於製造日的批次視為在途補貨，仍可
    /// 回溯供料。這是業務規則而非缺陷。
    pub receiving_window_days: i64,

    /// 是否要求用料數量為配比基準的整數倍
    /// - false: 非整數倍時配比向下取整，數量落差以警告回報（預設，
    ///   沿用來源系統行為）
    /// - true: 非整數倍直接判定該張訂單失敗
    ///
    /// 使用場景：
    /// - false: 與既有報表對帳、輸入資料已知含尾差
    /// - true: 新導入資料，要求用料清單嚴格成比例
    pub strict_ratios: bool,
}

impl CostingConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            receiving_window_days: 5,
            strict_ratios: false, // 預設沿用來源系統的取整行為
        }
    }

    /// 建構器模式：設置收料寬限天數
    pub fn with_receiving_window_days(mut self, days: i64) -> Self {
        self.receiving_window_days = days;
        self
    }

    /// 建構器模式：設置嚴格配比檢查
    pub fn with_strict_ratios(mut self, strict: bool) -> Self {
        self.strict_ratios = strict;
        self
    }

    /// 指定製造日期下，批次可被取用的最晚下單日
    pub fn latest_eligible_order_date(&self, manufacture_date: NaiveDate) -> NaiveDate {
        manufacture_date
            .checked_add_signed(Duration::days(self.receiving_window_days))
            .expect("日期溢出")
    }
}

impl Default for CostingConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CostingConfig::new();

        assert_eq!(config.receiving_window_days, 5);
        assert!(!config.strict_ratios);
    }

    #[test]
    fn test_config_builder() {
        let config = CostingConfig::new()
            .with_receiving_window_days(3)
            .with_strict_ratios(true);

        assert_eq!(config.receiving_window_days, 3);
        assert!(config.strict_ratios);
    }

    #[test]
    fn test_latest_eligible_order_date() {
        let config = CostingConfig::new();
        let manufacture_date = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();

        // 預設寬限 5 天：11/6 前（含）下單的批次可供 11/1 的訂單取用
        assert_eq!(
            config.latest_eligible_order_date(manufacture_date),
            NaiveDate::from_ymd_opt(2025, 11, 6).unwrap()
        );
    }
}
