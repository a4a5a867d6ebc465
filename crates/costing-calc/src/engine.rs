//! 成本分配引擎主入口

use chrono::NaiveDate;
use costing_core::{CostingConfig, InventorySnapshot, WorkingSet};

use crate::cogs::CogsGenerator;
use crate::exchange::ExchangeResettler;
use crate::manufacture::ManufactureGenerator;
use crate::snapshot::SnapshotBuilder;
use crate::{CogsSummary, ExchangeSummary, ManufactureSummary, RunReport};

/// 成本分配引擎
///
/// 單執行緒批次作業：一次運行讀寫同一個工作集，呼叫端負責交易
/// 邊界與批次載入/寫回。同一份資料集不可並行執行兩個運行，須
/// 由呼叫端以單一寫入者鎖序列化。
pub struct CostingEngine {
    /// 引擎配置
    config: CostingConfig,
}

impl CostingEngine {
    /// 創建新的引擎
    pub fn new(config: CostingConfig) -> Self {
        Self { config }
    }

    /// 獲取配置引用
    pub fn config(&self) -> &CostingConfig {
        &self.config
    }

    /// 生成製造結果總帳
    pub fn generate_manufacture_records(
        &self,
        ws: &mut WorkingSet,
    ) -> costing_core::Result<ManufactureSummary> {
        ManufactureGenerator::generate(ws, &self.config, None)
    }

    /// 換貨重分配
    pub fn resettle_exchanges(
        &self,
        ws: &mut WorkingSet,
    ) -> costing_core::Result<ExchangeSummary> {
        ExchangeResettler::resettle(ws, &self.config, None)
    }

    /// 生成銷貨成本總帳
    pub fn generate_cogs(&self, ws: &mut WorkingSet) -> costing_core::Result<CogsSummary> {
        CogsGenerator::generate(ws, &self.config, None)
    }

    /// 由目前總帳彙總庫存快照
    pub fn build_snapshot(&self, ws: &WorkingSet, as_of: NaiveDate) -> Vec<InventorySnapshot> {
        SnapshotBuilder::build(ws, as_of)
    }

    /// 歷史重放：以截止日期重算快照（不動到現行總帳）
    pub fn snapshot_as_of(
        &self,
        ws: &WorkingSet,
        as_of: NaiveDate,
    ) -> costing_core::Result<Vec<InventorySnapshot>> {
        SnapshotBuilder::snapshot_as_of(ws, as_of, &self.config)
    }

    /// 平行計算多個截止日期的快照序列
    pub fn snapshot_series(
        &self,
        ws: &WorkingSet,
        dates: &[NaiveDate],
    ) -> costing_core::Result<Vec<(NaiveDate, Vec<InventorySnapshot>)>> {
        SnapshotBuilder::snapshot_series(ws, dates, &self.config)
    }

    /// 完整運行
    ///
    /// 三個階段順序固定：製造結果生成 → 換貨重分配 → COGS 生成。
    /// 後一階段讀取前一階段寫入的剩餘數量狀態，順序不可對調。
    pub fn run_all(&self, ws: &mut WorkingSet) -> costing_core::Result<RunReport> {
        tracing::info!(
            "開始完整成本運行：原料批次 {} 筆，用料明細 {} 行，銷售 {} 筆，換貨 {} 筆",
            ws.material_lots.len(),
            ws.manufacture_components.len(),
            ws.sales_records.len(),
            ws.exchanges.len()
        );

        let start_time = std::time::Instant::now();

        tracing::debug!("Step 1: 製造結果生成");
        let manufacture = ManufactureGenerator::generate(ws, &self.config, None)?;

        tracing::debug!("Step 2: 換貨重分配");
        let exchange = ExchangeResettler::resettle(ws, &self.config, None)?;

        tracing::debug!("Step 3: 銷貨成本生成");
        let cogs = CogsGenerator::generate(ws, &self.config, None)?;

        let report = RunReport {
            manufacture,
            exchange,
            cogs,
            calculation_time_ms: Some(start_time.elapsed().as_millis()),
        };

        tracing::info!("完整成本運行結束，耗時 {:?}", start_time.elapsed());

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costing_core::{ManufactureComponent, RawMaterialLot, SalesRecord};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_run_all_reports_every_stage() {
        let mut ws = WorkingSet::new();
        ws.material_lots.push(RawMaterialLot::new(
            "PO-1".to_string(),
            "BEAN".to_string(),
            date(2025, 10, 1),
            100,
            Decimal::from(2),
        ));
        ws.manufacture_components.push(ManufactureComponent::new(
            "SKU-A".to_string(),
            "BEAN".to_string(),
            20,
            date(2025, 11, 1),
        ));
        ws.sales_records.push(SalesRecord::new(
            "S-1".to_string(),
            "SKU-A".to_string(),
            5,
            date(2025, 11, 5),
        ));

        let engine = CostingEngine::new(CostingConfig::new());
        let report = engine.run_all(&mut ws).unwrap();

        assert_eq!(report.manufacture.orders_succeeded, 1);
        assert_eq!(report.exchange.requests_processed, 0);
        assert_eq!(report.cogs.sales_fulfilled, 1);
        assert!(report.calculation_time_ms.is_some());
        assert!(ws.conservation_holds());
    }
}
