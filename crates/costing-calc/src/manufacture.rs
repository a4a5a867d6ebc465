//! 製造結果生成

use chrono::NaiveDate;
use costing_core::{
    rank_orders, CostingConfig, CostingError, FailedManufactureRecord, ManufactureRecord,
    RankedOrder, WorkingSet, REASON_INSUFFICIENT_STOCK,
};

use crate::{CostingWarning, ManufactureSummary};

/// 製造結果生成器
///
/// 對每張製造訂單串起配比計算與 FIFO 批次分配，整表重建製造
/// 結果總帳並就地更新原料批次的剩餘數量。
pub struct ManufactureGenerator;

impl ManufactureGenerator {
    /// 生成製造結果總帳（整表重建）
    ///
    /// 先重置衍生狀態（總帳清空、原料批次回復採購數量），再依
    /// (製造日期, SKU) 密集編號逐張處理。`as_of` 給定時只納入該
    /// 日（含）以前的訂單，供歷史重放使用。
    pub fn generate(
        ws: &mut WorkingSet,
        config: &CostingConfig,
        as_of: Option<NaiveDate>,
    ) -> costing_core::Result<ManufactureSummary> {
        let start_time = std::time::Instant::now();

        ws.reset_manufacture_run();

        let components: Vec<_> = ws
            .manufacture_components
            .iter()
            .filter(|row| as_of.map_or(true, |cutoff| row.manufacture_date <= cutoff))
            .cloned()
            .collect();
        let orders = rank_orders(&components);

        tracing::info!(
            "開始製造結果生成：訂單 {} 張，原料批次 {} 筆",
            orders.len(),
            ws.material_lots.len()
        );

        let mut summary = ManufactureSummary::empty();
        summary.orders_processed = orders.len();

        for order in &orders {
            tracing::debug!(
                "分配製造訂單 {}：SKU {}，製造日 {}",
                order.order_id,
                order.sku,
                order.manufacture_date
            );

            match Self::allocate_order(ws, config, order) {
                Ok((records, warnings)) if !records.is_empty() => {
                    summary.orders_succeeded += 1;
                    for warning in warnings {
                        summary.add_warning(warning);
                    }
                    ws.manufacture_records.extend(records);
                }
                Ok(_) => {
                    summary.orders_failed += 1;
                    Self::record_failure(ws, order, REASON_INSUFFICIENT_STOCK.to_string());
                }
                // 單張訂單的資料問題記入失敗總帳後繼續處理下一張；
                // 只有內部計算錯誤會中斷整體運行
                Err(err @ (CostingError::CalculationError(_) | CostingError::Other(_))) => {
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!("製造訂單 {} 資料異常：{}", order.order_id, err);
                    summary.orders_failed += 1;
                    Self::record_failure(ws, order, err.to_string());
                }
            }
        }

        summary.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!(
            "製造結果生成完成：成功 {} 張，失敗 {} 張，耗時 {:?}",
            summary.orders_succeeded,
            summary.orders_failed,
            start_time.elapsed()
        );

        Ok(summary)
    }

    /// 單張訂單的配比計算 + 批次分配
    fn allocate_order(
        ws: &mut WorkingSet,
        config: &CostingConfig,
        order: &RankedOrder,
    ) -> costing_core::Result<(Vec<ManufactureRecord>, Vec<CostingWarning>)> {
        let ratios = crate::ratio::RatioCalculator::calculate(&order.components, config)?;

        let warnings = ratios
            .inexact_products
            .iter()
            .map(|product| {
                CostingWarning::warning(
                    format!("訂單 {}", order.order_id),
                    format!(
                        "產品 {} 的需求數量非基準 {} 的整數倍，配比向下取整",
                        product, ratios.base
                    ),
                )
            })
            .collect();

        let records = crate::allocator::BatchAllocator::allocate(
            order,
            &ratios,
            &mut ws.material_lots,
            config,
        )?;

        Ok((records, warnings))
    }

    /// 落整張訂單的失敗列（每個用料產品一列）
    fn record_failure(ws: &mut WorkingSet, order: &RankedOrder, reason: String) {
        for (product, quantity) in &order.components {
            ws.failed_manufacture_records.push(FailedManufactureRecord {
                order_id: order.order_id,
                sku: order.sku.clone(),
                product: product.clone(),
                required_quantity: *quantity,
                manufacture_date: order.manufacture_date,
                reason: reason.clone(),
            });
        }
    }
}
