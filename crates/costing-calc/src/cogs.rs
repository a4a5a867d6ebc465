//! 銷貨成本生成
//!
//! 以三種完成品供應來源（製造結果、退貨、期初建帳）依完成/退
//! 貨/建帳日期 FIFO 滿足各銷售記錄。部分滿足是常態：分配到的
//! 部分照常落盤，缺口另記一列失敗。

use chrono::NaiveDate;
use costing_core::{
    rank_orders, CogsEntry, CostingConfig, CostingError, FailedCogsEntry, SalesRecord,
    SupplySource, WorkingSet, INITIATION_FULFILLED_BY_PREFIX, REASON_INSUFFICIENT_STOCK,
    REASON_NO_INVENTORY,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::ratio::RatioCalculator;
use crate::CogsSummary;

/// 單筆銷售的處理結果
enum SaleOutcome {
    Fulfilled,
    Partial,
    Failed,
}

/// 統一供應清單中的一個條目
struct SupplyEntry {
    date: NaiveDate,
    kind: SupplyKind,
    /// 可抽出的完成品單位數
    units_available: i64,
}

enum SupplyKind {
    /// 製造結果批：同批各產品列的 (列索引, 配比)
    Batch { rows: Vec<(usize, i64)> },
    /// 退貨批（工作集內索引）
    Return { index: usize },
    /// 期初建帳批（工作集內索引）
    Initiation { index: usize },
}

/// 銷貨成本生成器
pub struct CogsGenerator;

impl CogsGenerator {
    /// 生成銷貨成本總帳（整表重建）
    ///
    /// 重置 COGS 總帳與退貨/期初建帳批次；製造結果的剩餘數量刻
    /// 意承接製造結果生成與換貨重分配寫入的狀態，兩者必須先行。
    /// 銷售記錄依銷售日期遞增逐筆處理。
    pub fn generate(
        ws: &mut WorkingSet,
        config: &CostingConfig,
        as_of: Option<NaiveDate>,
    ) -> costing_core::Result<CogsSummary> {
        let start_time = std::time::Instant::now();

        ws.reset_cogs_run();

        let mut sales: Vec<SalesRecord> = ws
            .sales_records
            .iter()
            .filter(|sale| as_of.map_or(true, |cutoff| sale.sales_date <= cutoff))
            .cloned()
            .collect();
        sales.sort_by_key(|sale| sale.sales_date);

        // 製造批的配比脈絡（與製造結果生成相同的編號）
        let components: Vec<_> = ws
            .manufacture_components
            .iter()
            .filter(|row| as_of.map_or(true, |cutoff| row.manufacture_date <= cutoff))
            .cloned()
            .collect();
        let order_components: HashMap<i64, Vec<(String, i64)>> = rank_orders(&components)
            .into_iter()
            .map(|order| (order.order_id, order.components))
            .collect();

        tracing::info!(
            "開始銷貨成本生成：銷售 {} 筆，製造結果 {} 列，退貨 {} 筆，期初建帳 {} 筆",
            sales.len(),
            ws.manufacture_records.len(),
            ws.return_lots.len(),
            ws.initiation_lots.len()
        );

        let mut summary = CogsSummary::empty();
        summary.sales_processed = sales.len();

        for sale in &sales {
            tracing::debug!(
                "分配銷售 {}：SKU {}，{} 個，銷售日 {}",
                sale.sales_record_id,
                sale.sku,
                sale.quantity_sold,
                sale.sales_date
            );

            match Self::allocate_sale(ws, config, &order_components, sale) {
                Ok(SaleOutcome::Fulfilled) => summary.sales_fulfilled += 1,
                Ok(SaleOutcome::Partial) => summary.sales_partial += 1,
                Ok(SaleOutcome::Failed) => summary.sales_failed += 1,
                Err(err @ (CostingError::CalculationError(_) | CostingError::Other(_))) => {
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!("銷售 {} 資料異常：{}", sale.sales_record_id, err);
                    summary.sales_failed += 1;
                    ws.failed_cogs_entries.push(FailedCogsEntry {
                        sales_record_id: sale.sales_record_id.clone(),
                        sku: sale.sku.clone(),
                        quantity: sale.quantity_sold,
                        sales_date: sale.sales_date,
                        reason: err.to_string(),
                    });
                }
            }
        }

        summary.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!(
            "銷貨成本生成完成：全額 {} 筆，部分 {} 筆，失敗 {} 筆，耗時 {:?}",
            summary.sales_fulfilled,
            summary.sales_partial,
            summary.sales_failed,
            start_time.elapsed()
        );

        Ok(summary)
    }

    /// 處理單筆銷售記錄
    fn allocate_sale(
        ws: &mut WorkingSet,
        config: &CostingConfig,
        order_components: &HashMap<i64, Vec<(String, i64)>>,
        sale: &SalesRecord,
    ) -> costing_core::Result<SaleOutcome> {
        let mut entries = Self::collect_supply(ws, config, order_components, sale)?;

        let total_available: i64 = entries.iter().map(|entry| entry.units_available).sum();
        if total_available == 0 {
            ws.failed_cogs_entries.push(FailedCogsEntry {
                sales_record_id: sale.sales_record_id.clone(),
                sku: sale.sku.clone(),
                quantity: sale.quantity_sold,
                sales_date: sale.sales_date,
                reason: REASON_NO_INVENTORY.to_string(),
            });
            return Ok(SaleOutcome::Failed);
        }

        // 日期遞增 FIFO；同日時穩定維持 製造 → 退貨 → 期初建帳
        // 的加入順序
        entries.sort_by_key(|entry| entry.date);

        let mut remaining_sale = sale.quantity_sold;
        for entry in &entries {
            if remaining_sale == 0 {
                break;
            }
            let take = remaining_sale.min(entry.units_available);
            if take == 0 {
                continue;
            }

            match &entry.kind {
                SupplyKind::Batch { rows } => {
                    // 消耗要展開到同批的所有兄弟產品列
                    for &(index, ratio) in rows {
                        let record = &mut ws.manufacture_records[index];
                        let consumed = take * ratio;
                        record.quantity_remaining -= consumed;

                        ws.cogs_entries.push(CogsEntry {
                            sales_record_id: sale.sales_record_id.clone(),
                            sku: sale.sku.clone(),
                            sales_date: sale.sales_date,
                            source: SupplySource::Manufacture {
                                order_id: record.order_id,
                                batch_number: record.batch_number,
                            },
                            product: record.product.clone(),
                            fulfilled_by: record.lot_id.clone(),
                            quantity: consumed,
                            unit_cost: record.unit_cost,
                            cost: Decimal::from(consumed) * record.unit_cost,
                        });
                    }
                }
                SupplyKind::Return { index } => {
                    let lot = &mut ws.return_lots[*index];
                    lot.quantity_remaining -= take;

                    ws.cogs_entries.push(CogsEntry {
                        sales_record_id: sale.sales_record_id.clone(),
                        sku: sale.sku.clone(),
                        sales_date: sale.sales_date,
                        source: SupplySource::Return {
                            lot_id: lot.return_id.clone(),
                        },
                        product: sale.sku.clone(),
                        fulfilled_by: lot.return_id.clone(),
                        quantity: take,
                        unit_cost: lot.unit_cost,
                        cost: Decimal::from(take) * lot.unit_cost,
                    });
                }
                SupplyKind::Initiation { index } => {
                    let lot = &mut ws.initiation_lots[*index];
                    lot.quantity_remaining -= take;

                    ws.cogs_entries.push(CogsEntry {
                        sales_record_id: sale.sales_record_id.clone(),
                        sku: sale.sku.clone(),
                        sales_date: sale.sales_date,
                        source: SupplySource::Initiation {
                            lot_id: lot.initiation_id.clone(),
                        },
                        product: sale.sku.clone(),
                        // 前綴區隔期初建帳來源與實際採購單號
                        fulfilled_by: format!(
                            "{}{}",
                            INITIATION_FULFILLED_BY_PREFIX, lot.initiation_id
                        ),
                        quantity: take,
                        unit_cost: lot.unit_cost,
                        cost: Decimal::from(take) * lot.unit_cost,
                    });
                }
            }

            remaining_sale -= take;
        }

        if remaining_sale > 0 {
            ws.failed_cogs_entries.push(FailedCogsEntry {
                sales_record_id: sale.sales_record_id.clone(),
                sku: sale.sku.clone(),
                quantity: remaining_sale,
                sales_date: sale.sales_date,
                reason: REASON_INSUFFICIENT_STOCK.to_string(),
            });
            return Ok(SaleOutcome::Partial);
        }

        Ok(SaleOutcome::Fulfilled)
    }

    /// 彙集三種來源在銷售日（含）以前、尚有剩餘的供應條目
    fn collect_supply(
        ws: &WorkingSet,
        config: &CostingConfig,
        order_components: &HashMap<i64, Vec<(String, i64)>>,
        sale: &SalesRecord,
    ) -> costing_core::Result<Vec<SupplyEntry>> {
        let mut entries = Vec::new();

        // 製造結果批：依 (訂單, 批號) 分組，可用單位數以同批各
        // 產品列的剩餘 / 配比取最小
        let mut batch_groups: Vec<((i64, u32), Vec<usize>)> = Vec::new();
        let mut group_positions: HashMap<(i64, u32), usize> = HashMap::new();
        for (index, record) in ws.manufacture_records.iter().enumerate() {
            if record.sku != sale.sku
                || record.quantity_remaining <= 0
                || record.completion_date > sale.sales_date
            {
                continue;
            }
            let key = (record.order_id, record.batch_number);
            match group_positions.get(&key) {
                Some(&position) => batch_groups[position].1.push(index),
                None => {
                    group_positions.insert(key, batch_groups.len());
                    batch_groups.push((key, vec![index]));
                }
            }
        }

        for ((order_id, _), row_indices) in &batch_groups {
            let pairs: Vec<(String, i64)> = if *order_id > 0 {
                order_components
                    .get(order_id)
                    .cloned()
                    .ok_or(CostingError::MissingComponents(*order_id))?
            } else {
                row_indices
                    .iter()
                    .map(|&index| {
                        let record = &ws.manufacture_records[index];
                        (record.product.clone(), record.fulfilled_quantity)
                    })
                    .collect()
            };
            let ratios = RatioCalculator::calculate(&pairs, config)?;

            let mut units_available = i64::MAX;
            let mut rows: Vec<(usize, i64)> = Vec::with_capacity(row_indices.len());
            for &index in row_indices {
                let record = &ws.manufacture_records[index];
                let ratio = ratios.ratio_of(&record.product).ok_or_else(|| {
                    CostingError::MissingRatio {
                        order_id: record.order_id,
                        product: record.product.clone(),
                    }
                })?;
                units_available = units_available.min(record.quantity_remaining / ratio);
                rows.push((index, ratio));
            }

            if units_available > 0 {
                entries.push(SupplyEntry {
                    date: ws.manufacture_records[row_indices[0]].completion_date,
                    kind: SupplyKind::Batch { rows },
                    units_available,
                });
            }
        }

        for (index, lot) in ws.return_lots.iter().enumerate() {
            if lot.sku == sale.sku
                && lot.quantity_remaining > 0
                && lot.return_date <= sale.sales_date
            {
                entries.push(SupplyEntry {
                    date: lot.return_date,
                    kind: SupplyKind::Return { index },
                    units_available: lot.quantity_remaining,
                });
            }
        }

        for (index, lot) in ws.initiation_lots.iter().enumerate() {
            if lot.sku == sale.sku
                && lot.quantity_remaining > 0
                && lot.initiation_date <= sale.sales_date
            {
                entries.push(SupplyEntry {
                    date: lot.initiation_date,
                    kind: SupplyKind::Initiation { index },
                    units_available: lot.quantity_remaining,
                });
            }
        }

        Ok(entries)
    }
}
