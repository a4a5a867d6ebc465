//! FIFO 批次分配器
//!
//! 把單張製造訂單的多產品配比需求轉為整數個完成品單位，
//! 原料從各產品的批次池依下單日期 FIFO 取用。

use costing_core::{
    CostingConfig, CostingError, ManufactureRecord, RankedOrder, RawMaterialLot,
};
use std::collections::VecDeque;

use crate::ratio::ProductRatios;

/// FIFO 批次分配器
pub struct BatchAllocator;

impl BatchAllocator {
    /// 對單張製造訂單執行配比鎖定的 FIFO 批次分配
    ///
    /// 回傳產生的總帳列並就地遞減供料批次的剩餘數量。批次池中
    /// `order_date <= 製造日期 + 收料寬限天數` 的批次才可取用。
    /// 任一產品斷料即停止繼續成批，已成批的部分保留；完全無法
    /// 產出任何批次時回傳空 Vec，由呼叫端落整張訂單的失敗列。
    pub fn allocate(
        order: &RankedOrder,
        ratios: &ProductRatios,
        material_lots: &mut [RawMaterialLot],
        config: &CostingConfig,
    ) -> costing_core::Result<Vec<ManufactureRecord>> {
        let cutoff = config.latest_eligible_order_date(order.manufacture_date);

        // 需求側可完成的 SKU 數 = min(需求數量 / 配比)
        let mut plan: Vec<(String, i64)> = Vec::with_capacity(order.components.len());
        let mut required_skus = i64::MAX;
        for (product, quantity) in &order.components {
            let ratio =
                ratios
                    .ratio_of(product)
                    .ok_or_else(|| CostingError::MissingRatio {
                        order_id: order.order_id,
                        product: product.clone(),
                    })?;
            required_skus = required_skus.min(quantity / ratio);
            plan.push((product.clone(), ratio));
        }

        if plan.is_empty() || required_skus <= 0 {
            return Ok(Vec::new());
        }

        // 每個產品一個 FIFO 佇列：可取用批次的索引，依下單日期
        // 穩定排序（同日維持輸入順序）
        let mut queues: Vec<VecDeque<usize>> = plan
            .iter()
            .map(|(product, _)| {
                let mut indices: Vec<usize> = material_lots
                    .iter()
                    .enumerate()
                    .filter(|(_, lot)| {
                        lot.product == *product
                            && lot.quantity_remaining > 0
                            && lot.order_date <= cutoff
                    })
                    .map(|(index, _)| index)
                    .collect();
                indices.sort_by_key(|&index| material_lots[index].order_date);
                indices.into()
            })
            .collect();

        let mut records = Vec::new();
        let mut fulfilled_skus = 0i64;
        let mut batch_number = 1u32;

        'batching: while fulfilled_skus < required_skus {
            // 丟棄湊不滿一個配比單位的隊首批次（本張訂單內不再回頭），
            // 任一產品的佇列耗盡即停止繼續成批
            for (k, (_, ratio)) in plan.iter().enumerate() {
                while let Some(&front) = queues[k].front() {
                    if material_lots[front].quantity_remaining < *ratio {
                        queues[k].pop_front();
                    } else {
                        break;
                    }
                }
                if queues[k].is_empty() {
                    break 'batching;
                }
            }

            // 本批可完成的單位數 = min(隊首剩餘 / 配比)，再以未滿足
            // 的需求封頂
            let mut achievable = required_skus - fulfilled_skus;
            let mut fronts: Vec<usize> = Vec::with_capacity(plan.len());
            for (k, (_, ratio)) in plan.iter().enumerate() {
                match queues[k].front() {
                    Some(&front) => {
                        achievable =
                            achievable.min(material_lots[front].quantity_remaining / ratio);
                        fronts.push(front);
                    }
                    None => break 'batching,
                }
            }

            // 消耗並記帳：每個產品各一列
            for (k, (product, ratio)) in plan.iter().enumerate() {
                let lot_index = fronts[k];
                let consumed = achievable * ratio;
                let lot_id = material_lots[lot_index].lot_id();
                let unit_cost = material_lots[lot_index].unit_cost;

                material_lots[lot_index].consume(consumed)?;
                if material_lots[lot_index].quantity_remaining == 0 {
                    queues[k].pop_front();
                }

                records.push(ManufactureRecord::new(
                    order.order_id,
                    batch_number,
                    order.sku.clone(),
                    product.clone(),
                    lot_id,
                    consumed,
                    unit_cost,
                    order.manufacture_date,
                ));
            }

            batch_number += 1;
            fulfilled_skus += achievable;
        }

        Ok(records)
    }
}
