//! 庫存換貨重分配
//!
//! 把 `sku_original` 的已製造存貨改掛到 `sku_new` 名下，而不是
//! 重跑一張製造訂單。取用順序依完成日期 LIFO（最近完成的批
//! 先用），與 COGS 生成的 FIFO 相反；這個不對稱是刻意保留的
//! 來源行為。每筆請求全有或全無：湊不滿請求數量時不落任何
//! 異動，只記一列失敗。

use chrono::NaiveDate;
use costing_core::{
    rank_orders, CostingConfig, CostingError, FailedStockExchange, ManufactureRecord, StockExchange,
    WorkingSet, REASON_INSUFFICIENT_EXCHANGE,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::ratio::RatioCalculator;
use crate::ExchangeSummary;

/// 庫存換貨重分配器
pub struct ExchangeResettler;

impl ExchangeResettler {
    /// 依換貨日期遞增逐筆處理換貨請求
    ///
    /// `as_of` 給定時只納入該日（含）以前的請求，供歷史重放使用。
    pub fn resettle(
        ws: &mut WorkingSet,
        config: &CostingConfig,
        as_of: Option<NaiveDate>,
    ) -> costing_core::Result<ExchangeSummary> {
        let start_time = std::time::Instant::now();

        ws.reset_exchange_run();

        let mut requests: Vec<StockExchange> = ws
            .exchanges
            .iter()
            .filter(|request| as_of.map_or(true, |cutoff| request.exchange_date <= cutoff))
            .cloned()
            .collect();
        requests.sort_by_key(|request| request.exchange_date);

        // 正編號訂單的配比要從當前用料明細重算；重放時必須沿用
        // 與製造結果生成相同的編號脈絡
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

        tracing::info!("開始換貨重分配：請求 {} 筆", requests.len());

        let mut summary = ExchangeSummary::empty();
        summary.requests_processed = requests.len();

        for request in &requests {
            tracing::debug!(
                "處理換貨 {} → {}：{} 個，換貨日 {}",
                request.sku_original,
                request.sku_new,
                request.quantity,
                request.exchange_date
            );

            match Self::apply_request(ws, config, &order_components, request) {
                Ok(true) => summary.requests_applied += 1,
                Ok(false) => {
                    summary.requests_failed += 1;
                    ws.failed_exchanges.push(FailedStockExchange::from_request(
                        request,
                        REASON_INSUFFICIENT_EXCHANGE.to_string(),
                    ));
                }
                Err(err @ (CostingError::CalculationError(_) | CostingError::Other(_))) => {
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!("換貨請求 {} 資料異常：{}", request.id, err);
                    summary.requests_failed += 1;
                    ws.failed_exchanges
                        .push(FailedStockExchange::from_request(request, err.to_string()));
                }
            }
        }

        summary.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!(
            "換貨重分配完成：套用 {} 筆，失敗 {} 筆，耗時 {:?}",
            summary.requests_applied,
            summary.requests_failed,
            start_time.elapsed()
        );

        Ok(summary)
    }

    /// 處理單筆換貨請求；回傳是否套用
    ///
    /// 先把整筆請求的扣減計畫暫存起來，確認數量全額湊滿後才
    /// 一次套用；湊不滿時丟棄暫存，總帳不留任何變動。
    fn apply_request(
        ws: &mut WorkingSet,
        config: &CostingConfig,
        order_components: &HashMap<i64, Vec<(String, i64)>>,
        request: &StockExchange,
    ) -> costing_core::Result<bool> {
        // 可取用的原 SKU 製造結果列，依 (完成日期, 批號, 訂單編號)
        // 遞減：優先消耗最近完成的存貨
        let mut indices: Vec<usize> = ws
            .manufacture_records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                record.sku == request.sku_original
                    && record.quantity_remaining > 0
                    && record.completion_date <= request.exchange_date
            })
            .map(|(index, _)| index)
            .collect();
        indices.sort_by(|&a, &b| {
            let ka = &ws.manufacture_records[a];
            let kb = &ws.manufacture_records[b];
            (kb.completion_date, kb.batch_number, kb.order_id)
                .cmp(&(ka.completion_date, ka.batch_number, ka.order_id))
        });

        // 依 (訂單, 批號) 分組；同組的列排序鍵相同，必然相鄰
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut last_key: Option<(i64, u32)> = None;
        for index in indices {
            let record = &ws.manufacture_records[index];
            let key = (record.order_id, record.batch_number);
            if last_key == Some(key) {
                if let Some(group) = groups.last_mut() {
                    group.push(index);
                }
            } else {
                groups.push(vec![index]);
                last_key = Some(key);
            }
        }

        // 暫存的扣減計畫：每組 (列索引, 扣減原料數量)
        let mut staged: Vec<Vec<(usize, i64)>> = Vec::new();
        let mut remaining_request = request.quantity;

        for group in &groups {
            if remaining_request == 0 {
                break;
            }

            let ratios = Self::group_ratios(ws, config, order_components, group)?;

            // 本組可抽出的完成品單位數
            let mut units_available = i64::MAX;
            let mut plan: Vec<(usize, i64)> = Vec::with_capacity(group.len());
            for &index in group {
                let record = &ws.manufacture_records[index];
                let ratio = ratios.ratio_of(&record.product).ok_or_else(|| {
                    CostingError::MissingRatio {
                        order_id: record.order_id,
                        product: record.product.clone(),
                    }
                })?;
                units_available = units_available.min(record.quantity_remaining / ratio);
                plan.push((index, ratio));
            }

            let take = units_available.min(remaining_request);
            if take == 0 {
                continue;
            }

            staged.push(
                plan.into_iter()
                    .map(|(index, ratio)| (index, take * ratio))
                    .collect(),
            );
            remaining_request -= take;
        }

        if remaining_request > 0 {
            return Ok(false);
        }

        // 全額湊滿：套用暫存計畫。合成訂單編號取現有最小值再減一
        // （首筆為 -2），批號對每個取用的組依序從 1 起算。
        let synthetic_order_id = ws
            .manufacture_records
            .iter()
            .map(|record| record.order_id)
            .min()
            .unwrap_or(0)
            .min(-1)
            - 1;

        let mut new_records = Vec::new();
        for (group_offset, group_plan) in staged.iter().enumerate() {
            let batch_number = group_offset as u32 + 1;
            for &(index, consumed) in group_plan {
                let record = &mut ws.manufacture_records[index];
                record.fulfilled_quantity -= consumed;
                record.quantity_remaining -= consumed;
                record.cost = Decimal::from(record.fulfilled_quantity) * record.unit_cost;

                new_records.push(ManufactureRecord::new(
                    synthetic_order_id,
                    batch_number,
                    request.sku_new.clone(),
                    record.product.clone(),
                    record.lot_id.clone(),
                    consumed,
                    record.unit_cost,
                    request.exchange_date,
                ));
            }
        }
        ws.manufacture_records.extend(new_records);

        Ok(true)
    }

    /// 重新推導一組批次的產品配比
    ///
    /// 正編號訂單從當前用料明細重算；哨兵編號（換貨合成批）沒有
    /// 用料明細，改以該批自身的各產品數量推導，兩者在數值上等價。
    fn group_ratios(
        ws: &WorkingSet,
        config: &CostingConfig,
        order_components: &HashMap<i64, Vec<(String, i64)>>,
        group: &[usize],
    ) -> costing_core::Result<crate::ratio::ProductRatios> {
        let order_id = ws.manufacture_records[group[0]].order_id;

        let pairs: Vec<(String, i64)> = if order_id > 0 {
            order_components
                .get(&order_id)
                .cloned()
                .ok_or(CostingError::MissingComponents(order_id))?
        } else {
            group
                .iter()
                .map(|&index| {
                    let record = &ws.manufacture_records[index];
                    (record.product.clone(), record.fulfilled_quantity)
                })
                .collect()
        };

        RatioCalculator::calculate(&pairs, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costing_core::{ManufactureComponent, RawMaterialLot, FIRST_EXCHANGE_ORDER_ID};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 兩張訂單各產出 10 個 SKU-A（BEAN 配比 2、BAG 配比 1），
    /// 完成日分別為 11/1 與 11/8
    fn manufactured_ws() -> WorkingSet {
        let mut ws = WorkingSet::new();
        ws.material_lots = vec![
            RawMaterialLot::new(
                "PO-1".to_string(),
                "BEAN".to_string(),
                date(2025, 10, 1),
                100,
                Decimal::from(2),
            ),
            RawMaterialLot::new(
                "PO-2".to_string(),
                "BAG".to_string(),
                date(2025, 10, 2),
                100,
                Decimal::ONE,
            ),
        ];
        for day in [1, 8] {
            ws.manufacture_components.push(ManufactureComponent::new(
                "SKU-A".to_string(),
                "BEAN".to_string(),
                20,
                date(2025, 11, day),
            ));
            ws.manufacture_components.push(ManufactureComponent::new(
                "SKU-A".to_string(),
                "BAG".to_string(),
                10,
                date(2025, 11, day),
            ));
        }
        let config = CostingConfig::new();
        crate::manufacture::ManufactureGenerator::generate(&mut ws, &config, None).unwrap();
        ws
    }

    #[test]
    fn test_exchange_prefers_latest_completed_batch() {
        let mut ws = manufactured_ws();
        ws.exchanges.push(StockExchange::new(
            "SKU-A".to_string(),
            "SKU-B".to_string(),
            4,
            date(2025, 11, 10),
        ));
        let config = CostingConfig::new();

        let summary = ExchangeResettler::resettle(&mut ws, &config, None).unwrap();

        assert_eq!(summary.requests_applied, 1);

        // 只有 11/8 完成的訂單 2 被扣（LIFO）
        let order2_bean = ws
            .manufacture_records
            .iter()
            .find(|r| r.order_id == 2 && r.product == "BEAN")
            .unwrap();
        assert_eq!(order2_bean.fulfilled_quantity, 12); // 20 - 4×2
        assert_eq!(order2_bean.quantity_remaining, 12);
        assert_eq!(order2_bean.cost, Decimal::from(24));

        let order1_bean = ws
            .manufacture_records
            .iter()
            .find(|r| r.order_id == 1 && r.product == "BEAN")
            .unwrap();
        assert_eq!(order1_bean.fulfilled_quantity, 20);

        // 合成批：編號 -2，批號 1，掛在新 SKU 名下
        let synthetic: Vec<_> = ws
            .manufacture_records
            .iter()
            .filter(|r| r.order_id == FIRST_EXCHANGE_ORDER_ID)
            .collect();
        assert_eq!(synthetic.len(), 2);
        assert!(synthetic.iter().all(|r| r.sku == "SKU-B"));
        assert!(synthetic.iter().all(|r| r.batch_number == 1));
        assert!(synthetic
            .iter()
            .all(|r| r.completion_date == date(2025, 11, 10)));
        let synthetic_bean = synthetic.iter().find(|r| r.product == "BEAN").unwrap();
        assert_eq!(synthetic_bean.fulfilled_quantity, 8);

        assert!(ws.conservation_holds());
    }

    #[test]
    fn test_exchange_shortfall_commits_nothing() {
        let mut ws = manufactured_ws();
        // 兩張訂單合計 20 個完成品單位，請求 25 個
        ws.exchanges.push(StockExchange::new(
            "SKU-A".to_string(),
            "SKU-B".to_string(),
            25,
            date(2025, 11, 10),
        ));
        let config = CostingConfig::new();
        let before = ws.manufacture_records.clone();

        let summary = ExchangeResettler::resettle(&mut ws, &config, None).unwrap();

        assert_eq!(summary.requests_applied, 0);
        assert_eq!(summary.requests_failed, 1);
        assert_eq!(ws.manufacture_records, before);
        assert_eq!(ws.failed_exchanges.len(), 1);
        assert_eq!(
            ws.failed_exchanges[0].reason,
            REASON_INSUFFICIENT_EXCHANGE
        );
    }

    #[test]
    fn test_exchange_only_sees_batches_completed_by_exchange_date() {
        let mut ws = manufactured_ws();
        // 換貨日 11/3：只看得到 11/1 完成的 10 個單位
        ws.exchanges.push(StockExchange::new(
            "SKU-A".to_string(),
            "SKU-B".to_string(),
            12,
            date(2025, 11, 3),
        ));
        let config = CostingConfig::new();

        let summary = ExchangeResettler::resettle(&mut ws, &config, None).unwrap();

        assert_eq!(summary.requests_applied, 0);
        assert_eq!(summary.requests_failed, 1);
    }

    #[test]
    fn test_sequential_exchanges_get_decreasing_ids() {
        let mut ws = manufactured_ws();
        ws.exchanges.push(StockExchange::new(
            "SKU-A".to_string(),
            "SKU-B".to_string(),
            3,
            date(2025, 11, 10),
        ));
        ws.exchanges.push(StockExchange::new(
            "SKU-A".to_string(),
            "SKU-C".to_string(),
            2,
            date(2025, 11, 12),
        ));
        let config = CostingConfig::new();

        let summary = ExchangeResettler::resettle(&mut ws, &config, None).unwrap();

        assert_eq!(summary.requests_applied, 2);
        assert!(ws
            .manufacture_records
            .iter()
            .any(|r| r.order_id == -2 && r.sku == "SKU-B"));
        assert!(ws
            .manufacture_records
            .iter()
            .any(|r| r.order_id == -3 && r.sku == "SKU-C"));
        assert!(ws.conservation_holds());
    }

    #[test]
    fn test_exchange_can_draw_from_prior_synthetic_batch() {
        let mut ws = manufactured_ws();
        // 先換成 SKU-B，再把 SKU-B 換成 SKU-C：第二筆只能從合成批取
        ws.exchanges.push(StockExchange::new(
            "SKU-A".to_string(),
            "SKU-B".to_string(),
            5,
            date(2025, 11, 10),
        ));
        ws.exchanges.push(StockExchange::new(
            "SKU-B".to_string(),
            "SKU-C".to_string(),
            2,
            date(2025, 11, 12),
        ));
        let config = CostingConfig::new();

        let summary = ExchangeResettler::resettle(&mut ws, &config, None).unwrap();

        assert_eq!(summary.requests_applied, 2);
        let synthetic_c: Vec<_> = ws
            .manufacture_records
            .iter()
            .filter(|r| r.sku == "SKU-C")
            .collect();
        assert_eq!(synthetic_c.len(), 2);
        let bean = synthetic_c.iter().find(|r| r.product == "BEAN").unwrap();
        assert_eq!(bean.fulfilled_quantity, 4); // 2 個單位 × 配比 2
        assert!(ws.conservation_holds());
    }
}
