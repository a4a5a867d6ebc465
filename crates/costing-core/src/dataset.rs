//! 運行工作集
//!
//! 生成運行一次性載入的全部表格。引擎只讀寫這個記憶體內的工作
//! 集；與資料庫之間的批次載入與批次寫回由呼叫端在單一交易內
//! 完成，運行中不發生逐列查詢。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cogs::{CogsEntry, FailedCogsEntry};
use crate::exchange::{FailedStockExchange, StockExchange};
use crate::material::RawMaterialLot;
use crate::order::ManufactureComponent;
use crate::record::{FailedManufactureRecord, ManufactureRecord, SupplySource};
use crate::sales::SalesRecord;
use crate::stock::{ReturnLot, StockInitiationLot};

/// 記憶體內的工作集
///
/// 輸入表（採購批次、用料明細、銷售、退貨、期初建帳、換貨請求）
/// 由外部 CRUD 建立；輸出總帳（製造結果、COGS 及其失敗表）在每
/// 次對應的生成運行中整表重建。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingSet {
    /// 原物料批次
    pub material_lots: Vec<RawMaterialLot>,

    /// 製造訂單用料明細行
    pub manufacture_components: Vec<ManufactureComponent>,

    /// 製造結果總帳
    pub manufacture_records: Vec<ManufactureRecord>,

    /// 失敗的製造結果
    pub failed_manufacture_records: Vec<FailedManufactureRecord>,

    /// 退貨批次
    pub return_lots: Vec<ReturnLot>,

    /// 期初建帳批次
    pub initiation_lots: Vec<StockInitiationLot>,

    /// 銷售記錄
    pub sales_records: Vec<SalesRecord>,

    /// 換貨請求
    pub exchanges: Vec<StockExchange>,

    /// 失敗的換貨請求
    pub failed_exchanges: Vec<FailedStockExchange>,

    /// 銷貨成本總帳
    pub cogs_entries: Vec<CogsEntry>,

    /// 失敗的銷貨成本
    pub failed_cogs_entries: Vec<FailedCogsEntry>,
}

impl WorkingSet {
    /// 創建空的工作集
    pub fn new() -> Self {
        Self::default()
    }

    /// 製造結果生成前的整表重置
    ///
    /// 清空製造結果總帳（含換貨合成批）與失敗表，原物料批次剩餘
    /// 數量回復為採購數量。
    pub fn reset_manufacture_run(&mut self) {
        self.manufacture_records.clear();
        self.failed_manufacture_records.clear();
        for lot in &mut self.material_lots {
            lot.reset_remaining();
        }
    }

    /// 換貨重分配前的重置（僅清失敗表；總帳由重分配本身改寫）
    pub fn reset_exchange_run(&mut self) {
        self.failed_exchanges.clear();
    }

    /// COGS 生成前的整表重置
    ///
    /// 清空 COGS 總帳與失敗表，退貨與期初建帳批次回復為全量。
    /// 製造結果的剩餘數量刻意不重置：它承接製造結果生成與換貨
    /// 重分配已寫入的狀態，兩者必須先行。
    pub fn reset_cogs_run(&mut self) {
        self.cogs_entries.clear();
        self.failed_cogs_entries.clear();
        for lot in &mut self.return_lots {
            lot.reset_remaining();
        }
        for lot in &mut self.initiation_lots {
            lot.reset_remaining();
        }
    }

    /// 守恆稽核
    ///
    /// 對每個帶剩餘數量的實體檢查「總量 − 剩餘 = 總帳已記錄的
    /// 消耗量」。任何一筆不平即回傳 false。
    pub fn conservation_holds(&self) -> bool {
        // 原物料批次 vs 製造結果總帳
        let mut fulfilled_by_lot: HashMap<String, i64> = HashMap::new();
        for record in &self.manufacture_records {
            *fulfilled_by_lot.entry(record.lot_id.clone()).or_default() +=
                record.fulfilled_quantity;
        }
        for lot in &self.material_lots {
            let recorded = fulfilled_by_lot.get(&lot.lot_id()).copied().unwrap_or(0);
            if lot.quantity_remaining < 0
                || lot.quantity_remaining > lot.quantity_purchased
                || recorded != lot.quantity_consumed()
            {
                return false;
            }
        }

        // 製造結果列 vs COGS 總帳
        let mut consumed_by_record: HashMap<(SupplySource, String), i64> = HashMap::new();
        for entry in &self.cogs_entries {
            if let SupplySource::Manufacture { .. } = entry.source {
                *consumed_by_record
                    .entry((entry.source.clone(), entry.product.clone()))
                    .or_default() += entry.quantity;
            }
        }
        for record in &self.manufacture_records {
            let consumed = consumed_by_record
                .get(&(record.source(), record.product.clone()))
                .copied()
                .unwrap_or(0);
            if record.quantity_remaining < 0
                || record.quantity_remaining > record.fulfilled_quantity
                || consumed != record.quantity_consumed()
            {
                return false;
            }
        }

        // 退貨與期初建帳批次 vs COGS 總帳
        let mut consumed_by_source: HashMap<SupplySource, i64> = HashMap::new();
        for entry in &self.cogs_entries {
            if !matches!(entry.source, SupplySource::Manufacture { .. }) {
                *consumed_by_source.entry(entry.source.clone()).or_default() += entry.quantity;
            }
        }
        for lot in &self.return_lots {
            let source = SupplySource::Return {
                lot_id: lot.return_id.clone(),
            };
            let consumed = consumed_by_source.get(&source).copied().unwrap_or(0);
            if lot.quantity_remaining < 0
                || lot.quantity_remaining > lot.quantity
                || consumed != lot.quantity_consumed()
            {
                return false;
            }
        }
        for lot in &self.initiation_lots {
            let source = SupplySource::Initiation {
                lot_id: lot.initiation_id.clone(),
            };
            let consumed = consumed_by_source.get(&source).copied().unwrap_or(0);
            if lot.quantity_remaining < 0
                || lot.quantity_remaining > lot.quantity
                || consumed != lot.quantity_consumed()
            {
                return false;
            }
        }

        true
    }
}
