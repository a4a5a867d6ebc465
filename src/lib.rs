//! # Costing
//!
//! 小型製造/電商營運的存貨成本會計引擎：採購批次 → 製造結果 →
//! 換貨重分配 → 銷貨成本 → 庫存快照。
//!
//! 本 crate 是門面，重新匯出 `costing-core`（資料模型）與
//! `costing-calc`（計算引擎）的主要類型。

pub use costing_calc::{
    CogsSummary, CostingEngine, CostingWarning, ExchangeSummary, ManufactureSummary,
    ProductRatios, RatioCalculator, RunReport, WarningSeverity,
};
pub use costing_core::{
    rank_orders, CogsEntry, CostingConfig, CostingError, FailedCogsEntry,
    FailedManufactureRecord, FailedStockExchange, InventorySnapshot, ManufactureComponent,
    ManufactureRecord, RankedOrder, RawMaterialLot, Result, ReturnLot, SalesRecord, SnapshotKind,
    StockExchange, StockInitiationLot, SupplySource, WorkingSet,
};
