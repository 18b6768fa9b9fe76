use crate::symbol::SymbolId;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// 成功替換的紀錄，建立後不再變動
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    pub symbol: SymbolId,
    pub stand_in: String,
    pub loaded_at: DateTime<Utc>,
    #[serde(skip)]
    seq: u64,
}

impl OutcomeRecord {
    /// 顯示用的 `符號 -> 替身` 形式
    pub fn display_line(&self) -> String {
        format!("{} -> {}", self.symbol, self.stand_in)
    }
}

/// 替換結果登記表
///
/// 可由多個載入執行緒同時寫入；每個符號的成功紀錄只寫入一次。
#[derive(Debug, Default)]
pub struct OutcomeRegistry {
    loaded: DashMap<SymbolId, OutcomeRecord>,
    failed: DashSet<SymbolId>,
    next_seq: AtomicU64,
}

impl OutcomeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記錄成功替換；符號已有紀錄時回傳 `false` 且不做變更
    pub fn record_loaded(&self, symbol: &SymbolId, stand_in: &str) -> bool {
        match self.loaded.entry(symbol.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(OutcomeRecord {
                    symbol: symbol.clone(),
                    stand_in: stand_in.to_string(),
                    loaded_at: Utc::now(),
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                });
                true
            }
        }
    }

    /// 記錄實體化失敗；回傳是否為首次記錄
    pub fn record_failed(&self, symbol: &SymbolId) -> bool {
        self.failed.insert(symbol.clone())
    }

    pub fn is_loaded(&self, symbol: &SymbolId) -> bool {
        self.loaded.contains_key(symbol)
    }

    pub fn is_failed(&self, symbol: &SymbolId) -> bool {
        self.failed.contains(symbol)
    }

    pub fn count_loaded(&self) -> usize {
        self.loaded.len()
    }

    pub fn count_failed(&self) -> usize {
        self.failed.len()
    }

    /// 依寫入順序排列的紀錄快照
    pub fn records(&self) -> Vec<OutcomeRecord> {
        let mut records: Vec<OutcomeRecord> = self
            .loaded
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.seq);
        records
    }

    /// `符號 -> 替身` 清單，依寫入順序
    pub fn list_loaded(&self) -> Vec<String> {
        self.records()
            .iter()
            .map(OutcomeRecord::display_line)
            .collect()
    }

    /// 失敗符號清單，依名稱排序
    pub fn list_failed(&self) -> Vec<SymbolId> {
        let mut failed: Vec<SymbolId> = self.failed.iter().map(|entry| entry.key().clone()).collect();
        failed.sort();
        failed
    }
}
