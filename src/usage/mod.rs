use crate::utils::{GeoAssistError, Result};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

const USAGE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("usage");

// claude-3-haiku prices, $ per 1M tokens, with the observed average
// request/response sizes
const PRICE_INPUT_PER_1M: f64 = 0.25;
const PRICE_OUTPUT_PER_1M: f64 = 1.25;
const AVG_INPUT_TOKENS: u64 = 800;
const AVG_OUTPUT_TOKENS: u64 = 400;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUsage {
    pub user_id: i64,
    pub day: String,
    pub count_today: u32,
    pub count_total: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub day: String,
    pub users: Vec<UserUsage>,
    pub requests_today: u64,
    pub requests_total: u64,
    pub estimated_cost_today: f64,
    pub estimated_cost_total: f64,
}

pub fn estimate_cost(requests: u64) -> f64 {
    let input_tokens = requests * AVG_INPUT_TOKENS;
    let output_tokens = requests * AVG_OUTPUT_TOKENS;
    input_tokens as f64 / 1_000_000.0 * PRICE_INPUT_PER_1M
        + output_tokens as f64 / 1_000_000.0 * PRICE_OUTPUT_PER_1M
}

pub struct UsageStore {
    db: Arc<Database>,
    daily_limit: u32,
}

impl UsageStore {
    pub fn new(db_path: &Path, daily_limit: u32) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(db_path)
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;
        {
            let _ = write_txn
                .open_table(USAGE_TABLE)
                .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            daily_limit,
        })
    }

    /// Count one assistant request for the user, refusing past the daily
    /// limit. The daily counter rolls over on the first request of a new day;
    /// the total keeps accumulating.
    pub fn record_request(&self, user_id: i64) -> Result<UserUsage> {
        self.record_on(user_id, &today())
    }

    fn record_on(&self, user_id: i64, day: &str) -> Result<UserUsage> {
        let mut usage = self.load(user_id)?.unwrap_or(UserUsage {
            user_id,
            day: day.to_string(),
            count_today: 0,
            count_total: 0,
            updated_at: 0,
        });

        if usage.day != day {
            usage.day = day.to_string();
            usage.count_today = 0;
        }

        if usage.count_today >= self.daily_limit {
            return Err(GeoAssistError::DailyLimitReached {
                limit: self.daily_limit,
            });
        }

        usage.count_today += 1;
        usage.count_total += 1;
        usage.updated_at = unix_now();

        self.save(&usage)?;
        Ok(usage)
    }

    pub fn load(&self, user_id: i64) -> Result<Option<UserUsage>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;

        let table = read_txn
            .open_table(USAGE_TABLE)
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;

        match table.get(user_id.to_string().as_str()) {
            Ok(Some(data)) => {
                let usage: UserUsage = serde_json::from_slice(data.value())
                    .map_err(|e| GeoAssistError::SerializationError(e.to_string()))?;
                Ok(Some(usage))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(GeoAssistError::DatabaseError(e.to_string())),
        }
    }

    fn save(&self, usage: &UserUsage) -> Result<()> {
        let data = serde_json::to_vec(usage)
            .map_err(|e| GeoAssistError::SerializationError(e.to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(USAGE_TABLE)
                .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;
            table
                .insert(usage.user_id.to_string().as_str(), data.as_slice())
                .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Aggregate usage across all users with the cost estimate attached.
    pub fn report(&self) -> Result<UsageReport> {
        self.report_for(&today())
    }

    fn report_for(&self, day: &str) -> Result<UsageReport> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;

        let table = read_txn
            .open_table(USAGE_TABLE)
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;

        let mut users = Vec::new();
        let mut requests_today = 0u64;
        let mut requests_total = 0u64;

        let iter = table
            .iter()
            .map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;
        for entry in iter {
            let (_, value) = entry.map_err(|e| GeoAssistError::DatabaseError(e.to_string()))?;
            let usage: UserUsage = serde_json::from_slice(value.value())
                .map_err(|e| GeoAssistError::SerializationError(e.to_string()))?;

            let count_today = if usage.day == day { usage.count_today } else { 0 };
            requests_today += count_today as u64;
            requests_total += usage.count_total;
            users.push(usage);
        }

        Ok(UsageReport {
            day: day.to_string(),
            users,
            requests_today,
            requests_total,
            estimated_cost_today: estimate_cost(requests_today),
            estimated_cost_total: estimate_cost(requests_total),
        })
    }
}

fn today() -> String {
    chrono::Local::now().date_naive().to_string()
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(limit: u32) -> (TempDir, UsageStore) {
        let dir = TempDir::new().unwrap();
        let store = UsageStore::new(&dir.path().join("usage.redb"), limit).unwrap();
        (dir, store)
    }

    #[test]
    fn requests_accumulate_within_a_day() {
        let (_dir, store) = store(10);
        store.record_on(42, "2026-08-07").unwrap();
        let usage = store.record_on(42, "2026-08-07").unwrap();
        assert_eq!(usage.count_today, 2);
        assert_eq!(usage.count_total, 2);
    }

    #[test]
    fn daily_limit_is_enforced() {
        let (_dir, store) = store(2);
        store.record_on(1, "2026-08-07").unwrap();
        store.record_on(1, "2026-08-07").unwrap();
        let err = store.record_on(1, "2026-08-07").unwrap_err();
        assert!(matches!(
            err,
            GeoAssistError::DailyLimitReached { limit: 2 }
        ));
    }

    #[test]
    fn counter_rolls_over_on_a_new_day_but_total_persists() {
        let (_dir, store) = store(2);
        store.record_on(1, "2026-08-06").unwrap();
        store.record_on(1, "2026-08-06").unwrap();
        let usage = store.record_on(1, "2026-08-07").unwrap();
        assert_eq!(usage.count_today, 1);
        assert_eq!(usage.count_total, 3);
    }

    #[test]
    fn report_aggregates_users_and_costs() {
        let (_dir, store) = store(10);
        store.record_on(1, "2026-08-07").unwrap();
        store.record_on(1, "2026-08-07").unwrap();
        store.record_on(2, "2026-08-06").unwrap();

        let report = store.report_for("2026-08-07").unwrap();
        assert_eq!(report.users.len(), 2);
        assert_eq!(report.requests_today, 2);
        assert_eq!(report.requests_total, 3);
        assert!(report.estimated_cost_total > report.estimated_cost_today);
    }

    #[test]
    fn cost_estimate_matches_the_price_table() {
        // 1000 requests: 0.8M input + 0.4M output tokens
        let cost = estimate_cost(1000);
        assert!((cost - (0.8 * 0.25 + 0.4 * 1.25)).abs() < 1e-9);
    }
}
