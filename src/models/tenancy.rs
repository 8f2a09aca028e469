// src/models/tenancy.rs

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. Tenant (a "Empresa")
// ---
// Fronteira de isolamento: tudo abaixo pertence a exatamente uma empresa.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "STV Streaming")]
    pub name: String,
    #[schema(example = "stv-streaming")]
    pub slug: String,
    #[schema(example = "12.345.678/0001-99")]
    pub document_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Licença do sistema
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub starts_on: NaiveDate,
    pub access_days: i32,
    pub created_at: DateTime<Utc>,
}

impl License {
    pub fn ends_on(&self) -> NaiveDate {
        let days = u64::try_from(self.access_days).unwrap_or(0);
        self.starts_on
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn remaining_days(&self, today: NaiveDate) -> i64 {
        (self.ends_on() - today).num_days().max(0)
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.remaining_days(today) <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn license(starts_on: NaiveDate, access_days: i32) -> License {
        License {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            starts_on,
            access_days,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn license_counts_remaining_days_until_the_end_date() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let lic = license(start, 30);
        let today = NaiveDate::from_ymd_opt(2025, 1, 21).unwrap();
        assert_eq!(lic.remaining_days(today), 10);
        assert!(!lic.is_expired(today));
    }

    #[test]
    fn license_expires_on_its_end_date() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let lic = license(start, 1);
        assert!(!lic.is_expired(start));
        assert!(lic.is_expired(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()));
        assert_eq!(lic.remaining_days(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()), 0);
    }
}
