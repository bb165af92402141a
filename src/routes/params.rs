use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppError, response::Meta};

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// 1-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Row offset, capped at the largest value Postgres accepts for OFFSET.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }

    pub fn meta(&self, total: u64) -> Meta {
        Meta::new(self.page, self.limit, total)
    }
}

/// `sortOrder`; accepts `ASC`/`DESC` in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(D::Error::custom("sortOrder must be ASC or DESC")),
        }
    }
}

impl From<SortOrder> for sea_orm::Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => sea_orm::Order::Asc,
            SortOrder::Desc => sea_orm::Order::Desc,
        }
    }
}

/// `?url=` of an uploaded asset.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileQuery {
    pub url: Option<String>,
}

/// Date filter bound: RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date_bound(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| AppError::bad_request(format!("Invalid {field}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination::new(None, None);
        assert_eq!((p.page, p.limit, p.offset()), (1, 10, 0));

        let p = Pagination::new(Some(0), Some(1000));
        assert_eq!((p.page, p.limit), (1, MAX_LIMIT));

        let p = Pagination::new(Some(3), Some(20));
        assert_eq!(p.offset(), 40);
        assert_eq!(p.meta(41).total_pages, 3);
    }

    #[test]
    fn huge_pages_do_not_overflow_the_offset() {
        let p = Pagination::new(Some(u64::MAX), Some(100));
        assert_eq!(p.offset(), i64::MAX as u64);
        assert_eq!(p.meta(5).page, u64::MAX);
    }

    #[test]
    fn sort_order_is_case_insensitive() {
        let asc: SortOrder = serde_json::from_str("\"asc\"").unwrap();
        let desc: SortOrder = serde_json::from_str("\"DESC\"").unwrap();
        assert_eq!(asc, SortOrder::Asc);
        assert_eq!(desc, SortOrder::Desc);
        assert!(serde_json::from_str::<SortOrder>("\"sideways\"").is_err());
    }

    #[test]
    fn date_bounds_accept_both_formats() {
        let day = parse_date_bound("start_date", Some("2025-02-01")).unwrap().unwrap();
        assert_eq!(day.to_rfc3339(), "2025-02-01T00:00:00+00:00");

        let ts = parse_date_bound("end_date", Some("2025-02-01T10:30:00+02:00"))
            .unwrap()
            .unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-02-01T08:30:00+00:00");

        assert!(parse_date_bound("end_date", None).unwrap().is_none());
        assert!(parse_date_bound("end_date", Some("yesterday")).is_err());
    }
}
