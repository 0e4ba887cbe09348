use crate::{
    error::{AppError, Result},
    utils::serde_helpers::empty_as_none,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// 已校验的分页参数，`page` 与 `page_size` 均从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page < 1 {
            return Err(AppError::validation("page must be greater than or equal to 1"));
        }
        if page_size < 1 {
            return Err(AppError::validation("pageSize must be greater than or equal to 1"));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// 列表接口通用的 `page` / `pageSize` 查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page_size: Option<u32>,
}

impl PaginationQuery {
    pub fn resolve(&self, default_page_size: u32, max_page_size: u32) -> Result<PageRequest> {
        let page_size = self.page_size.unwrap_or(default_page_size);
        if page_size > max_page_size {
            return Err(AppError::Validation(format!(
                "pageSize must not exceed {}",
                max_page_size
            )));
        }
        PageRequest::new(self.page.unwrap_or(1), page_size)
    }
}

/// 仓储层返回的单页数据与匹配总数
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub rows: Vec<T>,
    pub count: i64,
}

/// 列表响应信封 `{items, total, page, pageSize}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> ListResponse<T> {
    pub fn from_page(result: Paginated<T>, page: PageRequest) -> Self {
        Self {
            items: result.rows,
            total: result.count,
            page: page.page(),
            page_size: page.page_size(),
        }
    }
}

/// 闭区间日期范围，保证 `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(AppError::validation("startTime must not be after endTime"));
        }
        Ok(Self { start, end })
    }

    /// 解析查询参数中的起止时间，支持 RFC 3339 与 `YYYY-MM-DD`
    ///
    /// 仅给出日期时，起点取当天 00:00:00，终点取当天最后一刻。
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_of_day = NaiveTime::from_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::internal("invalid start-of-day time"))?;
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .ok_or_else(|| AppError::internal("invalid end-of-day time"))?;
        let start = parse_bound(start, start_of_day, "startTime")?;
        let end = parse_bound(end, end_of_day, "endTime")?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[cfg(test)]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

fn parse_bound(raw: &str, time_of_day: NaiveTime, field: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| Utc.from_utc_datetime(&date.and_time(time_of_day)))
        .map_err(|_| AppError::Validation(format!("{} must be a date (YYYY-MM-DD) or RFC 3339 timestamp", field)))
}

/// `startTime` / `endTime` 查询参数
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_time: String,
    pub end_time: String,
    #[serde(flatten)]
    pub pagination: PaginationQuery,
}

impl DateRangeQuery {
    pub fn range(&self) -> Result<DateRange> {
        DateRange::parse(&self.start_time, &self.end_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_page_request_rejects_zero() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, 1).is_ok());
    }

    #[test]
    fn test_offset_for_third_page() {
        let page = PageRequest::new(3, 10).unwrap();
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_query_defaults_and_cap() {
        let query = PaginationQuery::default();
        let page = query.resolve(10, 100).unwrap();
        assert_eq!((page.page(), page.page_size()), (1, 10));

        let query = PaginationQuery { page: Some(2), page_size: Some(101) };
        assert!(query.resolve(10, 100).is_err());
    }

    #[test]
    fn test_list_response_serializes_camel_case() {
        let page = PageRequest::new(2, 5).unwrap();
        let response = ListResponse::from_page(Paginated { rows: vec![1, 2], count: 7 }, page);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["pageSize"], 5);
        assert_eq!(json["total"], 7);
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_date_range_parse_dates() {
        let range = DateRange::parse("2023-01-01", "2023-01-31").unwrap();
        assert_eq!(range.start().to_rfc3339(), "2023-01-01T00:00:00+00:00");
        assert!(range.contains("2023-01-31T18:00:00Z".parse().unwrap()));
        assert!(!range.contains("2023-02-01T00:00:00Z".parse().unwrap()));
    }

    #[test]
    fn test_date_range_parse_rfc3339() {
        let range = DateRange::parse("2023-01-01T08:00:00+08:00", "2023-01-02T00:00:00Z").unwrap();
        assert_eq!(range.start().to_rfc3339(), "2023-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_date_range_rejects_inverted_and_garbage() {
        assert!(DateRange::parse("2023-02-01", "2023-01-01").is_err());
        assert!(DateRange::parse("yesterday", "2023-01-01").is_err());
        // 同一天是合法区间
        assert!(DateRange::parse("2023-01-01", "2023-01-01").is_ok());
    }

    proptest! {
        #[test]
        fn prop_offset_matches_formula(page in 1u32..10_000, page_size in 1u32..1_000) {
            let request = PageRequest::new(page, page_size).unwrap();
            prop_assert_eq!(request.offset(), (page as i64 - 1) * page_size as i64);
            prop_assert!(request.offset() >= 0);
        }
    }
}
