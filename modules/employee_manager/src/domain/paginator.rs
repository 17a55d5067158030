//! Paginated employee search: input normalization, one count, one page fetch.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use modkit_db::PageWindow;
use tracing::{debug, warn};

use crate::contract::model::{Employee, Page, PageRequest, SearchCriteria, SortSpec};
use crate::domain::error::{storage_error, DomainError, FieldViolation};
use crate::domain::repo::{EmployeeFilter, EmployeeRepository, EmployeeSort, SortDirection, SortKey};

pub const PAGE_NUMBER_INVALID: &str = "Page number must be greater than 0";

pub struct EmployeeSearchPaginator {
    repo: Arc<dyn EmployeeRepository>,
    default_page_size: u64,
    max_page_size: u64,
}

impl EmployeeSearchPaginator {
    pub fn new(repo: Arc<dyn EmployeeRepository>, default_page_size: u32, max_page_size: u32) -> Self {
        let max_page_size = u64::from(max_page_size.max(1));
        Self {
            repo,
            default_page_size: u64::from(default_page_size).clamp(1, max_page_size),
            max_page_size,
        }
    }

    /// Apply defaults, reject non-positive values and clamp oversized pages.
    pub fn resolve_window(&self, req: PageRequest) -> Result<PageWindow, DomainError> {
        let mut errors = Vec::new();
        let page = req.page.unwrap_or(1);
        if page < 1 {
            errors.push(FieldViolation::new("page", PAGE_NUMBER_INVALID));
        }
        let page_size = req.page_size.unwrap_or(self.default_page_size as i64);
        if page_size < 1 {
            errors.push(FieldViolation::new(
                "pageSize",
                format!("Page size must be between 1 and {}", self.max_page_size),
            ));
        }
        if !errors.is_empty() {
            return Err(DomainError::validation(errors));
        }
        Ok(PageWindow::new(
            page as u64,
            (page_size as u64).min(self.max_page_size),
        ))
    }

    pub async fn paginate(
        &self,
        req: PageRequest,
        search: &SearchCriteria,
        sort: &SortSpec,
    ) -> Result<Page<Employee>, DomainError> {
        let window = self.resolve_window(req)?;
        let filter = normalize_search(search);
        let sort = resolve_sort(sort);
        debug!(?window, ?filter, ?sort, "paginating employees");

        let total_items = self
            .repo
            .count_matching(&filter)
            .await
            .map_err(storage_error)?;
        let total_pages = window.total_pages(total_items);
        // Past the last row: nothing to fetch, and the offset may not fit an SQL integer.
        let data = if window.offset() >= total_items {
            Vec::new()
        } else {
            self.repo
                .fetch_page(&filter, sort, window)
                .await
                .map_err(storage_error)?
        };

        Ok(Page {
            data,
            page: window.page,
            page_size: window.page_size,
            total_items,
            total_pages,
            has_next: window.page < total_pages,
            has_previous: window.page > 1,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Trim every field, drop blanks and parse the date filters. Unparseable
/// dates are ignored.
pub fn normalize_search(search: &SearchCriteria) -> EmployeeFilter {
    EmployeeFilter {
        department: non_blank(&search.department).map(str::to_owned),
        full_name: non_blank(&search.full_name).map(str::to_owned),
        birth_date: non_blank(&search.birth_date).and_then(|raw| search_date("birthDate", raw)),
        hire_date: non_blank(&search.hire_date).and_then(|raw| search_date("hireDate", raw)),
        salary_prefix: non_blank(&search.salary).map(str::to_owned),
    }
}

fn search_date(field: &'static str, raw: &str) -> Option<NaiveDate> {
    let parsed = parse_iso_date(raw);
    if parsed.is_none() {
        warn!(field, value = raw, "ignoring unparseable date filter");
    }
    parsed
}

/// `YYYY-MM-DD`, optionally followed by a time part (`T` or space separated,
/// with or without an offset). Only the date is kept.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

pub fn resolve_sort(sort: &SortSpec) -> EmployeeSort {
    let key = match non_blank(&sort.field).map(str::to_lowercase).as_deref() {
        Some("departmentname") => SortKey::DepartmentName,
        Some("fullname") => SortKey::FullName,
        Some("birthdate") => SortKey::BirthDate,
        Some("hiredate") => SortKey::HireDate,
        Some("salary") => SortKey::Salary,
        _ => return EmployeeSort::default(),
    };
    let direction = match non_blank(&sort.direction) {
        Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
        _ => SortDirection::Asc,
    };
    EmployeeSort { key, direction }
}
