use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::validation::validate_title;

/// Default number of tasks per page when the client does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 10;
/// Hard upper bound on `per_page`, whatever the client requests.
pub const MAX_PER_PAGE: u32 = 100;

/// Payload for creating a task.
///
/// `title` is optional at the type level so a missing title is reported as a
/// validation message rather than a deserialization failure.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Required, 1 to 200 characters.
    #[validate(required(message = "Title is required"), custom = "validate_title")]
    pub title: Option<String>,
    /// Defaults to an empty string.
    pub description: Option<String>,
    /// Defaults to `false`.
    pub completed: Option<bool>,
}

/// Payload for a partial update. Omitted fields keep their stored value.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    /// When present, obeys the same rules as on creation.
    #[validate(custom = "validate_title")]
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: i32,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// Identifier of the user who created and owns the task. Never changes.
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
}

/// A validated task that has not been inserted yet.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl NewTask {
    /// Builds an insertable task from a payload that already passed validation.
    pub fn from_input(input: TaskInput, owner_id: i32) -> Self {
        Self {
            owner_id,
            title: input.title.unwrap_or_default(),
            description: input.description.unwrap_or_default(),
            completed: input.completed.unwrap_or(false),
        }
    }
}

/// Filters applied when listing tasks. `None` means "don't filter on this column".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub owner_id: Option<i32>,
    pub completed: Option<bool>,
}

/// Raw query-string parameters for `GET /tasks/tasks`.
///
/// Kept as strings so that unparsable numbers fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub completed: Option<String>,
}

impl TaskQuery {
    /// `true`, `1` and `yes` (any case) mean completed; any other value means not completed.
    pub fn completed_filter(&self) -> Option<bool> {
        self.completed
            .as_deref()
            .map(|value| matches!(value.to_lowercase().as_str(), "true" | "1" | "yes"))
    }

    pub fn page_request(&self) -> PageRequest {
        let parse = |value: &Option<String>| value.as_deref().and_then(|v| v.trim().parse::<i64>().ok());
        PageRequest::new(parse(&self.page), parse(&self.per_page))
    }
}

/// Normalized offset pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Page numbers start at 1; `per_page` is clamped into `1..=MAX_PER_PAGE`.
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32;
        let per_page = per_page
            .unwrap_or(i64::from(DEFAULT_PER_PAGE))
            .clamp(1, i64::from(MAX_PER_PAGE)) as u32;
        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results together with the total number of matching rows.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub request: PageRequest,
}

/// Pagination metadata returned next to a page of results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationInfo {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn pages(&self) -> u32 {
        if self.total <= 0 {
            return 0;
        }
        let per_page = i64::from(self.request.per_page);
        ((self.total + per_page - 1) / per_page) as u32
    }

    pub fn info(&self) -> PaginationInfo {
        let pages = self.pages();
        PaginationInfo {
            page: self.request.page,
            pages,
            per_page: self.request.per_page,
            total: self.total,
            has_next: self.request.page < pages,
            has_prev: self.request.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn query(page: Option<&str>, per_page: Option<&str>, completed: Option<&str>) -> TaskQuery {
        TaskQuery {
            page: page.map(str::to_string),
            per_page: per_page.map(str::to_string),
            completed: completed.map(str::to_string),
        }
    }

    #[test]
    fn test_new_task_defaults() {
        let input = TaskInput {
            title: Some("buy milk".to_string()),
            description: None,
            completed: None,
        };
        let task = NewTask::from_input(input, 3);
        assert_eq!(task.owner_id, 3);
        assert_eq!(task.title, "buy milk");
        assert_eq!(task.description, "");
        assert!(!task.completed);
    }

    #[test]
    fn test_per_page_is_clamped() {
        assert_eq!(query(None, Some("1000"), None).page_request().per_page, MAX_PER_PAGE);
        assert_eq!(query(None, Some("0"), None).page_request().per_page, 1);
        assert_eq!(query(None, None, None).page_request().per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let request = query(Some("abc"), Some("lots"), None).page_request();
        assert_eq!(request, PageRequest { page: 1, per_page: DEFAULT_PER_PAGE });

        let request = query(Some("-4"), None, None).page_request();
        assert_eq!(request.page, 1);
    }

    #[test]
    fn test_completed_filter_parsing() {
        for truthy in ["true", "TRUE", "1", "yes", "Yes"] {
            assert_eq!(query(None, None, Some(truthy)).completed_filter(), Some(true));
        }
        for falsy in ["false", "0", "no", "anything"] {
            assert_eq!(query(None, None, Some(falsy)).completed_filter(), Some(false));
        }
        assert_eq!(query(None, None, None).completed_filter(), None);
    }

    #[test]
    fn test_offset() {
        let request = PageRequest::new(Some(3), Some(20));
        assert_eq!(request.offset(), 40);
        assert_eq!(request.limit(), 20);
    }

    #[test]
    fn test_pagination_info_beyond_last_page() {
        let page: Page<Task> = Page {
            items: Vec::new(),
            total: 25,
            request: PageRequest::new(Some(5), Some(10)),
        };
        assert_eq!(
            page.info(),
            PaginationInfo {
                page: 5,
                pages: 3,
                per_page: 10,
                total: 25,
                has_next: false,
                has_prev: true,
            }
        );
    }

    #[test]
    fn test_pagination_info_first_page() {
        let page: Page<Task> = Page {
            items: Vec::new(),
            total: 11,
            request: PageRequest::new(Some(1), Some(10)),
        };
        let info = page.info();
        assert_eq!(info.pages, 2);
        assert!(info.has_next);
        assert!(!info.has_prev);
    }

    #[test]
    fn test_empty_result_has_no_pages() {
        let page: Page<Task> = Page {
            items: Vec::new(),
            total: 0,
            request: PageRequest::default(),
        };
        let info = page.info();
        assert_eq!(info.pages, 0);
        assert!(!info.has_next);
        assert!(!info.has_prev);
    }
}
