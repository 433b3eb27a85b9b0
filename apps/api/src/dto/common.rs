use curanet_application::Page;
use serde::Serialize;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Generic message response for simple mutations.
#[derive(Debug, Serialize)]
pub struct GenericMessageResponse {
    pub message: String,
}

/// Collection pagination metadata.
#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Paginated collection envelope.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> From<Page<T>> for Paginated<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            meta: PageMeta {
                current_page: page.current_page,
                last_page: page.last_page,
                per_page: page.per_page,
                total: page.total,
            },
            data: page.data,
        }
    }
}
