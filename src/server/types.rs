//! Request and response bodies of the `/links` API.

use serde::{Deserialize, Serialize};

use crate::analyzer::{HeadingCounts, UnreachableLink};
use crate::state::CheckStatus;
use crate::storage::AnalysisRecord;

/// Body of `POST /links`.
#[derive(Debug, Deserialize)]
pub struct AddLinksRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Query params of `GET /links`, parsed by hand for precise 400s.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub amount: Option<String>,
    pub page: Option<String>,
}

/// Body of `PUT /links`.
#[derive(Debug, Deserialize)]
pub struct UpdateLinkRequest {
    pub id: i64,
    pub status: String,
}

/// One record as the API shows it.
#[derive(Debug, Serialize)]
pub struct LinkView {
    pub id: i64,
    pub url: String,
    pub post_time: String,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_time: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_version: Option<String>,
    pub headings_count: HeadingCounts,
    pub internal_links: u32,
    pub external_links: u32,
    pub inaccessible_links: u32,
    pub inaccessible_details: Vec<UnreachableLink>,
    pub has_login_form: bool,
}

impl From<AnalysisRecord> for LinkView {
    fn from(record: AnalysisRecord) -> Self {
        Self {
            id: record.id,
            url: record.url,
            post_time: record.submitted_at.to_rfc3339(),
            status: record.status,
            check_time: record.checked_at.map(|t| t.to_rfc3339()),
            title: record.title,
            html_version: record.html_version.map(|v| v.as_str().to_string()),
            headings_count: record.headings,
            internal_links: record.internal_link_count,
            external_links: record.external_link_count,
            inaccessible_links: record.unreachable_link_count,
            inaccessible_details: record.unreachable_links,
            has_login_form: record.has_login_form,
        }
    }
}

/// Pagination block of a listing.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

/// Response of `GET /links`.
#[derive(Debug, Serialize)]
pub struct LinksResponse {
    pub links: Vec<LinkView>,
    pub pagination: Pagination,
}
