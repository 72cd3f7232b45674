//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{
    ActivitiesResponse, MarkReadRequest, MarkReadResponse, QuerySignatureResponse,
    RecentActivitiesResponse,
};
use crate::api::handlers::{system, watchers};
use crate::domain::{ActivityFilters, ActivityRecord, AnnotatedActivity};
use crate::error::ErrorResponse;

/// Generated OpenAPI specification, served at `/api-docs/openapi.json`
/// when the `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "watcher-gateway", description = "Wallet activity watcher with read tracking"),
    paths(
        watchers::list_activities,
        watchers::recent_activities,
        watchers::mark_read,
        watchers::query_signature,
        system::health_handler,
    ),
    components(schemas(
        ActivityRecord,
        AnnotatedActivity,
        ActivityFilters,
        ActivitiesResponse,
        RecentActivitiesResponse,
        MarkReadRequest,
        MarkReadResponse,
        QuerySignatureResponse,
        ErrorResponse,
        system::HealthResponse,
    )),
    tags(
        (name = "Watchers", description = "Activity listing and read tracking"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_watcher_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/watchers/activities",
            "/api/watchers/recent-activities",
            "/api/watchers/mark-read",
            "/api/watchers/query-signature",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
