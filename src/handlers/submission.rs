use crate::error::{AppError, AppResult};
use crate::geo::Coordinate;
use crate::middleware::AuthUser;
use crate::models::{venue::CourtType, SubmissionModel};
use crate::response::ApiResponse;
use crate::services::submission::{NewSubmission, SubmissionService};
use crate::utils::{sanitize_optional, sanitize_plain};
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

const MAX_FEATURES: usize = 12;
const MAX_FEATURE_CHARS: usize = 40;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubmissionRequest {
    /// Venue name (1-120 characters)
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 80))]
    pub suburb: String,
    #[validate(length(min = 1, max = 80))]
    pub region: String,
    #[validate(length(max = 200))]
    pub address: Option<String>,
    /// Latitude; send together with `longitude` or not at all
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    /// indoor, outdoor or hybrid
    pub court_type: String,
    #[validate(length(max = 60))]
    pub surface: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub court_count: Option<i32>,
    #[serde(default)]
    pub features: Vec<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreateSubmissionRequest {
    /// Field checks beyond what the derive covers, then sanitize text.
    fn into_new_submission(self) -> AppResult<NewSubmission> {
        let coordinate = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "latitude and longitude must be given together".to_string(),
                ))
            }
        };
        let court_type: CourtType = self.court_type.parse()?;

        if self.features.len() > MAX_FEATURES {
            return Err(AppError::Validation(format!(
                "At most {} features allowed",
                MAX_FEATURES
            )));
        }
        let mut features: Vec<String> = Vec::with_capacity(self.features.len());
        for f in &self.features {
            let clean = sanitize_plain(f);
            if clean.is_empty() || clean.chars().count() > MAX_FEATURE_CHARS {
                return Err(AppError::Validation(format!(
                    "Features must be 1-{} characters",
                    MAX_FEATURE_CHARS
                )));
            }
            if !features.iter().any(|existing| existing.eq_ignore_ascii_case(&clean)) {
                features.push(clean);
            }
        }

        let name = sanitize_plain(&self.name);
        let suburb = sanitize_plain(&self.suburb);
        let region = sanitize_plain(&self.region);
        if name.is_empty() || suburb.is_empty() || region.is_empty() {
            return Err(AppError::Validation(
                "name, suburb and region are required".to_string(),
            ));
        }

        Ok(NewSubmission {
            name,
            suburb,
            region,
            address: sanitize_optional(self.address.as_deref()),
            coordinate,
            court_type,
            surface: sanitize_optional(self.surface.as_deref()),
            court_count: self.court_count,
            features,
            notes: sanitize_optional(self.notes.as_deref()),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub id: i32,
    pub name: String,
    pub suburb: String,
    pub region: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub court_type: String,
    pub surface: Option<String>,
    pub court_count: Option<i32>,
    pub features: Vec<String>,
    pub notes: Option<String>,
    /// pending, approved or rejected
    pub status: String,
    pub rejection_reason: Option<String>,
    /// Venue created on approval
    pub venue_id: Option<i32>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
}

impl From<SubmissionModel> for SubmissionResponse {
    fn from(s: SubmissionModel) -> Self {
        let features = serde_json::from_value(s.features).unwrap_or_default();
        Self {
            id: s.id,
            name: s.name,
            suburb: s.suburb,
            region: s.region,
            address: s.address,
            latitude: s.latitude,
            longitude: s.longitude,
            court_type: s.court_type,
            surface: s.surface,
            court_count: s.court_count,
            features,
            notes: s.notes,
            status: s.status,
            rejection_reason: s.rejection_reason,
            venue_id: s.venue_id,
            reviewed_at: s.reviewed_at.map(|t| t.to_string()),
            created_at: s.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/submissions",
    request_body = CreateSubmissionRequest,
    responses(
        (status = 200, description = "Submission queued for review", body = SubmissionResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    security(("jwt_token" = [])),
    tag = "submissions"
)]
pub async fn create_submission(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateSubmissionRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let input = payload.into_new_submission()?;

    let submission = SubmissionService::new(db)
        .create(Some(auth_user.user_id), input)
        .await?;

    tracing::info!(submission_id = submission.id, user_id = %auth_user.user_id, "Venue submitted");
    Ok(ApiResponse::with_message(
        SubmissionResponse::from(submission),
        "Thanks! Your venue will appear once it has been reviewed.".to_string(),
    ))
}
