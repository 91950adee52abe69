use crate::error::AppError;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub venue_id: i32,
    pub user_id: Uuid,
    #[sea_orm(column_type = "String(StringLen::N(20))")]
    pub kind: String,
    pub rating: Option<i16>,
    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(30))", nullable)]
    pub correction_type: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(20))")]
    pub status: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::venue::Entity",
        from = "Column::VenueId",
        to = "super::venue::Column::Id"
    )]
    Venue,
}

impl Related<super::venue::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Venue.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Review,
    Comment,
    Correction,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Review => "review",
            FeedbackKind::Comment => "comment",
            FeedbackKind::Correction => "correction",
        }
    }
}

impl std::str::FromStr for FeedbackKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "review" => Ok(FeedbackKind::Review),
            "comment" => Ok(FeedbackKind::Comment),
            "correction" => Ok(FeedbackKind::Correction),
            other => Err(AppError::Validation(format!(
                "Unknown feedback kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionType {
    Closed,
    WrongLocation,
    WrongDetails,
    Other,
}

impl CorrectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionType::Closed => "closed",
            CorrectionType::WrongLocation => "wrong_location",
            CorrectionType::WrongDetails => "wrong_details",
            CorrectionType::Other => "other",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "closed" => Some(CorrectionType::Closed),
            "wrong_location" => Some(CorrectionType::WrongLocation),
            "wrong_details" => Some(CorrectionType::WrongDetails),
            "other" => Some(CorrectionType::Other),
            _ => None,
        }
    }
}

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MAX_BODY_CHARS: usize = 2000;

fn check_length(field: &str, text: &str) -> Result<(), AppError> {
    if text.chars().count() > MAX_BODY_CHARS {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_BODY_CHARS
        )));
    }
    Ok(())
}

/// Kind-specific feedback payload. The row stores the union of these fields;
/// only the ones belonging to `kind` are populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedbackContent {
    Review {
        rating: u8,
        body: Option<String>,
    },
    Comment {
        body: String,
    },
    Correction {
        correction_type: CorrectionType,
        details: String,
    },
}

impl FeedbackContent {
    /// Strip markup from every free-text field.
    pub fn sanitized(self) -> Self {
        use crate::utils::{sanitize_optional, sanitize_plain};
        match self {
            FeedbackContent::Review { rating, body } => FeedbackContent::Review {
                rating,
                body: sanitize_optional(body.as_deref()),
            },
            FeedbackContent::Comment { body } => FeedbackContent::Comment {
                body: sanitize_plain(&body),
            },
            FeedbackContent::Correction {
                correction_type,
                details,
            } => FeedbackContent::Correction {
                correction_type,
                details: sanitize_plain(&details),
            },
        }
    }

    pub fn kind(&self) -> FeedbackKind {
        match self {
            FeedbackContent::Review { .. } => FeedbackKind::Review,
            FeedbackContent::Comment { .. } => FeedbackKind::Comment,
            FeedbackContent::Correction { .. } => FeedbackKind::Correction,
        }
    }

    /// Check type-specific requirements. Text fields are expected to be
    /// sanitized already.
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            FeedbackContent::Review { rating, body } => {
                if !(MIN_RATING..=MAX_RATING).contains(rating) {
                    return Err(AppError::Validation(format!(
                        "rating must be between {} and {}",
                        MIN_RATING, MAX_RATING
                    )));
                }
                if let Some(body) = body {
                    check_length("body", body)?;
                }
            }
            FeedbackContent::Comment { body } => {
                if body.trim().is_empty() {
                    return Err(AppError::Validation("comment body is required".to_string()));
                }
                check_length("body", body)?;
            }
            FeedbackContent::Correction { details, .. } => {
                if details.trim().is_empty() {
                    return Err(AppError::Validation(
                        "correction details are required".to_string(),
                    ));
                }
                check_length("details", details)?;
            }
        }
        Ok(())
    }

    /// Column values: `(kind, rating, body, correction_type)`.
    pub fn into_columns(self) -> (String, Option<i16>, Option<String>, Option<String>) {
        let kind = self.kind().as_str().to_string();
        match self {
            FeedbackContent::Review { rating, body } => (kind, Some(i16::from(rating)), body, None),
            FeedbackContent::Comment { body } => (kind, None, Some(body), None),
            FeedbackContent::Correction {
                correction_type,
                details,
            } => (
                kind,
                None,
                Some(details),
                Some(correction_type.as_str().to_string()),
            ),
        }
    }
}

impl TryFrom<&Model> for FeedbackContent {
    type Error = AppError;

    fn try_from(row: &Model) -> Result<Self, Self::Error> {
        let corrupt = || {
            AppError::Internal(anyhow::anyhow!(
                "feedback {} has inconsistent {} columns",
                row.id,
                row.kind
            ))
        };

        match row.kind.parse::<FeedbackKind>()? {
            FeedbackKind::Review => {
                let rating = row
                    .rating
                    .and_then(|r| u8::try_from(r).ok())
                    .ok_or_else(corrupt)?;
                Ok(FeedbackContent::Review {
                    rating,
                    body: row.body.clone(),
                })
            }
            FeedbackKind::Comment => Ok(FeedbackContent::Comment {
                body: row.body.clone().unwrap_or_default(),
            }),
            FeedbackKind::Correction => {
                let correction_type = row
                    .correction_type
                    .as_deref()
                    .and_then(CorrectionType::parse)
                    .ok_or_else(corrupt)?;
                Ok(FeedbackContent::Correction {
                    correction_type,
                    details: row.body.clone().unwrap_or_default(),
                })
            }
        }
    }
}

/// Average of active reviews for one venue. Always computed from rows on
/// read; there is no stored copy to go stale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct CommunityRating {
    pub average: f64,
    pub count: u64,
}

impl CommunityRating {
    pub fn from_ratings<I>(ratings: I) -> Option<Self>
    where
        I: IntoIterator<Item = i16>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0i64, 0u64), |(s, c), r| (s + i64::from(r), c + 1));
        (count > 0).then(|| Self {
            average: round_tenth(sum as f64 / count as f64),
            count,
        })
    }
}

pub(crate) fn round_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
