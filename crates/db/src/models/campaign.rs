//! Campaign rows (migration 000003).
//!
//! Only the columns the scoring engine needs; campaign management itself
//! lives elsewhere.

use cxeval_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Campaign {
    pub id: DbId,
    pub company_id: DbId,
    pub name: String,
    pub survey_form_id: Option<DbId>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new campaign.
#[derive(Debug, Deserialize)]
pub struct CreateCampaign {
    pub company_id: DbId,
    pub name: String,
    pub survey_form_id: Option<DbId>,
}
