//! Repository for the `campaigns` table.

use cxeval_core::types::DbId;
use sqlx::PgPool;

use crate::models::campaign::{Campaign, CreateCampaign};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, company_id, name, survey_form_id, deleted_at, created_at, updated_at";

/// Provides the campaign operations the scoring engine relies on.
pub struct CampaignRepo;

impl CampaignRepo {
    /// Insert a new campaign, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCampaign) -> Result<Campaign, sqlx::Error> {
        let query = format!(
            "INSERT INTO campaigns (company_id, name, survey_form_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Campaign>(&query)
            .bind(input.company_id)
            .bind(&input.name)
            .bind(input.survey_form_id)
            .fetch_one(pool)
            .await
    }

    /// Find a campaign by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Campaign>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM campaigns WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Campaign>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Point a campaign at a survey form of the same company.
    ///
    /// Returns `None` if the campaign does not exist, or if the form is
    /// missing, soft-deleted, or owned by another company.
    pub async fn link_form(
        pool: &PgPool,
        id: DbId,
        form_id: DbId,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            "UPDATE campaigns c SET survey_form_id = f.id
             FROM survey_forms f
             WHERE c.id = $1 AND c.deleted_at IS NULL
               AND f.id = $2 AND f.deleted_at IS NULL AND f.company_id = c.company_id
             RETURNING c.id, c.company_id, c.name, c.survey_form_id, c.deleted_at,
                       c.created_at, c.updated_at",
        )
        .bind(id)
        .bind(form_id)
        .fetch_optional(pool)
        .await
    }
}
