//! Repository for `survey_forms` and their section/aspect trees.
//!
//! A form's tree is only ever written whole: [`SurveyFormRepo::create_with_tree`]
//! and [`SurveyFormRepo::replace_form_tree`] each run in one transaction, so
//! readers see either the previous tree or the new one.

use cxeval_core::survey::FinalizedSection;
use cxeval_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::survey_form::{FormTreeRows, SurveyAspect, SurveyForm, SurveySection};

/// Column lists shared across queries to avoid repetition.
const FORM_COLUMNS: &str = "id, company_id, title, deleted_at, created_at, updated_at";
const SECTION_COLUMNS: &str =
    "id, form_id, name, maximum_score, sort_order, created_at, updated_at";
const ASPECT_COLUMNS: &str =
    "id, section_id, description, aspect_type, maximum_score, sort_order, created_at, updated_at";

/// Provides tree-level persistence for survey forms.
pub struct SurveyFormRepo;

impl SurveyFormRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert a form and its finalized sections/aspects in one transaction.
    pub async fn create_with_tree(
        pool: &PgPool,
        company_id: DbId,
        title: &str,
        sections: &[FinalizedSection],
    ) -> Result<SurveyForm, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO survey_forms (company_id, title)
             VALUES ($1, $2)
             RETURNING {FORM_COLUMNS}"
        );
        let form = sqlx::query_as::<_, SurveyForm>(&query)
            .bind(company_id)
            .bind(title)
            .fetch_one(&mut *tx)
            .await?;

        Self::insert_tree_inner(&mut tx, form.id, sections).await?;
        tx.commit().await?;

        tracing::info!(
            form_id = form.id,
            company_id,
            sections = sections.len(),
            "Survey form created",
        );
        Ok(form)
    }

    /// Replace the title and the whole section/aspect tree of a form.
    ///
    /// Previous sections and aspects are soft-deleted rather than removed so
    /// that existing evaluation answers keep their aspect reference and
    /// their recorded scores. Returns `None` (and writes nothing) if the form
    /// does not exist, belongs to another company, or is soft-deleted.
    pub async fn replace_form_tree(
        pool: &PgPool,
        form_id: DbId,
        company_id: DbId,
        title: &str,
        sections: &[FinalizedSection],
    ) -> Result<Option<SurveyForm>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // The row lock taken here serializes concurrent replaces of one form.
        let query = format!(
            "UPDATE survey_forms SET title = $3
             WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL
             RETURNING {FORM_COLUMNS}"
        );
        let Some(form) = sqlx::query_as::<_, SurveyForm>(&query)
            .bind(form_id)
            .bind(company_id)
            .bind(title)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let retired_aspects = sqlx::query(
            "UPDATE survey_aspects SET deleted_at = NOW()
             WHERE deleted_at IS NULL
               AND section_id IN (SELECT id FROM survey_sections WHERE form_id = $1)",
        )
        .bind(form_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let retired_sections = sqlx::query(
            "UPDATE survey_sections SET deleted_at = NOW()
             WHERE form_id = $1 AND deleted_at IS NULL",
        )
        .bind(form_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        Self::insert_tree_inner(&mut tx, form_id, sections).await?;
        tx.commit().await?;

        tracing::info!(
            form_id,
            company_id,
            retired_sections,
            retired_aspects,
            sections = sections.len(),
            "Survey form tree replaced",
        );
        Ok(Some(form))
    }

    /// Soft-delete a form. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId, company_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE survey_forms SET deleted_at = NOW()
             WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(company_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a company's form by ID. Excludes soft-deleted rows.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        company_id: DbId,
    ) -> Result<Option<SurveyForm>, sqlx::Error> {
        let query = format!(
            "SELECT {FORM_COLUMNS} FROM survey_forms
             WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, SurveyForm>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(pool)
            .await
    }

    /// List a company's forms, newest first. Excludes soft-deleted rows.
    pub async fn list_by_company(
        pool: &PgPool,
        company_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SurveyForm>, sqlx::Error> {
        let query = format!(
            "SELECT {FORM_COLUMNS} FROM survey_forms
             WHERE company_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, SurveyForm>(&query)
            .bind(company_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Resolve the non-deleted form linked to a non-deleted campaign.
    pub async fn find_form_by_campaign(
        conn: &mut PgConnection,
        campaign_id: DbId,
    ) -> Result<Option<SurveyForm>, sqlx::Error> {
        sqlx::query_as::<_, SurveyForm>(
            "SELECT f.id, f.company_id, f.title, f.deleted_at, f.created_at, f.updated_at
             FROM survey_forms f
             JOIN campaigns c ON c.survey_form_id = f.id
             WHERE c.id = $1 AND c.deleted_at IS NULL AND f.deleted_at IS NULL",
        )
        .bind(campaign_id)
        .fetch_optional(conn)
        .await
    }

    /// Non-deleted sections of a form in display order.
    pub async fn find_sections(
        conn: &mut PgConnection,
        form_id: DbId,
    ) -> Result<Vec<SurveySection>, sqlx::Error> {
        let query = format!(
            "SELECT {SECTION_COLUMNS} FROM survey_sections
             WHERE form_id = $1 AND deleted_at IS NULL
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, SurveySection>(&query)
            .bind(form_id)
            .fetch_all(conn)
            .await
    }

    /// Non-deleted aspects of a section in display order.
    pub async fn find_aspects(
        conn: &mut PgConnection,
        section_id: DbId,
    ) -> Result<Vec<SurveyAspect>, sqlx::Error> {
        let query = format!(
            "SELECT {ASPECT_COLUMNS} FROM survey_aspects
             WHERE section_id = $1 AND deleted_at IS NULL
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, SurveyAspect>(&query)
            .bind(section_id)
            .fetch_all(conn)
            .await
    }

    /// Eagerly load the section/aspect tree of `form`.
    ///
    /// Run this inside a snapshot transaction (see [`crate::begin_snapshot`])
    /// so a concurrent [`Self::replace_form_tree`] cannot be observed half
    /// applied between the section and aspect queries.
    pub async fn load_tree(
        conn: &mut PgConnection,
        form: SurveyForm,
    ) -> Result<FormTreeRows, sqlx::Error> {
        let sections = Self::find_sections(&mut *conn, form.id).await?;
        let mut tree = Vec::with_capacity(sections.len());
        for section in sections {
            let aspects = Self::find_aspects(&mut *conn, section.id).await?;
            tree.push((section, aspects));
        }
        Ok(FormTreeRows {
            form,
            sections: tree,
        })
    }

    /// Resolve and load the form tree linked to a campaign.
    pub async fn load_tree_for_campaign(
        conn: &mut PgConnection,
        campaign_id: DbId,
    ) -> Result<Option<FormTreeRows>, sqlx::Error> {
        match Self::find_form_by_campaign(&mut *conn, campaign_id).await? {
            Some(form) => Ok(Some(Self::load_tree(conn, form).await?)),
            None => Ok(None),
        }
    }

    /// Load a company's form tree by form ID from a consistent snapshot.
    pub async fn load_tree_by_id(
        pool: &PgPool,
        id: DbId,
        company_id: DbId,
    ) -> Result<Option<FormTreeRows>, sqlx::Error> {
        let mut tx = crate::begin_snapshot(pool).await?;
        let query = format!(
            "SELECT {FORM_COLUMNS} FROM survey_forms
             WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL"
        );
        let form = sqlx::query_as::<_, SurveyForm>(&query)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&mut *tx)
            .await?;
        let tree = match form {
            Some(form) => Some(Self::load_tree(&mut tx, form).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(tree)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Insert sections and aspects for `form_id` within an existing transaction.
    async fn insert_tree_inner(
        conn: &mut PgConnection,
        form_id: DbId,
        sections: &[FinalizedSection],
    ) -> Result<(), sqlx::Error> {
        for section in sections {
            let section_id: DbId = sqlx::query_scalar(
                "INSERT INTO survey_sections (form_id, name, maximum_score, sort_order)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id",
            )
            .bind(form_id)
            .bind(&section.name)
            .bind(section.maximum_score)
            .bind(section.order)
            .fetch_one(&mut *conn)
            .await?;

            for aspect in &section.aspects {
                sqlx::query(
                    "INSERT INTO survey_aspects
                        (section_id, description, aspect_type, maximum_score, sort_order)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(section_id)
                .bind(&aspect.description)
                .bind(aspect.kind.as_str())
                .bind(aspect.maximum_score)
                .bind(aspect.order)
                .execute(&mut *conn)
                .await?;
            }
        }
        Ok(())
    }
}
