//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Methods
//! that only ever run standalone take `&PgPool`; methods that must compose
//! inside a caller's transaction take `&mut PgConnection`.

pub mod campaign_repo;
pub mod evaluation_repo;
pub mod survey_form_repo;

pub use campaign_repo::CampaignRepo;
pub use evaluation_repo::EvaluationRepo;
pub use survey_form_repo::SurveyFormRepo;
