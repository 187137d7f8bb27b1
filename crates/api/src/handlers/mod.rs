pub mod campaigns;
pub mod evaluations;
pub mod survey_forms;
