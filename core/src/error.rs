use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No responsible party exists for city '{city}': no city admin and no global admin")]
    NoResponsibleParty { city: String },

    #[error("Complaint '{complaint_id}' not found")]
    ComplaintNotFound { complaint_id: String },

    #[error("Staff '{staff_id}' not found")]
    StaffNotFound { staff_id: String },

    #[error("Invalid status transition from '{from}' to '{to}': {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Complaint city must be non-empty")]
    MissingCity,

    #[error("Invalid complaint status '{value}'")]
    InvalidStatus { value: String },

    #[error("Invalid department '{value}'")]
    InvalidDepartment { value: String },

    #[error("Invalid role '{value}'")]
    InvalidRole { value: String },

    #[error("Feedback rating must be in 1..=5, got {rating}")]
    InvalidRating { rating: i32 },

    #[error("Feedback already recorded for complaint '{complaint_id}'")]
    FeedbackAlreadyRecorded { complaint_id: String },

    #[error("Feedback is only accepted on resolved complaints (status is '{status}')")]
    FeedbackNotAllowed { status: String },

    #[error("Escalation level must be in 0..=3, got {level}")]
    InvalidEscalationLevel { level: u8 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
