// Error types shared by the wizard, the API client and the session layer.

use thiserror::Error;

/// Field-level validation failure. The `Display` text is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please choose an entry type before continuing.")]
    EntryTypeRequired,

    #[error("Please select a project.")]
    ProjectRequired,

    #[error("Material name is required.")]
    NameRequired,

    #[error("Please select a construction phase.")]
    PhaseRequired,

    #[error("Quantity must be greater than zero.")]
    QuantityRequired,

    #[error("Please select a unit.")]
    UnitRequired,

    #[error("Please enter the custom unit name.")]
    CustomUnitRequired,

    #[error("Unit cost must be greater than zero.")]
    UnitCostRequired,

    #[error("Unit cost, if provided, must be greater than zero.")]
    InvalidUnitCost,

    #[error("Estimated unit cost, if provided, must be greater than zero.")]
    InvalidEstimatedUnitCost,

    #[error("Supplier name is required.")]
    SupplierRequired,
}

/// Failure talking to the materials backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-2xx response. `message` is the envelope `error` when the server sent one.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx response whose envelope reported `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Response from {0} contained no data")]
    MissingData(String),
}

/// Failure of the final submit.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
