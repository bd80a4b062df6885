use thiserror::Error;

/// Failures of one dashboard recompute.
///
/// Both variants are scoped to the interaction that produced them; the UI
/// shows the message and the next change recomputes from scratch. An empty
/// filter result is not an error, see [`crate::chart::ChartOutcome::NoData`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
    #[error("Unsupported chart kind: {0:?}")]
    UnsupportedChartKind(String),
}

impl DashboardError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DashboardError::InvalidSelection(msg.into())
    }
}
