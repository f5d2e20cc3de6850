use {
    crate::grouping::ResultGroup,
    derive_more::{Debug, Display},
    strum_macros::EnumIs,
};

/// Race-level failures. Individual probe failures never show up here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, EnumIs)]
pub enum FetchError {
    /// Every probe failed, or the target became unreachable,
    /// before a single success was collected.
    #[display("no endpoint returned a successful response")]
    NoSuccessfulResponse,
    /// The call-level deadline fired before a single success was collected.
    #[display("timed out before any endpoint responded successfully")]
    Timeout,
}

impl std::error::Error for FetchError {}

pub type FetchResult = Result<Vec<ResultGroup>, FetchError>;
