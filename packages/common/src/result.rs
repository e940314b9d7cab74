use crate::error::CommonError;

/// Result of a local storage call
pub type CommonResult<T> = Result<T, CommonError>;
