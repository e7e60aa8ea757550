use std::ffi::CString;
use std::future::Future;
use std::os::raw::{c_char, c_int};

use lazy_static::lazy_static;
use tokio::runtime::Runtime;

use crate::ffi::error::{ErrorCode, FFIError};

pub mod core;
pub mod error;
pub mod import;

pub use error::FFIResult;

lazy_static! {
    // One runtime for every blocking FFI call
    static ref RUNTIME: std::io::Result<Runtime> = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build();
}

/// Runs a future to completion on the shared runtime.
pub fn block_on_async<F: Future>(future: F) -> FFIResult<F::Output> {
    match RUNTIME.as_ref() {
        Ok(runtime) => Ok(runtime.block_on(future)),
        Err(e) => Err(FFIError::internal(format!("Tokio runtime unavailable: {}", e))),
    }
}

/// Error handling helper for FFI boundaries (returns error code)
pub fn handle_status_result<F>(func: F) -> c_int
where
    F: FnOnce() -> FFIResult<()>,
{
    match func() {
        Ok(_) => ErrorCode::Success as c_int,
        Err(e) => {
            log::error!(
                "FFI error. Code: {:?}, Message: {}, Details: {}",
                e.code,
                e.message,
                e.details.as_deref().unwrap_or("None")
            );
            e.code as c_int
        }
    }
}

/// Serializes `data` into a caller-owned C string.
pub fn create_json_response<T: serde::Serialize>(data: &T) -> FFIResult<*mut c_char> {
    let json_string = serde_json::to_string(data)
        .map_err(|e| FFIError::internal(format!("JSON serialization failed: {}", e)))?;
    Ok(CString::new(json_string)?.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_error_codes() {
        assert_eq!(handle_status_result(|| Ok(())), 0);
        assert_eq!(
            handle_status_result(|| Err(FFIError::invalid_argument("bad"))),
            ErrorCode::InvalidArgument as c_int
        );
    }

    #[test]
    fn block_on_runs_future() {
        assert_eq!(block_on_async(async { 40 + 2 }).unwrap(), 42);
    }
}
