use std::os::raw::c_int;

use crate::config::CoreConfig;
use crate::ffi::error::FFIError;
use crate::ffi::handle_status_result;

/// Initializes the library from environment variables (and `.env`).
/// Returns 0 on success, an `ErrorCode` otherwise.
#[unsafe(no_mangle)]
pub extern "C" fn import_core_initialize() -> c_int {
    let result = std::panic::catch_unwind(|| {
        let config = CoreConfig::from_env();
        crate::ffi::block_on_async(crate::initialize(config))?
    });

    match result {
        Ok(ffi_result) => handle_status_result(|| ffi_result),
        Err(panic_payload) => {
            let panic_msg = if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_payload.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Panicked during FFI call, but panic message is not a string".to_string()
            };
            handle_status_result(|| Err(FFIError::internal(format!("Panic during initialization: {}", panic_msg))))
        }
    }
}
