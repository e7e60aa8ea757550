//! C bindings for the import service. Every call takes one JSON payload and
//! writes a JSON string to `result`, which the caller frees with `import_free`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ffi::{c_char, CStr, CString};
use std::os::raw::c_int;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::domains::permission::{AclTable, UserRole};
use crate::domains::record::types::RecordCollection;
use crate::ffi::error::{FFIError, FFIResult};
use crate::ffi::{block_on_async, create_json_response, handle_status_result};
use crate::types::SearchParams;

/// Actor as sent by the host application
#[derive(Debug, Deserialize)]
struct AuthCtxDto {
    user_id: String,
    role: String,
    #[serde(default)]
    acl: AclTable,
}

fn dto_to_auth(dto: AuthCtxDto) -> FFIResult<AuthContext> {
    Ok(AuthContext::new(
        Uuid::parse_str(&dto.user_id).map_err(|_| FFIError::invalid_argument("Invalid user_id UUID"))?,
        UserRole::from_str(&dto.role).ok_or_else(|| FFIError::invalid_argument("Invalid role"))?,
        dto.acl,
    ))
}

#[derive(Debug, Deserialize)]
struct LinkedPayload {
    id: String,
    link: String,
    #[serde(default)]
    params: SearchParams,
    auth: AuthCtxDto,
}

impl LinkedPayload {
    fn into_parts(self) -> FFIResult<(Uuid, String, SearchParams, AuthContext)> {
        let id = Uuid::parse_str(&self.id).map_err(|_| FFIError::invalid_argument("Invalid import id UUID"))?;
        Ok((id, self.link, self.params, dto_to_auth(self.auth)?))
    }
}

/// A page the host fetched earlier, sent back for export.
#[derive(Debug, Deserialize)]
struct ExportRecordsPayload {
    collection: RecordCollection,
    auth: AuthCtxDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRecordsResponse {
    attachment_id: Option<Uuid>,
}

/// # Safety
/// `payload_json` must be a valid NUL-terminated string.
unsafe fn parse_payload<T: DeserializeOwned>(payload_json: *const c_char) -> FFIResult<T> {
    let json_str = unsafe { CStr::from_ptr(payload_json) }
        .to_str()
        .map_err(|_| FFIError::invalid_argument("Invalid payload string"))?;
    serde_json::from_str(json_str)
        .map_err(|e| FFIError::invalid_argument(&format!("Invalid JSON payload: {}", e)))
}

/// Page of records linked to an import.
///
/// Payload: `{"id", "link", "params": {orderBy, order, offset, maxSize, textFilter, where}, "auth": {user_id, role, acl}}`
///
/// # Safety
/// `payload_json` must be a valid NUL-terminated string and `result` a valid out-pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn import_find_linked(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        if payload_json.is_null() || result.is_null() {
            return Err(FFIError::invalid_argument("Null pointer(s) provided"));
        }
        let (id, link, params, auth) = parse_payload::<LinkedPayload>(payload_json)?.into_parts()?;

        let service = crate::globals::get_import_service()?;
        let collection = block_on_async(service.find_linked(id, &link, &params, &auth))??;

        *result = create_json_response(&collection)?;
        Ok(())
    })
}

/// All records of a link, oldest first. `params` in the payload is ignored.
///
/// # Safety
/// `payload_json` must be a valid NUL-terminated string and `result` a valid out-pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn import_list_linked(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        if payload_json.is_null() || result.is_null() {
            return Err(FFIError::invalid_argument("Null pointer(s) provided"));
        }
        let (id, link, _, auth) = parse_payload::<LinkedPayload>(payload_json)?.into_parts()?;

        let service = crate::globals::get_import_service()?;
        let collection = block_on_async(service.list_linked(id, &link, &auth))??;

        *result = create_json_response(&collection)?;
        Ok(())
    })
}

/// Exports all records of a link to CSV. Writes `{"attachmentId", "downloadUrl"}`,
/// both null when there was nothing to export.
///
/// # Safety
/// `payload_json` must be a valid NUL-terminated string and `result` a valid out-pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn import_export_relationship(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        if payload_json.is_null() || result.is_null() {
            return Err(FFIError::invalid_argument("Null pointer(s) provided"));
        }
        let (id, link, _, auth) = parse_payload::<LinkedPayload>(payload_json)?.into_parts()?;

        let service = crate::globals::get_import_service()?;
        let exported = block_on_async(service.export_relationship(id, &link, &auth))??;

        *result = create_json_response(&exported)?;
        Ok(())
    })
}

/// Exports a previously fetched collection to CSV. Writes `{"attachmentId"}`,
/// null when there was nothing to export.
///
/// Payload: `{"collection": {list, total, entityType}, "auth": {user_id, role, acl}}`
///
/// # Safety
/// `payload_json` must be a valid NUL-terminated string and `result` a valid out-pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn import_export_records(payload_json: *const c_char, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        if payload_json.is_null() || result.is_null() {
            return Err(FFIError::invalid_argument("Null pointer(s) provided"));
        }
        let payload = parse_payload::<ExportRecordsPayload>(payload_json)?;
        let auth = dto_to_auth(payload.auth)?;

        let service = crate::globals::get_import_service()?;
        let attachment_id = block_on_async(service.export_records(&payload.collection, &auth))??;

        *result = create_json_response(&ExportRecordsResponse { attachment_id })?;
        Ok(())
    })
}

/// Frees a string returned by this module.
///
/// # Safety
/// `ptr` must come from one of the functions above and must not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn import_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::permission::{AclLevel, Permission};
    use crate::ffi::error::ErrorCode;

    #[test]
    fn payload_parses_auth_and_params() {
        let user = Uuid::new_v4();
        let import = Uuid::new_v4();
        let json = serde_json::json!({
            "id": import.to_string(),
            "link": "duplicates",
            "params": {"maxSize": 20, "orderBy": "createdAt", "order": "desc"},
            "auth": {
                "user_id": user.to_string(),
                "role": "regular",
                "acl": {"permissions": {"exportPermission": "yes"}}
            }
        })
        .to_string();
        let c_json = CString::new(json).unwrap();

        let (id, link, params, auth) = unsafe { parse_payload::<LinkedPayload>(c_json.as_ptr()) }.unwrap().into_parts().unwrap();
        assert_eq!(id, import);
        assert_eq!(link, "duplicates");
        assert_eq!(params.max_size, Some(20));
        assert_eq!(auth.user_id, user);
        assert_eq!(auth.acl.permission_level(Permission::Export), AclLevel::Yes);
    }

    #[test]
    fn invalid_ids_are_rejected() {
        let json = serde_json::json!({
            "id": "imp1",
            "link": "imported",
            "auth": {"user_id": Uuid::new_v4().to_string(), "role": "regular"}
        })
        .to_string();
        let c_json = CString::new(json).unwrap();
        let err = unsafe { parse_payload::<LinkedPayload>(c_json.as_ptr()) }.unwrap().into_parts().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn null_pointers_are_invalid_arguments() {
        let mut out: *mut c_char = std::ptr::null_mut();
        let code = unsafe { import_find_linked(std::ptr::null(), &mut out) };
        assert_eq!(code, ErrorCode::InvalidArgument as c_int);
        assert!(out.is_null());
        unsafe { import_free(out) };
    }

    #[test]
    fn export_payload_carries_fetched_page() {
        let record = Uuid::new_v4();
        let json = serde_json::json!({
            "collection": {
                "list": [{
                    "id": record.to_string(),
                    "entityType": "Contact",
                    "name": "Ann Lee",
                    "createdAt": "2024-03-01T12:00:00Z",
                    "createdByUserId": null,
                    "attributes": {"city": "Lviv"}
                }],
                "total": 12,
                "entityType": "Contact"
            },
            "auth": {"user_id": Uuid::new_v4().to_string(), "role": "admin"}
        })
        .to_string();
        let c_json = CString::new(json).unwrap();

        let payload = unsafe { parse_payload::<ExportRecordsPayload>(c_json.as_ptr()) }.unwrap();
        assert_eq!(payload.collection.total, 12);
        assert_eq!(payload.collection.entity_type(), Some("Contact"));
        assert_eq!(payload.collection.records[0].id, record);
        assert!(dto_to_auth(payload.auth).unwrap().is_admin());
    }

    #[test]
    fn export_response_is_null_without_attachment() {
        let empty = serde_json::to_value(ExportRecordsResponse { attachment_id: None }).unwrap();
        assert_eq!(empty, serde_json::json!({"attachmentId": null}));

        let id = Uuid::new_v4();
        let some = serde_json::to_value(ExportRecordsResponse { attachment_id: Some(id) }).unwrap();
        assert_eq!(some, serde_json::json!({"attachmentId": id.to_string()}));
    }

    #[test]
    fn export_records_rejects_null_pointers() {
        let mut out: *mut c_char = std::ptr::null_mut();
        let code = unsafe { import_export_records(std::ptr::null(), &mut out) };
        assert_eq!(code, ErrorCode::InvalidArgument as c_int);
        assert!(out.is_null());
    }
}
