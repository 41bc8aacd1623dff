//! Tauri commands for permission probing

use tauri::command;

use crate::permissions::{check_permission, check_permission_detailed, PermissionInfo};
use crate::types::MediaKind;

fn parse_kind(kind: &str) -> Result<MediaKind, String> {
    match kind {
        "video" => Ok(MediaKind::Video),
        "audio" => Ok(MediaKind::Audio),
        other => Err(format!("unknown media kind '{}'", other)),
    }
}

/// Check permission status for one media kind ("video" or "audio")
#[command]
pub async fn check_capture_permission(kind: String) -> Result<String, String> {
    Ok(check_permission(parse_kind(&kind)?).to_string())
}

/// Check permission status with full details
#[command]
pub async fn check_capture_permission_detailed(kind: String) -> Result<PermissionInfo, String> {
    Ok(check_permission_detailed(parse_kind(&kind)?))
}
