//! Download links for media references.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("'{0}' is not an mxc:// reference")]
    NotMxc(String),

    #[error("media reference '{0}' lacks a server or media id")]
    Malformed(String),
}

/// Build an https download URL for an `mxc://<server>/<media id>` reference.
///
/// `base` replaces the default `https://<server>` prefix, e.g. when media is
/// served from a different host than the homeserver name.
pub fn download_url(mxc: &str, base: Option<&str>) -> Result<String, MediaError> {
    let rest = mxc
        .strip_prefix("mxc://")
        .ok_or_else(|| MediaError::NotMxc(mxc.to_string()))?;
    let (server, media_id) = rest
        .split_once('/')
        .ok_or_else(|| MediaError::Malformed(mxc.to_string()))?;
    if server.is_empty() || media_id.is_empty() || media_id.contains('/') {
        return Err(MediaError::Malformed(mxc.to_string()));
    }

    let base = match base {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => format!("https://{}", server),
    };
    Ok(format!(
        "{}/_matrix/media/v1/download/{}/{}",
        base, server, media_id
    ))
}
