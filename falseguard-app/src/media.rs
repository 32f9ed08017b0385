//! Caller-side checks for uploaded files: size and type limits live here, not
//! in the pipeline.

use anyhow::{bail, Context, Result};
use falseguard_config::MediaConfig;
use falseguard_llm::media::MediaPayload;
use std::path::Path;

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => return None,
    })
}

pub fn load_media(path: &Path, limits: &MediaConfig) -> Result<MediaPayload> {
    let mime = mime_from_extension(path)
        .with_context(|| format!("cannot tell the file type of {}", path.display()))?;
    if !limits.accepts(mime) {
        bail!("{mime} files are not accepted; please upload a PDF or an image");
    }

    let size = std::fs::metadata(path)
        .with_context(|| format!("cannot read {}", path.display()))?
        .len();
    if size > limits.max_bytes {
        bail!(
            "{} is {size} bytes; the limit is {} bytes",
            path.display(),
            limits.max_bytes
        );
    }

    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let payload = MediaPayload::from_bytes(mime, &bytes)
        .with_context(|| format!("cannot encode {}", path.display()))?;
    tracing::debug!(mime, bytes = size, "media loaded");
    Ok(payload)
}
