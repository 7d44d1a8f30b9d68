// Bundle artifact persistence
//
// An artifact is a gzip-compressed JSON envelope. `payload` holds the JSON text
// of the bundle (keyed record or legacy bare estimator) and `checksum` is the
// SHA-256 of that text, so a damaged artifact is rejected instead of loaded.
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::Utc;
use fairrent_core::{Error, ModelBundle, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    format_version: u32,
    created_at: String,
    checksum: String,
    payload: String,
}

/// Artifact metadata for logs and API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub format_version: u32,
    pub created_at: String,
    pub checksum: String,
    pub size: u64,
}

fn checksum(payload: &str) -> String {
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

/// Parse the bundle payload without serde_json's nesting limit. Unpruned
/// trees nest two JSON objects per level and easily exceed 128 levels; the
/// stack grows on demand instead.
fn parse_payload(payload: &str) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_str(payload);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Write `bundle` to `path`. The artifact is written to a temporary file in
/// the same directory and renamed over `path`, so readers never observe a
/// partially written artifact.
pub fn save_bundle<P: AsRef<Path>>(path: P, bundle: &ModelBundle) -> Result<ArtifactInfo> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_string(&bundle.to_payload()?)?;
    let envelope = ArtifactEnvelope {
        format_version: FORMAT_VERSION,
        created_at: Utc::now().to_rfc3339(),
        checksum: checksum(&payload),
        payload,
    };
    let json_data = serde_json::to_vec(&envelope)?;

    AtomicFile::new(path, AllowOverwrite)
        .write(|file| {
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(&json_data)?;
            encoder.finish()?;
            Ok::<(), std::io::Error>(())
        })
        .map_err(|e| match e {
            atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => Error::Io(e),
        })?;

    Ok(ArtifactInfo {
        format_version: envelope.format_version,
        created_at: envelope.created_at,
        checksum: envelope.checksum,
        size: fs::metadata(path)?.len(),
    })
}

/// Read and verify the artifact at `path`.
///
/// Every failure (missing file, bad compression, bad JSON, unknown format
/// version, checksum mismatch, incomplete bundle) is reported as
/// [`Error::ModelLoad`].
pub fn load_bundle<P: AsRef<Path>>(path: P) -> Result<(ModelBundle, ArtifactInfo)> {
    let path = path.as_ref();
    let load_err = |what: &str, e: &dyn std::fmt::Display| {
        Error::ModelLoad(format!("{} {:?}: {}", what, path, e))
    };

    let file = File::open(path).map_err(|e| load_err("cannot open", &e))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);

    let mut json_data = Vec::new();
    GzDecoder::new(BufReader::new(file))
        .read_to_end(&mut json_data)
        .map_err(|e| load_err("cannot decompress", &e))?;

    let envelope: ArtifactEnvelope =
        serde_json::from_slice(&json_data).map_err(|e| load_err("malformed artifact", &e))?;

    if envelope.format_version != FORMAT_VERSION {
        return Err(Error::ModelLoad(format!(
            "unsupported artifact format version {} (expected {})",
            envelope.format_version, FORMAT_VERSION
        )));
    }

    let actual = checksum(&envelope.payload);
    if actual != envelope.checksum {
        return Err(Error::ModelLoad(format!(
            "checksum mismatch: expected {}, got {}",
            envelope.checksum, actual
        )));
    }

    let payload = parse_payload(&envelope.payload).map_err(|e| load_err("malformed payload in", &e))?;
    let bundle = ModelBundle::from_payload(payload)?;

    Ok((
        bundle,
        ArtifactInfo {
            format_version: envelope.format_version,
            created_at: envelope.created_at,
            checksum: envelope.checksum,
            size,
        },
    ))
}
