//! Versioned on-disk persistence of fitted model bundles.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use coppice_trim::TrimmedForest;
use tracing::{info, instrument};

use crate::TextError;
use crate::encode::LabelEncoder;
use crate::vectorize::Vectorizer;

/// On-disk format version, written ahead of the bundle so a reader can
/// reject a file before attempting to decode an incompatible layout.
pub const FORMAT_VERSION: u32 = 1;

/// Everything needed to classify raw documents: the fitted vectorizer, the
/// label encoder, and the trimmed pipeline, persisted as one unit so the
/// three can never drift apart.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelBundle {
    /// Fitted vectorizer; maps raw text onto training-time columns.
    pub vectorizer: Vectorizer,
    /// Fitted label encoder; maps class ids back to label strings.
    pub encoder: LabelEncoder,
    /// Fitted trimmed pipeline.
    pub pipeline: TrimmedForest,
}

/// Save a bundle to `path` in bincode format, version tag first.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TextError::WriteFile`] | file cannot be created or flushed |
/// | [`TextError::EncodeModel`] | bincode write failure |
#[instrument(skip_all, fields(path = %path.display()))]
pub fn save_model(path: &Path, bundle: &ModelBundle) -> Result<(), TextError> {
    let file = File::create(path).map_err(|e| TextError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    let encode_err = |e| TextError::EncodeModel {
        path: path.to_path_buf(),
        source: e,
    };
    bincode::serialize_into(&mut writer, &FORMAT_VERSION).map_err(encode_err)?;
    bincode::serialize_into(&mut writer, bundle).map_err(encode_err)?;
    writer.flush().map_err(|e| TextError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("model bundle saved");
    Ok(())
}

/// Load a bundle previously written by [`save_model`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TextError::FileNotFound`] | file does not exist or is unreadable |
/// | [`TextError::ModelFormatVersion`] | version tag differs from [`FORMAT_VERSION`] |
/// | [`TextError::DecodeModel`] | truncated or corrupt payload |
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_model(path: &Path) -> Result<ModelBundle, TextError> {
    let file = File::open(path).map_err(|e| TextError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);

    let decode_err = |e| TextError::DecodeModel {
        path: path.to_path_buf(),
        source: e,
    };
    let version: u32 = bincode::deserialize_from(&mut reader).map_err(decode_err)?;
    if version != FORMAT_VERSION {
        return Err(TextError::ModelFormatVersion {
            path: path.to_path_buf(),
            found: version,
            expected: FORMAT_VERSION,
        });
    }
    let bundle: ModelBundle = bincode::deserialize_from(&mut reader).map_err(decode_err)?;

    info!("model bundle loaded");
    Ok(bundle)
}
