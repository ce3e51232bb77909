use thiserror::Error;

use crate::model::FeatureCollection;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not serialize the collection: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Anything the exported text can be handed to.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Copied { bytes: usize },
    /// The clipboard refused; the text has to be copied by hand.
    Manual(String),
}

/// Pretty-printed GeoJSON with closed rings and sorted properties.
pub fn to_pretty_json(collection: &FeatureCollection) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(collection)?)
}

pub fn export_to_clipboard(
    collection: &FeatureCollection,
    clipboard: &mut impl Clipboard,
) -> Result<ExportOutcome, ExportError> {
    let text = to_pretty_json(collection)?;
    match clipboard.set_text(&text) {
        Ok(()) => {
            log::info!("copied {} features ({} bytes)", collection.len(), text.len());
            Ok(ExportOutcome::Copied { bytes: text.len() })
        }
        Err(err) => {
            log::warn!("{err}; showing text for manual copy");
            Ok(ExportOutcome::Manual(text))
        }
    }
}
