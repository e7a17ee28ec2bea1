use thiserror::Error;

/// Failures that abort a run. Per-element anomalies never surface here: they
/// are logged and recovered where they occur.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("Invalid XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Invalid SVG: {0}")]
    InvalidSvg(String),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}
