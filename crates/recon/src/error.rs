use std::fmt;

#[derive(Debug)]
pub enum CatalogError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate priority entry, empty name).
    ConfigValidation(String),
    /// A source payload does not match the expected shape.
    MalformedSource { source_id: String, detail: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MalformedSource { source_id, detail } => {
                write!(f, "source '{source_id}': malformed payload: {detail}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}
