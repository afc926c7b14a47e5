/// Errors raised while decoding manifests or deriving attributes.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    #[error("malformed {media_type} content: {source}")]
    Manifest {
        media_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed attribute annotation {key}: {source}")]
    AttributeJson {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported value for attribute {0}: only scalars are allowed")]
    UnsupportedAttribute(String),

    #[error("attribute {0} not found")]
    AttributeNotFound(String),

    #[error("attribute {0} is not a string")]
    NotAString(String),
}
