use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("not a PcbDoc file: {0}")]
    NotPcbDoc(String),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("compound document error: {0}")]
    Container(String),

    #[error("broken framing in stream {stream}: {message}")]
    Framing { stream: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
