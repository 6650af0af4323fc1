use thiserror::Error;

#[derive(Debug, Error)]
pub enum MidtransApiError {
    #[error("The HTTP client could not be built. {0}")]
    ClientSetup(String),
    #[error("Midtrans could not be reached. {0}")]
    Unreachable(String),
    #[error("Midtrans sent a response that could not be read. {0}")]
    UnreadableResponse(String),
    #[error("Midtrans answered with HTTP {status}. {message}")]
    HttpStatus { status: u16, message: String },
    #[error("Midtrans rejected the request. {}", .0.join("; "))]
    Rejected(Vec<String>),
}
