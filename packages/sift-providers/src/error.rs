pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("upstream returned status {status}")]
	Http { status: u16 },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// Transient upstream failures worth another attempt. Everything else,
	/// auth failures and missing resources included, fails immediately.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Http { status } => matches!(status, 429 | 503),
			Self::Reqwest(e) => e.is_timeout() || e.is_connect(),
			_ => false,
		}
	}
}
