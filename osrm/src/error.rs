use thiserror::Error;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("request failed, {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("route rejected, {code}: {message}")]
    Rejected { code: String, message: String },

    #[error("malformed route response, {0}")]
    Malformed(String),

    #[error("no route after {attempts} attempts")]
    Exhausted { attempts: usize },

    #[error("invalid configuration, {0}")]
    InvalidConfig(&'static str),
}
