use thiserror::Error;

#[derive(Error, Debug)]
pub enum TikiError {
    #[error("http {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },
    #[error("network: {0}")]
    Net(#[from] reqwest::Error),
    #[error("json from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("config: {0}")]
    Config(String),
}

impl TikiError {
    /// HTTP status for `Http` errors and for reqwest errors that carry one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TikiError::Http { status, .. } => Some(*status),
            TikiError::Net(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

/// Cut a response body down for error messages and logs, on a char boundary.
pub(crate) fn truncate_for_log(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
