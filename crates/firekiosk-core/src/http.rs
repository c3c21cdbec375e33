use std::time::Duration;

/// Maximum number of redirects followed by any client built here.
pub const MAX_REDIRECTS: usize = 10;

/// Connection settings for one kind of request.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Bound for establishing the connection and for every single read.
    pub timeout: Duration,
    /// Optional bound on the whole request, body included.
    pub total_timeout: Option<Duration>,
    pub https_only: bool,
    pub user_agent: String,
}

impl HttpOptions {
    /// Options for the release feed: a total bound of twice the per-read
    /// timeout.
    #[must_use]
    pub fn feed(timeout: Duration, https_only: bool) -> Self {
        Self {
            timeout,
            total_timeout: Some(timeout * 2),
            https_only,
            user_agent: default_user_agent(),
        }
    }

    /// Options for the artifact download. No total bound: a slow but live
    /// transfer only fails when a single read stalls.
    #[must_use]
    pub fn download(timeout: Duration, https_only: bool) -> Self {
        Self {
            timeout,
            total_timeout: None,
            https_only,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("firekiosk/{}", env!("CARGO_PKG_VERSION"))
}

/// Build a redirect-following client for the given options.
///
/// # Errors
/// Returns an error when the TLS backend or the client cannot be
/// initialised.
pub fn http_client(options: &HttpOptions) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(options.timeout)
        .read_timeout(options.timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .https_only(options.https_only)
        .user_agent(options.user_agent.clone());

    if let Some(total) = options.total_timeout {
        builder = builder.timeout(total);
    }

    builder.build()
}
