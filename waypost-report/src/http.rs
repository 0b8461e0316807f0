use log::debug;
use waypost_logic::{LocationPayload, ReportError, ReportingClient, classify_status, prelude::*};

use crate::endpoint;

/// [ReportingClient] over plain HTTP. One POST per fix against the configured
/// endpoint, no auth headers, the response body is ignored beyond its status code.
/// No request timeout is set beyond the transport defaults.
pub struct HttpReporter {
    http: reqwest::Client,
    url: String,
}

impl HttpReporter {
    /// Reporter against the compile-time configured endpoint
    pub fn new() -> Result<Self> {
        Self::with_url(endpoint::report_url())
    }

    /// Reporter against an explicit endpoint URL
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ReportingClient for HttpReporter {
    async fn send(&self, payload: LocationPayload) -> Result<(), ReportError> {
        let response = match self.http.post(&self.url).json(&payload).send().await {
            Ok(response) => response,
            Err(why) => {
                // Request never produced a response, the platform convention calls
                // this status 0
                debug!("Report request didn't complete: {why}");
                return Err(classify_status(why.status().map(|s| s.as_u16())));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Location reported, server answered {status}");
            Ok(())
        } else {
            Err(classify_status(Some(status.as_u16())))
        }
    }
}
