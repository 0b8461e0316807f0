const fn report_host() -> &'static str {
    if let Some(host) = option_env!("REPORT_SERVER_HOST") {
        host
    } else {
        "localhost"
    }
}

const fn report_port() -> u16 {
    if let Some(port) = option_env!("REPORT_SERVER_PORT") {
        const_str::parse!(port, u16)
    } else {
        8000
    }
}

const fn report_secure() -> bool {
    if let Some(secure) = option_env!("REPORT_SERVER_SECURE") {
        const_str::eq_ignore_ascii_case!(secure, "true") || const_str::equal!(secure, "1")
    } else {
        false
    }
}

const fn report_http_proto() -> &'static str {
    if report_secure() { "https" } else { "http" }
}

const REPORT_HOST: &str = report_host();
const REPORT_PORT: u16 = report_port();
const REPORT_HTTP_PROTO: &str = report_http_proto();

const REPORT_SOCKET: &str = const_str::concat!(REPORT_HOST, ":", REPORT_PORT);
const REPORT_HTTP_URL: &str = const_str::concat!(REPORT_HTTP_PROTO, "://", REPORT_SOCKET);

/// Where fixes get POSTed. `REPORT_SERVER_URL` overrides the whole thing at compile
/// time, otherwise it's assembled from `REPORT_SERVER_HOST` / `REPORT_SERVER_PORT` /
/// `REPORT_SERVER_SECURE` with a localhost default for development.
pub fn report_url() -> String {
    if let Some(url) = option_env!("REPORT_SERVER_URL") {
        url.to_string()
    } else {
        format!("{REPORT_HTTP_URL}/send-data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url_targets_local_dev_server() {
        // Holds for builds without any REPORT_SERVER_* overrides
        if option_env!("REPORT_SERVER_URL").is_none()
            && option_env!("REPORT_SERVER_HOST").is_none()
            && option_env!("REPORT_SERVER_PORT").is_none()
            && option_env!("REPORT_SERVER_SECURE").is_none()
        {
            assert_eq!(report_url(), "http://localhost:8000/send-data");
        }
    }
}
