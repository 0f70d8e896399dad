use super::models::{ApiError, PriceRecord};
use crate::data::PriceQuery;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest slice of an error body carried into an error message.
const MAX_ERROR_BODY: usize = 200;

/// Blocking client for the eSett OpenData API.
///
/// Runs on the viewer's background fetch thread, so a blocking client keeps
/// the call site a plain function.
#[derive(Clone)]
pub struct EsettClient {
    http_client: HttpClient,
    base_url: String,
}

impl EsettClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.opendata.esett.com";
    const PRICES_PATH: &'static str = "/EXP14/Prices";

    /// Create a client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ClientSetup(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// GET /EXP14/Prices
    ///
    /// Returns the raw rows for one market balance area and date range. An
    /// empty array (or `null`) from the API is an empty result, not an error.
    pub fn fetch_prices(&self, query: &PriceQuery) -> Result<Vec<PriceRecord>, ApiError> {
        let url = format!("{}{}", self.base_url, Self::PRICES_PATH);
        let (start, end) = query.api_bounds();
        debug!(%url, mba = query.area.code(), %start, %end, "requesting prices");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("mba", query.area.code()),
            ])
            .send()
            .map_err(|e| ApiError::UpstreamUnavailable(describe_transport_error(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ApiError::UpstreamUnavailable(describe_transport_error(&e)))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "eSett API returned an error status");
            return Err(ApiError::UpstreamBadResponse(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate(body.trim(), MAX_ERROR_BODY)
            )));
        }

        let records = parse_prices_body(&body)?;
        debug!(rows = records.len(), "received price rows");
        Ok(records)
    }
}

/// Decode the JSON body of a successful price request.
pub fn parse_prices_body(body: &str) -> Result<Vec<PriceRecord>, ApiError> {
    serde_json::from_str::<Option<Vec<PriceRecord>>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| ApiError::UpstreamBadResponse(format!("unparseable body: {}", e)))
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MarketArea, PriceField};
    use chrono::NaiveDate;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc::{channel, Receiver};
    use std::thread;

    /// Serve one canned HTTP response and hand back the request head.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = channel();

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 8192];
                let n = stream.read(&mut buf).unwrap_or(0);
                let _ = tx.send(String::from_utf8_lossy(&buf[..n]).to_string());

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        (format!("http://{}", addr), rx)
    }

    fn sample_query() -> PriceQuery {
        PriceQuery::new(
            MarketArea::Se3,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
        )
    }

    fn client(base_url: &str) -> EsettClient {
        EsettClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_fetch_sends_expected_request() {
        let (base_url, requests) = serve_once("200 OK", "[]");

        let records = client(&base_url).fetch_prices(&sample_query()).unwrap();
        assert!(records.is_empty());

        let request = requests.recv().unwrap();
        assert!(request.starts_with("GET /EXP14/Prices?"));
        assert!(request.contains("start=2023-01-01T00%3A00%3A00.000Z"));
        assert!(request.contains("end=2023-01-02T23%3A59%3A59.000Z"));
        assert!(request.contains("mba=SE3"));
        assert!(request.to_lowercase().contains("accept: application/json"));
    }

    #[test]
    fn test_fetch_parses_rows() {
        let body = r#"[
            {"timestamp": "2023-01-01T00:00:00", "mba": "SE3", "upRegPrice": 55.1},
            {"timestamp": "2023-01-01T01:00:00", "mba": "SE3", "upRegPrice": 60.0}
        ]"#;
        let (base_url, _requests) = serve_once("200 OK", body);

        let records = client(&base_url).fetch_prices(&sample_query()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value(PriceField::UpRegulation), Some(60.0));
    }

    #[test]
    fn test_error_status_is_bad_response() {
        let (base_url, _requests) =
            serve_once("500 Internal Server Error", r#"{"message":"boom"}"#);

        let err = client(&base_url)
            .fetch_prices(&sample_query())
            .unwrap_err();
        match err {
            ApiError::UpstreamBadResponse(msg) => {
                assert!(msg.contains("HTTP 500"));
                assert!(msg.contains("boom"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_body_is_bad_response() {
        let (base_url, _requests) = serve_once("200 OK", "<html>maintenance</html>");

        let err = client(&base_url)
            .fetch_prices(&sample_query())
            .unwrap_err();
        assert!(matches!(err, ApiError::UpstreamBadResponse(_)));
    }

    #[test]
    fn test_unreachable_host_is_unavailable() {
        // Grab a free port, then close it so nothing is listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        let err = client(&base_url)
            .fetch_prices(&sample_query())
            .unwrap_err();
        assert!(matches!(err, ApiError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_silent_server_times_out_as_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            // Accept and hold the connection open without answering.
            if let Ok((stream, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(3));
                drop(stream);
            }
        });

        let client =
            EsettClient::new(format!("http://{}", addr), Duration::from_millis(300)).unwrap();
        let err = client.fetch_prices(&sample_query()).unwrap_err();
        assert!(matches!(err, ApiError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_null_body_is_empty() {
        assert!(parse_prices_body("null").unwrap().is_empty());
        assert!(parse_prices_body("[]").unwrap().is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = client("https://api.opendata.esett.com/");
        assert_eq!(client.base_url, EsettClient::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_truncate_long_bodies() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
