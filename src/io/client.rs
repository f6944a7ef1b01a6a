use crate::config::Config;
use crate::core::export::ExportSpec;
use crate::core::visualize::MapLayer;
use crate::types::{GeeError, GeeResult};
use serde::Deserialize;
use std::time::Duration;

/// Handle of a started export job
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportTask {
    /// Operation name, e.g. `projects/p/operations/ABC`
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

/// Tile source created for a map layer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapId {
    pub name: String,
}

/// Blocking client for the Earth Engine REST API
pub struct EarthEngineClient {
    http: reqwest::blocking::Client,
    base_url: String,
    project: String,
    access_token: Option<String>,
}

impl EarthEngineClient {
    pub fn new(config: &Config) -> GeeResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            project: config.project()?.to_string(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn export_url(&self) -> String {
        format!("{}/v1/projects/{}/image:export", self.base_url, self.project)
    }

    pub fn maps_url(&self) -> String {
        format!("{}/v1/projects/{}/maps", self.base_url, self.project)
    }

    /// XYZ tile URL template for a created map
    pub fn tile_url(&self, map: &MapId) -> String {
        format!("{}/v1/{}/tiles/{{z}}/{{x}}/{{y}}", self.base_url, map.name)
    }

    /// Start an export job. Returns as soon as the platform accepts it.
    pub fn start_export(&self, spec: &ExportSpec) -> GeeResult<ExportTask> {
        log::info!("Starting export: {}", spec.description());
        let task: ExportTask = self.post(&self.export_url(), &spec.request_body())?;
        log::info!("Export accepted as {}", task.name);
        Ok(task)
    }

    pub fn create_map(&self, layer: &MapLayer) -> GeeResult<MapId> {
        log::info!("Creating map tiles for layer: {}", layer.name);
        self.post(&self.maps_url(), &layer.request_body()?)
    }

    fn post<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> GeeResult<T> {
        log::debug!("POST {}", url);
        let mut request = self.http.post(url).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(GeeError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }
        Ok(response.json()?)
    }
}

/// Pull `error.message` out of a Google API error body, else the raw text
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boundary::Boundary;
    use crate::core::collection::Image;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Answer one HTTP request with a canned response; the thread returns the raw request
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            if name.eq_ignore_ascii_case("content-length") {
                                value.trim().parse::<usize>().ok()
                            } else {
                                None
                            }
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", address), handle)
    }

    fn local_client(base_url: &str) -> EarthEngineClient {
        EarthEngineClient::new(&Config {
            project: Some("my-project".to_string()),
            api_base_url: base_url.to_string(),
            access_token: Some("secret-token".to_string()),
            request_timeout_secs: 10,
            ..Config::default()
        })
        .unwrap()
    }

    fn export_spec() -> ExportSpec {
        ExportSpec::builder(Image::constant(1.0))
            .description("unit_export")
            .region(&Boundary::load("projects/example/assets/Extent"))
            .scale(30.0)
            .build()
            .unwrap()
    }

    fn config() -> Config {
        Config {
            project: Some("my-project".to_string()),
            api_base_url: "https://example.test/".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_urls() {
        let client = EarthEngineClient::new(&config()).unwrap();
        assert_eq!(client.export_url(), "https://example.test/v1/projects/my-project/image:export");
        assert_eq!(client.maps_url(), "https://example.test/v1/projects/my-project/maps");

        let map = MapId { name: "projects/my-project/maps/abc".to_string() };
        assert_eq!(
            client.tile_url(&map),
            "https://example.test/v1/projects/my-project/maps/abc/tiles/{z}/{x}/{y}"
        );
    }

    #[test]
    fn test_requires_project() {
        assert!(matches!(
            EarthEngineClient::new(&Config::default()),
            Err(GeeError::Config(_))
        ));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"code": 400, "message": "Asset not found", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "Asset not found");
        assert_eq!(api_error_message(" Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_start_export_returns_operation() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"name": "projects/my-project/operations/ABC123", "done": false}"#,
        );
        let client = local_client(&base_url);

        let task = client.start_export(&export_spec()).unwrap();
        assert_eq!(task.name, "projects/my-project/operations/ABC123");
        assert!(!task.done);

        let request = server.join().unwrap();
        println!("{}", request);
        assert!(request.starts_with("POST /v1/projects/my-project/image:export "));
        assert!(request
            .to_lowercase()
            .contains("authorization: bearer secret-token"));
        assert!(request.contains("\"description\":\"unit_export\""));
    }

    #[test]
    fn test_error_response_becomes_api_error() {
        let (base_url, server) = serve_once(
            "400 Bad Request",
            r#"{"error": {"code": 400, "message": "Asset not found", "status": "INVALID_ARGUMENT"}}"#,
        );
        let client = local_client(&base_url);

        match client.start_export(&export_spec()) {
            Err(GeeError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Asset not found");
            }
            other => panic!("expected an API error, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_operation_parsing() {
        let task: ExportTask =
            serde_json::from_str(r#"{"name": "projects/p/operations/XYZ", "metadata": {}}"#).unwrap();
        assert_eq!(task.name, "projects/p/operations/XYZ");
        assert!(!task.done);
    }
}
