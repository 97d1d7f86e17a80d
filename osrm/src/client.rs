use crate::RouteError;
use geo::geometry::Coord;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Public OSRM demo server, driving profile.
///
/// Suitable for occasional use only; long routes are often refused.
pub const PUBLIC_OSRM_URL: &str =
    "http://router.project-osrm.org/route/v1/driving/{lon1},{lat1};{lon2},{lat2}";

/// Placeholders every URL template must contain.
const PLACEHOLDERS: [&str; 4] = ["{lon1}", "{lat1}", "{lon2}", "{lat2}"];

/// Longest error body kept in [`RouteError::Status`].
const MAX_ERROR_BODY: usize = 400;

/// Something that can produce the road geometry between two points.
pub trait RouteSource {
    /// Returns the route from `start` to `end` as `x` longitude, `y`
    /// latitude coordinates, giving up after `timeout`.
    fn fetch_route(
        &self,
        start: Coord<f64>,
        end: Coord<f64>,
        timeout: Duration,
    ) -> Result<Vec<Coord<f64>>, RouteError>;
}

impl<T: RouteSource + ?Sized> RouteSource for &T {
    fn fetch_route(
        &self,
        start: Coord<f64>,
        end: Coord<f64>,
        timeout: Duration,
    ) -> Result<Vec<Coord<f64>>, RouteError> {
        (**self).fetch_route(start, end, timeout)
    }
}

/// Blocking OSRM `route/v1` client.
///
/// Proxy settings from the environment are ignored.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::blocking::Client,
    url_template: String,
}

impl Client {
    /// Creates a client for `url_template`, which must contain the
    /// `{lon1}`, `{lat1}`, `{lon2}` and `{lat2}` placeholders.
    pub fn new(url_template: impl Into<String>) -> Result<Self, RouteError> {
        let url_template = url_template.into();
        if PLACEHOLDERS.iter().any(|p| !url_template.contains(p)) {
            return Err(RouteError::InvalidConfig(
                "URL template must contain {lon1}, {lat1}, {lon2} and {lat2}",
            ));
        }
        let http = reqwest::blocking::Client::builder().no_proxy().build()?;
        Ok(Self { http, url_template })
    }

    /// Returns the request URL for a route, without query parameters.
    pub fn route_url(&self, start: Coord<f64>, end: Coord<f64>) -> String {
        self.url_template
            .replace("{lon1}", &start.x.to_string())
            .replace("{lat1}", &start.y.to_string())
            .replace("{lon2}", &end.x.to_string())
            .replace("{lat2}", &end.y.to_string())
    }
}

impl RouteSource for Client {
    fn fetch_route(
        &self,
        start: Coord<f64>,
        end: Coord<f64>,
        timeout: Duration,
    ) -> Result<Vec<Coord<f64>>, RouteError> {
        let url = self.route_url(start, end);
        debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "polyline")])
            .timeout(timeout)
            .send()?;
        let status = response.status();
        let body = response.text()?;

        if status != StatusCode::OK {
            // OSRM reports most refusals as 400 with a JSON code.
            return match decode_response(&body) {
                Err(e @ RouteError::Rejected { .. }) => Err(e),
                _ => Err(RouteError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(MAX_ERROR_BODY).collect(),
                }),
            };
        }
        decode_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    geometry: String,
    #[serde(default)]
    distance: Option<f64>,
}

/// Decodes the first route of an OSRM route response body.
///
/// The geometry must be an encoded polyline of precision 5.
pub fn decode_response(body: &str) -> Result<Vec<Coord<f64>>, RouteError> {
    let response: RouteResponse =
        serde_json::from_str(body).map_err(|e| RouteError::Malformed(e.to_string()))?;
    if response.code != "Ok" {
        return Err(RouteError::Rejected {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RouteError::Malformed("no routes".to_string()))?;
    let line = polyline::decode_polyline(&route.geometry, 5)
        .map_err(|e| RouteError::Malformed(format!("geometry, {e}")))?;
    if line.0.is_empty() {
        return Err(RouteError::Malformed("empty geometry".to_string()));
    }
    if let Some(distance) = route.distance {
        debug!("route; vertices: {}, distance_m: {distance:.1}", line.0.len());
    }
    Ok(line.0)
}

#[cfg(test)]
mod tests {
    use super::{decode_response, Client, RouteError, RouteSource, PUBLIC_OSRM_URL};
    use approx::assert_abs_diff_eq;
    use geo::coord;
    use std::{
        io::{BufRead, BufReader, Write},
        net::{SocketAddr, TcpListener},
        sync::mpsc,
        thread,
        time::Duration,
    };

    /// Answers one connection per canned `(status, body)` response, in
    /// order, and reports each request line received.
    fn serve(responses: Vec<(u16, String)>) -> (SocketAddr, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).unwrap();
                    if header.trim_end().is_empty() {
                        break;
                    }
                }
                tx.send(request_line.trim_end().to_string()).unwrap();
                write!(
                    stream,
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();
            }
        });
        (addr, rx)
    }

    #[test]
    fn test_decode_response() {
        let body = r#"{
            "code": "Ok",
            "routes": [{"geometry": "_p~iF~ps|U_ulLnnqC_mqNvxq`@", "distance": 1234.5}],
            "waypoints": []
        }"#;
        let route = decode_response(body).unwrap();
        assert_eq!(route.len(), 3);
        let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];
        for (coord, (lat, lon)) in route.iter().zip(expected) {
            assert_abs_diff_eq!(coord.y, lat, epsilon = 1e-9);
            assert_abs_diff_eq!(coord.x, lon, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rejected_code() {
        let body = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        match decode_response(body) {
            Err(RouteError::Rejected { code, message }) => {
                assert_eq!(code, "NoRoute");
                assert_eq!(message, "Impossible route between points");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_bodies() {
        for body in [
            "<html>Bad Gateway</html>",
            r#"{"code": "Ok"}"#,
            r#"{"code": "Ok", "routes": []}"#,
            r#"{"code": "Ok", "routes": [{"geometry": ""}]}"#,
            r#"{"code": "Ok", "routes": [{"distance": 10.0}]}"#,
        ] {
            assert!(
                matches!(decode_response(body), Err(RouteError::Malformed(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn test_route_url() {
        let client = Client::new(PUBLIC_OSRM_URL).unwrap();
        let url = client.route_url(coord!(x: 37.6173, y: 55.7558), coord!(x: 30.3351, y: 59.9343));
        assert_eq!(
            url,
            "http://router.project-osrm.org/route/v1/driving/37.6173,55.7558;30.3351,59.9343"
        );
    }

    #[test]
    fn test_template_placeholders_required() {
        assert!(matches!(
            Client::new("http://localhost:5000/route/v1/driving/{lon1},{lat1}"),
            Err(RouteError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_fetch_route_over_http() {
        let error_page = format!("<html>{}</html>", "x".repeat(1000));
        let (addr, requests) = serve(vec![
            (
                200,
                r#"{"code":"Ok","routes":[{"geometry":"_p~iF~ps|U_ulLnnqC_mqNvxq`@"}]}"#.to_string(),
            ),
            (
                400,
                r#"{"code":"NoRoute","message":"Impossible route between points"}"#.to_string(),
            ),
            (502, error_page),
        ]);
        let client = Client::new(format!(
            "http://{addr}/route/v1/driving/{{lon1}},{{lat1}};{{lon2}},{{lat2}}"
        ))
        .unwrap();
        let (start, end) = (coord!(x: -120.2, y: 38.5), coord!(x: -126.453, y: 43.252));
        let timeout = Duration::from_secs(10);

        let route = client.fetch_route(start, end, timeout).unwrap();
        assert_eq!(route.len(), 3);
        assert_abs_diff_eq!(route[2].y, 43.252, epsilon = 1e-9);
        let request = requests.recv().unwrap();
        assert!(
            request.starts_with("GET /route/v1/driving/-120.2,38.5;-126.453,43.252?"),
            "{request}"
        );
        assert!(request.contains("overview=full"), "{request}");
        assert!(request.contains("geometries=polyline"), "{request}");

        match client.fetch_route(start, end, timeout) {
            Err(RouteError::Rejected { code, .. }) => assert_eq!(code, "NoRoute"),
            other => panic!("expected rejection, got {other:?}"),
        }

        match client.fetch_route(start, end, timeout) {
            Err(RouteError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body.chars().count(), 400);
                assert!(body.starts_with("<html>xxx"));
            }
            other => panic!("expected HTTP status error, got {other:?}"),
        }
    }
}
