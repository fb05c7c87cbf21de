//! Utility code to help writing notifeed tests.
//!
//! [`HttpServer`] is a primitive single-threaded HTTP server standing in for
//! the portal's REST backend. Tests register route handlers, point an
//! `ApiClient` at the server's address, and afterwards assert on the
//! [`Events`] recording of every request made.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use url::Url;

/// The callback type for HTTP route handlers.
pub type RequestCallback = Box<dyn Send + Fn(Request) -> Response>;

/// HTTP method.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    PATCH,
}

impl Method {
    fn from_str(s: &str) -> Method {
        match s {
            "GET" => Method::GET,
            "PATCH" => Method::PATCH,
            _ => panic!("unexpected HTTP method {s}"),
        }
    }
}

/// A request received on the HTTP server.
#[derive(Clone, Debug)]
pub struct Request {
    /// The path of the request, such as `users/notifications`.
    pub path: String,
    /// The HTTP method.
    pub method: Method,
    /// Components in the path that were captured with the `{foo}` syntax.
    /// See [`HttpServer::new`] for details.
    pub components: HashMap<String, String>,
    /// HTTP headers.
    pub headers: HashMap<String, String>,
    /// The body of the HTTP request.
    pub body: Vec<u8>,
}

/// The response the HTTP server should send to the client.
pub struct Response {
    pub code: u32,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new() -> Response {
        Response {
            code: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn code(mut self, code: u32) -> Self {
        self.code = code;
        self
    }

    pub fn body(mut self, body: &[u8]) -> Self {
        self.body = Vec::from(body);
        self
    }

    pub fn json<T: serde::Serialize>(self, value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap();
        Response {
            headers: vec!["Content-Type: application/json".to_string()],
            body,
            ..self
        }
    }
}

/// A recording of HTTP requests which can then be validated they were
/// performed in the correct order.
#[derive(Clone)]
pub struct Events(Arc<Mutex<Vec<(Method, String)>>>);

impl Events {
    pub fn new() -> Events {
        Events(Arc::new(Mutex::new(Vec::new())))
    }

    fn push(&self, method: Method, path: String) {
        let mut es = self.0.lock().unwrap();
        es.push((method, path));
    }

    pub fn assert_eq(&self, expected: &[(Method, &str)]) {
        let es = self.0.lock().unwrap();
        for (actual, expected) in es.iter().zip(expected.iter()) {
            if actual.0 != expected.0 || actual.1 != expected.1 {
                panic!("expected request to {expected:?}, but next event was {actual:?}");
            }
        }
        if es.len() > expected.len() {
            panic!(
                "got unexpected extra requests, \
                make sure the event assertion lists all events\n\
                Extras are: {:?} ",
                &es[expected.len()..]
            );
        } else if es.len() < expected.len() {
            panic!(
                "expected additional requests that were never made, \
                make sure the event assertion lists the correct requests\n\
                Extra expected are: {:?}",
                &expected[es.len()..]
            );
        }
    }
}

/// A primitive HTTP server.
pub struct HttpServer {
    listener: TcpListener,
    /// Handlers to call for specific routes.
    handlers: HashMap<(Method, &'static str), RequestCallback>,
    /// A recording of all requests.
    events: Events,
}

/// A reference on how to connect to the test HTTP server.
pub struct HttpServerHandle {
    pub addr: SocketAddr,
}

impl HttpServerHandle {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for HttpServerHandle {
    fn drop(&mut self) {
        if let Ok(mut stream) = TcpStream::connect(self.addr) {
            // shut down the server
            let _ = stream.write_all(b"STOP");
            let _ = stream.flush();
        }
    }
}

impl HttpServer {
    /// Starts the server on an ephemeral port.
    ///
    /// Route patterns may capture path components with curly braces, like
    /// `users/notifications/{id}/mark-read`; the captured value is available
    /// in [`Request::components`].
    pub fn new(
        handlers: HashMap<(Method, &'static str), RequestCallback>,
        events: Events,
    ) -> HttpServerHandle {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = HttpServer {
            listener,
            handlers,
            events,
        };
        std::thread::spawn(move || server.start());
        HttpServerHandle { addr }
    }

    fn start(&self) {
        let mut line = String::new();
        'server: loop {
            let (socket, _) = self.listener.accept().unwrap();
            let mut buf = BufReader::new(socket);
            line.clear();
            if buf.read_line(&mut line).unwrap() == 0 {
                // Connection terminated.
                eprintln!("unexpected client drop");
                continue;
            }
            // Read the "GET path HTTP/1.1" line.
            let mut parts = line.split_ascii_whitespace();
            let method = parts.next().unwrap().to_ascii_uppercase();
            if method == "STOP" {
                // Shutdown the server.
                return;
            }
            let path = parts.next().unwrap();
            // The host doesn't matter, this is only for parsing.
            let url = Url::parse(&format!("http://127.0.0.1{path}")).unwrap();

            let mut headers = HashMap::new();
            let mut content_len = None;
            loop {
                line.clear();
                if buf.read_line(&mut line).unwrap() == 0 {
                    continue 'server;
                }
                if line == "\r\n" {
                    // End of headers.
                    line.clear();
                    break;
                }
                let (name, value) = line.split_once(':').unwrap();
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim().to_string();
                match name.as_str() {
                    "content-length" => content_len = Some(value.parse::<u64>().unwrap()),
                    _ => {}
                }
                headers.insert(name, value);
            }
            let mut body = vec![0u8; content_len.unwrap_or(0) as usize];
            buf.read_exact(&mut body).unwrap();

            let method = Method::from_str(&method);
            self.events.push(method, url.path().to_string());
            let response = self.route(method, &url, headers, body);

            let buf = buf.get_mut();
            write!(buf, "HTTP/1.1 {}\r\n", response.code).unwrap();
            write!(buf, "Content-Length: {}\r\n", response.body.len()).unwrap();
            write!(buf, "Connection: close\r\n").unwrap();
            for header in response.headers {
                write!(buf, "{}\r\n", header).unwrap();
            }
            write!(buf, "\r\n").unwrap();
            buf.write_all(&response.body).unwrap();
            buf.flush().unwrap();
        }
    }

    /// Route the request
    fn route(
        &self,
        method: Method,
        url: &Url,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Response {
        let segments: Vec<_> = url.path_segments().unwrap().collect();
        let path = url.path().to_string();
        for ((route_method, route_pattern), responder) in &self.handlers {
            if *route_method != method {
                continue;
            }
            if let Some(components) = match_route(route_pattern, &segments) {
                let request = Request {
                    method,
                    path,
                    components,
                    headers,
                    body,
                };
                return responder(request);
            }
        }
        eprintln!(
            "route {method:?} {url} has no handler.\n\
            Add a handler to the server for this route."
        );
        Response {
            code: 404,
            headers: Vec::new(),
            body: b"404 not found".to_vec(),
        }
    }
}

fn match_route(route_pattern: &str, segments: &[&str]) -> Option<HashMap<String, String>> {
    let mut segments = segments.iter().filter(|s| !s.is_empty());
    let mut components = HashMap::new();
    for part in route_pattern.split('/') {
        match segments.next() {
            None => return None,
            Some(actual) => {
                if part.starts_with('{') {
                    let part = part[1..part.len() - 1].to_string();
                    components.insert(part, actual.to_string());
                } else if *actual != part {
                    return None;
                }
            }
        }
    }
    if segments.next().is_some() {
        return None;
    }
    Some(components)
}

/// Enables logging if `NOTIFEED_TEST_LOG` is set. This can help with
/// debugging a test.
pub fn maybe_enable_logging() {
    const LOG_VAR: &str = "NOTIFEED_TEST_LOG";
    use std::sync::Once;
    static DO_INIT: Once = Once::new();
    if std::env::var_os(LOG_VAR).is_some() {
        DO_INIT.call_once(|| {
            tracing_subscriber::fmt::Subscriber::builder()
                .with_env_filter(tracing_subscriber::EnvFilter::from_env(LOG_VAR))
                .try_init()
                .unwrap();
        });
    }
}
