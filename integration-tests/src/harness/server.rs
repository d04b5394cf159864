use crate::harness::{CapturedEvent, init_test_tracing};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use reqwest::redirect::Policy;
use servedir_core::conf::{AppConfig, ServeConfig};
use servedir_core::server::build_server;
use std::fs;
use std::net::TcpStream;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Handle to a running servedir test server.
///
/// The served root is a temp directory that lives as long as the handle.
pub struct TestServer {
    base_url: String,
    client: Client,
    root: TempDir,
}

impl TestServer {
    /// Start a servedir instance over a fresh temp directory.
    ///
    /// `configure` receives the served root (to populate files) and the
    /// serve config (to set rules) before the server is built.
    pub fn start(configure: impl FnOnce(&Path, &mut ServeConfig)) -> Self {
        // Initialize tracing (this must happen first).
        init_test_tracing(events());

        let root = tempfile::tempdir().expect("failed to create served root");

        let mut serve = ServeConfig::default();
        configure(root.path(), &mut serve);
        serve.public = root.path().to_path_buf();

        let listen_port = free_port();
        let mut cfg = AppConfig {
            serve,
            ..AppConfig::default()
        };
        cfg.server.listen = format!("127.0.0.1:{listen_port}");
        cfg.server.threads = Some(1);

        let server = build_server(&cfg).expect("failed to build servedir server");

        // Run server in background thread
        thread::spawn(move || {
            server.run_forever();
        });

        let base_url = format!("http://127.0.0.1:{listen_port}");

        // Wait for server to accept connections
        wait_for_server(&base_url);

        // Redirects are asserted on, never followed.
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .redirect(Policy::none())
            .build()
            .expect("failed to build client");

        Self {
            base_url,
            client,
            root,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn head(&self, path: &str) -> RequestBuilder {
        self.client.head(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Events captured by the test tracing layer, across all servers in
    /// this process.
    pub fn events(&self) -> Vec<CapturedEvent> {
        events().lock().unwrap().clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Writes `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create fixture directory");
    }
    fs::write(path, contents).expect("failed to write fixture file");
}

/// Poll until the server responds (or panic).
fn wait_for_server(listen_addr: &str) {
    let addr = listen_addr.strip_prefix("http://").unwrap_or(listen_addr);

    let deadline = Instant::now() + Duration::from_secs(2);

    loop {
        match TcpStream::connect(addr) {
            Ok(_) => return,
            Err(_) => {
                if Instant::now() > deadline {
                    panic!("server failed to start at {}", listen_addr);
                }
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

static EVENTS: OnceLock<Arc<Mutex<Vec<CapturedEvent>>>> = OnceLock::new();

fn events() -> Arc<Mutex<Vec<CapturedEvent>>> {
    EVENTS
        .get_or_init(|| Arc::new(Mutex::new(Vec::new())))
        .clone()
}

/// Allocate a free port on localhost.
/// This is required to avoid port collisions when running tests in parallel.
fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
