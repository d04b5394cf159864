mod conditional_tests;

use std::path::Path;

use http::{HeaderMap, HeaderValue, Method, Uri};

use crate::conf::ServeConfig;
use crate::ctx::RequestCtx;
use crate::state::ServeState;
use crate::static_files::{StaticResponse, handle_static_request};

pub(super) fn state_for(root: &Path, configure: impl FnOnce(&mut ServeConfig)) -> ServeState {
    let mut config = ServeConfig {
        public: root.to_path_buf(),
        ..ServeConfig::default()
    };
    configure(&mut config);
    ServeState::new(config).unwrap()
}

pub(super) fn request(method: Method, uri: &str, headers: &[(&'static str, &str)]) -> RequestCtx {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(*name, HeaderValue::from_str(value).unwrap());
    }
    RequestCtx::new(method, uri.parse::<Uri>().unwrap(), map)
}

pub(super) async fn get(state: &ServeState, uri: &str) -> StaticResponse {
    handle_static_request(&request(Method::GET, uri, &[]), state).await
}

pub(super) async fn get_with(
    state: &ServeState,
    uri: &str,
    headers: &[(&'static str, &str)],
) -> StaticResponse {
    handle_static_request(&request(Method::GET, uri, headers), state).await
}

pub(super) fn header<'a>(response: &'a StaticResponse, name: &str) -> Option<&'a str> {
    response.headers.get(name).and_then(|v| v.to_str().ok())
}

pub(super) fn body_text(response: &StaticResponse) -> String {
    String::from_utf8(response.body_bytes().unwrap().to_vec()).unwrap()
}

pub(super) fn body_json(response: &StaticResponse) -> serde_json::Value {
    serde_json::from_slice(response.body_bytes().unwrap()).unwrap()
}
