use httpmock::prelude::*;
use httpmock::{
    Mock,
    Then,
    When,
};
use serde_json::json;

type Handler = Box<dyn Fn(When, Then)>;

pub struct MockServerBuilder {
    server: MockServer,
    handlers: Vec<(usize, Handler)>,
    mock_ids: Vec<(usize, usize)>,
}

fn print_req(req: &HttpMockRequest) -> bool {
    // Use println instead of info! so that this works outside of the lib crate
    println!("    Received: {} {}", req.method(), req.uri().path());
    true
}

impl MockServerBuilder {
    pub fn new() -> MockServerBuilder {
        MockServerBuilder {
            server: MockServer::start(),
            handlers: vec![],
            mock_ids: vec![],
        }
    }

    pub fn assert(&self) {
        for (id, hits) in &self.mock_ids {
            println!("checking assertions for mock {id}");
            Mock::new(*id, &self.server).assert_hits(*hits)
        }
    }

    pub fn handle<F: Fn(When, Then) + 'static>(&mut self, f: F) -> &mut Self {
        self.handle_multiple(1, f)
    }

    // The reconciler reads some objects more than once per pass
    pub fn handle_multiple<F: Fn(When, Then) + 'static>(&mut self, hits: usize, f: F) -> &mut Self {
        self.handlers.push((
            hits,
            Box::new(move |w, t| {
                let w = w.matches(print_req);
                f(w, t);
            }),
        ));
        self
    }

    pub fn handle_not_found(&mut self, path: String) -> &mut Self {
        self.handle(move |when, then| {
            when.method(GET).path(&path);
            then.status(404).json_body(status_not_found());
        })
    }

    pub fn handle_get(&mut self, path: String, body: serde_json::Value) -> &mut Self {
        self.handle(move |when, then| {
            when.method(GET).path(&path);
            then.json_body(body.clone());
        })
    }

    pub fn handle_create(&mut self, collection_path: String, body: serde_json::Value) -> &mut Self {
        self.handle(move |when, then| {
            when.method(POST).path(&collection_path);
            then.status(201).json_body(body.clone());
        })
    }

    // Full updates must carry the live object's resourceVersion
    pub fn handle_replace(&mut self, path: String, resource_version: &str, body: serde_json::Value) -> &mut Self {
        let rv_pattern = format!("\"resourceVersion\":\"{resource_version}\"");
        self.handle(move |when, then| {
            when.method(PUT).path(&path).body_matches(rv_pattern.as_str());
            then.json_body(body.clone());
        })
    }

    pub fn build(&mut self) {
        for (hits, f) in self.handlers.iter() {
            self.mock_ids.push((self.server.mock(f).id, *hits));
        }

        // Print all unmatched/unhandled requests for easier debugging;
        // this has to go last so that the other mock rules have a chance
        // to match first
        self.server.mock(|when, _| {
            when.matches(print_req);
        });
    }

    pub fn url(&self) -> http::Uri {
        http::Uri::try_from(self.server.url("/")).unwrap()
    }
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn make_fake_apiserver() -> (MockServerBuilder, kube::Client) {
    let builder = MockServerBuilder::new();
    let config = kube::Config::new(builder.url());
    let client = kube::Client::try_from(config).unwrap();
    (builder, client)
}

pub fn status_not_found() -> serde_json::Value {
    json!({
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Failure",
      "reason": "NotFound",
      "code": 404
    })
}

pub fn status_forbidden() -> serde_json::Value {
    json!({
      "kind": "Status",
      "apiVersion": "v1",
      "metadata": {},
      "status": "Failure",
      "reason": "Forbidden",
      "code": 403
    })
}
