// Shared test support
// A scripted transport that records calls, can hold a fetch open on a
// Notify gate and can fail on demand, plus the resource types used across
// the client integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use refwire_client::{
    Client, ClientConfig, Entity, FetchOptions, FieldMap, FieldSpec, FieldType, HydrateError,
    Method, PropertyBag, Resource, ResourceUri, Transport, TransportError, Value,
};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub uri: String,
    pub data: Option<JsonValue>,
}

#[derive(Debug, Clone)]
enum Reply {
    Json(JsonValue),
    Status(u16),
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<(Method, String), Reply>,
    calls: Vec<RecordedCall>,
    gates: HashMap<String, Arc<Notify>>,
}

/// Clones share routes and the call log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, method: Method, uri: &str, body: JsonValue) -> &Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert((method, uri.to_string()), Reply::Json(body));
        self
    }

    pub fn on_get(&self, uri: &str, body: JsonValue) -> &Self {
        self.route(Method::Get, uri, body)
    }

    pub fn fail(&self, method: Method, uri: &str, status: u16) -> &Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert((method, uri.to_string()), Reply::Status(status));
        self
    }

    /// Holds every fetch of `uri` until the returned gate is notified.
    pub fn gate(&self, uri: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(uri.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: Method, uri: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| call.method == method && call.uri == uri)
            .count()
    }

    pub fn last_body(&self, method: Method, uri: &str) -> Option<JsonValue> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .rev()
            .find(|call| call.method == method && call.uri == uri)
            .and_then(|call| call.data.clone())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, uri: &str, options: FetchOptions) -> Result<JsonValue, TransportError> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(RecordedCall {
                method: options.method,
                uri: uri.to_string(),
                data: options.data.clone(),
            });
            state.gates.get(uri).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let reply = self
            .state
            .lock()
            .unwrap()
            .routes
            .get(&(options.method, uri.to_string()))
            .cloned();
        match reply {
            Some(Reply::Json(body)) => Ok(body),
            Some(Reply::Status(status)) => Err(TransportError::Http {
                status,
                body: format!("{} {}", options.method, uri),
            }),
            None => Err(TransportError::Http {
                status: 404,
                body: format!("no route for {} {}", options.method, uri),
            }),
        }
    }
}

/// Resource with declared fields.
#[derive(Debug)]
pub struct User {
    pub uri: ResourceUri,
    pub first_name: String,
    pub last_name: Option<String>,
    pub joined: Option<DateTime<Utc>>,
    pub manager: Value,
    /// Fields kept under `UnknownFieldPolicy::Keep`
    pub extra: PropertyBag,
}

impl Entity for User {
    fn uri(&self) -> &ResourceUri {
        &self.uri
    }
}

impl Resource for User {
    const PREFIX: &'static str = "/user";

    fn fields() -> FieldMap {
        FieldMap::from([
            ("firstName".to_string(), FieldSpec::typed(FieldType::String)),
            (
                "lastName".to_string(),
                FieldSpec::typed(FieldType::String).wire("surname"),
            ),
            (
                "joined".to_string(),
                FieldSpec::typed(FieldType::Date).read_only(),
            ),
            ("manager".to_string(), FieldSpec::typed(FieldType::Entity)),
        ])
    }

    fn from_properties(uri: ResourceUri, mut props: PropertyBag) -> Result<Self, HydrateError> {
        let first_name = props.str("firstName")?.to_string();
        let last_name = props.opt_str("lastName")?.map(str::to_string);
        let joined = props.opt_date("joined")?;
        let manager = props.take("manager").unwrap_or(Value::Null);
        for key in ["firstName", "lastName", "joined"] {
            props.take(key);
        }
        Ok(User {
            uri,
            first_name,
            last_name,
            joined,
            manager,
            extra: props,
        })
    }
}

/// Resource without declared fields; keeps whatever it is given.
#[derive(Debug)]
pub struct Doc {
    pub uri: ResourceUri,
    pub props: PropertyBag,
}

impl Entity for Doc {
    fn uri(&self) -> &ResourceUri {
        &self.uri
    }
}

impl Resource for Doc {
    const PREFIX: &'static str = "/doc";

    fn from_properties(uri: ResourceUri, props: PropertyBag) -> Result<Self, HydrateError> {
        Ok(Doc { uri, props })
    }
}

pub fn client_with(transport: &MockTransport, config: ClientConfig) -> Client {
    refwire_client::logging::init_test_logging();
    let client = Client::new(config, transport.clone());
    client.register::<User>().unwrap();
    client.register::<Doc>().unwrap();
    client
}

pub fn client(transport: &MockTransport) -> Client {
    client_with(transport, ClientConfig::default())
}
