//! HTTP server lifecycle.
//!
//! [`RestServer::init`] validates the setup sequence, builds every route
//! chain, mounts the routes and synthesizes the documentation. Nothing is
//! mounted unless every chain builds. [`RestServer::start`] then binds the
//! listener and serves connections until shutdown.
//!
//! ```rust,no_run
//! use archrest_core::{handler_fn, Response, ResponseExt};
//! use archrest_server::{ControllerBuilder, RestServer, RouteBuilder};
//! use http::StatusCode;
//!
//! struct Health;
//!
//! # async fn run() -> archrest_server::ServerResult<()> {
//! let server = RestServer::builder()
//!     .port(8080)
//!     .controller(
//!         ControllerBuilder::new::<Health>()
//!             .prefix("health")
//!             .route(RouteBuilder::get("/", "check", handler_fn(|_ctx, _req| async {
//!                 Ok(Response::text(StatusCode::OK, "ok"))
//!             }))),
//!     )
//!     .build();
//!
//! let running = server.start().await?;
//! running.shutdown().await;
//! # Ok(())
//! # }
//! ```

use crate::app::App;
use crate::controller::{build_chain, ChainSettings};
use crate::declare::{auth_guard, ControllerBuilder};
use crate::error::{ServerError, ServerResult};
use crate::router::Router;
use crate::sequence::Sequence;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use archrest_config::{RestConfig, SwaggerSection};
use archrest_core::{
    handler_fn, ControllerInfo, ErrorRegistry, FileUploadOptions, HandlerResult,
    HttpErrorsOptions, HttpVerb, MetadataStore, Response, ResponseExt,
};
use archrest_docs::{synthesize, OpenApiDocument, SwaggerOptions, SwaggerUi};
use archrest_middleware::{HandlerStage, MiddlewareChain};
use archrest_telemetry::describe_metrics;
use archrest_validation::{Presence, SchemaValidator, ValidationOptions, ValidationStrategy};
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use serde_json::json;
use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const DEFAULT_HOSTNAME: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Initializes logging from the `logging` section of `config`.
///
/// # Errors
///
/// Returns [`ServerError::Telemetry`] if a subscriber is already installed
/// or the configured level does not parse.
pub fn init_logging(config: &RestConfig) -> ServerResult<()> {
    archrest_telemetry::init_logging(&config.logging)?;
    Ok(())
}

/// A configured, not yet listening server.
pub struct RestServer {
    hostname: String,
    port: u16,
    shutdown_timeout: Duration,
    store: MetadataStore,
    controllers: Vec<ControllerInfo>,
    validation: Option<Arc<dyn ValidationStrategy>>,
    validation_options: Option<ValidationOptions>,
    upload: FileUploadOptions,
    errors: ErrorRegistry,
    errors_options: Option<HttpErrorsOptions>,
    sequence: Sequence,
    swagger: Option<SwaggerSection>,
}

impl RestServer {
    /// Starts building a server.
    #[must_use]
    pub fn builder() -> RestServerBuilder {
        RestServerBuilder::new()
    }

    /// Starts building a server from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if `config` fails validation.
    pub fn from_config(config: &RestConfig) -> ServerResult<RestServerBuilder> {
        config.validate()?;
        Ok(RestServerBuilder::new().config(config))
    }

    /// The configured listen address.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Registered controllers.
    #[must_use]
    pub fn controllers(&self) -> &[ControllerInfo] {
        &self.controllers
    }

    /// Assembles the application without opening a socket.
    ///
    /// # Errors
    ///
    /// - [`ServerError::MissingMarker`], [`ServerError::DuplicateMarker`] or
    ///   [`ServerError::MarkerOrder`] for a malformed setup sequence
    /// - [`ServerError::ValidationNotConfigured`] if a route declares a
    ///   schema and no validation strategy is configured
    /// - [`ServerError::Docs`] for an unusable documentation path
    pub fn init(&self) -> ServerResult<App> {
        let plan = self.sequence.validate()?;
        let settings = self.chain_settings();

        let mut routes = Vec::new();
        for controller in &self.controllers {
            for method in &controller.methods {
                let chain = build_chain(controller, method, &self.store, &settings)?;
                routes.push((method.http_method, method.http_path.as_str(), chain));
            }
        }

        let mut router = Router::new();
        for (verb, path, chain) in routes {
            router.mount_verb(verb, path, chain);
        }

        let document = self
            .swagger
            .as_ref()
            .map(|section| self.mount_docs(&mut router, section, &settings))
            .transpose()?;

        Ok(App::new(plan, router, document))
    }

    /// Binds the listener and serves in the background.
    ///
    /// # Errors
    ///
    /// Everything [`init`](Self::init) reports, plus
    /// [`ServerError::InvalidAddress`] and [`ServerError::Bind`].
    pub async fn start(self) -> ServerResult<RunningServer> {
        self.start_with_shutdown(ShutdownSignal::new()).await
    }

    /// Like [`start`](Self::start), stopping when `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub async fn start_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<RunningServer> {
        if self.hostname.trim().is_empty() {
            return Err(ServerError::InvalidAddress(self.address()));
        }
        let app = Arc::new(self.init()?);

        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Server running at: {}:{}", self.hostname, local_addr.port());
        describe_metrics();

        let task = tokio::spawn(serve(
            listener,
            Arc::clone(&app),
            shutdown.clone(),
            self.shutdown_timeout,
        ));

        Ok(RunningServer {
            local_addr,
            app,
            shutdown,
            task: Mutex::new(Some(task)),
        })
    }

    /// Serves until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub async fn run(self) -> ServerResult<()> {
        let running = self
            .start_with_shutdown(ShutdownSignal::with_os_signals())
            .await?;
        running.wait().await;
        Ok(())
    }

    fn chain_settings(&self) -> ChainSettings {
        let validation = self.validation.clone().or_else(|| {
            self.validation_options
                .clone()
                .map(|options| Arc::new(SchemaValidator::new(options)) as Arc<dyn ValidationStrategy>)
        });
        let errors = match &self.errors_options {
            Some(options) => self.errors.clone().with_options(options.clone()),
            None => self.errors.clone(),
        };

        ChainSettings {
            validation,
            upload: self.upload.clone(),
            errors: Arc::new(errors),
        }
    }

    fn docs_presence(&self) -> Presence {
        self.validation_options
            .as_ref()
            .and_then(|options| options.presence)
            .unwrap_or(Presence::Required)
    }

    fn mount_docs(
        &self,
        router: &mut Router,
        section: &SwaggerSection,
        settings: &ChainSettings,
    ) -> ServerResult<OpenApiDocument> {
        let ui = SwaggerUi::new(&section.path)?;
        let document = synthesize(
            &self.controllers,
            &self.store,
            &section.options,
            self.docs_presence(),
        );
        let spec = Bytes::from(document.to_json()?);
        let html = ui.html();

        let page = handler_fn(move |_ctx, _request| {
            let html = html.clone();
            async move { HandlerResult::Ok(Response::html(StatusCode::OK, html)) }
        });
        let json = handler_fn(move |_ctx, _request| {
            let spec = spec.clone();
            async move { HandlerResult::Ok(json_bytes(spec)) }
        });

        let errors = &settings.errors;
        router.mount_verb(
            HttpVerb::Get,
            ui.path(),
            MiddlewareChain::new(vec![Arc::new(HandlerStage::new(
                "swagger-ui",
                page,
                Arc::clone(errors),
            ))]),
        );
        router.mount_verb(
            HttpVerb::Get,
            &ui.spec_path(),
            MiddlewareChain::new(vec![Arc::new(HandlerStage::new(
                "openapi-document",
                json,
                Arc::clone(errors),
            ))]),
        );

        Ok(document)
    }
}

impl fmt::Debug for RestServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestServer")
            .field("address", &self.address())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("controllers", &self.controllers.len())
            .field("validation", &self.validation.is_some())
            .field("validation_options", &self.validation_options)
            .field("upload", &self.upload)
            .field("swagger", &self.swagger)
            .finish_non_exhaustive()
    }
}

fn json_bytes(body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

async fn serve(
    listener: TcpListener,
    app: Arc<App>,
    shutdown: ShutdownSignal,
    shutdown_timeout: Duration,
) {
    let tracker = ConnectionTracker::new();

    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, remote_addr)) => {
                    let token = tracker.acquire();
                    let app = Arc::clone(&app);
                    let shutdown = shutdown.clone();

                    tokio::spawn(async move {
                        if let Err(error) = serve_connection(stream, app, shutdown).await {
                            tracing::debug!(%remote_addr, error = %error, "Connection error");
                        }
                        drop(token);
                    });
                }
                Err(error) => {
                    tracing::error!(error = %error, "Failed to accept connection");
                }
            },
            () = shutdown.recv() => {
                tracing::info!("Shutdown signal received, stopping server");
                break;
            }
        }
    }
    drop(listener);

    tracing::info!(
        "Waiting up to {:?} for {} connections to close",
        shutdown_timeout,
        tracker.active_connections()
    );
    tokio::select! {
        () = tracker.wait_for_shutdown() => {
            tracing::info!("All connections closed");
        }
        () = tokio::time::sleep(shutdown_timeout) => {
            tracing::warn!(
                "Shutdown timeout reached, {} connections still active",
                tracker.active_connections()
            );
        }
    }
    tracing::info!("Server stopped");
}

async fn serve_connection(
    stream: TcpStream,
    app: Arc<App>,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |request: http::Request<Incoming>| {
        let app = Arc::clone(&app);
        async move { Ok::<_, Infallible>(handle_incoming(&app, request).await) }
    });

    let mut connection =
        std::pin::pin!(http1::Builder::new().serve_connection(TokioIo::new(stream), service));

    tokio::select! {
        result = connection.as_mut() => return result,
        () = shutdown.recv() => connection.as_mut().graceful_shutdown(),
    }
    connection.await
}

async fn handle_incoming(app: &App, request: http::Request<Incoming>) -> Response {
    let (parts, body) = request.into_parts();
    match body.collect().await {
        Ok(collected) => {
            let request = http::Request::from_parts(parts, Full::new(collected.to_bytes()));
            app.handle(request).await
        }
        Err(error) => {
            tracing::warn!(error = %error, "Failed to read request body");
            Response::json(
                StatusCode::BAD_REQUEST,
                &json!({ "error": "Failed to read request body" }),
            )
        }
    }
}

/// A listening server.
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    app: Arc<App>,
    shutdown: ShutdownSignal,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RunningServer {
    /// The bound address. Reports the actual port when port 0 was requested.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The application being served.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// A handle that stops the server when triggered.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Stops accepting connections and waits for the server to finish.
    pub async fn shutdown(&self) {
        self.shutdown.trigger();
        self.wait().await;
    }

    /// Waits until the server stops.
    pub async fn wait(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(error) = task.await {
                tracing::error!(error = %error, "Server task failed");
            }
        }
    }
}

/// Builder for [`RestServer`].
pub struct RestServerBuilder {
    server: RestServer,
}

impl RestServerBuilder {
    /// A builder with defaults: `127.0.0.1:3000`, the standard sequence, no
    /// validation and no documentation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            server: RestServer {
                hostname: DEFAULT_HOSTNAME.to_string(),
                port: DEFAULT_PORT,
                shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
                store: MetadataStore::new(),
                controllers: Vec::new(),
                validation: None,
                validation_options: None,
                upload: FileUploadOptions::default(),
                errors: ErrorRegistry::new(),
                errors_options: None,
                sequence: Sequence::standard(),
                swagger: None,
            },
        }
    }

    /// Applies the server, validation, upload, swagger and error sections of
    /// a configuration.
    #[must_use]
    pub fn config(mut self, config: &RestConfig) -> Self {
        let server = &mut self.server;
        server.hostname.clone_from(&config.server.hostname);
        server.port = config.server.port;
        server.shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
        server.validation_options.clone_from(&config.validation);
        server.upload = config.upload.clone();
        server.swagger.clone_from(&config.swagger);
        server.errors_options = Some(config.errors.clone());
        self
    }

    /// Sets the hostname to listen on.
    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.server.hostname = hostname.into();
        self
    }

    /// Sets the port to listen on. `0` picks a free port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.server.shutdown_timeout = timeout;
        self
    }

    /// Replaces the metadata store. Metadata written by earlier
    /// [`controller`](Self::controller) calls is discarded.
    #[must_use]
    pub fn metadata(mut self, store: MetadataStore) -> Self {
        self.server.store = store;
        self
    }

    /// Flags guard class `G` as an authentication guard.
    ///
    /// Takes effect for every controller, registered before or after.
    #[must_use]
    pub fn auth_guard<G: ?Sized + 'static>(mut self) -> Self {
        auth_guard::<G>(&mut self.server.store);
        self
    }

    /// Registers a controller.
    #[must_use]
    pub fn controller(mut self, controller: ControllerBuilder) -> Self {
        let info = controller.register(&mut self.server.store);
        self.server.controllers.push(info);
        self
    }

    /// Adds a controller already registered into the metadata store.
    #[must_use]
    pub fn controller_info(mut self, controller: ControllerInfo) -> Self {
        self.server.controllers.push(controller);
        self
    }

    /// Sets the validation strategy.
    #[must_use]
    pub fn validation_strategy<V: ValidationStrategy>(mut self, strategy: V) -> Self {
        self.server.validation = Some(Arc::new(strategy));
        self
    }

    /// Installs the schema validator with `options`, unless a strategy is set.
    ///
    /// The presence mode also sets the documentation default.
    #[must_use]
    pub fn validation_options(mut self, options: ValidationOptions) -> Self {
        self.server.validation_options = Some(options);
        self
    }

    /// Sets the upload destination and limits.
    #[must_use]
    pub fn upload(mut self, options: FileUploadOptions) -> Self {
        self.server.upload = options;
        self
    }

    /// Sets the handler error registry.
    #[must_use]
    pub fn error_registry(mut self, registry: ErrorRegistry) -> Self {
        self.server.errors = registry;
        self
    }

    /// Sets the setup sequence.
    #[must_use]
    pub fn sequence(mut self, sequence: Sequence) -> Self {
        self.server.sequence = sequence;
        self
    }

    /// Serves the Swagger UI at `path` and the document at
    /// `{path}/openapi.json`.
    #[must_use]
    pub fn swagger(mut self, path: impl Into<String>, options: SwaggerOptions) -> Self {
        self.server.swagger = Some(SwaggerSection {
            path: path.into(),
            options,
        });
        self
    }

    /// Finishes the server.
    #[must_use]
    pub fn build(self) -> RestServer {
        self.server
    }
}

impl Default for RestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RestServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RestServerBuilder").field(&self.server).finish()
    }
}
