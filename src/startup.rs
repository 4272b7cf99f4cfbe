use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::providers::build_provider;
use crate::providers::NewsletterProvider;
use crate::routes::form_config;
use crate::routes::health_check;
use crate::routes::home;
use crate::routes::json_config;
use crate::routes::not_found;
use crate::routes::subscribe;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Build the newsletter provider, bind the listener, and prepare the
    /// server.
    ///
    /// The provider is built first: if the configuration is invalid, this
    /// fails before anything is bound, so no request can ever be served
    /// without a provider.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let provider = build_provider(&cfg.newsletter)?;
        tracing::info!(provider = %provider.kind(), "newsletter provider configured");

        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;

        // port 0 means the OS picks one (tests); keep the actual port around
        let port = listener.local_addr()?.port();

        let server = run(listener, provider, cfg.application.name)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// Wrapper for the application name (because raw `String`s may conflict with
/// one another when passed around by `Data`)
pub struct ApplicationName(pub String);

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    provider: NewsletterProvider,
    app_name: String,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc`: every worker shares the one provider (and its
    // connection pool)
    let provider = Data::new(provider);
    let app_name = Data::new(ApplicationName(app_name));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/", web::route().to(home))
            .route("/health_check", web::get().to(health_check))
            .route("/newsletter_subscription", web::post().to(subscribe))
            .default_service(web::route().to(not_found))
            .app_data(json_config())
            .app_data(form_config())
            .app_data(provider.clone())
            .app_data(app_name.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
