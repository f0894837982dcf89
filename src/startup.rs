use std::net::TcpListener;
use std::sync::Arc;

use actix_web::cookie::Key;
use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use secrecy::ExposeSecret;
use secrecy::Secret;
use tracing_actix_web::TracingLogger;

use crate::collaborators::InMemoryPropertyStore;
use crate::collaborators::PropertyStore;
use crate::collaborators::StaticNodeResolver;
use crate::collaborators::StaticTranslator;
use crate::configuration::Settings;
use crate::coordinator::SubscriptionCoordinator;
use crate::mailchimp_client::MailchimpClient;
use crate::routes::health_check;
use crate::routes::properties_preview;
use crate::routes::refresh_schema;
use crate::routes::save_fields;
use crate::routes::save_properties;
use crate::routes::subscribe;
use crate::routes::subscribe_form;
use crate::schema_cache::ListSchemaCache;
use crate::widget::Widget;

/// The coordinator as the server runs it, i.e. talking to the real Mailchimp
pub type Coordinator = SubscriptionCoordinator<MailchimpClient>;

/// Wrapper for actix's `Server` with access to the bound port
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener and wire up the widget; the server only starts
    /// serving once `run_until_stopped` is awaited
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        // port 0 lets the OS pick one (tests)
        let port = listener.local_addr()?.port();

        let provider = Arc::new(cfg.mailchimp.client()?);
        let store: Arc<dyn PropertyStore> = Arc::new(InMemoryPropertyStore::default());
        let coordinator = SubscriptionCoordinator::new(
            provider.clone(),
            ListSchemaCache::new(provider, store.clone()),
        );

        let translator = StaticTranslator::new(cfg.widget.translations.clone());
        let resolver = StaticNodeResolver::new(cfg.widget.nodes.clone());
        let widget = Widget::new(
            cfg.widget,
            cfg.mailchimp.api_key,
            store,
            Arc::new(translator),
            Arc::new(resolver),
        );

        let server = run(listener, coordinator, widget, cfg.application.hmac_secret)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Consumes `self`; await it last, or hand it to `tokio::spawn`
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// Declares all endpoints. The listener must already be bound.
pub fn run(
    listener: TcpListener,
    coordinator: Coordinator,
    widget: Widget,
    hmac_secret: Secret<String>,
) -> Result<Server, anyhow::Error> {
    let secret_key = Key::try_from(hmac_secret.expose_secret().as_bytes())?;
    let cookie_store = CookieMessageStore::builder(secret_key).build();
    let msg_framework = FlashMessagesFramework::builder(cookie_store).build();

    // one instance shared by every worker, so they all see the same cache
    let coordinator = web::Data::new(coordinator);
    let widget = web::Data::new(widget);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(msg_framework.clone())
            .route("/health_check", web::get().to(health_check))
            .route("/subscribe", web::get().to(subscribe_form))
            .route("/subscribe", web::post().to(subscribe))
            .service(
                web::scope("/properties")
                    .route("", web::post().to(save_properties))
                    .route("/preview", web::get().to(properties_preview))
                    .route("/fields", web::post().to(save_fields))
                    .route("/refresh", web::post().to(refresh_schema)),
            )
            .app_data(coordinator.clone())
            .app_data(widget.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
