#![cfg_attr(not(test), forbid(unsafe_code))]

use bookshelf::{backend::StoreBackend, memory::InMemoryStore, store::DocumentStore};
use bookshelf_server::{
    app,
    config::{LogFormat, ServerConfig, StoreConfig},
    state::AppState,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "bookshelf_server=info,bookshelf_catalog=info,tower_http=debug";

fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env().expect("Failed to load configuration");
    init_tracing(config.log_format);

    match config.store.clone() {
        StoreConfig::Memory => {
            tracing::warn!("using the in-memory store; data is lost on shutdown");
            serve(config, InMemoryStore::default()).await;
        }
        #[cfg(feature = "mongodb")]
        StoreConfig::MongoDb { url, database } => {
            use bookshelf::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
            use secrecy::ExposeSecret;

            let backend = MongoDbStore::builder(url.expose_secret(), &database)
                .build()
                .await
                .expect("Failed to connect to MongoDB");
            tracing::info!(%database, "MongoDB store connected");

            serve(config, backend).await;
        }
        #[cfg(not(feature = "mongodb"))]
        StoreConfig::MongoDb { .. } => {
            panic!("BOOKSHELF_STORE=mongodb requires building with the `mongodb` feature");
        }
    }
}

async fn serve<B: StoreBackend + 'static>(config: ServerConfig, backend: B) {
    let store = DocumentStore::new(backend);
    bookshelf_catalog::init_indexes(&store)
        .await
        .expect("Failed to create indexes");

    let addr = config.socket_addr();
    let app = app(AppState::new(config, store));

    tracing::info!("bookshelf listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
