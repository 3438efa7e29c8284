use std::net::TcpListener;
use std::sync::Arc;

use tokengate::auth::AuthService;
use tokengate::configuration::get_configuration;
use tokengate::startup::run;
use tokengate::store::{InMemoryUserStore, PgUserStore, UserStore};
use tokengate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let store: Arc<dyn UserStore> = match &configuration.database {
        Some(database) => {
            tracing::info!("Attempting to connect to database");
            let store = PgUserStore::connect(database).await.map_err(|e| {
                tracing::error!("Failed to create connection pool: {}", e);
                std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "Database connection error",
                )
            })?;
            store.migrate().await.map_err(|e| {
                tracing::error!("Failed to migrate database: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
            })?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("No database configured, users are kept in memory");
            Arc::new(InMemoryUserStore::new())
        }
    };
    tracing::info!(backend = store.backend_name(), "User store ready");

    let auth = AuthService::new(configuration.jwt.clone(), store)
        .with_hash_cost(configuration.application.password_hash_cost);

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, auth, configuration.http.clone())?;
    server.await
}
