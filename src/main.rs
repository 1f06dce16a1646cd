use std::sync::Arc;

use assura_cash::{ AppError, Config, Result };
use migration::{ Migrator, MigratorTrait };
use tower_http::{ cors::CorsLayer, trace::TraceLayer };
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "assura_cash=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| AppError::Config(e.to_string()))?;

    tracing::info!("Starting assura-cash (currency {})", config.default_currency);

    let db = assura_cash::db::connect(&config.database_url).await?;
    tracing::info!("Database connected successfully");

    Migrator::up(&db, None).await?;
    tracing::info!("Migrations completed successfully");

    let encryptor = Arc::new(assura_cash::crypto::Encryptor::new(&config.encryption_key)?);
    let auth = Arc::new(
        assura_cash::auth::SupabaseAuth::new(
            config.supabase_url.clone(),
            config.supabase_anon_key.clone()
        )?
    );
    let bank = Arc::new(assura_cash::vfd::VfdClient::new(config.vfd.clone())?);

    let app_state = assura_cash::api::AppState::assemble(
        db,
        auth,
        bank,
        encryptor,
        config.vfd.webhook_secret.clone(),
        config.default_currency.clone()
    );

    let app = assura_cash::api
        ::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.listen_addr();
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    axum::serve(listener, app).await.map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
