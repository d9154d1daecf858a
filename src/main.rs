use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geonotify::{create_router, init_pool, run_migrations, AppState, Config};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Optional: DATABASE_URL (default: sqlite://geonotify.db)");
            eprintln!("Optional: LISTEN_ADDR (default: 0.0.0.0:3000)");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting geonotify server");
    tracing::info!("Listen address: {}", config.listen_addr);
    tracing::info!("Database: {}", config.database_url);

    // Connect to database
    let pool = match init_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Database connection error: {}", e);
            std::process::exit(1);
        }
    };

    // Run migrations
    if let Err(e) = run_migrations(&pool).await {
        eprintln!("Migration error: {}", e);
        std::process::exit(1);
    }
    tracing::info!("Database migrations completed");

    // Transitions are evaluated against the local wall clock
    let state = AppState::new(pool);
    let app = create_router(state);

    // Start server
    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server running at http://{}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
