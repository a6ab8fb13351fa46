use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::{error, info};

use blog_posts_api::{
    config::Config,
    db::Database,
    handlers::{
        categories::{create_category, get_all_categories},
        comments::{
            create_comment, delete_comment, get_all_comments, get_comment_by_id,
            get_comments_for_post, update_comment,
        },
        health_check,
        images::{get_images_for_post, get_post_image_by_id, update_post_image, upload_post_image},
        likes::{create_like, delete_like, get_likes_for_target, get_post_likes},
        posts::{create_post, delete_post, get_all_posts, get_post_by_id, update_post},
        users::{create_user, get_user_by_id},
    },
    media::MediaStorage,
    middleware::{create_middleware_stack, init_tracing},
    AppState,
};

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_tracing(&config.environment) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }
    info!("Configuration loaded successfully");

    let database = match Database::new(config.database.clone()).await {
        Ok(db) => {
            info!("Database connection established");
            Arc::new(db)
        }
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = database.migrate().await {
        error!("Failed to run database migrations: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.media.root).await {
        error!("Failed to create media root {}: {}", config.media.root.display(), e);
        std::process::exit(1);
    }
    info!("Serving media from {}", config.media.root.display());

    let state = AppState {
        db: database,
        media: Arc::new(MediaStorage::new(config.media.root.clone())),
        media_url: config.media.url_prefix.clone(),
    };

    let app = create_router(state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Create the Axum router with all endpoints and middleware
fn create_router(state: AppState, config: &Config) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        // Users
        .route("/api/users", post(create_user))
        .route("/api/users/:id", get(get_user_by_id))
        // Categories
        .route("/api/categories", post(create_category).get(get_all_categories))
        // Posts
        .route("/api/posts", post(create_post).get(get_all_posts))
        .route(
            "/api/posts/:id",
            get(get_post_by_id).put(update_post).delete(delete_post),
        )
        // Post images
        .route(
            "/api/posts/:id/images",
            post(upload_post_image).get(get_images_for_post),
        )
        .route("/api/images/:id", get(get_post_image_by_id).put(update_post_image))
        // Comments
        .route(
            "/api/posts/:id/comments",
            post(create_comment).get(get_comments_for_post),
        )
        .route("/api/comments", get(get_all_comments))
        .route(
            "/api/comments/:id",
            get(get_comment_by_id).put(update_comment).delete(delete_comment),
        )
        // Likes
        .route("/api/likes", post(create_like).get(get_likes_for_target))
        .route("/api/likes/:id", delete(delete_like))
        .route("/api/posts/:id/likes", get(get_post_likes));

    // Stored images are served straight from disk unless an external URL is configured
    if config.media.url_prefix.starts_with('/') {
        router = router.nest_service(config.media.mount_path(), ServeDir::new(&config.media.root));
    }

    router
        .layer(DefaultBodyLimit::max(config.media.max_upload_bytes))
        .with_state(state)
        .layer(create_middleware_stack(config.request_timeout))
}

/// Graceful shutdown signal handler
/// Listens for SIGTERM and SIGINT signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        },
    }
}
