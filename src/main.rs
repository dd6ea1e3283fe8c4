use std::sync::Arc;

use course_shop::{
    AppState, Config, build_router, notification::Mailer, pool, storage::FileStores,
};
use listenfd::ListenFd;
use tokio::net::TcpListener;

fn setup_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("course_shop=info,tower_http=info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() {
    setup_tracing();

    let config = Config::from_env().expect("invalid configuration");

    if config.run_migrations {
        pool::run_migrations(config.database_url.clone())
            .await
            .expect("migrations failed");
    }

    let pool = pool::get_pool(&config.database_url)
        .await
        .expect("failed to create db pool");

    let files = FileStores::new(&config.storage);
    files.init().await.expect("failed to create upload directories");

    let mailer = Mailer::from_config(&config.smtp).expect("invalid smtp configuration");

    let state = AppState {
        pool,
        files: Arc::new(files),
        mailer,
    };
    let app = build_router(state, config.max_body_bytes);

    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0).expect("invalid listen fd") {
        // if we are given a tcp listener on listen fd 0, we use that one
        Some(listener) => {
            listener
                .set_nonblocking(true)
                .expect("failed to set listener non-blocking");
            TcpListener::from_std(listener).expect("failed to adopt listen fd")
        }
        None => TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind"),
    };

    tracing::info!(
        addr = %listener.local_addr().expect("listener has no local address"),
        "listening"
    );
    axum::serve(listener, app).await.expect("server failed");
}
