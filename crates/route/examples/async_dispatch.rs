use micro_route::{BoxError, Outcome, RouteContext, Router, Session, async_capture_fn, async_handler_fn};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

async fn load_user(id: String) -> Result<(), BoxError> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if id == "0" {
        return Err("user 0 does not exist".into());
    }
    info!(user = %id, "user loaded");
    Ok(())
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut router = Router::async_builder()
        .http()
        .before(async_handler_fn(|ctx: RouteContext| async move {
            info!(method = %ctx.method(), path = ctx.path(), "request");
        }))
        .build()
        .expect("router config should be valid");

    router.param("id", r"\d+").expect("id pattern should be valid");
    router.get("/users/:id", async_capture_fn(load_user)).expect("user route should be valid");
    router
        .get(
            "/slow",
            async_handler_fn(|_ctx: RouteContext| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                info!("slow handler finished");
            }),
        )
        .expect("slow route should be valid");

    for path in ["/users/42", "/users/0", "/users/bob"] {
        match router.dispatch("get", path).await {
            Ok(outcome) => info!(path, ?outcome, "dispatched"),
            Err(e) => error!(path, cause = %e, "dispatch failed"),
        }
    }

    let cancel = CancellationToken::new();
    let timeout = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        timeout.cancel();
    });

    let mut session = Session::new();
    match router.dispatch_with(&mut session, "get", "/slow", &cancel).await {
        Ok(Outcome::Cancelled) => info!("slow navigation cancelled"),
        Ok(outcome) => info!(?outcome, "slow navigation finished"),
        Err(e) => error!(cause = %e, "slow navigation failed"),
    }
}
