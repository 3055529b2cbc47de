use micro_route::{Flow, Handler, RouteContext, Router, RouterConfig, Routes, SyncHandler, capture_fn, handler_fn};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

// a single page app style navigation: every dispatch leaves the previous page
// (its `after` hooks run) before entering the next one
fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config: RouterConfig = serde_json::from_str(r#"{ "recurse": "backward", "strict": false }"#)
        .expect("router config should be valid json");

    let mut pages: HashMap<String, SyncHandler> = HashMap::new();
    pages.insert("home".to_owned(), Arc::new(handler_fn(|_ctx: &RouteContext| info!("rendering home"))));

    let mut router = Router::builder()
        .config(config)
        .resource(pages)
        .before(handler_fn(|ctx: &RouteContext| info!(path = ctx.path(), "navigating")))
        .after(handler_fn(|ctx: &RouteContext| info!(path = ctx.path(), "leaving")))
        .notfound(handler_fn(|ctx: &RouteContext| warn!(path = ctx.path(), "no such page")))
        .build()
        .expect("router config should be valid");

    router.on("on", "/home", "home").expect("home route should be valid");
    router
        .mount(
            Routes::new().nest(
                "/account",
                Routes::new()
                    .route("on", handler_fn(|_ctx: &RouteContext| info!("account section")))
                    .route("after", handler_fn(|_ctx: &RouteContext| info!("closing account section")))
                    .route("/settings", capture_fn(|| info!("rendering settings")))
                    .route("/orders/:id", capture_fn(|id: String| info!(order = %id, "rendering order"))),
            ),
        )
        .expect("account routes should be valid");

    router
        .path("/admin", |admin| {
            admin.on("before", "/", guard())?;
            admin.on("on", "/users", handler_fn(|_ctx: &RouteContext| info!("rendering users")))?;
            Ok(())
        })
        .expect("admin routes should be valid");

    for path in ["/home", "/account/settings", "/account/orders/17/", "/admin/users", "/nowhere", "/home?tab=news"] {
        match router.dispatch("on", path) {
            Ok(outcome) => info!(path, ?outcome, "dispatched"),
            Err(e) => warn!(path, cause = %e, "dispatch failed"),
        }
    }
}

fn guard() -> Handler<SyncHandler> {
    Handler::Direct(Arc::new(handler_fn(|ctx: &RouteContext| {
        warn!(path = ctx.path(), "admin area is closed");
        Flow::Stop
    })))
}
