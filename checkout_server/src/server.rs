use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use checkout_engine::{events::EventProducers, CheckoutApi, OrderFlowApi, PricingApi, SqliteDatabase};
use futures::{future::ok, FutureExt};
use log::*;
use stripe_tools::StripeApi;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    helpers::{get_remote_ip, is_whitelisted, json_config},
    integrations::stripe::{create_confirmation_handlers, StripeAuthorizer},
    middleware::StripeSignatureFactory,
    routes::{health, CheckoutRoute, StripeWebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_confirmation_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let api = StripeApi::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let authorizer = StripeAuthorizer::new(api);
    let srv = create_server_instance(config, db, authorizer, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    authorizer: StripeAuthorizer,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let pricing_api = PricingApi::new(db.clone()).with_member_discount(config.member_discount);
        let checkout_api = CheckoutApi::new(pricing_api, authorizer.clone()).with_currency(&config.currency);
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cko::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(orders_api));
        let options = ServerOptions::from_config(&config);
        let whitelist = config.stripe_whitelist.clone();
        let stripe_scope = web::scope("/stripe")
            .wrap(StripeSignatureFactory::new(
                config.stripe.webhook_secret.clone(),
                config.stripe.clock_skew_tolerance,
            ))
            // Registered last, so it runs before the signature is checked
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), options);
                if is_whitelisted(peer_ip, whitelist.as_deref()) {
                    srv.call(req).boxed_local()
                } else {
                    warn!("💻️ Webhook call from {peer_ip:?} is not on the whitelist. Denying access.");
                    let err = ServerError::ForbiddenPeer(format!("{peer_ip:?} may not call this endpoint"));
                    ok(req.error_response(err)).boxed_local()
                }
            })
            .service(StripeWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(CheckoutRoute::<SqliteDatabase, StripeAuthorizer>::new()).service(stripe_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
