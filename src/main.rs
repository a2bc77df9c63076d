//src/main.rs

use axum::{
    Json, Router,
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // Lida com o Result retornado por AppState::new()
    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Cotação e conversão de moeda
    let rate_routes = Router::new()
        .route("/", get(handlers::rates::get_rate))
        .route("/refresh", post(handlers::rates::refresh_rate))
        .route(
            "/config",
            get(handlers::rates::get_rate_config).put(handlers::rates::update_rate_config),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Representações e fluxo de aprovação
    let representation_routes = Router::new()
        .route(
            "/requests",
            post(handlers::representations::request_representation),
        )
        .route(
            "/requests/pending",
            get(handlers::representations::list_pending_requests),
        )
        .route(
            "/requests/resolve",
            post(handlers::representations::resolve_request),
        )
        .route(
            "/{id}/active",
            patch(handlers::representations::toggle_representation),
        )
        .route("/companies", get(handlers::representations::my_companies))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Orçamentos
    let quotation_routes = Router::new()
        .route(
            "/",
            post(handlers::quotations::create_quotation)
                .get(handlers::quotations::list_quotations),
        )
        .route("/{id}", get(handlers::quotations::get_quotation))
        .route(
            "/{id}/status",
            patch(handlers::quotations::update_quotation_status),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Cadastros (empresas, vendedores, clientes, produtos)
    let company_routes = Router::new()
        .route(
            "/companies",
            post(handlers::companies::create_company).get(handlers::companies::list_companies),
        )
        .route(
            "/companies/{id}",
            axum::routing::delete(handlers::companies::delete_company),
        )
        .route("/sellers", post(handlers::companies::create_seller))
        .route("/clients", post(handlers::companies::create_client))
        .route(
            "/products",
            post(handlers::companies::create_product).get(handlers::companies::list_products),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(docs::ApiDoc::openapi()) }),
        )
        .nest("/api/rates", rate_routes)
        .nest("/api/representations", representation_routes)
        .nest("/api/quotations", quotation_routes)
        .nest("/api", company_routes)
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!(
        "🚀 Servidor escutando em {}",
        listener
            .local_addr()
            .expect("Falha ao obter o endereço local")
    );
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
