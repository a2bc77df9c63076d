// src/docs.rs

use crate::handlers;
use crate::models;
use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Rates ---
        handlers::rates::get_rate,
        handlers::rates::refresh_rate,
        handlers::rates::get_rate_config,
        handlers::rates::update_rate_config,

        // --- Representations ---
        handlers::representations::request_representation,
        handlers::representations::list_pending_requests,
        handlers::representations::resolve_request,
        handlers::representations::toggle_representation,
        handlers::representations::my_companies,

        // --- Quotations ---
        handlers::quotations::create_quotation,
        handlers::quotations::list_quotations,
        handlers::quotations::get_quotation,
        handlers::quotations::update_quotation_status,

        // --- Companies ---
        handlers::companies::create_company,
        handlers::companies::list_companies,
        handlers::companies::delete_company,
        handlers::companies::create_seller,
        handlers::companies::create_client,
        handlers::companies::create_product,
        handlers::companies::list_products,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::Principal,

            // --- Companies ---
            models::company::Company,
            models::company::Seller,
            models::company::Client,
            models::company::Product,

            // --- Representations ---
            models::representation::RequestStatus,
            models::representation::RequestDecision,
            models::representation::Representation,
            models::representation::RepresentationRequest,

            // --- Quotations ---
            models::quotation::QuotationStatus,
            models::quotation::Quotation,
            models::quotation::QuotationItem,
            models::quotation::ConvertedTotal,
            models::quotation::QuotationDetail,

            // --- Rates ---
            models::rates::RateSource,
            models::rates::ResolvedRate,
            models::rates::ExchangeRateConfig,

            // --- Payloads ---
            handlers::rates::RateResponse,
            handlers::rates::UpdateRateConfigPayload,
            handlers::representations::RequestRepresentationPayload,
            handlers::representations::ResolveRequestPayload,
            handlers::representations::ToggleActivePayload,
            handlers::quotations::QuotationItemPayload,
            handlers::quotations::CreateQuotationPayload,
            handlers::quotations::UpdateStatusPayload,
            handlers::companies::CreateCompanyPayload,
            handlers::companies::CreateSellerPayload,
            handlers::companies::CreateClientPayload,
            handlers::companies::CreateProductPayload,
        )
    ),
    tags(
        (name = "Rates", description = "Cotação USD/BRL e conversão"),
        (name = "Representations", description = "Vínculos Vendedor x Empresa e aprovação"),
        (name = "Quotations", description = "Orçamentos e numeração de documentos"),
        (name = "Companies", description = "Cadastro de empresas, vendedores, clientes e produtos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
