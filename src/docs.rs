// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::users::get_users,
        handlers::users::update_membership,

        // --- Clients ---
        handlers::clients::list_clients,
        handlers::clients::create_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,

        // --- Products ---
        handlers::products::list_products,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,

        // --- Rents ---
        handlers::rents::list_rents,
        handlers::rents::create_rent,
        handlers::rents::update_rent,
        handlers::rents::finish_rent,
        handlers::rents::delete_rent,

        // --- Backup / Files ---
        handlers::backup::manual_backup,
        handlers::files::presign_file,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            handlers::users::MembershipPayload,

            // --- Cadastros ---
            models::client::Client,
            models::product::Product,
            handlers::clients::CreateClientPayload,
            handlers::clients::UpdateClientPayload,
            handlers::products::CreateProductPayload,
            handlers::products::UpdateProductPayload,

            // --- Rents ---
            models::rent::Rent,
            models::rent::RentListType,
            models::rent::PaginationInfo,
            services::rent_service::CreatedRent,
            handlers::rents::CreateRentPayload,
            handlers::rents::UpdateRentPayload,
            handlers::rents::FinishRentPayload,
            handlers::rents::RentListResponse,
            handlers::rents::FinishedRent,
            handlers::rents::UpdatedRent,
            handlers::rents::DeleteRentResponse,

            // --- Backup / Files ---
            models::backup::BackupKind,
            models::backup::BackupSummary,
            models::backup::BackupReport,
            handlers::backup::ManualBackupPayload,
            services::file_service::PresignedUrl,
            handlers::files::FileRequestPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login e emissão de token"),
        (name = "Users", description = "Usuário atual e mensalidade"),
        (name = "Clients", description = "Cadastro de clientes (RUT)"),
        (name = "Products", description = "Cadastro de produtos e preços"),
        (name = "Rents", description = "Ciclo de vida dos aluguéis"),
        (name = "Backup", description = "Backup por e-mail"),
        (name = "Files", description = "URLs pré-assinadas do S3")
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
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
