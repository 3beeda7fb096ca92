// src/services/rent_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::{error::AppError, search::WordMatch},
    db::RentRepository,
    models::{
        client::{Client, ClientChanges},
        product::Product,
        rent::{
            CreateRent, FinishRent, FinishRentRequest, NewRent, PageRequest, PaginationInfo, Rent,
            RentChanges, RentFilter, RentListType,
        },
    },
    services::{client_service::ClientService, product_service::ProductService},
};

/// Resultado da criação: o aluguel e as entidades resolvidas (ou criadas).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRent {
    pub rent: Rent,
    pub client: Client,
    pub product: Product,
}

#[derive(Debug, Clone)]
pub struct RentListing {
    pub items: Vec<Rent>,
    /// Só no modo `finished`.
    pub pagination: Option<PaginationInfo>,
}

#[derive(Clone)]
pub struct RentService {
    rent_repo: Arc<dyn RentRepository>,
    client_service: ClientService,
    product_service: ProductService,
    word_match: WordMatch,
}

impl RentService {
    pub fn new(
        rent_repo: Arc<dyn RentRepository>,
        client_service: ClientService,
        product_service: ProductService,
        word_match: WordMatch,
    ) -> Self {
        Self {
            rent_repo,
            client_service,
            product_service,
            word_match,
        }
    }

    /// Filtro vazio já com o modo de busca configurado.
    pub fn new_filter(&self) -> RentFilter {
        RentFilter::new(self.word_match)
    }

    pub async fn get(&self, id: Uuid) -> Result<Rent, AppError> {
        self.rent_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Rent not found".to_string()))
    }

    pub async fn list(
        &self,
        list_type: RentListType,
        mut filter: RentFilter,
        page: PageRequest,
    ) -> Result<RentListing, AppError> {
        filter.is_finished = list_type.is_finished();

        if list_type == RentListType::Finished {
            let result = self.rent_repo.list_page(&filter, page).await?;
            return Ok(RentListing {
                items: result.items,
                pagination: Some(PaginationInfo::new(result.total_count, page)),
            });
        }

        Ok(RentListing {
            items: self.rent_repo.list(&filter).await?,
            pagination: None,
        })
    }

    /// Todos os aluguéis, usado pelo backup.
    pub async fn list_all(&self) -> Result<Vec<Rent>, AppError> {
        self.rent_repo.list(&self.new_filter()).await
    }

    pub async fn create(&self, input: CreateRent) -> Result<CreatedRent, AppError> {
        // 1. Cliente pelo RUT (cria se não existir)
        let client = self
            .client_service
            .resolve_by_rut(&input.client_rut, &input.client_name)
            .await?;

        // 2. Produto: id explícito não tem fallback; senão código, nome ou criação
        let mut product = match input.product_id {
            Some(product_id) => match self.product_service.get(product_id).await {
                Ok(product) => product,
                Err(AppError::NotFound(_)) => {
                    return Err(AppError::NotFound(format!(
                        "Product with ID {} not found",
                        product_id
                    )));
                }
                Err(e) => return Err(e),
            },
            None => {
                let lookup_code = input.product_code.as_deref().unwrap_or(&input.code);
                self.product_service
                    .resolve_for_rent(
                        lookup_code,
                        &input.product_name,
                        input.product_code.as_deref(),
                        input.total_value_per_day,
                        input.warranty_value,
                    )
                    .await?
                    .0
            }
        };

        // 3. Aluguel referenciando os dois; os campos de exibição espelham
        // os registros resolvidos
        let rent = self
            .rent_repo
            .create(NewRent {
                code: product.code.clone(),
                product_name: product.name.clone(),
                client_rut: client.rut.clone(),
                client_name: client.name.clone(),
                quantity: input.quantity,
                total_value_per_day: input.total_value_per_day,
                warranty_value: input.warranty_value,
                warranty_type: input.warranty_type,
                delivery_date: input.delivery_date,
                payment_method: input.payment_method,
                is_paid: input.is_paid,
                total_days: input.total_days,
                total_price: input.total_price,
                observations: input.observations,
                client_id: client.id,
                product_id: product.id,
                created_at: Utc::now(),
            })
            .await?;

        // 4. Produto fica marcado como alugado
        if !product.rented {
            self.product_service.set_rented(product.id, true).await?;
            product.rented = true;
        }

        tracing::info!(
            "📝 Aluguel {} criado: produto {} para cliente {}",
            rent.id,
            product.code,
            client.rut
        );
        Ok(CreatedRent { rent, client, product })
    }

    pub async fn update(&self, id: Uuid, changes: RentChanges) -> Result<Rent, AppError> {
        let mut rent = self.get(id).await?;

        if let Some(rut) = changes.client_rut.as_deref().map(str::trim) {
            if rut != rent.client_rut {
                let client = self
                    .client_service
                    .find_by_rut(rut)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Client with RUT {} not found", rut)))?;
                tracing::info!("📝 Aluguel {} passa para o cliente {}", id, client.rut);
                rent.client_id = client.id;
                rent.client_rut = client.rut;
                rent.client_name = client.name;
            }
        }

        if let Some(name) = changes.client_name.as_deref().map(str::trim) {
            if !name.is_empty() && name != rent.client_name {
                let client = self
                    .client_service
                    .update(
                        rent.client_id,
                        ClientChanges {
                            name: Some(name.to_string()),
                            ..Default::default()
                        },
                    )
                    .await?;
                tracing::info!("👤 Cliente {} renomeado para {}", client.rut, client.name);
                rent.client_name = client.name;
            }
        }

        let new_product = match (changes.product_name.as_deref(), changes.code.as_deref()) {
            (Some(name), _) if name.trim() != rent.product_name => Some(
                self.product_service
                    .find_by_name(name)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Product with name {} not found", name.trim()))
                    })?,
            ),
            (_, Some(code)) if code.trim() != rent.code => Some(
                self.product_service
                    .find_by_code(code)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Product with code {} not found", code.trim()))
                    })?,
            ),
            _ => None,
        };

        let previous_product = rent.product_id;
        if let Some(product) = &new_product {
            rent.product_id = product.id;
            rent.product_name = product.name.clone();
            rent.code = product.code.clone();
        }

        if let Some(quantity) = changes.quantity {
            rent.quantity = quantity;
        }
        if let Some(total_value_per_day) = changes.total_value_per_day {
            rent.total_value_per_day = total_value_per_day;
        }
        if let Some(warranty_value) = changes.warranty_value {
            rent.warranty_value = warranty_value;
        }
        if changes.warranty_type.is_some() {
            rent.warranty_type = changes.warranty_type;
        }
        if changes.delivery_date.is_some() {
            rent.delivery_date = changes.delivery_date;
        }
        if changes.payment_method.is_some() {
            rent.payment_method = changes.payment_method;
        }
        if let Some(is_paid) = changes.is_paid {
            rent.is_paid = is_paid;
        }
        if changes.total_days.is_some() {
            rent.total_days = changes.total_days;
        }
        if changes.total_price.is_some() {
            rent.total_price = changes.total_price;
        }
        if changes.observations.is_some() {
            rent.observations = changes.observations;
        }

        let updated = self
            .rent_repo
            .update(&rent)
            .await?
            .ok_or_else(|| AppError::NotFound("Rent not found".to_string()))?;

        // Troca de produto num aluguel ativo move o flag `rented`.
        if !updated.is_finished && updated.product_id != previous_product {
            self.product_service.set_rented(previous_product, false).await?;
            self.product_service.set_rented(updated.product_id, true).await?;
        }

        Ok(updated)
    }

    /// ACTIVE -> FINISHED. O update é condicional, então uma segunda
    /// finalização concorrente cai em "already finished".
    pub async fn finish(&self, id: Uuid, request: FinishRentRequest) -> Result<Rent, AppError> {
        let rent = self.get(id).await?;
        if rent.is_finished {
            return Err(AppError::BadRequest("Rent is already finished".to_string()));
        }

        let payment_method = request
            .payment_method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest("Payment method is required when finishing a rent".to_string())
            })?;

        let finish = FinishRent {
            delivery_date: request
                .delivery_date
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
            payment_method,
            total_days: request.total_days,
            total_price: request.total_price,
            observations: request.observations,
            is_paid: request.is_paid,
        };

        let finished = self
            .rent_repo
            .finish(id, &finish)
            .await?
            .ok_or_else(|| AppError::BadRequest("Rent is already finished".to_string()))?;

        self.product_service.set_rented(finished.product_id, false).await?;
        tracing::info!("✅ Aluguel {} finalizado ({})", id, finish.payment_method);
        Ok(finished)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        self.get(id).await?;
        let deleted = self.rent_repo.delete(id).await?;
        if deleted == 0 {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "rent {} existed but nothing was deleted",
                id
            )));
        }
        tracing::info!("🗑️ Aluguel {} removido", id);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        db::{
            memory::{MemoryClientRepository, MemoryProductRepository, MemoryRentRepository},
            ProductRepository,
        },
        models::product::{NewProduct, ProductFilter},
    };

    struct Fixture {
        service: RentService,
        products: Arc<MemoryProductRepository>,
        clients: ClientService,
    }

    fn fixture() -> Fixture {
        fixture_with(WordMatch::All)
    }

    fn fixture_with(word_match: WordMatch) -> Fixture {
        let products = Arc::new(MemoryProductRepository::new());
        let clients = ClientService::new(Arc::new(MemoryClientRepository::new()));
        let product_service = ProductService::new(products.clone());
        let service = RentService::new(
            Arc::new(MemoryRentRepository::new()),
            clients.clone(),
            product_service,
            word_match,
        );
        Fixture { service, products, clients }
    }

    /// Banco fora do ar: toda leitura falha.
    struct UnreachableProducts;

    #[async_trait]
    impl ProductRepository for UnreachableProducts {
        async fn list(&self, _: &ProductFilter) -> Result<Vec<Product>, AppError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn find_by_id(&self, _: Uuid) -> Result<Option<Product>, AppError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn find_by_code(&self, _: &str) -> Result<Option<Product>, AppError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn find_by_name(&self, _: &str) -> Result<Option<Product>, AppError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn create(&self, _: NewProduct) -> Result<Product, AppError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn update(&self, _: &Product) -> Result<Option<Product>, AppError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn set_rented(&self, _: Uuid, _: bool) -> Result<bool, AppError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
        async fn delete(&self, _: Uuid) -> Result<bool, AppError> {
            Err(sqlx::Error::PoolTimedOut.into())
        }
    }

    fn rent_of(code: &str, product_name: &str, client_rut: &str, client_name: &str) -> CreateRent {
        CreateRent {
            code: code.into(),
            product_name: product_name.into(),
            client_rut: client_rut.into(),
            client_name: client_name.into(),
            ..mesa_rent()
        }
    }

    fn mesa_rent() -> CreateRent {
        CreateRent {
            code: "R1".into(),
            product_name: "Mesa".into(),
            product_id: None,
            product_code: None,
            quantity: 2,
            total_value_per_day: Decimal::new(1000, 0),
            client_rut: "1-9".into(),
            client_name: "Ana".into(),
            warranty_value: Decimal::ZERO,
            warranty_type: None,
            delivery_date: None,
            payment_method: None,
            is_paid: false,
            total_days: None,
            total_price: None,
            observations: None,
        }
    }

    fn pay_with(method: &str) -> FinishRentRequest {
        FinishRentRequest {
            payment_method: Some(method.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_resolves_new_client_and_product() {
        let f = fixture();
        let created = f.service.create(mesa_rent()).await.unwrap();

        assert_eq!(created.client.rut, "1-9");
        assert_eq!(created.client.frequent_client, "No");
        assert_eq!(created.client.creation_date, Utc::now().date_naive());

        assert_eq!(created.product.code, "MESA");
        assert_eq!(created.product.price_total, Decimal::new(1000, 0));
        assert_eq!(created.product.price_net, Decimal::new(810, 0));
        assert_eq!(created.product.price_iva, Decimal::new(190, 0));
        assert!(created.product.rented);

        assert_eq!(created.rent.client_id, created.client.id);
        assert_eq!(created.rent.product_id, created.product.id);
        assert_eq!(created.rent.warranty_value, Decimal::ZERO);
        assert!(!created.rent.is_finished);
    }

    #[tokio::test]
    async fn existing_product_is_flagged_as_rented() {
        let f = fixture();
        let first = f.service.create(mesa_rent()).await.unwrap();
        f.service.finish(first.rent.id, pay_with("Efectivo")).await.unwrap();
        assert!(!f.products.find_by_id(first.product.id).await.unwrap().unwrap().rented);

        let second = f.service.create(mesa_rent()).await.unwrap();
        assert_eq!(second.product.id, first.product.id);
        assert_eq!(second.client.id, first.client.id);
        assert!(second.product.rented);
        assert!(f.products.find_by_id(first.product.id).await.unwrap().unwrap().rented);
    }

    #[tokio::test]
    async fn unknown_product_id_is_not_found() {
        let f = fixture();
        let mut input = mesa_rent();
        input.product_id = Some(Uuid::new_v4());

        let err = f.service.create(input).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn storage_errors_on_product_id_lookup_are_not_a_not_found() {
        let service = RentService::new(
            Arc::new(MemoryRentRepository::new()),
            ClientService::new(Arc::new(MemoryClientRepository::new())),
            ProductService::new(Arc::new(UnreachableProducts)),
            WordMatch::All,
        );
        let mut input = mesa_rent();
        input.product_id = Some(Uuid::new_v4());

        let err = service.create(input).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::PoolTimedOut)));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn finishing_twice_is_rejected() {
        let f = fixture();
        let created = f.service.create(mesa_rent()).await.unwrap();

        let finished = f.service.finish(created.rent.id, pay_with("Transferencia")).await.unwrap();
        assert!(finished.is_finished);
        assert_eq!(finished.payment_method.as_deref(), Some("Transferencia"));
        assert!(finished.delivery_date.is_some());

        let err = f.service.finish(created.rent.id, pay_with("Efectivo")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Rent is already finished"));
        assert!(f.service.get(created.rent.id).await.unwrap().is_finished);
    }

    #[tokio::test]
    async fn finish_requires_payment_method_and_keeps_omitted_fields() {
        let f = fixture();
        let mut input = mesa_rent();
        input.observations = Some("entregar en bodega".into());
        let created = f.service.create(input).await.unwrap();

        let err = f
            .service
            .finish(created.rent.id, FinishRentRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let finished = f
            .service
            .finish(
                created.rent.id,
                FinishRentRequest {
                    payment_method: Some("Efectivo".into()),
                    delivery_date: Some("2024-06-01".into()),
                    total_days: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(finished.delivery_date.as_deref(), Some("2024-06-01"));
        assert_eq!(finished.total_days, Some(3));
        assert_eq!(finished.observations.as_deref(), Some("entregar en bodega"));

        let missing = f.service.finish(Uuid::new_v4(), pay_with("Efectivo")).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_does_not_create_missing_references() {
        let f = fixture();
        let created = f.service.create(mesa_rent()).await.unwrap();

        let err = f
            .service
            .update(
                created.rent.id,
                RentChanges {
                    client_rut: Some("2-7".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Client with RUT 2-7 not found"));

        let err = f
            .service
            .update(
                created.rent.id,
                RentChanges {
                    product_name: Some("Silla".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let updated = f
            .service
            .update(
                created.rent.id,
                RentChanges {
                    quantity: Some(5),
                    observations: Some("cambio".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.client_rut, "1-9");
        assert_eq!(updated.observations.as_deref(), Some("cambio"));
    }

    #[tokio::test]
    async fn update_renames_the_rent_client() {
        let f = fixture();
        let created = f.service.create(mesa_rent()).await.unwrap();

        let updated = f
            .service
            .update(
                created.rent.id,
                RentChanges {
                    client_name: Some("Ana María".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.client_name, "Ana María");
        assert_eq!(updated.client_id, created.client.id);
        assert_eq!(f.clients.get(created.client.id).await.unwrap().name, "Ana María");
    }

    #[tokio::test]
    async fn finished_listing_puts_latest_delivery_first() {
        let f = fixture();
        let first = f.service.create(rent_of("R1", "Mesa", "1-9", "Ana")).await.unwrap();
        let second = f.service.create(rent_of("R2", "Silla", "1-9", "Ana")).await.unwrap();

        // O primeiro criado é o último entregue.
        for (rent, date) in [(&first, "2024-06-20"), (&second, "2024-06-01")] {
            f.service
                .finish(
                    rent.rent.id,
                    FinishRentRequest {
                        payment_method: Some("Efectivo".into()),
                        delivery_date: Some(date.into()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let page = f
            .service
            .list(RentListType::Finished, f.service.new_filter(), PageRequest::new(None, None))
            .await
            .unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.rent.id, second.rent.id]);
    }

    async fn seed_search(f: &Fixture) {
        f.service
            .create(rent_of("R1", "Silla Plegable Roja", "1-9", "Ana Pérez"))
            .await
            .unwrap();
        f.service
            .create(rent_of("R2", "Silla Azul", "2-7", "Bruno Díaz"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn text_search_requires_every_word_by_default() {
        let f = fixture_with(WordMatch::All);
        seed_search(&f).await;

        let mut filter = f.service.new_filter();
        filter.product_name = Some("silla roja".into());
        let found = f
            .service
            .list(RentListType::All, filter, PageRequest::new(None, None))
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].product_name, "Silla Plegable Roja");
    }

    #[tokio::test]
    async fn text_search_any_word_mode() {
        let f = fixture_with(WordMatch::Any);
        seed_search(&f).await;

        let mut filter = f.service.new_filter();
        filter.product_name = Some("silla roja".into());
        let found = f
            .service
            .list(RentListType::All, filter, PageRequest::new(None, None))
            .await
            .unwrap();
        assert_eq!(found.items.len(), 2);
    }

    #[tokio::test]
    async fn text_search_combines_fields_with_or() {
        let f = fixture_with(WordMatch::All);
        seed_search(&f).await;

        let mut filter = f.service.new_filter();
        filter.product_name = Some("roja".into());
        filter.client_rut = Some("2-7".into());
        let found = f
            .service
            .list(RentListType::All, filter, PageRequest::new(None, None))
            .await
            .unwrap();
        assert_eq!(found.items.len(), 2);

        let mut filter = f.service.new_filter();
        filter.product_name = Some("azul roja".into());
        filter.client_name = Some("ana".into());
        let found = f
            .service
            .list(RentListType::All, filter, PageRequest::new(None, None))
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].client_name, "Ana Pérez");
    }

    #[tokio::test]
    async fn finished_listing_is_paginated() {
        let f = fixture();
        for _ in 0..3 {
            let created = f.service.create(mesa_rent()).await.unwrap();
            f.service.finish(created.rent.id, pay_with("Efectivo")).await.unwrap();
        }
        f.service.create(mesa_rent()).await.unwrap();

        let page = f
            .service
            .list(RentListType::Finished, f.service.new_filter(), PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|r| r.is_finished));
        let pagination = page.pagination.unwrap();
        assert_eq!(pagination.total_count, 3);
        assert_eq!(pagination.total_pages, 2);

        let active = f
            .service
            .list(RentListType::Active, f.service.new_filter(), PageRequest::new(None, None))
            .await
            .unwrap();
        assert_eq!(active.items.len(), 1);
        assert!(active.pagination.is_none());

        let all = f
            .service
            .list(RentListType::All, f.service.new_filter(), PageRequest::new(None, None))
            .await
            .unwrap();
        assert_eq!(all.items.len(), 4);
    }

    #[tokio::test]
    async fn delete_reports_count_and_missing_rents() {
        let f = fixture();
        let created = f.service.create(mesa_rent()).await.unwrap();

        assert!(matches!(f.service.delete(Uuid::new_v4()).await, Err(AppError::NotFound(_))));
        assert_eq!(f.service.delete(created.rent.id).await.unwrap(), 1);
        assert!(matches!(f.service.get(created.rent.id).await, Err(AppError::NotFound(_))));
    }
}
