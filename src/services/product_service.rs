// src/services/product_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductRepository,
    models::product::{CreateProduct, NewProduct, Product, ProductChanges, ProductFilter},
};

pub const DEFAULT_BRAND: &str = "Sin marca";
const CODE_LENGTH: usize = 10;
const MAX_CODE_ATTEMPTS: i64 = 5;

/// Código a partir do nome: sem espaços, maiúsculo, no máximo 10 caracteres.
pub fn derive_code(name: &str) -> String {
    let stripped: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let code: String = stripped.to_uppercase().chars().take(CODE_LENGTH).collect();
    if code.is_empty() {
        format!("PROD_{}", Utc::now().timestamp_millis())
    } else {
        code
    }
}

/// Divide o total em líquido (81%) e IVA (19%). É uma aproximação: a soma
/// não é arredondada para bater com o total.
pub fn split_price(total: Decimal) -> Result<(Decimal, Decimal), AppError> {
    let net = total.checked_mul(Decimal::new(81, 2)).ok_or_else(price_out_of_range)?;
    let iva = total.checked_mul(Decimal::new(19, 2)).ok_or_else(price_out_of_range)?;
    Ok((net, iva))
}

fn price_out_of_range() -> AppError {
    AppError::BadRequest("Price out of range".to_string())
}

/// `<code>_<últimos 4 dígitos do timestamp>`.
fn suffixed_code(base: &str, attempt: i64) -> String {
    let millis = Utc::now().timestamp_millis() + attempt;
    format!("{}_{:04}", base, millis.rem_euclid(10_000))
}

#[derive(Clone)]
pub struct ProductService {
    product_repo: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(product_repo: Arc<dyn ProductRepository>) -> Self {
        Self { product_repo }
    }

    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.product_repo.list(filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<Product>, AppError> {
        self.product_repo.find_by_code(code.trim()).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Product>, AppError> {
        self.product_repo.find_by_name(name.trim()).await
    }

    /// Insere tentando o código pedido; se já existir, acrescenta o sufixo
    /// de timestamp e tenta de novo. A unicidade é garantida pelo armazenamento.
    async fn insert_with_unique_code(&self, mut product: NewProduct) -> Result<Product, AppError> {
        let base = product.code.clone();
        for attempt in 0..MAX_CODE_ATTEMPTS {
            match self.product_repo.create(product.clone()).await {
                Err(AppError::Conflict(_)) => {
                    product.code = suffixed_code(&base, attempt);
                    tracing::info!("🏷️ Código {} já existe, tentando {}", base, product.code);
                }
                other => return other,
            }
        }
        Err(AppError::Conflict(format!(
            "Could not allocate a unique code for product '{}'",
            base
        )))
    }

    pub async fn create(&self, input: CreateProduct) -> Result<Product, AppError> {
        let price_total = match (input.price_total, input.price_net, input.price_iva) {
            (Some(total), _, _) => total,
            (None, Some(net), Some(iva)) => net.checked_add(iva).ok_or_else(price_out_of_range)?,
            _ => {
                return Err(AppError::BadRequest(
                    "priceTotal is required unless priceNet and priceIva are given".to_string(),
                ));
            }
        };
        let (derived_net, derived_iva) = split_price(price_total)?;

        let name = input.name.trim().to_string();
        let code = input
            .code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| derive_code(&name));

        let product = self
            .insert_with_unique_code(NewProduct {
                name,
                code,
                brand: input.brand.unwrap_or_else(|| DEFAULT_BRAND.to_string()),
                price_net: input.price_net.unwrap_or(derived_net),
                price_iva: input.price_iva.unwrap_or(derived_iva),
                price_total,
                price_warranty: input.price_warranty.unwrap_or(Decimal::ZERO),
                rented: input.rented.unwrap_or(false),
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!("📦 Produto criado: {} ({})", product.name, product.code);
        Ok(product)
    }

    /// Produto de um aluguel novo: busca pelo código, depois pelo nome; se
    /// nada bater, cria um já marcado como alugado. O booleano indica criação.
    pub async fn resolve_for_rent(
        &self,
        lookup_code: &str,
        product_name: &str,
        new_code: Option<&str>,
        total_value_per_day: Decimal,
        warranty_value: Decimal,
    ) -> Result<(Product, bool), AppError> {
        if let Some(product) = self.find_by_code(lookup_code).await? {
            tracing::info!("📦 Produto encontrado pelo código {}", product.code);
            return Ok((product, false));
        }
        if let Some(product) = self.find_by_name(product_name).await? {
            tracing::info!("📦 Produto encontrado pelo nome {}", product.name);
            return Ok((product, false));
        }

        let name = product_name.trim().to_string();
        let code = new_code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| derive_code(&name));
        let (price_net, price_iva) = split_price(total_value_per_day)?;

        let product = self
            .insert_with_unique_code(NewProduct {
                name,
                code,
                brand: DEFAULT_BRAND.to_string(),
                price_net,
                price_iva,
                price_total: total_value_per_day,
                price_warranty: warranty_value,
                rented: true,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            "📦 Produto {} não encontrado, criado com código {}",
            product.name,
            product.code
        );
        Ok((product, true))
    }

    pub async fn update(&self, id: Uuid, changes: ProductChanges) -> Result<Product, AppError> {
        let mut product = self.get(id).await?;

        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(code) = changes.code {
            product.code = code;
        }
        if let Some(brand) = changes.brand {
            product.brand = brand;
        }
        if let Some(price_net) = changes.price_net {
            product.price_net = price_net;
        }
        if let Some(price_iva) = changes.price_iva {
            product.price_iva = price_iva;
        }
        if let Some(price_total) = changes.price_total {
            product.price_total = price_total;
        }
        if let Some(price_warranty) = changes.price_warranty {
            product.price_warranty = price_warranty;
        }
        if let Some(rented) = changes.rented {
            product.rented = rented;
        }
        product.updated_at = Some(Utc::now());

        self.product_repo
            .update(&product)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
    }

    pub async fn set_rented(&self, id: Uuid, rented: bool) -> Result<(), AppError> {
        if !self.product_repo.set_rented(id, rented).await? {
            tracing::warn!("⚠️ Produto {} sumiu antes de atualizar o flag rented", id);
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.get(id).await?;
        if !self.product_repo.delete(id).await? {
            return Err(AppError::NotFound("Product not found".to_string()));
        }
        tracing::info!("🗑️ Produto {} removido", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryProductRepository;

    fn service() -> ProductService {
        ProductService::new(Arc::new(MemoryProductRepository::new()))
    }

    #[test]
    fn derives_code_from_name() {
        assert_eq!(derive_code("Silla Plegable"), "SILLAPLEGA");
        assert_eq!(derive_code("mesa"), "MESA");
        assert!(derive_code("   ").starts_with("PROD_"));
    }

    #[test]
    fn splits_net_and_iva() {
        let (net, iva) = split_price(Decimal::new(1000, 0)).unwrap();
        assert_eq!(net, Decimal::new(810, 0));
        assert_eq!(iva, Decimal::new(190, 0));

        let (net, iva) = split_price(Decimal::MAX).unwrap();
        assert!(net < Decimal::MAX && iva < Decimal::MAX);
    }

    #[tokio::test]
    async fn net_plus_iva_overflow_is_a_bad_request() {
        let err = service()
            .create(CreateProduct {
                name: "Big".into(),
                price_net: Some(Decimal::MAX),
                price_iva: Some(Decimal::MAX),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Price out of range"));
    }

    #[tokio::test]
    async fn colliding_codes_get_a_timestamp_suffix() {
        let service = service();
        let input = CreateProduct {
            name: "Silla Plegable".into(),
            price_total: Some(Decimal::new(5000, 0)),
            ..Default::default()
        };

        let first = service.create(input.clone()).await.unwrap();
        let second = service.create(input).await.unwrap();

        assert_eq!(first.code, "SILLAPLEGA");
        assert_ne!(first.code, second.code);
        let suffix = second.code.strip_prefix("SILLAPLEGA_").unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn create_needs_some_price() {
        let service = service();
        let err = service
            .create(CreateProduct {
                name: "Mesa".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let product = service
            .create(CreateProduct {
                name: "Mesa".into(),
                price_net: Some(Decimal::new(810, 0)),
                price_iva: Some(Decimal::new(190, 0)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(product.price_total, Decimal::new(1000, 0));
        assert_eq!(product.brand, DEFAULT_BRAND);
        assert!(!product.rented);
    }

    #[tokio::test]
    async fn resolve_prefers_code_then_name_then_creates() {
        let service = service();
        let existing = service
            .create(CreateProduct {
                name: "Andamio".into(),
                code: Some("AND01".into()),
                price_total: Some(Decimal::new(2000, 0)),
                ..Default::default()
            })
            .await
            .unwrap();

        let (by_code, created) = service
            .resolve_for_rent("AND01", "Otro", None, Decimal::ONE, Decimal::ZERO)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(by_code.id, existing.id);

        let (by_name, created) = service
            .resolve_for_rent("R1", "andamio", None, Decimal::ONE, Decimal::ZERO)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(by_name.id, existing.id);

        let (fresh, created) = service
            .resolve_for_rent("R1", "Mesa", None, Decimal::new(1000, 0), Decimal::new(50, 0))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(fresh.code, "MESA");
        assert_eq!(fresh.price_net, Decimal::new(810, 0));
        assert_eq!(fresh.price_warranty, Decimal::new(50, 0));
        assert!(fresh.rented);
    }
}
