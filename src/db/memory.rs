// src/db/memory.rs
//
// Repositórios em memória. Usados pelos testes e por `DATABASE_TYPE=memory`.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        search::{contains_ignore_case, matches_text},
    },
    db::{ClientRepository, ProductRepository, RentRepository, UserRepository},
    models::{
        auth::User,
        client::{Client, ClientFilter, NewClient},
        product::{NewProduct, Product, ProductFilter},
        rent::{FinishRent, NewRent, Page, PageRequest, Rent, RentFilter, TextField},
    },
};

fn matches_opt(value: &str, term: Option<&String>) -> bool {
    term.is_none_or(|t| contains_ignore_case(value, t))
}

// =============================================================================
//  CLIENTES
// =============================================================================

#[derive(Clone, Default)]
pub struct MemoryClientRepository {
    clients: Arc<RwLock<HashMap<Uuid, Client>>>,
}

impl MemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_locked(map: &mut HashMap<Uuid, Client>, client: NewClient) -> Result<Client, AppError> {
        if map.values().any(|c| c.rut == client.rut) {
            return Err(AppError::Conflict(format!(
                "A client with RUT '{}' already exists.",
                client.rut
            )));
        }
        let client = client.into_client(Uuid::new_v4());
        map.insert(client.id, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl ClientRepository for MemoryClientRepository {
    async fn list(&self, filter: &ClientFilter) -> Result<Vec<Client>, AppError> {
        let mut clients: Vec<Client> = self
            .clients
            .read()
            .values()
            .filter(|c| {
                matches_opt(&c.name, filter.name.as_ref())
                    && matches_opt(&c.company_name, filter.company_name.as_ref())
                    && filter.rut.as_ref().is_none_or(|rut| c.rut.contains(rut.as_str()))
                    && filter
                        .frequent_client
                        .as_ref()
                        .is_none_or(|f| &c.frequent_client == f)
            })
            .cloned()
            .collect();
        clients.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(clients)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        Ok(self.clients.read().get(&id).cloned())
    }

    async fn find_by_rut(&self, rut: &str) -> Result<Option<Client>, AppError> {
        Ok(self.clients.read().values().find(|c| c.rut == rut).cloned())
    }

    async fn create(&self, client: NewClient) -> Result<Client, AppError> {
        Self::insert_locked(&mut self.clients.write(), client)
    }

    async fn find_or_create_by_rut(&self, client: NewClient) -> Result<(Client, bool), AppError> {
        let mut map = self.clients.write();
        if let Some(existing) = map.values().find(|c| c.rut == client.rut) {
            return Ok((existing.clone(), false));
        }
        Self::insert_locked(&mut map, client).map(|c| (c, true))
    }

    async fn update(&self, client: &Client) -> Result<Option<Client>, AppError> {
        let mut map = self.clients.write();
        if map.values().any(|c| c.id != client.id && c.rut == client.rut) {
            return Err(AppError::Conflict(format!(
                "A client with RUT '{}' already exists.",
                client.rut
            )));
        }
        match map.get_mut(&client.id) {
            Some(stored) => {
                *stored = client.clone();
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.clients.write().remove(&id).is_some())
    }
}

// =============================================================================
//  PRODUTOS
// =============================================================================

#[derive(Clone, Default)]
pub struct MemoryProductRepository {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
}

impl MemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .values()
            .filter(|p| {
                matches_opt(&p.name, filter.name.as_ref())
                    && matches_opt(&p.code, filter.code.as_ref())
                    && matches_opt(&p.brand, filter.brand.as_ref())
                    && filter.rented.is_none_or(|r| p.rented == r)
                    && filter.min_price.is_none_or(|min| p.price_total >= min)
                    && filter.max_price.is_none_or(|max| p.price_total <= max)
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.products.read().get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Product>, AppError> {
        Ok(self.products.read().values().find(|p| p.code == code).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, AppError> {
        let name = name.to_lowercase();
        Ok(self
            .products
            .read()
            .values()
            .filter(|p| p.name.to_lowercase() == name)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product, AppError> {
        let mut map = self.products.write();
        if map.values().any(|p| p.code == product.code) {
            return Err(AppError::Conflict(format!(
                "A product with code '{}' already exists.",
                product.code
            )));
        }
        let product = product.into_product(Uuid::new_v4());
        map.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, product: &Product) -> Result<Option<Product>, AppError> {
        let mut map = self.products.write();
        if map.values().any(|p| p.id != product.id && p.code == product.code) {
            return Err(AppError::Conflict(format!(
                "A product with code '{}' already exists.",
                product.code
            )));
        }
        match map.get_mut(&product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set_rented(&self, id: Uuid, rented: bool) -> Result<bool, AppError> {
        match self.products.write().get_mut(&id) {
            Some(product) => {
                product.rented = rented;
                product.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.products.write().remove(&id).is_some())
    }
}

// =============================================================================
//  ALUGUÉIS
// =============================================================================

#[derive(Clone, Default)]
pub struct MemoryRentRepository {
    rents: Arc<RwLock<HashMap<Uuid, Rent>>>,
}

impl MemoryRentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, filter: &RentFilter) -> Vec<Rent> {
        let mut rents: Vec<Rent> = self
            .rents
            .read()
            .values()
            .filter(|r| rent_matches(r, filter))
            .cloned()
            .collect();
        rents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rents
    }
}

fn rent_matches(rent: &Rent, filter: &RentFilter) -> bool {
    let text_ok = !filter.has_text_search()
        || filter.text_terms().any(|(field, term)| {
            let value = match field {
                TextField::Code => &rent.code,
                TextField::ProductName => &rent.product_name,
                TextField::ClientName => &rent.client_name,
                TextField::ClientRut => &rent.client_rut,
            };
            matches_text(value, term, filter.word_match)
        });

    text_ok
        && filter.is_finished.is_none_or(|f| rent.is_finished == f)
        && filter.is_paid.is_none_or(|p| rent.is_paid == p)
        && filter
            .payment_method
            .as_ref()
            .is_none_or(|m| rent.payment_method.as_ref() == Some(m))
        && filter.start_date.is_none_or(|start| rent.created_at >= start)
        && filter.end_date.is_none_or(|end| rent.created_at <= end)
}

fn apply_finish(rent: &mut Rent, finish: &FinishRent) {
    rent.is_finished = true;
    rent.delivery_date = Some(finish.delivery_date.clone());
    rent.payment_method = Some(finish.payment_method.clone());
    if let Some(total_days) = finish.total_days {
        rent.total_days = Some(total_days);
    }
    if let Some(total_price) = finish.total_price {
        rent.total_price = Some(total_price);
    }
    if let Some(observations) = &finish.observations {
        rent.observations = Some(observations.clone());
    }
    if let Some(is_paid) = finish.is_paid {
        rent.is_paid = is_paid;
    }
}

#[async_trait]
impl RentRepository for MemoryRentRepository {
    async fn list(&self, filter: &RentFilter) -> Result<Vec<Rent>, AppError> {
        Ok(self.filtered(filter))
    }

    async fn list_page(&self, filter: &RentFilter, page: PageRequest) -> Result<Page<Rent>, AppError> {
        let mut rents = self.filtered(filter);
        // Finalizados: entrega mais recente primeiro, sem data no fim.
        rents.sort_by(|a, b| {
            b.delivery_date
                .cmp(&a.delivery_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        let total_count = rents.len() as u64;
        let items = rents
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.page_size as usize)
            .collect();
        Ok(Page { items, total_count })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Rent>, AppError> {
        Ok(self.rents.read().get(&id).cloned())
    }

    async fn create(&self, rent: NewRent) -> Result<Rent, AppError> {
        let rent = rent.into_rent(Uuid::new_v4());
        self.rents.write().insert(rent.id, rent.clone());
        Ok(rent)
    }

    async fn update(&self, rent: &Rent) -> Result<Option<Rent>, AppError> {
        match self.rents.write().get_mut(&rent.id) {
            Some(stored) => {
                *stored = rent.clone();
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn finish(&self, id: Uuid, finish: &FinishRent) -> Result<Option<Rent>, AppError> {
        match self.rents.write().get_mut(&id) {
            Some(rent) if !rent.is_finished => {
                apply_finish(rent, finish);
                Ok(Some(rent.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        Ok(u64::from(self.rents.write().remove(&id).is_some()))
    }
}

// =============================================================================
//  USUÁRIOS
// =============================================================================

#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserRepository {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users.into_iter().map(|u| (u.id, u)).collect())),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().values().find(|u| u.username == username).cloned())
    }

    async fn update_membership(&self, id: Uuid, membership_paid: bool) -> Result<Option<User>, AppError> {
        Ok(self.users.write().get_mut(&id).map(|user| {
            user.membership_paid = membership_paid;
            user.clone()
        }))
    }
}
