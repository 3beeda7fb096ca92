// src/db/mongo/rent_repo.rs

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    options::ReturnDocument,
    Collection, Database,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        search::{split_words, WordMatch},
    },
    db::{
        mongo::{
            contains_regex, decimal_bson, from_bson_datetime, parse_uuid, to_bson_datetime, RENTS,
        },
        RentRepository,
    },
    models::rent::{FinishRent, NewRent, Page, PageRequest, Rent, RentFilter, TextField},
};

// No documento os campos de exibição ficam gravados junto com o aluguel.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RentDocument {
    id: String,
    code: String,
    product_name: String,
    client_rut: String,
    client_name: String,
    quantity: i32,
    total_value_per_day: Decimal,
    #[serde(default)]
    warranty_value: Decimal,
    #[serde(default)]
    warranty_type: Option<String>,
    #[serde(default)]
    delivery_date: Option<String>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    is_finished: bool,
    #[serde(default)]
    is_paid: bool,
    #[serde(default)]
    total_days: Option<i32>,
    #[serde(default)]
    total_price: Option<Decimal>,
    #[serde(default)]
    observations: Option<String>,
    client_id: String,
    product_id: String,
    created_at: bson::DateTime,
}

impl From<&Rent> for RentDocument {
    fn from(rent: &Rent) -> Self {
        Self {
            id: rent.id.to_string(),
            code: rent.code.clone(),
            product_name: rent.product_name.clone(),
            client_rut: rent.client_rut.clone(),
            client_name: rent.client_name.clone(),
            quantity: rent.quantity,
            total_value_per_day: rent.total_value_per_day,
            warranty_value: rent.warranty_value,
            warranty_type: rent.warranty_type.clone(),
            delivery_date: rent.delivery_date.clone(),
            payment_method: rent.payment_method.clone(),
            is_finished: rent.is_finished,
            is_paid: rent.is_paid,
            total_days: rent.total_days,
            total_price: rent.total_price,
            observations: rent.observations.clone(),
            client_id: rent.client_id.to_string(),
            product_id: rent.product_id.to_string(),
            created_at: to_bson_datetime(rent.created_at),
        }
    }
}

impl RentDocument {
    fn into_rent(self) -> Result<Rent, AppError> {
        Ok(Rent {
            id: parse_uuid(&self.id)?,
            code: self.code,
            product_name: self.product_name,
            client_rut: self.client_rut,
            client_name: self.client_name,
            quantity: self.quantity,
            total_value_per_day: self.total_value_per_day,
            warranty_value: self.warranty_value,
            warranty_type: self.warranty_type,
            delivery_date: self.delivery_date,
            payment_method: self.payment_method,
            is_finished: self.is_finished,
            is_paid: self.is_paid,
            total_days: self.total_days,
            total_price: self.total_price,
            observations: self.observations,
            client_id: parse_uuid(&self.client_id)?,
            product_id: parse_uuid(&self.product_id)?,
            created_at: from_bson_datetime(self.created_at)?,
        })
    }
}

fn text_field_name(field: TextField) -> &'static str {
    match field {
        TextField::Code => "code",
        TextField::ProductName => "productName",
        TextField::ClientName => "clientName",
        TextField::ClientRut => "clientRut",
    }
}

fn build_query(filter: &RentFilter) -> Document {
    let mut query = Document::new();

    if let Some(is_finished) = filter.is_finished {
        query.insert("isFinished", is_finished);
    }
    if let Some(is_paid) = filter.is_paid {
        query.insert("isPaid", is_paid);
    }
    if let Some(payment_method) = &filter.payment_method {
        query.insert("paymentMethod", payment_method.as_str());
    }

    let mut created_at = Document::new();
    if let Some(start) = filter.start_date {
        created_at.insert("$gte", to_bson_datetime(start));
    }
    if let Some(end) = filter.end_date {
        created_at.insert("$lte", to_bson_datetime(end));
    }
    if !created_at.is_empty() {
        query.insert("createdAt", created_at);
    }

    let groups: Vec<Document> = filter
        .text_terms()
        .map(|(field, term)| {
            let clauses: Vec<Document> = split_words(term)
                .into_iter()
                .map(|word| {
                    let mut clause = Document::new();
                    clause.insert(text_field_name(field), contains_regex(word));
                    clause
                })
                .collect();
            match filter.word_match {
                WordMatch::All => doc! { "$and": clauses },
                WordMatch::Any => doc! { "$or": clauses },
            }
        })
        .collect();
    if !groups.is_empty() {
        query.insert("$or", groups);
    }

    query
}

#[derive(Clone)]
pub struct MongoRentRepository {
    collection: Collection<RentDocument>,
}

impl MongoRentRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(RENTS),
        }
    }
}

#[async_trait]
impl RentRepository for MongoRentRepository {
    async fn list(&self, filter: &RentFilter) -> Result<Vec<Rent>, AppError> {
        let documents: Vec<RentDocument> = self
            .collection
            .find(build_query(filter))
            .sort(doc! { "createdAt": -1 })
            .await?
            .try_collect()
            .await?;
        documents.into_iter().map(RentDocument::into_rent).collect()
    }

    async fn list_page(&self, filter: &RentFilter, page: PageRequest) -> Result<Page<Rent>, AppError> {
        let query = build_query(filter);
        let total_count = self.collection.count_documents(query.clone()).await?;
        let documents: Vec<RentDocument> = self
            .collection
            .find(query)
            .sort(doc! { "deliveryDate": -1, "createdAt": -1 })
            .skip(page.offset())
            .limit(i64::from(page.page_size))
            .await?
            .try_collect()
            .await?;
        let items = documents
            .into_iter()
            .map(RentDocument::into_rent)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total_count })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Rent>, AppError> {
        self.collection
            .find_one(doc! { "id": id.to_string() })
            .await?
            .map(RentDocument::into_rent)
            .transpose()
    }

    async fn create(&self, rent: NewRent) -> Result<Rent, AppError> {
        let rent = rent.into_rent(Uuid::new_v4());
        self.collection.insert_one(RentDocument::from(&rent)).await?;
        Ok(rent)
    }

    async fn update(&self, rent: &Rent) -> Result<Option<Rent>, AppError> {
        let result = self
            .collection
            .replace_one(doc! { "id": rent.id.to_string() }, RentDocument::from(rent))
            .await?;
        Ok((result.matched_count > 0).then(|| rent.clone()))
    }

    async fn finish(&self, id: Uuid, finish: &FinishRent) -> Result<Option<Rent>, AppError> {
        let mut set = doc! {
            "isFinished": true,
            "deliveryDate": finish.delivery_date.as_str(),
            "paymentMethod": finish.payment_method.as_str(),
        };
        if let Some(total_days) = finish.total_days {
            set.insert("totalDays", total_days);
        }
        if let Some(total_price) = finish.total_price {
            set.insert("totalPrice", decimal_bson(total_price));
        }
        if let Some(observations) = &finish.observations {
            set.insert("observations", Bson::String(observations.clone()));
        }
        if let Some(is_paid) = finish.is_paid {
            set.insert("isPaid", is_paid);
        }

        self.collection
            .find_one_and_update(
                doc! { "id": id.to_string(), "isFinished": false },
                doc! { "$set": set },
            )
            .return_document(ReturnDocument::After)
            .await?
            .map(RentDocument::into_rent)
            .transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = self.collection.delete_one(doc! { "id": id.to_string() }).await?;
        Ok(result.deleted_count)
    }
}
