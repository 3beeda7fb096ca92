// src/db/postgres/rent_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        search::{split_words, WordMatch},
    },
    db::RentRepository,
    models::rent::{FinishRent, NewRent, Page, PageRequest, Rent, RentFilter, TextField},
};

// Campos de exibição saem do JOIN; o aluguel só guarda as chaves estrangeiras.
macro_rules! rent_columns {
    () => {
        "r.id, p.code AS code, p.name AS product_name, c.rut AS client_rut, \
         c.name AS client_name, r.quantity, p.price_total AS total_value_per_day, \
         r.warranty_value, COALESCE(r.warranty_type, 'Sin garantía') AS warranty_type, \
         r.delivery_date, r.payment_method, r.is_finished, r.is_paid, r.total_days, \
         r.total_price, r.observations, r.client_id, r.product_id, r.created_at"
    };
}

macro_rules! rent_joins {
    () => {
        " JOIN clients c ON c.id = r.client_id JOIN products p ON p.id = r.product_id"
    };
}

#[derive(Clone)]
pub struct PgRentRepository {
    pool: PgPool,
}

impl PgRentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn text_column(field: TextField) -> &'static str {
    match field {
        TextField::Code => "p.code",
        TextField::ProductName => "p.name",
        TextField::ClientName => "c.name",
        TextField::ClientRut => "c.rut",
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RentFilter) {
    qb.push(" WHERE TRUE");

    if let Some(is_finished) = filter.is_finished {
        qb.push(" AND r.is_finished = ").push_bind(is_finished);
    }
    if let Some(is_paid) = filter.is_paid {
        qb.push(" AND r.is_paid = ").push_bind(is_paid);
    }
    if let Some(payment_method) = &filter.payment_method {
        qb.push(" AND r.payment_method = ").push_bind(payment_method.clone());
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND r.created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND r.created_at <= ").push_bind(end);
    }

    // Campos diferentes entram com OR; as palavras de um mesmo campo
    // seguem o modo configurado (AND por padrão no relacional).
    if filter.has_text_search() {
        let joiner = match filter.word_match {
            WordMatch::All => " AND ",
            WordMatch::Any => " OR ",
        };
        qb.push(" AND (");
        for (i, (field, term)) in filter.text_terms().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("(");
            for (j, word) in split_words(term).into_iter().enumerate() {
                if j > 0 {
                    qb.push(joiner);
                }
                qb.push("strpos(lower(")
                    .push(text_column(field))
                    .push("), lower(")
                    .push_bind(word.to_string())
                    .push(")) > 0");
            }
            qb.push(")");
        }
        qb.push(")");
    }
}

#[async_trait]
impl RentRepository for PgRentRepository {
    async fn list(&self, filter: &RentFilter) -> Result<Vec<Rent>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(concat!("SELECT ", rent_columns!(), " FROM rents r", rent_joins!()));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY r.created_at DESC");

        let rents = qb.build_query_as::<Rent>().fetch_all(&self.pool).await?;
        Ok(rents)
    }

    async fn list_page(&self, filter: &RentFilter, page: PageRequest) -> Result<Page<Rent>, AppError> {
        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new(concat!("SELECT COUNT(*) FROM rents r", rent_joins!()));
        push_filters(&mut count_qb, filter);
        let total_count = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let offset = i64::try_from(page.offset())
            .map_err(|_| AppError::BadRequest("page is out of range".to_string()))?;

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(concat!("SELECT ", rent_columns!(), " FROM rents r", rent_joins!()));
        push_filters(&mut qb, filter);
        // Finalizados: entrega mais recente primeiro, sem data no fim.
        qb.push(" ORDER BY r.delivery_date DESC NULLS LAST, r.created_at DESC LIMIT ")
            .push_bind(i64::from(page.page_size))
            .push(" OFFSET ")
            .push_bind(offset);

        let items = qb.build_query_as::<Rent>().fetch_all(&self.pool).await?;
        Ok(Page {
            items,
            total_count: total_count.max(0) as u64,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Rent>, AppError> {
        let rent = sqlx::query_as::<_, Rent>(concat!(
            "SELECT ",
            rent_columns!(),
            " FROM rents r",
            rent_joins!(),
            " WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rent)
    }

    async fn create(&self, rent: NewRent) -> Result<Rent, AppError> {
        let created = sqlx::query_as::<_, Rent>(concat!(
            "WITH r AS (",
            "INSERT INTO rents (id, client_id, product_id, quantity, warranty_value, warranty_type, \
             delivery_date, payment_method, is_finished, is_paid, total_days, total_price, \
             observations, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, $10, $11, $12, $13) RETURNING *",
            ") SELECT ",
            rent_columns!(),
            " FROM r",
            rent_joins!()
        ))
        .bind(Uuid::new_v4())
        .bind(rent.client_id)
        .bind(rent.product_id)
        .bind(rent.quantity)
        .bind(rent.warranty_value)
        .bind(rent.warranty_type)
        .bind(rent.delivery_date)
        .bind(rent.payment_method)
        .bind(rent.is_paid)
        .bind(rent.total_days)
        .bind(rent.total_price)
        .bind(rent.observations)
        .bind(rent.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(&self, rent: &Rent) -> Result<Option<Rent>, AppError> {
        let updated = sqlx::query_as::<_, Rent>(concat!(
            "WITH r AS (",
            "UPDATE rents SET client_id = $2, product_id = $3, quantity = $4, warranty_value = $5, \
             warranty_type = $6, delivery_date = $7, payment_method = $8, is_paid = $9, \
             total_days = $10, total_price = $11, observations = $12 \
             WHERE id = $1 RETURNING *",
            ") SELECT ",
            rent_columns!(),
            " FROM r",
            rent_joins!()
        ))
        .bind(rent.id)
        .bind(rent.client_id)
        .bind(rent.product_id)
        .bind(rent.quantity)
        .bind(rent.warranty_value)
        .bind(&rent.warranty_type)
        .bind(&rent.delivery_date)
        .bind(&rent.payment_method)
        .bind(rent.is_paid)
        .bind(rent.total_days)
        .bind(rent.total_price)
        .bind(&rent.observations)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn finish(&self, id: Uuid, finish: &FinishRent) -> Result<Option<Rent>, AppError> {
        // Condicional em is_finished = FALSE: um segundo finish não acha linha.
        let finished = sqlx::query_as::<_, Rent>(concat!(
            "WITH r AS (",
            "UPDATE rents SET is_finished = TRUE, delivery_date = $2, payment_method = $3, \
             total_days = COALESCE($4, total_days), total_price = COALESCE($5, total_price), \
             observations = COALESCE($6, observations), is_paid = COALESCE($7, is_paid) \
             WHERE id = $1 AND is_finished = FALSE RETURNING *",
            ") SELECT ",
            rent_columns!(),
            " FROM r",
            rent_joins!()
        ))
        .bind(id)
        .bind(&finish.delivery_date)
        .bind(&finish.payment_method)
        .bind(finish.total_days)
        .bind(finish.total_price)
        .bind(&finish.observations)
        .bind(finish.is_paid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(finished)
    }

    async fn delete(&self, id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM rents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
