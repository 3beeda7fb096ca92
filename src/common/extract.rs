// src/common/extract.rs

use axum::extract::{FromRequest, FromRequestParts};

use crate::common::error::AppError;

// Mesmos extratores do axum, mas rejeitando com o envelope do AppError.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
