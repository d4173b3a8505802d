//! `SeaORM` entities.

pub mod branches;
pub mod invoices;
pub mod profiles;
pub mod sea_orm_active_enums;
