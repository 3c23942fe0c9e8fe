//! HTTP request handlers

pub mod catalog;
pub mod customer_return;
pub mod health;
pub mod report;
pub mod sales;
pub mod stock_lot;
pub mod supplier_return;
