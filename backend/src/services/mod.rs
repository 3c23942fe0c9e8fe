//! Business logic services
//!
//! Each service owns a pool handle and exposes the operations of one ledger
//! area. Handlers stay thin; all invariants are enforced here or in the
//! shared ledger math.

pub mod catalog;
pub mod customer_return;
pub mod report;
pub mod sales;
pub mod stock_lot;
pub mod supplier_return;

pub use catalog::CatalogService;
pub use customer_return::CustomerReturnService;
pub use report::ReportService;
pub use sales::SalesService;
pub use stock_lot::StockLotService;
pub use supplier_return::SupplierReturnService;
