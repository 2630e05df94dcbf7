mod store_report_repository;

pub use store_report_repository::StoreReportRepository;
